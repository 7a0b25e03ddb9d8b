use std::fmt;
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::metadata::VideoMetadata;

// @module: Caption parsing, roll-up deduplication and normalization

// @const: SRT timestamp regex
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{2}):(\d{2}):(\d{2})[,.](\d{3})\s*-->\s*(\d{2}):(\d{2}):(\d{2})[,.](\d{3})").unwrap()
});

// @const: Embedded markup tags (<i>, <font ...>, cue voice spans)
static MARKUP_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

// @const: index + timing line pairs, for the whole-input stripping fallback
static TIMING_BLOCK_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d+\s*\r?\n\d{2}:\d{2}:\d{2},\d{3}\s*-->\s*\d{2}:\d{2}:\d{2},\d{3}").unwrap()
});

/// Section marker opening the metadata block of an annotated document.
pub const METADATA_MARKER: &str = "--- METADADOS DO DOCUMENTO ---";

/// Prefix of the summary section marker. Matched as a prefix because older
/// outputs carried the model name in the marker line.
pub const SUMMARY_MARKER_PREFIX: &str = "--- RESUMO EXECUTIVO";

/// Section marker opening the transcription body of an annotated document.
pub const TRANSCRIPT_MARKER: &str = "--- TRANSCRICAO COMPLETA ---";

const FRAME_RULE: &str = "==============================";

// @struct: Single caption cue as displayed on screen
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionBlock {
    // @field: Sequence number (not required to be contiguous)
    pub seq_num: usize,

    // @field: Start time in ms
    pub start_time_ms: u64,

    // @field: End time in ms
    pub end_time_ms: u64,

    // @field: Display lines, markup-stripped, trimmed, non-empty
    pub lines: Vec<String>,
}

impl CaptionBlock {
    /// Creates a new caption block - used by tests and external consumers
    #[allow(dead_code)]
    pub fn new(seq_num: usize, start_time_ms: u64, end_time_ms: u64, lines: Vec<String>) -> Self {
        CaptionBlock {
            seq_num,
            start_time_ms,
            end_time_ms,
            lines,
        }
    }

    /// Full display text of the block, lines joined with a single space
    pub fn text(&self) -> String {
        self.lines.join(" ")
    }
}

impl fmt::Display for CaptionBlock {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}] {}", self.seq_num, self.text())
    }
}

/// Cleaned output of the normalizer for one source file
#[derive(Debug, Clone)]
pub struct NormalizedDocument {
    /// Source identifier, typically the file name
    pub source_name: String,

    /// Header/footer-framed text used for consolidated output
    pub display_text: String,

    /// The same content without framing, used as summarizer input
    pub raw_text: String,

    /// Summary carried by annotated input, or filled in by the summarizer
    pub summary: Option<String>,

    /// Metadata embedded in annotated input; all-unknown for raw captions
    pub metadata: VideoMetadata,
}

impl NormalizedDocument {
    /// Whether the source produced any caption text at all
    pub fn is_empty(&self) -> bool {
        self.raw_text.is_empty()
    }
}

// @struct: Caption normalization entry point
pub struct CaptionProcessor;

impl CaptionProcessor {
    /// Normalize the raw content of one source file.
    ///
    /// The input shape is detected by content inspection: an annotated
    /// document (a previously produced `.txt` being re-ingested) is parsed
    /// by its section markers; anything else is treated as caption blocks.
    /// Input that yields no parseable block falls back to stripping timing
    /// lines from the whole content, so the normalizer always produces a
    /// document, possibly with empty `raw_text`.
    pub fn normalize(raw_content: &str, source_name: &str) -> NormalizedDocument {
        if Self::is_annotated(raw_content) {
            return Self::parse_annotated(raw_content, source_name);
        }

        let blocks = Self::parse_blocks(raw_content);
        let raw_text = if blocks.is_empty() {
            Self::strip_timing_lines(raw_content)
        } else {
            Self::deduplicate_blocks(&blocks).join(" ")
        };

        NormalizedDocument {
            source_name: source_name.to_string(),
            display_text: Self::frame_display_text(source_name, &raw_text),
            raw_text,
            summary: None,
            metadata: VideoMetadata::unknown(),
        }
    }

    /// Check whether content carries the annotated-document section markers
    fn is_annotated(content: &str) -> bool {
        content.contains(METADATA_MARKER) && content.contains(TRANSCRIPT_MARKER)
    }

    /// Parse caption blocks out of SRT-style content.
    ///
    /// Malformed blocks (missing index or unparsable timing line) are
    /// skipped with a warning; they never fail the whole file.
    pub fn parse_blocks(content: &str) -> Vec<CaptionBlock> {
        let mut blocks = Vec::new();

        let mut current_seq: Option<usize> = None;
        let mut current_times: Option<(u64, u64)> = None;
        let mut current_lines: Vec<String> = Vec::new();

        for line in content.lines() {
            let trimmed = line.trim();

            if trimmed.is_empty() {
                match (current_seq, current_times, current_lines.is_empty()) {
                    (Some(seq), Some((start, end)), false) => {
                        blocks.push(CaptionBlock {
                            seq_num: seq,
                            start_time_ms: start,
                            end_time_ms: end,
                            lines: std::mem::take(&mut current_lines),
                        });
                    }
                    (Some(seq), _, _) => {
                        warn!("Skipping malformed caption block {}", seq);
                    }
                    _ => {}
                }
                current_seq = None;
                current_times = None;
                current_lines.clear();
                continue;
            }

            // A new block starts with its sequence number
            if current_seq.is_none() && current_lines.is_empty() {
                if let Ok(num) = trimmed.parse::<usize>() {
                    current_seq = Some(num);
                    continue;
                }
            }

            // Then the timing line
            if current_seq.is_some() && current_times.is_none() {
                if let Some(caps) = TIMESTAMP_REGEX.captures(trimmed) {
                    current_times = Some((
                        Self::timestamp_to_ms(&caps, 1),
                        Self::timestamp_to_ms(&caps, 5),
                    ));
                    continue;
                }
            }

            // Everything else inside a block is display text
            if current_times.is_some() {
                let cleaned = MARKUP_REGEX.replace_all(trimmed, "");
                let cleaned = cleaned.trim();
                if !cleaned.is_empty() {
                    current_lines.push(cleaned.to_string());
                }
            } else {
                debug!("Ignoring text outside a caption block: {}", trimmed);
            }
        }

        // Final block when the file does not end with a blank line
        if let (Some(seq), Some((start, end))) = (current_seq, current_times) {
            if !current_lines.is_empty() {
                blocks.push(CaptionBlock {
                    seq_num: seq,
                    start_time_ms: start,
                    end_time_ms: end,
                    lines: current_lines,
                });
            }
        }

        blocks
    }

    /// Remove roll-up repetition across consecutive blocks.
    ///
    /// Streaming captions re-display trailing portions of the previous cue
    /// together with new words. Each block is compared against the block
    /// before it and only the genuinely new fragment is emitted:
    ///
    /// - the current text literally restates the whole previous text:
    ///   emit the remainder only;
    /// - the current first line re-displays the previous last line
    ///   (scrolled cue): drop that one line;
    /// - the previous lines are a line-for-line prefix of the current
    ///   lines: drop exactly that many leading lines;
    /// - otherwise the block is unrelated and is emitted unchanged.
    ///
    /// The first block has no predecessor and is emitted unconditionally.
    pub fn deduplicate_blocks(blocks: &[CaptionBlock]) -> Vec<String> {
        let mut fragments: Vec<String> = Vec::new();

        for (idx, block) in blocks.iter().enumerate() {
            if idx == 0 {
                fragments.extend(block.lines.iter().cloned());
                continue;
            }

            let prev = &blocks[idx - 1];
            let prev_text = prev.text();
            let cur_text = block.text();

            if cur_text.starts_with(&prev_text) {
                let remainder = cur_text[prev_text.len()..].trim();
                if !remainder.is_empty() {
                    fragments.push(remainder.to_string());
                }
                continue;
            }

            if block.lines.first() == prev.lines.last() {
                fragments.extend(block.lines[1..].iter().cloned());
                continue;
            }

            if prev.lines.len() <= block.lines.len()
                && block.lines[..prev.lines.len()] == prev.lines[..]
            {
                fragments.extend(block.lines[prev.lines.len()..].iter().cloned());
                continue;
            }

            fragments.extend(block.lines.iter().cloned());
        }

        fragments
    }

    /// Wrap raw text in the header/footer frame used by consolidated output
    pub fn frame_display_text(source_name: &str, raw_text: &str) -> String {
        format!(
            "\n\n{rule}\nINÍCIO DO VÍDEO: {name}\n{rule}\n{text}\n{rule}\nFIM DO VÍDEO: {name}\n{rule}\n",
            rule = FRAME_RULE,
            name = source_name,
            text = raw_text,
        )
    }

    /// Last-resort cleanup for content that is neither parseable caption
    /// blocks nor an annotated document: drop index/timing line pairs and
    /// markup, join the surviving lines with single spaces.
    fn strip_timing_lines(content: &str) -> String {
        let cleaned = TIMING_BLOCK_REGEX.replace_all(content, "");
        let cleaned = MARKUP_REGEX.replace_all(&cleaned, "");

        cleaned
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Parse an annotated document back into a normalized document.
    ///
    /// Markers split the content into a metadata block (`KEY: value` pairs),
    /// an optional summary, and the transcription body. The body is
    /// whitespace-normalized, which makes re-ingestion stable: normalizing
    /// an annotated document again yields the same `raw_text`.
    fn parse_annotated(content: &str, source_name: &str) -> NormalizedDocument {
        #[derive(PartialEq)]
        enum Section {
            Preamble,
            Metadata,
            Summary,
            Transcript,
        }

        let mut metadata = VideoMetadata::unknown();
        let mut summary_lines: Vec<&str> = Vec::new();
        let mut transcript_lines: Vec<&str> = Vec::new();
        let mut section = Section::Preamble;

        for line in content.lines() {
            let trimmed = line.trim();

            if trimmed == METADATA_MARKER {
                section = Section::Metadata;
                continue;
            }
            if trimmed.starts_with(SUMMARY_MARKER_PREFIX) {
                section = Section::Summary;
                continue;
            }
            if trimmed == TRANSCRIPT_MARKER {
                section = Section::Transcript;
                continue;
            }

            match section {
                Section::Metadata => {
                    if let Some((key, value)) = trimmed.split_once(':') {
                        metadata.set_field(key.trim(), value.trim());
                    }
                }
                Section::Summary => summary_lines.push(trimmed),
                Section::Transcript => transcript_lines.push(line),
                Section::Preamble => {}
            }
        }

        let raw_text = transcript_lines
            .join("\n")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        let summary = {
            let joined = summary_lines.join("\n").trim().to_string();
            if joined.is_empty() { None } else { Some(joined) }
        };

        NormalizedDocument {
            source_name: source_name.to_string(),
            display_text: Self::frame_display_text(source_name, &raw_text),
            raw_text,
            summary,
            metadata,
        }
    }

    /// Convert a captured timestamp to milliseconds
    fn timestamp_to_ms(caps: &regex::Captures, start_idx: usize) -> u64 {
        let hours: u64 = caps.get(start_idx).map_or(0, |m| m.as_str().parse().unwrap_or(0));
        let minutes: u64 = caps.get(start_idx + 1).map_or(0, |m| m.as_str().parse().unwrap_or(0));
        let seconds: u64 = caps.get(start_idx + 2).map_or(0, |m| m.as_str().parse().unwrap_or(0));
        let millis: u64 = caps.get(start_idx + 3).map_or(0, |m| m.as_str().parse().unwrap_or(0));

        (hours * 3600 + minutes * 60 + seconds) * 1000 + millis
    }
}
