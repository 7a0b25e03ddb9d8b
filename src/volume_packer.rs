use anyhow::Result;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::caption_processor::NormalizedDocument;

// @module: Greedy packing of normalized documents into size-bounded volumes

/// A size-bounded consolidation unit for one channel.
///
/// Volumes are owned by the packer while they grow; sealing hands the
/// finished volume to the caller and the packer never reads it again.
#[derive(Debug, Clone)]
pub struct Volume {
    /// Channel this volume belongs to
    pub channel_name: String,

    /// 1-based volume number, strictly increasing per channel
    pub volume_number: usize,

    /// Concatenated display text of every member document, in input order
    pub accumulated_text: String,

    /// Source identifiers of the member documents, in input order
    pub member_sources: Vec<String>,

    /// Per-source summaries, present when summarization is enabled
    pub summaries: Vec<String>,
}

impl Volume {
    fn new(channel_name: &str, volume_number: usize) -> Self {
        Volume {
            channel_name: channel_name.to_string(),
            volume_number,
            accumulated_text: String::new(),
            member_sources: Vec::new(),
            summaries: Vec::new(),
        }
    }

    /// Whether any document has been appended yet
    pub fn is_empty(&self) -> bool {
        self.member_sources.is_empty()
    }

    /// Current size of the accumulated text
    pub fn char_count(&self) -> usize {
        self.accumulated_text.len()
    }

    fn append(&mut self, document: NormalizedDocument) {
        self.accumulated_text.push_str(&document.display_text);
        self.member_sources.push(document.source_name);
        if let Some(summary) = document.summary {
            self.summaries.push(summary);
        }
    }
}

/// What to do when appending a document would push a volume past its budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverflowPolicy {
    /// Seal the current volume first and start the triggering document in a
    /// fresh one. Volumes never exceed the budget except for a single
    /// oversized document.
    #[default]
    DeferToNext,

    /// Append first, seal once the volume exceeds the budget. Volumes may
    /// overshoot by up to one document.
    SealAfterAppend,
}

/// Totals reported by a packing run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackSummary {
    /// Number of volumes handed to the sink
    pub volumes_sealed: usize,

    /// Number of documents packed
    pub documents_packed: usize,

    /// Total display-text size across all documents
    pub total_chars: usize,
}

/// Greedy, single-pass, order-preserving volume packer.
///
/// A document's display text is never split across volumes: a document
/// larger than the whole budget becomes a singleton volume that exceeds
/// the nominal limit.
pub struct VolumePacker {
    channel_name: String,
    budget: usize,
    policy: OverflowPolicy,
}

impl VolumePacker {
    pub fn new(channel_name: impl Into<String>, budget: usize, policy: OverflowPolicy) -> Self {
        VolumePacker {
            channel_name: channel_name.into(),
            budget,
            policy,
        }
    }

    /// Pack documents into volumes, invoking `on_volume_sealed` once per
    /// sealed volume, in order. A sealing failure (a sink refusing the
    /// volume) aborts the run so the caller never archives sources whose
    /// volume was not durably written.
    pub fn pack<I, F>(&self, documents: I, mut on_volume_sealed: F) -> Result<PackSummary>
    where
        I: IntoIterator<Item = NormalizedDocument>,
        F: FnMut(Volume) -> Result<()>,
    {
        let mut summary = PackSummary::default();
        let mut current = Volume::new(&self.channel_name, 1);
        let mut next_number = 2;

        for document in documents {
            let incoming = document.display_text.len();

            if self.policy == OverflowPolicy::DeferToNext
                && !current.is_empty()
                && current.char_count() + incoming > self.budget
            {
                debug!(
                    "Volume {} of {} full at {} chars, deferring {}",
                    current.volume_number,
                    self.channel_name,
                    current.char_count(),
                    document.source_name
                );
                Self::seal(current, &mut on_volume_sealed, &mut summary)?;
                current = Volume::new(&self.channel_name, next_number);
                next_number += 1;
            }

            summary.documents_packed += 1;
            summary.total_chars += incoming;
            current.append(document);

            if self.policy == OverflowPolicy::SealAfterAppend && current.char_count() > self.budget
            {
                debug!(
                    "Volume {} of {} sealed at {} chars (over budget)",
                    current.volume_number,
                    self.channel_name,
                    current.char_count()
                );
                Self::seal(current, &mut on_volume_sealed, &mut summary)?;
                current = Volume::new(&self.channel_name, next_number);
                next_number += 1;
            }
        }

        // The last volume (or the only one)
        if !current.is_empty() {
            Self::seal(current, &mut on_volume_sealed, &mut summary)?;
        }

        Ok(summary)
    }

    fn seal<F>(volume: Volume, on_volume_sealed: &mut F, summary: &mut PackSummary) -> Result<()>
    where
        F: FnMut(Volume) -> Result<()>,
    {
        summary.volumes_sealed += 1;
        on_volume_sealed(volume)
    }
}
