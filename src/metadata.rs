use std::path::Path;
use log::{debug, warn};
use serde::Deserialize;

// @module: Sidecar and embedded metadata resolution

/// Sentinel for a date that could not be resolved
pub const UNKNOWN_DATE: &str = "Desconhecida";

/// Sentinel for an id that could not be resolved
pub const UNKNOWN_ID: &str = "N/A";

/// Descriptive metadata for one source file.
///
/// Fields are optional; a missing value means "unknown" and is replaced by
/// an explicit sentinel (or the source base name, for the title) only at
/// [`VideoMetadata::resolve`] time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoMetadata {
    /// Upload date, as carried by the source (`YYYYMMDD` or preformatted)
    pub date: Option<String>,

    /// Video title
    pub title: Option<String>,

    /// Video identifier assigned by the platform
    pub id: Option<String>,
}

/// Metadata with every field resolved to a displayable value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMetadata {
    pub date: String,
    pub title: String,
    pub id: String,
}

impl VideoMetadata {
    /// Metadata with every field unknown
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Whether no field carries a value
    pub fn is_unknown(&self) -> bool {
        self.date.is_none() && self.title.is_none() && self.id.is_none()
    }

    /// Set a field from an embedded `KEY: value` pair. Unrecognized keys
    /// and empty values are ignored.
    pub fn set_field(&mut self, key: &str, value: &str) {
        if value.is_empty() {
            return;
        }
        match key {
            "DATA" => self.date = Some(value.to_string()),
            "TÍTULO" | "TITULO" => self.title = Some(value.to_string()),
            "ID" => self.id = Some(value.to_string()),
            other => debug!("Ignoring unknown metadata key: {}", other),
        }
    }

    /// Merge with a lower-precedence source: values already present win,
    /// the fallback only fills in missing fields.
    pub fn merged_with(self, fallback: VideoMetadata) -> VideoMetadata {
        VideoMetadata {
            date: self.date.or(fallback.date),
            title: self.title.or(fallback.title),
            id: self.id.or(fallback.id),
        }
    }

    /// Resolve every field to a displayable value. The title falls back to
    /// the source base name, the other fields to their sentinels.
    pub fn resolve(self, fallback_title: &str) -> ResolvedMetadata {
        ResolvedMetadata {
            date: format_upload_date(self.date.as_deref().unwrap_or(UNKNOWN_DATE)),
            title: self.title.unwrap_or_else(|| fallback_title.to_string()),
            id: self.id.unwrap_or_else(|| UNKNOWN_ID.to_string()),
        }
    }
}

/// Reformat an 8-digit `YYYYMMDD` date to `YYYY-MM-DD`. Every other shape
/// (already formatted dates, sentinels) passes through unchanged.
pub fn format_upload_date(raw: &str) -> String {
    if raw.len() == 8 && raw.bytes().all(|b| b.is_ascii_digit()) {
        format!("{}-{}-{}", &raw[0..4], &raw[4..6], &raw[6..8])
    } else {
        raw.to_string()
    }
}

/// Shape of the relevant fields in a `.info.json` sidecar file
#[derive(Debug, Deserialize)]
struct SidecarInfo {
    upload_date: Option<String>,
    title: Option<String>,
    id: Option<String>,
}

/// Candidate sidecar file names for a source base name.
///
/// Downloaders name sidecars after the media file, which may carry extra
/// suffixes the subtitle file does not share (language codes, format tags),
/// so the base name is progressively shortened: first dropping `.`-separated
/// suffixes, then `-`-separated ones.
pub fn sidecar_candidates(base_name: &str) -> Vec<String> {
    let mut candidates = Vec::new();
    let mut current = base_name.to_string();

    candidates.push(format!("{}.info.json", current));
    while let Some(pos) = current.rfind('.') {
        current.truncate(pos);
        if !current.is_empty() {
            candidates.push(format!("{}.info.json", current));
        }
    }
    while let Some(pos) = current.rfind('-') {
        current.truncate(pos);
        if !current.is_empty() {
            candidates.push(format!("{}.info.json", current));
        }
    }

    candidates
}

/// Best-effort lookup of the sidecar metadata for a source file.
///
/// A missing, unreadable or unparsable sidecar degrades to all-unknown
/// metadata; this function never fails.
pub fn lookup_sidecar(source_path: &Path) -> VideoMetadata {
    let dir = match source_path.parent() {
        Some(dir) => dir,
        None => return VideoMetadata::unknown(),
    };
    let base_name = match source_path.file_stem().and_then(|stem| stem.to_str()) {
        Some(stem) => stem,
        None => return VideoMetadata::unknown(),
    };

    for candidate in sidecar_candidates(base_name) {
        let path = dir.join(&candidate);
        if !path.is_file() {
            continue;
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<SidecarInfo>(&content) {
                Ok(info) => {
                    debug!("Resolved sidecar metadata from {}", path.display());
                    return VideoMetadata {
                        date: info.upload_date.filter(|v| !v.is_empty()),
                        title: info.title.filter(|v| !v.is_empty()),
                        id: info.id.filter(|v| !v.is_empty()),
                    };
                }
                Err(e) => warn!("Ignoring unparsable sidecar {}: {}", path.display(), e),
            },
            Err(e) => warn!("Failed to read sidecar {}: {}", path.display(), e),
        }
    }

    VideoMetadata::unknown()
}
