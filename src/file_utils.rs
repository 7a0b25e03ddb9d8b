use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use log::{debug, warn};

// @module: File and directory utilities

/// Prefix of consolidated volume outputs; never re-ingested as a source
pub const CONSOLIDATED_PREFIX: &str = "CONSOLIDADO_";

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    /// Read a file to a string, replacing invalid UTF-8 sequences.
    ///
    /// Subtitle downloads occasionally carry broken encodings; a bad byte
    /// sequence degrades to a replacement character instead of failing the
    /// whole document.
    pub fn read_to_string_lossy<P: AsRef<Path>>(path: P) -> Result<String> {
        let bytes = fs::read(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;

        Ok(())
    }

    /// List eligible source files directly inside a directory.
    ///
    /// Non-recursive; matching is by extension (case-insensitive); the
    /// tool's own consolidated outputs are excluded. The result is sorted
    /// lexicographically by file name so volume numbering is reproducible.
    pub fn find_source_files<P: AsRef<Path>>(dir: P, extensions: &[String]) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).max_depth(1).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if !path.is_file() {
                continue;
            }

            let file_name = match path.file_name().and_then(|n| n.to_str()) {
                Some(name) => name,
                None => continue,
            };
            if file_name.starts_with(CONSOLIDATED_PREFIX) {
                debug!("Excluding consolidated output from sources: {}", file_name);
                continue;
            }

            let matches_ext = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| extensions.iter().any(|e| ext.eq_ignore_ascii_case(e)))
                .unwrap_or(false);
            if matches_ext {
                result.push(path.to_path_buf());
            }
        }

        result.sort_by_key(|path| path.file_name().map(|n| n.to_os_string()));
        Ok(result)
    }

    /// Move a source file into the archive directory, creating it if
    /// needed. Falls back to copy-and-remove when a plain rename fails
    /// (e.g. archive directory on another filesystem).
    pub fn archive_file<P1: AsRef<Path>, P2: AsRef<Path>>(
        file: P1,
        archive_dir: P2,
    ) -> Result<PathBuf> {
        let file = file.as_ref();
        let archive_dir = archive_dir.as_ref();

        let file_name = file
            .file_name()
            .ok_or_else(|| anyhow::anyhow!("Cannot archive a path without a file name: {:?}", file))?;

        Self::ensure_dir(archive_dir)?;
        let target = archive_dir.join(file_name);

        if fs::rename(file, &target).is_err() {
            fs::copy(file, &target)
                .with_context(|| format!("Failed to copy {:?} into archive", file))?;
            fs::remove_file(file)
                .with_context(|| format!("Failed to remove {:?} after archiving", file))?;
        }

        Ok(target)
    }
}

/// A named, flat grouping of source files
#[derive(Debug, Clone)]
pub struct Channel {
    /// Channel label, the directory basename by convention
    pub name: String,

    /// Directory holding the channel's source files
    pub dir: PathBuf,
}

/// Discover the channels under a base directory: the base directory itself
/// (named after its basename) when it directly contains eligible files,
/// plus every immediate subdirectory that does. Hidden directories and the
/// archive directory are skipped.
pub fn discover_channels(
    base: &Path,
    extensions: &[String],
    archive_dir_name: &str,
) -> Result<Vec<Channel>> {
    let mut channels = Vec::new();

    if !FileManager::find_source_files(base, extensions)?.is_empty() {
        let name = fs::canonicalize(base)
            .ok()
            .and_then(|abs| abs.file_name().map(|n| n.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "channel".to_string());
        channels.push(Channel {
            name,
            dir: base.to_path_buf(),
        });
    }

    let mut subdirs: Vec<PathBuf> = fs::read_dir(base)
        .with_context(|| format!("Failed to read directory: {:?}", base))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    subdirs.sort();

    for dir in subdirs {
        let name = match dir.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => continue,
        };
        if name.starts_with('.') || name == archive_dir_name {
            continue;
        }

        if FileManager::find_source_files(&dir, extensions)?.is_empty() {
            warn!("Skipping channel directory with no eligible files: {}", name);
            continue;
        }

        channels.push(Channel { name, dir });
    }

    Ok(channels)
}
