use std::path::{Path, PathBuf};
use anyhow::Result;
use log::info;

use crate::file_utils::FileManager;
use crate::volume_packer::Volume;

// @module: Persistence of sealed volumes

/// Destination for sealed volumes.
///
/// The packer's caller hands each sealed volume to a sink exactly once; a
/// write failure must prevent archival of that volume's member sources.
pub trait VolumeSink {
    /// Durably write one volume, returning the path it was written to
    fn write_volume(&mut self, volume: &Volume) -> Result<PathBuf>;
}

/// File name of a consolidated volume
pub fn volume_file_name(channel_name: &str, volume_number: usize) -> String {
    format!("CONSOLIDADO_{}_VOL_{:03}.txt", channel_name, volume_number)
}

/// Render a volume to its on-disk form: a channel/volume header, the
/// per-source summaries when present, then the accumulated framed text.
pub fn render_volume(volume: &Volume) -> String {
    let mut out = format!(
        "CANAL: {} | VOLUME: {}\n",
        volume.channel_name, volume.volume_number
    );

    if !volume.summaries.is_empty() {
        out.push_str("RESUMO DO VOLUME:\n");
        out.push_str(&volume.summaries.join("\n\n"));
        out.push('\n');
    }

    // Accumulated text opens with its own frame separator
    out.push_str(&volume.accumulated_text);
    out
}

/// Sink writing `CONSOLIDADO_<channel>_VOL_NNN.txt` files into a directory
pub struct FileVolumeSink {
    output_dir: PathBuf,
}

impl FileVolumeSink {
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Self {
        FileVolumeSink {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }
}

impl VolumeSink for FileVolumeSink {
    fn write_volume(&mut self, volume: &Volume) -> Result<PathBuf> {
        let path = self
            .output_dir
            .join(volume_file_name(&volume.channel_name, volume.volume_number));

        FileManager::write_to_file(&path, &render_volume(volume))?;
        info!(
            "Volume written: {} ({} sources, {} chars)",
            path.display(),
            volume.member_sources.len(),
            volume.char_count()
        );

        Ok(path)
    }
}
