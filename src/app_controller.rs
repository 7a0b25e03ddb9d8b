use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use crate::app_config::Config;
use crate::annotated_writer;
use crate::file_utils::{self, Channel, FileManager};
use crate::summarization::{BatchNormalizer, NormalizedBatchItem, PLACEHOLDER_SUMMARY, SummarizationService};
use crate::volume_packer::{PackSummary, VolumePacker};
use crate::volume_sink::{FileVolumeSink, VolumeSink};

// @module: Application controller for transcript consolidation

/// Main application controller for transcript cleaning and consolidation
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    /// Create a new controller for test purposes with default configuration
    pub fn new_for_test() -> Result<Self> {
        let mut config = Config::default();
        config.summarization.enabled = false;
        Self::with_config(config)
    }

    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        Ok(Self { config })
    }

    /// Build the summarization service, or None when summaries are disabled
    fn build_summarizer(&self) -> Result<Option<Arc<SummarizationService>>> {
        if !self.config.summarization.enabled {
            debug!("Summarization disabled, documents will carry no summaries");
            return Ok(None);
        }
        let service = SummarizationService::new(self.config.summarization.clone())
            .context("Failed to build summarization service")?;
        Ok(Some(Arc::new(service)))
    }

    /// Extensions eligible as consolidation sources
    fn eligible_extensions(&self) -> Vec<String> {
        let mut extensions = self.config.processing.source_extensions.clone();
        if self.config.processing.include_annotated
            && !extensions.iter().any(|e| e.eq_ignore_ascii_case("txt"))
        {
            extensions.push("txt".to_string());
        }
        extensions
    }

    /// Run the per-file clean workflow on one directory.
    ///
    /// Every subtitle file is normalized, enriched with sidecar metadata,
    /// optionally summarized, and written as an annotated `.txt` next to the
    /// source. Sources are archived only when their document was durably
    /// written with a real (non-placeholder) summary, so a failed summary
    /// can be retried on a later run.
    pub async fn run_clean(
        &self,
        input_dir: PathBuf,
        force_overwrite: bool,
        archive: bool,
    ) -> Result<()> {
        let start_time = std::time::Instant::now();

        if !input_dir.is_dir() {
            return Err(anyhow::anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        let files = FileManager::find_source_files(
            &input_dir,
            &self.config.processing.source_extensions,
        )?;
        if files.is_empty() {
            info!("No subtitle files found in {:?}", input_dir);
            return Ok(());
        }
        info!("Found {} subtitle file(s) in {:?}", files.len(), input_dir);

        // Skip files whose annotated output already exists
        let mut skip_count = 0;
        let pending: Vec<PathBuf> = files
            .into_iter()
            .filter(|file| {
                let output = file.with_extension("txt");
                if output.exists() && !force_overwrite {
                    warn!(
                        "Skipping {}, output already exists (use -f to force overwrite)",
                        file.display()
                    );
                    skip_count += 1;
                    false
                } else {
                    true
                }
            })
            .collect();

        if pending.is_empty() {
            info!("Nothing to do: {} file(s) already annotated", skip_count);
            return Ok(());
        }

        let summarizer = self.build_summarizer()?;
        let progress_bar = Self::new_progress_bar(pending.len() as u64, "files");
        let pb = progress_bar.clone();

        let batch = BatchNormalizer::new(
            summarizer,
            self.config.summarization.optimal_concurrent_requests(),
        );
        let items = batch
            .normalize_files(&pending, move |completed, _total| {
                pb.set_position(completed as u64);
            })
            .await;
        progress_bar.finish_and_clear();

        let mut error_count = pending.len() - items.len();
        let mut written_count = 0;
        let mut to_archive: Vec<PathBuf> = Vec::new();

        for item in items {
            match self.write_annotated_document(&item) {
                Ok(output_path) => {
                    written_count += 1;
                    info!(
                        "Annotated: {} -> {}",
                        item.document.source_name,
                        output_path.display()
                    );
                    if archive && !item.summary_degraded {
                        to_archive.push(item.source_path.clone());
                    } else if archive {
                        warn!(
                            "Keeping {} for retry, its summary was unavailable",
                            item.document.source_name
                        );
                    }
                }
                Err(e) => {
                    error!("Failed to write document for {}: {}", item.document.source_name, e);
                    error_count += 1;
                }
            }
        }

        let archived_count = self.archive_sources(&input_dir, &to_archive);

        info!(
            "Clean completed in {}: {} annotated, {} skipped, {} archived, {} errors",
            Self::format_duration(start_time.elapsed()),
            written_count,
            skip_count,
            archived_count,
            error_count
        );

        Ok(())
    }

    /// Render and write the annotated document for one normalized source
    fn write_annotated_document(&self, item: &NormalizedBatchItem) -> Result<PathBuf> {
        let fallback_title = item
            .source_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| item.document.source_name.clone());

        let resolved = item.document.metadata.clone().resolve(&fallback_title);
        let summary_text = item
            .document
            .summary
            .clone()
            .unwrap_or_else(|| PLACEHOLDER_SUMMARY.to_string());

        let content = annotated_writer::render_annotated_document(
            &resolved,
            &summary_text,
            &item.document.raw_text,
        );

        let output_path = item.source_path.with_extension("txt");
        FileManager::write_to_file(&output_path, &content)?;
        Ok(output_path)
    }

    /// Move fully processed sources into the archive directory. A source is
    /// only moved when its annotated output is actually on disk.
    fn archive_sources(&self, input_dir: &Path, sources: &[PathBuf]) -> usize {
        if sources.is_empty() {
            return 0;
        }

        let archive_dir = input_dir.join(&self.config.processing.archive_dir);
        let mut archived = 0;

        for source in sources {
            let output = source.with_extension("txt");
            if !output.exists() {
                error!(
                    "Annotated output missing for {}, not archiving",
                    source.display()
                );
                continue;
            }

            match FileManager::archive_file(source, &archive_dir) {
                Ok(target) => {
                    debug!("Archived {} -> {}", source.display(), target.display());
                    archived += 1;
                }
                Err(e) => error!("Failed to archive {}: {}", source.display(), e),
            }
        }

        archived
    }

    /// Run the consolidation workflow over every channel under a base
    /// directory. Channels are independent and processed one at a time; a
    /// failing channel is reported and does not stop the others.
    pub async fn run_consolidate(&self, base_dir: PathBuf, archive: bool) -> Result<()> {
        let start_time = std::time::Instant::now();

        if !base_dir.is_dir() {
            return Err(anyhow::anyhow!("Input directory does not exist: {:?}", base_dir));
        }

        let extensions = self.eligible_extensions();
        let channels = file_utils::discover_channels(
            &base_dir,
            &extensions,
            &self.config.processing.archive_dir,
        )?;
        if channels.is_empty() {
            return Err(anyhow::anyhow!(
                "No eligible source files found under {:?}",
                base_dir
            ));
        }

        let summarizer = self.build_summarizer()?;
        let multi_progress = MultiProgress::new();

        let mut volumes_total = 0;
        let mut documents_total = 0;
        let mut error_count = 0;

        for channel in &channels {
            info!("Consolidating channel: {}", channel.name);
            match self
                .consolidate_channel(channel, &extensions, summarizer.clone(), archive, &multi_progress)
                .await
            {
                Ok(summary) => {
                    volumes_total += summary.volumes_sealed;
                    documents_total += summary.documents_packed;
                }
                Err(e) => {
                    error!("Error consolidating channel {}: {}", channel.name, e);
                    error_count += 1;
                }
            }
        }

        info!(
            "Consolidation completed in {}: {} volume(s) from {} document(s) across {} channel(s), {} errors",
            Self::format_duration(start_time.elapsed()),
            volumes_total,
            documents_total,
            channels.len(),
            error_count
        );

        Ok(())
    }

    /// Consolidate one channel: normalize its sources on the worker pool,
    /// then pack sequentially, writing each sealed volume before moving on.
    /// Member sources are archived only after their volume has been durably
    /// written.
    async fn consolidate_channel(
        &self,
        channel: &Channel,
        extensions: &[String],
        summarizer: Option<Arc<SummarizationService>>,
        archive: bool,
        multi_progress: &MultiProgress,
    ) -> Result<PackSummary> {
        let files = FileManager::find_source_files(&channel.dir, extensions)?;
        if files.is_empty() {
            debug!("Channel {} has no eligible files", channel.name);
            return Ok(PackSummary::default());
        }

        let progress_bar = multi_progress.add(Self::new_progress_bar(files.len() as u64, "files"));
        progress_bar.set_message(format!("Normalizing: {}", channel.name));
        let pb = progress_bar.clone();

        let batch = BatchNormalizer::new(
            summarizer,
            self.config.summarization.optimal_concurrent_requests(),
        );
        let items = batch
            .normalize_files(&files, move |completed, _total| {
                pb.set_position(completed as u64);
            })
            .await;
        progress_bar.finish_and_clear();

        if items.is_empty() {
            warn!("Channel {} produced no usable documents", channel.name);
            return Ok(PackSummary::default());
        }

        // The packer deals in source names; keep the paths for archiving
        let path_by_source: HashMap<String, PathBuf> = items
            .iter()
            .map(|item| (item.document.source_name.clone(), item.source_path.clone()))
            .collect();
        let documents = items.into_iter().map(|item| item.document);

        let output_dir = self
            .config
            .processing
            .output_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| channel.dir.clone());
        let mut sink = FileVolumeSink::new(output_dir);
        let archive_dir = channel.dir.join(&self.config.processing.archive_dir);

        let packer = VolumePacker::new(
            channel.name.clone(),
            self.config.packing.max_volume_chars,
            self.config.packing.overflow_policy,
        );

        packer.pack(documents, |volume| {
            // A failed write propagates out of pack() before any member of
            // this volume is archived
            sink.write_volume(&volume)?;

            if archive {
                for source in &volume.member_sources {
                    if let Some(path) = path_by_source.get(source) {
                        match FileManager::archive_file(path, &archive_dir) {
                            Ok(_) => debug!("Archived {}", source),
                            Err(e) => warn!("Failed to archive {}: {}", source, e),
                        }
                    }
                }
            }

            Ok(())
        })
    }

    fn new_progress_bar(len: u64, unit: &str) -> ProgressBar {
        let progress_bar = ProgressBar::new(len);
        let template = format!(
            "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {unit} ({{percent}}%) {{msg}}"
        );
        let style = ProgressStyle::default_bar()
            .template(&template)
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));
        progress_bar
    }

    // Format duration in a human-readable format
    fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
