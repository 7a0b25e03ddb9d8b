/*!
 * Batch normalization processing.
 *
 * This module contains the bounded worker pool that normalizes (and
 * optionally summarizes) independent source files concurrently. Results
 * are collected in completion order and sorted back into input order, so
 * the sequential packing pass downstream sees a deterministic sequence.
 */

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Semaphore;
use futures::stream::{self, StreamExt};
use log::{error, warn};

use crate::caption_processor::{CaptionProcessor, NormalizedDocument};
use crate::file_utils::FileManager;
use crate::metadata;
use super::core::SummarizationService;

/// One normalized source, ready for writing or packing
#[derive(Debug, Clone)]
pub struct NormalizedBatchItem {
    /// Path the document was read from
    pub source_path: PathBuf,

    /// The normalized document, metadata merged, summary filled when a
    /// summarizer was supplied
    pub document: NormalizedDocument,

    /// Whether the summary is the degraded placeholder
    pub summary_degraded: bool,
}

/// Bounded worker pool for per-document normalization and summarization
pub struct BatchNormalizer {
    /// The summarization service to use, if summaries are wanted
    summarizer: Option<Arc<SummarizationService>>,

    /// Maximum number of concurrent workers
    max_concurrent: usize,
}

impl BatchNormalizer {
    /// Create a new batch normalizer
    pub fn new(summarizer: Option<Arc<SummarizationService>>, max_concurrent: usize) -> Self {
        Self {
            summarizer,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Normalize every file, at most `max_concurrent` at a time.
    ///
    /// Each file is a pure function of its own content plus a sidecar
    /// lookup, so workers share no mutable state. Unreadable or empty
    /// sources are skipped with a log entry and simply missing from the
    /// result; the survivors come back in input order.
    pub async fn normalize_files(
        &self,
        files: &[PathBuf],
        progress_callback: impl Fn(usize, usize) + Clone + Send + 'static,
    ) -> Vec<NormalizedBatchItem> {
        // Create a semaphore to limit concurrent workers
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));

        let total = files.len();
        let completed = Arc::new(AtomicUsize::new(0));

        let results = stream::iter(files.iter().cloned().enumerate())
            .map(|(index, path)| {
                let semaphore = semaphore.clone();
                let summarizer = self.summarizer.clone();
                let completed = completed.clone();
                let progress_callback = progress_callback.clone();

                async move {
                    // Acquire a permit from the semaphore
                    let _permit = semaphore.acquire().await.unwrap();

                    let item = normalize_one(&path, summarizer.as_deref()).await;

                    let current = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    progress_callback(current, total);

                    (index, item)
                }
            })
            .buffer_unordered(self.max_concurrent)
            .collect::<Vec<_>>()
            .await;

        // Sort results by input index to restore deterministic order
        let mut sorted_results = results;
        sorted_results.sort_by_key(|(index, _)| *index);

        sorted_results
            .into_iter()
            .filter_map(|(_, item)| item)
            .collect()
    }
}

/// Normalize a single source file: read, clean, merge sidecar metadata,
/// summarize when a service is supplied. Returns None when the source is
/// unreadable or yields no text; both are per-item failures that never
/// abort the batch.
async fn normalize_one(
    path: &Path,
    summarizer: Option<&SummarizationService>,
) -> Option<NormalizedBatchItem> {
    let source_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let raw_content = match FileManager::read_to_string_lossy(path) {
        Ok(content) => content,
        Err(e) => {
            error!("Skipping unreadable source {}: {}", source_name, e);
            return None;
        }
    };

    let mut document = CaptionProcessor::normalize(&raw_content, &source_name);
    document.metadata = document
        .metadata
        .clone()
        .merged_with(metadata::lookup_sidecar(path));

    if document.is_empty() {
        warn!("Skipping {}: no caption text after cleaning", source_name);
        return None;
    }

    let mut summary_degraded = false;
    if let Some(service) = summarizer {
        // Annotated input may already carry a summary; keep it
        if document.summary.is_none() {
            let outcome = service
                .summarize_or_placeholder(&source_name, &document.raw_text)
                .await;
            summary_degraded = outcome.degraded;
            document.summary = Some(outcome.text);
        }
    }

    Some(NormalizedBatchItem {
        source_path: path.to_path_buf(),
        document,
        summary_degraded,
    })
}
