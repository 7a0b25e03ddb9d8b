/*!
 * Summarization service for transcript summaries using AI providers.
 *
 * This module contains the functionality for generating executive summaries
 * of cleaned transcripts. It is split into two submodules:
 *
 * - `core`: Core summarization service and degrade-gracefully wrapper
 * - `batch`: Bounded worker pool running normalize+summarize per document
 */

// Re-export main types for easier usage
pub use self::batch::{BatchNormalizer, NormalizedBatchItem};
pub use self::core::{
    SummarizationService, SummaryOutcome, PLACEHOLDER_SUMMARY, SHORT_INPUT_SUMMARY,
};

// Submodules
pub mod batch;
pub mod core;
