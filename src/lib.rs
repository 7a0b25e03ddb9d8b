/*!
 * # Lexis - Subtitle Transcript Consolidation
 *
 * A Rust library for cleaning streaming-caption subtitle files and
 * consolidating them into size-bounded transcript volumes.
 *
 * ## Features
 *
 * - Parse SRT caption files and strip embedded markup
 * - Remove roll-up repetition across consecutive caption blocks
 * - Resolve metadata from `.info.json` sidecar files
 * - Generate executive summaries using AI providers:
 *   - Gemini (Google API)
 *   - Ollama (local LLM)
 * - Pack per-video transcripts into character-budgeted volumes
 * - Archive fully processed sources for safe reprocessing
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `caption_processor`: Caption parsing, deduplication and normalization
 * - `metadata`: Sidecar and embedded metadata resolution
 * - `volume_packer`: Greedy packing of documents into volumes
 * - `volume_sink`: Persistence of sealed volumes
 * - `annotated_writer`: Per-file annotated document rendering
 * - `summarization`: AI-powered transcript summaries:
 *   - `summarization::core`: Core summarization service
 *   - `summarization::batch`: Bounded worker pool over documents
 * - `file_utils`: File system operations and channel discovery
 * - `app_controller`: Main application controller
 * - `providers`: Client implementations for LLM providers:
 *   - `providers::gemini`: Gemini API client
 *   - `providers::ollama`: Ollama API client
 *   - `providers::mock`: Deterministic mock for tests
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod annotated_writer;
pub mod app_config;
pub mod app_controller;
pub mod caption_processor;
pub mod errors;
pub mod file_utils;
pub mod metadata;
pub mod providers;
pub mod summarization;
pub mod volume_packer;
pub mod volume_sink;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::Controller;
pub use caption_processor::{CaptionBlock, CaptionProcessor, NormalizedDocument};
pub use errors::{AppError, ProviderError, SummaryError};
pub use metadata::{ResolvedMetadata, VideoMetadata};
pub use summarization::SummarizationService;
pub use volume_packer::{OverflowPolicy, Volume, VolumePacker};
pub use volume_sink::{FileVolumeSink, VolumeSink};
