/*!
 * Core summarization service implementation.
 *
 * This module contains the main SummarizationService struct and its
 * implementation, which produces executive summaries of cleaned transcripts
 * using various AI providers.
 */

use anyhow::Result;
use log::warn;

use crate::app_config::{SummarizationConfig, SummarizerProvider as ConfigSummarizerProvider};
use crate::errors::{ProviderError, SummaryError};
use crate::providers::Provider;
use crate::providers::gemini::{Gemini, GeminiRequest};
use crate::providers::mock::{MockBehavior, MockProvider, MockRequest};
use crate::providers::ollama::{GenerationRequest, Ollama};

/// Summary text used when the provider failed or returned nothing.
/// The placeholder is the degrade-gracefully signal: the pipeline keeps
/// going, the affected source is simply not marked fully successful.
pub const PLACEHOLDER_SUMMARY: &str = "Resumo indisponível.";

/// Summary text for inputs too short to be worth a provider call
pub const SHORT_INPUT_SUMMARY: &str = "Texto muito curto para gerar resumo.";

/// Inputs below this size skip the provider entirely
const MIN_SUMMARY_INPUT_CHARS: usize = 50;

/// Summarization provider implementation variants
enum SummarizerImpl {
    /// Google Gemini API service
    Gemini {
        /// Client instance
        client: Gemini,
    },

    /// Ollama local LLM service
    Ollama {
        /// Client instance
        client: Ollama,
    },

    /// Deterministic mock, for tests
    Mock {
        /// Client instance
        client: MockProvider,
    },
}

/// Result of a degrade-gracefully summarization attempt
#[derive(Debug, Clone)]
pub struct SummaryOutcome {
    /// The summary text, or the placeholder
    pub text: String,

    /// Whether the provider failed and the placeholder was substituted
    pub degraded: bool,
}

/// Main summarization service for transcript summaries
pub struct SummarizationService {
    /// Provider implementation
    provider: SummarizerImpl,

    /// Configuration for the summarization service
    pub config: SummarizationConfig,
}

impl SummarizationService {
    /// Create a new summarization service with the given configuration
    pub fn new(config: SummarizationConfig) -> Result<Self> {
        let timeout_secs = config.get_timeout_secs();
        let retry_count = config.common.retry_count;
        let retry_backoff_ms = config.common.retry_backoff_ms;

        let provider = match config.provider {
            ConfigSummarizerProvider::Gemini => SummarizerImpl::Gemini {
                client: Gemini::new_with_config(
                    config.get_api_key(),
                    config.get_endpoint(),
                    timeout_secs,
                    retry_count,
                    retry_backoff_ms,
                ),
            },
            ConfigSummarizerProvider::Ollama => SummarizerImpl::Ollama {
                client: Ollama::new_with_config(
                    config.get_endpoint(),
                    timeout_secs,
                    retry_count,
                    retry_backoff_ms,
                ),
            },
        };

        Ok(Self { provider, config })
    }

    /// Create a service backed by the mock provider - used by tests and
    /// external consumers that need offline behavior
    pub fn with_mock(behavior: MockBehavior) -> Self {
        Self {
            provider: SummarizerImpl::Mock {
                client: MockProvider::new(behavior),
            },
            config: SummarizationConfig::default(),
        }
    }

    /// Generate a summary for a cleaned transcript.
    ///
    /// Inputs shorter than the minimum are answered locally without a
    /// provider call. Longer inputs are truncated to the configured
    /// maximum before templating.
    pub async fn summarize(&self, text: &str) -> Result<String, SummaryError> {
        let trimmed = text.trim();
        if trimmed.chars().count() < MIN_SUMMARY_INPUT_CHARS {
            return Ok(SHORT_INPUT_SUMMARY.to_string());
        }

        let excerpt = truncate_chars(trimmed, self.config.get_max_input_chars());
        let prompt = self
            .config
            .common
            .prompt_template
            .replace("{transcript}", &excerpt);

        let summary = match &self.provider {
            SummarizerImpl::Gemini { client } => {
                let request = GeminiRequest::new(self.config.get_model(), prompt)
                    .temperature(self.config.common.temperature);
                let response = client.complete(request).await?;
                Gemini::extract_text_from_response(&response)
            }
            SummarizerImpl::Ollama { client } => {
                let request = GenerationRequest::new(self.config.get_model(), prompt)
                    .temperature(self.config.common.temperature);
                let response = client.generate(request).await?;
                response.response
            }
            SummarizerImpl::Mock { client } => {
                let response = client.complete(MockRequest { text: prompt }).await?;
                response.text
            }
        };

        let summary = summary.trim().to_string();
        if summary.is_empty() {
            return Err(SummaryError::EmptyResponse);
        }

        Ok(summary)
    }

    /// Summarize, degrading to the placeholder on any failure.
    ///
    /// Summarization must never abort the pipeline: a provider failure is
    /// logged and signalled through `degraded` so the caller can withhold
    /// archival and allow a retry on a later run.
    pub async fn summarize_or_placeholder(&self, source_name: &str, text: &str) -> SummaryOutcome {
        match self.summarize(text).await {
            Ok(text) => SummaryOutcome {
                text,
                degraded: false,
            },
            Err(e) => {
                warn!("Summary unavailable for {}: {}", source_name, e);
                SummaryOutcome {
                    text: PLACEHOLDER_SUMMARY.to_string(),
                    degraded: true,
                }
            }
        }
    }

    /// Test the connection to the summarization provider
    pub async fn test_connection(&self) -> Result<(), ProviderError> {
        match &self.provider {
            SummarizerImpl::Gemini { client } => client.test_connection().await,
            SummarizerImpl::Ollama { client } => client.test_connection().await,
            SummarizerImpl::Mock { client } => client.test_connection().await,
        }
    }
}

/// Truncate a string to at most `max` characters, on a char boundary
fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        text.chars().take(max).collect()
    }
}
