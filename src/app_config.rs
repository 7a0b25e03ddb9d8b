use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;

use crate::volume_packer::OverflowPolicy;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Summarization config
    #[serde(default)]
    pub summarization: SummarizationConfig,

    /// Volume packing config
    #[serde(default)]
    pub packing: PackingConfig,

    /// Source enumeration and archiving config
    #[serde(default)]
    pub processing: ProcessingConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Summarization provider type
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SummarizerProvider {
    // @provider: Google Gemini
    #[default]
    Gemini,
    // @provider: Ollama (local LLM)
    Ollama,
}

impl SummarizerProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Gemini => "Gemini",
            Self::Ollama => "Ollama",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Gemini => "gemini".to_string(),
            Self::Ollama => "ollama".to_string(),
        }
    }
}

// Implement Display trait for SummarizerProvider
impl std::fmt::Display for SummarizerProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

// Implement FromStr trait for SummarizerProvider
impl std::str::FromStr for SummarizerProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "ollama" => Ok(Self::Ollama),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    // @field: Model name
    #[serde(default = "String::new")]
    pub model: String,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Max concurrent requests
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,

    // @field: Max transcript chars sent per request
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    // @param provider_type: Provider enum
    // @returns: Provider config with defaults
    pub fn new(provider_type: SummarizerProvider) -> Self {
        match provider_type {
            SummarizerProvider::Gemini => Self {
                provider_type: "gemini".to_string(),
                model: default_gemini_model(),
                api_key: String::new(),
                endpoint: default_gemini_endpoint(),
                concurrent_requests: default_concurrent_requests(),
                max_input_chars: default_max_input_chars(),
                timeout_secs: default_gemini_timeout_secs(),
            },
            SummarizerProvider::Ollama => Self {
                provider_type: "ollama".to_string(),
                model: default_ollama_model(),
                api_key: String::new(),
                endpoint: default_ollama_endpoint(),
                concurrent_requests: default_concurrent_requests(),
                max_input_chars: default_max_input_chars(),
                timeout_secs: default_timeout_secs(),
            },
        }
    }
}

/// Summarization service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SummarizationConfig {
    /// Whether summaries are generated at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Summarization provider to use
    #[serde(default)]
    pub provider: SummarizerProvider,

    /// Available summarization providers
    #[serde(default)]
    pub available_providers: Vec<ProviderConfig>,

    /// Common summarization settings
    #[serde(default)]
    pub common: SummarizationCommonConfig,
}

/// Common summarization settings applicable to all providers
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SummarizationCommonConfig {
    /// Prompt template for summarization
    /// Placeholder: {transcript}
    #[serde(default = "default_prompt_template")]
    pub prompt_template: String,

    /// Retry count for failed requests
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Backoff base for retries (in milliseconds, doubled on each retry)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Temperature parameter for text generation (0.0 to 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for SummarizationCommonConfig {
    fn default() -> Self {
        Self {
            prompt_template: default_prompt_template(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            temperature: default_temperature(),
        }
    }
}

/// Volume packing configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PackingConfig {
    /// Character budget a volume targets before sealing
    #[serde(default = "default_max_volume_chars")]
    pub max_volume_chars: usize,

    /// What to do when a document would push a volume past the budget
    #[serde(default)]
    pub overflow_policy: OverflowPolicy,
}

impl Default for PackingConfig {
    fn default() -> Self {
        Self {
            max_volume_chars: default_max_volume_chars(),
            overflow_policy: OverflowPolicy::default(),
        }
    }
}

/// Source enumeration and archiving configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProcessingConfig {
    /// Subtitle extensions treated as sources
    #[serde(default = "default_source_extensions")]
    pub source_extensions: Vec<String>,

    /// Whether consolidate mode also re-ingests annotated .txt documents
    #[serde(default = "default_true")]
    pub include_annotated: bool,

    /// Directory name sources are moved into after successful processing
    #[serde(default = "default_archive_dir")]
    pub archive_dir: String,

    /// Directory consolidated volumes are written into; the channel
    /// directory itself when unset
    #[serde(default)]
    pub output_dir: Option<String>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            source_extensions: default_source_extensions(),
            include_annotated: true,
            archive_dir: default_archive_dir(),
            output_dir: None,
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_concurrent_requests() -> usize {
    5
}

fn default_max_input_chars() -> usize {
    10000
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_gemini_timeout_secs() -> u64 {
    60
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_temperature() -> f32 {
    0.3
}

fn default_true() -> bool {
    true
}

fn default_gemini_endpoint() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_ollama_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_gemini_model() -> String {
    "gemini-flash-latest".to_string()
}

fn default_ollama_model() -> String {
    "llama2".to_string()
}

fn default_prompt_template() -> String {
    "Atue como um analista de conteúdo sênior. Abaixo está a transcrição de um vídeo. \
     Gere um resumo executivo de 3 parágrafos focando nos conceitos-chave, \
     teologias mencionadas ou insights técnicos. \
     Este resumo será usado como metadado para um sistema de RAG.\n\n\
     Texto: {transcript}"
        .to_string()
}

fn default_max_volume_chars() -> usize {
    // 2MB of plain text per volume
    2 * 1024 * 1024
}

fn default_source_extensions() -> Vec<String> {
    vec!["srt".to_string()]
}

fn default_archive_dir() -> String {
    "archive".to_string()
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.packing.max_volume_chars == 0 {
            return Err(anyhow!("Volume character budget must be greater than zero"));
        }

        if self.processing.source_extensions.is_empty() {
            return Err(anyhow!("At least one source extension must be configured"));
        }

        // Validate API key for remote providers when summarization is on
        if self.summarization.enabled {
            if let SummarizerProvider::Gemini = self.summarization.provider {
                let api_key = self.summarization.get_api_key();
                if api_key.is_empty() {
                    return Err(anyhow!(
                        "Summarization API key is required for the Gemini provider; \
                         set it in the config file or export GEMINI_API_KEY"
                    ));
                }
            }
        }

        Ok(())
    }

    /// Fill in values the config file leaves empty from the environment.
    /// Currently only the Gemini credential (`GEMINI_API_KEY`).
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            if key.is_empty() {
                return;
            }
            if let Some(provider_config) = self
                .summarization
                .available_providers
                .iter_mut()
                .find(|p| p.provider_type == "gemini")
            {
                if provider_config.api_key.is_empty() {
                    provider_config.api_key = key;
                }
            }
        }
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            summarization: SummarizationConfig::default(),
            packing: PackingConfig::default(),
            processing: ProcessingConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl SummarizationConfig {
    pub fn optimal_concurrent_requests(&self) -> usize {
        // Check if the provider exists in the available_providers
        if let Some(provider_config) = self.get_active_provider_config() {
            return provider_config.concurrent_requests;
        }

        // Default fallback
        default_concurrent_requests()
    }

    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        let provider_str = self.provider.to_lowercase_string();
        self.available_providers
            .iter()
            .find(|p| p.provider_type == provider_str)
    }

    /// Get the model for the active provider
    pub fn get_model(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.model.is_empty() {
                return provider_config.model.clone();
            }
        }

        // Default fallback based on provider type
        match self.provider {
            SummarizerProvider::Gemini => default_gemini_model(),
            SummarizerProvider::Ollama => default_ollama_model(),
        }
    }

    /// Get the API key for the active provider
    pub fn get_api_key(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.api_key.is_empty() {
                return provider_config.api_key.clone();
            }
        }

        // Default fallback - Ollama doesn't use API keys
        String::new()
    }

    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.endpoint.is_empty() {
                return provider_config.endpoint.clone();
            }
        }

        // Default fallback based on provider type
        match self.provider {
            SummarizerProvider::Gemini => default_gemini_endpoint(),
            SummarizerProvider::Ollama => default_ollama_endpoint(),
        }
    }

    /// Get the max transcript chars per request for the active provider
    pub fn get_max_input_chars(&self) -> usize {
        if let Some(provider_config) = self.get_active_provider_config() {
            if provider_config.max_input_chars > 0 {
                return provider_config.max_input_chars;
            }
        }

        // Default fallback
        default_max_input_chars()
    }

    /// Get the request timeout for the active provider
    pub fn get_timeout_secs(&self) -> u64 {
        if let Some(provider_config) = self.get_active_provider_config() {
            if provider_config.timeout_secs > 0 {
                return provider_config.timeout_secs;
            }
        }

        // Default fallback based on provider type
        match self.provider {
            SummarizerProvider::Gemini => default_gemini_timeout_secs(),
            SummarizerProvider::Ollama => default_timeout_secs(),
        }
    }
}

impl Default for SummarizationConfig {
    fn default() -> Self {
        let mut config = Self {
            enabled: true,
            provider: SummarizerProvider::default(),
            available_providers: Vec::new(),
            common: SummarizationCommonConfig::default(),
        };

        // Add default providers
        config
            .available_providers
            .push(ProviderConfig::new(SummarizerProvider::Gemini));
        config
            .available_providers
            .push(ProviderConfig::new(SummarizerProvider::Ollama));

        config
    }
}
