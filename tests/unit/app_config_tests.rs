/*!
 * Tests for application configuration
 */

use std::str::FromStr;
use lexis::app_config::{Config, SummarizerProvider};
use lexis::volume_packer::OverflowPolicy;

/// Test that the default configuration enables Gemini summarization
#[test]
fn test_default_config_shouldEnableGeminiSummarization() {
    let config = Config::default();

    assert!(config.summarization.enabled);
    assert_eq!(config.summarization.provider, SummarizerProvider::Gemini);
    assert_eq!(config.packing.overflow_policy, OverflowPolicy::DeferToNext);
    assert_eq!(config.packing.max_volume_chars, 2 * 1024 * 1024);
}

/// Test that validation fails when Gemini is enabled without a credential
#[test]
fn test_validate_withMissingGeminiKey_shouldFail() {
    let config = Config::default();

    assert!(config.validate().is_err());
}

/// Test that validation passes once the Gemini credential is set
#[test]
fn test_validate_withGeminiKey_shouldPass() {
    let mut config = Config::default();
    for provider in &mut config.summarization.available_providers {
        if provider.provider_type == "gemini" {
            provider.api_key = "test-key".to_string();
        }
    }

    assert!(config.validate().is_ok());
}

/// Test that the Ollama provider does not require a credential
#[test]
fn test_validate_withOllamaProvider_shouldNotRequireKey() {
    let mut config = Config::default();
    config.summarization.provider = SummarizerProvider::Ollama;

    assert!(config.validate().is_ok());
}

/// Test that disabling summarization lifts the credential requirement
#[test]
fn test_validate_withSummarizationDisabled_shouldNotRequireKey() {
    let mut config = Config::default();
    config.summarization.enabled = false;

    assert!(config.validate().is_ok());
}

/// Test that a zero volume budget is rejected
#[test]
fn test_validate_withZeroBudget_shouldFail() {
    let mut config = Config::default();
    config.summarization.enabled = false;
    config.packing.max_volume_chars = 0;

    assert!(config.validate().is_err());
}

/// Test that provider names round-trip through Display and FromStr
#[test]
fn test_provider_roundtrip_shouldParseDisplayOutput() {
    for provider in [SummarizerProvider::Gemini, SummarizerProvider::Ollama] {
        let parsed = SummarizerProvider::from_str(&provider.to_string()).unwrap();
        assert_eq!(parsed, provider);
    }
    assert!(SummarizerProvider::from_str("openai").is_err());
}

/// Test that the model accessor falls back to the provider default
#[test]
fn test_get_model_withEmptyProviderTable_shouldFallBackToDefault() {
    let mut config = Config::default();
    config.summarization.available_providers.clear();

    assert_eq!(config.summarization.get_model(), "gemini-flash-latest");

    config.summarization.provider = SummarizerProvider::Ollama;
    assert_eq!(config.summarization.get_model(), "llama2");
}

/// Test that a partial config file deserializes with defaults filled in
#[test]
fn test_deserialize_withPartialJson_shouldApplyDefaults() {
    let json = r#"{
        "packing": { "overflow_policy": "seal-after-append" }
    }"#;

    let config: Config = serde_json::from_str(json).unwrap();
    assert_eq!(config.packing.overflow_policy, OverflowPolicy::SealAfterAppend);
    assert_eq!(config.packing.max_volume_chars, 2 * 1024 * 1024);
    assert!(config.summarization.enabled);
    assert_eq!(config.processing.archive_dir, "archive");
}

/// Test that the whole configuration round-trips through JSON
#[test]
fn test_serialize_roundtrip_shouldPreserveConfig() {
    let mut config = Config::default();
    config.packing.overflow_policy = OverflowPolicy::SealAfterAppend;
    config.packing.max_volume_chars = 500_000;

    let json = serde_json::to_string_pretty(&config).unwrap();
    let parsed: Config = serde_json::from_str(&json).unwrap();

    assert_eq!(parsed.packing.overflow_policy, OverflowPolicy::SealAfterAppend);
    assert_eq!(parsed.packing.max_volume_chars, 500_000);
    assert_eq!(parsed.summarization.provider, config.summarization.provider);
}

/// Test that the concurrency accessor reads the active provider entry
#[test]
fn test_optimal_concurrent_requests_shouldReadProviderEntry() {
    let mut config = Config::default();
    for provider in &mut config.summarization.available_providers {
        if provider.provider_type == "gemini" {
            provider.concurrent_requests = 2;
        }
    }

    assert_eq!(config.summarization.optimal_concurrent_requests(), 2);
}
