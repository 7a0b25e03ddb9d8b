/*!
 * End-to-end per-file clean tests
 */

use std::fs;
use anyhow::Result;
use lexis::app_config::Config;
use lexis::app_controller::Controller;
use lexis::caption_processor::CaptionProcessor;
use lexis::summarization::PLACEHOLDER_SUMMARY;
use crate::common;

fn offline_config() -> Config {
    let mut config = Config::default();
    config.summarization.enabled = false;
    config
}

/// Test that clean mode writes an annotated document per source
#[tokio::test]
async fn test_run_clean_withSubtitleFiles_shouldWriteAnnotatedDocuments() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path().to_path_buf();
    common::create_plain_subtitle(&dir, "aula01.srt")?;
    common::create_rollup_subtitle(&dir, "aula02.srt")?;

    let controller = Controller::with_config(offline_config())?;
    controller.run_clean(dir.clone(), false, false).await?;

    let first = fs::read_to_string(dir.join("aula01.txt"))?;
    assert!(first.contains("--- METADADOS DO DOCUMENTO ---"));
    assert!(first.contains("--- TRANSCRICAO COMPLETA ---"));
    // No sidecar: the title falls back to the base name, the rest to sentinels
    assert!(first.contains("TÍTULO: aula01"));
    assert!(first.contains("DATA: Desconhecida"));
    assert!(first.contains("ID: N/A"));
    // Summarization disabled: the summary block carries the placeholder
    assert!(first.contains(PLACEHOLDER_SUMMARY));

    let second = fs::read_to_string(dir.join("aula02.txt"))?;
    assert!(second.contains("hello world peace"));

    Ok(())
}

/// Test that sidecar metadata flows into the annotated document
#[tokio::test]
async fn test_run_clean_withSidecar_shouldResolveMetadata() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path().to_path_buf();
    common::create_plain_subtitle(&dir, "aula01.srt")?;
    common::create_sidecar(&dir, "aula01", "20230115", "Aula Um", "abc123")?;

    let controller = Controller::with_config(offline_config())?;
    controller.run_clean(dir.clone(), false, false).await?;

    let content = fs::read_to_string(dir.join("aula01.txt"))?;
    assert!(content.contains("DATA: 2023-01-15"));
    assert!(content.contains("TÍTULO: Aula Um"));
    assert!(content.contains("ID: abc123"));

    Ok(())
}

/// Test that a second run skips sources whose output already exists
#[tokio::test]
async fn test_run_clean_withExistingOutput_shouldSkipWithoutOverwrite() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path().to_path_buf();
    common::create_plain_subtitle(&dir, "aula01.srt")?;

    let controller = Controller::with_config(offline_config())?;
    controller.run_clean(dir.clone(), false, false).await?;

    let output = dir.join("aula01.txt");
    fs::write(&output, "edited by hand")?;

    controller.run_clean(dir.clone(), false, false).await?;
    assert_eq!(fs::read_to_string(&output)?, "edited by hand");

    // Force overwrite regenerates the document
    controller.run_clean(dir.clone(), true, false).await?;
    assert!(fs::read_to_string(&output)?.contains("--- TRANSCRICAO COMPLETA ---"));

    Ok(())
}

/// Test that archiving moves fully processed sources away
#[tokio::test]
async fn test_run_clean_withArchiveEnabled_shouldMoveSources() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path().to_path_buf();
    common::create_plain_subtitle(&dir, "aula01.srt")?;

    let controller = Controller::with_config(offline_config())?;
    controller.run_clean(dir.clone(), false, true).await?;

    assert!(dir.join("aula01.txt").exists());
    assert!(!dir.join("aula01.srt").exists());
    assert!(dir.join("archive").join("aula01.srt").exists());

    Ok(())
}

/// Test that clean-mode output re-ingests to the same raw text
#[tokio::test]
async fn test_run_clean_output_shouldRoundTripThroughNormalizer() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path().to_path_buf();
    let source = common::create_plain_subtitle(&dir, "aula01.srt")?;
    let original = CaptionProcessor::normalize(&fs::read_to_string(&source)?, "aula01.srt");

    let controller = Controller::with_config(offline_config())?;
    controller.run_clean(dir.clone(), false, false).await?;

    let annotated = fs::read_to_string(dir.join("aula01.txt"))?;
    let reingested = CaptionProcessor::normalize(&annotated, "aula01.txt");

    assert_eq!(reingested.raw_text, original.raw_text);

    Ok(())
}

/// Test that a directory without subtitles is a no-op, not an error
#[tokio::test]
async fn test_run_clean_withEmptyDirectory_shouldSucceed() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;

    let controller = Controller::with_config(offline_config())?;
    controller
        .run_clean(temp_dir.path().to_path_buf(), false, false)
        .await?;

    Ok(())
}

/// Test that a missing input directory is reported as an error
#[tokio::test]
async fn test_run_clean_withMissingDirectory_shouldFail() {
    let controller = Controller::new_for_test().unwrap();
    let result = controller
        .run_clean("/nonexistent/path/for/lexis".into(), false, false)
        .await;

    assert!(result.is_err());
}
