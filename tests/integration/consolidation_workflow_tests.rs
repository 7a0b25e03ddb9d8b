/*!
 * End-to-end channel consolidation tests
 */

use std::fs;
use std::sync::Arc;
use anyhow::Result;
use lexis::app_config::Config;
use lexis::app_controller::Controller;
use lexis::providers::mock::MockBehavior;
use lexis::summarization::{BatchNormalizer, SummarizationService, PLACEHOLDER_SUMMARY};
use lexis::volume_packer::{OverflowPolicy, VolumePacker};
use lexis::volume_sink::{FileVolumeSink, VolumeSink};
use crate::common;

fn offline_config() -> Config {
    let mut config = Config::default();
    config.summarization.enabled = false;
    config
}

/// Test that consolidating a channel produces numbered volume files
#[tokio::test]
async fn test_run_consolidate_withChannelDir_shouldWriteNumberedVolumes() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let base = temp_dir.path().to_path_buf();
    let channel_dir = base.join("canal1");
    fs::create_dir(&channel_dir)?;
    let channel = channel_dir.to_path_buf();
    common::create_plain_subtitle(&channel, "aula01.srt")?;
    common::create_plain_subtitle(&channel, "aula02.srt")?;
    common::create_plain_subtitle(&channel, "aula03.srt")?;

    let mut config = offline_config();
    // Each framed document is a few hundred chars; force at least one overflow
    config.packing.max_volume_chars = 700;

    let controller = Controller::with_config(config)?;
    controller.run_consolidate(base.clone(), false).await?;

    let first = channel_dir.join("CONSOLIDADO_canal1_VOL_001.txt");
    let second = channel_dir.join("CONSOLIDADO_canal1_VOL_002.txt");
    assert!(first.exists());
    assert!(second.exists());

    let first_content = fs::read_to_string(&first)?;
    assert!(first_content.starts_with("CANAL: canal1 | VOLUME: 1"));
    assert!(first_content.contains("INÍCIO DO VÍDEO: aula01.srt"));

    // Every source appears in exactly one volume, in lexicographic order
    let mut all_content = first_content;
    all_content.push_str(&fs::read_to_string(&second)?);
    for source in ["aula01.srt", "aula02.srt", "aula03.srt"] {
        let marker = format!("INÍCIO DO VÍDEO: {}", source);
        assert_eq!(all_content.matches(&marker).count(), 1, "{}", source);
    }

    // Sources stay in place without --archive
    assert!(channel.join("aula01.srt").exists());

    Ok(())
}

/// Test that members are archived once their volume is durably written
#[tokio::test]
async fn test_run_consolidate_withArchiveFlag_shouldMoveSources() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let base = temp_dir.path().to_path_buf();
    let channel_dir = base.join("canal1");
    fs::create_dir(&channel_dir)?;
    let channel = channel_dir.to_path_buf();
    common::create_plain_subtitle(&channel, "aula01.srt")?;
    common::create_plain_subtitle(&channel, "aula02.srt")?;

    let controller = Controller::with_config(offline_config())?;
    controller.run_consolidate(base, true).await?;

    assert!(channel_dir.join("CONSOLIDADO_canal1_VOL_001.txt").exists());
    assert!(!channel_dir.join("aula01.srt").exists());
    assert!(channel_dir.join("archive").join("aula01.srt").exists());
    assert!(channel_dir.join("archive").join("aula02.srt").exists());

    Ok(())
}

/// Test that an unreadable channel member is skipped, not fatal
#[tokio::test]
async fn test_run_consolidate_withEmptySource_shouldSkipIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let base = temp_dir.path().to_path_buf();
    let channel_dir = base.join("canal1");
    fs::create_dir(&channel_dir)?;
    let channel = channel_dir.to_path_buf();
    common::create_plain_subtitle(&channel, "aula01.srt")?;
    // No parseable captions and no prose at all
    common::create_test_file(&channel, "vazio.srt", "\n\n\n")?;

    let controller = Controller::with_config(offline_config())?;
    controller.run_consolidate(base, false).await?;

    let volume = fs::read_to_string(channel_dir.join("CONSOLIDADO_canal1_VOL_001.txt"))?;
    assert!(volume.contains("INÍCIO DO VÍDEO: aula01.srt"));
    assert!(!volume.contains("vazio.srt"));

    Ok(())
}

/// Test that a failing summarizer degrades to placeholders and the volume
/// is still written
#[tokio::test]
async fn test_consolidation_withFailingSummarizer_shouldWriteVolumeWithPlaceholders() -> Result<()>
{
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path().to_path_buf();
    common::create_plain_subtitle(&dir, "aula01.srt")?;
    common::create_plain_subtitle(&dir, "aula02.srt")?;

    let summarizer = Arc::new(SummarizationService::with_mock(MockBehavior::Failing));
    let batch = BatchNormalizer::new(Some(summarizer), 2);
    let files = lexis::file_utils::FileManager::find_source_files(&dir, &["srt".to_string()])?;
    let items = batch.normalize_files(&files, |_, _| {}).await;

    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|item| item.summary_degraded));

    let documents: Vec<_> = items.into_iter().map(|item| item.document).collect();
    let packer = VolumePacker::new("canal", 1_000_000, OverflowPolicy::DeferToNext);
    let mut sink = FileVolumeSink::new(&dir);
    let summary = packer.pack(documents, |volume| {
        sink.write_volume(&volume)?;
        Ok(())
    })?;

    assert_eq!(summary.volumes_sealed, 1);
    let volume = fs::read_to_string(dir.join("CONSOLIDADO_canal_VOL_001.txt"))?;
    assert!(volume.contains("RESUMO DO VOLUME:"));
    assert!(volume.contains(PLACEHOLDER_SUMMARY));
    assert!(volume.contains("INÍCIO DO VÍDEO: aula01.srt"));

    Ok(())
}

/// Test that a working summarizer puts per-source summaries in the header
#[tokio::test]
async fn test_consolidation_withWorkingSummarizer_shouldCarrySummaries() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path().to_path_buf();
    common::create_plain_subtitle(&dir, "aula01.srt")?;

    let summarizer = Arc::new(SummarizationService::with_mock(MockBehavior::Working));
    let batch = BatchNormalizer::new(Some(summarizer), 2);
    let files = lexis::file_utils::FileManager::find_source_files(&dir, &["srt".to_string()])?;
    let items = batch.normalize_files(&files, |_, _| {}).await;

    assert_eq!(items.len(), 1);
    assert!(!items[0].summary_degraded);
    let summary_text = items[0].document.summary.clone().unwrap();
    assert!(summary_text.starts_with("[RESUMO]"));

    let documents: Vec<_> = items.into_iter().map(|item| item.document).collect();
    let packer = VolumePacker::new("canal", 1_000_000, OverflowPolicy::DeferToNext);
    let mut sink = FileVolumeSink::new(&dir);
    packer.pack(documents, |volume| {
        sink.write_volume(&volume)?;
        Ok(())
    })?;

    let volume = fs::read_to_string(dir.join("CONSOLIDADO_canal_VOL_001.txt"))?;
    assert!(volume.contains(&summary_text));

    Ok(())
}

/// Test that consolidate re-ingests annotated documents alongside captions
#[tokio::test]
async fn test_run_consolidate_withAnnotatedSource_shouldReingestIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let base = temp_dir.path().to_path_buf();
    let channel_dir = base.join("canal1");
    fs::create_dir(&channel_dir)?;
    let channel = channel_dir.to_path_buf();
    common::create_plain_subtitle(&channel, "aula01.srt")?;
    common::create_test_file(
        &channel,
        "aula00.txt",
        "--- METADADOS DO DOCUMENTO ---\nDATA: 2023-01-15\nTÍTULO: Aula Zero\nID: zzz\n\n\
         --- RESUMO EXECUTIVO ---\nResumo antigo.\n\n\
         --- TRANSCRICAO COMPLETA ---\ntexto da aula zero\n",
    )?;

    let controller = Controller::with_config(offline_config())?;
    controller.run_consolidate(base, false).await?;

    let volume = fs::read_to_string(channel_dir.join("CONSOLIDADO_canal1_VOL_001.txt"))?;
    // Lexicographic order puts the annotated document first
    assert!(volume.contains("INÍCIO DO VÍDEO: aula00.txt"));
    assert!(volume.contains("texto da aula zero"));
    assert!(volume.contains("INÍCIO DO VÍDEO: aula01.srt"));
    // The carried summary survives even with summarization disabled
    assert!(volume.contains("Resumo antigo."));

    Ok(())
}
