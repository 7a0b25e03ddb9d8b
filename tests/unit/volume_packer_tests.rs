/*!
 * Tests for greedy volume packing
 */

use anyhow::anyhow;
use lexis::caption_processor::NormalizedDocument;
use lexis::metadata::VideoMetadata;
use lexis::volume_packer::{OverflowPolicy, PackSummary, Volume, VolumePacker};

/// Build a document whose display text has an exact size
fn doc(name: &str, size: usize) -> NormalizedDocument {
    NormalizedDocument {
        source_name: name.to_string(),
        display_text: "x".repeat(size),
        raw_text: "x".repeat(size),
        summary: None,
        metadata: VideoMetadata::unknown(),
    }
}

/// Pack documents collecting every sealed volume
fn pack_collect(
    documents: Vec<NormalizedDocument>,
    budget: usize,
    policy: OverflowPolicy,
) -> (Vec<Volume>, PackSummary) {
    let packer = VolumePacker::new("canal", budget, policy);
    let mut volumes = Vec::new();
    let summary = packer
        .pack(documents, |volume| {
            volumes.push(volume);
            Ok(())
        })
        .unwrap();
    (volumes, summary)
}

/// Test that documents fitting the budget land in a single volume
#[test]
fn test_pack_withDocumentsUnderBudget_shouldProduceSingleVolume() {
    let (volumes, summary) =
        pack_collect(vec![doc("a", 30), doc("b", 30)], 100, OverflowPolicy::DeferToNext);

    assert_eq!(volumes.len(), 1);
    assert_eq!(volumes[0].volume_number, 1);
    assert_eq!(volumes[0].member_sources, vec!["a", "b"]);
    assert_eq!(volumes[0].char_count(), 60);
    assert_eq!(summary.volumes_sealed, 1);
    assert_eq!(summary.documents_packed, 2);
}

/// Test that the defer policy moves the triggering document to a new volume
#[test]
fn test_pack_withDeferPolicy_shouldDeferTriggeringDocument() {
    let (volumes, _) =
        pack_collect(vec![doc("a", 60), doc("b", 60)], 100, OverflowPolicy::DeferToNext);

    assert_eq!(volumes.len(), 2);
    assert_eq!(volumes[0].member_sources, vec!["a"]);
    assert_eq!(volumes[1].member_sources, vec!["b"]);
    assert!(volumes[0].char_count() <= 100);
    assert!(volumes[1].char_count() <= 100);
}

/// Test that the seal-after-append policy tolerates one-document overshoot
#[test]
fn test_pack_withSealAfterAppendPolicy_shouldTolerateOvershoot() {
    let (volumes, _) = pack_collect(
        vec![doc("a", 60), doc("b", 60), doc("c", 10)],
        100,
        OverflowPolicy::SealAfterAppend,
    );

    assert_eq!(volumes.len(), 2);
    assert_eq!(volumes[0].member_sources, vec!["a", "b"]);
    assert_eq!(volumes[0].char_count(), 120);
    assert_eq!(volumes[1].member_sources, vec!["c"]);
}

/// Test that a document larger than the budget becomes a singleton volume
#[test]
fn test_pack_withOversizedDocument_shouldProduceSingletonVolume() {
    let (volumes, _) = pack_collect(
        vec![doc("small", 10), doc("huge", 250), doc("tail", 10)],
        100,
        OverflowPolicy::DeferToNext,
    );

    assert_eq!(volumes.len(), 3);
    assert_eq!(volumes[1].member_sources, vec!["huge"]);
    assert_eq!(volumes[1].char_count(), 250);
    assert_eq!(volumes[2].member_sources, vec!["tail"]);
}

/// Test that K overflow events produce exactly K+1 contiguously numbered volumes
#[test]
fn test_pack_withManyDocuments_shouldNumberVolumesContiguously() {
    let documents: Vec<NormalizedDocument> =
        (0..7).map(|i| doc(&format!("doc{}", i), 40)).collect();
    let (volumes, summary) = pack_collect(documents, 100, OverflowPolicy::DeferToNext);

    // Two 40-char documents per volume: 3 overflows, 4 volumes
    assert_eq!(volumes.len(), 4);
    for (index, volume) in volumes.iter().enumerate() {
        assert_eq!(volume.volume_number, index + 1);
    }
    assert_eq!(summary.volumes_sealed, 4);
    assert_eq!(summary.documents_packed, 7);
}

/// Test that no document is split, dropped or duplicated
#[test]
fn test_pack_withMixedSizes_shouldConserveDocumentsAndLength() {
    let sizes = [10usize, 45, 20, 60, 5];
    let documents: Vec<NormalizedDocument> = sizes
        .iter()
        .enumerate()
        .map(|(i, size)| doc(&format!("doc{}", i), *size))
        .collect();
    let total: usize = sizes.iter().sum();

    let (volumes, summary) = pack_collect(documents, 50, OverflowPolicy::DeferToNext);

    let packed_chars: usize = volumes.iter().map(|v| v.char_count()).sum();
    assert_eq!(packed_chars, total);
    assert_eq!(summary.total_chars, total);

    let all_members: Vec<String> = volumes
        .iter()
        .flat_map(|v| v.member_sources.iter().cloned())
        .collect();
    assert_eq!(all_members, vec!["doc0", "doc1", "doc2", "doc3", "doc4"]);
}

/// Test that a sink failure propagates out of pack
#[test]
fn test_pack_withSinkFailure_shouldPropagateError() {
    let packer = VolumePacker::new("canal", 100, OverflowPolicy::DeferToNext);
    let result = packer.pack(vec![doc("a", 60), doc("b", 60)], |_volume| {
        Err(anyhow!("disk full"))
    });

    assert!(result.is_err());
}

/// Test that empty input seals nothing
#[test]
fn test_pack_withEmptyInput_shouldSealNothing() {
    let (volumes, summary) = pack_collect(Vec::new(), 100, OverflowPolicy::DeferToNext);

    assert!(volumes.is_empty());
    assert_eq!(summary, PackSummary::default());
}

/// Test that per-source summaries accumulate in member order
#[test]
fn test_pack_withSummaries_shouldAccumulatePerSource() {
    let mut first = doc("a", 10);
    first.summary = Some("resumo a".to_string());
    let mut second = doc("b", 10);
    second.summary = Some("resumo b".to_string());

    let (volumes, _) = pack_collect(vec![first, second], 100, OverflowPolicy::DeferToNext);

    assert_eq!(volumes.len(), 1);
    assert_eq!(volumes[0].summaries, vec!["resumo a", "resumo b"]);
}
