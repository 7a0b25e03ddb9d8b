use crate::caption_processor::{METADATA_MARKER, TRANSCRIPT_MARKER};
use crate::metadata::ResolvedMetadata;

// @module: Rendering of per-file annotated documents

/// Summary marker written by this tool. The parser accepts any line with
/// the same prefix, so documents produced by older versions re-ingest too.
pub const SUMMARY_MARKER: &str = "--- RESUMO EXECUTIVO ---";

/// Render the annotated document for one source: metadata block, summary
/// block and transcription body, delimited by the section markers the
/// normalizer recognizes, so clean-mode output is re-ingestable.
pub fn render_annotated_document(
    metadata: &ResolvedMetadata,
    summary: &str,
    transcription: &str,
) -> String {
    format!(
        "{meta_marker}\nDATA: {date}\nTÍTULO: {title}\nID: {id}\n\n\
         {summary_marker}\n{summary}\n\n\
         {transcript_marker}\n{transcription}\n",
        meta_marker = METADATA_MARKER,
        date = metadata.date,
        title = metadata.title,
        id = metadata.id,
        summary_marker = SUMMARY_MARKER,
        summary = summary,
        transcript_marker = TRANSCRIPT_MARKER,
        transcription = transcription,
    )
}
