//! Batch drivers for the extract, screen, and analyze stages.
//!
//! Each driver fetches its work set from the staging database and
//! processes documents one at a time. Per-document failures are recorded
//! on the row and never abort the batch; only database failures are
//! fatal to a run.

use std::time::Duration;

use rusqlite::Connection;

use crate::config;
use crate::db::repository::{self, ExtractionUpdate};
use crate::db::DatabaseError;
use crate::models::AnalysisStatus;
use crate::pipeline::analysis::{analyze_document, DocumentAnalysis, LlmClient};
use crate::pipeline::extraction::{DocumentExtractor, PageExtraction};
use crate::pipeline::ingest::FileCategory;
use crate::pipeline::screen;

/// Summary of one stage run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageReport {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

// ──────────────────────────────────────────────
// Extract stage
// ──────────────────────────────────────────────

/// Run text extraction over every `pending` document.
pub fn run_extraction(
    conn: &Connection,
    extractor: &DocumentExtractor,
) -> Result<StageReport, DatabaseError> {
    let pending = repository::fetch_pending_extraction(conn)?;
    if pending.is_empty() {
        tracing::info!("No documents pending extraction");
        return Ok(StageReport::default());
    }
    tracing::info!(count = pending.len(), "Extracting documents");

    let mut report = StageReport::default();
    for doc in &pending {
        report.processed += 1;

        let category = FileCategory::parse(&doc.category).unwrap_or(FileCategory::Unsupported);
        let outcome = std::fs::read(&doc.source_path)
            .map_err(|e| format!("Cannot read {}: {e}", doc.source_path))
            .and_then(|bytes| {
                extractor
                    .extract(&bytes, &category)
                    .map_err(|e| e.to_string())
            });

        match outcome {
            Ok(result) => {
                let pages_json = serde_json::to_string(&result.pages).ok();
                repository::mark_extraction_complete(
                    conn,
                    doc.id,
                    &ExtractionUpdate {
                        ocr_text: &result.full_text,
                        pages_json: pages_json.as_deref(),
                        method: result.method.as_str(),
                        confidence: result.overall_confidence as f64,
                        page_count: result.page_count,
                    },
                )?;
                tracing::info!(
                    document = %doc.file_name,
                    method = result.method.as_str(),
                    pages = result.page_count,
                    "Extraction complete"
                );
                report.succeeded += 1;
            }
            Err(error) => {
                tracing::warn!(document = %doc.file_name, "Extraction failed: {error}");
                repository::mark_extraction_failed(conn, doc.id, &error)?;
                report.failed += 1;
            }
        }
    }

    tracing::info!(
        processed = report.processed,
        succeeded = report.succeeded,
        failed = report.failed,
        "Extraction run complete"
    );
    Ok(report)
}

// ──────────────────────────────────────────────
// Screen stage
// ──────────────────────────────────────────────

/// Run the heuristic screening pass over every extracted document,
/// replacing its stored snippets.
pub fn run_screening(conn: &Connection) -> Result<StageReport, DatabaseError> {
    let extracted = repository::fetch_extracted(conn)?;
    if extracted.is_empty() {
        tracing::info!("No extracted documents to screen");
        return Ok(StageReport::default());
    }

    let mut report = StageReport::default();
    for doc in &extracted {
        report.processed += 1;

        let pages = document_pages(doc);
        let blocks = screen::find_candidate_blocks(&pages);
        if blocks.is_empty() {
            tracing::debug!(document = %doc.file_name, "No candidate pages");
            repository::replace_snippets(conn, doc.id, &[])?;
            report.skipped += 1;
            continue;
        }

        let mut rows = Vec::with_capacity(blocks.len());
        for block in &blocks {
            let scraped = screen::scrape_fields(&block.text);
            let scraped_json =
                serde_json::to_value(&scraped).unwrap_or(serde_json::Value::Null);
            rows.push((
                block.page as i64,
                block.matched_terms.clone(),
                scraped_json,
                screen::cap_snippet(&block.text),
            ));
        }
        repository::replace_snippets(conn, doc.id, &rows)?;
        tracing::info!(
            document = %doc.file_name,
            candidates = blocks.len(),
            "Screening complete"
        );
        report.succeeded += 1;
    }

    Ok(report)
}

/// Reconstruct per-page text for a document. Falls back to treating the
/// whole stored text as a single page when pages were not persisted.
fn document_pages(doc: &crate::models::Document) -> Vec<PageExtraction> {
    if let Some(json) = &doc.pages_json {
        if let Ok(pages) = serde_json::from_str::<Vec<PageExtraction>>(json) {
            return pages;
        }
        tracing::warn!(document = %doc.file_name, "Stored pages_json unreadable, using full text");
    }
    match &doc.ocr_text {
        Some(text) if !text.trim().is_empty() => vec![PageExtraction {
            page_number: 1,
            text: text.clone(),
            confidence: doc.extraction_confidence.unwrap_or(0.0) as f32,
        }],
        _ => Vec::new(),
    }
}

// ──────────────────────────────────────────────
// Analyze stage
// ──────────────────────────────────────────────

/// Run the LLM stage over documents awaiting analysis, spacing calls by
/// `throttle` to stay under the API rate limit.
pub fn run_analysis(
    conn: &Connection,
    client: &dyn LlmClient,
    throttle: Duration,
    limit: Option<u32>,
) -> Result<StageReport, DatabaseError> {
    let queue = repository::fetch_ready_for_analysis(conn, limit)?;
    if queue.is_empty() {
        tracing::info!("No new records found for processing");
        return Ok(StageReport::default());
    }
    tracing::info!(count = queue.len(), "Found records to process");

    let mut report = StageReport::default();
    for (i, doc) in queue.iter().enumerate() {
        if i > 0 && !throttle.is_zero() {
            tracing::debug!(secs = throttle.as_secs(), "Throttling before next call");
            std::thread::sleep(throttle);
        }
        report.processed += 1;

        match analyze_document(client, doc) {
            Ok(DocumentAnalysis::Completed { record, raw_json }) => {
                repository::record_analysis(
                    conn,
                    doc.id,
                    AnalysisStatus::AnalysisComplete,
                    Some(&raw_json),
                    config::EXTRACTION_MODEL,
                )?;
                tracing::info!(
                    document = %doc.file_name,
                    outcome = record.outcome.as_str(),
                    "Analysis stored"
                );
                report.succeeded += 1;
            }
            Ok(DocumentAnalysis::Irrelevant) => {
                repository::record_analysis(
                    conn,
                    doc.id,
                    AnalysisStatus::Irrelevant,
                    None,
                    config::ROUTER_MODEL,
                )?;
                report.skipped += 1;
            }
            Err(e) => {
                tracing::warn!(document = %doc.file_name, "Analysis failed: {e}");
                let error_json = serde_json::json!({ "error": e.to_string() }).to_string();
                repository::record_analysis(
                    conn,
                    doc.id,
                    AnalysisStatus::AnalysisError,
                    Some(&error_json),
                    config::EXTRACTION_MODEL,
                )?;
                report.failed += 1;
            }
        }
    }

    tracing::info!(
        processed = report.processed,
        succeeded = report.succeeded,
        irrelevant = report.skipped,
        failed = report.failed,
        "Analysis run complete"
    );
    Ok(report)
}
