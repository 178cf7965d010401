//! CSV export of completed analysis records, one row per document.

use std::path::Path;

use rusqlite::Connection;
use serde::Serialize;

use super::ExportError;
use crate::db::repository;
use crate::models::{Document, Position, ProjectRecord};

/// Flattened record row. Lists are joined with `; ` so the file opens
/// cleanly in a spreadsheet.
#[derive(Debug, Serialize)]
struct CsvRow {
    file_name: String,
    relative_path: String,
    meeting_date: String,
    document_type: String,
    applicant: String,
    project_name: String,
    capacity_mw: Option<f64>,
    acreage: Option<f64>,
    location: String,
    outcome: String,
    ayes: String,
    nays: String,
    comments_support: usize,
    comments_oppose: usize,
    comments_neutral: usize,
    decision_factors: String,
    overall_sentiment: String,
    confidence: f32,
    analyzed_at: String,
}

impl CsvRow {
    fn from_record(doc: &Document, record: &ProjectRecord) -> Self {
        let count = |p: Position| {
            record
                .public_comments
                .iter()
                .filter(|c| c.position == p)
                .count()
        };
        Self {
            file_name: doc.file_name.clone(),
            relative_path: doc.relative_path.clone(),
            // The document's own date wins over the filename guess
            meeting_date: record
                .meeting_date
                .clone()
                .or_else(|| doc.meeting_date_guess.clone())
                .unwrap_or_default(),
            document_type: record.document_type.clone().unwrap_or_default(),
            applicant: record.applicant.clone().unwrap_or_default(),
            project_name: record.project_name.clone().unwrap_or_default(),
            capacity_mw: record.capacity_mw,
            acreage: record.acreage,
            location: record.location.clone().unwrap_or_default(),
            outcome: record.outcome.as_str().to_string(),
            ayes: record
                .vote
                .as_ref()
                .map(|v| v.ayes.join("; "))
                .unwrap_or_default(),
            nays: record
                .vote
                .as_ref()
                .map(|v| v.nays.join("; "))
                .unwrap_or_default(),
            comments_support: count(Position::Support),
            comments_oppose: count(Position::Oppose),
            comments_neutral: count(Position::Neutral),
            decision_factors: record.decision_factors.join("; "),
            overall_sentiment: record
                .overall_sentiment
                .map(|s| s.as_str().to_string())
                .unwrap_or_default(),
            confidence: record.confidence,
            analyzed_at: doc.analyzed_at.clone().unwrap_or_default(),
        }
    }
}

/// Write all completed records to `out_csv`. Returns the row count.
pub fn write_records_csv(conn: &Connection, out_csv: &Path) -> Result<usize, ExportError> {
    let completed = repository::fetch_completed_records(conn)?;

    if let Some(parent) = out_csv.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut writer = ::csv::Writer::from_path(out_csv)?;
    for (doc, record) in &completed {
        writer.serialize(CsvRow::from_record(doc, record))?;
    }
    writer.flush()?;

    tracing::info!(rows = completed.len(), path = %out_csv.display(), "Wrote records CSV");
    Ok(completed.len())
}
