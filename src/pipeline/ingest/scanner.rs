//! Directory scanner — walks an input tree, registers every supported
//! document into the staging database, and dedupes by content hash.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use rusqlite::Connection;
use walkdir::WalkDir;

use super::format::{detect_format, sanitize_filename};
use super::hash::compute_content_hash;
use super::IngestError;
use crate::db::repository::{self, NewDocument, RegisterOutcome};

/// Summary of one ingest run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub scanned: usize,
    pub registered: usize,
    pub duplicates: usize,
    pub unsupported: usize,
    pub failed: usize,
}

/// Filename-date patterns, most specific first: 2023-06-12 before 6-12-23.
static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4}[-_/.]\d{1,2}[-_/.]\d{1,2})").unwrap());
static US_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2}[-_/.]\d{1,2}[-_/.]\d{2,4})").unwrap());

/// Guess the meeting date from a filename like `minutes_2023-06-12.pdf`
/// or `BOS 6-12-23 agenda.pdf`. Returns the matched token verbatim.
pub fn guess_meeting_date_from_name(name: &str) -> Option<String> {
    if let Some(m) = ISO_DATE.captures(name) {
        return Some(m[1].to_string());
    }
    US_DATE.captures(name).map(|m| m[1].to_string())
}

/// Walk `input_dir` recursively and register every PDF or text file.
///
/// Files that fail detection or hashing are counted and skipped — one bad
/// file never aborts the scan.
pub fn ingest_directory(
    conn: &Connection,
    input_dir: &Path,
) -> Result<IngestReport, IngestError> {
    if !input_dir.is_dir() {
        return Err(IngestError::MissingInputDir(
            input_dir.display().to_string(),
        ));
    }

    let mut report = IngestReport::default();

    for entry in WalkDir::new(input_dir).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!("Skipping unreadable entry: {e}");
                report.failed += 1;
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if !has_candidate_extension(path) {
            continue;
        }
        report.scanned += 1;

        match register_file(conn, input_dir, path) {
            Ok(RegisterOutcome::Inserted(id)) => {
                tracing::info!(document = %path.display(), id, "Registered document");
                report.registered += 1;
            }
            Ok(RegisterOutcome::Duplicate(id)) => {
                tracing::debug!(document = %path.display(), id, "Already staged, skipping");
                report.duplicates += 1;
            }
            Err(IngestError::UnsupportedFormat) => {
                tracing::warn!(document = %path.display(), "Unsupported format, skipping");
                report.unsupported += 1;
            }
            Err(e) => {
                tracing::warn!(document = %path.display(), "Ingest failed: {e}");
                report.failed += 1;
            }
        }
    }

    tracing::info!(
        scanned = report.scanned,
        registered = report.registered,
        duplicates = report.duplicates,
        unsupported = report.unsupported,
        failed = report.failed,
        "Ingest complete"
    );
    Ok(report)
}

fn has_candidate_extension(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref(),
        Some("pdf") | Some("txt")
    )
}

fn register_file(
    conn: &Connection,
    input_dir: &Path,
    path: &Path,
) -> Result<RegisterOutcome, IngestError> {
    let detection = detect_format(path)?;
    if !detection.category.is_supported() {
        return Err(IngestError::UnsupportedFormat);
    }

    let doc_id = compute_content_hash(path)?;
    let file_name = sanitize_filename(&path.to_string_lossy());
    let relative_path = path
        .strip_prefix(input_dir)
        .unwrap_or(path)
        .to_string_lossy()
        .to_string();

    let doc = NewDocument {
        doc_id,
        meeting_date_guess: guess_meeting_date_from_name(&file_name),
        file_name,
        relative_path,
        source_path: path.to_string_lossy().to_string(),
        mime_type: detection.mime_type,
        category: detection.category.as_str().to_string(),
        file_size_bytes: detection.file_size_bytes as i64,
    };

    Ok(repository::register_document(conn, &doc)?)
}
