//! Typed access to the staging tables. All functions take a borrowed
//! `Connection`; callers own transactions where they need atomicity.

use chrono::Utc;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::DatabaseError;
use crate::models::{AnalysisStatus, Document, DocumentStatus, ProjectRecord};

/// Timestamp format used across all rows.
fn now() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

const DOCUMENT_COLUMNS: &str = "id, doc_id, file_name, relative_path, source_path, mime_type,
     category, file_size_bytes, meeting_date_guess, page_count, ocr_text, pages_json,
     extraction_method, extraction_confidence, status, error, analysis_status,
     analysis_json, analysis_model, analyzed_at, created_at, updated_at";

fn document_from_row(row: &Row<'_>) -> rusqlite::Result<Document> {
    let status: String = row.get(14)?;
    let analysis_status: Option<String> = row.get(16)?;
    Ok(Document {
        id: row.get(0)?,
        doc_id: row.get(1)?,
        file_name: row.get(2)?,
        relative_path: row.get(3)?,
        source_path: row.get(4)?,
        mime_type: row.get(5)?,
        category: row.get(6)?,
        file_size_bytes: row.get(7)?,
        meeting_date_guess: row.get(8)?,
        page_count: row.get(9)?,
        ocr_text: row.get(10)?,
        pages_json: row.get(11)?,
        extraction_method: row.get(12)?,
        extraction_confidence: row.get(13)?,
        status: DocumentStatus::parse(&status).unwrap_or(DocumentStatus::Pending),
        error: row.get(15)?,
        analysis_status: analysis_status.as_deref().and_then(AnalysisStatus::parse),
        analysis_json: row.get(17)?,
        analysis_model: row.get(18)?,
        analyzed_at: row.get(19)?,
        created_at: row.get(20)?,
        updated_at: row.get(21)?,
    })
}

// ──────────────────────────────────────────────
// Registration (ingest stage)
// ──────────────────────────────────────────────

/// Fields known about a document at ingest time.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub doc_id: String,
    pub file_name: String,
    pub relative_path: String,
    pub source_path: String,
    pub mime_type: String,
    pub category: String,
    pub file_size_bytes: i64,
    pub meeting_date_guess: Option<String>,
}

/// Result of registering a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    Inserted(i64),
    /// A row with the same content hash already exists.
    Duplicate(i64),
}

/// Register a document, keyed by content hash. Re-ingesting identical
/// bytes is a no-op that reports the existing row.
pub fn register_document(
    conn: &Connection,
    doc: &NewDocument,
) -> Result<RegisterOutcome, DatabaseError> {
    let ts = now();
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO documents
         (doc_id, file_name, relative_path, source_path, mime_type, category,
          file_size_bytes, meeting_date_guess, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            doc.doc_id,
            doc.file_name,
            doc.relative_path,
            doc.source_path,
            doc.mime_type,
            doc.category,
            doc.file_size_bytes,
            doc.meeting_date_guess,
            DocumentStatus::Pending.as_str(),
            ts,
            ts,
        ],
    )?;

    let id: i64 = conn.query_row(
        "SELECT id FROM documents WHERE doc_id = ?1",
        params![doc.doc_id],
        |row| row.get(0),
    )?;

    if inserted > 0 {
        Ok(RegisterOutcome::Inserted(id))
    } else {
        Ok(RegisterOutcome::Duplicate(id))
    }
}

/// Fetch a document by its content hash.
pub fn get_by_doc_id(conn: &Connection, doc_id: &str) -> Result<Document, DatabaseError> {
    conn.query_row(
        &format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE doc_id = ?1"),
        params![doc_id],
        document_from_row,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => DatabaseError::NotFound {
            entity: "document",
            id: doc_id.to_string(),
        },
        other => DatabaseError::Sqlite(other),
    })
}

// ──────────────────────────────────────────────
// Extraction stage
// ──────────────────────────────────────────────

/// Documents that still need text extraction.
pub fn fetch_pending_extraction(conn: &Connection) -> Result<Vec<Document>, DatabaseError> {
    fetch_by_status(conn, DocumentStatus::Pending)
}

/// Documents with extracted text (input to screening).
pub fn fetch_extracted(conn: &Connection) -> Result<Vec<Document>, DatabaseError> {
    fetch_by_status(conn, DocumentStatus::OcrComplete)
}

fn fetch_by_status(
    conn: &Connection,
    status: DocumentStatus,
) -> Result<Vec<Document>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE status = ?1 ORDER BY id ASC"
    ))?;
    let rows = stmt.query_map(params![status.as_str()], document_from_row)?;
    let mut docs = Vec::new();
    for row in rows {
        docs.push(row?);
    }
    Ok(docs)
}

/// Extraction result fields to persist on success.
#[derive(Debug, Clone)]
pub struct ExtractionUpdate<'a> {
    pub ocr_text: &'a str,
    pub pages_json: Option<&'a str>,
    pub method: &'a str,
    pub confidence: f64,
    pub page_count: usize,
}

/// Record a successful extraction and advance the document to `ocr_complete`.
pub fn mark_extraction_complete(
    conn: &Connection,
    id: i64,
    update: &ExtractionUpdate<'_>,
) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE documents
         SET ocr_text = ?1, pages_json = ?2, extraction_method = ?3,
             extraction_confidence = ?4, page_count = ?5, status = ?6,
             error = NULL, updated_at = ?7
         WHERE id = ?8",
        params![
            update.ocr_text,
            update.pages_json,
            update.method,
            update.confidence,
            update.page_count as i64,
            DocumentStatus::OcrComplete.as_str(),
            now(),
            id,
        ],
    )?;
    Ok(())
}

/// Record an extraction failure. The error text lands in its own column;
/// `ocr_text` stays untouched.
pub fn mark_extraction_failed(
    conn: &Connection,
    id: i64,
    error: &str,
) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE documents SET status = ?1, error = ?2, updated_at = ?3 WHERE id = ?4",
        params![DocumentStatus::OcrError.as_str(), error, now(), id],
    )?;
    Ok(())
}

// ──────────────────────────────────────────────
// Analysis stage
// ──────────────────────────────────────────────

/// Documents ready for the LLM stage: extracted, and never analyzed or
/// previously errored. This is the resume query — completed and
/// irrelevant rows are never re-sent.
pub fn fetch_ready_for_analysis(
    conn: &Connection,
    limit: Option<u32>,
) -> Result<Vec<Document>, DatabaseError> {
    let sql = format!(
        "SELECT {DOCUMENT_COLUMNS} FROM documents
         WHERE status = 'ocr_complete'
           AND (analysis_status IS NULL OR analysis_status = 'analysis_error')
         ORDER BY id ASC
         LIMIT ?1"
    );
    let mut stmt = conn.prepare(&sql)?;
    let limit = limit.map(i64::from).unwrap_or(-1);
    let rows = stmt.query_map(params![limit], document_from_row)?;
    let mut docs = Vec::new();
    for row in rows {
        docs.push(row?);
    }
    Ok(docs)
}

/// Store the analysis outcome for a document.
pub fn record_analysis(
    conn: &Connection,
    id: i64,
    status: AnalysisStatus,
    analysis_json: Option<&str>,
    model: &str,
) -> Result<(), DatabaseError> {
    let ts = now();
    conn.execute(
        "UPDATE documents
         SET analysis_status = ?1, analysis_json = ?2, analysis_model = ?3,
             analyzed_at = ?4, updated_at = ?4
         WHERE id = ?5",
        params![status.as_str(), analysis_json, model, ts, id],
    )?;
    Ok(())
}

/// Completed analyses with their parsed records, for export.
pub fn fetch_completed_records(
    conn: &Connection,
) -> Result<Vec<(Document, ProjectRecord)>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {DOCUMENT_COLUMNS} FROM documents
         WHERE analysis_status = 'analysis_complete'
         ORDER BY id ASC"
    ))?;
    let rows = stmt.query_map([], document_from_row)?;

    let mut out = Vec::new();
    for row in rows {
        let doc = row?;
        let json = doc.analysis_json.clone().ok_or_else(|| {
            DatabaseError::CorruptJson(format!("document {} has no analysis_json", doc.id))
        })?;
        let record: ProjectRecord = serde_json::from_str(&json)
            .map_err(|e| DatabaseError::CorruptJson(format!("document {}: {e}", doc.id)))?;
        out.push((doc, record));
    }
    Ok(out)
}

// ──────────────────────────────────────────────
// Status overview
// ──────────────────────────────────────────────

/// Per-status document counts for the `status` command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub total: u32,
    pub pending: u32,
    pub ocr_complete: u32,
    pub ocr_error: u32,
    pub analyzed: u32,
    pub irrelevant: u32,
    pub analysis_error: u32,
}

pub fn status_counts(conn: &Connection) -> Result<StatusCounts, DatabaseError> {
    let mut counts = StatusCounts::default();

    let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM documents GROUP BY status")?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, u32>(1)?)))?;
    for row in rows {
        let (status, n) = row?;
        counts.total += n;
        match DocumentStatus::parse(&status) {
            Some(DocumentStatus::Pending) => counts.pending = n,
            Some(DocumentStatus::OcrComplete) => counts.ocr_complete = n,
            Some(DocumentStatus::OcrError) => counts.ocr_error = n,
            None => {}
        }
    }

    let mut stmt = conn.prepare(
        "SELECT analysis_status, COUNT(*) FROM documents
         WHERE analysis_status IS NOT NULL GROUP BY analysis_status",
    )?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, u32>(1)?)))?;
    for row in rows {
        let (status, n) = row?;
        match AnalysisStatus::parse(&status) {
            Some(AnalysisStatus::AnalysisComplete) => counts.analyzed = n,
            Some(AnalysisStatus::Irrelevant) => counts.irrelevant = n,
            Some(AnalysisStatus::AnalysisError) => counts.analysis_error = n,
            None => {}
        }
    }

    Ok(counts)
}

// ──────────────────────────────────────────────
// Screening snippets
// ──────────────────────────────────────────────

/// A stored candidate snippet (joined with the document's filename).
#[derive(Debug, Clone)]
pub struct SnippetRow {
    pub id: String,
    pub document_id: i64,
    pub file_name: String,
    pub page: i64,
    pub matched_terms: Vec<String>,
    pub scraped_json: serde_json::Value,
    pub text_snippet: String,
    pub created_at: String,
}

/// Replace the snippets for a document with a fresh screening result.
/// Screening is deterministic, so re-running replaces rather than appends.
pub fn replace_snippets(
    conn: &Connection,
    document_id: i64,
    snippets: &[(i64, Vec<String>, serde_json::Value, String)],
) -> Result<(), DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "DELETE FROM snippets WHERE document_id = ?1",
        params![document_id],
    )?;
    let ts = now();
    for (page, terms, scraped, text) in snippets {
        let terms_json = serde_json::to_string(terms)
            .map_err(|e| DatabaseError::CorruptJson(e.to_string()))?;
        let scraped_json = serde_json::to_string(scraped)
            .map_err(|e| DatabaseError::CorruptJson(e.to_string()))?;
        tx.execute(
            "INSERT INTO snippets (id, document_id, page, matched_terms, scraped_json,
                                   text_snippet, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                Uuid::new_v4().to_string(),
                document_id,
                page,
                terms_json,
                scraped_json,
                text,
                ts,
            ],
        )?;
    }
    tx.commit()?;
    Ok(())
}

/// All snippets, oldest document first, for JSONL export.
pub fn fetch_all_snippets(conn: &Connection) -> Result<Vec<SnippetRow>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT s.id, s.document_id, d.file_name, s.page, s.matched_terms,
                s.scraped_json, s.text_snippet, s.created_at
         FROM snippets s JOIN documents d ON d.id = s.document_id
         ORDER BY s.document_id ASC, s.page ASC",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, i64>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, i64>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, String>(5)?,
            row.get::<_, String>(6)?,
            row.get::<_, String>(7)?,
        ))
    })?;

    let mut out = Vec::new();
    for row in rows {
        let (id, document_id, file_name, page, terms, scraped, text, created_at) = row?;
        let matched_terms: Vec<String> = serde_json::from_str(&terms)
            .map_err(|e| DatabaseError::CorruptJson(format!("snippet {id}: {e}")))?;
        let scraped_json: serde_json::Value = serde_json::from_str(&scraped)
            .map_err(|e| DatabaseError::CorruptJson(format!("snippet {id}: {e}")))?;
        out.push(SnippetRow {
            id,
            document_id,
            file_name,
            page,
            matched_terms,
            scraped_json,
            text_snippet: text,
            created_at,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    fn complete(conn: &Connection, id: i64, text: &str, page_count: usize) {
        mark_extraction_complete(
            conn,
            id,
            &ExtractionUpdate {
                ocr_text: text,
                pages_json: None,
                method: "pdf_direct",
                confidence: 0.95,
                page_count,
            },
        )
        .unwrap();
    }

    fn new_doc(hash: &str, name: &str) -> NewDocument {
        NewDocument {
            doc_id: hash.to_string(),
            file_name: name.to_string(),
            relative_path: name.to_string(),
            source_path: format!("/input/{name}"),
            mime_type: "application/pdf".into(),
            category: "digital_pdf".into(),
            file_size_bytes: 2048,
            meeting_date_guess: Some("2023-06-12".into()),
        }
    }

    #[test]
    fn register_then_fetch_pending() {
        let conn = open_memory_database().unwrap();
        let outcome = register_document(&conn, &new_doc("h1", "minutes.pdf")).unwrap();
        assert!(matches!(outcome, RegisterOutcome::Inserted(_)));

        let pending = fetch_pending_extraction(&conn).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].file_name, "minutes.pdf");
        assert_eq!(pending[0].status, DocumentStatus::Pending);
        assert_eq!(pending[0].meeting_date_guess.as_deref(), Some("2023-06-12"));
    }

    #[test]
    fn reingesting_same_hash_is_noop() {
        let conn = open_memory_database().unwrap();
        let first = register_document(&conn, &new_doc("h1", "minutes.pdf")).unwrap();
        let RegisterOutcome::Inserted(id) = first else {
            panic!("expected insert");
        };

        // Same hash, different name — still a duplicate
        let second = register_document(&conn, &new_doc("h1", "minutes_copy.pdf")).unwrap();
        assert_eq!(second, RegisterOutcome::Duplicate(id));

        let pending = fetch_pending_extraction(&conn).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].file_name, "minutes.pdf", "original row untouched");
    }

    #[test]
    fn extraction_complete_transitions_status() {
        let conn = open_memory_database().unwrap();
        let RegisterOutcome::Inserted(id) =
            register_document(&conn, &new_doc("h1", "a.pdf")).unwrap()
        else {
            panic!("expected insert");
        };

        complete(&conn, id, "Meeting called to order.", 3);

        assert!(fetch_pending_extraction(&conn).unwrap().is_empty());
        let doc = get_by_doc_id(&conn, "h1").unwrap();
        assert_eq!(doc.status, DocumentStatus::OcrComplete);
        assert_eq!(doc.ocr_text.as_deref(), Some("Meeting called to order."));
        assert_eq!(doc.extraction_method.as_deref(), Some("pdf_direct"));
        assert_eq!(doc.page_count, Some(3));
        assert!(doc.error.is_none());
    }

    #[test]
    fn extraction_failure_keeps_error_out_of_text() {
        let conn = open_memory_database().unwrap();
        let RegisterOutcome::Inserted(id) =
            register_document(&conn, &new_doc("h1", "a.pdf")).unwrap()
        else {
            panic!("expected insert");
        };

        mark_extraction_failed(&conn, id, "PDF parsing failed: bad xref").unwrap();

        let doc = get_by_doc_id(&conn, "h1").unwrap();
        assert_eq!(doc.status, DocumentStatus::OcrError);
        assert_eq!(doc.error.as_deref(), Some("PDF parsing failed: bad xref"));
        assert!(doc.ocr_text.is_none(), "error text must not pollute ocr_text");
    }

    #[test]
    fn analysis_queue_retries_errors_but_not_finals() {
        let conn = open_memory_database().unwrap();
        for (hash, name) in [("h1", "a.pdf"), ("h2", "b.pdf"), ("h3", "c.pdf"), ("h4", "d.pdf")] {
            let RegisterOutcome::Inserted(id) =
                register_document(&conn, &new_doc(hash, name)).unwrap()
            else {
                panic!("expected insert");
            };
            complete(&conn, id, "text body here", 1);
        }

        let all = fetch_ready_for_analysis(&conn, None).unwrap();
        assert_eq!(all.len(), 4);

        record_analysis(&conn, all[0].id, AnalysisStatus::AnalysisComplete, Some("{}"), "m").unwrap();
        record_analysis(&conn, all[1].id, AnalysisStatus::Irrelevant, None, "m").unwrap();
        record_analysis(&conn, all[2].id, AnalysisStatus::AnalysisError, None, "m").unwrap();

        let remaining = fetch_ready_for_analysis(&conn, None).unwrap();
        let ids: Vec<i64> = remaining.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![all[2].id, all[3].id], "errored + never-analyzed only");
    }

    #[test]
    fn analysis_limit_respected() {
        let conn = open_memory_database().unwrap();
        for i in 0..5 {
            let RegisterOutcome::Inserted(id) =
                register_document(&conn, &new_doc(&format!("h{i}"), &format!("{i}.pdf"))).unwrap()
            else {
                panic!("expected insert");
            };
            complete(&conn, id, "text", 1);
        }
        assert_eq!(fetch_ready_for_analysis(&conn, Some(2)).unwrap().len(), 2);
    }

    #[test]
    fn completed_records_parse_stored_json() {
        let conn = open_memory_database().unwrap();
        let RegisterOutcome::Inserted(id) =
            register_document(&conn, &new_doc("h1", "a.pdf")).unwrap()
        else {
            panic!("expected insert");
        };
        complete(&conn, id, "text", 1);

        let json = r#"{"applicant": "Sunrise Energy LLC", "capacity_mw": 80.0, "outcome": "approved"}"#;
        record_analysis(&conn, id, AnalysisStatus::AnalysisComplete, Some(json), "gemini-flash-latest")
            .unwrap();

        let completed = fetch_completed_records(&conn).unwrap();
        assert_eq!(completed.len(), 1);
        let (doc, record) = &completed[0];
        assert_eq!(doc.analysis_model.as_deref(), Some("gemini-flash-latest"));
        assert_eq!(record.applicant.as_deref(), Some("Sunrise Energy LLC"));
        assert_eq!(record.capacity_mw, Some(80.0));
    }

    #[test]
    fn status_counts_cover_both_stages() {
        let conn = open_memory_database().unwrap();
        let mut ids = Vec::new();
        for i in 0..4 {
            let RegisterOutcome::Inserted(id) =
                register_document(&conn, &new_doc(&format!("h{i}"), &format!("{i}.pdf"))).unwrap()
            else {
                panic!("expected insert");
            };
            ids.push(id);
        }

        complete(&conn, ids[0], "t", 1);
        complete(&conn, ids[1], "t", 1);
        mark_extraction_failed(&conn, ids[2], "boom").unwrap();
        record_analysis(&conn, ids[0], AnalysisStatus::Irrelevant, None, "m").unwrap();

        let counts = status_counts(&conn).unwrap();
        assert_eq!(counts.total, 4);
        assert_eq!(counts.pending, 1);
        assert_eq!(counts.ocr_complete, 2);
        assert_eq!(counts.ocr_error, 1);
        assert_eq!(counts.irrelevant, 1);
        assert_eq!(counts.analyzed, 0);
    }

    #[test]
    fn snippets_replace_and_fetch() {
        let conn = open_memory_database().unwrap();
        let RegisterOutcome::Inserted(id) =
            register_document(&conn, &new_doc("h1", "a.pdf")).unwrap()
        else {
            panic!("expected insert");
        };

        let scraped = serde_json::json!({"mw": "80"});
        replace_snippets(
            &conn,
            id,
            &[(2, vec!["Solar".into()], scraped.clone(), "Solar farm CUP...".into())],
        )
        .unwrap();

        // Re-screening replaces
        replace_snippets(
            &conn,
            id,
            &[
                (2, vec!["Solar".into()], scraped.clone(), "Solar farm CUP...".into()),
                (5, vec!["Photovoltaic".into()], serde_json::json!({}), "PV array...".into()),
            ],
        )
        .unwrap();

        let snippets = fetch_all_snippets(&conn).unwrap();
        assert_eq!(snippets.len(), 2);
        assert_eq!(snippets[0].page, 2);
        assert_eq!(snippets[0].file_name, "a.pdf");
        assert_eq!(snippets[0].matched_terms, vec!["Solar".to_string()]);
        assert_eq!(snippets[1].page, 5);
    }

    #[test]
    fn get_missing_doc_id_is_not_found() {
        let conn = open_memory_database().unwrap();
        let err = get_by_doc_id(&conn, "nope").unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }
}
