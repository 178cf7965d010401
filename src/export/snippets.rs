//! JSONL export of screening snippets — one audit line per candidate page.

use std::io::Write;
use std::path::Path;

use rusqlite::Connection;
use serde::Serialize;

use super::ExportError;
use crate::db::repository;

#[derive(Debug, Serialize)]
struct SnippetLine<'a> {
    file_name: &'a str,
    page: i64,
    matched_terms: &'a [String],
    scraped: &'a serde_json::Value,
    text_snippet: &'a str,
}

/// Write all stored snippets as JSON Lines. Returns the line count.
pub fn write_snippets_jsonl(conn: &Connection, out_path: &Path) -> Result<usize, ExportError> {
    let snippets = repository::fetch_all_snippets(conn)?;

    if let Some(parent) = out_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut file = std::fs::File::create(out_path)?;
    for snippet in &snippets {
        let line = SnippetLine {
            file_name: &snippet.file_name,
            page: snippet.page,
            matched_terms: &snippet.matched_terms,
            scraped: &snippet.scraped_json,
            text_snippet: &snippet.text_snippet,
        };
        serde_json::to_writer(&mut file, &line)?;
        file.write_all(b"\n")?;
    }

    tracing::info!(lines = snippets.len(), path = %out_path.display(), "Wrote snippets JSONL");
    Ok(snippets.len())
}
