pub mod repository;
pub mod sqlite;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Migration v{version} failed: {reason}")]
    MigrationFailed { version: i64, reason: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Stored JSON is invalid: {0}")]
    CorruptJson(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
