pub mod format;
pub mod hash;
pub mod scanner;

pub use format::*;
pub use hash::*;
pub use scanner::*;

use thiserror::Error;

use crate::db::DatabaseError;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Unsupported file format")]
    UnsupportedFormat,

    #[error("Input directory does not exist: {0}")]
    MissingInputDir(String),
}
