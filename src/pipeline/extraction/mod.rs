pub mod orchestrator;
pub mod pdf;
pub mod render;
pub mod types;
pub mod vision;

pub use orchestrator::*;
pub use pdf::*;
pub use render::*;
pub use types::*;
pub use vision::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("PDF parsing failed: {0}")]
    PdfParsing(String),

    #[error("PDF rendering failed on page {page}: {reason}")]
    PdfRendering { page: usize, reason: String },

    #[error("Image processing failed: {0}")]
    ImageProcessing(String),

    #[error("OCR failed: {0}")]
    OcrProcessing(String),

    #[error("Document contains no extractable text")]
    EmptyDocument,

    #[error("Cannot extract from category: {0}")]
    UnsupportedCategory(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
