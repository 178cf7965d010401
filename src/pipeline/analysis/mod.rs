pub mod gemini;
pub mod orchestrator;
pub mod parser;
pub mod prompt;
pub mod router;
pub mod types;

pub use gemini::*;
pub use orchestrator::*;
pub use parser::*;
pub use prompt::*;
pub use router::*;
pub use types::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("GEMINI_API_KEY is not set in the environment")]
    MissingApiKey,

    #[error("Gemini is unreachable at {0}")]
    Connection(String),

    #[error("Gemini returned error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("JSON parsing error: {0}")]
    JsonParsing(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Document text too short for analysis (< 10 characters)")]
    InputTooShort,
}
