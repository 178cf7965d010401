use super::AnalysisError;
use crate::models::ProjectRecord;

/// LLM access abstraction (allows mocking for tests).
///
/// One trait covers both text generation and vision transcription so a
/// single client instance can back the router, the extractor, and the
/// OCR engine.
pub trait LlmClient: Send + Sync {
    /// Generate text from a prompt, with an optional system instruction.
    fn generate(
        &self,
        model: &str,
        prompt: &str,
        system: Option<&str>,
    ) -> Result<String, AnalysisError>;

    /// Generate text from a prompt plus one inline PNG image (base64).
    fn generate_with_image(
        &self,
        model: &str,
        prompt: &str,
        system: Option<&str>,
        png_base64: &str,
    ) -> Result<String, AnalysisError>;
}

/// Router verdict for a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relevance {
    Relevant,
    Irrelevant,
}

/// Outcome of analyzing one document.
#[derive(Debug, Clone)]
pub enum DocumentAnalysis {
    /// Full extraction succeeded; carries the parsed record and the raw
    /// JSON exactly as stored.
    Completed {
        record: ProjectRecord,
        raw_json: String,
    },
    /// The router decided the document is not about land use / solar.
    Irrelevant,
}
