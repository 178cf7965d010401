//! Vision OCR engine — transcribes rendered page images via the Gemini
//! vision endpoint. Bridges the analysis layer's `LlmClient` to the
//! extraction layer's `VisionOcrEngine` trait.

use std::sync::Arc;

use base64::Engine as _;

use super::types::{OcrPageResult, VisionOcrEngine};
use super::ExtractionError;
use crate::pipeline::analysis::types::LlmClient;

const OCR_SYSTEM_PROMPT: &str = "\
You are a text transcriber for scanned county government records: meeting \
minutes, agendas, and staff reports. Transcribe ALL visible text from the \
provided page image. Be thorough and accurate; never summarize or skip.";

const OCR_USER_PROMPT: &str = "\
Transcribe all visible text from this scanned page. Preserve headings, \
lists, and table rows line by line. Output only the transcribed text.";

/// Vision OCR backed by a Gemini vision-capable model.
pub struct GeminiVisionOcr {
    client: Arc<dyn LlmClient>,
    model: String,
}

impl GeminiVisionOcr {
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

impl VisionOcrEngine for GeminiVisionOcr {
    fn ocr_page(&self, png_bytes: &[u8]) -> Result<OcrPageResult, ExtractionError> {
        let start = std::time::Instant::now();
        let base64_image = base64::engine::general_purpose::STANDARD.encode(png_bytes);

        let text = self
            .client
            .generate_with_image(
                &self.model,
                OCR_USER_PROMPT,
                Some(OCR_SYSTEM_PROMPT),
                &base64_image,
            )
            .map_err(|e| ExtractionError::OcrProcessing(format!("Vision OCR failed: {e}")))?;

        let text = text.trim().to_string();
        let confidence = compute_heuristic_confidence(&text);

        tracing::info!(
            model = %self.model,
            elapsed_ms = %start.elapsed().as_millis(),
            text_len = text.len(),
            confidence,
            "Vision OCR page complete"
        );

        Ok(OcrPageResult { text, confidence })
    }
}

/// Estimate transcription confidence from output characteristics.
///
/// Vision models don't report per-word confidence, so we bucket by text
/// length and add a small bonus for multi-line structure (minutes are
/// always multi-line; a single run-on line usually means a bad read).
fn compute_heuristic_confidence(text: &str) -> f32 {
    let len = text.trim().len();
    let base: f32 = match len {
        0 => 0.0,
        1..=49 => 0.2,
        50..=199 => 0.4,
        200..=499 => 0.6,
        _ => 0.8,
    };
    let lines = text.lines().filter(|l| !l.trim().is_empty()).count();
    let bonus = if lines >= 5 { 0.1 } else { 0.0 };
    (base + bonus).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::analysis::gemini::MockLlmClient;
    use crate::pipeline::extraction::render::minimal_png;

    #[test]
    fn confidence_zero_for_empty() {
        assert_eq!(compute_heuristic_confidence(""), 0.0);
        assert_eq!(compute_heuristic_confidence("   "), 0.0);
    }

    #[test]
    fn confidence_scales_with_length() {
        assert!(compute_heuristic_confidence("short") < 0.3);
        let medium = "line of extracted text from the minutes ".repeat(3);
        let long = "line of extracted text from the minutes \n".repeat(40);
        assert!(compute_heuristic_confidence(&medium) > compute_heuristic_confidence("short"));
        assert!(compute_heuristic_confidence(&long) > compute_heuristic_confidence(&medium));
    }

    #[test]
    fn multiline_structure_earns_bonus() {
        let flat = "x".repeat(600);
        let structured = "a line of text here\n".repeat(30);
        assert!(
            compute_heuristic_confidence(&structured) > compute_heuristic_confidence(&flat)
        );
    }

    #[test]
    fn ocr_page_returns_transcription() {
        let client = Arc::new(MockLlmClient::new(
            "BOARD OF SUPERVISORS\nRegular Meeting\nJune 12, 2023\nCall to order\nRoll call",
        ));
        let engine = GeminiVisionOcr::new(client, "gemini-2.5-flash");
        let result = engine.ocr_page(&minimal_png()).unwrap();
        assert!(result.text.contains("BOARD OF SUPERVISORS"));
        assert!(result.confidence > 0.0);
    }

    #[test]
    fn ocr_failure_maps_to_extraction_error() {
        let client = Arc::new(MockLlmClient::failing("connection refused"));
        let engine = GeminiVisionOcr::new(client, "gemini-2.5-flash");
        let err = engine.ocr_page(&minimal_png()).unwrap_err();
        assert!(matches!(err, ExtractionError::OcrProcessing(_)));
    }
}
