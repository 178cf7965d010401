//! Per-document analysis: route for relevance, then run the full
//! structured extraction on documents that pass.

use super::parser::parse_extraction_response;
use super::prompt::{extraction_prompt, extraction_system_prompt};
use super::router::check_relevance;
use super::types::{DocumentAnalysis, LlmClient, Relevance};
use super::AnalysisError;
use crate::config;
use crate::models::Document;

/// Minimum usable text length, matching the parser's contract.
const MIN_TEXT_CHARS: usize = 10;

/// Analyze one extracted document.
///
/// Transport and parse failures return `Err` so the caller can mark the
/// row `analysis_error` and retry on a later run. A clean NO from the
/// router returns `Irrelevant`, which is final.
pub fn analyze_document(
    client: &dyn LlmClient,
    doc: &Document,
) -> Result<DocumentAnalysis, AnalysisError> {
    let text = doc.ocr_text.as_deref().unwrap_or("");
    if text.trim().len() < MIN_TEXT_CHARS {
        return Err(AnalysisError::InputTooShort);
    }

    tracing::info!(document = %doc.file_name, "Routing for relevance");
    match check_relevance(client, text)? {
        Relevance::Irrelevant => {
            tracing::info!(document = %doc.file_name, "Irrelevant, skipping extraction");
            return Ok(DocumentAnalysis::Irrelevant);
        }
        Relevance::Relevant => {
            tracing::info!(document = %doc.file_name, "Relevant, running full extraction");
        }
    }

    let prompt = extraction_prompt(text, doc.meeting_date_guess.as_deref());
    let response = client.generate(
        config::EXTRACTION_MODEL,
        &prompt,
        Some(extraction_system_prompt()),
    )?;

    let (record, raw_json) = parse_extraction_response(&response)?;
    if !record.is_substantive() {
        tracing::warn!(
            document = %doc.file_name,
            "Extraction parsed but carries no data points"
        );
    }

    Ok(DocumentAnalysis::Completed { record, raw_json })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DocumentStatus, Outcome};
    use crate::pipeline::analysis::gemini::MockLlmClient;

    fn extracted_doc(text: &str) -> Document {
        Document {
            id: 1,
            doc_id: "hash".into(),
            file_name: "minutes_2023-06-12.pdf".into(),
            relative_path: "minutes_2023-06-12.pdf".into(),
            source_path: "/input/minutes_2023-06-12.pdf".into(),
            mime_type: "application/pdf".into(),
            category: "digital_pdf".into(),
            file_size_bytes: 4096,
            meeting_date_guess: Some("2023-06-12".into()),
            page_count: Some(3),
            ocr_text: Some(text.to_string()),
            pages_json: None,
            extraction_method: Some("pdf_direct".into()),
            extraction_confidence: Some(0.95),
            status: DocumentStatus::OcrComplete,
            error: None,
            analysis_status: None,
            analysis_json: None,
            analysis_model: None,
            analyzed_at: None,
            created_at: "2025-11-01T00:00:00Z".into(),
            updated_at: "2025-11-01T00:00:00Z".into(),
        }
    }

    const EXTRACTION_JSON: &str = r#"```json
{"document_type": "minutes", "applicant": "Sunrise Energy LLC", "capacity_mw": 80, "outcome": "approved", "confidence": 0.9}
```"#;

    #[test]
    fn relevant_document_gets_extracted() {
        let client = MockLlmClient::with_responses(&["YES", EXTRACTION_JSON]);
        let doc = extracted_doc("Conditional Use Permit hearing for a solar facility.");

        let DocumentAnalysis::Completed { record, raw_json } =
            analyze_document(&client, &doc).unwrap()
        else {
            panic!("expected completed analysis");
        };

        assert_eq!(record.applicant.as_deref(), Some("Sunrise Energy LLC"));
        assert_eq!(record.outcome, Outcome::Approved);
        assert!(raw_json.contains("Sunrise Energy LLC"));
        // Router model first, extraction model second
        assert_eq!(
            client.models_called(),
            vec![config::ROUTER_MODEL, config::EXTRACTION_MODEL]
        );
    }

    #[test]
    fn irrelevant_document_skips_extraction() {
        let client = MockLlmClient::new("NO");
        let doc = extracted_doc("Minutes of the library board budget session.");

        let analysis = analyze_document(&client, &doc).unwrap();
        assert!(matches!(analysis, DocumentAnalysis::Irrelevant));
        assert_eq!(client.models_called(), vec![config::ROUTER_MODEL]);
    }

    #[test]
    fn router_failure_is_retryable_error() {
        let client = MockLlmClient::failing("connection refused");
        let doc = extracted_doc("Solar project discussion text.");

        let result = analyze_document(&client, &doc);
        assert!(matches!(result, Err(AnalysisError::Connection(_))));
    }

    #[test]
    fn unparseable_extraction_is_error() {
        let client = MockLlmClient::with_responses(&["YES", "I could not find any JSON."]);
        let doc = extracted_doc("Solar project discussion text.");

        let result = analyze_document(&client, &doc);
        assert!(matches!(result, Err(AnalysisError::MalformedResponse(_))));
    }

    #[test]
    fn short_text_rejected_before_any_call() {
        let client = MockLlmClient::new("YES");
        let doc = extracted_doc("   x   ");

        let result = analyze_document(&client, &doc);
        assert!(matches!(result, Err(AnalysisError::InputTooShort)));
        assert!(client.models_called().is_empty());
    }
}
