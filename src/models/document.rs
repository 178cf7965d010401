use serde::{Deserialize, Serialize};

/// Lifecycle of a staged document through the extraction stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    /// Registered by ingest, text not yet extracted.
    Pending,
    /// Raw text extracted and stored.
    OcrComplete,
    /// Extraction failed; `error` holds the reason.
    OcrError,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::OcrComplete => "ocr_complete",
            Self::OcrError => "ocr_error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "ocr_complete" => Some(Self::OcrComplete),
            "ocr_error" => Some(Self::OcrError),
            _ => None,
        }
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of the LLM analysis stage for a document.
///
/// Unset means the document has not been analyzed yet. `AnalysisError`
/// rows are picked up again on the next run; `Irrelevant` and
/// `AnalysisComplete` rows are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    AnalysisComplete,
    Irrelevant,
    AnalysisError,
}

impl AnalysisStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AnalysisComplete => "analysis_complete",
            Self::Irrelevant => "irrelevant",
            Self::AnalysisError => "analysis_error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "analysis_complete" => Some(Self::AnalysisComplete),
            "irrelevant" => Some(Self::Irrelevant),
            "analysis_error" => Some(Self::AnalysisError),
            _ => None,
        }
    }
}

impl std::fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A staged document row.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: i64,
    /// SHA-256 content hash (base64) — the stable identity across re-ingests.
    pub doc_id: String,
    pub file_name: String,
    pub relative_path: String,
    pub source_path: String,
    pub mime_type: String,
    pub category: String,
    pub file_size_bytes: i64,
    /// Meeting date guessed from the filename at ingest time, if any.
    pub meeting_date_guess: Option<String>,
    pub page_count: Option<i64>,
    pub ocr_text: Option<String>,
    /// Per-page extracted text as a JSON array, when available.
    pub pages_json: Option<String>,
    pub extraction_method: Option<String>,
    pub extraction_confidence: Option<f64>,
    pub status: DocumentStatus,
    pub error: Option<String>,
    pub analysis_status: Option<AnalysisStatus>,
    pub analysis_json: Option<String>,
    pub analysis_model: Option<String>,
    pub analyzed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Document {
    /// True when the LLM stage should pick this document up:
    /// text is extracted and analysis is unset or previously errored.
    pub fn ready_for_analysis(&self) -> bool {
        self.status == DocumentStatus::OcrComplete
            && !matches!(
                self.analysis_status,
                Some(AnalysisStatus::AnalysisComplete) | Some(AnalysisStatus::Irrelevant)
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_document() -> Document {
        Document {
            id: 1,
            doc_id: "hash".into(),
            file_name: "minutes.pdf".into(),
            relative_path: "minutes.pdf".into(),
            source_path: "/tmp/minutes.pdf".into(),
            mime_type: "application/pdf".into(),
            category: "digital_pdf".into(),
            file_size_bytes: 1234,
            meeting_date_guess: None,
            page_count: None,
            ocr_text: None,
            pages_json: None,
            extraction_method: None,
            extraction_confidence: None,
            status: DocumentStatus::Pending,
            error: None,
            analysis_status: None,
            analysis_json: None,
            analysis_model: None,
            analyzed_at: None,
            created_at: "2025-11-01T00:00:00Z".into(),
            updated_at: "2025-11-01T00:00:00Z".into(),
        }
    }

    #[test]
    fn status_round_trips() {
        for s in [
            DocumentStatus::Pending,
            DocumentStatus::OcrComplete,
            DocumentStatus::OcrError,
        ] {
            assert_eq!(DocumentStatus::parse(s.as_str()), Some(s));
        }
        assert_eq!(DocumentStatus::parse("bogus"), None);
    }

    #[test]
    fn analysis_status_round_trips() {
        for s in [
            AnalysisStatus::AnalysisComplete,
            AnalysisStatus::Irrelevant,
            AnalysisStatus::AnalysisError,
        ] {
            assert_eq!(AnalysisStatus::parse(s.as_str()), Some(s));
        }
        assert_eq!(AnalysisStatus::parse(""), None);
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&DocumentStatus::OcrComplete).unwrap();
        assert_eq!(json, "\"ocr_complete\"");
        let json = serde_json::to_string(&AnalysisStatus::AnalysisError).unwrap();
        assert_eq!(json, "\"analysis_error\"");
    }

    #[test]
    fn pending_document_not_ready_for_analysis() {
        let doc = blank_document();
        assert!(!doc.ready_for_analysis());
    }

    #[test]
    fn ocr_complete_without_analysis_is_ready() {
        let mut doc = blank_document();
        doc.status = DocumentStatus::OcrComplete;
        assert!(doc.ready_for_analysis());
    }

    #[test]
    fn errored_analysis_is_retried() {
        let mut doc = blank_document();
        doc.status = DocumentStatus::OcrComplete;
        doc.analysis_status = Some(AnalysisStatus::AnalysisError);
        assert!(doc.ready_for_analysis());
    }

    #[test]
    fn irrelevant_is_final() {
        let mut doc = blank_document();
        doc.status = DocumentStatus::OcrComplete;
        doc.analysis_status = Some(AnalysisStatus::Irrelevant);
        assert!(!doc.ready_for_analysis());
    }
}
