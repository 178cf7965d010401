use serde::{Deserialize, Serialize};

use super::ExtractionError;

/// How text was extracted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Embedded text layer read directly from the PDF.
    PdfDirect,
    /// Pages rendered to images and transcribed by a vision model.
    VisionOcr,
    /// Plain UTF-8 file read.
    PlainTextRead,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PdfDirect => "pdf_direct",
            Self::VisionOcr => "vision_ocr",
            Self::PlainTextRead => "plain_text_read",
        }
    }
}

/// Per-page extraction result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageExtraction {
    pub page_number: usize,
    pub text: String,
    pub confidence: f32,
}

/// Result of text extraction from a single document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub method: ExtractionMethod,
    pub pages: Vec<PageExtraction>,
    pub full_text: String,
    pub overall_confidence: f32,
    pub page_count: usize,
}

impl ExtractionResult {
    /// Assemble a result from per-page extractions. Full text joins pages
    /// with blank lines; overall confidence is the page mean.
    pub fn from_pages(method: ExtractionMethod, pages: Vec<PageExtraction>) -> Self {
        let full_text = pages
            .iter()
            .map(|p| p.text.trim_end())
            .collect::<Vec<_>>()
            .join("\n\n");
        let overall_confidence = if pages.is_empty() {
            0.0
        } else {
            pages.iter().map(|p| p.confidence).sum::<f32>() / pages.len() as f32
        };
        let page_count = pages.len();
        Self {
            method,
            pages,
            full_text,
            overall_confidence,
            page_count,
        }
    }

    /// Total non-whitespace text length across pages.
    pub fn text_len(&self) -> usize {
        self.pages.iter().map(|p| p.text.trim().len()).sum()
    }
}

/// Raw OCR result for one page image.
#[derive(Debug, Clone)]
pub struct OcrPageResult {
    pub text: String,
    pub confidence: f32,
}

/// PDF text extraction abstraction.
pub trait PdfExtractor {
    fn extract_text(&self, pdf_bytes: &[u8]) -> Result<Vec<PageExtraction>, ExtractionError>;

    fn page_count(&self, pdf_bytes: &[u8]) -> Result<usize, ExtractionError>;
}

/// PDF page-to-image rendering abstraction.
pub trait PdfPageRenderer {
    fn page_count(&self, pdf_bytes: &[u8]) -> Result<usize, ExtractionError>;

    /// Render one page to PNG bytes at the given DPI.
    fn render_page(
        &self,
        pdf_bytes: &[u8],
        page_number: usize,
        dpi: u32,
    ) -> Result<Vec<u8>, ExtractionError>;
}

/// OCR engine abstraction (allows mocking for tests).
pub trait VisionOcrEngine {
    fn ocr_page(&self, png_bytes: &[u8]) -> Result<OcrPageResult, ExtractionError>;
}
