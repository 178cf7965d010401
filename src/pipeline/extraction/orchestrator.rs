//! Extraction orchestrator — picks the extraction path per document.
//!
//! Digital PDFs read their embedded text layer first. When the layer is
//! missing or too weak (under 500 characters across all pages), and OCR
//! is enabled, pages are rendered and sent through the vision engine.
//! If OCR itself fails, whatever the text layer produced is kept.

use super::render::DEFAULT_RENDER_DPI;
use super::types::{
    ExtractionMethod, ExtractionResult, PageExtraction, PdfExtractor, PdfPageRenderer,
    VisionOcrEngine,
};
use super::ExtractionError;
use crate::pipeline::ingest::FileCategory;

/// Below this many characters of extracted text, a PDF is treated as
/// effectively scanned and handed to OCR.
pub const WEAK_TEXT_THRESHOLD: usize = 500;

/// Renderer + engine pair for the OCR fallback path.
pub struct OcrPipeline {
    pub renderer: Box<dyn PdfPageRenderer>,
    pub engine: Box<dyn VisionOcrEngine>,
    pub dpi: u32,
}

impl OcrPipeline {
    pub fn new(renderer: Box<dyn PdfPageRenderer>, engine: Box<dyn VisionOcrEngine>) -> Self {
        Self {
            renderer,
            engine,
            dpi: DEFAULT_RENDER_DPI,
        }
    }
}

/// Per-document text extraction front door.
pub struct DocumentExtractor {
    pdf: Box<dyn PdfExtractor>,
    ocr: Option<OcrPipeline>,
}

impl DocumentExtractor {
    pub fn new(pdf: Box<dyn PdfExtractor>) -> Self {
        Self { pdf, ocr: None }
    }

    /// Enable the vision OCR fallback.
    pub fn with_ocr(mut self, ocr: OcrPipeline) -> Self {
        self.ocr = Some(ocr);
        self
    }

    pub fn ocr_enabled(&self) -> bool {
        self.ocr.is_some()
    }

    /// Extract text from a document's raw bytes.
    pub fn extract(
        &self,
        bytes: &[u8],
        category: &FileCategory,
    ) -> Result<ExtractionResult, ExtractionError> {
        match category {
            FileCategory::PlainText => extract_plain_text(bytes),
            FileCategory::DigitalPdf | FileCategory::ScannedPdf => self.extract_pdf(bytes),
            FileCategory::Unsupported => Err(ExtractionError::UnsupportedCategory(
                category.as_str().to_string(),
            )),
        }
    }

    fn extract_pdf(&self, bytes: &[u8]) -> Result<ExtractionResult, ExtractionError> {
        // Text layer first — cheap and exact when present.
        let direct_pages = match self.pdf.extract_text(bytes) {
            Ok(pages) => pages,
            Err(e) if self.ocr.is_some() => {
                tracing::warn!("Text-layer extraction failed, trying OCR: {e}");
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        let direct = ExtractionResult::from_pages(ExtractionMethod::PdfDirect, direct_pages);

        if direct.text_len() >= WEAK_TEXT_THRESHOLD {
            return Ok(direct);
        }

        let Some(ocr) = &self.ocr else {
            // No OCR configured — weak text is still better than nothing.
            if direct.text_len() > 0 {
                return Ok(direct);
            }
            return Err(ExtractionError::EmptyDocument);
        };

        tracing::info!(
            direct_len = direct.text_len(),
            "Text layer weak, running vision OCR"
        );
        match self.ocr_pdf(bytes, ocr) {
            Ok(result) if result.text_len() > 0 => Ok(result),
            Ok(_) | Err(_) if direct.text_len() > 0 => {
                // Keep whatever the text layer produced when OCR adds nothing.
                tracing::warn!("OCR produced no usable text, keeping text-layer result");
                Ok(direct)
            }
            Ok(_) => Err(ExtractionError::EmptyDocument),
            Err(e) => Err(e),
        }
    }

    fn ocr_pdf(
        &self,
        bytes: &[u8],
        ocr: &OcrPipeline,
    ) -> Result<ExtractionResult, ExtractionError> {
        let page_count = ocr.renderer.page_count(bytes)?;
        let mut pages = Vec::with_capacity(page_count);
        for page_number in 0..page_count {
            let png = ocr.renderer.render_page(bytes, page_number, ocr.dpi)?;
            let result = ocr.engine.ocr_page(&png)?;
            pages.push(PageExtraction {
                page_number: page_number + 1,
                text: result.text,
                confidence: result.confidence,
            });
        }
        Ok(ExtractionResult::from_pages(
            ExtractionMethod::VisionOcr,
            pages,
        ))
    }
}

fn extract_plain_text(bytes: &[u8]) -> Result<ExtractionResult, ExtractionError> {
    let text = String::from_utf8_lossy(bytes).to_string();
    if text.trim().is_empty() {
        return Err(ExtractionError::EmptyDocument);
    }
    Ok(ExtractionResult::from_pages(
        ExtractionMethod::PlainTextRead,
        vec![PageExtraction {
            page_number: 1,
            text,
            confidence: 1.0,
        }],
    ))
}
