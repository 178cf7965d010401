use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::IngestError;

/// Broad file categories we handle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum FileCategory {
    DigitalPdf,
    ScannedPdf,
    PlainText,
    Unsupported,
}

impl FileCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DigitalPdf => "digital_pdf",
            Self::ScannedPdf => "scanned_pdf",
            Self::PlainText => "plain_text",
            Self::Unsupported => "unsupported",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "digital_pdf" => Some(Self::DigitalPdf),
            "scanned_pdf" => Some(Self::ScannedPdf),
            "plain_text" => Some(Self::PlainText),
            "unsupported" => Some(Self::Unsupported),
            _ => None,
        }
    }

    pub fn needs_ocr(&self) -> bool {
        matches!(self, Self::ScannedPdf)
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported)
    }
}

/// Result of format detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatDetection {
    pub mime_type: String,
    pub category: FileCategory,
    pub file_size_bytes: u64,
}

const MAX_FILE_SIZE: u64 = 100 * 1024 * 1024; // 100MB

/// Detect file format from magic bytes (NOT file extensions).
/// Magic bytes don't lie — extensions can be wrong.
pub fn detect_format(path: &Path) -> Result<FormatDetection, IngestError> {
    let metadata = std::fs::metadata(path)?;
    let file_size = metadata.len();

    if file_size > MAX_FILE_SIZE {
        return Ok(FormatDetection {
            mime_type: "unknown".into(),
            category: FileCategory::Unsupported,
            file_size_bytes: file_size,
        });
    }

    let mut file = std::fs::File::open(path)?;
    let mut header = [0u8; 8];
    let bytes_read = file.read(&mut header)?;

    let (mime_type, category) = match &header[..bytes_read.min(8)] {
        // PDF: starts with %PDF
        [0x25, 0x50, 0x44, 0x46, ..] => {
            let category = if check_pdf_has_text(path).unwrap_or(false) {
                FileCategory::DigitalPdf
            } else {
                FileCategory::ScannedPdf
            };
            ("application/pdf".to_string(), category)
        }
        _ => {
            if is_likely_text(path)? {
                ("text/plain".to_string(), FileCategory::PlainText)
            } else {
                (
                    "application/octet-stream".to_string(),
                    FileCategory::Unsupported,
                )
            }
        }
    };

    Ok(FormatDetection {
        mime_type,
        category,
        file_size_bytes: file_size,
    })
}

/// Check if a PDF has extractable text (digital vs scanned).
/// Heuristic: count text-operator markers in the raw bytes.
fn check_pdf_has_text(path: &Path) -> Result<bool, IngestError> {
    let file = std::fs::File::open(path)?;
    let mut buffer = Vec::new();
    // Read up to 256KB to check for text markers
    let mut limited = file.take(256 * 1024);
    limited.read_to_end(&mut buffer)?;

    let content = String::from_utf8_lossy(&buffer);

    // BT/ET = begin/end text, Tj/TJ = show text, Tf = set font
    let text_markers = ["BT", "ET", " Tj", " TJ", " Tf"];
    let marker_count: usize = text_markers
        .iter()
        .map(|m| content.matches(m).count())
        .sum();

    Ok(marker_count >= 3)
}

/// Check if a file is likely plain text (valid UTF-8, mostly printable).
fn is_likely_text(path: &Path) -> Result<bool, IngestError> {
    let mut file = std::fs::File::open(path)?;
    let mut buffer = vec![0u8; 4096];
    let n = file.read(&mut buffer)?;
    buffer.truncate(n);

    if n == 0 {
        return Ok(false);
    }

    let text = match std::str::from_utf8(&buffer) {
        Ok(t) => t,
        Err(_) => return Ok(false),
    };

    let printable = text
        .chars()
        .filter(|c| !c.is_control() || c.is_whitespace())
        .count();
    let ratio = printable as f64 / text.chars().count().max(1) as f64;
    Ok(ratio > 0.80)
}

/// Sanitize a filename — strip path components, limit length.
pub fn sanitize_filename(original: &str) -> String {
    let name = Path::new(original)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document");

    let clean: String = name
        .chars()
        .filter(|c| !matches!(c, '/' | '\\' | '\0'))
        .take(255)
        .collect();

    if clean.is_empty() {
        "document".to_string()
    } else {
        clean
    }
}
