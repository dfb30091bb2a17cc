// PDF résumé support. Thin wrapper over `pdf-extract`.

use std::panic;

use tracing::debug;

use super::{ExtractionError, PagedDocument};

/// A PDF held fully in memory, with its per-page text extracted up front.
#[derive(Debug, Clone)]
pub struct PdfDocument {
    pages: Vec<String>,
}

impl PdfDocument {
    /// Parses PDF bytes. `pdf-extract` can panic on hostile input; that panic is
    /// contained here and reported as a malformed document.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ExtractionError> {
        if bytes.is_empty() {
            return Err(ExtractionError::Empty);
        }

        let pages = panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes))
            .map_err(|_| {
                ExtractionError::Malformed("PDF parser aborted on this document".to_string())
            })?
            .map_err(|e| ExtractionError::Malformed(e.to_string()))?;

        debug!("parsed PDF: {} bytes, {} pages", bytes.len(), pages.len());
        Ok(Self { pages })
    }
}

impl PagedDocument for PdfDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, index: usize) -> Result<String, ExtractionError> {
        self.pages
            .get(index)
            .cloned()
            .ok_or_else(|| ExtractionError::Page {
                page: index + 1,
                message: "page out of range".to_string(),
            })
    }
}

/// Returns true if the upload claims to be a PDF.
/// - File name ends with `.pdf` (case-insensitive)
/// - Content-Type: application/pdf
pub fn looks_like_pdf(file_name: Option<&str>, content_type: Option<&str>) -> bool {
    let by_name = file_name
        .map(|name| name.trim().to_ascii_lowercase().ends_with(".pdf"))
        .unwrap_or(false);
    let by_type = content_type
        .map(|ct| ct.to_ascii_lowercase().contains("application/pdf"))
        .unwrap_or(false);
    by_name || by_type
}
