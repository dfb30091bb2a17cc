//! Document text extraction: turns an uploaded page-oriented document into one string.
//!
//! Pages are concatenated in order with no separators. Any failing page fails the
//! whole document; there is no partial-result policy.

use thiserror::Error;

pub mod pdf;

pub use pdf::{looks_like_pdf, PdfDocument};

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("document is empty")]
    Empty,

    #[error("malformed document: {0}")]
    Malformed(String),

    #[error("failed to extract text from page {page}: {message}")]
    Page { page: usize, message: String },
}

/// A document whose text can be extracted one page at a time.
pub trait PagedDocument {
    fn page_count(&self) -> usize;

    /// Text of the page at `index` (0-based).
    fn page_text(&self, index: usize) -> Result<String, ExtractionError>;
}

/// Concatenates the extracted text of every page, in page order.
pub fn extract_document_text<D: PagedDocument + ?Sized>(
    document: &D,
) -> Result<String, ExtractionError> {
    let mut text = String::new();
    for index in 0..document.page_count() {
        text.push_str(&document.page_text(index)?);
    }
    Ok(text)
}
