use std::path::Path;

use thiserror::Error;

use crate::Page;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to open PDF: {0}")]
    OpenError(String),
    #[error("failed to extract text: {0}")]
    ExtractionError(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for PDF text extraction backends.
///
/// Implementors provide the low-level per-page text extraction step; the
/// extraction pipeline (segmentation, field extraction, validation) lives in
/// `waybill-parsing` and only ever sees the returned [`Page`]s.
pub trait PdfBackend: Send + Sync {
    /// Extract the text of every page of a PDF file, in page order.
    ///
    /// Pages that yield no text are still returned (with empty text) so that
    /// page numbering stays aligned with the document.
    fn extract_pages(&self, path: &Path) -> Result<Vec<Page>, BackendError>;
}
