use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to open PDF: {0}")]
    OpenError(String),
    #[error("PDF is password-protected")]
    PasswordProtected,
    #[error("failed to extract text from page {page}: {message}")]
    PageError { page: usize, message: String },
}

/// Trait for PDF parsing backends.
///
/// Implementors only parse bytes and hand back per-page text runs; page
/// limits, joining and truncation live in [`crate::extract`].
pub trait PdfBackend: Send + Sync {
    /// Parse an in-memory PDF payload.
    fn open<'a>(&'a self, bytes: &'a [u8]) -> Result<Box<dyn PdfDocument + 'a>, BackendError>;
}

/// A parsed document. Never leaves the thread that opened it.
pub trait PdfDocument {
    fn page_count(&self) -> usize;

    /// Discrete text runs of the page at zero-based `index`, in reading order.
    fn page_text_runs(&self, index: usize) -> Result<Vec<String>, BackendError>;
}
