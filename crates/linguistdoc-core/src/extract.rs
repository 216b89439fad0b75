//! Page-limited PDF text extraction.
//!
//! At most [`MAX_PAGES`] pages are read. Each page's text runs are joined with
//! a single space and followed by a blank line; longer documents get
//! [`TRUNCATION_NOTICE`] appended.

use std::sync::Arc;

use thiserror::Error;

use crate::backend::{BackendError, PdfBackend};

/// Hard cap on the number of pages read from a document.
pub const MAX_PAGES: usize = 10;

pub const TRUNCATION_NOTICE: &str = "[Document truncated to first 10 pages]";

/// The one message shown to users for every extraction failure.
pub const EXTRACTION_FAILED_MESSAGE: &str =
    "Could not extract text from this PDF. It might be scanned or protected.";

const PAGE_SEPARATOR: &str = "\n\n";

/// Plain text pulled out of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    pub text: String,
    pub truncated: bool,
    pub pages_processed: usize,
    pub total_pages: usize,
}

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("unreadable PDF: {0}")]
    Unreadable(#[source] BackendError),
    #[error("PDF is password-protected")]
    PasswordProtected,
    #[error("PDF has no extractable text layer")]
    NoText,
    #[error("extraction task failed: {0}")]
    Task(String),
}

impl ExtractionError {
    /// Message for the user; all failure causes share it.
    pub fn user_message(&self) -> &'static str {
        EXTRACTION_FAILED_MESSAGE
    }
}

impl From<BackendError> for ExtractionError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::PasswordProtected => Self::PasswordProtected,
            other => Self::Unreadable(other),
        }
    }
}

/// Extract the text of the first [`MAX_PAGES`] pages of a PDF payload.
pub fn extract_text(
    backend: &dyn PdfBackend,
    bytes: &[u8],
) -> Result<ExtractionResult, ExtractionError> {
    let document = backend.open(bytes)?;
    let total_pages = document.page_count();
    let pages_to_read = total_pages.min(MAX_PAGES);

    let mut full_text = String::new();
    for index in 0..pages_to_read {
        let runs = document.page_text_runs(index)?;
        full_text.push_str(&runs.join(" "));
        full_text.push_str(PAGE_SEPARATOR);
    }

    if full_text.trim().is_empty() {
        return Err(ExtractionError::NoText);
    }

    let truncated = total_pages > MAX_PAGES;
    if truncated {
        full_text.push('\n');
        full_text.push_str(TRUNCATION_NOTICE);
    }

    tracing::debug!(
        pages = pages_to_read,
        total_pages,
        truncated,
        chars = full_text.len(),
        "extracted document text"
    );

    Ok(ExtractionResult {
        text: full_text.trim().to_string(),
        truncated,
        pages_processed: pages_to_read,
        total_pages,
    })
}

/// Run [`extract_text`] on the blocking pool.
pub async fn extract_text_blocking(
    backend: Arc<dyn PdfBackend>,
    bytes: Arc<[u8]>,
) -> Result<ExtractionResult, ExtractionError> {
    tokio::task::spawn_blocking(move || extract_text(backend.as_ref(), &bytes))
        .await
        .unwrap_or_else(|e| Err(ExtractionError::Task(e.to_string())))
}
