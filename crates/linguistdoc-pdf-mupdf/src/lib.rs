use mupdf::{Document, TextPageFlags};

use linguistdoc_core::{BackendError, PdfBackend, PdfDocument};

/// [`PdfBackend`] backed by MuPDF, kept in its own crate so the AGPL mupdf
/// bindings stay out of `linguistdoc-core`.
///
/// Each text line MuPDF reports becomes one text run; characters MuPDF
/// cannot map are replaced with U+FFFD.
#[derive(Debug, Default)]
pub struct MupdfBackend;

impl MupdfBackend {
    pub fn new() -> Self {
        Self
    }
}

struct MupdfDocument {
    document: Document,
    page_count: usize,
}

impl PdfBackend for MupdfBackend {
    fn open<'a>(&'a self, bytes: &'a [u8]) -> Result<Box<dyn PdfDocument + 'a>, BackendError> {
        let document = Document::from_bytes(bytes, "application/pdf")
            .map_err(|e| BackendError::OpenError(e.to_string()))?;

        if document
            .needs_password()
            .map_err(|e| BackendError::OpenError(e.to_string()))?
        {
            return Err(BackendError::PasswordProtected);
        }

        let page_count = document
            .page_count()
            .map_err(|e| BackendError::OpenError(e.to_string()))?;

        Ok(Box::new(MupdfDocument {
            document,
            page_count: usize::try_from(page_count).unwrap_or(0),
        }))
    }
}

impl PdfDocument for MupdfDocument {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn page_text_runs(&self, index: usize) -> Result<Vec<String>, BackendError> {
        let page_error = |message: String| BackendError::PageError {
            page: index + 1,
            message,
        };

        let page_number = i32::try_from(index).map_err(|e| page_error(e.to_string()))?;
        let page = self
            .document
            .load_page(page_number)
            .map_err(|e| page_error(e.to_string()))?;
        let text_page = page
            .to_text_page(TextPageFlags::empty())
            .map_err(|e| page_error(e.to_string()))?;

        let mut runs = Vec::new();
        for block in text_page.blocks() {
            for line in block.lines() {
                let run: String = line
                    .chars()
                    .map(|c| c.char().unwrap_or('\u{FFFD}'))
                    .collect();
                if !run.trim().is_empty() {
                    runs.push(run);
                }
            }
        }
        Ok(runs)
    }
}
