use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Please upload a valid PDF file.")]
    NotPdf { content_type: String },
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// What the front end knows about a selected file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    pub name: String,
    pub size: u64,
    pub content_type: String,
}

impl FileMetadata {
    pub fn is_pdf(&self) -> bool {
        self.content_type == PDF_CONTENT_TYPE
    }
}

/// Content type from the file extension, as a browser file picker reports it.
pub fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("pdf") => PDF_CONTENT_TYPE,
        Some(ext) if ext.eq_ignore_ascii_case("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

/// A PDF chosen for translation.
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub metadata: FileMetadata,
    pub bytes: Arc<[u8]>,
}

impl DocumentUpload {
    /// Accept `bytes` only when `metadata` says it is a PDF.
    pub fn new(metadata: FileMetadata, bytes: Vec<u8>) -> Result<Self, UploadError> {
        if !metadata.is_pdf() {
            return Err(UploadError::NotPdf {
                content_type: metadata.content_type,
            });
        }
        Ok(Self {
            metadata,
            bytes: Arc::from(bytes),
        })
    }

    /// Read a file from disk. The type check happens before the read.
    pub fn from_path(path: &Path) -> Result<Self, UploadError> {
        let content_type = content_type_for(path);
        if content_type != PDF_CONTENT_TYPE {
            return Err(UploadError::NotPdf {
                content_type: content_type.to_string(),
            });
        }
        let bytes = std::fs::read(path).map_err(|source| UploadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let metadata = FileMetadata {
            name,
            size: bytes.len() as u64,
            content_type: content_type.to_string(),
        };
        Self::new(metadata, bytes)
    }
}
