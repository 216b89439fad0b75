//! The text-generation collaborator behind the translation client.

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("API key is missing")]
    MissingCredential,
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{provider} returned HTTP {status}: {body}")]
    Status {
        provider: String,
        status: u16,
        body: String,
    },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl ModelError {
    /// Credential problems are configuration errors, not call failures.
    pub fn is_configuration(&self) -> bool {
        match self {
            Self::MissingCredential => true,
            Self::Status { status, .. } => *status == 401 || *status == 403,
            _ => false,
        }
    }
}

/// One generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub prompt: String,
    pub system_instruction: String,
    pub temperature: f32,
}

/// A generative text model that can answer a single prompt.
pub trait GenerativeModel: Send + Sync {
    /// Provider name, for logs.
    fn name(&self) -> &str;

    /// Generate a completion. An empty string is a valid (empty) answer.
    fn generate<'a>(
        &'a self,
        request: &'a GenerateRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String, ModelError>> + Send + 'a>>;
}
