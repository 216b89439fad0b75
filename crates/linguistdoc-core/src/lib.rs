use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;

pub mod backend;
pub mod config_file;
pub mod extract;
pub mod gemini;
pub mod mock;
pub mod model;
pub mod session;
pub mod translator;
pub mod upload;

// Re-export for convenience
pub use backend::{BackendError, PdfBackend, PdfDocument};
pub use extract::{
    EXTRACTION_FAILED_MESSAGE, ExtractionError, ExtractionResult, MAX_PAGES, TRUNCATION_NOTICE,
    extract_text,
};
pub use gemini::GeminiModel;
pub use model::{GenerateRequest, GenerativeModel, ModelError};
pub use session::{
    ExtractionSummary, Ignored, SessionError, SessionSnapshot, SubmitOutcome, TranslationSession,
};
pub use translator::{
    AUTO_DETECT, DEFAULT_TEMPERATURE, EMPTY_TRANSLATION_PLACEHOLDER, TranslationClient,
    TranslationError,
};
pub use upload::{DocumentUpload, FileMetadata, UploadError};

/// The translation state shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationState {
    /// Last submitted source text; empty before the first submission.
    pub original_text: String,
    /// Most recent successful translation. Kept when a later request fails.
    pub translated_text: String,
    pub is_loading: bool,
    pub error: Option<String>,
    /// Never empty; see [`normalize_source_language`].
    pub source_language: String,
}

impl Default for TranslationState {
    fn default() -> Self {
        Self {
            original_text: String::new(),
            translated_text: String::new(),
            is_loading: false,
            error: None,
            source_language: AUTO_DETECT.to_string(),
        }
    }
}

/// Trimmed hint, or [`AUTO_DETECT`] when nothing is left.
pub fn normalize_source_language(hint: &str) -> String {
    let hint = hint.trim();
    if hint.is_empty() {
        AUTO_DETECT.to_string()
    } else {
        hint.to_string()
    }
}

/// One translation job, built per accepted submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    pub source_text: String,
    pub source_language_hint: String,
}

impl TranslationRequest {
    /// `None` for blank text.
    pub fn new(source_text: &str, source_language_hint: &str) -> Option<Self> {
        if source_text.trim().is_empty() {
            return None;
        }
        Some(Self {
            source_text: source_text.to_string(),
            source_language_hint: normalize_source_language(source_language_hint),
        })
    }
}

/// Entry path: typed text or an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Text,
    Document,
}

impl Mode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Text => "Text Translate",
            Self::Document => "PDF Translate",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Self::Text => Self::Document,
            Self::Document => Self::Text,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown mode '{0}' (expected text or document)")]
pub struct ParseModeError(pub String);

impl FromStr for Mode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "document" | "doc" | "pdf" => Ok(Self::Document),
            other => Err(ParseModeError(other.to_string())),
        }
    }
}

/// Busy sub-phase while a request is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusyPhase {
    Extracting,
    Translating,
}

impl BusyPhase {
    pub fn label(self) -> &'static str {
        match self {
            Self::Extracting => "Analyzing document structure...",
            Self::Translating => "Generating fluent English translation...",
        }
    }
}

/// Runtime configuration.
#[derive(Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    /// Hint applied when a session starts.
    pub source_language: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("source_language", &self.source_language)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: gemini::DEFAULT_MODEL.to_string(),
            base_url: gemini::DEFAULT_BASE_URL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            source_language: AUTO_DETECT.to_string(),
        }
    }
}

impl Config {
    /// Defaults overlaid with whatever the file sets.
    pub fn from_file(file: &config_file::ConfigFile) -> Self {
        let mut config = Self::default();
        if let Some(gemini) = &file.gemini {
            if let Some(key) = &gemini.api_key {
                config.api_key = Some(key.clone());
            }
            if let Some(model) = &gemini.model {
                config.model = model.clone();
            }
            if let Some(base_url) = &gemini.base_url {
                config.base_url = base_url.clone();
            }
            if let Some(temperature) = gemini.temperature {
                config.temperature = temperature;
            }
        }
        if let Some(hint) = file
            .translation
            .as_ref()
            .and_then(|t| t.source_language.as_deref())
        {
            config.source_language = normalize_source_language(hint);
        }
        config
    }

    pub fn build_client(&self) -> TranslationClient {
        let model = GeminiModel::new(self.api_key.clone())
            .with_model(self.model.clone())
            .with_base_url(self.base_url.clone());
        TranslationClient::new(Arc::new(model)).with_temperature(self.temperature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config_file::{ConfigFile, GeminiConfig, TranslationConfig};

    #[test]
    fn initial_state_matches_reset_values() {
        let state = TranslationState::default();
        assert_eq!(state.original_text, "");
        assert_eq!(state.translated_text, "");
        assert!(!state.is_loading);
        assert!(state.error.is_none());
        assert_eq!(state.source_language, "auto-detect");
    }

    #[test]
    fn blank_source_language_falls_back() {
        assert_eq!(normalize_source_language("   "), AUTO_DETECT);
        assert_eq!(normalize_source_language(" French "), "French");
    }

    #[test]
    fn request_rejects_blank_text() {
        assert!(TranslationRequest::new(" \n", AUTO_DETECT).is_none());
        let req = TranslationRequest::new(" Hola ", "").unwrap();
        assert_eq!(req.source_text, " Hola ");
        assert_eq!(req.source_language_hint, AUTO_DETECT);
    }

    #[test]
    fn mode_parses_aliases() {
        assert_eq!("TEXT".parse::<Mode>().unwrap(), Mode::Text);
        assert_eq!("pdf".parse::<Mode>().unwrap(), Mode::Document);
        assert_eq!(
            "audio".parse::<Mode>().unwrap_err(),
            ParseModeError("audio".into())
        );
        assert_eq!(
            ParseModeError("audio".into()).to_string(),
            "unknown mode 'audio' (expected text or document)"
        );
        assert_eq!(Mode::Text.toggle(), Mode::Document);
    }

    #[test]
    fn config_from_file_overrides_defaults() {
        let file = ConfigFile {
            gemini: Some(GeminiConfig {
                model: Some("gemini-custom".into()),
                temperature: Some(0.1),
                ..Default::default()
            }),
            translation: Some(TranslationConfig {
                source_language: Some("  ".into()),
            }),
        };
        let config = Config::from_file(&file);
        assert_eq!(config.model, "gemini-custom");
        assert_eq!(config.temperature, 0.1);
        assert_eq!(config.base_url, gemini::DEFAULT_BASE_URL);
        assert_eq!(config.source_language, AUTO_DETECT);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn config_debug_redacts_key() {
        let config = Config {
            api_key: Some("super-secret".into()),
            ..Config::default()
        };
        assert!(!format!("{config:?}").contains("super-secret"));
    }
}
