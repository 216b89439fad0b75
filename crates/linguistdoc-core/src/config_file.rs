//! TOML settings file: `[gemini]` and `[translation]` tables, every key
//! optional.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Per-directory settings file, layered over the platform one.
pub const LOCAL_CONFIG_NAME: &str = ".linguistdoc.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub gemini: Option<GeminiConfig>,
    pub translation: Option<TranslationConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranslationConfig {
    pub source_language: Option<String>,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine the platform config directory")]
    NoConfigDir,
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GeminiConfig {
    fn layered(self, top: Self) -> Self {
        Self {
            api_key: top.api_key.or(self.api_key),
            model: top.model.or(self.model),
            base_url: top.base_url.or(self.base_url),
            temperature: top.temperature.or(self.temperature),
        }
    }
}

impl TranslationConfig {
    fn layered(self, top: Self) -> Self {
        Self {
            source_language: top.source_language.or(self.source_language),
        }
    }
}

/// `<config_dir>/linguistdoc/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("linguistdoc").join("config.toml"))
}

/// Platform file, then `.linguistdoc.toml` in the working directory on top.
pub fn load_config() -> ConfigFile {
    [config_path(), Some(PathBuf::from(LOCAL_CONFIG_NAME))]
        .into_iter()
        .flatten()
        .filter_map(|path| load_from_path(&path))
        .fold(ConfigFile::default(), merge)
}

/// `None` when the file is absent or not valid TOML.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let raw = std::fs::read_to_string(path).ok()?;
    toml::from_str(&raw)
        .inspect_err(|e| {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparsable config file")
        })
        .ok()
}

/// Per-key merge; a key set in `top` wins.
pub fn merge(base: ConfigFile, top: ConfigFile) -> ConfigFile {
    ConfigFile {
        gemini: Some(
            base.gemini
                .unwrap_or_default()
                .layered(top.gemini.unwrap_or_default()),
        ),
        translation: Some(
            base.translation
                .unwrap_or_default()
                .layered(top.translation.unwrap_or_default()),
        ),
    }
}

/// Write to the platform path, returning where the file went.
pub fn save_config(config: &ConfigFile) -> Result<PathBuf, ConfigError> {
    let path = config_path().ok_or(ConfigError::NoConfigDir)?;
    save_to_path(config, &path)?;
    Ok(path)
}

pub fn save_to_path(config: &ConfigFile, path: &Path) -> Result<(), ConfigError> {
    let rendered = toml::to_string_pretty(config)?;
    let write_err = |source: std::io::Error| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(write_err)?;
    }
    std::fs::write(path, rendered).map_err(write_err)
}
