//! English translation on top of a [`GenerativeModel`].

use std::sync::Arc;

use thiserror::Error;

use crate::model::{GenerateRequest, GenerativeModel, ModelError};

/// Source-language hint meaning "let the model work it out".
pub const AUTO_DETECT: &str = "auto-detect";

/// Low temperature keeps translations literal and repeatable.
pub const DEFAULT_TEMPERATURE: f32 = 0.3;

/// Returned instead of an error when the model answers with nothing.
pub const EMPTY_TRANSLATION_PLACEHOLDER: &str = "No translation generated.";

#[derive(Error, Debug)]
pub enum TranslationError {
    #[error("API key is missing or invalid. Set GEMINI_API_KEY or add it to the config file.")]
    Configuration(#[source] ModelError),
    #[error("Failed to translate text. Please check your connection or API key.")]
    Request(#[source] ModelError),
    #[error("Nothing to translate.")]
    EmptyInput,
}

impl From<ModelError> for TranslationError {
    fn from(err: ModelError) -> Self {
        if err.is_configuration() {
            Self::Configuration(err)
        } else {
            Self::Request(err)
        }
    }
}

/// Translates arbitrary text into English.
#[derive(Clone)]
pub struct TranslationClient {
    model: Arc<dyn GenerativeModel>,
    temperature: f32,
}

impl TranslationClient {
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self {
            model,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn provider_name(&self) -> &str {
        self.model.name()
    }

    /// Translate `text` into English, using `source_language` as a hint unless
    /// it is [`AUTO_DETECT`].
    pub async fn translate(
        &self,
        text: &str,
        source_language: &str,
    ) -> Result<String, TranslationError> {
        if text.trim().is_empty() {
            return Err(TranslationError::EmptyInput);
        }

        let request = GenerateRequest {
            prompt: build_prompt(text),
            system_instruction: system_instruction(source_language),
            temperature: self.temperature,
        };

        let output = self.model.generate(&request).await.map_err(|e| {
            tracing::warn!(provider = self.model.name(), error = %e, "translation failed");
            TranslationError::from(e)
        })?;

        if output.trim().is_empty() {
            tracing::debug!(provider = self.model.name(), "model returned empty content");
            return Ok(EMPTY_TRANSLATION_PLACEHOLDER.to_string());
        }
        Ok(output)
    }
}

pub fn build_prompt(text: &str) -> String {
    format!("Translate the following text into English: \n\n{text}")
}

/// The fixed instruction profile sent with every request.
pub fn system_instruction(source_language: &str) -> String {
    let mut rules = vec!["Always translate into English.".to_string()];
    let hint = source_language.trim();
    if !hint.is_empty() && hint != AUTO_DETECT {
        rules.push(format!("The source language is \"{hint}\"; use that as context."));
    }
    rules.push(
        "Maintain the tone and formatting of the original text, including paragraph breaks."
            .into(),
    );
    rules.push(
        "Only return the translated text without any conversational filler or \"Here is your translation\" prefixes."
            .into(),
    );
    rules.push(
        "If the input is already in English, return it as is or slightly polish it for better flow."
            .into(),
    );

    let mut instruction = String::from(
        "You are a professional linguist and translator specializing in translating various languages into fluent, natural English.\n\
         Your goal is to provide a translation that is not just word-for-word, but contextually accurate and captures nuances.\n\nRULES:\n",
    );
    for (i, rule) in rules.iter().enumerate() {
        instruction.push_str(&format!("{}. {}\n", i + 1, rule));
    }
    instruction
}
