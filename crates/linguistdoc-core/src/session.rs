//! The translation state machine.
//!
//! A [`TranslationSession`] owns one [`TranslationState`] and publishes every
//! transition as a [`SessionSnapshot`] on a `watch` channel. Requests are
//! single-flight: a submit while a request is loading is ignored. Each
//! accepted request (and each reset) bumps a generation counter, and a result
//! is only written back if its generation is still current, so a response
//! that arrives after `clear` or a mode switch is dropped.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;

use crate::backend::PdfBackend;
use crate::extract::{ExtractionError, ExtractionResult, extract_text_blocking};
use crate::translator::{AUTO_DETECT, TranslationClient, TranslationError};
use crate::upload::{DocumentUpload, FileMetadata};
use crate::{BusyPhase, Mode, TranslationRequest, TranslationState, normalize_source_language};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("document extraction failed: {0}")]
    Extraction(#[from] ExtractionError),
    #[error("translation failed: {0}")]
    Translation(#[from] TranslationError),
}

impl SessionError {
    /// The string written into [`TranslationState::error`].
    pub fn user_message(&self) -> String {
        match self {
            Self::Extraction(e) => e.user_message().to_string(),
            Self::Translation(e) => e.to_string(),
        }
    }
}

/// Page accounting for the current document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionSummary {
    pub pages_processed: usize,
    pub total_pages: usize,
    pub truncated: bool,
}

impl From<&ExtractionResult> for ExtractionSummary {
    fn from(result: &ExtractionResult) -> Self {
        Self {
            pages_processed: result.pages_processed,
            total_pages: result.total_pages,
            truncated: result.truncated,
        }
    }
}

/// Everything an observer needs to render the session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub state: TranslationState,
    pub mode: Mode,
    /// `Some` exactly while `state.is_loading`.
    pub phase: Option<BusyPhase>,
    pub document: Option<FileMetadata>,
    pub extraction: Option<ExtractionSummary>,
    /// Bumped by every accepted submit and every reset.
    pub generation: u64,
}

impl SessionSnapshot {
    fn initial(mode: Mode) -> Self {
        Self {
            state: TranslationState::default(),
            mode,
            phase: None,
            document: None,
            extraction: None,
            generation: 0,
        }
    }

    fn reset(&mut self, mode: Mode) {
        let generation = self.generation + 1;
        *self = Self::initial(mode);
        self.generation = generation;
    }
}

/// Why a submit was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ignored {
    EmptyInput,
    Busy,
}

/// How a submit ended, from the caller's point of view.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// Nothing happened; state is unchanged.
    Ignored(Ignored),
    Translated(String),
    /// The failure has also been written into the state.
    Failed(SessionError),
    /// The session was reset or resubmitted while this request ran; its
    /// result was discarded.
    Superseded,
}

pub struct TranslationSession {
    client: TranslationClient,
    pdf: Arc<dyn PdfBackend>,
    tx: watch::Sender<SessionSnapshot>,
}

impl TranslationSession {
    pub fn new(client: TranslationClient, pdf: Arc<dyn PdfBackend>) -> Self {
        let (tx, _rx) = watch::channel(SessionSnapshot::initial(Mode::default()));
        Self { client, pdf, tx }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.tx.borrow().clone()
    }

    pub fn state(&self) -> TranslationState {
        self.tx.borrow().state.clone()
    }

    pub fn mode(&self) -> Mode {
        self.tx.borrow().mode
    }

    /// Receive every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }

    /// Change the hint for subsequent requests. Blank input means auto-detect.
    pub fn set_source_language(&self, hint: &str) {
        let hint = normalize_source_language(hint);
        self.tx.send_if_modified(|snap| {
            if snap.state.source_language == hint {
                return false;
            }
            snap.state.source_language = hint;
            true
        });
    }

    /// Reset to the initial state, keeping the mode.
    pub fn clear(&self) {
        self.tx.send_modify(|snap| {
            let mode = snap.mode;
            snap.reset(mode);
        });
        tracing::debug!("session cleared");
    }

    /// Switch entry path. Always a full reset, even for the current mode.
    pub fn switch_mode(&self, mode: Mode) {
        self.tx.send_modify(|snap| snap.reset(mode));
        tracing::debug!(mode = mode.label(), "mode switched");
    }

    /// Translate typed text.
    pub async fn submit_text(&self, text: &str) -> SubmitOutcome {
        // The hint is filled in by `begin`, which reads it under the same lock.
        let Some(mut request) = TranslationRequest::new(text, AUTO_DETECT) else {
            tracing::debug!("ignoring blank submission");
            return SubmitOutcome::Ignored(Ignored::EmptyInput);
        };

        let Some((generation, hint)) = self.begin(|snap| {
            snap.state.original_text = text.to_string();
            snap.phase = Some(BusyPhase::Translating);
        }) else {
            return SubmitOutcome::Ignored(Ignored::Busy);
        };

        request.source_language_hint = hint;
        self.translate(generation, request).await
    }

    /// Extract a PDF, then translate its text.
    pub async fn submit_document(&self, upload: DocumentUpload) -> SubmitOutcome {
        let Some((generation, hint)) = self.begin(|snap| {
            snap.state.original_text.clear();
            snap.phase = Some(BusyPhase::Extracting);
            snap.document = Some(upload.metadata.clone());
            snap.extraction = None;
        }) else {
            return SubmitOutcome::Ignored(Ignored::Busy);
        };

        tracing::debug!(
            document = %upload.metadata.name,
            bytes = upload.metadata.size,
            "extracting document"
        );

        let extraction = match extract_text_blocking(self.pdf.clone(), upload.bytes.clone()).await
        {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(document = %upload.metadata.name, error = %e, "PDF extraction failed");
                return self.fail(generation, SessionError::Extraction(e));
            }
        };

        let summary = ExtractionSummary::from(&extraction);
        let text = extraction.text;
        let advanced = self.resolve(generation, |snap| {
            snap.state.original_text = text.clone();
            snap.phase = Some(BusyPhase::Translating);
            snap.extraction = Some(summary);
        });
        if !advanced {
            tracing::debug!(generation, "discarding stale extraction");
            return SubmitOutcome::Superseded;
        }

        match TranslationRequest::new(&text, &hint) {
            Some(request) => self.translate(generation, request).await,
            None => self.fail(generation, SessionError::Extraction(ExtractionError::NoText)),
        }
    }

    async fn translate(&self, generation: u64, request: TranslationRequest) -> SubmitOutcome {
        let result = self
            .client
            .translate(&request.source_text, &request.source_language_hint)
            .await;

        match result {
            Ok(translated) => {
                let applied = self.resolve(generation, |snap| {
                    snap.state.translated_text = translated.clone();
                    snap.state.error = None;
                    snap.state.is_loading = false;
                    snap.phase = None;
                });
                if applied {
                    tracing::info!(
                        provider = self.client.provider_name(),
                        source_chars = request.source_text.len(),
                        translated_chars = translated.len(),
                        "translation complete"
                    );
                    SubmitOutcome::Translated(translated)
                } else {
                    tracing::debug!(generation, "discarding stale translation");
                    SubmitOutcome::Superseded
                }
            }
            Err(e) => self.fail(generation, SessionError::Translation(e)),
        }
    }

    /// Accept a new request unless one is already loading. Returns its
    /// generation and the hint captured at submit time.
    fn begin(&self, setup: impl FnOnce(&mut SessionSnapshot)) -> Option<(u64, String)> {
        let mut accepted = None;
        self.tx.send_if_modified(|snap| {
            if snap.state.is_loading {
                return false;
            }
            snap.generation += 1;
            snap.state.is_loading = true;
            snap.state.error = None;
            setup(snap);
            accepted = Some((snap.generation, snap.state.source_language.clone()));
            true
        });
        if accepted.is_none() {
            tracing::debug!("ignoring submission while a request is in flight");
        }
        accepted
    }

    /// Apply `update` only if `generation` is still current.
    fn resolve(&self, generation: u64, update: impl FnOnce(&mut SessionSnapshot)) -> bool {
        let mut applied = false;
        self.tx.send_if_modified(|snap| {
            if snap.generation != generation {
                return false;
            }
            update(snap);
            applied = true;
            true
        });
        applied
    }

    fn fail(&self, generation: u64, error: SessionError) -> SubmitOutcome {
        let message = error.user_message();
        let applied = self.resolve(generation, |snap| {
            snap.state.error = Some(message);
            snap.state.is_loading = false;
            snap.phase = None;
        });
        if applied {
            SubmitOutcome::Failed(error)
        } else {
            tracing::debug!(generation, error = %error, "discarding stale failure");
            SubmitOutcome::Superseded
        }
    }
}
