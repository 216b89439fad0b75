//! End-to-end tests for [`TranslationSession`] with fake collaborators.
//!
//! No network or real PDF parsing: the model is a scripted [`MockModel`] and
//! documents come from a [`FakePdf`].

use std::sync::Arc;

use linguistdoc_core::mock::{FakePdf, MockModel, MockReply};
use linguistdoc_core::upload::PDF_CONTENT_TYPE;
use linguistdoc_core::{
    AUTO_DETECT, BusyPhase, DocumentUpload, EXTRACTION_FAILED_MESSAGE, FileMetadata, Mode,
    SessionError, SubmitOutcome, TRUNCATION_NOTICE, TranslationClient, TranslationSession,
    TranslationState,
};
use tokio::sync::Semaphore;

fn pdf_upload(name: &str) -> DocumentUpload {
    DocumentUpload::new(
        FileMetadata {
            name: name.to_string(),
            size: 8,
            content_type: PDF_CONTENT_TYPE.to_string(),
        },
        b"%PDF-1.4".to_vec(),
    )
    .unwrap()
}

fn session(model: &Arc<MockModel>, pdf: FakePdf) -> Arc<TranslationSession> {
    Arc::new(TranslationSession::new(
        TranslationClient::new(model.clone()),
        Arc::new(pdf),
    ))
}

#[tokio::test]
async fn bonjour_le_monde_round() {
    let model = Arc::new(MockModel::new(MockReply::Text("Hello world".into())));
    let session = session(&model, FakePdf::unparsable());
    assert_eq!(session.state().source_language, AUTO_DETECT);

    let outcome = session.submit_text("Bonjour le monde").await;
    assert!(matches!(outcome, SubmitOutcome::Translated(_)));

    let calls = model.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].prompt,
        "Translate the following text into English: \n\nBonjour le monde"
    );
    assert!(!calls[0].system_instruction.contains(AUTO_DETECT));
    assert_eq!(session.state().translated_text, "Hello world");
}

#[tokio::test]
async fn submit_marks_loading_before_resolution() {
    let gate = Arc::new(Semaphore::new(0));
    let model = Arc::new(MockModel::new(MockReply::Text("Thanks".into())).with_gate(gate.clone()));
    let session = session(&model, FakePdf::unparsable());

    let task = {
        let session = session.clone();
        tokio::spawn(async move { session.submit_text("  Danke  ").await })
    };

    let mut rx = session.subscribe();
    let snap = rx.wait_for(|s| s.state.is_loading).await.unwrap().clone();
    assert_eq!(snap.state.original_text, "  Danke  ");
    assert_eq!(snap.phase, Some(BusyPhase::Translating));
    assert!(snap.state.error.is_none());

    gate.add_permits(1);
    task.await.unwrap();

    let state = session.state();
    assert!(!state.is_loading);
    assert!(state.error.is_none());
    assert!(session.snapshot().phase.is_none());
}

#[tokio::test]
async fn long_document_is_truncated_before_translation() {
    let model = Arc::new(MockModel::new(MockReply::Text("translated".into())));
    let pages = (1..=15).map(|n| vec![format!("Seite {n}")]).collect();
    let session = session(&model, FakePdf::with_owned_pages(pages));
    session.switch_mode(Mode::Document);

    let outcome = session.submit_document(pdf_upload("bericht.pdf")).await;
    assert!(matches!(outcome, SubmitOutcome::Translated(_)));

    let snap = session.snapshot();
    assert!(snap.state.original_text.ends_with(TRUNCATION_NOTICE));
    let extraction = snap.extraction.unwrap();
    assert_eq!(extraction.pages_processed, 10);
    assert_eq!(extraction.total_pages, 15);
    assert!(extraction.truncated);
    assert!(model.calls()[0].prompt.ends_with(TRUNCATION_NOTICE));
}

#[tokio::test]
async fn document_moves_from_extracting_to_translating() {
    let gate = Arc::new(Semaphore::new(0));
    let model = Arc::new(MockModel::new(MockReply::Text("Hi".into())).with_gate(gate.clone()));
    let pdf = FakePdf::with_pages(vec![vec!["Ciao"], vec!["a", "tutti"]]);
    let session = session(&model, pdf);
    session.switch_mode(Mode::Document);

    let task = {
        let session = session.clone();
        tokio::spawn(async move { session.submit_document(pdf_upload("ciao.pdf")).await })
    };

    let mut rx = session.subscribe();
    let snap = rx
        .wait_for(|s| s.phase == Some(BusyPhase::Translating))
        .await
        .unwrap()
        .clone();
    assert!(snap.state.is_loading);
    assert_eq!(snap.state.original_text, "Ciao\n\na tutti");
    assert!(snap.extraction.is_some());

    gate.add_permits(1);
    assert!(matches!(task.await.unwrap(), SubmitOutcome::Translated(_)));
}

#[tokio::test]
async fn protected_document_fails_without_translation() {
    let model = Arc::new(MockModel::new(MockReply::Text("never".into())));
    let session = session(&model, FakePdf::password_protected());
    session.switch_mode(Mode::Document);

    match session.submit_document(pdf_upload("secret.pdf")).await {
        SubmitOutcome::Failed(SessionError::Extraction(e)) => {
            assert_eq!(
                e.user_message(),
                "Could not extract text from this PDF. It might be scanned or protected."
            );
        }
        other => panic!("expected extraction failure, got {other:?}"),
    }
    assert_eq!(model.call_count(), 0);
    assert!(!session.state().is_loading);
}

#[tokio::test]
async fn unreadable_document_leaves_earlier_translation_visible() {
    let model = Arc::new(MockModel::new(MockReply::Text("See you tomorrow".into())));
    let session = session(&model, FakePdf::unparsable());

    session.submit_text("A domani").await;
    let calls_before = model.call_count();

    let outcome = session.submit_document(pdf_upload("scan.pdf")).await;
    assert!(matches!(outcome, SubmitOutcome::Failed(SessionError::Extraction(_))));

    let state = session.state();
    assert_eq!(state.translated_text, "See you tomorrow");
    assert_eq!(state.error.as_deref(), Some(EXTRACTION_FAILED_MESSAGE));
    assert!(!state.is_loading);
    assert_eq!(model.call_count(), calls_before);
}

#[tokio::test]
async fn mode_switch_mid_request_discards_result() {
    let gate = Arc::new(Semaphore::new(0));
    let model = Arc::new(MockModel::new(MockReply::Text("stale".into())).with_gate(gate.clone()));
    let session = session(&model, FakePdf::unparsable());

    let task = {
        let session = session.clone();
        tokio::spawn(async move { session.submit_text("vieux texte").await })
    };
    let mut rx = session.subscribe();
    rx.wait_for(|s| s.state.is_loading).await.unwrap();

    session.switch_mode(Mode::Document);
    gate.add_permits(1);

    assert!(matches!(task.await.unwrap(), SubmitOutcome::Superseded));
    assert_eq!(session.state(), TranslationState::default());
    assert_eq!(session.mode(), Mode::Document);
}

#[tokio::test]
async fn newer_request_wins_over_stale_one() {
    let gate = Arc::new(Semaphore::new(0));
    let model = Arc::new(
        MockModel::with_sequence(vec![
            MockReply::Text("old answer".into()),
            MockReply::Text("new answer".into()),
        ])
        .with_gate(gate.clone()),
    );
    let session = session(&model, FakePdf::unparsable());

    let old = {
        let session = session.clone();
        tokio::spawn(async move { session.submit_text("premier").await })
    };
    let mut rx = session.subscribe();
    rx.wait_for(|s| s.state.is_loading).await.unwrap();
    session.clear();

    let new = {
        let session = session.clone();
        tokio::spawn(async move { session.submit_text("second").await })
    };
    rx.wait_for(|s| s.state.is_loading).await.unwrap();

    gate.add_permits(2);
    assert!(matches!(old.await.unwrap(), SubmitOutcome::Superseded));
    assert!(matches!(new.await.unwrap(), SubmitOutcome::Translated(_)));

    let state = session.state();
    assert_eq!(state.original_text, "second");
    assert_eq!(state.translated_text, "new answer");
}

#[tokio::test]
async fn configuration_error_surfaces_verbatim() {
    let model = Arc::new(MockModel::new(MockReply::MissingCredential));
    let session = session(&model, FakePdf::unparsable());

    session.submit_text("Hej").await;
    let error = session.state().error.unwrap();
    assert!(error.starts_with("API key is missing or invalid."));
}
