//! Hand-rolled fakes for the two external collaborators.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Semaphore;

use crate::backend::{BackendError, PdfBackend, PdfDocument};
use crate::model::{GenerateRequest, GenerativeModel, ModelError};

/// A scripted reply for [`MockModel`].
#[derive(Clone, Debug)]
pub enum MockReply {
    Text(String),
    MissingCredential,
    /// Simulate a non-2xx response.
    Status(u16),
    Malformed(String),
}

/// A [`GenerativeModel`] that replays scripted replies and records requests.
///
/// With a gate attached, every call waits for one permit before answering,
/// which lets tests hold a request in flight.
pub struct MockModel {
    /// Popped from the back; the last reply repeats once exhausted.
    replies: Mutex<Vec<MockReply>>,
    fallback: MockReply,
    calls: Mutex<Vec<GenerateRequest>>,
    gate: Option<Arc<Semaphore>>,
}

impl MockModel {
    /// Always answer with `reply`.
    pub fn new(reply: MockReply) -> Self {
        Self {
            replies: Mutex::new(Vec::new()),
            fallback: reply,
            calls: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// Answer with `replies` in order, repeating the last one.
    pub fn with_sequence(mut replies: Vec<MockReply>) -> Self {
        assert!(!replies.is_empty(), "sequence must have at least one reply");
        replies.reverse();
        let fallback = replies[0].clone();
        Self {
            replies: Mutex::new(replies),
            fallback,
            calls: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// Block each call until a permit is added to `gate`.
    pub fn with_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn calls(&self) -> Vec<GenerateRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn next_reply(&self) -> MockReply {
        let mut replies = self.replies.lock().unwrap();
        if replies.len() > 1 {
            replies.pop().unwrap_or_else(|| self.fallback.clone())
        } else {
            replies.first().cloned().unwrap_or_else(|| self.fallback.clone())
        }
    }
}

impl GenerativeModel for MockModel {
    fn name(&self) -> &str {
        "Mock"
    }

    fn generate<'a>(
        &'a self,
        request: &'a GenerateRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String, ModelError>> + Send + 'a>> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(request.clone());
            let reply = self.next_reply();

            if let Some(gate) = &self.gate {
                match gate.acquire().await {
                    Ok(permit) => permit.forget(),
                    Err(_) => return Err(ModelError::MalformedResponse("gate closed".into())),
                }
            }

            match reply {
                MockReply::Text(text) => Ok(text),
                MockReply::MissingCredential => Err(ModelError::MissingCredential),
                MockReply::Status(status) => Err(ModelError::Status {
                    provider: "Mock".into(),
                    status,
                    body: String::new(),
                }),
                MockReply::Malformed(msg) => Err(ModelError::MalformedResponse(msg)),
            }
        })
    }
}

#[derive(Clone, Copy, Debug)]
enum FakeOpen {
    Ok,
    Unparsable,
    PasswordProtected,
}

/// An in-memory [`PdfBackend`] that serves fixed page text runs.
pub struct FakePdf {
    pages: Vec<Vec<String>>,
    open: FakeOpen,
    pages_read: AtomicUsize,
}

impl FakePdf {
    pub fn with_pages(pages: Vec<Vec<&str>>) -> Self {
        Self::with_owned_pages(
            pages
                .into_iter()
                .map(|runs| runs.into_iter().map(String::from).collect())
                .collect(),
        )
    }

    pub fn with_owned_pages(pages: Vec<Vec<String>>) -> Self {
        Self {
            pages,
            open: FakeOpen::Ok,
            pages_read: AtomicUsize::new(0),
        }
    }

    pub fn unparsable() -> Self {
        Self {
            open: FakeOpen::Unparsable,
            ..Self::with_owned_pages(Vec::new())
        }
    }

    pub fn password_protected() -> Self {
        Self {
            open: FakeOpen::PasswordProtected,
            ..Self::with_owned_pages(Vec::new())
        }
    }

    /// Number of pages whose text has been requested so far.
    pub fn pages_read(&self) -> usize {
        self.pages_read.load(Ordering::SeqCst)
    }
}

struct FakeDocument<'a> {
    pdf: &'a FakePdf,
}

impl PdfBackend for FakePdf {
    fn open<'a>(&'a self, _bytes: &'a [u8]) -> Result<Box<dyn PdfDocument + 'a>, BackendError> {
        match self.open {
            FakeOpen::Ok => Ok(Box::new(FakeDocument { pdf: self })),
            FakeOpen::Unparsable => Err(BackendError::OpenError("no PDF header".into())),
            FakeOpen::PasswordProtected => Err(BackendError::PasswordProtected),
        }
    }
}

impl PdfDocument for FakeDocument<'_> {
    fn page_count(&self) -> usize {
        self.pdf.pages.len()
    }

    fn page_text_runs(&self, index: usize) -> Result<Vec<String>, BackendError> {
        self.pdf.pages_read.fetch_add(1, Ordering::SeqCst);
        self.pdf
            .pages
            .get(index)
            .cloned()
            .ok_or_else(|| BackendError::PageError {
                page: index + 1,
                message: "page out of range".into(),
            })
    }
}
