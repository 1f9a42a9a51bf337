//! Lede API contracts (in-process).
//!
//! The typeahead depends on two collaborators it does not implement: an
//! optional remote search and a navigation sink. This crate defines those
//! traits plus the HTTP client for the site's `/api/search` route and a mock
//! for tests.

#![forbid(unsafe_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use lede_core::SearchResult;
use tracing::debug;

mod http;

pub use http::HttpSearch;
pub use tokio_util::sync::CancellationToken;

/// Remote search failures. `Aborted` is the cooperative-cancellation outcome
/// and is never shown to users.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    #[error("aborted")]
    Aborted,
    #[error("config: {0}")]
    Config(String),
    #[error("transport: {0}")]
    Transport(String),
    #[error("status: {0}")]
    Status(u16),
    #[error("decode: {0}")]
    Decode(String),
}

impl RemoteError {
    pub fn is_abort(&self) -> bool {
        matches!(self, RemoteError::Aborted)
    }
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Authoritative search behind the local prefix index.
///
/// Implementations must stop promptly once `cancel` fires and report that as
/// [`RemoteError::Aborted`].
#[async_trait::async_trait]
pub trait RemoteSearch: Send + Sync {
    async fn search(&self, query: &str, cancel: CancellationToken) -> RemoteResult<Vec<SearchResult>>;
}

/// Where result selection and full-search submission are sent.
pub trait Navigator: Send + Sync {
    fn navigate(&self, href: &str);

    /// Submit with a blank input asks for the input to keep focus.
    fn focus_input(&self) {}
}

/// Navigator that only records what it was asked to open.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    hrefs: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn hrefs(&self) -> Vec<String> {
        self.hrefs.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, href: &str) {
        debug!(href, "navigate");
        self.hrefs.lock().unwrap_or_else(PoisonError::into_inner).push(href.to_string());
    }
}

// ----------------- Mock implementation -----------------

#[derive(Debug, Clone)]
pub enum MockReply {
    Results(Vec<SearchResult>),
    Fail(String),
}

/// Scripted remote for tests: per-query replies with optional latency.
pub struct MockRemote {
    replies: HashMap<String, (Duration, MockReply)>,
    fallback: MockReply,
    ignore_cancel: bool,
    calls: Mutex<Vec<String>>,
    aborted: AtomicUsize,
}

impl Default for MockRemote {
    fn default() -> Self {
        Self {
            replies: HashMap::new(),
            fallback: MockReply::Results(Vec::new()),
            ignore_cancel: false,
            calls: Mutex::new(Vec::new()),
            aborted: AtomicUsize::new(0),
        }
    }
}

impl MockRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, query: &str, results: Vec<SearchResult>) -> Self {
        self.reply_after(query, Duration::ZERO, results)
    }

    pub fn reply_after(mut self, query: &str, delay: Duration, results: Vec<SearchResult>) -> Self {
        self.replies.insert(query.to_string(), (delay, MockReply::Results(results)));
        self
    }

    pub fn fail(mut self, query: &str, message: &str) -> Self {
        self.replies.insert(query.to_string(), (Duration::ZERO, MockReply::Fail(message.to_string())));
        self
    }

    /// Keep running after cancellation, like a transport whose abort lands late.
    pub fn ignoring_cancel(mut self) -> Self {
        self.ignore_cancel = true;
        self
    }

    /// Queries received, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn aborted(&self) -> usize {
        self.aborted.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl RemoteSearch for MockRemote {
    async fn search(&self, query: &str, cancel: CancellationToken) -> RemoteResult<Vec<SearchResult>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).push(query.to_string());
        let (delay, reply) = self
            .replies
            .get(query)
            .cloned()
            .unwrap_or_else(|| (Duration::ZERO, self.fallback.clone()));
        if self.ignore_cancel {
            tokio::time::sleep(delay).await;
        } else {
            tokio::select! {
                _ = cancel.cancelled() => {
                    self.aborted.fetch_add(1, Ordering::SeqCst);
                    return Err(RemoteError::Aborted);
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
        match reply {
            MockReply::Results(r) => Ok(r),
            MockReply::Fail(m) => Err(RemoteError::Transport(m)),
        }
    }
}
