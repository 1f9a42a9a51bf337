use std::sync::Arc;

use lede_api::{CancellationToken, Navigator, RemoteResult, RemoteSearch};
use lede_core::SearchResult;
use lede_store::{CorpusReader, ResultCache};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::TypeaheadConfig;
use crate::model::{Action, Session, View, MSG_SEARCH_FAILED};
use crate::nav::Key;

const INPUT_QUEUE: usize = 64;

/// Events fed to a running controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Change(String),
    Focus,
    Key(Key),
    Hover(usize),
    MouseDown(usize),
    OutsideClick,
    Close,
    Submit,
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("typeahead controller stopped")]
pub struct ControllerClosed;

/// Sending side of a spawned controller plus its latest view.
#[derive(Clone)]
pub struct ControllerHandle {
    tx: mpsc::Sender<Input>,
    view: watch::Receiver<View>,
}

impl ControllerHandle {
    pub async fn send(&self, input: Input) -> Result<(), ControllerClosed> {
        self.tx.send(input).await.map_err(|_| ControllerClosed)
    }

    pub async fn type_text(&self, text: impl Into<String>) -> Result<(), ControllerClosed> {
        self.send(Input::Change(text.into())).await
    }

    pub async fn key(&self, key: Key) -> Result<(), ControllerClosed> {
        self.send(Input::Key(key)).await
    }

    pub async fn shutdown(&self) -> Result<(), ControllerClosed> {
        self.send(Input::Shutdown).await
    }

    pub fn view(&self) -> View {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<View> {
        self.view.clone()
    }
}

struct Completion {
    seq: u64,
    query: String,
    outcome: RemoteResult<Vec<SearchResult>>,
}

struct InFlight {
    seq: u64,
    token: CancellationToken,
}

struct Controller {
    cfg: TypeaheadConfig,
    corpus: CorpusReader,
    remote: Option<Arc<dyn RemoteSearch>>,
    nav: Arc<dyn Navigator>,
    session: Session,
    cache: ResultCache,
    deadline: Option<Instant>,
    // Bumped on every evaluation; completions carrying an older value are stale.
    seq: u64,
    inflight: Option<InFlight>,
    done_tx: mpsc::UnboundedSender<Completion>,
    view_tx: watch::Sender<View>,
}

/// Spawn a controller on the current runtime.
///
/// Local suggestions come from `corpus`; when `remote` is set it is the
/// authority and local results only fill in for empty or failed replies.
pub fn spawn_controller(
    cfg: TypeaheadConfig,
    corpus: CorpusReader,
    remote: Option<Arc<dyn RemoteSearch>>,
    nav: Arc<dyn Navigator>,
) -> (ControllerHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel::<Input>(INPUT_QUEUE);
    let (done_tx, done_rx) = mpsc::unbounded_channel::<Completion>();
    let session = Session::new();
    let cache = ResultCache::with_capacity(cfg.cache_capacity);
    let initial = session.view(cfg.min_chars, false);
    let (view_tx, view_rx) = watch::channel(initial);
    let ctl = Controller {
        cfg,
        corpus,
        remote,
        nav,
        session,
        cache,
        deadline: None,
        seq: 0,
        inflight: None,
        done_tx,
        view_tx,
    };
    let task = tokio::spawn(ctl.run(rx, done_rx));
    (ControllerHandle { tx, view: view_rx }, task)
}

impl Controller {
    async fn run(mut self, mut rx: mpsc::Receiver<Input>, mut done_rx: mpsc::UnboundedReceiver<Completion>) {
        let mut epoch_rx = self.corpus.subscribe_epoch();
        let mut corpus_live = true;
        info!(remote = self.remote.is_some(), debounce_ms = self.cfg.debounce.as_millis() as u64, "typeahead controller started");
        self.publish();
        loop {
            let deadline = self.deadline;
            tokio::select! {
                maybe = rx.recv() => match maybe {
                    Some(Input::Shutdown) | None => break,
                    Some(input) => self.on_input(input),
                },
                _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.on_debounce();
                }
                Some(done) = done_rx.recv() => self.on_completion(done),
                changed = epoch_rx.changed(), if corpus_live => match changed {
                    Ok(()) => {
                        let epoch = *epoch_rx.borrow_and_update();
                        self.on_corpus(epoch);
                    }
                    Err(_) => corpus_live = false,
                },
            }
            self.publish();
        }
        self.teardown();
    }

    fn on_input(&mut self, input: Input) {
        let action = match input {
            Input::Change(text) => {
                self.session.set_input(text);
                self.deadline = Some(Instant::now() + self.cfg.debounce);
                None
            }
            Input::Focus => {
                self.session.focus();
                None
            }
            Input::Key(k) => self.session.key(k),
            Input::Hover(i) => {
                self.session.hover(i);
                None
            }
            Input::MouseDown(i) => self.session.mouse_down(i),
            Input::OutsideClick | Input::Close => {
                self.session.close();
                None
            }
            Input::Submit => Some(self.session.submit()),
            Input::Shutdown => None,
        };
        match action {
            Some(Action::Navigate(href)) => {
                debug!(%href, "typeahead navigate");
                self.nav.navigate(&href);
            }
            Some(Action::FocusInput) => self.nav.focus_input(),
            None => {}
        }
    }

    fn on_debounce(&mut self) {
        self.deadline = None;
        let q = self.session.input().trim().to_string();
        if self.session.commit(q) {
            metrics::counter!("typeahead_commits_total", 1u64);
            self.evaluate();
        }
    }

    fn on_corpus(&mut self, epoch: u64) {
        debug!(epoch, query = self.session.committed(), "typeahead corpus swapped");
        if !self.session.committed().is_empty() {
            self.evaluate();
        }
    }

    /// Recompute results for the committed query. Any request in flight
    /// belongs to an older evaluation and is aborted first.
    fn evaluate(&mut self) {
        self.abort_inflight();
        self.seq += 1;
        let q = self.session.committed().to_string();
        if q.is_empty() || q.chars().count() < self.cfg.min_chars {
            self.session.idle();
            return;
        }
        let Some(remote) = self.remote.clone() else {
            let local = self.local(&q);
            self.session.show(local, None);
            return;
        };
        if let Some(hit) = self.cache.get(&q) {
            metrics::counter!("typeahead_cache_hits_total", 1u64);
            let hit = self.trim(hit.to_vec());
            let shown = if hit.is_empty() { self.local(&q) } else { hit };
            self.session.show(shown, None);
            return;
        }
        metrics::counter!("typeahead_cache_misses_total", 1u64);
        let seq = self.seq;
        let token = CancellationToken::new();
        let cancel = token.clone();
        let done_tx = self.done_tx.clone();
        let query = q.clone();
        tokio::spawn(async move {
            let outcome = remote.search(&query, cancel).await;
            let _ = done_tx.send(Completion { seq, query, outcome });
        });
        debug!(seq, query = %q, "typeahead remote request");
        self.inflight = Some(InFlight { seq, token });
        self.session.pending();
    }

    fn on_completion(&mut self, done: Completion) {
        if done.seq != self.seq {
            metrics::counter!("typeahead_stale_responses_total", 1u64);
            debug!(seq = done.seq, current = self.seq, query = %done.query, "typeahead stale response dropped");
            return;
        }
        if self.inflight.as_ref().is_some_and(|f| f.seq == done.seq) {
            self.inflight = None;
        }
        match done.outcome {
            Err(e) if e.is_abort() => {}
            Ok(results) => {
                self.cache.insert(done.query.clone(), results.clone());
                let results = self.trim(results);
                let shown = if results.is_empty() { self.local(&done.query) } else { results };
                self.session.show(shown, None);
            }
            Err(e) => {
                metrics::counter!("typeahead_remote_errors_total", 1u64);
                warn!(error = %e, query = %done.query, "typeahead remote search failed");
                self.cache.insert(done.query.clone(), Vec::new());
                let local = self.local(&done.query);
                self.session.show(local, Some(MSG_SEARCH_FAILED.to_string()));
            }
        }
    }

    fn abort_inflight(&mut self) {
        if let Some(f) = self.inflight.take() {
            debug!(seq = f.seq, "typeahead remote request aborted");
            f.token.cancel();
        }
    }

    fn local(&self, q: &str) -> Vec<SearchResult> {
        self.corpus.current().suggest(q, self.cfg.max_results)
    }

    fn trim(&self, mut results: Vec<SearchResult>) -> Vec<SearchResult> {
        results.truncate(self.cfg.max_results);
        results
    }

    fn indexing(&self) -> bool {
        let corpus = self.corpus.current();
        self.remote.is_none() && corpus.is_published() && corpus.is_empty()
    }

    fn publish(&self) {
        let next = self.session.view(self.cfg.min_chars, self.indexing());
        self.view_tx.send_if_modified(|v| {
            if *v == next {
                false
            } else {
                *v = next;
                true
            }
        });
    }

    fn teardown(&mut self) {
        self.deadline = None;
        self.abort_inflight();
        self.cache.clear();
        info!("typeahead controller stopped");
    }
}
