//! Conversation search orchestration.
//!
//! [`ConversationSearch`] turns keystrokes and mode changes into lookups and
//! publishes a [`SearchState`] on a `watch` channel. Every state transition
//! that starts a new lookup bumps a generation counter. Completions carry the
//! generation they were started under and are dropped once it is stale.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use prism_core::{Conversation, ConversationSource, Debouncer, PrismConfig, SearchTiming};

use crate::backend::{SearchBackend, SearchError};
use crate::local::search_local;
use crate::state::{ActiveMode, SearchMode, SearchPhase, SearchState};

#[derive(Debug, Default)]
struct Shared {
    state: SearchState,
    generation: u64,
}

/// Everything a spawned lookup needs. Cheap to clone.
#[derive(Clone)]
struct Context {
    shared: Arc<Mutex<Shared>>,
    tx: Arc<watch::Sender<SearchState>>,
    source: Arc<dyn ConversationSource>,
    backend: Arc<dyn SearchBackend>,
    inflight: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl Context {
    /// Starts a new generation, applies `update` and publishes the result.
    fn begin(&self, update: impl FnOnce(&mut SearchState)) -> u64 {
        let mut shared = self.shared.lock();
        shared.generation += 1;
        update(&mut shared.state);
        self.tx.send_replace(shared.state.clone());
        shared.generation
    }

    /// Updates state without invalidating work in flight.
    fn modify(&self, update: impl FnOnce(&mut SearchState)) {
        let mut shared = self.shared.lock();
        update(&mut shared.state);
        self.tx.send_replace(shared.state.clone());
    }

    fn invalidate(&self) {
        self.shared.lock().generation += 1;
    }

    fn dispatch(&self, mode: SearchMode, generation: u64, query: String) {
        match mode {
            SearchMode::Local => {
                let conversations = self.source.conversations();
                let results = search_local(&conversations, &query);
                self.settle(generation, Ok(results));
            }
            SearchMode::Server => self.spawn_server(generation, query),
        }
    }

    /// Issues the request on its own task. Newer keystrokes do not abort it;
    /// the generation check in [`settle`](Self::settle) discards the answer.
    fn spawn_server(&self, generation: u64, query: String) {
        let ctx = self.clone();
        let handle = tokio::spawn(async move {
            let result = ctx.backend.search(query.trim()).await;
            ctx.settle(generation, result);
        });
        let mut inflight = self.inflight.lock();
        inflight.retain(|h| !h.is_finished());
        inflight.push(handle);
    }

    /// Applies a completed lookup. Returns `false` if it was stale.
    fn settle(&self, generation: u64, result: Result<Vec<Conversation>, SearchError>) -> bool {
        let mut shared = self.shared.lock();
        if shared.generation != generation {
            debug!(
                generation,
                current = shared.generation,
                "search: dropping stale response"
            );
            return false;
        }

        let state = &mut shared.state;
        state.phase = SearchPhase::Settled;
        state.loading = false;
        match result {
            Ok(results) => {
                debug!(query = %state.query, count = results.len(), "search: settled");
                state.results = results;
                state.error = None;
            }
            Err(e) => {
                warn!(query = %state.query, "search failed: {e}");
                state.error = Some(e.user_message());
            }
        }
        self.tx.send_replace(state.clone());
        true
    }

    fn abort_inflight(&self) {
        for handle in self.inflight.lock().drain(..) {
            handle.abort();
        }
    }
}

/// Debounced local/server conversation search.
///
/// Must be created and driven from within a tokio runtime. Dropping it
/// cancels the pending timer and aborts requests in flight.
///
/// Do not hold a `watch::Ref` from [`subscribe`](Self::subscribe) across a
/// call into this type: publishing takes the channel's write lock.
pub struct ConversationSearch {
    ctx: Context,
    timing: SearchTiming,
    mode: SearchMode,
    debouncer: Debouncer,
}

impl ConversationSearch {
    pub fn new(
        source: Arc<dyn ConversationSource>,
        backend: Arc<dyn SearchBackend>,
        timing: SearchTiming,
    ) -> Self {
        let (tx, _rx) = watch::channel(SearchState::default());
        Self {
            ctx: Context {
                shared: Arc::new(Mutex::new(Shared::default())),
                tx: Arc::new(tx),
                source,
                backend,
                inflight: Arc::new(Mutex::new(Vec::new())),
            },
            timing,
            mode: SearchMode::default(),
            debouncer: Debouncer::new(timing.local),
        }
    }

    pub fn from_config(
        source: Arc<dyn ConversationSource>,
        backend: Arc<dyn SearchBackend>,
        config: &PrismConfig,
    ) -> Self {
        Self::new(source, backend, config.search_timing())
    }

    /// The selected mode. Survives [`clear`](Self::clear).
    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    pub fn timing(&self) -> SearchTiming {
        self.timing
    }

    fn delay_for(&self, mode: SearchMode) -> Duration {
        match mode {
            SearchMode::Local => self.timing.local,
            SearchMode::Server => self.timing.server,
        }
    }

    /// Records a keystroke. Whitespace-only input clears the search.
    pub fn set_query(&mut self, query: impl Into<String>) {
        let query = query.into();
        if query.trim().is_empty() {
            self.clear();
            return;
        }

        let mode = self.mode;
        let generation = self.ctx.begin(|s| {
            s.query = query.clone();
            s.mode = mode.into();
            s.phase = SearchPhase::Searching;
            s.loading = true;
        });

        let delay = self.delay_for(mode);
        let ctx = self.ctx.clone();
        self.debouncer.schedule_after(delay, async move {
            debug!(?mode, %query, "search: debounce fired");
            ctx.dispatch(mode, generation, query);
        });
    }

    /// Switches lookup strategy. With an active query the lookup is re-issued
    /// right away under the new mode, skipping the debounce.
    pub fn set_mode(&mut self, mode: SearchMode) {
        if mode == self.mode {
            return;
        }
        self.mode = mode;
        if let Some(query) = self.active_query() {
            self.run_now(query);
        }
    }

    /// Re-runs the active query in the current mode without waiting.
    pub fn retry(&mut self) {
        if let Some(query) = self.active_query() {
            self.run_now(query);
        }
    }

    /// Back to inactive. Pending timers are cancelled and responses still in
    /// flight will be ignored.
    pub fn clear(&mut self) {
        self.debouncer.cancel();
        self.ctx.begin(|s| *s = SearchState::default());
    }

    /// Hides the error banner. Results and in-flight work are untouched.
    pub fn dismiss_error(&self) {
        self.ctx.modify(|s| s.error = None);
    }

    /// The last published state. Reads the watch channel only, never the
    /// internal state lock.
    pub fn snapshot(&self) -> SearchState {
        self.ctx.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.ctx.tx.subscribe()
    }

    fn active_query(&self) -> Option<String> {
        let state = self.ctx.tx.borrow();
        state.is_active().then(|| state.query.clone())
    }

    fn run_now(&mut self, query: String) {
        self.debouncer.cancel();
        let mode = self.mode;
        let generation = self.ctx.begin(|s| {
            s.mode = ActiveMode::from(mode);
            s.phase = SearchPhase::Searching;
            s.loading = true;
            s.error = None;
        });
        self.ctx.dispatch(mode, generation, query);
    }
}

impl Drop for ConversationSearch {
    fn drop(&mut self) {
        self.debouncer.cancel();
        self.ctx.invalidate();
        self.ctx.abort_inflight();
    }
}
