use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

use shiori_api::{CatalogPage, CatalogSource};

use super::filters::{FilterChange, SearchFilters};
use super::session::{PendingFetch, SearchSession, SearchSnapshot};
use crate::config::AppConfig;

/// Tunables for a search pipeline.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Quiet period before a query/filter change is fetched.
    pub debounce: Duration,
    pub page_size: u32,
    pub retain_pages_on_error: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(500),
            page_size: 20,
            retain_pages_on_error: false,
        }
    }
}

impl From<&AppConfig> for SearchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            debounce: config.search.debounce(),
            page_size: config.api.page_size,
            retain_pages_on_error: config.search.retain_pages_on_error,
        }
    }
}

/// Cheap handle to a running search task.
///
/// Dropping every clone stops the task; fetches already in flight finish
/// but their results are discarded.
#[derive(Clone)]
pub struct SearchHandle {
    tx: mpsc::UnboundedSender<SearchCommand>,
    state: watch::Receiver<SearchSnapshot>,
}

enum SearchCommand {
    SetQuery(String),
    SetFilter(FilterChange),
    SetFilters(SearchFilters),
    ClearFilters,
    LoadMore,
    Refresh,
}

struct FetchOutcome {
    generation: u64,
    page: u32,
    result: Result<CatalogPage, String>,
}

impl SearchHandle {
    /// Spawn the search task on the current tokio runtime.
    pub fn spawn<S>(source: Arc<S>, config: SearchConfig) -> Self
    where
        S: CatalogSource + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let (fetch_tx, fetch_rx) = mpsc::unbounded_channel();
        let session = SearchSession::new(config.page_size, config.retain_pages_on_error);
        let (state_tx, state) = watch::channel(session.snapshot().clone());

        let runner = SearchRunner {
            source,
            session,
            debounce: config.debounce,
            deadline: None,
            rx,
            fetch_tx,
            fetch_rx,
            state_tx,
        };
        tokio::spawn(runner.run());

        Self { tx, state }
    }

    /// Replace the free-text query (debounced).
    pub fn set_query(&self, text: impl Into<String>) {
        self.send(SearchCommand::SetQuery(text.into()));
    }

    /// Change one filter (debounced).
    pub fn set_filter(&self, change: FilterChange) {
        self.send(SearchCommand::SetFilter(change));
    }

    /// Replace all filters at once (debounced).
    pub fn set_filters(&self, filters: SearchFilters) {
        self.send(SearchCommand::SetFilters(filters));
    }

    /// Reset filters to their defaults (debounced).
    pub fn clear_filters(&self) {
        self.send(SearchCommand::ClearFilters);
    }

    /// Fetch the next page right away, if one exists and nothing is pending.
    pub fn load_more(&self) {
        self.send(SearchCommand::LoadMore);
    }

    /// Fetch page 1 right away, skipping the debounce window.
    pub fn refresh(&self) {
        self.send(SearchCommand::Refresh);
    }

    pub fn snapshot(&self) -> SearchSnapshot {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<SearchSnapshot> {
        self.state.clone()
    }

    /// Wait for the first settled or failed state published after `revision`.
    pub async fn settled_after(&self, revision: u64) -> SearchSnapshot {
        let mut rx = self.state.clone();
        let snapshot = match rx
            .wait_for(|s| s.revision > revision && s.phase.is_terminal())
            .await
        {
            Ok(snapshot) => snapshot.clone(),
            Err(_) => self.snapshot(),
        };
        snapshot
    }

    fn send(&self, cmd: SearchCommand) {
        if self.tx.send(cmd).is_err() {
            tracing::warn!("search task is gone, command dropped");
        }
    }
}

// ── Runner ───────────────────────────────────────────────────────

struct SearchRunner<S> {
    source: Arc<S>,
    session: SearchSession,
    debounce: Duration,
    /// Trailing-edge debounce timer; `None` when nothing is pending.
    deadline: Option<Instant>,
    rx: mpsc::UnboundedReceiver<SearchCommand>,
    fetch_tx: mpsc::UnboundedSender<FetchOutcome>,
    fetch_rx: mpsc::UnboundedReceiver<FetchOutcome>,
    state_tx: watch::Sender<SearchSnapshot>,
}

impl<S> SearchRunner<S>
where
    S: CatalogSource + 'static,
{
    async fn run(mut self) {
        loop {
            let deadline = self.deadline;
            tokio::select! {
                cmd = self.rx.recv() => match cmd {
                    Some(cmd) => self.handle(cmd),
                    None => break,
                },
                Some(outcome) = self.fetch_rx.recv() => self.settle(outcome),
                () = sleep_until(deadline) => {
                    self.deadline = None;
                    let pending = self.session.begin_first_page();
                    self.start(pending);
                }
            }
        }
        tracing::debug!("search task stopped");
    }

    fn handle(&mut self, cmd: SearchCommand) {
        match cmd {
            SearchCommand::SetQuery(text) => {
                self.session.set_query(text);
                self.arm_debounce();
            }
            SearchCommand::SetFilter(change) => {
                let filters = self.session.snapshot().filters.with(change);
                self.session.set_filters(filters);
                self.arm_debounce();
            }
            SearchCommand::SetFilters(filters) => {
                self.session.set_filters(filters);
                self.arm_debounce();
            }
            SearchCommand::ClearFilters => {
                self.session.set_filters(SearchFilters::default());
                self.arm_debounce();
            }
            SearchCommand::LoadMore => match self.session.begin_next_page() {
                Some(pending) => self.start(pending),
                None => tracing::debug!("load more ignored"),
            },
            SearchCommand::Refresh => {
                self.deadline = None;
                let pending = self.session.begin_first_page();
                self.start(pending);
            }
        }
    }

    /// (Re)start the quiet period; the latest change wins.
    fn arm_debounce(&mut self) {
        self.deadline = Some(Instant::now() + self.debounce);
        self.publish();
    }

    fn start(&mut self, pending: PendingFetch) {
        let PendingFetch { generation, query } = pending;
        tracing::debug!(
            generation,
            page = query.page,
            text = %query.text,
            "search fetch started"
        );
        self.publish();

        let source = Arc::clone(&self.source);
        let tx = self.fetch_tx.clone();
        tokio::spawn(async move {
            let page = query.page;
            // A panicking request must still settle the session.
            let fetch = tokio::spawn(async move {
                source.search(&query).await.map_err(|e| e.to_string())
            });
            let result = match fetch.await {
                Ok(result) => result,
                Err(e) => Err(format!("search request aborted: {e}")),
            };
            // The runner may have stopped; nothing to do then.
            let _ = tx.send(FetchOutcome {
                generation,
                page,
                result,
            });
        });
    }

    fn settle(&mut self, outcome: FetchOutcome) {
        let FetchOutcome {
            generation,
            page,
            result,
        } = outcome;

        if let Err(e) = &result {
            tracing::warn!(generation, page, error = %e, "search fetch failed");
        }
        if self.session.settle(generation, page, result) {
            let snap = self.session.snapshot();
            tracing::debug!(
                page,
                results = snap.results.len(),
                total = snap.total_count,
                has_more = snap.has_more,
                "search settled"
            );
            self.publish();
        } else {
            tracing::debug!(generation, page, "stale search response discarded");
        }
    }

    fn publish(&mut self) {
        let snapshot = self.session.bump_revision().clone();
        self.state_tx.send_replace(snapshot);
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
