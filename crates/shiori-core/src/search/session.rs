use shiori_api::{CatalogPage, CatalogQuery, CatalogRecord};

use super::filters::SearchFilters;

/// Where the pipeline currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchPhase {
    #[default]
    Idle,
    Debouncing,
    Fetching,
    Settled,
    Failed,
}

impl SearchPhase {
    /// Settled or Failed: nothing pending.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Settled | Self::Failed)
    }
}

/// Published view of a search session.
#[derive(Debug, Clone, Default)]
pub struct SearchSnapshot {
    pub query: String,
    pub filters: SearchFilters,
    /// Last page merged into `results`; 0 before the first settle.
    pub page: u32,
    pub results: Vec<CatalogRecord>,
    pub total_count: u64,
    pub has_more: bool,
    pub phase: SearchPhase,
    pub error: Option<String>,
    /// Bumped on every published change.
    pub revision: u64,
}

impl SearchSnapshot {
    pub fn loading(&self) -> bool {
        self.phase == SearchPhase::Fetching
    }

    /// Whether a load-more request would be accepted.
    pub fn can_load_more(&self) -> bool {
        self.has_more && self.phase.is_terminal()
    }
}

/// A fetch the session has started and is waiting on.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingFetch {
    pub generation: u64,
    pub query: CatalogQuery,
}

/// Transient search state; owned by exactly one search task.
#[derive(Debug)]
pub struct SearchSession {
    snapshot: SearchSnapshot,
    page_size: u32,
    retain_pages_on_error: bool,
    /// Bumped whenever the query or filters change, so responses to an
    /// older state are recognized as stale.
    generation: u64,
}

impl SearchSession {
    pub fn new(page_size: u32, retain_pages_on_error: bool) -> Self {
        Self {
            snapshot: SearchSnapshot::default(),
            page_size: page_size.max(1),
            retain_pages_on_error,
            generation: 0,
        }
    }

    pub fn snapshot(&self) -> &SearchSnapshot {
        &self.snapshot
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    // ── Input changes ───────────────────────────────────────────

    pub fn set_query(&mut self, text: String) {
        self.snapshot.query = text;
        self.reset();
    }

    pub fn set_filters(&mut self, filters: SearchFilters) {
        self.snapshot.filters = filters;
        self.reset();
    }

    fn reset(&mut self) {
        self.generation += 1;
        self.snapshot.phase = SearchPhase::Debouncing;
    }

    // ── Fetches ─────────────────────────────────────────────────

    /// Start a fresh page-1 fetch for the current query and filters.
    pub fn begin_first_page(&mut self) -> PendingFetch {
        self.generation += 1;
        self.begin(1)
    }

    /// Start fetching the next page, if one exists and nothing is pending.
    pub fn begin_next_page(&mut self) -> Option<PendingFetch> {
        if !self.snapshot.can_load_more() {
            return None;
        }
        let next = self.snapshot.page + 1;
        Some(self.begin(next))
    }

    fn begin(&mut self, page: u32) -> PendingFetch {
        self.snapshot.phase = SearchPhase::Fetching;
        PendingFetch {
            generation: self.generation,
            query: self
                .snapshot
                .filters
                .to_query(&self.snapshot.query, page, self.page_size),
        }
    }

    /// Merge a fetch outcome. Returns `false` if it was stale and ignored.
    pub fn settle(
        &mut self,
        generation: u64,
        page: u32,
        outcome: Result<CatalogPage, String>,
    ) -> bool {
        if generation != self.generation || self.snapshot.phase != SearchPhase::Fetching {
            return false;
        }

        match outcome {
            Ok(fetched) => {
                let records = self.snapshot.filters.apply_local(fetched.records);
                let page_len = records.len() as u64;
                if page == 1 {
                    self.snapshot.results = records;
                } else {
                    self.snapshot.results.extend(records);
                }
                self.snapshot.total_count = fetched.total_count.unwrap_or(page_len);
                self.snapshot.has_more = fetched.has_next;
                self.snapshot.page = page;
                self.snapshot.error = None;
                self.snapshot.phase = SearchPhase::Settled;
            }
            Err(message) => {
                if !(self.retain_pages_on_error && page > 1) {
                    self.snapshot.results.clear();
                    self.snapshot.total_count = 0;
                    self.snapshot.has_more = false;
                    self.snapshot.page = 0;
                }
                self.snapshot.error = Some(message);
                self.snapshot.phase = SearchPhase::Failed;
            }
        }
        true
    }

    /// Mark a published change.
    pub fn bump_revision(&mut self) -> &SearchSnapshot {
        self.snapshot.revision += 1;
        &self.snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::filters::FilterChange;
    use crate::test_support::record;

    fn page(ids: &[u64], has_next: bool) -> CatalogPage {
        CatalogPage {
            records: ids.iter().map(|&id| record(id, 8.0)).collect(),
            total_count: Some(100),
            has_next,
        }
    }

    fn result_ids(session: &SearchSession) -> Vec<u64> {
        session.snapshot().results.iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_first_page_then_append() {
        let mut session = SearchSession::new(2, false);
        let first = session.begin_first_page();
        assert_eq!(first.query.page, 1);
        assert!(session.settle(first.generation, 1, Ok(page(&[1, 2], true))));
        assert_eq!(session.snapshot().phase, SearchPhase::Settled);

        let next = session.begin_next_page().unwrap();
        assert_eq!(next.query.page, 2);
        assert_eq!(next.query.offset(), 2);
        assert!(session.settle(next.generation, 2, Ok(page(&[3, 4], false))));

        assert_eq!(result_ids(&session), vec![1, 2, 3, 4]);
        assert_eq!(session.snapshot().page, 2);
        assert!(!session.snapshot().has_more);
        assert!(session.begin_next_page().is_none());
    }

    #[test]
    fn test_change_resets_to_first_page() {
        let mut session = SearchSession::new(2, false);
        let first = session.begin_first_page();
        session.settle(first.generation, 1, Ok(page(&[1, 2], true)));

        session.set_query("naruto".into());
        assert_eq!(session.snapshot().phase, SearchPhase::Debouncing);
        assert!(session.begin_next_page().is_none());

        let fresh = session.begin_first_page();
        assert_eq!(fresh.query.page, 1);
        assert_eq!(fresh.query.text, "naruto");
        session.settle(fresh.generation, 1, Ok(page(&[7], false)));
        assert_eq!(result_ids(&session), vec![7]);
    }

    #[test]
    fn test_stale_response_ignored() {
        let mut session = SearchSession::new(20, false);
        let old = session.begin_first_page();
        session.set_filters(
            SearchFilters::default().with(FilterChange::Year(Some(2001))),
        );
        let new = session.begin_first_page();

        assert!(session.settle(new.generation, 1, Ok(page(&[2], false))));
        assert!(!session.settle(old.generation, 1, Ok(page(&[1], false))));
        assert_eq!(result_ids(&session), vec![2]);
    }

    #[test]
    fn test_total_count_falls_back_to_page_length() {
        let mut session = SearchSession::new(20, false);
        let first = session.begin_first_page();
        let mut fetched = page(&[1, 2, 3], false);
        fetched.total_count = None;
        session.settle(first.generation, 1, Ok(fetched));
        assert_eq!(session.snapshot().total_count, 3);
    }

    #[test]
    fn test_failure_clears_results() {
        let mut session = SearchSession::new(2, false);
        let first = session.begin_first_page();
        session.settle(first.generation, 1, Ok(page(&[1, 2], true)));

        let next = session.begin_next_page().unwrap();
        session.settle(next.generation, 2, Err("connection reset".into()));

        let snap = session.snapshot();
        assert_eq!(snap.phase, SearchPhase::Failed);
        assert!(snap.results.is_empty());
        assert!(!snap.has_more);
        assert_eq!(snap.error.as_deref(), Some("connection reset"));
    }

    #[test]
    fn test_failure_retains_pages_when_configured() {
        let mut session = SearchSession::new(2, true);
        let first = session.begin_first_page();
        session.settle(first.generation, 1, Ok(page(&[1, 2], true)));

        let next = session.begin_next_page().unwrap();
        session.settle(next.generation, 2, Err("timeout".into()));
        assert_eq!(result_ids(&session), vec![1, 2]);
        assert_eq!(session.snapshot().page, 1);

        // Retry of the same page is allowed.
        let retry = session.begin_next_page().unwrap();
        assert_eq!(retry.query.page, 2);
    }

    #[test]
    fn test_first_page_failure_clears_even_when_retaining() {
        let mut session = SearchSession::new(2, true);
        let first = session.begin_first_page();
        session.settle(first.generation, 1, Ok(page(&[1, 2], true)));

        let again = session.begin_first_page();
        session.settle(again.generation, 1, Err("503".into()));
        assert!(session.snapshot().results.is_empty());
    }
}
