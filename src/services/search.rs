//! Hybrid chemical search.
//!
//! Local catalog matches are published as soon as the query changes. The
//! remote lookup runs after a quiet period and is merged in when it lands,
//! unless a newer query has superseded it.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::clients::catalog::ChemicalCatalog;
use crate::clients::pubchem::ChemicalSource;
use crate::config::SearchConfig;
use crate::models::Chemical;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
    /// Trimmed query these results belong to.
    pub query: String,
    pub results: Vec<Chemical>,
    /// A remote lookup is pending or in flight.
    pub loading: bool,
    /// Something could be shown without waiting for the network.
    pub has_cached_results: bool,
    /// Message of the last failed remote lookup for this query.
    pub error: Option<String>,
}

/// Local entries first, then remote entries whose id is not already present.
#[must_use]
pub fn merge_results(local: Vec<Chemical>, remote: Vec<Chemical>) -> Vec<Chemical> {
    let mut seen: HashSet<String> = local.iter().map(|c| c.id.clone()).collect();
    let mut merged = local;
    merged.extend(remote.into_iter().filter(|c| seen.insert(c.id.clone())));
    merged
}

struct Inner {
    catalog: Arc<ChemicalCatalog>,
    source: Option<Arc<dyn ChemicalSource>>,
    debounce: Duration,
    min_query_length: usize,
    max_remote_results: usize,
    generation: AtomicU64,
    state: watch::Sender<SearchState>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Inner {
    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    fn abort_pending(&self) {
        if let Some(handle) = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
    }

    async fn fetch_remote(
        &self,
        source: &dyn ChemicalSource,
        query: &str,
    ) -> Result<Vec<Chemical>, String> {
        match source.search(query).await {
            Ok(mut remote) => {
                remote.truncate(self.max_remote_results);
                Ok(remote)
            }
            Err(e) => {
                warn!(query, error = %e, "Remote chemical search failed");
                Err(e.to_string())
            }
        }
    }

    /// Publishes `next` only if `generation` is still the latest query.
    fn publish_if_current(&self, generation: u64, next: SearchState) -> bool {
        self.state.send_if_modified(|state| {
            if !self.is_current(generation) {
                return false;
            }
            *state = next;
            true
        })
    }
}

/// Debounced local+remote search with observable state.
///
/// Dropping the search aborts any pending remote lookup.
pub struct HybridSearch {
    inner: Arc<Inner>,
}

impl HybridSearch {
    #[must_use]
    pub fn new(
        catalog: Arc<ChemicalCatalog>,
        source: Option<Arc<dyn ChemicalSource>>,
        config: &SearchConfig,
    ) -> Self {
        let source = if config.remote_enabled { source } else { None };
        let (state, _) = watch::channel(SearchState::default());

        Self {
            inner: Arc::new(Inner {
                catalog,
                source,
                debounce: config.debounce(),
                min_query_length: config.min_query_length,
                max_remote_results: config.max_remote_results,
                generation: AtomicU64::new(0),
                state,
                pending: Mutex::new(None),
            }),
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.inner.state.subscribe()
    }

    #[must_use]
    pub fn state(&self) -> SearchState {
        self.inner.state.borrow().clone()
    }

    fn is_searchable(&self, query: &str) -> bool {
        !query.is_empty() && query.chars().count() >= self.inner.min_query_length
    }

    /// Updates the query. Must be called inside a tokio runtime.
    ///
    /// Local matches are published immediately; the remote lookup is
    /// scheduled after the debounce period and replaces any pending one.
    pub fn set_query(&self, raw: &str) {
        let inner = &self.inner;
        let generation = inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        inner.abort_pending();

        let query = raw.trim().to_string();
        if !self.is_searchable(&query) {
            inner.state.send_replace(SearchState {
                query,
                ..SearchState::default()
            });
            return;
        }

        let local = inner.catalog.search(&query);
        let has_cached_results = !local.is_empty();

        let Some(source) = inner.source.clone() else {
            inner.state.send_replace(SearchState {
                query,
                results: local,
                loading: false,
                has_cached_results,
                error: None,
            });
            return;
        };

        inner.state.send_replace(SearchState {
            query: query.clone(),
            results: local.clone(),
            loading: true,
            has_cached_results,
            error: None,
        });

        let task_inner = Arc::clone(inner);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(task_inner.debounce).await;
            if !task_inner.is_current(generation) {
                return;
            }

            debug!(query = %query, "Running remote chemical search");
            let outcome = task_inner.fetch_remote(source.as_ref(), &query).await;

            let next = match outcome {
                Ok(remote) => SearchState {
                    query: query.clone(),
                    results: merge_results(local, remote),
                    loading: false,
                    has_cached_results,
                    error: None,
                },
                Err(message) => SearchState {
                    query: query.clone(),
                    results: local,
                    loading: false,
                    has_cached_results,
                    error: Some(message),
                },
            };

            if !task_inner.publish_if_current(generation, next) {
                debug!(query = %query, "Discarding stale search result");
            }
        });

        *inner
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(handle);
    }

    /// Stops any pending lookup and clears the loading flag.
    pub fn cancel(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        self.inner.abort_pending();
        self.inner.state.send_if_modified(|state| {
            let was_loading = state.loading;
            state.loading = false;
            was_loading
        });
    }

    /// Single-shot search without debounce. Does not touch the published state.
    pub async fn search_once(&self, raw: &str) -> SearchState {
        let query = raw.trim().to_string();
        if !self.is_searchable(&query) {
            return SearchState {
                query,
                ..SearchState::default()
            };
        }

        let local = self.inner.catalog.search(&query);
        let has_cached_results = !local.is_empty();

        let (results, error) = match &self.inner.source {
            Some(source) => match self.inner.fetch_remote(source.as_ref(), &query).await {
                Ok(remote) => (merge_results(local, remote), None),
                Err(message) => (local, Some(message)),
            },
            None => (local, None),
        };

        SearchState {
            query,
            results,
            loading: false,
            has_cached_results,
            error,
        }
    }
}

impl Drop for HybridSearch {
    fn drop(&mut self) {
        self.inner.abort_pending();
    }
}
