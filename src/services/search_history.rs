use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::constants::limits::MAX_HISTORY_ITEMS;
use crate::constants::storage_keys::SEARCH_HISTORY;
use crate::models::SearchHistoryItem;
use crate::storage::{KeyValueStore, Persisted};

/// Recent queries, newest first.
pub struct SearchHistory {
    items: RwLock<Vec<SearchHistoryItem>>,
    persisted: Persisted<Vec<SearchHistoryItem>>,
}

impl SearchHistory {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            items: RwLock::new(Vec::new()),
            persisted: Persisted::new(store, SEARCH_HISTORY),
        }
    }

    /// Replaces the in-memory list with what is stored; missing or
    /// unreadable data loads as empty.
    pub async fn load(&self) {
        let mut items = self.persisted.load().await.unwrap_or_default();
        items.truncate(MAX_HISTORY_ITEMS);
        *self.items.write().await = items;
    }

    pub async fn entries(&self) -> Vec<SearchHistoryItem> {
        self.items.read().await.clone()
    }

    /// Moves `query` to the front, dropping any case-insensitive duplicate.
    /// Blank queries are ignored.
    pub async fn add(&self, query: &str, results_count: Option<usize>) {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return;
        }

        let mut items = self.items.write().await;
        items.retain(|item| !item.same_query(trimmed));
        items.insert(0, SearchHistoryItem::new(trimmed, results_count));
        items.truncate(MAX_HISTORY_ITEMS);

        debug!(query = trimmed, size = items.len(), "Recorded search");
        self.persisted.save(&items).await;
    }

    /// Removes entries whose query equals `query` exactly.
    pub async fn remove(&self, query: &str) {
        let mut items = self.items.write().await;
        items.retain(|item| item.query != query);
        self.persisted.save(&items).await;
    }

    pub async fn clear(&self) {
        let mut items = self.items.write().await;
        items.clear();
        self.persisted.clear().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FailingStore, MemoryStore};

    #[tokio::test]
    async fn readding_moves_query_to_front() {
        let history = SearchHistory::new(Arc::new(MemoryStore::new()));

        history.add("acetone", Some(1)).await;
        history.add("ethanol", None).await;
        history.add("  ACETONE ", Some(3)).await;

        let entries = history.entries().await;
        let queries: Vec<_> = entries.iter().map(|i| i.query.as_str()).collect();
        assert_eq!(queries, vec!["ACETONE", "ethanol"]);
        assert_eq!(entries[0].results_count, Some(3));
    }

    #[tokio::test]
    async fn never_exceeds_cap_and_evicts_oldest() {
        let history = SearchHistory::new(Arc::new(MemoryStore::new()));

        for i in 0..=MAX_HISTORY_ITEMS {
            history.add(&format!("query {i}"), None).await;
        }

        let entries = history.entries().await;
        assert_eq!(entries.len(), MAX_HISTORY_ITEMS);
        assert_eq!(entries[0].query, format!("query {MAX_HISTORY_ITEMS}"));
        assert!(entries.iter().all(|i| i.query != "query 0"));
    }

    #[tokio::test]
    async fn survives_reload_and_clear() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let history = SearchHistory::new(store.clone());
        history.add("benzene", Some(2)).await;
        history.add("", None).await;

        let reloaded = SearchHistory::new(store.clone());
        reloaded.load().await;
        assert_eq!(reloaded.entries().await.len(), 1);

        reloaded.remove("Benzene").await;
        assert_eq!(reloaded.entries().await.len(), 1);
        reloaded.remove("benzene").await;
        assert!(reloaded.entries().await.is_empty());

        history.clear().await;
        assert!(store.get(SEARCH_HISTORY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn storage_failures_keep_in_memory_state() {
        let history = SearchHistory::new(Arc::new(FailingStore));
        history.load().await;
        history.add("toluene", None).await;
        assert_eq!(history.entries().await.len(), 1);
    }
}
