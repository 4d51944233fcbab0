use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

use crate::constants::storage_keys::STATISTICS;
use crate::models::{Statistics, StatisticsUpdate};
use crate::storage::{KeyValueStore, Persisted};

/// Usage counters. Every update stamps `last_active`.
pub struct StatisticsStore {
    stats: RwLock<Statistics>,
    persisted: Persisted<Statistics>,
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

impl StatisticsStore {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            stats: RwLock::new(Statistics::default()),
            persisted: Persisted::new(store, STATISTICS),
        }
    }

    /// Loads stored counters. On first run the defaults are written out so
    /// `joined_date` sticks. A failed or unreadable load leaves the stored
    /// record untouched.
    pub async fn load(&self) {
        let mut stats = self.stats.write().await;
        match self.persisted.read().await {
            Ok(Some(stored)) => *stats = stored,
            Ok(None) => {
                info!("No statistics stored yet, starting fresh");
                *stats = Statistics::default();
                self.persisted.save(&stats).await;
            }
            Err(e) => {
                error!(error = %e, "Failed to load statistics, keeping defaults in memory");
                *stats = Statistics::default();
            }
        }
    }

    pub async fn get(&self) -> Statistics {
        self.stats.read().await.clone()
    }

    pub async fn update(&self, update: StatisticsUpdate) {
        let mut stats = self.stats.write().await;
        stats.merge(&update, now_millis());
        self.persisted.save(&stats).await;
    }

    async fn modify(&self, f: impl FnOnce(&Statistics) -> StatisticsUpdate + Send) {
        let mut stats = self.stats.write().await;
        let update = f(&stats);
        stats.merge(&update, now_millis());
        self.persisted.save(&stats).await;
    }

    pub async fn increment_search(&self) {
        self.modify(|s| StatisticsUpdate {
            total_searches: Some(s.total_searches + 1),
            ..Default::default()
        })
        .await;
    }

    pub async fn increment_bookmark(&self) {
        self.modify(|s| StatisticsUpdate {
            total_bookmarks: Some(s.total_bookmarks + 1),
            ..Default::default()
        })
        .await;
    }

    /// Never goes below zero.
    pub async fn decrement_bookmark(&self) {
        self.modify(|s| StatisticsUpdate {
            total_bookmarks: Some(s.total_bookmarks.saturating_sub(1)),
            ..Default::default()
        })
        .await;
    }

    pub async fn increment_chat_started(&self) {
        self.modify(|s| StatisticsUpdate {
            total_chats_started: Some(s.total_chats_started + 1),
            ..Default::default()
        })
        .await;
    }

    pub async fn increment_chemical_viewed(&self) {
        self.modify(|s| StatisticsUpdate {
            chemicals_viewed: Some(s.chemicals_viewed + 1),
            ..Default::default()
        })
        .await;
    }

    /// Zeroes every counter but keeps `joined_date`.
    pub async fn reset(&self) {
        let mut stats = self.stats.write().await;
        *stats = Statistics {
            joined_date: stats.joined_date,
            ..Statistics::default()
        };
        self.persisted.save(&stats).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, UnreadableStore};

    #[tokio::test]
    async fn first_load_persists_defaults() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let stats = StatisticsStore::new(store.clone());

        stats.load().await;

        let raw = store.get(STATISTICS).await.unwrap().unwrap();
        let stored: Statistics = serde_json::from_str(&raw).unwrap();
        assert_eq!(stored.total_searches, 0);
        assert_eq!(stored.joined_date, stats.get().await.joined_date);
    }

    #[tokio::test]
    async fn failed_read_does_not_overwrite_stored_counters() {
        let store = Arc::new(UnreadableStore::default());
        let seeded = r#"{"totalSearches":42,"totalBookmarks":3,"totalChatsStarted":1,"chemicalsViewed":7,"joinedDate":1000,"lastActive":2000}"#;
        store.inner.set(STATISTICS, seeded).await.unwrap();

        let stats = StatisticsStore::new(store.clone());
        stats.load().await;

        assert_eq!(
            store.inner.get(STATISTICS).await.unwrap().as_deref(),
            Some(seeded)
        );
        assert_eq!(stats.get().await.total_searches, 0);
    }

    #[tokio::test]
    async fn corrupt_record_is_left_alone() {
        let store = Arc::new(MemoryStore::new());
        store.set(STATISTICS, "{not json").await.unwrap();

        let stats = StatisticsStore::new(store.clone());
        stats.load().await;

        assert_eq!(
            store.get(STATISTICS).await.unwrap().as_deref(),
            Some("{not json")
        );
    }

    #[tokio::test]
    async fn counters_increment_and_reload() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let stats = StatisticsStore::new(store.clone());
        stats.load().await;

        stats.increment_search().await;
        stats.increment_search().await;
        stats.increment_chat_started().await;
        stats.increment_chemical_viewed().await;

        let reloaded = StatisticsStore::new(store);
        reloaded.load().await;
        let s = reloaded.get().await;
        assert_eq!(s.total_searches, 2);
        assert_eq!(s.total_chats_started, 1);
        assert_eq!(s.chemicals_viewed, 1);
    }

    #[tokio::test]
    async fn bookmark_count_floors_at_zero() {
        let stats = StatisticsStore::new(Arc::new(MemoryStore::new()));
        stats.increment_bookmark().await;
        stats.decrement_bookmark().await;
        stats.decrement_bookmark().await;
        assert_eq!(stats.get().await.total_bookmarks, 0);
    }

    #[tokio::test]
    async fn reset_keeps_joined_date() {
        let stats = StatisticsStore::new(Arc::new(MemoryStore::new()));
        stats
            .update(StatisticsUpdate {
                total_searches: Some(9),
                joined_date: Some(1_000),
                ..Default::default()
            })
            .await;

        stats.reset().await;

        let s = stats.get().await;
        assert_eq!(s.total_searches, 0);
        assert_eq!(s.joined_date, 1_000);
    }
}
