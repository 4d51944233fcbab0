use std::sync::Arc;
use tokio::sync::RwLock;

use crate::constants::storage_keys::BOOKMARKS;
use crate::models::Chemical;
use crate::storage::{KeyValueStore, Persisted};

/// Saved chemicals, most recently added first.
pub struct Bookmarks {
    items: RwLock<Vec<Chemical>>,
    persisted: Persisted<Vec<Chemical>>,
}

impl Bookmarks {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            items: RwLock::new(Vec::new()),
            persisted: Persisted::new(store, BOOKMARKS),
        }
    }

    pub async fn load(&self) {
        *self.items.write().await = self.persisted.load().await.unwrap_or_default();
    }

    pub async fn list(&self) -> Vec<Chemical> {
        self.items.read().await.clone()
    }

    pub async fn is_bookmarked(&self, chemical_id: &str) -> bool {
        self.items.read().await.iter().any(|c| c.id == chemical_id)
    }

    /// Returns `false` if the chemical was already saved.
    pub async fn add(&self, chemical: Chemical) -> bool {
        let mut items = self.items.write().await;
        if items.iter().any(|c| c.id == chemical.id) {
            return false;
        }
        items.insert(0, chemical);
        self.persisted.save(&items).await;
        true
    }

    /// Returns whether anything was removed.
    pub async fn remove(&self, chemical_id: &str) -> bool {
        let mut items = self.items.write().await;
        let before = items.len();
        items.retain(|c| c.id != chemical_id);
        if items.len() == before {
            return false;
        }
        self.persisted.save(&items).await;
        true
    }

    /// Returns the new bookmarked state.
    pub async fn toggle(&self, chemical: Chemical) -> bool {
        if self.remove(&chemical.id).await {
            false
        } else {
            self.add(chemical).await
        }
    }

    pub async fn clear(&self) {
        self.items.write().await.clear();
        self.persisted.clear().await;
    }
}
