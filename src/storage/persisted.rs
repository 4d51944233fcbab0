use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{error, warn};

use super::{KeyValueStore, StorageError};

/// One JSON value stored under a fixed key.
///
/// Reads tolerate missing or corrupt data and writes never fail the caller:
/// problems are logged and the in-memory copy stays authoritative until the
/// next successful write.
pub struct Persisted<T> {
    store: Arc<dyn KeyValueStore>,
    key: &'static str,
    _value: PhantomData<fn() -> T>,
}

impl<T> Clone for Persisted<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            key: self.key,
            _value: PhantomData,
        }
    }
}

impl<T: Serialize + DeserializeOwned> Persisted<T> {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, key: &'static str) -> Self {
        Self {
            store,
            key,
            _value: PhantomData,
        }
    }

    #[must_use]
    pub const fn key(&self) -> &'static str {
        self.key
    }

    /// `Ok(None)` only when nothing is stored under the key. Backend
    /// failures and unparseable values are errors.
    pub async fn read(&self) -> Result<Option<T>, StorageError> {
        match self.store.get(self.key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// `None` when nothing is stored or the stored value is unreadable.
    pub async fn load(&self) -> Option<T> {
        match self.read().await {
            Ok(value) => value,
            Err(StorageError::Serialization(e)) => {
                warn!(key = self.key, error = %e, "Ignoring corrupt persisted value");
                None
            }
            Err(e) => {
                error!(key = self.key, error = %e, "Failed to read persisted value");
                None
            }
        }
    }

    /// Returns whether the write reached the store.
    pub async fn save(&self, value: &T) -> bool {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                error!(key = self.key, error = %e, "Failed to serialize value");
                return false;
            }
        };

        match self.store.set(self.key, &json).await {
            Ok(()) => true,
            Err(e) => {
                error!(key = self.key, error = %e, "Failed to persist value");
                false
            }
        }
    }

    pub async fn clear(&self) -> bool {
        match self.store.remove(self.key).await {
            Ok(()) => true,
            Err(e) => {
                error!(key = self.key, error = %e, "Failed to remove persisted value");
                false
            }
        }
    }
}
