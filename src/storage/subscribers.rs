//! Subscriber registry.

use std::collections::BTreeSet;
use std::path::PathBuf;

use tokio::sync::{Mutex, RwLock};

use crate::error::Result;
use crate::models::SubscriberId;
use crate::storage::LocalStorage;

/// Deduplicated set of subscriber identities.
pub type SubscriberSet = BTreeSet<SubscriberId>;

/// Durable, lock-protected owner of the [`SubscriberSet`].
///
/// Persisted as a JSON array of identities.
pub struct SubscriberRegistry {
    storage: LocalStorage,
    key: PathBuf,
    set: RwLock<SubscriberSet>,
    write_lock: Mutex<()>,
}

impl SubscriberRegistry {
    /// Load the registry from disk; missing or corrupt state yields an empty set.
    pub async fn load(storage: LocalStorage, key: impl Into<PathBuf>) -> Self {
        let key = key.into();
        let set: SubscriberSet = storage.load_json_or_default(&key).await;
        log::info!("Loaded {} subscribers from {}", set.len(), key.display());
        Self {
            storage,
            key,
            set: RwLock::new(set),
            write_lock: Mutex::new(()),
        }
    }

    /// Subscribe `id`. Returns `false` if it was already subscribed.
    ///
    /// If the change cannot be persisted it is rolled back and the error
    /// is returned.
    pub async fn add(&self, id: SubscriberId) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        if !self.set.write().await.insert(id) {
            return Ok(false);
        }
        if let Err(e) = self.write_snapshot().await {
            self.set.write().await.remove(&id);
            return Err(e);
        }
        log::info!("Subscriber {} added", id);
        Ok(true)
    }

    /// Unsubscribe `id`. Returns `false` if it was not subscribed.
    pub async fn remove(&self, id: SubscriberId) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        if !self.set.write().await.remove(&id) {
            return Ok(false);
        }
        if let Err(e) = self.write_snapshot().await {
            self.set.write().await.insert(id);
            return Err(e);
        }
        log::info!("Subscriber {} removed", id);
        Ok(true)
    }

    /// Write the current set to disk, replacing the previous document.
    pub async fn save(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.write_snapshot().await
    }

    /// Caller must hold `write_lock`.
    async fn write_snapshot(&self) -> Result<()> {
        let snapshot: Vec<SubscriberId> = self.set.read().await.iter().copied().collect();
        self.storage.write_json(&self.key, &snapshot).await
    }

    pub async fn contains(&self, id: SubscriberId) -> bool {
        self.set.read().await.contains(&id)
    }

    pub async fn len(&self) -> usize {
        self.set.read().await.len()
    }

    pub async fn snapshot(&self) -> SubscriberSet {
        self.set.read().await.clone()
    }
}
