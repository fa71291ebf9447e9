//! Durable process state.
//!
//! Two JSON documents live under the storage directory: the seen-store
//! (every entry already notified) and the subscriber registry. Each is
//! owned by a single lock-protected holder; [`AppState`] bundles both so
//! the scheduler and the command interface share one instance.

pub mod local;
pub mod seen;
pub mod subscribers;

use std::path::PathBuf;

// Re-export for convenience
pub use local::{Loaded, LocalStorage};
pub use seen::{SeenSet, SeenStore};
pub use subscribers::{SubscriberRegistry, SubscriberSet};

use crate::models::StorageConfig;

/// Shared state holder for the seen-store and the subscriber registry.
///
/// The collections are only reachable through their atomic operations.
pub struct AppState {
    seen: SeenStore,
    subscribers: SubscriberRegistry,
}

impl AppState {
    /// Load both documents from `root_dir`.
    pub async fn load(root_dir: impl Into<PathBuf>, config: &StorageConfig) -> Self {
        let storage = LocalStorage::new(root_dir);
        let seen = SeenStore::load(storage.clone(), &config.seen_file).await;
        let subscribers = SubscriberRegistry::load(storage, &config.subscribers_file).await;
        Self { seen, subscribers }
    }

    pub fn seen(&self) -> &SeenStore {
        &self.seen
    }

    pub fn subscribers(&self) -> &SubscriberRegistry {
        &self.subscribers
    }
}
