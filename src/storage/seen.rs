//! Seen-store: the append-only history of every notified entry.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};

use crate::error::Result;
use crate::models::{Entry, LatestEntry};
use crate::pipeline::diff::fresh_entries;
use crate::storage::LocalStorage;

/// Ordered, duplicate-free collection of entries.
///
/// Serialized as a plain JSON array of `{title, link}` records in
/// insertion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Entry>", into = "Vec<Entry>")]
pub struct SeenSet {
    entries: Vec<Entry>,
    index: HashSet<Entry>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, entry: &Entry) -> bool {
        self.index.contains(entry)
    }

    /// Append an entry unless an identical one is already present.
    ///
    /// Returns `true` if the entry was appended.
    pub fn push(&mut self, entry: Entry) -> bool {
        if self.index.insert(entry.clone()) {
            self.entries.push(entry);
            true
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// All entries sharing the most recent date parsed from their titles.
    ///
    /// Entries without a parseable date are ignored. Result keeps
    /// insertion order.
    pub fn latest(&self) -> Vec<Entry> {
        let Some(max) = self.entries.iter().filter_map(Entry::date).max() else {
            return Vec::new();
        };
        self.entries
            .iter()
            .filter(|e| e.date() == Some(max))
            .cloned()
            .collect()
    }

    /// [`latest`](SeenSet::latest), or the last appended entry when no
    /// title carries a date.
    pub fn latest_or_last(&self) -> Vec<Entry> {
        let latest = self.latest();
        if latest.is_empty() {
            self.entries.last().cloned().into_iter().collect()
        } else {
            latest
        }
    }

    /// The single most recently seen entry.
    ///
    /// Among entries sharing the latest date the last one appended wins.
    pub fn latest_entry(&self) -> Option<LatestEntry> {
        self.latest_or_last().last().map(LatestEntry::from)
    }
}

impl From<Vec<Entry>> for SeenSet {
    fn from(entries: Vec<Entry>) -> Self {
        let mut set = Self::new();
        for entry in entries {
            set.push(entry);
        }
        set
    }
}

impl From<SeenSet> for Vec<Entry> {
    fn from(set: SeenSet) -> Self {
        set.entries
    }
}

impl PartialEq for SeenSet {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for SeenSet {}

/// Durable, lock-protected owner of the [`SeenSet`].
pub struct SeenStore {
    storage: LocalStorage,
    key: PathBuf,
    set: RwLock<SeenSet>,
    /// Serializes disk writes; never held together with `set` across I/O.
    write_lock: Mutex<()>,
    dirty: AtomicBool,
}

impl SeenStore {
    /// Load the store from disk; missing or corrupt state yields an empty set.
    pub async fn load(storage: LocalStorage, key: impl Into<PathBuf>) -> Self {
        let key = key.into();
        let set: SeenSet = storage.load_json_or_default(&key).await;
        log::info!("Loaded {} seen entries from {}", set.len(), key.display());
        Self {
            storage,
            key,
            set: RwLock::new(set),
            write_lock: Mutex::new(()),
            dirty: AtomicBool::new(false),
        }
    }

    /// Select the fresh candidates and record them as seen, in one
    /// critical section.
    ///
    /// Two concurrent callers can never both receive the same entry.
    /// The in-memory set is updated immediately; call [`persist`] to make
    /// the change durable.
    ///
    /// [`persist`]: SeenStore::persist
    pub async fn claim_fresh(&self, candidates: &[Entry]) -> Vec<Entry> {
        let mut set = self.set.write().await;
        let fresh = fresh_entries(candidates, &set);
        for entry in &fresh {
            set.push(entry.clone());
        }
        if !fresh.is_empty() {
            self.dirty.store(true, Ordering::SeqCst);
        }
        fresh
    }

    /// Add entries and persist the full updated set.
    ///
    /// Returns the entries that were not already present.
    pub async fn append(&self, entries: &[Entry]) -> Result<Vec<Entry>> {
        let added = self.claim_fresh(entries).await;
        self.persist().await?;
        Ok(added)
    }

    /// Write the current set to disk, replacing the previous document.
    pub async fn persist(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.dirty.store(false, Ordering::SeqCst);
        let snapshot = self.set.read().await.clone();

        match self.storage.write_json(&self.key, &snapshot).await {
            Ok(()) => {
                log::debug!(
                    "Persisted {} seen entries to {}",
                    snapshot.len(),
                    self.key.display()
                );
                Ok(())
            }
            Err(e) => {
                self.dirty.store(true, Ordering::SeqCst);
                Err(e)
            }
        }
    }

    /// Whether the in-memory set holds entries not yet written to disk.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.set.read().await.len()
    }

    pub async fn snapshot(&self) -> SeenSet {
        self.set.read().await.clone()
    }

    pub async fn latest_or_last(&self) -> Vec<Entry> {
        self.set.read().await.latest_or_last()
    }

    pub async fn latest_entry(&self) -> Option<LatestEntry> {
        self.set.read().await.latest_entry()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;
    use tempfile::TempDir;

    use super::*;

    fn entry(title: &str, link: &str) -> Entry {
        Entry::new(title, link)
    }

    #[test]
    fn test_push_rejects_duplicates() {
        let mut set = SeenSet::new();
        assert!(set.push(entry("a", "1")));
        assert!(!set.push(entry("a", "1")));
        assert!(set.push(entry("a", "2")));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_from_vec_drops_duplicates() {
        let set = SeenSet::from(vec![entry("a", "1"), entry("b", "2"), entry("a", "1")]);
        assert_eq!(set.entries(), &[entry("a", "1"), entry("b", "2")]);
    }

    #[test]
    fn test_latest_picks_max_date() {
        let set = SeenSet::from(vec![
            entry("01/02/2024 First", "a"),
            entry("03/02/2024 Third", "c"),
            entry("02/02/2024 Second", "b"),
        ]);
        assert_eq!(set.latest(), vec![entry("03/02/2024 Third", "c")]);
    }

    #[test]
    fn test_latest_returns_ties_and_skips_undated() {
        let set = SeenSet::from(vec![
            entry("no date here", "x"),
            entry("03/02/2024 A", "a"),
            entry("01/02/2024 B", "b"),
            entry("03/02/2024 C", "c"),
        ]);
        assert_eq!(
            set.latest(),
            vec![entry("03/02/2024 A", "a"), entry("03/02/2024 C", "c")]
        );
    }

    #[test]
    fn test_latest_empty_when_nothing_dated() {
        let set = SeenSet::from(vec![entry("undated", "")]);
        assert!(set.latest().is_empty());
        assert!(SeenSet::new().latest().is_empty());
    }

    #[test]
    fn test_latest_or_last_falls_back_to_last_appended() {
        let set = SeenSet::from(vec![entry("x", "1"), entry("y", "2")]);
        assert_eq!(set.latest_or_last(), vec![entry("y", "2")]);
        assert!(SeenSet::new().latest_or_last().is_empty());
    }

    #[test]
    fn test_latest_entry() {
        let set = SeenSet::from(vec![
            entry("03/02/2024 A", "a"),
            entry("03/02/2024 C", "c"),
            entry("undated", "z"),
        ]);
        let latest = set.latest_entry().unwrap();
        assert_eq!(latest.title, "03/02/2024 C");
        assert_eq!(latest.date, NaiveDate::from_ymd_opt(2024, 2, 3));

        let undated = SeenSet::from(vec![entry("x", "1"), entry("y", "2")]);
        let latest = undated.latest_entry().unwrap();
        assert_eq!(latest.title, "y");
        assert_eq!(latest.date, None);

        assert!(SeenSet::new().latest_entry().is_none());
    }

    #[tokio::test]
    async fn test_load_missing_is_empty() {
        let tmp = TempDir::new().unwrap();
        let store = SeenStore::load(LocalStorage::new(tmp.path()), "seen.json").await;
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_load_corrupt_is_empty() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("seen.json"), "{ not json").unwrap();
        let store = SeenStore::load(LocalStorage::new(tmp.path()), "seen.json").await;
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_append_round_trip() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let store = SeenStore::load(storage.clone(), "seen.json").await;

        let entries = vec![entry("01/02/2024\nFoo", "a"), entry("Bar", "")];
        let added = store.append(&entries).await.unwrap();
        assert_eq!(added, entries);
        assert!(!store.is_dirty());

        let reloaded = SeenStore::load(storage, "seen.json").await;
        assert_eq!(reloaded.snapshot().await, store.snapshot().await);
    }

    #[tokio::test]
    async fn test_persisted_format_is_title_link_records() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let store = SeenStore::load(storage, "seen.json").await;
        store.append(&[entry("T", "L")]).await.unwrap();

        let raw = std::fs::read_to_string(tmp.path().join("seen.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value, serde_json::json!([{ "title": "T", "link": "L" }]));
    }

    #[tokio::test]
    async fn test_claim_fresh_marks_dirty_until_persisted() {
        let tmp = TempDir::new().unwrap();
        let store = SeenStore::load(LocalStorage::new(tmp.path()), "seen.json").await;

        let fresh = store.claim_fresh(&[entry("a", "1")]).await;
        assert_eq!(fresh.len(), 1);
        assert!(store.is_dirty());
        store.persist().await.unwrap();
        assert!(!store.is_dirty());

        assert!(store.claim_fresh(&[entry("a", "1")]).await.is_empty());
        assert!(!store.is_dirty());
    }

    #[tokio::test]
    async fn test_concurrent_claims_never_share_an_entry() {
        let tmp = TempDir::new().unwrap();
        let store = Arc::new(SeenStore::load(LocalStorage::new(tmp.path()), "seen.json").await);
        let candidates: Vec<Entry> = (0..50).map(|i| entry(&format!("e{i}"), "")).collect();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            let candidates = candidates.clone();
            handles.push(tokio::spawn(async move { store.claim_fresh(&candidates).await }));
        }

        let mut total = 0;
        for handle in handles {
            total += handle.await.unwrap().len();
        }
        assert_eq!(total, candidates.len());
        assert_eq!(store.len().await, candidates.len());
    }
}
