//! Diff calculation between extracted candidates and the seen-store.
//!
//! An entry is fresh when no structurally equal entry has been seen
//! before. Freshness is decided on title and link alone; a page that
//! republishes identical text is treated as the same publication.

use std::collections::HashSet;

use crate::models::Entry;
use crate::storage::SeenSet;

/// Candidates absent from `seen`, in candidate order.
///
/// A candidate repeated within the same page is reported once.
pub fn fresh_entries(candidates: &[Entry], seen: &SeenSet) -> Vec<Entry> {
    let mut batch: HashSet<&Entry> = HashSet::new();
    candidates
        .iter()
        .filter(|entry| !seen.contains(entry) && batch.insert(*entry))
        .cloned()
        .collect()
}
