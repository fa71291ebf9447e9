// src/pipeline/cycle.rs

//! One check cycle: Fetch → Extract → Diff → Notify → Persist.

use std::sync::Arc;
use std::time::Instant;

use crate::error::Result;
use crate::models::{Config, Entry};
use crate::services::{
    DeliveryReport, EntryExtractor, HttpFetcher, Messenger, Notifier, PageFetcher,
};
use crate::storage::AppState;

/// Summary of a cycle that reached the diff step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Entries extracted from the page
    pub candidates: usize,
    /// Entries selected as new, in page order
    pub fresh: Vec<Entry>,
    pub delivery: DeliveryReport,
    /// Whether the seen-store on disk matches memory after the cycle
    pub persisted: bool,
}

/// Result of one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Completed(CycleReport),
    /// The page could not be fetched; nothing changed
    FetchFailed(String),
}

impl CycleOutcome {
    /// Number of new entries found, zero for failed cycles.
    pub fn fresh_count(&self) -> usize {
        match self {
            CycleOutcome::Completed(report) => report.fresh.len(),
            CycleOutcome::FetchFailed(_) => 0,
        }
    }
}

/// Runs check cycles against shared state.
pub struct Watcher {
    fetcher: Arc<dyn PageFetcher>,
    extractor: EntryExtractor,
    notifier: Notifier,
    state: Arc<AppState>,
}

impl Watcher {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        extractor: EntryExtractor,
        notifier: Notifier,
        state: Arc<AppState>,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            notifier,
            state,
        }
    }

    /// Build a watcher for the configured page, delivering through `messenger`.
    pub fn from_config(
        config: &Config,
        messenger: Arc<dyn Messenger>,
        state: Arc<AppState>,
    ) -> Result<Self> {
        let fetcher = Arc::new(HttpFetcher::new(&config.watcher)?);
        let extractor = EntryExtractor::new(&config.watcher)?;
        let notifier = Notifier::new(messenger, &config.messages.new_entry)
            .with_base_url(config.watcher.page_url()?)
            .with_concurrency(config.telegram.max_concurrent_sends);
        Ok(Self::new(fetcher, extractor, notifier, state))
    }

    /// Run one full cycle. Never fails: errors are logged and reflected
    /// in the outcome.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let start = Instant::now();

        let raw = match self.fetcher.fetch().await {
            Ok(raw) => raw,
            Err(e) => {
                log::error!("Failed to fetch the page: {}", e);
                return CycleOutcome::FetchFailed(e.to_string());
            }
        };

        let candidates = self.extractor.extract(&raw);
        log::debug!("Extracted {} candidate entries", candidates.len());

        let seen = self.state.seen();
        let fresh = seen.claim_fresh(&candidates).await;

        let delivery = if fresh.is_empty() {
            log::info!("No new content found.");
            DeliveryReport::default()
        } else {
            log::info!("Found {} new entries.", fresh.len());
            let subscribers = self.state.subscribers().snapshot().await;
            self.notifier.notify(&fresh, &subscribers).await
        };

        if seen.is_dirty() {
            if let Err(e) = seen.persist().await {
                log::error!("Failed to persist seen entries (will retry next cycle): {}", e);
            }
        }

        log::debug!("Cycle finished in {:?}", start.elapsed());
        CycleOutcome::Completed(CycleReport {
            candidates: candidates.len(),
            fresh,
            delivery,
            persisted: !seen.is_dirty(),
        })
    }
}
