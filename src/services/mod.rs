//! Service layer for the watcher.
//!
//! This module contains the collaborators of a check cycle:
//! - Page fetching (`PageFetcher`, `HttpFetcher`)
//! - Entry extraction (`EntryExtractor`)
//! - Notification fan-out (`Notifier`, `Messenger`)

mod extractor;
mod fetcher;
mod notifier;

pub use extractor::EntryExtractor;
pub use fetcher::{HttpFetcher, PageFetcher};
pub use notifier::{DeliveryReport, LogMessenger, MAX_MESSAGE_LEN, Messenger, Notifier};

#[cfg(test)]
pub(crate) use notifier::testing;
