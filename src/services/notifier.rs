// src/services/notifier.rs

//! Notification fan-out.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use url::Url;

use crate::error::Result;
use crate::models::{Entry, SubscriberId};
use crate::storage::SubscriberSet;
use crate::utils::truncate_graphemes;

/// Longest message the transport accepts.
pub const MAX_MESSAGE_LEN: usize = 4096;

/// Outbound side of the messaging transport.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Deliver one text message. Failures are [`crate::error::AppError::Delivery`].
    async fn send(&self, to: SubscriberId, text: &str) -> Result<()>;
}

/// Messenger used when no transport is configured: messages are only logged.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMessenger;

#[async_trait]
impl Messenger for LogMessenger {
    async fn send(&self, to: SubscriberId, text: &str) -> Result<()> {
        log::info!("[no transport] message for {}: {}", to, text);
        Ok(())
    }
}

/// Counters for one notification run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: usize,
}

impl DeliveryReport {
    pub fn attempted(&self) -> usize {
        self.delivered + self.failed
    }
}

/// Sends one message per entry to every subscriber.
pub struct Notifier {
    messenger: Arc<dyn Messenger>,
    template: String,
    base_url: Option<Url>,
    concurrency: usize,
}

impl Notifier {
    pub fn new(messenger: Arc<dyn Messenger>, template: impl Into<String>) -> Self {
        Self {
            messenger,
            template: template.into(),
            base_url: None,
            concurrency: 1,
        }
    }

    /// Resolve relative entry links against the watched page.
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Maximum number of sends in flight for a single entry.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn render(&self, entry: &Entry) -> String {
        let text = entry.format(&self.template, self.base_url.as_ref());
        truncate_graphemes(&text, MAX_MESSAGE_LEN)
    }

    /// Deliver every entry to every subscriber.
    ///
    /// A failed delivery is logged and skipped; it never stops the
    /// remaining deliveries.
    pub async fn notify(&self, entries: &[Entry], subscribers: &SubscriberSet) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        if subscribers.is_empty() {
            if !entries.is_empty() {
                log::info!("No subscribers; {} entries not sent", entries.len());
            }
            return report;
        }

        for entry in entries {
            let text = self.render(entry);
            let text = text.as_str();
            let messenger = &self.messenger;

            let results: Vec<(SubscriberId, Result<()>)> = stream::iter(subscribers.iter().copied())
                .map(move |id| async move { (id, messenger.send(id, text).await) })
                .buffer_unordered(self.concurrency)
                .collect()
                .await;

            for (id, result) in results {
                match result {
                    Ok(()) => report.delivered += 1,
                    Err(e) => {
                        report.failed += 1;
                        log::warn!("Failed to notify {}: {}", id, e);
                    }
                }
            }
        }

        log::info!(
            "Notified {} entries: {} delivered, {} failed",
            entries.len(),
            report.delivered,
            report.failed
        );
        report
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingMessenger;
    use super::*;

    fn subscribers(ids: &[i64]) -> SubscriberSet {
        ids.iter().copied().map(SubscriberId).collect()
    }

    #[tokio::test]
    async fn test_every_entry_to_every_subscriber() {
        let messenger = Arc::new(RecordingMessenger::default());
        let notifier = Notifier::new(messenger.clone(), "{title}|{link}").with_concurrency(4);
        let entries = vec![Entry::new("A", "a"), Entry::new("B", "b")];

        let report = notifier.notify(&entries, &subscribers(&[1, 2, 3])).await;

        assert_eq!(report, DeliveryReport { delivered: 6, failed: 0 });
        for id in [1, 2, 3] {
            assert_eq!(messenger.sent_to(id), vec!["A|a", "B|b"]);
        }
    }

    #[tokio::test]
    async fn test_failed_subscriber_is_skipped() {
        let messenger = Arc::new(RecordingMessenger::failing(&[2]));
        let notifier = Notifier::new(messenger.clone(), "{title}");
        let entries = vec![Entry::new("A", ""), Entry::new("B", "")];

        let report = notifier.notify(&entries, &subscribers(&[1, 2, 3])).await;

        assert_eq!(report.delivered, 4);
        assert_eq!(report.failed, 2);
        assert_eq!(report.attempted(), 6);
        assert!(messenger.sent_to(2).is_empty());
        assert_eq!(messenger.sent_to(3), vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_no_subscribers_sends_nothing() {
        let messenger = Arc::new(RecordingMessenger::default());
        let notifier = Notifier::new(messenger.clone(), "{title}");

        let report = notifier
            .notify(&[Entry::new("A", "")], &SubscriberSet::new())
            .await;

        assert_eq!(report, DeliveryReport::default());
        assert!(messenger.sent().is_empty());
    }

    #[test]
    fn test_render_resolves_link_and_truncates() {
        let base = Url::parse("https://example.com/registre/index.jsp").unwrap();
        let notifier = Notifier::new(Arc::new(LogMessenger), "{title}\n{link}").with_base_url(base);

        let text = notifier.render(&Entry::new("Foo", "files/a.pdf"));
        assert_eq!(text, "Foo\nhttps://example.com/registre/files/a.pdf");

        let long = Entry::new("x".repeat(MAX_MESSAGE_LEN * 2), "");
        assert_eq!(notifier.render(&long).chars().count(), MAX_MESSAGE_LEN);

        let combined = Entry::new("a\u{308}".repeat(MAX_MESSAGE_LEN), "");
        assert!(notifier.render(&combined).chars().count() <= MAX_MESSAGE_LEN);
    }
}
