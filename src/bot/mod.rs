//! Inbound command loop over the Telegram Bot API.

pub mod telegram;

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::commands::{CommandHandler, CommandRequest};
use crate::services::MAX_MESSAGE_LEN;
use crate::utils::truncate_graphemes;

pub use telegram::{TelegramClient, Update};

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Poll for commands until `shutdown` is cancelled.
///
/// Each command is handled on its own task, so a slow `check-now` does
/// not hold up other callers. Commands already accepted finish and get
/// their reply before this returns.
pub async fn run_bot(
    client: Arc<TelegramClient>,
    handler: Arc<CommandHandler>,
    shutdown: CancellationToken,
) {
    let tracker = TaskTracker::new();
    let mut offset: Option<i64> = None;
    let mut backoff = INITIAL_BACKOFF;

    log::info!("Command loop started");

    loop {
        let polled = tokio::select! {
            _ = shutdown.cancelled() => break,
            polled = client.get_updates(offset) => polled,
        };

        let updates = match polled {
            Ok(updates) => {
                backoff = INITIAL_BACKOFF;
                updates
            }
            Err(e) => {
                log::warn!(
                    "Polling for commands failed: {}; retrying in {}s",
                    e,
                    backoff.as_secs()
                );
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(backoff) => {}
                }
                backoff = (backoff * 2).min(MAX_BACKOFF);
                continue;
            }
        };

        for update in updates {
            offset = Some(update.update_id + 1);
            let Some((caller, text)) = update.text_message() else {
                continue;
            };

            let request = CommandRequest::parse(text);
            log::debug!("Command {:?} from {}", request, caller);

            let client = Arc::clone(&client);
            let handler = Arc::clone(&handler);
            tracker.spawn(async move {
                let reply = handler.handle(caller, request).await;
                let reply = truncate_graphemes(&reply, MAX_MESSAGE_LEN);
                if let Err(e) = client.send_message(caller, &reply).await {
                    log::warn!("Failed to reply to {}: {}", caller, e);
                }
            });
        }
    }

    tracker.close();
    if !tracker.is_empty() {
        log::info!("Waiting for {} command(s) to finish", tracker.len());
    }
    tracker.wait().await;
    log::info!("Command loop stopped");
}
