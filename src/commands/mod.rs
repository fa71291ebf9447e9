//! Command interface.
//!
//! Parses inbound text into a [`CommandRequest`] and produces the reply.
//! The handler is transport-agnostic; the Telegram loop in `bot` is one
//! caller, tests are another.

use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::error::Result;
use crate::models::{Messages, SubscriberId, format_interval, render};
use crate::pipeline::{CycleOutcome, SchedulerHandle, SchedulerState};
use crate::storage::AppState;

/// A recognized request, or the raw text of an unrecognized one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandRequest {
    Subscribe,
    Unsubscribe,
    CheckNow,
    LastEntry,
    Status,
    Help,
    Unknown(String),
}

impl CommandRequest {
    /// Parse a command word.
    ///
    /// Accepts chat-style syntax: a leading `/`, a trailing `@botname`,
    /// and `_` in place of `-` (`/check_now@watch_bot`). `start` and
    /// `stop` are aliases for `subscribe` and `unsubscribe`.
    pub fn parse(input: &str) -> Self {
        let word = input.split_whitespace().next().unwrap_or("");
        let word = word.strip_prefix('/').unwrap_or(word);
        let word = word.split('@').next().unwrap_or(word);

        match word.to_ascii_lowercase().replace('_', "-").as_str() {
            "subscribe" | "start" => Self::Subscribe,
            "unsubscribe" | "stop" => Self::Unsubscribe,
            "check-now" => Self::CheckNow,
            "last-entry" => Self::LastEntry,
            "status" => Self::Status,
            "help" => Self::Help,
            _ => Self::Unknown(input.trim().to_string()),
        }
    }
}

/// Snapshot answered by the `status` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub state: SchedulerState,
    pub subscribed: bool,
    pub entry_count: usize,
    pub poll_interval: Duration,
}

/// Executes commands against shared state and the scheduler.
pub struct CommandHandler {
    state: Arc<AppState>,
    scheduler: SchedulerHandle,
    messages: Messages,
    base_url: Option<Url>,
}

impl CommandHandler {
    pub fn new(state: Arc<AppState>, scheduler: SchedulerHandle, messages: Messages) -> Self {
        Self {
            state,
            scheduler,
            messages,
            base_url: None,
        }
    }

    /// Resolve relative entry links against the watched page.
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Handle one request from `caller` and produce the reply text.
    ///
    /// Never fails: problems are reported in the reply.
    pub async fn handle(&self, caller: SubscriberId, request: CommandRequest) -> String {
        let m = &self.messages;
        match request {
            CommandRequest::Subscribe => match self.state.subscribers().add(caller).await {
                Ok(true) => m.subscribed.clone(),
                Ok(false) => m.already_subscribed.clone(),
                Err(e) => {
                    log::error!("Failed to subscribe {}: {}", caller, e);
                    m.storage_failed.clone()
                }
            },
            CommandRequest::Unsubscribe => match self.state.subscribers().remove(caller).await {
                Ok(true) => m.unsubscribed.clone(),
                Ok(false) => m.not_subscribed.clone(),
                Err(e) => {
                    log::error!("Failed to unsubscribe {}: {}", caller, e);
                    m.storage_failed.clone()
                }
            },
            CommandRequest::CheckNow => self.check_now().await,
            CommandRequest::LastEntry => self.last_entry().await,
            CommandRequest::Status => {
                let report = self.status(caller).await;
                let yes_no = |b: bool| if b { m.yes.as_str() } else { m.no.as_str() };
                let state = match report.state {
                    SchedulerState::Running => m.state_running.as_str(),
                    SchedulerState::Idle => m.state_idle.as_str(),
                };
                render(
                    &m.status,
                    &[
                        ("state", state),
                        ("subscribed", yes_no(report.subscribed)),
                        ("count", &report.entry_count.to_string()),
                        ("interval", &format_interval(report.poll_interval.as_secs())),
                    ],
                )
            }
            CommandRequest::Help => m.help.clone(),
            CommandRequest::Unknown(text) => {
                log::debug!("Unrecognized command from {}: {:?}", caller, text);
                format!("{}\n\n{}", m.not_understood, m.help)
            }
        }
    }

    /// Gather the status figures for `caller`.
    pub async fn status(&self, caller: SubscriberId) -> StatusReport {
        StatusReport {
            state: self.scheduler.state(),
            subscribed: self.state.subscribers().contains(caller).await,
            entry_count: self.state.seen().len().await,
            poll_interval: self.scheduler.poll_interval(),
        }
    }

    async fn check_now(&self) -> String {
        let m = &self.messages;
        match self.scheduler.check_now().await {
            Some(CycleOutcome::Completed(report)) if report.fresh.is_empty() => {
                m.check_nothing.clone()
            }
            Some(CycleOutcome::Completed(report)) => {
                render(&m.check_found, &[("count", &report.fresh.len().to_string())])
            }
            Some(CycleOutcome::FetchFailed(error)) => render(&m.check_failed, &[("error", &error)]),
            None => m.check_unavailable.clone(),
        }
    }

    async fn last_entry(&self) -> String {
        let m = &self.messages;
        let latest = self.state.seen().latest_or_last().await;
        if latest.is_empty() {
            return m.no_entries.clone();
        }

        let items: Vec<String> = latest
            .iter()
            .map(|entry| entry.format(&m.latest_item, self.base_url.as_ref()))
            .collect();
        format!("{}\n\n{}", m.latest_header, items.join("\n\n"))
    }
}

const NONE_YET: &str = "none yet";

/// Result of the read-only `latest` query, as JSON.
///
/// The most recently seen entry as `{"title","date","link"}`, or the
/// string `"none yet"` when nothing has been seen.
pub async fn latest_entry_json(state: &AppState) -> Result<String> {
    let json = match state.seen().latest_entry().await {
        Some(latest) => serde_json::to_string_pretty(&latest)?,
        None => serde_json::to_string(NONE_YET)?,
    };
    Ok(json)
}
