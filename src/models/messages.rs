//! User-facing message templates.
//!
//! Every string can be overridden in the `[messages]` section of the
//! configuration file. Placeholders are written as `{name}`.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(\w+)\}").expect("valid placeholder regex"));

/// Message templates for notifications and command responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Messages {
    /// Notification sent for each new entry (`{title}`, `{link}`, `{date}`)
    #[serde(default = "defaults::new_entry")]
    pub new_entry: String,

    #[serde(default = "defaults::subscribed")]
    pub subscribed: String,
    #[serde(default = "defaults::already_subscribed")]
    pub already_subscribed: String,
    #[serde(default = "defaults::unsubscribed")]
    pub unsubscribed: String,
    #[serde(default = "defaults::not_subscribed")]
    pub not_subscribed: String,
    #[serde(default = "defaults::storage_failed")]
    pub storage_failed: String,

    /// Check-now outcome with new entries (`{count}`)
    #[serde(default = "defaults::check_found")]
    pub check_found: String,
    #[serde(default = "defaults::check_nothing")]
    pub check_nothing: String,
    /// Check-now outcome when the page could not be fetched (`{error}`)
    #[serde(default = "defaults::check_failed")]
    pub check_failed: String,
    #[serde(default = "defaults::check_unavailable")]
    pub check_unavailable: String,

    /// Header of the last-entry response; entries follow using `latest_item`
    #[serde(default = "defaults::latest_header")]
    pub latest_header: String,
    #[serde(default = "defaults::latest_item")]
    pub latest_item: String,
    #[serde(default = "defaults::no_entries")]
    pub no_entries: String,

    /// Status report (`{state}`, `{subscribed}`, `{count}`, `{interval}`)
    #[serde(default = "defaults::status")]
    pub status: String,
    #[serde(default = "defaults::state_running")]
    pub state_running: String,
    #[serde(default = "defaults::state_idle")]
    pub state_idle: String,
    #[serde(default = "defaults::yes")]
    pub yes: String,
    #[serde(default = "defaults::no")]
    pub no: String,

    #[serde(default = "defaults::help")]
    pub help: String,
    #[serde(default = "defaults::not_understood")]
    pub not_understood: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            new_entry: defaults::new_entry(),
            subscribed: defaults::subscribed(),
            already_subscribed: defaults::already_subscribed(),
            unsubscribed: defaults::unsubscribed(),
            not_subscribed: defaults::not_subscribed(),
            storage_failed: defaults::storage_failed(),
            check_found: defaults::check_found(),
            check_nothing: defaults::check_nothing(),
            check_failed: defaults::check_failed(),
            check_unavailable: defaults::check_unavailable(),
            latest_header: defaults::latest_header(),
            latest_item: defaults::latest_item(),
            no_entries: defaults::no_entries(),
            status: defaults::status(),
            state_running: defaults::state_running(),
            state_idle: defaults::state_idle(),
            yes: defaults::yes(),
            no: defaults::no(),
            help: defaults::help(),
            not_understood: defaults::not_understood(),
        }
    }
}

/// Substitute `{key}` placeholders in a template.
///
/// Only the template is scanned: substituted values are inserted
/// verbatim, even if they contain `{...}` themselves. Unknown
/// placeholders are left as they are.
pub fn render(template: &str, values: &[(&str, &str)]) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            values
                .iter()
                .find(|(key, _)| *key == &caps[1])
                .map_or_else(|| caps[0].to_string(), |(_, value)| value.to_string())
        })
        .into_owned()
}

/// Human-readable rendering of a poll interval, e.g. `10m` or `1h 30m`.
pub fn format_interval(secs: u64) -> String {
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 {
        parts.push(format!("{minutes}m"));
    }
    if seconds > 0 || parts.is_empty() {
        parts.push(format!("{seconds}s"));
    }
    parts.join(" ")
}

mod defaults {
    pub fn new_entry() -> String {
        "New publication found!\n\n{title}\n{link}".into()
    }
    pub fn subscribed() -> String {
        "You are now subscribed to updates.".into()
    }
    pub fn already_subscribed() -> String {
        "You are already subscribed to updates.".into()
    }
    pub fn unsubscribed() -> String {
        "You have been unsubscribed. You will no longer receive updates.".into()
    }
    pub fn not_subscribed() -> String {
        "You were not subscribed.".into()
    }
    pub fn storage_failed() -> String {
        "Your request could not be saved. Please try again later.".into()
    }
    pub fn check_found() -> String {
        "Check complete: {count} new publication(s) found and sent.".into()
    }
    pub fn check_nothing() -> String {
        "Check complete: no new content found.".into()
    }
    pub fn check_failed() -> String {
        "The page could not be checked right now: {error}".into()
    }
    pub fn check_unavailable() -> String {
        "The watcher is shutting down. Please try again later.".into()
    }
    pub fn latest_header() -> String {
        "Latest publication(s):".into()
    }
    pub fn latest_item() -> String {
        "{title}\n{link}".into()
    }
    pub fn no_entries() -> String {
        "No publications have been seen yet.".into()
    }
    pub fn status() -> String {
        "Watcher: {state}\nSubscribed: {subscribed}\nPublications seen: {count}\nCheck interval: {interval}"
            .into()
    }
    pub fn state_running() -> String {
        "checking now".into()
    }
    pub fn state_idle() -> String {
        "idle".into()
    }
    pub fn yes() -> String {
        "yes".into()
    }
    pub fn no() -> String {
        "no".into()
    }
    pub fn help() -> String {
        "Available commands:\n\
         /subscribe - receive a message for every new publication\n\
         /unsubscribe - stop receiving messages\n\
         /check_now - check the page immediately\n\
         /last_entry - show the most recent publication\n\
         /status - show the watcher status\n\
         /help - show this message"
            .into()
    }
    pub fn not_understood() -> String {
        "Sorry, I did not understand that command.".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_replaces_all_occurrences() {
        let text = render("{a}-{b}-{a}", &[("a", "1"), ("b", "2")]);
        assert_eq!(text, "1-2-1");
    }

    #[test]
    fn test_render_does_not_rescan_values() {
        let text = render(
            "Check failed: {error}",
            &[("error", "bad {count} in {error}"), ("count", "3")],
        );
        assert_eq!(text, "Check failed: bad {count} in {error}");
    }

    #[test]
    fn test_render_leaves_unknown_placeholders() {
        assert_eq!(render("{x} {y}", &[("x", "1")]), "1 {y}");
    }

    #[test]
    fn test_format_interval() {
        assert_eq!(format_interval(600), "10m");
        assert_eq!(format_interval(5400), "1h 30m");
        assert_eq!(format_interval(45), "45s");
        assert_eq!(format_interval(3661), "1h 1m 1s");
    }

    #[test]
    fn test_partial_override() {
        let messages: Messages = toml::from_str(r#"help = "custom help""#).unwrap();
        assert_eq!(messages.help, "custom help");
        assert_eq!(messages.subscribed, Messages::default().subscribed);
    }
}
