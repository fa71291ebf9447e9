//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use scraper::Selector;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::Messages;

/// Environment variable overriding `telegram.token`.
pub const TOKEN_ENV: &str = "TELEGRAM_TOKEN";

/// Upper bound for `telegram.long_poll_secs`.
const MAX_LONG_POLL_SECS: u64 = 900;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Target page and polling behavior
    #[serde(default)]
    pub watcher: WatcherConfig,

    /// State file locations
    #[serde(default)]
    pub storage: StorageConfig,

    /// Messaging transport settings
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// User-facing message templates
    #[serde(default)]
    pub messages: Messages,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            if !token.trim().is_empty() {
                self.telegram.token = Some(token.trim().to_string());
            }
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.watcher.user_agent.trim().is_empty() {
            return Err(AppError::validation("watcher.user_agent is empty"));
        }
        if self.watcher.timeout_secs == 0 {
            return Err(AppError::validation("watcher.timeout_secs must be > 0"));
        }
        if self.watcher.poll_interval_secs == 0 {
            return Err(AppError::validation(
                "watcher.poll_interval_secs must be > 0",
            ));
        }
        self.watcher.page_url()?;
        Selector::parse(&self.watcher.selector)
            .map_err(|e| AppError::selector(&self.watcher.selector, format!("{e:?}")))?;
        Selector::parse(&self.watcher.link_selector)
            .map_err(|e| AppError::selector(&self.watcher.link_selector, format!("{e:?}")))?;
        if self.storage.seen_file.as_os_str().is_empty()
            || self.storage.subscribers_file.as_os_str().is_empty()
        {
            return Err(AppError::validation("storage file names must not be empty"));
        }
        if self.storage.seen_file == self.storage.subscribers_file {
            return Err(AppError::validation(
                "storage.seen_file and storage.subscribers_file must differ",
            ));
        }
        if self.telegram.max_concurrent_sends == 0 {
            return Err(AppError::validation(
                "telegram.max_concurrent_sends must be > 0",
            ));
        }
        if self.telegram.long_poll_secs > MAX_LONG_POLL_SECS {
            return Err(AppError::validation(format!(
                "telegram.long_poll_secs must be <= {MAX_LONG_POLL_SECS}"
            )));
        }
        Url::parse(&self.telegram.api_base)?;
        Ok(())
    }
}

/// Target page and polling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Page to watch
    #[serde(default = "defaults::url")]
    pub url: String,

    /// CSS selector matching one fragment per entry
    #[serde(default = "defaults::selector")]
    pub selector: String,

    /// CSS selector for the link inside a fragment
    #[serde(default = "defaults::link_selector")]
    pub link_selector: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Seconds between two scheduled cycles
    #[serde(default = "defaults::poll_interval")]
    pub poll_interval_secs: u64,
}

impl WatcherConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn page_url(&self) -> Result<Url> {
        Ok(Url::parse(&self.url)?)
    }
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            url: defaults::url(),
            selector: defaults::selector(),
            link_selector: defaults::link_selector(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            poll_interval_secs: defaults::poll_interval(),
        }
    }
}

/// State file names, relative to the storage directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "defaults::seen_file")]
    pub seen_file: PathBuf,

    #[serde(default = "defaults::subscribers_file")]
    pub subscribers_file: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            seen_file: defaults::seen_file(),
            subscribers_file: defaults::subscribers_file(),
        }
    }
}

/// Telegram Bot API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token; the command loop and delivery are disabled without it
    #[serde(default)]
    pub token: Option<String>,

    #[serde(default = "defaults::api_base")]
    pub api_base: String,

    /// Long-poll timeout for `getUpdates`
    #[serde(default = "defaults::long_poll")]
    pub long_poll_secs: u64,

    /// Maximum in-flight `sendMessage` requests during fan-out
    #[serde(default = "defaults::max_concurrent_sends")]
    pub max_concurrent_sends: usize,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_base: defaults::api_base(),
            long_poll_secs: defaults::long_poll(),
            max_concurrent_sends: defaults::max_concurrent_sends(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Watcher defaults
    pub fn url() -> String {
        "https://www.registresolicitants.cat/registre/index.jsp".into()
    }
    pub fn selector() -> String {
        "div.some_class".into()
    }
    pub fn link_selector() -> String {
        "a".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) \
         Chrome/124.0 Safari/537.36"
            .into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn poll_interval() -> u64 {
        600
    }

    // Storage defaults
    pub fn seen_file() -> PathBuf {
        PathBuf::from("seen_content.json")
    }
    pub fn subscribers_file() -> PathBuf {
        PathBuf::from("users.json")
    }

    // Telegram defaults
    pub fn api_base() -> String {
        "https://api.telegram.org".into()
    }
    pub fn long_poll() -> u64 {
        30
    }
    pub fn max_concurrent_sends() -> usize {
        8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.watcher.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_poll_interval() {
        let mut config = Config::default();
        config.watcher.poll_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_selector() {
        let mut config = Config::default();
        config.watcher.selector = "[[invalid".to_string();
        assert!(matches!(config.validate(), Err(AppError::Selector { .. })));
    }

    #[test]
    fn validate_rejects_bad_url() {
        let mut config = Config::default();
        config.watcher.url = "not a url".to_string();
        assert!(matches!(config.validate(), Err(AppError::Url(_))));
    }

    #[test]
    fn validate_rejects_shared_state_file() {
        let mut config = Config::default();
        config.storage.subscribers_file = config.storage.seen_file.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_huge_long_poll() {
        let mut config = Config::default();
        config.telegram.long_poll_secs = u64::MAX;
        assert!(matches!(config.validate(), Err(AppError::Validation(_))));

        config.telegram.long_poll_secs = 900;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [watcher]
            url = "https://example.com/news"
            poll_interval_secs = 120
            "#,
        )
        .unwrap();
        assert_eq!(config.watcher.url, "https://example.com/news");
        assert_eq!(config.watcher.poll_interval(), Duration::from_secs(120));
        assert_eq!(config.watcher.selector, "div.some_class");
        assert_eq!(config.storage.seen_file, PathBuf::from("seen_content.json"));
        assert!(config.telegram.token.is_none());
    }

    #[test]
    fn load_or_default_on_missing_file() {
        let config = Config::load_or_default("/definitely/not/here/config.toml");
        assert_eq!(config.watcher.poll_interval_secs, 600);
    }
}
