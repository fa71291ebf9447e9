// src/error.rs

//! Unified error handling for the watcher.

use std::fmt;

use thiserror::Error;

/// Result type alias for watcher operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed before a response was received
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// The watched page could not be retrieved
    #[error("Fetch failed ({}): {message}", .status.map_or_else(|| "no status".to_string(), |s| s.to_string()))]
    Fetch {
        status: Option<u16>,
        message: String,
    },

    /// A message could not be delivered to one subscriber
    #[error("Delivery to {subscriber} failed: {message}")]
    Delivery { subscriber: String, message: String },

    /// The messaging transport rejected a request
    #[error("Transport error: {0}")]
    Transport(String),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a fetch error for a non-success HTTP status.
    pub fn fetch_status(status: u16, message: impl fmt::Display) -> Self {
        Self::Fetch {
            status: Some(status),
            message: message.to_string(),
        }
    }

    /// Create a fetch error for a transport failure (no status received).
    pub fn fetch_transport(message: impl fmt::Display) -> Self {
        Self::Fetch {
            status: None,
            message: message.to_string(),
        }
    }

    /// Create a delivery error for a single subscriber.
    pub fn delivery(subscriber: impl fmt::Display, message: impl fmt::Display) -> Self {
        Self::Delivery {
            subscriber: subscriber.to_string(),
            message: message.to_string(),
        }
    }

    /// Create a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_status_display() {
        let err = AppError::fetch_status(503, "Service Unavailable");
        assert_eq!(err.to_string(), "Fetch failed (503): Service Unavailable");
    }

    #[test]
    fn test_fetch_transport_display() {
        let err = AppError::fetch_transport("connection refused");
        assert_eq!(err.to_string(), "Fetch failed (no status): connection refused");
    }
}
