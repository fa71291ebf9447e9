// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use crate::error::Result;
use crate::models::WatcherConfig;

/// Create a configured asynchronous HTTP client for page fetches.
pub fn create_async_client(config: &WatcherConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(config.timeout())
        .build()?;
    Ok(client)
}

/// Create a client for long-polling APIs.
///
/// The request timeout must outlast the server-side long-poll wait.
pub fn create_long_poll_client(long_poll_secs: u64) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(long_poll_secs.saturating_add(15)))
        .build()?;
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_long_poll_client_with_extreme_timeout() {
        assert!(create_long_poll_client(u64::MAX).is_ok());
        assert!(create_long_poll_client(30).is_ok());
    }
}
