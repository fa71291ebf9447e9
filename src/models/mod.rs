// src/models/mod.rs

//! Domain models for the watcher.

mod config;
mod entry;
mod messages;
mod subscriber;

// Re-export all public types
pub use config::{Config, StorageConfig, TOKEN_ENV, TelegramConfig, WatcherConfig};
pub use entry::{Entry, LatestEntry};
pub use messages::{Messages, format_interval, render};
pub use subscriber::SubscriberId;
