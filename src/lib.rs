// src/lib.rs

//! Pagewatch Library
//!
//! Watches a single web page for new publications and notifies
//! subscribers through a chat transport.

pub mod bot;
pub mod commands;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
