//! Shared utilities for market-newsletter
//!
//! This crate provides common functionality used across the workspace:
//! tracing setup and loading API credentials from a secrets file and the
//! environment.

pub mod config;
pub mod logging;

pub use config::{ConfigError, Secrets};
pub use logging::{LogOptions, init_tracing};
