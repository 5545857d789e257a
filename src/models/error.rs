//! Error types for the adapter.
//!
//! The event adapter itself never fails an invocation: serving failures are
//! turned into a 500 reply. These errors surface only at startup, while
//! loading configuration or building the upstream HTTP client.

use std::fmt;

/// Custom error type for the adapter.
#[derive(Debug)]
pub enum AdapterError {
    /// Invalid or unreadable configuration value
    Config(String),
    /// The upstream HTTP client could not be set up
    Upstream(String),
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
            Self::Upstream(msg) => write!(f, "Upstream error: {msg}"),
        }
    }
}

impl std::error::Error for AdapterError {}

impl From<reqwest::Error> for AdapterError {
    fn from(error: reqwest::Error) -> Self {
        Self::Upstream(error.to_string())
    }
}
