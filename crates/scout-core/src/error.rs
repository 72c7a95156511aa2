//! Error types for the search-grounded chat core.

use std::time::Duration;

/// Message shown to the user for any failed exchange. Causes stay in the logs.
pub const USER_FACING_ERROR: &str = "Sorry, something went wrong. Please try again.";

/// Errors from decoding a streamed completion body.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("stream transport failed: {0}")]
    Transport(String),
    #[error("malformed stream framing: {0}")]
    Malformed(String),
    #[error("stream ended before the end marker")]
    UnexpectedEof,
    #[error("stream stalled: no data received for {0:?}")]
    Stalled(Duration),
}

/// Ways a single search -> completion exchange can fail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExchangeError {
    #[error("search failed: {0}")]
    Search(String),
    #[error("completion request failed: {0}")]
    CompletionStart(String),
    #[error(transparent)]
    Stream(#[from] DecodeError),
}

/// Errors from loading or saving configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not determine config directory")]
    NoConfigDir,
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}
