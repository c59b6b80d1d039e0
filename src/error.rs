//! Error types
//!
//! None of these ever reach the host page: DOM errors skip one element,
//! config and message errors are logged and the input ignored.

use thiserror::Error;

/// Reading an element's resolved style failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    #[error("element is no longer attached to the document")]
    Detached,
    #[error("computed style unavailable: {0}")]
    StyleUnavailable(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read schedule file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid schedule: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid schedule: {0}")]
    Invalid(&'static str),
}

/// A runtime message that is not a toggle command
#[derive(Debug, Error)]
pub enum MessageError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
}
