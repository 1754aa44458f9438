//! Error types for the GitLab file node
//!
//! `Error` covers the ambient failure modes (settings, credential store, I/O,
//! serialization). Failures surfaced to the workflow host during execution
//! use [`NodeApiError`](crate::host::NodeApiError) instead.

use crate::host::NodeApiError;
use thiserror::Error;

/// Result type alias for crate operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for settings, credential storage and the CLI runner
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Credential store errors
    #[error("Credential error: {0}")]
    Credential(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Node execution failures
    #[error(transparent)]
    Node(#[from] NodeApiError),

    /// Other errors
    #[error("{0}")]
    Other(String),
}
