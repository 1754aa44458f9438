//! The host's standard API error

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Category of a node failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    /// The node is missing settings it needs before it can call out
    Configuration,
    /// The requested operation failed or does not exist
    Operation,
}

/// Error reported to the workflow host when a node execution fails.
///
/// Carries a human-readable message plus optional detail and the upstream
/// HTTP status when one was involved.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message}")]
#[serde(rename_all = "camelCase")]
pub struct NodeApiError {
    pub kind: ApiErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_code: Option<u16>,
}

impl NodeApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            description: None,
            http_code: None,
        }
    }

    /// Missing or unusable node configuration
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Configuration, message)
    }

    /// Failure while performing an operation
    pub fn operation(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Operation, message)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_http_code(mut self, code: u16) -> Self {
        self.http_code = Some(code);
        self
    }

    pub fn is_configuration(&self) -> bool {
        self.kind == ApiErrorKind::Configuration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_message() {
        let err = NodeApiError::operation("Not Found").with_description("404 File Not Found");
        assert_eq!(err.to_string(), "Not Found");
        assert_eq!(err.description.as_deref(), Some("404 File Not Found"));
    }

    #[test]
    fn test_serialization_skips_empty_fields() {
        let err = NodeApiError::configuration("missing host");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "configuration");
        assert_eq!(json["message"], "missing host");
        assert!(json.get("description").is_none());
        assert!(json.get("httpCode").is_none());

        let json = serde_json::to_value(err.with_http_code(401)).unwrap();
        assert_eq!(json["httpCode"], 401);
    }
}
