//! Settings and credential validation
//!
//! Checks runner settings and credential records before they are saved or
//! used:
//! - Timeouts are positive and bounded
//! - The User-Agent is a valid header value
//! - Credential hosts parse as http(s) URLs and tokens are non-empty

use super::node_settings::NodeSettings;
use crate::credentials::GitLabCredentials;
use crate::Error;

/// Longest per-request timeout accepted, in seconds
const MAX_TIMEOUT_SECS: u64 = 600;

/// Validation error details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub record: Option<String>,
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            record: None,
            field: field.into(),
            message: message.into(),
        }
    }

    fn with_record(mut self, record: impl Into<String>) -> Self {
        self.record = Some(record.into());
        self
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref record) = self.record {
            write!(f, "[{}] {}: {}", record, self.field, self.message)
        } else {
            write!(f, "{}: {}", self.field, self.message)
        }
    }
}

/// Validation result
pub type ValidationResult = std::result::Result<(), Vec<ValidationError>>;

fn finish(errors: Vec<ValidationError>) -> ValidationResult {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn summarize(what: &str, errors: &[ValidationError]) -> String {
    let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    format!("{} validation failed:\n  - {}", what, messages.join("\n  - "))
}

/// Validate runner settings
pub fn validate_settings(settings: &NodeSettings) -> ValidationResult {
    let mut errors = Vec::new();

    if settings.request_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "request_timeout_secs",
            "Timeout must be greater than 0",
        ));
    } else if settings.request_timeout_secs > MAX_TIMEOUT_SECS {
        errors.push(ValidationError::new(
            "request_timeout_secs",
            format!("Timeout must be at most {} seconds", MAX_TIMEOUT_SECS),
        ));
    }

    let user_agent = settings.user_agent.trim();
    if user_agent.is_empty() {
        errors.push(ValidationError::new("user_agent", "User-Agent cannot be empty"));
    } else if !user_agent.chars().all(|c| c == ' ' || c.is_ascii_graphic()) {
        errors.push(ValidationError::new(
            "user_agent",
            "User-Agent must contain printable ASCII only",
        ));
    }

    finish(errors)
}

/// Validate settings and return a crate Result
pub fn validate_settings_result(settings: &NodeSettings) -> crate::Result<()> {
    validate_settings(settings).map_err(|errors| Error::Config(summarize("Configuration", &errors)))
}

/// Validate a credential record before it is stored
pub fn validate_credentials(name: &str, credentials: &GitLabCredentials) -> crate::Result<()> {
    let mut errors = Vec::new();

    if name.trim().is_empty() {
        errors.push(ValidationError::new("name", "Credential name cannot be empty"));
    }

    if let Err(e) = gitlab_api::normalize_host(&credentials.host) {
        errors.push(ValidationError::new("host", e.to_string()).with_record(name));
    }

    if credentials.access_token.trim().is_empty() {
        errors.push(
            ValidationError::new("accessToken", "Access token cannot be empty").with_record(name),
        );
    }

    finish(errors).map_err(|errors| Error::Credential(summarize("Credential", &errors)))
}
