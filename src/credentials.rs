//! GitLab API credentials
//!
//! Resolution order: explicit `host`/`accessToken` node parameters, then the
//! stored `gitlabApi` credential record.

use crate::host::{
    CredentialData, CredentialTypeDescription, ExecuteFunctions, NodeApiError, NodeProperty,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Credential type name the node asks the host for
pub const GITLAB_API_CREDENTIAL: &str = "gitlabApi";

/// Message of the configuration error raised when no usable pair is found
pub const MISSING_CREDENTIALS: &str = "must select a credential or provide host and token";

/// Host + access token pair used to build a client handle
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitLabCredentials {
    pub host: String,
    pub access_token: String,
}

impl std::fmt::Debug for GitLabCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitLabCredentials")
            .field("host", &self.host)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

impl GitLabCredentials {
    pub fn new(host: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            access_token: access_token.into(),
        }
    }

    /// Both fields are present and non-blank
    pub fn is_usable(&self) -> bool {
        !self.host.trim().is_empty() && !self.access_token.trim().is_empty()
    }

    /// Read a stored record, ignoring fields that are not strings
    pub fn from_record(record: &CredentialData) -> Self {
        let field = |name: &str| {
            record
                .get(name)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .trim()
                .to_string()
        };
        Self::new(field("host"), field("accessToken"))
    }

    pub fn to_record(&self) -> CredentialData {
        let mut record = CredentialData::new();
        record.insert("host".to_string(), Value::from(self.host.clone()));
        record.insert(
            "accessToken".to_string(),
            Value::from(self.access_token.clone()),
        );
        record
    }

    /// Token with all but the last four characters hidden
    pub fn masked_token(&self) -> String {
        let chars: Vec<char> = self.access_token.chars().collect();
        if chars.len() <= 4 {
            return "*".repeat(chars.len());
        }
        let visible: String = chars[chars.len() - 4..].iter().collect();
        format!("{}{}", "*".repeat(chars.len() - 4), visible)
    }
}

/// Form shown by the host when the user creates a `gitlabApi` credential
pub fn credential_type_description() -> CredentialTypeDescription {
    CredentialTypeDescription {
        name: GITLAB_API_CREDENTIAL.to_string(),
        display_name: "GitLab API".to_string(),
        properties: vec![
            NodeProperty::string("Host", "host")
                .with_default("https://gitlab.com")
                .with_placeholder("https://gitlab.com"),
            NodeProperty::string("Access Token", "accessToken").password(),
        ],
    }
}

/// Pick the credentials for an execution.
///
/// `host` and `access_token` are the node parameters; both must be
/// non-blank to take precedence over the stored credential.
pub async fn resolve_credentials(
    ctx: &dyn ExecuteFunctions,
    host: &str,
    access_token: &str,
) -> Result<GitLabCredentials, NodeApiError> {
    let explicit = GitLabCredentials::new(host.trim(), access_token.trim());
    if explicit.is_usable() {
        debug!(host = %explicit.host, "Using credentials from node parameters");
        return Ok(explicit);
    }

    let record = ctx
        .credentials(GITLAB_API_CREDENTIAL)
        .await
        .map_err(|e| NodeApiError::configuration(MISSING_CREDENTIALS).with_description(e.to_string()))?;

    match record.map(|r| GitLabCredentials::from_record(&r)) {
        Some(stored) if stored.is_usable() => {
            debug!(host = %stored.host, "Using stored gitlabApi credential");
            Ok(stored)
        }
        _ => Err(NodeApiError::configuration(MISSING_CREDENTIALS)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{CredentialStore, LocalExecuteContext, MemoryCredentialStore};
    use std::sync::Arc;

    struct BrokenStore;

    impl CredentialStore for BrokenStore {
        fn get(&self, _name: &str) -> crate::Result<Option<CredentialData>> {
            Err(crate::Error::Credential("store unreadable".to_string()))
        }
    }

    fn stored(host: &str, token: &str) -> LocalExecuteContext {
        let store = MemoryCredentialStore::new().with_record(
            GITLAB_API_CREDENTIAL,
            GitLabCredentials::new(host, token).to_record(),
        );
        LocalExecuteContext::new(vec![]).with_credential_store(Arc::new(store))
    }

    #[tokio::test]
    async fn test_parameters_take_precedence() {
        let ctx = stored("https://stored.example", "stored-token");
        let creds = resolve_credentials(&ctx, " https://param.example ", "param-token")
            .await
            .unwrap();
        assert_eq!(creds.host, "https://param.example");
        assert_eq!(creds.access_token, "param-token");
    }

    #[tokio::test]
    async fn test_partial_parameters_fall_back_to_store() {
        let ctx = stored("https://stored.example", "stored-token");
        let creds = resolve_credentials(&ctx, "https://param.example", "")
            .await
            .unwrap();
        assert_eq!(creds.host, "https://stored.example");
        assert_eq!(creds.access_token, "stored-token");
    }

    #[tokio::test]
    async fn test_missing_everything() {
        let ctx = LocalExecuteContext::new(vec![]);
        let err = resolve_credentials(&ctx, "", "").await.unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(err.message, MISSING_CREDENTIALS);
    }

    #[tokio::test]
    async fn test_incomplete_stored_record() {
        let ctx = stored("https://stored.example", "   ");
        let err = resolve_credentials(&ctx, "", "").await.unwrap_err();
        assert_eq!(err.message, MISSING_CREDENTIALS);
    }

    #[tokio::test]
    async fn test_store_failure_is_configuration_error() {
        let ctx = LocalExecuteContext::new(vec![]).with_credential_store(Arc::new(BrokenStore));
        let err = resolve_credentials(&ctx, "", "").await.unwrap_err();
        assert!(err.is_configuration());
        assert!(err.description.unwrap().contains("store unreadable"));
    }

    #[test]
    fn test_record_round_trip_ignores_non_strings() {
        let mut record = GitLabCredentials::new("https://gitlab.com", "tok").to_record();
        assert_eq!(GitLabCredentials::from_record(&record).access_token, "tok");

        record.insert("accessToken".to_string(), Value::from(42));
        assert!(!GitLabCredentials::from_record(&record).is_usable());
    }

    #[test]
    fn test_masked_token_and_debug() {
        let creds = GitLabCredentials::new("https://gitlab.com", "glpat-abcdef1234");
        assert_eq!(creds.masked_token(), "************1234");
        assert_eq!(GitLabCredentials::new("h", "abc").masked_token(), "***");
        assert!(!format!("{:?}", creds).contains("abcdef"));
    }

    #[test]
    fn test_credential_type_description() {
        let description = credential_type_description();
        assert_eq!(description.name, "gitlabApi");
        let names: Vec<&str> = description.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["host", "accessToken"]);
        assert!(description.properties[1].type_options.as_ref().unwrap().password);
    }
}
