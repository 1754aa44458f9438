//! Request dispatcher
//!
//! Holds the credentials resolved for an execution, builds a fresh client
//! handle for every call, runs the matching handler, and normalizes any
//! failure into a [`NodeApiError`].

use super::handlers::{HandlerTable, OperationRequest};
use crate::config::NodeSettings;
use crate::credentials::GitLabCredentials;
use crate::host::NodeApiError;
use gitlab_api::{Gitlab, RepositoryApi};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Builds a client handle from credentials
pub type ClientFactory =
    Arc<dyn Fn(&GitLabCredentials) -> anyhow::Result<Box<dyn RepositoryApi>> + Send + Sync>;

/// Factory producing network-backed [`Gitlab`] handles
pub fn gitlab_client_factory(settings: &NodeSettings) -> ClientFactory {
    let timeout = Duration::from_secs(settings.request_timeout_secs);
    let user_agent = settings.user_agent.clone();
    Arc::new(
        move |credentials: &GitLabCredentials| -> anyhow::Result<Box<dyn RepositoryApi>> {
            let gitlab = Gitlab::builder(&credentials.host, credentials.access_token.clone())
                .timeout(timeout)
                .user_agent(user_agent.clone())
                .build()?;
            Ok(Box::new(gitlab))
        },
    )
}

/// Turn any handler failure into the host error type.
///
/// A [`NodeApiError`] passes through untouched. GitLab status errors keep
/// their HTTP code and the message GitLab sent back.
pub fn normalize_error(err: anyhow::Error) -> NodeApiError {
    let err = match err.downcast::<NodeApiError>() {
        Ok(api_error) => return api_error,
        Err(err) => err,
    };

    match err.downcast_ref::<gitlab_api::Error>() {
        Some(gitlab_error) => {
            let mut api_error = NodeApiError::operation(gitlab_error.to_string());
            if let Some(message) = gitlab_error.api_message() {
                api_error = api_error.with_description(message);
            }
            if let Some(code) = gitlab_error.status() {
                api_error = api_error.with_http_code(code);
            }
            api_error
        }
        None => NodeApiError::operation(format!("{:#}", err)),
    }
}

/// Dispatches operations for one execution
pub struct GitLabRequest<'a> {
    credentials: GitLabCredentials,
    handlers: &'a HandlerTable,
    connect: &'a ClientFactory,
}

impl<'a> GitLabRequest<'a> {
    pub fn new(
        credentials: GitLabCredentials,
        handlers: &'a HandlerTable,
        connect: &'a ClientFactory,
    ) -> Self {
        Self {
            credentials,
            handlers,
            connect,
        }
    }

    pub fn credentials(&self) -> &GitLabCredentials {
        &self.credentials
    }

    /// Run `operation` and return the raw API response
    pub async fn call(&self, operation: &str, body: &OperationRequest) -> Result<Value, NodeApiError> {
        let handler = self.handlers.get(operation).ok_or_else(|| {
            NodeApiError::operation(format!("Operation not supported: \"{}\"", operation))
        })?;

        let gitlab = (self.connect)(&self.credentials).map_err(normalize_error)?;

        debug!(
            operation,
            project_id = %body.project_id,
            file_path = %body.file_path,
            git_ref = %body.git_ref,
            "Calling GitLab"
        );

        handler(&*gitlab, body).await.map_err(|err| {
            let api_error = normalize_error(err);
            warn!(operation, error = %api_error, "GitLab call failed");
            api_error
        })
    }
}
