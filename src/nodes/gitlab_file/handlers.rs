//! Operation name -> GitLab call table

use futures::future::{BoxFuture, FutureExt};
use gitlab_api::{RepositoryApi, TreeOptions};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

pub const GET_TREE: &str = "getTree";
pub const GET_FILE: &str = "getFile";

/// Request body built from one input item's parameters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationRequest {
    pub project_id: String,
    pub file_path: String,
    #[serde(rename = "ref")]
    pub git_ref: String,
    #[serde(default)]
    pub recursive: bool,
}

/// Handler invoked with a fresh client handle and the request body
pub type ApiHandler =
    for<'a> fn(&'a dyn RepositoryApi, &'a OperationRequest) -> BoxFuture<'a, anyhow::Result<Value>>;

pub type HandlerTable = HashMap<&'static str, ApiHandler>;

fn get_tree<'a>(
    gitlab: &'a dyn RepositoryApi,
    body: &'a OperationRequest,
) -> BoxFuture<'a, anyhow::Result<Value>> {
    async move {
        let options = TreeOptions::new(body.file_path.as_str(), body.git_ref.as_str())
            .recursive(body.recursive);
        Ok(gitlab.repository_tree(&body.project_id, &options).await?)
    }
    .boxed()
}

fn get_file<'a>(
    gitlab: &'a dyn RepositoryApi,
    body: &'a OperationRequest,
) -> BoxFuture<'a, anyhow::Result<Value>> {
    async move {
        Ok(gitlab
            .repository_file(&body.project_id, &body.file_path, &body.git_ref)
            .await?)
    }
    .boxed()
}

/// Handlers for every supported operation
pub fn api_handlers() -> HandlerTable {
    let mut handlers: HandlerTable = HashMap::new();
    handlers.insert(GET_TREE, get_tree as ApiHandler);
    handlers.insert(GET_FILE, get_file as ApiHandler);
    handlers
}
