//! GitLab File node
//!
//! Reads repository trees and file contents from GitLab. Each input item
//! produces one API call; results are returned in input order on the single
//! `main` output.

pub mod handlers;
pub mod request;

pub use handlers::{api_handlers, ApiHandler, HandlerTable, OperationRequest, GET_FILE, GET_TREE};
pub use request::{gitlab_client_factory, normalize_error, ClientFactory, GitLabRequest};

use crate::config::NodeSettings;
use crate::credentials::{resolve_credentials, GITLAB_API_CREDENTIAL};
use crate::host::{
    return_json_array, ExecuteFunctions, NodeApiError, NodeCredentialDescription, NodeDefaults,
    NodeOutput, NodeProperty, NodeType, NodeTypeDescription, PropertyOption,
};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

/// Node type name registered with the host
pub const NODE_NAME: &str = "gitLabFile";

/// The GitLab File node
pub struct GitLabFile {
    handlers: HandlerTable,
    connect: ClientFactory,
}

impl Default for GitLabFile {
    fn default() -> Self {
        Self::new(&NodeSettings::default())
    }
}

impl GitLabFile {
    /// Node backed by real GitLab handles built from `settings`
    pub fn new(settings: &NodeSettings) -> Self {
        Self::with_client_factory(gitlab_client_factory(settings))
    }

    /// Node that obtains client handles from `connect`
    pub fn with_client_factory(connect: ClientFactory) -> Self {
        Self {
            handlers: api_handlers(),
            connect,
        }
    }

    /// Run every input item and return one raw API response per item.
    ///
    /// Credentials are resolved once, from the first item's parameters,
    /// before any call is made. The first failing item aborts the run.
    pub async fn run_items(&self, ctx: &dyn ExecuteFunctions) -> Result<Vec<Value>, NodeApiError> {
        let item_count = ctx.input_data().len();
        if item_count == 0 {
            debug!("No input items");
            return Ok(Vec::new());
        }

        let host = string_parameter(ctx, "host", 0)?;
        let access_token = string_parameter(ctx, "accessToken", 0)?;
        let credentials = resolve_credentials(ctx, &host, &access_token).await?;
        let request = GitLabRequest::new(credentials, &self.handlers, &self.connect);

        let mut results = Vec::with_capacity(item_count);
        for index in 0..item_count {
            let operation = string_parameter(ctx, "operation", index)?;
            let body = OperationRequest {
                project_id: string_parameter(ctx, "projectId", index)?,
                file_path: string_parameter(ctx, "filePath", index)?,
                git_ref: string_parameter(ctx, "ref", index)?,
                recursive: operation == GET_TREE && bool_parameter(ctx, "recursive", index)?,
            };

            debug!(item = index, operation = %operation, project_id = %body.project_id, "Processing item");
            results.push(request.call(&operation, &body).await?);
        }

        info!(
            items = item_count,
            host = %request.credentials().host,
            "GitLab File execution complete"
        );
        Ok(results)
    }
}

#[async_trait]
impl NodeType for GitLabFile {
    fn description(&self) -> NodeTypeDescription {
        node_description()
    }

    async fn execute(&self, ctx: &dyn ExecuteFunctions) -> Result<NodeOutput, NodeApiError> {
        let results = self.run_items(ctx).await?;
        Ok(vec![return_json_array(results)])
    }
}

fn invalid_type(name: &str) -> NodeApiError {
    NodeApiError::operation(format!("Parameter \"{}\" has an invalid type", name))
}

/// String parameter with `""` as default; numbers are accepted as text
fn string_parameter(
    ctx: &dyn ExecuteFunctions,
    name: &str,
    item_index: usize,
) -> Result<String, NodeApiError> {
    match ctx.node_parameter(name, item_index) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(_) => Err(invalid_type(name)),
    }
}

/// Boolean parameter with `false` as default
fn bool_parameter(
    ctx: &dyn ExecuteFunctions,
    name: &str,
    item_index: usize,
) -> Result<bool, NodeApiError> {
    match ctx.node_parameter(name, item_index) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(b),
        Some(Value::String(s)) => match s.trim() {
            "" | "false" => Ok(false),
            "true" => Ok(true),
            _ => Err(invalid_type(name)),
        },
        Some(_) => Err(invalid_type(name)),
    }
}

/// Configuration form of the node
pub fn node_description() -> NodeTypeDescription {
    NodeTypeDescription {
        display_name: "GitLab File".to_string(),
        name: NODE_NAME.to_string(),
        group: vec!["apps".to_string()],
        version: 1,
        subtitle: Some("={{$parameter[\"operation\"]}}".to_string()),
        description: "Interact with GitLab repository files".to_string(),
        defaults: NodeDefaults {
            name: "GitLab File".to_string(),
        },
        inputs: vec!["main".to_string()],
        outputs: vec!["main".to_string()],
        credentials: vec![NodeCredentialDescription {
            name: GITLAB_API_CREDENTIAL.to_string(),
            required: false,
        }],
        properties: vec![
            NodeProperty::string("Host", "host")
                .with_placeholder("https://gitlab.com")
                .with_description("GitLab instance host. Required if not using a credential."),
            NodeProperty::string("Access Token", "accessToken")
                .password()
                .with_description("GitLab access token. Required if not using a credential."),
            NodeProperty::options(
                "Operation",
                "operation",
                vec![
                    PropertyOption::new("Get Tree", GET_TREE).with_action("Get a repository tree"),
                    PropertyOption::new("Get File", GET_FILE).with_action("Get a file"),
                ],
            )
            .no_data_expression(),
            NodeProperty::string("Project ID", "projectId")
                .required()
                .with_description("The ID or URL-encoded path of the project")
                .show_when("operation", &[GET_TREE, GET_FILE]),
            NodeProperty::string("Path", "filePath")
                .with_description(
                    "The path inside repository. Used to get content of subdirectories",
                )
                .show_when("operation", &[GET_TREE]),
            NodeProperty::string("Path", "filePath")
                .required()
                .with_description("The path of the file to retrieve")
                .show_when("operation", &[GET_FILE]),
            NodeProperty::string("Ref", "ref")
                .with_description(
                    "The name of a repository branch or tag or if not given the default branch",
                )
                .show_when("operation", &[GET_TREE, GET_FILE]),
            NodeProperty::boolean("Recursive", "recursive")
                .with_description("Whether to list subdirectories recursively")
                .show_when("operation", &[GET_TREE]),
        ],
    }
}
