//! Workflow host contract
//!
//! The host engine loads node types, renders their [`NodeTypeDescription`]
//! as a configuration form, and calls [`NodeType::execute`] once per run
//! with an [`ExecuteFunctions`] context that resolves input items,
//! parameters and stored credentials.
//!
//! [`LocalExecuteContext`] is an in-process implementation used by the CLI
//! runner and tests.

mod context;
mod description;
mod error;

pub use context::{LocalExecuteContext, MemoryCredentialStore};
pub use description::{
    CredentialTypeDescription, DisplayOptions, NodeCredentialDescription, NodeDefaults,
    NodeProperty, NodeTypeDescription, PropertyOption, PropertyType, TypeOptions,
};
pub use error::{ApiErrorKind, NodeApiError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Decrypted fields of a stored credential record
pub type CredentialData = Map<String, Value>;

/// One item flowing between nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeExecutionData {
    pub json: Value,
}

impl NodeExecutionData {
    pub fn new(json: Value) -> Self {
        Self { json }
    }

    /// An item with an empty JSON object
    pub fn empty() -> Self {
        Self {
            json: Value::Object(Map::new()),
        }
    }
}

/// Node output: one item list per output channel
pub type NodeOutput = Vec<Vec<NodeExecutionData>>;

/// Wrap raw JSON results as output items, one item per result.
///
/// Array results stay whole as the item's JSON, so the item count always
/// matches the result count.
pub fn return_json_array(results: Vec<Value>) -> Vec<NodeExecutionData> {
    results.into_iter().map(NodeExecutionData::new).collect()
}

/// Read access to stored credential records, keyed by record name
pub trait CredentialStore: Send + Sync {
    fn get(&self, name: &str) -> crate::Result<Option<CredentialData>>;
}

/// Services the host offers a node while it executes
#[async_trait]
pub trait ExecuteFunctions: Send + Sync {
    /// Input items for this run
    fn input_data(&self) -> &[NodeExecutionData];

    /// Resolved value of a node parameter for one item; `None` when the
    /// parameter is neither set nor declared with a default
    fn node_parameter(&self, name: &str, item_index: usize) -> Option<Value>;

    /// Credential record selected for `credential_type`, if any
    async fn credentials(&self, credential_type: &str) -> crate::Result<Option<CredentialData>>;
}

/// A node type loadable by the host
#[async_trait]
pub trait NodeType: Send + Sync {
    fn description(&self) -> NodeTypeDescription;

    async fn execute(&self, ctx: &dyn ExecuteFunctions) -> Result<NodeOutput, NodeApiError>;
}
