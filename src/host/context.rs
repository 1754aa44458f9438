//! In-process execution context

use super::{
    CredentialData, CredentialStore, ExecuteFunctions, NodeExecutionData, NodeTypeDescription,
};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Credential store backed by a map, for tests and embedding
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    records: HashMap<String, CredentialData>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(mut self, name: impl Into<String>, data: CredentialData) -> Self {
        self.records.insert(name.into(), data);
        self
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, name: &str) -> crate::Result<Option<CredentialData>> {
        Ok(self.records.get(name).cloned())
    }
}

/// Execution context that resolves everything from memory.
///
/// Parameters resolve in order: per-item override, shared value, then the
/// default declared in the node description (respecting display
/// conditions).
pub struct LocalExecuteContext {
    items: Vec<NodeExecutionData>,
    parameters: Map<String, Value>,
    item_parameters: HashMap<usize, Map<String, Value>>,
    description: Option<NodeTypeDescription>,
    credential_selection: HashMap<String, String>,
    store: Arc<dyn CredentialStore>,
}

impl LocalExecuteContext {
    pub fn new(items: Vec<NodeExecutionData>) -> Self {
        Self {
            items,
            parameters: Map::new(),
            item_parameters: HashMap::new(),
            description: None,
            credential_selection: HashMap::new(),
            store: Arc::new(MemoryCredentialStore::default()),
        }
    }

    /// Set a parameter shared by all items
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    /// Override a parameter for a single item
    pub fn with_item_parameter(
        mut self,
        item_index: usize,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.item_parameters
            .entry(item_index)
            .or_default()
            .insert(name.into(), value.into());
        self
    }

    /// Fall back to this description's defaults for unset parameters
    pub fn with_description(mut self, description: NodeTypeDescription) -> Self {
        self.description = Some(description);
        self
    }

    pub fn with_credential_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = store;
        self
    }

    /// Use the stored record `record_name` whenever a node asks for
    /// `credential_type`. Without a selection the record named after the
    /// type is used.
    pub fn select_credential(
        mut self,
        credential_type: impl Into<String>,
        record_name: impl Into<String>,
    ) -> Self {
        self.credential_selection
            .insert(credential_type.into(), record_name.into());
        self
    }

    fn values_for(&self, item_index: usize) -> Map<String, Value> {
        let mut values = self.parameters.clone();
        if let Some(overrides) = self.item_parameters.get(&item_index) {
            values.extend(overrides.clone());
        }
        values
    }
}

#[async_trait]
impl ExecuteFunctions for LocalExecuteContext {
    fn input_data(&self) -> &[NodeExecutionData] {
        &self.items
    }

    fn node_parameter(&self, name: &str, item_index: usize) -> Option<Value> {
        let values = self.values_for(item_index);
        if let Some(value) = values.get(name) {
            return Some(value.clone());
        }
        self.description
            .as_ref()
            .and_then(|d| d.parameter_default(name, &values))
    }

    async fn credentials(&self, credential_type: &str) -> crate::Result<Option<CredentialData>> {
        let record = self
            .credential_selection
            .get(credential_type)
            .map(String::as_str)
            .unwrap_or(credential_type);
        tracing::debug!(credential_type, record, "Loading stored credential");
        self.store.get(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{NodeDefaults, NodeProperty};
    use serde_json::json;

    fn record(host: &str) -> CredentialData {
        let mut data = Map::new();
        data.insert("host".to_string(), json!(host));
        data
    }

    #[test]
    fn test_item_override_wins() {
        let ctx = LocalExecuteContext::new(vec![NodeExecutionData::empty(); 2])
            .with_parameter("projectId", "1")
            .with_item_parameter(1, "projectId", "2");

        assert_eq!(ctx.node_parameter("projectId", 0), Some(json!("1")));
        assert_eq!(ctx.node_parameter("projectId", 1), Some(json!("2")));
        assert_eq!(ctx.node_parameter("ref", 0), None);
    }

    #[test]
    fn test_falls_back_to_description_default() {
        let description = NodeTypeDescription {
            display_name: "T".to_string(),
            name: "t".to_string(),
            group: vec![],
            version: 1,
            subtitle: None,
            description: String::new(),
            defaults: NodeDefaults {
                name: "T".to_string(),
            },
            inputs: vec![],
            outputs: vec![],
            credentials: vec![],
            properties: vec![NodeProperty::boolean("Recursive", "recursive")],
        };
        let ctx = LocalExecuteContext::new(vec![]).with_description(description);
        assert_eq!(ctx.node_parameter("recursive", 0), Some(json!(false)));
    }

    #[tokio::test]
    async fn test_credential_selection() {
        let store = MemoryCredentialStore::new()
            .with_record("gitlabApi", record("https://gitlab.com"))
            .with_record("work", record("https://gitlab.work.example"));

        let ctx = LocalExecuteContext::new(vec![]).with_credential_store(Arc::new(store.clone()));
        let data = ctx.credentials("gitlabApi").await.unwrap().unwrap();
        assert_eq!(data["host"], "https://gitlab.com");

        let ctx = LocalExecuteContext::new(vec![])
            .with_credential_store(Arc::new(store))
            .select_credential("gitlabApi", "work");
        let data = ctx.credentials("gitlabApi").await.unwrap().unwrap();
        assert_eq!(data["host"], "https://gitlab.work.example");

        let ctx = LocalExecuteContext::new(vec![]);
        assert!(ctx.credentials("gitlabApi").await.unwrap().is_none());
    }
}
