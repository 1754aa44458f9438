//! Node type descriptions consumed by the host's configuration UI
//!
//! These types serialize to the camelCase JSON shape the host expects:
//! a node declares its display metadata, its input/output channels, the
//! credential types it can use, and the list of parameters it shows.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Widget type of a node parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyType {
    String,
    Boolean,
    Number,
    Options,
}

/// One selectable value of an `options` parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyOption {
    pub name: String,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PropertyOption {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            action: None,
            description: None,
        }
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeOptions {
    #[serde(default)]
    pub password: bool,
}

/// Conditions under which a parameter is shown.
///
/// A parameter is visible when, for every key in `show`, the current value
/// of that parameter is one of the listed values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayOptions {
    #[serde(default)]
    pub show: BTreeMap<String, Vec<Value>>,
}

/// A parameter the node shows in its configuration form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeProperty {
    pub display_name: String,
    pub name: String,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    pub default: Value,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub no_data_expression: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_options: Option<TypeOptions>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<PropertyOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_options: Option<DisplayOptions>,
}

impl NodeProperty {
    fn new(
        display_name: impl Into<String>,
        name: impl Into<String>,
        property_type: PropertyType,
        default: Value,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            name: name.into(),
            property_type,
            default,
            required: false,
            no_data_expression: false,
            placeholder: None,
            description: None,
            type_options: None,
            options: Vec::new(),
            display_options: None,
        }
    }

    /// A free-text parameter defaulting to `""`
    pub fn string(display_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(display_name, name, PropertyType::String, Value::from(""))
    }

    /// A checkbox parameter defaulting to `false`
    pub fn boolean(display_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(display_name, name, PropertyType::Boolean, Value::Bool(false))
    }

    /// A dropdown parameter; the first option is the default
    pub fn options(
        display_name: impl Into<String>,
        name: impl Into<String>,
        options: Vec<PropertyOption>,
    ) -> Self {
        let default = options
            .first()
            .map(|o| o.value.clone())
            .unwrap_or(Value::Null);
        let mut property = Self::new(display_name, name, PropertyType::Options, default);
        property.options = options;
        property
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = default.into();
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn no_data_expression(mut self) -> Self {
        self.no_data_expression = true;
        self
    }

    pub fn password(mut self) -> Self {
        self.type_options = Some(TypeOptions { password: true });
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Only show this parameter while `parameter` holds one of `values`
    pub fn show_when(mut self, parameter: &str, values: &[&str]) -> Self {
        self.display_options
            .get_or_insert_with(DisplayOptions::default)
            .show
            .insert(
                parameter.to_string(),
                values.iter().map(|v| Value::from(*v)).collect(),
            );
        self
    }

    /// Whether this parameter is shown for the given parameter values.
    ///
    /// Conditions on parameters absent from `values` are checked against
    /// `defaults`.
    pub fn is_visible(&self, values: &Map<String, Value>, defaults: &Map<String, Value>) -> bool {
        let Some(ref display) = self.display_options else {
            return true;
        };
        display.show.iter().all(|(parameter, allowed)| {
            values
                .get(parameter)
                .or_else(|| defaults.get(parameter))
                .map(|current| allowed.contains(current))
                .unwrap_or(false)
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDefaults {
    pub name: String,
}

/// Credential type a node can be connected to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeCredentialDescription {
    pub name: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
}

/// Full description of a node type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeTypeDescription {
    pub display_name: String,
    pub name: String,
    pub group: Vec<String>,
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub description: String,
    pub defaults: NodeDefaults,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    #[serde(default)]
    pub credentials: Vec<NodeCredentialDescription>,
    pub properties: Vec<NodeProperty>,
}

impl NodeTypeDescription {
    /// Top-level defaults of visibility-independent parameters
    fn unconditional_defaults(&self) -> Map<String, Value> {
        self.properties
            .iter()
            .filter(|p| p.display_options.is_none())
            .map(|p| (p.name.clone(), p.default.clone()))
            .collect()
    }

    /// Default for `name` given the parameter values currently set.
    ///
    /// Several properties may share a name with different display
    /// conditions; the first visible one wins.
    pub fn parameter_default(&self, name: &str, values: &Map<String, Value>) -> Option<Value> {
        let defaults = self.unconditional_defaults();
        self.properties
            .iter()
            .filter(|p| p.name == name)
            .find(|p| p.is_visible(values, &defaults))
            .map(|p| p.default.clone())
    }

    /// Properties shown for the given parameter values
    pub fn visible_properties(&self, values: &Map<String, Value>) -> Vec<&NodeProperty> {
        let defaults = self.unconditional_defaults();
        self.properties
            .iter()
            .filter(|p| p.is_visible(values, &defaults))
            .collect()
    }

    /// Names of required parameters that are visible but unset or empty
    pub fn missing_required(&self, values: &Map<String, Value>) -> Vec<String> {
        self.visible_properties(values)
            .into_iter()
            .filter(|p| p.required)
            .filter(|p| match values.get(&p.name) {
                None | Some(Value::Null) => true,
                Some(Value::String(s)) => s.trim().is_empty(),
                Some(_) => false,
            })
            .map(|p| p.name.clone())
            .collect()
    }
}

/// Description of a credential type stored by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialTypeDescription {
    pub name: String,
    pub display_name: String,
    pub properties: Vec<NodeProperty>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> NodeTypeDescription {
        NodeTypeDescription {
            display_name: "Sample".to_string(),
            name: "sample".to_string(),
            group: vec!["apps".to_string()],
            version: 1,
            subtitle: None,
            description: "Sample node".to_string(),
            defaults: NodeDefaults {
                name: "Sample".to_string(),
            },
            inputs: vec!["main".to_string()],
            outputs: vec!["main".to_string()],
            credentials: vec![],
            properties: vec![
                NodeProperty::options(
                    "Mode",
                    "mode",
                    vec![PropertyOption::new("A", "a"), PropertyOption::new("B", "b")],
                ),
                NodeProperty::string("Target", "target")
                    .with_default("root")
                    .show_when("mode", &["a"]),
                NodeProperty::string("Target", "target")
                    .required()
                    .show_when("mode", &["b"]),
            ],
        }
    }

    #[test]
    fn test_options_default_is_first_value() {
        let description = sample();
        assert_eq!(description.properties[0].default, json!("a"));
    }

    #[test]
    fn test_parameter_default_follows_visibility() {
        let description = sample();
        let empty = Map::new();
        assert_eq!(
            description.parameter_default("target", &empty),
            Some(json!("root"))
        );

        let mut values = Map::new();
        values.insert("mode".to_string(), json!("b"));
        assert_eq!(
            description.parameter_default("target", &values),
            Some(json!(""))
        );
        assert_eq!(description.parameter_default("unknown", &values), None);
    }

    #[test]
    fn test_missing_required() {
        let description = sample();
        let mut values = Map::new();
        assert!(description.missing_required(&values).is_empty());

        values.insert("mode".to_string(), json!("b"));
        assert_eq!(description.missing_required(&values), vec!["target"]);

        values.insert("target".to_string(), json!("docs"));
        assert!(description.missing_required(&values).is_empty());
    }

    #[test]
    fn test_serializes_camel_case() {
        let property = NodeProperty::string("Access Token", "accessToken")
            .password()
            .no_data_expression()
            .show_when("operation", &["getTree"]);
        let json = serde_json::to_value(&property).unwrap();

        assert_eq!(json["displayName"], "Access Token");
        assert_eq!(json["type"], "string");
        assert_eq!(json["typeOptions"]["password"], true);
        assert_eq!(json["noDataExpression"], true);
        assert_eq!(json["displayOptions"]["show"]["operation"], json!(["getTree"]));
        assert!(json.get("required").is_none());
        assert!(json.get("options").is_none());
    }
}
