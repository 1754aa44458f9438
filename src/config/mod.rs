//! Configuration system
//!
//! Loads ~/.config/gitlab-file-node/config.yaml for the CLI runner and keeps
//! named GitLab credentials in a YAML credential store next to it.

mod credential_store;
mod node_settings;
pub mod validation;

pub use credential_store::FileCredentialStore;
pub use node_settings::NodeSettings;
pub use validation::{validate_credentials, validate_settings, validate_settings_result, ValidationError};
