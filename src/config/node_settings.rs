//! Runner settings file handling

use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

fn default_request_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("gitlab-file-node/", env!("CARGO_PKG_VERSION")).to_string()
}

fn config_dir() -> PathBuf {
    // Always use ~/.config for consistency across platforms (macOS, Linux)
    let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(".config");
    path.push("gitlab-file-node");
    path
}

/// Settings for running the node outside a workflow host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSettings {
    /// Per-request timeout for GitLab calls, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// User-Agent sent to GitLab
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Credential store location (default: ~/.config/gitlab-file-node/credentials.yaml)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials_path: Option<PathBuf>,
}

impl NodeSettings {
    pub fn new() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
            user_agent: default_user_agent(),
            credentials_path: None,
        }
    }

    /// Load settings from the default path
    pub fn load_default() -> Result<Self> {
        Self::load(Self::default_path())
    }

    /// Load settings from a specific path
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(crate::Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        tracing::info!(path = %path.display(), "Loading node settings");

        let content = fs::read_to_string(path)?;
        let settings: Self = serde_yaml::from_str(&content)?;

        tracing::debug!(
            timeout = settings.request_timeout_secs,
            "Settings loaded successfully"
        );

        Ok(settings)
    }

    /// Load settings, falling back to defaults when the file does not exist
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "No settings file, using defaults");
            Ok(Self::default())
        }
    }

    /// Save settings to a specific path
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        tracing::info!(path = %path.display(), "Saving node settings");

        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;

        Ok(())
    }

    /// Default settings path (~/.config/gitlab-file-node/config.yaml)
    pub fn default_path() -> PathBuf {
        config_dir().join("config.yaml")
    }

    /// Credential store path, configured or default
    pub fn credentials_path(&self) -> PathBuf {
        self.credentials_path
            .clone()
            .unwrap_or_else(|| config_dir().join("credentials.yaml"))
    }
}

impl Default for NodeSettings {
    fn default() -> Self {
        Self::new()
    }
}
