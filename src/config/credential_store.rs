//! File-backed credential store
//!
//! Credentials live in a YAML file keyed by record name:
//!
//! ```yaml
//! credentials:
//!   gitlabApi:
//!     host: https://gitlab.com
//!     accessToken: glpat-xxxx
//! ```

use crate::credentials::GitLabCredentials;
use crate::host::{CredentialData, CredentialStore};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Serialize, Deserialize)]
struct CredentialFile {
    #[serde(default)]
    credentials: BTreeMap<String, GitLabCredentials>,
}

/// Named GitLab credentials persisted in a YAML file
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<CredentialFile> {
        if !self.path.exists() {
            return Ok(CredentialFile::default());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(CredentialFile::default());
        }
        serde_yaml::from_str(&content).map_err(|e| {
            crate::Error::Credential(format!(
                "Failed to parse {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    fn write(&self, file: &CredentialFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml::to_string(file)?;

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut handle = options.open(&self.path)?;

        // mode() only applies on creation; tighten an existing file before writing
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            handle.set_permissions(fs::Permissions::from_mode(0o600))?;
        }

        handle.write_all(yaml.as_bytes())?;
        Ok(())
    }

    /// Look up a record by name
    pub fn load(&self, name: &str) -> Result<Option<GitLabCredentials>> {
        Ok(self.read()?.credentials.remove(name))
    }

    /// Insert or replace a record
    pub fn set(&self, name: &str, credentials: GitLabCredentials) -> Result<()> {
        let mut file = self.read()?;
        file.credentials.insert(name.to_string(), credentials);
        tracing::info!(path = %self.path.display(), name, "Saving credential");
        self.write(&file)
    }

    /// Remove a record, returning whether it existed
    pub fn remove(&self, name: &str) -> Result<bool> {
        let mut file = self.read()?;
        let removed = file.credentials.remove(name).is_some();
        if removed {
            self.write(&file)?;
        }
        Ok(removed)
    }

    /// Names of all stored records, sorted
    pub fn names(&self) -> Result<Vec<String>> {
        Ok(self.read()?.credentials.into_keys().collect())
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self, name: &str) -> Result<Option<CredentialData>> {
        Ok(self.load(name)?.map(|c| c.to_record()))
    }
}
