//! GitLab File - workflow node for GitLab repository files
//!
//! A node for workflow-automation hosts that exposes two GitLab repository
//! operations: listing a directory tree (`getTree`) and retrieving a file
//! (`getFile`). Calls go through the `gitlab-api` client crate.
//!
//! # Architecture
//!
//! - **host**: Host contract (node trait, execute context, descriptions, errors)
//! - **credentials**: `gitlabApi` credential type and resolution
//! - **nodes**: The GitLab File node, its handler table and dispatcher
//! - **config**: Runner settings and the file-backed credential store
//! - **logging**: tracing subscriber setup

pub mod config;
pub mod credentials;
pub mod error;
pub mod host;
pub mod logging;
pub mod nodes;

// Re-exports
pub use error::{Error, Result};
pub use nodes::GitLabFile;
