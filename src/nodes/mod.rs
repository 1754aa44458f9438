//! Node types provided by this crate

pub mod gitlab_file;

pub use gitlab_file::GitLabFile;
