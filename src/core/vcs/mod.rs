//! Version control access
//!
//! - **git**: git subprocess calls routed through the tool gateway
//! - **inspector**: working-tree cleanliness and remote divergence

pub mod git;
pub mod inspector;

pub use git::{Git, github_repo_path};
