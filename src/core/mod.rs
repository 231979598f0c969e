//! Core building blocks shared by every command
//!
//! - **config**: `shiprail.toml` parsing, defaults and validation
//! - **context**: project root and configuration, loaded once in main.rs
//! - **error**: error types with help messages and stable exit codes
//! - **vcs**: git operations and repository state inspection

pub mod config;
pub mod context;
pub mod error;
pub mod vcs;
