//! CLI commands for shiprail
//!
//! - **release**: run the release workflow (the default command)
//! - **plan**: show the resolved step sequence and plan id
//! - **notes**: print release notes from the changelog
//! - **init**: write a default `shiprail.toml`
//! - **history**: write the commit log for a date range to a file
//!
//! All commands except `init` accept `&ProjectContext` to avoid redundant config loads.

pub mod history;
pub mod init;
pub mod notes;
pub mod plan;
pub mod release;

pub use history::run_history;
pub use init::run_init;
pub use notes::run_notes;
pub use plan::run_plan;
pub use release::{ReleaseArgs, run_release};
