//! Pre-flight checks run before any workflow step touches the project
//!
//! - **prerequisites**: required external tools on PATH and project files on disk

pub mod prerequisites;

pub use prerequisites::{check_all, check_files};
