//! Release metadata: package version and changelog notes
//!
//! - **version**: strict `X.Y.Z` versions read from the manifest, tag naming, and
//!   the manifest/changelog cross-check
//! - **changelog**: ordered changelog entries and per-version release notes
//!
//! Both are pure functions of text; reading files and deciding what a mismatch
//! means for the run is the workflow's job.

pub mod changelog;
pub mod version;
