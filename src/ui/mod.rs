//! Terminal interaction: confirmation prompts and run reporting

pub mod prompt;
pub mod reporter;
