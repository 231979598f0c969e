//! Release workflow engine
//!
//! - **step**: step ids, failure policies and the `Step` trait
//! - **steps**: one implementation per step
//! - **context**: run options and state shared between steps
//! - **plan**: resolved step sequence with a content-addressed id
//! - **orchestrator**: the state machine that walks the plan
//! - **outcome**: step records and the run trace
//! - **events**: what the orchestrator reports while it runs

pub mod context;
pub mod events;
pub mod orchestrator;
pub mod outcome;
pub mod plan;
pub mod step;
pub mod steps;

pub use context::RunOptions;
pub use orchestrator::{Orchestrator, peek_release};
