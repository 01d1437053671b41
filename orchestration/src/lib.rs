//! Orchestration collaborator interface.
//!
//! Provides the trait-based contract the step registry talks to: a store of
//! named tabular data plus a runner for named step bodies, with an in-memory
//! implementation for testing and small-scale use.

pub mod engine;
pub mod error;
pub mod memory;
pub mod table;

pub use engine::{Orchestrator, StepBody};
pub use error::OrchestrationError;
pub use memory::MemoryEngine;
pub use table::Table;
