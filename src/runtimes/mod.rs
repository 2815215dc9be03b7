//! Run-time execution of built graphs.
//!
//! [`ExecutionEngine`] drives a single run: it walks the graph from the
//! start node, executes each node's handler, merges partial updates into
//! the run's [`WorkflowState`](crate::state::WorkflowState), follows the
//! first satisfied outgoing edge, and records every attempted node in the
//! execution log. Run-time failures are returned inside [`RunOutcome`],
//! never thrown.

mod config;
mod engine;

pub use config::EngineConfig;
pub use engine::{ExecutionEngine, ExecutionLogEntry, RunError, RunOutcome};
