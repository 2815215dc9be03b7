//! Handler execution framework for workflow nodes.
//!
//! This module provides the core abstraction for executable workflow steps:
//! the [`Handler`] trait, the [`StateUpdate`] partial-update type, and
//! handler error types.

use async_trait::async_trait;
use miette::Diagnostic;
use rustc_hash::FxHashMap;
use serde_json::Value;
use thiserror::Error;

use crate::state::WorkflowState;

/// Core trait for the callable behind a workflow node.
///
/// A handler receives a read-only view of the live workflow state, performs
/// its work, and returns a partial update that the engine shallow-merges
/// back into the state. Handlers should be stateless and deterministic;
/// everything they need comes in through the state.
///
/// # Error Handling
///
/// Returning `Err(HandlerError)` stops the run: the engine records the
/// failure in the execution log and returns it as the run-level error
/// alongside whatever partial results were produced. It never escapes as
/// a panic or a thrown error to the caller of `run`.
///
/// # Examples
///
/// ```rust
/// use stepweave::handler::{Handler, HandlerError, StateUpdate};
/// use stepweave::state::WorkflowState;
/// use async_trait::async_trait;
/// use serde_json::json;
///
/// struct CountLines;
///
/// #[async_trait]
/// impl Handler for CountLines {
///     async fn invoke(&self, state: &WorkflowState) -> Result<StateUpdate, HandlerError> {
///         let code = state.get("code", json!(""));
///         let lines = code.as_str().map_or(0, |s| s.lines().count());
///         Ok(StateUpdate::new().with("line_count", json!(lines)))
///     }
/// }
/// ```
#[async_trait]
pub trait Handler: Send + Sync {
    /// Execute this handler against the current workflow state.
    async fn invoke(&self, state: &WorkflowState) -> Result<StateUpdate, HandlerError>;
}

/// Partial state update returned by handler execution.
///
/// The engine merges the entries into the live state via a shallow merge:
/// each top-level key replaces any existing value. An empty update is a
/// valid no-op.
#[derive(Clone, Debug, Default)]
pub struct StateUpdate {
    entries: FxHashMap<String, Value>,
}

impl StateUpdate {
    /// Creates an empty update.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one key to the update, replacing a previous entry for the key.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.entries.insert(key.into(), value);
        self
    }

    /// Number of top-level keys in this update.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the update carries no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consumes the update, yielding the raw entry map.
    #[must_use]
    pub fn into_entries(self) -> FxHashMap<String, Value> {
        self.entries
    }
}

impl From<FxHashMap<String, Value>> for StateUpdate {
    fn from(entries: FxHashMap<String, Value>) -> Self {
        Self { entries }
    }
}

impl FromIterator<(String, Value)> for StateUpdate {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Errors raised by handler execution.
///
/// These are soft failures from the run's perspective: the engine converts
/// them into a log entry plus a run-level error and returns partial
/// results instead of propagating.
#[derive(Debug, Error, Diagnostic)]
pub enum HandlerError {
    /// Expected input data is missing from the state.
    #[error("missing expected input: {what}")]
    #[diagnostic(
        code(stepweave::handler::missing_input),
        help("Check that an earlier node produced the required key.")
    )]
    MissingInput { what: &'static str },

    /// Input data was present but had the wrong shape.
    #[error("invalid input for {what}: {message}")]
    #[diagnostic(code(stepweave::handler::invalid_input))]
    InvalidInput { what: &'static str, message: String },

    /// JSON serialization/deserialization error.
    #[error(transparent)]
    #[diagnostic(code(stepweave::handler::serde_json))]
    Serde(#[from] serde_json::Error),

    /// Free-form handler failure.
    #[error("{0}")]
    #[diagnostic(code(stepweave::handler::failed))]
    Failed(String),
}

impl HandlerError {
    /// Convenience constructor for a free-form failure message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}
