//! Generic utility handlers useful in any graph.

use async_trait::async_trait;
use serde_json::json;

use crate::handler::{Handler, HandlerError, StateUpdate};
use crate::state::WorkflowState;

/// Bumps the `iteration` counter by one (absent counts as zero).
///
/// The standard loop driver: pair it with an edge condition such as
/// `iteration < 3` to bound a cycle.
pub struct IncrementIteration;

#[async_trait]
impl Handler for IncrementIteration {
    async fn invoke(&self, state: &WorkflowState) -> Result<StateUpdate, HandlerError> {
        let current = state.get("iteration", json!(0)).as_i64().unwrap_or(0);
        Ok(StateUpdate::new().with("iteration", json!(current + 1)))
    }
}

/// Does nothing. Handy as a join point or terminal node body.
pub struct PassThrough;

#[async_trait]
impl Handler for PassThrough {
    async fn invoke(&self, _state: &WorkflowState) -> Result<StateUpdate, HandlerError> {
        Ok(StateUpdate::new())
    }
}

/// Emits the current state at debug level and changes nothing.
pub struct LogState;

#[async_trait]
impl Handler for LogState {
    async fn invoke(&self, state: &WorkflowState) -> Result<StateUpdate, HandlerError> {
        match serde_json::to_string(state.data()) {
            Ok(rendered) => tracing::debug!(state = %rendered, "current state"),
            Err(error) => tracing::debug!(%error, "state not serializable"),
        }
        Ok(StateUpdate::new())
    }
}
