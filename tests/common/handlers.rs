use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

use stepweave::handler::{Handler, HandlerError, StateUpdate};
use stepweave::state::WorkflowState;

/// Sets one fixed key to one fixed value.
pub struct SetValue {
    pub key: &'static str,
    pub value: Value,
}

impl SetValue {
    pub fn new(key: &'static str, value: Value) -> Self {
        Self { key, value }
    }
}

#[async_trait]
impl Handler for SetValue {
    async fn invoke(&self, _state: &WorkflowState) -> Result<StateUpdate, HandlerError> {
        Ok(StateUpdate::new().with(self.key, self.value.clone()))
    }
}

/// Reads `read` as an integer (absent counts as zero) and writes
/// `read + 1` under `write`.
pub struct AddOneFrom {
    pub read: &'static str,
    pub write: &'static str,
}

#[async_trait]
impl Handler for AddOneFrom {
    async fn invoke(&self, state: &WorkflowState) -> Result<StateUpdate, HandlerError> {
        let base = state.get(self.read, json!(0)).as_i64().unwrap_or(0);
        Ok(StateUpdate::new().with(self.write, json!(base + 1)))
    }
}

/// Appends its label to a shared visit list and changes no state.
#[derive(Clone)]
pub struct RecordVisit {
    label: &'static str,
    visits: Arc<Mutex<Vec<String>>>,
}

impl RecordVisit {
    pub fn new(label: &'static str, visits: Arc<Mutex<Vec<String>>>) -> Self {
        Self { label, visits }
    }
}

#[async_trait]
impl Handler for RecordVisit {
    async fn invoke(&self, _state: &WorkflowState) -> Result<StateUpdate, HandlerError> {
        self.visits.lock().unwrap().push(self.label.to_string());
        Ok(StateUpdate::new())
    }
}

/// Always fails with the given message.
pub struct AlwaysFail(pub &'static str);

#[async_trait]
impl Handler for AlwaysFail {
    async fn invoke(&self, _state: &WorkflowState) -> Result<StateUpdate, HandlerError> {
        Err(HandlerError::msg(self.0))
    }
}
