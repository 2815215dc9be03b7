//! State management for workflow runs.
//!
//! This module provides the mutable key-value state that flows through a
//! single workflow run, plus an ordered history of deep snapshots taken
//! before each node executes.
//!
//! # Core Types
//!
//! - [`WorkflowState`]: the live, mutable state owned by exactly one run
//! - [`StateSnapshot`]: an independent deep copy of the state at a point in time
//!
//! # Ownership
//!
//! A `WorkflowState` is created by the execution engine from the caller's
//! initial state and is never shared across runs. Snapshots are fully
//! structurally independent: mutating the live state after a snapshot was
//! taken is never observable through that snapshot (`serde_json::Value`
//! clones are deep copies).
//!
//! # Examples
//!
//! ```rust
//! use stepweave::state::WorkflowState;
//! use serde_json::json;
//!
//! let mut state = WorkflowState::new([("x".to_string(), json!(1))].into_iter().collect());
//!
//! state.set("y", json!("hello"));
//! assert_eq!(state.get("y", json!(null)), json!("hello"));
//! assert_eq!(state.get("missing", json!(42)), json!(42));
//!
//! let snapshot = state.snapshot();
//! state.set("y", json!("changed"));
//! assert_eq!(snapshot.get("y"), Some(&json!("hello")));
//! ```

use rustc_hash::FxHashMap;
use serde_json::Value;

/// A point-in-time deep copy of the state map.
///
/// Snapshots are plain maps: once taken, they share no structure with the
/// live state or with any other snapshot.
pub type StateSnapshot = FxHashMap<String, Value>;

/// The shared mutable key-value state threaded through a workflow run.
///
/// Holds arbitrary structured values (numbers, strings, booleans, nested
/// maps and arrays) keyed by string, and an append-only history of
/// snapshots, one saved before each node execution.
///
/// Mutation happens only through [`set`](Self::set) and
/// [`update`](Self::update) (a shallow merge: top-level keys are replaced,
/// never deep-merged). No operation fails for a missing key.
#[derive(Clone, Debug, Default)]
pub struct WorkflowState {
    data: FxHashMap<String, Value>,
    history: Vec<StateSnapshot>,
}

impl WorkflowState {
    /// Creates a workflow state seeded from the caller-supplied initial map.
    #[must_use]
    pub fn new(initial: FxHashMap<String, Value>) -> Self {
        Self {
            data: initial,
            history: Vec::new(),
        }
    }

    /// Returns the value at `key`, or `default` when the key is absent.
    ///
    /// Never fails: a missing key is an ordinary outcome, not an error.
    #[must_use]
    pub fn get(&self, key: &str, default: Value) -> Value {
        self.data.get(key).cloned().unwrap_or(default)
    }

    /// Returns a reference to the value at `key`, if present.
    #[must_use]
    pub fn get_ref(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Sets a single key, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.data.insert(key.into(), value);
    }

    /// Shallow-merges `partial` into the live map.
    ///
    /// Top-level keys in `partial` replace existing entries wholesale;
    /// nested structures are not merged recursively.
    pub fn update(&mut self, partial: FxHashMap<String, Value>) {
        self.data.extend(partial);
    }

    /// Creates a deep, fully independent copy of the current state map.
    #[must_use]
    pub fn snapshot(&self) -> StateSnapshot {
        self.data.clone()
    }

    /// Appends a [`snapshot`](Self::snapshot) of the current state to the
    /// history. Mutates only the history, never the live map.
    pub fn save_snapshot(&mut self) {
        self.history.push(self.snapshot());
    }

    /// The ordered history of snapshots taken so far, oldest first.
    #[must_use]
    pub fn history(&self) -> &[StateSnapshot] {
        &self.history
    }

    /// Read-only view of the live state map, for condition evaluation and
    /// handler inspection.
    #[must_use]
    pub fn data(&self) -> &FxHashMap<String, Value> {
        &self.data
    }
}
