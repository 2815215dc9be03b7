//! In-memory stores for built graphs and completed runs.
//!
//! Explicit objects with interior locking, shared behind `Arc` by the HTTP
//! handlers. Reads take a shared lock; writes are short and never held
//! across an await point.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::graphs::Graph;
use crate::runtimes::ExecutionLogEntry;
use crate::state::StateSnapshot;

/// Lifecycle of a stored run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

/// Everything retained about one run: identity, lifecycle status, the
/// state and log as last recorded, and bookkeeping timestamps.
#[derive(Clone, Debug, Serialize)]
pub struct RunRecord {
    pub run_id: Uuid,
    pub graph_id: Uuid,
    pub status: RunStatus,
    pub state: StateSnapshot,
    pub execution_log: Vec<ExecutionLogEntry>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Keyed store of built graphs.
///
/// Graphs are immutable after build, so the store hands out `Arc<Graph>`
/// clones and the lock is released before any run starts.
#[derive(Debug, Default)]
pub struct GraphStore {
    graphs: RwLock<rustc_hash::FxHashMap<Uuid, Arc<Graph>>>,
}

impl GraphStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a built graph, returning its id.
    pub fn insert(&self, graph: Graph) -> Uuid {
        let id = graph.id();
        self.graphs.write().insert(id, Arc::new(graph));
        id
    }

    #[must_use]
    pub fn get(&self, graph_id: Uuid) -> Option<Arc<Graph>> {
        self.graphs.read().get(&graph_id).cloned()
    }

    pub fn remove(&self, graph_id: Uuid) -> bool {
        self.graphs.write().remove(&graph_id).is_some()
    }

    /// All stored graphs, ordered by display name for stable listings.
    #[must_use]
    pub fn list(&self) -> Vec<Arc<Graph>> {
        let mut graphs: Vec<Arc<Graph>> = self.graphs.read().values().cloned().collect();
        graphs.sort_by(|a, b| a.name().cmp(b.name()).then(a.id().cmp(&b.id())));
        graphs
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.graphs.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graphs.read().is_empty()
    }
}

/// Keyed store of run records.
#[derive(Debug, Default)]
pub struct RunStore {
    runs: RwLock<rustc_hash::FxHashMap<Uuid, RunRecord>>,
}

impl RunStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a freshly started run with its initial state and an empty
    /// log.
    pub fn insert_running(&self, run_id: Uuid, graph_id: Uuid, initial_state: StateSnapshot) {
        let now = Utc::now();
        self.runs.write().insert(
            run_id,
            RunRecord {
                run_id,
                graph_id,
                status: RunStatus::Running,
                state: initial_state,
                execution_log: Vec::new(),
                error: None,
                created_at: now,
                updated_at: now,
            },
        );
    }

    /// Overwrites a run's status, state, log, and error after it finished.
    /// Unknown run ids are ignored.
    pub fn finish(
        &self,
        run_id: Uuid,
        status: RunStatus,
        state: StateSnapshot,
        execution_log: Vec<ExecutionLogEntry>,
        error: Option<String>,
    ) {
        let mut runs = self.runs.write();
        if let Some(record) = runs.get_mut(&run_id) {
            record.status = status;
            record.state = state;
            record.execution_log = execution_log;
            record.error = error;
            record.updated_at = Utc::now();
        }
    }

    #[must_use]
    pub fn get(&self, run_id: Uuid) -> Option<RunRecord> {
        self.runs.read().get(&run_id).cloned()
    }

    /// All run records, optionally filtered by graph, oldest first.
    #[must_use]
    pub fn list(&self, graph_id: Option<Uuid>) -> Vec<RunRecord> {
        let mut runs: Vec<RunRecord> = self
            .runs
            .read()
            .values()
            .filter(|run| graph_id.is_none_or(|id| run.graph_id == id))
            .cloned()
            .collect();
        runs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.run_id.cmp(&b.run_id)));
        runs
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.runs.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runs.read().is_empty()
    }
}
