//! Request and response bodies for the HTTP surface.
//!
//! The graph-creation request body is [`GraphDefinition`] itself; the
//! types here cover everything the API returns plus the run-invocation
//! request.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::storage::{RunRecord, RunStatus};
use crate::runtimes::ExecutionLogEntry;
use crate::state::StateSnapshot;

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateGraphResponse {
    pub graph_id: Uuid,
    pub name: String,
    pub status: String,
    pub node_count: usize,
    pub edge_count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RunGraphRequest {
    pub graph_id: Uuid,
    #[serde(default)]
    pub initial_state: StateSnapshot,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RunGraphResponse {
    pub run_id: Uuid,
    pub graph_id: Uuid,
    pub status: RunStatus,
    pub final_state: StateSnapshot,
    pub execution_log: Vec<ExecutionLogEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RunStateResponse {
    pub run_id: Uuid,
    pub graph_id: Uuid,
    pub status: RunStatus,
    pub current_state: StateSnapshot,
    pub execution_log: Vec<ExecutionLogEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<RunRecord> for RunStateResponse {
    fn from(record: RunRecord) -> Self {
        Self {
            run_id: record.run_id,
            graph_id: record.graph_id,
            status: record.status,
            current_state: record.state,
            execution_log: record.execution_log,
            error: record.error,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GraphSummary {
    pub graph_id: Uuid,
    pub name: String,
    pub description: String,
    pub node_count: usize,
    pub edge_count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListGraphsResponse {
    pub count: usize,
    pub graphs: Vec<GraphSummary>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub graph_id: Uuid,
    pub status: RunStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<&RunRecord> for RunSummary {
    fn from(record: &RunRecord) -> Self {
        Self {
            run_id: record.run_id,
            graph_id: record.graph_id,
            status: record.status,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListRunsResponse {
    pub count: usize,
    pub runs: Vec<RunSummary>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListHandlersResponse {
    pub count: usize,
    pub handlers: Vec<String>,
}

/// Body of every non-2xx response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
