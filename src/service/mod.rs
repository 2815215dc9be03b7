//! HTTP service surface over the workflow engine.
//!
//! A thin axum layer: build graphs from JSON definitions, run them, and
//! inspect stored runs. All state lives in the in-memory
//! [`GraphStore`]/[`RunStore`] pair shared through [`AppState`].

mod api;
mod storage;
mod types;

pub use api::{router, AppState};
pub use storage::{GraphStore, RunRecord, RunStatus, RunStore};
pub use types::{
    CreateGraphResponse, ErrorResponse, GraphSummary, ListGraphsResponse, ListHandlersResponse,
    ListRunsResponse, RunGraphRequest, RunGraphResponse, RunStateResponse, RunSummary,
};
