//! Axum routes wrapping graph building and execution.
//!
//! The HTTP layer only calls [`Graph::from_definition`] and
//! [`ExecutionEngine::run`] and serializes the results; no execution
//! semantics live here. A run that fails at run time (handler failure,
//! iteration limit, unknown node) is still a 200 response carrying
//! `status: "failed"` plus partial results, matching the engine's
//! soft-failure contract. Only malformed builds (400) and unknown ids
//! (404) map to HTTP errors.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use super::storage::{GraphStore, RunStatus, RunStore};
use super::types::{
    CreateGraphResponse, ErrorResponse, GraphSummary, ListGraphsResponse, ListHandlersResponse,
    ListRunsResponse, RunGraphRequest, RunGraphResponse, RunStateResponse, RunSummary,
};
use crate::graphs::{Graph, GraphDefinition};
use crate::registry::HandlerRegistry;
use crate::runtimes::ExecutionEngine;

/// Shared application state for axum handlers.
pub struct AppState {
    pub registry: HandlerRegistry,
    pub engine: ExecutionEngine,
    pub graphs: GraphStore,
    pub runs: RunStore,
}

impl AppState {
    /// State with empty stores and a default-configured engine.
    #[must_use]
    pub fn new(registry: HandlerRegistry) -> Self {
        Self {
            registry,
            engine: ExecutionEngine::new(),
            graphs: GraphStore::new(),
            runs: RunStore::new(),
        }
    }
}

struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

/// Builds the API router over the shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/graph/create", post(create_graph))
        .route("/graph/run", post(run_graph))
        .route("/graph/state/{run_id}", get(run_state))
        .route("/graphs", get(list_graphs))
        .route("/runs", get(list_runs))
        .route("/handlers", get(list_handlers))
        .route("/health", get(health))
        .with_state(state)
}

// POST /graph/create
async fn create_graph(
    State(state): State<Arc<AppState>>,
    Json(definition): Json<GraphDefinition>,
) -> Result<Json<CreateGraphResponse>, ApiError> {
    let graph = Graph::from_definition(&definition, &state.registry)
        .map_err(|err| ApiError::bad_request(err.to_string()))?;

    let response = CreateGraphResponse {
        graph_id: graph.id(),
        name: graph.name().to_string(),
        status: "created".to_string(),
        node_count: graph.node_count(),
        edge_count: graph.edge_count(),
    };
    let graph_id = state.graphs.insert(graph);
    tracing::info!(%graph_id, name = %response.name, "graph created");
    Ok(Json(response))
}

// POST /graph/run
async fn run_graph(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RunGraphRequest>,
) -> Result<Json<RunGraphResponse>, ApiError> {
    let graph = state
        .graphs
        .get(request.graph_id)
        .ok_or_else(|| ApiError::not_found(format!("graph {} not found", request.graph_id)))?;

    let run_id = Uuid::new_v4();
    state
        .runs
        .insert_running(run_id, request.graph_id, request.initial_state.clone());

    let outcome = state.engine.run(&graph, request.initial_state).await;

    let status = if outcome.is_success() {
        RunStatus::Completed
    } else {
        RunStatus::Failed
    };
    let error = outcome.error.map(|err| err.to_string());
    state.runs.finish(
        run_id,
        status,
        outcome.final_state.clone(),
        outcome.log.clone(),
        error.clone(),
    );
    tracing::info!(%run_id, graph_id = %request.graph_id, ?status, steps = outcome.log.len(), "run finished");

    Ok(Json(RunGraphResponse {
        run_id,
        graph_id: request.graph_id,
        status,
        final_state: outcome.final_state,
        execution_log: outcome.log,
        error,
    }))
}

// GET /graph/state/{run_id}
async fn run_state(
    State(state): State<Arc<AppState>>,
    Path(run_id): Path<Uuid>,
) -> Result<Json<RunStateResponse>, ApiError> {
    state
        .runs
        .get(run_id)
        .map(|record| Json(RunStateResponse::from(record)))
        .ok_or_else(|| ApiError::not_found(format!("run {run_id} not found")))
}

// GET /graphs
async fn list_graphs(State(state): State<Arc<AppState>>) -> Json<ListGraphsResponse> {
    let graphs: Vec<GraphSummary> = state
        .graphs
        .list()
        .iter()
        .map(|graph| GraphSummary {
            graph_id: graph.id(),
            name: graph.name().to_string(),
            description: graph.description().to_string(),
            node_count: graph.node_count(),
            edge_count: graph.edge_count(),
        })
        .collect();
    Json(ListGraphsResponse {
        count: graphs.len(),
        graphs,
    })
}

#[derive(Debug, Deserialize)]
struct RunsQuery {
    #[serde(default)]
    graph_id: Option<Uuid>,
}

// GET /runs?graph_id=...
async fn list_runs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RunsQuery>,
) -> Json<ListRunsResponse> {
    let runs: Vec<RunSummary> = state
        .runs
        .list(query.graph_id)
        .iter()
        .map(RunSummary::from)
        .collect();
    Json(ListRunsResponse {
        count: runs.len(),
        runs,
    })
}

// GET /handlers
async fn list_handlers(State(state): State<Arc<AppState>>) -> Json<ListHandlersResponse> {
    let handlers = state.registry.names();
    Json(ListHandlersResponse {
        count: handlers.len(),
        handlers,
    })
}

// GET /health
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
