//! HTTP surface tests driven through the router with `tower::oneshot`.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use stepweave::handlers::builtin_registry;
use stepweave::service::{router, AppState};

mod common;
use common::SAMPLE_CODE_SIMPLE;

fn app() -> (Arc<AppState>, Router) {
    let state = Arc::new(AppState::new(builtin_registry()));
    let router = router(state.clone());
    (state, router)
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn simple_workflow() -> Value {
    json!({
        "name": "Simple Linear Workflow",
        "description": "Extract functions and check complexity",
        "nodes": [
            {"name": "extract", "handler": "extract_functions"},
            {"name": "complexity", "handler": "check_complexity"},
            {"name": "end", "handler": "pass_through"}
        ],
        "edges": [
            {"source": "extract", "target": "complexity"},
            {"source": "complexity", "target": "end"}
        ],
        "start_node": "extract",
        "terminal_nodes": ["end"]
    })
}

#[tokio::test]
async fn health_reports_healthy() {
    let (_, router) = app();
    let (status, body) = send(&router, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("healthy"));
}

#[tokio::test]
async fn create_then_run_a_graph() {
    let (_, router) = app();

    let (status, created) = send(&router, post("/graph/create", simple_workflow())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["status"], json!("created"));
    assert_eq!(created["node_count"], json!(3));
    assert_eq!(created["edge_count"], json!(2));
    let graph_id = created["graph_id"].as_str().unwrap().to_string();

    let run_request = json!({
        "graph_id": graph_id,
        "initial_state": {"code": SAMPLE_CODE_SIMPLE}
    });
    let (status, run) = send(&router, post("/graph/run", run_request)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(run["status"], json!("completed"));
    assert_eq!(run["graph_id"], json!(graph_id));
    assert_eq!(run["final_state"]["function_count"], json!(2));
    assert_eq!(run["execution_log"].as_array().unwrap().len(), 3);
    assert_eq!(run["error"], Value::Null);
    assert_eq!(
        run["execution_log"][0]["node_name"],
        json!("extract")
    );
}

#[tokio::test]
async fn create_rejects_unknown_handlers() {
    let (_, router) = app();
    let definition = json!({
        "name": "broken",
        "nodes": [{"name": "a", "handler": "missing_handler"}],
        "edges": []
    });
    let (status, body) = send(&router, post("/graph/create", definition)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("missing_handler"));
}

#[tokio::test]
async fn create_rejects_malformed_conditions() {
    let (_, router) = app();
    let definition = json!({
        "name": "broken",
        "nodes": [
            {"name": "a", "handler": "pass_through"},
            {"name": "b", "handler": "pass_through"}
        ],
        "edges": [{"source": "a", "target": "b", "condition": "x >"}]
    });
    let (status, body) = send(&router, post("/graph/create", definition)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("condition"));
}

#[tokio::test]
async fn run_of_unknown_graph_is_not_found() {
    let (_, router) = app();
    let request = json!({
        "graph_id": "00000000-0000-0000-0000-000000000000",
        "initial_state": {}
    });
    let (status, body) = send(&router, post("/graph/run", request)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn failed_runs_return_partial_results_not_http_errors() {
    let (_, router) = app();

    // The edge targets a node that was never declared, so the run fails
    // at run time with partial results.
    let definition = json!({
        "name": "dangling",
        "nodes": [{"name": "a", "handler": "increment_iteration"}],
        "edges": [{"source": "a", "target": "ghost"}],
        "start_node": "a"
    });
    let (status, created) = send(&router, post("/graph/create", definition)).await;
    assert_eq!(status, StatusCode::OK);
    let graph_id = created["graph_id"].clone();

    let (status, run) = send(
        &router,
        post("/graph/run", json!({"graph_id": graph_id, "initial_state": {}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(run["status"], json!("failed"));
    assert!(run["error"].as_str().unwrap().contains("ghost"));
    assert_eq!(run["final_state"]["iteration"], json!(1));
    assert_eq!(run["execution_log"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn run_state_is_retrievable_after_the_run() {
    let (_, router) = app();
    let (_, created) = send(&router, post("/graph/create", simple_workflow())).await;
    let graph_id = created["graph_id"].clone();

    let (_, run) = send(
        &router,
        post(
            "/graph/run",
            json!({"graph_id": graph_id, "initial_state": {"code": SAMPLE_CODE_SIMPLE}}),
        ),
    )
    .await;
    let run_id = run["run_id"].as_str().unwrap();

    let (status, state) = send(&router, get(&format!("/graph/state/{run_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state["status"], json!("completed"));
    assert_eq!(state["current_state"], run["final_state"]);
    assert_eq!(
        state["execution_log"].as_array().unwrap().len(),
        run["execution_log"].as_array().unwrap().len()
    );

    let (status, _) = send(
        &router,
        get("/graph/state/00000000-0000-0000-0000-000000000000"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listings_cover_graphs_runs_and_handlers() {
    let (_, router) = app();

    let (_, created) = send(&router, post("/graph/create", simple_workflow())).await;
    let graph_id = created["graph_id"].clone();
    for _ in 0..2 {
        send(
            &router,
            post(
                "/graph/run",
                json!({"graph_id": graph_id, "initial_state": {"code": ""}}),
            ),
        )
        .await;
    }

    let (status, graphs) = send(&router, get("/graphs")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(graphs["count"], json!(1));
    assert_eq!(graphs["graphs"][0]["name"], json!("Simple Linear Workflow"));

    let (status, runs) = send(&router, get("/runs")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(runs["count"], json!(2));

    let filter = format!("/runs?graph_id={}", graph_id.as_str().unwrap());
    let (_, filtered) = send(&router, get(&filter)).await;
    assert_eq!(filtered["count"], json!(2));

    let other = "/runs?graph_id=00000000-0000-0000-0000-000000000000";
    let (_, empty) = send(&router, get(other)).await;
    assert_eq!(empty["count"], json!(0));

    let (status, handlers) = send(&router, get("/handlers")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(handlers["count"], json!(7));
    assert!(handlers["handlers"]
        .as_array()
        .unwrap()
        .contains(&json!("pass_through")));
}
