//! Definition-driven graph builds, including the JSON wire shape.

use serde_json::json;

use stepweave::graphs::{BuildError, Graph, GraphBuilder, GraphDefinition, NodeKind};
use stepweave::handlers::builtin_registry;

#[test]
fn builds_from_a_json_definition() {
    let definition: GraphDefinition = serde_json::from_value(json!({
        "name": "Code Review Agent",
        "description": "Analyzes code quality",
        "nodes": [
            {"name": "extract", "handler": "extract_functions", "kind": "function"},
            {"name": "complexity", "handler": "check_complexity"},
            {"name": "increment", "handler": "increment_iteration", "kind": "loop"},
            {"name": "end", "handler": "pass_through"}
        ],
        "edges": [
            {"source": "extract", "target": "complexity"},
            {"source": "complexity", "target": "increment"},
            {"source": "increment", "target": "complexity", "condition": "iteration < 3"},
            {"source": "increment", "target": "end"}
        ],
        "start_node": "extract",
        "terminal_nodes": ["end"]
    }))
    .unwrap();

    let graph = Graph::from_definition(&definition, &builtin_registry()).unwrap();

    assert_eq!(graph.name(), "Code Review Agent");
    assert_eq!(graph.node_count(), 4);
    assert_eq!(graph.edge_count(), 4);
    assert_eq!(graph.start_node(), Some("extract"));
    assert!(graph.is_terminal("end"));
    assert_eq!(graph.node("increment").unwrap().kind(), NodeKind::Loop);
    // Edge order is the declaration order.
    let outgoing: Vec<&str> = graph.outgoing("increment").map(|e| e.target()).collect();
    assert_eq!(outgoing, vec!["complexity", "end"]);
}

#[test]
fn definition_defaults_are_permissive() {
    let definition: GraphDefinition = serde_json::from_value(json!({
        "name": "bare",
        "nodes": [{"name": "only", "handler": "pass_through"}],
        "edges": []
    }))
    .unwrap();

    let graph = Graph::from_definition(&definition, &builtin_registry()).unwrap();
    assert_eq!(graph.description(), "");
    assert_eq!(graph.start_node(), None);
    assert!(graph.terminal_nodes().is_empty());
}

#[test]
fn unknown_handler_in_definition_fails_the_build() {
    let definition: GraphDefinition = serde_json::from_value(json!({
        "name": "broken",
        "nodes": [{"name": "a", "handler": "no_such_handler"}],
        "edges": []
    }))
    .unwrap();

    let err = Graph::from_definition(&definition, &builtin_registry()).unwrap_err();
    match err {
        BuildError::HandlerNotFound { node, handler } => {
            assert_eq!(node, "a");
            assert_eq!(handler, "no_such_handler");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn malformed_condition_in_definition_fails_the_build() {
    let definition: GraphDefinition = serde_json::from_value(json!({
        "name": "broken",
        "nodes": [
            {"name": "a", "handler": "pass_through"},
            {"name": "b", "handler": "pass_through"}
        ],
        "edges": [
            {"source": "a", "target": "b", "condition": "x >< 3"}
        ]
    }))
    .unwrap();

    let err = Graph::from_definition(&definition, &builtin_registry()).unwrap_err();
    assert!(matches!(err, BuildError::InvalidCondition { .. }));
}

#[test]
fn graph_ids_are_unique_per_build() {
    let build = || {
        GraphBuilder::new("same-name")
            .add_node("only", "pass_through")
            .build(&builtin_registry())
            .unwrap()
    };
    assert_ne!(build().id(), build().id());
}

#[test]
fn definitions_round_trip_through_serde() {
    let definition: GraphDefinition = serde_json::from_value(json!({
        "name": "rt",
        "nodes": [{"name": "a", "handler": "pass_through"}],
        "edges": [{"source": "a", "target": "a", "condition": "x < 1"}],
        "start_node": "a",
        "terminal_nodes": []
    }))
    .unwrap();

    let serialized = serde_json::to_value(&definition).unwrap();
    assert_eq!(serialized["nodes"][0]["kind"], json!("function"));
    assert_eq!(serialized["edges"][0]["condition"], json!("x < 1"));
}
