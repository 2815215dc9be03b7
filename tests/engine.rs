use serde_json::json;

use stepweave::graphs::GraphBuilder;
use stepweave::registry::HandlerRegistry;
use stepweave::runtimes::{EngineConfig, ExecutionEngine, RunError};

mod common;
use common::*;

#[tokio::test]
async fn missing_start_node_fails_without_invoking_anything() {
    let visits = visit_log();
    let mut registry = HandlerRegistry::new();
    registry.register("record", RecordVisit::new("a", visits.clone()));

    let graph = GraphBuilder::new("no-start")
        .add_node("a", "record")
        .build(&registry)
        .unwrap();

    let outcome = ExecutionEngine::new().run(&graph, state_map(&[])).await;

    assert_eq!(outcome.error, Some(RunError::NoStartNode));
    assert!(outcome.final_state.is_empty());
    assert!(outcome.log.is_empty());
    assert!(visits.lock().unwrap().is_empty());
}

#[tokio::test]
async fn linear_chain_runs_each_node_once_in_order() {
    let visits = visit_log();
    let mut registry = HandlerRegistry::new();
    for label in ["first", "second", "third"] {
        registry.register(label, RecordVisit::new(label, visits.clone()));
    }

    let graph = GraphBuilder::new("chain")
        .add_node("first", "first")
        .add_node("second", "second")
        .add_node("third", "third")
        .add_edge("first", "second")
        .add_edge("second", "third")
        .with_start_node("first")
        .add_terminal_node("third")
        .build(&registry)
        .unwrap();

    let outcome = ExecutionEngine::new().run(&graph, state_map(&[])).await;

    assert!(outcome.is_success());
    assert_eq!(outcome.log.len(), 3);
    let logged: Vec<&str> = outcome
        .log
        .iter()
        .map(|entry| entry.node_name.as_str())
        .collect();
    assert_eq!(logged, vec!["first", "second", "third"]);
    assert_eq!(*visits.lock().unwrap(), vec!["first", "second", "third"]);
}

#[tokio::test]
async fn state_merges_accumulate_across_nodes() {
    let mut registry = HandlerRegistry::new();
    registry.register("set_x", SetValue::new("x", json!(1)));
    registry.register(
        "derive_y",
        AddOneFrom {
            read: "x",
            write: "y",
        },
    );

    let graph = GraphBuilder::new("accumulate")
        .add_node("a", "set_x")
        .add_node("b", "derive_y")
        .add_edge("a", "b")
        .with_start_node("a")
        .add_terminal_node("b")
        .build(&registry)
        .unwrap();

    let outcome = ExecutionEngine::new().run(&graph, state_map(&[])).await;

    assert!(outcome.is_success());
    assert_eq!(outcome.final_state.get("x"), Some(&json!(1)));
    assert_eq!(outcome.final_state.get("y"), Some(&json!(2)));
    assert_eq!(outcome.log.len(), 2);
    // The first entry's snapshot predates node b's update.
    assert_eq!(outcome.log[0].state_snapshot.get("y"), None);
    assert_eq!(outcome.log[1].state_snapshot.get("y"), Some(&json!(2)));
}

#[tokio::test]
async fn unbroken_cycle_trips_the_iteration_limit() {
    let mut registry = HandlerRegistry::new();
    registry.register(
        "bump",
        AddOneFrom {
            read: "spins",
            write: "spins",
        },
    );

    let graph = GraphBuilder::new("cycle")
        .add_node("a", "bump")
        .add_node("b", "bump")
        .add_edge("a", "b")
        .add_edge("b", "a")
        .with_start_node("a")
        .build(&registry)
        .unwrap();

    let limit = 10;
    let engine = ExecutionEngine::with_config(EngineConfig::new(limit));
    let outcome = engine.run(&graph, state_map(&[])).await;

    assert_eq!(
        outcome.error,
        Some(RunError::IterationLimitExceeded { limit })
    );
    assert_eq!(outcome.log.len(), limit as usize);
}

#[tokio::test]
async fn condition_on_undefined_key_is_false_not_an_error() {
    let visits = visit_log();
    let mut registry = HandlerRegistry::new();
    registry.register("a", RecordVisit::new("a", visits.clone()));
    registry.register("b", RecordVisit::new("b", visits.clone()));

    let graph = GraphBuilder::new("undefined-key")
        .add_node("a", "a")
        .add_node("b", "b")
        .add_edge_when("a", "b", "nonexistent > 0")
        .with_start_node("a")
        .build(&registry)
        .unwrap();

    let outcome = ExecutionEngine::new().run(&graph, state_map(&[])).await;

    // The edge is silently not taken; the dead end is a normal completion.
    assert!(outcome.is_success());
    assert_eq!(outcome.log.len(), 1);
    assert_eq!(*visits.lock().unwrap(), vec!["a"]);
}

#[tokio::test]
async fn first_declared_satisfied_edge_wins() {
    let mut registry = HandlerRegistry::new();
    registry.register("start", SetValue::new("x", json!(5)));
    registry.register("left", SetValue::new("went", json!("left")));
    registry.register("right", SetValue::new("went", json!("right")));

    let build = |left_first: bool| {
        let builder = GraphBuilder::new("tie-break")
            .add_node("start", "start")
            .add_node("left", "left")
            .add_node("right", "right");
        let builder = if left_first {
            builder
                .add_edge_when("start", "left", "x > 0")
                .add_edge_when("start", "right", "x > 0")
        } else {
            builder
                .add_edge_when("start", "right", "x > 0")
                .add_edge_when("start", "left", "x > 0")
        };
        builder
            .with_start_node("start")
            .add_terminal_node("left")
            .add_terminal_node("right")
            .build(&registry)
            .unwrap()
    };

    let engine = ExecutionEngine::new();

    let outcome = engine.run(&build(true), state_map(&[])).await;
    assert_eq!(outcome.final_state.get("went"), Some(&json!("left")));

    // Swapping declaration order flips which branch is taken.
    let outcome = engine.run(&build(false), state_map(&[])).await;
    assert_eq!(outcome.final_state.get("went"), Some(&json!("right")));
}

#[tokio::test]
async fn reruns_are_deterministic_except_timestamps() {
    let registry = stepweave::handlers::builtin_registry();
    let graph = GraphBuilder::new("review")
        .add_node("extract", "extract_functions")
        .add_node("complexity", "check_complexity")
        .add_node("end", "pass_through")
        .add_edge("extract", "complexity")
        .add_edge("complexity", "end")
        .with_start_node("extract")
        .add_terminal_node("end")
        .build(&registry)
        .unwrap();

    let engine = ExecutionEngine::new();
    let initial = state_map(&[("code", json!(SAMPLE_CODE_SIMPLE))]);

    let first = engine.run(&graph, initial.clone()).await;
    let second = engine.run(&graph, initial).await;

    assert!(first.is_success());
    assert_eq!(first.final_state, second.final_state);
    assert_eq!(first.log.len(), second.log.len());
    for (a, b) in first.log.iter().zip(second.log.iter()) {
        assert_eq!(a.node_name, b.node_name);
        assert_eq!(a.state_snapshot, b.state_snapshot);
        assert_eq!(a.error, b.error);
    }
}

#[tokio::test]
async fn terminal_node_executes_and_is_logged() {
    let mut registry = HandlerRegistry::new();
    registry.register("set_x", SetValue::new("x", json!(1)));
    registry.register(
        "derive_y",
        AddOneFrom {
            read: "x",
            write: "y",
        },
    );

    let graph = GraphBuilder::new("two-step")
        .add_node("A", "set_x")
        .add_node("B", "derive_y")
        .add_edge("A", "B")
        .with_start_node("A")
        .add_terminal_node("B")
        .build(&registry)
        .unwrap();

    let outcome = ExecutionEngine::new().run(&graph, state_map(&[])).await;

    assert!(outcome.is_success());
    assert_eq!(outcome.final_state.get("x"), Some(&json!(1)));
    assert_eq!(outcome.final_state.get("y"), Some(&json!(2)));
    assert_eq!(outcome.log.len(), 2);
    assert_eq!(outcome.log[1].node_name, "B");
}

#[tokio::test]
async fn handler_failure_returns_partial_results() {
    let mut registry = HandlerRegistry::new();
    registry.register("boom", AlwaysFail("boom"));
    registry.register("after", SetValue::new("reached", json!(true)));

    let graph = GraphBuilder::new("failing")
        .add_node("A", "boom")
        .add_node("B", "after")
        .add_edge("A", "B")
        .with_start_node("A")
        .build(&registry)
        .unwrap();

    let outcome = ExecutionEngine::new().run(&graph, state_map(&[])).await;

    assert_eq!(outcome.log.len(), 1);
    assert_eq!(outcome.log[0].node_name, "A");
    assert!(outcome.log[0].error.as_deref().unwrap().contains("boom"));
    match outcome.error {
        Some(RunError::HandlerExecution { ref node, ref message }) => {
            assert_eq!(node, "A");
            assert!(message.contains("boom"));
        }
        other => panic!("unexpected outcome error: {other:?}"),
    }
    assert_eq!(outcome.final_state.get("reached"), None);
}

#[tokio::test]
async fn edge_to_undeclared_node_fails_the_run() {
    let mut registry = HandlerRegistry::new();
    registry.register("a", SetValue::new("x", json!(1)));

    let graph = GraphBuilder::new("dangling")
        .add_node("a", "a")
        .add_edge("a", "ghost")
        .with_start_node("a")
        .build(&registry)
        .unwrap();

    let outcome = ExecutionEngine::new().run(&graph, state_map(&[])).await;

    assert_eq!(
        outcome.error,
        Some(RunError::NodeNotFound {
            node: "ghost".to_string()
        })
    );
    // Node a still ran; its results are kept.
    assert_eq!(outcome.log.len(), 1);
    assert_eq!(outcome.final_state.get("x"), Some(&json!(1)));
}

#[tokio::test]
async fn review_loop_exits_through_quality_gate() {
    let registry = stepweave::handlers::builtin_registry();
    let graph = GraphBuilder::new("code-review-loop")
        .add_node("extract", "extract_functions")
        .add_node("complexity", "check_complexity")
        .add_node("detect", "detect_issues")
        .add_node("suggest", "suggest_improvements")
        .add_node("increment", "increment_iteration")
        .add_node("end", "pass_through")
        .add_edge("extract", "complexity")
        .add_edge("complexity", "detect")
        .add_edge("detect", "suggest")
        .add_edge("suggest", "increment")
        .add_edge_when("increment", "end", "quality_score >= 70 or iteration >= 3")
        .add_edge_when("increment", "complexity", "quality_score < 70 and iteration < 3")
        .with_start_node("extract")
        .add_terminal_node("end")
        .build(&registry)
        .unwrap();

    let initial = state_map(&[
        ("code", json!(SAMPLE_CODE_WITH_ISSUES)),
        ("iteration", json!(0)),
    ]);
    let outcome = ExecutionEngine::new().run(&graph, initial).await;

    assert!(outcome.is_success());
    // Three issues, no complex functions: quality lands exactly on the
    // gate and the loop exits after one pass.
    assert_eq!(outcome.final_state.get("quality_score"), Some(&json!(70)));
    assert_eq!(outcome.final_state.get("iteration"), Some(&json!(1)));
    assert_eq!(outcome.log.last().unwrap().node_name, "end");
}
