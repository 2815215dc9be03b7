//! # Stepweave: a minimal workflow/graph interpreter
//!
//! Stepweave executes workflows described as directed graphs: named nodes
//! backed by [`Handler`](handler::Handler) implementations, edges that may
//! carry boolean condition expressions over the shared state, one start
//! node, and a set of terminal nodes. A run threads a mutable key-value
//! [`WorkflowState`](state::WorkflowState) through the nodes, records a
//! snapshot per step in an execution log, and returns partial results on
//! failure instead of propagating errors.
//!
//! ## Quick Start
//!
//! ```rust
//! use stepweave::graphs::GraphBuilder;
//! use stepweave::handlers::builtin_registry;
//! use stepweave::runtimes::ExecutionEngine;
//! use rustc_hash::FxHashMap;
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let registry = builtin_registry();
//! let graph = GraphBuilder::new("review")
//!     .add_node("extract", "extract_functions")
//!     .add_node("complexity", "check_complexity")
//!     .add_edge("extract", "complexity")
//!     .with_start_node("extract")
//!     .add_terminal_node("complexity")
//!     .build(&registry)
//!     .expect("valid graph");
//!
//! let mut initial = FxHashMap::default();
//! initial.insert("code".to_string(), json!("def hello():\n    return 1\n"));
//!
//! let outcome = ExecutionEngine::new().run(&graph, initial).await;
//! assert!(outcome.is_success());
//! assert_eq!(outcome.final_state.get("function_count"), Some(&json!(1)));
//! assert_eq!(outcome.log.len(), 2);
//! # }
//! ```
//!
//! ## Execution semantics
//!
//! - Handlers return partial updates; the engine shallow-merges them into
//!   the state (top-level keys replace, never deep-merge).
//! - Edge conditions are compiled once at build time from a small
//!   expression grammar and evaluated fail-closed: any evaluation problem
//!   (missing key, type mismatch, division by zero) makes the edge false,
//!   never an error.
//! - When several outgoing edges are satisfied, the first declared one
//!   wins. A node with no satisfied outgoing edge ends the run
//!   successfully, as does reaching a terminal node.
//! - A configurable iteration bound (default 100) stops runaway cycles.
//!
//! ## Module Guide
//!
//! - [`state`] - run-scoped key-value state with snapshot history
//! - [`condition`] - the edge condition expression language
//! - [`handler`] - the `Handler` trait and partial-update type
//! - [`registry`] - name-to-handler resolution
//! - [`handlers`] - built-in handlers (code-review pipeline, utilities)
//! - [`graphs`] - definitions, builder, and the immutable graph model
//! - [`runtimes`] - the execution engine, its config, and run outcomes
//! - [`service`] - axum HTTP surface with in-memory graph/run stores

pub mod condition;
pub mod graphs;
pub mod handler;
pub mod handlers;
pub mod registry;
pub mod runtimes;
pub mod service;
pub mod state;
pub mod telemetry;
