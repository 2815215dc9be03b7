//! The run loop: one active node at a time, from start node to
//! termination.

use chrono::{DateTime, Utc};
use miette::Diagnostic;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::instrument;

use super::config::EngineConfig;
use crate::graphs::Graph;
use crate::state::{StateSnapshot, WorkflowState};

/// One entry in the execution audit trail, appended exactly once per node
/// attempted.
///
/// `state_snapshot` is the state *after* the node's update was merged on
/// success, or as of step start when the handler failed. The timestamp
/// serializes as an ISO-8601 / RFC 3339 string.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExecutionLogEntry {
    pub node_name: String,
    pub timestamp: DateTime<Utc>,
    pub state_snapshot: StateSnapshot,
    pub error: Option<String>,
}

/// Run-time failures. These are always *returned* inside [`RunOutcome`]
/// next to the partial state and log; `run` itself never fails.
#[derive(Clone, Debug, Error, Diagnostic, PartialEq, Eq)]
pub enum RunError {
    /// The graph has no start node configured.
    #[error("no start node defined")]
    #[diagnostic(
        code(stepweave::run::no_start_node),
        help("Set a start node on the graph before running it.")
    )]
    NoStartNode,

    /// The current node name (start node or an edge target) does not
    /// exist in the graph.
    #[error("node '{node}' not found in workflow")]
    #[diagnostic(code(stepweave::run::node_not_found))]
    NodeNotFound { node: String },

    /// A node's handler failed; the run stops with partial results.
    #[error("handler failed at node '{node}': {message}")]
    #[diagnostic(code(stepweave::run::handler))]
    HandlerExecution { node: String, message: String },

    /// The iteration bound tripped, most likely a cycle with no exit.
    #[error("iteration limit of {limit} reached - possible infinite loop")]
    #[diagnostic(
        code(stepweave::run::iteration_limit),
        help("Raise max_iterations or add a terminal node reachable from the cycle.")
    )]
    IterationLimitExceeded { limit: u32 },
}

/// Everything a run produces: the final state snapshot, the ordered
/// execution log, and the run-level error when the run did not succeed.
#[derive(Clone, Debug, Default)]
pub struct RunOutcome {
    pub final_state: StateSnapshot,
    pub log: Vec<ExecutionLogEntry>,
    pub error: Option<RunError>,
}

impl RunOutcome {
    /// Whether the run terminated without a run-level error.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Drives single runs of built graphs.
///
/// The engine is stateless between runs: each call to [`run`](Self::run)
/// constructs a fresh [`WorkflowState`] owned exclusively by that run, so
/// one engine (and one shared `Graph`) can serve any number of concurrent
/// runs. Within a run there is no parallelism: each handler is awaited
/// to completion before the next edge decision.
///
/// # Examples
///
/// ```rust,no_run
/// use stepweave::graphs::GraphBuilder;
/// use stepweave::handlers::builtin_registry;
/// use stepweave::runtimes::ExecutionEngine;
/// use rustc_hash::FxHashMap;
/// use serde_json::json;
///
/// # async fn example() {
/// let registry = builtin_registry();
/// let graph = GraphBuilder::new("count")
///     .add_node("bump", "increment_iteration")
///     .with_start_node("bump")
///     .build(&registry)
///     .unwrap();
///
/// let outcome = ExecutionEngine::new().run(&graph, FxHashMap::default()).await;
/// assert!(outcome.is_success());
/// assert_eq!(outcome.final_state.get("iteration"), Some(&json!(1)));
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct ExecutionEngine {
    config: EngineConfig,
}

impl ExecutionEngine {
    /// Creates an engine with the default configuration
    /// (`max_iterations = 100`).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Runs `graph` from its start node with the given initial state.
    ///
    /// Termination, in the order checked each iteration:
    /// 1. iteration bound reached → [`RunError::IterationLimitExceeded`];
    ///    the current node is *not* executed;
    /// 2. current node unknown → [`RunError::NodeNotFound`];
    /// 3. handler failure → [`RunError::HandlerExecution`];
    /// 4. current node is terminal → success, after its handler ran and
    ///    was logged; its outgoing edges are never evaluated;
    /// 5. no satisfied outgoing edge → success (a dead end counts as
    ///    normal completion).
    ///
    /// When several outgoing edges are satisfied at once, only the first
    /// declared one is followed; the rest are silently not taken.
    #[instrument(skip_all, fields(graph = %graph.name(), graph_id = %graph.id()))]
    pub async fn run(&self, graph: &Graph, initial_state: FxHashMap<String, Value>) -> RunOutcome {
        let Some(start) = graph.start_node() else {
            tracing::warn!("run refused: graph has no start node");
            return RunOutcome {
                final_state: StateSnapshot::default(),
                log: Vec::new(),
                error: Some(RunError::NoStartNode),
            };
        };

        let mut state = WorkflowState::new(initial_state);
        let mut log: Vec<ExecutionLogEntry> = Vec::new();
        let mut current = start.to_string();
        let mut iterations: u32 = 0;

        loop {
            if iterations >= self.config.max_iterations {
                tracing::warn!(
                    iterations,
                    limit = self.config.max_iterations,
                    node = %current,
                    "iteration limit reached"
                );
                return RunOutcome {
                    final_state: state.snapshot(),
                    log,
                    error: Some(RunError::IterationLimitExceeded {
                        limit: self.config.max_iterations,
                    }),
                };
            }

            let Some(node) = graph.node(&current) else {
                tracing::warn!(node = %current, "edge or start node references an undeclared node");
                return RunOutcome {
                    final_state: state.snapshot(),
                    log,
                    error: Some(RunError::NodeNotFound { node: current }),
                };
            };

            // History snapshot captures state *before* this node runs.
            state.save_snapshot();
            tracing::debug!(node = %current, iteration = iterations, "executing node");

            match node.handler().invoke(&state).await {
                Ok(update) => {
                    state.update(update.into_entries());
                    log.push(ExecutionLogEntry {
                        node_name: current.clone(),
                        timestamp: Utc::now(),
                        state_snapshot: state.snapshot(),
                        error: None,
                    });
                }
                Err(err) => {
                    let message = err.to_string();
                    tracing::warn!(node = %current, error = %message, "handler failed; stopping run");
                    // The logged snapshot is the state as of step start:
                    // the failed handler's update was never merged.
                    log.push(ExecutionLogEntry {
                        node_name: current.clone(),
                        timestamp: Utc::now(),
                        state_snapshot: state.snapshot(),
                        error: Some(message.clone()),
                    });
                    return RunOutcome {
                        final_state: state.snapshot(),
                        log,
                        error: Some(RunError::HandlerExecution {
                            node: current,
                            message,
                        }),
                    };
                }
            }

            // A terminal node runs and is logged, but its outgoing edges
            // are never evaluated.
            if graph.is_terminal(&current) {
                tracing::debug!(node = %current, iterations, "terminal node reached");
                return RunOutcome {
                    final_state: state.snapshot(),
                    log,
                    error: None,
                };
            }

            // First satisfied outgoing edge wins, in declaration order.
            // Others are silently not taken; a dead end is success.
            let next = graph
                .outgoing(&current)
                .find(|edge| edge.should_traverse(state.data()))
                .map(|edge| edge.target().to_string());

            match next {
                Some(target) => {
                    tracing::trace!(from = %current, to = %target, "following edge");
                    current = target;
                    iterations += 1;
                }
                None => {
                    tracing::debug!(node = %current, iterations, "no satisfied outgoing edge; run complete");
                    return RunOutcome {
                        final_state: state.snapshot(),
                        log,
                        error: None,
                    };
                }
            }
        }
    }
}
