//! The immutable, executable graph model.

use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use super::definition::NodeKind;
use crate::condition::Condition;
use crate::handler::Handler;

/// A node in a built graph: its name, descriptive kind tag, and the
/// resolved handler to execute.
#[derive(Clone)]
pub struct GraphNode {
    name: String,
    kind: NodeKind,
    handler: Arc<dyn Handler>,
}

impl GraphNode {
    pub(crate) fn new(name: String, kind: NodeKind, handler: Arc<dyn Handler>) -> Self {
        Self {
            name,
            kind,
            handler,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// The handler capability invoked when this node executes.
    #[must_use]
    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }
}

impl std::fmt::Debug for GraphNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphNode")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// A directed edge between two named nodes, optionally guarded by a
/// compiled [`Condition`].
#[derive(Clone, Debug)]
pub struct Edge {
    source: String,
    target: String,
    condition: Option<Condition>,
}

impl Edge {
    pub(crate) fn new(source: String, target: String, condition: Option<Condition>) -> Self {
        Self {
            source,
            target,
            condition,
        }
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    #[must_use]
    pub fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    /// Whether this edge may be followed given the current state.
    ///
    /// An edge with no condition is always traversable; a condition that
    /// fails to evaluate is false (fail-closed), never an error.
    #[must_use]
    pub fn should_traverse(&self, state: &FxHashMap<String, Value>) -> bool {
        self.condition
            .as_ref()
            .is_none_or(|condition| condition.evaluate(state))
    }
}

/// An immutable, executable workflow graph.
///
/// Created once by [`GraphBuilder`](super::GraphBuilder), read-only
/// thereafter. Node lookup order is irrelevant; edge order is the
/// declaration order and drives the engine's first-match tie-break. A
/// `Graph` may be shared (e.g. behind an `Arc`) across any number of
/// concurrent runs without locking, since runs never mutate it.
#[derive(Clone, Debug)]
pub struct Graph {
    id: Uuid,
    name: String,
    description: String,
    nodes: FxHashMap<String, GraphNode>,
    edges: Vec<Edge>,
    start_node: Option<String>,
    terminal_nodes: FxHashSet<String>,
}

impl Graph {
    pub(crate) fn new(
        name: String,
        description: String,
        nodes: FxHashMap<String, GraphNode>,
        edges: Vec<Edge>,
        start_node: Option<String>,
        terminal_nodes: FxHashSet<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            description,
            nodes,
            edges,
            start_node,
            terminal_nodes,
        }
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Looks up a node by name.
    #[must_use]
    pub fn node(&self, name: &str) -> Option<&GraphNode> {
        self.nodes.get(name)
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// All edges, in declaration order.
    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// The edges leaving `source`, preserving declaration order.
    pub fn outgoing<'a>(&'a self, source: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |edge| edge.source() == source)
    }

    /// The configured start node, if any. Whether it names an existing
    /// node is only checked when a run begins.
    #[must_use]
    pub fn start_node(&self) -> Option<&str> {
        self.start_node.as_deref()
    }

    /// Whether `name` is in the terminal set.
    #[must_use]
    pub fn is_terminal(&self, name: &str) -> bool {
        self.terminal_nodes.contains(name)
    }

    #[must_use]
    pub fn terminal_nodes(&self) -> &FxHashSet<String> {
        &self.terminal_nodes
    }
}
