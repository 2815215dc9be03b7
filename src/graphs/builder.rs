//! Graph construction: fluent builder plus definition-driven builds.

use miette::Diagnostic;
use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

use super::definition::{EdgeDefinition, GraphDefinition, NodeDefinition, NodeKind};
use super::model::{Edge, Graph, GraphNode};
use crate::condition::{Condition, ConditionError};
use crate::registry::HandlerRegistry;

/// Errors that abort a graph build.
///
/// A build either produces a complete [`Graph`] or one of these; no
/// partial graph ever escapes.
#[derive(Debug, Error, Diagnostic)]
pub enum BuildError {
    /// A node's handler key did not resolve against the registry.
    #[error("handler '{handler}' for node '{node}' not found in registry")]
    #[diagnostic(
        code(stepweave::build::handler_not_found),
        help("Register the handler before building, or fix the handler key in the definition.")
    )]
    HandlerNotFound { node: String, handler: String },

    /// An edge condition failed to compile.
    #[error("invalid condition on edge '{from}' -> '{to}': {cause}")]
    #[diagnostic(code(stepweave::build::invalid_condition))]
    InvalidCondition {
        from: String,
        to: String,
        #[source]
        cause: ConditionError,
    },
}

/// Fluent builder assembling a [`Graph`] from node and edge definitions.
///
/// Handler keys are resolved and condition text compiled only when
/// [`build`](Self::build) runs, so a builder can be populated in any
/// order. The build fails fast on the first unresolved handler or
/// malformed condition.
///
/// # Examples
///
/// ```rust
/// use stepweave::graphs::GraphBuilder;
/// use stepweave::handlers::builtin_registry;
///
/// let registry = builtin_registry();
/// let graph = GraphBuilder::new("review")
///     .add_node("extract", "extract_functions")
///     .add_node("complexity", "check_complexity")
///     .add_node("end", "pass_through")
///     .add_edge("extract", "complexity")
///     .add_edge_when("complexity", "end", "average_complexity <= 5")
///     .with_start_node("extract")
///     .add_terminal_node("end")
///     .build(&registry)
///     .expect("valid graph");
/// assert_eq!(graph.node_count(), 3);
/// ```
#[derive(Clone, Debug, Default)]
pub struct GraphBuilder {
    name: String,
    description: String,
    nodes: Vec<NodeDefinition>,
    edges: Vec<EdgeDefinition>,
    start_node: Option<String>,
    terminal_nodes: Vec<String>,
}

impl GraphBuilder {
    /// Creates a builder for a graph with the given display name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Adds a function node executing the handler registered under
    /// `handler`.
    #[must_use]
    pub fn add_node(mut self, name: impl Into<String>, handler: impl Into<String>) -> Self {
        self.nodes.push(NodeDefinition::new(name, handler));
        self
    }

    /// Adds a node with an explicit kind tag.
    #[must_use]
    pub fn add_node_kind(
        mut self,
        name: impl Into<String>,
        handler: impl Into<String>,
        kind: NodeKind,
    ) -> Self {
        let mut def = NodeDefinition::new(name, handler);
        def.kind = kind;
        self.nodes.push(def);
        self
    }

    /// Adds an unconditional edge. Declaration order matters: the engine
    /// follows the first satisfied outgoing edge of a node.
    #[must_use]
    pub fn add_edge(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.edges.push(EdgeDefinition::new(source, target));
        self
    }

    /// Adds an edge guarded by a condition expression.
    #[must_use]
    pub fn add_edge_when(
        mut self,
        source: impl Into<String>,
        target: impl Into<String>,
        condition: impl Into<String>,
    ) -> Self {
        self.edges.push(EdgeDefinition::when(source, target, condition));
        self
    }

    #[must_use]
    pub fn with_start_node(mut self, name: impl Into<String>) -> Self {
        self.start_node = Some(name.into());
        self
    }

    #[must_use]
    pub fn add_terminal_node(mut self, name: impl Into<String>) -> Self {
        self.terminal_nodes.push(name.into());
        self
    }

    /// Resolves handlers, compiles conditions, and produces the immutable
    /// graph.
    ///
    /// # Errors
    ///
    /// - [`BuildError::HandlerNotFound`] when any node's handler key is
    ///   not registered.
    /// - [`BuildError::InvalidCondition`] when any edge's condition text
    ///   fails to compile.
    pub fn build(self, registry: &HandlerRegistry) -> Result<Graph, BuildError> {
        let mut nodes: FxHashMap<String, GraphNode> = FxHashMap::default();
        for def in &self.nodes {
            let handler =
                registry
                    .resolve(&def.handler)
                    .ok_or_else(|| BuildError::HandlerNotFound {
                        node: def.name.clone(),
                        handler: def.handler.clone(),
                    })?;
            nodes.insert(
                def.name.clone(),
                GraphNode::new(def.name.clone(), def.kind, handler),
            );
        }

        let mut edges = Vec::with_capacity(self.edges.len());
        for def in &self.edges {
            let condition = match def.condition.as_deref() {
                // Whitespace-only condition text counts as "no condition".
                Some(text) if !text.trim().is_empty() => Some(
                    Condition::compile(text).map_err(|cause| BuildError::InvalidCondition {
                        from: def.source.clone(),
                        to: def.target.clone(),
                        cause,
                    })?,
                ),
                _ => None,
            };
            edges.push(Edge::new(def.source.clone(), def.target.clone(), condition));
        }

        let terminal_nodes: FxHashSet<String> = self.terminal_nodes.into_iter().collect();

        tracing::debug!(
            graph = %self.name,
            nodes = nodes.len(),
            edges = edges.len(),
            "graph built"
        );

        Ok(Graph::new(
            self.name,
            self.description,
            nodes,
            edges,
            self.start_node,
            terminal_nodes,
        ))
    }
}

impl Graph {
    /// Builds a graph straight from a serde-able definition.
    ///
    /// This is the path the HTTP surface uses; it is a thin wrapper over
    /// the fluent builder with identical failure behavior.
    pub fn from_definition(
        definition: &GraphDefinition,
        registry: &HandlerRegistry,
    ) -> Result<Self, BuildError> {
        let mut builder = GraphBuilder::new(definition.name.clone())
            .with_description(definition.description.clone());
        builder.nodes = definition.nodes.clone();
        builder.edges = definition.edges.clone();
        builder.start_node = definition.start_node.clone();
        builder.terminal_nodes = definition.terminal_nodes.clone();
        builder.build(registry)
    }
}
