//! Serde-able graph definitions, the wire-facing input shape for builds.

use serde::{Deserialize, Serialize};

/// Tag describing the role of a node in a workflow definition.
///
/// Purely descriptive metadata carried through from the definition; the
/// engine treats every node the same way (execute handler, follow edges).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// A plain computation step.
    #[default]
    Function,
    /// A step that exists to feed a conditional branch.
    Conditional,
    /// A step participating in a loop.
    Loop,
}

/// Definition of one node: a unique name plus the registry key of the
/// handler to execute there.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeDefinition {
    pub name: String,
    /// Handler registry key resolved at build time.
    pub handler: String,
    #[serde(default)]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NodeDefinition {
    /// Shorthand for a `Function` node with no description.
    pub fn new(name: impl Into<String>, handler: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handler: handler.into(),
            kind: NodeKind::Function,
            description: None,
        }
    }
}

/// Definition of one directed edge, optionally guarded by condition text.
///
/// Declaration order is significant: when several outgoing edges of a node
/// are satisfied at once, the engine follows the first declared one.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EdgeDefinition {
    pub source: String,
    pub target: String,
    /// Condition expression text; absent means the edge is always
    /// traversable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

impl EdgeDefinition {
    /// An unconditional edge.
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            condition: None,
        }
    }

    /// An edge guarded by condition text.
    pub fn when(
        source: impl Into<String>,
        target: impl Into<String>,
        condition: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            condition: Some(condition.into()),
        }
    }
}

/// A complete workflow graph definition, ready to build.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GraphDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub nodes: Vec<NodeDefinition>,
    pub edges: Vec<EdgeDefinition>,
    /// Name of the node a run begins at. Existence is checked at run
    /// time, not build time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_node: Option<String>,
    /// Names of nodes whose reach ends a run successfully.
    #[serde(default)]
    pub terminal_nodes: Vec<String>,
}
