//! Workflow graph definition, model, and construction.
//!
//! A graph starts life as a serde-able [`GraphDefinition`] (or as calls on
//! the fluent [`GraphBuilder`]), gets its handler keys resolved against a
//! [`HandlerRegistry`](crate::registry::HandlerRegistry), and compiles into
//! an immutable [`Graph`] that the execution engine can run. Builds fail
//! fast: an unresolved handler or a malformed edge condition aborts the
//! whole build and no partial graph is produced.

mod builder;
mod definition;
mod model;

pub use builder::{BuildError, GraphBuilder};
pub use definition::{EdgeDefinition, GraphDefinition, NodeDefinition, NodeKind};
pub use model::{Edge, Graph, GraphNode};
