//! Handler resolution registry.
//!
//! The registry is the explicit collaborator the graph builder resolves
//! handler keys against. It is an ordinary value, not a process-wide
//! singleton: construct one, register handlers, and hand it (usually
//! behind an `Arc`) to whoever builds graphs.

use rustc_hash::FxHashMap;
use std::sync::Arc;

use crate::handler::Handler;

/// Name → handler lookup used during graph construction.
///
/// Registration replaces silently; resolution of an unknown key returns
/// `None` and it is the builder's job to turn that into a build error.
///
/// # Examples
///
/// ```rust
/// use stepweave::registry::HandlerRegistry;
/// use stepweave::handlers::PassThrough;
///
/// let mut registry = HandlerRegistry::new();
/// registry.register("pass_through", PassThrough);
/// assert!(registry.resolve("pass_through").is_some());
/// assert!(registry.resolve("unknown").is_none());
/// ```
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: FxHashMap<String, Arc<dyn Handler>>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler under `name`, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, handler: impl Handler + 'static) {
        self.handlers.insert(name.into(), Arc::new(handler));
    }

    /// Registers an already-shared handler under `name`.
    pub fn register_arc(&mut self, name: impl Into<String>, handler: Arc<dyn Handler>) {
        self.handlers.insert(name.into(), handler);
    }

    /// Resolves `name` to a handler, if one is registered.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn Handler>> {
        self.handlers.get(name).cloned()
    }

    /// Removes a handler. Returns `true` if it was present.
    pub fn unregister(&mut self, name: &str) -> bool {
        self.handlers.remove(name).is_some()
    }

    /// All registered handler names, sorted for stable listings.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether the registry has no handlers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.names())
            .finish()
    }
}
