//! Built-in handler implementations.
//!
//! The code-review pipeline ([`ExtractFunctions`], [`CheckComplexity`],
//! [`DetectIssues`], [`SuggestImprovements`]) plus generic utilities
//! ([`IncrementIteration`], [`PassThrough`], [`LogState`]).
//! [`builtin_registry`] registers all of them under their canonical keys.

mod code_review;
mod util;

pub use code_review::{CheckComplexity, DetectIssues, ExtractFunctions, SuggestImprovements};
pub use util::{IncrementIteration, LogState, PassThrough};

use crate::registry::HandlerRegistry;

/// A registry preloaded with every built-in handler.
///
/// | key | handler |
/// |-----|---------|
/// | `extract_functions` | [`ExtractFunctions`] |
/// | `check_complexity` | [`CheckComplexity`] |
/// | `detect_issues` | [`DetectIssues`] |
/// | `suggest_improvements` | [`SuggestImprovements`] |
/// | `increment_iteration` | [`IncrementIteration`] |
/// | `pass_through` | [`PassThrough`] |
/// | `log_state` | [`LogState`] |
#[must_use]
pub fn builtin_registry() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    registry.register("extract_functions", ExtractFunctions);
    registry.register("check_complexity", CheckComplexity);
    registry.register("detect_issues", DetectIssues);
    registry.register("suggest_improvements", SuggestImprovements);
    registry.register("increment_iteration", IncrementIteration);
    registry.register("pass_through", PassThrough);
    registry.register("log_state", LogState);
    registry
}
