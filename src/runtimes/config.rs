use serde::{Deserialize, Serialize};

/// Configuration for a single engine run.
///
/// The iteration bound is the engine's only cancellation mechanism: a
/// graph cycle with no path to a terminal node terminates through it
/// rather than spinning forever.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum number of node executions before the run is stopped with
    /// an iteration-limit error.
    pub max_iterations: u32,
}

impl EngineConfig {
    pub const DEFAULT_MAX_ITERATIONS: u32 = 100;

    #[must_use]
    pub fn new(max_iterations: u32) -> Self {
        Self { max_iterations }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_iterations: Self::DEFAULT_MAX_ITERATIONS,
        }
    }
}
