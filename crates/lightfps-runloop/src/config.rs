//! Configuration for the RunLoop.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// RunLoop configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunLoopConfig {
    /// Paint frame cadence in milliseconds.
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,

    /// Upper bound on event/mutation deliveries in one drain before the loop
    /// reports a runaway feedback cycle.
    #[serde(default = "default_microtask_limit")]
    pub microtask_limit: usize,
}

fn default_frame_interval_ms() -> u64 {
    16
}

fn default_microtask_limit() -> usize {
    100_000
}

impl Default for RunLoopConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: default_frame_interval_ms(),
            microtask_limit: default_microtask_limit(),
        }
    }
}

impl RunLoopConfig {
    /// Frame interval, never below one millisecond.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(1))
    }
}
