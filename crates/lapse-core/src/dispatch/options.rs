//! Dispatcher policy.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Per-dispatcher policy. Can be changed at runtime through
/// `QueueTask::set_interrupt` / `QueueTask::set_interval`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueTaskOptions {
    /// Stop processing after the first handler failure, until `resume()`.
    pub interrupt_on_error: bool,

    /// Pause between two consecutive handler invocations.
    #[serde(rename = "interval_ms", with = "crate::config::duration_ms")]
    pub interval: Duration,
}

impl QueueTaskOptions {
    pub fn with_interrupt_on_error(mut self, interrupt: bool) -> Self {
        self.interrupt_on_error = interrupt;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}
