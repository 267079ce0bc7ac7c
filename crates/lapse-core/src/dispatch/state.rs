//! Dispatcher state machine and counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Dispatcher state.
///
/// State transitions:
/// - Idle -> Running -> Idle (one handler invocation)
/// - Running -> Interrupted (failure with `interrupt_on_error`), Interrupted -> Idle on `resume()`
/// - any -> Stopped (after `stop()`, terminal)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatcherState {
    /// Worker is parked, waiting for a post.
    Idle,

    /// Worker is executing exactly one payload.
    Running,

    /// Worker halted after a failure; pending payloads wait for `resume()`.
    Interrupted,

    /// Worker has exited.
    Stopped,
}

impl DispatcherState {
    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(self, DispatcherState::Stopped)
    }
}

/// Snapshot of dispatcher counters, for logs and status output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatcherStats {
    pub posted: u64,
    pub rejected: u64,
    pub executed: u64,
    pub failed: u64,
    pub cancelled: u64,
    pub pending: usize,
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub posted: AtomicU64,
    pub rejected: AtomicU64,
    pub executed: AtomicU64,
    pub failed: AtomicU64,
    pub cancelled: AtomicU64,
}

impl Counters {
    pub fn bump(counter: &AtomicU64, by: u64) {
        counter.fetch_add(by, Ordering::Relaxed);
    }

    pub fn snapshot(&self, pending: usize) -> DispatcherStats {
        DispatcherStats {
            posted: self.posted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            executed: self.executed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            pending,
        }
    }
}
