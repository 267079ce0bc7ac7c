//! Scheduled entries and their snapshots.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{error, trace};

use crate::ids::TimerId;

/// What to run when a timer fires.
pub(crate) enum Action {
    /// Sync closure; runs on the blocking pool so it may block freely.
    Blocking(Box<dyn FnOnce() + Send + 'static>),

    /// Future; spawned on the runtime.
    Future(Pin<Box<dyn Future<Output = ()> + Send + 'static>>),
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Blocking(_) => f.write_str("Action::Blocking"),
            Action::Future(_) => f.write_str("Action::Future"),
        }
    }
}

/// One pending timer living in a wheel slot.
#[derive(Debug)]
pub(crate) struct ScheduledTask {
    pub id: TimerId,
    /// Full sweeps past its slot still to wait through.
    pub remaining_cycles: u64,
    pub scheduled_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
    pub action: Action,
}

impl ScheduledTask {
    /// Fire-and-forget. A panic inside the action is logged and goes no further.
    pub fn fire(self) {
        let id = self.id;
        trace!(timer = %id, "timer fired");
        let handle = match self.action {
            Action::Blocking(f) => tokio::task::spawn_blocking(f),
            Action::Future(fut) => tokio::spawn(fut),
        };
        tokio::spawn(report_panic(id, handle));
    }

    pub fn snapshot(&self, slot: usize) -> PendingTimer {
        PendingTimer {
            id: self.id,
            slot,
            remaining_cycles: self.remaining_cycles,
            scheduled_at: self.scheduled_at,
            due_at: self.due_at,
        }
    }
}

async fn report_panic(id: TimerId, handle: JoinHandle<()>) {
    if let Err(err) = handle.await
        && err.is_panic()
    {
        error!(timer = %id, "timer action panicked");
    }
}

/// Serializable view of a pending timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTimer {
    pub id: TimerId,
    pub slot: usize,
    pub remaining_cycles: u64,
    pub scheduled_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
}

/// Snapshot of wheel counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WheelStats {
    pub running: bool,
    pub current_index: usize,
    pub pending: usize,
    pub scheduled: u64,
    pub fired: u64,
    pub cancelled: u64,
    pub discarded: u64,
}
