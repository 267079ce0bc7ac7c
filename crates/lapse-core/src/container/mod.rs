//! Container module: lock-protected FIFO/LIFO sequences.
//!
//! Both containers own exactly one lock. Every operation takes it for the
//! duration of the call and never hands out references to the internal storage,
//! so `len()` is only ever a snapshot.

mod queue;
mod stack;

pub use queue::Queue;
pub use stack::Stack;

/// Verdict returned by a [`Queue::fetch`] callback for each visited element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchVerdict {
    /// Leave the element in place and keep scanning.
    Keep,

    /// Remove the element and keep scanning.
    RemoveContinue,

    /// Remove the element and stop the scan.
    RemoveStop,

    /// Leave the element in place and stop the scan.
    Stop,
}

impl FetchVerdict {
    /// Does this verdict remove the visited element?
    pub fn removes(self) -> bool {
        matches!(self, FetchVerdict::RemoveContinue | FetchVerdict::RemoveStop)
    }

    /// Does this verdict end the scan?
    pub fn stops(self) -> bool {
        matches!(self, FetchVerdict::RemoveStop | FetchVerdict::Stop)
    }
}
