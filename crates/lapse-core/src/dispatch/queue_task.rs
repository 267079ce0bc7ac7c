//! QueueTask: FIFO queue + one worker.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use super::handler::TaskHandler;
use super::options::QueueTaskOptions;
use super::state::{Counters, DispatcherState, DispatcherStats};
use crate::container::{FetchVerdict, Queue};
use crate::error::{HandlerError, LapseError};

struct Shared<T: Send + 'static> {
    queue: Queue<T>,
    handler: Arc<dyn TaskHandler<T>>,
    policy: Mutex<QueueTaskOptions>,
    /// post の受付と stop() を直列化する
    admission: Mutex<()>,
    interrupted: AtomicBool,
    notify: Notify,
    state: watch::Sender<DispatcherState>,
    shutdown: watch::Sender<bool>,
    counters: Counters,
}

impl<T: Send + 'static> Shared<T> {
    fn set_state(&self, next: DispatcherState) {
        self.state.send_if_modified(|state| {
            if *state == next {
                return false;
            }
            *state = next;
            true
        });
    }

    fn is_stopped(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Run the handler in its own task so a panic cannot take the worker down.
    async fn execute(&self, item: T) -> Result<(), HandlerError> {
        let handler = Arc::clone(&self.handler);
        match tokio::spawn(async move { handler.execute(item).await }).await {
            Ok(result) => result,
            Err(join_err) => Err(format!("handler aborted: {join_err}").into()),
        }
    }
}

/// Sequential task dispatcher.
///
/// Payloads posted to a `QueueTask` are handed to its [`TaskHandler`] one at a time, in
/// the order they were appended. The single worker is spawned by [`QueueTask::new`] and
/// lives until [`QueueTask::stop`] (or until the `QueueTask` is dropped); it parks while
/// the queue is empty and never exits just because it observed an empty queue.
///
/// Must be created inside a tokio runtime.
pub struct QueueTask<T: Send + 'static> {
    shared: Arc<Shared<T>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Send + 'static> QueueTask<T> {
    pub fn new(handler: Arc<dyn TaskHandler<T>>, options: QueueTaskOptions) -> Self {
        let (state, _) = watch::channel(DispatcherState::Idle);
        let (shutdown, shutdown_rx) = watch::channel(false);
        let shared = Arc::new(Shared {
            queue: Queue::new(),
            handler,
            policy: Mutex::new(options),
            admission: Mutex::new(()),
            interrupted: AtomicBool::new(false),
            notify: Notify::new(),
            state,
            shutdown,
            counters: Counters::default(),
        });

        let worker = tokio::spawn(worker_loop(Arc::clone(&shared), shutdown_rx));

        Self {
            shared,
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Append a payload and wake the worker.
    ///
    /// `max_depth == 0` means unbounded. Otherwise the payload is rejected with
    /// [`LapseError::QueueFull`] when the queue already holds more than `max_depth`
    /// pending payloads; a rejected payload is dropped and never executed.
    ///
    /// Posting and [`QueueTask::stop`] are ordered: a post that starts after `stop()` has
    /// returned fails with [`LapseError::DispatcherStopped`]. A payload accepted before
    /// the stop is pending like any other, and `stop()` leaves pending payloads unexecuted.
    pub fn post(&self, payload: impl Into<Option<T>>, max_depth: usize) -> Result<(), LapseError> {
        let payload = payload.into().ok_or(LapseError::InvalidPayload)?;

        let pushed = {
            let _admission = self.shared.admission.lock();
            if self.shared.is_stopped() {
                return Err(LapseError::DispatcherStopped);
            }
            self.shared.queue.push_bounded(payload, max_depth)
        };
        if let Err((_rejected, depth)) = pushed {
            Counters::bump(&self.shared.counters.rejected, 1);
            return Err(LapseError::QueueFull { depth, max_depth });
        }

        Counters::bump(&self.shared.counters.posted, 1);
        self.shared.notify.notify_one();
        Ok(())
    }

    /// Remove pending payloads chosen by `predicate`. Returns how many were removed.
    ///
    /// The payload currently being executed is not in the queue and cannot be cancelled.
    pub fn cancel<F>(&self, predicate: F) -> usize
    where
        F: FnMut(&T) -> FetchVerdict,
    {
        let removed = self.shared.queue.fetch(predicate).len();
        if removed > 0 {
            Counters::bump(&self.shared.counters.cancelled, removed as u64);
            debug!(removed, "cancelled pending payloads");
        }
        removed
    }

    pub fn set_interrupt(&self, interrupt_on_error: bool) {
        self.shared.policy.lock().interrupt_on_error = interrupt_on_error;
    }

    pub fn set_interval(&self, interval: std::time::Duration) {
        self.shared.policy.lock().interval = interval;
    }

    pub fn options(&self) -> QueueTaskOptions {
        *self.shared.policy.lock()
    }

    /// Re-arm a dispatcher halted by `interrupt_on_error`. No-op otherwise.
    pub fn resume(&self) {
        if self.shared.interrupted.swap(false, Ordering::SeqCst) && !self.shared.is_stopped() {
            debug!(pending = self.shared.queue.len(), "dispatcher resumed");
            self.shared.set_state(DispatcherState::Idle);
            self.shared.notify.notify_one();
        }
    }

    pub fn len(&self) -> usize {
        self.shared.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.queue.is_empty()
    }

    pub fn state(&self) -> DispatcherState {
        *self.shared.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<DispatcherState> {
        self.shared.state.subscribe()
    }

    pub fn stats(&self) -> DispatcherStats {
        self.shared.counters.snapshot(self.shared.queue.len())
    }

    /// Wait until the worker is idle with nothing pending, or interrupted, or stopped.
    pub async fn drained(&self) {
        let mut rx = self.shared.state.subscribe();
        loop {
            // queue を先に見る: worker は pop の前に Running へ遷移する
            let empty = self.shared.queue.is_empty();
            let state = *rx.borrow_and_update();
            match state {
                s if s.is_terminal() => return,
                DispatcherState::Interrupted => return,
                DispatcherState::Idle if empty => return,
                _ => {}
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }

    /// Stop the worker. Pending payloads are left unexecuted; an in-flight handler
    /// call runs to completion. Idempotent.
    pub fn stop(&self) {
        let was_stopped = {
            let _admission = self.shared.admission.lock();
            self.shared.shutdown.send_replace(true)
        };
        if !was_stopped {
            debug!(pending = self.shared.queue.len(), "dispatcher stopping");
        }
    }

    /// Stop and wait for the worker task to exit.
    pub async fn shutdown_and_join(&self) {
        self.stop();
        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            let _ = worker.await;
        }
    }
}

impl<T: Send + 'static> Drop for QueueTask<T> {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn worker_loop<T: Send + 'static>(
    shared: Arc<Shared<T>>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    debug!("dispatcher worker started");
    loop {
        // shutdown が来ていたら抜ける
        if *shutdown_rx.borrow_and_update() {
            break;
        }

        let interrupted = shared.interrupted.load(Ordering::SeqCst);
        if interrupted || shared.queue.is_empty() {
            shared.set_state(if interrupted {
                DispatcherState::Interrupted
            } else {
                DispatcherState::Idle
            });
            // post の通知は permit として残るので、ここで取りこぼすことはない
            tokio::select! {
                _ = shared.notify.notified() => {}
                _ = shutdown_rx.changed() => {}
            }
            continue;
        }

        shared.set_state(DispatcherState::Running);
        let Ok(item) = shared.queue.pop() else {
            // cancel() raced us to the last item
            continue;
        };
        let policy = *shared.policy.lock();

        match shared.execute(item).await {
            Ok(()) => {
                Counters::bump(&shared.counters.executed, 1);
                trace!("payload executed");
            }
            Err(err) => {
                Counters::bump(&shared.counters.failed, 1);
                warn!(error = %err, "task handler failed");
                shared.handler.on_failure(&err);
                if policy.interrupt_on_error {
                    shared.interrupted.store(true, Ordering::SeqCst);
                    info!(
                        pending = shared.queue.len(),
                        "dispatcher interrupted after handler failure"
                    );
                    continue;
                }
            }
        }

        if !policy.interval.is_zero() {
            tokio::select! {
                _ = tokio::time::sleep(policy.interval) => {}
                _ = shutdown_rx.changed() => {}
            }
        }
    }

    shared.set_state(DispatcherState::Stopped);
    debug!("dispatcher worker stopped");
}
