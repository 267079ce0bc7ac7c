//! TimeWheel: hashed timing wheel driven by a tokio interval.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, trace};

use super::config::WheelConfig;
use super::slots::Slots;
use super::task::{Action, PendingTimer, ScheduledTask, WheelStats};
use crate::error::{ConfigError, LapseError};
use crate::ids::TimerId;
use crate::ports::{Clock, IdGenerator, SystemClock, UlidGenerator};

struct WheelState {
    slots: Slots,
    running: bool,
}

#[derive(Default)]
struct WheelCounters {
    scheduled: AtomicU64,
    fired: AtomicU64,
    cancelled: AtomicU64,
    discarded: AtomicU64,
}

struct Inner {
    config: WheelConfig,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    state: Mutex<WheelState>,
    counters: WheelCounters,
}

impl Inner {
    /// One tick. Due actions are dispatched after the lock is released.
    fn advance(&self) {
        let due = {
            let mut state = self.state.lock();
            if !state.running {
                return;
            }
            state.slots.tick()
        };
        if due.is_empty() {
            return;
        }
        self.counters
            .fired
            .fetch_add(due.len() as u64, Ordering::Relaxed);
        for task in due {
            task.fire();
        }
    }

    fn schedule(&self, delay: Duration, action: Action) -> Result<TimerId, LapseError> {
        if delay.is_zero() {
            return Err(LapseError::InvalidDelay(delay));
        }
        let ticks = self.config.ticks_for(delay);
        let id = self.ids.generate_timer_id();
        let scheduled_at = self.clock.now();
        let task = ScheduledTask {
            id,
            remaining_cycles: 0,
            scheduled_at,
            due_at: due_at(scheduled_at, delay),
            action,
        };

        let slot = self.state.lock().slots.insert(task, ticks);
        self.counters.scheduled.fetch_add(1, Ordering::Relaxed);
        trace!(timer = %id, ?delay, ticks, slot, "timer scheduled");
        Ok(id)
    }
}

fn due_at(from: DateTime<Utc>, delay: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(delay)
        .ok()
        .and_then(|delta| from.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

struct Ticker {
    shutdown: watch::Sender<bool>,
    _handle: JoinHandle<()>,
}

async fn tick_loop(inner: Arc<Inner>, mut shutdown: watch::Receiver<bool>) {
    let tick = inner.config.tick;
    let mut interval = tokio::time::interval_at(Instant::now() + tick, tick);
    // 取りこぼした tick をまとめて回すと、停止中に入った timer が早く発火する
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = interval.tick() => inner.advance(),
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
    trace!("wheel ticker exited");
}

/// Hashed timing wheel.
///
/// `slot_count` slots are swept one per `tick`. A timer of `delay` lands
/// `ceil(delay / tick)` slots ahead of the cursor and carries the number of full sweeps it
/// still has to wait through. A timer never fires before its delay and fires at most one
/// tick after it (for whole-tick delays). If the runtime stalls, missed ticks are not
/// replayed back to back; the sweep resumes at the normal pace, so timers only run late.
///
/// Timers only advance while the wheel is started; [`TimeWheel::start`] must be called
/// inside a tokio runtime.
pub struct TimeWheel {
    inner: Arc<Inner>,
    ticker: Mutex<Option<Ticker>>,
}

impl TimeWheel {
    /// One hour of one-second slots, system clock.
    pub fn new() -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let ids = Arc::new(UlidGenerator::new(Arc::clone(&clock)));
        Self::build(WheelConfig::default(), clock, ids)
    }

    pub fn with_config(config: WheelConfig) -> Result<Self, ConfigError> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let ids = Arc::new(UlidGenerator::new(Arc::clone(&clock)));
        Self::with_ports(config, clock, ids)
    }

    pub fn with_ports(
        config: WheelConfig,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config, clock, ids))
    }

    fn build(config: WheelConfig, clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                clock,
                ids,
                state: Mutex::new(WheelState {
                    slots: Slots::new(config.slot_count),
                    running: false,
                }),
                counters: WheelCounters::default(),
            }),
            ticker: Mutex::new(None),
        }
    }

    pub fn config(&self) -> WheelConfig {
        self.inner.config
    }

    /// Schedule `action(payload)` to run once after `delay`.
    ///
    /// The action runs on the blocking pool, so it may block without stalling the ticker.
    pub fn add_delay_task<P, F>(
        &self,
        delay: Duration,
        payload: P,
        action: F,
    ) -> Result<TimerId, LapseError>
    where
        P: Send + 'static,
        F: FnOnce(P) + Send + 'static,
    {
        self.inner
            .schedule(delay, Action::Blocking(Box::new(move || action(payload))))
    }

    /// Schedule a future to be spawned once after `delay`.
    pub fn add_delay_future<Fut>(&self, delay: Duration, fut: Fut) -> Result<TimerId, LapseError>
    where
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.inner.schedule(delay, Action::Future(Box::pin(fut)))
    }

    /// Remove a pending timer. Returns false if it already fired or was never scheduled.
    pub fn cancel(&self, id: TimerId) -> bool {
        let removed = self.inner.state.lock().slots.remove(id).is_some();
        if removed {
            self.inner.counters.cancelled.fetch_add(1, Ordering::Relaxed);
            trace!(timer = %id, "timer cancelled");
        }
        removed
    }

    /// Start ticking. Idempotent.
    pub fn start(&self) {
        let mut ticker = self.ticker.lock();
        if ticker.is_some() {
            return;
        }
        self.inner.state.lock().running = true;

        let (shutdown, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(tick_loop(Arc::clone(&self.inner), shutdown_rx));
        *ticker = Some(Ticker {
            shutdown,
            _handle: handle,
        });
        debug!(
            slot_count = self.inner.config.slot_count,
            tick = ?self.inner.config.tick,
            "wheel started"
        );
    }

    /// Stop ticking and discard every pending timer. Idempotent.
    pub fn stop(&self) {
        if let Some(ticker) = self.ticker.lock().take() {
            ticker.shutdown.send_replace(true);
        }
        let discarded = {
            let mut state = self.inner.state.lock();
            state.running = false;
            state.slots.clear()
        };
        if discarded > 0 {
            self.inner
                .counters
                .discarded
                .fetch_add(discarded as u64, Ordering::Relaxed);
            debug!(discarded, "wheel stopped, pending timers discarded");
        }
    }

    pub fn is_running(&self) -> bool {
        self.inner.state.lock().running
    }

    pub fn pending(&self) -> usize {
        self.inner.state.lock().slots.len()
    }

    /// Pending timers ordered by due time.
    pub fn pending_timers(&self) -> Vec<PendingTimer> {
        self.inner.state.lock().slots.snapshot()
    }

    pub fn stats(&self) -> WheelStats {
        let (running, current_index, pending) = {
            let state = self.inner.state.lock();
            (state.running, state.slots.current(), state.slots.len())
        };
        let counters = &self.inner.counters;
        WheelStats {
            running,
            current_index,
            pending,
            scheduled: counters.scheduled.load(Ordering::Relaxed),
            fired: counters.fired.load(Ordering::Relaxed),
            cancelled: counters.cancelled.load(Ordering::Relaxed),
            discarded: counters.discarded.load(Ordering::Relaxed),
        }
    }
}

impl Default for TimeWheel {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TimeWheel {
    fn drop(&mut self) {
        self.stop();
    }
}
