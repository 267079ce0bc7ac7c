use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use lapse_core::{
    DispatcherState, DispatcherStats, HandlerError, LapseError, QueueTask, QueueTaskOptions,
    TaskHandler, TimeWheel, WheelConfig, WheelStats,
};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{info, warn};

/// Logs each job; fails every `fail_every`-th one.
struct JobHandler {
    fail_every: u64,
    failures_seen: AtomicU64,
}

#[async_trait]
impl TaskHandler<u64> for JobHandler {
    async fn execute(&self, job: u64) -> Result<(), HandlerError> {
        if self.fail_every > 0 && job % self.fail_every == 0 {
            return Err(format!("job {job} failed on purpose").into());
        }
        info!(job, "job done");
        Ok(())
    }

    fn on_failure(&self, _error: &HandlerError) {
        self.failures_seen.fetch_add(1, Ordering::Relaxed);
    }
}

#[derive(Serialize)]
struct DispatchReport {
    state: DispatcherState,
    failures_seen: u64,
    stats: DispatcherStats,
}

pub async fn run_dispatch(
    options: QueueTaskOptions,
    count: u64,
    fail_every: u64,
    max_depth: usize,
) -> Result<serde_json::Value> {
    let handler = Arc::new(JobHandler {
        fail_every,
        failures_seen: AtomicU64::new(0),
    });
    let dispatcher = QueueTask::new(handler.clone(), options);

    for job in 1..=count {
        match dispatcher.post(job, max_depth) {
            Ok(()) => {}
            Err(LapseError::QueueFull { depth, max_depth }) => {
                warn!(job, depth, max_depth, "dispatcher full, job dropped");
            }
            Err(err) => return Err(err.into()),
        }
    }

    dispatcher.drained().await;
    let state = dispatcher.state();
    if state == DispatcherState::Interrupted {
        info!(pending = dispatcher.len(), "dispatcher interrupted, leaving the rest");
    }
    let stats = dispatcher.stats();
    dispatcher.shutdown_and_join().await;

    Ok(serde_json::to_value(DispatchReport {
        state,
        failures_seen: handler.failures_seen.load(Ordering::Relaxed),
        stats,
    })?)
}

#[derive(Serialize)]
struct FiredTimer {
    delay_secs: f64,
    fired_after_secs: f64,
}

#[derive(Serialize)]
struct WheelReport {
    config: WheelConfig,
    timers: Vec<FiredTimer>,
    stats: WheelStats,
}

pub async fn run_wheel(config: WheelConfig, delays: &[Duration]) -> Result<serde_json::Value> {
    let wheel = TimeWheel::with_config(config)?;
    wheel.start();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let start = Instant::now();
    for (n, delay) in delays.iter().copied().enumerate() {
        let tx = tx.clone();
        let id = wheel.add_delay_task(delay, n, move |n| {
            let _ = tx.send((n, start.elapsed()));
        })?;
        info!(timer = %id, ?delay, "timer scheduled");
    }
    drop(tx);

    let mut fired = vec![None; delays.len()];
    loop {
        tokio::select! {
            next = rx.recv() => match next {
                Some((n, after)) => fired[n] = Some(after),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                warn!(pending = wheel.pending(), "interrupted, discarding pending timers");
                break;
            }
        }
    }
    wheel.stop();

    let timers = delays
        .iter()
        .zip(fired)
        .filter_map(|(delay, after)| {
            after.map(|after| FiredTimer {
                delay_secs: delay.as_secs_f64(),
                fired_after_secs: after.as_secs_f64(),
            })
        })
        .collect();

    Ok(serde_json::to_value(WheelReport {
        config: wheel.config(),
        timers,
        stats: wheel.stats(),
    })?)
}
