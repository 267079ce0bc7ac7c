//! Slot ring. Pure data, no runtime.
//!
//! `current` は次の tick で処理される slot を指す。
//! tick は current の slot を処理してから 1 つ進める。

use std::collections::{HashMap, VecDeque};

use super::task::{PendingTimer, ScheduledTask};
use crate::ids::TimerId;

#[derive(Debug)]
pub(crate) struct Slots {
    ring: Vec<VecDeque<ScheduledTask>>,
    current: usize,
    /// TimerId -> slot index, for cancel.
    index: HashMap<TimerId, usize>,
}

impl Slots {
    pub fn new(slot_count: usize) -> Self {
        let mut ring = Vec::with_capacity(slot_count);
        ring.resize_with(slot_count.max(1), VecDeque::new);
        Self {
            ring,
            current: 0,
            index: HashMap::new(),
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Place `task` so that it fires on the `ticks + 1`-th tick from now.
    /// Returns the slot it landed in.
    pub fn insert(&mut self, mut task: ScheduledTask, ticks: u64) -> usize {
        let n = self.ring.len() as u64;
        let slot = ((self.current as u64 + ticks % n) % n) as usize;
        task.remaining_cycles = ticks / n;
        self.index.insert(task.id, slot);
        self.ring[slot].push_back(task);
        slot
    }

    pub fn remove(&mut self, id: TimerId) -> Option<ScheduledTask> {
        let slot = self.index.remove(&id)?;
        let bucket = &mut self.ring[slot];
        let pos = bucket.iter().position(|task| task.id == id)?;
        bucket.remove(pos)
    }

    /// One tick: take every due task from the current slot, age the rest, advance.
    /// Due tasks come back in insertion order.
    pub fn tick(&mut self) -> Vec<ScheduledTask> {
        let bucket = &mut self.ring[self.current];
        let mut due = Vec::new();
        let mut keep = VecDeque::with_capacity(bucket.len());
        for mut task in bucket.drain(..) {
            if task.remaining_cycles == 0 {
                due.push(task);
            } else {
                task.remaining_cycles -= 1;
                keep.push_back(task);
            }
        }
        *bucket = keep;
        for task in &due {
            self.index.remove(&task.id);
        }
        self.current = (self.current + 1) % self.ring.len();
        due
    }

    /// Drop everything. Returns how many tasks were discarded.
    pub fn clear(&mut self) -> usize {
        let discarded = self.index.len();
        for bucket in &mut self.ring {
            bucket.clear();
        }
        self.index.clear();
        discarded
    }

    pub fn snapshot(&self) -> Vec<PendingTimer> {
        let mut out: Vec<PendingTimer> = self
            .ring
            .iter()
            .enumerate()
            .flat_map(|(slot, bucket)| bucket.iter().map(move |task| task.snapshot(slot)))
            .collect();
        out.sort_by(|a, b| a.due_at.cmp(&b.due_at).then(a.id.cmp(&b.id)));
        out
    }
}
