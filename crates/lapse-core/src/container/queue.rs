//! FIFO queue.

use std::collections::VecDeque;

use parking_lot::Mutex;

use super::FetchVerdict;
use crate::error::LapseError;

/// Thread-safe FIFO queue.
///
/// `push` appends to the back, `pop` takes from the front. Passing `None` to
/// `push` is a no-op, which stands in for the "empty item" sentinel.
#[derive(Debug)]
pub struct Queue<T> {
    items: Mutex<VecDeque<T>>,
}

impl<T> Queue<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
        }
    }

    /// Append an item to the back. `None` is ignored.
    pub fn push(&self, item: impl Into<Option<T>>) {
        if let Some(item) = item.into() {
            self.items.lock().push_back(item);
        }
    }

    /// Append an item unless the queue already holds more than `max_depth` items.
    ///
    /// The check and the append happen under one lock acquisition. `max_depth == 0`
    /// means unbounded. Returns the new length, or hands the item back together with the
    /// length that caused the rejection.
    pub fn push_bounded(&self, item: T, max_depth: usize) -> Result<usize, (T, usize)> {
        let mut items = self.items.lock();
        if max_depth > 0 && items.len() > max_depth {
            return Err((item, items.len()));
        }
        items.push_back(item);
        Ok(items.len())
    }

    /// Remove and return the front item.
    pub fn pop(&self) -> Result<T, LapseError> {
        self.items
            .lock()
            .pop_front()
            .ok_or(LapseError::EmptyContainer)
    }

    /// Remove every element.
    pub fn clear(&self) {
        self.items.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Scan front to back under the lock, letting `callback` decide per element.
    ///
    /// The lock is held for the whole scan: the callback must be cheap and must not
    /// touch this queue again (that would deadlock). Removed elements are returned
    /// in scan order.
    pub fn fetch<F>(&self, mut callback: F) -> Vec<T>
    where
        F: FnMut(&T) -> FetchVerdict,
    {
        let mut items = self.items.lock();
        let mut removed = Vec::new();
        let mut i = 0;
        while i < items.len() {
            let verdict = callback(&items[i]);
            if verdict.removes() {
                // remove(i) は範囲内なので必ず Some
                if let Some(item) = items.remove(i) {
                    removed.push(item);
                }
            } else {
                i += 1;
            }
            if verdict.stops() {
                break;
            }
        }
        removed
    }
}

impl<T: Clone> Queue<T> {
    /// Return a clone of the front item without removing it.
    pub fn peek(&self) -> Result<T, LapseError> {
        self.items
            .lock()
            .front()
            .cloned()
            .ok_or(LapseError::EmptyContainer)
    }
}

impl<T> Default for Queue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn drain<T>(queue: &Queue<T>) -> Vec<T> {
        let mut out = Vec::new();
        while let Ok(item) = queue.pop() {
            out.push(item);
        }
        out
    }

    #[test]
    fn pops_in_push_order() {
        let queue: Queue<i32> = Queue::new();
        for i in 0..5 {
            queue.push(i);
        }
        assert_eq!(queue.len(), 5);
        assert_eq!(drain(&queue), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn none_is_ignored() {
        let queue: Queue<&str> = Queue::new();
        queue.push(None);
        queue.push("a");
        queue.push(None);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.pop(), Ok("a"));
    }

    #[test]
    fn empty_queue_reports_empty_container() {
        let queue: Queue<u32> = Queue::new();
        assert_eq!(queue.pop(), Err(LapseError::EmptyContainer));
        assert_eq!(queue.peek(), Err(LapseError::EmptyContainer));

        queue.push(1);
        queue.pop().unwrap();
        assert_eq!(queue.pop(), Err(LapseError::EmptyContainer));
        assert_eq!(queue.peek(), Err(LapseError::EmptyContainer));
    }

    #[test]
    fn peek_does_not_remove() {
        let queue: Queue<String> = Queue::new();
        queue.push("first".to_string());
        queue.push("second".to_string());
        assert_eq!(queue.peek().unwrap(), "first");
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop().unwrap(), "first");
    }

    #[test]
    fn clear_is_idempotent() {
        let queue: Queue<i32> = Queue::new();
        queue.push(1);
        queue.push(2);
        queue.clear();
        assert!(queue.is_empty());
        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.pop(), Err(LapseError::EmptyContainer));
    }

    #[test]
    fn push_bounded_rejects_when_depth_exceeded() {
        let queue: Queue<i32> = Queue::new();
        assert_eq!(queue.push_bounded(1, 1), Ok(1));
        // len (1) does not exceed 1 yet
        assert_eq!(queue.push_bounded(2, 1), Ok(2));
        assert_eq!(queue.push_bounded(3, 1), Err((3, 2)));
        assert_eq!(drain(&queue), vec![1, 2]);
    }

    #[test]
    fn push_bounded_zero_is_unbounded() {
        let queue: Queue<i32> = Queue::new();
        for i in 0..100 {
            assert!(queue.push_bounded(i, 0).is_ok());
        }
        assert_eq!(queue.len(), 100);
    }

    #[test]
    fn fetch_remove_continue_removes_all_matches() {
        let queue: Queue<i32> = Queue::new();
        for i in 0..10 {
            queue.push(i);
        }
        let removed = queue.fetch(|n| {
            if n % 2 == 0 {
                FetchVerdict::RemoveContinue
            } else {
                FetchVerdict::Keep
            }
        });
        assert_eq!(removed, vec![0, 2, 4, 6, 8]);
        assert_eq!(drain(&queue), vec![1, 3, 5, 7, 9]);
    }

    #[test]
    fn fetch_remove_stop_removes_first_match_only() {
        let queue: Queue<&str> = Queue::new();
        for s in ["a", "b", "c", "b"] {
            queue.push(s);
        }
        let removed = queue.fetch(|s| {
            if *s == "b" {
                FetchVerdict::RemoveStop
            } else {
                FetchVerdict::Keep
            }
        });
        assert_eq!(removed, vec!["b"]);
        assert_eq!(drain(&queue), vec!["a", "c", "b"]);
    }

    #[test]
    fn fetch_stop_leaves_remaining_elements_unvisited() {
        let queue: Queue<i32> = Queue::new();
        for i in 0..5 {
            queue.push(i);
        }
        let mut visited = Vec::new();
        let removed = queue.fetch(|n| {
            visited.push(*n);
            if *n == 2 {
                FetchVerdict::Stop
            } else {
                FetchVerdict::Keep
            }
        });
        assert!(removed.is_empty());
        assert_eq!(visited, vec![0, 1, 2]);
        assert_eq!(queue.len(), 5);
    }

    #[test]
    fn fetch_on_empty_queue_visits_nothing() {
        let queue: Queue<u8> = Queue::new();
        let mut calls = 0;
        let removed = queue.fetch(|_| {
            calls += 1;
            FetchVerdict::RemoveContinue
        });
        assert!(removed.is_empty());
        assert_eq!(calls, 0);
    }

    #[test]
    fn concurrent_producers_lose_nothing() {
        let queue: Arc<Queue<(i32, i32)>> = Arc::new(Queue::new());
        let handles: Vec<_> = (0..8)
            .map(|p| {
                let queue = Arc::clone(&queue);
                std::thread::spawn(move || {
                    for i in 0..1000 {
                        queue.push((p, i));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let items = drain(&queue);
        assert_eq!(items.len(), 8000);
        // per-producer order is preserved
        for p in 0..8 {
            let seq: Vec<_> = items.iter().filter(|(q, _)| *q == p).map(|(_, i)| *i).collect();
            assert_eq!(seq, (0..1000).collect::<Vec<_>>());
        }
    }
}
