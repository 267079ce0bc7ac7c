//! LIFO stack.

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::error::LapseError;

/// Thread-safe LIFO stack. The top is the back of the internal deque.
#[derive(Debug)]
pub struct Stack<T> {
    items: Mutex<VecDeque<T>>,
}

impl<T> Stack<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
        }
    }

    /// Push onto the top. `None` is ignored.
    pub fn push(&self, item: impl Into<Option<T>>) {
        if let Some(item) = item.into() {
            self.items.lock().push_back(item);
        }
    }

    /// Remove and return the top item.
    pub fn pop(&self) -> Result<T, LapseError> {
        self.items
            .lock()
            .pop_back()
            .ok_or(LapseError::EmptyContainer)
    }

    pub fn clear(&self) {
        self.items.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}

impl<T: Clone> Stack<T> {
    /// Return a clone of the top item without removing it.
    pub fn peek(&self) -> Result<T, LapseError> {
        self.items
            .lock()
            .back()
            .cloned()
            .ok_or(LapseError::EmptyContainer)
    }
}

impl<T> Default for Stack<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_reverse_push_order() {
        let stack: Stack<i32> = Stack::new();
        for i in 0..5 {
            stack.push(i);
        }
        let mut out = Vec::new();
        while let Ok(i) = stack.pop() {
            out.push(i);
        }
        assert_eq!(out, vec![4, 3, 2, 1, 0]);
    }

    #[test]
    fn peek_returns_top_without_removing() {
        let stack: Stack<&str> = Stack::new();
        stack.push("bottom");
        stack.push("top");
        assert_eq!(stack.peek(), Ok("top"));
        assert_eq!(stack.len(), 2);
    }

    #[test]
    fn empty_stack_reports_empty_container() {
        let stack: Stack<i32> = Stack::new();
        assert_eq!(stack.pop(), Err(LapseError::EmptyContainer));
        assert_eq!(stack.peek(), Err(LapseError::EmptyContainer));

        stack.push(7);
        assert_eq!(stack.pop(), Ok(7));
        assert_eq!(stack.pop(), Err(LapseError::EmptyContainer));
    }

    #[test]
    fn none_is_ignored_and_clear_empties() {
        let stack: Stack<u8> = Stack::new();
        stack.push(None);
        assert!(stack.is_empty());
        stack.push(1);
        stack.push(2);
        stack.clear();
        stack.clear();
        assert!(stack.is_empty());
    }
}
