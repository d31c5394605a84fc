//! Bounded blocking queue (C4).
//!
//! A multi-producer/multi-consumer FIFO with an optional maximum element
//! count. Pushing blocks while the queue is full; popping can either block
//! with a timeout or return immediately.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};
use std::time::Duration;

struct Inner<T> {
    items: VecDeque<T>,
}

pub struct BoundedQueue<T> {
    max_size: usize,
    inner: Mutex<Inner<T>>,
    not_full: Condvar,
    not_empty: Condvar,
}

impl<T> BoundedQueue<T> {
    /// `max_size == 0` means unbounded: pushes never wait.
    pub fn new(max_size: usize) -> Self {
        BoundedQueue {
            max_size,
            inner: Mutex::new(Inner {
                items: VecDeque::new(),
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
        }
    }

    /// Blocks until there is room, then enqueues `value`.
    pub fn push_blocking(&self, value: T) {
        let mut guard = self.inner.lock().unwrap();
        if self.max_size != 0 {
            while guard.items.len() >= self.max_size {
                guard = self.not_full.wait(guard).unwrap();
            }
        }
        guard.items.push_back(value);
        self.not_empty.notify_one();
    }

    /// Waits up to `timeout` for an element; returns `None` on timeout.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<T> {
        let mut guard = self.inner.lock().unwrap();
        if guard.items.is_empty() {
            let (g, result) = self
                .not_empty
                .wait_timeout_while(guard, timeout, |inner| inner.items.is_empty())
                .unwrap();
            guard = g;
            if result.timed_out() && guard.items.is_empty() {
                return None;
            }
        }
        let value = guard.items.pop_front();
        if value.is_some() {
            self.not_full.notify_one();
        }
        value
    }

    /// Non-blocking pop.
    pub fn try_pop(&self) -> Option<T> {
        let mut guard = self.inner.lock().unwrap();
        let value = guard.items.pop_front();
        if value.is_some() {
            self.not_full.notify_one();
        }
        value
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().items.len()
    }
}
