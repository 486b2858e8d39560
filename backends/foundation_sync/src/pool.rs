//! A reuse cache of constructed values.
//!
//! [`Pool::get`] never blocks: it pops an available instance from a lock-free
//! queue or builds a new one with the constructor. [`Pool::put`] accepts any
//! instance. The pool does not bound how many instances exist and never
//! evicts; it only saves constructions.

use core::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use concurrent_queue::ConcurrentQueue;

type Constructor<T> = Box<dyn Fn() -> T + Send + Sync>;

pub struct Pool<T> {
    available: ConcurrentQueue<T>,
    construct: Constructor<T>,
    created: AtomicUsize,
}

impl<T> Pool<T> {
    pub fn new<F>(construct: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            available: ConcurrentQueue::unbounded(),
            construct: Box::new(construct),
            created: AtomicUsize::new(0),
        }
    }

    /// Returns an available instance, constructing one when none is free.
    pub fn get(&self) -> T {
        match self.available.pop() {
            Ok(item) => item,
            Err(_) => {
                self.created.fetch_add(1, Ordering::Relaxed);
                tracing::trace!("pool constructing new instance");
                (self.construct)()
            }
        }
    }

    /// Makes `item` available for a later [`Self::get`].
    pub fn put(&self, item: T) {
        // The queue is unbounded and never closed, so a push cannot fail.
        let _ = self.available.push(item);
    }

    /// How many times the constructor has run.
    #[must_use]
    pub fn created(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }

    /// How many instances are waiting to be reused.
    #[must_use]
    pub fn available(&self) -> usize {
        self.available.len()
    }
}

impl<T> fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("created", &self.created())
            .field("available", &self.available())
            .finish()
    }
}
