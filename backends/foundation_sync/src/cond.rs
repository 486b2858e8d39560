//! Condition gate: a wait-set paired with a [`Mutex`].
//!
//! ```
//! use foundation_sync::CondGate;
//! use std::sync::Arc;
//!
//! let gate = Arc::new(CondGate::new(false));
//!
//! let waiter = Arc::clone(&gate);
//! let handle = std::thread::spawn(move || {
//!     let mut clicked = waiter.lock();
//!     while !*clicked {
//!         clicked = waiter.wait(clicked);
//!     }
//! });
//!
//! *gate.lock() = true;
//! gate.broadcast();
//! handle.join().unwrap();
//! ```

use std::sync::{Condvar, Mutex as StdMutex};

use crate::faults::{fatal, unpoison, Fault};
use crate::lock::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct WaitSet {
    /// Bumped by every broadcast; a waiter leaves once it changes.
    generation: u64,
    /// Single wake-ups handed out by `signal` and not yet consumed.
    tokens: usize,
    waiting: usize,
}

pub struct CondGate<T> {
    lock: Mutex<T>,
    waiters: StdMutex<WaitSet>,
    wake: Condvar,
}

impl<T: Default> Default for CondGate<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> CondGate<T> {
    pub fn new(value: T) -> Self {
        Self {
            lock: Mutex::new(value),
            waiters: StdMutex::new(WaitSet::default()),
            wake: Condvar::new(),
        }
    }

    /// Acquires the paired lock.
    pub fn lock(&self) -> MutexGuard<'_, T> {
        self.lock.lock()
    }

    /// Releases the paired lock, suspends until woken by [`Self::broadcast`]
    /// or [`Self::signal`], and re-acquires the lock before returning.
    ///
    /// The caller must re-check its predicate: nothing guarantees it still
    /// holds once the lock is regained.
    ///
    /// # Panics
    ///
    /// Raises [`Fault::ForeignGuard`] if `guard` was not produced by this
    /// gate's lock.
    pub fn wait<'a>(&'a self, guard: MutexGuard<'a, T>) -> MutexGuard<'a, T> {
        if !core::ptr::eq(guard.mutex(), &self.lock) {
            drop(guard);
            fatal(Fault::ForeignGuard);
        }

        let mut set = unpoison(self.waiters.lock());
        let generation = set.generation;
        set.waiting += 1;

        // Registered in the wait-set before the user lock is let go, so a
        // broadcast issued right after release still sees this waiter.
        let mutex = guard.leak();
        mutex.raw().release();

        loop {
            if set.generation != generation {
                break;
            }
            if set.tokens > 0 {
                set.tokens -= 1;
                break;
            }
            set = unpoison(self.wake.wait(set));
        }
        set.waiting -= 1;
        drop(set);

        tracing::debug!("condition gate waiter woken, re-acquiring lock");
        mutex.raw().acquire();
        MutexGuard::assume_held(mutex)
    }

    /// Wakes every task currently waiting. Returns how many were waiting.
    ///
    /// The caller does not wait for the woken tasks to re-acquire the lock.
    pub fn broadcast(&self) -> usize {
        let mut set = unpoison(self.waiters.lock());
        set.generation = set.generation.wrapping_add(1);
        set.tokens = 0;
        let woken = set.waiting;
        drop(set);

        self.wake.notify_all();
        tracing::debug!(woken, "condition gate broadcast");
        woken
    }

    /// Wakes at most one waiting task.
    pub fn signal(&self) {
        let mut set = unpoison(self.waiters.lock());
        if set.waiting > set.tokens {
            set.tokens += 1;
        }
        drop(set);
        // Every waiter re-checks its token, so waking all of them cannot
        // release more than `tokens` tasks.
        self.wake.notify_all();
    }

    /// Number of tasks currently suspended in [`Self::wait`].
    #[must_use]
    pub fn waiting(&self) -> usize {
        unpoison(self.waiters.lock()).waiting
    }
}
