//! Join barrier over an atomic outstanding-task counter.

use core::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex as StdMutex};
use std::time::{Duration, Instant};

use crate::faults::{fatal, unpoison, Fault};

/// `WaitGroup` blocks [`WaitGroup::wait`] callers until every unit added with
/// [`WaitGroup::add`] has been matched by a [`WaitGroup::done`].
///
/// All `add` calls for a batch must happen before the `wait` that is meant to
/// observe them; adding while a wait might already have seen zero is a race
/// in the caller.
pub struct WaitGroup {
    counter: AtomicUsize,
    lock: StdMutex<()>,
    zero: Condvar,
}

impl Default for WaitGroup {
    fn default() -> Self {
        Self::new()
    }
}

impl WaitGroup {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            counter: AtomicUsize::new(0),
            lock: StdMutex::new(()),
            zero: Condvar::new(),
        }
    }

    pub fn add(&self, units: usize) {
        self.counter.fetch_add(units, Ordering::AcqRel);
    }

    /// Marks one unit finished.
    ///
    /// # Panics
    ///
    /// Raises [`Fault::NegativeWaitGroupCounter`] if called more times than
    /// units were added.
    pub fn done(&self) {
        let previous = self
            .counter
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));

        match previous {
            Err(_) => fatal(Fault::NegativeWaitGroupCounter),
            Ok(1) => {
                // Taking the lock orders this wake-up after any waiter that
                // already checked the counter and is about to park.
                drop(unpoison(self.lock.lock()));
                self.zero.notify_all();
            }
            Ok(_) => {}
        }
    }

    /// Returns a guard that calls [`Self::done`] when dropped, including
    /// while unwinding.
    #[must_use]
    pub fn defer_done(&self) -> DoneGuard<'_> {
        DoneGuard(self)
    }

    /// Blocks until the counter reaches zero.
    pub fn wait(&self) {
        let mut guard = unpoison(self.lock.lock());
        while self.count() > 0 {
            guard = unpoison(self.zero.wait(guard));
        }
    }

    /// Blocks until the counter reaches zero or `timeout` elapses.
    /// Returns `true` if the counter reached zero.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut guard = unpoison(self.lock.lock());
        while self.count() > 0 {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            guard = unpoison(self.zero.wait_timeout(guard, deadline - now)).0;
        }
        true
    }

    /// Outstanding units.
    #[must_use]
    pub fn count(&self) -> usize {
        self.counter.load(Ordering::Acquire)
    }
}

impl fmt::Debug for WaitGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitGroup")
            .field("count", &self.count())
            .finish()
    }
}

/// Calls [`WaitGroup::done`] on drop.
pub struct DoneGuard<'a>(&'a WaitGroup);

impl Drop for DoneGuard<'_> {
    fn drop(&mut self) {
        self.0.done();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::faults::fault_of;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn wait_on_zero_returns_immediately() {
        let wg = WaitGroup::new();
        wg.wait();
        assert!(wg.wait_timeout(Duration::from_millis(1)));
    }

    /// WHY: `wait` must not return before every unit is done
    /// WHAT: Five greeters all report before the wait returns
    #[test]
    #[ntest::timeout(5000)]
    fn waits_for_every_unit() {
        let wg = Arc::new(WaitGroup::new());
        let finished = Arc::new(AtomicUsize::new(0));

        wg.add(5);
        for _ in 0..5 {
            let wg = Arc::clone(&wg);
            let finished = Arc::clone(&finished);
            thread::spawn(move || {
                let _done = wg.defer_done();
                thread::sleep(Duration::from_millis(20));
                finished.fetch_add(1, Ordering::SeqCst);
            });
        }

        wg.wait();
        assert_eq!(finished.load(Ordering::SeqCst), 5);
        assert_eq!(wg.count(), 0);
    }

    /// WHY: One missing `done` must keep the barrier closed
    /// WHAT: `wait_timeout` reports false while a unit is outstanding
    #[test]
    fn does_not_return_early() {
        let wg = WaitGroup::new();
        wg.add(2);
        wg.done();
        assert!(!wg.wait_timeout(Duration::from_millis(50)));
        wg.done();
        assert!(wg.wait_timeout(Duration::from_millis(50)));
    }

    /// WHY: The counter must never go negative
    /// WHAT: An extra `done` raises `NegativeWaitGroupCounter`
    #[test]
    fn extra_done_is_fatal() {
        let wg = WaitGroup::new();
        wg.add(1);
        wg.done();
        let payload = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| wg.done())).unwrap_err();
        assert_eq!(
            fault_of(payload.as_ref()),
            Some(Fault::NegativeWaitGroupCounter)
        );
        assert_eq!(wg.count(), 0);
    }

    #[test]
    fn done_guard_runs_when_task_panics() {
        let wg = Arc::new(WaitGroup::new());
        let reached = Arc::new(AtomicBool::new(false));
        wg.add(1);

        let task_wg = Arc::clone(&wg);
        let task_reached = Arc::clone(&reached);
        let result = thread::spawn(move || {
            let _done = task_wg.defer_done();
            task_reached.store(true, Ordering::SeqCst);
            panic!("task failed");
        })
        .join();

        assert!(result.is_err());
        assert!(reached.load(Ordering::SeqCst));
        assert!(wg.wait_timeout(Duration::from_secs(1)));
    }
}
