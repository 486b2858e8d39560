//! One-shot gate: runs exactly one initializer across every caller.
//!
//! Unlike a spinning once cell, callers that arrive while the initializer is
//! running are parked until it finishes. Re-entering the gate from inside its
//! own initializer would wait on itself forever, so it is detected and raised
//! as [`Fault::ReentrantOnce`].

use std::sync::{Condvar, Mutex as StdMutex};
use std::thread::{self, ThreadId};

use crate::faults::{fatal, unpoison, Fault};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OnceState {
    Unfired,
    Firing(ThreadId),
    Fired,
    Poisoned,
}

pub struct Once {
    state: StdMutex<OnceState>,
    fired: Condvar,
}

impl Default for Once {
    fn default() -> Self {
        Self::new()
    }
}

impl Once {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: StdMutex::new(OnceState::Unfired),
            fired: Condvar::new(),
        }
    }

    /// Runs `initializer` if this is the first call on the gate; otherwise
    /// waits for the first call to finish and returns without running it.
    ///
    /// # Panics
    ///
    /// Raises [`Fault::ReentrantOnce`] when called from inside the running
    /// initializer and [`Fault::PoisonedOnce`] when a previous initializer
    /// panicked.
    pub fn call_once<F>(&self, initializer: F)
    where
        F: FnOnce(),
    {
        struct PoisonOnPanic<'a>(&'a Once);

        impl Drop for PoisonOnPanic<'_> {
            fn drop(&mut self) {
                *unpoison(self.0.state.lock()) = OnceState::Poisoned;
                self.0.fired.notify_all();
            }
        }

        let me = thread::current().id();
        let mut state = unpoison(self.state.lock());
        loop {
            match *state {
                OnceState::Fired => return,
                OnceState::Poisoned => {
                    drop(state);
                    fatal(Fault::PoisonedOnce);
                }
                OnceState::Firing(runner) if runner == me => {
                    drop(state);
                    fatal(Fault::ReentrantOnce);
                }
                OnceState::Firing(_) => {
                    state = unpoison(self.fired.wait(state));
                }
                OnceState::Unfired => break,
            }
        }

        *state = OnceState::Firing(me);
        drop(state);
        tracing::debug!("once gate firing");

        let guard = PoisonOnPanic(self);
        initializer();
        core::mem::forget(guard);

        *unpoison(self.state.lock()) = OnceState::Fired;
        self.fired.notify_all();
        tracing::debug!("once gate fired");
    }

    #[must_use]
    pub fn state(&self) -> OnceState {
        *unpoison(self.state.lock())
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.state() == OnceState::Fired
    }
}

impl core::fmt::Debug for Once {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Once").field("state", &self.state()).finish()
    }
}
