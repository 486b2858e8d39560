//! Exclusive lock with holder tracking.
//!
//! [`RawLock`] is the binary {free, held-by-task} state with explicit
//! `acquire`/`release`; [`Mutex`] wraps a value behind a `RawLock` and hands
//! out a [`MutexGuard`] that releases on drop.
//!
//! Blocked acquirers queue up and `release` hands the lock straight to the
//! longest waiting one, so a task that releases and immediately re-acquires
//! goes to the back of the line instead of barging ahead.

use core::fmt;
use std::cell::UnsafeCell;
use std::collections::VecDeque;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::sync::{Condvar, Mutex as StdMutex};
use std::thread::{self, ThreadId};

use crate::faults::{fatal, unpoison, Fault};

/// `LockState` is who, if anyone, holds a [`RawLock`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockState {
    Free,
    Held(ThreadId),
}

struct Slot {
    state: LockState,
    /// Blocked acquirers in arrival order. Empty whenever `state` is free.
    waiters: VecDeque<ThreadId>,
}

pub struct RawLock {
    slot: StdMutex<Slot>,
    handed_off: Condvar,
}

impl Default for RawLock {
    fn default() -> Self {
        Self::new()
    }
}

impl RawLock {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slot: StdMutex::new(Slot {
                state: LockState::Free,
                waiters: VecDeque::new(),
            }),
            handed_off: Condvar::new(),
        }
    }

    /// Blocks until the lock is handed to the calling task.
    ///
    /// # Panics
    ///
    /// Raises [`Fault::RecursiveLock`] if the caller already holds the lock.
    pub fn acquire(&self) {
        let me = thread::current().id();
        let mut slot = unpoison(self.slot.lock());
        match slot.state {
            LockState::Free => {
                slot.state = LockState::Held(me);
                return;
            }
            LockState::Held(holder) if holder == me => {
                drop(slot);
                fatal(Fault::RecursiveLock);
            }
            LockState::Held(_) => {}
        }

        slot.waiters.push_back(me);
        while slot.state != LockState::Held(me) {
            slot = unpoison(self.handed_off.wait(slot));
        }
    }

    /// Takes the lock if it is free right now.
    pub fn try_acquire(&self) -> bool {
        let mut slot = unpoison(self.slot.lock());
        if slot.state != LockState::Free {
            return false;
        }
        slot.state = LockState::Held(thread::current().id());
        true
    }

    /// Gives the lock to the longest waiting acquirer, or marks it free.
    ///
    /// # Panics
    ///
    /// Raises [`Fault::ReleaseOfUnheldLock`] when the lock is free and
    /// [`Fault::ReleaseByNonHolder`] when another task holds it.
    pub fn release(&self) {
        let me = thread::current().id();
        let mut slot = unpoison(self.slot.lock());
        match slot.state {
            LockState::Free => {
                drop(slot);
                fatal(Fault::ReleaseOfUnheldLock);
            }
            LockState::Held(holder) if holder != me => {
                drop(slot);
                fatal(Fault::ReleaseByNonHolder);
            }
            LockState::Held(_) => match slot.waiters.pop_front() {
                Some(next) => {
                    slot.state = LockState::Held(next);
                    drop(slot);
                    // Waiters share one condvar; each re-checks for its own id.
                    self.handed_off.notify_all();
                }
                None => slot.state = LockState::Free,
            },
        }
    }

    #[must_use]
    pub fn state(&self) -> LockState {
        unpoison(self.slot.lock()).state
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.state() != LockState::Free
    }

    /// Returns true if the calling task is the holder.
    #[must_use]
    pub fn is_held_by_current(&self) -> bool {
        self.state() == LockState::Held(thread::current().id())
    }

    /// Tasks blocked in [`Self::acquire`].
    #[must_use]
    pub fn waiting(&self) -> usize {
        unpoison(self.slot.lock()).waiters.len()
    }
}

impl fmt::Debug for RawLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawLock")
            .field("state", &self.state())
            .field("waiting", &self.waiting())
            .finish()
    }
}

/// A value that is only reachable while its [`RawLock`] is held.
pub struct Mutex<T: ?Sized> {
    raw: RawLock,
    data: UnsafeCell<T>,
}

// SAFETY: access to `data` only happens through a `MutexGuard`, and a guard
// only exists while `raw` is held by the task that created it.
unsafe impl<T: ?Sized + Send> Send for Mutex<T> {}
unsafe impl<T: ?Sized + Send> Sync for Mutex<T> {}

impl<T> Mutex<T> {
    pub const fn new(value: T) -> Self {
        Self {
            raw: RawLock::new(),
            data: UnsafeCell::new(value),
        }
    }

    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }
}

impl<T: Default> Default for Mutex<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: ?Sized> Mutex<T> {
    /// Blocks until the lock is acquired.
    pub fn lock(&self) -> MutexGuard<'_, T> {
        self.raw.acquire();
        MutexGuard::new(self)
    }

    pub fn try_lock(&self) -> Option<MutexGuard<'_, T>> {
        if self.raw.try_acquire() {
            Some(MutexGuard::new(self))
        } else {
            None
        }
    }

    /// Exclusive access through `&mut self` needs no locking.
    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.raw.is_locked()
    }

    pub(crate) fn raw(&self) -> &RawLock {
        &self.raw
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for Mutex<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("Mutex");
        match self.try_lock() {
            Some(guard) => d.field("data", &&*guard),
            None => d.field("data", &format_args!("<locked>")),
        };
        d.finish()
    }
}

/// Proof that the calling task holds the lock of `mutex`.
///
/// Not `Send`: the lock must be released by the task that acquired it.
pub struct MutexGuard<'a, T: ?Sized> {
    mutex: &'a Mutex<T>,
    _holder: PhantomData<*const ()>,
}

// SAFETY: sharing `&MutexGuard` only exposes `&T`.
unsafe impl<T: ?Sized + Sync> Sync for MutexGuard<'_, T> {}

impl<'a, T: ?Sized> MutexGuard<'a, T> {
    fn new(mutex: &'a Mutex<T>) -> Self {
        Self {
            mutex,
            _holder: PhantomData,
        }
    }

    /// Releases the lock explicitly.
    pub fn unlock(self) {
        drop(self);
    }

    pub(crate) fn mutex(&self) -> &'a Mutex<T> {
        self.mutex
    }

    /// Gives up the guard without releasing; the caller becomes responsible
    /// for the lock it still holds.
    pub(crate) fn leak(self) -> &'a Mutex<T> {
        let mutex = self.mutex;
        core::mem::forget(self);
        mutex
    }

    /// Builds a guard for a lock the calling task already holds.
    pub(crate) fn assume_held(mutex: &'a Mutex<T>) -> Self {
        Self::new(mutex)
    }
}

impl<T: ?Sized> Deref for MutexGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: the guard's existence means the lock is held by us.
        unsafe { &*self.mutex.data.get() }
    }
}

impl<T: ?Sized> DerefMut for MutexGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: the guard's existence means the lock is held by us.
        unsafe { &mut *self.mutex.data.get() }
    }
}

impl<T: ?Sized> Drop for MutexGuard<'_, T> {
    fn drop(&mut self) {
        self.mutex.raw.release();
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for MutexGuard<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}
