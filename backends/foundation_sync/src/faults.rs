//! Fatal misuse faults.
//!
//! A [`Fault`] means an invariant of a primitive was broken by its caller.
//! Faults are never returned as `Err`: [`fatal`] logs them and unwinds with
//! the [`Fault`] itself as the panic payload so a hook (or a test) can
//! recognise it with [`fault_of`].

use std::any::Any;
use std::sync::{LockResult, PoisonError};

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    #[error("send on closed channel")]
    SendOnClosedChannel,

    #[error("close of closed channel")]
    CloseOfClosedChannel,

    #[error("release of unheld lock")]
    ReleaseOfUnheldLock,

    #[error("release of lock by a task that does not hold it")]
    ReleaseByNonHolder,

    #[error("lock acquired again by the task already holding it")]
    RecursiveLock,

    #[error("negative wait group counter")]
    NegativeWaitGroupCounter,

    #[error("once gate re-entered from its own initializer")]
    ReentrantOnce,

    #[error("once gate poisoned by a panicking initializer")]
    PoisonedOnce,

    #[error("guard does not belong to the lock paired with this gate")]
    ForeignGuard,

    #[error("select has no arm that can ever become ready")]
    NoLiveSelectArms,
}

/// Raises `fault`, unwinding the calling task.
///
/// # Panics
///
/// Always; the payload is the [`Fault`] value.
pub fn fatal(fault: Fault) -> ! {
    tracing::error!(%fault, "fatal concurrency fault");
    std::panic::panic_any(fault)
}

/// Returns the [`Fault`] carried by a panic payload, if it is one.
#[must_use]
pub fn fault_of(payload: &(dyn Any + Send)) -> Option<Fault> {
    payload.downcast_ref::<Fault>().copied()
}

/// Recovers the guard from a poisoned std lock.
///
/// Internal state is always restored before [`fatal`] unwinds, so poisoning
/// of the toolkit's own bookkeeping locks carries no information.
pub(crate) fn unpoison<G>(result: LockResult<G>) -> G {
    result.unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic;

    /// WHY: `fault_of` is how hooks and tests recognise faults
    /// WHAT: A fatal payload downcasts back to the raised variant
    #[test]
    fn fatal_payload_is_the_fault() {
        let payload = panic::catch_unwind(|| fatal(Fault::ReentrantOnce)).unwrap_err();
        assert_eq!(fault_of(payload.as_ref()), Some(Fault::ReentrantOnce));
    }

    /// WHY: Ordinary panics must not be mistaken for faults
    /// WHAT: A string payload yields no fault
    #[test]
    fn plain_panics_are_not_faults() {
        let payload = panic::catch_unwind(|| panic!("boom")).unwrap_err();
        assert_eq!(fault_of(payload.as_ref()), None);
    }

    #[test]
    fn fault_messages() {
        assert_eq!(
            Fault::SendOnClosedChannel.to_string(),
            "send on closed channel"
        );
        assert_eq!(
            Fault::NegativeWaitGroupCounter.to_string(),
            "negative wait group counter"
        );
    }
}
