//! Shared helpers for the workspace integration tests.

use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use ewe_practical::PracticalConfig;
use foundation_sync::{fault_of, Fault};

/// Demonstration settings scaled down so a full run takes about a second.
#[must_use]
pub fn quick_config() -> PracticalConfig {
    PracticalConfig::default()
        .with_workers(4)
        .with_pool_jobs(10_000)
        .with_signal_delay(Duration::from_millis(50))
        .with_select_timeout(Duration::from_millis(20))
        .with_work_unit(Duration::from_millis(5))
        .with_starvation_budget(Duration::from_millis(200))
        .with_deadlock_hold(Duration::from_millis(50))
        .with_deadlock_budget(Duration::from_millis(300))
}

/// Runs `f` and returns the fault it raised, if it raised one.
pub fn fault_raised_by<F: FnOnce()>(f: F) -> Option<Fault> {
    let payload = panic::catch_unwind(AssertUnwindSafe(f)).err()?;
    fault_of(payload.as_ref())
}
