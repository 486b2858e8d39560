//! Scenarios that show hazards instead of correct use: a lock-order
//! deadlock and lock starvation. Their outcomes are observations, not errors.

pub mod deadlock;
pub mod starvation;

pub use deadlock::{deadlock, DeadlockOutcome};
pub use starvation::{starvation, StarvationReport};
