//! Runnable demonstrations of the `foundation_sync` primitives.
//!
//! [`Demo`] names every demonstration; each one writes its human-readable
//! output to a [`Transcript`] and is tuned by a [`PracticalConfig`]. The
//! [`adversarial`] scenarios show a lock-order deadlock and lock starvation.

pub mod adversarial;
pub mod demos;

mod config;
mod demo;
mod error;
mod transcript;

pub use config::{PracticalConfig, DEFAULT_POOL_JOBS, DEFAULT_SELECT_ITERATIONS};
pub use demo::Demo;
pub use error::{PracticalError, PracticalResult};
pub use transcript::Transcript;

/// Runs `demos` in order, stopping at the first failure.
///
/// # Errors
///
/// The first demonstration error.
pub fn run_all<I>(demos: I, config: &PracticalConfig, transcript: &Transcript) -> PracticalResult<()>
where
    I: IntoIterator<Item = Demo>,
{
    for demo in demos {
        demo.run(config, transcript)?;
    }
    Ok(())
}
