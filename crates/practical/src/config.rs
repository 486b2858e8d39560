use std::num::NonZeroUsize;
use std::thread;
use std::time::Duration;

pub const DEFAULT_POOL_JOBS: usize = 1024 * 1024;
pub const DEFAULT_SELECT_ITERATIONS: usize = 1000;

/// Knobs of the demonstrations. The binary fills this from its flags; the
/// library never reads the environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PracticalConfig {
    /// Worker tasks used for bulk jobs such as the pool load test.
    pub workers: usize,
    /// Jobs submitted by the pool load test.
    pub pool_jobs: usize,
    /// Selections made by the fairness demonstration.
    pub select_iterations: usize,
    /// Delay before the stop or close signal in the select demonstrations.
    pub signal_delay: Duration,
    /// Timeout arm of the select timeout demonstration.
    pub select_timeout: Duration,
    /// One unit of work in the select work loop.
    pub work_unit: Duration,
    /// How long each starvation worker runs.
    pub starvation_budget: Duration,
    /// How long each deadlock task holds its first lock before reaching for
    /// the second.
    pub deadlock_hold: Duration,
    /// How long the deadlock runner waits before reporting a hang.
    pub deadlock_budget: Duration,
}

impl Default for PracticalConfig {
    fn default() -> Self {
        Self {
            workers: thread::available_parallelism().map_or(4, NonZeroUsize::get),
            pool_jobs: DEFAULT_POOL_JOBS,
            select_iterations: DEFAULT_SELECT_ITERATIONS,
            signal_delay: Duration::from_secs(5),
            select_timeout: Duration::from_secs(1),
            work_unit: Duration::from_secs(1),
            starvation_budget: Duration::from_secs(1),
            deadlock_hold: Duration::from_secs(2),
            deadlock_budget: Duration::from_secs(5),
        }
    }
}

impl PracticalConfig {
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    #[must_use]
    pub fn with_pool_jobs(mut self, jobs: usize) -> Self {
        self.pool_jobs = jobs;
        self
    }

    #[must_use]
    pub fn with_select_iterations(mut self, iterations: usize) -> Self {
        self.select_iterations = iterations;
        self
    }

    #[must_use]
    pub fn with_signal_delay(mut self, delay: Duration) -> Self {
        self.signal_delay = delay;
        self
    }

    #[must_use]
    pub fn with_select_timeout(mut self, timeout: Duration) -> Self {
        self.select_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_work_unit(mut self, unit: Duration) -> Self {
        self.work_unit = unit;
        self
    }

    #[must_use]
    pub fn with_starvation_budget(mut self, budget: Duration) -> Self {
        self.starvation_budget = budget;
        self
    }

    #[must_use]
    pub fn with_deadlock_hold(mut self, hold: Duration) -> Self {
        self.deadlock_hold = hold;
        self
    }

    #[must_use]
    pub fn with_deadlock_budget(mut self, budget: Duration) -> Self {
        self.deadlock_budget = budget;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_values() {
        let config = PracticalConfig::default();
        assert!(config.workers >= 1);
        assert_eq!(config.pool_jobs, 1_048_576);
        assert_eq!(config.select_iterations, 1000);
        assert_eq!(config.starvation_budget, Duration::from_secs(1));
        assert_eq!(config.deadlock_hold, Duration::from_secs(2));
        assert_eq!(config.deadlock_budget, Duration::from_secs(5));
        assert_eq!(config.signal_delay, Duration::from_secs(5));
    }

    #[test]
    fn workers_never_drop_to_zero() {
        assert_eq!(PracticalConfig::default().with_workers(0).workers, 1);
    }
}
