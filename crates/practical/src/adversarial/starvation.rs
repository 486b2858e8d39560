use std::io;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use foundation_sync::{spawn, Mutex, TaskHandle, WaitGroup};

use crate::error::{join_task, PracticalResult};
use crate::{PracticalConfig, Transcript};

const GREEDY_HOLD: Duration = Duration::from_nanos(3);
const POLITE_HOLD: Duration = Duration::from_nanos(1);
const POLITE_HOLDS_PER_LOOP: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StarvationReport {
    pub greedy: usize,
    pub polite: usize,
}

/// Holds the lock once per loop for the whole of its work.
fn greedy(shared: &Mutex<()>, budget: Duration) -> usize {
    let mut loops = 0;
    let begin = Instant::now();
    while begin.elapsed() <= budget {
        let guard = shared.lock();
        thread::sleep(GREEDY_HOLD);
        guard.unlock();
        loops += 1;
    }
    loops
}

/// Does the same work as [`greedy`] but takes the lock separately for each
/// third of it.
fn polite(shared: &Mutex<()>, budget: Duration) -> usize {
    let mut loops = 0;
    let begin = Instant::now();
    while begin.elapsed() <= budget {
        for _ in 0..POLITE_HOLDS_PER_LOOP {
            let guard = shared.lock();
            thread::sleep(POLITE_HOLD);
            guard.unlock();
        }
        loops += 1;
    }
    loops
}

type Worker = fn(&Mutex<()>, Duration) -> usize;

/// Starts `worker` on the shared lock, counted on the join barrier.
fn start(
    name: &str,
    worker: Worker,
    shared: &Arc<Mutex<()>>,
    wg: &Arc<WaitGroup>,
    budget: Duration,
) -> io::Result<TaskHandle<usize>> {
    let lock = Arc::clone(shared);
    let task_wg = Arc::clone(wg);
    wg.add(1);
    let started = spawn(name, move || {
        let _done = task_wg.defer_done();
        worker(&lock, budget)
    });
    if started.is_err() {
        wg.done();
    }
    started
}

/// Runs a greedy and a polite worker against one lock for
/// `starvation_budget` and reports how many loops each finished.
#[tracing::instrument(skip_all, fields(budget = ?config.starvation_budget))]
pub fn starvation(
    config: &PracticalConfig,
    transcript: &Transcript,
) -> PracticalResult<StarvationReport> {
    let shared = Arc::new(Mutex::new(()));
    let wg = Arc::new(WaitGroup::new());
    let budget = config.starvation_budget;

    let greedy_task = start("greedy", greedy, &shared, &wg, budget)?;
    let polite_task = start("polite", polite, &shared, &wg, budget)?;

    wg.wait();
    tracing::debug!(outstanding = wg.count(), "starvation workers joined");

    let report = StarvationReport {
        greedy: join_task(greedy_task)?,
        polite: join_task(polite_task)?,
    };

    tracing::info!(greedy = report.greedy, polite = report.polite, "starvation run finished");
    transcript.line(format!("Greedy worker finished {} loops", report.greedy));
    transcript.line(format!("Polite worker finished {} loops", report.polite));
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tracing_test::traced_test;

    /// WHY: Holding a lock longer per loop wins more loops
    /// WHAT: Greedy finishes more loops than polite; only the direction is asserted
    #[test]
    #[serial]
    #[ntest::timeout(10000)]
    fn greedy_outpaces_polite() {
        let config = PracticalConfig::default().with_starvation_budget(Duration::from_millis(300));
        let report = starvation(&config, &Transcript::capture()).unwrap();
        assert!(report.greedy > report.polite, "{report:?}");
    }

    /// WHY: The workers are joined at a wait group before their counts are read
    /// WHAT: The join point is logged with nothing outstanding
    #[test]
    #[serial]
    #[traced_test]
    fn workers_meet_at_join_point() {
        let config = PracticalConfig::default().with_starvation_budget(Duration::from_millis(50));
        let report = starvation(&config, &Transcript::capture()).unwrap();
        assert!(report.greedy > 0);
        assert!(logs_contain("starvation workers joined"));
        assert!(logs_contain("outstanding=0"));
    }
}
