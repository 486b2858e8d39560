use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use foundation_sync::{spawn, Mutex, WaitGroup};

use crate::error::PracticalResult;
use crate::{PracticalConfig, Transcript};

#[derive(Debug)]
struct Labeled(u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeadlockOutcome {
    /// Both tasks finished; the lock order never crossed.
    Completed,
    /// The join point was still waiting when the budget ran out.
    Hung { waited: Duration },
}

struct Crossing {
    first: Arc<Mutex<Labeled>>,
    second: Arc<Mutex<Labeled>>,
    hold: Duration,
    wg: Arc<WaitGroup>,
    transcript: Transcript,
}

impl Crossing {
    fn run(self) {
        let _done = self.wg.defer_done();

        let first = self.first.lock();
        self.transcript.line(format!("slept on {}", first.0));
        thread::sleep(self.hold);
        self.transcript.line(format!("woke up on {}", first.0));

        let second = self.second.lock();
        self.transcript
            .line(format!("holding {} and {}", first.0, second.0));
    }
}

/// Two tasks lock the same pair in opposite orders, each holding its first
/// lock for `deadlock_hold` before reaching for the second.
///
/// A hung run leaves both tasks blocked for the rest of the process.
#[tracing::instrument(skip_all, fields(hold = ?config.deadlock_hold, budget = ?config.deadlock_budget))]
pub fn deadlock(config: &PracticalConfig, transcript: &Transcript) -> PracticalResult<DeadlockOutcome> {
    let a = Arc::new(Mutex::new(Labeled(1)));
    let b = Arc::new(Mutex::new(Labeled(2)));
    let wg = Arc::new(WaitGroup::new());

    wg.add(2);
    for (name, first, second) in [("a-then-b", &a, &b), ("b-then-a", &b, &a)] {
        let crossing = Crossing {
            first: Arc::clone(first),
            second: Arc::clone(second),
            hold: config.deadlock_hold,
            wg: Arc::clone(&wg),
            transcript: transcript.clone(),
        };
        spawn(name, move || crossing.run())?;
    }

    let start = Instant::now();
    let outcome = if wg.wait_timeout(config.deadlock_budget) {
        DeadlockOutcome::Completed
    } else {
        DeadlockOutcome::Hung {
            waited: start.elapsed(),
        }
    };

    match outcome {
        DeadlockOutcome::Completed => transcript.line("both tasks completed"),
        DeadlockOutcome::Hung { waited } => {
            tracing::warn!(?waited, outstanding = wg.count(), "tasks deadlocked");
            transcript.line(format!("deadlocked: still waiting after {waited:?}"));
        }
    }
    Ok(outcome)
}
