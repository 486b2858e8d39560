//! One-shot gates: many callers share one initializer, later initializers
//! never run, and re-entering a gate from its own initializer is a fault.

use std::sync::Arc;

use foundation_sync::{spawn, Fault, Mutex, Once, WaitGroup};

use crate::error::{join_task, PracticalError, PracticalResult};
use crate::{PracticalConfig, Transcript};

/// 100 tasks call the same gate with an increment; the count ends at 1.
pub fn once(_config: &PracticalConfig, transcript: &Transcript) -> PracticalResult<usize> {
    const CALLERS: usize = 100;

    let count = Arc::new(Mutex::new(0usize));
    let gate = Arc::new(Once::new());
    let wg = Arc::new(WaitGroup::new());

    wg.add(CALLERS);
    for i in 0..CALLERS {
        let count = Arc::clone(&count);
        let gate = Arc::clone(&gate);
        let wg = Arc::clone(&wg);
        spawn(format!("once-{i}"), move || {
            let _done = wg.defer_done();
            gate.call_once(|| *count.lock() += 1);
        })?;
    }

    wg.wait();
    let count = *count.lock();
    transcript.line(format!("Count is {count}"));
    Ok(count)
}

/// The first initializer wins; the second call on the gate is a no-op.
pub fn once_first_wins(_config: &PracticalConfig, transcript: &Transcript) -> PracticalResult<i32> {
    let count = Mutex::new(0);
    let gate = Once::new();

    gate.call_once(|| *count.lock() += 1);
    gate.call_once(|| *count.lock() -= 1);

    let count = count.into_inner();
    transcript.line(format!("Count: {count}"));
    Ok(count)
}

fn init_a(gate: &Once) {
    gate.call_once(|| init_b(gate));
}

fn init_b(gate: &Once) {
    gate.call_once(|| init_a(gate));
}

/// `init_a` re-enters the gate that is running it. The reentrancy is
/// detected and the firing task unwinds with [`Fault::ReentrantOnce`].
/// Returns the fault observed, or `None` if the task somehow completed.
pub fn once_deadlock(
    _config: &PracticalConfig,
    transcript: &Transcript,
) -> PracticalResult<Option<Fault>> {
    let gate = Arc::new(Once::new());
    let task_gate = Arc::clone(&gate);
    let firing = spawn("once-reentrant", move || {
        task_gate.call_once(|| init_a(&task_gate));
    })?;

    match join_task(firing) {
        Ok(()) => Ok(None),
        Err(PracticalError::Fault(fault)) => {
            transcript.line(format!("Detected: {fault}"));
            Ok(Some(fault))
        }
        Err(err) => Err(err),
    }
}
