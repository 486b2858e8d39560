//! What a task observes depends on what it captured: a slot shared with the
//! loop that keeps overwriting it, or its own copy of the value.

use std::sync::Arc;

use foundation_sync::{spawn, Channel, Mutex, RunOnDrop, WaitGroup};

use crate::error::PracticalResult;
use crate::{PracticalConfig, Transcript};

const SALUTATIONS: [&str; 3] = ["hello", "greetings", "good day"];

/// Every task reads the one slot the loop writes to. The tasks are held at a
/// `begin` gate until the loop is over, so all of them print the last
/// salutation.
pub fn closure_shared_slot(
    _config: &PracticalConfig,
    transcript: &Transcript,
) -> PracticalResult<Vec<String>> {
    let slot = Arc::new(Mutex::new(""));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let wg = Arc::new(WaitGroup::new());
    let begin = Channel::<()>::unbuffered();

    {
        let release = RunOnDrop::new(|| begin.close());
        for salutation in SALUTATIONS {
            *slot.lock() = salutation;

            wg.add(1);
            let task_slot = Arc::clone(&slot);
            let seen = Arc::clone(&seen);
            let wg = Arc::clone(&wg);
            let gate = begin.receiver();
            let transcript = transcript.clone();
            spawn("shared-slot", move || {
                let _done = wg.defer_done();
                // `begin` never carries a value; this returns once it is closed.
                let _ = gate.receive();
                let salutation = *task_slot.lock();
                transcript.line(salutation);
                seen.lock().push(salutation.to_owned());
            })?;
        }
        drop(release);
    }

    wg.wait();
    let seen = seen.lock().clone();
    Ok(seen)
}

/// Every task is handed its own salutation, so each one prints a different
/// value.
pub fn closure_by_value(
    _config: &PracticalConfig,
    transcript: &Transcript,
) -> PracticalResult<Vec<String>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let wg = Arc::new(WaitGroup::new());

    for salutation in SALUTATIONS {
        wg.add(1);
        let seen = Arc::clone(&seen);
        let wg = Arc::clone(&wg);
        let transcript = transcript.clone();
        spawn("by-value", move || {
            let _done = wg.defer_done();
            transcript.line(salutation);
            seen.lock().push(salutation.to_owned());
        })?;
    }

    wg.wait();
    let seen = seen.lock().clone();
    Ok(seen)
}
