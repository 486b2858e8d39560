use std::sync::Arc;

use foundation_sync::{spawn, Mutex, WaitGroup};

use crate::error::PracticalResult;
use crate::{PracticalConfig, Transcript};

/// A single task says hello while the caller waits at the join point.
/// Returns how many tasks were joined.
pub fn wait_group(_config: &PracticalConfig, transcript: &Transcript) -> PracticalResult<usize> {
    let wg = Arc::new(WaitGroup::new());
    let task_wg = Arc::clone(&wg);
    let log = transcript.clone();

    wg.add(1);
    spawn("say-hello", move || {
        let _done = task_wg.defer_done();
        log.line("hello");
    })?;

    wg.wait();
    Ok(1)
}

/// Five greeters are counted with one `add(5)` before any of them starts.
/// Returns the greeter ids, sorted.
pub fn sync_add(_config: &PracticalConfig, transcript: &Transcript) -> PracticalResult<Vec<usize>> {
    const GREETERS: usize = 5;

    let wg = Arc::new(WaitGroup::new());
    let greeted = Arc::new(Mutex::new(Vec::with_capacity(GREETERS)));

    wg.add(GREETERS);
    for id in 1..=GREETERS {
        let wg = Arc::clone(&wg);
        let greeted = Arc::clone(&greeted);
        let transcript = transcript.clone();
        spawn(format!("greeter-{id}"), move || {
            let _done = wg.defer_done();
            transcript.line(format!("Hello from {id}!"));
            greeted.lock().push(id);
        })?;
    }

    wg.wait();
    let mut ids = greeted.lock().clone();
    ids.sort_unstable();
    Ok(ids)
}
