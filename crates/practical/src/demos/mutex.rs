use std::sync::Arc;

use foundation_sync::{spawn, Mutex, WaitGroup};

use crate::error::PracticalResult;
use crate::{PracticalConfig, Transcript};

/// Five incrementers and five decrementers share one locked counter.
/// Returns the final count, which is always zero.
pub fn mutex_arithmetic(
    _config: &PracticalConfig,
    transcript: &Transcript,
) -> PracticalResult<i64> {
    let count = Arc::new(Mutex::new(0i64));
    let wg = Arc::new(WaitGroup::new());

    wg.add(10);
    for i in 0..5 {
        for (name, delta, verb) in [("incr", 1, "Incrementing"), ("decr", -1, "Decrementing")] {
            let count = Arc::clone(&count);
            let wg = Arc::clone(&wg);
            let transcript = transcript.clone();
            spawn(format!("{name}-{i}"), move || {
                let _done = wg.defer_done();
                let mut count = count.lock();
                *count += delta;
                transcript.line(format!("{verb}: {}", *count));
            })?;
        }
    }

    wg.wait();
    transcript.line("Arithmetic complete.");
    let total = *count.lock();
    Ok(total)
}
