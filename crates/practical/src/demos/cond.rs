use std::sync::Arc;

use foundation_sync::{spawn, CondGate, Mutex, RunOnDrop, WaitGroup};

use crate::error::PracticalResult;
use crate::{PracticalConfig, Transcript};

const HANDLERS: [&str; 3] = [
    "Maximizing window.",
    "Displaying annoying dialog box!",
    "Mouse clicked.",
];

/// Runs `subscribe`, then clicks `button`: sets the flag and broadcasts.
/// The click also happens when `subscribe` fails part way, so subscribers
/// already waiting are never left parked.
fn click_after<R>(
    button: &CondGate<bool>,
    subscribe: impl FnOnce() -> PracticalResult<R>,
) -> PracticalResult<R> {
    let _click = RunOnDrop::new(|| {
        *button.lock() = true;
        let woken = button.broadcast();
        tracing::debug!(woken, "button clicked");
    });
    subscribe()
}

/// Three subscribers wait for a button click; a single broadcast runs all
/// three handlers. Returns the handler lines in the order they ran.
pub fn cond_broadcast(
    _config: &PracticalConfig,
    transcript: &Transcript,
) -> PracticalResult<Vec<&'static str>> {
    let clicked = Arc::new(CondGate::new(false));
    let handled = Arc::new(WaitGroup::new());
    let ran = Arc::new(Mutex::new(Vec::new()));

    click_after(&clicked, || {
        for handler in HANDLERS {
            let registered = Arc::new(WaitGroup::new());
            registered.add(1);
            handled.add(1);

            let button = Arc::clone(&clicked);
            let task_handled = Arc::clone(&handled);
            let ran = Arc::clone(&ran);
            let task_registered = Arc::clone(&registered);
            let transcript = transcript.clone();
            let started = spawn("subscriber", move || {
                let _handled = task_handled.defer_done();
                let mut is_clicked = button.lock();
                task_registered.done();
                while !*is_clicked {
                    is_clicked = button.wait(is_clicked);
                }
                drop(is_clicked);

                transcript.line(handler);
                ran.lock().push(handler);
            });
            if let Err(err) = started {
                handled.done();
                return Err(err.into());
            }

            registered.wait();
        }
        Ok(())
    })?;

    handled.wait();
    let ran = ran.lock().clone();
    Ok(ran)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// WHY: Broadcast must release every subscriber, not just one
    /// WHAT: All three handlers run exactly once
    #[test]
    #[ntest::timeout(5000)]
    fn one_broadcast_runs_every_handler() {
        let transcript = Transcript::capture();
        let mut ran = cond_broadcast(&PracticalConfig::default(), &transcript).unwrap();
        ran.sort_unstable();

        let mut expected = HANDLERS.to_vec();
        expected.sort_unstable();
        assert_eq!(ran, expected);
        for handler in HANDLERS {
            assert_eq!(transcript.count(handler), 1);
        }
    }

    /// WHY: A failed subscription must not leave earlier subscribers parked
    /// WHAT: A subscriber waiting on the gate finishes even though the setup errored
    #[test]
    #[ntest::timeout(5000)]
    fn failed_setup_still_clicks() {
        let button = Arc::new(CondGate::new(false));
        let waiter = Arc::clone(&button);
        let subscriber = std::thread::spawn(move || {
            let mut is_clicked = waiter.lock();
            while !*is_clicked {
                is_clicked = waiter.wait(is_clicked);
            }
        });
        while button.waiting() == 0 {
            std::thread::yield_now();
        }

        let outcome: PracticalResult<()> = click_after(&button, || {
            Err(std::io::Error::other("no more tasks").into())
        });

        assert!(outcome.is_err());
        subscriber.join().unwrap();
        assert!(*button.lock());
    }
}
