//! Select: blocking until ready, fairness among ready arms, timeouts, the
//! non-blocking default arm and a work loop polled for a stop signal.

use std::thread;
use std::time::{Duration, Instant};

use foundation_sync::channel::select::work_until;
use foundation_sync::{spawn, Channel, Receiver, Selector};

use crate::error::{join_task, PracticalResult};
use crate::{PracticalConfig, Transcript};

/// Blocks on a channel that is closed after the configured signal delay.
/// Returns how long the select was blocked.
pub fn select_blocking(
    config: &PracticalConfig,
    transcript: &Transcript,
) -> PracticalResult<Duration> {
    let start = Instant::now();
    let signal = Channel::<()>::unbuffered();
    let closed = signal.receiver();

    let delay = config.signal_delay;
    let closer = spawn("closer", move || {
        thread::sleep(delay);
        signal.close();
    })?;

    transcript.line("Blocking on read...");
    let blocked = Selector::new().recv(&closed, |_| start.elapsed()).wait();
    transcript.line(format!("Unblocked {blocked:?} later."));

    join_task(closer)?;
    Ok(blocked)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FairnessCounts {
    pub first: usize,
    pub second: usize,
}

/// Selects repeatedly over two closed, and so always ready, channels.
pub fn select_fairness(
    config: &PracticalConfig,
    transcript: &Transcript,
) -> PracticalResult<FairnessCounts> {
    let first = Channel::<()>::unbuffered();
    first.close();
    let second = Channel::<()>::unbuffered();
    second.close();

    let mut counts = FairnessCounts {
        first: 0,
        second: 0,
    };
    for _ in 0..config.select_iterations {
        let picked_first = Selector::new()
            .recv(first.as_receiver(), |_| true)
            .recv(second.as_receiver(), |_| false)
            .wait();
        if picked_first {
            counts.first += 1;
        } else {
            counts.second += 1;
        }
    }

    transcript.line(format!("first count: {}", counts.first));
    transcript.line(format!("second count: {}", counts.second));
    Ok(counts)
}

/// An absent channel never becomes ready, so only the timeout arm can fire.
pub fn select_timeout(config: &PracticalConfig, transcript: &Transcript) -> PracticalResult<bool> {
    let absent: Option<&Receiver<i32>> = None;

    let timed_out = Selector::new()
        .recv_maybe(absent, |_| false)
        .timeout(config.select_timeout, || true)
        .wait();
    if timed_out {
        transcript.line("Timed out.");
    }
    Ok(timed_out)
}

/// With no arm ready the default arm runs immediately. Returns the time
/// spent before the default was taken, or `None` if a channel arm won.
pub fn select_default(
    _config: &PracticalConfig,
    transcript: &Transcript,
) -> PracticalResult<Option<Duration>> {
    let start = Instant::now();
    let first: Option<&Receiver<i32>> = None;
    let second: Option<&Receiver<i32>> = None;

    let spent = Selector::new()
        .recv_maybe(first, |_| None)
        .recv_maybe(second, |_| None)
        .default(|| Some(start.elapsed()))
        .wait();
    if let Some(spent) = spent {
        transcript.line(format!("In default after {spent:?}"));
    }
    Ok(spent)
}

/// Does units of work, checking a stop channel without blocking before
/// each, until the channel is closed after the signal delay.
pub fn select_work_loop(
    config: &PracticalConfig,
    transcript: &Transcript,
) -> PracticalResult<usize> {
    let done = Channel::<()>::unbuffered();
    let stop = done.receiver();

    let delay = config.signal_delay;
    let stopper = spawn("stopper", move || {
        thread::sleep(delay);
        done.close();
    })?;

    let unit = config.work_unit;
    let cycles = work_until(&stop, || thread::sleep(unit));
    transcript.line(format!(
        "Achieved {cycles} cycles of work before signalled to stop."
    ));

    join_task(stopper)?;
    Ok(cycles)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick() -> PracticalConfig {
        PracticalConfig::default()
            .with_signal_delay(Duration::from_millis(60))
            .with_select_timeout(Duration::from_millis(20))
            .with_work_unit(Duration::from_millis(5))
    }

    #[test]
    #[ntest::timeout(5000)]
    fn blocking_select_waits_for_close() {
        let transcript = Transcript::capture();
        let blocked = select_blocking(&quick(), &transcript).unwrap();
        assert!(blocked >= Duration::from_millis(60));
        assert_eq!(transcript.lines()[0], "Blocking on read...");
    }

    /// WHY: Ready arms are picked uniformly at random
    /// WHAT: 1000 selections over two closed channels split roughly evenly
    #[test]
    fn fairness_splits_roughly_evenly() {
        let counts = select_fairness(&quick(), &Transcript::capture()).unwrap();
        assert_eq!(counts.first + counts.second, 1000);
        assert!(counts.first > 350, "{counts:?}");
        assert!(counts.second > 350, "{counts:?}");
    }

    #[test]
    #[ntest::timeout(5000)]
    fn timeout_arm_fires_for_absent_channel() {
        let transcript = Transcript::capture();
        assert!(select_timeout(&quick(), &transcript).unwrap());
        assert_eq!(transcript.lines(), vec!["Timed out."]);
    }

    #[test]
    fn default_arm_taken_immediately() {
        let transcript = Transcript::capture();
        let spent = select_default(&quick(), &transcript).unwrap();
        assert!(spent.is_some_and(|spent| spent < Duration::from_secs(1)));
        assert_eq!(transcript.lines().len(), 1);
    }

    /// WHY: The loop must keep working until the stop signal and then exit
    /// WHAT: Some but a bounded number of 5ms cycles fit in 60ms
    #[test]
    #[ntest::timeout(5000)]
    fn work_loop_stops_on_signal() {
        let cycles = select_work_loop(&quick(), &Transcript::capture()).unwrap();
        assert!(cycles >= 1);
        assert!(cycles <= 13, "{cycles}");
    }
}
