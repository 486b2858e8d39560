//! Readiness multiplexing over several receivers.
//!
//! A [`Selector`] collects receive arms plus an optional timeout arm or
//! default arm, then [`Selector::wait`] commits to exactly one of them:
//!
//! - when one or more receive arms are ready, one of them is picked uniformly
//!   at random and its handler runs;
//! - otherwise the default arm runs immediately, if there is one;
//! - otherwise the selector blocks until an arm becomes ready or the timeout
//!   elapses.
//!
//! A receive arm is ready when its channel holds a value or is closed; a
//! closed and drained channel is ready forever and its handler sees `None`.
//! Handlers run after the selector has stopped watching its channels.
//!
//! ```
//! use foundation_sync::{Channel, Selector};
//! use std::time::Duration;
//!
//! let ready = Channel::<u32>::new(1);
//! ready.send(7);
//! let quiet = Channel::<u32>::new(1);
//!
//! let got = Selector::new()
//!     .recv(ready.as_receiver(), |v| v)
//!     .recv(quiet.as_receiver(), |v| v)
//!     .timeout(Duration::from_secs(1), || None)
//!     .wait();
//! assert_eq!(got, Some(7));
//! ```

use std::sync::{Arc, Condvar, Mutex as StdMutex};
use std::time::{Duration, Instant};

use super::{Receiver, TryReceiveError};
use crate::faults::{fatal, unpoison, Fault};

/// Wake-up latch a waiting selector registers with every channel it watches.
pub(crate) struct SelectSignal {
    ready: StdMutex<bool>,
    cond: Condvar,
}

impl SelectSignal {
    fn new() -> Self {
        Self {
            ready: StdMutex::new(false),
            cond: Condvar::new(),
        }
    }

    pub(crate) fn notify(&self) {
        *unpoison(self.ready.lock()) = true;
        self.cond.notify_all();
    }

    /// Parks until notified or `deadline` passes. Returns `false` on timeout.
    fn wait_until(&self, deadline: Option<Instant>) -> bool {
        let mut ready = unpoison(self.ready.lock());
        while !*ready {
            match deadline {
                None => ready = unpoison(self.cond.wait(ready)),
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return false;
                    }
                    ready = unpoison(self.cond.wait_timeout(ready, deadline - now)).0;
                }
            }
        }
        *ready = false;
        true
    }
}

type Fallback<'a, R> = Box<dyn FnOnce() -> R + 'a>;

type Unwatch<'a> = Box<dyn FnOnce() + 'a>;

trait Arm<'a, R> {
    /// Takes the arm's value if its channel is ready and returns the
    /// handler bound to it, to be run once the selector has unregistered.
    fn attempt(&mut self) -> Option<Fallback<'a, R>>;

    fn watch(&self, signal: &Arc<SelectSignal>) -> Unwatch<'a>;
}

struct ReceiveArm<'a, T, F> {
    receiver: &'a Receiver<T>,
    handler: Option<F>,
}

impl<'a, T, R, F> Arm<'a, R> for ReceiveArm<'a, T, F>
where
    T: 'a,
    F: FnOnce(Option<T>) -> R + 'a,
{
    fn attempt(&mut self) -> Option<Fallback<'a, R>> {
        let value = match self.receiver.try_receive() {
            Ok(value) => Some(value),
            Err(TryReceiveError::Closed) => None,
            Err(TryReceiveError::Empty) => return None,
        };
        let handler = self.handler.take()?;
        Some(Box::new(move || handler(value)))
    }

    fn watch(&self, signal: &Arc<SelectSignal>) -> Unwatch<'a> {
        let receiver = self.receiver;
        receiver.shared().watch(signal);
        let signal = Arc::clone(signal);
        Box::new(move || receiver.shared().unwatch(&signal))
    }
}

/// Unregisters a parked selector from every channel it watches, on every
/// exit path.
struct Registration<'a>(Vec<Unwatch<'a>>);

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        for unwatch in self.0.drain(..) {
            unwatch();
        }
    }
}

/// Builder for a one-shot select. See the module docs.
pub struct Selector<'a, R> {
    arms: Vec<Box<dyn Arm<'a, R> + 'a>>,
    timeout: Option<(Duration, Fallback<'a, R>)>,
    default: Option<Fallback<'a, R>>,
}

impl<R> Default for Selector<'_, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, R> Selector<'a, R> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            arms: Vec::new(),
            timeout: None,
            default: None,
        }
    }

    /// Adds a receive arm. `handler` gets `Some(value)`, or `None` when the
    /// channel is closed and drained.
    #[must_use]
    pub fn recv<T, F>(mut self, receiver: &'a Receiver<T>, handler: F) -> Self
    where
        T: 'a,
        F: FnOnce(Option<T>) -> R + 'a,
    {
        self.arms.push(Box::new(ReceiveArm {
            receiver,
            handler: Some(handler),
        }));
        self
    }

    /// Adds a receive arm over an absent channel. An absent arm is never
    /// ready, like a receive on a nil channel.
    #[must_use]
    pub fn recv_maybe<T, F>(self, receiver: Option<&'a Receiver<T>>, handler: F) -> Self
    where
        T: 'a,
        F: FnOnce(Option<T>) -> R + 'a,
    {
        match receiver {
            Some(receiver) => self.recv(receiver, handler),
            None => self,
        }
    }

    /// Arm that fires once `after` elapses without any receive arm ready.
    /// The clock starts when [`Self::wait`] is called.
    #[must_use]
    pub fn timeout<F>(mut self, after: Duration, handler: F) -> Self
    where
        F: FnOnce() -> R + 'a,
    {
        self.timeout = Some((after, Box::new(handler)));
        self
    }

    /// Arm taken immediately when no receive arm is ready, making the select
    /// non-blocking.
    #[must_use]
    pub fn default<F>(mut self, handler: F) -> Self
    where
        F: FnOnce() -> R + 'a,
    {
        self.default = Some(Box::new(handler));
        self
    }

    /// Commits to exactly one arm and returns its handler's result.
    ///
    /// # Panics
    ///
    /// Raises [`Fault::NoLiveSelectArms`] when there is no receive arm, no
    /// timeout and no default, since such a select could never return.
    pub fn wait(mut self) -> R {
        if let Some(fire) = self.poll_arms() {
            return fire();
        }
        if let Some(default) = self.default.take() {
            return default();
        }
        if self.arms.is_empty() && self.timeout.is_none() {
            fatal(Fault::NoLiveSelectArms);
        }

        let deadline = self
            .timeout
            .as_ref()
            .map(|(after, _)| Instant::now() + *after);

        // While registered the selector counts as a ready receiver on each
        // of its channels, so it must poll again after every wake-up.
        let signal = Arc::new(SelectSignal::new());
        let registration = Registration(self.arms.iter().map(|arm| arm.watch(&signal)).collect());

        let fire = loop {
            if let Some(fire) = self.poll_arms() {
                break fire;
            }
            if !signal.wait_until(deadline) {
                if let Some(fire) = self.poll_arms() {
                    break fire;
                }
                if let Some((_, on_timeout)) = self.timeout.take() {
                    tracing::trace!("select timed out");
                    break on_timeout;
                }
            }
        };

        drop(registration);
        fire()
    }

    fn poll_arms(&mut self) -> Option<Fallback<'a, R>> {
        let mut order: Vec<usize> = (0..self.arms.len()).collect();
        fastrand::shuffle(&mut order);
        order.into_iter().find_map(|i| self.arms[i].attempt())
    }
}

/// Runs `work` until `stop` becomes ready (closed, or carrying a value),
/// checking it without blocking before each unit. Returns how many units ran.
pub fn work_until<S, F>(stop: &Receiver<S>, mut work: F) -> usize
where
    F: FnMut(),
{
    let mut cycles = 0;
    loop {
        let stopped = Selector::new()
            .recv(stop, |_| true)
            .default(|| false)
            .wait();
        if stopped {
            return cycles;
        }
        work();
        cycles += 1;
    }
}
