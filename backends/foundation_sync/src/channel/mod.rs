//! Typed channels with a one-way close lifecycle.
//!
//! A [`Channel`] is the owner handle: it can send, receive and close. The
//! capability handles it hands out cannot close: a [`Sender`] only sends and
//! a [`Receiver`] only receives. Whoever creates a channel is the one that
//! closes it; consumers never do.
//!
//! Capacity `0` is a rendezvous: `send` returns only once a receiver has
//! taken the value. Capacity `n > 0` buffers up to `n` values and `send`
//! blocks only while the buffer is full.
//!
//! Closing is monotonic. After close, buffered values still drain in order
//! and then every receive reports exhaustion. Sending on, or closing, a
//! closed channel is a [`Fault`](crate::Fault).

mod ownership;
pub mod select;

pub use ownership::produce;

use core::fmt;
use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex as StdMutex, MutexGuard as StdGuard};
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::faults::{fatal, unpoison, Fault};
use select::SelectSignal;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TryReceiveError {
    #[error("channel is empty")]
    Empty,

    #[error("channel is closed and drained")]
    Closed,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveTimeoutError {
    #[error("timed out waiting on channel")]
    Timeout,

    #[error("channel is closed and drained")]
    Closed,
}

impl ReceiveTimeoutError {
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, ReceiveTimeoutError::Timeout)
    }
}

/// Returned by `try_send` when the value could not be handed over right now;
/// the value is given back.
#[derive(Clone, PartialEq, Eq)]
pub enum TrySendError<T> {
    Full(T),
}

impl<T> TrySendError<T> {
    pub fn into_inner(self) -> T {
        match self {
            TrySendError::Full(value) => value,
        }
    }
}

impl<T> fmt::Debug for TrySendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrySendError::Full(_) => write!(f, "TrySendError::Full(..)"),
        }
    }
}

impl<T> fmt::Display for TrySendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrySendError::Full(_) => write!(f, "channel has no room or no waiting receiver"),
        }
    }
}

impl<T> core::error::Error for TrySendError<T> {}

/// A queued value tagged with the ticket its sender waits on.
struct Parcel<T> {
    ticket: u64,
    value: T,
}

struct State<T> {
    queue: VecDeque<Parcel<T>>,
    closed: bool,
    /// Tickets handed out so far; each enqueued value takes the next one.
    sent: u64,
    /// Tasks parked in `receive` or `receive_timeout`.
    receivers_waiting: usize,
    /// One entry per selector arm currently registered on this channel.
    watchers: Vec<Arc<SelectSignal>>,
}

impl<T> State<T> {
    fn wake_watchers(&self) {
        for signal in &self.watchers {
            signal.notify();
        }
    }

    /// Tasks that will take a value as soon as one is queued.
    fn ready_receivers(&self) -> usize {
        self.receivers_waiting + self.watchers.len()
    }

    fn position(&self, ticket: u64) -> Option<usize> {
        self.queue.iter().position(|parcel| parcel.ticket == ticket)
    }
}

pub(crate) struct Shared<T> {
    capacity: usize,
    state: StdMutex<State<T>>,
    readable: Condvar,
    writable: Condvar,
}

impl<T> Shared<T> {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: StdMutex::new(State {
                queue: VecDeque::with_capacity(capacity),
                closed: false,
                sent: 0,
                receivers_waiting: 0,
                watchers: Vec::new(),
            }),
            readable: Condvar::new(),
            writable: Condvar::new(),
        }
    }

    fn lock(&self) -> StdGuard<'_, State<T>> {
        unpoison(self.state.lock())
    }

    /// Slots a sender may fill; a rendezvous channel parks one value while
    /// its sender waits for the pickup.
    fn slots(&self) -> usize {
        self.capacity.max(1)
    }

    fn enqueue(&self, state: &mut State<T>, value: T) -> u64 {
        state.sent += 1;
        let ticket = state.sent;
        state.queue.push_back(Parcel { ticket, value });
        state.wake_watchers();
        self.readable.notify_one();
        ticket
    }

    /// Takes back a value nobody picked up.
    fn withdraw(&self, state: &mut State<T>, ticket: u64) -> Option<T> {
        let index = state.position(ticket)?;
        let parcel = state.queue.remove(index)?;
        self.writable.notify_all();
        Some(parcel.value)
    }

    fn send(&self, value: T) {
        let mut state = self.lock();
        loop {
            if state.closed {
                drop(state);
                fatal(Fault::SendOnClosedChannel);
            }
            if state.queue.len() < self.slots() {
                break;
            }
            state = unpoison(self.writable.wait(state));
        }

        let ticket = self.enqueue(&mut state, value);
        if self.capacity > 0 {
            return;
        }

        while state.position(ticket).is_some() {
            if state.closed {
                // Never picked up, so never delivered.
                let _ = self.withdraw(&mut state, ticket);
                drop(state);
                fatal(Fault::SendOnClosedChannel);
            }
            state = unpoison(self.writable.wait(state));
        }
    }

    fn try_send(&self, value: T) -> Result<(), TrySendError<T>> {
        let mut state = self.lock();
        if state.closed {
            drop(state);
            fatal(Fault::SendOnClosedChannel);
        }

        if self.capacity > 0 {
            if state.queue.len() >= self.capacity {
                return Err(TrySendError::Full(value));
            }
            self.enqueue(&mut state, value);
            return Ok(());
        }

        if state.ready_receivers() <= state.queue.len() {
            return Err(TrySendError::Full(value));
        }

        // Complete the hand-off to one of the ready receivers, or take the
        // value back if they all leave without it.
        let ticket = self.enqueue(&mut state, value);
        while let Some(index) = state.position(ticket) {
            if state.closed {
                let _ = self.withdraw(&mut state, ticket);
                drop(state);
                fatal(Fault::SendOnClosedChannel);
            }
            if state.ready_receivers() <= index {
                return match self.withdraw(&mut state, ticket) {
                    Some(value) => Err(TrySendError::Full(value)),
                    None => Ok(()),
                };
            }
            state = unpoison(self.writable.wait(state));
        }
        Ok(())
    }

    fn dequeue(&self, state: &mut State<T>) -> Option<T> {
        let parcel = state.queue.pop_front()?;
        // Both room-waiters and rendezvous senders park on `writable`.
        self.writable.notify_all();
        Some(parcel.value)
    }

    fn receive(&self) -> Option<T> {
        let mut state = self.lock();
        loop {
            if let Some(value) = self.dequeue(&mut state) {
                return Some(value);
            }
            if state.closed {
                return None;
            }
            state.receivers_waiting += 1;
            state = unpoison(self.readable.wait(state));
            state.receivers_waiting -= 1;
        }
    }

    fn try_receive(&self) -> Result<T, TryReceiveError> {
        let mut state = self.lock();
        match self.dequeue(&mut state) {
            Some(value) => Ok(value),
            None if state.closed => Err(TryReceiveError::Closed),
            None => Err(TryReceiveError::Empty),
        }
    }

    fn receive_timeout(&self, timeout: Duration) -> Result<T, ReceiveTimeoutError> {
        let deadline = Instant::now() + timeout;
        let mut state = self.lock();
        loop {
            if let Some(value) = self.dequeue(&mut state) {
                return Ok(value);
            }
            if state.closed {
                return Err(ReceiveTimeoutError::Closed);
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(ReceiveTimeoutError::Timeout);
            }
            state.receivers_waiting += 1;
            state = unpoison(self.readable.wait_timeout(state, deadline - now)).0;
            state.receivers_waiting -= 1;
        }
    }

    fn close(&self) {
        let mut state = self.lock();
        if state.closed {
            drop(state);
            fatal(Fault::CloseOfClosedChannel);
        }
        state.closed = true;
        state.wake_watchers();
        let buffered = state.queue.len();
        drop(state);

        self.readable.notify_all();
        self.writable.notify_all();
        tracing::debug!(buffered, "channel closed");
    }

    fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn len(&self) -> usize {
        self.lock().queue.len()
    }

    /// Registers a selector arm. It counts as a ready receiver until
    /// [`Self::unwatch`].
    pub(crate) fn watch(&self, signal: &Arc<SelectSignal>) {
        self.lock().watchers.push(Arc::clone(signal));
    }

    pub(crate) fn unwatch(&self, signal: &Arc<SelectSignal>) {
        let mut state = self.lock();
        if let Some(index) = state
            .watchers
            .iter()
            .position(|watcher| Arc::ptr_eq(watcher, signal))
        {
            state.watchers.swap_remove(index);
        }
        drop(state);
        // A pending rendezvous try_send re-checks who is still ready.
        self.writable.notify_all();
    }
}

/// Write capability of a channel. Cannot close it.
pub struct Sender<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Sender<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Sender<T> {
    /// Blocks until the value is handed over (capacity 0) or buffered.
    ///
    /// # Panics
    ///
    /// Raises [`Fault::SendOnClosedChannel`] if the channel is closed, or
    /// closes while this call waits for room or for the pickup. A value that
    /// was never picked up is discarded, not drained.
    pub fn send(&self, value: T) {
        self.shared.send(value);
    }

    /// Sends only if a buffer slot is free or, for a rendezvous channel, a
    /// receiver is already waiting. A blocked [`Receiver::receive`] and a
    /// parked select arm both count as waiting; the call returns once one of
    /// them has taken the value.
    ///
    /// # Errors
    ///
    /// [`TrySendError::Full`] when the buffer is full, or for a rendezvous
    /// channel when no receiver is waiting or every waiting receiver left
    /// without the value.
    ///
    /// # Panics
    ///
    /// Raises [`Fault::SendOnClosedChannel`] if the channel is closed, or
    /// closes before a rendezvous hand-off completes.
    pub fn try_send(&self, value: T) -> Result<(), TrySendError<T>> {
        self.shared.try_send(value)
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }
}

impl<T> fmt::Debug for Sender<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sender")
            .field("capacity", &self.capacity())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Read capability of a channel. Cannot send or close.
pub struct Receiver<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Receiver<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Receiver<T> {
    /// Blocks until a value arrives (`Some`) or the channel is closed and
    /// drained (`None`).
    #[must_use]
    pub fn receive(&self) -> Option<T> {
        self.shared.receive()
    }

    /// Comma-ok receive: `(value, true)`, or `(T::default(), false)` once the
    /// channel is closed and drained.
    #[must_use]
    pub fn receive_ok(&self) -> (T, bool)
    where
        T: Default,
    {
        match self.receive() {
            Some(value) => (value, true),
            None => (T::default(), false),
        }
    }

    /// # Errors
    ///
    /// [`TryReceiveError::Empty`] when nothing is buffered,
    /// [`TryReceiveError::Closed`] when closed and drained.
    pub fn try_receive(&self) -> Result<T, TryReceiveError> {
        self.shared.try_receive()
    }

    /// # Errors
    ///
    /// [`ReceiveTimeoutError::Timeout`] when nothing arrived in time,
    /// [`ReceiveTimeoutError::Closed`] when closed and drained.
    pub fn receive_timeout(&self, timeout: Duration) -> Result<T, ReceiveTimeoutError> {
        self.shared.receive_timeout(timeout)
    }

    /// Blocking iterator over every value sent before close.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter { receiver: self }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    pub(crate) fn shared(&self) -> &Shared<T> {
        &self.shared
    }
}

impl<T> fmt::Debug for Receiver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Receiver")
            .field("capacity", &self.capacity())
            .field("buffered", &self.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Iterator returned by [`Receiver::iter`]; ends once the channel is closed
/// and drained and never yields again afterwards.
pub struct Iter<'a, T> {
    receiver: &'a Receiver<T>,
}

impl<T> Iterator for Iter<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.receiver.receive()
    }
}

impl<'a, T> IntoIterator for &'a Receiver<T> {
    type Item = T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

/// Owning iterator over a [`Receiver`].
pub struct IntoIter<T> {
    receiver: Receiver<T>,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.receiver.receive()
    }
}

impl<T> IntoIterator for Receiver<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> IntoIter<T> {
        IntoIter { receiver: self }
    }
}

/// Owner handle of a channel: the only handle that can close it.
///
/// Not `Clone`. Dropping it does not close the channel; the owner closes
/// explicitly once it is done producing.
pub struct Channel<T> {
    sender: Sender<T>,
    receiver: Receiver<T>,
}

impl<T> Channel<T> {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let shared = Arc::new(Shared::new(capacity));
        Self {
            sender: Sender {
                shared: Arc::clone(&shared),
            },
            receiver: Receiver { shared },
        }
    }

    /// A rendezvous channel.
    #[must_use]
    pub fn unbuffered() -> Self {
        Self::new(0)
    }

    /// Hands out a write capability.
    #[must_use]
    pub fn sender(&self) -> Sender<T> {
        self.sender.clone()
    }

    /// Hands out a read capability.
    #[must_use]
    pub fn receiver(&self) -> Receiver<T> {
        self.receiver.clone()
    }

    #[must_use]
    pub fn as_sender(&self) -> &Sender<T> {
        &self.sender
    }

    #[must_use]
    pub fn as_receiver(&self) -> &Receiver<T> {
        &self.receiver
    }

    /// See [`Sender::send`].
    pub fn send(&self, value: T) {
        self.sender.send(value);
    }

    /// See [`Sender::try_send`].
    ///
    /// # Errors
    ///
    /// [`TrySendError::Full`] when the value cannot be handed over now.
    pub fn try_send(&self, value: T) -> Result<(), TrySendError<T>> {
        self.sender.try_send(value)
    }

    /// See [`Receiver::receive`].
    #[must_use]
    pub fn receive(&self) -> Option<T> {
        self.receiver.receive()
    }

    /// See [`Receiver::receive_ok`].
    #[must_use]
    pub fn receive_ok(&self) -> (T, bool)
    where
        T: Default,
    {
        self.receiver.receive_ok()
    }

    /// See [`Receiver::try_receive`].
    ///
    /// # Errors
    ///
    /// Same as [`Receiver::try_receive`].
    pub fn try_receive(&self) -> Result<T, TryReceiveError> {
        self.receiver.try_receive()
    }

    pub fn iter(&self) -> Iter<'_, T> {
        self.receiver.iter()
    }

    /// Closes the channel: no more sends, receivers drain what is buffered.
    ///
    /// # Panics
    ///
    /// Raises [`Fault::CloseOfClosedChannel`] if already closed.
    pub fn close(&self) {
        self.receiver.shared.close();
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.receiver.is_closed()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.receiver.capacity()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> AsRef<Receiver<T>> for Channel<T> {
    fn as_ref(&self) -> &Receiver<T> {
        &self.receiver
    }
}

impl<T> fmt::Debug for Channel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("capacity", &self.capacity())
            .field("buffered", &self.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}
