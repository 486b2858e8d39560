//! Concurrency coordination toolkit.
//!
//! Typed channels with a close lifecycle, a select multiplexer over channel
//! readiness, an exclusive lock with holder tracking, a condition gate, a
//! one-shot gate, a resource pool and a wait group.
//!
//! Misuse of any primitive (sending on a closed channel, releasing a lock you
//! do not hold, driving a wait group negative, re-entering a one-shot gate)
//! is a [`Fault`] and is raised through [`faults::fatal`], never returned as
//! a recoverable error.

pub mod channel;
pub mod cond;
pub mod drops;
pub mod faults;
pub mod lock;
pub mod once;
pub mod pool;
pub mod tasks;
pub mod wait_group;

pub use channel::{
    produce, select::Selector, Channel, Iter, ReceiveTimeoutError, Receiver, Sender,
    TryReceiveError, TrySendError,
};
pub use cond::CondGate;
pub use drops::RunOnDrop;
pub use faults::{fatal, fault_of, Fault};
pub use lock::{Mutex, MutexGuard, RawLock};
pub use once::Once;
pub use pool::Pool;
pub use tasks::{spawn, TaskHandle, WorkerPool};
pub use wait_group::{DoneGuard, WaitGroup};
