use core::fmt;

use crate::adversarial;
use crate::demos::{channels, closures, cond, mutex, once, pool, selects, wait_group};
use crate::error::PracticalResult;
use crate::{PracticalConfig, Transcript};

/// Every runnable demonstration, in catalogue order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Demo {
    HelloChannel,
    ClosedChannel,
    RangeChannel,
    UnblockAll,
    BufferedChannel,
    ChannelOwnership,
    SelectBlocking,
    SelectFairness,
    SelectTimeout,
    SelectDefault,
    SelectWorkLoop,
    ClosureSharedSlot,
    ClosureByValue,
    CondBroadcast,
    MutexArithmetic,
    Once,
    OnceFirstWins,
    OnceDeadlock,
    PoolInstances,
    PoolLoad,
    WaitGroup,
    SyncAdd,
    Deadlock,
    Starvation,
}

impl Demo {
    pub const ALL: [Demo; 24] = [
        Demo::HelloChannel,
        Demo::ClosedChannel,
        Demo::RangeChannel,
        Demo::UnblockAll,
        Demo::BufferedChannel,
        Demo::ChannelOwnership,
        Demo::SelectBlocking,
        Demo::SelectFairness,
        Demo::SelectTimeout,
        Demo::SelectDefault,
        Demo::SelectWorkLoop,
        Demo::ClosureSharedSlot,
        Demo::ClosureByValue,
        Demo::CondBroadcast,
        Demo::MutexArithmetic,
        Demo::Once,
        Demo::OnceFirstWins,
        Demo::OnceDeadlock,
        Demo::PoolInstances,
        Demo::PoolLoad,
        Demo::WaitGroup,
        Demo::SyncAdd,
        Demo::Deadlock,
        Demo::Starvation,
    ];

    /// Demonstrations that hang (or abort the process) by design and so only
    /// run when asked for by name.
    #[must_use]
    pub fn is_hazard(self) -> bool {
        matches!(self, Demo::Deadlock | Demo::OnceDeadlock)
    }

    /// The catalogue minus the hazards, in order.
    pub fn safe() -> impl Iterator<Item = Demo> {
        Self::ALL.into_iter().filter(|demo| !demo.is_hazard())
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Demo::HelloChannel => "hello-channel",
            Demo::ClosedChannel => "closed-channel",
            Demo::RangeChannel => "range-channel",
            Demo::UnblockAll => "unblock-all",
            Demo::BufferedChannel => "buffered-channel",
            Demo::ChannelOwnership => "channel-ownership",
            Demo::SelectBlocking => "select-blocking",
            Demo::SelectFairness => "select-fairness",
            Demo::SelectTimeout => "select-timeout",
            Demo::SelectDefault => "select-default",
            Demo::SelectWorkLoop => "select-work-loop",
            Demo::ClosureSharedSlot => "closure-shared-slot",
            Demo::ClosureByValue => "closure-by-value",
            Demo::CondBroadcast => "cond-broadcast",
            Demo::MutexArithmetic => "mutex-arithmetic",
            Demo::Once => "once",
            Demo::OnceFirstWins => "once-first-wins",
            Demo::OnceDeadlock => "once-deadlock",
            Demo::PoolInstances => "pool-instances",
            Demo::PoolLoad => "pool-load",
            Demo::WaitGroup => "wait-group",
            Demo::SyncAdd => "sync-add",
            Demo::Deadlock => "deadlock",
            Demo::Starvation => "starvation",
        }
    }

    #[must_use]
    pub fn summary(self) -> &'static str {
        match self {
            Demo::HelloChannel => "send a greeting over an unbuffered channel",
            Demo::ClosedChannel => "receive from a closed channel",
            Demo::RangeChannel => "range over a channel until it is closed",
            Demo::UnblockAll => "release five waiting tasks by closing one channel",
            Demo::BufferedChannel => "let a producer run ahead on a buffered channel",
            Demo::ChannelOwnership => "a factory that owns, fills and closes its channel",
            Demo::SelectBlocking => "block in select until a channel closes",
            Demo::SelectFairness => "count picks between two always-ready channels",
            Demo::SelectTimeout => "select on an absent channel with a timeout",
            Demo::SelectDefault => "take the default arm when nothing is ready",
            Demo::SelectWorkLoop => "work until a stop channel is closed",
            Demo::ClosureSharedSlot => "tasks reading a slot the loop overwrites",
            Demo::ClosureByValue => "tasks given their own copy of the value",
            Demo::CondBroadcast => "one broadcast runs every click handler",
            Demo::MutexArithmetic => "balanced increments and decrements under a lock",
            Demo::Once => "100 tasks share one initializer",
            Demo::OnceFirstWins => "the second initializer never runs",
            Demo::OnceDeadlock => "re-enter a once gate from its initializer (fatal)",
            Demo::PoolInstances => "watch a pool construct instances on demand",
            Demo::PoolLoad => "reuse a handful of buffers across many jobs",
            Demo::WaitGroup => "join a single task",
            Demo::SyncAdd => "join five greeters counted up front",
            Demo::Deadlock => "two tasks taking two locks in opposite orders (hangs)",
            Demo::Starvation => "a greedy and a polite worker sharing one lock",
        }
    }

    /// Runs the demonstration, writing its output to `transcript`.
    ///
    /// # Errors
    ///
    /// Fails when a task cannot be started or one of them panics.
    pub fn run(self, config: &PracticalConfig, transcript: &Transcript) -> PracticalResult<()> {
        tracing::info!(demo = %self, "running demonstration");
        let (c, t) = (config, transcript);
        match self {
            Demo::HelloChannel => channels::hello_channel(c, t).map(|_| ()),
            Demo::ClosedChannel => channels::closed_channel(c, t).map(|_| ()),
            Demo::RangeChannel => channels::range_channel(c, t).map(|_| ()),
            Demo::UnblockAll => channels::unblock_all(c, t).map(|_| ()),
            Demo::BufferedChannel => channels::buffered_channel(c, t).map(|_| ()),
            Demo::ChannelOwnership => channels::channel_ownership(c, t).map(|_| ()),
            Demo::SelectBlocking => selects::select_blocking(c, t).map(|_| ()),
            Demo::SelectFairness => selects::select_fairness(c, t).map(|_| ()),
            Demo::SelectTimeout => selects::select_timeout(c, t).map(|_| ()),
            Demo::SelectDefault => selects::select_default(c, t).map(|_| ()),
            Demo::SelectWorkLoop => selects::select_work_loop(c, t).map(|_| ()),
            Demo::ClosureSharedSlot => closures::closure_shared_slot(c, t).map(|_| ()),
            Demo::ClosureByValue => closures::closure_by_value(c, t).map(|_| ()),
            Demo::CondBroadcast => cond::cond_broadcast(c, t).map(|_| ()),
            Demo::MutexArithmetic => mutex::mutex_arithmetic(c, t).map(|_| ()),
            Demo::Once => once::once(c, t).map(|_| ()),
            Demo::OnceFirstWins => once::once_first_wins(c, t).map(|_| ()),
            Demo::OnceDeadlock => once::once_deadlock(c, t).map(|_| ()),
            Demo::PoolInstances => pool::pool_instances(c, t).map(|_| ()),
            Demo::PoolLoad => pool::pool_load(c, t).map(|_| ()),
            Demo::WaitGroup => wait_group::wait_group(c, t).map(|_| ()),
            Demo::SyncAdd => wait_group::sync_add(c, t).map(|_| ()),
            Demo::Deadlock => adversarial::deadlock(c, t).map(|_| ()),
            Demo::Starvation => adversarial::starvation(c, t).map(|_| ()),
        }
    }
}

impl fmt::Display for Demo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
