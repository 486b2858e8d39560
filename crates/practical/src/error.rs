use std::any::Any;

use foundation_sync::{fault_of, Fault, TaskHandle};

pub type PracticalResult<T> = std::result::Result<T, PracticalError>;

#[derive(Debug, derive_more::From)]
pub enum PracticalError {
    /// A task could not be started.
    Spawn(std::io::Error),

    /// A task unwound with a misuse fault.
    Fault(Fault),

    /// A task panicked with something other than a fault.
    #[from(ignore)]
    TaskPanicked(String),
}

impl std::error::Error for PracticalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Spawn(err) => Some(err),
            Self::Fault(fault) => Some(fault),
            Self::TaskPanicked(_) => None,
        }
    }
}

impl core::fmt::Display for PracticalError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Spawn(err) => write!(f, "failed to start task: {err}"),
            Self::Fault(fault) => write!(f, "task raised a fault: {fault}"),
            Self::TaskPanicked(task) => write!(f, "task `{task}` panicked"),
        }
    }
}

impl PracticalError {
    /// Classifies the panic payload of `task`.
    #[must_use]
    pub fn from_panic(task: &str, payload: &(dyn Any + Send)) -> Self {
        match fault_of(payload) {
            Some(fault) => Self::Fault(fault),
            None => Self::TaskPanicked(task.to_owned()),
        }
    }
}

/// Joins `handle`, turning a panic into a [`PracticalError`].
pub(crate) fn join_task<R>(handle: TaskHandle<R>) -> PracticalResult<R> {
    let name = handle.name().to_owned();
    handle
        .join()
        .map_err(|payload| PracticalError::from_panic(&name, payload.as_ref()))
}
