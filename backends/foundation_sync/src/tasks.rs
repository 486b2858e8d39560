//! Lightweight named tasks and a channel-fed worker set.

use std::io;
use std::mem;
use std::thread::{self, JoinHandle};

use crate::channel::Channel;

/// Stack size of every task. Kept small since scenarios start thousands.
const TASK_STACK_SIZE: usize = 256 * 1024;

/// Join handle of a task started with [`spawn`].
pub struct TaskHandle<R> {
    name: String,
    inner: JoinHandle<R>,
}

impl<R> TaskHandle<R> {
    /// Waits for the task. `Err` carries the panic payload if it unwound,
    /// which [`crate::fault_of`] can inspect.
    ///
    /// # Errors
    ///
    /// The task's panic payload when it panicked.
    pub fn join(self) -> thread::Result<R> {
        self.inner.join()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }
}

impl<R> core::fmt::Debug for TaskHandle<R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TaskHandle")
            .field("name", &self.name)
            .field("finished", &self.is_finished())
            .finish()
    }
}

/// Starts `f` as an independent task.
///
/// # Errors
///
/// Returns the OS error if the task could not be created.
pub fn spawn<F, R>(name: impl Into<String>, f: F) -> io::Result<TaskHandle<R>>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    let name = name.into();
    let inner = thread::Builder::new()
        .name(name.clone())
        .stack_size(TASK_STACK_SIZE)
        .spawn(f)?;
    tracing::trace!(task = %name, "spawned task");
    Ok(TaskHandle { name, inner })
}

type Job = Box<dyn FnOnce() + Send + 'static>;

/// A fixed set of worker tasks draining a shared job channel.
///
/// The pool owns the job channel and is the only party that closes it:
/// [`WorkerPool::shutdown`] (or drop) closes it, and workers exit once the
/// remaining jobs are drained.
pub struct WorkerPool {
    jobs: Channel<Job>,
    workers: Vec<TaskHandle<()>>,
}

impl WorkerPool {
    /// Starts `workers` worker tasks (at least one).
    ///
    /// # Errors
    ///
    /// Returns the spawn error of the first worker that failed to start; the
    /// workers already started are shut down.
    pub fn new(workers: usize) -> io::Result<Self> {
        let workers = workers.max(1);
        let mut pool = Self {
            jobs: Channel::new(workers * 4),
            workers: Vec::with_capacity(workers),
        };

        for id in 0..workers {
            let jobs = pool.jobs.receiver();
            let handle = spawn(format!("worker-{id}"), move || {
                for job in &jobs {
                    job();
                }
            })?;
            pool.workers.push(handle);
        }

        tracing::debug!(workers, "worker pool started");
        Ok(pool)
    }

    /// Queues `job`, blocking while every worker is busy and the queue is full.
    pub fn submit<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.jobs.send(Box::new(job));
    }

    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers.len()
    }

    /// Closes the job queue and joins every worker once the queue drains.
    ///
    /// # Errors
    ///
    /// The panic payload of the first worker whose job panicked.
    pub fn shutdown(mut self) -> thread::Result<()> {
        self.jobs.close();
        let mut outcome = Ok(());
        for worker in mem::take(&mut self.workers) {
            if let Err(payload) = worker.join() {
                if outcome.is_ok() {
                    outcome = Err(payload);
                }
            }
        }
        tracing::debug!("worker pool shut down");
        outcome
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if !self.jobs.is_closed() {
            self.jobs.close();
        }
    }
}

impl core::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.workers.len())
            .field("queued", &self.jobs.len())
            .finish()
    }
}
