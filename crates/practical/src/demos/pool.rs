use std::sync::Arc;

use foundation_sync::{Pool, WorkerPool};

use crate::error::{PracticalError, PracticalResult};
use crate::{PracticalConfig, Transcript};

const BUFFER_SIZE: usize = 1024;
const SEEDED_BUFFERS: usize = 4;

#[derive(Debug)]
struct Instance;

/// get, get, put, get: the constructor runs twice. Returns the number of
/// constructions.
pub fn pool_instances(
    _config: &PracticalConfig,
    transcript: &Transcript,
) -> PracticalResult<usize> {
    let log = transcript.clone();
    let pool = Pool::new(move || {
        log.line("Creating new instance.");
        Instance
    });

    let _first = pool.get();
    let instance = pool.get();
    pool.put(instance);
    let _third = pool.get();

    Ok(pool.created())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolLoad {
    pub jobs: usize,
    pub created: usize,
}

/// Seeds the pool with four 1 KiB buffers, then runs `pool_jobs` jobs that
/// each borrow and return a buffer across the configured workers.
pub fn pool_load(config: &PracticalConfig, transcript: &Transcript) -> PracticalResult<PoolLoad> {
    let pool = Arc::new(Pool::new(|| Box::new([0u8; BUFFER_SIZE])));

    let seeded: Vec<_> = (0..SEEDED_BUFFERS).map(|_| pool.get()).collect();
    for buffer in seeded {
        pool.put(buffer);
    }

    let workers = WorkerPool::new(config.workers)?;
    for _ in 0..config.pool_jobs {
        let pool = Arc::clone(&pool);
        workers.submit(move || {
            let memory = pool.get();
            pool.put(memory);
        });
    }
    workers
        .shutdown()
        .map_err(|payload| PracticalError::from_panic("pool-worker", payload.as_ref()))?;

    let created = pool.created();
    transcript.line(format!("{created} buffers were created."));
    Ok(PoolLoad {
        jobs: config.pool_jobs,
        created,
    })
}
