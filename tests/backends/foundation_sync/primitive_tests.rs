use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ewe_practical_tests::fault_raised_by;
use foundation_sync::{
    spawn, Channel, CondGate, Fault, Mutex, Once, Pool, RawLock, RunOnDrop, WaitGroup, WorkerPool,
};

/// WHY: Pool `get` must never block, even with many callers
/// WHAT: 10_000 get/put jobs on 64 workers finish well inside the timeout
#[test]
#[ntest::timeout(30000)]
fn test_pool_get_never_blocks_under_load() {
    let pool = Arc::new(Pool::new(|| vec![0u8; 1024]));
    let workers = WorkerPool::new(64).unwrap();

    for _ in 0..10_000 {
        let pool = Arc::clone(&pool);
        workers.submit(move || {
            let buffer = pool.get();
            pool.put(buffer);
        });
    }
    workers.shutdown().unwrap();

    assert!(pool.created() <= 10_000);
    assert_eq!(pool.available(), pool.created());
}

/// WHY: Pool `get` must never block with 10_000 callers live at the same time
/// WHAT: 10_000 tasks released together each get and put once, then all report done
#[test]
#[ntest::timeout(60000)]
fn test_pool_get_never_blocks_with_ten_thousand_live_tasks() {
    const CALLERS: usize = 10_000;

    let pool = Arc::new(Pool::new(|| vec![0u8; 1024]));
    let wg = Arc::new(WaitGroup::new());
    let begin = Channel::<()>::unbuffered();
    let finished = Arc::new(AtomicUsize::new(0));

    {
        let release = RunOnDrop::new(|| begin.close());
        for i in 0..CALLERS {
            wg.add(1);
            let pool = Arc::clone(&pool);
            let wg = Arc::clone(&wg);
            let gate = begin.receiver();
            let finished = Arc::clone(&finished);
            spawn(format!("pool-caller-{i}"), move || {
                let _done = wg.defer_done();
                // Parks until `begin` is closed so every caller races at once.
                let _ = gate.receive();
                let buffer = pool.get();
                pool.put(buffer);
                finished.fetch_add(1, Ordering::Relaxed);
            })
            .unwrap();
        }
        drop(release);
    }

    wg.wait();
    assert_eq!(finished.load(Ordering::Relaxed), CALLERS);
    assert!(pool.created() <= CALLERS);
    assert_eq!(pool.available(), pool.created());
}

/// WHY: A wait group join must not return early and must not go negative
/// WHAT: wait returns after all done; one extra done is a fault
#[test]
#[ntest::timeout(5000)]
fn test_wait_group_join_and_underflow() {
    let wg = Arc::new(WaitGroup::new());
    let finished = Arc::new(AtomicUsize::new(0));

    wg.add(20);
    for i in 0..20 {
        let wg = Arc::clone(&wg);
        let finished = Arc::clone(&finished);
        spawn(format!("unit-{i}"), move || {
            let _done = wg.defer_done();
            finished.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    }

    wg.wait();
    assert_eq!(finished.load(Ordering::SeqCst), 20);
    assert_eq!(fault_raised_by(|| wg.done()), Some(Fault::NegativeWaitGroupCounter));
}

#[test]
fn test_lock_misuse_faults() {
    let lock = RawLock::new();
    assert_eq!(fault_raised_by(|| lock.release()), Some(Fault::ReleaseOfUnheldLock));

    lock.acquire();
    assert_eq!(fault_raised_by(|| lock.acquire()), Some(Fault::RecursiveLock));
    lock.release();
}

#[test]
#[ntest::timeout(5000)]
fn test_release_by_other_task_is_a_fault() {
    let lock = Arc::new(RawLock::new());
    lock.acquire();

    let other = Arc::clone(&lock);
    let outcome = spawn("intruder", move || fault_raised_by(|| other.release()))
        .unwrap()
        .join()
        .unwrap();

    assert_eq!(outcome, Some(Fault::ReleaseByNonHolder));
    lock.release();
}

/// WHY: Mutual recursion through one gate is the documented once hazard
/// WHAT: The nested call is a fault and the gate stays unusable
#[test]
fn test_once_reentry_then_poisoned() {
    let gate = Once::new();
    assert_eq!(
        fault_raised_by(|| gate.call_once(|| gate.call_once(|| {}))),
        Some(Fault::ReentrantOnce)
    );
    assert_eq!(fault_raised_by(|| gate.call_once(|| {})), Some(Fault::PoisonedOnce));
}

/// WHY: A condition gate is enough to build a bounded hand-off queue
/// WHAT: A producer and a consumer exchange 500 items through a 2-slot queue guarded by signal
#[test]
#[ntest::timeout(10000)]
fn test_cond_gate_bounded_queue() {
    const CAPACITY: usize = 2;
    let queue = Arc::new(CondGate::new(Vec::<u32>::new()));

    let producer_queue = Arc::clone(&queue);
    let producer = spawn("producer", move || {
        for i in 0..500 {
            let mut items = producer_queue.lock();
            while items.len() == CAPACITY {
                items = producer_queue.wait(items);
            }
            items.push(i);
            drop(items);
            producer_queue.broadcast();
        }
    })
    .unwrap();

    let mut received = Vec::new();
    while received.len() < 500 {
        let mut items = queue.lock();
        while items.is_empty() {
            items = queue.wait(items);
        }
        received.append(&mut *items);
        drop(items);
        queue.signal();
    }

    producer.join().unwrap();
    assert_eq!(received, (0..500).collect::<Vec<_>>());
}

#[test]
fn test_mutex_into_inner_after_threads() {
    let counter = Arc::new(Mutex::new(0u64));
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let counter = Arc::clone(&counter);
            spawn(format!("adder-{i}"), move || {
                for _ in 0..250 {
                    *counter.lock() += 1;
                }
            })
            .unwrap()
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let counter = Arc::try_unwrap(counter).unwrap();
    assert_eq!(counter.into_inner(), 1000);
}
