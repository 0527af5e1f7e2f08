use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Barrier,
    },
    thread,
    time::{Duration, Instant},
};

use threadpool::ThreadPool;
use timeout_waitgroup::{TimeoutWaitGroup, WaitOutcome};

fn spawn_waiter(
    wg: &Arc<TimeoutWaitGroup>,
    timeout: Option<Duration>,
) -> (Arc<AtomicBool>, thread::JoinHandle<WaitOutcome>) {
    let waiting = Arc::new(AtomicBool::new(true));
    let flag = waiting.clone();
    let wg = wg.clone();
    let handle = thread::spawn(move || {
        let outcome = wg.wait_for(timeout);
        flag.store(false, Ordering::SeqCst);
        outcome
    });
    (waiting, handle)
}

#[test]
fn test_zero_wait_group_falls_through() {
    let wg = TimeoutWaitGroup::new();
    let start = Instant::now();
    assert_eq!(wg.wait(), WaitOutcome::Drained);
    assert_eq!(wg.wait_timeout(Duration::from_secs(10)), WaitOutcome::Drained);
    assert!(start.elapsed() < Duration::from_secs(1));
    assert_eq!(wg.waiter_count(), 0);
}

#[test]
#[should_panic(expected = "negative TimeoutWaitGroup counter")]
fn test_zero_wait_group_panics_on_done() {
    let wg = TimeoutWaitGroup::new();
    wg.done();
}

#[test]
fn test_wait_unblocks_on_done() {
    let wg = Arc::new(TimeoutWaitGroup::new());
    wg.add(1);

    let (waiting, handle) = spawn_waiter(&wg, None);
    thread::sleep(Duration::from_millis(100));
    assert!(waiting.load(Ordering::SeqCst));

    wg.done();
    thread::sleep(Duration::from_millis(100));
    assert!(!waiting.load(Ordering::SeqCst));
    assert_eq!(handle.join().unwrap(), WaitOutcome::Drained);

    // anyone arriving after the drain falls straight through
    assert_eq!(wg.wait(), WaitOutcome::Drained);
}

#[test]
fn test_wait_times_out_without_done() {
    let wg = Arc::new(TimeoutWaitGroup::new());
    wg.add(1);

    let start = Instant::now();
    let (waiting, handle) = spawn_waiter(&wg, Some(Duration::from_millis(200)));
    thread::sleep(Duration::from_millis(100));
    assert!(waiting.load(Ordering::SeqCst));

    thread::sleep(Duration::from_millis(222));
    assert!(!waiting.load(Ordering::SeqCst));
    assert_eq!(handle.join().unwrap(), WaitOutcome::TimedOut);
    assert!(start.elapsed() >= Duration::from_millis(200));

    wg.done();
    assert_eq!(wg.waiter_count(), 0);
    assert!(wg.is_drained());
}

#[test]
fn test_timeout_beyond_clock_range_waits_for_done() {
    let wg = Arc::new(TimeoutWaitGroup::new());
    wg.add(1);

    let (waiting, handle) = spawn_waiter(&wg, Some(Duration::MAX));
    thread::sleep(Duration::from_millis(100));
    assert!(waiting.load(Ordering::SeqCst));

    wg.done();
    assert_eq!(handle.join().unwrap(), WaitOutcome::Drained);
}

#[test]
fn test_timeouts_are_independent() {
    let wg = Arc::new(TimeoutWaitGroup::new());
    wg.add(1);

    let (unbounded, unbounded_handle) = spawn_waiter(&wg, None);
    let (bounded, bounded_handle) = spawn_waiter(&wg, Some(Duration::from_millis(200)));

    assert_eq!(bounded_handle.join().unwrap(), WaitOutcome::TimedOut);
    assert!(!bounded.load(Ordering::SeqCst));

    thread::sleep(Duration::from_millis(100));
    assert!(unbounded.load(Ordering::SeqCst));
    assert_eq!(wg.count(), 1);

    wg.done();
    assert_eq!(unbounded_handle.join().unwrap(), WaitOutcome::Drained);
}

#[test]
fn test_done_broadcasts_to_every_waiter() {
    const WAITERS: usize = 32;

    let wg = Arc::new(TimeoutWaitGroup::new());
    wg.add(1);

    let woken = Arc::new(AtomicUsize::new(0));
    let handles: Vec<_> = (0..WAITERS)
        .map(|_| {
            let wg = wg.clone();
            let woken = woken.clone();
            thread::spawn(move || {
                let outcome = wg.wait();
                woken.fetch_add(1, Ordering::SeqCst);
                outcome
            })
        })
        .collect();

    let start = Instant::now();
    while wg.waiter_count() < WAITERS {
        assert!(start.elapsed() < Duration::from_secs(5));
        thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(woken.load(Ordering::SeqCst), 0);

    let done_at = Instant::now();
    wg.done();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), WaitOutcome::Drained);
    }
    assert_eq!(woken.load(Ordering::SeqCst), WAITERS);
    assert!(done_at.elapsed() < Duration::from_secs(1));
    assert_eq!(wg.waiter_count(), 0);
}

#[test]
fn test_wait_group_is_reusable_after_drain() {
    let wg = Arc::new(TimeoutWaitGroup::new());
    for _ in 0..3 {
        wg.add(2);
        let (waiting, handle) = spawn_waiter(&wg, None);
        wg.done();
        thread::sleep(Duration::from_millis(20));
        assert!(waiting.load(Ordering::SeqCst));
        wg.done();
        assert_eq!(handle.join().unwrap(), WaitOutcome::Drained);
    }
}

#[test]
fn test_concurrent_pairs_keep_waiter_blocked() {
    let wg = Arc::new(TimeoutWaitGroup::new());
    wg.add(1);

    let (waiting, handle) = spawn_waiter(&wg, None);
    thread::sleep(Duration::from_millis(100));
    assert!(waiting.load(Ordering::SeqCst));

    let step = Arc::new(Barrier::new(1000));
    let tasks: Vec<_> = (0..1000)
        .map(|_| {
            let wg = wg.clone();
            let step = step.clone();
            thread::spawn(move || {
                step.wait();
                wg.add(1);
                wg.done();
            })
        })
        .collect();
    for task in tasks {
        task.join().unwrap();
    }

    assert!(waiting.load(Ordering::SeqCst));

    wg.done();
    thread::sleep(Duration::from_millis(100));
    assert!(!waiting.load(Ordering::SeqCst));
    handle.join().unwrap();
}

#[test]
fn test_million_pairs_on_main_thread() {
    let wg = TimeoutWaitGroup::new();
    for _ in 0..1_000_000 {
        wg.add(1);
    }
    assert_eq!(wg.count(), 1_000_000);
    for _ in 0..1_000_000 {
        wg.done();
    }
    assert_eq!(wg.wait(), WaitOutcome::Drained);
}

#[test]
fn test_million_pairs_across_pool() {
    let pool = ThreadPool::new(num_cpus::get().max(2));
    let wg = Arc::new(TimeoutWaitGroup::new());

    // a waiter that must survive the churn
    wg.add(1);
    let (waiting, handle) = spawn_waiter(&wg, None);

    for _ in 0..1_000_000 {
        let wg = wg.clone();
        pool.execute(move || {
            wg.add(1);
            wg.done();
        });
    }
    pool.join();

    assert_eq!(pool.panic_count(), 0);
    assert_eq!(wg.count(), 1);
    assert!(waiting.load(Ordering::SeqCst));

    wg.done();
    assert_eq!(handle.join().unwrap(), WaitOutcome::Drained);
    assert_eq!(wg.count(), 0);
    assert_eq!(wg.waiter_count(), 0);
}

#[test]
fn test_wait_async_completes_on_done() {
    let wg = Arc::new(TimeoutWaitGroup::new());
    wg.add(1);

    let worker = wg.clone();
    let handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        worker.done();
    });

    futures_lite::future::block_on(wg.wait_async());
    assert!(wg.is_drained());
    handle.join().unwrap();
}

#[test]
fn test_dropped_wait_async_deregisters() {
    let wg = TimeoutWaitGroup::new();
    wg.add(1);

    let mut wait = Box::pin(wg.wait_async());
    assert!(futures_lite::future::block_on(futures_lite::future::poll_once(&mut wait)).is_none());
    assert_eq!(wg.waiter_count(), 1);

    drop(wait);
    assert_eq!(wg.waiter_count(), 0);
    wg.done();
}
