use crate::config::PoolConfig;
use crate::error::PoolError;
use crate::job_engine::closure_job::ClosureJob;
use crate::job_engine::dispatcher::Dispatcher;
use crate::job_engine::job::{GroupSet, Job, Submission};
use crate::job_engine::registry::CompletionGroup;
use crate::rebel_pool::RebelPool;
use crate::worker_pool::WorkerPool;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// Simple shared integer counter
fn shared_counter() -> Arc<AtomicUsize> {
    Arc::new(AtomicUsize::new(0))
}

fn counting_job(counter: &Arc<AtomicUsize>) -> ClosureJob {
    let counter = counter.clone();
    ClosureJob::new("count", move || {
        counter.fetch_add(1, Ordering::SeqCst);
    })
}

/// Job that blocks until the gate is opened, so tests control when permits come back.
#[derive(Clone)]
struct GatedJob {
    gate: Arc<(Mutex<bool>, std::sync::Condvar)>,
    running: Arc<AtomicUsize>,
    finished: Arc<AtomicUsize>,
}

impl GatedJob {
    fn new() -> Self {
        Self {
            gate: Arc::new((Mutex::new(false), std::sync::Condvar::new())),
            running: shared_counter(),
            finished: shared_counter(),
        }
    }

    fn open(&self) {
        let (lock, cvar) = &*self.gate;
        *lock.lock().unwrap() = true;
        cvar.notify_all();
    }
}

impl Job for GatedJob {
    fn desc(&self) -> &str {
        "gated"
    }

    fn execute(&self) {
        self.running.fetch_add(1, Ordering::SeqCst);
        let (lock, cvar) = &*self.gate;
        let mut open = lock.lock().unwrap();
        while !*open {
            open = cvar.wait(open).unwrap();
        }
        drop(open);
        self.running.fetch_sub(1, Ordering::SeqCst);
        self.finished.fetch_add(1, Ordering::SeqCst);
    }
}

fn eventually(what: &str, condition: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        thread::sleep(Duration::from_millis(5));
    }
}

//
// 1. Every replica runs exactly once
//
#[test]
fn test_all_replicas_execute() {
    let pool = WorkerPool::new(3);
    let c = shared_counter();

    pool.add(counting_job(&c), 10);
    pool.wait();

    assert_eq!(c.load(Ordering::SeqCst), 10);
    assert_eq!(pool.queue_depth(), 0);
    assert_eq!(pool.pool_size(), 3);
}

#[test]
fn test_zero_replicas_is_a_no_op() {
    let pool = WorkerPool::new(1);
    let c = shared_counter();
    pool.add(counting_job(&c), 0);
    pool.wait();
    assert_eq!(c.load(Ordering::SeqCst), 0);
    assert_eq!(pool.queue_depth(), 0);
}

//
// 2. Submissions are dispatched in arrival order
//
#[test]
fn test_fifo_dispatch_with_single_permit() {
    let pool = WorkerPool::new(1);
    let order = Arc::new(Mutex::new(Vec::new()));

    for i in 0..20 {
        let order = order.clone();
        pool.add_one(ClosureJob::new(format!("job-{i}"), move || {
            order.lock().unwrap().push(i);
        }));
    }
    pool.wait();

    assert_eq!(*order.lock().unwrap(), (0..20).collect::<Vec<_>>());
}

//
// 3. Ceiling and backpressure
//
#[test]
fn test_saturated_limiter_holds_back_the_queue() {
    let pool = WorkerPool::new(2);
    let job = GatedJob::new();

    pool.add(job.clone(), 5);
    eventually("two running jobs", || job.running.load(Ordering::SeqCst) == 2);
    // third replica is in hand of the loop, the last two are still counted
    eventually("depth of two", || pool.queue_depth() == 2);
    thread::sleep(Duration::from_millis(50));
    assert_eq!(job.running.load(Ordering::SeqCst), 2);
    assert_eq!(pool.in_flight(), 2);

    job.open();
    pool.wait();
    assert_eq!(job.finished.load(Ordering::SeqCst), 5);
    assert_eq!(pool.queue_depth(), 0);
}

#[test]
fn test_growth_admits_more_jobs_immediately() {
    let pool = WorkerPool::new(1);
    let job = GatedJob::new();

    pool.add(job.clone(), 4);
    eventually("one running job", || job.running.load(Ordering::SeqCst) == 1);

    pool.set_pool_size(4);
    eventually("four running jobs", || {
        job.running.load(Ordering::SeqCst) == 4
    });

    job.open();
    pool.wait();
}

#[test]
fn test_shrink_does_not_kill_running_jobs() {
    let pool = WorkerPool::new(5);
    let job = GatedJob::new();

    pool.add(job.clone(), 8);
    eventually("five running jobs", || {
        job.running.load(Ordering::SeqCst) == 5
    });

    pool.set_pool_size(2);
    pool.set_pool_size(2);
    assert_eq!(pool.pool_size(), 2);
    thread::sleep(Duration::from_millis(50));
    assert_eq!(job.running.load(Ordering::SeqCst), 5);

    job.open();
    pool.wait();
    assert_eq!(job.finished.load(Ordering::SeqCst), 8);
}

//
// 4. Size zero pauses the pool
//
#[test]
fn test_zero_size_pauses_until_resized() {
    let pool = WorkerPool::new(0);
    let c = shared_counter();

    pool.add(counting_job(&c), 3);
    thread::sleep(Duration::from_millis(50));
    assert_eq!(c.load(Ordering::SeqCst), 0);

    pool.set_pool_size(1);
    pool.wait();
    assert_eq!(c.load(Ordering::SeqCst), 3);
}

//
// 5. Batches
//
#[test]
fn test_batch_lifecycle_errors() {
    let pool = WorkerPool::new(1);

    let _x = pool.new_batch("x").unwrap();
    assert_eq!(
        pool.new_batch("x").unwrap_err(),
        PoolError::AlreadyExists("x".into())
    );
    assert_eq!(
        pool.load_batch("missing").unwrap_err(),
        PoolError::NotFound("missing".into())
    );
    assert_eq!(
        pool.remove_batch("missing").unwrap_err(),
        PoolError::NotFound("missing".into())
    );
    assert!(pool.wait_batch("missing").is_err());
}

#[test]
fn test_batch_wait_ignores_unrelated_work() {
    let pool = WorkerPool::new(4);
    let slow = GatedJob::new();
    let c = shared_counter();

    pool.add(slow.clone(), 2);
    let batch = pool.new_temp_batch();
    batch.add(counting_job(&c), 4).unwrap();

    batch.wait().unwrap();
    assert_eq!(c.load(Ordering::SeqCst), 4);
    assert_eq!(slow.finished.load(Ordering::SeqCst), 0);

    slow.open();
    pool.wait();
    batch.remove().unwrap();
}

#[test]
fn test_loaded_handle_shares_the_batch() {
    let pool = WorkerPool::new(2);
    let c = shared_counter();

    let batch = pool.new_batch("shared").unwrap();
    let loaded = pool.load_batch("shared").unwrap();
    batch.add(counting_job(&c), 3).unwrap();
    loaded.add_one(counting_job(&c)).unwrap();

    pool.wait_batch("shared").unwrap();
    assert_eq!(c.load(Ordering::SeqCst), 4);
    assert_eq!(batch.outstanding(), 0);
    assert_eq!(pool.batch_names(), vec!["shared".to_string()]);
}

#[test]
fn test_temp_batches_get_distinct_names() {
    let config = PoolConfig {
        temp_batch_token_len: 0,
        ..PoolConfig::with_size(1)
    };
    let pool = WorkerPool::with_config(config);

    let names: Vec<String> = (0..60)
        .map(|_| pool.new_temp_batch().name().to_string())
        .collect();
    assert!(names.iter().all(|n| !n.is_empty()));
    assert_eq!(pool.batch_names().len(), 60);
}

#[test]
fn test_batch_handle_outlives_dropped_pool() {
    let c = shared_counter();
    let batch = {
        let pool = WorkerPool::new(2);
        pool.new_temp_batch()
    };

    batch.add(counting_job(&c), 3).unwrap();
    batch.wait().unwrap();
    assert_eq!(c.load(Ordering::SeqCst), 3);
}

#[test]
fn test_handle_after_remove_fails_closed() {
    let pool = WorkerPool::new(1);
    let c = shared_counter();
    let batch = pool.new_batch("gone").unwrap();

    pool.remove_batch("gone").unwrap();
    assert!(matches!(batch.wait(), Err(PoolError::NotFound(_))));
    assert!(matches!(
        batch.add_one(counting_job(&c)),
        Err(PoolError::NotFound(_))
    ));
    assert!(batch.remove().is_err());

    // the name is free again, the stale handle stays dead
    let _again = pool.new_batch("gone").unwrap();
    assert!(batch.wait().is_err());
    pool.wait();
    assert_eq!(c.load(Ordering::SeqCst), 0);
}

#[test]
fn test_remove_wakes_blocked_batch_wait() {
    let pool = WorkerPool::new(1);
    let job = GatedJob::new();
    let batch = pool.new_batch("blocked").unwrap();
    batch.add_one(job.clone()).unwrap();

    let waiter = {
        let batch = batch.clone();
        thread::spawn(move || batch.wait())
    };
    thread::sleep(Duration::from_millis(50));
    pool.remove_batch("blocked").unwrap();
    assert_eq!(
        waiter.join().unwrap(),
        Err(PoolError::NotFound("blocked".into()))
    );

    job.open();
    pool.wait();
}

//
// 6. Failure and shutdown
//
#[test]
fn test_panicking_job_counts_as_done() {
    let pool = WorkerPool::new(2);
    let c = shared_counter();

    pool.add(ClosureJob::new("boom", || panic!("intentional test panic")), 3);
    pool.add(counting_job(&c), 3);
    pool.wait();

    assert_eq!(c.load(Ordering::SeqCst), 3);
    assert_eq!(pool.in_flight(), 0);
}

#[test]
fn test_close_abandons_queued_jobs_without_deadlock() {
    let pool = WorkerPool::new(1);
    let job = GatedJob::new();
    let c = shared_counter();

    pool.add_one(job.clone());
    pool.add(counting_job(&c), 5);
    eventually("gated job running", || job.running.load(Ordering::SeqCst) == 1);

    pool.close();
    job.open();
    pool.wait();

    assert_eq!(c.load(Ordering::SeqCst), 0);
    assert_eq!(pool.queue_depth(), 0);
    assert_eq!(job.finished.load(Ordering::SeqCst), 1);
}

#[test]
fn test_no_jobs_after_close() {
    let pool = WorkerPool::new(2);
    let c = shared_counter();
    pool.close();
    assert!(pool.is_closed());

    pool.add(counting_job(&c), 3);
    pool.wait();
    assert_eq!(c.load(Ordering::SeqCst), 0);
}

//
// 7. Dispatcher and rebel pool
//
#[test]
fn test_dispatcher_counts_down_every_group() {
    let dispatcher = Dispatcher::new("test", 2);
    let main = Arc::new(CompletionGroup::new("main"));
    let batch = Arc::new(CompletionGroup::new("batch"));
    let c = shared_counter();

    main.add(6).unwrap();
    batch.add(6).unwrap();
    let groups: GroupSet = [main.clone(), batch.clone()].into_iter().collect();
    assert!(dispatcher.submit(Submission::new(
        Arc::new(counting_job(&c)),
        6,
        groups
    )));

    batch.wait().unwrap();
    main.wait().unwrap();
    assert_eq!(c.load(Ordering::SeqCst), 6);
    dispatcher.close();
}

#[test]
fn test_closed_dispatcher_rolls_back_submission() {
    let dispatcher = Dispatcher::new("test", 1);
    dispatcher.close();

    let group = Arc::new(CompletionGroup::new("g"));
    group.add(2).unwrap();
    let groups: GroupSet = [group.clone()].into_iter().collect();
    let job = Arc::new(ClosureJob::new("noop", || {}));

    assert!(!dispatcher.submit(Submission::new(job, 2, groups)));
    assert_eq!(group.outstanding(), 0);
    assert_eq!(dispatcher.queue_depth(), 0);
}

#[test]
fn test_rebel_pool_runs_everything() {
    let pool = RebelPool::new(3);
    let c = shared_counter();

    pool.add(counting_job(&c), 10);
    pool.add_one(counting_job(&c));
    eventually("eleven executions", || c.load(Ordering::SeqCst) == 11);

    pool.set_pool_size(5);
    assert_eq!(pool.pool_size(), 5);
    eventually("idle rebel pool", || pool.in_flight() == 0);
    assert_eq!(pool.queue_depth(), 0);
    pool.close();
}
