// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use futures::executor::LocalPool;
use log::{debug, error, info, warn};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use crate::job_engine::admission::AdmissionQueue;
use crate::job_engine::depth::QueueDepthCounter;
use crate::job_engine::job::{GroupSet, Job, Submission};
use crate::job_engine::limiter::{ConcurrencyLimiter, Permit};

/// Owns the dispatch loop thread and the queue, limiter and depth counter it works on.
#[derive(Debug)]
pub struct Dispatcher {
    name: String,
    thread_handle: Mutex<Option<JoinHandle<()>>>,
    queue: AdmissionQueue,
    limiter: ConcurrencyLimiter,
    depth: Arc<QueueDepthCounter>,
}

/// What the dispatch loop needs, moved into its thread.
struct DispatchContext {
    name: String,
    queue: AdmissionQueue,
    limiter: ConcurrencyLimiter,
    depth: Arc<QueueDepthCounter>,
}

impl Dispatcher {
    /// Starts the dispatch loop on a dedicated thread.
    ///
    /// # Panics
    /// If the operating system refuses to create the dispatcher thread.
    pub fn new(name: impl Into<String>, size: usize) -> Self {
        let name = name.into();
        let queue = AdmissionQueue::new();
        let limiter = ConcurrencyLimiter::new(size);
        let depth = Arc::new(QueueDepthCounter::new());

        let ctx = DispatchContext {
            name: name.clone(),
            queue: queue.clone(),
            limiter: limiter.clone(),
            depth: depth.clone(),
        };
        // run dispatcher in a dedicated thread
        let thread_handle = thread::Builder::new()
            .name(format!("{name}-dispatcher"))
            .spawn(move || {
                let mut pool = LocalPool::new();
                pool.run_until(dispatch_loop(ctx));
            })
            .expect("failed to spawn the dispatcher thread");

        Self {
            name,
            thread_handle: Mutex::new(Some(thread_handle)),
            queue,
            limiter,
            depth,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Enqueues a submission without blocking. The groups of the submission must already
    /// be counted up. Returns `false` if the dispatcher is closed; the submission is then
    /// dropped and counted down again.
    pub fn submit(&self, submission: Submission) -> bool {
        let replicas = submission.replicas;
        self.depth.add(replicas);
        match self.queue.push(submission) {
            Ok(()) => true,
            Err(rejected) => {
                self.depth.sub(replicas);
                rejected.abandon(replicas);
                warn!(
                    "{}: dropped {} replicas of {:?}, pool is closed",
                    self.name, replicas, rejected.job
                );
                false
            }
        }
    }

    pub fn set_pool_size(&self, size: usize) {
        debug!("{}: resizing pool to {}", self.name, size);
        self.limiter.resize(size);
    }

    pub fn pool_size(&self) -> usize {
        self.limiter.capacity()
    }

    pub fn queue_depth(&self) -> usize {
        self.depth.get()
    }

    pub fn in_flight(&self) -> usize {
        self.limiter.in_use()
    }

    pub fn is_closed(&self) -> bool {
        self.queue.is_closed()
    }

    /// Stops admission and ends the dispatch loop. Jobs already running are not touched;
    /// jobs still waiting in the queue are abandoned.
    pub fn close(&self) {
        if self.queue.close() {
            info!("{}: closing", self.name);
        }
        self.limiter.close();
        let handle = self
            .thread_handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        // a job owning the last pool reference may drop it on the dispatcher thread itself
        if let Some(handle) = handle.filter(|h| h.thread().id() != thread::current().id()) {
            if handle.join().is_err() {
                error!("{}: dispatcher thread panicked", self.name);
            }
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.close();
    }
}

/// Pop submissions in arrival order and launch their replicas until closed.
async fn dispatch_loop(ctx: DispatchContext) {
    info!("{}: dispatcher started", ctx.name);
    while let Some(submission) = ctx.queue.pop().await {
        if !dispatch_submission(&ctx, submission).await {
            break;
        }
    }

    let mut abandoned = 0;
    while let Some(submission) = ctx.queue.try_pop() {
        ctx.depth.sub(submission.replicas);
        submission.abandon(submission.replicas);
        abandoned += submission.replicas;
    }
    if abandoned > 0 {
        warn!("{}: abandoned {} queued replicas", ctx.name, abandoned);
    }
    info!("{}: dispatcher shutting down gracefully", ctx.name);
}

/// Returns `false` once the limiter is closed.
async fn dispatch_submission(ctx: &DispatchContext, submission: Submission) -> bool {
    for replica in 0..submission.replicas {
        ctx.depth.sub(1);
        let Some(permit) = ctx.limiter.acquire().await else {
            let remaining = submission.replicas - replica;
            // the replica in hand is already counted out of the depth
            ctx.depth.sub(remaining - 1);
            submission.abandon(remaining);
            warn!(
                "{}: abandoned {} replicas of {:?}, pool is closed",
                ctx.name, remaining, submission.job
            );
            return false;
        };
        launch(
            &ctx.name,
            submission.job.clone(),
            submission.groups.clone(),
            permit,
        );
    }
    true
}

/// Returns the permit and counts the groups down when dropped, even while unwinding.
struct Completion {
    permit: Option<Permit>,
    groups: GroupSet,
}

impl Drop for Completion {
    fn drop(&mut self) {
        drop(self.permit.take());
        for group in &self.groups {
            group.done();
        }
    }
}

fn launch(name: &str, job: Arc<dyn Job>, groups: GroupSet, permit: Permit) {
    let completion = Completion {
        permit: Some(permit),
        groups,
    };
    let spawned = thread::Builder::new()
        .name(format!("{name}-job"))
        .spawn(move || {
            debug!("Executing job: {}", job.desc());
            if panic::catch_unwind(AssertUnwindSafe(|| job.execute())).is_err() {
                warn!("Job {} panicked, counting it as done", job.desc());
            }
            drop(completion);
        });
    // the closure, and with it the completion, is dropped when spawning fails
    if let Err(e) = spawned {
        error!("{name}: failed to spawn a thread for a job: {e}");
    }
}
