// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use log::{debug, info};
use std::sync::Arc;

use crate::config::PoolConfig;
use crate::job_engine::dispatcher::Dispatcher;
use crate::job_engine::job::{Job, Submission};

/// Fire-and-forget pool: same dispatching as [`WorkerPool`](crate::WorkerPool),
/// but nothing can wait for the jobs.
#[derive(Debug)]
pub struct RebelPool {
    dispatcher: Dispatcher,
}

impl RebelPool {
    pub fn new(size: usize) -> Self {
        Self::with_config(PoolConfig::with_size(size).named("rebel"))
    }

    pub fn with_config(config: PoolConfig) -> Self {
        info!(
            "Starting rebel pool {} with size {}",
            config.name, config.size
        );
        Self {
            dispatcher: Dispatcher::new(config.name, config.size),
        }
    }

    pub fn add<J: Job>(&self, job: J, count: usize) {
        if count == 0 {
            return;
        }
        let job: Arc<dyn Job> = Arc::new(job);
        debug!("{}: submitting {} x {:?}", self.dispatcher.name(), count, job);
        self.dispatcher.submit(Submission::untracked(job, count));
    }

    pub fn add_one<J: Job>(&self, job: J) {
        self.add(job, 1);
    }

    pub fn set_pool_size(&self, size: usize) {
        self.dispatcher.set_pool_size(size);
    }

    pub fn pool_size(&self) -> usize {
        self.dispatcher.pool_size()
    }

    pub fn queue_depth(&self) -> usize {
        self.dispatcher.queue_depth()
    }

    pub fn in_flight(&self) -> usize {
        self.dispatcher.in_flight()
    }

    /// Stops accepting jobs. Running jobs finish, queued ones are dropped.
    pub fn close(&self) {
        self.dispatcher.close();
    }
}
