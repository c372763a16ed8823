// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use log::{debug, error, info};
use std::sync::Arc;

use crate::batch::Batch;
use crate::config::PoolConfig;
use crate::error::PoolError;
use crate::job_engine::dispatcher::Dispatcher;
use crate::job_engine::job::{GroupSet, Job, Submission};
use crate::job_engine::registry::{CompletionGroup, CompletionRegistry};
use crate::token::generate_token;

/// State shared between a pool and the batch handles it gave out.
#[derive(Debug)]
pub(crate) struct PoolShared {
    pub(crate) config: PoolConfig,
    pub(crate) dispatcher: Dispatcher,
    pub(crate) registry: CompletionRegistry,
}

impl PoolShared {
    /// Counts `replicas` up on the main group and on `batch`, then enqueues them.
    pub(crate) fn submit(
        &self,
        job: Arc<dyn Job>,
        replicas: usize,
        batch: Option<&Arc<CompletionGroup>>,
    ) -> Result<(), PoolError> {
        let mut groups = GroupSet::new();
        if let Some(batch) = batch {
            batch.add(replicas)?;
            groups.push(batch.clone());
        }
        if replicas == 0 {
            return Ok(());
        }
        let main = self.registry.main();
        main.add(replicas)?;
        groups.insert(0, main.clone());

        debug!("{}: submitting {} x {:?}", self.config.name, replicas, job);
        self.dispatcher.submit(Submission::new(job, replicas, groups));
        Ok(())
    }
}

/// Pool whose jobs can be awaited, as a whole or per batch.
///
/// Batch handles share the pool. It keeps dispatching until [`close`](Self::close) is
/// called or the pool and all of its batch handles are dropped.
///
/// ```no_run
/// use jobpool::{ClosureJob, WorkerPool};
///
/// let pool = WorkerPool::new(3);
/// pool.add(ClosureJob::new("hello", || println!("hello")), 10);
/// pool.wait();
/// pool.close();
/// ```
#[derive(Debug)]
pub struct WorkerPool {
    shared: Arc<PoolShared>,
}

impl WorkerPool {
    pub fn new(size: usize) -> Self {
        Self::with_config(PoolConfig::with_size(size))
    }

    pub fn with_config(config: PoolConfig) -> Self {
        info!(
            "Starting worker pool {} with size {}",
            config.name, config.size
        );
        let dispatcher = Dispatcher::new(config.name.clone(), config.size);
        Self {
            shared: Arc::new(PoolShared {
                config,
                dispatcher,
                registry: CompletionRegistry::new(),
            }),
        }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.shared.config
    }

    /// Enqueues `count` replicas of `job`. Never blocks.
    pub fn add<J: Job>(&self, job: J, count: usize) {
        if let Err(e) = self.shared.submit(Arc::new(job), count, None) {
            // only batches can vanish, the main group lives as long as the pool
            error!("{}: {e}", self.shared.config.name);
        }
    }

    pub fn add_one<J: Job>(&self, job: J) {
        self.add(job, 1);
    }

    /// Blocks until every job submitted so far, batched or not, has finished.
    pub fn wait(&self) {
        if let Err(e) = self.shared.registry.main().wait() {
            error!("{}: {e}", self.shared.config.name);
        }
    }

    pub fn wait_batch(&self, name: &str) -> Result<(), PoolError> {
        self.shared.registry.get(name)?.wait()
    }

    /// Growth takes effect immediately, a shrink as running jobs finish.
    pub fn set_pool_size(&self, size: usize) {
        self.shared.dispatcher.set_pool_size(size);
    }

    pub fn pool_size(&self) -> usize {
        self.shared.dispatcher.pool_size()
    }

    /// Replicas submitted but not yet taken up by the dispatch loop.
    pub fn queue_depth(&self) -> usize {
        self.shared.dispatcher.queue_depth()
    }

    /// Jobs currently holding a permit.
    pub fn in_flight(&self) -> usize {
        self.shared.dispatcher.in_flight()
    }

    pub fn new_batch(&self, name: impl Into<String>) -> Result<Batch, PoolError> {
        let name = name.into();
        let group = self.shared.registry.ensure(&name, true)?;
        Ok(Batch::new(self.shared.clone(), group))
    }

    /// Creates a batch under a generated name, see [`Batch::name`].
    pub fn new_temp_batch(&self) -> Batch {
        let mut len = self.shared.config.temp_batch_token_len.max(1);
        loop {
            let token = generate_token(len);
            if let Ok(group) = self.shared.registry.ensure(&token, true) {
                return Batch::new(self.shared.clone(), group);
            }
            // short tokens can run out of names
            len += 1;
        }
    }

    pub fn load_batch(&self, name: &str) -> Result<Batch, PoolError> {
        let group = self.shared.registry.get(name)?;
        Ok(Batch::new(self.shared.clone(), group))
    }

    pub fn remove_batch(&self, name: &str) -> Result<(), PoolError> {
        self.shared.registry.remove(name)
    }

    pub fn batch_names(&self) -> Vec<String> {
        self.shared.registry.names()
    }

    /// Stops accepting jobs. Running jobs finish, queued ones are dropped.
    pub fn close(&self) {
        self.shared.dispatcher.close();
    }

    pub fn is_closed(&self) -> bool {
        self.shared.dispatcher.is_closed()
    }
}
