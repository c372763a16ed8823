// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::sync::Arc;

use crate::error::PoolError;
use crate::job_engine::job::Job;
use crate::job_engine::registry::CompletionGroup;
use crate::worker_pool::PoolShared;

/// Handle to a batch of a [`WorkerPool`](crate::WorkerPool).
///
/// The registry entry is the source of truth. Once the batch is removed, by name or
/// through any handle, every operation on this handle fails with `NotFound`, even if a
/// new batch was registered under the same name since.
#[derive(Debug, Clone)]
pub struct Batch {
    shared: Arc<PoolShared>,
    group: Arc<CompletionGroup>,
}

impl Batch {
    pub(crate) fn new(shared: Arc<PoolShared>, group: Arc<CompletionGroup>) -> Self {
        Self { shared, group }
    }

    pub fn name(&self) -> &str {
        self.group.name()
    }

    /// Enqueues `count` replicas that count for this batch and for the whole pool.
    pub fn add<J: Job>(&self, job: J, count: usize) -> Result<(), PoolError> {
        self.shared.submit(Arc::new(job), count, Some(&self.group))
    }

    pub fn add_one<J: Job>(&self, job: J) -> Result<(), PoolError> {
        self.add(job, 1)
    }

    /// Blocks until the jobs of this batch have finished. Unrelated pool work is ignored.
    pub fn wait(&self) -> Result<(), PoolError> {
        self.group.wait()
    }

    pub fn outstanding(&self) -> usize {
        self.group.outstanding()
    }

    pub fn remove(&self) -> Result<(), PoolError> {
        self.shared.registry.remove_group(&self.group)
    }
}
