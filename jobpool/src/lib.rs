// SPDX-License-Identifier: MIT
// jobpool: process-local job dispatcher
//
// - Runs submitted jobs concurrently under a ceiling that can be resized at runtime.
// - Tracks completion for the whole pool and for independently named batches.
//
// Author: Johannes Leupolz <dev@leupolz.eu>

pub mod batch;
pub mod config;
pub mod error;
pub mod job_engine;
pub mod rebel_pool;
pub mod token;
pub mod worker_pool;

pub use crate::batch::Batch;
pub use crate::config::PoolConfig;
pub use crate::error::PoolError;
pub use crate::job_engine::closure_job::ClosureJob;
pub use crate::job_engine::job::Job;
pub use crate::rebel_pool::RebelPool;
pub use crate::worker_pool::WorkerPool;
