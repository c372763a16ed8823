// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use jobpool::{Job, PoolConfig};
use serde::Serialize;

/// Loads a pool configuration from a JSON file, or starts from the defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<PoolConfig> {
    let Some(path) = path else {
        return Ok(PoolConfig::default());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    PoolConfig::from_json(&json)
        .with_context(|| format!("failed to parse config file {}", path.display()))
}

/// Sleeps for a fixed time and counts how often it ran.
#[derive(Clone)]
pub struct Adder {
    count: Arc<AtomicU32>,
    work: Duration,
}

impl Adder {
    pub fn new(work: Duration) -> Self {
        Self {
            count: Arc::new(AtomicU32::new(0)),
            work,
        }
    }

    pub fn count(&self) -> u32 {
        self.count.load(Ordering::SeqCst)
    }
}

impl Job for Adder {
    fn desc(&self) -> &str {
        "adder"
    }

    fn execute(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
        thread::sleep(self.work);
    }
}

/// One observation of a pool during a demo run.
#[derive(Debug, Serialize)]
pub struct Sample {
    pub at_msec: u64,
    pub event: String,
    pub pool_size: usize,
    pub queue_depth: usize,
    pub in_flight: usize,
}

#[derive(Debug, Serialize)]
pub struct Report {
    pub config: PoolConfig,
    pub executions: u32,
    pub samples: Vec<Sample>,
}
