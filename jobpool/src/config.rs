// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use serde::{Deserialize, Serialize};

/// Length of the generated names of temporary batches.
pub const DEFAULT_TOKEN_LEN: usize = 20;

/// Settings a pool is created with. Missing fields fall back to the defaults,
/// so a JSON document like `{"size": 3}` is a complete configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Initial concurrency ceiling. Zero pauses the pool until it is resized.
    pub size: usize,
    /// Used for thread names and log lines.
    pub name: String,
    pub temp_batch_token_len: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        let size = std::thread::available_parallelism()
            .map(|p| p.get())
            .unwrap_or(4);
        Self {
            size,
            name: "jobpool".to_string(),
            temp_batch_token_len: DEFAULT_TOKEN_LEN,
        }
    }
}

impl PoolConfig {
    pub fn with_size(size: usize) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
