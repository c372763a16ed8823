// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoggedExecution {
    pub start_msec: u64,

    pub end_msec: u64,

    /// Executions running when this one started, itself included.
    pub concurrent: usize,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct TestLog {
    pub label: String,
    pub peak_concurrency: usize,
    pub executions: Vec<LoggedExecution>,
}
