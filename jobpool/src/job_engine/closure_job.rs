// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use crate::job_engine::job::Job;

pub struct ClosureJob {
    desc: String,
    task: Box<dyn Fn() + Send + Sync + 'static>,
}

impl ClosureJob {
    pub fn new(desc: impl Into<String>, f: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            desc: desc.into(),
            task: Box::new(f),
        }
    }
}

impl Job for ClosureJob {
    fn desc(&self) -> &str {
        &self.desc
    }

    fn execute(&self) {
        (self.task)()
    }
}

impl std::fmt::Debug for ClosureJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClosureJob")
            .field("desc", &self.desc)
            .finish_non_exhaustive()
    }
}
