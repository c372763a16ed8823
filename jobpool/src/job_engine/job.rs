// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use smallvec::SmallVec;
use std::sync::Arc;

use crate::job_engine::registry::CompletionGroup;

pub trait Job: Send + Sync + 'static {
    /// Free-form description, used for logging or debugging
    fn desc(&self) -> &str {
        "job"
    }

    /// Main entry point. Runs once per replica, possibly concurrently with other replicas
    /// of the same job. Failures have to be handled inside the job.
    fn execute(&self);
}

impl std::fmt::Debug for dyn Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job").field("desc", &self.desc()).finish()
    }
}

impl<J: Job + ?Sized> Job for Arc<J> {
    fn desc(&self) -> &str {
        (**self).desc()
    }

    fn execute(&self) {
        (**self).execute()
    }
}

/// The groups that count a submission. Main group plus at most one batch fit inline.
pub type GroupSet = SmallVec<[Arc<CompletionGroup>; 2]>;

/// One entry of the admission queue: run `job` `replicas` times, and count every
/// finished replica down on each of `groups`.
#[derive(Debug)]
pub struct Submission {
    pub job: Arc<dyn Job>,
    pub replicas: usize,
    pub groups: GroupSet,
}

impl Submission {
    pub fn new(job: Arc<dyn Job>, replicas: usize, groups: GroupSet) -> Self {
        Self {
            job,
            replicas,
            groups,
        }
    }

    /// Fire-and-forget submission, nobody waits for it.
    pub fn untracked(job: Arc<dyn Job>, replicas: usize) -> Self {
        Self::new(job, replicas, GroupSet::new())
    }

    /// Counts `replicas` replicas as finished although they never ran.
    pub fn abandon(&self, replicas: usize) {
        for group in &self.groups {
            group.done_many(replicas);
        }
    }
}
