// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use async_channel::{Receiver, Sender};

use crate::job_engine::job::Submission;

/// Unbounded FIFO between the producers and the dispatch loop.
#[derive(Debug, Clone)]
pub struct AdmissionQueue {
    tx: Sender<Submission>,
    rx: Receiver<Submission>,
}

impl AdmissionQueue {
    pub fn new() -> Self {
        let (tx, rx) = async_channel::unbounded();
        Self { tx, rx }
    }

    /// Never blocks. A closed queue hands the submission back.
    pub fn push(&self, submission: Submission) -> Result<(), Submission> {
        self.tx.try_send(submission).map_err(|e| e.into_inner())
    }

    /// Waits for the next submission. `None` once the queue is closed and drained.
    pub async fn pop(&self) -> Option<Submission> {
        self.rx.recv().await.ok()
    }

    pub fn try_pop(&self) -> Option<Submission> {
        self.rx.try_recv().ok()
    }

    /// Returns `true` if this call closed the queue.
    pub fn close(&self) -> bool {
        self.tx.close()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

impl Default for AdmissionQueue {
    fn default() -> Self {
        Self::new()
    }
}
