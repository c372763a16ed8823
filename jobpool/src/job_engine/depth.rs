// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::sync::atomic::{AtomicUsize, Ordering};

/// Replicas that were submitted but not yet taken up by the dispatch loop.
///
/// The loop counts a replica out when it starts processing it, before it asks the limiter
/// for a permit. With a saturated limiter the depth can therefore read zero while the loop
/// still waits for a permit for the replica in hand.
#[derive(Debug, Default)]
pub struct QueueDepthCounter {
    depth: AtomicUsize,
}

impl QueueDepthCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, n: usize) {
        self.depth.fetch_add(n, Ordering::SeqCst);
    }

    pub fn sub(&self, n: usize) {
        let _ = self
            .depth
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |d| {
                Some(d.saturating_sub(n))
            });
    }

    pub fn get(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }
}
