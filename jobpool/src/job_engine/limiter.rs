// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use futures::future::poll_fn;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, Waker};

#[derive(Debug)]
struct LimiterState {
    capacity: usize,
    in_use: usize,
    closed: bool,
    waiters: Vec<Waker>,
}

/// Counting permit pool whose capacity can change while permits are held.
///
/// All state sits behind one mutex, so `resize` is linearizable with respect to
/// `acquire` and release. A capacity of zero grants nothing until it is raised again.
#[derive(Debug, Clone)]
pub struct ConcurrencyLimiter {
    state: Arc<Mutex<LimiterState>>,
}

/// Right to run one job. Dropping it returns the permit to its limiter.
#[derive(Debug)]
pub struct Permit {
    limiter: ConcurrencyLimiter,
}

impl Drop for Permit {
    fn drop(&mut self) {
        self.limiter.release();
    }
}

impl ConcurrencyLimiter {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(LimiterState {
                capacity,
                in_use: 0,
                closed: false,
                waiters: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LimiterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Waits for a free permit. Returns `None` once the limiter is closed.
    pub async fn acquire(&self) -> Option<Permit> {
        poll_fn(|cx| self.poll_acquire(cx)).await
    }

    /// Blocking variant of [`acquire`](Self::acquire) for callers outside an executor.
    pub fn acquire_blocking(&self) -> Option<Permit> {
        futures::executor::block_on(self.acquire())
    }

    pub fn try_acquire(&self) -> Option<Permit> {
        let mut state = self.lock();
        if state.closed || state.in_use >= state.capacity {
            return None;
        }
        state.in_use += 1;
        Some(Permit {
            limiter: self.clone(),
        })
    }

    pub fn poll_acquire(&self, cx: &mut Context<'_>) -> Poll<Option<Permit>> {
        let mut state = self.lock();
        if state.closed {
            return Poll::Ready(None);
        }
        if state.in_use < state.capacity {
            state.in_use += 1;
            return Poll::Ready(Some(Permit {
                limiter: self.clone(),
            }));
        }
        if !state.waiters.iter().any(|w| w.will_wake(cx.waker())) {
            state.waiters.push(cx.waker().clone());
        }
        Poll::Pending
    }

    fn release(&self) {
        let mut state = self.lock();
        state.in_use = state.in_use.saturating_sub(1);
        if state.in_use < state.capacity {
            wake_all(state);
        }
    }

    /// Changes the number of permits. Held permits stay valid; after a shrink, permits
    /// are simply not handed out again until `in_use` dropped below the new capacity.
    pub fn resize(&self, capacity: usize) {
        let mut state = self.lock();
        let grown = capacity > state.capacity;
        state.capacity = capacity;
        if grown {
            wake_all(state);
        }
    }

    pub fn capacity(&self) -> usize {
        self.lock().capacity
    }

    /// Number of permits currently held.
    pub fn in_use(&self) -> usize {
        self.lock().in_use
    }

    /// Pending and future acquires return `None`. Permits already granted are unaffected.
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        wake_all(state);
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

fn wake_all(mut state: MutexGuard<'_, LimiterState>) {
    let waiters = std::mem::take(&mut state.waiters);
    drop(state);
    for waker in waiters {
        waker.wake();
    }
}
