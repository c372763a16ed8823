// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use jobpool::Job;

use crate::test_log::{LoggedExecution, TestLog};

/// Instrumented job: counts executions and samples how many copies run at the same time.
#[derive(Clone)]
pub struct ProbeJob {
    label: String,
    work: Duration,
    started: Instant,
    running: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    executions: Arc<AtomicUsize>,
    log: Arc<Mutex<Vec<LoggedExecution>>>,
}

impl ProbeJob {
    pub fn new(label: impl Into<String>, work: Duration) -> Self {
        Self {
            label: label.into(),
            work,
            started: Instant::now(),
            running: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
            executions: Arc::new(AtomicUsize::new(0)),
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn executions(&self) -> usize {
        self.executions.load(Ordering::SeqCst)
    }

    pub fn running(&self) -> usize {
        self.running.load(Ordering::SeqCst)
    }

    /// Highest number of concurrently running executions seen so far.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn test_log(&self) -> TestLog {
        TestLog {
            label: self.label.clone(),
            peak_concurrency: self.peak(),
            executions: self.log.lock().unwrap().clone(),
        }
    }
}

impl Job for ProbeJob {
    fn desc(&self) -> &str {
        &self.label
    }

    fn execute(&self) {
        let now_running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now_running, Ordering::SeqCst);
        let start = self.started.elapsed();

        thread::sleep(self.work);

        self.running.fetch_sub(1, Ordering::SeqCst);
        self.executions.fetch_add(1, Ordering::SeqCst);
        self.log.lock().unwrap().push(LoggedExecution {
            start_msec: start.as_millis() as u64,
            end_msec: self.started.elapsed().as_millis() as u64,
            concurrent: now_running,
        });
    }
}

/// Job that blocks until [`GateJob::open`] is called, counting the executions that got past it.
#[derive(Clone)]
pub struct GateJob {
    gate: Arc<(Mutex<bool>, Condvar)>,
    executions: Arc<AtomicUsize>,
}

impl GateJob {
    pub fn new() -> Self {
        Self {
            gate: Arc::new((Mutex::new(false), Condvar::new())),
            executions: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn open(&self) {
        let (lock, cvar) = &*self.gate;
        *lock.lock().unwrap() = true;
        cvar.notify_all();
    }

    pub fn executions(&self) -> usize {
        self.executions.load(Ordering::SeqCst)
    }
}

impl Default for GateJob {
    fn default() -> Self {
        Self::new()
    }
}

impl Job for GateJob {
    fn desc(&self) -> &str {
        "gate"
    }

    fn execute(&self) {
        let (lock, cvar) = &*self.gate;
        let mut open = lock.lock().unwrap();
        while !*open {
            open = cvar.wait(open).unwrap();
        }
        drop(open);
        self.executions.fetch_add(1, Ordering::SeqCst);
    }
}
