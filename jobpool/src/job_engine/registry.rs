// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, RwLock};

use crate::error::PoolError;

pub const MAIN_GROUP: &str = "main";

#[derive(Debug)]
struct GroupState {
    outstanding: usize,
    removed: bool,
}

/// Outstanding-job counter of one group with a blocking wait-until-zero.
///
/// Each group has its own lock, completions of unrelated groups never contend.
#[derive(Debug)]
pub struct CompletionGroup {
    name: String,
    state: Mutex<GroupState>,
    zero: Condvar,
}

impl CompletionGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(GroupState {
                outstanding: 0,
                removed: false,
            }),
            zero: Condvar::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // Counters stay consistent when a job panics, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, GroupState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add(&self, n: usize) -> Result<(), PoolError> {
        let mut state = self.lock();
        if state.removed {
            return Err(PoolError::NotFound(self.name.clone()));
        }
        state.outstanding += n;
        Ok(())
    }

    pub fn done(&self) {
        self.done_many(1);
    }

    pub fn done_many(&self, n: usize) {
        let mut state = self.lock();
        state.outstanding = state.outstanding.saturating_sub(n);
        if state.outstanding == 0 {
            self.zero.notify_all();
        }
    }

    pub fn outstanding(&self) -> usize {
        self.lock().outstanding
    }

    /// Blocks until no job of this group is outstanding. Fails, also while already
    /// blocked, once the group has been removed from its registry.
    pub fn wait(&self) -> Result<(), PoolError> {
        let mut state = self.lock();
        loop {
            if state.removed {
                return Err(PoolError::NotFound(self.name.clone()));
            }
            if state.outstanding == 0 {
                return Ok(());
            }
            state = self
                .zero
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    pub fn is_removed(&self) -> bool {
        self.lock().removed
    }

    fn mark_removed(&self) {
        let mut state = self.lock();
        state.removed = true;
        self.zero.notify_all();
    }
}

/// Main group plus the named batches, keyed by their stable names.
///
/// The map lock only guards inserts and removals; counting happens on the groups.
#[derive(Debug)]
pub struct CompletionRegistry {
    main: Arc<CompletionGroup>,
    batches: RwLock<HashMap<String, Arc<CompletionGroup>>>,
}

impl CompletionRegistry {
    pub fn new() -> Self {
        Self {
            main: Arc::new(CompletionGroup::new(MAIN_GROUP)),
            batches: RwLock::new(HashMap::new()),
        }
    }

    pub fn main(&self) -> &Arc<CompletionGroup> {
        &self.main
    }

    /// Returns the batch `name`, creating a zero counter if it is absent.
    /// With `unique`, an existing batch is an error instead.
    pub fn ensure(&self, name: &str, unique: bool) -> Result<Arc<CompletionGroup>, PoolError> {
        let mut batches = self.batches.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(group) = batches.get(name) {
            if unique {
                return Err(PoolError::AlreadyExists(name.to_string()));
            }
            return Ok(group.clone());
        }
        let group = Arc::new(CompletionGroup::new(name));
        batches.insert(name.to_string(), group.clone());
        debug!("Created batch {name}");
        Ok(group)
    }

    pub fn get(&self, name: &str) -> Result<Arc<CompletionGroup>, PoolError> {
        self.batches
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| PoolError::NotFound(name.to_string()))
    }

    /// Removes the batch `name`. Outstanding work keeps running, but every wait on the
    /// group, blocked or future, fails with `NotFound`.
    pub fn remove(&self, name: &str) -> Result<(), PoolError> {
        let group = self
            .batches
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
            .ok_or_else(|| PoolError::NotFound(name.to_string()))?;
        group.mark_removed();
        debug!(
            "Removed batch {name} with {} outstanding jobs",
            group.outstanding()
        );
        Ok(())
    }

    /// Removes `group` only if it is still the entry registered under its name, so a
    /// stale reference can never remove a newer batch that reuses the name.
    pub fn remove_group(&self, group: &Arc<CompletionGroup>) -> Result<(), PoolError> {
        let mut batches = self.batches.write().unwrap_or_else(PoisonError::into_inner);
        let registered = matches!(
            batches.get(group.name()),
            Some(current) if Arc::ptr_eq(current, group)
        );
        if !registered {
            return Err(PoolError::NotFound(group.name().to_string()));
        }
        batches.remove(group.name());
        drop(batches);
        group.mark_removed();
        debug!("Removed batch {}", group.name());
        Ok(())
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .batches
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

impl Default for CompletionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
