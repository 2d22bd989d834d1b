//! Named, single-shot deferred tasks.
//!
//! Scheduling a name that is already pending is ignored: the first schedule
//! decides when the task runs and a later one never pushes it back.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    time::Duration,
};

use tokio::task::JoinHandle;
use tracing::debug;

struct Entry {
    generation: u64,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct Timers {
    entries: HashMap<String, Entry>,
    next_generation: u64,
}

impl Drop for Timers {
    fn drop(&mut self) {
        for (_, entry) in self.entries.drain() {
            entry.handle.abort();
        }
    }
}

#[derive(Clone, Default)]
pub struct DebounceRegistry {
    timers: Arc<Mutex<Timers>>,
}

impl DebounceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `task` after `delay` unless a task named `name` is already
    /// pending. Returns whether a new timer was started.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&self, name: impl Into<String>, delay: Duration, task: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        let name = name.into();
        let mut timers = self.lock();
        if timers.entries.contains_key(&name) {
            debug!(name = %name, "debounce: already scheduled, ignoring");
            return false;
        }

        timers.next_generation += 1;
        let generation = timers.next_generation;
        let registry = Arc::downgrade(&self.timers);
        let timer_name = name.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if take_if_current(&registry, &timer_name, generation) {
                debug!(name = %timer_name, "debounce: firing");
                task();
            }
        });

        timers.entries.insert(name, Entry { generation, handle });
        true
    }

    /// Stops the pending task named `name`. Returns whether one existed.
    pub fn cancel(&self, name: &str) -> bool {
        match self.lock().entries.remove(name) {
            Some(entry) => {
                entry.handle.abort();
                debug!(name, "debounce: cancelled");
                true
            }
            None => false,
        }
    }

    pub fn is_scheduled(&self, name: &str) -> bool {
        self.lock().entries.contains_key(name)
    }

    fn lock(&self) -> MutexGuard<'_, Timers> {
        self.timers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Removes the entry for `name` if it still belongs to the timer of
/// `generation`. A cancelled or replaced timer finds nothing and stays quiet.
fn take_if_current(registry: &Weak<Mutex<Timers>>, name: &str, generation: u64) -> bool {
    let Some(timers) = registry.upgrade() else {
        return false;
    };
    let mut timers = timers.lock().unwrap_or_else(PoisonError::into_inner);
    match timers.entries.get(name) {
        Some(entry) if entry.generation == generation => {
            timers.entries.remove(name);
            true
        }
        _ => false,
    }
}
