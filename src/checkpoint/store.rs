//! Keyed checkpoint storage.

use super::Checkpoint;
use crate::core::Context;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Session-scoped storage for checkpoints, keyed by signature.
///
/// A miss is not an error: `get` returns `None` and the caller keeps its
/// fresh state.
pub trait StateStore<C: Context>: Send + Sync {
    fn get(&self, key: &str) -> Option<Checkpoint<C>>;

    fn set(&self, key: &str, checkpoint: Checkpoint<C>);
}

/// In-memory [`StateStore`]. Lives as long as the value itself.
#[derive(Debug)]
pub struct MemoryStore<C: Context> {
    entries: Mutex<HashMap<String, Checkpoint<C>>>,
}

impl<C: Context> MemoryStore<C> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries().contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries().keys().cloned().collect();
        keys.sort();
        keys
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Checkpoint<C>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C: Context> Default for MemoryStore<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Context> StateStore<C> for MemoryStore<C> {
    fn get(&self, key: &str) -> Option<Checkpoint<C>> {
        self.entries().get(key).cloned()
    }

    fn set(&self, key: &str, checkpoint: Checkpoint<C>) {
        self.entries().insert(key.to_string(), checkpoint);
    }
}
