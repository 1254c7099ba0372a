//! In-process store backend

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::error::Result;
use crate::store::{Fields, KeyValueStore};
use crate::value::Value;

/// Store backed by a mutex-guarded map
///
/// Shared between threads of one process via `Arc<MemoryStore>`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    fields: Mutex<Fields>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with fields
    pub fn with_fields(fields: Fields) -> Self {
        Self {
            fields: Mutex::new(fields),
        }
    }

    fn acquire(&self) -> MutexGuard<'_, Fields> {
        // A panic inside a caller's update closure must not wedge the store
        self.fields.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.acquire().get(key).cloned())
    }

    fn update(&self, apply: &mut dyn FnMut(&mut Fields)) -> Result<()> {
        let mut fields = self.acquire();
        apply(&mut fields);
        debug!(field_count = fields.len(), "MemoryStore::update: applied");
        Ok(())
    }

    fn snapshot(&self) -> Result<Fields> {
        Ok(self.acquire().clone())
    }

    fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<Value>>> {
        let fields = self.acquire();
        Ok(keys.iter().map(|key| fields.get(*key).cloned()).collect())
    }
}
