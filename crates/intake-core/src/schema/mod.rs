//! Key-value persistence for submitted records.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::error::Result;

pub mod db;
pub mod migrations;

pub use db::SqliteStore;

/// A blob store addressed by string keys.
///
/// Writes overwrite: the last `put` for a key wins.
pub trait KeyValueStore {
    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    /// Returns an error if the backend rejects or cannot complete the write.
    fn put(&self, key: &str, value: &str) -> Result<()>;

    /// Read the value stored under `key`.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>>;
}

/// An in-process store, for tests and headless runs that do not persist.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn put(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }
}
