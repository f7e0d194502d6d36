//! # Key-Value Backend
//!
//! The persistent engine is external; this module only fixes the seam it
//! plugs into. Keys are plain strings namespaced by the calling store
//! (`ref/…`, `subdoc/…`, `root/…`); values are opaque bytes.
//!
//! [`MemoryBackend`] keeps everything in a `DashMap` and loses it on
//! restart. It backs the tests and single-node development runs.

use std::fmt;

use dashmap::DashMap;

use crate::error::StoreError;

/// Get/put/delete by key. Implementations must be safe to share across
/// request tasks.
pub trait KvBackend: Send + Sync + fmt::Debug {
    /// Read the value under `key`, or `None` if nothing is stored.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Create or overwrite the value under `key`.
    fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError>;

    /// Remove `key`. Removing a missing key succeeds.
    fn delete(&self, key: &str) -> Result<(), StoreError>;
}

/// In-memory backend.
#[derive(Default)]
pub struct MemoryBackend {
    entries: DashMap<String, Vec<u8>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryBackend")
            .field("keys", &self.entries.len())
            .finish()
    }
}

impl KvBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}
