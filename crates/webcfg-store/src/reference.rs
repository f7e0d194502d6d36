//! # Reference Documents
//!
//! A reference document is a blob stored under a client-chosen, globally
//! unique reference id. Its lifecycle is explicit (put / get / delete)
//! and independent of every device: many subdocuments on many devices may
//! point at one reference, and deleting the reference leaves those links
//! dangling rather than failing them.
//!
//! The store is content-agnostic: bytes are kept verbatim with no size or
//! type checks. The version of a reference is the digest of its content,
//! recomputed on read.

use std::sync::Arc;

use webcfg_core::{Lookup, Version};

use crate::error::StoreError;
use crate::kv::KvBackend;

/// A reference document read back from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceDocument {
    pub ref_id: String,
    pub bytes: Vec<u8>,
    /// Digest of `bytes`.
    pub version: Version,
}

/// Device-independent blob store keyed by reference id.
#[derive(Debug, Clone)]
pub struct ReferenceStore {
    kv: Arc<dyn KvBackend>,
}

impl ReferenceStore {
    pub fn new(kv: Arc<dyn KvBackend>) -> Self {
        Self { kv }
    }

    /// Create or overwrite. Last write wins; repeating a put is harmless.
    pub fn put(&self, ref_id: &str, bytes: Vec<u8>) -> Result<Version, StoreError> {
        let version = Version::of_bytes(&bytes);
        let size = bytes.len();
        self.kv.put(&key(ref_id), bytes)?;
        tracing::info!(ref_id, size, version = %version, "reference document stored");
        Ok(version)
    }

    /// Read a reference document.
    pub fn get(&self, ref_id: &str) -> Result<Lookup<ReferenceDocument>, StoreError> {
        let doc = self.kv.get(&key(ref_id))?.map(|bytes| ReferenceDocument {
            ref_id: ref_id.to_string(),
            version: Version::of_bytes(&bytes),
            bytes,
        });
        Ok(doc.into())
    }

    /// Remove a reference document. Links pointing at it become dangling.
    pub fn delete(&self, ref_id: &str) -> Result<(), StoreError> {
        self.kv.delete(&key(ref_id))?;
        tracing::info!(ref_id, "reference document deleted");
        Ok(())
    }
}

fn key(ref_id: &str) -> String {
    format!("ref/{ref_id}")
}
