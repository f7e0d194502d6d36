//! # Subdocument Links
//!
//! A subdocument is addressed by `(device, subdocument id)` and holds
//! either inline bytes or an indirection to a reference document. Every
//! link mints a fresh version token, so relinking identical content still
//! advances the version.
//!
//! ## Link Body Wire Format
//!
//! ```text
//! +-----------+------------------------------------------+
//! | 4 bytes   | rest                                     |
//! +-----------+------------------------------------------+
//! | 00000000  | UTF-8 reference id  (indirection)        |
//! | 00000001  | literal subdocument bytes (inline)       |
//! +-----------+------------------------------------------+
//! ```
//!
//! Any other marker is rejected.
//!
//! ## Indirection
//!
//! An indirection is stored without checking that the reference exists;
//! provisioning references after links is legal. Resolving a dangling
//! indirection yields `Lookup::Absent`, not an error. The effective
//! version of a resolved indirection combines the link version with the
//! reference content digest.

use std::sync::Arc;

use webcfg_core::{DeviceMac, Lookup, SubdocId, ValidationError, Version};

use crate::error::StoreError;
use crate::kv::KvBackend;
use crate::reference::ReferenceStore;

/// Width of the link body marker.
pub const LINK_MARKER_LEN: usize = 4;
/// Marker of an indirection link body.
pub const REFERENCE_MARKER: [u8; LINK_MARKER_LEN] = [0, 0, 0, 0];
/// Marker of an inline link body.
pub const INLINE_MARKER: [u8; LINK_MARKER_LEN] = [0, 0, 0, 1];

const RECORD_INLINE: u8 = b'I';
const RECORD_REFERENCE: u8 = b'R';

/// What a subdocument holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Owned subdocument bytes.
    Inline(Vec<u8>),
    /// Reference id of a [`crate::ReferenceDocument`].
    Reference(String),
}

impl Payload {
    /// Decode a link request body.
    pub fn from_link_body(body: &[u8]) -> Result<Self, ValidationError> {
        if body.len() < LINK_MARKER_LEN {
            return Err(ValidationError::InvalidLinkBody(format!(
                "body is {} bytes, marker needs {LINK_MARKER_LEN}",
                body.len()
            )));
        }
        let (marker, rest) = body.split_at(LINK_MARKER_LEN);
        match marker {
            m if m == REFERENCE_MARKER => {
                let ref_id = std::str::from_utf8(rest)
                    .map_err(|_| ValidationError::InvalidReferenceId("not UTF-8".into()))?;
                if ref_id.is_empty() {
                    return Err(ValidationError::InvalidReferenceId("empty".into()));
                }
                Ok(Self::Reference(ref_id.to_string()))
            }
            m if m == INLINE_MARKER => Ok(Self::Inline(rest.to_vec())),
            other => Err(ValidationError::InvalidLinkBody(format!(
                "unknown marker {other:02x?}"
            ))),
        }
    }

    /// Encode as a link request body.
    pub fn to_link_body(&self) -> Vec<u8> {
        let (marker, rest): (&[u8], &[u8]) = match self {
            Self::Inline(bytes) => (&INLINE_MARKER, bytes),
            Self::Reference(ref_id) => (&REFERENCE_MARKER, ref_id.as_bytes()),
        };
        [marker, rest].concat()
    }
}

/// A stored subdocument link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubdocRecord {
    /// Version minted when the link was written.
    pub version: Version,
    pub payload: Payload,
}

impl SubdocRecord {
    /// Storage layout: tag byte, version length byte, version, payload.
    fn encode(&self) -> Vec<u8> {
        let (tag, body): (u8, &[u8]) = match &self.payload {
            Payload::Inline(bytes) => (RECORD_INLINE, bytes),
            Payload::Reference(ref_id) => (RECORD_REFERENCE, ref_id.as_bytes()),
        };
        let version = self.version.as_str().as_bytes();
        let mut out = Vec::with_capacity(2 + version.len() + body.len());
        out.push(tag);
        let version = &version[..version.len().min(u8::MAX as usize)];
        out.push(version.len() as u8);
        out.extend_from_slice(version);
        out.extend_from_slice(body);
        out
    }

    fn decode(key: &str, raw: &[u8]) -> Result<Self, StoreError> {
        let corrupt = |reason: &str| StoreError::Corrupt {
            key: key.to_string(),
            reason: reason.to_string(),
        };
        let (&tag, rest) = raw.split_first().ok_or_else(|| corrupt("empty record"))?;
        let (&vlen, rest) = rest.split_first().ok_or_else(|| corrupt("missing version"))?;
        let vlen = vlen as usize;
        if rest.len() < vlen {
            return Err(corrupt("truncated version"));
        }
        let (version, body) = rest.split_at(vlen);
        let version = std::str::from_utf8(version)
            .map_err(|_| corrupt("version is not UTF-8"))?;
        let payload = match tag {
            RECORD_INLINE => Payload::Inline(body.to_vec()),
            RECORD_REFERENCE => Payload::Reference(
                std::str::from_utf8(body)
                    .map_err(|_| corrupt("reference id is not UTF-8"))?
                    .to_string(),
            ),
            _ => return Err(corrupt("unknown record tag")),
        };
        Ok(Self {
            version: Version::new(version),
            payload,
        })
    }
}

/// A subdocument with its bytes resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSubdoc {
    pub id: SubdocId,
    /// Effective version of the resolved bytes.
    pub version: Version,
    pub bytes: Vec<u8>,
}

/// Associates `(device, subdocument)` pairs with payloads.
#[derive(Debug, Clone)]
pub struct SubdocumentLinker {
    kv: Arc<dyn KvBackend>,
    references: ReferenceStore,
}

impl SubdocumentLinker {
    pub fn new(kv: Arc<dyn KvBackend>, references: ReferenceStore) -> Self {
        Self { kv, references }
    }

    /// Store a link and return its new version.
    pub fn link(
        &self,
        mac: &DeviceMac,
        subdoc: &SubdocId,
        payload: Payload,
    ) -> Result<Version, StoreError> {
        let record = SubdocRecord {
            version: Version::generate(),
            payload,
        };
        self.kv.put(&key(mac, subdoc), record.encode())?;
        match &record.payload {
            Payload::Inline(bytes) => tracing::info!(
                mac = %mac, subdoc_id = %subdoc, size = bytes.len(),
                version = %record.version, "subdocument linked inline"
            ),
            Payload::Reference(ref_id) => tracing::info!(
                mac = %mac, subdoc_id = %subdoc, ref_id = ref_id.as_str(),
                version = %record.version, "subdocument linked to reference"
            ),
        }
        Ok(record.version)
    }

    /// Read the raw link without dereferencing it.
    pub fn record(
        &self,
        mac: &DeviceMac,
        subdoc: &SubdocId,
    ) -> Result<Lookup<SubdocRecord>, StoreError> {
        let key = key(mac, subdoc);
        match self.kv.get(&key)? {
            Some(raw) => SubdocRecord::decode(&key, &raw).map(Lookup::Present),
            None => Ok(Lookup::Absent),
        }
    }

    /// Resolve a subdocument to bytes, following an indirection.
    ///
    /// Never-linked subdocuments and dangling indirections are `Absent`.
    pub fn resolve(
        &self,
        mac: &DeviceMac,
        subdoc: &SubdocId,
    ) -> Result<Lookup<ResolvedSubdoc>, StoreError> {
        let record = match self.record(mac, subdoc)? {
            Lookup::Present(record) => record,
            Lookup::Absent => return Ok(Lookup::Absent),
        };
        match record.payload {
            Payload::Inline(bytes) => Ok(Lookup::Present(ResolvedSubdoc {
                id: subdoc.clone(),
                version: record.version,
                bytes,
            })),
            Payload::Reference(ref_id) => match self.references.get(&ref_id)? {
                Lookup::Present(doc) => Ok(Lookup::Present(ResolvedSubdoc {
                    id: subdoc.clone(),
                    version: Version::combine(&[&record.version, &doc.version]),
                    bytes: doc.bytes,
                })),
                Lookup::Absent => {
                    tracing::debug!(
                        mac = %mac, subdoc_id = %subdoc, ref_id = ref_id.as_str(),
                        "dangling reference"
                    );
                    Ok(Lookup::Absent)
                }
            },
        }
    }

    /// Remove a link. The referenced document, if any, is untouched.
    pub fn unlink(&self, mac: &DeviceMac, subdoc: &SubdocId) -> Result<(), StoreError> {
        self.kv.delete(&key(mac, subdoc))?;
        tracing::info!(mac = %mac, subdoc_id = %subdoc, "subdocument unlinked");
        Ok(())
    }
}

fn key(mac: &DeviceMac, subdoc: &SubdocId) -> String {
    format!("subdoc/{mac}/{subdoc}")
}
