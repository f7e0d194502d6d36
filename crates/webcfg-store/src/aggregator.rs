//! # Config Aggregation
//!
//! Resolves a validated [`GroupRequest`] for one device into a single
//! multipart payload.
//!
//! ## Resolution
//!
//! Each non-root member is resolved through the [`SubdocumentLinker`].
//! Members that resolve to `Absent` (never linked, or dangling) are
//! omitted without error. Any storage or codec error aborts the whole
//! request; a partial payload is never produced.
//!
//! ## Conditional Retrieval
//!
//! The root version is recomputed from the present members and their
//! versions, so a member appearing or disappearing changes it even when
//! no payload changed. The request is answered `NotModified` only when:
//!
//! 1. at least one member is present,
//! 2. the client's root token equals the recomputed root version, and
//! 3. every present member's version equals the client's token for it.
//!
//! Otherwise the full present set is returned, unchanged parts included.

use webcfg_core::multipart::{self, Multipart, Part};
use webcfg_core::{CodecError, DeviceMac, GroupRequest, Lookup, Version};

use crate::error::StoreError;
use crate::linker::{ResolvedSubdoc, SubdocumentLinker};

/// Hard failure while aggregating.
#[derive(thiserror::Error, Debug)]
pub enum AggregateError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Result of [`ConfigAggregator::get_config`].
#[derive(Debug)]
pub enum ConfigOutcome {
    /// The client already holds every present member.
    NotModified { root_version: Version },
    /// The full present set, encoded.
    Modified {
        root_version: Version,
        body: Multipart,
        part_count: usize,
    },
}

impl ConfigOutcome {
    pub fn root_version(&self) -> &Version {
        match self {
            Self::NotModified { root_version } | Self::Modified { root_version, .. } => {
                root_version
            }
        }
    }
}

/// Per-device config aggregator.
#[derive(Debug, Clone)]
pub struct ConfigAggregator {
    linker: SubdocumentLinker,
}

impl ConfigAggregator {
    pub fn new(linker: SubdocumentLinker) -> Self {
        Self { linker }
    }

    /// Resolve and encode the requested group for `mac`.
    pub fn get_config(
        &self,
        mac: &DeviceMac,
        request: &GroupRequest,
    ) -> Result<ConfigOutcome, AggregateError> {
        let mut present: Vec<(ResolvedSubdoc, &Version)> = Vec::new();
        for (id, client_version) in request.members() {
            match self.linker.resolve(mac, id)? {
                Lookup::Present(doc) => present.push((doc, client_version)),
                Lookup::Absent => {
                    tracing::debug!(mac = %mac, subdoc_id = %id, "subdocument absent, omitted");
                }
            }
        }

        let root_version = Version::root(present.iter().map(|(doc, _)| (&doc.id, &doc.version)));

        let unchanged = !present.is_empty()
            && request.root_version() == &root_version
            && present.iter().all(|(doc, client)| &doc.version == *client);
        if unchanged {
            tracing::debug!(mac = %mac, root_version = %root_version, "config not modified");
            return Ok(ConfigOutcome::NotModified { root_version });
        }

        let parts: Vec<Part> = present
            .into_iter()
            .map(|(doc, _)| Part::new(doc.id.as_str(), doc.version, doc.bytes))
            .collect();
        let part_count = parts.len();
        let body = multipart::encode(&parts)?;
        tracing::info!(mac = %mac, part_count, root_version = %root_version, "config assembled");
        Ok(ConfigOutcome::Modified {
            root_version,
            body,
            part_count,
        })
    }
}
