//! # Version Tokens
//!
//! A version token is an opaque string compared only by equality, playing
//! the role of an HTTP entity tag. Tokens are 16 lowercase hex digits
//! taken from a SHA-256 digest, so they never contain the `,` separator
//! used by the `If-None-Match` list.
//!
//! ## Derivations
//!
//! - [`Version::generate`]: fresh random token, minted on every link.
//! - [`Version::of_bytes`]: content digest, used for reference documents
//!   and upstream payloads.
//! - [`Version::combine`]: digest of several tokens, used when a part's
//!   effective version depends on both its link and its reference target.
//! - [`Version::root`]: aggregate over a group's present members, so a
//!   member appearing or disappearing changes the root token.

use std::fmt;

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::subdoc::SubdocId;

const TOKEN_BYTES: usize = 8;

/// Opaque version token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version(String);

impl Version {
    /// Wrap a token received from a client or read from storage.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// A fresh token that differs from every previously generated one.
    pub fn generate() -> Self {
        Self::of_bytes(Uuid::new_v4().as_bytes())
    }

    /// Digest-derived token for `bytes`.
    pub fn of_bytes(bytes: &[u8]) -> Self {
        let digest = Sha256::digest(bytes);
        Self(hex(&digest[..TOKEN_BYTES]))
    }

    /// Token derived from an ordered list of tokens.
    pub fn combine(parts: &[&Version]) -> Self {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part.0.as_bytes());
            hasher.update([0u8]);
        }
        Self(hex(&hasher.finalize()[..TOKEN_BYTES]))
    }

    /// Aggregate token over a group's present members, in request order.
    pub fn root<'a, I>(members: I) -> Self
    where
        I: IntoIterator<Item = (&'a SubdocId, &'a Version)>,
    {
        let mut hasher = Sha256::new();
        hasher.update(b"root");
        for (id, version) in members {
            hasher.update([b'\n']);
            hasher.update(id.as_str().as_bytes());
            hasher.update([b'=']);
            hasher.update(version.0.as_bytes());
        }
        Self(hex(&hasher.finalize()[..TOKEN_BYTES]))
    }

    /// Borrow the token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
