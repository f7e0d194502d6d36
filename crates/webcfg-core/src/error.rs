//! # Error Types
//!
//! Request-shape and wire-format errors shared by every layer.
//!
//! `ValidationError` is raised before storage is touched and always maps
//! to a client error. `CodecError` covers multipart framing failures.

use thiserror::Error;

/// A request did not have the expected shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// MAC address is not exactly 12 hexadecimal digits.
    #[error("invalid mac address: {0:?}")]
    InvalidMac(String),

    /// The `group_id` query parameter is missing or empty.
    #[error("missing group_id query parameter")]
    MissingGroupId,

    /// The first group member is not `root`.
    #[error("group must start with \"root\", got {0:?}")]
    MissingRoot(String),

    /// A group member is not in the valid subdocument id set.
    #[error("unknown subdocument id: {0:?}")]
    UnknownSubdoc(String),

    /// The version-token list does not line up with the id list.
    #[error("version count mismatch: {ids} ids but {versions} versions")]
    VersionCountMismatch {
        /// Number of ids in the group, including `root`.
        ids: usize,
        /// Number of client-held version tokens.
        versions: usize,
    },

    /// A `doc` entry in a poke request is not supported.
    #[error("invalid poke doc: {0:?}")]
    InvalidPokeDoc(String),

    /// A `route` value in a poke request is not supported.
    #[error("invalid poke route: {0:?}")]
    InvalidPokeRoute(String),

    /// A link body is shorter than its marker or carries an unknown marker.
    #[error("invalid link body: {0}")]
    InvalidLinkBody(String),

    /// A reference id is empty or not valid UTF-8.
    #[error("invalid reference id: {0}")]
    InvalidReferenceId(String),

    /// Device query params are not a UTF-8 query string.
    #[error("invalid query params: {0}")]
    InvalidQueryParams(String),
}

/// Multipart encoding or decoding failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The content type carried no `boundary` parameter.
    #[error("missing multipart boundary in content type {0:?}")]
    MissingBoundary(String),

    /// The body could not be split into parts.
    #[error("malformed multipart body: {0}")]
    Malformed(String),

    /// A part had no `Namespace` header.
    #[error("multipart part {0} has no name")]
    UnnamedPart(usize),

    /// No boundary could be found that is absent from every payload.
    #[error("could not choose a multipart boundary")]
    BoundaryExhausted,
}
