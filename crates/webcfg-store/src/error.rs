//! Storage error types.

use thiserror::Error;

/// Failure of the key-value backend or of a stored record.
///
/// A missing key is not an error; see [`webcfg_core::Lookup`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backend could not complete the operation.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A stored record could not be decoded.
    #[error("corrupt record at {key}: {reason}")]
    Corrupt {
        /// Key of the offending record.
        key: String,
        /// What was wrong with it.
        reason: String,
    },
}
