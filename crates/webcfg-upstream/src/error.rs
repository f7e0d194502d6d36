//! Upstream client error types.

/// Errors from upstream HTTP calls.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// HTTP transport error, after retries.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The upstream answered with a non-2xx status.
    #[error("{endpoint} returned {status}: {body}")]
    Remote {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// A URL could not be built for the call.
    #[error("invalid URL for {endpoint}: {reason}")]
    InvalidUrl { endpoint: String, reason: String },
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl UpstreamError {
    /// HTTP status returned by the upstream, if it answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` when the upstream answered 404.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
