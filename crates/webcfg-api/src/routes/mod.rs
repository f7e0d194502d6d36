//! Route modules, one per resource.

pub mod device;
pub mod reference;
pub mod supplementary;

use axum::http::HeaderValue;
use webcfg_core::Version;

use crate::error::AppError;

/// Media type of stored subdocument and reference payloads.
pub(crate) const APPLICATION_MSGPACK: &str = webcfg_core::multipart::APPLICATION_MSGPACK;

pub(crate) fn header_value(value: &str) -> Result<HeaderValue, AppError> {
    HeaderValue::from_str(value)
        .map_err(|_| AppError::Internal(format!("value {value:?} is not a valid header")))
}

pub(crate) fn etag(version: &Version) -> Result<HeaderValue, AppError> {
    header_value(version.as_str())
}
