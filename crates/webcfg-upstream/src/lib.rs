//! # webcfg-upstream — Telemetry Profile Retrieval
//!
//! Fetches telemetry profile catalogs from two independent upstream
//! services and merges them into the single `telemetry` part served on the
//! supplementary endpoint.
//!
//! - [`xconf`]: primary source, returns `{"profiles":[...]}`.
//! - [`profiles`]: optional secondary source, returns a bare array keyed
//!   by the device's stored query params.
//! - [`telemetry`]: query building, merge, and [`TelemetryProfileService`].
//!
//! ## Retries
//!
//! All calls go through one [`UpstreamClient`] with a shared
//! [`RetryPolicy`]: transport errors and 5xx responses are retried with
//! exponential backoff, 4xx responses (404 included) are returned
//! immediately. Local store reads are never retried.
//!
//! ## Cancellation
//!
//! Calls are plain futures. Dropping the caller's future (for example
//! when a request timeout fires) aborts the in-flight HTTP request and any
//! pending backoff sleep.

pub mod client;
pub mod config;
pub mod error;
pub mod profiles;
pub(crate) mod retry;
pub mod telemetry;
pub mod xconf;

pub use client::UpstreamClient;
pub use config::{ConfigError, RetryPolicy, TelemetryConfig, UpstreamConfig};
pub use error::UpstreamError;
pub use telemetry::{
    append_profiles, TelemetryBundle, TelemetryError, TelemetryProfileService, TelemetryQuery,
};
