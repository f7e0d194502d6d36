//! # webcfg-store — Subdocument Storage and Aggregation
//!
//! Everything between a validated request and the persistent key-value
//! engine:
//!
//! - [`kv`]: the `KvBackend` seam (get/put/delete by key) and an
//!   in-memory implementation backed by `DashMap`.
//! - [`reference`]: content-addressable reference documents, independent
//!   of any device.
//! - [`linker`]: per-device subdocument links holding inline bytes or an
//!   indirection to a reference document.
//! - [`rootdoc`]: per-device root document (supplementary query params).
//! - [`aggregator`]: resolves a group request into one multipart payload.
//!
//! ## Concurrency
//!
//! No component holds in-process locks or cross-request state. Atomicity
//! of concurrent reads, writes, and deletes is whatever the backend
//! provides; every store is a cheap `Clone` over an `Arc<dyn KvBackend>`.
//!
//! ## Absent vs. Error
//!
//! Reads return `Result<Lookup<T>, StoreError>`. A missing key or a
//! dangling indirection is `Lookup::Absent`, never an error.

pub mod aggregator;
pub mod error;
pub mod kv;
pub mod linker;
pub mod reference;
pub mod rootdoc;

pub use aggregator::{AggregateError, ConfigAggregator, ConfigOutcome};
pub use error::StoreError;
pub use kv::{KvBackend, MemoryBackend};
pub use linker::{Payload, ResolvedSubdoc, SubdocRecord, SubdocumentLinker};
pub use reference::{ReferenceDocument, ReferenceStore};
pub use rootdoc::DeviceRootStore;
