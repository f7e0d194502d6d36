//! # webcfg-core — Foundational Types for webcfg
//!
//! Leaf crate of the workspace. Defines the typed primitives every other
//! crate builds on and depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtypes for identifiers.** `DeviceMac`, `SubdocId`, `Version`:
//!    validated constructors, no bare strings crossing crate boundaries.
//!
//! 2. **Absent is not an error.** Lookups return `Result<Lookup<T>, E>`:
//!    `Lookup::Absent` is a normal outcome that callers may skip, while
//!    `Err(E)` always aborts the request.
//!
//! 3. **Injectable valid-id registry.** `SubdocRegistry` maps subdocument
//!    ids to bit positions and is extended from configuration, never by
//!    recompiling.
//!
//! 4. **Binary-safe wire codec.** `multipart` never assumes UTF-8 payloads.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `webcfg-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod context;
pub mod error;
pub mod lookup;
pub mod mac;
pub mod multipart;
pub mod query;
pub mod subdoc;
pub mod version;

pub use context::RequestContext;
pub use error::{CodecError, ValidationError};
pub use lookup::Lookup;
pub use mac::DeviceMac;
pub use multipart::{Multipart, Part};
pub use query::{GroupRequest, PokeTarget, PokeTargets};
pub use subdoc::{SubdocId, SubdocRegistry};
pub use version::Version;
