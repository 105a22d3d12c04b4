//! Persisted and wire types for the hydrate session client.
//!
//! This crate contains the serde-serializable shapes that cross a boundary:
//! the session record stored in browser-like storage, the decoded bearer
//! token payload, and the request/response bodies of the auth endpoints.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! * Pure data: No behavior beyond serialization/deserialization
//! * Lenient on input: Legacy field names are accepted as aliases
//! * Stable: Changes only when the persisted or wire format changes
//!
//! Pass handling, storage and token inspection live in `hydrate-rs`.

pub mod api;
pub mod claims;
pub mod record;

pub use api::*;
pub use claims::*;
pub use record::*;
