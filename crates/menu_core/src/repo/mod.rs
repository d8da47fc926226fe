//! Persistence boundary for catalog documents.
//!
//! # Responsibility
//! - Define the whole-document gateway contract consumed by the store.
//! - Normalize stored document shapes in one adapter.
//! - Provide a SQLite-backed gateway implementation.
//!
//! # Invariants
//! - Gateways return semantic `InvalidDocument` errors in addition to
//!   transport errors.

pub mod document;
pub mod gateway;
pub mod sqlite_gateway;
