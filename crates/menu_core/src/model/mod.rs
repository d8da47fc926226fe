//! Catalog domain model.
//!
//! # Responsibility
//! - Define the normalized catalog document used by all core logic.
//! - Define the operation vocabulary accepted by the mutation engine.
//!
//! # Invariants
//! - One internal record shape; storage-format variants are handled only in
//!   `repo::document`.

pub mod catalog;
pub mod operation;
