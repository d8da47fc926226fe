//! Catalog use-case services.
//!
//! # Responsibility
//! - Compute next catalog documents from user operations.
//! - Serialize mutations per owner and keep memory consistent with storage.
//!
//! # Invariants
//! - Only `CatalogStore` writes in-memory catalog state.
//! - Service layer remains storage-agnostic; it sees `CatalogGateway` only.

pub mod catalog_store;
pub mod clock;
pub mod id_generator;
pub mod mutation_engine;
pub mod store_registry;
