//! Catalog (menu) mutation and synchronization core.
//! This crate is the single source of truth for catalog invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::CoreConfig;
pub use logging::{default_log_level, init_logging, logging_status, LogLevel, LoggingError};
pub use model::catalog::{
    Catalog, CatalogId, CatalogValidationError, Item, ItemId, OwnerId, Section, SectionId,
};
pub use model::operation::{default_catalog_name, ItemFields, Operation};
pub use repo::document::{decode_catalog, encode_catalog};
pub use repo::gateway::{CatalogGateway, PersistenceError, PersistenceResult};
pub use repo::sqlite_gateway::SqliteCatalogGateway;
pub use service::catalog_store::{CatalogStore, StoreError, StoreResult};
pub use service::clock::{Clock, SystemClock};
pub use service::id_generator::{IdKind, IdentifierGenerator};
pub use service::mutation_engine::{
    apply_operation, EntityKind, MutationContext, MutationError, MutationOutcome,
    ValidationReason,
};
pub use service::store_registry::{CatalogStoreRegistry, SharedStore};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
