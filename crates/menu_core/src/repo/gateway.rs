//! Persistence gateway contract for whole catalog documents.
//!
//! # Responsibility
//! - Define fetch-by-key and whole-document replace against durable storage.
//!
//! # Invariants
//! - `replace_document` always overwrites the full document; there is no
//!   field-level merge.
//! - Documents returned by `fetch_document` have passed `Catalog::validate()`.

use crate::db::DbError;
use crate::model::catalog::{Catalog, CatalogValidationError};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Failure at the durability boundary.
#[derive(Debug)]
pub enum PersistenceError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Document could not be encoded or decoded as JSON.
    Serialization(serde_json::Error),
    /// Stored or outgoing document violates catalog invariants.
    InvalidDocument(String),
    /// Storage backend unreachable or refused the call.
    Unavailable(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
}

impl Display for PersistenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Serialization(err) => write!(f, "catalog document encoding failed: {err}"),
            Self::InvalidDocument(message) => write!(f, "invalid catalog document: {message}"),
            Self::Unavailable(message) => write!(f, "catalog storage unavailable: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "catalog gateway requires schema version {expected_version}, got {actual_version}"
            ),
        }
    }
}

impl Error for PersistenceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::InvalidDocument(_) => None,
            Self::Unavailable(_) => None,
            Self::UninitializedConnection { .. } => None,
        }
    }
}

impl From<DbError> for PersistenceError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for PersistenceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

impl From<CatalogValidationError> for PersistenceError {
    fn from(value: CatalogValidationError) -> Self {
        Self::InvalidDocument(value.to_string())
    }
}

/// Durable document storage keyed by owner.
pub trait CatalogGateway {
    /// Loads the document stored under `key`, or `None` when absent.
    fn fetch_document(&self, key: &str) -> PersistenceResult<Option<Catalog>>;
    /// Overwrites the document stored under `key` with `catalog`.
    fn replace_document(&self, key: &str, catalog: &Catalog) -> PersistenceResult<()>;
}

impl<G: CatalogGateway + ?Sized> CatalogGateway for &G {
    fn fetch_document(&self, key: &str) -> PersistenceResult<Option<Catalog>> {
        (**self).fetch_document(key)
    }

    fn replace_document(&self, key: &str, catalog: &Catalog) -> PersistenceResult<()> {
        (**self).replace_document(key, catalog)
    }
}

impl<G: CatalogGateway + ?Sized> CatalogGateway for Arc<G> {
    fn fetch_document(&self, key: &str) -> PersistenceResult<Option<Catalog>> {
        (**self).fetch_document(key)
    }

    fn replace_document(&self, key: &str, catalog: &Catalog) -> PersistenceResult<()> {
        (**self).replace_document(key, catalog)
    }
}
