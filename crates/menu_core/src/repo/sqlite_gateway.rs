//! SQLite-backed catalog document gateway.
//!
//! # Responsibility
//! - Store one JSON catalog document per owner key.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Writes replace the whole row; no column-level patching.
//! - Writes validate the document before any SQL runs.

use crate::db::migrations::latest_version;
use crate::db::schema_version;
use crate::model::catalog::Catalog;
use crate::repo::document::{decode_catalog, encode_catalog};
use crate::repo::gateway::{CatalogGateway, PersistenceError, PersistenceResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Catalog gateway over a migrated SQLite connection.
pub struct SqliteCatalogGateway {
    conn: Mutex<Connection>,
}

impl SqliteCatalogGateway {
    /// Wraps a connection opened through `db::open_db*`.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations have not been applied.
    pub fn try_new(conn: Connection) -> PersistenceResult<Self> {
        let actual_version = schema_version(&conn)?;
        let expected_version = latest_version();
        if actual_version != expected_version {
            return Err(PersistenceError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Lists stored document keys in ascending order.
    pub fn document_keys(&self) -> PersistenceResult<Vec<String>> {
        let conn = self.lock();
        let mut stmt =
            conn.prepare("SELECT doc_key FROM catalog_documents ORDER BY doc_key ASC;")?;
        let mut rows = stmt.query([])?;
        let mut keys: Vec<String> = Vec::new();
        while let Some(row) = rows.next()? {
            keys.push(row.get(0)?);
        }
        Ok(keys)
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CatalogGateway for SqliteCatalogGateway {
    fn fetch_document(&self, key: &str) -> PersistenceResult<Option<Catalog>> {
        let document: Option<String> = self
            .lock()
            .query_row(
                "SELECT document FROM catalog_documents WHERE doc_key = ?1;",
                [key],
                |row| row.get(0),
            )
            .optional()?;

        document.as_deref().map(decode_catalog).transpose()
    }

    fn replace_document(&self, key: &str, catalog: &Catalog) -> PersistenceResult<()> {
        let document = encode_catalog(catalog)?;
        self.lock().execute(
            "INSERT INTO catalog_documents (doc_key, document, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(doc_key) DO UPDATE SET
                document = excluded.document,
                updated_at = excluded.updated_at;",
            params![key, document, catalog.updated_at],
        )?;
        Ok(())
    }
}
