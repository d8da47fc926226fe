//! Identifier generation for catalogs, sections and items.
//!
//! # Invariants
//! - Ids are `<prefix>-<salt>-<counter>`; the counter never repeats within
//!   one process.
//! - An id returned for a catalog is never live in that catalog.

use crate::model::catalog::Catalog;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

static NEXT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Kind of object an identifier is minted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    Catalog,
    Section,
    Item,
}

impl IdKind {
    fn prefix(self) -> &'static str {
        match self {
            Self::Catalog => "menu",
            Self::Section => "section",
            Self::Item => "item",
        }
    }
}

/// Counter-plus-salt identifier source.
#[derive(Debug, Clone)]
pub struct IdentifierGenerator {
    salt: String,
}

impl Default for IdentifierGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentifierGenerator {
    /// Creates a generator with a random 8-hex-char salt.
    pub fn new() -> Self {
        let salt = Uuid::new_v4().simple().to_string()[..8].to_string();
        Self { salt }
    }

    /// Creates a generator with a fixed salt.
    pub fn with_salt(salt: impl Into<String>) -> Self {
        Self { salt: salt.into() }
    }

    /// Mints one identifier without a liveness check.
    pub fn next(&self, kind: IdKind) -> String {
        let sequence = NEXT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}-{sequence}", kind.prefix(), self.salt)
    }

    /// Mints one identifier that is not live anywhere in `catalog`.
    pub fn next_for(&self, kind: IdKind, catalog: Option<&Catalog>) -> String {
        loop {
            let candidate = self.next(kind);
            match catalog {
                Some(catalog) if catalog.contains_id(&candidate) => continue,
                _ => return candidate,
            }
        }
    }
}
