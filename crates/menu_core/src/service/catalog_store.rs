//! Catalog store: serialized mutation and persistence for one owner.
//!
//! # Responsibility
//! - Hold the authoritative in-memory catalog for one owner key.
//! - Run every mutation as engine -> whole-document replace -> commit.
//!
//! # Invariants
//! - At most one load or mutation runs at a time per store. Later calls queue
//!   on the mutation gate and run in arrival order of lock acquisition.
//! - In-memory state is written only after the gateway accepted the document,
//!   so a failed call leaves it exactly as it was before the call.
//! - `current_state` never waits on the gateway.
//! - Errors are returned unchanged; nothing is retried here.

use crate::model::catalog::{Catalog, OwnerId};
use crate::model::operation::Operation;
use crate::repo::gateway::{CatalogGateway, PersistenceError};
use crate::service::clock::{Clock, SystemClock};
use crate::service::id_generator::IdentifierGenerator;
use crate::service::mutation_engine::{
    apply_operation, EntityKind, MutationContext, MutationError, MutationOutcome,
    ValidationReason,
};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Instant;

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by store operations.
#[derive(Debug)]
pub enum StoreError {
    /// Malformed operation input. Raised before any persistence call.
    Validation {
        field: &'static str,
        reason: ValidationReason,
    },
    /// Operation references an id absent from the current catalog.
    NotFound { kind: EntityKind, id: String },
    /// Durability boundary failed; in-memory state was kept.
    Persistence(PersistenceError),
}

impl StoreError {
    /// Stable error code for log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::NotFound { .. } => "not_found",
            Self::Persistence(_) => "persistence",
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation { field, reason } => write!(f, "invalid {field}: {reason}"),
            Self::NotFound { kind, id } => write!(f, "{kind} not found: `{id}`"),
            Self::Persistence(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Persistence(err) => Some(err),
            _ => None,
        }
    }
}

impl From<MutationError> for StoreError {
    fn from(value: MutationError) -> Self {
        match value {
            MutationError::Validation { field, reason } => Self::Validation { field, reason },
            MutationError::NotFound { kind, id } => Self::NotFound { kind, id },
        }
    }
}

impl From<PersistenceError> for StoreError {
    fn from(value: PersistenceError) -> Self {
        Self::Persistence(value)
    }
}

/// Authoritative catalog holder for one owner key.
pub struct CatalogStore<G: CatalogGateway> {
    owner_key: OwnerId,
    gateway: G,
    ids: IdentifierGenerator,
    clock: Arc<dyn Clock>,
    state: RwLock<Option<Catalog>>,
    mutation_gate: Mutex<()>,
}

impl<G: CatalogGateway> CatalogStore<G> {
    /// Creates an empty store for `owner_key` using the system clock.
    pub fn new(owner_key: impl Into<OwnerId>, gateway: G) -> Self {
        Self::with_clock(owner_key, gateway, Arc::new(SystemClock))
    }

    /// Creates an empty store with an injected clock.
    ///
    /// Surrounding whitespace in `owner_key` is dropped.
    pub fn with_clock(owner_key: impl Into<OwnerId>, gateway: G, clock: Arc<dyn Clock>) -> Self {
        let owner_key: OwnerId = owner_key.into();
        Self {
            owner_key: owner_key.trim().to_string(),
            gateway,
            ids: IdentifierGenerator::new(),
            clock,
            state: RwLock::new(None),
            mutation_gate: Mutex::new(()),
        }
    }

    /// Owner key this store addresses.
    pub fn owner_key(&self) -> &str {
        &self.owner_key
    }

    /// Fetches the owner's document and makes it the in-memory state.
    ///
    /// An absent document leaves the state empty; the caller creates the
    /// catalog explicitly. On failure the previous state is kept.
    pub fn load(&self) -> StoreResult<Option<Catalog>> {
        let _gate = self.mutation_gate.lock().unwrap_or_else(PoisonError::into_inner);
        let started_at = Instant::now();
        info!(
            "event=catalog_load module=store status=start owner={}",
            self.owner_key
        );

        let fetched = match self.gateway.fetch_document(&self.owner_key) {
            Ok(fetched) => fetched,
            Err(err) => {
                error!(
                    "event=catalog_load module=store status=error owner={} duration_ms={} error_code=persistence error={}",
                    self.owner_key,
                    started_at.elapsed().as_millis(),
                    err
                );
                return Err(err.into());
            }
        };

        info!(
            "event=catalog_load module=store status=ok owner={} found={} sections={} duration_ms={}",
            self.owner_key,
            fetched.is_some(),
            fetched.as_ref().map_or(0, |catalog| catalog.sections.len()),
            started_at.elapsed().as_millis()
        );
        self.commit(fetched.clone());
        Ok(fetched)
    }

    /// Returns a copy of the in-memory catalog, if any.
    pub fn current_state(&self) -> Option<Catalog> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Validates, persists and commits one operation.
    ///
    /// # Errors
    /// - `Validation` / `NotFound` before any gateway call.
    /// - `Persistence` when the replace failed; state is unchanged.
    pub fn apply_mutation(&self, operation: Operation) -> StoreResult<MutationOutcome> {
        let _gate = self.mutation_gate.lock().unwrap_or_else(PoisonError::into_inner);
        let started_at = Instant::now();
        let op = operation.kind();
        info!(
            "event=catalog_mutation module=store status=start op={op} owner={}",
            self.owner_key
        );

        let result = self.mutate_locked(&operation);
        match &result {
            Ok(outcome) => info!(
                "event=catalog_mutation module=store status=ok op={op} owner={} sections={} items={} duration_ms={}",
                self.owner_key,
                outcome.catalog.sections.len(),
                outcome.catalog.item_count(),
                started_at.elapsed().as_millis()
            ),
            Err(StoreError::Persistence(err)) => error!(
                "event=catalog_mutation module=store status=error op={op} owner={} duration_ms={} error_code=persistence error={}",
                self.owner_key,
                started_at.elapsed().as_millis(),
                err
            ),
            Err(err) => warn!(
                "event=catalog_mutation module=store status=rejected op={op} owner={} error_code={} error={}",
                self.owner_key,
                err.code(),
                err
            ),
        }
        result
    }

    /// Returns the current catalog, creating it with `name` when none exists.
    ///
    /// Call `load` first; this does not consult the gateway for an existing
    /// document.
    pub fn ensure_catalog(&self, name: impl Into<String>) -> StoreResult<Catalog> {
        if let Some(catalog) = self.current_state() {
            return Ok(catalog);
        }
        match self.apply_mutation(Operation::CreateCatalog {
            owner_id: self.owner_key.clone(),
            name: name.into(),
        }) {
            Ok(outcome) => Ok(outcome.catalog),
            // Another caller created it while this one queued.
            Err(StoreError::Validation {
                reason: ValidationReason::AlreadyExists,
                ..
            }) => self.current_state().ok_or(StoreError::NotFound {
                kind: EntityKind::Catalog,
                id: self.owner_key.clone(),
            }),
            Err(err) => Err(err),
        }
    }

    fn mutate_locked(&self, operation: &Operation) -> StoreResult<MutationOutcome> {
        if let Operation::CreateCatalog { owner_id, .. } = operation {
            if owner_id.trim() != self.owner_key {
                return Err(StoreError::Validation {
                    field: "catalog.owner_id",
                    reason: ValidationReason::OwnerMismatch,
                });
            }
        }

        // Only this gated path writes `state`, so the snapshot stays current
        // for the whole call.
        let snapshot = self.current_state();
        let ctx = MutationContext {
            now_epoch_ms: self.clock.now_epoch_ms(),
            ids: &self.ids,
        };
        let outcome = apply_operation(snapshot.as_ref(), operation, &ctx)?;

        self.gateway
            .replace_document(&self.owner_key, &outcome.catalog)?;
        self.commit(Some(outcome.catalog.clone()));
        Ok(outcome)
    }

    fn commit(&self, next: Option<Catalog>) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = next;
    }
}
