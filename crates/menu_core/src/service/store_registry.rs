//! In-process registry of catalog stores keyed by owner.
//!
//! # Invariants
//! - At most one `CatalogStore` exists per owner key per registry.
//! - Stores share one gateway; each store serializes only its own key.

use crate::model::catalog::OwnerId;
use crate::repo::gateway::CatalogGateway;
use crate::service::catalog_store::{CatalogStore, StoreError, StoreResult};
use crate::service::clock::{Clock, SystemClock};
use crate::service::mutation_engine::ValidationReason;
use log::debug;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Shared handle to one owner's store.
pub type SharedStore<G> = Arc<CatalogStore<Arc<G>>>;

/// Owner-keyed catalog store registry.
pub struct CatalogStoreRegistry<G: CatalogGateway> {
    gateway: Arc<G>,
    clock: Arc<dyn Clock>,
    stores: Mutex<BTreeMap<OwnerId, SharedStore<G>>>,
}

impl<G: CatalogGateway> CatalogStoreRegistry<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self::with_clock(gateway, Arc::new(SystemClock))
    }

    pub fn with_clock(gateway: Arc<G>, clock: Arc<dyn Clock>) -> Self {
        Self {
            gateway,
            clock,
            stores: Mutex::new(BTreeMap::new()),
        }
    }

    /// Returns the store for `owner_key`, creating an empty one on first use.
    ///
    /// # Errors
    /// - `Validation` when the key is blank.
    pub fn store_for(&self, owner_key: &str) -> StoreResult<SharedStore<G>> {
        let normalized = owner_key.trim();
        if normalized.is_empty() {
            return Err(StoreError::Validation {
                field: "owner_key",
                reason: ValidationReason::Blank,
            });
        }

        let mut stores = self.stores.lock().unwrap_or_else(PoisonError::into_inner);
        let store = stores.entry(normalized.to_string()).or_insert_with(|| {
            debug!("event=store_open module=registry status=ok owner={normalized}");
            Arc::new(CatalogStore::with_clock(
                normalized,
                Arc::clone(&self.gateway),
                Arc::clone(&self.clock),
            ))
        });
        Ok(Arc::clone(store))
    }

    /// Returns sorted owner keys with an open store.
    pub fn owner_keys(&self) -> Vec<OwnerId> {
        self.stores
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.stores
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
