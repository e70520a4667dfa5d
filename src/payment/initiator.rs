//! Payment initiator: issues references and tracks their lifecycle.

use crate::error::{Error, Result};
use crate::event::{GatewayEvent, GatewayEventsSender};
use crate::payment::cache::{CacheStats, ReferenceCache};
use crate::payment::reference::{PaymentReference, ReferenceId, ReferenceStatus};
use crate::store::ReferenceStore;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Issues payment references and records their later verification.
///
/// Combines:
/// 1. The durable reference store
/// 2. An LRU cache of recently issued references for fast lookups
pub struct PaymentInitiator {
    store: Arc<dyn ReferenceStore>,
    cache: ReferenceCache,
    events: GatewayEventsSender,
}

impl PaymentInitiator {
    /// Create a new initiator.
    #[must_use]
    pub fn new(
        store: Arc<dyn ReferenceStore>,
        cache_capacity: usize,
        events: GatewayEventsSender,
    ) -> Self {
        info!("Payment initiator ready (cache_capacity={cache_capacity})");
        Self {
            store,
            cache: ReferenceCache::with_capacity(cache_capacity),
            events,
        }
    }

    /// Issue a new payment reference.
    ///
    /// The store write is best effort: if it fails the failure is logged and
    /// the id is still returned, so the client-side payment flow is never
    /// blocked on persistence. The reference stays readable from the cache
    /// and can be reconciled out of band.
    pub async fn initiate(&self, metadata: Map<String, Value>) -> ReferenceId {
        let reference = PaymentReference::initiated(ReferenceId::generate(), metadata);
        let id = reference.reference_id;

        let persisted = match self.store.insert_reference(&reference).await {
            Ok(()) => {
                debug!("Stored payment reference {id}");
                true
            }
            Err(e) => {
                warn!("Failed to store payment reference {id}: {e}");
                false
            }
        };

        self.cache.insert(reference);
        let _ = self.events.send(GatewayEvent::PaymentInitiated {
            reference_id: id.to_string(),
            persisted,
        });

        info!("Initiated payment reference {id}");
        id
    }

    /// Look up a reference, checking the cache before the store.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if neither knows the id, or a store error.
    pub async fn lookup(&self, id: &ReferenceId) -> Result<PaymentReference> {
        if let Some(reference) = self.cache.get(id) {
            debug!("Payment reference {id} found in cache");
            return Ok(reference);
        }

        match self.store.get_reference(id).await? {
            Some(reference) => {
                self.cache.insert(reference.clone());
                Ok(reference)
            }
            None => Err(Error::NotFound(format!("payment reference {id}"))),
        }
    }

    /// Record the outcome of an out-of-band payment check.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `status` is not terminal,
    /// [`Error::Conflict`] if the reference already settled,
    /// [`Error::NotFound`] for an unknown id, or a store error.
    pub async fn settle(
        &self,
        id: &ReferenceId,
        status: ReferenceStatus,
    ) -> Result<PaymentReference> {
        if !status.is_terminal() {
            return Err(Error::InvalidInput(format!(
                "cannot settle a payment as {status}"
            )));
        }

        let current = self.lookup(id).await?;
        if !current.status.can_transition_to(status) {
            return Err(Error::Conflict(format!(
                "payment reference {id} is already {}",
                current.status
            )));
        }

        let updated = self.store.update_reference_status(id, status).await?;
        self.cache.insert(updated.clone());
        let _ = self.events.send(GatewayEvent::PaymentSettled {
            reference_id: id.to_string(),
            status: status.to_string(),
        });

        info!("Payment reference {id} settled as {status}");
        Ok(updated)
    }

    /// Get cache statistics.
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Get the number of cached references.
    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }
}
