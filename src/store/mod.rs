//! Persistence seams for the gateway.
//!
//! Components never talk to a database or cache client directly; they hold
//! trait objects constructed once at startup:
//!
//! - [`ReferenceStore`]: payment references (Supabase table `payment_references`)
//! - [`FormStore`]: bounty forms and their responses (tables `forms`, `form_responses`)
//! - [`FlagStore`]: key/value flags (Upstash Redis)
//!
//! Every insert is a plain insert: a record whose id already exists is
//! rejected with [`Error::Conflict`](crate::Error::Conflict), never overwritten.

mod memory;
mod supabase;
mod upstash;

pub use memory::MemoryStore;
pub use supabase::SupabaseStore;
pub use upstash::UpstashStore;

use crate::config::GatewayConfig;
use crate::error::Result;
use crate::forms::{BountyForm, FormSubmission, PageRequest};
use crate::payment::{PaymentReference, ReferenceId, ReferenceStatus};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

/// Durable storage for payment references.
#[async_trait]
pub trait ReferenceStore: Send + Sync {
    /// Insert a new reference. Fails with `Conflict` if the id exists.
    async fn insert_reference(&self, reference: &PaymentReference) -> Result<()>;

    /// Fetch a reference by id.
    async fn get_reference(&self, id: &ReferenceId) -> Result<Option<PaymentReference>>;

    /// Overwrite the status of an existing reference and return the updated record.
    async fn update_reference_status(
        &self,
        id: &ReferenceId,
        status: ReferenceStatus,
    ) -> Result<PaymentReference>;
}

/// Durable storage for bounty forms and form responses.
#[async_trait]
pub trait FormStore: Send + Sync {
    /// Insert a new form and return it as stored.
    async fn insert_form(&self, form: &BountyForm) -> Result<BountyForm>;

    /// Fetch a form by id.
    async fn get_form(&self, id: &str) -> Result<Option<BountyForm>>;

    /// List forms newest first, windowed by `page`.
    async fn list_forms(&self, page: PageRequest) -> Result<Vec<BountyForm>>;

    /// Insert a submission and return it as stored.
    async fn insert_submission(&self, submission: &FormSubmission) -> Result<FormSubmission>;

    /// All submissions for a form, oldest first.
    async fn list_submissions(&self, form_id: &str) -> Result<Vec<FormSubmission>>;
}

/// Key/value flag storage.
#[async_trait]
pub trait FlagStore: Send + Sync {
    /// Set `key` to `value`, replacing any previous value.
    async fn set_flag(&self, key: &str, value: &str) -> Result<()>;

    /// Read the value of `key`.
    async fn get_flag(&self, key: &str) -> Result<Option<String>>;
}

/// Process-wide store handles, built once and shared by every component.
#[derive(Clone)]
pub struct Stores {
    /// Payment reference store.
    pub references: Arc<dyn ReferenceStore>,
    /// Form and response store.
    pub forms: Arc<dyn FormStore>,
    /// Flag store.
    pub flags: Arc<dyn FlagStore>,
}

impl Stores {
    /// All three handles backed by one in-memory store.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_memory(&MemoryStore::new())
    }

    /// All three handles backed by the given in-memory store.
    #[must_use]
    pub fn from_memory(store: &MemoryStore) -> Self {
        let store = Arc::new(store.clone());
        Self {
            references: store.clone(),
            forms: store.clone(),
            flags: store,
        }
    }

    /// Build the store handles from configuration.
    ///
    /// Backends without credentials fall back to memory, which keeps a
    /// development gateway usable but loses data on restart.
    #[must_use]
    pub fn from_config(config: &GatewayConfig, http: &reqwest::Client) -> Self {
        let memory = Arc::new(MemoryStore::new());

        let (references, forms): (Arc<dyn ReferenceStore>, Arc<dyn FormStore>) =
            if let Some((url, key)) = config.database.credentials() {
                let supabase = Arc::new(SupabaseStore::new(http.clone(), url, key));
                (supabase.clone(), supabase)
            } else {
                warn!("No database credentials configured - references and forms kept in memory");
                (memory.clone(), memory.clone())
            };

        let flags: Arc<dyn FlagStore> = if let Some((url, token)) = config.cache.credentials() {
            Arc::new(UpstashStore::new(http.clone(), url, token))
        } else {
            warn!("No cache credentials configured - notification flags kept in memory");
            memory
        };

        Self {
            references,
            forms,
            flags,
        }
    }
}
