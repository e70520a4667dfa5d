//! In-memory store backend.
//!
//! Used when no database or cache credentials are configured, and by tests.

use super::{FlagStore, FormStore, ReferenceStore};
use crate::error::{Error, Result};
use crate::forms::{BountyForm, FormSubmission, PageRequest};
use crate::payment::{PaymentReference, ReferenceId, ReferenceStatus};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
struct Tables {
    references: HashMap<ReferenceId, PaymentReference>,
    /// Insertion order.
    forms: Vec<BountyForm>,
    /// Insertion order.
    submissions: Vec<FormSubmission>,
    flags: HashMap<String, String>,
}

/// Shared in-memory tables. Clones share state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored payment references.
    #[must_use]
    pub fn reference_count(&self) -> usize {
        self.tables.read().references.len()
    }

    /// Number of stored forms.
    #[must_use]
    pub fn form_count(&self) -> usize {
        self.tables.read().forms.len()
    }
}

#[async_trait]
impl ReferenceStore for MemoryStore {
    async fn insert_reference(&self, reference: &PaymentReference) -> Result<()> {
        let mut tables = self.tables.write();
        if tables.references.contains_key(&reference.reference_id) {
            return Err(Error::Conflict(format!(
                "payment reference {} already exists",
                reference.reference_id
            )));
        }
        tables
            .references
            .insert(reference.reference_id, reference.clone());
        Ok(())
    }

    async fn get_reference(&self, id: &ReferenceId) -> Result<Option<PaymentReference>> {
        Ok(self.tables.read().references.get(id).cloned())
    }

    async fn update_reference_status(
        &self,
        id: &ReferenceId,
        status: ReferenceStatus,
    ) -> Result<PaymentReference> {
        let mut tables = self.tables.write();
        let reference = tables
            .references
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(format!("payment reference {id}")))?;
        reference.status = status;
        Ok(reference.clone())
    }
}

#[async_trait]
impl FormStore for MemoryStore {
    async fn insert_form(&self, form: &BountyForm) -> Result<BountyForm> {
        let mut tables = self.tables.write();
        if tables.forms.iter().any(|f| f.id == form.id) {
            return Err(Error::Conflict(format!("form {} already exists", form.id)));
        }
        tables.forms.push(form.clone());
        Ok(form.clone())
    }

    async fn get_form(&self, id: &str) -> Result<Option<BountyForm>> {
        Ok(self.tables.read().forms.iter().find(|f| f.id == id).cloned())
    }

    async fn list_forms(&self, page: PageRequest) -> Result<Vec<BountyForm>> {
        let tables = self.tables.read();
        Ok(page.apply(tables.forms.iter().rev().cloned()))
    }

    async fn insert_submission(&self, submission: &FormSubmission) -> Result<FormSubmission> {
        let mut tables = self.tables.write();
        if tables.submissions.iter().any(|s| s.id == submission.id) {
            return Err(Error::Conflict(format!(
                "submission {} already exists",
                submission.id
            )));
        }
        tables.submissions.push(submission.clone());
        Ok(submission.clone())
    }

    async fn list_submissions(&self, form_id: &str) -> Result<Vec<FormSubmission>> {
        Ok(self
            .tables
            .read()
            .submissions
            .iter()
            .filter(|s| s.form_id == form_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl FlagStore for MemoryStore {
    async fn set_flag(&self, key: &str, value: &str) -> Result<()> {
        self.tables
            .write()
            .flags
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get_flag(&self, key: &str) -> Result<Option<String>> {
        Ok(self.tables.read().flags.get(key).cloned())
    }
}
