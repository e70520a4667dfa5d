//! Form and response gateways.

use super::{
    generate_record_id, BountyForm, FormSubmission, NewForm, NewSubmission, PageRequest,
    RESERVED_KEYS,
};
use crate::error::{Error, Result};
use crate::event::{GatewayEvent, GatewayEventsSender};
use crate::store::FormStore;
use chrono::Utc;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info};

/// Accepts and lists submissions against a form.
pub struct FormResponseGateway {
    store: Arc<dyn FormStore>,
    events: GatewayEventsSender,
}

impl FormResponseGateway {
    /// Create a new gateway.
    #[must_use]
    pub fn new(store: Arc<dyn FormStore>, events: GatewayEventsSender) -> Self {
        Self { store, events }
    }

    /// Store a submission for `form_id`.
    ///
    /// The path-supplied form id is merged into the body, replacing any
    /// `formId` the client sent, before the body is validated.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for a malformed body, or the store's
    /// error if the write fails.
    pub async fn submit(&self, form_id: &str, body: Value) -> Result<FormSubmission> {
        let form_id = require_id(form_id, "form id")?;

        let Value::Object(mut fields) = body else {
            return Err(Error::InvalidInput(
                "submission must be a JSON object".to_string(),
            ));
        };
        fields.insert("formId".to_string(), Value::String(form_id.to_string()));

        let new: NewSubmission = serde_json::from_value(Value::Object(fields))
            .map_err(|e| Error::InvalidInput(format!("invalid submission: {e}")))?;
        if new.submitter_address.trim().is_empty() {
            return Err(Error::InvalidInput(
                "submitterAddress is required".to_string(),
            ));
        }

        let submission = FormSubmission {
            id: generate_record_id(),
            form_id: new.form_id,
            submitter_address: new.submitter_address,
            entries: new.entries,
            created_at: Utc::now(),
            extra: strip_reserved(new.extra),
        };

        let stored = self.store.insert_submission(&submission).await?;
        let _ = self.events.send(GatewayEvent::SubmissionStored {
            form_id: stored.form_id.clone(),
            submission_id: stored.id.clone(),
        });

        info!(
            "Stored submission {} for form {} ({} entries)",
            stored.id,
            stored.form_id,
            stored.entries.len()
        );
        Ok(stored)
    }

    /// All submissions for `form_id`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for an empty id, or the store's error.
    pub async fn responses(&self, form_id: &str) -> Result<Vec<FormSubmission>> {
        let form_id = require_id(form_id, "form id")?;
        let responses = self.store.list_submissions(form_id).await?;
        debug!("Form {form_id} has {} responses", responses.len());
        Ok(responses)
    }
}

/// Creates and lists bounty forms.
pub struct BountyFormsGateway {
    store: Arc<dyn FormStore>,
    events: GatewayEventsSender,
}

impl BountyFormsGateway {
    /// Create a new gateway.
    #[must_use]
    pub fn new(store: Arc<dyn FormStore>, events: GatewayEventsSender) -> Self {
        Self { store, events }
    }

    /// A page of forms, newest first.
    ///
    /// # Errors
    ///
    /// Returns the store's error.
    pub async fn list(&self, page: PageRequest) -> Result<Vec<BountyForm>> {
        debug!("Listing forms (limit={}, offset={})", page.limit, page.offset);
        self.store.list_forms(page).await
    }

    /// A single form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the form does not exist, or the store's error.
    pub async fn get(&self, id: &str) -> Result<BountyForm> {
        let id = require_id(id, "form id")?;
        self.store
            .get_form(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("form {id}")))
    }

    /// Create a form from a client definition.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for a malformed definition, or the store's error.
    pub async fn create(&self, body: Value) -> Result<BountyForm> {
        let new: NewForm = serde_json::from_value(body)
            .map_err(|e| Error::InvalidInput(format!("invalid form definition: {e}")))?;
        if new.title.trim().is_empty() {
            return Err(Error::InvalidInput("title is required".to_string()));
        }
        if let Some(duplicate) = first_duplicate(new.fields.iter().map(|f| f.id.as_str())) {
            return Err(Error::InvalidInput(format!(
                "duplicate field id: {duplicate}"
            )));
        }

        let form = BountyForm {
            id: generate_record_id(),
            title: new.title,
            description: new.description,
            fields: new.fields,
            creator_address: new.creator_address,
            created_at: Utc::now(),
            extra: strip_reserved(new.extra),
        };

        let stored = self.store.insert_form(&form).await?;
        let _ = self.events.send(GatewayEvent::FormCreated {
            form_id: stored.id.clone(),
        });

        info!("Created form {} ({} fields)", stored.id, stored.fields.len());
        Ok(stored)
    }
}

fn require_id<'a>(id: &'a str, what: &str) -> Result<&'a str> {
    let id = id.trim();
    if id.is_empty() {
        Err(Error::InvalidInput(format!("{what} is required")))
    } else {
        Ok(id)
    }
}

fn strip_reserved(mut extra: Map<String, Value>) -> Map<String, Value> {
    for key in RESERVED_KEYS {
        extra.remove(*key);
    }
    extra
}

fn first_duplicate<'a>(ids: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    let mut seen = std::collections::HashSet::new();
    ids.into_iter().find(|id| !seen.insert(*id))
}
