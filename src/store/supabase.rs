//! Supabase (PostgREST) store backend.
//!
//! Tables:
//!
//! | table                | columns                                          |
//! |----------------------|--------------------------------------------------|
//! | `payment_references` | `id`, `status`, `initiated_at`, `metadata` jsonb |
//! | `forms`              | `id`, `created_at`, `definition` jsonb           |
//! | `form_responses`     | `id`, `form_id`, `created_at`, `submission` jsonb|

use super::{FormStore, ReferenceStore};
use crate::error::{Error, Result};
use crate::forms::{BountyForm, FormSubmission, PageRequest};
use crate::payment::{PaymentReference, ReferenceId, ReferenceStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

const REFERENCES_TABLE: &str = "payment_references";
const FORMS_TABLE: &str = "forms";
const RESPONSES_TABLE: &str = "form_responses";

/// Postgres `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, Serialize, Deserialize)]
struct ReferenceRow {
    id: ReferenceId,
    status: ReferenceStatus,
    initiated_at: DateTime<Utc>,
    #[serde(default)]
    metadata: Map<String, Value>,
}

impl From<&PaymentReference> for ReferenceRow {
    fn from(r: &PaymentReference) -> Self {
        Self {
            id: r.reference_id,
            status: r.status,
            initiated_at: r.initiated_at,
            metadata: r.metadata.clone(),
        }
    }
}

impl From<ReferenceRow> for PaymentReference {
    fn from(row: ReferenceRow) -> Self {
        Self {
            reference_id: row.id,
            status: row.status,
            initiated_at: row.initiated_at,
            metadata: row.metadata,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct FormRow {
    id: String,
    created_at: DateTime<Utc>,
    definition: Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct ResponseRow {
    id: String,
    form_id: String,
    created_at: DateTime<Utc>,
    submission: Value,
}

/// PostgREST error body.
#[derive(Debug, Deserialize)]
struct PostgrestError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Store backed by a Supabase project's REST interface.
pub struct SupabaseStore {
    http: reqwest::Client,
    rest_url: String,
    key: String,
}

impl SupabaseStore {
    /// Create a store for the project at `url` using `key`.
    #[must_use]
    pub fn new(http: reqwest::Client, url: &str, key: &str) -> Self {
        Self {
            http,
            rest_url: format!("{}/rest/v1", url.trim_end_matches('/')),
            key: key.to_string(),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.rest_url, table)
    }

    #[inline]
    fn auth(&self, rb: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        rb.header("apikey", &self.key)
            .header("Authorization", format!("Bearer {}", self.key))
    }

    /// Send a request and decode the row array it returns.
    async fn rows<R: DeserializeOwned>(&self, rb: reqwest::RequestBuilder) -> Result<Vec<R>> {
        let res = self.auth(rb).send().await.map_err(|e| {
            warn!("Supabase request failed: {e}");
            Error::store(e.to_string())
        })?;
        let status = res.status();
        let text = res.text().await?;
        if !status.is_success() {
            return Err(postgrest_error(&text));
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn insert<T: Serialize + Sync, R: DeserializeOwned>(
        &self,
        table: &str,
        row: &T,
    ) -> Result<R> {
        debug!("Inserting into {table}");
        let rb = self
            .http
            .post(self.table_url(table))
            .header("Prefer", "return=representation")
            .json(row);
        self.rows(rb)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::store(format!("insert into {table} returned no row")))
    }

    async fn select<R: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<R>> {
        let rb = self
            .http
            .get(self.table_url(table))
            .query(&[("select", "*")])
            .query(query);
        self.rows(rb).await
    }
}

/// Map a PostgREST error body to a store error, keeping the downstream message.
fn postgrest_error(text: &str) -> Error {
    match serde_json::from_str::<PostgrestError>(text) {
        Ok(PostgrestError {
            code: Some(code),
            message,
        }) if code == UNIQUE_VIOLATION => {
            Error::Conflict(message.unwrap_or_else(|| "duplicate key".to_string()))
        }
        Ok(PostgrestError { message, .. }) => Error::store(message.unwrap_or_default()),
        Err(_) => Error::store(text),
    }
}

#[async_trait]
impl ReferenceStore for SupabaseStore {
    async fn insert_reference(&self, reference: &PaymentReference) -> Result<()> {
        let _: ReferenceRow = self
            .insert(REFERENCES_TABLE, &ReferenceRow::from(reference))
            .await?;
        Ok(())
    }

    async fn get_reference(&self, id: &ReferenceId) -> Result<Option<PaymentReference>> {
        let rows: Vec<ReferenceRow> = self
            .select(REFERENCES_TABLE, &[("id", format!("eq.{id}"))])
            .await?;
        Ok(rows.into_iter().next().map(PaymentReference::from))
    }

    async fn update_reference_status(
        &self,
        id: &ReferenceId,
        status: ReferenceStatus,
    ) -> Result<PaymentReference> {
        let rb = self
            .http
            .patch(self.table_url(REFERENCES_TABLE))
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=representation")
            .json(&json!({ "status": status }));
        let rows: Vec<ReferenceRow> = self.rows(rb).await?;
        rows.into_iter()
            .next()
            .map(PaymentReference::from)
            .ok_or_else(|| Error::NotFound(format!("payment reference {id}")))
    }
}

#[async_trait]
impl FormStore for SupabaseStore {
    async fn insert_form(&self, form: &BountyForm) -> Result<BountyForm> {
        let row = FormRow {
            id: form.id.clone(),
            created_at: form.created_at,
            definition: serde_json::to_value(form)?,
        };
        let stored: FormRow = self.insert(FORMS_TABLE, &row).await?;
        Ok(serde_json::from_value(stored.definition)?)
    }

    async fn get_form(&self, id: &str) -> Result<Option<BountyForm>> {
        let rows: Vec<FormRow> = self
            .select(FORMS_TABLE, &[("id", format!("eq.{id}"))])
            .await?;
        rows.into_iter()
            .next()
            .map(|row| serde_json::from_value(row.definition).map_err(Error::from))
            .transpose()
    }

    async fn list_forms(&self, page: PageRequest) -> Result<Vec<BountyForm>> {
        let rows: Vec<FormRow> = self
            .select(
                FORMS_TABLE,
                &[
                    ("order", "created_at.desc".to_string()),
                    ("limit", page.limit.to_string()),
                    ("offset", page.offset.to_string()),
                ],
            )
            .await?;
        rows.into_iter()
            .map(|row| serde_json::from_value(row.definition).map_err(Error::from))
            .collect()
    }

    async fn insert_submission(&self, submission: &FormSubmission) -> Result<FormSubmission> {
        let row = ResponseRow {
            id: submission.id.clone(),
            form_id: submission.form_id.clone(),
            created_at: submission.created_at,
            submission: serde_json::to_value(submission)?,
        };
        let stored: ResponseRow = self.insert(RESPONSES_TABLE, &row).await?;
        Ok(serde_json::from_value(stored.submission)?)
    }

    async fn list_submissions(&self, form_id: &str) -> Result<Vec<FormSubmission>> {
        let rows: Vec<ResponseRow> = self
            .select(
                RESPONSES_TABLE,
                &[
                    ("form_id", format!("eq.{form_id}")),
                    ("order", "created_at.asc".to_string()),
                ],
            )
            .await?;
        rows.into_iter()
            .map(|row| serde_json::from_value(row.submission).map_err(Error::from))
            .collect()
    }
}
