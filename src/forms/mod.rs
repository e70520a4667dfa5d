//! Bounty forms and form responses.
//!
//! A bounty form defines the fields a submitter answers; a submission holds
//! one answer per field. Both are created through a gateway and are immutable
//! once stored. Fields the gateway does not model are kept in `extra` and
//! round-trip untouched.

mod gateway;

pub use gateway::{BountyFormsGateway, FormResponseGateway};

use crate::blobs::BlobReference;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default page size for form listings.
pub const DEFAULT_PAGE_LIMIT: usize = 10;

/// Largest page a caller may request.
pub const MAX_PAGE_LIMIT: usize = 100;

/// Kind of answer a form field expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKind {
    /// Free text.
    Text,
    /// Numeric answer.
    Number,
    /// An uploaded image, answered with a blob reference.
    Image,
}

/// A single field of a bounty form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
    /// Field id, referenced by submission entries.
    pub id: String,
    /// Human-readable label.
    pub label: String,
    /// Expected answer kind.
    #[serde(rename = "type")]
    pub kind: FieldKind,
    /// Whether an answer is mandatory.
    #[serde(default)]
    pub required: bool,
}

/// A stored bounty form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BountyForm {
    /// Server-generated id.
    pub id: String,
    /// Form title.
    pub title: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Field definitions.
    #[serde(default)]
    pub fields: Vec<FormField>,
    /// Address of the creator, if given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_address: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Unmodelled fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A form definition as posted by a client.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewForm {
    /// Form title.
    pub title: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Field definitions.
    #[serde(default)]
    pub fields: Vec<FormField>,
    /// Address of the creator.
    #[serde(default)]
    pub creator_address: Option<String>,
    /// Unmodelled fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The answer held by a submission entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntryValue {
    /// Free text.
    Text(String),
    /// Numeric answer.
    Number(f64),
    /// Reference to an image stored as a blob.
    ImageReference(BlobReference),
}

/// One answered field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// Id of the field being answered.
    pub entry_id: String,
    /// The answer.
    pub value: EntryValue,
}

/// A stored form submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSubmission {
    /// Server-generated id.
    pub id: String,
    /// Form this submission answers.
    pub form_id: String,
    /// Address of the submitter.
    pub submitter_address: String,
    /// Answers, in the order given.
    pub entries: Vec<Entry>,
    /// Submission time.
    pub created_at: DateTime<Utc>,
    /// Unmodelled fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A submission body after the form id has been merged in.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubmission {
    /// Form this submission answers.
    pub form_id: String,
    /// Address of the submitter.
    pub submitter_address: String,
    /// Answers.
    #[serde(default)]
    pub entries: Vec<Entry>,
    /// Unmodelled fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Raw `limit`/`offset` query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    /// Page size as sent.
    pub limit: Option<String>,
    /// Start offset as sent.
    pub offset: Option<String>,
}

/// A resolved limit/offset window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Page size, `1..=MAX_PAGE_LIMIT`.
    pub limit: usize,
    /// Number of records to skip.
    pub offset: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
            offset: 0,
        }
    }
}

impl PageRequest {
    /// Create a window, clamping `limit` into range.
    #[must_use]
    pub fn new(limit: usize, offset: usize) -> Self {
        Self {
            limit: limit.clamp(1, MAX_PAGE_LIMIT),
            offset,
        }
    }

    /// Resolve query strings. Missing or unparsable values use the defaults.
    #[must_use]
    pub fn from_query(query: &PageQuery) -> Self {
        let parse = |value: Option<&String>| value.and_then(|v| v.trim().parse::<usize>().ok());
        Self::new(
            parse(query.limit.as_ref()).unwrap_or(DEFAULT_PAGE_LIMIT),
            parse(query.offset.as_ref()).unwrap_or(0),
        )
    }

    /// Apply the window to an already ordered iterator.
    pub fn apply<T>(self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        items.into_iter().skip(self.offset).take(self.limit).collect()
    }
}

/// Generate a 128-bit random hex id for forms and submissions.
#[must_use]
pub(crate) fn generate_record_id() -> String {
    hex::encode(rand::random::<[u8; 16]>())
}

/// Keys the gateway owns; stripped from client-supplied `extra` maps.
pub(crate) const RESERVED_KEYS: &[&str] = &["id", "createdAt", "success"];
