//! Walrus blob storage client.
//!
//! Image answers are uploaded to a Walrus publisher and referenced from form
//! entries by blob id. Reads go through an aggregator.

use crate::config::BlobConfig;
use crate::error::{Error, Result};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::{debug, info, warn};

/// Upper bound on blob id length accepted from clients.
const MAX_BLOB_ID_LEN: usize = 128;

/// Identifier of content stored on Walrus.
///
/// Walrus blob ids are URL-safe base64 strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BlobReference(String);

impl BlobReference {
    /// Validate and wrap a blob id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for empty, oversized or non URL-safe ids.
    pub fn parse(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() || id.len() > MAX_BLOB_ID_LEN {
            return Err(Error::InvalidInput(format!(
                "blob id must be 1..={MAX_BLOB_ID_LEN} characters"
            )));
        }
        if !id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            return Err(Error::InvalidInput(format!("invalid blob id: {id}")));
        }
        Ok(Self(id))
    }

    /// The raw blob id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlobReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for BlobReference {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<BlobReference> for String {
    fn from(r: BlobReference) -> Self {
        r.0
    }
}

/// Result of a successful upload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredBlob {
    /// Blob id to reference from form entries.
    pub blob_id: BlobReference,
    /// Aggregator URL serving the content.
    pub url: String,
}

/// Client for a Walrus publisher/aggregator pair.
pub struct BlobClient {
    http: reqwest::Client,
    publisher_url: String,
    aggregator_url: String,
    epochs: u32,
}

impl BlobClient {
    /// Create a new client.
    #[must_use]
    pub fn new(http: reqwest::Client, config: &BlobConfig) -> Self {
        Self {
            http,
            publisher_url: config.publisher_url.trim_end_matches('/').to_string(),
            aggregator_url: config.aggregator_url.trim_end_matches('/').to_string(),
            epochs: config.epochs,
        }
    }

    /// Aggregator URL for a blob.
    #[must_use]
    pub fn url(&self, blob: &BlobReference) -> String {
        format!("{}/v1/blobs/{}", self.aggregator_url, blob)
    }

    /// Upload content and return its blob id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for an empty body, or
    /// [`Error::Upstream`] if the publisher rejects the upload or its
    /// response carries no blob id.
    pub async fn store(&self, content: Bytes) -> Result<StoredBlob> {
        if content.is_empty() {
            return Err(Error::InvalidInput("blob content is empty".to_string()));
        }

        let size = content.len();
        let url = format!("{}/v1/blobs?epochs={}", self.publisher_url, self.epochs);
        debug!("Uploading {size} bytes to {url}");

        let res = self.http.put(&url).body(content).send().await?;
        let status = res.status();
        let text = res.text().await?;
        if !status.is_success() {
            warn!("Blob upload failed: {status} {text}");
            return Err(Error::Upstream(format!("blob upload failed: {status}")));
        }

        let body: Value = serde_json::from_str(&text)?;
        let blob_id = extract_blob_id(&body)
            .ok_or_else(|| Error::Upstream("publisher response has no blob id".to_string()))?;
        let blob_id = BlobReference::parse(blob_id)
            .map_err(|e| Error::Upstream(format!("publisher returned invalid blob id: {e}")))?;

        info!("Stored blob {blob_id} ({size} bytes)");
        Ok(StoredBlob {
            url: self.url(&blob_id),
            blob_id,
        })
    }
}

/// Blob id from either a fresh upload or an already certified one.
fn extract_blob_id(body: &Value) -> Option<String> {
    body.pointer("/newlyCreated/blobObject/blobId")
        .or_else(|| body.pointer("/alreadyCertified/blobId"))
        .and_then(Value::as_str)
        .map(str::to_string)
}
