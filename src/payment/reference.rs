//! Payment reference records.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Length of a reference id in bytes (128 bits).
pub const REFERENCE_ID_BYTES: usize = 16;

/// Length of the hex-encoded reference id.
pub const REFERENCE_ID_HEX_LEN: usize = REFERENCE_ID_BYTES * 2;

/// Opaque identifier for a payment-initiation attempt.
///
/// 128 random bits, rendered as 32 lowercase hex characters with no separators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReferenceId([u8; REFERENCE_ID_BYTES]);

impl ReferenceId {
    /// Generate a fresh random reference id.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; REFERENCE_ID_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Raw bytes of the id.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; REFERENCE_ID_BYTES] {
        &self.0
    }

    /// Parse a hex-encoded reference id.
    ///
    /// Parsing is case-insensitive; the id always renders in lowercase.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the string is not exactly 32 hex characters.
    pub fn parse(s: &str) -> Result<Self> {
        if s.len() != REFERENCE_ID_HEX_LEN {
            return Err(Error::InvalidInput(format!(
                "reference id must be {REFERENCE_ID_HEX_LEN} hex characters"
            )));
        }
        let mut bytes = [0u8; REFERENCE_ID_BYTES];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|e| Error::InvalidInput(format!("invalid reference id: {e}")))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for ReferenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for ReferenceId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ReferenceId {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<ReferenceId> for String {
    fn from(id: ReferenceId) -> Self {
        id.to_string()
    }
}

/// Lifecycle status of a payment reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceStatus {
    /// Issued, not yet checked.
    #[default]
    Initiated,
    /// Payment confirmed out of band.
    Verified,
    /// Payment could not be confirmed.
    Failed,
}

impl ReferenceStatus {
    /// Whether `self -> next` is a legal transition.
    ///
    /// Only `initiated` moves, and only to a terminal status.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Initiated, Self::Verified | Self::Failed)
        )
    }

    /// Whether no further transition is possible.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Verified | Self::Failed)
    }

    /// Lowercase name, as stored.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initiated => "initiated",
            Self::Verified => "verified",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ReferenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted payment-initiation record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReference {
    /// Unique reference id.
    pub reference_id: ReferenceId,
    /// Current status.
    pub status: ReferenceStatus,
    /// When the reference was issued.
    pub initiated_at: DateTime<Utc>,
    /// Caller-supplied metadata, stored as given.
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl PaymentReference {
    /// A freshly initiated reference stamped with the current time.
    #[must_use]
    pub fn initiated(reference_id: ReferenceId, metadata: Map<String, Value>) -> Self {
        Self {
            reference_id,
            status: ReferenceStatus::Initiated,
            initiated_at: Utc::now(),
            metadata,
        }
    }
}
