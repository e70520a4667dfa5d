//! World ID proof verification via the developer portal.

use crate::config::IdentityConfig;
use crate::error::{Error, Result};
use crate::event::{GatewayEvent, GatewayEventsSender};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use sha3::{Digest, Keccak256};
use tracing::{debug, info, warn};

/// Proof payload produced by the identity client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofPayload {
    /// Zero-knowledge proof, hex encoded.
    pub proof: String,
    /// Merkle root the proof was generated against.
    pub merkle_root: String,
    /// Per-action nullifier.
    pub nullifier_hash: String,
    /// `orb` or `device`.
    #[serde(default = "default_verification_level")]
    pub verification_level: String,
    /// Anything else the client attached.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_verification_level() -> String {
    "orb".to_string()
}

/// A verification request as posted by a client.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyRequest {
    /// The proof.
    pub payload: ProofPayload,
    /// Action tag the proof is scoped to.
    pub action: String,
    /// Optional signal bound into the proof.
    #[serde(default)]
    pub signal: Option<String>,
}

/// Result relayed from the verification service.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifyOutcome {
    /// Whether the proof verified.
    pub success: bool,
    /// The service's response body, with `success` set.
    pub body: Value,
}

/// Forwards proofs to the verification service.
pub struct IdentityVerifier {
    http: reqwest::Client,
    base_url: String,
    app_id: Option<String>,
    events: GatewayEventsSender,
}

impl IdentityVerifier {
    /// Create a new verifier.
    #[must_use]
    pub fn new(http: reqwest::Client, config: &IdentityConfig, events: GatewayEventsSender) -> Self {
        let app_id = config
            .app_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string);
        if app_id.is_none() {
            warn!("No identity app id configured - proof verification will fail");
        }
        Self {
            http,
            base_url: config.verify_base_url.trim_end_matches('/').to_string(),
            app_id,
            events,
        }
    }

    /// The configured app id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when no app id is configured.
    pub fn require_app_id(&self) -> Result<&str> {
        self.app_id
            .as_deref()
            .ok_or_else(|| Error::Config("identity app id is not configured".to_string()))
    }

    /// Verify a proof for `action`.
    ///
    /// A rejected proof is not an error: it yields `success == false` with
    /// the service's diagnostic body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when no app id is configured (no request is
    /// sent), [`Error::InvalidInput`] for an empty action, or
    /// [`Error::Upstream`] if the service cannot be reached.
    pub async fn verify(&self, request: &VerifyRequest) -> Result<VerifyOutcome> {
        let app_id = self.require_app_id()?;
        if request.action.trim().is_empty() {
            return Err(Error::InvalidInput("action is required".to_string()));
        }

        let signal_hash = hash_to_field(request.signal.as_deref().unwrap_or_default().as_bytes());
        let url = format!("{}/api/v2/verify/{app_id}", self.base_url);
        let body = json!({
            "nullifier_hash": request.payload.nullifier_hash,
            "merkle_root": request.payload.merkle_root,
            "proof": request.payload.proof,
            "verification_level": request.payload.verification_level,
            "action": request.action,
            "signal_hash": signal_hash,
        });

        debug!("Verifying proof for action {} at {url}", request.action);
        let res = self.http.post(&url).json(&body).send().await.map_err(|e| {
            warn!("Verification request failed: {e}");
            Error::Upstream(format!("verification service unreachable: {e}"))
        })?;
        let status = res.status();
        let text = res.text().await?;

        let success = status.is_success();
        let mut body = match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => map,
            Ok(other) => Map::from_iter([("detail".to_string(), other)]),
            Err(_) => Map::from_iter([("detail".to_string(), Value::String(text))]),
        };
        body.insert("success".to_string(), Value::Bool(success));

        let _ = self.events.send(GatewayEvent::IdentityVerified {
            action: request.action.clone(),
            success,
        });
        if success {
            info!("Proof verified for action {}", request.action);
        } else {
            info!("Proof rejected for action {} ({status})", request.action);
        }

        Ok(VerifyOutcome {
            success,
            body: Value::Object(body),
        })
    }
}

/// Hash bytes into the proof system's scalar field.
///
/// keccak256 of the input shifted right by 8 bits, `0x`-prefixed hex.
#[must_use]
pub fn hash_to_field(input: &[u8]) -> String {
    let digest = Keccak256::digest(input);
    let mut field = [0u8; 32];
    field[1..].copy_from_slice(&digest[..31]);
    format!("0x{}", hex::encode(field))
}
