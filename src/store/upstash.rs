//! Upstash Redis REST flag store.

use super::FlagStore;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

/// Upstash REST reply: `{"result": ...}` or `{"error": "..."}`.
#[derive(Debug, Deserialize)]
struct UpstashResp {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

/// Flag store backed by Upstash Redis over its REST API.
#[derive(Clone)]
pub struct UpstashStore {
    url: String,
    token: String,
    http: reqwest::Client,
}

impl UpstashStore {
    /// Create a store for the REST endpoint at `url`.
    #[must_use]
    pub fn new(http: reqwest::Client, url: &str, token: &str) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            http,
        }
    }

    #[inline]
    fn auth(&self, rb: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        rb.header("Authorization", format!("Bearer {}", self.token))
    }

    /// Run one Redis command posted as a JSON array.
    async fn command(&self, args: &[&str]) -> Result<Option<Value>> {
        debug!("kvs {}", args.first().copied().unwrap_or_default());
        let res = self
            .auth(self.http.post(&self.url))
            .json(&json!(args))
            .send()
            .await
            .map_err(|e| Error::store(e.to_string()))?;
        let status = res.status();
        let text = res.text().await?;
        let parsed: Option<UpstashResp> = serde_json::from_str(&text).ok();

        match parsed {
            Some(UpstashResp {
                error: Some(message),
                ..
            }) => Err(Error::store(message)),
            Some(UpstashResp { result, .. }) if status.is_success() => Ok(result),
            _ => Err(Error::store(format!("kvs {status} {text}"))),
        }
    }
}

#[async_trait]
impl FlagStore for UpstashStore {
    async fn set_flag(&self, key: &str, value: &str) -> Result<()> {
        match self.command(&["SET", key, value]).await? {
            Some(Value::String(ok)) if ok == "OK" => Ok(()),
            other => Err(Error::store(format!("kvs SET non-OK: {other:?}"))),
        }
    }

    async fn get_flag(&self, key: &str) -> Result<Option<String>> {
        Ok(match self.command(&["GET", key]).await? {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s),
            Some(other) => Some(other.to_string()),
        })
    }
}
