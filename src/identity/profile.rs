//! Username profile lookup for wallet addresses.

use crate::config::ProfileConfig;
use crate::error::{Error, Result};
use serde_json::Value;
use tracing::{debug, warn};

/// Fetches public profiles from the username service.
pub struct ProfileFetcher {
    http: reqwest::Client,
    base_url: String,
}

impl ProfileFetcher {
    /// Create a new fetcher.
    #[must_use]
    pub fn new(http: reqwest::Client, config: &ProfileConfig) -> Self {
        Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
        }
    }

    /// Profile JSON for `address`, as returned by the service.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] unless `address` is `0x` followed by
    /// 40 hex characters, or [`Error::Upstream`] if the lookup fails.
    pub async fn profile(&self, address: &str) -> Result<Value> {
        if !is_evm_address(address) {
            return Err(Error::InvalidInput(format!("invalid address: {address}")));
        }

        let url = format!("{}/api/v1/{}", self.base_url, address.to_lowercase());
        debug!("Fetching profile from {url}");

        let res = self.http.get(&url).send().await.map_err(|e| {
            warn!("Profile request failed: {e}");
            Error::Upstream("failed to fetch profile".to_string())
        })?;
        let status = res.status();
        if !status.is_success() {
            warn!("Profile lookup for {address} returned {status}");
            return Err(Error::Upstream(format!("profile lookup failed: {status}")));
        }

        res.json::<Value>().await.map_err(|e| {
            warn!("Profile response for {address} is not JSON: {e}");
            Error::Upstream("failed to fetch profile".to_string())
        })
    }
}

/// `0x` + 40 hex characters, any case.
#[must_use]
pub fn is_evm_address(address: &str) -> bool {
    address
        .strip_prefix("0x")
        .is_some_and(|hex| hex.len() == 40 && hex.bytes().all(|b| b.is_ascii_hexdigit()))
}
