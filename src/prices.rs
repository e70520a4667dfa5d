//! Token price lookup from the price oracle.

use crate::config::OracleConfig;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Tokens priced by the gateway, as oracle symbols.
const CRYPTO_CURRENCIES: &str = "WLD,USDCE";

/// Quote currency.
const FIAT_CURRENCY: &str = "USD";

/// Generic message returned for any fetch or parse failure.
const FETCH_FAILED: &str = "failed to fetch prices";

/// USD prices of the supported tokens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prices {
    /// Governance token.
    #[serde(rename = "WLD")]
    pub wld: f64,
    /// Bridged stable token.
    #[serde(rename = "USDCE")]
    pub usdce: f64,
}

/// Oracle response: `result.prices[TOKEN][FIAT] = { amount, decimals }`.
#[derive(Debug, Deserialize)]
struct OracleResponse {
    result: OracleResult,
}

#[derive(Debug, Deserialize)]
struct OracleResult {
    prices: HashMap<String, HashMap<String, RawAmount>>,
}

/// Integer amount scaled by `10^decimals`. Amount may arrive as a string.
#[derive(Debug, Deserialize)]
struct RawAmount {
    amount: Value,
    decimals: u32,
}

impl RawAmount {
    fn normalize(&self) -> Option<f64> {
        let amount = match &self.amount {
            Value::String(s) => s.trim().parse::<f64>().ok()?,
            Value::Number(n) => n.as_f64()?,
            _ => return None,
        };
        let decimals = i32::try_from(self.decimals).ok()?;
        let price = amount / 10f64.powi(decimals);
        price.is_finite().then_some(price)
    }
}

/// Fetches token prices from the oracle.
pub struct PriceFetcher {
    http: reqwest::Client,
    url: String,
}

impl PriceFetcher {
    /// Create a new fetcher.
    #[must_use]
    pub fn new(http: reqwest::Client, config: &OracleConfig) -> Self {
        Self {
            http,
            url: config.url.clone(),
        }
    }

    /// Current USD prices of WLD and USDCE.
    ///
    /// # Errors
    ///
    /// Returns a generic [`Error::Upstream`] for any fetch or parse failure;
    /// the cause is logged.
    pub async fn fetch(&self) -> Result<Prices> {
        self.try_fetch().await.map_err(|e| {
            warn!("Price fetch failed: {e}");
            Error::Upstream(FETCH_FAILED.to_string())
        })
    }

    async fn try_fetch(&self) -> Result<Prices> {
        debug!("Fetching prices from {}", self.url);
        let res = self
            .http
            .get(&self.url)
            .query(&[
                ("cryptoCurrencies", CRYPTO_CURRENCIES),
                ("fiatCurrencies", FIAT_CURRENCY),
            ])
            .send()
            .await?;
        let status = res.status();
        if !status.is_success() {
            return Err(Error::Upstream(format!("oracle returned {status}")));
        }
        let body: OracleResponse = res.json().await?;
        parse_prices(&body.result)
    }
}

fn parse_prices(result: &OracleResult) -> Result<Prices> {
    let price = |token: &str| {
        result
            .prices
            .get(token)
            .and_then(|quotes| quotes.get(FIAT_CURRENCY))
            .and_then(RawAmount::normalize)
            .ok_or_else(|| Error::Upstream(format!("no {FIAT_CURRENCY} price for {token}")))
    };
    Ok(Prices {
        wld: price("WLD")?,
        usdce: price("USDCE")?,
    })
}
