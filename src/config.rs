//! Configuration for bounty-gateway.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Gateway configuration.
///
/// Loaded once at startup and shared read-only for the process lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Relational database (Supabase REST) configuration.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Key-value cache (Upstash Redis REST) configuration.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Identity verification configuration.
    #[serde(default)]
    pub identity: IdentityConfig,

    /// Price oracle configuration.
    #[serde(default)]
    pub oracle: OracleConfig,

    /// Blob storage (Walrus) configuration.
    #[serde(default)]
    pub blobs: BlobConfig,

    /// Username profile service configuration.
    #[serde(default)]
    pub profile: ProfileConfig,

    /// Capacity of the recently-issued payment reference cache.
    #[serde(default = "default_reference_cache_capacity")]
    pub reference_cache_capacity: usize,

    /// Log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// Allowed CORS origins. Empty means permissive.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

/// Supabase connection settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`.
    #[serde(default)]
    pub url: Option<String>,

    /// Service role key.
    #[serde(default)]
    pub service_key: Option<String>,
}

/// Upstash Redis REST connection settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    /// REST endpoint URL.
    #[serde(default)]
    pub url: Option<String>,

    /// REST bearer token.
    #[serde(default)]
    pub token: Option<String>,
}

/// World ID verification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Application identifier (`app_...`). Verification fails without it.
    #[serde(default)]
    pub app_id: Option<String>,

    /// Base URL of the verification service.
    #[serde(default = "default_verify_base_url")]
    pub verify_base_url: String,
}

/// Price oracle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Price endpoint URL (query parameters are appended).
    #[serde(default = "default_oracle_url")]
    pub url: String,
}

/// Walrus publisher/aggregator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobConfig {
    /// Publisher base URL (uploads).
    #[serde(default = "default_publisher_url")]
    pub publisher_url: String,

    /// Aggregator base URL (reads).
    #[serde(default = "default_aggregator_url")]
    pub aggregator_url: String,

    /// Number of storage epochs to pay for on upload.
    #[serde(default = "default_epochs")]
    pub epochs: u32,
}

/// Username profile service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    /// Base URL of the username service.
    #[serde(default = "default_profile_url")]
    pub url: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            cache: CacheConfig::default(),
            identity: IdentityConfig::default(),
            oracle: OracleConfig::default(),
            blobs: BlobConfig::default(),
            profile: ProfileConfig::default(),
            reference_cache_capacity: default_reference_cache_capacity(),
            log_level: default_log_level(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            cors_origins: Vec::new(),
        }
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            app_id: None,
            verify_base_url: default_verify_base_url(),
        }
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            url: default_oracle_url(),
        }
    }
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            publisher_url: default_publisher_url(),
            aggregator_url: default_aggregator_url(),
            epochs: default_epochs(),
        }
    }
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            url: default_profile_url(),
        }
    }
}

impl DatabaseConfig {
    /// Returns `(url, key)` when both are configured and non-empty.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        non_empty_pair(self.url.as_deref(), self.service_key.as_deref())
    }
}

impl CacheConfig {
    /// Returns `(url, token)` when both are configured and non-empty.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        non_empty_pair(self.url.as_deref(), self.token.as_deref())
    }
}

fn non_empty_pair<'a>(a: Option<&'a str>, b: Option<&'a str>) -> Option<(&'a str, &'a str)> {
    match (a, b) {
        (Some(a), Some(b)) if !a.trim().is_empty() && !b.trim().is_empty() => Some((a, b)),
        _ => None,
    }
}

/// Default location of the configuration file.
#[must_use]
pub fn default_config_path() -> PathBuf {
    directories::ProjectDirs::from("", "", "bounty-gateway")
        .map(|dirs| dirs.config_dir().join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("bounty-gateway.toml"))
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

fn default_log_level() -> String {
    "info".to_string()
}

const fn default_reference_cache_capacity() -> usize {
    10_000
}

fn default_verify_base_url() -> String {
    "https://developer.worldcoin.org".to_string()
}

fn default_oracle_url() -> String {
    "https://app-backend.toolsforhumanity.com/public/v1/miniapps/prices".to_string()
}

fn default_publisher_url() -> String {
    "https://publisher.walrus-testnet.walrus.space".to_string()
}

fn default_aggregator_url() -> String {
    "https://aggregator.walrus-testnet.walrus.space".to_string()
}

const fn default_epochs() -> u32 {
    5
}

fn default_profile_url() -> String {
    "https://usernames.worldcoin.org".to_string()
}

impl GatewayConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Save configuration to a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn to_file(&self, path: &std::path::Path) -> crate::Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
