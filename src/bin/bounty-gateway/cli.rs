//! Command-line interface definition.

use bounty_gateway::config::{default_config_path, GatewayConfig};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

/// HTTP gateway for bounty forms, payment references and World ID verification.
#[derive(Parser, Debug)]
#[command(name = "bounty-gateway")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Address to listen on.
    #[arg(long, short, env = "BOUNTY_LISTEN_ADDR")]
    pub listen: Option<SocketAddr>,

    /// Allowed CORS origins (comma separated). Unset means permissive.
    #[arg(long, value_delimiter = ',', env = "CORS_ALLOWED_ORIGINS")]
    pub cors_origins: Vec<String>,

    /// Supabase project URL.
    #[arg(long, env = "SUPABASE_URL")]
    pub supabase_url: Option<String>,

    /// Supabase service role key.
    #[arg(long, env = "SUPABASE_SERVICE_ROLE_KEY", hide_env_values = true)]
    pub supabase_key: Option<String>,

    /// Upstash Redis REST URL.
    #[arg(long, env = "UPSTASH_REDIS_REST_URL")]
    pub redis_url: Option<String>,

    /// Upstash Redis REST token.
    #[arg(long, env = "UPSTASH_REDIS_REST_TOKEN", hide_env_values = true)]
    pub redis_token: Option<String>,

    /// World ID application id.
    #[arg(long, env = "APP_ID")]
    pub app_id: Option<String>,

    /// World ID verification service base URL.
    #[arg(long, env = "WORLD_ID_VERIFY_URL")]
    pub verify_url: Option<String>,

    /// Price oracle endpoint.
    #[arg(long, env = "PRICE_ORACLE_URL")]
    pub oracle_url: Option<String>,

    /// Walrus publisher URL.
    #[arg(long, env = "WALRUS_PUBLISHER_URL")]
    pub walrus_publisher: Option<String>,

    /// Walrus aggregator URL.
    #[arg(long, env = "WALRUS_AGGREGATOR_URL")]
    pub walrus_aggregator: Option<String>,

    /// Storage epochs paid for on upload.
    #[arg(long, env = "WALRUS_EPOCHS")]
    pub walrus_epochs: Option<u32>,

    /// Username profile service URL.
    #[arg(long, env = "PROFILE_SERVICE_URL")]
    pub profile_url: Option<String>,

    /// Log level. `RUST_LOG`, when set, takes precedence.
    #[arg(long, env = "BOUNTY_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Path to configuration file.
    #[arg(long, short)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Convert CLI arguments into a `GatewayConfig`.
    ///
    /// Values from the command line or environment override the file.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file is specified but cannot be loaded.
    pub fn into_config(self) -> color_eyre::Result<GatewayConfig> {
        // Start with an explicit file, the default file if present, or defaults
        let mut config = match self.config {
            Some(ref path) => GatewayConfig::from_file(path)?,
            None => {
                let path = default_config_path();
                if path.is_file() {
                    GatewayConfig::from_file(&path)?
                } else {
                    GatewayConfig::default()
                }
            }
        };

        if let Some(addr) = self.listen {
            config.server.listen_addr = addr;
        }
        if !self.cors_origins.is_empty() {
            config.server.cors_origins = self.cors_origins;
        }

        // Stores
        override_opt(&mut config.database.url, self.supabase_url);
        override_opt(&mut config.database.service_key, self.supabase_key);
        override_opt(&mut config.cache.url, self.redis_url);
        override_opt(&mut config.cache.token, self.redis_token);

        // External services
        override_opt(&mut config.identity.app_id, self.app_id);
        override_val(&mut config.identity.verify_base_url, self.verify_url);
        override_val(&mut config.oracle.url, self.oracle_url);
        override_val(&mut config.blobs.publisher_url, self.walrus_publisher);
        override_val(&mut config.blobs.aggregator_url, self.walrus_aggregator);
        override_val(&mut config.blobs.epochs, self.walrus_epochs);
        override_val(&mut config.profile.url, self.profile_url);

        override_val(&mut config.log_level, self.log_level);

        Ok(config)
    }
}

fn override_opt<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

fn override_val<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}
