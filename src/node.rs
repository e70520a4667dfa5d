//! Gateway assembly and lifecycle.

use crate::blobs::BlobClient;
use crate::config::GatewayConfig;
use crate::error::Result;
use crate::event::{create_event_channel, GatewayEvent, GatewayEventsChannel, GatewayEventsSender};
use crate::forms::{BountyFormsGateway, FormResponseGateway};
use crate::identity::{IdentityVerifier, ProfileFetcher};
use crate::notifications::NotificationRegistrar;
use crate::payment::PaymentInitiator;
use crate::prices::PriceFetcher;
use crate::server::{self, AppState};
use crate::store::Stores;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

/// Builder for constructing a gateway.
pub struct GatewayBuilder {
    config: GatewayConfig,
    stores: Option<Stores>,
    http: Option<reqwest::Client>,
}

impl GatewayBuilder {
    /// Create a new gateway builder with the given configuration.
    #[must_use]
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            config,
            stores: None,
            http: None,
        }
    }

    /// Use these store handles instead of building them from configuration.
    #[must_use]
    pub fn with_stores(mut self, stores: Stores) -> Self {
        self.stores = Some(stores);
        self
    }

    /// Use this HTTP client for outbound calls.
    #[must_use]
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    /// Build the components and bind the listener.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the listen
    /// address cannot be bound.
    pub async fn build(self) -> Result<RunningGateway> {
        info!(
            "Building bounty-gateway (listen_addr={}, database={}, cache={})",
            self.config.server.listen_addr,
            self.config.database.credentials().is_some(),
            self.config.cache.credentials().is_some()
        );

        let http = match self.http {
            Some(http) => http,
            None => reqwest::Client::builder()
                .user_agent(concat!("bounty-gateway/", env!("CARGO_PKG_VERSION")))
                .build()?,
        };
        let stores = self
            .stores
            .unwrap_or_else(|| Stores::from_config(&self.config, &http));

        // Create shutdown channel
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        // Create event channel
        let (events_tx, events_rx) = create_event_channel();

        let state = build_state(&self.config, &stores, &http, &events_tx);
        let router = server::router(state, &self.config.server.cors_origins);

        let listener = TcpListener::bind(self.config.server.listen_addr).await?;
        let local_addr = listener.local_addr()?;
        info!("Listening on {local_addr}");

        Ok(RunningGateway {
            listener,
            local_addr,
            router,
            shutdown_tx,
            shutdown_rx,
            events_tx,
            events_rx: Some(events_rx),
        })
    }
}

/// Construct every component once, sharing the store handles and HTTP client.
fn build_state(
    config: &GatewayConfig,
    stores: &Stores,
    http: &reqwest::Client,
    events: &GatewayEventsSender,
) -> AppState {
    AppState {
        payments: Arc::new(PaymentInitiator::new(
            stores.references.clone(),
            config.reference_cache_capacity,
            events.clone(),
        )),
        responses: Arc::new(FormResponseGateway::new(stores.forms.clone(), events.clone())),
        forms: Arc::new(BountyFormsGateway::new(stores.forms.clone(), events.clone())),
        notifications: Arc::new(NotificationRegistrar::new(
            stores.flags.clone(),
            events.clone(),
        )),
        identity: Arc::new(IdentityVerifier::new(
            http.clone(),
            &config.identity,
            events.clone(),
        )),
        profiles: Arc::new(ProfileFetcher::new(http.clone(), &config.profile)),
        prices: Arc::new(PriceFetcher::new(http.clone(), &config.oracle)),
        blobs: Arc::new(BlobClient::new(http.clone(), &config.blobs)),
    }
}

/// A bound gateway, ready to serve.
pub struct RunningGateway {
    listener: TcpListener,
    local_addr: SocketAddr,
    router: Router,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    events_tx: GatewayEventsSender,
    events_rx: Option<GatewayEventsChannel>,
}

impl RunningGateway {
    /// Address the gateway is bound to.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Get a receiver for gateway events.
    ///
    /// Note: Can only be called once. Subsequent calls return None.
    pub fn events(&mut self) -> Option<GatewayEventsChannel> {
        self.events_rx.take()
    }

    /// Subscribe to gateway events.
    #[must_use]
    pub fn subscribe_events(&self) -> GatewayEventsChannel {
        self.events_tx.subscribe()
    }

    /// Handle that stops the gateway when `true` is sent.
    #[must_use]
    pub fn shutdown_handle(&self) -> watch::Sender<bool> {
        self.shutdown_tx.clone()
    }

    /// Serve requests until shutdown is requested or Ctrl-C is received.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails.
    pub async fn run(self) -> Result<()> {
        info!("Starting bounty-gateway on {}", self.local_addr);
        let _ = self.events_tx.send(GatewayEvent::Started {
            addr: self.local_addr.to_string(),
        });

        let shutdown_rx = self.shutdown_rx.clone();
        let shutdown_tx = self.shutdown_tx.clone();
        let shutdown = async move {
            tokio::select! {
                () = stop_requested(shutdown_rx) => {
                    info!("Shutdown signal received");
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Ctrl-C received, initiating shutdown");
                    let _ = shutdown_tx.send(true);
                }
            }
        };

        if let Err(e) = axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
        {
            let _ = self.events_tx.send(GatewayEvent::Error {
                message: e.to_string(),
            });
            return Err(e.into());
        }

        let _ = self.events_tx.send(GatewayEvent::ShuttingDown);
        info!("Gateway shutdown complete");
        Ok(())
    }

    /// Request the gateway to shut down.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

/// Resolves once `true` is sent, or when every sender is gone.
async fn stop_requested(mut rx: watch::Receiver<bool>) {
    while !*rx.borrow_and_update() {
        if rx.changed().await.is_err() {
            break;
        }
    }
}
