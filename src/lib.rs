//! # bounty-gateway
//!
//! HTTP gateway for a bounty mini-app. It glues together external services:
//!
//! - **World ID**: proof verification through the developer portal
//! - **Walrus**: blob storage for image answers
//! - **Supabase**: forms, form responses and payment references
//! - **Upstash Redis**: notification opt-in flags
//! - **Price oracle**: WLD and USDC.e prices
//!
//! Every route parses its input, calls exactly one component, and maps the
//! result to JSON. Store handles and the outbound HTTP client are built once
//! at startup and passed to each component explicitly.
//!
//! ## Example
//!
//! ```rust,ignore
//! use bounty_gateway::{GatewayBuilder, GatewayConfig};
//!
//! #[tokio::main]
//! async fn main() -> bounty_gateway::Result<()> {
//!     let gateway = GatewayBuilder::new(GatewayConfig::default()).build().await?;
//!     gateway.run().await
//! }
//! ```

#![forbid(unsafe_code)]

pub mod blobs;
pub mod config;
pub mod error;
pub mod event;
pub mod forms;
pub mod identity;
pub mod node;
pub mod notifications;
pub mod payment;
pub mod prices;
pub mod server;
pub mod store;

pub use config::GatewayConfig;
pub use error::{Error, Result};
pub use event::{GatewayEvent, GatewayEventsChannel};
pub use node::{GatewayBuilder, RunningGateway};
pub use payment::{PaymentInitiator, PaymentReference, ReferenceId, ReferenceStatus};
pub use store::{MemoryStore, Stores};
