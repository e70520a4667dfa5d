//! End-to-end tests for bounty-gateway.
//!
//! Every test starts a real gateway on a loopback port and drives it over
//! HTTP. External services are replaced by mock axum servers from
//! [`harness`], so the suite runs offline.


mod identity;
mod payments;
mod services;
mod stores;

pub use harness::{MockUpstream, TestGateway};
