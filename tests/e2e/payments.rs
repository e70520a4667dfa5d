//! Payment reference routes.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::TestGateway;
use async_trait::async_trait;
use axum::http::StatusCode;
use bounty_gateway::store::ReferenceStore;
use bounty_gateway::{
    Error, GatewayEvent, MemoryStore, PaymentReference, ReferenceId, ReferenceStatus, Stores,
};
use serde_json::json;
use std::sync::Arc;

/// Reference store whose every call fails.
struct UnreachableStore;

#[async_trait]
impl ReferenceStore for UnreachableStore {
    async fn insert_reference(&self, _: &PaymentReference) -> bounty_gateway::Result<()> {
        Err(Error::store("connection refused"))
    }

    async fn get_reference(
        &self,
        _: &ReferenceId,
    ) -> bounty_gateway::Result<Option<PaymentReference>> {
        Err(Error::store("connection refused"))
    }

    async fn update_reference_status(
        &self,
        _: &ReferenceId,
        _: ReferenceStatus,
    ) -> bounty_gateway::Result<PaymentReference> {
        Err(Error::store("connection refused"))
    }
}

fn is_reference_id(value: &serde_json::Value) -> bool {
    value
        .as_str()
        .is_some_and(|s| s.len() == 32 && s.bytes().all(|b| b.is_ascii_hexdigit()))
}

#[tokio::test]
async fn test_initiate_payment_persists_reference() {
    let gateway = TestGateway::start().await;

    let (status, body) = gateway
        .post_json("/initiate-payment", &json!({ "formId": "f1", "amount": 5 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(is_reference_id(&body["id"]), "unexpected id: {body}");
    assert_eq!(gateway.store().reference_count(), 1);

    let id = body["id"].as_str().unwrap();
    let (status, reference) = gateway.get(&format!("/payments/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reference["referenceId"], id);
    assert_eq!(reference["status"], "initiated");
    assert_eq!(reference["metadata"]["formId"], "f1");

    gateway.teardown().await;
}

#[tokio::test]
async fn test_initiate_payment_without_body() {
    let gateway = TestGateway::start().await;

    let (status, first) = gateway.post_raw("/initiate-payment", "").await;
    assert_eq!(status, StatusCode::OK);
    assert!(is_reference_id(&first["id"]));

    let (status, second) = gateway.post_raw("/initiate-payment", "null").await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(first["id"], second["id"]);

    let (status, _) = gateway.post_raw("/initiate-payment", "[1, 2]").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    gateway.teardown().await;
}

#[tokio::test]
async fn test_initiate_payment_survives_store_failure() {
    let memory = MemoryStore::new();
    let stores = Stores {
        references: Arc::new(UnreachableStore),
        ..Stores::from_memory(&memory)
    };
    let mut gateway = TestGateway::start_with_stores(|_| {}, stores, memory).await;

    let (status, body) = gateway.post_raw("/initiate-payment", "{}").await;
    assert_eq!(status, StatusCode::OK);
    assert!(is_reference_id(&body["id"]));

    // The issued reference is still served from the cache.
    let id = body["id"].as_str().unwrap();
    let (status, reference) = gateway.get(&format!("/payments/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reference["status"], "initiated");

    let persisted = std::iter::from_fn(|| gateway.events().try_recv().ok()).find_map(|e| match e {
        GatewayEvent::PaymentInitiated { persisted, .. } => Some(persisted),
        _ => None,
    });
    assert_eq!(persisted, Some(false));

    gateway.teardown().await;
}

#[tokio::test]
async fn test_lookup_errors() {
    let gateway = TestGateway::start().await;

    let (status, body) = gateway.get("/payments/not-hex").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);

    let unknown = ReferenceId::generate();
    let (status, body) = gateway.get(&format!("/payments/{unknown}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 404);

    gateway.teardown().await;
}

#[tokio::test]
async fn test_lookup_store_failure_is_server_error() {
    let memory = MemoryStore::new();
    let stores = Stores {
        references: Arc::new(UnreachableStore),
        ..Stores::from_memory(&memory)
    };
    let gateway = TestGateway::start_with_stores(|_| {}, stores, memory).await;

    let unknown = ReferenceId::generate();
    let (status, body) = gateway.get(&format!("/payments/{unknown}")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "connection refused");
    assert_eq!(body["status"], 500);

    gateway.teardown().await;
}
