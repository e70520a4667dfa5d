//! Prices, notifications, blobs and health routes.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::harness::REDIS_TOKEN;
use super::{MockUpstream, TestGateway};
use axum::http::StatusCode;
use axum::routing::put;
use axum::{Json, Router};
use bounty_gateway::store::UpstashStore;
use bounty_gateway::{MemoryStore, Stores};
use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

#[tokio::test]
async fn test_health() {
    let gateway = TestGateway::start().await;
    let (status, body) = gateway.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    gateway.teardown().await;
}

#[tokio::test]
async fn test_prices_are_normalized() {
    let oracle = MockUpstream::oracle().await;
    let url = format!("{}/prices", oracle.base_url());
    let gateway = TestGateway::start_with(|config| config.oracle.url = url).await;

    let (status, body) = gateway.get("/get-onchain-prices").await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["prices"]["WLD"], 1.5);
    assert_eq!(body["prices"]["USDCE"], 1.0);

    gateway.teardown().await;
}

#[tokio::test]
async fn test_prices_failure_is_generic() {
    let gateway = TestGateway::start_with(|config| {
        config.oracle.url = "http://127.0.0.1:1/prices".to_string();
    })
    .await;

    let (status, body) = gateway.get("/get-onchain-prices").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "failed to fetch prices");
    assert_eq!(body["status"], 500);

    gateway.teardown().await;
}

#[tokio::test]
async fn test_notifications_are_idempotent() {
    let gateway = TestGateway::start().await;
    let address = json!({ "address": "0x3333333333333333333333333333333333333333" });

    for _ in 0..2 {
        let (status, body) = gateway.post_json("/notifications", &address).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true }));
    }

    let (status, body) = gateway.post_json("/notifications", &json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);

    gateway.teardown().await;
}

#[tokio::test]
async fn test_notifications_through_redis_rest() {
    let data: Arc<Mutex<HashMap<String, String>>> = Arc::default();
    let redis = MockUpstream::upstash(data.clone()).await;

    let memory = MemoryStore::new();
    let stores = Stores {
        flags: Arc::new(UpstashStore::new(
            reqwest::Client::new(),
            redis.base_url(),
            REDIS_TOKEN,
        )),
        ..Stores::from_memory(&memory)
    };
    let gateway = TestGateway::start_with_stores(|_| {}, stores, memory).await;

    let (status, _) = gateway
        .post_json("/notifications", &json!({ "address": "0xabc" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        data.lock().get("notifications:0xabc").map(String::as_str),
        Some("true")
    );

    gateway.teardown().await;
}

#[tokio::test]
async fn test_notification_store_failure_is_server_error() {
    let data: Arc<Mutex<HashMap<String, String>>> = Arc::default();
    let redis = MockUpstream::upstash(data.clone()).await;

    let memory = MemoryStore::new();
    let stores = Stores {
        flags: Arc::new(UpstashStore::new(
            reqwest::Client::new(),
            redis.base_url(),
            "wrong-token",
        )),
        ..Stores::from_memory(&memory)
    };
    let gateway = TestGateway::start_with_stores(|_| {}, stores, memory).await;

    let (status, body) = gateway
        .post_json("/notifications", &json!({ "address": "0xabc" }))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Unauthorized");
    assert!(data.lock().is_empty());

    gateway.teardown().await;
}

#[tokio::test]
async fn test_blob_upload() {
    let walrus = MockUpstream::walrus().await;
    let base = walrus.base_url().to_string();
    let gateway = TestGateway::start_with(|config| {
        config.blobs.publisher_url = base.clone();
        config.blobs.aggregator_url = base;
        config.blobs.epochs = 3;
    })
    .await;

    let (status, body) = gateway.post_raw("/blobs", vec![0u8; 42]).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["blobId"], "e3-n42");
    assert_eq!(
        body["url"],
        format!("{}/v1/blobs/e3-n42", walrus.base_url())
    );

    let (status, _) = gateway.post_raw("/blobs", Vec::<u8>::new()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    gateway.teardown().await;
}

#[tokio::test]
async fn test_malformed_publisher_blob_id_is_server_error() {
    let publisher = MockUpstream::serve(Router::new().route(
        "/v1/blobs",
        put(|| async {
            Json(json!({ "newlyCreated": { "blobObject": { "blobId": "bad/id" } } }))
        }),
    ))
    .await;
    let base = publisher.base_url().to_string();
    let gateway = TestGateway::start_with(|config| config.blobs.publisher_url = base).await;

    let (status, body) = gateway.post_raw("/blobs", vec![1u8; 8]).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{body}");
    assert_eq!(body["status"], 500);
    assert!(body["error"].as_str().unwrap().contains("invalid blob id"));

    gateway.teardown().await;
}
