//! Store backends against mock REST services.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::harness::REDIS_TOKEN;
use super::MockUpstream;
use bounty_gateway::store::{FlagStore, ReferenceStore, SupabaseStore, UpstashStore};
use bounty_gateway::{Error, PaymentReference, ReferenceId, ReferenceStatus};
use parking_lot::Mutex;
use serde_json::{json, Map};
use std::collections::HashMap;
use std::sync::Arc;

#[tokio::test]
async fn test_supabase_reference_roundtrip() {
    let postgrest = MockUpstream::postgrest().await;
    let store = SupabaseStore::new(reqwest::Client::new(), postgrest.base_url(), "service-key");

    let mut metadata = Map::new();
    metadata.insert("formId".to_string(), json!("f1"));
    let reference = PaymentReference::initiated(ReferenceId::generate(), metadata);

    store.insert_reference(&reference).await.expect("insert");
    let loaded = store
        .get_reference(&reference.reference_id)
        .await
        .expect("get")
        .expect("present");
    assert_eq!(loaded.reference_id, reference.reference_id);
    assert_eq!(loaded.status, ReferenceStatus::Initiated);
    assert_eq!(loaded.metadata["formId"], "f1");

    let missing = store
        .get_reference(&ReferenceId::generate())
        .await
        .expect("get");
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_supabase_duplicate_is_conflict() {
    let postgrest = MockUpstream::postgrest().await;
    let store = SupabaseStore::new(reqwest::Client::new(), postgrest.base_url(), "service-key");

    let reference = PaymentReference::initiated(ReferenceId::generate(), Map::new());
    store.insert_reference(&reference).await.expect("first insert");

    let err = store.insert_reference(&reference).await.unwrap_err();
    assert!(matches!(err, Error::Conflict(_)), "unexpected error: {err}");
}

#[tokio::test]
async fn test_upstash_flags() {
    let data: Arc<Mutex<HashMap<String, String>>> = Arc::default();
    let redis = MockUpstream::upstash(data).await;
    let store = UpstashStore::new(reqwest::Client::new(), redis.base_url(), REDIS_TOKEN);

    assert_eq!(store.get_flag("notifications:0xabc").await.unwrap(), None);
    store.set_flag("notifications:0xabc", "true").await.unwrap();
    assert_eq!(
        store.get_flag("notifications:0xabc").await.unwrap().as_deref(),
        Some("true")
    );
}

#[tokio::test]
async fn test_upstash_unreachable_is_store_error() {
    let store = UpstashStore::new(reqwest::Client::new(), "http://127.0.0.1:1", REDIS_TOKEN);
    let err = store.set_flag("k", "v").await.unwrap_err();
    assert!(matches!(err, Error::Store(_)));
}
