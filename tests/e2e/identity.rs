//! World ID verification and profile routes.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::harness::{TEST_APP_ID, UNKNOWN_ADDRESS, VALID_PROOF};
use super::{MockUpstream, TestGateway};
use axum::http::StatusCode;
use serde_json::{json, Value};

fn verify_body(proof: &str) -> Value {
    json!({
        "payload": {
            "proof": proof,
            "merkle_root": "0x1f38b57f3bdf96f05ea62fa68814871bf0ca8ce4dbe073d8497d5a6b0a53e5e0",
            "nullifier_hash": "0x0339861e70a9bdb6cf0e4f3e0d4c54a0c9d2d4ad1a6bd1b0e2d7a6e0f4b3c2a1",
            "verification_level": "orb",
            "status": "success"
        },
        "action": "claim-bounty",
        "signal": "0x2222222222222222222222222222222222222222"
    })
}

async fn gateway_with_verifier(verifier: &MockUpstream) -> TestGateway {
    let base = verifier.base_url().to_string();
    TestGateway::start_with(|config| {
        config.identity.app_id = Some(TEST_APP_ID.to_string());
        config.identity.verify_base_url = base;
    })
    .await
}

#[tokio::test]
async fn test_valid_proof_is_accepted() {
    let verifier = MockUpstream::world_id().await;
    let gateway = gateway_with_verifier(&verifier).await;

    let (status, body) = gateway
        .post_json("/worldchain/verify", &verify_body(VALID_PROOF))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["status"], 200);
    assert_eq!(body["verifyRes"]["success"], true);
    assert_eq!(body["verifyRes"]["action"], "claim-bounty");

    gateway.teardown().await;
}

#[tokio::test]
async fn test_rejected_proof_relays_diagnostics() {
    let verifier = MockUpstream::world_id().await;
    let gateway = gateway_with_verifier(&verifier).await;

    let (status, body) = gateway
        .post_json("/worldchain/verify", &verify_body("0xforged"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
    assert_eq!(body["verifyRes"]["success"], false);
    assert_eq!(body["verifyRes"]["code"], "invalid_proof");

    gateway.teardown().await;
}

#[tokio::test]
async fn test_missing_app_id_is_server_error() {
    // Verifier URL points nowhere: no request may be sent without an app id.
    let gateway = TestGateway::start_with(|config| {
        config.identity.app_id = None;
        config.identity.verify_base_url = "http://127.0.0.1:1".to_string();
    })
    .await;

    let (status, body) = gateway
        .post_json("/worldchain/verify", &verify_body(VALID_PROOF))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], 500);
    assert!(body["error"].as_str().unwrap().contains("app id"));

    gateway.teardown().await;
}

#[tokio::test]
async fn test_missing_app_id_wins_over_malformed_payload() {
    let gateway = TestGateway::start_with(|config| {
        config.identity.app_id = None;
        config.identity.verify_base_url = "http://127.0.0.1:1".to_string();
    })
    .await;

    let bodies = [
        json!({}),
        json!({ "payload": { "proof": "0x1" }, "action": "a" }),
    ];
    for body in &bodies {
        let (status, reply) = gateway.post_json("/worldchain/verify", body).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{body}");
        assert_eq!(reply["status"], 500);
        assert!(reply["error"].as_str().unwrap().contains("app id"), "{reply}");
    }

    let (status, reply) = gateway.post_raw("/worldchain/verify", "{not json").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(reply["error"].as_str().unwrap().contains("app id"));

    gateway.teardown().await;
}

#[tokio::test]
async fn test_partial_payload_is_bad_request_when_configured() {
    let verifier = MockUpstream::world_id().await;
    let gateway = gateway_with_verifier(&verifier).await;

    let (status, reply) = gateway
        .post_json(
            "/worldchain/verify",
            &json!({ "payload": { "proof": "0x1" }, "action": "a" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(reply["status"], 400);

    let (status, _) = gateway.post_raw("/worldchain/verify", "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    gateway.teardown().await;
}

#[tokio::test]
async fn test_verify_requires_action() {
    let verifier = MockUpstream::world_id().await;
    let gateway = gateway_with_verifier(&verifier).await;

    let mut body = verify_body(VALID_PROOF);
    body["action"] = json!("");
    let (status, _) = gateway.post_json("/worldchain/verify", &body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    gateway.teardown().await;
}

#[tokio::test]
async fn test_profile_lookup() {
    let profiles = MockUpstream::profiles().await;
    let base = profiles.base_url().to_string();
    let gateway = TestGateway::start_with(|config| config.profile.url = base).await;

    let address = "0xABCDEFabcdef0123456789012345678901234567";
    let (status, body) = gateway
        .get(&format!("/worldchain/profile/{address}"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "bountyhunter");
    assert_eq!(body["address"], address.to_lowercase());

    let (status, body) = gateway
        .get(&format!("/worldchain/profile/{UNKNOWN_ADDRESS}"))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], 500);

    let (status, _) = gateway.get("/worldchain/profile/alice").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    gateway.teardown().await;
}
