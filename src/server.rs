//! HTTP surface of the gateway.
//!
//! Each handler parses its input, calls exactly one component and maps the
//! result to a JSON body. Errors are caught at the handler boundary and
//! rendered as `{"error": ..., "status": ...}` where `status` always equals
//! the transport status.

use crate::blobs::BlobClient;
use crate::error::Error;
use crate::forms::{BountyFormsGateway, FormResponseGateway, PageQuery, PageRequest};
use crate::identity::{IdentityVerifier, ProfileFetcher, VerifyRequest};
use crate::notifications::NotificationRegistrar;
use crate::payment::{PaymentInitiator, ReferenceId};
use crate::prices::PriceFetcher;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Components shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Payment reference issuer.
    pub payments: Arc<PaymentInitiator>,
    /// Submissions gateway.
    pub responses: Arc<FormResponseGateway>,
    /// Forms gateway.
    pub forms: Arc<BountyFormsGateway>,
    /// Notification opt-ins.
    pub notifications: Arc<NotificationRegistrar>,
    /// Proof verification.
    pub identity: Arc<IdentityVerifier>,
    /// Profile lookup.
    pub profiles: Arc<ProfileFetcher>,
    /// Price oracle.
    pub prices: Arc<PriceFetcher>,
    /// Blob uploads.
    pub blobs: Arc<BlobClient>,
}

/// Error rendered at the HTTP edge.
#[derive(Debug)]
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        if status.is_server_error() {
            warn!("Request failed: {}", self.0);
        }
        (
            status,
            Json(json!({ "error": self.0.to_string(), "status": status.as_u16() })),
        )
            .into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

/// Build the router with tracing and CORS layers.
pub fn router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/forms", get(list_forms).post(create_form))
        .route("/forms/{id}", get(get_form))
        .route(
            "/forms/{id}/responses",
            get(list_responses).post(submit_response),
        )
        .route("/get-onchain-prices", get(onchain_prices))
        .route("/initiate-payment", post(initiate_payment))
        .route("/payments/{id}", get(get_payment))
        .route("/notifications", post(register_notifications))
        .route("/worldchain/profile/{address}", get(worldchain_profile))
        .route("/worldchain/verify", post(worldchain_verify))
        .route("/blobs", post(upload_blob))
        .with_state(state)
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| {
            o.trim().parse().ok().or_else(|| {
                warn!("Ignoring invalid CORS origin: {o}");
                None
            })
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([axum::http::header::CONTENT_TYPE])
}

/// Decode a JSON body, mapping failures to a 400.
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, Error> {
    serde_json::from_slice(body).map_err(|e| Error::InvalidInput(format!("invalid JSON body: {e}")))
}

/// Serialize `value` as an object and add `"success": true`.
fn with_success<T: Serialize>(value: &T) -> ApiResult<Json<Value>> {
    let mut body = match serde_json::to_value(value).map_err(Error::from)? {
        Value::Object(map) => map,
        other => Map::from_iter([("value".to_string(), other)]),
    };
    body.insert("success".to_string(), Value::Bool(true));
    Ok(Json(Value::Object(body)))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

async fn list_forms(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Value>> {
    let forms = state.forms.list(PageRequest::from_query(&query)).await?;
    Ok(Json(json!({ "forms": forms, "success": true })))
}

async fn create_form(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<Value>> {
    let form = state.forms.create(parse_body(&body)?).await?;
    with_success(&form)
}

async fn get_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let form = state.forms.get(&id).await?;
    with_success(&form)
}

async fn submit_response(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let submission = state.responses.submit(&id, parse_body(&body)?).await?;
    with_success(&submission)
}

async fn list_responses(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let responses = state.responses.responses(&id).await?;
    Ok(Json(json!({ "responses": responses, "success": true })))
}

async fn onchain_prices(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let prices = state.prices.fetch().await?;
    Ok(Json(json!({ "prices": prices })))
}

async fn initiate_payment(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<Value>> {
    let metadata = if body.iter().all(u8::is_ascii_whitespace) {
        Map::new()
    } else {
        match parse_body::<Value>(&body)? {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            _ => {
                return Err(Error::InvalidInput("metadata must be a JSON object".to_string()).into())
            }
        }
    };
    let id = state.payments.initiate(metadata).await;
    Ok(Json(json!({ "id": id })))
}

async fn get_payment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = ReferenceId::parse(&id)?;
    let reference = state.payments.lookup(&id).await?;
    with_success(&reference)
}

#[derive(Deserialize)]
struct NotificationRequest {
    #[serde(default)]
    address: Option<String>,
}

async fn register_notifications(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let request: NotificationRequest = parse_body(&body)?;
    let address = request
        .address
        .ok_or_else(|| Error::InvalidInput("address is required".to_string()))?;
    state.notifications.register(&address).await?;
    Ok(Json(json!({ "success": true })))
}

async fn worldchain_profile(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> ApiResult<Json<Value>> {
    Ok(Json(state.profiles.profile(&address).await?))
}

async fn worldchain_verify(State(state): State<AppState>, body: Bytes) -> ApiResult<Response> {
    // A missing app id wins over any payload problem.
    state.identity.require_app_id()?;
    let request: VerifyRequest = parse_body(&body)?;
    let outcome = state.identity.verify(&request).await?;
    let status = if outcome.success {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };
    Ok((
        status,
        Json(json!({ "verifyRes": outcome.body, "status": status.as_u16() })),
    )
        .into_response())
}

async fn upload_blob(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<Value>> {
    let stored = state.blobs.store(body).await?;
    with_success(&stored)
}
