// src/api.rs
// Axum router: create / fetch / confirm deep links, client page, health
use crate::builder;
use crate::config::Config;
use crate::error::LinkError;
use crate::page;
use crate::request::validate_request;
use crate::storage::{is_valid_id, TxStore};

use alloy_primitives::B256;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderName, Method, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

/// Shared handler state. The store handle is created once at startup.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TxStore>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn TxStore>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(LinkError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("internal error")]
    Internal(LinkError),
}

impl From<LinkError> for ApiError {
    fn from(e: LinkError) -> Self {
        if e.is_validation() {
            ApiError::Validation(e)
        } else {
            ApiError::Internal(e)
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Validation(e) => (
                StatusCode::BAD_REQUEST,
                json!({ "success": false, "error": e.to_string(), "code": e.code() }),
            ),
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "success": false, "error": msg, "code": "BadRequest" }),
            ),
            ApiError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                json!({ "success": false, "error": msg, "code": "NotFound" }),
            ),
            ApiError::Internal(e) => {
                error!("internal error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "success": false, "error": "Internal server error", "code": "Internal" }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

fn json_body(body: Result<Json<JsonValue>, JsonRejection>) -> Result<JsonValue, ApiError> {
    body.map(|Json(v)| v)
        .map_err(|rejection| ApiError::BadRequest(format!("invalid JSON body: {}", rejection)))
}

///////////////////////////////////////////////////////////////////////////
// POST /tx/create
///////////////////////////////////////////////////////////////////////////
async fn create_tx(
    State(state): State<AppState>,
    body: Result<Json<JsonValue>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let body = json_body(body)?;
    let request = validate_request(&body).map_err(|e| {
        info!("rejected create request: {}", e);
        ApiError::from(e)
    })?;

    let payload = builder::build(&request)?;
    let action = payload.action;
    let id = state.store.put(payload).await?;
    let page_url = state.config.page_url(&id);

    info!("✅ Created {} link {} ({} {})", action, id, request.amount.display(), request.token.symbol);

    Ok(Json(json!({
        "success": true,
        "message": format!(
            "Transaction created, ask the user to approve it in {} minutes at {}",
            state.config.ttl_minutes(),
            page_url
        ),
        "transactionId": id,
        "pageUrl": page_url,
    })))
}

///////////////////////////////////////////////////////////////////////////
// GET /tx/data/:id
///////////////////////////////////////////////////////////////////////////
async fn get_tx_data(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if !is_valid_id(&id) {
        return Err(ApiError::NotFound("Transaction not found or expired"));
    }
    let record = state
        .store
        .get(&id)
        .await?
        .ok_or(ApiError::NotFound("Transaction not found or expired"))?;

    Ok(Json(json!({
        "success": true,
        "data": record.payload,
        "expiresAt": record.expires_at,
        "confirmation": {
            "success": record.success,
            "txHash": record.tx_hash,
            "approvalTxHash": record.approval_tx_hash,
        },
    })))
}

///////////////////////////////////////////////////////////////////////////
// POST /tx/confirm/:id
///////////////////////////////////////////////////////////////////////////
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfirmRequest {
    #[serde(default)]
    tx_hash: Option<String>,
    #[serde(default)]
    approval_tx_hash: Option<String>,
}

/// Accepts a 0x-prefixed 32-byte hex hash; returns it normalised to lowercase.
fn parse_tx_hash(field: &str, raw: &str) -> Result<String, ApiError> {
    if !raw.starts_with("0x") {
        return Err(ApiError::BadRequest(format!("{} must be 0x-prefixed", field)));
    }
    B256::from_str(raw)
        .map(|h| format!("{:#x}", h))
        .map_err(|_| ApiError::BadRequest(format!("{} must be a 32-byte hex hash", field)))
}

async fn confirm_tx(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<JsonValue>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let req: ConfirmRequest = serde_json::from_value(json_body(body)?)
        .map_err(|e| ApiError::BadRequest(format!("invalid confirm body: {}", e)))?;

    let tx_hash = match req.tx_hash.as_deref().map(str::trim) {
        Some(h) if !h.is_empty() => parse_tx_hash("txHash", h)?,
        _ => return Err(ApiError::BadRequest("Transaction hash (txHash) is required".into())),
    };
    let approval = match req.approval_tx_hash.as_deref().map(str::trim) {
        Some(h) if !h.is_empty() => Some(parse_tx_hash("approvalTxHash", h)?),
        _ => None,
    };

    if !is_valid_id(&id) {
        return Err(ApiError::NotFound("Transaction not found or could not be updated"));
    }
    let updated = state
        .store
        .mark_confirmed(&id, &tx_hash, approval.as_deref())
        .await?;
    if !updated {
        warn!("confirm for unknown link {}", id);
        return Err(ApiError::NotFound("Transaction not found or could not be updated"));
    }

    info!("🔗 Link {} confirmed on-chain: {}", id, tx_hash);
    Ok(Json(json!({ "success": true, "message": "Transaction marked as successful" })))
}

///////////////////////////////////////////////////////////////////////////
// GET /transaction/:id  (client page)
///////////////////////////////////////////////////////////////////////////
async fn transaction_page(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    if !is_valid_id(&id) {
        return (StatusCode::NOT_FOUND, Html(page::render_not_found())).into_response();
    }
    match state.store.get(&id).await {
        Ok(Some(record)) => Html(page::render_transaction_page(&state.config, &record)).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, Html(page::render_not_found())).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

///////////////////////////////////////////////////////////////////////////
// GET /health
///////////////////////////////////////////////////////////////////////////
async fn health(State(state): State<AppState>) -> Response {
    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "storage": state.store.backend_name() })),
        )
            .into_response(),
        Err(e) => {
            error!("health: storage error: {:?}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "storage-unavailable" })),
            )
                .into_response()
        }
    }
}

/// Request logging middleware.
///
/// Logs all HTTP requests with method, path, status, and latency.
async fn logging_middleware<B>(req: Request<B>, next: Next<B>) -> Result<Response, StatusCode> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let start = std::time::Instant::now();

    let response = next.run(req).await;

    let latency = start.elapsed().as_secs_f64();
    let status = response.status().as_u16();
    info!("{} {} {} - {:.3}s", method, path, status, latency);

    Ok(response)
}

/// Headers browsers may send on cross-origin calls.
const ALLOWED_HEADERS: [&str; 10] = [
    "x-csrf-token",
    "x-requested-with",
    "accept",
    "accept-version",
    "content-length",
    "content-md5",
    "content-type",
    "date",
    "x-api-version",
    "authorization",
];

/// Permissive CORS: any origin, fixed method/header lists, one-day preflight cache.
/// OPTIONS requests are answered directly by the layer.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(ALLOWED_HEADERS.map(HeaderName::from_static))
        .max_age(Duration::from_secs(86_400))
}

/// Build router for the link service (call from main or tests)
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/tx/create", post(create_tx))
        .route("/tx/data/:id", get(get_tx_data))
        .route("/tx/confirm/:id", post(confirm_tx))
        .route("/transaction/:id", get(transaction_page))
        .layer(middleware::from_fn(logging_middleware))
        .layer(cors_layer())
        .with_state(state)
}
