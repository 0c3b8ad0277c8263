//! Axum REST API handlers.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    http::{HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::errors::{RelayError, Result};
use crate::pinata::{PinRequest, PinataClient};

#[derive(Clone)]
pub struct ApiState {
    pub pinata: PinataClient,
}

// ─────────────────────────────────────────────────────────
// Response shapes
// ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct UploadResponse {
    #[serde(rename = "IpfsHash")]
    pub ipfs_hash: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub message: &'static str,
    pub response: serde_json::Value,
}

#[derive(Serialize)]
pub struct AuthFailure {
    pub error: &'static str,
    pub details: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ─────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────

pub fn router(state: Arc<ApiState>, cors: CorsLayer, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/test-auth", get(test_auth))
        .route("/upload", post(upload))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `*` allows any origin; anything else is a single allowed origin.
pub fn cors_layer(origin: &str) -> Result<CorsLayer> {
    if origin.trim() == "*" {
        return Ok(CorsLayer::permissive());
    }
    let origin: HeaderValue = origin
        .trim()
        .parse()
        .map_err(|_| RelayError::Config(format!("Invalid CORS_ORIGIN: {origin}")))?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any))
}

// ─────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /test-auth`
///
/// Checks the configured Pinata credentials.
pub async fn test_auth(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    match state.pinata.test_authentication().await {
        Ok(response) => (
            StatusCode::OK,
            Json(serde_json::json!(AuthResponse {
                message: "Authentication successful",
                response,
            })),
        )
            .into_response(),
        Err(e) => {
            warn!("Pinata authentication failed: {e}");
            (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!(AuthFailure {
                    error: "Authentication failed",
                    details: e.to_string(),
                })),
            )
                .into_response()
        }
    }
}

/// `POST /upload`
///
/// Accepts a multipart form with a `file` part and pins it. Any other text
/// parts travel along as Pinata key-values.
pub async fn upload(
    State(state): State<Arc<ApiState>>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>> {
    let Ok(mut multipart) = multipart else {
        return Err(RelayError::NoFile);
    };

    let mut file = None;
    let mut keyvalues = BTreeMap::new();
    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        if name == "file" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().map(str::to_string);
            let bytes = field.bytes().await?;
            // A form submitted without choosing a file still sends an empty part.
            if file_name.is_empty() && bytes.is_empty() {
                continue;
            }
            file = Some(PinRequest {
                name: if file_name.is_empty() { name } else { file_name },
                content_type,
                bytes: bytes.to_vec(),
                keyvalues: BTreeMap::new(),
            });
        } else if field.file_name().is_none() {
            keyvalues.insert(name, field.text().await?);
        }
    }

    let mut file = file.ok_or(RelayError::NoFile)?;
    info!(
        "Uploaded file type: {}, size: {} bytes",
        file.content_type.as_deref().unwrap_or("unknown"),
        file.bytes.len()
    );
    file.keyvalues = keyvalues;

    let ipfs_hash = state.pinata.pin_file(file).await.map_err(|e| {
        warn!("Error during file upload: {e}");
        e
    })?;
    Ok(Json(UploadResponse { ipfs_hash }))
}
