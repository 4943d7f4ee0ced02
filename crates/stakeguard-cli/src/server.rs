//! HTTP extraction endpoint (`stakeguard --serve`)

use axum::{
    Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use serde::Deserialize;
use stakeguard_invoice::Extractor;
use std::sync::Arc;

/// Error text returned for any failed extraction request
pub const EXTRACT_FAILED: &str = "Failed to extract invoice details";

#[derive(Clone)]
pub struct AppState {
    pub extractor: Arc<dyn Extractor>,
}

/// Request body; `prompt` is accepted as an alias of `text`
#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    text: Option<String>,
    prompt: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/api/extract-invoice", post(handle_extract))
        .with_state(state)
}

/// Bind `addr` and serve until the process exits
pub async fn run(addr: &str, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    println!("stakeguard listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// GET /health
async fn handle_health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// POST /api/extract-invoice
async fn handle_extract(
    State(state): State<AppState>,
    body: Result<Json<ExtractRequest>, JsonRejection>,
) -> impl IntoResponse {
    let text = match body {
        Ok(Json(request)) => request.text.or(request.prompt),
        Err(e) => {
            tracing::warn!("Rejected extraction request: {}", e);
            None
        }
    };
    let Some(text) = text else {
        return failure(StatusCode::BAD_REQUEST);
    };

    match state.extractor.extract(&text).await {
        Ok(extracted) => (
            StatusCode::OK,
            Json(serde_json::json!({ "success": true, "data": extracted })),
        ),
        Err(e) => {
            tracing::warn!("Error extracting invoice details: {}", e);
            failure(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

fn failure(status: StatusCode) -> (StatusCode, Json<serde_json::Value>) {
    (
        status,
        Json(serde_json::json!({ "success": false, "error": EXTRACT_FAILED })),
    )
}
