//! Unauthenticated service endpoints: health, info, and the 404 fallback.

use axum::Json;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::response::IntoResponse;
use chrono::Utc;
use serde_json::{Value, json};

use crate::state::AppState;

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "OK",
        "message": "Server is running",
        "environment": state.config.environment.to_string(),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// GET /api/info
pub async fn info(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "name": "AI Customer Support API",
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.config.environment.to_string(),
        "features": {
            "rateLimit": !state.config.rate_limit.is_disabled(state.config.environment),
            "authentication": true,
            "aiChat": state.config.completion.has_api_key(),
        },
    }))
}

/// Any unmatched route.
pub async fn not_found(method: Method, uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Route not found",
            "path": uri.path(),
            "method": method.as_str(),
        })),
    )
}
