//! Health check handler

use axum::extract::State;
use serde::Serialize;

use crate::models::ApiResponse;
use crate::state::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub store: String,
    pub version: String,
}

/// GET /health - Report store connectivity
pub async fn health_check(State(state): State<AppState>) -> ApiResponse<HealthResponse> {
    let (status, store) = match state.user_store.health().await {
        Ok(()) => ("healthy", "connected".to_string()),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            ("unhealthy", "unavailable".to_string())
        }
    };

    ApiResponse::ok(HealthResponse {
        status: status.to_string(),
        store,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
