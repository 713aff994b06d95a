//! Route definitions for the authpair API

mod auth;
mod user;

use axum::http::{header, HeaderValue, Method};
use axum::{routing::get, Router};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;

use crate::handlers::health_check;
use crate::middleware;
use crate::state::AppState;

pub use auth::auth_routes;
pub use user::user_routes;

/// Build the full application router.
///
/// API routes live under `/api`; `/health` stays at the root.
pub fn create_router(state: AppState, cors_allowed_origins: Option<&str>) -> Router {
    let api = Router::new().merge(auth_routes()).merge(user_routes());

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api)
        .with_state(state)
        .layer(axum::middleware::from_fn(middleware::security_headers))
        .layer(axum::middleware::from_fn(middleware::request_tracing))
        .layer(CompressionLayer::new())
        .layer(configure_cors(cors_allowed_origins))
}

/// CORS policy. Credentials (the refresh cookie) are only allowed for an
/// explicit origin list.
fn configure_cors(allowed_origins: Option<&str>) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse().ok())
        .collect();

    if origins.is_empty() {
        tracing::warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins without credentials");
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}
