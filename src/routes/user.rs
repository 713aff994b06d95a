//! User route definitions

use axum::{routing::post, Router};

use crate::handlers::user::protected_probe;
use crate::state::AppState;

pub fn user_routes() -> Router<AppState> {
    Router::new().route("/users/test", post(protected_probe))
}
