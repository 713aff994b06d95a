//! Application state shared across handlers

use std::sync::Arc;

use crate::auth::{CredentialService, RefreshCookie, SessionGuard};
use crate::store::UserStore;

use axum::extract::FromRef;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub credential_service: Arc<CredentialService>,
    pub session_guard: Arc<SessionGuard>,
    pub user_store: Arc<dyn UserStore>,
    pub refresh_cookie: RefreshCookie,
}

impl AppState {
    /// Build state; the session guard shares the credential service
    pub fn new(
        credential_service: Arc<CredentialService>,
        user_store: Arc<dyn UserStore>,
        refresh_cookie: RefreshCookie,
    ) -> Self {
        let session_guard = Arc::new(SessionGuard::new(credential_service.clone()));
        Self {
            credential_service,
            session_guard,
            user_store,
            refresh_cookie,
        }
    }
}

impl FromRef<AppState> for Arc<CredentialService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.credential_service.clone()
    }
}

impl FromRef<AppState> for Arc<SessionGuard> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.session_guard.clone()
    }
}

impl FromRef<AppState> for RefreshCookie {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.refresh_cookie.clone()
    }
}
