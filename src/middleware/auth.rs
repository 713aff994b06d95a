//! Authentication middleware
//!
//! Extractor that runs the session guard for protected handlers.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use axum_extra::{
    extract::cookie::CookieJar,
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{refresh_token_from, Claims, SessionGuard};
use crate::error::ApiError;

/// Authenticated user extracted from the access token and refresh cookie
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: String,
    pub claims: Claims,
}

/// Extractor for authenticated users
///
/// Reads the bearer token from the `Authorization` header and the refresh
/// token from the session cookie, then admits the request only if the
/// [`SessionGuard`] accepts both.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(user: AuthenticatedUser) -> impl IntoResponse {
///     format!("Hello, user {}", user.user_id)
/// }
/// ```
#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<SessionGuard>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // A missing or malformed header both count as "no access token"
        let access_token = TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
            .await
            .ok()
            .map(|TypedHeader(Authorization(bearer))| bearer.token().to_string());

        let jar = CookieJar::from_headers(&parts.headers);
        let refresh_token = refresh_token_from(&jar);

        let guard = Arc::<SessionGuard>::from_ref(state);

        let session = guard
            .admit(access_token.as_deref(), refresh_token.as_deref())
            .await
            .map_err(|rejection| ApiError::from(rejection).into_response())?;

        Ok(AuthenticatedUser {
            user_id: session.user_id,
            email: session.email,
            claims: session.claims,
        })
    }
}
