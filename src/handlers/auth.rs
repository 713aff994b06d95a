//! Authentication HTTP handlers
//!
//! Register, login, refresh and logout. The refresh token only ever travels
//! in the `refresh_token` cookie; bodies carry the access token alone.

use axum::extract::State;
use axum::Json;
use axum_extra::extract::{cookie::CookieJar, WithRejection};
use validator::Validate;

use super::AuthenticatedUser;
use crate::auth::{refresh_token_from, AuthError, INVALID_REFRESH_TOKEN};
use crate::error::{ApiError, ApiResult};
use crate::models::{
    AccessTokenResponse, ApiResponse, LoginRequest, LogoutResponse, RegisterRequest,
};
use crate::state::AppState;

type TokenReply = (CookieJar, ApiResponse<AccessTokenResponse>);

/// POST /api/auth/register - Create an account and open a session
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(req), _): WithRejection<Json<RegisterRequest>, ApiError>,
) -> ApiResult<TokenReply> {
    req.validate()?;

    let tokens = state
        .credential_service
        .register(&req.email, &req.password)
        .await?;

    let jar = state.refresh_cookie.set(jar, tokens.refresh_token);

    Ok((
        jar,
        ApiResponse::created(AccessTokenResponse {
            access_token: tokens.access_token,
        }),
    ))
}

/// POST /api/auth/login - Exchange credentials for a new session
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(req), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> ApiResult<TokenReply> {
    req.validate()?;

    let tokens = state
        .credential_service
        .login(&req.email, &req.password)
        .await?;

    let jar = state.refresh_cookie.set(jar, tokens.refresh_token);

    Ok((
        jar,
        ApiResponse::ok(AccessTokenResponse {
            access_token: tokens.access_token,
        }),
    ))
}

/// POST /api/auth/refresh - Rotate the session using the refresh cookie
pub async fn refresh(State(state): State<AppState>, jar: CookieJar) -> ApiResult<TokenReply> {
    let refresh_token = refresh_token_from(&jar)
        .ok_or_else(|| ApiError::Unauthorized("refresh token not found".to_string()))?;

    let claims = state
        .credential_service
        .decode_refresh_token(&refresh_token)?;

    let user_id = claims
        .user_id()
        .map_err(|_| AuthError::Unauthorized(INVALID_REFRESH_TOKEN))?;

    let tokens = state
        .credential_service
        .refresh(user_id, &refresh_token)
        .await?;

    let jar = state.refresh_cookie.set(jar, tokens.refresh_token);

    Ok((
        jar,
        ApiResponse::ok(AccessTokenResponse {
            access_token: tokens.access_token,
        }),
    ))
}

/// POST /api/auth/logout - Revoke the refresh chain and clear the cookie
pub async fn logout(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    jar: CookieJar,
) -> ApiResult<(CookieJar, ApiResponse<LogoutResponse>)> {
    let success = state.credential_service.logout(user.user_id).await?;

    let jar = state.refresh_cookie.clear(jar);

    Ok((jar, ApiResponse::ok(LogoutResponse { success })))
}
