//! User-related API handlers

use crate::middleware::AuthenticatedUser;
use crate::models::{ApiResponse, ProtectedResponse};

/// POST /api/users/test - Probe route that only admitted sessions reach
pub async fn protected_probe(user: AuthenticatedUser) -> ApiResponse<ProtectedResponse> {
    ApiResponse::ok(ProtectedResponse {
        message: "protected route accessible".to_string(),
        user_id: user.user_id,
        email: user.email,
    })
}
