//! Session guard
//!
//! Admission check run on every protected request. The access token from the
//! `Authorization` header and the refresh token from the session cookie must
//! both verify, name the same subject, and the refresh token must match the
//! hash currently stored for that user.

use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use super::jwt::Claims;
use super::service::CredentialService;

/// Message returned for every failure after the refresh token was presented
pub const GENERIC_SESSION_REJECTION: &str = "invalid or expired session";

/// Progress of a request through the guard. A rejection records the last
/// stage reached before the failing check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardStage {
    Start,
    AccessVerified,
    RefreshPresent,
    RefreshVerified,
    SubjectsMatch,
    UserLoaded,
    HashMatch,
    Admitted,
}

impl fmt::Display for GuardStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GuardStage::Start => "start",
            GuardStage::AccessVerified => "access_verified",
            GuardStage::RefreshPresent => "refresh_present",
            GuardStage::RefreshVerified => "refresh_verified",
            GuardStage::SubjectsMatch => "subjects_match",
            GuardStage::UserLoaded => "user_loaded",
            GuardStage::HashMatch => "hash_match",
            GuardStage::Admitted => "admitted",
        };
        f.write_str(name)
    }
}

/// Why a request was refused. Always maps to 401.
#[derive(Error, Debug)]
#[error("{reason}")]
pub struct GuardRejection {
    pub stage: GuardStage,
    pub reason: &'static str,
    pub cause: Option<String>,
}

impl GuardRejection {
    fn new(stage: GuardStage, reason: &'static str) -> Self {
        Self {
            stage,
            reason,
            cause: None,
        }
    }

    fn with_cause(mut self, cause: impl fmt::Display) -> Self {
        self.cause = Some(cause.to_string());
        self
    }

    /// Message safe to send to the client.
    ///
    /// The first three checks only concern what the client sent. Failures
    /// past that point share one message.
    pub fn public_message(&self) -> &'static str {
        match self.stage {
            GuardStage::Start | GuardStage::AccessVerified | GuardStage::RefreshPresent => {
                self.reason
            }
            _ => GENERIC_SESSION_REJECTION,
        }
    }
}

/// Identity attached to an admitted request
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub user_id: Uuid,
    pub email: String,
    /// Claims of the presented access token
    pub claims: Claims,
}

/// Session guard
pub struct SessionGuard {
    credentials: Arc<CredentialService>,
}

impl SessionGuard {
    pub fn new(credentials: Arc<CredentialService>) -> Self {
        Self { credentials }
    }

    /// Run every admission check in order; the first failure wins
    pub async fn admit(
        &self,
        access_token: Option<&str>,
        refresh_token: Option<&str>,
    ) -> Result<SessionContext, GuardRejection> {
        let result = self.check(access_token, refresh_token).await;

        match &result {
            Ok(session) => {
                tracing::debug!(user_id = %session.user_id, "Session admitted");
            }
            Err(rejection) => {
                tracing::warn!(
                    stage = %rejection.stage,
                    reason = rejection.reason,
                    cause = rejection.cause.as_deref().unwrap_or("-"),
                    "Session rejected"
                );
            }
        }

        result
    }

    async fn check(
        &self,
        access_token: Option<&str>,
        refresh_token: Option<&str>,
    ) -> Result<SessionContext, GuardRejection> {
        let access_token = access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| GuardRejection::new(GuardStage::Start, "authentication required"))?;

        let access = self
            .credentials
            .verify_access_token(access_token)
            .map_err(|e| {
                GuardRejection::new(GuardStage::Start, "invalid access token").with_cause(e)
            })?;

        let refresh_token = refresh_token.filter(|t| !t.is_empty()).ok_or_else(|| {
            GuardRejection::new(GuardStage::AccessVerified, "session expired")
        })?;

        let refresh = self
            .credentials
            .decode_refresh_token(refresh_token)
            .map_err(|e| {
                GuardRejection::new(GuardStage::RefreshPresent, "invalid or expired session")
                    .with_cause(e)
            })?;

        if access.sub != refresh.sub {
            return Err(
                GuardRejection::new(GuardStage::RefreshVerified, "invalid session").with_cause(
                    format!("access subject {} != refresh subject {}", access.sub, refresh.sub),
                ),
            );
        }

        let user_id = access.user_id().map_err(|e| {
            GuardRejection::new(GuardStage::SubjectsMatch, "session revoked or expired")
                .with_cause(e)
        })?;

        let user = match self.credentials.find_user(user_id).await {
            Ok(user) => user,
            Err(e) => {
                tracing::error!(user_id = %user_id, error = %e, "User lookup failed in session guard");
                return Err(GuardRejection::new(
                    GuardStage::SubjectsMatch,
                    "session revoked or expired",
                )
                .with_cause(e));
            }
        };

        let stored_hash = user
            .as_ref()
            .and_then(|u| u.refresh_token_hash.as_deref())
            .ok_or_else(|| {
                GuardRejection::new(GuardStage::SubjectsMatch, "session revoked or expired")
                    .with_cause("no user or no stored refresh hash")
            })?;

        match self
            .credentials
            .refresh_token_matches(refresh_token, stored_hash)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                return Err(GuardRejection::new(
                    GuardStage::UserLoaded,
                    "session revoked or invalid",
                )
                .with_cause("refresh token does not match stored hash"));
            }
            Err(e) => {
                tracing::error!(user_id = %user_id, error = %e, "Refresh hash check failed in session guard");
                return Err(GuardRejection::new(
                    GuardStage::UserLoaded,
                    "session revoked or invalid",
                )
                .with_cause(e));
            }
        }

        Ok(SessionContext {
            user_id,
            email: access.email.clone(),
            claims: access,
        })
    }
}
