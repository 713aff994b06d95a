//! Credential service
//!
//! Registration, login, refresh and logout. Each user has at most one live
//! refresh token, and only its hash is stored. Issuing a new pair overwrites
//! that hash; logout clears it.
//!
//! Logout revokes the refresh chain only. An access token issued before logout
//! stays valid until its own `exp`, which is bounded by the access TTL
//! (60 seconds by default).

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::OnceCell;
use uuid::Uuid;

use super::hasher::{HashError, SecretHasher};
use super::jwt::{Claims, JwtError, TokenCodec, TokenPair};
use crate::models::User;
use crate::store::{StoreError, UserStore};

pub const INVALID_CREDENTIALS: &str = "invalid credentials";
pub const ACCESS_DENIED: &str = "access denied";
pub const INVALID_REFRESH_TOKEN: &str = "invalid refresh token";
pub const INVALID_ACCESS_TOKEN: &str = "invalid or expired access token";

/// Secret hashed once to give unknown-email logins a hash to verify against
const DUMMY_SECRET: &str = "authpair-unknown-user";

/// Auth service errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Email already exists")]
    EmailTaken,

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Hashing error: {0}")]
    Hashing(#[from] HashError),

    #[error("Token error: {0}")]
    Token(#[from] JwtError),
}

/// Credential service
pub struct CredentialService {
    store: Arc<dyn UserStore>,
    hasher: Arc<dyn SecretHasher>,
    codec: Arc<TokenCodec>,
    dummy_hash: OnceCell<String>,
}

impl CredentialService {
    /// Create a new CredentialService
    pub fn new(
        store: Arc<dyn UserStore>,
        hasher: Arc<dyn SecretHasher>,
        codec: Arc<TokenCodec>,
    ) -> Self {
        Self {
            store,
            hasher,
            codec,
            dummy_hash: OnceCell::new(),
        }
    }

    /// Create an account and open its first session.
    ///
    /// The account is persisted before the session is opened. If opening the
    /// session fails, the account stays without a live refresh token and a
    /// later `login` opens the session.
    pub async fn register(&self, email: &str, password: &str) -> Result<TokenPair, AuthError> {
        if self.store.find_by_email(email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = self.hasher.hash(password).await?;

        // A concurrent registration can still win the race at the store
        let user = self
            .store
            .create(email, &password_hash)
            .await
            .map_err(|e| match e {
                StoreError::UniqueViolation => AuthError::EmailTaken,
                other => AuthError::Store(other),
            })?;

        let tokens = self.open_session(&user).await?;
        tracing::info!(user_id = %user.id, "User registered");

        Ok(tokens)
    }

    /// Check credentials and open a new session, replacing any previous one
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AuthError> {
        let user = match self.store.find_by_email(email).await? {
            Some(user) => user,
            None => {
                // Same hashing work as a wrong password
                let dummy_hash = self
                    .dummy_hash
                    .get_or_try_init(|| self.hasher.hash(DUMMY_SECRET))
                    .await?;
                self.hasher.verify(password, dummy_hash).await?;

                tracing::warn!("Login failed: unknown email");
                return Err(AuthError::Unauthorized(INVALID_CREDENTIALS));
            }
        };

        if !self.hasher.verify(password, &user.password_hash).await? {
            tracing::warn!(user_id = %user.id, "Login failed: wrong password");
            return Err(AuthError::Unauthorized(INVALID_CREDENTIALS));
        }

        let tokens = self.open_session(&user).await?;
        tracing::info!(user_id = %user.id, "User logged in");

        Ok(tokens)
    }

    /// Exchange the presented refresh token for a new pair.
    ///
    /// The stored hash is replaced by the new refresh token's hash, so the
    /// presented token stops working once this returns.
    pub async fn refresh(
        &self,
        user_id: Uuid,
        presented_refresh_token: &str,
    ) -> Result<TokenPair, AuthError> {
        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::Unauthorized(ACCESS_DENIED))?;

        let stored_hash = user
            .refresh_token_hash
            .as_deref()
            .ok_or(AuthError::Unauthorized(ACCESS_DENIED))?;

        if !self
            .refresh_token_matches(presented_refresh_token, stored_hash)
            .await?
        {
            tracing::warn!(user_id = %user.id, "Refresh rejected: token does not match stored hash");
            return Err(AuthError::Unauthorized(ACCESS_DENIED));
        }

        let tokens = self.open_session(&user).await?;
        tracing::info!(user_id = %user.id, "Session refreshed");

        Ok(tokens)
    }

    /// Revoke the user's refresh chain. Idempotent.
    pub async fn logout(&self, user_id: Uuid) -> Result<bool, AuthError> {
        self.store.update_refresh_hash(user_id, None).await?;
        tracing::info!(user_id = %user_id, "User logged out");
        Ok(true)
    }

    /// Verify a refresh token's signature and expiry
    pub fn decode_refresh_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.codec.verify_refresh(token).map_err(|e| {
            tracing::warn!(error = %e, "Refresh token rejected");
            AuthError::Unauthorized(INVALID_REFRESH_TOKEN)
        })
    }

    /// Verify an access token's signature and expiry
    pub fn verify_access_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.codec.verify_access(token).map_err(|e| {
            tracing::warn!(error = %e, "Access token rejected");
            AuthError::Unauthorized(INVALID_ACCESS_TOKEN)
        })
    }

    pub async fn find_user(&self, user_id: Uuid) -> Result<Option<User>, AuthError> {
        Ok(self.store.find_by_id(user_id).await?)
    }

    /// Compare a presented refresh token with a stored hash
    pub async fn refresh_token_matches(
        &self,
        presented: &str,
        stored_hash: &str,
    ) -> Result<bool, AuthError> {
        Ok(self.hasher.verify(presented, stored_hash).await?)
    }

    /// Refresh token lifetime, used for the cookie max-age
    pub fn refresh_ttl(&self) -> chrono::Duration {
        self.codec.refresh_ttl()
    }

    /// Issue a pair and make its refresh token the only live one
    async fn open_session(&self, user: &User) -> Result<TokenPair, AuthError> {
        let tokens = self.codec.issue_pair(user.id, &user.email)?;
        let refresh_hash = self.hasher.hash(&tokens.refresh_token).await?;
        self.store
            .update_refresh_hash(user.id, Some(&refresh_hash))
            .await?;

        Ok(tokens)
    }
}
