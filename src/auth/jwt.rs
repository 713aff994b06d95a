//! JWT token generation and validation
//!
//! Access and refresh tokens are signed with two independent HMAC keys and
//! carry the same minimal claim set. Access tokens are short-lived and cannot
//! be revoked; refresh tokens are long-lived and revocable through the hash
//! kept by the user store.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// JWT-related errors
#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Token encoding failed: {0}")]
    EncodingFailed(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    TokenInvalid(String),
}

/// Claims carried by both token kinds
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    pub email: String,
    /// Token ID, unique per issued token
    pub jti: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Build claims that expire `ttl` from now. Fails if the expiry is not
    /// a representable timestamp.
    pub fn new(user_id: Uuid, email: &str, ttl: Duration) -> Result<Self, JwtError> {
        let now = Utc::now();
        let exp = now.checked_add_signed(ttl).ok_or_else(|| {
            JwtError::EncodingFailed(format!("token lifetime out of range: {}", ttl))
        })?;

        Ok(Self {
            sub: user_id.to_string(),
            email: email.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        })
    }

    /// Extract user ID from the subject
    pub fn user_id(&self) -> Result<Uuid, JwtError> {
        Uuid::parse_str(&self.sub).map_err(|e| JwtError::TokenInvalid(e.to_string()))
    }
}

/// One HMAC signing key
pub struct TokenKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenKey {
    pub fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// Sign claims under `key`
pub fn sign(claims: &Claims, key: &TokenKey) -> Result<String, JwtError> {
    encode(&Header::new(Algorithm::HS256), claims, &key.encoding)
        .map_err(|e| JwtError::EncodingFailed(e.to_string()))
}

/// Verify and decode a token signed under `key`
///
/// # Returns
/// * `Ok(Claims)` if the signature matches and `exp` has not passed
/// * `Err(JwtError::TokenExpired)` once `exp` is in the past
/// * `Err(JwtError::TokenInvalid)` for anything else
pub fn verify(token: &str, key: &TokenKey) -> Result<Claims, JwtError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.leeway = 0;

    let token_data = decode::<Claims>(token, &key.decoding, &validation).map_err(|e| {
        match e.kind() {
            ErrorKind::ExpiredSignature => JwtError::TokenExpired,
            _ => JwtError::TokenInvalid(e.to_string()),
        }
    })?;

    Ok(token_data.claims)
}

/// A freshly issued access/refresh pair
#[derive(Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// Holds both signing keys and lifetimes. Built once at startup and shared
/// read-only between requests.
pub struct TokenCodec {
    access_key: TokenKey,
    refresh_key: TokenKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenCodec {
    pub fn new(
        access_secret: &str,
        refresh_secret: &str,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            access_key: TokenKey::from_secret(access_secret),
            refresh_key: TokenKey::from_secret(refresh_secret),
            access_ttl,
            refresh_ttl,
        }
    }

    /// Sign a new access token and a new refresh token for the same subject.
    /// Either both are returned or neither.
    pub fn issue_pair(&self, user_id: Uuid, email: &str) -> Result<TokenPair, JwtError> {
        let access_token = sign(&Claims::new(user_id, email, self.access_ttl)?, &self.access_key)?;
        let refresh_token =
            sign(&Claims::new(user_id, email, self.refresh_ttl)?, &self.refresh_key)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    pub fn verify_access(&self, token: &str) -> Result<Claims, JwtError> {
        verify(token, &self.access_key)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<Claims, JwtError> {
        verify(token, &self.refresh_key)
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }
}
