//! Authentication for the authpair server
//!
//! Paired access/refresh credentials:
//! - Access and refresh JWTs signed with independent keys
//! - Passwords and refresh tokens stored only as one-way hashes
//! - A session guard that checks both tokens on every protected request

mod cookie;
mod guard;
mod hasher;
mod jwt;
mod service;

pub use cookie::{refresh_token_from, RefreshCookie, REFRESH_COOKIE_NAME};
pub use guard::{
    GuardRejection, GuardStage, SessionContext, SessionGuard, GENERIC_SESSION_REJECTION,
};
pub use hasher::{BcryptHasher, HashError, SecretHasher};
pub use jwt::{sign, verify, Claims, JwtError, TokenCodec, TokenKey, TokenPair};
pub use service::{
    AuthError, CredentialService, ACCESS_DENIED, INVALID_ACCESS_TOKEN, INVALID_CREDENTIALS,
    INVALID_REFRESH_TOKEN,
};
