//! Middleware for the authpair server
//!
//! This module provides middleware for request tracing, security headers,
//! and authentication.

pub mod auth;
mod security;
mod tracing;

pub use auth::AuthenticatedUser;
pub use security::security_headers;
pub use self::tracing::request_tracing;
