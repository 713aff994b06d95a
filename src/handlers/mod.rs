//! API handlers for the authpair server

pub mod auth;
pub mod health;
pub mod user;

pub use health::health_check;

// Re-export AuthenticatedUser from middleware for handler use
pub use crate::middleware::auth::AuthenticatedUser;
