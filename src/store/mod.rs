//! User persistence
//!
//! The credential core only talks to storage through the [`UserStore`] trait.
//! Two backends ship with the server: Postgres via sqlx and an in-memory map
//! used for local development and tests. Every backend is wrapped in a
//! [`TimedUserStore`] at startup so that no store call can hang a request.

mod memory;
mod postgres;

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::models::User;

pub use memory::InMemoryUserStore;
pub use postgres::PgUserStore;

/// Store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Email already exists")]
    UniqueViolation,

    #[error("Store call timed out after {0:?}")]
    Timeout(Duration),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::UniqueViolation,
            _ => StoreError::Database(e.to_string()),
        }
    }
}

/// Durable user records, keyed by id and by email
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Persist a new user. Fails with [`StoreError::UniqueViolation`] if the
    /// email is taken.
    async fn create(&self, email: &str, password_hash: &str) -> Result<User, StoreError>;

    /// Overwrite the user's refresh-token hash. `None` revokes the session.
    async fn update_refresh_hash(&self, id: Uuid, hash: Option<&str>) -> Result<(), StoreError>;

    /// Connectivity probe for the health endpoint
    async fn health(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Applies a per-call deadline to another store.
///
/// Calls are never retried; a timeout is returned to the caller as
/// [`StoreError::Timeout`].
pub struct TimedUserStore {
    inner: Arc<dyn UserStore>,
    timeout: Duration,
}

impl TimedUserStore {
    pub fn new(inner: Arc<dyn UserStore>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    async fn timed<T, F>(&self, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>> + Send,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(timeout_ms = %self.timeout.as_millis(), "User store call timed out");
                Err(StoreError::Timeout(self.timeout))
            }
        }
    }
}

#[async_trait]
impl UserStore for TimedUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.timed(self.inner.find_by_email(email)).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        self.timed(self.inner.find_by_id(id)).await
    }

    async fn create(&self, email: &str, password_hash: &str) -> Result<User, StoreError> {
        self.timed(self.inner.create(email, password_hash)).await
    }

    async fn update_refresh_hash(&self, id: Uuid, hash: Option<&str>) -> Result<(), StoreError> {
        self.timed(self.inner.update_refresh_hash(id, hash)).await
    }

    async fn health(&self) -> Result<(), StoreError> {
        self.timed(self.inner.health()).await
    }
}
