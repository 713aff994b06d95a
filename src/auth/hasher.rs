//! One-way hashing for passwords and refresh tokens

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Hashing errors
#[derive(Error, Debug)]
pub enum HashError {
    #[error("Hashing failed: {0}")]
    Hashing(String),

    #[error("Hash verification failed: {0}")]
    Verify(String),

    #[error("Hashing task failed: {0}")]
    Task(String),
}

/// One-way hash and verify for arbitrary secrets
#[async_trait]
pub trait SecretHasher: Send + Sync {
    async fn hash(&self, secret: &str) -> Result<String, HashError>;

    /// `Ok(false)` on mismatch; `Err` only when the stored hash is unusable
    async fn verify(&self, secret: &str, hash: &str) -> Result<bool, HashError>;
}

/// bcrypt-backed hasher.
///
/// bcrypt only reads the first 72 bytes of its input, and two JWTs for the
/// same user share a much longer prefix, so every secret is first reduced to
/// its hex SHA-256 digest (64 bytes).
#[derive(Debug, Clone)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

#[async_trait]
impl SecretHasher for BcryptHasher {
    async fn hash(&self, secret: &str) -> Result<String, HashError> {
        let digest = prehash(secret);
        let cost = self.cost;

        tokio::task::spawn_blocking(move || bcrypt::hash(digest, cost))
            .await
            .map_err(|e| HashError::Task(e.to_string()))?
            .map_err(|e| HashError::Hashing(e.to_string()))
    }

    async fn verify(&self, secret: &str, hash: &str) -> Result<bool, HashError> {
        let digest = prehash(secret);
        let hash = hash.to_string();

        tokio::task::spawn_blocking(move || bcrypt::verify(digest, &hash))
            .await
            .map_err(|e| HashError::Task(e.to_string()))?
            .map_err(|e| HashError::Verify(e.to_string()))
    }
}

fn prehash(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}
