//! Postgres user store

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use super::{StoreError, UserStore};
use crate::db;
use crate::models::User;

/// User store backed by the `users` table
#[derive(Clone)]
pub struct PgUserStore {
    db_pool: PgPool,
}

impl PgUserStore {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as(
            r#"
            SELECT id, email, password_hash, refresh_token_hash, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as(
            r#"
            SELECT id, email, password_hash, refresh_token_hash, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(user)
    }

    async fn create(&self, email: &str, password_hash: &str) -> Result<User, StoreError> {
        let user_id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user_id)
        .bind(email)
        .bind(password_hash)
        .bind(now)
        .bind(now)
        .execute(&self.db_pool)
        .await?;

        Ok(User {
            id: user_id,
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            refresh_token_hash: None,
            created_at: now,
            updated_at: now,
        })
    }

    async fn update_refresh_hash(&self, id: Uuid, hash: Option<&str>) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE users
            SET refresh_token_hash = $1, updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(hash)
        .bind(id)
        .execute(&self.db_pool)
        .await?;

        Ok(())
    }

    async fn health(&self) -> Result<(), StoreError> {
        db::check_health(&self.db_pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))
    }
}
