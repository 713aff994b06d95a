//! Postgres user store tests

#[cfg(test)]
mod tests {
    use sqlx::PgPool;
    use uuid::Uuid;

    use authpair_server::db;
    use authpair_server::store::{PgUserStore, StoreError, UserStore};

    /// Helper to create a migrated test database pool
    async fn setup_test_db() -> PgPool {
        let database_url = std::env::var("TEST_DATABASE_URL")
            .unwrap_or_else(|_| "postgresql://localhost/authpair_test".to_string());

        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(1)
            .connect(&database_url)
            .await
            .expect("Failed to connect to test database");

        db::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        pool
    }

    fn unique_email() -> String {
        format!("{}@test.local", Uuid::new_v4())
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_create_and_find() {
        let store = PgUserStore::new(setup_test_db().await);
        let email = unique_email();

        let created = store.create(&email, "hash").await.unwrap();
        assert!(created.refresh_token_hash.is_none());

        let by_email = store.find_by_email(&email).await.unwrap().unwrap();
        assert_eq!(by_email.id, created.id);

        let by_id = store.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, email);

        assert!(store.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_duplicate_email_is_unique_violation() {
        let store = PgUserStore::new(setup_test_db().await);
        let email = unique_email();

        store.create(&email, "hash").await.unwrap();
        let err = store.create(&email, "other").await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation));
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_update_and_clear_refresh_hash() {
        let store = PgUserStore::new(setup_test_db().await);
        let user = store.create(&unique_email(), "hash").await.unwrap();

        store.update_refresh_hash(user.id, Some("rt-hash")).await.unwrap();
        let loaded = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(loaded.refresh_token_hash.as_deref(), Some("rt-hash"));

        store.update_refresh_hash(user.id, None).await.unwrap();
        let loaded = store.find_by_id(user.id).await.unwrap().unwrap();
        assert!(loaded.refresh_token_hash.is_none());

        store.health().await.unwrap();
    }
}
