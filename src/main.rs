//! authpair server
//!
//! Serves the register/login/refresh/logout API and the guarded routes on top
//! of the credential core.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;

use authpair_server::auth::{BcryptHasher, CredentialService, RefreshCookie, TokenCodec};
use authpair_server::config::Config;
use authpair_server::db;
use authpair_server::routes::create_router;
use authpair_server::state::AppState;
use authpair_server::store::{InMemoryUserStore, PgUserStore, TimedUserStore, UserStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!(environment = config.environment.as_str(), "Starting authpair server");

    let backend: Arc<dyn UserStore> = match &config.database_url {
        Some(database_url) => {
            let masked = config.database_url_masked().unwrap_or_default();
            let pool = db::create_pool(database_url, &masked, config.db_max_connections)
                .await
                .context("Failed to connect to database")?;
            db::run_migrations(&pool)
                .await
                .context("Failed to run migrations")?;
            Arc::new(PgUserStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory user store");
            Arc::new(InMemoryUserStore::new())
        }
    };
    let user_store: Arc<dyn UserStore> =
        Arc::new(TimedUserStore::new(backend, config.store_timeout));

    // Keys are read once here and never change afterwards
    let codec = Arc::new(TokenCodec::new(
        &config.jwt_secret,
        &config.jwt_refresh_secret,
        config.access_token_ttl(),
        config.refresh_token_ttl(),
    ));

    let credential_service = Arc::new(CredentialService::new(
        user_store.clone(),
        Arc::new(BcryptHasher::new(config.bcrypt_cost)),
        codec,
    ));

    let refresh_cookie = RefreshCookie::new(
        config.environment.is_production(),
        config.refresh_token_ttl(),
    );

    let app_state = AppState::new(credential_service, user_store, refresh_cookie);
    let app = create_router(app_state, config.cors_allowed_origins.as_deref());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid HOST/PORT")?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check at http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shutdown complete");

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
