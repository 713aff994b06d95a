//! Configuration management for the authpair server
//!
//! This module handles loading and validating configuration from environment variables,
//! with support for different environments (development, staging, production).

use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const DEV_ACCESS_SECRET: &str = "development-access-secret-change-in-production";
const DEV_REFRESH_SECRET: &str = "development-refresh-secret-change-in-production";

/// Upper bounds on token lifetimes
const MAX_ACCESS_TTL_SECONDS: i64 = 24 * 60 * 60;
const MAX_REFRESH_TTL_DAYS: i64 = 365;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid environment value: {0}")]
    InvalidValue(String),

    #[error("Invalid port number: {0}")]
    InvalidPort(String),
}

/// Application environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "prod" | "production" => Ok(Environment::Production),
            _ => Err(ConfigError::InvalidValue(format!(
                "Invalid environment: '{}'. Expected: dev, staging, or prod",
                s
            ))),
        }
    }
}

impl Environment {
    /// Check if this is a production environment
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    /// Get the environment name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Current environment
    pub environment: Environment,

    /// Listen address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Database connection URL; the in-memory store is used when unset
    pub database_url: Option<String>,

    /// Maximum database connections
    pub db_max_connections: u32,

    /// Deadline for a single user store call
    pub store_timeout: Duration,

    /// CORS allowed origins
    pub cors_allowed_origins: Option<String>,

    /// Log level (RUST_LOG)
    pub log_level: String,

    /// Access token signing secret
    pub jwt_secret: String,

    /// Refresh token signing secret, distinct from `jwt_secret`
    pub jwt_refresh_secret: String,

    /// Access token TTL in seconds (default: 60)
    pub jwt_access_token_ttl_seconds: i64,

    /// Refresh token TTL in days (default: 7)
    pub jwt_refresh_token_ttl_days: i64,

    /// bcrypt work factor
    pub bcrypt_cost: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors)
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .map(|s| s.parse::<Environment>())
            .unwrap_or(Ok(Environment::Development))?;

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let port = env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort("PORT must be a valid number".to_string()))?;

        let database_url = env::var("DATABASE_URL").ok().filter(|s| !s.is_empty());

        let db_max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u32>()
            .unwrap_or(5);

        let store_timeout_ms = env::var("STORE_TIMEOUT_MS")
            .unwrap_or_else(|_| "5000".to_string())
            .parse::<u64>()
            .unwrap_or(5000);

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS").ok();

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        // Production must never fall back to the development secrets
        let (jwt_secret, jwt_refresh_secret) = if environment.is_production() {
            (
                env::var("JWT_SECRET")
                    .map_err(|_| ConfigError::MissingEnvVar("JWT_SECRET".to_string()))?,
                env::var("JWT_REFRESH_SECRET")
                    .map_err(|_| ConfigError::MissingEnvVar("JWT_REFRESH_SECRET".to_string()))?,
            )
        } else {
            (
                env::var("JWT_SECRET").unwrap_or_else(|_| DEV_ACCESS_SECRET.to_string()),
                env::var("JWT_REFRESH_SECRET").unwrap_or_else(|_| DEV_REFRESH_SECRET.to_string()),
            )
        };

        let jwt_access_token_ttl_seconds = env::var("JWT_ACCESS_TOKEN_TTL_SECONDS")
            .unwrap_or_else(|_| "60".to_string())
            .parse::<i64>()
            .unwrap_or(60);

        let jwt_refresh_token_ttl_days = env::var("JWT_REFRESH_TOKEN_TTL_DAYS")
            .unwrap_or_else(|_| "7".to_string())
            .parse::<i64>()
            .unwrap_or(7);

        let bcrypt_cost = env::var("BCRYPT_COST")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()
            .map_err(|_| ConfigError::InvalidValue("BCRYPT_COST must be a number".to_string()))?;

        let config = Config {
            environment,
            host,
            port,
            database_url,
            db_max_connections,
            store_timeout: Duration::from_millis(store_timeout_ms),
            cors_allowed_origins,
            log_level,
            jwt_secret,
            jwt_refresh_secret,
            jwt_access_token_ttl_seconds,
            jwt_refresh_token_ttl_days,
            bcrypt_cost,
        };
        config.validate()?;

        Ok(config)
    }

    /// Check invariants that span several settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.is_empty() || self.jwt_refresh_secret.is_empty() {
            return Err(ConfigError::InvalidValue(
                "JWT secrets must not be empty".to_string(),
            ));
        }

        if self.jwt_secret == self.jwt_refresh_secret {
            return Err(ConfigError::InvalidValue(
                "JWT_SECRET and JWT_REFRESH_SECRET must differ".to_string(),
            ));
        }

        if !(4..=31).contains(&self.bcrypt_cost) {
            return Err(ConfigError::InvalidValue(format!(
                "BCRYPT_COST must be between 4 and 31, got {}",
                self.bcrypt_cost
            )));
        }

        if !(1..=MAX_ACCESS_TTL_SECONDS).contains(&self.jwt_access_token_ttl_seconds) {
            return Err(ConfigError::InvalidValue(format!(
                "JWT_ACCESS_TOKEN_TTL_SECONDS must be between 1 and {}, got {}",
                MAX_ACCESS_TTL_SECONDS, self.jwt_access_token_ttl_seconds
            )));
        }

        if !(1..=MAX_REFRESH_TTL_DAYS).contains(&self.jwt_refresh_token_ttl_days) {
            return Err(ConfigError::InvalidValue(format!(
                "JWT_REFRESH_TOKEN_TTL_DAYS must be between 1 and {}, got {}",
                MAX_REFRESH_TTL_DAYS, self.jwt_refresh_token_ttl_days
            )));
        }

        Ok(())
    }

    pub fn access_token_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.jwt_access_token_ttl_seconds)
    }

    pub fn refresh_token_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.jwt_refresh_token_ttl_days)
    }

    /// Get database URL with the password masked, for logging
    pub fn database_url_masked(&self) -> Option<String> {
        let url = self.database_url.as_ref()?;

        if let Some(at_pos) = url.find('@') {
            if let Some(colon_pos) = url[..at_pos].rfind(':') {
                let prefix = &url[..colon_pos + 1];
                let suffix = &url[at_pos..];
                return Some(format!("{}****{}", prefix, suffix));
            }
        }
        Some(url.clone())
    }
}
