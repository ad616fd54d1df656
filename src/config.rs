//! Application configuration module
//!
//! Handles loading and validating configuration from environment variables.
//! Settings are built once at startup and handed to the components that need them.

use rand::RngCore;
use serde::Deserialize;
use std::net::Ipv4Addr;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Default token validity window
pub const DEFAULT_TOKEN_TTL_DAYS: i64 = 30;

/// Cookie carrying the auth token
pub const DEFAULT_AUTH_COOKIE: &str = "authToken";

const DEFAULT_LOOKUP_TIMEOUT_MS: u64 = 5_000;

/// Upper bound accepted for `JWT_EXPIRES_IN_DAYS`
pub const MAX_TOKEN_TTL_DAYS: i64 = 3_650;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: Ipv4Addr,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: Ipv4Addr::new(0, 0, 0, 0),
            port: 3000,
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub max_pool_size: usize,
    pub use_tls: bool,
}

/// CORS configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:5173".to_string()],
        }
    }
}

/// Token and guard configuration
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
    pub cookie_name: String,
    /// Upper bound on each store lookup made by the guard
    pub lookup_timeout: Duration,
}

impl AuthConfig {
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: secret.into(),
            token_ttl: chrono::Duration::days(DEFAULT_TOKEN_TTL_DAYS),
            cookie_name: DEFAULT_AUTH_COOKIE.to_string(),
            lookup_timeout: Duration::from_millis(DEFAULT_LOOKUP_TIMEOUT_MS),
        }
    }
}

// Keeps the secret out of logs.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .field("cookie_name", &self.cookie_name)
            .field("lookup_timeout", &self.lookup_timeout)
            .finish()
    }
}

/// Complete application settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    /// `None` runs the service on in-memory stores
    pub database: Option<DatabaseConfig>,
    pub cors: CorsConfig,
    pub auth: AuthConfig,
}

impl Settings {
    /// Load settings from environment variables
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists (ignore errors if file not found)
        let _ = dotenvy::dotenv();

        let server = ServerConfig {
            host: std::env::var("HOST")
                .ok()
                .and_then(|h| h.parse().ok())
                .unwrap_or_else(|| ServerConfig::default().host),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or_else(|| ServerConfig::default().port),
        };

        let database = match std::env::var("DATABASE_URL") {
            Ok(url) => Some(Self::parse_database_url(&url)?),
            Err(_) => None,
        };

        let cors = CorsConfig {
            allowed_origins: std::env::var("ALLOWED_ORIGINS")
                .ok()
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(|| CorsConfig::default().allowed_origins),
        };

        let auth = Self::load_auth(
            std::env::var("JWT_SECRET").ok(),
            std::env::var("JWT_EXPIRES_IN_DAYS").ok(),
            std::env::var("AUTH_COOKIE_NAME").ok(),
            std::env::var("AUTH_LOOKUP_TIMEOUT_MS").ok(),
        )?;

        Ok(Self {
            server,
            database,
            cors,
            auth,
        })
    }

    fn load_auth(
        secret: Option<String>,
        ttl_days: Option<String>,
        cookie_name: Option<String>,
        timeout_ms: Option<String>,
    ) -> Result<AuthConfig, ConfigError> {
        let jwt_secret = match secret.filter(|s| !s.trim().is_empty()) {
            Some(secret) => secret,
            None => {
                warn!("JWT_SECRET not set, generating a per-process secret; tokens will not survive a restart");
                random_secret()
            }
        };

        let mut auth = AuthConfig::with_secret(jwt_secret);

        if let Some(days) = ttl_days {
            let days: i64 = days.trim().parse().map_err(|_| {
                ConfigError::InvalidValue(format!("JWT_EXPIRES_IN_DAYS must be an integer, got {:?}", days))
            })?;
            if !(1..=MAX_TOKEN_TTL_DAYS).contains(&days) {
                return Err(ConfigError::InvalidValue(format!(
                    "JWT_EXPIRES_IN_DAYS must be between 1 and {}, got {}",
                    MAX_TOKEN_TTL_DAYS, days
                )));
            }
            auth.token_ttl = chrono::Duration::try_days(days).ok_or_else(|| {
                ConfigError::InvalidValue(format!("JWT_EXPIRES_IN_DAYS out of range: {}", days))
            })?;
        }

        if let Some(name) = cookie_name.filter(|n| !n.trim().is_empty()) {
            auth.cookie_name = name.trim().to_string();
        }

        if let Some(ms) = timeout_ms {
            let ms: u64 = ms.trim().parse().map_err(|_| {
                ConfigError::InvalidValue(format!("AUTH_LOOKUP_TIMEOUT_MS must be an integer, got {:?}", ms))
            })?;
            auth.lookup_timeout = Duration::from_millis(ms);
        }

        Ok(auth)
    }

    /// Parse a DATABASE_URL connection string (postgresql://...)
    fn parse_database_url(url: &str) -> Result<DatabaseConfig, ConfigError> {
        let parsed = url::Url::parse(url).map_err(|_| {
            ConfigError::InvalidValue(
                "Invalid DATABASE_URL format (expected postgresql://...)".to_string(),
            )
        })?;

        let host = parsed
            .host_str()
            .ok_or_else(|| ConfigError::InvalidValue("Missing host in DATABASE_URL".to_string()))?
            .to_string();

        let use_tls = host.contains("neon.tech")
            || parsed
                .query_pairs()
                .any(|(k, v)| k == "sslmode" && v == "require");

        Ok(DatabaseConfig {
            port: parsed.port().unwrap_or(5432),
            user: parsed.username().to_string(),
            password: parsed.password().map(|p| p.to_string()).unwrap_or_default(),
            database: parsed.path().trim_start_matches('/').to_string(),
            max_pool_size: std::env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            host,
            use_tls,
        })
    }
}

fn random_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
