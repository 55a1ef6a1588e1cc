//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section. Configuration is loaded once at startup and immutable
//! thereafter; components receive their section by value at construction.

pub mod logging;
pub mod rate_limit;
pub mod security;
pub mod session;
pub mod token;

use serde::{Deserialize, Serialize};

use self::logging::LoggingConfig;
use self::rate_limit::RateLimitConfig;
use self::security::SecurityConfig;
use self::session::SessionConfig;
use self::token::TokenConfig;

use crate::error::AuthError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Database connection settings.
    pub database: DatabaseConfig,
    /// Token signing and rotation settings.
    #[serde(default)]
    pub token: TokenConfig,
    /// Session lifecycle and limit settings.
    #[serde(default)]
    pub session: SessionConfig,
    /// Sliding-window rate limiting settings.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Lockout and risk-response settings.
    #[serde(default)]
    pub security: SecurityConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database connection pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `KEYSTONE`.
    pub fn load(env: &str) -> Result<Self, AuthError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("KEYSTONE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AuthError::Configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AuthError::Configuration(format!("Failed to deserialize config: {e}")))
    }
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

fn default_connect_timeout() -> u64 {
    10
}
