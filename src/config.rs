//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to automatically deserialize environment variables into a type-safe struct.

use serde::Deserialize;
use std::time::Duration;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (required): PostgreSQL connection string
/// - `REDIS_URL` (required): Redis connection string
/// - `TRADELAB_BASE_URL` (required): TradeLab API base URL
/// - `TRADELAB_API_TOKEN` (required): bearer token sent to TradeLab
/// - `INTERNAL_API_KEY_HASH` (required): SHA-256 hex digest of the internal API key
/// - `OTP_SECRET` (required): HMAC key used to digest OTPs before caching
/// - `NOTIFICATION_BASE_URL` (required): email/SMS publisher base URL
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `HTTP_TIMEOUT_SECS` (optional): vendor request timeout, defaults to 10
/// - `*_CACHE_TTL_SECS`, `OTP_TTL_SECS` (optional): cache lifetimes
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub tradelab_base_url: String,
    pub tradelab_api_token: String,
    pub internal_api_key_hash: String,
    pub otp_secret: String,
    pub notification_base_url: String,

    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    #[serde(default = "default_funds_ttl")]
    pub funds_cache_ttl_secs: u64,

    #[serde(default = "default_ipo_ttl")]
    pub ipo_cache_ttl_secs: u64,

    #[serde(default = "default_ipo_orders_ttl")]
    pub ipo_orders_cache_ttl_secs: u64,

    #[serde(default = "default_profile_ttl")]
    pub profile_cache_ttl_secs: u64,

    #[serde(default = "default_otp_ttl")]
    pub otp_ttl_secs: u64,
}

/// Default port if SERVER_PORT environment variable is not set.
fn default_port() -> u16 {
    3000
}

fn default_http_timeout() -> u64 {
    10
}

fn default_funds_ttl() -> u64 {
    300
}

fn default_ipo_ttl() -> u64 {
    600
}

fn default_ipo_orders_ttl() -> u64 {
    60
}

fn default_profile_ttl() -> u64 {
    86_400
}

fn default_otp_ttl() -> u64 {
    300
}

/// Configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("environment error: {0}")]
    Env(#[from] envy::Error),

    #[error("{name} is not a valid URL: {source}")]
    InvalidUrl {
        name: &'static str,
        source: url::ParseError,
    },
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing (e.g., DATABASE_URL)
    /// - Environment variable values cannot be parsed into expected types
    /// - A base URL does not parse
    pub fn from_env() -> Result<Self, ConfigError> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        // Field names are automatically converted: redis_url -> REDIS_URL
        let config = envy::from_env::<Config>()?;
        config.validate()?;
        Ok(config)
    }

    /// Check that both outbound base URLs parse.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("TRADELAB_BASE_URL", &self.tradelab_base_url),
            ("NOTIFICATION_BASE_URL", &self.notification_base_url),
        ] {
            url::Url::parse(value).map_err(|source| ConfigError::InvalidUrl { name, source })?;
        }
        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn funds_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.funds_cache_ttl_secs)
    }

    pub fn ipo_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.ipo_cache_ttl_secs)
    }

    pub fn ipo_orders_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.ipo_orders_cache_ttl_secs)
    }

    pub fn profile_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.profile_cache_ttl_secs)
    }

    pub fn otp_ttl(&self) -> Duration {
        Duration::from_secs(self.otp_ttl_secs)
    }
}

#[cfg(test)]
impl Config {
    /// Configuration used by unit tests; nothing here is dialled.
    pub fn for_tests() -> Self {
        use sha2::{Digest, Sha256};

        Self {
            database_url: "postgres://localhost/test".to_string(),
            redis_url: "redis://localhost".to_string(),
            tradelab_base_url: "http://localhost:9000".to_string(),
            tradelab_api_token: "vendor-token".to_string(),
            internal_api_key_hash: hex::encode(Sha256::digest(b"internal-key")),
            otp_secret: "otp-secret".to_string(),
            notification_base_url: "http://localhost:9100".to_string(),
            server_port: default_port(),
            http_timeout_secs: default_http_timeout(),
            funds_cache_ttl_secs: default_funds_ttl(),
            ipo_cache_ttl_secs: default_ipo_ttl(),
            ipo_orders_cache_ttl_secs: default_ipo_orders_ttl(),
            profile_cache_ttl_secs: default_profile_ttl(),
            otp_ttl_secs: default_otp_ttl(),
        }
    }
}
