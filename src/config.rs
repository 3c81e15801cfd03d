// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

use crate::services::accesslink::PolarUrls;

/// Path the OAuth redirect lands on.
pub const AUTH_CALLBACK_PATH: &str = "/auth/polar/callback";

/// Refresh interval used when `SCAN_INTERVAL_MINUTES` is not set.
pub const DEFAULT_SCAN_INTERVAL_MINUTES: u64 = 30;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Polar AccessLink client ID
    pub polar_client_id: String,
    /// Polar AccessLink client secret
    pub polar_client_secret: String,
    /// Externally reachable base URL of this service (for the OAuth redirect)
    pub external_url: String,
    /// Directory holding the fallback cache and linked-account files
    pub storage_dir: PathBuf,
    /// Integration instance identifier, used to key local files
    pub entry_id: String,
    /// Minutes between refresh cycles
    pub scan_interval_minutes: u64,
    /// Server port
    pub port: u16,
    /// HMAC key for signing the OAuth state parameter (raw bytes)
    pub oauth_state_key: Vec<u8>,
    /// AccessLink endpoints (overridable for staging and tests)
    pub polar_urls: PolarUrls,
}

impl Config {
    /// Fixed configuration for tests.
    pub fn test_default() -> Self {
        Self {
            polar_client_id: "test_client_id".to_string(),
            polar_client_secret: "test_secret".to_string(),
            external_url: "http://localhost:8080".to_string(),
            storage_dir: PathBuf::from(".storage"),
            entry_id: "test-entry".to_string(),
            scan_interval_minutes: DEFAULT_SCAN_INTERVAL_MINUTES,
            port: 8080,
            oauth_state_key: b"test_state_key_32_bytes_minimum!".to_vec(),
            polar_urls: PolarUrls::default(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is honored for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let defaults = PolarUrls::default();

        Ok(Self {
            polar_client_id: required("POLAR_CLIENT_ID")?,
            polar_client_secret: required("POLAR_CLIENT_SECRET")?,
            external_url: env::var("EXTERNAL_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            storage_dir: env::var("STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".storage")),
            entry_id: env::var("ENTRY_ID").unwrap_or_else(|_| "default".to_string()),
            scan_interval_minutes: parse_or("SCAN_INTERVAL_MINUTES", DEFAULT_SCAN_INTERVAL_MINUTES)?,
            port: parse_or("PORT", 8080)?,
            oauth_state_key: required("OAUTH_STATE_KEY")?.into_bytes(),
            polar_urls: PolarUrls {
                api: env::var("POLAR_API_URL").unwrap_or(defaults.api),
                authorization: env::var("POLAR_AUTHORIZATION_URL")
                    .unwrap_or(defaults.authorization),
                token: env::var("POLAR_TOKEN_URL").unwrap_or(defaults.token),
            },
        })
    }

    /// Redirect URI registered with Polar for this instance.
    pub fn callback_url(&self) -> String {
        if self.external_url.ends_with(AUTH_CALLBACK_PATH) {
            return self.external_url.clone();
        }
        format!(
            "{}{}",
            self.external_url.trim_end_matches('/'),
            AUTH_CALLBACK_PATH
        )
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .map(|v| v.trim().to_string())
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn parse_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
