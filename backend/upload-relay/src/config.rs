//! Relay configuration loaded from environment variables.

use crate::errors::{RelayError, Result};

#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the HTTP server
    pub port: u16,
    /// Pinata API key
    pub pinata_api_key: String,
    /// Pinata API secret
    pub pinata_secret_api_key: String,
    /// Pinata REST base URL (e.g. https://api.pinata.cloud)
    pub pinata_api_url: String,
    /// Allowed browser origin; `*` allows any
    pub cors_origin: String,
    /// Largest accepted request body, in megabytes
    pub max_upload_mb: usize,
    /// Timeout for outbound calls to Pinata
    pub request_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            port: env_var("PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .map_err(|_| RelayError::Config("Invalid PORT".to_string()))?,
            pinata_api_key: env_var("PINATA_API_KEY").map_err(|_| {
                RelayError::Config("PINATA_API_KEY environment variable is required".to_string())
            })?,
            pinata_secret_api_key: env_var("PINATA_SECRET_API_KEY").map_err(|_| {
                RelayError::Config(
                    "PINATA_SECRET_API_KEY environment variable is required".to_string(),
                )
            })?,
            pinata_api_url: env_var("PINATA_API_URL")
                .unwrap_or_else(|_| "https://api.pinata.cloud".to_string()),
            cors_origin: env_var("CORS_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            max_upload_mb: env_var("MAX_UPLOAD_MB")
                .unwrap_or_else(|_| "100".to_string())
                .parse()
                .map_err(|_| RelayError::Config("Invalid MAX_UPLOAD_MB".to_string()))?,
            request_timeout_secs: env_var("REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .map_err(|_| RelayError::Config("Invalid REQUEST_TIMEOUT_SECS".to_string()))?,
        })
    }

    /// `max_upload_mb` in bytes.
    pub fn max_body_bytes(&self) -> Result<usize> {
        self.max_upload_mb
            .checked_mul(1024 * 1024)
            .ok_or_else(|| RelayError::Config("MAX_UPLOAD_MB is too large".to_string()))
    }
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| RelayError::Config(format!("Missing env var: {key}")))
}
