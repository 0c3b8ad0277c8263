//! Client configuration loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use crate::errors::{ClientError, Result};

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the upload relay (e.g. http://localhost:5000)
    pub backend_url: String,
    /// JSON-RPC endpoint of the wallet bridge / node
    pub rpc_url: String,
    /// How often to poll `eth_accounts` for account changes
    pub account_poll_interval: Duration,
    /// How often to poll for a transaction receipt while waiting
    pub receipt_poll_interval: Duration,
    /// Where to keep the report cache; in-memory when unset
    pub report_cache_path: Option<PathBuf>,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self> {
        Ok(ClientConfig {
            backend_url: env_var("BACKEND_URL").map_err(|_| {
                ClientError::Config(
                    "Backend URL is not defined. Please check your environment variables."
                        .to_string(),
                )
            })?,
            rpc_url: env_var("RPC_URL").unwrap_or_else(|_| "http://localhost:8545".to_string()),
            account_poll_interval: Duration::from_millis(
                env_var("ACCOUNT_POLL_INTERVAL_MS")
                    .unwrap_or_else(|_| "1000".to_string())
                    .parse()
                    .map_err(|_| ClientError::Config("Invalid ACCOUNT_POLL_INTERVAL_MS".to_string()))?,
            ),
            receipt_poll_interval: Duration::from_millis(
                env_var("RECEIPT_POLL_INTERVAL_MS")
                    .unwrap_or_else(|_| "1000".to_string())
                    .parse()
                    .map_err(|_| ClientError::Config("Invalid RECEIPT_POLL_INTERVAL_MS".to_string()))?,
            ),
            report_cache_path: env_var("REPORT_CACHE_PATH").ok().map(PathBuf::from),
        })
    }
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| ClientError::Config(format!("Missing env var: {key}")))
}
