//! Client-wide error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("No wallet provider detected. Please install a browser wallet.")]
    WalletUnavailable,

    #[error("Wallet request rejected: {0}")]
    WalletRejected(String),

    #[error("Contract is not initialized. Please connect your wallet.")]
    ContractUninitialized,

    #[error("Wrong network: contract is deployed on chain {expected}, wallet is on chain {actual}")]
    NetworkMismatch { expected: u64, actual: u64 },

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Upload relay returned {status}: {message}")]
    Upload { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("ABI error: {0}")]
    Abi(#[from] alloy_sol_types::Error),

    #[error("{0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl ClientError {
    /// Text suitable for a transient user-facing notification.
    pub fn user_message(&self) -> String {
        match self {
            Self::Upload { message, .. } => message.clone(),
            Self::Validation(msg) => msg.clone(),
            Self::Http(e) => format!("Network error: {e}"),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
