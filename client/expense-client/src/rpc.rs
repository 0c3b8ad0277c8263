//! JSON-RPC 2.0 transport shared by the wallet provider and the contract.
//!
//! Requests are sent once; failures are returned to the caller as-is.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::errors::{ClientError, Result};

/// EIP-1193 "user rejected the request".
pub const USER_REJECTED: i64 = 4001;

// ─────────────────────────────────────────────────────────
// JSON-RPC response shapes
// ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    pub result: Option<Value>,
    pub error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl From<RpcError> for ClientError {
    fn from(err: RpcError) -> Self {
        if err.code == USER_REJECTED {
            ClientError::WalletRejected(err.message)
        } else {
            ClientError::Upstream(format!("RPC error {}: {}", err.code, err.message))
        }
    }
}

// ─────────────────────────────────────────────────────────
// Client
// ─────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct RpcClient {
    client: Client,
    url: String,
    next_id: Arc<AtomicU64>,
}

impl RpcClient {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Issue a single request and deserialize its `result`.
    ///
    /// A JSON `null` result is handed to `T` as is, so `Option<_>` return
    /// types see `None` rather than an error.
    pub async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(method, id, "JSON-RPC request");

        let resp = self
            .client
            .post(&self.url)
            .json(&json!({
                "jsonrpc": "2.0",
                "id": id,
                "method": method,
                "params": params,
            }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ClientError::Upstream(format!(
                "{method} failed with HTTP {status}"
            )));
        }

        let body: RpcResponse = resp.json().await?;
        if let Some(err) = body.error {
            return Err(err.into());
        }
        Ok(serde_json::from_value(body.result.unwrap_or(Value::Null))?)
    }
}
