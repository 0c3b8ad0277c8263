//! Pinata pinning API client.
//!
//! Each call is made once. Failures are returned to the caller as
//! [`RelayError::Pinata`] carrying Pinata's own explanation when it sends one.

use std::collections::BTreeMap;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::errors::{RelayError, Result};

// ─────────────────────────────────────────────────────────
// Wire shapes
// ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct PinataMetadata<'a> {
    name: &'a str,
    keyvalues: &'a BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct PinResponse {
    #[serde(rename = "IpfsHash")]
    pub ipfs_hash: Option<String>,
    #[serde(rename = "PinSize")]
    pub pin_size: Option<u64>,
}

/// A file received from the browser, ready to be pinned.
#[derive(Debug, Clone)]
pub struct PinRequest {
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
    /// Extra form fields, stored by Pinata as searchable key-values.
    pub keyvalues: BTreeMap<String, String>,
}

// ─────────────────────────────────────────────────────────
// Client
// ─────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct PinataClient {
    client: Client,
    base_url: String,
    api_key: String,
    secret_api_key: String,
}

impl PinataClient {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        secret_api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            secret_api_key: secret_api_key.into(),
        }
    }

    /// `POST /pinning/pinFileToIPFS` and return the resulting CID.
    pub async fn pin_file(&self, request: PinRequest) -> Result<String> {
        let size = request.bytes.len();
        let mut file = Part::bytes(request.bytes).file_name(request.name.clone());
        if let Some(mime) = request.content_type.as_deref() {
            file = file.mime_str(mime)?;
        }

        let metadata = serde_json::to_string(&PinataMetadata {
            name: &request.name,
            keyvalues: &request.keyvalues,
        })?;
        let form = Form::new()
            .part("file", file)
            .text("pinataMetadata", metadata)
            .text("pinataOptions", json!({ "cidVersion": 0 }).to_string());

        debug!("Pinning {} ({size} bytes)", request.name);
        let resp = self
            .client
            .post(format!("{}/pinning/pinFileToIPFS", self.base_url))
            .header("pinata_api_key", &self.api_key)
            .header("pinata_secret_api_key", &self.secret_api_key)
            .multipart(form)
            .send()
            .await?;
        let resp = check_status(resp).await?;

        let pinned: PinResponse = resp.json().await?;
        let cid = pinned
            .ipfs_hash
            .filter(|h| !h.is_empty())
            .ok_or_else(|| RelayError::Pinata("Failed to pin file to IPFS".to_string()))?;
        info!(
            "Pinned {} as {cid} ({} bytes stored)",
            request.name,
            pinned.pin_size.unwrap_or_default()
        );
        Ok(cid)
    }

    /// `GET /data/testAuthentication`; returns Pinata's response body.
    pub async fn test_authentication(&self) -> Result<Value> {
        let resp = self
            .client
            .get(format!("{}/data/testAuthentication", self.base_url))
            .header("pinata_api_key", &self.api_key)
            .header("pinata_secret_api_key", &self.secret_api_key)
            .send()
            .await?;
        let resp = check_status(resp).await?;
        Ok(resp.json().await?)
    }
}

async fn check_status(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(RelayError::Pinata(error_message(status.as_u16(), &body)))
}

/// Pinata reports errors either as `{"error": "..."}` or as
/// `{"error": {"reason": "...", "details": "..."}}`.
fn error_message(status: u16, body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let error = parsed.as_ref().and_then(|v| v.get("error"));
    match error {
        Some(Value::String(msg)) => msg.clone(),
        Some(obj) => obj
            .get("details")
            .or_else(|| obj.get("reason"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| obj.to_string()),
        None if body.trim().is_empty() => format!("Pinata returned HTTP {status}"),
        None => format!("Pinata returned HTTP {status}: {}", body.trim()),
    }
}
