//! Client for the upload relay (`POST /upload`).

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use tracing::{error, info};

use crate::errors::{ClientError, Result};

/// A document to pin.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RelayErrorBody {
    error: String,
}

#[derive(Clone)]
pub struct UploadClient {
    client: Client,
    base_url: String,
}

impl UploadClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Send `file` (plus descriptive text fields) to the relay and return the
    /// content identifier it pinned.
    pub async fn upload(&self, file: UploadFile, fields: &[(&str, &str)]) -> Result<String> {
        let mut part = Part::bytes(file.bytes).file_name(file.file_name.clone());
        if let Some(mime) = file.content_type.as_deref() {
            part = part.mime_str(mime)?;
        }
        let mut form = Form::new().part("file", part);
        for (name, value) in fields {
            form = form.text(name.to_string(), value.to_string());
        }

        let resp = self
            .client
            .post(format!("{}/upload", self.base_url))
            .multipart(form)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<RelayErrorBody>(&text)
                .map(|b| b.error)
                .unwrap_or_else(|_| format!("upload failed with HTTP {status}"));
            error!("Error uploading file to IPFS: {message}");
            return Err(ClientError::Upload {
                status: status.as_u16(),
                message,
            });
        }

        let body: UploadResponse = resp.json().await?;
        let cid = body.ipfs_hash.filter(|h| !h.is_empty()).ok_or_else(|| {
            ClientError::Upstream(
                "Upload successful, but no IpfsHash returned from the server.".to_string(),
            )
        })?;
        info!("Uploaded {} to IPFS: {cid}", file.file_name);
        Ok(cid)
    }
}
