//! Expense report upload relay: entry point.
//!
//! Accepts supporting documents from the browser as multipart uploads and
//! pins them to IPFS through Pinata, so the Pinata credentials never reach
//! the client. The returned content identifier is what the client records
//! on-chain.

mod api;
mod config;
mod errors;
mod pinata;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Config;
use pinata::PinataClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging (RUST_LOG controls verbosity).
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Load optional .env file (ignored if missing).
    let _ = dotenvy::dotenv();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("{e}"))?;

    let client = Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()?;
    let pinata = PinataClient::new(
        client,
        config.pinata_api_url.clone(),
        config.pinata_api_key.clone(),
        config.pinata_secret_api_key.clone(),
    );

    // ─── REST API ─────────────────────────────────────────
    let cors = api::cors_layer(&config.cors_origin).map_err(|e| anyhow::anyhow!("{e}"))?;
    let max_body_bytes = config.max_body_bytes().map_err(|e| anyhow::anyhow!("{e}"))?;
    let app = api::router(Arc::new(api::ApiState { pinata }), cors, max_body_bytes);

    let addr = format!("0.0.0.0:{}", config.port);
    info!("Server running at http://{addr} (CORS origin {})", config.cors_origin);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
