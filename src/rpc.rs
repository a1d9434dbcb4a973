//! HTTP provider construction helpers.

use anyhow::{Context, Result};
use ethers::prelude::*;
use ethers::providers::Http;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::settings::RpcSettings;

/// Builds an HTTP provider with the configured request timeout.
pub fn connect_http(settings: &RpcSettings) -> Result<Arc<Provider<Http>>> {
    let url: reqwest::Url = settings
        .http_url
        .parse()
        .with_context(|| format!("invalid RPC url '{}'", settings.http_url))?;
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.request_timeout_seconds))
        .build()
        .context("failed to build HTTP client")?;
    info!("Connecting to RPC endpoint {}", url);
    Ok(Arc::new(Provider::new(Http::new_with_client(url, client))))
}

/// Reads the current head block, for callers that want "latest" as their
/// snapshot reference point. Snapshots themselves never advance the block; the
/// value chosen here is threaded through every sub-fetch.
pub async fn latest_block<M: Middleware>(client: &M) -> Result<U64> {
    client
        .get_block_number()
        .await
        .map_err(|e| anyhow::anyhow!("failed to fetch head block: {e}"))
}
