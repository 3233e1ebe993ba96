//! Shared HTTP request helpers for CLI commands.

use anyhow::{Context, Result};
use reqwest::{StatusCode, Url};
use serde::Deserialize;

pub const DEFAULT_URL: &str = "http://127.0.0.1:8080";

fn client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("dhtseed-ctl/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build http client")
}

pub async fn get_json<T: for<'de> Deserialize<'de>>(url: &str) -> Result<T> {
    client()?
        .get(url)
        .send()
        .await
        .with_context(|| format!("failed to connect to dhtseedd at {} (is it running?)", url))?
        .error_for_status()
        .context("request failed")?
        .json::<T>()
        .await
        .context("failed to parse response")
}

/// GET `base/dht` with `params` in the query string. Returns status and body.
pub async fn get_text(base: &str, params: &[(&str, &str)]) -> Result<(StatusCode, String)> {
    let url = Url::parse_with_params(&format!("{}/dht", base.trim_end_matches('/')), params)
        .with_context(|| format!("invalid url {}", base))?;
    let resp = client()?
        .get(url)
        .send()
        .await
        .with_context(|| format!("failed to connect to dhtseedd at {} (is it running?)", base))?;
    let status = resp.status();
    let body = resp.text().await.context("failed to read response")?;
    Ok((status, body))
}
