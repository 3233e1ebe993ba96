//! dhtseed integration test harness.
//!
//! Each test starts its own endpoint on 127.0.0.1:0 backed by a fresh
//! `MemoryStore` and drives it over real HTTP:
//!
//!   cargo test --test integration
//!
//! Every client connects from 127.0.0.1, so all registered peers share
//! that address.

mod announce;
mod rejections;
mod status;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use dhtseed_api::ApiState;
use dhtseed_core::config::DEFAULT_SAMPLE_SIZE;
use dhtseed_core::request::RequestValidator;
use dhtseed_services::{MemoryStore, PeerRegistry};

// ── Harness ───────────────────────────────────────────────────────────────────

pub struct TestServer {
    pub base: String,
    pub store: Arc<MemoryStore>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<Result<()>>>,
}

impl TestServer {
    pub async fn start() -> Result<Self> {
        Self::start_with(RequestValidator::default()).await
    }

    pub async fn start_with(validator: RequestValidator) -> Result<Self> {
        let store = Arc::new(MemoryStore::new());
        let registry = PeerRegistry::new(store.clone(), DEFAULT_SAMPLE_SIZE);
        let state = ApiState::new(registry, validator);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("failed to bind test listener")?;
        let addr: SocketAddr = listener.local_addr()?;

        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(dhtseed_api::serve_listener(state, listener, async {
            rx.await.ok();
        }));

        Ok(Self {
            base: format!("http://{}", addr),
            store,
            shutdown: Some(tx),
            handle: Some(handle),
        })
    }

    /// URL of the bootstrap endpoint with `params` as the query string.
    pub fn dht_url(&self, params: &[(&str, &str)]) -> reqwest::Url {
        reqwest::Url::parse_with_params(&format!("{}/dht", self.base), params)
            .expect("test url")
    }

    pub async fn stop(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.await.context("server task panicked")??;
        }
        Ok(())
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// Client with a fixed user-agent outside the denylist.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent("FlylinkDC++ r600 build 18000")
        .build()
        .expect("http client")
}

/// 39-byte identifier made of one repeated character.
pub fn cid(c: char) -> String {
    c.to_string().repeat(39)
}

/// GET the endpoint and return status and body.
pub async fn get(
    server: &TestServer,
    params: &[(&str, &str)],
) -> Result<(reqwest::StatusCode, String)> {
    let resp = client()
        .get(server.dht_url(params))
        .send()
        .await
        .context("request failed")?;
    let status = resp.status();
    Ok((status, resp.text().await?))
}
