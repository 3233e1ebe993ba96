//! dhtseedd: DHT bootstrap and rendezvous daemon.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};

use dhtseed_api::ApiState;
use dhtseed_core::config::{DhtSeedConfig, StoreBackend, StoreConfig};
use dhtseed_core::request::{Denylist, RequestValidator};
use dhtseed_services::{MemoryStore, PeerRegistry, RecordStore, SqliteStore};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load config
    if let Err(e) = DhtSeedConfig::write_default_if_missing() {
        tracing::warn!(error = %e, "failed to write default config");
    }
    let config = DhtSeedConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        DhtSeedConfig::default()
    });
    tracing::info!(
        backend = ?config.store.backend,
        sample_size = config.registry.sample_size,
        "dhtseedd starting"
    );

    let store = open_store(&config.store)?;
    let registry = PeerRegistry::new(store, config.registry.sample_size);
    let validator = RequestValidator::new(Denylist::with_extra(
        config.registry.denied_user_agents.iter().cloned(),
    ));
    let state = ApiState::new(registry, validator);

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("shutdown signal received");
    };

    let addr = SocketAddr::new(config.server.listen_addr, config.server.port);
    dhtseed_api::serve(state, addr, shutdown).await?;

    tracing::info!("dhtseedd stopped");
    Ok(())
}

fn open_store(config: &StoreConfig) -> Result<Arc<dyn RecordStore>> {
    match config.backend {
        StoreBackend::Memory => {
            tracing::warn!("memory store selected, peers are lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Sqlite => {
            if let Some(parent) = config.sqlite_path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            let store = SqliteStore::open(&config.sqlite_path)
                .context("failed to open sqlite store")?;
            Ok(Arc::new(store))
        }
    }
}
