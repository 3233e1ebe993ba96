pub mod handlers;

use std::future::Future;
use std::net::SocketAddr;

use anyhow::Context;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};

pub use handlers::ApiState;

pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Only responses the handler marked are gzipped, and only for clients
    // that accept it.
    let compression = CompressionLayer::new().compress_when(handlers::compression_requested);

    Router::new()
        .route("/", get(handlers::handle_announce))
        .route("/dht", get(handlers::handle_announce))
        .route("/status", get(handlers::handle_status))
        .with_state(state)
        .layer(compression)
        .layer(cors)
}

/// Bind `addr` and serve until `shutdown` resolves.
pub async fn serve<F>(state: ApiState, addr: SocketAddr, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    serve_listener(state, listener, shutdown).await
}

/// Serve on an already-bound listener.
pub async fn serve_listener<F>(
    state: ApiState,
    listener: TcpListener,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr().context("listener has no local address")?;
    tracing::info!(%addr, "bootstrap endpoint listening");

    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
    .context("http server failed")?;

    tracing::info!("bootstrap endpoint stopped");
    Ok(())
}
