//! `/` and `/dht`: register, refresh or remove the calling peer.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Query, Request, State};
use axum::http::header;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};

use dhtseed_core::request::{RequestParams, TransportMeta};
use dhtseed_services::Reply;

use super::{no_cache, terminate, ApiState, CompressionRequested};

pub async fn handle_announce(State(state): State<ApiState>, request: Request) -> Response {
    let (parts, _body) = request.into_parts();
    let params = query_params(&parts);
    let meta = transport_meta(&parts);

    let command = match state.validator.validate(params.as_ref(), meta.as_ref()) {
        Ok(command) => command,
        Err(rejection) => {
            tracing::debug!(
                addr = ?meta.as_ref().map(|m| m.remote_addr),
                reason = %rejection,
                "request rejected"
            );
            return terminate(rejection.status(), &rejection.to_string());
        }
    };

    let compress = command.compress;
    let registry = state.registry.clone();
    let outcome = tokio::task::spawn_blocking(move || registry.handle(&command)).await;

    match outcome {
        Ok(Ok(reply)) => reply_response(&reply, compress),
        Ok(Err(e)) => {
            if e.status() >= 500 {
                tracing::error!(error = %e, "registry failure");
            } else {
                tracing::debug!(reason = %e, "request rejected");
            }
            terminate(e.status(), e.public_message())
        }
        Err(e) => {
            tracing::error!(error = %e, "registry task failed");
            terminate(500, "Internal server error")
        }
    }
}

/// Query string as a parameter map. `None` when it cannot be decoded.
fn query_params(parts: &Parts) -> Option<RequestParams> {
    Query::<RequestParams>::try_from_uri(&parts.uri)
        .map(|Query(params)| params)
        .ok()
}

fn transport_meta(parts: &Parts) -> Option<TransportMeta> {
    let ConnectInfo(addr) = parts.extensions.get::<ConnectInfo<SocketAddr>>()?;
    let user_agent = parts
        .headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    Some(TransportMeta {
        remote_addr: addr.ip().to_canonical(),
        user_agent,
    })
}

fn reply_response(reply: &Reply, compress: bool) -> Response {
    let mut response = ([(header::CONTENT_TYPE, reply.content_type())], reply.body()).into_response();
    if compress {
        response.extensions_mut().insert(CompressionRequested);
    }
    no_cache(response)
}
