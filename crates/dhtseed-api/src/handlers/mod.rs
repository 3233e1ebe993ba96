//! HTTP handlers: the bootstrap endpoint and a JSON status view.

pub mod announce;
pub mod status;

use std::sync::Arc;

use axum::http::header::{self, HeaderMap, HeaderValue};
use axum::http::{Extensions, StatusCode, Version};
use axum::response::{IntoResponse, Response};

use dhtseed_core::request::RequestValidator;
use dhtseed_core::wire;
use dhtseed_services::PeerRegistry;

#[derive(Clone)]
pub struct ApiState {
    pub registry: PeerRegistry,
    pub validator: Arc<RequestValidator>,
}

impl ApiState {
    pub fn new(registry: PeerRegistry, validator: RequestValidator) -> Self {
        Self {
            registry,
            validator: Arc::new(validator),
        }
    }
}

// ── Shared helpers ────────────────────────────────────────────────────────────

const CACHE_CONTROL: &str = "no-store, no-cache, must-revalidate, pre-check=0, post-check=0";
const EXPIRES: &str = "Mon, 26 Jul 1997 05:00:00 GMT";

/// Response extension: the caller asked for a compressed body.
#[derive(Debug, Clone, Copy)]
pub struct CompressionRequested;

/// `CompressionLayer` predicate.
pub fn compression_requested(
    _status: StatusCode,
    _version: Version,
    _headers: &HeaderMap,
    extensions: &Extensions,
) -> bool {
    extensions.get::<CompressionRequested>().is_some()
}

/// Stamp the headers that keep proxies and clients from caching a reply.
fn no_cache(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(CACHE_CONTROL));
    headers.insert(header::EXPIRES, HeaderValue::from_static(EXPIRES));
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    response
}

/// Terminate with `status` and a status-line body.
fn terminate(status: u16, message: &str) -> Response {
    let code = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = wire::terminate_line(code.as_u16(), message);
    no_cache(
        (
            code,
            [(header::CONTENT_TYPE, wire::TEXT_CONTENT_TYPE)],
            body,
        )
            .into_response(),
    )
}

pub use announce::handle_announce;
pub use status::handle_status;
