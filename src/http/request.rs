//! Request identification.
//!
//! Every inbound request gets an `x-request-id` before any other layer runs.
//! The id is echoed on the response and recorded on the request's tracing span.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use tracing::Span;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Hands out `req-<n>` ids from a counter owned by the server instance.
#[derive(Debug, Clone, Default)]
pub struct RequestIdGenerator {
    next: Arc<AtomicU64>,
}

impl MakeRequestId for RequestIdGenerator {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        HeaderValue::from_str(&format!("req-{id}")).ok().map(RequestId::new)
    }
}

/// The request id header, or `"unknown"` when absent.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Span for `TraceLayer`, carrying the request id.
pub fn make_span(request: &Request<Body>) -> Span {
    tracing::info_span!(
        "request",
        request_id = %request_id(request.headers()),
        method = %request.method(),
        path = %request.uri().path(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique_and_shared_across_clones() {
        let mut a = RequestIdGenerator::default();
        let mut b = a.clone();
        let req = Request::new(());

        let first = a.make_request_id(&req).unwrap();
        let second = b.make_request_id(&req).unwrap();
        assert_eq!(first.header_value(), "req-1");
        assert_eq!(second.header_value(), "req-2");
    }

    #[test]
    fn test_request_id_lookup() {
        let mut headers = HeaderMap::new();
        assert_eq!(request_id(&headers), "unknown");
        headers.insert(X_REQUEST_ID, HeaderValue::from_static("req-9"));
        assert_eq!(request_id(&headers), "req-9");
    }
}
