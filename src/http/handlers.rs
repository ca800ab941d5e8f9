//! Route handlers.
//!
//! Each handler runs one pipeline, turns its result into an `HttpOutcome`,
//! and records the outcome in logs and metrics before responding.

use std::time::Instant;

use axum::body::Bytes;
use axum::extract::{Request, State};
use axum::http::{Method, Uri};
use axum::response::{Html, IntoResponse, Response};

use crate::http::response::HttpOutcome;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::pipeline::template::INDEX_PAGE;

/// `GET /`
pub async fn index() -> Html<&'static str> {
    Html(INDEX_PAGE)
}

/// `POST /filter`
pub async fn filter(State(state): State<AppState>, body: Bytes) -> Response {
    let start = Instant::now();
    let outcome = HttpOutcome::from(state.pipeline.filter(body).await);
    finish("/filter", outcome, start)
}

/// `POST /upload`
pub async fn upload(State(state): State<AppState>, request: Request) -> Response {
    let start = Instant::now();
    let outcome = HttpOutcome::from(state.pipeline.upload(&state.form_parser, request).await);
    finish("/upload", outcome, start)
}

/// Fallback for any unmatched method + path.
pub async fn not_found(method: Method, uri: Uri) -> Response {
    tracing::warn!(method = %method, path = %uri.path(), "No route matched");
    metrics::record_request("none", 404, Instant::now());
    HttpOutcome::NotFound.into_response()
}

fn finish(route: &'static str, outcome: HttpOutcome, start: Instant) -> Response {
    let status = outcome.status();
    match &outcome {
        HttpOutcome::Failure { message, .. } if status.is_server_error() => {
            tracing::error!(route, status = status.as_u16(), error = %message, "Request failed");
        }
        HttpOutcome::Failure { message, .. } => {
            tracing::warn!(route, status = status.as_u16(), error = %message, "Request rejected");
        }
        _ => {
            tracing::debug!(
                route,
                status = status.as_u16(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Request completed"
            );
        }
    }
    metrics::record_request(route, status.as_u16(), start);
    outcome.into_response()
}
