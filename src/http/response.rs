//! Conversion of pipeline results into HTTP responses.
//!
//! ```text
//! Received → Matched → Success  → 200 text/html, handler payload
//!                    → Failure  → 400/413/500 text/html, escaped diagnostic
//!          → (no route)         → 404 text/plain "Not Found"
//! request deadline              → 408 text/html, escaped diagnostic
//! handler panic                 → 500 text/plain "Internal Server Error"
//! ```
//!
//! hyper writes exactly one response per request and sets `content-length`
//! from the fully buffered body.

use std::any::Any;

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use crate::pipeline::{escape_html, PipelineError};

pub const NOT_FOUND_BODY: &str = "Not Found";
pub const INTERNAL_ERROR_BODY: &str = "Internal Server Error";
pub const REQUEST_TIMEOUT_MESSAGE: &str = "Request timed out";

/// Result of handling one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpOutcome {
    /// 200 with an HTML payload.
    Success(String),
    /// Handler-declared failure with a diagnostic message.
    Failure { status: StatusCode, message: String },
    /// No handler for the method + path.
    NotFound,
}

impl HttpOutcome {
    pub fn status(&self) -> StatusCode {
        match self {
            HttpOutcome::Success(_) => StatusCode::OK,
            HttpOutcome::Failure { status, .. } => *status,
            HttpOutcome::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

impl From<PipelineError> for HttpOutcome {
    fn from(err: PipelineError) -> Self {
        HttpOutcome::Failure {
            status: err.status(),
            message: err.to_string(),
        }
    }
}

impl From<Result<String, PipelineError>> for HttpOutcome {
    fn from(result: Result<String, PipelineError>) -> Self {
        match result {
            Ok(body) => HttpOutcome::Success(body),
            Err(e) => e.into(),
        }
    }
}

impl IntoResponse for HttpOutcome {
    fn into_response(self) -> Response {
        match self {
            HttpOutcome::Success(body) => (StatusCode::OK, Html(body)).into_response(),
            HttpOutcome::Failure { status, message } => {
                let body = format!("<p class=\"error\">{}</p>", escape_html(&message));
                (status, Html(body)).into_response()
            }
            HttpOutcome::NotFound => (StatusCode::NOT_FOUND, NOT_FOUND_BODY).into_response(),
        }
    }
}

/// Response mapper for the request deadline. `TimeoutLayer` answers with a
/// bare 408, which is replaced by a regular failure body.
pub async fn describe_timeout(response: Response) -> Response {
    if response.status() != StatusCode::REQUEST_TIMEOUT {
        return response;
    }
    tracing::warn!("Request exceeded its deadline");
    HttpOutcome::Failure {
        status: StatusCode::REQUEST_TIMEOUT,
        message: REQUEST_TIMEOUT_MESSAGE.to_string(),
    }
    .into_response()
}

/// `CatchPanicLayer` handler: log the payload, answer with a generic 500.
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        *s
    } else {
        "unknown panic payload"
    };
    tracing::error!(panic = %detail, "Handler panicked");

    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_BODY).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use std::time::Duration;

    use axum::http::{header, Request};
    use axum::middleware;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;
    use tower_http::catch_panic::CatchPanicLayer;
    use tower_http::timeout::TimeoutLayer;

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_success_is_html() {
        let response = HttpOutcome::Success("<p>ok</p>".into()).into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let ct = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
        assert!(ct.starts_with("text/html"));
        assert_eq!(body_text(response).await, "<p>ok</p>");
    }

    #[tokio::test]
    async fn test_failure_escapes_message() {
        let outcome = HttpOutcome::from(PipelineError::malformed("bad <input>"));
        assert_eq!(outcome.status(), StatusCode::BAD_REQUEST);

        let body = body_text(outcome.into_response()).await;
        assert!(body.contains("Malformed input: bad &lt;input&gt;"));
    }

    #[tokio::test]
    async fn test_not_found_body_is_exact() {
        let response = HttpOutcome::NotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_text(response).await, "Not Found");
    }

    async fn boom() -> &'static str {
        panic!("secret internal state")
    }

    #[tokio::test]
    async fn test_panics_become_generic_500() {
        let app = Router::new()
            .route("/boom", get(boom))
            .layer(CatchPanicLayer::custom(panic_response));

        let response = app
            .oneshot(Request::get("/boom").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_text(response).await;
        assert_eq!(body, "Internal Server Error");
        assert!(!body.contains("secret"));
    }

    async fn slow() -> &'static str {
        tokio::time::sleep(Duration::from_secs(5)).await;
        "too late"
    }

    #[tokio::test]
    #[allow(deprecated)]
    async fn test_request_timeout_has_message() {
        let app = Router::new()
            .route("/slow", get(slow))
            .route("/fast", get(|| async { "ok" }))
            .layer(TimeoutLayer::new(Duration::from_millis(20)))
            .layer(middleware::map_response(describe_timeout));

        let response = app
            .clone()
            .oneshot(Request::get("/slow").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        let ct = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
        assert!(ct.starts_with("text/html"));
        assert!(body_text(response).await.contains("Request timed out"));

        let response = app
            .oneshot(Request::get("/fast").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "ok");
    }
}
