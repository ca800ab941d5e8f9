//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (axum::serve accept loop, one task per connection)
//!     → request.rs (assign x-request-id, tracing span)
//!     → server.rs (timeout, body limit, panic catching, routing)
//!     → handlers.rs (run the matching pipeline)
//!     → response.rs (HttpOutcome → status + body)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestIdGenerator, X_REQUEST_ID};
pub use response::HttpOutcome;
pub use server::{AppState, BoundServer, HttpServer, ServerError};
