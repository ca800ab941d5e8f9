//! Pixel filter server library.
//!
//! Accepts an image over HTTP, decodes it into a `PixelBuffer`, runs a per-pixel
//! filter and returns the result as an inline PNG inside an HTML fragment.

// Core subsystems
pub mod http;
pub mod imaging;
pub mod pipeline;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::ServerConfig;
pub use http::{BoundServer, HttpServer};
pub use lifecycle::Shutdown;
