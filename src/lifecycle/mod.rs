//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! HttpServer::new (create) → bind → serve → shutdown
//!
//! Shutdown (shutdown.rs):
//!     Trigger → stop accepting → finish in-flight requests → return
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
