//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!     → cloned into the HTTP server state
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    FilterConfig, LimitsConfig, ListenerConfig, ObservabilityConfig, ServerConfig, TimeoutConfig,
    DEFAULT_PORT,
};
pub use schema::parse_port;
pub use validation::{validate_config, ValidationError};
