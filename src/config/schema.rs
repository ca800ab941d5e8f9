//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::imaging::DecodeLimits;

/// Port used when none is configured or the CLI value is unusable.
pub const DEFAULT_PORT: u16 = 5001;

/// Port from the optional CLI argument; absent or unparseable yields `DEFAULT_PORT`.
pub fn parse_port(arg: Option<&str>) -> u16 {
    arg.and_then(|p| p.trim().parse().ok()).unwrap_or(DEFAULT_PORT)
}

/// Root configuration for the image filter server.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (host, port).
    pub listener: ListenerConfig,

    /// Request and decode size limits.
    pub limits: LimitsConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Filter selection for the two pipelines.
    pub filters: FilterConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl ServerConfig {
    /// Configuration with the listener port replaced.
    pub fn with_port(mut self, port: u16) -> Self {
        self.listener.port = port;
        self
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub host: String,

    /// TCP port. 0 asks the OS for an ephemeral port.
    pub port: u16,
}

impl ListenerConfig {
    /// Joined `host:port` string suitable for binding.
    pub fn bind_address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// Size limits applied to untrusted input.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,

    /// Maximum decoded image width in pixels.
    pub max_image_width: u32,

    /// Maximum decoded image height in pixels.
    pub max_image_height: u32,

    /// Maximum bytes the decoder may allocate.
    pub max_decode_alloc_bytes: u64,
}

impl LimitsConfig {
    pub fn decode_limits(&self) -> DecodeLimits {
        DecodeLimits {
            max_width: self.max_image_width,
            max_height: self.max_image_height,
            max_alloc_bytes: self.max_decode_alloc_bytes,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        let decode = DecodeLimits::default();
        Self {
            max_body_bytes: 16 * 1024 * 1024,
            max_image_width: decode.max_width,
            max_image_height: decode.max_height,
            max_decode_alloc_bytes: decode.max_alloc_bytes,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,

    /// Budget for decode + filter + encode in seconds.
    pub processing_secs: u64,
}

impl TimeoutConfig {
    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }

    pub fn processing(&self) -> Duration {
        Duration::from_secs(self.processing_secs)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            processing_secs: 10,
        }
    }
}

/// Which filters the pipelines apply.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct FilterConfig {
    /// Used by `/filter` when the requested name is not registered.
    pub default_filter: String,

    /// Applied to every upload before it is echoed back.
    pub upload_filter: String,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            default_filter: "green".to_string(),
            upload_filter: "identity".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default `EnvFilter` directive when `RUST_LOG` is unset.
    pub log_filter: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl ObservabilityConfig {
    pub fn metrics_socket_addr(&self) -> Option<SocketAddr> {
        self.metrics_address.parse().ok()
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "pixel_filter_server=debug,tower_http=debug".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
