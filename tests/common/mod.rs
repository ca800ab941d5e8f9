//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use pixel_filter_server::config::ServerConfig;
use pixel_filter_server::http::HttpServer;
use pixel_filter_server::imaging::{self, DecodeLimits, Pixel, PixelBuffer};
use pixel_filter_server::lifecycle::Shutdown;
use tokio::task::JoinHandle;

/// A server running on an ephemeral localhost port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<()>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Trigger shutdown and wait for the serve loop to return.
    pub async fn stop(self) {
        self.shutdown.trigger();
        let _ = self.handle.await;
    }
}

/// Start a server with `config`, overriding the listener to 127.0.0.1:0.
pub async fn start_server(mut config: ServerConfig) -> TestServer {
    config.listener.host = "127.0.0.1".to_string();
    config.listener.port = 0;

    let bound = HttpServer::new(config).bind().await.unwrap();
    let addr = bound.local_addr();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();

    let handle = tokio::spawn(async move {
        let _ = bound.serve(rx).await;
    });

    TestServer { addr, shutdown, handle }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// Deterministic image whose pixels depend on `seed`.
pub fn seeded_image(seed: u8, width: u32, height: u32) -> PixelBuffer {
    PixelBuffer::from_fn(width, height, |x, y| {
        Pixel::rgba(
            seed.wrapping_mul(7).wrapping_add(x as u8),
            seed.wrapping_mul(13).wrapping_add(y as u8),
            seed.wrapping_add((x * y) as u8),
            255 - (seed % 64),
        )
    })
}

pub fn png_bytes(buffer: &PixelBuffer) -> Vec<u8> {
    imaging::encode(buffer).unwrap()
}

/// Decode the first `data:image/png;base64,` image embedded in an HTML fragment.
pub fn embedded_image(html: &str) -> PixelBuffer {
    let marker = "data:image/png;base64,";
    let start = html.find(marker).expect("data url in response") + marker.len();
    let end = start + html[start..].find('"').expect("closing quote");
    let bytes = STANDARD.decode(&html[start..end]).expect("valid base64");
    imaging::decode(&bytes, DecodeLimits::default()).expect("valid png")
}
