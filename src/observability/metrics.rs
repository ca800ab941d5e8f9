//! Metrics collection and exposition.
//!
//! # Metrics
//! - `pixel_filter_requests_total` (counter): requests by route and status
//! - `pixel_filter_request_duration_seconds` (histogram): latency by route
//! - `pixel_filter_pixels_processed_total` (counter): pixels run through a filter
//! - `pixel_filter_processing_seconds` (histogram): decode + filter + encode time
//!
//! Recording is a no-op until `init_metrics` installs the Prometheus recorder.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => {
            tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter")
        }
    }
}

pub fn record_request(route: &str, status: u16, start: Instant) {
    let route = route.to_string();
    ::metrics::counter!(
        "pixel_filter_requests_total",
        "route" => route.clone(),
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!("pixel_filter_request_duration_seconds", "route" => route)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_pixels(count: u64, start: Instant) {
    ::metrics::counter!("pixel_filter_pixels_processed_total").increment(count);
    ::metrics::histogram!("pixel_filter_processing_seconds").record(start.elapsed().as_secs_f64());
}
