//! The two request pipelines.
//!
//! ```text
//! /filter: JSON body → FilterRequest → base64 decode ─┐
//! /upload: multipart body → FormParser → file bytes ──┤
//!                                                      ▼
//!                    [blocking pool, bounded by processing timeout]
//!                      decode → apply(filter) → encode (PNG)
//!                                                      ▼
//!                         base64 → Templater → HTML fragment
//! ```
//!
//! Each stage completes before the next starts; nothing is shared between
//! requests apart from the immutable `Pipeline` itself.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Bytes;
use axum::extract::Request;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::config::ServerConfig;
use crate::imaging::filter::{self, FilterRegistry, NamedFilter};
use crate::imaging::{self as img, DecodeLimits};
use crate::observability::metrics;
use crate::pipeline::error::PipelineError;
use crate::pipeline::form::FormParser;
use crate::pipeline::template::{self, escape_html, SlotTemplater, Templater};

/// Body of `POST /filter`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterRequest {
    /// Requested filter name. Unregistered names fall back to the default filter.
    pub filter: String,
    /// Base64 image bytes, optionally wrapped in a `data:` URL.
    pub image_data: String,
}

impl FilterRequest {
    /// Parse a raw request body.
    pub fn from_body(body: &[u8]) -> Result<Self, PipelineError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(PipelineError::malformed("request body is empty"));
        }
        serde_json::from_slice(body)
            .map_err(|e| PipelineError::malformed(format!("invalid JSON body: {e}")))
    }

    /// Decoded image bytes from `imageData`.
    pub fn image_bytes(&self) -> Result<Vec<u8>, PipelineError> {
        decode_image_data(&self.image_data)
    }
}

/// Decode bare base64 or a `data:<mime>;base64,<payload>` URL.
pub fn decode_image_data(image_data: &str) -> Result<Vec<u8>, PipelineError> {
    let trimmed = image_data.trim();
    let payload = match trimmed.strip_prefix("data:") {
        Some(url) => {
            let (header, payload) = url
                .split_once(',')
                .ok_or_else(|| PipelineError::malformed("imageData data URL has no payload"))?;
            if !header.ends_with(";base64") {
                return Err(PipelineError::malformed("imageData data URL is not base64-encoded"));
            }
            payload
        }
        None => trimmed,
    };

    if payload.is_empty() {
        return Err(PipelineError::malformed("imageData is empty"));
    }

    STANDARD
        .decode(payload)
        .map_err(|e| PipelineError::malformed(format!("imageData is not valid base64: {e}")))
}

/// Output of the decode → filter → encode stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedImage {
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

impl ProcessedImage {
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.png)
    }
}

/// Immutable per-server pipeline configuration shared by all requests.
#[derive(Clone)]
pub struct Pipeline {
    registry: Arc<FilterRegistry>,
    templater: Arc<dyn Templater>,
    limits: DecodeLimits,
    processing_timeout: Duration,
    default_filter: (String, NamedFilter),
    upload_filter: (String, NamedFilter),
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("limits", &self.limits)
            .field("processing_timeout", &self.processing_timeout)
            .field("default_filter", &self.default_filter.0)
            .field("upload_filter", &self.upload_filter.0)
            .finish()
    }
}

impl Pipeline {
    pub fn new(
        config: &ServerConfig,
        registry: FilterRegistry,
        templater: Arc<dyn Templater>,
    ) -> Self {
        let default_filter = resolve_configured(
            &registry,
            &config.filters.default_filter,
            FilterRegistry::GREEN,
            filter::green_boost,
        );
        let upload_filter = resolve_configured(
            &registry,
            &config.filters.upload_filter,
            FilterRegistry::IDENTITY,
            filter::identity,
        );

        Self {
            registry: Arc::new(registry),
            templater,
            limits: config.limits.decode_limits(),
            processing_timeout: config.timeouts.processing(),
            default_filter,
            upload_filter,
        }
    }

    /// Pipeline with the built-in filters and `{{slot}}` templates.
    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config, FilterRegistry::builtin(), Arc::new(SlotTemplater))
    }

    /// Replace the decode → filter → encode deadline.
    pub fn with_processing_timeout(mut self, timeout: Duration) -> Self {
        self.processing_timeout = timeout;
        self
    }

    pub fn registry(&self) -> &FilterRegistry {
        &self.registry
    }

    /// Resolve a requested filter name, falling back to the default filter.
    pub fn resolve_filter(&self, name: &str) -> (String, NamedFilter) {
        match self.registry.get(name) {
            Some(f) => (name.trim().to_ascii_lowercase(), f),
            None => {
                tracing::debug!(
                    requested = %name,
                    fallback = %self.default_filter.0,
                    "Unknown filter, using default"
                );
                self.default_filter.clone()
            }
        }
    }

    /// `POST /filter`: JSON body in, filtered-image fragment out.
    pub async fn filter(&self, body: Bytes) -> Result<String, PipelineError> {
        let request = FilterRequest::from_body(&body)?;
        let bytes = request.image_bytes()?;
        let (name, f) = self.resolve_filter(&request.filter);

        tracing::debug!(filter = %name, input_bytes = bytes.len(), "Filter request parsed");

        let processed = self.process(bytes, f).await?;
        tracing::info!(
            filter = %name,
            width = processed.width,
            height = processed.height,
            output_bytes = processed.png.len(),
            "Image filtered"
        );

        let encoded = processed.to_base64();
        Ok(self.templater.render(template::FILTER_RESULT, &[("image", encoded.as_str())]))
    }

    /// `POST /upload`: multipart body in, upload fragment with filter controls out.
    pub async fn upload<P>(&self, parser: &P, request: Request) -> Result<String, PipelineError>
    where
        P: FormParser,
    {
        let part = parser.file_part(request).await?;
        tracing::debug!(
            file_name = part.file_name.as_deref().unwrap_or("-"),
            input_bytes = part.bytes.len(),
            "Upload received"
        );

        let (name, f) = self.upload_filter.clone();
        let processed = self.process(part.bytes.to_vec(), f).await?;
        tracing::info!(
            filter = %name,
            width = processed.width,
            height = processed.height,
            output_bytes = processed.png.len(),
            "Upload processed"
        );

        let encoded = processed.to_base64();
        Ok(self.render_upload(&encoded))
    }

    /// Decode, filter and re-encode on the blocking pool under the processing timeout.
    pub async fn process(
        &self,
        bytes: Vec<u8>,
        f: NamedFilter,
    ) -> Result<ProcessedImage, PipelineError> {
        let limits = self.limits;
        let start = Instant::now();
        let task = tokio::task::spawn_blocking(move || transform(&bytes, f, limits));

        let result = match tokio::time::timeout(self.processing_timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => {
                tracing::error!(error = %join_err, "Image processing task failed");
                return Err(PipelineError::Internal("image processing task failed".to_string()));
            }
            Err(_) => {
                // The blocking task still runs to completion; only the response is abandoned.
                let timeout_ms = self.processing_timeout.as_millis() as u64;
                tracing::error!(timeout_ms, "Image processing timed out");
                return Err(PipelineError::ProcessingTimeout(timeout_ms));
            }
        };

        if let Ok(ref processed) = result {
            metrics::record_pixels(processed.width as u64 * processed.height as u64, start);
        }
        result
    }

    /// The upload fragment. `encoded` appears once; the controls only name their filter.
    fn render_upload(&self, encoded: &str) -> String {
        let controls: String = self
            .registry
            .names()
            .map(|name| {
                let name = escape_html(name);
                self.templater.render(template::FILTER_CONTROL, &[("filter", name.as_str())])
            })
            .collect::<Vec<_>>()
            .join("\n");

        self.templater.render(
            template::UPLOAD_RESULT,
            &[("image", encoded), ("controls", controls.as_str())],
        )
    }
}

/// The synchronous core: bytes → PixelBuffer → filtered PixelBuffer → PNG.
pub fn transform(
    bytes: &[u8],
    f: NamedFilter,
    limits: DecodeLimits,
) -> Result<ProcessedImage, PipelineError> {
    let decoded = img::decode(bytes, limits)?;
    let filtered = img::apply(&f, &decoded);
    let png = img::encode(&filtered)?;
    Ok(ProcessedImage {
        width: filtered.width(),
        height: filtered.height(),
        png,
    })
}

fn resolve_configured(
    registry: &FilterRegistry,
    name: &str,
    fallback_name: &str,
    fallback: NamedFilter,
) -> (String, NamedFilter) {
    match registry.get(name) {
        Some(f) => (name.trim().to_ascii_lowercase(), f),
        None => {
            tracing::warn!(
                filter = %name,
                fallback = %fallback_name,
                "Configured filter not registered"
            );
            (fallback_name.to_string(), fallback)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::{Pixel, PixelBuffer};
    use crate::pipeline::form::FilePart;

    fn png_of(buf: &PixelBuffer) -> Vec<u8> {
        img::encode(buf).unwrap()
    }

    fn extract_png(fragment: &str) -> PixelBuffer {
        let marker = "data:image/png;base64,";
        let start = fragment.find(marker).expect("data url") + marker.len();
        let end = start + fragment[start..].find('"').expect("closing quote");
        let bytes = STANDARD.decode(&fragment[start..end]).unwrap();
        img::decode(&bytes, DecodeLimits::default()).unwrap()
    }

    fn filter_body(filter: &str, image_data: &str) -> Bytes {
        Bytes::from(
            serde_json::to_vec(&FilterRequest {
                filter: filter.to_string(),
                image_data: image_data.to_string(),
            })
            .unwrap(),
        )
    }

    struct StaticParser(Result<FilePart, PipelineError>);

    impl FormParser for StaticParser {
        async fn file_part(&self, _request: Request) -> Result<FilePart, PipelineError> {
            self.0.clone()
        }
    }

    fn any_request() -> Request {
        Request::new(axum::body::Body::empty())
    }

    #[test]
    fn test_decode_image_data_variants() {
        assert_eq!(decode_image_data("QUJD").unwrap(), b"ABC");
        assert_eq!(decode_image_data("data:image/png;base64,QUJD").unwrap(), b"ABC");
        assert!(matches!(decode_image_data("<not base64>"), Err(PipelineError::MalformedInput(_))));
        assert!(matches!(decode_image_data(""), Err(PipelineError::MalformedInput(_))));
        assert!(matches!(
            decode_image_data("data:text/plain,hello"),
            Err(PipelineError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_filter_request_parsing() {
        let req = FilterRequest::from_body(br#"{"filter":"red","imageData":"QUJD"}"#).unwrap();
        assert_eq!(req.filter, "red");
        assert_eq!(req.image_data, "QUJD");

        assert!(matches!(FilterRequest::from_body(b""), Err(PipelineError::MalformedInput(_))));
        assert!(matches!(
            FilterRequest::from_body(b"{not json"),
            Err(PipelineError::MalformedInput(_))
        ));
        assert!(matches!(
            FilterRequest::from_body(br#"{"filter":"red"}"#),
            Err(PipelineError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_transform_applies_filter() {
        let src = PixelBuffer::filled(2, 2, Pixel::rgb(255, 0, 0));
        let out = transform(&png_of(&src), filter::green_boost, DecodeLimits::default()).unwrap();
        assert_eq!((out.width, out.height), (2, 2));

        let decoded = img::decode(&out.png, DecodeLimits::default()).unwrap();
        assert!(decoded.pixels().iter().all(|p| *p == Pixel::rgb(255, 255, 0)));
    }

    #[tokio::test]
    async fn test_filter_flow_uses_requested_filter() {
        let pipeline = Pipeline::from_config(&ServerConfig::default());
        let src =
            PixelBuffer::from_fn(3, 2, |x, y| Pixel::rgba(x as u8 * 10, 0, y as u8 * 50, 200));
        let data = STANDARD.encode(png_of(&src));

        let html = pipeline.filter(filter_body("swap-rb", &data)).await.unwrap();
        assert_eq!(extract_png(&html), img::apply(&filter::swap_red_blue, &src));
    }

    #[tokio::test]
    async fn test_unknown_filter_falls_back_to_green() {
        let pipeline = Pipeline::from_config(&ServerConfig::default());
        let src = PixelBuffer::filled(1, 1, Pixel::rgb(255, 0, 0));
        let data = format!("data:image/png;base64,{}", STANDARD.encode(png_of(&src)));

        let html = pipeline.filter(filter_body("x", &data)).await.unwrap();
        assert_eq!(extract_png(&html).get(0, 0), Some(Pixel::rgb(255, 255, 0)));
    }

    #[tokio::test]
    async fn test_filter_flow_errors() {
        let pipeline = Pipeline::from_config(&ServerConfig::default());

        let err = pipeline.filter(filter_body("x", "<not base64>")).await.unwrap_err();
        assert!(matches!(err, PipelineError::MalformedInput(_)));

        let err = pipeline
            .filter(filter_body("x", &STANDARD.encode(b"plain text, not an image")))
            .await
            .unwrap_err();
        assert_eq!(err, PipelineError::Decode(img::DecodeError::UnknownFormat));
    }

    #[tokio::test]
    async fn test_upload_flow_renders_controls() {
        let pipeline = Pipeline::from_config(&ServerConfig::default());
        let src = PixelBuffer::from_fn(2, 3, |x, y| Pixel::rgba(x as u8, y as u8, 7, 100));
        let parser = StaticParser(Ok(FilePart {
            field_name: "file".into(),
            file_name: Some("a.png".into()),
            content_type: None,
            bytes: Bytes::from(png_of(&src)),
        }));

        let html = pipeline.upload(&parser, any_request()).await.unwrap();
        // identity is the default upload filter
        assert_eq!(extract_png(&html), src);
        for name in pipeline.registry().names() {
            assert!(html.contains(&format!(">{name}</button>")), "missing control for {name}");
        }
        assert!(html.contains(r#"hx-post="/filter""#));
    }

    #[tokio::test]
    async fn test_upload_fragment_embeds_image_once() {
        let pipeline = Pipeline::from_config(&ServerConfig::default());
        let src = PixelBuffer::from_fn(64, 64, |x, y| Pixel::rgba(x as u8, y as u8, 90, 255));
        let parser = StaticParser(Ok(FilePart {
            field_name: "file".into(),
            file_name: Some("a.png".into()),
            content_type: None,
            bytes: Bytes::from(png_of(&src)),
        }));

        let html = pipeline.upload(&parser, any_request()).await.unwrap();
        // identity upload filter, so the embedded PNG is the source re-encoded
        let encoded = STANDARD.encode(png_of(&src));
        assert_eq!(html.matches(encoded.as_str()).count(), 1);
        assert_eq!(html.matches("data:image/png;base64,").count(), 1);
        assert_eq!(html.matches("<button").count(), pipeline.registry().names().count());
        // Bounded by the image plus a fixed overhead per control.
        assert!(html.len() < encoded.len() + 4096);
    }

    #[tokio::test]
    async fn test_processing_timeout_is_reported() {
        let pipeline = Pipeline::from_config(&ServerConfig::default())
            .with_processing_timeout(Duration::from_millis(1));
        let src = PixelBuffer::from_fn(1024, 1024, |x, y| Pixel::rgb(x as u8, y as u8, 3));

        let err = pipeline.process(png_of(&src), filter::invert).await.unwrap_err();
        assert_eq!(err, PipelineError::ProcessingTimeout(1));
        assert_eq!(err.status(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    }

    fn exploding(_x: u32, _y: u32, _p: Pixel) -> Pixel {
        panic!("filter blew up")
    }

    #[tokio::test]
    async fn test_panicking_filter_is_internal_error() {
        let pipeline = Pipeline::from_config(&ServerConfig::default());
        let src = PixelBuffer::filled(2, 2, Pixel::rgb(1, 2, 3));

        let err = pipeline.process(png_of(&src), exploding).await.unwrap_err();
        assert!(matches!(err, PipelineError::Internal(_)));
        assert_eq!(err.status(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_upload_flow_with_red_boost_configured() {
        let mut config = ServerConfig::default();
        config.filters.upload_filter = "red".to_string();
        let pipeline = Pipeline::from_config(&config);

        let src = PixelBuffer::filled(1, 1, Pixel::rgb(0, 10, 20));
        let parser = StaticParser(Ok(FilePart {
            field_name: "file".into(),
            file_name: None,
            content_type: None,
            bytes: Bytes::from(png_of(&src)),
        }));

        let html = pipeline.upload(&parser, any_request()).await.unwrap();
        assert_eq!(extract_png(&html).get(0, 0), Some(Pixel::rgb(255, 10, 20)));
    }

    #[tokio::test]
    async fn test_upload_flow_propagates_parser_error() {
        let pipeline = Pipeline::from_config(&ServerConfig::default());
        let parser = StaticParser(Err(PipelineError::NoFileProvided));
        assert_eq!(
            pipeline.upload(&parser, any_request()).await,
            Err(PipelineError::NoFileProvided)
        );
    }

    #[test]
    fn test_unregistered_config_filter_falls_back() {
        let mut config = ServerConfig::default();
        config.filters.default_filter = "sepia".to_string();
        let pipeline = Pipeline::from_config(&config);
        let (name, _) = pipeline.resolve_filter("also-unknown");
        assert_eq!(name, "green");
    }
}
