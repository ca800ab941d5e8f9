//! Codec adapter between encoded image bytes and `PixelBuffer`.
//!
//! # Responsibilities
//! - Sniff the container format from magic bytes and decode to RGBA8
//! - Enforce dimension and allocation limits before pixel data is allocated
//! - Encode a `PixelBuffer` as PNG (alpha preserved)
//!
//! Stateless: every call builds its own reader/encoder.

use std::io::Cursor;

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageError, ImageFormat, ImageReader, Limits};
use thiserror::Error;

use super::pixel::PixelBuffer;

/// Errors raised while turning bytes into pixels.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("image data is empty")]
    Empty,

    #[error("unrecognized image format")]
    UnknownFormat,

    #[error("image exceeds decode limits: {0}")]
    LimitsExceeded(String),

    #[error("failed to decode {format}: {message}")]
    Invalid { format: String, message: String },
}

/// Errors raised while turning pixels into PNG bytes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("cannot encode an image with zero width or height")]
    EmptyImage,

    #[error("failed to encode PNG: {0}")]
    Png(String),
}

/// Upper bounds applied while decoding untrusted input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    pub max_width: u32,
    pub max_height: u32,
    pub max_alloc_bytes: u64,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_width: 8192,
            max_height: 8192,
            max_alloc_bytes: 256 * 1024 * 1024,
        }
    }
}

impl DecodeLimits {
    fn to_image_limits(self) -> Limits {
        let mut limits = Limits::default();
        limits.max_image_width = Some(self.max_width);
        limits.max_image_height = Some(self.max_height);
        limits.max_alloc = Some(self.max_alloc_bytes);
        limits
    }
}

/// Decode PNG/JPEG/GIF/BMP/WebP bytes into an RGBA pixel buffer.
///
/// The format is detected from the leading magic bytes; any file extension or
/// declared content type is ignored.
pub fn decode(bytes: &[u8], limits: DecodeLimits) -> Result<PixelBuffer, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }

    let mut reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::Invalid {
            format: "image".to_string(),
            message: e.to_string(),
        })?;
    let format = reader.format().ok_or(DecodeError::UnknownFormat)?;
    reader.limits(limits.to_image_limits());

    let image = reader.decode().map_err(|e| map_image_error(format, e))?;
    let rgba = image.into_rgba8();
    let (width, height) = rgba.dimensions();

    PixelBuffer::from_rgba_bytes(width, height, rgba.as_raw()).map_err(|e| DecodeError::Invalid {
        format: format_label(format).to_string(),
        message: e.to_string(),
    })
}

/// Encode a pixel buffer as an RGBA8 PNG.
pub fn encode(buffer: &PixelBuffer) -> Result<Vec<u8>, EncodeError> {
    let (width, height) = buffer.dimensions();
    if width == 0 || height == 0 {
        return Err(EncodeError::EmptyImage);
    }

    let raw = buffer.to_rgba_bytes();
    let mut out = Vec::with_capacity(raw.len() / 2);
    PngEncoder::new(Cursor::new(&mut out))
        .write_image(&raw, width, height, ExtendedColorType::Rgba8)
        .map_err(|e| EncodeError::Png(e.to_string()))?;
    Ok(out)
}

fn map_image_error(format: ImageFormat, err: ImageError) -> DecodeError {
    match err {
        ImageError::Limits(e) => DecodeError::LimitsExceeded(e.to_string()),
        other => DecodeError::Invalid {
            format: format_label(format).to_string(),
            message: other.to_string(),
        },
    }
}

fn format_label(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "PNG",
        ImageFormat::Jpeg => "JPEG",
        ImageFormat::Gif => "GIF",
        ImageFormat::Bmp => "BMP",
        ImageFormat::WebP => "WebP",
        _ => "image",
    }
}
