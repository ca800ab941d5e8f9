//! Typed failures of the request pipelines.

use axum::http::StatusCode;
use thiserror::Error;

use crate::imaging::{DecodeError, EncodeError};

/// Everything a pipeline can fail with. Converted to a status only at the
/// HTTP boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// Body missing, not the expected JSON, or carrying invalid base64.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Multipart body without a usable file part (or not multipart at all).
    #[error("No file provided")]
    NoFileProvided,

    /// Body exceeded the configured size limit.
    #[error("Payload too large: {0}")]
    TooLarge(String),

    #[error("Failed to decode image: {0}")]
    Decode(#[from] DecodeError),

    #[error("Failed to encode image: {0}")]
    Encode(#[from] EncodeError),

    #[error("Image processing timed out after {0} ms")]
    ProcessingTimeout(u64),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedInput(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::MalformedInput(_) | Self::NoFileProvided => StatusCode::BAD_REQUEST,
            Self::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Decode(_) | Self::Encode(_) | Self::ProcessingTimeout(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Short label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedInput(_) => "malformed_input",
            Self::NoFileProvided => "no_file_provided",
            Self::TooLarge(_) => "payload_too_large",
            Self::Decode(_) => "decode_error",
            Self::Encode(_) => "encode_error",
            Self::ProcessingTimeout(_) => "processing_timeout",
            Self::Internal(_) => "internal_failure",
        }
    }
}
