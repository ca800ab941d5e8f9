//! Multipart form parsing for uploads.
//!
//! # Responsibilities
//! - Reject requests whose content type is not `multipart/form-data`
//! - Walk the form fields and return the first non-empty part with the
//!   expected field name
//! - Map multipart stream failures to pipeline errors (size overruns → 413)

use std::future::Future;

use axum::body::Bytes;
use axum::extract::multipart::MultipartError;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::{header, StatusCode};

use crate::pipeline::error::PipelineError;

/// A file extracted from a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub field_name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Extracts the uploaded file from an inbound request.
pub trait FormParser: Send + Sync {
    fn file_part(
        &self,
        request: Request,
    ) -> impl Future<Output = Result<FilePart, PipelineError>> + Send;
}

/// `FormParser` backed by axum's multipart extractor.
#[derive(Debug, Clone)]
pub struct MultipartFormParser {
    field_name: String,
}

impl MultipartFormParser {
    pub const DEFAULT_FIELD: &'static str = "file";

    pub fn new(field_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
        }
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }
}

impl Default for MultipartFormParser {
    fn default() -> Self {
        Self::new(Self::DEFAULT_FIELD)
    }
}

impl FormParser for MultipartFormParser {
    async fn file_part(&self, request: Request) -> Result<FilePart, PipelineError> {
        if !is_multipart(&request) {
            return Err(PipelineError::NoFileProvided);
        }

        let mut multipart = Multipart::from_request(request, &())
            .await
            .map_err(|rejection| PipelineError::malformed(rejection.body_text()))?;

        while let Some(field) = multipart.next_field().await.map_err(map_multipart_error)? {
            if field.name() != Some(self.field_name.as_str()) {
                continue;
            }
            let file_name = field.file_name().map(str::to_owned);
            let content_type = field.content_type().map(str::to_owned);
            let bytes = field.bytes().await.map_err(map_multipart_error)?;

            // Browsers submit an empty part when no file was chosen.
            if bytes.is_empty() {
                tracing::debug!(field = %self.field_name, "Skipping empty file part");
                continue;
            }

            return Ok(FilePart {
                field_name: self.field_name.clone(),
                file_name,
                content_type,
                bytes,
            });
        }

        Err(PipelineError::NoFileProvided)
    }
}

fn is_multipart(request: &Request) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim_start().to_ascii_lowercase().starts_with("multipart/form-data"))
        .unwrap_or(false)
}

fn map_multipart_error(err: MultipartError) -> PipelineError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        PipelineError::TooLarge(err.body_text())
    } else {
        PipelineError::malformed(err.body_text())
    }
}
