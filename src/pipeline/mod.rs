//! Request pipeline subsystem.
//!
//! # Data Flow
//! ```text
//! inbound body
//!     → form.rs (multipart) or flows.rs FilterRequest (JSON + base64)
//!     → flows.rs (decode → filter → encode, off the async runtime)
//!     → template.rs (HTML fragment)
//!     → Result<String, PipelineError> handed to the HTTP layer
//! ```
//!
//! # Design Decisions
//! - Failures are values (`PipelineError`), mapped to status codes only by the HTTP layer
//! - Form parsing and templating sit behind traits so either can be swapped

pub mod error;
pub mod flows;
pub mod form;
pub mod template;

pub use error::PipelineError;
pub use flows::{decode_image_data, FilterRequest, Pipeline, ProcessedImage};
pub use form::{FilePart, FormParser, MultipartFormParser};
pub use template::{escape_html, SlotTemplater, Templater};
