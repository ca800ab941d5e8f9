//! Imaging subsystem.
//!
//! # Data Flow
//! ```text
//! encoded bytes (PNG/JPEG/...)
//!     → codec.rs decode (format sniffing, limits)
//!     → PixelBuffer (pixel.rs, dense RGBA grid)
//!     → filter.rs apply (pure per-pixel map, new buffer)
//!     → codec.rs encode (always PNG)
//!     → bytes
//! ```

pub mod codec;
pub mod filter;
pub mod pixel;

pub use codec::{decode, encode, DecodeError, DecodeLimits, EncodeError};
pub use filter::{apply, FilterFunction, FilterRegistry, NamedFilter};
pub use pixel::{DimensionMismatch, Pixel, PixelBuffer};
