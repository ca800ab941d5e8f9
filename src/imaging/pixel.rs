//! Pixel and PixelBuffer value types.
//!
//! # Layout
//! Pixels are stored densely in row-major order: the pixel at `(x, y)` lives at
//! index `y * width + x`. The buffer always holds exactly `width * height`
//! entries, so there is no jagged or sparse representation.
//!
//! # Design Decisions
//! - Value semantics: buffers are `Clone` + `PartialEq` and never mutated after
//!   construction. Transforms produce new buffers.
//! - Dimensions are `u32` to match the codec's native size type.

use thiserror::Error;

/// A single RGBA pixel with 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Pixel {
    pub const TRANSPARENT: Pixel = Pixel::rgba(0, 0, 0, 0);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Fully opaque pixel.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl From<[u8; 4]> for Pixel {
    fn from([r, g, b, a]: [u8; 4]) -> Self {
        Self { r, g, b, a }
    }
}

impl From<Pixel> for [u8; 4] {
    fn from(p: Pixel) -> Self {
        p.to_array()
    }
}

/// Raised when raw pixel data does not match the declared dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("pixel data has {actual} entries, expected {expected} for {width}x{height}")]
pub struct DimensionMismatch {
    pub width: u32,
    pub height: u32,
    pub expected: usize,
    pub actual: usize,
}

/// A dense `width × height` grid of RGBA pixels.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<Pixel>,
}

impl PixelBuffer {
    /// Build a buffer from row-major pixels, checking the count invariant.
    pub fn new(width: u32, height: u32, pixels: Vec<Pixel>) -> Result<Self, DimensionMismatch> {
        let expected = cell_count(width, height);
        if pixels.len() != expected {
            return Err(DimensionMismatch {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self { width, height, pixels })
    }

    /// Build a buffer by evaluating `f(x, y)` once for every coordinate.
    pub fn from_fn<F>(width: u32, height: u32, mut f: F) -> Self
    where
        F: FnMut(u32, u32) -> Pixel,
    {
        let mut pixels = Vec::with_capacity(cell_count(width, height));
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Self { width, height, pixels }
    }

    /// A buffer where every cell holds `pixel`.
    pub fn filled(width: u32, height: u32, pixel: Pixel) -> Self {
        Self {
            width,
            height,
            pixels: vec![pixel; cell_count(width, height)],
        }
    }

    /// Build a buffer from packed RGBA8 bytes (4 bytes per pixel, row-major).
    pub fn from_rgba_bytes(
        width: u32,
        height: u32,
        bytes: &[u8],
    ) -> Result<Self, DimensionMismatch> {
        let expected = cell_count(width, height);
        if bytes.len() != expected * 4 {
            return Err(DimensionMismatch {
                width,
                height,
                expected,
                actual: bytes.len() / 4,
            });
        }
        let pixels = bytes
            .chunks_exact(4)
            .map(|c| Pixel::rgba(c[0], c[1], c[2], c[3]))
            .collect();
        Ok(Self { width, height, pixels })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Number of cells (`width * height`).
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    /// Pixel at `(x, y)`, or `None` when out of bounds.
    pub fn get(&self, x: u32, y: u32) -> Option<Pixel> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(self.index(x, y)).copied()
    }

    /// Row-major view of all pixels.
    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    /// Iterate `(x, y, pixel)` in row-major order.
    pub fn enumerate(&self) -> impl Iterator<Item = (u32, u32, Pixel)> + '_ {
        let width = self.width.max(1);
        self.pixels.iter().enumerate().map(move |(i, p)| {
            let i = i as u64;
            ((i % width as u64) as u32, (i / width as u64) as u32, *p)
        })
    }

    /// Packed RGBA8 bytes, row-major.
    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|p| p.to_array()).collect()
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

fn cell_count(width: u32, height: u32) -> usize {
    width as usize * height as usize
}
