//! Per-pixel filter engine.
//!
//! A filter maps `(x, y, pixel)` to a new pixel with no access to neighbours, so
//! every cell can be computed independently. `apply` always produces a fresh
//! buffer and never touches its input.

use std::collections::BTreeMap;

use super::pixel::{Pixel, PixelBuffer};

/// A pure per-pixel transform.
///
/// Implemented for every `Fn(u32, u32, Pixel) -> Pixel`, so plain functions and
/// closures can be passed straight to [`apply`].
pub trait FilterFunction: Send + Sync {
    fn map_pixel(&self, x: u32, y: u32, pixel: Pixel) -> Pixel;
}

impl<F> FilterFunction for F
where
    F: Fn(u32, u32, Pixel) -> Pixel + Send + Sync,
{
    fn map_pixel(&self, x: u32, y: u32, pixel: Pixel) -> Pixel {
        self(x, y, pixel)
    }
}

/// Apply `filter` to every cell of `input`, exactly once per coordinate.
pub fn apply<F>(filter: &F, input: &PixelBuffer) -> PixelBuffer
where
    F: FilterFunction + ?Sized,
{
    let width = input.width();
    let mut source = input.pixels().iter();
    PixelBuffer::from_fn(width, input.height(), |x, y| {
        // from_fn walks row-major, same order as the backing storage.
        let pixel = source.next().copied().unwrap_or_default();
        filter.map_pixel(x, y, pixel)
    })
}

/// Signature of the built-in named filters.
pub type NamedFilter = fn(u32, u32, Pixel) -> Pixel;

pub fn identity(_x: u32, _y: u32, p: Pixel) -> Pixel {
    p
}

/// Forces the green channel to full intensity.
pub fn green_boost(_x: u32, _y: u32, p: Pixel) -> Pixel {
    Pixel { g: 255, ..p }
}

/// Forces the red channel to full intensity.
pub fn red_boost(_x: u32, _y: u32, p: Pixel) -> Pixel {
    Pixel { r: 255, ..p }
}

pub fn blue_boost(_x: u32, _y: u32, p: Pixel) -> Pixel {
    Pixel { b: 255, ..p }
}

/// Swaps the red and blue channels.
pub fn swap_red_blue(_x: u32, _y: u32, p: Pixel) -> Pixel {
    Pixel { r: p.b, b: p.r, ..p }
}

pub fn invert(_x: u32, _y: u32, p: Pixel) -> Pixel {
    Pixel {
        r: 255 - p.r,
        g: 255 - p.g,
        b: 255 - p.b,
        a: p.a,
    }
}

/// ITU-R BT.601 luma, alpha untouched.
pub fn grayscale(_x: u32, _y: u32, p: Pixel) -> Pixel {
    let luma = (299 * p.r as u32 + 587 * p.g as u32 + 114 * p.b as u32 + 500) / 1000;
    let l = luma.min(255) as u8;
    Pixel { r: l, g: l, b: l, a: p.a }
}

/// Fixed name → filter table used to resolve the `filter` field of requests.
/// Only the built-in filters are ever registered.
#[derive(Debug, Clone)]
pub struct FilterRegistry {
    filters: BTreeMap<&'static str, NamedFilter>,
}

impl FilterRegistry {
    pub const IDENTITY: &'static str = "identity";
    pub const GREEN: &'static str = "green";
    pub const RED: &'static str = "red";

    fn empty() -> Self {
        Self { filters: BTreeMap::new() }
    }

    /// Registry with all built-in filters.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(Self::IDENTITY, identity);
        registry.register(Self::GREEN, green_boost);
        registry.register(Self::RED, red_boost);
        registry.register("blue", blue_boost);
        registry.register("swap-rb", swap_red_blue);
        registry.register("invert", invert);
        registry.register("grayscale", grayscale);
        registry
    }

    fn register(&mut self, name: &'static str, filter: NamedFilter) {
        self.filters.insert(name, filter);
    }

    /// Case-insensitive lookup; surrounding whitespace is ignored.
    pub fn get(&self, name: &str) -> Option<NamedFilter> {
        let key = name.trim().to_ascii_lowercase();
        self.filters.get(key.as_str()).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.filters.keys().copied()
    }
}

impl Default for FilterRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
