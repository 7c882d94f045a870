//! Math types and glam re-exports.
//!
//! We re-export the [glam](https://docs.rs/glam) types that appear in the
//! public API so users don't need to depend on it directly. [`Color`] is the
//! exact 4-byte layout written into the batch color stream; [`Rect`] is the
//! pixel-space rectangle used for scissor regions and texture sub-regions.

pub use glam::{Mat4, Vec2, Vec3, Vec4};

/// An RGBA color with 8-bit components.
///
/// This is the wire format of the batch color stream: one `[u8; 4]` per
/// vertex, normalized to `[0, 1]` by the GPU on fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const RED: Self = Self::rgb(230, 41, 55);
    pub const GREEN: Self = Self::rgb(0, 228, 48);
    pub const BLUE: Self = Self::rgb(0, 121, 241);
    /// Fully transparent black.
    pub const BLANK: Self = Self::rgba(0, 0, 0, 0);

    /// Create a color from RGB components (alpha = 255).
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Create a color from RGBA components.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create a color from floating-point components in `[0, 1]`.
    pub fn from_normalized(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self {
            r: (r.clamp(0.0, 1.0) * 255.0) as u8,
            g: (g.clamp(0.0, 1.0) * 255.0) as u8,
            b: (b.clamp(0.0, 1.0) * 255.0) as u8,
            a: (a.clamp(0.0, 1.0) * 255.0) as u8,
        }
    }

    /// The color as the byte quadruple stored per vertex.
    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// An axis-aligned rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }
}
