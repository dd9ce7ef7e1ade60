use crate::foundation::error::{GridError, GridResult};

pub use kurbo::{Affine, BezPath, Point, Rect, RoundedRect, Vec2};

/// Straight (non-premultiplied) RGBA8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const WHITE: Self = Self::opaque(255, 255, 255);
    pub const BLACK: Self = Self::opaque(0, 0, 0);

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

/// A rendered raster as RGBA8 pixels, tightly packed and row-major.
#[derive(Clone, Debug)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    /// Whether `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl Frame {
    /// Straight RGB8 copy of the frame, alpha discarded.
    ///
    /// Renderers always start from an opaque background, so dropping alpha is lossless for
    /// rendered grids.
    pub fn to_rgb8(&self) -> GridResult<image::RgbImage> {
        let expected = (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(4);
        if self.data.len() != expected {
            return Err(GridError::validation("frame byte len mismatch"));
        }
        let mut rgb = Vec::with_capacity((self.width as usize) * (self.height as usize) * 3);
        for px in self.data.chunks_exact(4) {
            let a = px[3];
            if !self.premultiplied || a == 255 || a == 0 {
                rgb.extend_from_slice(&px[..3]);
                continue;
            }
            let unpremul = |c: u8| -> u8 {
                ((u16::from(c) * 255 + u16::from(a) / 2) / u16::from(a)).min(255) as u8
            };
            rgb.extend_from_slice(&[unpremul(px[0]), unpremul(px[1]), unpremul(px[2])]);
        }
        image::RgbImage::from_raw(self.width, self.height, rgb)
            .ok_or_else(|| GridError::validation("frame dimensions do not match pixel data"))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
