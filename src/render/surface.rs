//! Drawing target abstraction used by the grid renderer.

use crate::assets::decode::DecodedImage;
use crate::foundation::core::{BezPath, Frame, Point, Rect, Rgba8, RoundedRect};
use crate::foundation::error::{GridError, GridResult};

/// Font request: pixel size and weight. The family is owned by the surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FontSpec {
    pub size: f64,
    pub bold: bool,
}

impl FontSpec {
    pub fn regular(size: f64) -> Self {
        Self { size, bold: false }
    }

    pub fn bold(size: f64) -> Self {
        Self { size, bold: true }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

/// Which horizontal line of the text box the anchor's `y` refers to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextBaseline {
    #[default]
    Alphabetic,
    Middle,
}

/// Placement of a single line of text.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextAnchor {
    pub at: Point,
    pub align: TextAlign,
    pub baseline: TextBaseline,
}

impl TextAnchor {
    pub fn new(at: Point, align: TextAlign, baseline: TextBaseline) -> Self {
        Self {
            at,
            align,
            baseline,
        }
    }
}

/// A 2D raster target. All coordinates are surface pixels.
pub trait Surface {
    /// Pixel size of the target.
    fn size(&self) -> (u32, u32);

    fn fill_rect(&mut self, rect: Rect, color: Rgba8);

    fn fill_path(&mut self, path: &BezPath, color: Rgba8);

    /// Stroke centred on `path` with butt caps and miter joins.
    fn stroke_path(&mut self, path: &BezPath, width: f64, color: Rgba8);

    /// Whether [`Surface::stroke_rounded_rect`] is implemented natively.
    fn supports_rounded_rect(&self) -> bool {
        false
    }

    fn stroke_rounded_rect(&mut self, _rect: RoundedRect, _width: f64, _color: Rgba8) -> GridResult<()> {
        Err(GridError::validation("surface has no rounded-rect primitive"))
    }

    /// Draw `image` stretched to `dest`.
    fn draw_image(&mut self, image: &DecodedImage, dest: Rect) -> GridResult<()>;

    /// Advance width of `text` as a single unwrapped line.
    fn measure_text(&mut self, text: &str, font: FontSpec) -> f64;

    fn fill_text(&mut self, text: &str, font: FontSpec, anchor: TextAnchor, color: Rgba8);
}

/// A surface whose drawing can be read back as pixels.
pub trait Readback {
    /// Rasterize everything drawn so far and return the pixels.
    fn read_frame(&mut self) -> GridResult<Frame>;
}

/// Rounded rectangle outline built from lines and quadratic corners.
///
/// Used where a surface cannot draw rounded rectangles itself. The radius is clamped to half
/// of the shorter side.
pub fn rounded_rect_path(rect: Rect, radius: f64) -> BezPath {
    let r = radius.max(0.0).min(rect.width() / 2.0).min(rect.height() / 2.0);
    let (x0, y0, x1, y1) = (rect.x0, rect.y0, rect.x1, rect.y1);
    let mut p = BezPath::new();
    p.move_to((x0 + r, y0));
    p.line_to((x1 - r, y0));
    p.quad_to((x1, y0), (x1, y0 + r));
    p.line_to((x1, y1 - r));
    p.quad_to((x1, y1), (x1 - r, y1));
    p.line_to((x0 + r, y1));
    p.quad_to((x0, y1), (x0, y1 - r));
    p.line_to((x0, y0 + r));
    p.quad_to((x0, y0), (x0 + r, y0));
    p.close_path();
    p
}

/// Closed rectangle outline.
pub fn rect_path(rect: Rect) -> BezPath {
    let mut p = BezPath::new();
    p.move_to((rect.x0, rect.y0));
    p.line_to((rect.x1, rect.y0));
    p.line_to((rect.x1, rect.y1));
    p.line_to((rect.x0, rect.y1));
    p.close_path();
    p
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
