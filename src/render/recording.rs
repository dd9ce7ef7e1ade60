//! A [`Surface`] that records draw calls instead of rasterizing them.

use kurbo::Shape;

use crate::assets::decode::DecodedImage;
use crate::foundation::core::{BezPath, Frame, Rect, Rgba8, RoundedRect};
use crate::foundation::error::{GridError, GridResult};
use crate::render::surface::{FontSpec, Readback, Surface, TextAnchor};

/// Advance of one character as a fraction of the font size.
pub const DEFAULT_ADVANCE: f64 = 0.6;

/// One recorded draw call. Paths are reduced to their bounding boxes.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    FillRect {
        rect: Rect,
        color: Rgba8,
    },
    FillPath {
        bounds: Rect,
        color: Rgba8,
    },
    StrokePath {
        bounds: Rect,
        width: f64,
        color: Rgba8,
    },
    StrokeRoundedRect {
        rect: RoundedRect,
        width: f64,
        color: Rgba8,
    },
    Image {
        dest: Rect,
        width: u32,
        height: u32,
    },
    Text {
        text: String,
        font: FontSpec,
        anchor: TextAnchor,
        color: Rgba8,
    },
}

/// Deterministic surface: text width is `chars * size * DEFAULT_ADVANCE`.
#[derive(Clone, Debug)]
pub struct RecordingSurface {
    width: u32,
    height: u32,
    rounded: bool,
    fail_images: bool,
    ops: Vec<DrawOp>,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            rounded: true,
            fail_images: false,
            ops: Vec::new(),
        }
    }

    /// Report no native rounded-rect support.
    pub fn without_rounded_rect(mut self) -> Self {
        self.rounded = false;
        self
    }

    /// Make every [`Surface::draw_image`] call fail.
    pub fn with_failing_images(mut self) -> Self {
        self.fail_images = true;
        self
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn clear(&mut self) {
        self.ops.clear();
    }

    /// Text ops in draw order.
    pub fn texts(&self) -> impl Iterator<Item = (&str, FontSpec, TextAnchor, Rgba8)> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text {
                text,
                font,
                anchor,
                color,
            } => Some((text.as_str(), *font, *anchor, *color)),
            _ => None,
        })
    }

    /// First text op whose string equals `text`.
    pub fn find_text(&self, text: &str) -> Option<(FontSpec, TextAnchor, Rgba8)> {
        self.texts()
            .find(|(t, ..)| *t == text)
            .map(|(_, f, a, c)| (f, a, c))
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba8) {
        self.ops.push(DrawOp::FillRect { rect, color });
    }

    fn fill_path(&mut self, path: &BezPath, color: Rgba8) {
        self.ops.push(DrawOp::FillPath {
            bounds: path.bounding_box(),
            color,
        });
    }

    fn stroke_path(&mut self, path: &BezPath, width: f64, color: Rgba8) {
        self.ops.push(DrawOp::StrokePath {
            bounds: path.bounding_box(),
            width,
            color,
        });
    }

    fn supports_rounded_rect(&self) -> bool {
        self.rounded
    }

    fn stroke_rounded_rect(&mut self, rect: RoundedRect, width: f64, color: Rgba8) -> GridResult<()> {
        if !self.rounded {
            return Err(GridError::validation("rounded rects disabled"));
        }
        self.ops.push(DrawOp::StrokeRoundedRect { rect, width, color });
        Ok(())
    }

    fn draw_image(&mut self, image: &DecodedImage, dest: Rect) -> GridResult<()> {
        if self.fail_images {
            return Err(GridError::decode("recording surface rejects images"));
        }
        self.ops.push(DrawOp::Image {
            dest,
            width: image.width,
            height: image.height,
        });
        Ok(())
    }

    fn measure_text(&mut self, text: &str, font: FontSpec) -> f64 {
        text.chars().count() as f64 * font.size * DEFAULT_ADVANCE
    }

    fn fill_text(&mut self, text: &str, font: FontSpec, anchor: TextAnchor, color: Rgba8) {
        self.ops.push(DrawOp::Text {
            text: text.to_string(),
            font,
            anchor,
            color,
        });
    }
}

impl Readback for RecordingSurface {
    /// Opaque white frame of the surface size; recorded ops are not rasterized.
    fn read_frame(&mut self) -> GridResult<Frame> {
        let len = (self.width as usize) * (self.height as usize) * 4;
        Ok(Frame {
            width: self.width,
            height: self.height,
            data: vec![255; len],
            premultiplied: true,
        })
    }
}
