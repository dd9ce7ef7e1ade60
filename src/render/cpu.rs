//! CPU raster surface: `vello_cpu` for fills and images, `parley` for text shaping.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use kurbo::{Cap, Join, Shape, Stroke, StrokeOpts};

use crate::assets::decode::DecodedImage;
use crate::foundation::core::{Affine, BezPath, Frame, Rect, Rgba8, RoundedRect};
use crate::foundation::error::{GridError, GridResult};
use crate::render::recording::DEFAULT_ADVANCE;
use crate::render::surface::{FontSpec, Readback, Surface, TextAlign, TextAnchor, TextBaseline};

const PATH_TOLERANCE: f64 = 0.1;

/// Shapes single lines of text with one caller-provided font.
struct TextShaper {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<()>,
    family: String,
    font: vello_cpu::peniko::FontData,
}

impl TextShaper {
    fn new(font_bytes: Vec<u8>) -> GridResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.clone()), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| GridError::validation("no font families registered from font bytes"))?;
        let family = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| GridError::validation("registered font family has no name"))?
            .to_string();
        tracing::debug!(%family, "registered font");

        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family,
            font: vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(font_bytes), 0),
        })
    }

    fn layout(&mut self, text: &str, font: FontSpec) -> parley::Layout<()> {
        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(self.family.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(font.size as f32));
        if font.bold {
            builder.push_default(parley::style::StyleProperty::FontWeight(
                parley::style::FontWeight::BOLD,
            ));
        }
        let mut layout: parley::Layout<()> = builder.build(text);
        layout.break_all_lines(None);
        layout
    }
}

/// Raster surface backed by a `vello_cpu` render context.
///
/// Draw calls are recorded into the context and rasterized by [`CpuSurface::finish`]. Without a
/// font, text is measured with a fixed advance and not drawn.
pub struct CpuSurface {
    ctx: vello_cpu::RenderContext,
    width: u16,
    height: u16,
    text: Option<TextShaper>,
    images: HashMap<usize, (Arc<Vec<u8>>, vello_cpu::Image)>,
}

impl std::fmt::Debug for CpuSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuSurface")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("font", &self.text.as_ref().map(|t| t.family.as_str()))
            .field("cached_images", &self.images.len())
            .finish()
    }
}

impl CpuSurface {
    pub fn new(width: u32, height: u32) -> GridResult<Self> {
        let w: u16 = width
            .try_into()
            .map_err(|_| GridError::validation("surface width exceeds u16"))?;
        let h: u16 = height
            .try_into()
            .map_err(|_| GridError::validation("surface height exceeds u16"))?;
        if w == 0 || h == 0 {
            return Err(GridError::validation("surface size must be non-zero"));
        }
        Ok(Self {
            ctx: vello_cpu::RenderContext::new(w, h),
            width: w,
            height: h,
            text: None,
            images: HashMap::new(),
        })
    }

    /// Shape and draw text with the font in `font_bytes` (TTF/OTF, face 0).
    pub fn with_font(mut self, font_bytes: Vec<u8>) -> GridResult<Self> {
        self.text = Some(TextShaper::new(font_bytes)?);
        Ok(self)
    }

    pub fn has_font(&self) -> bool {
        self.text.is_some()
    }

    /// Rasterize everything drawn since the last call and start a fresh frame.
    #[tracing::instrument(level = "debug", skip(self), fields(w = self.width, h = self.height))]
    pub fn finish(&mut self) -> GridResult<Frame> {
        let mut pixmap = vello_cpu::Pixmap::new(self.width, self.height);
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut pixmap);
        self.ctx.reset();
        self.images
            .retain(|_, (bytes, _)| Arc::strong_count(bytes) > 1);

        Ok(Frame {
            width: u32::from(self.width),
            height: u32::from(self.height),
            data: pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }

    fn set_solid(&mut self, color: Rgba8) {
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx
            .set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
            color.r, color.g, color.b, color.a,
        ));
    }

    fn image_paint_for(&mut self, image: &DecodedImage) -> GridResult<vello_cpu::Image> {
        let key = Arc::as_ptr(&image.rgba8_premul) as usize;
        if let Some((_, paint)) = self.images.get(&key) {
            return Ok(paint.clone());
        }
        let pixmap = pixmap_from_premul_bytes(&image.rgba8_premul, image.width, image.height)?;
        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };
        self.images
            .insert(key, (image.rgba8_premul.clone(), paint.clone()));
        Ok(paint)
    }
}

impl Surface for CpuSurface {
    fn size(&self) -> (u32, u32) {
        (u32::from(self.width), u32::from(self.height))
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba8) {
        self.set_solid(color);
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            rect.x0, rect.y0, rect.x1, rect.y1,
        ));
    }

    fn fill_path(&mut self, path: &BezPath, color: Rgba8) {
        self.set_solid(color);
        self.ctx.fill_path(&bezpath_to_cpu(path));
    }

    fn stroke_path(&mut self, path: &BezPath, width: f64, color: Rgba8) {
        let style = Stroke::new(width).with_join(Join::Miter).with_caps(Cap::Butt);
        let outline = kurbo::stroke(
            path.elements().iter().copied(),
            &style,
            &StrokeOpts::default(),
            PATH_TOLERANCE,
        );
        self.fill_path(&outline, color);
    }

    fn supports_rounded_rect(&self) -> bool {
        true
    }

    fn stroke_rounded_rect(&mut self, rect: RoundedRect, width: f64, color: Rgba8) -> GridResult<()> {
        self.stroke_path(&rect.to_path(PATH_TOLERANCE), width, color);
        Ok(())
    }

    fn draw_image(&mut self, image: &DecodedImage, dest: Rect) -> GridResult<()> {
        if image.width == 0 || image.height == 0 {
            return Err(GridError::decode("image has no pixels"));
        }
        let paint = self.image_paint_for(image)?;
        let sx = dest.width() / f64::from(image.width);
        let sy = dest.height() / f64::from(image.height);
        let tr = Affine::new([sx, 0.0, 0.0, sy, dest.x0, dest.y0]);

        self.ctx.set_transform(affine_to_cpu(tr));
        self.ctx
            .set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(paint);
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(image.width),
            f64::from(image.height),
        ));
        Ok(())
    }

    fn measure_text(&mut self, text: &str, font: FontSpec) -> f64 {
        match self.text.as_mut() {
            Some(shaper) => f64::from(shaper.layout(text, font).width()),
            None => text.chars().count() as f64 * font.size * DEFAULT_ADVANCE,
        }
    }

    fn fill_text(&mut self, text: &str, font: FontSpec, anchor: TextAnchor, color: Rgba8) {
        let Some(shaper) = self.text.as_mut() else {
            tracing::debug!(text, "no font registered; skipping text");
            return;
        };
        let layout = shaper.layout(text, font);
        let Some(line) = layout.lines().next() else {
            return;
        };
        let metrics = line.metrics();
        let width = f64::from(layout.width());
        let left = match anchor.align {
            TextAlign::Left => anchor.at.x,
            TextAlign::Center => anchor.at.x - width / 2.0,
            TextAlign::Right => anchor.at.x - width,
        };
        let baseline = f64::from(metrics.baseline);
        let top = match anchor.baseline {
            TextBaseline::Alphabetic => anchor.at.y - baseline,
            TextBaseline::Middle => {
                let em_middle = baseline - f64::from(metrics.ascent - metrics.descent) / 2.0;
                anchor.at.y - em_middle
            }
        };

        self.ctx
            .set_transform(affine_to_cpu(Affine::translate((left, top))));
        self.ctx
            .set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
            color.r, color.g, color.b, color.a,
        ));
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };
            let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x,
                y: g.y,
            });
            self.ctx
                .glyph_run(&shaper.font)
                .font_size(run.run().font_size())
                .fill_glyphs(glyphs);
        }
    }
}

impl Readback for CpuSurface {
    fn read_frame(&mut self) -> GridResult<Frame> {
        self.finish()
    }
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let pt = |p: kurbo::Point| vello_cpu::kurbo::Point::new(p.x, p.y);
    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(pt(p)),
            PathEl::LineTo(p) => out.line_to(pt(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(pt(p1), pt(p2)),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(pt(p1), pt(p2), pt(p3)),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn pixmap_from_premul_bytes(bytes: &[u8], width: u32, height: u32) -> GridResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| GridError::decode("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| GridError::decode("image height exceeds u16"))?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(GridError::decode("image byte len mismatch"));
    }
    let pixels = bytes
        .chunks_exact(4)
        .map(|px| vello_cpu::peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]]))
        .collect::<Vec<_>>();
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, true))
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
