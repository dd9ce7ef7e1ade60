//! Grid composition: turns a [`GridState`] into draw calls on a [`Surface`].

use crate::foundation::core::{Point, Rect, Rgba8};
use crate::foundation::error::{GridError, GridResult};
use crate::layout::geometry::{CellLayout, GridLayout};
use crate::model::cell::{Cell, CellId, GridState, ImageSlot};
use crate::model::config::CanvasConfig;
use crate::render::icon::{IconPlacement, program_for, run_icon};
use crate::render::surface::{FontSpec, Surface, TextAlign, TextAnchor, TextBaseline, rect_path};
use crate::render::text_fit::{shrink_to_fit, truncate_with_ellipsis};

pub const BACKGROUND: Rgba8 = Rgba8::WHITE;
pub const INK: Rgba8 = Rgba8::BLACK;
pub const HIGHLIGHT: Rgba8 = Rgba8::opaque(0x3b, 0x82, 0xf6);
pub const PLACEHOLDER_FILL: Rgba8 = Rgba8::opaque(0xf3, 0xf4, 0xf6);
pub const MUTED: Rgba8 = Rgba8::opaque(0x9c, 0xa3, 0xaf);
pub const NAME_INK: Rgba8 = Rgba8::opaque(0x4b, 0x55, 0x63);

/// Smallest main-title size, in layout units.
pub const MAIN_TITLE_MIN_SIZE: f64 = 12.0;
/// Smallest cell-title size, in layout units.
pub const CELL_TITLE_MIN_SIZE: f64 = 10.0;
/// Placeholder icon edge as a fraction of the shorter cover side.
pub const ICON_FRACTION: f64 = 0.4;
/// Placeholder icon stroke width, in layout units.
pub const ICON_LINE_WIDTH: f64 = 3.0;

/// Per-frame inputs that are not part of the grid state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameState {
    pub drag_over: Option<CellId>,
    pub scale: f64,
}

impl FrameState {
    pub fn interactive(drag_over: Option<CellId>) -> Self {
        Self {
            drag_over,
            scale: 1.0,
        }
    }

    pub fn export(scale: f64) -> Self {
        Self {
            drag_over: None,
            scale,
        }
    }
}

/// What happened while drawing one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameReport {
    /// Cells whose decoded image could not be drawn; they show the placeholder instead.
    pub failed_cells: Vec<CellId>,
    /// Whether borders used the surface's rounded-rect primitive.
    pub rounded_borders: bool,
}

/// Draw the whole grid at `frame.scale`.
///
/// The surface must be exactly `config.pixel_size(frame.scale)`. Per-cell image failures never
/// abort the frame; they degrade to the placeholder and are listed in the report.
#[tracing::instrument(level = "debug", skip_all, fields(scale = frame.scale, cells = state.len()))]
pub fn render_grid(
    surface: &mut dyn Surface,
    state: &GridState,
    frame: FrameState,
    config: &CanvasConfig,
) -> GridResult<FrameReport> {
    if !frame.scale.is_finite() || frame.scale <= 0.0 {
        return Err(GridError::validation("render scale must be finite and > 0"));
    }
    let expected = config.pixel_size(frame.scale);
    if surface.size() != expected {
        return Err(GridError::validation(format!(
            "surface is {:?}, expected {:?} for scale {}",
            surface.size(),
            expected,
            frame.scale
        )));
    }

    let layout = GridLayout::new(config, frame.scale);
    let c = &layout.config;
    let mut report = FrameReport {
        rounded_borders: surface.supports_rounded_rect(),
        ..FrameReport::default()
    };

    surface.fill_rect(Rect::new(0.0, 0.0, c.width, c.height), BACKGROUND);

    draw_fitted_line(
        surface,
        &state.global.main_title,
        FontSpec::bold(c.title_font_size),
        layout.main_title_max_width,
        MAIN_TITLE_MIN_SIZE * layout.scale,
        TextAnchor::new(layout.main_title_center, TextAlign::Center, TextBaseline::Middle),
        INK,
    );

    for cell in state.cells() {
        let Some(cl) = layout.cells.get(cell.id.index()) else {
            continue;
        };
        let highlighted = frame.drag_over == Some(cell.id);
        draw_border(surface, cl, c, highlighted, report.rounded_borders);
        if !draw_cover(surface, cell, cl, &layout) {
            report.failed_cells.push(cell.id);
        }
        draw_cell_text(surface, cell, cl, &layout);
    }

    if !c.watermark.is_empty() {
        surface.fill_text(
            &c.watermark,
            FontSpec::regular(c.watermark_font_size),
            TextAnchor::new(layout.watermark_anchor, TextAlign::Right, TextBaseline::Alphabetic),
            MUTED,
        );
    }

    if !report.failed_cells.is_empty() {
        tracing::warn!(cells = ?report.failed_cells, "drew placeholders for failed images");
    }
    Ok(report)
}

fn draw_border(
    surface: &mut dyn Surface,
    cl: &CellLayout,
    c: &CanvasConfig,
    highlighted: bool,
    rounded: bool,
) {
    let (color, width) = if highlighted {
        (HIGHLIGHT, c.cell_border_width * 2.0)
    } else {
        (INK, c.cell_border_width)
    };
    if rounded && surface.stroke_rounded_rect(cl.border, width, color).is_ok() {
        return;
    }
    surface.stroke_path(&rect_path(cl.border.rect()), width, color);
}

/// Returns `false` when a decoded image failed to draw.
fn draw_cover(surface: &mut dyn Surface, cell: &Cell, cl: &CellLayout, layout: &GridLayout) -> bool {
    if let ImageSlot::Ready { image, .. } = &cell.image_obj {
        match surface.draw_image(image, cl.cover) {
            Ok(()) => return true,
            Err(err) => {
                tracing::debug!(cell = %cell.id, %err, "cover draw failed");
                draw_placeholder(surface, cl.cover, layout);
                return false;
            }
        }
    }
    draw_placeholder(surface, cl.cover, layout);
    true
}

/// Flat fill plus the configured icon, centred.
pub fn draw_placeholder(surface: &mut dyn Surface, cover: Rect, layout: &GridLayout) {
    surface.fill_rect(cover, PLACEHOLDER_FILL);
    let size = cover.width().min(cover.height()) * ICON_FRACTION;
    let origin = Point::new(
        cover.x0 + (cover.width() - size) / 2.0,
        cover.y0 + (cover.height() - size) / 2.0,
    );
    run_icon(
        surface,
        program_for(layout.config.placeholder_icon),
        IconPlacement {
            origin,
            size,
            color: MUTED,
            line_width: ICON_LINE_WIDTH * layout.scale,
        },
    );
}

fn draw_cell_text(surface: &mut dyn Surface, cell: &Cell, cl: &CellLayout, layout: &GridLayout) {
    let c = &layout.config;
    draw_fitted_line(
        surface,
        &cell.title,
        FontSpec::regular(c.cell_title_font_size),
        cl.title_max_width,
        CELL_TITLE_MIN_SIZE * layout.scale,
        TextAnchor::new(
            Point::new(cl.text_center_x, cl.title_center_y),
            TextAlign::Center,
            TextBaseline::Middle,
        ),
        INK,
    );

    if let Some(name) = cell.name.as_deref().filter(|n| !n.is_empty()) {
        let font = FontSpec::regular(c.cell_name_font_size);
        let shown = truncate_with_ellipsis(name, cl.name_max_width, |s| surface.measure_text(s, font));
        surface.fill_text(
            &shown,
            font,
            TextAnchor::new(
                Point::new(cl.text_center_x, cl.name_baseline_y),
                TextAlign::Center,
                TextBaseline::Alphabetic,
            ),
            NAME_INK,
        );
    }
}

/// Shrink `text` until it fits on one line, then draw it.
fn draw_fitted_line(
    surface: &mut dyn Surface,
    text: &str,
    base: FontSpec,
    available: f64,
    floor: f64,
    anchor: TextAnchor,
    color: Rgba8,
) {
    if text.is_empty() {
        return;
    }
    let measured = surface.measure_text(text, base);
    let font = FontSpec {
        size: shrink_to_fit(measured, base.size, available, floor),
        ..base
    };
    surface.fill_text(text, font, anchor, color);
}

#[cfg(test)]
#[path = "../../tests/unit/render/grid.rs"]
mod tests;
