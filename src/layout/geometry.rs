//! Pure geometry over a [`CanvasConfig`]: pointer hit testing and per-cell layout rectangles.
//!
//! Hit testing works in unscaled layout units. Layout rectangles are produced for any scale
//! factor so the renderer can draw the same design at 1x and 2x.

use crate::foundation::core::{Point, Rect, RoundedRect};
use crate::model::cell::CellId;
use crate::model::config::CanvasConfig;

/// Fraction of the cell height (from the top) that belongs to the cover image band.
pub const IMAGE_BAND_END: f64 = 0.75;
/// Fraction of the cell height where the title band ends and the name band begins.
pub const TITLE_BAND_END: f64 = 0.90;

/// Vertical click band inside a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubRegion {
    Image,
    Title,
    Name,
}

/// What a canvas point addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HitTarget {
    MainTitle,
    Cell(CellId, SubRegion),
}

/// Grid content rectangle (inside padding, below the title band).
pub fn grid_rect(config: &CanvasConfig) -> Rect {
    let top = config.grid_top();
    Rect::new(
        config.padding,
        top,
        config.width - config.padding,
        config.height - config.padding,
    )
}

/// Per-cell width and height.
pub fn cell_size(config: &CanvasConfig) -> (f64, f64) {
    let grid = grid_rect(config);
    (
        grid.width() / f64::from(config.grid_cols),
        grid.height() / f64::from(config.grid_rows),
    )
}

/// Rectangle of cell `id`, or `None` when the id is outside the grid.
pub fn cell_rect(config: &CanvasConfig, id: CellId) -> Option<Rect> {
    if id.index() >= config.cell_count() {
        return None;
    }
    let (cw, ch) = cell_size(config);
    let row = f64::from(id.0 / config.grid_cols);
    let col = f64::from(id.0 % config.grid_cols);
    let x = config.padding + col * cw;
    let y = config.grid_top() + row * ch;
    Some(Rect::new(x, y, x + cw, y + ch))
}

/// Cell under `(x, y)`, using half-open `[start, end)` intervals on both axes.
pub fn cell_index_at(config: &CanvasConfig, x: f64, y: f64) -> Option<CellId> {
    let grid = grid_rect(config);
    if !(x >= grid.x0 && x < grid.x1 && y >= grid.y0 && y < grid.y1) {
        return None;
    }
    let (cw, ch) = cell_size(config);
    let col = (((x - grid.x0) / cw).floor() as u32).min(config.grid_cols - 1);
    let row = (((y - grid.y0) / ch).floor() as u32).min(config.grid_rows - 1);
    Some(CellId(row * config.grid_cols + col))
}

/// Band of cell `id` containing `(x, y)`; `None` when the point lies outside that cell.
///
/// The bands are a fixed policy (image 0..75%, title 75..90%, name 90..100% of the cell
/// height), independent of font metrics.
pub fn sub_region_at(config: &CanvasConfig, x: f64, y: f64, id: CellId) -> Option<SubRegion> {
    let rect = cell_rect(config, id)?;
    let rel_x = x - rect.x0;
    let rel_y = y - rect.y0;
    let (cw, ch) = (rect.width(), rect.height());
    if rel_x < 0.0 || rel_x >= cw || rel_y < 0.0 || rel_y >= ch {
        return None;
    }
    if rel_y < ch * IMAGE_BAND_END {
        Some(SubRegion::Image)
    } else if rel_y < ch * TITLE_BAND_END {
        Some(SubRegion::Title)
    } else {
        Some(SubRegion::Name)
    }
}

/// Whether `(x, y)` falls in the main-title edit band.
pub fn is_main_title_hit(config: &CanvasConfig, _x: f64, y: f64) -> bool {
    y < config.padding + config.title_height
}

/// Full resolution of a canvas point: main title first, then cell bands.
pub fn hit_test(config: &CanvasConfig, x: f64, y: f64) -> Option<HitTarget> {
    if is_main_title_hit(config, x, y) {
        return Some(HitTarget::MainTitle);
    }
    let id = cell_index_at(config, x, y)?;
    sub_region_at(config, x, y, id).map(|region| HitTarget::Cell(id, region))
}

/// Drawing geometry of one cell at a given scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellLayout {
    pub id: CellId,
    pub bounds: Rect,
    pub border: RoundedRect,
    pub cover: Rect,
    /// Horizontal centre for title and name text.
    pub text_center_x: f64,
    /// Vertical centre of the fixed-height title slot.
    pub title_center_y: f64,
    pub title_max_width: f64,
    /// Alphabetic baseline of the name line.
    pub name_baseline_y: f64,
    pub name_max_width: f64,
}

/// Layout of the whole canvas at one scale factor.
#[derive(Clone, Debug)]
pub struct GridLayout {
    pub scale: f64,
    /// The configuration with every length already multiplied by `scale`.
    pub config: CanvasConfig,
    pub main_title_center: Point,
    pub main_title_max_width: f64,
    pub watermark_anchor: Point,
    pub cells: Vec<CellLayout>,
}

/// Optical nudge applied to the title slot centre, in layout units.
const TITLE_CENTER_NUDGE: f64 = 3.0;

impl GridLayout {
    pub fn new(base: &CanvasConfig, scale: f64) -> Self {
        let config = base.scaled(scale);
        let c = &config;
        let cells = (0..c.cell_count() as u32)
            .filter_map(|i| {
                let id = CellId(i);
                let bounds = cell_rect(c, id)?;
                let (cw, ch) = (bounds.width(), bounds.height());
                let half_pad = c.cell_padding / 2.0;
                let border = RoundedRect::new(
                    bounds.x0 + half_pad,
                    bounds.y0 + half_pad,
                    bounds.x0 + half_pad + (cw - c.cell_padding),
                    bounds.y0 + half_pad + (ch - c.cell_padding),
                    c.cell_border_radius,
                );
                let inset = c.cell_padding + c.cell_border_width;
                let cover_w = (cw - 2.0 * inset).max(0.0);
                let cover_h = cover_w / c.cover_ratio;
                let cover = Rect::new(
                    bounds.x0 + inset,
                    bounds.y0 + inset,
                    bounds.x0 + inset + cover_w,
                    bounds.y0 + inset + cover_h,
                );
                let title_top = cover.y1 + c.cell_title_margin;
                Some(CellLayout {
                    id,
                    bounds,
                    border,
                    cover,
                    text_center_x: bounds.x0 + cw / 2.0,
                    title_center_y: title_top
                        + c.cell_title_font_size / 2.0
                        + TITLE_CENTER_NUDGE * scale,
                    title_max_width: cw - 2.0 * c.cell_padding,
                    name_baseline_y: cover.y1
                        + c.cell_title_margin
                        + c.cell_title_font_size
                        + c.cell_name_margin
                        + c.cell_name_font_size,
                    name_max_width: cw - 4.0 * c.cell_padding,
                })
            })
            .collect();

        Self {
            scale,
            main_title_center: Point::new(c.width / 2.0, c.padding + c.title_height / 2.0),
            main_title_max_width: c.width - 2.0 * c.padding,
            watermark_anchor: Point::new(c.width - c.padding, c.height - c.padding / 2.0),
            cells,
            config,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/geometry.rs"]
mod tests;
