//! Placeholder icons as static vector programs in a 24x24 unit box.

use kurbo::{Arc as ArcSegment, PathEl};

use crate::foundation::core::{BezPath, Point, Rect, Rgba8, Vec2};
use crate::model::config::PlaceholderIcon;
use crate::render::surface::{Surface, rounded_rect_path};

use self::IconCmd::*;

/// Unit box every program is authored in.
pub const ICON_BOX: f64 = 24.0;

/// One step of an icon program. Coordinates are in the 24-unit box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum IconCmd {
    BeginPath,
    MoveTo(f64, f64),
    LineTo(f64, f64),
    CurveTo(f64, f64, f64, f64, f64, f64),
    /// Circular arc from `start` through `sweep` radians, joined to the current point.
    Arc {
        cx: f64,
        cy: f64,
        r: f64,
        start: f64,
        sweep: f64,
    },
    RoundRect {
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        r: f64,
    },
    ClosePath,
    Fill,
    Stroke,
}

const TAU: f64 = std::f64::consts::TAU;

pub static GAMEPAD: &[IconCmd] = &[
    BeginPath,
    MoveTo(6.0, 11.0),
    LineTo(10.0, 11.0),
    Stroke,
    BeginPath,
    MoveTo(8.0, 9.0),
    LineTo(8.0, 13.0),
    Stroke,
    BeginPath,
    Arc { cx: 15.0, cy: 12.0, r: 1.0, start: 0.0, sweep: TAU },
    Fill,
    BeginPath,
    Arc { cx: 18.0, cy: 10.0, r: 1.0, start: 0.0, sweep: TAU },
    Fill,
    BeginPath,
    MoveTo(17.32, 5.0),
    LineTo(6.68, 5.0),
    CurveTo(4.55, 5.0, 2.77, 6.45, 2.702, 8.59),
    CurveTo(2.696, 8.642, 2.692, 8.691, 2.685, 8.742),
    CurveTo(2.604, 9.416, 2.0, 14.456, 2.0, 16.0),
    CurveTo(2.0, 17.657, 3.343, 19.0, 5.0, 19.0),
    CurveTo(6.0, 19.0, 6.5, 18.5, 7.0, 18.0),
    LineTo(8.414, 16.586),
    CurveTo(8.78, 16.211, 9.293, 16.0, 9.828, 16.0),
    LineTo(14.172, 16.0),
    CurveTo(14.707, 16.0, 15.22, 16.211, 15.586, 16.586),
    LineTo(17.0, 18.0),
    CurveTo(17.5, 18.5, 18.0, 19.0, 19.0, 19.0),
    CurveTo(20.657, 19.0, 22.0, 17.657, 22.0, 16.0),
    CurveTo(22.0, 14.455, 21.396, 9.416, 21.315, 8.742),
    CurveTo(21.308, 8.692, 21.304, 8.642, 21.298, 8.591),
    CurveTo(21.23, 6.45, 19.45, 5.0, 17.32, 5.0),
    ClosePath,
    Stroke,
];

pub static FILM: &[IconCmd] = &[
    BeginPath,
    RoundRect { x: 3.0, y: 3.0, w: 18.0, h: 18.0, r: 2.0 },
    Stroke,
    BeginPath,
    MoveTo(7.0, 3.0),
    LineTo(7.0, 21.0),
    MoveTo(17.0, 3.0),
    LineTo(17.0, 21.0),
    MoveTo(3.0, 12.0),
    LineTo(21.0, 12.0),
    MoveTo(3.0, 7.5),
    LineTo(7.0, 7.5),
    MoveTo(3.0, 16.5),
    LineTo(7.0, 16.5),
    MoveTo(17.0, 7.5),
    LineTo(21.0, 7.5),
    MoveTo(17.0, 16.5),
    LineTo(21.0, 16.5),
    Stroke,
];

pub fn program_for(icon: PlaceholderIcon) -> &'static [IconCmd] {
    match icon {
        PlaceholderIcon::Film => FILM,
        PlaceholderIcon::Gamepad => GAMEPAD,
    }
}

/// Where and how to draw an icon program.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IconPlacement {
    /// Top-left corner of the icon box in surface pixels.
    pub origin: Point,
    /// Edge length of the icon box in surface pixels.
    pub size: f64,
    pub color: Rgba8,
    pub line_width: f64,
}

/// Execute `program` against `surface`.
pub fn run_icon(surface: &mut dyn Surface, program: &[IconCmd], placement: IconPlacement) {
    let s = placement.size / ICON_BOX;
    let o = placement.origin.to_vec2();
    let pt = |x: f64, y: f64| Point::new(x * s, y * s) + o;
    let mut path = BezPath::new();

    for cmd in program {
        match *cmd {
            BeginPath => path = BezPath::new(),
            MoveTo(x, y) => path.move_to(pt(x, y)),
            LineTo(x, y) => path.line_to(pt(x, y)),
            CurveTo(x1, y1, x2, y2, x, y) => path.curve_to(pt(x1, y1), pt(x2, y2), pt(x, y)),
            Arc {
                cx,
                cy,
                r,
                start,
                sweep,
            } => {
                let center = pt(cx, cy);
                let radius = r * s;
                let first = center + Vec2::new(start.cos(), start.sin()) * radius;
                if path.elements().is_empty() {
                    path.move_to(first);
                } else {
                    path.line_to(first);
                }
                let arc = ArcSegment::new(center, (radius, radius), start, sweep, 0.0);
                arc.append_iter(0.1).for_each(|el: PathEl| path.push(el));
            }
            RoundRect { x, y, w, h, r } => {
                let p0 = pt(x, y);
                let rect = Rect::new(p0.x, p0.y, p0.x + w * s, p0.y + h * s);
                path.extend(rounded_rect_path(rect, r * s).elements().iter().copied());
            }
            ClosePath => path.close_path(),
            Fill => surface.fill_path(&path, placement.color),
            Stroke => surface.stroke_path(&path, placement.line_width, placement.color),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/icon.rs"]
mod tests;
