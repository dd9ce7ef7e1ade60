use std::path::Path;

use anyhow::Context;

use crate::foundation::error::{GridError, GridResult};

/// Vector glyph drawn inside empty cover slots.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderIcon {
    #[default]
    Film,
    Gamepad,
}

/// Product flavour of a grid. Each variant is only a bundle of configuration inputs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    #[default]
    Movie,
    Game,
}

impl Variant {
    pub fn canvas_config(self) -> CanvasConfig {
        match self {
            Self::Movie => CanvasConfig::movie(),
            Self::Game => CanvasConfig::game(),
        }
    }
}

/// Immutable layout configuration for one grid product.
///
/// All lengths are unscaled layout units. Renderers multiply them by a scale factor through
/// [`CanvasConfig::scaled`], so the same configuration serves interactive and export output.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CanvasConfig {
    pub width: f64,
    pub height: f64,
    pub padding: f64,
    pub title_height: f64,
    #[serde(default)]
    pub title_bottom_margin: f64,
    pub grid_rows: u32,
    pub grid_cols: u32,
    pub cell_padding: f64,
    pub cell_border_width: f64,
    pub cell_border_radius: f64,
    /// Cover width / height (0.75 for 3:4 covers).
    pub cover_ratio: f64,
    pub title_font_size: f64,
    pub cell_title_font_size: f64,
    pub cell_name_font_size: f64,
    #[serde(default = "default_text_margin")]
    pub cell_title_margin: f64,
    #[serde(default = "default_text_margin")]
    pub cell_name_margin: f64,
    #[serde(default = "default_watermark_font_size")]
    pub watermark_font_size: f64,
    #[serde(default)]
    pub watermark: String,
    #[serde(default)]
    pub placeholder_icon: PlaceholderIcon,
}

fn default_text_margin() -> f64 {
    6.0
}

fn default_watermark_font_size() -> f64 {
    14.0
}

impl CanvasConfig {
    /// Movie grid: 5 rows x 6 columns on a 1200x1610 canvas.
    pub fn movie() -> Self {
        Self {
            width: 1200.0,
            height: 1610.0,
            padding: 40.0,
            title_height: 50.0,
            title_bottom_margin: 20.0,
            grid_rows: 5,
            grid_cols: 6,
            cell_padding: 10.0,
            cell_border_width: 2.0,
            cell_border_radius: 8.0,
            cover_ratio: 0.75,
            title_font_size: 48.0,
            cell_title_font_size: 22.0,
            cell_name_font_size: 14.0,
            cell_title_margin: 6.0,
            cell_name_margin: 6.0,
            watermark_font_size: 14.0,
            watermark: "moviesgrid.vercel.app".to_string(),
            placeholder_icon: PlaceholderIcon::Film,
        }
    }

    /// Game grid: 4 rows x 6 columns on a 1200x1300 canvas.
    pub fn game() -> Self {
        Self {
            height: 1300.0,
            title_bottom_margin: 0.0,
            grid_rows: 4,
            watermark: "gamegrid.shatranj.space".to_string(),
            placeholder_icon: PlaceholderIcon::Gamepad,
            ..Self::movie()
        }
    }

    pub fn from_json_str(s: &str) -> GridResult<Self> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_path(path: &Path) -> GridResult<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read canvas config '{}'", path.display()))?;
        Self::from_json_str(&s)
    }

    pub fn validate(&self) -> GridResult<()> {
        if self.grid_rows == 0 || self.grid_cols == 0 {
            return Err(GridError::validation("grid rows and cols must be > 0"));
        }
        for (name, v) in [
            ("width", self.width),
            ("height", self.height),
            ("cover_ratio", self.cover_ratio),
            ("title_font_size", self.title_font_size),
            ("cell_title_font_size", self.cell_title_font_size),
            ("cell_name_font_size", self.cell_name_font_size),
        ] {
            if !v.is_finite() || v <= 0.0 {
                return Err(GridError::validation(format!(
                    "{name} must be finite and > 0"
                )));
            }
        }
        for (name, v) in [
            ("padding", self.padding),
            ("title_height", self.title_height),
            ("title_bottom_margin", self.title_bottom_margin),
            ("cell_padding", self.cell_padding),
            ("cell_border_width", self.cell_border_width),
            ("cell_border_radius", self.cell_border_radius),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(GridError::validation(format!(
                    "{name} must be finite and >= 0"
                )));
            }
        }
        if self.grid_top() + self.padding >= self.height || 2.0 * self.padding >= self.width {
            return Err(GridError::validation("padding and title band leave no grid area"));
        }
        Ok(())
    }

    pub fn cell_count(&self) -> usize {
        (self.grid_rows as usize) * (self.grid_cols as usize)
    }

    /// Top edge of the grid content rectangle.
    pub fn grid_top(&self) -> f64 {
        self.padding + self.title_height + self.title_bottom_margin
    }

    /// Copy with every length multiplied by `factor`. Counts, ratios and strings are unchanged.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            width: self.width * factor,
            height: self.height * factor,
            padding: self.padding * factor,
            title_height: self.title_height * factor,
            title_bottom_margin: self.title_bottom_margin * factor,
            cell_padding: self.cell_padding * factor,
            cell_border_width: self.cell_border_width * factor,
            cell_border_radius: self.cell_border_radius * factor,
            title_font_size: self.title_font_size * factor,
            cell_title_font_size: self.cell_title_font_size * factor,
            cell_name_font_size: self.cell_name_font_size * factor,
            cell_title_margin: self.cell_title_margin * factor,
            cell_name_margin: self.cell_name_margin * factor,
            watermark_font_size: self.watermark_font_size * factor,
            ..self.clone()
        }
    }

    /// Surface pixel size at `factor`.
    pub fn pixel_size(&self, factor: f64) -> (u32, u32) {
        (
            (self.width * factor).round() as u32,
            (self.height * factor).round() as u32,
        )
    }
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self::movie()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/config.rs"]
mod tests;
