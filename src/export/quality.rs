//! Export at a fixed scale with a size-constrained JPEG quality search.

use std::io::Cursor;

use crate::foundation::error::{GridError, GridResult};
use crate::model::cell::GridState;
use crate::model::config::CanvasConfig;
use crate::render::grid::{FrameState, render_grid};
use crate::render::surface::{Readback, Surface};

/// Largest accepted encoded size.
pub const MAX_EXPORT_BYTES: usize = 3 * 1024 * 1024;
/// Default and maximum export scale.
pub const MAX_EXPORT_SCALE: f64 = 2.0;
pub const START_QUALITY: u8 = 92;
pub const QUALITY_STEP: u8 = 5;
pub const FLOOR_QUALITY: u8 = 50;

/// Qualities tried in order: 92, 87, ..., 52, then the floor 50.
pub fn quality_ladder() -> Vec<u8> {
    let mut out = Vec::new();
    let mut q = START_QUALITY;
    while q > FLOOR_QUALITY {
        out.push(q);
        q = q.saturating_sub(QUALITY_STEP);
    }
    out.push(FLOOR_QUALITY);
    out
}

/// Lossy encoder used by the quality search.
pub trait ExportEncoder {
    fn media_type(&self) -> &'static str;

    fn encode(&mut self, rgb: &image::RgbImage, quality: u8) -> GridResult<Vec<u8>>;
}

/// Baseline JPEG via the `image` crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct JpegExportEncoder;

impl ExportEncoder for JpegExportEncoder {
    fn media_type(&self) -> &'static str {
        "image/jpeg"
    }

    fn encode(&mut self, rgb: &image::RgbImage, quality: u8) -> GridResult<Vec<u8>> {
        let mut bytes = Vec::new();
        let encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(Cursor::new(&mut bytes), quality);
        rgb.write_with_encoder(encoder)
            .map_err(|e| GridError::encode(format!("jpeg encode at q{quality}: {e}")))?;
        Ok(bytes)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportStatus {
    /// Encoded within budget.
    Success,
    /// The floor quality was used; the output may exceed the budget.
    FloorReached,
}

/// One encode attempt of the quality search.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct QualityAttempt {
    pub quality: u8,
    pub size: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportOutcome {
    pub bytes: Vec<u8>,
    pub media_type: &'static str,
    pub width: u32,
    pub height: u32,
    pub quality: u8,
    pub status: ExportStatus,
    pub attempts: Vec<QualityAttempt>,
}

/// Where an export currently is.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ExportPhase {
    Idle,
    Rendering { scale: f64 },
    QualitySearch { quality: u8 },
    Success { quality: u8, size: usize },
    FloorReached { quality: u8, size: usize },
    Delivered,
}

/// Try qualities from the ladder until an encoding fits `budget`.
pub fn search_quality(
    encoder: &mut dyn ExportEncoder,
    rgb: &image::RgbImage,
    budget: usize,
    mut on_attempt: impl FnMut(u8),
) -> GridResult<(Vec<u8>, u8, ExportStatus, Vec<QualityAttempt>)> {
    let mut attempts = Vec::new();
    let mut last = None;
    for quality in quality_ladder() {
        on_attempt(quality);
        let bytes = encoder.encode(rgb, quality)?;
        attempts.push(QualityAttempt {
            quality,
            size: bytes.len(),
        });
        tracing::debug!(quality, size = bytes.len(), budget, "encoded export candidate");
        if bytes.len() <= budget {
            return Ok((bytes, quality, ExportStatus::Success, attempts));
        }
        last = Some((bytes, quality));
    }
    let (bytes, quality) =
        last.ok_or_else(|| GridError::encode("quality ladder produced no attempts"))?;
    tracing::warn!(
        quality,
        size = bytes.len(),
        budget,
        "export exceeds size budget at floor quality"
    );
    Ok((bytes, quality, ExportStatus::FloorReached, attempts))
}

/// Drives one export: render at scale, read back, search quality.
///
/// Keeps the phase history of the latest export for observers and tests.
#[derive(Debug)]
pub struct Exporter<E: ExportEncoder> {
    encoder: E,
    budget: usize,
    phase: ExportPhase,
    history: Vec<ExportPhase>,
}

impl<E: ExportEncoder> Exporter<E> {
    pub fn new(encoder: E) -> Self {
        Self {
            encoder,
            budget: MAX_EXPORT_BYTES,
            phase: ExportPhase::Idle,
            history: vec![ExportPhase::Idle],
        }
    }

    pub fn with_budget(mut self, budget: usize) -> Self {
        self.budget = budget;
        self
    }

    pub fn phase(&self) -> ExportPhase {
        self.phase
    }

    /// Phases visited by the latest export, starting at `Idle`.
    pub fn history(&self) -> &[ExportPhase] {
        &self.history
    }

    fn enter(&mut self, phase: ExportPhase) {
        self.phase = phase;
        self.history.push(phase);
    }

    /// Render `state` onto `surface` at `scale` and encode it within the budget.
    ///
    /// `surface` must already be `config.pixel_size(scale)`. Scales above
    /// [`MAX_EXPORT_SCALE`] are rejected before anything is drawn.
    #[tracing::instrument(level = "info", skip_all, fields(scale = scale))]
    pub fn export<S: Surface + Readback>(
        &mut self,
        surface: &mut S,
        state: &GridState,
        config: &CanvasConfig,
        scale: f64,
    ) -> GridResult<ExportOutcome> {
        validate_scale(scale)?;
        self.phase = ExportPhase::Idle;
        self.history = vec![ExportPhase::Idle];

        self.enter(ExportPhase::Rendering { scale });
        let report = render_grid(surface, state, FrameState::export(scale), config)?;
        if !report.failed_cells.is_empty() {
            tracing::warn!(cells = ?report.failed_cells, "exporting with placeholder covers");
        }
        let frame = surface.read_frame()?;
        let rgb = frame.to_rgb8()?;

        let mut visited = Vec::new();
        let (bytes, quality, status, attempts) =
            search_quality(&mut self.encoder, &rgb, self.budget, |q| visited.push(q))?;
        for q in visited {
            self.enter(ExportPhase::QualitySearch { quality: q });
        }
        let size = bytes.len();
        self.enter(match status {
            ExportStatus::Success => ExportPhase::Success { quality, size },
            ExportStatus::FloorReached => ExportPhase::FloorReached { quality, size },
        });
        tracing::info!(quality, size, ?status, "export encoded");

        Ok(ExportOutcome {
            bytes,
            media_type: self.encoder.media_type(),
            width: rgb.width(),
            height: rgb.height(),
            quality,
            status,
            attempts,
        })
    }

    /// Record that the encoded output reached the user.
    pub fn mark_delivered(&mut self) -> GridResult<()> {
        match self.phase {
            ExportPhase::Success { .. } | ExportPhase::FloorReached { .. } => {
                self.enter(ExportPhase::Delivered);
                Ok(())
            }
            other => Err(GridError::validation(format!(
                "cannot deliver an export in phase {other:?}"
            ))),
        }
    }
}

pub fn validate_scale(scale: f64) -> GridResult<()> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(GridError::validation("export scale must be finite and > 0"));
    }
    if scale > MAX_EXPORT_SCALE {
        return Err(GridError::validation(format!(
            "export scale {scale} exceeds the maximum of {MAX_EXPORT_SCALE}"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/export/quality.rs"]
mod tests;
