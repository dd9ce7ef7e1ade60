use super::*;
use crate::model::cell::GridState;
use crate::render::recording::RecordingSurface;

/// Encoder whose output size is `quality * per_step` bytes.
struct Sized {
    per_step: usize,
    calls: Vec<u8>,
}

impl ExportEncoder for Sized {
    fn media_type(&self) -> &'static str {
        "image/test"
    }

    fn encode(&mut self, _rgb: &image::RgbImage, quality: u8) -> GridResult<Vec<u8>> {
        self.calls.push(quality);
        Ok(vec![0; quality as usize * self.per_step])
    }
}

fn small_config() -> CanvasConfig {
    CanvasConfig {
        width: 120.0,
        height: 160.0,
        padding: 10.0,
        title_height: 10.0,
        title_bottom_margin: 0.0,
        grid_rows: 2,
        grid_cols: 2,
        ..CanvasConfig::movie()
    }
}

fn state() -> GridState {
    GridState::from_titles(&["a", "b", "c", "d"], 4, "Top")
}

#[test]
fn ladder_descends_by_five_to_the_floor() {
    assert_eq!(
        quality_ladder(),
        vec![92, 87, 82, 77, 72, 67, 62, 57, 52, 50]
    );
}

#[test]
fn search_stops_at_first_fitting_quality() {
    let mut enc = Sized {
        per_step: 1000,
        calls: Vec::new(),
    };
    let rgb = image::RgbImage::new(1, 1);
    let (bytes, q, status, attempts) = search_quality(&mut enc, &rgb, 70_000, |_| {}).unwrap();
    assert_eq!(q, 67);
    assert_eq!(bytes.len(), 67_000);
    assert_eq!(status, ExportStatus::Success);
    assert_eq!(enc.calls, vec![92, 87, 82, 77, 72, 67]);
    assert_eq!(attempts.len(), 6);
}

#[test]
fn unreachable_budget_ends_exactly_at_floor() {
    let mut enc = Sized {
        per_step: 1_000_000,
        calls: Vec::new(),
    };
    let rgb = image::RgbImage::new(1, 1);
    let (_, q, status, attempts) = search_quality(&mut enc, &rgb, 10, |_| {}).unwrap();
    assert_eq!(q, 50);
    assert_eq!(status, ExportStatus::FloorReached);
    let qs: Vec<u8> = attempts.iter().map(|a| a.quality).collect();
    assert!(qs.windows(2).all(|w| w[0] > w[1]));
    assert_eq!(qs.last(), Some(&50));
}

#[test]
fn exporter_walks_the_phase_machine() {
    let config = small_config();
    let (w, h) = config.pixel_size(2.0);
    let mut surface = RecordingSurface::new(w, h);
    let mut exporter = Exporter::new(Sized {
        per_step: 10,
        calls: Vec::new(),
    })
    .with_budget(900);

    let out = exporter.export(&mut surface, &state(), &config, 2.0).unwrap();
    assert_eq!((out.width, out.height), (240, 320));
    assert_eq!(out.quality, 87);
    assert_eq!(
        exporter.history(),
        &[
            ExportPhase::Idle,
            ExportPhase::Rendering { scale: 2.0 },
            ExportPhase::QualitySearch { quality: 92 },
            ExportPhase::QualitySearch { quality: 87 },
            ExportPhase::Success {
                quality: 87,
                size: 870
            },
        ]
    );
    exporter.mark_delivered().unwrap();
    assert_eq!(exporter.phase(), ExportPhase::Delivered);
    assert!(exporter.mark_delivered().is_err());
}

#[test]
fn repeated_exports_restart_from_idle() {
    let config = small_config();
    let (w, h) = config.pixel_size(1.0);
    let mut surface = RecordingSurface::new(w, h);
    let mut exporter = Exporter::new(Sized {
        per_step: 1,
        calls: Vec::new(),
    });
    exporter.export(&mut surface, &state(), &config, 1.0).unwrap();
    exporter.mark_delivered().unwrap();
    exporter.export(&mut surface, &state(), &config, 1.0).unwrap();
    assert_eq!(exporter.history()[0], ExportPhase::Idle);
    assert_eq!(exporter.history().len(), 4);
}

#[test]
fn scale_above_ceiling_is_rejected_before_rendering() {
    let config = small_config();
    let (w, h) = config.pixel_size(3.0);
    let mut surface = RecordingSurface::new(w, h);
    let mut exporter = Exporter::new(JpegExportEncoder);
    let err = exporter.export(&mut surface, &state(), &config, 3.0).unwrap_err();
    assert!(matches!(err, GridError::Validation(_)));
    assert!(surface.ops().is_empty());
    assert_eq!(exporter.phase(), ExportPhase::Idle);
}

#[test]
fn jpeg_encoder_produces_jpeg_bytes() {
    let rgb = image::RgbImage::from_pixel(16, 16, image::Rgb([10, 20, 30]));
    let bytes = JpegExportEncoder.encode(&rgb, 90).unwrap();
    assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
}
