//! Aspect-ratio cropping and JPEG re-encoding of cover images.

use std::io::Cursor;

use image::DynamicImage;
use image::imageops::FilterType;

use crate::assets::decode::decode_dynamic;
use crate::assets::source::to_data_uri;
use crate::foundation::error::{GridError, GridResult};

/// Target shape and encoding of a cropped cover.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CropOptions {
    /// Width over height of the output (0.75 for 3:4 covers).
    pub ratio: f64,
    /// Downsample so the output width never exceeds this.
    pub max_width: Option<u32>,
    /// JPEG quality, 1..=100.
    pub quality: u8,
}

impl Default for CropOptions {
    fn default() -> Self {
        Self {
            ratio: 0.75,
            max_width: Some(800),
            quality: 90,
        }
    }
}

/// Explicit crop rectangle in source pixels, as chosen in a crop dialog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CropArea {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Encoded crop output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CroppedImage {
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
    pub media_type: &'static str,
}

impl CroppedImage {
    pub fn to_data_uri(&self) -> String {
        to_data_uri(self.media_type, &self.bytes)
    }
}

/// Largest centred region of `width x height` with aspect `ratio`.
pub fn centered_aspect_area(width: u32, height: u32, ratio: f64) -> CropArea {
    let (w, h) = (f64::from(width), f64::from(height));
    let current = w / h;
    if current > ratio {
        let cw = ((h * ratio).round() as u32).clamp(1, width);
        CropArea {
            x: (width - cw) / 2,
            y: 0,
            width: cw,
            height,
        }
    } else if current < ratio {
        let ch = ((w / ratio).round() as u32).clamp(1, height);
        CropArea {
            x: 0,
            y: (height - ch) / 2,
            width,
            height: ch,
        }
    } else {
        CropArea {
            x: 0,
            y: 0,
            width,
            height,
        }
    }
}

/// Symmetric crop of the longer axis to `opts.ratio`, then downsample and encode.
#[tracing::instrument(level = "debug", skip(img), fields(w = img.width(), h = img.height()))]
pub fn crop_to_aspect(img: &DynamicImage, opts: CropOptions) -> GridResult<CroppedImage> {
    validate_options(opts)?;
    if img.width() == 0 || img.height() == 0 {
        return Err(GridError::validation("cannot crop an empty image"));
    }
    let area = centered_aspect_area(img.width(), img.height(), opts.ratio);
    crop_region(img, area, opts)
}

/// Crop `area` (clamped to the image bounds), then downsample and encode.
pub fn crop_region(img: &DynamicImage, area: CropArea, opts: CropOptions) -> GridResult<CroppedImage> {
    validate_options(opts)?;
    let x = area.x.min(img.width());
    let y = area.y.min(img.height());
    let width = area.width.min(img.width() - x);
    let height = area.height.min(img.height() - y);
    if width == 0 || height == 0 {
        return Err(GridError::validation("crop area is empty"));
    }

    let mut out = img.crop_imm(x, y, width, height);
    if let Some(max_w) = opts.max_width
        && out.width() > max_w
    {
        let new_h = ((f64::from(out.height()) * f64::from(max_w) / f64::from(out.width())).round()
            as u32)
            .max(1);
        out = out.resize_exact(max_w, new_h, FilterType::Triangle);
    }
    encode_jpeg(&out, opts.quality)
}

/// Decode `bytes` and crop to aspect; undecodable input fails before any work is done.
pub fn crop_bytes(bytes: &[u8], opts: CropOptions) -> GridResult<CroppedImage> {
    crop_to_aspect(&decode_dynamic(bytes)?, opts)
}

/// Encode as baseline JPEG at `quality`. Alpha is dropped.
pub fn encode_jpeg(img: &DynamicImage, quality: u8) -> GridResult<CroppedImage> {
    let rgb = img.to_rgb8();
    let mut bytes = Vec::new();
    let encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(Cursor::new(&mut bytes), quality);
    rgb.write_with_encoder(encoder)
        .map_err(|e| GridError::encode(format!("jpeg encode: {e}")))?;
    Ok(CroppedImage {
        width: rgb.width(),
        height: rgb.height(),
        bytes,
        media_type: "image/jpeg",
    })
}

fn validate_options(opts: CropOptions) -> GridResult<()> {
    if !opts.ratio.is_finite() || opts.ratio <= 0.0 {
        return Err(GridError::validation("crop ratio must be finite and > 0"));
    }
    if opts.quality == 0 || opts.quality > 100 {
        return Err(GridError::validation("jpeg quality must be in 1..=100"));
    }
    if opts.max_width == Some(0) {
        return Err(GridError::validation("max_width must be > 0"));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/assets/crop.rs"]
mod tests;
