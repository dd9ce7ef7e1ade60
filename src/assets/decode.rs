use std::sync::Arc;

use crate::foundation::error::{GridError, GridResult};

/// Decoded raster ready to be drawn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    /// Premultiplied RGBA8, row-major, tightly packed.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl DecodedImage {
    /// Width over height.
    pub fn aspect(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height.max(1))
    }
}

/// Decode encoded image bytes into a [`image::DynamicImage`].
pub fn decode_dynamic(bytes: &[u8]) -> GridResult<image::DynamicImage> {
    if bytes.is_empty() {
        return Err(GridError::decode("image bytes are empty"));
    }
    image::load_from_memory(bytes)
        .map_err(|e| GridError::decode(format!("decode image from memory: {e}")))
}

/// Decode encoded image bytes and convert to premultiplied RGBA8.
#[tracing::instrument(level = "debug", skip(bytes), fields(len = bytes.len()))]
pub fn decode_image(bytes: &[u8]) -> GridResult<DecodedImage> {
    Ok(prepare_image(&decode_dynamic(bytes)?))
}

/// Convert an already-decoded image to premultiplied RGBA8.
pub fn prepare_image(img: &image::DynamicImage) -> DecodedImage {
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    DecodedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    }
}

/// MIME type guessed from the leading bytes, if the format is recognised.
pub fn sniff_media_type(bytes: &[u8]) -> Option<&'static str> {
    let format = image::guess_format(bytes).ok()?;
    Some(format.to_mime_type())
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[..3].fill(0);
            continue;
        }
        for c in &mut px[..3] {
            *c = ((*c as u16 * a + 127) / 255) as u8;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
