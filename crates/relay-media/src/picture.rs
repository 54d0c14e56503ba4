//! Image reduction: repeated halving with JPEG re-encoding.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;

use crate::blob::MediaBlob;
use crate::error::MediaError;

pub const JPEG_QUALITY: u8 = 85;

/// Halves both dimensions with floor division, never going below one pixel.
#[must_use]
pub fn halved_dimensions(width: u32, height: u32) -> (u32, u32) {
    ((width / 2).max(1), (height / 2).max(1))
}

/// Shrinks an image until its encoded size is at most `ceiling` bytes.
///
/// Each pass decodes the current bytes, halves both dimensions, and writes a
/// quality-85 JPEG, so the returned blob carries a `.jpg` extension unless
/// the input already fit.
///
/// # Errors
///
/// - [`MediaError::SizeNotConvergent`] once a 1×1 image is still over the ceiling.
/// - [`MediaError::Image`] if the bytes cannot be decoded or encoded.
pub fn reduce_image(blob: MediaBlob, ceiling: u64) -> Result<MediaBlob, MediaError> {
    let mut current = blob;

    while current.len() > ceiling {
        let decoded = image::load_from_memory(&current.bytes)?;
        let (width, height) = (decoded.width(), decoded.height());
        if width <= 1 && height <= 1 {
            return Err(MediaError::SizeNotConvergent {
                ceiling,
                size: current.len(),
                reason: "image is already 1x1".to_string(),
            });
        }

        let (new_width, new_height) = halved_dimensions(width, height);
        let resized = decoded.resize_exact(new_width, new_height, FilterType::Lanczos3);

        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(resized.to_rgb8())
            .write_with_encoder(JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY))?;

        tracing::debug!(
            from = %format!("{width}x{height}"),
            to = %format!("{new_width}x{new_height}"),
            before = current.len(),
            after = bytes.len(),
            "downscaled image"
        );

        current = MediaBlob::new(bytes, ".jpg");
    }

    Ok(current)
}
