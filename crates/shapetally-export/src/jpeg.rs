//! JPEG export of the annotated canvas.
//!
//! Returns the encoded bytes; writing them anywhere is the caller's job.

use image::ImageEncoder;
use image::codecs::jpeg::JpegEncoder;
use shapetally_pipeline::types::RgbImage;

/// Default JPEG quality for the result artifact.
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Errors while serializing results.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The encoder rejected the canvas.
    #[error("failed to encode JPEG: {0}")]
    Encode(#[from] image::ImageError),
}

/// Encode `canvas` as a baseline JPEG.
///
/// `quality` is clamped to `1..=100`.
///
/// # Errors
///
/// Returns [`ExportError::Encode`] if the encoder fails, e.g. for a
/// canvas larger than the 65535 pixel JPEG limit.
pub fn encode_jpeg(canvas: &RgbImage, quality: u8) -> Result<Vec<u8>, ExportError> {
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
    encoder.write_image(
        canvas.as_raw(),
        canvas.width(),
        canvas.height(),
        image::ExtendedColorType::Rgb8,
    )?;
    Ok(buf)
}
