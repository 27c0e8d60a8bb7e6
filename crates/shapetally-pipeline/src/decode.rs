//! Image decoding into a color canvas and a luminance plane.
//!
//! Accepts raw image bytes (PNG, JPEG, BMP, WebP) and produces the two
//! rasters the rest of the pipeline needs: an RGB canvas that the
//! annotator draws on, and a single-channel luminance image used for
//! edge extraction and label brightness sampling.

use image::{DynamicImage, Luma, Rgb};
use imageproc::map::map_pixels;

use crate::types::{Dimensions, GrayImage, InvalidImage, PipelineError, RgbImage};

/// A decoded request image.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// Color canvas, mutated in place by annotation.
    pub canvas: RgbImage,
    /// Luminance of the untouched source image.
    pub gray: GrayImage,
    /// Channel count of the source encoding (1, 2, 3 or 4).
    pub channels: u8,
}

impl DecodedImage {
    /// Image dimensions in pixels.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.canvas.width(),
            height: self.canvas.height(),
        }
    }
}

/// Decode raw image bytes.
///
/// The luminance plane uses the BT.601 weights
/// `0.299*R + 0.587*G + 0.114*B` (see [`luma_bt601`]). Alpha is dropped.
///
/// # Errors
///
/// Returns [`InvalidImage::Empty`] if `bytes` is empty,
/// [`InvalidImage::Decode`] if the data is not a recognizable image, and
/// [`InvalidImage::ZeroArea`] if the decoded image has no pixels.
pub fn decode(bytes: &[u8]) -> Result<DecodedImage, PipelineError> {
    if bytes.is_empty() {
        return Err(InvalidImage::Empty.into());
    }

    let image = image::load_from_memory(bytes)?;
    from_dynamic(&image)
}

/// Build a [`DecodedImage`] from an already decoded image.
///
/// # Errors
///
/// Returns [`InvalidImage::ZeroArea`] if the image has no pixels.
pub fn from_dynamic(image: &DynamicImage) -> Result<DecodedImage, PipelineError> {
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Err(InvalidImage::ZeroArea { width, height }.into());
    }

    let canvas = image.to_rgb8();
    Ok(DecodedImage {
        gray: luminance(&canvas),
        canvas,
        channels: image.color().channel_count(),
    })
}

/// BT.601 luminance plane of an RGB canvas.
///
/// `image`'s own `to_luma8` uses Rec. 709 weights, which give noticeably
/// darker values for saturated reds and blues.
#[must_use]
pub fn luminance(canvas: &RgbImage) -> GrayImage {
    map_pixels(canvas, |Rgb([r, g, b])| Luma([luma_bt601(r, g, b)]))
}

/// `(299*R + 587*G + 114*B) / 1000`, rounded to nearest.
#[must_use]
pub fn luma_bt601(r: u8, g: u8, b: u8) -> u8 {
    let weighted = 299 * u32::from(r) + 587 * u32::from(g) + 114 * u32::from(b);
    u8::try_from((weighted + 500) / 1000).unwrap_or(u8::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn encode_png(img: &image::RgbaImage) -> Vec<u8> {
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(
            encoder,
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgba8,
        )
        .unwrap();
        buf
    }

    #[test]
    fn empty_input_is_invalid() {
        let result = decode(&[]);
        assert!(matches!(
            result,
            Err(PipelineError::InvalidImage(InvalidImage::Empty))
        ));
    }

    #[test]
    fn corrupt_bytes_are_invalid() {
        let result = decode(&[0xFF, 0xFE, 0x00, 0x01]);
        assert!(matches!(
            result,
            Err(PipelineError::InvalidImage(InvalidImage::Decode(_)))
        ));
    }

    #[test]
    fn zero_area_image_is_invalid() {
        let empty = DynamicImage::new_rgb8(0, 5);
        assert!(matches!(
            from_dynamic(&empty),
            Err(PipelineError::InvalidImage(InvalidImage::ZeroArea {
                width: 0,
                height: 5
            }))
        ));
    }

    #[test]
    fn rgba_png_decodes_to_canvas_and_gray() {
        let img = image::RgbaImage::from_fn(17, 31, |_, _| image::Rgba([255, 255, 255, 255]));
        let decoded = decode(&encode_png(&img)).unwrap();
        assert_eq!(decoded.channels, 4);
        assert_eq!(
            decoded.dimensions(),
            Dimensions {
                width: 17,
                height: 31
            }
        );
        assert_eq!(decoded.gray.dimensions(), (17, 31));
        assert!(decoded.gray.pixels().all(|p| p.0[0] == 255));
        assert!(decoded.canvas.pixels().all(|p| p.0 == [255, 255, 255]));
    }

    #[test]
    fn single_channel_source_is_accepted() {
        let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(3, 2, image::Luma([40])));
        let decoded = from_dynamic(&gray).unwrap();
        assert_eq!(decoded.channels, 1);
        assert_eq!(decoded.canvas.get_pixel(0, 0).0, [40, 40, 40]);
        assert_eq!(decoded.gray.get_pixel(2, 1).0[0], 40);
    }

    #[test]
    fn luminance_weights_green_over_red_over_blue() {
        let pixel = |r, g, b| {
            let img = image::RgbaImage::from_pixel(1, 1, image::Rgba([r, g, b, 255]));
            decode(&encode_png(&img)).unwrap().gray.get_pixel(0, 0).0[0]
        };
        let (r, g, b) = (pixel(255, 0, 0), pixel(0, 255, 0), pixel(0, 0, 255));
        assert!(g > r && r > b, "got R={r} G={g} B={b}");
    }

    #[test]
    fn luminance_uses_bt601_weights() {
        let img = image::RgbaImage::from_pixel(1, 1, image::Rgba([200, 0, 0, 255]));
        let decoded = decode(&encode_png(&img)).unwrap();
        assert_eq!(decoded.gray.get_pixel(0, 0).0[0], 60);

        assert_eq!(luma_bt601(255, 0, 0), 76);
        assert_eq!(luma_bt601(0, 255, 0), 150);
        assert_eq!(luma_bt601(0, 0, 255), 29);
        assert_eq!(luma_bt601(255, 255, 255), 255);
        assert_eq!(luma_bt601(0, 0, 0), 0);
    }

    #[test]
    fn gray_values_survive_luminance() {
        for v in [0, 1, 49, 50, 51, 128, 254, 255] {
            assert_eq!(luma_bt601(v, v, v), v);
        }
    }
}
