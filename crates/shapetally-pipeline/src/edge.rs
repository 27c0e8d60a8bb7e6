//! Edge extraction: smoothing, gradient hysteresis and dilation.
//!
//! Produces the binary mask the contour finder traces. White pixels (255)
//! are edges, black pixels (0) are background. The mask is thickened by
//! one dilation pass so that the outlines of solid shapes form closed
//! loops even where the gradient dips at a corner.

use image::{GrayImage, Luma};
use imageproc::definitions::Image;
use imageproc::distance_transform::Norm;
use imageproc::filter::{filter, filter_clamped, gaussian_blur_f32};
use imageproc::kernel::{self, Kernel};

use crate::types::PipelineConfig;

/// Minimum allowed hysteresis threshold.
///
/// A threshold of zero marks every pixel with any gradient as an edge,
/// which floods the mask and merges every shape into one contour.
pub const MIN_THRESHOLD: f32 = 1.0;
const _: () = assert!(MIN_THRESHOLD > 0.0);

/// 8-neighbourhood offsets.
const NEIGHBOURS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Run the full edge extraction stage on a luminance image.
///
/// Smoothing, gradient hysteresis and dilation, configured by
/// `blur_sigma`, `canny_low`, `canny_high` and `dilation_radius`.
#[must_use = "returns the binary edge mask"]
pub fn extract_edges(gray: &GrayImage, config: &PipelineConfig) -> GrayImage {
    let smoothed = smooth(gray, config.blur_sigma);
    let edges = detect_edges(&smoothed, config.canny_low, config.canny_high);
    dilate(&edges, config.dilation_radius)
}

/// Binomial approximation of a 3x3 Gaussian, weights summing to 16.
const GAUSSIAN_3X3: Kernel<'static, i32> = Kernel::new(&[1, 2, 1, 2, 4, 2, 1, 2, 1], 3, 3);

/// Gaussian smoothing.
///
/// `None` applies [`GAUSSIAN_3X3`] with borders clamped to the edge.
/// `Some(sigma)` uses a sampled Gaussian of that sigma, whose support
/// grows with sigma. A sigma that is not finite and positive returns the
/// image unchanged, since `imageproc` panics on `sigma <= 0.0` and NaN.
#[must_use = "returns the smoothed image"]
pub fn smooth(gray: &GrayImage, sigma: Option<f32>) -> GrayImage {
    match sigma {
        None => filter(gray, GAUSSIAN_3X3, |sum: i32| {
            u8::try_from((sum + 8) / 16).unwrap_or(u8::MAX)
        }),
        Some(sigma) if sigma.is_finite() && sigma > 0.0 => gaussian_blur_f32(gray, sigma),
        Some(_) => gray.clone(),
    }
}

/// Binary edge detection on an already smoothed image.
///
/// Sobel gradients are combined into an L1 magnitude `|gx| + |gy|`,
/// thinned by non-maximum suppression along the gradient direction and
/// then linked by hysteresis: pixels above `high` seed edges, pixels
/// above `low` join an edge only when 8-connected to a seed.
///
/// Both thresholds are clamped to at least [`MIN_THRESHOLD`] and `low`
/// is clamped to at most `high`.
#[must_use = "returns the binary edge map"]
pub fn detect_edges(image: &GrayImage, low: f32, high: f32) -> GrayImage {
    let high = high.max(MIN_THRESHOLD);
    let low = low.max(MIN_THRESHOLD).min(high);

    let (width, height) = image.dimensions();
    let gx: Image<Luma<i16>> = filter_clamped(image, kernel::SOBEL_HORIZONTAL_3X3);
    let gy: Image<Luma<i16>> = filter_clamped(image, kernel::SOBEL_VERTICAL_3X3);

    let magnitude: Vec<f32> = gx
        .pixels()
        .zip(gy.pixels())
        .map(|(h, v)| f32::from(h.0[0].unsigned_abs()) + f32::from(v.0[0].unsigned_abs()))
        .collect();

    let thinned = non_maximum_suppression(&magnitude, &gx, &gy);
    hysteresis(&thinned, width, height, low, high)
}

/// Thicken edges with a square structuring element of the given radius.
///
/// Radius 1 covers the full 8-neighbourhood. Radius 0 returns the mask
/// unchanged.
#[must_use = "returns the dilated mask"]
pub fn dilate(edges: &GrayImage, radius: u8) -> GrayImage {
    if radius == 0 {
        return edges.clone();
    }
    imageproc::morphology::dilate(edges, Norm::LInf, radius)
}

/// Count edge pixels (value 255) in a mask.
#[must_use]
pub fn count_edge_pixels(mask: &GrayImage) -> u64 {
    mask.pixels().map(|p| u64::from(p.0[0] == 255)).sum()
}

const fn index(x: u32, y: u32, width: u32) -> usize {
    (y as usize) * (width as usize) + (x as usize)
}

/// Keep only pixels that are local maxima across the edge.
///
/// The gradient direction is quantized to 0, 45, 90 or 135 degrees and
/// the pixel is compared with its two neighbours along it. The one-pixel
/// image border is always suppressed.
fn non_maximum_suppression(
    magnitude: &[f32],
    gx: &Image<Luma<i16>>,
    gy: &Image<Luma<i16>>,
) -> Vec<f32> {
    let (width, height) = gx.dimensions();
    let mut out = vec![0.0; magnitude.len()];
    if width < 3 || height < 3 {
        return out;
    }

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let i = index(x, y, width);
            let m = magnitude[i];
            if m == 0.0 {
                continue;
            }

            let dx = f32::from(gx.get_pixel(x, y).0[0]);
            let dy = f32::from(gy.get_pixel(x, y).0[0]);
            let mut angle = dy.atan2(dx).to_degrees();
            if angle < 0.0 {
                angle += 180.0;
            }

            let (a, b) = if !(22.5..157.5).contains(&angle) {
                (index(x - 1, y, width), index(x + 1, y, width))
            } else if angle < 67.5 {
                (index(x + 1, y + 1, width), index(x - 1, y - 1, width))
            } else if angle < 112.5 {
                (index(x, y - 1, width), index(x, y + 1, width))
            } else {
                (index(x - 1, y + 1, width), index(x + 1, y - 1, width))
            };

            if m >= magnitude[a] && m >= magnitude[b] {
                out[i] = m;
            }
        }
    }
    out
}

/// Link thinned gradient pixels into edges with a flood fill from
/// strong seeds. Neighbour coordinates are bounds-checked, so seeds on
/// the image border never index outside the buffer.
fn hysteresis(thinned: &[f32], width: u32, height: u32, low: f32, high: f32) -> GrayImage {
    let mut out = GrayImage::new(width, height);
    let mut stack = Vec::new();

    for y in 0..height {
        for x in 0..width {
            if thinned[index(x, y, width)] <= high || out.get_pixel(x, y).0[0] != 0 {
                continue;
            }
            out.put_pixel(x, y, Luma([255]));
            stack.push((x, y));

            while let Some((cx, cy)) = stack.pop() {
                for (dx, dy) in NEIGHBOURS {
                    let (Some(nx), Some(ny)) =
                        (cx.checked_add_signed(dx), cy.checked_add_signed(dy))
                    else {
                        continue;
                    };
                    if nx >= width || ny >= height {
                        continue;
                    }
                    if thinned[index(nx, ny, width)] > low && out.get_pixel(nx, ny).0[0] == 0 {
                        out.put_pixel(nx, ny, Luma([255]));
                        stack.push((nx, ny));
                    }
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 20x20 image with a sharp vertical boundary at x = 10.
    fn sharp_edge_image() -> GrayImage {
        GrayImage::from_fn(20, 20, |x, _y| {
            if x < 10 {
                Luma([0])
            } else {
                Luma([255])
            }
        })
    }

    /// 40x40 white image with a filled black square from 10 to 29.
    fn filled_square_image() -> GrayImage {
        GrayImage::from_fn(40, 40, |x, y| {
            if (10..30).contains(&x) && (10..30).contains(&y) {
                Luma([0])
            } else {
                Luma([255])
            }
        })
    }

    #[test]
    fn uniform_image_produces_no_edges() {
        let img = GrayImage::from_pixel(20, 20, Luma([128]));
        let edges = extract_edges(&img, &PipelineConfig::default());
        assert_eq!(count_edge_pixels(&edges), 0);
    }

    #[test]
    fn sharp_boundary_is_detected_near_the_step() {
        let edges = detect_edges(&smooth(&sharp_edge_image(), None), 30.0, 100.0);
        assert!(count_edge_pixels(&edges) > 0);
        for (x, _y, p) in edges.enumerate_pixels() {
            if p.0[0] == 255 {
                assert!((8..=11).contains(&x), "edge pixel far from step at x={x}");
            }
        }
    }

    #[test]
    fn output_is_binary_and_same_size() {
        let img = filled_square_image();
        let edges = extract_edges(&img, &PipelineConfig::default());
        assert_eq!(edges.dimensions(), img.dimensions());
        assert!(edges.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
    }

    #[test]
    fn square_outline_is_a_closed_ring() {
        let edges = extract_edges(&filled_square_image(), &PipelineConfig::default());
        // Walk the midlines: each must cross an edge on both sides of the square.
        let row: Vec<u8> = (0..40).map(|x| edges.get_pixel(x, 20).0[0]).collect();
        let col: Vec<u8> = (0..40).map(|y| edges.get_pixel(20, y).0[0]).collect();
        assert!(row[..20].contains(&255) && row[20..].contains(&255));
        assert!(col[..20].contains(&255) && col[20..].contains(&255));
        // Interior and far background stay clear.
        assert_eq!(edges.get_pixel(20, 20).0[0], 0);
        assert_eq!(edges.get_pixel(0, 0).0[0], 0);
    }

    /// 11x11 black image with one white pixel in the middle.
    fn impulse_image() -> GrayImage {
        let mut img = GrayImage::new(11, 11);
        img.put_pixel(5, 5, Luma([255]));
        img
    }

    #[test]
    fn default_smoothing_stays_within_three_by_three() {
        let smoothed = smooth(&impulse_image(), None);
        let row: Vec<u8> = (0..11).map(|x| smoothed.get_pixel(x, 5).0[0]).collect();
        assert_eq!(row, [0, 0, 0, 0, 32, 64, 32, 0, 0, 0, 0]);
        assert_eq!(smoothed.get_pixel(4, 4).0[0], 16);
        for (x, y, p) in smoothed.enumerate_pixels() {
            if x.abs_diff(5) > 1 || y.abs_diff(5) > 1 {
                assert_eq!(p.0[0], 0, "non-zero at ({x}, {y})");
            }
        }
    }

    #[test]
    fn default_smoothing_keeps_flat_regions() {
        let img = GrayImage::from_pixel(6, 4, Luma([201]));
        assert_eq!(smooth(&img, None), img);
    }

    #[test]
    fn explicit_sigma_reaches_further() {
        let smoothed = smooth(&impulse_image(), Some(0.8));
        assert!(smoothed.get_pixel(3, 5).0[0] > 0);
    }

    #[test]
    fn unusable_sigma_leaves_image_unchanged() {
        let img = impulse_image();
        for sigma in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY, 0.0, -1.0] {
            assert_eq!(smooth(&img, Some(sigma)), img, "sigma={sigma}");
        }
    }

    #[test]
    fn hysteresis_seed_on_border_does_not_overflow() {
        let mut thinned = vec![0.0; 9];
        thinned[0] = 500.0;
        thinned[1] = 50.0;
        thinned[4] = 50.0;
        let out = hysteresis(&thinned, 3, 3, 30.0, 100.0);
        assert_eq!(out.get_pixel(0, 0).0[0], 255);
        assert_eq!(out.get_pixel(1, 0).0[0], 255);
        assert_eq!(out.get_pixel(1, 1).0[0], 255);
        assert_eq!(out.get_pixel(2, 2).0[0], 0);
    }

    #[test]
    fn weak_pixels_without_a_seed_are_dropped() {
        let thinned = vec![50.0; 9];
        let out = hysteresis(&thinned, 3, 3, 30.0, 100.0);
        assert_eq!(count_edge_pixels(&out), 0);
    }

    #[test]
    fn zero_low_threshold_is_clamped_to_min() {
        let img = sharp_edge_image();
        assert_eq!(
            detect_edges(&img, 0.0, 100.0),
            detect_edges(&img, MIN_THRESHOLD, 100.0)
        );
    }

    #[test]
    fn low_above_high_is_clamped() {
        let img = sharp_edge_image();
        assert_eq!(
            detect_edges(&img, 200.0, 100.0),
            detect_edges(&img, 100.0, 100.0)
        );
    }

    #[test]
    fn dilation_covers_the_eight_neighbourhood() {
        let mut img = GrayImage::new(5, 5);
        img.put_pixel(2, 2, Luma([255]));
        let dilated = dilate(&img, 1);
        assert_eq!(count_edge_pixels(&dilated), 9);
        assert_eq!(dilated.get_pixel(1, 1).0[0], 255);
        assert_eq!(dilated.get_pixel(3, 3).0[0], 255);
        assert_eq!(dilated.get_pixel(0, 0).0[0], 0);
    }

    #[test]
    fn zero_radius_skips_dilation() {
        let mut img = GrayImage::new(5, 5);
        img.put_pixel(2, 2, Luma([255]));
        assert_eq!(dilate(&img, 0), img);
    }

    #[test]
    fn tiny_images_do_not_panic() {
        let img = GrayImage::from_pixel(1, 1, Luma([10]));
        let edges = extract_edges(&img, &PipelineConfig::default());
        assert_eq!(edges.dimensions(), (1, 1));
    }
}
