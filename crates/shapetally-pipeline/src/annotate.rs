//! Shape annotation: centroid, label color, label text and outline.
//!
//! Each retained contour is annotated in discovery order on one shared
//! canvas, so a later shape's strokes are drawn over an earlier one's.
//! Brightness is always sampled from the luminance of the source image,
//! never from the canvas, so earlier labels cannot change the color
//! chosen for later ones.

use image::{GrayImage, Rgb, RgbImage};

use crate::font::{self, TextStyle};
use crate::moments::Moments;
use crate::types::{
    Centroid, Contour, LabelColor, Locale, PipelineConfig, Polygon, ShapeCategory, ShapeError,
    ShapeRecord,
};

/// Outline stroke color.
pub const OUTLINE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Outline stroke width in pixels.
pub const OUTLINE_THICKNESS: u32 = 2;

/// Pick the label color for a centroid intensity.
///
/// Black over anything brighter than `threshold`, white otherwise.
#[must_use]
pub const fn label_color(intensity: u8, threshold: u8) -> LabelColor {
    if intensity > threshold {
        LabelColor::Black
    } else {
        LabelColor::White
    }
}

/// Pixel containing `centroid`, clamped into a `width` x `height` image.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub fn centroid_pixel(centroid: Centroid, width: u32, height: u32) -> (u32, u32) {
    let clamp = |v: f64, len: u32| -> u32 {
        let max = i64::from(len.saturating_sub(1));
        u32::try_from((v.floor() as i64).clamp(0, max)).unwrap_or(0)
    };
    (clamp(centroid.x, width), clamp(centroid.y, height))
}

/// Draws labels and outlines for classified contours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Annotator {
    /// Intensity above which labels are black.
    pub brightness_threshold: u8,
    /// Baseline shift below the top of the centered text box.
    pub label_offset: i32,
    /// Label language.
    pub locale: Locale,
    /// Label font parameters.
    pub text_style: TextStyle,
}

impl Default for Annotator {
    fn default() -> Self {
        Self::from(&PipelineConfig::default())
    }
}

impl From<&PipelineConfig> for Annotator {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            brightness_threshold: config.brightness_threshold,
            label_offset: config.label_offset,
            locale: config.locale,
            text_style: TextStyle::default(),
        }
    }
}

impl Annotator {
    /// Annotate one shape on `canvas`.
    ///
    /// The label is horizontally centered on the centroid; its baseline
    /// sits `label_offset` pixels below the top of a text-sized box
    /// centered on the centroid, which keeps the text clear of the
    /// outline stroke. The outline is drawn after the label.
    ///
    /// # Errors
    ///
    /// Returns [`ShapeError::Degenerate`] without touching the canvas if
    /// the contour encloses no area.
    pub fn annotate(
        &self,
        canvas: &mut RgbImage,
        gray: &GrayImage,
        contour: &Contour,
        polygon: &Polygon,
        category: ShapeCategory,
    ) -> Result<ShapeRecord, ShapeError> {
        let centroid = Moments::of(contour.points())
            .centroid()
            .ok_or(ShapeError::Degenerate("contour encloses no area"))?;

        let (px, py) = centroid_pixel(centroid, gray.width(), gray.height());
        let brightness = gray.get_pixel(px, py).0[0];
        let color = label_color(brightness, self.brightness_threshold);
        let label = category.label(self.locale);

        let (x, y) = self.label_origin(label, px, py);
        font::draw_text_mut(canvas, label, x, y, self.text_style, color.rgb());
        draw_outline(canvas, contour);

        tracing::debug!(
            ?category,
            vertices = polygon.vertex_count(),
            cx = centroid.x,
            cy = centroid.y,
            brightness,
            ?color,
            "annotated shape"
        );

        Ok(ShapeRecord {
            category,
            vertex_count: polygon.vertex_count(),
            centroid,
            label: label.to_owned(),
            label_color: color,
            brightness,
        })
    }

    /// Top-left corner of the label text for a centroid pixel.
    #[must_use]
    pub fn label_origin(&self, label: &str, px: u32, py: u32) -> (i32, i32) {
        let (w, h) = self.text_style.measure(label);
        let (w, h) = (
            i32::try_from(w).unwrap_or(i32::MAX),
            i32::try_from(h).unwrap_or(i32::MAX),
        );
        let cx = i32::try_from(px).unwrap_or(i32::MAX);
        let cy = i32::try_from(py).unwrap_or(i32::MAX);
        let baseline = cy - h / 2 + self.label_offset;
        (cx - w / 2, baseline - h)
    }
}

/// Stroke the closed contour in [`OUTLINE_COLOR`].
#[allow(clippy::cast_precision_loss)]
pub fn draw_outline(canvas: &mut RgbImage, contour: &Contour) {
    let points = contour.points();
    let n = points.len();
    if n == 0 {
        return;
    }
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        font::draw_thick_segment(
            canvas,
            (a.x as f32, a.y as f32),
            (b.x as f32, b.y as f32),
            OUTLINE_THICKNESS,
            OUTLINE_COLOR,
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Point;

    fn square_contour(x: i32, y: i32, side: i32) -> Contour {
        Contour::new(vec![
            Point::new(x, y),
            Point::new(x + side, y),
            Point::new(x + side, y + side),
            Point::new(x, y + side),
        ])
    }

    fn polygon_of(contour: &Contour) -> Polygon {
        Polygon::new(contour.points().to_vec())
    }

    #[test]
    fn brightness_threshold_is_exclusive() {
        assert_eq!(label_color(50, 50), LabelColor::White);
        assert_eq!(label_color(51, 50), LabelColor::Black);
        assert_eq!(label_color(0, 50), LabelColor::White);
        assert_eq!(label_color(255, 50), LabelColor::Black);
    }

    #[test]
    fn centroid_pixel_truncates_and_clamps() {
        let c = |x, y| Centroid { x, y };
        assert_eq!(centroid_pixel(c(10.9, 3.2), 20, 20), (10, 3));
        assert_eq!(centroid_pixel(c(-4.0, 99.0), 20, 20), (0, 19));
    }

    #[test]
    fn label_is_white_on_dark_interior() {
        let gray = GrayImage::from_pixel(120, 120, image::Luma([50]));
        let mut canvas = RgbImage::from_pixel(120, 120, Rgb([50, 50, 50]));
        let contour = square_contour(20, 20, 80);
        let record = Annotator::default()
            .annotate(
                &mut canvas,
                &gray,
                &contour,
                &polygon_of(&contour),
                ShapeCategory::Square,
            )
            .unwrap();
        assert_eq!(record.label_color, LabelColor::White);
        assert_eq!(record.brightness, 50);
        assert_eq!(record.label, "Square");
        assert!((record.centroid.x - 60.0).abs() < 1e-9);
        assert!((record.centroid.y - 60.0).abs() < 1e-9);
        assert!(canvas.pixels().any(|p| *p == Rgb([255, 255, 255])));
    }

    #[test]
    fn label_is_black_on_bright_interior() {
        let gray = GrayImage::from_pixel(120, 120, image::Luma([51]));
        let mut canvas = RgbImage::from_pixel(120, 120, Rgb([200, 200, 200]));
        let contour = square_contour(20, 20, 80);
        let record = Annotator::default()
            .annotate(
                &mut canvas,
                &gray,
                &contour,
                &polygon_of(&contour),
                ShapeCategory::Square,
            )
            .unwrap();
        assert_eq!(record.label_color, LabelColor::Black);
        assert!(canvas.pixels().any(|p| *p == Rgb([0, 0, 0])));
    }

    #[test]
    fn brightness_comes_from_source_not_canvas() {
        // Canvas is bright, source luminance is dark.
        let gray = GrayImage::from_pixel(120, 120, image::Luma([10]));
        let mut canvas = RgbImage::from_pixel(120, 120, Rgb([255, 255, 255]));
        let contour = square_contour(20, 20, 80);
        let record = Annotator::default()
            .annotate(
                &mut canvas,
                &gray,
                &contour,
                &polygon_of(&contour),
                ShapeCategory::Square,
            )
            .unwrap();
        assert_eq!(record.label_color, LabelColor::White);
    }

    #[test]
    fn outline_follows_the_contour() {
        let gray = GrayImage::from_pixel(120, 120, image::Luma([200]));
        let mut canvas = RgbImage::from_pixel(120, 120, Rgb([200, 200, 200]));
        let contour = square_contour(20, 20, 80);
        Annotator::default()
            .annotate(
                &mut canvas,
                &gray,
                &contour,
                &polygon_of(&contour),
                ShapeCategory::Square,
            )
            .unwrap();
        for (x, y) in [(20, 20), (60, 20), (100, 60), (20, 100), (60, 100)] {
            assert_eq!(*canvas.get_pixel(x, y), OUTLINE_COLOR, "at ({x}, {y})");
        }
        assert_eq!(*canvas.get_pixel(5, 5), Rgb([200, 200, 200]));
    }

    #[test]
    fn label_uses_locale() {
        let annotator = Annotator {
            locale: Locale::Romanian,
            ..Annotator::default()
        };
        let gray = GrayImage::from_pixel(120, 120, image::Luma([200]));
        let mut canvas = RgbImage::new(120, 120);
        let contour = square_contour(10, 10, 90);
        let record = annotator
            .annotate(
                &mut canvas,
                &gray,
                &contour,
                &polygon_of(&contour),
                ShapeCategory::Circle,
            )
            .unwrap();
        assert_eq!(record.label, "Cerc");
    }

    #[test]
    fn label_is_centered_horizontally() {
        let annotator = Annotator::default();
        let (w, h) = annotator.text_style.measure("Square");
        let (x, y) = annotator.label_origin("Square", 200, 100);
        let w = i32::try_from(w).unwrap();
        let h = i32::try_from(h).unwrap();
        assert!((x + w / 2 - 200).abs() <= 1);
        assert_eq!(y + h, 100 - h / 2 + PipelineConfig::DEFAULT_LABEL_OFFSET);
    }

    #[test]
    fn degenerate_contour_leaves_canvas_untouched() {
        let gray = GrayImage::new(20, 20);
        let mut canvas = RgbImage::new(20, 20);
        let line = Contour::new(vec![Point::new(1, 1), Point::new(5, 5), Point::new(9, 9)]);
        let result = Annotator::default().annotate(
            &mut canvas,
            &gray,
            &line,
            &polygon_of(&line),
            ShapeCategory::Triangle,
        );
        assert!(matches!(result, Err(ShapeError::Degenerate(_))));
        assert!(canvas.pixels().all(|p| *p == Rgb([0, 0, 0])));
    }
}
