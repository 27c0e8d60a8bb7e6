//! Shape classification by vertex count and aspect ratio.

use crate::types::{BoundingBox, PipelineConfig, Polygon, ShapeCategory};

/// Exclusive aspect-ratio band inside which a quadrilateral is a square.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SquareBand {
    /// Ratios must be strictly greater than this.
    pub min: f64,
    /// Ratios must be strictly less than this.
    pub max: f64,
}

impl Default for SquareBand {
    fn default() -> Self {
        Self {
            min: PipelineConfig::DEFAULT_SQUARE_RATIO_MIN,
            max: PipelineConfig::DEFAULT_SQUARE_RATIO_MAX,
        }
    }
}

impl From<&PipelineConfig> for SquareBand {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            min: config.square_ratio_min,
            max: config.square_ratio_max,
        }
    }
}

/// Assign a category to `polygon`.
///
/// Total over every vertex count: anything that is not a triangle,
/// quadrilateral or pentagon is treated as a circle.
#[must_use]
pub fn classify(polygon: &Polygon, band: SquareBand) -> ShapeCategory {
    match polygon.vertex_count() {
        3 => ShapeCategory::Triangle,
        4 => polygon
            .bounding_box()
            .map_or(ShapeCategory::Rectangle, |bbox| classify_quadrilateral(bbox, band)),
        5 => ShapeCategory::Pentagon,
        _ => ShapeCategory::Circle,
    }
}

/// Square when `band.min < width / height < band.max`, otherwise
/// rectangle. A zero-height box is a rectangle.
#[must_use]
pub fn classify_quadrilateral(bbox: BoundingBox, band: SquareBand) -> ShapeCategory {
    if bbox.height == 0 {
        return ShapeCategory::Rectangle;
    }
    let ratio = f64::from(bbox.width) / f64::from(bbox.height);
    if band.min < ratio && ratio < band.max {
        ShapeCategory::Square
    } else {
        ShapeCategory::Rectangle
    }
}
