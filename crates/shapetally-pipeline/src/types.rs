//! Shared types for the shapetally detection pipeline.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Re-export `GrayImage` so downstream crates can reference the
/// luminance plane and edge masks without depending on `image` directly.
pub use image::GrayImage;

/// Re-export `RgbImage` so downstream crates can reference the
/// annotated canvas without depending on `image` directly.
pub use image::RgbImage;

/// An integer pixel position in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (pixels from left edge).
    pub x: i32,
    /// Vertical position (pixels from top edge).
    pub y: i32,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        let dx = f64::from(self.x - other.x);
        let dy = f64::from(self.y - other.y);
        dx.hypot(dy)
    }
}

/// Inclusive axis-aligned bounding box of a set of pixel positions.
///
/// Width and height count pixels, so a single point has a 1x1 box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left-most column.
    pub x: i32,
    /// Top-most row.
    pub y: i32,
    /// Number of columns covered.
    pub width: u32,
    /// Number of rows covered.
    pub height: u32,
}

impl BoundingBox {
    /// Bounding box of `points`, or `None` when the slice is empty.
    #[must_use]
    pub fn of(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self {
            x: min_x,
            y: min_y,
            width: max_x.abs_diff(min_x) + 1,
            height: max_y.abs_diff(min_y) + 1,
        })
    }
}

/// A closed boundary traced from a binary edge mask.
///
/// Points are stored with straight runs compressed: only the pixels
/// where the boundary changes direction are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contour(Vec<Point>);

impl Contour {
    /// Create a contour from an ordered ring of boundary points.
    #[must_use]
    pub const fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Returns the number of stored points.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the contour has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }
}

/// A simplified closed polygon derived from one [`Contour`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Polygon(Vec<Point>);

impl Polygon {
    /// Create a polygon from its vertices.
    #[must_use]
    pub const fn new(vertices: Vec<Point>) -> Self {
        Self(vertices)
    }

    /// Number of vertices.
    #[must_use]
    pub const fn vertex_count(&self) -> usize {
        self.0.len()
    }

    /// Returns a slice of all vertices.
    #[must_use]
    pub fn vertices(&self) -> &[Point] {
        &self.0
    }

    /// Inclusive bounding box of the vertices.
    #[must_use]
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::of(&self.0)
    }
}

/// Language used for label text and count table names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locale {
    /// English names ("Triangle", "Squares", ...).
    #[default]
    English,
    /// Romanian names ("Triunghi", "Pătrate", ...).
    Romanian,
}

/// The five shape categories, in table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeCategory {
    /// Three vertices.
    Triangle,
    /// Four vertices with a near-unit aspect ratio.
    Square,
    /// Four vertices, elongated.
    Rectangle,
    /// Five vertices.
    Pentagon,
    /// Six or more vertices.
    Circle,
}

impl ShapeCategory {
    /// Every category, in enumeration order.
    pub const ALL: [Self; 5] = [
        Self::Triangle,
        Self::Square,
        Self::Rectangle,
        Self::Pentagon,
        Self::Circle,
    ];

    /// Stable machine-readable key.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Triangle => "triangle",
            Self::Square => "square",
            Self::Rectangle => "rectangle",
            Self::Pentagon => "pentagon",
            Self::Circle => "circle",
        }
    }

    /// Singular name drawn next to a detected shape.
    #[must_use]
    pub const fn label(self, locale: Locale) -> &'static str {
        match (locale, self) {
            (Locale::English, Self::Triangle) => "Triangle",
            (Locale::English, Self::Square) => "Square",
            (Locale::English, Self::Rectangle) => "Rectangle",
            (Locale::English, Self::Pentagon) => "Pentagon",
            (Locale::English, Self::Circle) => "Circle",
            (Locale::Romanian, Self::Triangle) => "Triunghi",
            (Locale::Romanian, Self::Square) => "Patrat",
            (Locale::Romanian, Self::Rectangle) => "Dreptunghi",
            (Locale::Romanian, Self::Pentagon) => "Pentagon",
            (Locale::Romanian, Self::Circle) => "Cerc",
        }
    }

    /// Plural name used in the count table.
    #[must_use]
    pub const fn plural(self, locale: Locale) -> &'static str {
        match (locale, self) {
            (Locale::English, Self::Triangle) => "Triangles",
            (Locale::English, Self::Square) => "Squares",
            (Locale::English, Self::Rectangle) => "Rectangles",
            (Locale::English, Self::Pentagon) => "Pentagons",
            (Locale::English, Self::Circle) => "Circles",
            (Locale::Romanian, Self::Triangle) => "Triunghiuri",
            (Locale::Romanian, Self::Square) => "Pătrate",
            (Locale::Romanian, Self::Rectangle) => "Dreptunghiuri",
            (Locale::Romanian, Self::Pentagon) => "Pentagoane",
            (Locale::Romanian, Self::Circle) => "Cercuri",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

/// Per-category shape counts.
///
/// All five categories are always present and iterate in
/// [`ShapeCategory::ALL`] order. Counts only ever grow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CategoryCounts([usize; 5]);

impl CategoryCounts {
    /// A table with every category at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self([0; 5])
    }

    /// Add one shape of `category`.
    pub const fn increment(&mut self, category: ShapeCategory) {
        self.0[category.index()] += 1;
    }

    /// Count for a single category.
    #[must_use]
    pub const fn get(&self, category: ShapeCategory) -> usize {
        self.0[category.index()]
    }

    /// Sum over all categories.
    #[must_use]
    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }

    /// `(category, count)` pairs in enumeration order.
    pub fn iter(&self) -> impl Iterator<Item = (ShapeCategory, usize)> + '_ {
        ShapeCategory::ALL.into_iter().map(|c| (c, self.get(c)))
    }
}

impl Serialize for CategoryCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(ShapeCategory::ALL.len()))?;
        for (category, count) in self.iter() {
            map.serialize_entry(category.key(), &count)?;
        }
        map.end()
    }
}

/// Color used to draw a shape label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelColor {
    /// Drawn over bright interiors.
    Black,
    /// Drawn over dark interiors.
    White,
}

impl LabelColor {
    /// RGB pixel value for this color.
    #[must_use]
    pub const fn rgb(self) -> image::Rgb<u8> {
        match self {
            Self::Black => image::Rgb([0, 0, 0]),
            Self::White => image::Rgb([255, 255, 255]),
        }
    }
}

/// A sub-pixel position, used for centroids.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Centroid {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
}

/// One annotated shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeRecord {
    /// Category assigned by the classifier.
    pub category: ShapeCategory,
    /// Number of vertices of the approximating polygon.
    pub vertex_count: usize,
    /// Area-weighted center of the contour.
    pub centroid: Centroid,
    /// Text drawn on the canvas.
    pub label: String,
    /// Color the label was drawn in.
    pub label_color: LabelColor,
    /// Luminance sampled at the centroid pixel.
    pub brightness: u8,
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Configuration for the detection pipeline.
///
/// Defaults: a 3x3 binomial Gaussian, hysteresis thresholds 30/100, one
/// dilation pass and a polygon tolerance of 4% of the contour perimeter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Gaussian sigma applied before gradient computation. `None` uses
    /// the fixed 3x3 kernel `[1 2 1; 2 4 2; 1 2 1] / 16`.
    pub blur_sigma: Option<f32>,

    /// Hysteresis low threshold on the L1 gradient magnitude.
    pub canny_low: f32,

    /// Hysteresis high threshold on the L1 gradient magnitude.
    pub canny_high: f32,

    /// Radius of the square dilation element. Zero disables dilation.
    pub dilation_radius: u8,

    /// Polygon tolerance as a fraction of the contour perimeter.
    pub approximation_factor: f64,

    /// Exclusive lower bound of the square aspect ratio band.
    pub square_ratio_min: f64,

    /// Exclusive upper bound of the square aspect ratio band.
    pub square_ratio_max: f64,

    /// Centroid luminance above which labels are drawn black.
    pub brightness_threshold: u8,

    /// Downward label shift in pixels, clearing the outline stroke.
    pub label_offset: i32,

    /// Language for labels.
    pub locale: Locale,
}

impl PipelineConfig {
    /// Default smoothing: the fixed 3x3 kernel.
    pub const DEFAULT_BLUR_SIGMA: Option<f32> = None;
    /// Default hysteresis low threshold.
    pub const DEFAULT_CANNY_LOW: f32 = 30.0;
    /// Default hysteresis high threshold.
    pub const DEFAULT_CANNY_HIGH: f32 = 100.0;
    /// Default dilation radius (3x3 square element).
    pub const DEFAULT_DILATION_RADIUS: u8 = 1;
    /// Default polygon tolerance factor.
    pub const DEFAULT_APPROXIMATION_FACTOR: f64 = 0.04;
    /// Default square band lower bound.
    pub const DEFAULT_SQUARE_RATIO_MIN: f64 = 0.9;
    /// Default square band upper bound.
    pub const DEFAULT_SQUARE_RATIO_MAX: f64 = 1.1;
    /// Default label brightness threshold.
    pub const DEFAULT_BRIGHTNESS_THRESHOLD: u8 = 50;
    /// Default label offset in pixels.
    pub const DEFAULT_LABEL_OFFSET: i32 = 30;
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            blur_sigma: Self::DEFAULT_BLUR_SIGMA,
            canny_low: Self::DEFAULT_CANNY_LOW,
            canny_high: Self::DEFAULT_CANNY_HIGH,
            dilation_radius: Self::DEFAULT_DILATION_RADIUS,
            approximation_factor: Self::DEFAULT_APPROXIMATION_FACTOR,
            square_ratio_min: Self::DEFAULT_SQUARE_RATIO_MIN,
            square_ratio_max: Self::DEFAULT_SQUARE_RATIO_MAX,
            brightness_threshold: Self::DEFAULT_BRIGHTNESS_THRESHOLD,
            label_offset: Self::DEFAULT_LABEL_OFFSET,
            locale: Locale::default(),
        }
    }
}

/// Result of running the full pipeline on one image.
///
/// Does not derive `PartialEq` because comparing canvases pixel by
/// pixel is rarely what callers want; compare `annotated.as_raw()`
/// explicitly when needed.
#[derive(Debug, Clone)]
pub struct ProcessResult {
    /// Per-category counts in enumeration order.
    pub counts: CategoryCounts,
    /// One record per annotated shape, in draw order.
    pub shapes: Vec<ShapeRecord>,
    /// The input image with outlines and labels drawn on it.
    pub annotated: RgbImage,
    /// Dimensions of the source image in pixels.
    pub dimensions: Dimensions,
}

/// Why an input could not be turned into a raster image.
#[derive(Debug, thiserror::Error)]
pub enum InvalidImage {
    /// The input image bytes were empty.
    #[error("input image data is empty")]
    Empty,

    /// The bytes are not a decodable image.
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    /// The image decoded but covers no pixels.
    #[error("image has zero area ({width}x{height})")]
    ZeroArea {
        /// Decoded width.
        width: u32,
        /// Decoded height.
        height: u32,
    },
}

/// Errors that abort a pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The input is not a usable raster image.
    #[error("invalid image: {0}")]
    InvalidImage(#[from] InvalidImage),
}

impl From<image::ImageError> for PipelineError {
    fn from(err: image::ImageError) -> Self {
        Self::InvalidImage(InvalidImage::Decode(err))
    }
}

/// Errors isolated to a single shape; the shape is skipped.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ShapeError {
    /// The contour encloses no area, so it has no centroid.
    #[error("degenerate shape: {0}")]
    Degenerate(&'static str),
}
