//! Result aggregation: counts per category plus the annotated canvas.

use crate::types::{CategoryCounts, Dimensions, ProcessResult, RgbImage, ShapeRecord};

/// Collects annotated shapes for one pipeline run.
///
/// Owns the canvas for the duration of the run so that every draw goes
/// through a single mutable borrow, in contour order.
#[derive(Debug, Clone)]
pub struct ResultAggregator {
    counts: CategoryCounts,
    shapes: Vec<ShapeRecord>,
    canvas: RgbImage,
}

impl ResultAggregator {
    /// Start aggregating onto `canvas`.
    #[must_use]
    pub const fn new(canvas: RgbImage) -> Self {
        Self {
            counts: CategoryCounts::new(),
            shapes: Vec::new(),
            canvas,
        }
    }

    /// The canvas shapes are drawn on.
    pub const fn canvas_mut(&mut self) -> &mut RgbImage {
        &mut self.canvas
    }

    /// Counts so far.
    #[must_use]
    pub const fn counts(&self) -> &CategoryCounts {
        &self.counts
    }

    /// Register one annotated shape.
    pub fn record(&mut self, shape: ShapeRecord) {
        self.counts.increment(shape.category);
        self.shapes.push(shape);
    }

    /// Finish the run, handing over counts, records and the canvas.
    #[must_use]
    pub fn finish(self) -> ProcessResult {
        let dimensions = Dimensions {
            width: self.canvas.width(),
            height: self.canvas.height(),
        };
        ProcessResult {
            counts: self.counts,
            shapes: self.shapes,
            annotated: self.canvas,
            dimensions,
        }
    }
}
