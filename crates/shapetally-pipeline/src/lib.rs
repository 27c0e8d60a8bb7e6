//! shapetally-pipeline: Pure shape detection and annotation (sans-IO).
//!
//! Turns a raster image into per-category shape counts and an annotated
//! copy of the image through:
//! decode -> smoothing -> gradient hysteresis -> dilation ->
//! external contour tracing -> polygon approximation ->
//! classification -> labelling and outlining.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! byte slices and returns structured data. Encoding, persistence and
//! the description service live in `shapetally-export` and
//! `shapetally-io`.

pub mod aggregate;
pub mod annotate;
pub mod approximate;
pub mod classify;
pub mod contour;
pub mod decode;
pub mod diagnostics;
pub mod edge;
pub mod font;
pub mod moments;
pub mod types;

pub use aggregate::ResultAggregator;
pub use annotate::Annotator;
pub use classify::SquareBand;
pub use decode::DecodedImage;
pub use diagnostics::{Clock, PipelineDiagnostics, StageDiagnostics, StageMetrics};
pub use types::{
    CategoryCounts, Centroid, Contour, Dimensions, InvalidImage, LabelColor, Locale,
    PipelineConfig, PipelineError, Point, Polygon, ProcessResult, ShapeCategory, ShapeError,
    ShapeRecord,
};

/// Run the full detection pipeline.
///
/// Takes raw image bytes (PNG, JPEG, BMP, WebP) and a configuration,
/// then produces a [`ProcessResult`] holding the per-category counts,
/// one record per annotated shape and the annotated canvas.
///
/// # Pipeline steps
///
/// 1. Decode image into an RGB canvas and a luminance plane
/// 2. Gaussian smoothing (3x3 by default)
/// 3. Gradient magnitude, non-maximum suppression and hysteresis
/// 4. Dilation to close small gaps in the edge mask
/// 5. External contour tracing
/// 6. Polygon approximation (closed Ramer-Douglas-Peucker)
/// 7. Classification by vertex count and aspect ratio
/// 8. Label and outline drawing, counted per category
///
/// A shape that fails in steps 6-8 is logged and skipped; the rest of
/// the image is still processed.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidImage`] if `image_bytes` is empty,
/// not a recognizable image, or decodes to zero pixels.
pub fn process(
    image_bytes: &[u8],
    config: &PipelineConfig,
) -> Result<ProcessResult, PipelineError> {
    // 1. Decode.
    let decoded = decode::decode(image_bytes)?;

    // 2-4. Edge mask.
    let edges = edge::extract_edges(&decoded.gray, config);

    // 5. Contours.
    let traced = contour::find_external_contours(&edges);

    // 6-8. Per-shape work.
    let (result, _skipped) = annotate_shapes(decoded, &traced.contours, config);
    Ok(result)
}

/// Run the pipeline and collect per-stage timing and metrics.
///
/// Produces the same [`ProcessResult`] as [`process`].
///
/// # Errors
///
/// Same as [`process`].
pub fn process_with_diagnostics<C: Clock>(
    image_bytes: &[u8],
    config: &PipelineConfig,
    clock: &C,
) -> Result<(ProcessResult, PipelineDiagnostics), PipelineError> {
    let pipeline_start = clock.now();

    let start = clock.now();
    let decoded = decode::decode(image_bytes)?;
    let dimensions = decoded.dimensions();
    let decode = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::Decode {
            input_bytes: image_bytes.len(),
            width: dimensions.width,
            height: dimensions.height,
            channels: decoded.channels,
        },
    };

    let start = clock.now();
    let edges = edge::extract_edges(&decoded.gray, config);
    let edge_extraction = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::EdgeExtraction {
            low_threshold: config.canny_low,
            high_threshold: config.canny_high,
            edge_pixel_count: edge::count_edge_pixels(&edges),
            total_pixel_count: u64::from(dimensions.width) * u64::from(dimensions.height),
        },
    };

    let start = clock.now();
    let traced = contour::find_external_contours(&edges);
    let contour_tracing = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::ContourTracing {
            retained: traced.contours.len(),
            dropped: traced.dropped,
        },
    };

    let start = clock.now();
    let (result, skipped) = annotate_shapes(decoded, &traced.contours, config);
    let shape_annotation = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::ShapeAnnotation {
            annotated: result.shapes.len(),
            skipped,
        },
    };

    let diagnostics = PipelineDiagnostics {
        decode,
        edge_extraction,
        contour_tracing,
        shape_annotation,
        total_duration: clock.elapsed(&pipeline_start),
    };

    Ok((result, diagnostics))
}

/// Approximate, classify and draw every contour in order.
///
/// Returns the finished result and the number of skipped shapes.
fn annotate_shapes(
    decoded: DecodedImage,
    contours: &[Contour],
    config: &PipelineConfig,
) -> (ProcessResult, usize) {
    let DecodedImage { canvas, gray, .. } = decoded;
    let band = SquareBand::from(config);
    let annotator = Annotator::from(config);
    let mut aggregator = ResultAggregator::new(canvas);
    let mut skipped = 0;

    for (index, contour) in contours.iter().enumerate() {
        let polygon = approximate::approximate(contour, config.approximation_factor);
        let category = classify::classify(&polygon, band);
        match annotator.annotate(aggregator.canvas_mut(), &gray, contour, &polygon, category) {
            Ok(record) => aggregator.record(record),
            Err(err) => {
                skipped += 1;
                tracing::warn!(index, %err, "skipping shape");
            }
        }
    }

    tracing::debug!(
        shapes = aggregator.counts().total(),
        skipped,
        "annotation finished"
    );

    (aggregator.finish(), skipped)
}
