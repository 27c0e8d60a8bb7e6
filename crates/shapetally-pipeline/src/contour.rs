//! Contour discovery: external boundaries of connected edge regions.
//!
//! Border following is delegated to `imageproc::contours::find_contours`
//! (Suzuki-Abe). Only outer borders without a parent are kept, so a
//! shape outline with a hole in it is reported once. Each boundary is
//! stored with straight runs compressed to their end pixels.
//!
//! Contours that cannot describe a region (fewer than three points
//! after compression, or zero enclosed area) are dropped here so the
//! centroid computation downstream never divides by zero.

use image::GrayImage;
use imageproc::contours::BorderType;

use crate::moments::Moments;
use crate::types::{Contour, Point};

/// Contours found in one edge mask.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TracedContours {
    /// Retained contours, in raster discovery order.
    pub contours: Vec<Contour>,
    /// Number of external boundaries discarded as degenerate.
    pub dropped: usize,
}

/// Trace the external boundaries of every foreground region in `mask`.
///
/// Any non-zero pixel counts as foreground. Discovery order follows a
/// row-major scan of the mask, which is not necessarily the visual
/// left-to-right order of the shapes.
#[must_use = "returns the traced contours"]
pub fn find_external_contours(mask: &GrayImage) -> TracedContours {
    let mut traced = TracedContours::default();

    for border in imageproc::contours::find_contours::<i32>(mask) {
        if border.border_type != BorderType::Outer || border.parent.is_some() {
            continue;
        }

        let chain: Vec<Point> = border
            .points
            .into_iter()
            .map(|p| Point::new(p.x, p.y))
            .collect();
        let ring = compress_runs(&chain);

        if is_degenerate(&ring) {
            traced.dropped += 1;
        } else {
            traced.contours.push(Contour::new(ring));
        }
    }

    traced
}

/// Compress a closed pixel chain so that only direction changes remain.
///
/// Consecutive duplicate points are removed first. A point is kept when
/// the step arriving at it and the step leaving it (wrapping around the
/// ring) point in different directions.
#[must_use]
pub fn compress_runs(chain: &[Point]) -> Vec<Point> {
    let mut ring: Vec<Point> = Vec::with_capacity(chain.len());
    for &p in chain {
        if ring.last() != Some(&p) {
            ring.push(p);
        }
    }
    while ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }

    let n = ring.len();
    if n < 3 {
        return ring;
    }

    (0..n)
        .filter(|&i| {
            let prev = ring[(i + n - 1) % n];
            let here = ring[i];
            let next = ring[(i + 1) % n];
            direction(prev, here) != direction(here, next)
        })
        .map(|i| ring[i])
        .collect()
}

fn direction(from: Point, to: Point) -> (i32, i32) {
    ((to.x - from.x).signum(), (to.y - from.y).signum())
}

fn is_degenerate(ring: &[Point]) -> bool {
    ring.len() < 3 || Moments::of(ring).centroid().is_none()
}
