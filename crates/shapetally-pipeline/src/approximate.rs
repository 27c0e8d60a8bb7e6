//! Polygon approximation of closed contours (Ramer-Douglas-Peucker).
//!
//! The tolerance scales with the contour perimeter, so small and large
//! drawings of the same shape simplify to the same vertex count. With
//! the default factor of 4%, near-circular outlines settle at six or
//! more vertices while straight-sided shapes keep only their corners.

use crate::types::{Contour, Point, Polygon};

/// Perimeter of a closed ring, including the closing segment.
#[must_use]
pub fn arc_length(ring: &[Point]) -> f64 {
    let n = ring.len();
    if n < 2 {
        return 0.0;
    }
    (0..n).map(|i| ring[i].distance(ring[(i + 1) % n])).sum()
}

/// Approximate `contour` by a polygon whose edges stay within
/// `factor * perimeter` of every contour point.
///
/// The ring is split at its first point and the point farthest from it;
/// each half is simplified independently and the halves are rejoined.
/// Contours with fewer than three points are returned unchanged.
#[must_use = "returns the approximating polygon"]
pub fn approximate(contour: &Contour, factor: f64) -> Polygon {
    let points = contour.points();
    let n = points.len();
    if n < 3 {
        return Polygon::new(points.to_vec());
    }

    let epsilon = factor * arc_length(points);

    let mut far = 1;
    let mut far_dist = 0.0;
    for (i, p) in points.iter().enumerate().skip(1) {
        let d = p.distance(points[0]);
        if d > far_dist {
            far_dist = d;
            far = i;
        }
    }

    // Closed copy: index `n` is the start point again.
    let mut ring = points.to_vec();
    ring.push(points[0]);

    let mut kept = vec![false; n + 1];
    kept[0] = true;
    kept[far] = true;
    rdp_recurse(&ring, 0, far, epsilon, &mut kept);
    rdp_recurse(&ring, far, n, epsilon, &mut kept);

    let vertices = ring[..n]
        .iter()
        .zip(&kept[..n])
        .filter(|&(_, k)| *k)
        .map(|(&p, _)| p)
        .collect();
    Polygon::new(vertices)
}

/// Recursive step of the Ramer-Douglas-Peucker algorithm.
///
/// Finds the point between `start` and `end` that is farthest from the
/// line through them. If that distance exceeds `tolerance`, the point is
/// kept and both sub-chains are processed recursively.
fn rdp_recurse(points: &[Point], start: usize, end: usize, tolerance: f64, kept: &mut [bool]) {
    if end <= start + 1 {
        return;
    }

    let mut max_dist = 0.0;
    let mut max_idx = start;

    for i in (start + 1)..end {
        let d = perpendicular_distance(points[i], points[start], points[end]);
        if d > max_dist {
            max_dist = d;
            max_idx = i;
        }
    }

    if max_dist > tolerance {
        kept[max_idx] = true;
        rdp_recurse(points, start, max_idx, tolerance, kept);
        rdp_recurse(points, max_idx, end, tolerance, kept);
    }
}

/// Perpendicular distance from `p` to the line through `a` and `b`.
///
/// When `a` and `b` coincide, returns the distance from `p` to `a`.
fn perpendicular_distance(p: Point, a: Point, b: Point) -> f64 {
    let dx = f64::from(b.x - a.x);
    let dy = f64::from(b.y - a.y);
    let length = dx.hypot(dy);

    if length == 0.0 {
        return p.distance(a);
    }

    let cross = dx.mul_add(f64::from(a.y - p.y), -(dy * f64::from(a.x - p.x)));
    cross.abs() / length
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::contour::compress_runs;

    /// Dense pixel ring around an axis-aligned rectangle.
    fn rectangle_chain(x0: i32, y0: i32, w: i32, h: i32) -> Vec<Point> {
        let mut pts = Vec::new();
        pts.extend((x0..x0 + w).map(|x| Point::new(x, y0)));
        pts.extend((y0..y0 + h).map(|y| Point::new(x0 + w, y)));
        pts.extend((x0 + 1..=x0 + w).rev().map(|x| Point::new(x, y0 + h)));
        pts.extend((y0 + 1..=y0 + h).rev().map(|y| Point::new(x0, y)));
        pts
    }

    /// Pixel ring approximating a circle, one point per degree.
    #[allow(clippy::cast_possible_truncation)]
    fn circle_chain(cx: i32, cy: i32, r: f64) -> Vec<Point> {
        let mut pts: Vec<Point> = (0..360)
            .map(|deg| {
                let t = f64::from(deg).to_radians();
                Point::new(
                    cx + (r * t.cos()).round() as i32,
                    cy - (r * t.sin()).round() as i32,
                )
            })
            .collect();
        pts.dedup();
        pts
    }

    #[test]
    fn arc_length_of_unit_square_ring() {
        let ring = [
            Point::new(0, 0),
            Point::new(1, 0),
            Point::new(1, 1),
            Point::new(0, 1),
        ];
        assert!((arc_length(&ring) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn arc_length_of_short_rings() {
        assert!(arc_length(&[]).abs() < f64::EPSILON);
        assert!(arc_length(&[Point::new(3, 3)]).abs() < f64::EPSILON);
        // Two points: there and back.
        assert!((arc_length(&[Point::new(0, 0), Point::new(3, 4)]) - 10.0).abs() < 1e-12);
    }

    #[test]
    fn rectangle_reduces_to_four_corners() {
        let contour = Contour::new(rectangle_chain(10, 10, 60, 30));
        let polygon = approximate(&contour, 0.04);
        assert_eq!(polygon.vertex_count(), 4);
        for corner in [
            Point::new(10, 10),
            Point::new(70, 10),
            Point::new(70, 40),
            Point::new(10, 40),
        ] {
            assert!(polygon.vertices().contains(&corner), "missing {corner:?}");
        }
    }

    #[test]
    fn compressed_and_dense_rings_agree() {
        let dense = rectangle_chain(0, 0, 40, 40);
        let sparse = compress_runs(&dense);
        assert_eq!(
            approximate(&Contour::new(dense), 0.04).vertex_count(),
            approximate(&Contour::new(sparse), 0.04).vertex_count(),
        );
    }

    #[test]
    fn triangle_reduces_to_three_vertices() {
        let mut chain = Vec::new();
        chain.extend((0..=50).map(|i| Point::new(50 + i, i * 2)));
        chain.extend((1..=100).map(|i| Point::new(100 - i, 100)));
        chain.extend((1..50).map(|i| Point::new(i, 100 - i * 2)));
        let polygon = approximate(&Contour::new(chain), 0.04);
        assert_eq!(polygon.vertex_count(), 3);
    }

    #[test]
    fn circle_keeps_at_least_six_vertices() {
        let contour = Contour::new(circle_chain(100, 100, 80.0));
        let polygon = approximate(&contour, 0.04);
        assert!(
            polygon.vertex_count() >= 6,
            "got {} vertices",
            polygon.vertex_count()
        );
    }

    #[test]
    fn larger_factor_simplifies_more() {
        let contour = Contour::new(circle_chain(100, 100, 80.0));
        let fine = approximate(&contour, 0.01).vertex_count();
        let coarse = approximate(&contour, 0.1).vertex_count();
        assert!(fine > coarse, "fine={fine} coarse={coarse}");
    }

    #[test]
    fn short_contours_are_returned_unchanged() {
        let contour = Contour::new(vec![Point::new(0, 0), Point::new(4, 4)]);
        assert_eq!(approximate(&contour, 0.04).vertex_count(), 2);
    }

    #[test]
    fn perpendicular_distance_on_axis() {
        let d = perpendicular_distance(Point::new(1, 3), Point::new(0, 0), Point::new(2, 0));
        assert!((d - 3.0).abs() < 1e-10);
    }

    #[test]
    fn perpendicular_distance_coincident_endpoints() {
        let d = perpendicular_distance(Point::new(3, 4), Point::new(0, 0), Point::new(0, 0));
        assert!((d - 5.0).abs() < 1e-10);
    }
}
