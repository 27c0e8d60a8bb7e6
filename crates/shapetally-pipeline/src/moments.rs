//! Spatial moments of a closed contour.
//!
//! Moments are computed from the boundary with Green's theorem, so a
//! contour stored with compressed straight runs gives the same result as
//! the full pixel chain.

use crate::types::{Centroid, Point};

/// Zeroth and first order moments of the region enclosed by a ring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Moments {
    /// Enclosed area.
    pub m00: f64,
    /// First moment about the y axis (`∑ x`).
    pub m10: f64,
    /// First moment about the x axis (`∑ y`).
    pub m01: f64,
}

impl Moments {
    /// Moments of the polygon formed by `ring` (implicitly closed).
    ///
    /// Orientation does not matter: a clockwise ring is normalized so
    /// that `m00` is never negative.
    #[must_use]
    pub fn of(ring: &[Point]) -> Self {
        let n = ring.len();
        if n < 3 {
            return Self {
                m00: 0.0,
                m10: 0.0,
                m01: 0.0,
            };
        }

        let (mut a, mut mx, mut my) = (0.0, 0.0, 0.0);
        for i in 0..n {
            let p = ring[i];
            let q = ring[(i + 1) % n];
            let (x0, y0, x1, y1) = (
                f64::from(p.x),
                f64::from(p.y),
                f64::from(q.x),
                f64::from(q.y),
            );
            let cross = x0.mul_add(y1, -(x1 * y0));
            a += cross;
            mx += cross * (x0 + x1);
            my += cross * (y0 + y1);
        }

        let sign = if a < 0.0 { -1.0 } else { 1.0 };
        Self {
            m00: sign * a / 2.0,
            m10: sign * mx / 6.0,
            m01: sign * my / 6.0,
        }
    }

    /// Area-weighted center, or `None` when the ring encloses no area.
    #[must_use]
    pub fn centroid(&self) -> Option<Centroid> {
        if self.m00 <= f64::EPSILON {
            return None;
        }
        Some(Centroid {
            x: self.m10 / self.m00,
            y: self.m01 / self.m00,
        })
    }
}
