//! Planar primitives: points, the bounding region and polygon helpers

use glam::DVec2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, WarpError};

/// A point in the plane
pub type Point = DVec2;

/// Axis-aligned rectangle that every cell is eventually clipped to
///
/// Construction through [`BoundingRegion::new`] guarantees finite bounds and a
/// strictly positive area.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingRegion {
    /// Lower-left corner
    pub min: Point,
    /// Upper-right corner
    pub max: Point,
}

impl BoundingRegion {
    /// Create a region from its bounds
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if a bound or measure is not finite or the area
    /// is not positive.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Result<Self> {
        let region = Self {
            min: Point::new(min_x, min_y),
            max: Point::new(max_x, max_y),
        };
        region.validate()?;
        Ok(region)
    }

    /// Unit square `[0, 1] x [0, 1]`
    pub fn unit() -> Self {
        Self {
            min: Point::ZERO,
            max: Point::ONE,
        }
    }

    /// Check finiteness of bounds and measures, and positive area
    ///
    /// Needed for regions that bypassed [`BoundingRegion::new`] (e.g. deserialized ones).
    pub fn validate(&self) -> Result<()> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(WarpError::InvalidInput(format!(
                "region bounds must be finite (got {:?}..{:?})",
                self.min, self.max
            )));
        }
        // Finite bounds can still be too far apart to measure
        if !self.width().is_finite()
            || !self.height().is_finite()
            || !self.area().is_finite()
            || !self.diagonal().is_finite()
        {
            return Err(WarpError::InvalidInput(format!(
                "region extent overflows (got {:?}..{:?})",
                self.min, self.max
            )));
        }
        if self.width() <= 0.0 || self.height() <= 0.0 {
            return Err(WarpError::InvalidInput(format!(
                "region must have positive area (got {} x {})",
                self.width(),
                self.height()
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Length of the diagonal
    #[inline]
    pub fn diagonal(&self) -> f64 {
        (self.max - self.min).length()
    }

    /// Inclusive containment: boundary points are inside
    #[inline]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Corners in counter-clockwise order starting at `min`
    pub fn corners(&self) -> [Point; 4] {
        [
            self.min,
            Point::new(self.max.x, self.min.y),
            self.max,
            Point::new(self.min.x, self.max.y),
        ]
    }

    /// Smallest region containing this one and every point
    pub(crate) fn enclosing(&self, points: impl IntoIterator<Item = Point>) -> Self {
        points.into_iter().fold(*self, |acc, p| Self {
            min: acc.min.min(p),
            max: acc.max.max(p),
        })
    }

    /// Grow every side by `amount`
    pub(crate) fn expanded(&self, amount: f64) -> Self {
        Self {
            min: self.min - Point::splat(amount),
            max: self.max + Point::splat(amount),
        }
    }
}

impl Default for BoundingRegion {
    fn default() -> Self {
        Self::unit()
    }
}

/// Signed area of a closed polygon (positive when counter-clockwise)
pub fn signed_area(vertices: &[Point]) -> f64 {
    if vertices.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0;
    for i in 0..vertices.len() {
        let a = vertices[i];
        let b = vertices[(i + 1) % vertices.len()];
        twice_area += a.perp_dot(b);
    }
    twice_area * 0.5
}

/// Area centroid of a simple polygon
///
/// Falls back to the vertex average when the area vanishes.
pub fn centroid(vertices: &[Point]) -> Option<Point> {
    if vertices.is_empty() {
        return None;
    }

    let area = signed_area(vertices);
    if area.abs() <= f64::EPSILON {
        let sum: Point = vertices.iter().copied().sum();
        return Some(sum / vertices.len() as f64);
    }

    // Shift to the first vertex to keep the cross products small
    let origin = vertices[0];
    let mut acc = Point::ZERO;
    for i in 0..vertices.len() {
        let a = vertices[i] - origin;
        let b = vertices[(i + 1) % vertices.len()] - origin;
        acc += (a + b) * a.perp_dot(b);
    }
    Some(origin + acc / (6.0 * area))
}

/// Inclusive point-in-polygon test for a counter-clockwise convex polygon
pub fn convex_contains(vertices: &[Point], p: Point) -> bool {
    if vertices.len() < 3 {
        return false;
    }
    (0..vertices.len()).all(|i| {
        let a = vertices[i];
        let b = vertices[(i + 1) % vertices.len()];
        (b - a).perp_dot(p - a) >= 0.0
    })
}

/// Check that a polygon is convex and counter-clockwise (collinear runs allowed)
pub fn is_convex_ccw(vertices: &[Point]) -> bool {
    if vertices.len() < 3 || signed_area(vertices) <= 0.0 {
        return false;
    }
    let n = vertices.len();
    (0..n).all(|i| {
        let a = vertices[i];
        let b = vertices[(i + 1) % n];
        let c = vertices[(i + 2) % n];
        (b - a).perp_dot(c - b) >= -1e-9 * (b - a).length() * (c - b).length()
    })
}
