//! Clipping cells to the bounding region
//!
//! Polygons go through Sutherland-Hodgman against the four sides of the
//! region in turn; adjacency segments go through Liang-Barsky.

use crate::cell::Cell;
use crate::geometry::{self, BoundingRegion, Point};

/// Merge tolerance for clipped vertices, relative to the region diagonal
const VERTEX_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
    Bottom,
    Top,
}

const SIDES: [Side; 4] = [Side::Left, Side::Right, Side::Bottom, Side::Top];

/// Intersects cells with an axis-aligned region
#[derive(Debug, Clone, Copy)]
pub struct RegionClipper {
    region: BoundingRegion,
    tolerance: f64,
}

impl RegionClipper {
    pub fn new(region: BoundingRegion) -> Self {
        Self {
            region,
            tolerance: VERTEX_TOLERANCE * region.diagonal(),
        }
    }

    #[inline]
    pub fn region(&self) -> &BoundingRegion {
        &self.region
    }

    /// Clip one cell, keeping its site
    ///
    /// The result is always bounded. Vertex ids are dropped since the vertex
    /// list changes.
    pub fn clip(&self, cell: &Cell) -> Cell {
        let vertices = self.clip_polygon(&cell.vertices);
        if vertices.is_empty() {
            Cell::empty(cell.site)
        } else {
            Cell::new(cell.site, vertices, true)
        }
    }

    /// Clip a convex counter-clockwise polygon
    ///
    /// Returns an empty list when the intersection has no area.
    pub fn clip_polygon(&self, vertices: &[Point]) -> Vec<Point> {
        let mut polygon = vertices.to_vec();
        for side in SIDES {
            if polygon.is_empty() {
                break;
            }
            polygon = self.clip_side(&polygon, side);
        }

        let polygon = self.merge_close(polygon);
        if polygon.len() < 3 || geometry::signed_area(&polygon) <= 0.0 {
            return Vec::new();
        }
        polygon
    }

    /// Clip a segment, returning `None` if it misses the region
    pub fn clip_segment(&self, start: Point, end: Point) -> Option<(Point, Point)> {
        let delta = end - start;
        let mut t0: f64 = 0.0;
        let mut t1: f64 = 1.0;

        let checks = [
            (-delta.x, start.x - self.region.min.x),
            (delta.x, self.region.max.x - start.x),
            (-delta.y, start.y - self.region.min.y),
            (delta.y, self.region.max.y - start.y),
        ];

        for (p, q) in checks {
            if p == 0.0 {
                if q < 0.0 {
                    return None;
                }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                t0 = t0.max(r);
            } else {
                if r < t0 {
                    return None;
                }
                t1 = t1.min(r);
            }
        }

        let clipped_start = if t0 > 0.0 { start + delta * t0 } else { start };
        let clipped_end = if t1 < 1.0 { start + delta * t1 } else { end };
        Some((clipped_start, clipped_end))
    }

    #[inline]
    fn inside(&self, p: Point, side: Side) -> bool {
        match side {
            Side::Left => p.x >= self.region.min.x,
            Side::Right => p.x <= self.region.max.x,
            Side::Bottom => p.y >= self.region.min.y,
            Side::Top => p.y <= self.region.max.y,
        }
    }

    /// Point where `a -> b` crosses a side, snapped onto the side's line
    fn crossing(&self, a: Point, b: Point, side: Side) -> Point {
        match side {
            Side::Left | Side::Right => {
                let x = if side == Side::Left {
                    self.region.min.x
                } else {
                    self.region.max.x
                };
                let t = (x - a.x) / (b.x - a.x);
                Point::new(x, a.y + (b.y - a.y) * t)
            }
            Side::Bottom | Side::Top => {
                let y = if side == Side::Bottom {
                    self.region.min.y
                } else {
                    self.region.max.y
                };
                let t = (y - a.y) / (b.y - a.y);
                Point::new(a.x + (b.x - a.x) * t, y)
            }
        }
    }

    fn clip_side(&self, polygon: &[Point], side: Side) -> Vec<Point> {
        let n = polygon.len();
        let mut out = Vec::with_capacity(n + 1);
        for i in 0..n {
            let current = polygon[i];
            let previous = polygon[(i + n - 1) % n];
            let current_in = self.inside(current, side);
            let previous_in = self.inside(previous, side);

            if current_in {
                if !previous_in {
                    out.push(self.crossing(previous, current, side));
                }
                out.push(current);
            } else if previous_in {
                out.push(self.crossing(previous, current, side));
            }
        }
        out
    }

    fn merge_close(&self, polygon: Vec<Point>) -> Vec<Point> {
        let tolerance_sq = self.tolerance * self.tolerance;
        let mut out: Vec<Point> = Vec::with_capacity(polygon.len());
        for p in polygon {
            if out.last().map_or(true, |last| last.distance_squared(p) > tolerance_sq) {
                out.push(p);
            }
        }
        while out.len() > 1 && out[out.len() - 1].distance_squared(out[0]) <= tolerance_sq {
            out.pop();
        }
        out
    }
}
