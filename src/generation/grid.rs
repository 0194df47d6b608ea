//! Uniform hash grid for "is there already a point within ε" queries
//!
//! Shared by site sampling, site deduplication and vertex welding.

use std::collections::HashMap;

use crate::geometry::Point;

type CellKey = (i64, i64);

/// Points bucketed by a square grid whose cell size equals the query radius
///
/// A point within `radius` of a query always lies in the 3x3 block of grid
/// cells around the query, so lookups touch at most nine buckets.
#[derive(Debug)]
pub(crate) struct ProximityGrid {
    radius: f64,
    points: Vec<Point>,
    buckets: HashMap<CellKey, Vec<usize>>,
}

impl ProximityGrid {
    /// `radius` must be positive and finite
    pub fn new(radius: f64) -> Self {
        Self {
            radius,
            points: Vec::new(),
            buckets: HashMap::new(),
        }
    }

    #[inline]
    fn key(&self, p: Point) -> CellKey {
        // Float-to-int casts saturate, so far-away points share edge buckets
        ((p.x / self.radius).floor() as i64, (p.y / self.radius).floor() as i64)
    }

    /// Index of the first inserted point strictly closer than the radius
    pub fn find_within(&self, p: Point) -> Option<usize> {
        let (kx, ky) = self.key(p);
        let radius_sq = self.radius * self.radius;
        let mut best: Option<usize> = None;

        for dx in -1..=1i64 {
            for dy in -1..=1i64 {
                let key = (kx.wrapping_add(dx), ky.wrapping_add(dy));
                let Some(bucket) = self.buckets.get(&key) else {
                    continue;
                };
                for &index in bucket {
                    if self.points[index].distance_squared(p) < radius_sq
                        && best.map_or(true, |b| index < b)
                    {
                        best = Some(index);
                    }
                }
            }
        }
        best
    }

    /// Store a point and return its index
    pub fn insert(&mut self, p: Point) -> usize {
        let index = self.points.len();
        self.points.push(p);
        let key = self.key(p);
        self.buckets.entry(key).or_default().push(index);
        index
    }

    #[inline]
    pub fn point(&self, index: usize) -> Point {
        self.points[index]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }
}
