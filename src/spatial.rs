//! Spatial indexing for fast point-to-cell lookups
//!
//! This module is only available with the `spatial-index` feature.

use std::fmt;

use kiddo::immutable::float::kdtree::ImmutableKdTree;
use kiddo::SquaredEuclidean;

use crate::geometry::Point;

/// Wrapper around a KD-tree of site positions
///
/// The nearest site to a point is the owner of the Voronoi cell containing
/// it, so a nearest-neighbour query answers point location in O(log n).
///
/// # Performance
///
/// - Construction: O(n log n)
/// - Query: O(log n)
/// - Memory: ~24 bytes per site
#[derive(Clone)]
pub struct SpatialIndex {
    tree: ImmutableKdTree<f64, usize, 2, 32>,
    len: usize,
}

impl SpatialIndex {
    /// Build the index from site positions
    ///
    /// # Example
    ///
    /// ```
    /// use warped_voronoi::*;
    ///
    /// let sites = vec![Point::new(1.0, 0.0), Point::new(0.0, 1.0), Point::new(-1.0, 0.0)];
    /// let index = SpatialIndex::new(&sites);
    /// assert_eq!(index.find_nearest(Point::new(0.9, 0.1)), Some(0));
    /// ```
    pub fn new(positions: &[Point]) -> Self {
        let points: Vec<[f64; 2]> = positions.iter().map(|p| [p.x, p.y]).collect();

        Self {
            tree: ImmutableKdTree::new_from_slice(&points),
            len: points.len(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Index of the position nearest to `point`, `None` for an empty index
    pub fn find_nearest(&self, point: Point) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        let query = [point.x, point.y];
        let result = self.tree.nearest_one::<SquaredEuclidean>(&query);
        Some(result.item)
    }
}

impl fmt::Debug for SpatialIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpatialIndex").field("len", &self.len).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spatial_index_basic() {
        let sites = vec![
            Point::new(1.0, 0.0),
            Point::new(0.0, 1.0),
            Point::new(-1.0, 0.0),
            Point::new(0.0, -1.0),
        ];

        let index = SpatialIndex::new(&sites);
        assert_eq!(index.len(), 4);

        assert_eq!(index.find_nearest(Point::new(0.9, 0.1)), Some(0));
        assert_eq!(index.find_nearest(Point::new(0.0, 0.95)), Some(1));
        assert_eq!(index.find_nearest(Point::new(-0.8, 0.0)), Some(2));
        assert_eq!(index.find_nearest(Point::new(0.1, -3.0)), Some(3));
    }

    #[test]
    fn test_spatial_index_exact_match() {
        let sites = vec![Point::new(10.0, 0.0), Point::new(0.0, 10.0)];
        let index = SpatialIndex::new(&sites);

        assert_eq!(index.find_nearest(sites[0]), Some(0));
        assert_eq!(index.find_nearest(sites[1]), Some(1));
    }
}
