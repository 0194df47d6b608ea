//! Nearest-site iteration over a uniform bucket grid
//!
//! Buckets are scanned in square rings around the query. After ring `k` every
//! unseen site lies at least `k` bucket widths away, so candidates closer than
//! that are final and can be handed out in distance order. Cell construction
//! stops pulling neighbours long before the grid is exhausted for interior
//! cells, which keeps the build close to linear for evenly spread sites.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::geometry::Point;

/// f64 ordered with `total_cmp`
#[derive(Debug, Clone, Copy, PartialEq)]
struct OrdF64(f64);

impl Eq for OrdF64 {}

impl PartialOrd for OrdF64 {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrdF64 {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Site positions bucketed in a row-major grid of square cells
///
/// The bucket width is chosen so that there are about as many buckets as
/// sites, and never more than `3n + 1`.
#[derive(Debug)]
pub(crate) struct SiteGrid<'a> {
    positions: &'a [Point],
    origin: Point,
    bucket_size: f64,
    cols: usize,
    rows: usize,
    /// Bucket `b` holds `items[starts[b]..starts[b + 1]]`
    starts: Vec<usize>,
    items: Vec<usize>,
}

impl<'a> SiteGrid<'a> {
    /// Positions must be finite
    pub fn new(positions: &'a [Point]) -> Self {
        let n = positions.len().max(1);
        let (min, max) = positions.iter().fold(
            (Point::splat(f64::INFINITY), Point::splat(f64::NEG_INFINITY)),
            |(lo, hi), &p| (lo.min(p), hi.max(p)),
        );
        let origin = if positions.is_empty() { Point::ZERO } else { min };
        let extent = (max - origin).max(Point::ZERO);

        let by_area = (extent.x * extent.y / n as f64).sqrt();
        let by_side = extent.max_element() / n as f64;
        let mut bucket_size = by_area.max(by_side);
        if !(bucket_size.is_finite() && bucket_size > 0.0) {
            bucket_size = 1.0;
        }

        let cols = (extent.x / bucket_size).floor() as usize + 1;
        let rows = (extent.y / bucket_size).floor() as usize + 1;

        let mut grid = Self {
            positions,
            origin,
            bucket_size,
            cols,
            rows,
            starts: vec![0; cols * rows + 1],
            items: vec![0; positions.len()],
        };

        // Counting sort into buckets
        let buckets: Vec<usize> = positions.iter().map(|&p| grid.bucket_of(p)).collect();
        for &b in &buckets {
            grid.starts[b + 1] += 1;
        }
        for b in 0..cols * rows {
            grid.starts[b + 1] += grid.starts[b];
        }
        let mut fill = grid.starts.clone();
        for (index, &b) in buckets.iter().enumerate() {
            grid.items[fill[b]] = index;
            fill[b] += 1;
        }

        grid
    }

    #[inline]
    fn coords_of(&self, p: Point) -> (usize, usize) {
        // Float-to-int casts saturate, negatives land in column 0
        let cx = ((p.x - self.origin.x) / self.bucket_size).floor() as usize;
        let cy = ((p.y - self.origin.y) / self.bucket_size).floor() as usize;
        (cx.min(self.cols - 1), cy.min(self.rows - 1))
    }

    #[inline]
    fn bucket_of(&self, p: Point) -> usize {
        let (cx, cy) = self.coords_of(p);
        cy * self.cols + cx
    }

    #[inline]
    fn bucket(&self, cx: usize, cy: usize) -> &[usize] {
        let b = cy * self.cols + cx;
        &self.items[self.starts[b]..self.starts[b + 1]]
    }

    /// Every other site ordered by `(distance², index)`
    pub fn nearest_to(&self, index: usize) -> NearestSites<'_, 'a> {
        let query = self.positions[index];
        NearestSites {
            grid: self,
            query,
            skip: index,
            center: self.coords_of(query),
            ring: 0,
            pending: BinaryHeap::new(),
        }
    }
}

/// Resumable nearest-neighbour walk produced by [`SiteGrid::nearest_to`]
///
/// Yields `(distance², site index)`.
#[derive(Debug)]
pub(crate) struct NearestSites<'g, 'a> {
    grid: &'g SiteGrid<'a>,
    query: Point,
    skip: usize,
    center: (usize, usize),
    /// Next ring to scan
    ring: usize,
    pending: BinaryHeap<Reverse<(OrdF64, usize)>>,
}

impl NearestSites<'_, '_> {
    #[inline]
    fn exhausted(&self) -> bool {
        self.ring >= self.grid.cols.max(self.grid.rows)
    }

    /// Squared distance below which no unscanned site can lie
    #[inline]
    fn settled_sq(&self) -> f64 {
        let settled = self.ring.saturating_sub(1) as f64 * self.grid.bucket_size;
        settled * settled
    }

    fn scan_ring(&mut self) {
        let k = self.ring as isize;
        let (cx, cy) = (self.center.0 as isize, self.center.1 as isize);
        let (cols, rows) = (self.grid.cols as isize, self.grid.rows as isize);

        for y in (cy - k).max(0)..=(cy + k).min(rows - 1) {
            let on_edge = y == cy - k || y == cy + k;
            let step = if on_edge || k == 0 { 1 } else { 2 * k };
            let mut x = cx - k;
            while x <= cx + k {
                if (0..cols).contains(&x) {
                    for &j in self.grid.bucket(x as usize, y as usize) {
                        if j != self.skip {
                            let d = self.grid.positions[j].distance_squared(self.query);
                            self.pending.push(Reverse((OrdF64(d), j)));
                        }
                    }
                }
                x += step;
            }
        }
        self.ring += 1;
    }
}

impl Iterator for NearestSites<'_, '_> {
    type Item = (f64, usize);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(&Reverse((OrdF64(d), j))) = self.pending.peek() {
                // Strict bound keeps ties on the boundary in index order
                if self.exhausted() || d < self.settled_sq() {
                    self.pending.pop();
                    return Some((d, j));
                }
            } else if self.exhausted() {
                return None;
            }
            self.scan_ring();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn brute_force(positions: &[Point], index: usize) -> Vec<(f64, usize)> {
        let mut order: Vec<(f64, usize)> = positions
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != index)
            .map(|(j, p)| (p.distance_squared(positions[index]), j))
            .collect();
        order.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        order
    }

    #[test]
    fn test_matches_sorted_order() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let positions: Vec<Point> = (0..300)
            .map(|_| Point::new(rng.gen_range(0.0..10.0), rng.gen_range(0.0..4.0)))
            .collect();
        let grid = SiteGrid::new(&positions);

        for index in [0, 17, 150, 299] {
            let walked: Vec<(f64, usize)> = grid.nearest_to(index).collect();
            assert_eq!(walked, brute_force(&positions, index));
        }
    }

    #[test]
    fn test_collinear_and_tied_sites() {
        // Equal distances on both sides of each site
        let positions: Vec<Point> = (0..9).map(|i| Point::new(i as f64, 2.0)).collect();
        let grid = SiteGrid::new(&positions);
        assert_eq!(grid.rows, 1);

        for index in 0..positions.len() {
            let walked: Vec<(f64, usize)> = grid.nearest_to(index).collect();
            assert_eq!(walked, brute_force(&positions, index));
        }
    }

    #[test]
    fn test_bucket_count_stays_linear() {
        // Very thin extent
        let positions: Vec<Point> = (0..50)
            .map(|i| Point::new(i as f64 * 1e6, (i % 2) as f64 * 1e-6))
            .collect();
        let grid = SiteGrid::new(&positions);
        assert!(grid.cols * grid.rows <= 3 * positions.len() + 1);
        assert_eq!(grid.nearest_to(0).next(), Some((1e12 + 1e-12, 1)));
    }

    #[test]
    fn test_single_site_has_no_neighbours() {
        let positions = [Point::new(4.0, 4.0)];
        let grid = SiteGrid::new(&positions);
        assert_eq!(grid.nearest_to(0).next(), None);
    }

    #[test]
    fn test_walk_can_stop_early() {
        let positions: Vec<Point> = (0..400)
            .map(|i| Point::new((i % 20) as f64, (i / 20) as f64))
            .collect();
        let grid = SiteGrid::new(&positions);

        let mut walk = grid.nearest_to(210);
        let first: Vec<usize> = walk.by_ref().take(4).map(|(_, j)| j).collect();
        assert_eq!(first, vec![190, 209, 211, 230]);
        // Only a few rings were needed for the closest four
        assert!(walk.ring < 5);
    }
}
