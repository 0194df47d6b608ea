//! Voronoi cell construction by half-plane intersection
//!
//! Each cell starts as the construction frame and is cut by the perpendicular
//! bisector between its site and every other site that can still reach it.
//! The cut edges are labelled with the site that produced them, which gives
//! the half-edge graph and the adjacency relation without a separate
//! triangulation.

use std::collections::HashMap;
use std::ops::Range;

use super::grid::ProximityGrid;
use super::neighbors::SiteGrid;
use crate::adjacency::{Adjacency, AdjacencyFact};
use crate::cell::{Cell, Site, SiteId};
use crate::config::{validate_positive, DiagramConfig};
use crate::error::{Result, WarpError};
use crate::geometry::{BoundingRegion, Point};

/// Merge tolerance for polygon corners, relative to the frame diagonal
const CORNER_TOLERANCE: f64 = 1e-12;

/// A directed boundary segment of one cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HalfEdge {
    /// Index of the owning cell
    pub cell: usize,
    pub origin: Point,
    pub target: Point,
    /// Index of the cell on the other side, `None` on the construction frame
    pub neighbor: Option<usize>,
    /// Index of the opposite half-edge in the neighbouring cell
    pub twin: Option<usize>,
}

/// Planar subdivision of the deduplicated sites
///
/// All collections are flat and indexed by position: `cells[i]` belongs to
/// `sites[i]`, and the half-edges of cell `i` are `edges_of(i)`, listed in
/// counter-clockwise order.
#[derive(Debug, Clone)]
pub struct VoronoiDiagram {
    sites: Vec<Site>,
    cells: Vec<Cell>,
    half_edges: Vec<HalfEdge>,
    edge_ranges: Vec<Range<usize>>,
    adjacency: Adjacency,
    frame: BoundingRegion,
    merged_count: usize,
}

impl VoronoiDiagram {
    /// Deduplicated sites in ascending id order
    #[inline]
    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    /// Frame-bounded cells, parallel to [`sites`](Self::sites)
    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    #[inline]
    pub fn half_edges(&self) -> &[HalfEdge] {
        &self.half_edges
    }

    /// Half-edges bounding one cell, counter-clockwise
    pub fn edges_of(&self, cell: usize) -> &[HalfEdge] {
        &self.half_edges[self.edge_ranges[cell].clone()]
    }

    /// Indices of the cells sharing an edge with `cell`
    pub fn neighbors(&self, cell: usize) -> Vec<usize> {
        let mut neighbors: Vec<usize> = self.edges_of(cell).iter().filter_map(|e| e.neighbor).collect();
        neighbors.sort_unstable();
        neighbors.dedup();
        neighbors
    }

    /// Shared segments between cells, keyed by site id
    #[inline]
    pub fn adjacency(&self) -> &Adjacency {
        &self.adjacency
    }

    /// Rectangle that unbounded rays were cut at
    #[inline]
    pub fn frame(&self) -> &BoundingRegion {
        &self.frame
    }

    /// Number of input sites dropped as duplicates
    #[inline]
    pub fn merged_count(&self) -> usize {
        self.merged_count
    }

    /// Position of a site id in [`sites`](Self::sites)
    pub fn cell_index(&self, id: SiteId) -> Option<usize> {
        self.sites.binary_search_by_key(&id, |s| s.id).ok()
    }
}

/// Builds [`VoronoiDiagram`]s
#[derive(Debug, Clone, Copy)]
pub struct VoronoiBuilder {
    epsilon: f64,
    frame_margin: f64,
}

impl Default for VoronoiBuilder {
    fn default() -> Self {
        Self {
            epsilon: 1e-9,
            frame_margin: 2.0,
        }
    }
}

/// Polygon corner tagged with the neighbour across the edge that starts at it
#[derive(Debug, Clone, Copy)]
struct Corner {
    point: Point,
    edge: Option<usize>,
}

impl VoronoiBuilder {
    /// `epsilon` is the duplicate-site tolerance; `frame_margin` is how many
    /// diagonals the frame extends past the region and the sites
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` unless both values are finite and positive.
    pub fn new(epsilon: f64, frame_margin: f64) -> Result<Self> {
        validate_positive("dedup epsilon", epsilon)?;
        validate_positive("frame margin", frame_margin)?;
        Ok(Self {
            epsilon,
            frame_margin,
        })
    }

    pub fn from_config(config: &DiagramConfig) -> Result<Self> {
        Self::new(config.dedup_epsilon, config.frame_margin)
    }

    /// Compute one cell per distinct site
    ///
    /// Sites are processed in id order. Sites within epsilon of an earlier
    /// site are merged into it and disappear from the output.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for non-finite positions, repeated ids or a
    /// frame too large to measure, and `DegenerateGeometry` when no site is
    /// given.
    pub fn build(&self, sites: &[Site], region: &BoundingRegion) -> Result<VoronoiDiagram> {
        let (sites, merged_count) = self.deduplicate(sites)?;
        if sites.is_empty() {
            return Err(WarpError::DegenerateGeometry(
                "no distinct sites to build a diagram from".into(),
            ));
        }

        let extent = region.enclosing(sites.iter().map(|s| s.position));
        let frame = extent.expanded(self.frame_margin * extent.diagonal());
        if !frame.diagonal().is_finite() {
            return Err(WarpError::InvalidInput(format!(
                "sites and region span an extent too large to frame ({:?}..{:?})",
                extent.min, extent.max
            )));
        }
        let tolerance = CORNER_TOLERANCE * frame.diagonal();

        let positions: Vec<Point> = sites.iter().map(|s| s.position).collect();
        let grid = SiteGrid::new(&positions);

        let mut cells = Vec::with_capacity(sites.len());
        let mut half_edges = Vec::new();
        let mut edge_ranges = Vec::with_capacity(sites.len());

        for index in 0..sites.len() {
            let corners = build_cell(index, &grid, &positions, &frame, tolerance);
            let start = half_edges.len();
            for k in 0..corners.len() {
                half_edges.push(HalfEdge {
                    cell: index,
                    origin: corners[k].point,
                    target: corners[(k + 1) % corners.len()].point,
                    neighbor: corners[k].edge,
                    twin: None,
                });
            }
            edge_ranges.push(start..half_edges.len());

            let bounded = corners.iter().all(|c| c.edge.is_some());
            let vertices = corners.into_iter().map(|c| c.point).collect();
            cells.push(Cell::new(sites[index].id, vertices, bounded));
        }

        link_twins(&mut half_edges);

        let mut adjacency = Adjacency::new();
        for edge in &half_edges {
            if let Some(neighbor) = edge.neighbor {
                adjacency.insert(AdjacencyFact::new(
                    sites[edge.cell].id,
                    sites[neighbor].id,
                    (edge.origin, edge.target),
                ));
            }
        }

        log::trace!(
            "Built {} cells, {} half-edges, {} adjacencies",
            cells.len(),
            half_edges.len(),
            adjacency.len()
        );

        Ok(VoronoiDiagram {
            sites,
            cells,
            half_edges,
            edge_ranges,
            adjacency,
            frame,
            merged_count,
        })
    }

    /// Sort by id and drop sites within epsilon of an earlier one
    fn deduplicate(&self, sites: &[Site]) -> Result<(Vec<Site>, usize)> {
        if let Some(site) = sites.iter().find(|s| !s.position.is_finite()) {
            return Err(WarpError::InvalidInput(format!(
                "site {} has a non-finite position ({:?})",
                site.id, site.position
            )));
        }

        let mut sorted = sites.to_vec();
        sorted.sort_by_key(|s| s.id);
        if let Some(pair) = sorted.windows(2).find(|w| w[0].id == w[1].id) {
            return Err(WarpError::InvalidInput(format!(
                "site id {} is used more than once",
                pair[0].id
            )));
        }

        let mut grid = ProximityGrid::new(self.epsilon);
        let mut kept: Vec<Site> = Vec::with_capacity(sorted.len());
        for site in sorted {
            if let Some(existing) = grid.find_within(site.position) {
                log::debug!(
                    "Merged site {} into {} (closer than {})",
                    site.id,
                    kept[existing].id,
                    self.epsilon
                );
                continue;
            }
            grid.insert(site.position);
            kept.push(site);
        }

        let merged = sites.len() - kept.len();
        if merged > 0 {
            log::warn!("{} duplicate sites merged", merged);
        }
        Ok((kept, merged))
    }
}

/// Intersect the frame with every bisector half-plane that reaches the cell
///
/// Neighbours come from the grid nearest first, so the walk ends as soon as
/// the next one is out of reach.
fn build_cell(
    index: usize,
    grid: &SiteGrid<'_>,
    positions: &[Point],
    frame: &BoundingRegion,
    tolerance: f64,
) -> Vec<Corner> {
    let site = positions[index];

    let mut corners: Vec<Corner> = frame
        .corners()
        .iter()
        .map(|&point| Corner { point, edge: None })
        .collect();
    let mut radius_sq = max_distance_sq(&corners, site);
    let tolerance_sq = tolerance * tolerance;

    for (distance_sq, j) in grid.nearest_to(index) {
        // A site farther than twice the cell radius cannot cut the cell
        if distance_sq > 4.0 * radius_sq {
            break;
        }
        corners = clip_by_bisector(&corners, site, positions[j], j);
        corners = merge_close(corners, tolerance_sq);
        radius_sq = max_distance_sq(&corners, site);
    }

    corners
}

fn max_distance_sq(corners: &[Corner], site: Point) -> f64 {
    corners
        .iter()
        .map(|c| c.point.distance_squared(site))
        .fold(0.0, f64::max)
}

/// Keep the part of the polygon on the `site` side of the bisector with `other`
///
/// Points on the bisector count as inside.
fn clip_by_bisector(corners: &[Corner], site: Point, other: Point, neighbor: usize) -> Vec<Corner> {
    let mid = (site + other) * 0.5;
    let normal = other - site;
    let side = |p: Point| (p - mid).dot(normal);

    let n = corners.len();
    let mut out = Vec::with_capacity(n + 1);
    for i in 0..n {
        let a = corners[i];
        let b = corners[(i + 1) % n];
        let da = side(a.point);
        let db = side(b.point);

        if da <= 0.0 {
            out.push(a);
            if db > 0.0 {
                out.push(Corner {
                    point: intersect(a.point, b.point, da, db),
                    edge: Some(neighbor),
                });
            }
        } else if db <= 0.0 {
            out.push(Corner {
                point: intersect(a.point, b.point, da, db),
                edge: a.edge,
            });
        }
    }
    out
}

#[inline]
fn intersect(a: Point, b: Point, da: f64, db: f64) -> Point {
    let t = da / (da - db);
    if t <= 0.0 {
        a
    } else if t >= 1.0 {
        b
    } else {
        a + (b - a) * t
    }
}

/// Collapse corners closer than the tolerance
///
/// The earlier position is kept and the later edge label wins, which drops
/// the zero-length edge between them.
fn merge_close(corners: Vec<Corner>, tolerance_sq: f64) -> Vec<Corner> {
    let mut out: Vec<Corner> = Vec::with_capacity(corners.len());
    for corner in corners {
        match out.last_mut() {
            Some(last) if last.point.distance_squared(corner.point) <= tolerance_sq => {
                last.edge = corner.edge;
            }
            _ => out.push(corner),
        }
    }
    while out.len() > 1 && out[out.len() - 1].point.distance_squared(out[0].point) <= tolerance_sq {
        out.pop();
    }
    out
}

fn link_twins(half_edges: &mut [HalfEdge]) {
    let by_pair: HashMap<(usize, usize), usize> = half_edges
        .iter()
        .enumerate()
        .filter_map(|(i, e)| e.neighbor.map(|n| ((e.cell, n), i)))
        .collect();

    for edge in half_edges.iter_mut() {
        edge.twin = edge
            .neighbor
            .and_then(|n| by_pair.get(&(n, edge.cell)).copied());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Seed;
    use crate::generation::clip::RegionClipper;
    use crate::generation::sampler::generate_sites;
    use crate::geometry::is_convex_ccw;
    use approx::assert_abs_diff_eq;

    fn region() -> BoundingRegion {
        BoundingRegion::new(0.0, 0.0, 10.0, 10.0).unwrap()
    }

    fn sites(points: &[(f64, f64)]) -> Vec<Site> {
        points
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| Site::new(i as u32, Point::new(x, y)))
            .collect()
    }

    #[test]
    fn test_single_site_is_whole_frame() {
        let diagram = VoronoiBuilder::default()
            .build(&sites(&[(3.0, 4.0)]), &region())
            .unwrap();

        assert_eq!(diagram.cells().len(), 1);
        let cell = &diagram.cells()[0];
        assert!(!cell.bounded);
        assert_eq!(cell.vertices, diagram.frame().corners().to_vec());
        assert!(diagram.half_edges().iter().all(|e| e.neighbor.is_none()));
        assert!(diagram.adjacency().is_empty());
    }

    #[test]
    fn test_two_sites_split_by_bisector() {
        let diagram = VoronoiBuilder::default()
            .build(&sites(&[(0.0, 0.0), (10.0, 0.0)]), &region())
            .unwrap();

        let left = &diagram.cells()[0];
        let right = &diagram.cells()[1];
        assert!(!left.bounded && !right.bounded);
        assert!(left.vertices.iter().all(|v| v.x <= 5.0 + 1e-9));
        assert!(right.vertices.iter().all(|v| v.x >= 5.0 - 1e-9));

        let fact = diagram.adjacency().get(SiteId(0), SiteId(1)).unwrap();
        assert_abs_diff_eq!(fact.segment.0.x, 5.0, epsilon = 1e-9);
        assert_abs_diff_eq!(fact.segment.1.x, 5.0, epsilon = 1e-9);
        assert_eq!(diagram.neighbors(0), vec![1]);
    }

    #[test]
    fn test_collinear_sites() {
        let points: Vec<(f64, f64)> = (0..5).map(|i| (1.0 + 2.0 * i as f64, 5.0)).collect();
        let diagram = VoronoiBuilder::default().build(&sites(&points), &region()).unwrap();

        assert_eq!(diagram.cells().len(), 5);
        for cell in diagram.cells() {
            assert!(is_convex_ccw(&cell.vertices));
            assert!(!cell.bounded);
        }
        // Only consecutive sites touch
        assert_eq!(diagram.adjacency().len(), 4);
        for i in 0..4u32 {
            assert!(diagram.adjacency().contains(SiteId(i), SiteId(i + 1)));
        }
    }

    #[test]
    fn test_cocircular_sites_meet_in_one_vertex() {
        let diagram = VoronoiBuilder::default()
            .build(&sites(&[(2.0, 2.0), (8.0, 2.0), (2.0, 8.0), (8.0, 8.0)]), &region())
            .unwrap();

        let center = Point::new(5.0, 5.0);
        for cell in diagram.cells() {
            assert!(cell.vertices.iter().any(|v| v.distance(center) < 1e-9));
        }
        assert!(diagram.adjacency().contains(SiteId(0), SiteId(1)));
        assert!(diagram.adjacency().contains(SiteId(0), SiteId(2)));
        assert!(diagram.adjacency().contains(SiteId(1), SiteId(3)));
        assert!(diagram.adjacency().contains(SiteId(2), SiteId(3)));
    }

    #[test]
    fn test_duplicates_are_merged() {
        let input = sites(&[(1.0, 1.0), (1.0, 1.0 + 1e-12), (5.0, 5.0), (5.0, 5.0)]);
        let diagram = VoronoiBuilder::default().build(&input, &region()).unwrap();

        assert_eq!(diagram.merged_count(), 2);
        let ids: Vec<SiteId> = diagram.sites().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![SiteId(0), SiteId(2)]);
        assert_eq!(diagram.cell_index(SiteId(2)), Some(1));
        assert_eq!(diagram.cell_index(SiteId(1)), None);
    }

    #[test]
    fn test_sites_are_processed_in_id_order() {
        let input = vec![
            Site::new(5, Point::new(2.0, 2.0)),
            Site::new(1, Point::new(2.0, 2.0)),
        ];
        let diagram = VoronoiBuilder::default().build(&input, &region()).unwrap();
        assert_eq!(diagram.sites()[0].id, SiteId(1));
        assert_eq!(diagram.cells()[0].site, SiteId(1));
    }

    #[test]
    fn test_invalid_sites() {
        let builder = VoronoiBuilder::default();
        assert!(matches!(
            builder.build(&[], &region()),
            Err(WarpError::DegenerateGeometry(_))
        ));

        let nan = vec![Site::new(0, Point::new(f64::NAN, 0.0))];
        assert!(matches!(builder.build(&nan, &region()), Err(WarpError::InvalidInput(_))));

        let repeated = vec![Site::new(0, Point::ZERO), Site::new(0, Point::ONE)];
        assert!(matches!(
            builder.build(&repeated, &region()),
            Err(WarpError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_cells_are_convex_and_twins_match() {
        let input = generate_sites(80, &region(), Seed(42), 1e-9).unwrap();
        let diagram = VoronoiBuilder::default().build(&input, &region()).unwrap();

        for cell in diagram.cells() {
            assert!(is_convex_ccw(&cell.vertices), "cell {} is not convex", cell.site);
        }

        for (i, edge) in diagram.half_edges().iter().enumerate() {
            let Some(twin) = edge.twin else {
                continue;
            };
            let other = &diagram.half_edges()[twin];
            assert_eq!(other.twin, Some(i));
            assert_eq!(other.cell, edge.neighbor.unwrap());
            assert_abs_diff_eq!(other.origin.distance(edge.target), 0.0, epsilon = 1e-9);
        }

        // Interior cells are bounded
        let bounded = diagram.cells().iter().filter(|c| c.bounded).count();
        assert!(bounded > 0);
    }

    #[test]
    fn test_nearest_site_owns_point() {
        let input = generate_sites(40, &region(), Seed(7), 1e-9).unwrap();
        let diagram = VoronoiBuilder::default().build(&input, &region()).unwrap();

        for k in 0..100 {
            let p = Point::new((k as f64 * 0.731) % 10.0, (k as f64 * 0.377) % 10.0);
            let nearest = (0..input.len())
                .min_by(|&a, &b| {
                    input[a]
                        .position
                        .distance_squared(p)
                        .total_cmp(&input[b].position.distance_squared(p))
                })
                .unwrap();
            let cell = &diagram.cells()[nearest];
            assert!(cell.contains(p) || cell.vertices.iter().any(|v| v.distance(p) < 1e-9));
        }
    }

    #[test]
    fn test_builder_parameters_are_validated() {
        assert!(VoronoiBuilder::new(1e-9, 2.0).is_ok());
        assert!(VoronoiBuilder::new(0.0, 2.0).is_err());
        assert!(VoronoiBuilder::new(-1e-9, 2.0).is_err());
        assert!(VoronoiBuilder::new(f64::NAN, 2.0).is_err());
        assert!(VoronoiBuilder::new(1e-9, 0.0).is_err());
        assert!(VoronoiBuilder::new(1e-9, -1.0).is_err());
        assert!(VoronoiBuilder::new(1e-9, f64::INFINITY).is_err());
    }

    #[test]
    fn test_exact_duplicates_through_custom_builder() {
        let builder = VoronoiBuilder::new(1e-6, 1.0).unwrap();
        let input = sites(&[(5.0, 5.0), (5.0, 5.0), (1.0, 1.0)]);
        let diagram = builder.build(&input, &region()).unwrap();

        assert_eq!(diagram.cells().len(), 2);
        assert_eq!(diagram.merged_count(), 1);

        let clipper = RegionClipper::new(region());
        let area: f64 = diagram.cells().iter().map(|c| clipper.clip(c).area()).sum();
        assert_abs_diff_eq!(area, 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_unframeable_extent_is_rejected() {
        let input = sites(&[(5.0, 5.0), (1e308, 5.0), (-1e308, 5.0)]);
        assert!(matches!(
            VoronoiBuilder::default().build(&input, &region()),
            Err(WarpError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_many_sites_tile_the_frame() {
        let input = generate_sites(2000, &region(), Seed(11), 1e-9).unwrap();
        let diagram = VoronoiBuilder::default().build(&input, &region()).unwrap();

        let frame_area = diagram.frame().area();
        let area: f64 = diagram.cells().iter().map(Cell::area).sum();
        assert_abs_diff_eq!(area, frame_area, epsilon = frame_area * 1e-9);

        let clipper = RegionClipper::new(region());
        let clipped: f64 = diagram.cells().iter().map(|c| clipper.clip(c).area()).sum();
        assert_abs_diff_eq!(clipped, 100.0, epsilon = 1e-7);

        // Interior cells of an even layout have few neighbours
        let max_degree = (0..diagram.cells().len())
            .map(|i| diagram.neighbors(i).len())
            .max()
            .unwrap();
        assert!(max_degree < 20);
    }

    #[test]
    fn test_sites_outside_region_widen_frame() {
        let diagram = VoronoiBuilder::default()
            .build(&sites(&[(5.0, 5.0), (50.0, 5.0)]), &region())
            .unwrap();
        assert!(diagram.frame().contains(Point::new(50.0, 5.0)));
        assert!(diagram.frame().max.x > 50.0);
    }
}
