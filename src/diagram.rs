//! WarpedDiagram main structure

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::adjacency::{Adjacency, AdjacencyFact};
use crate::cell::{Cell, Site, SiteId};
use crate::config::DiagramConfig;
use crate::error::Result;
use crate::generation::{
    sites_from_config, weld_vertices, RegionClipper, VertexWarper, VoronoiBuilder,
};
use crate::geometry::Point;
use crate::noise::{noise_from_config, NoiseField};
use crate::util::Timed;

#[cfg(feature = "spatial-index")]
use crate::spatial::SpatialIndex;

/// Adjacency segments shorter than this (relative to the region diagonal)
/// after clipping are corner contacts, not shared edges
const ADJACENCY_TOLERANCE: f64 = 1e-12;

/// A clipped, noise-warped Voronoi tiling of a rectangle
///
/// All per-cell collections are ordered by ascending site id. Cells whose
/// Voronoi region misses the bounding rectangle are kept as empty polygons
/// so that indices stay aligned with [`sites`](Self::sites).
///
/// # Examples
///
/// ```
/// use warped_voronoi::*;
///
/// let config = DiagramConfigBuilder::new()
///     .sites(30)
///     .unwrap()
///     .seed(42u64)
///     .build()
///     .unwrap();
///
/// let diagram = WarpedDiagram::generate(config).unwrap();
/// println!("Generated {} cells", diagram.cell_count());
///
/// if let Some(cell) = diagram.get_cell(SiteId(0)) {
///     println!("Cell #0 has {} vertices", cell.vertex_count());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct WarpedDiagram {
    /// Configuration used to generate this diagram
    config: DiagramConfig,

    /// Deduplicated sites in ascending id order
    sites: Vec<Site>,

    /// Cells clipped to the region, before warping
    clipped: Vec<Cell>,

    /// Warped cells
    warped: Vec<Cell>,

    /// Shared segments of the clipped tiling
    adjacency: Adjacency,

    /// Number of distinct welded vertices
    vertex_count: usize,

    /// Input sites dropped as duplicates
    merged_count: usize,

    /// Spatial index for fast point-to-cell lookups (optional, requires spatial-index feature)
    #[cfg(feature = "spatial-index")]
    spatial_index: SpatialIndex,
}

impl WarpedDiagram {
    /// Generate a diagram warped by the noise field described in the config
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an invalid configuration or unsatisfiable
    /// sampling, and `DegenerateGeometry` if no distinct site remains.
    pub fn generate(config: DiagramConfig) -> Result<Self> {
        let noise = noise_from_config(&config.noise, config.noise_seed);
        Self::generate_with_noise(config, &noise)
    }

    /// Generate a diagram warped by a caller-supplied noise field
    ///
    /// The config's noise settings and noise seed are ignored; frequency and
    /// amplitude still apply.
    ///
    /// # Example
    ///
    /// ```
    /// use warped_voronoi::*;
    ///
    /// let config = DiagramConfig::default();
    /// let noise = ValueNoise::new(7);
    /// let diagram = WarpedDiagram::generate_with_noise(config, &noise).unwrap();
    /// assert_eq!(diagram.cell_count(), 20);
    /// ```
    pub fn generate_with_noise<N>(config: DiagramConfig, noise: &N) -> Result<Self>
    where
        N: NoiseField + ?Sized,
    {
        config.validate()?;
        let _timer = Timed::debug("Warped diagram");
        let region = config.region;

        let sites = sites_from_config(&config)?;

        let diagram = {
            let _t = Timed::debug("Voronoi construction");
            VoronoiBuilder::from_config(&config)?.build(&sites, &region)?
        };

        let clipper = RegionClipper::new(region);
        let clipped: Vec<Cell> = {
            let _t = Timed::debug("Clipping");
            clip_cells(&clipper, diagram.cells())
        };

        let (clipped, vertex_count) = {
            let _t = Timed::debug("Welding");
            weld_vertices(&clipped, &region)
        };

        let warper = VertexWarper::new(config.frequency, config.amplitude);
        let mut warped = {
            let _t = Timed::debug("Warping");
            warp_cells(&warper, &clipped, noise)
        };

        if config.reclip_after_warp && config.amplitude > 0.0 {
            let _t = Timed::debug("Re-clipping");
            let reclipped = clip_cells(&clipper, &warped);
            warped = weld_vertices(&reclipped, &region).0;
        }

        let min_length = ADJACENCY_TOLERANCE * region.diagonal();
        let adjacency = diagram.adjacency().filter_map(|fact| {
            let segment = clipper.clip_segment(fact.segment.0, fact.segment.1)?;
            if (segment.1 - segment.0).length() <= min_length {
                return None;
            }
            Some(AdjacencyFact { segment, ..*fact })
        });

        // Build spatial index (requires spatial-index feature)
        #[cfg(feature = "spatial-index")]
        let spatial_index = {
            let positions: Vec<Point> = diagram.sites().iter().map(|s| s.position).collect();
            SpatialIndex::new(&positions)
        };

        log::debug!(
            "Diagram: {} cells ({} empty), {} vertices, {} adjacencies, {} merged",
            clipped.len(),
            clipped.iter().filter(|c| c.is_empty()).count(),
            vertex_count,
            adjacency.len(),
            diagram.merged_count()
        );

        Ok(Self {
            config,
            sites: diagram.sites().to_vec(),
            clipped,
            warped,
            adjacency,
            vertex_count,
            merged_count: diagram.merged_count(),
            #[cfg(feature = "spatial-index")]
            spatial_index,
        })
    }

    /// Get the configuration used to generate this diagram
    #[inline]
    pub fn config(&self) -> &DiagramConfig {
        &self.config
    }

    /// Number of cells (one per distinct site, including empty ones)
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.warped.len()
    }

    /// Distinct sites, ascending by id
    #[inline]
    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    /// Warped cells, ascending by site id
    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.warped
    }

    /// Cells clipped to the region, before warping
    #[inline]
    pub fn clipped_cells(&self) -> &[Cell] {
        &self.clipped
    }

    /// Shared segments of the clipped (pre-warp) tiling
    #[inline]
    pub fn adjacency(&self) -> &Adjacency {
        &self.adjacency
    }

    /// Number of distinct welded vertices
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Number of input sites merged into an earlier one
    #[inline]
    pub fn merged_count(&self) -> usize {
        self.merged_count
    }

    fn index_of(&self, id: SiteId) -> Option<usize> {
        self.sites.binary_search_by_key(&id, |s| s.id).ok()
    }

    /// Get a warped cell by site id
    ///
    /// Returns `None` if the id was never generated or was merged away.
    pub fn get_cell(&self, id: SiteId) -> Option<&Cell> {
        self.index_of(id).map(|i| &self.warped[i])
    }

    /// Get a clipped cell by site id
    pub fn get_clipped_cell(&self, id: SiteId) -> Option<&Cell> {
        self.index_of(id).map(|i| &self.clipped[i])
    }

    /// Sites whose clipped cells share an edge with `id`, ascending
    pub fn get_neighbors(&self, id: SiteId) -> Vec<SiteId> {
        self.adjacency.neighbors_of(id)
    }

    /// Find the site whose clipped cell contains a point
    ///
    /// Uses the KD-tree index when the `spatial-index` feature is enabled and
    /// a linear scan otherwise. Returns `None` outside the region. Points on
    /// a shared edge resolve to either neighbour.
    ///
    /// # Example
    ///
    /// ```
    /// # use warped_voronoi::*;
    /// let config = DiagramConfigBuilder::new()
    ///     .points(vec![Point::new(0.25, 0.5), Point::new(0.75, 0.5)])
    ///     .build()
    ///     .unwrap();
    /// let diagram = WarpedDiagram::generate(config).unwrap();
    ///
    /// assert_eq!(diagram.find_cell_at(Point::new(0.1, 0.9)), Some(SiteId(0)));
    /// assert_eq!(diagram.find_cell_at(Point::new(0.9, 0.1)), Some(SiteId(1)));
    /// assert_eq!(diagram.find_cell_at(Point::new(2.0, 0.5)), None);
    /// ```
    pub fn find_cell_at(&self, point: Point) -> Option<SiteId> {
        if !self.config.region.contains(point) {
            return None;
        }

        #[cfg(feature = "spatial-index")]
        let nearest = self.spatial_index.find_nearest(point);

        #[cfg(not(feature = "spatial-index"))]
        let nearest = (0..self.sites.len()).min_by(|&a, &b| {
            let da = self.sites[a].position.distance_squared(point);
            let db = self.sites[b].position.distance_squared(point);
            da.total_cmp(&db).then(a.cmp(&b))
        });

        nearest.map(|i| self.sites[i].id)
    }
}

/// Build a warped diagram using the noise field described by the config
pub fn build_warped_diagram(config: &DiagramConfig) -> Result<WarpedDiagram> {
    WarpedDiagram::generate(config.clone())
}

/// Build a warped diagram with a caller-supplied noise field
pub fn build_warped_diagram_with_noise<N>(config: &DiagramConfig, noise: &N) -> Result<WarpedDiagram>
where
    N: NoiseField + ?Sized,
{
    WarpedDiagram::generate_with_noise(config.clone(), noise)
}

#[cfg(feature = "parallel")]
fn clip_cells(clipper: &RegionClipper, cells: &[Cell]) -> Vec<Cell> {
    cells.par_iter().map(|cell| clipper.clip(cell)).collect()
}

#[cfg(not(feature = "parallel"))]
fn clip_cells(clipper: &RegionClipper, cells: &[Cell]) -> Vec<Cell> {
    cells.iter().map(|cell| clipper.clip(cell)).collect()
}

#[cfg(feature = "parallel")]
fn warp_cells<N>(
    warper: &VertexWarper,
    cells: &[Cell],
    noise: &N,
) -> Vec<Cell>
where
    N: NoiseField + ?Sized,
{
    cells
        .par_iter()
        .map(|cell| warper.warp(cell, noise))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn warp_cells<N>(
    warper: &VertexWarper,
    cells: &[Cell],
    noise: &N,
) -> Vec<Cell>
where
    N: NoiseField + ?Sized,
{
    cells
        .iter()
        .map(|cell| warper.warp(cell, noise))
        .collect()
}
