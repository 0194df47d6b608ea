//! Sites and cell polygons
//!
//! A [`Cell`] is the polygon owned by one [`Site`]. The same type is used at
//! every stage of the pipeline: the builder produces frame-bounded cells, the
//! clipper replaces them with region-bounded ones and the warper replaces
//! those again with displaced copies.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::geometry::{self, Point};

/// Stable identifier correlating a cell with its generating point
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SiteId(pub u32);

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier of a welded vertex of the clipped tiling
///
/// Vertices shared by neighbouring cells carry the same id.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VertexId(pub u32);

/// A seed point tagged with its identifier
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Site {
    pub id: SiteId,
    pub position: Point,
}

impl Site {
    pub fn new(id: u32, position: Point) -> Self {
        Self {
            id: SiteId(id),
            position,
        }
    }
}

/// Convex polygon owned by one site
///
/// Vertices are ordered counter-clockwise; the last vertex implicitly connects
/// back to the first. An empty vertex list means the cell does not meet the
/// bounding region.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// Generating site
    pub site: SiteId,

    /// Polygon vertices, counter-clockwise
    pub vertices: Vec<Point>,

    /// Welded vertex identifiers, parallel to `vertices`
    ///
    /// Empty until the clipped tiling has been welded.
    pub vertex_ids: Vec<VertexId>,

    /// False when the cell reaches the construction frame, which every
    /// unbounded Voronoi cell does
    pub bounded: bool,
}

impl Cell {
    /// Create a cell without vertex identifiers
    pub fn new(site: SiteId, vertices: Vec<Point>, bounded: bool) -> Self {
        Self {
            site,
            vertices,
            vertex_ids: Vec::new(),
            bounded,
        }
    }

    /// Empty cell for a site whose region lies outside the bounds
    pub fn empty(site: SiteId) -> Self {
        Self::new(site, Vec::new(), true)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.len() < 3
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Polygon area (zero for empty cells)
    pub fn area(&self) -> f64 {
        geometry::signed_area(&self.vertices).abs()
    }

    /// Area centroid, `None` for empty cells
    pub fn centroid(&self) -> Option<Point> {
        if self.is_empty() {
            return None;
        }
        geometry::centroid(&self.vertices)
    }

    /// Inclusive containment test
    ///
    /// Only meaningful before warping, while the polygon is still convex.
    pub fn contains(&self, p: Point) -> bool {
        geometry::convex_contains(&self.vertices, p)
    }

    /// Iterate over boundary segments `(start, end)` in counter-clockwise order
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }
}
