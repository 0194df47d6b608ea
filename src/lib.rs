//! Clipped, noise-warped Voronoi tilings
//!
//! Builds the Voronoi diagram of a set of sites, clips every cell to a
//! rectangle and displaces the cell vertices with a deterministic noise field,
//! giving an organic looking but reproducible tiling.
//!
//! # Quick Start
//!
//! ```rust
//! use warped_voronoi::*;
//!
//! let config = DiagramConfigBuilder::new()
//!     .sites(200).unwrap()
//!     .region(BoundingRegion::new(0.0, 0.0, 100.0, 100.0).unwrap())
//!     .frequency(0.05).unwrap()
//!     .amplitude(1.5).unwrap()
//!     .seed(42u64)
//!     .build().unwrap();
//!
//! let diagram = build_warped_diagram(&config).unwrap();
//! for cell in diagram.cells() {
//!     // cell.vertices is the warped polygon of site cell.site
//! }
//! println!("{} cells, {} adjacencies", diagram.cell_count(), diagram.adjacency().len());
//! ```
//!
//! # Features
//!
//! - `spatial-index` (default): O(log n) point-to-cell lookups using a KD-tree
//! - `parallel`: clip and warp cells on the rayon thread pool
//! - `serde`: serialization support for configuration and cells

// Modules
pub mod adjacency;
pub mod cell;
pub mod config;
pub mod diagram;
pub mod error;
pub mod generation;
pub mod geometry;
pub mod noise;
mod util;

#[cfg(feature = "spatial-index")]
pub mod spatial;

// Re-export core types for convenience
pub use adjacency::{Adjacency, AdjacencyFact};
pub use cell::{Cell, Site, SiteId, VertexId};
pub use config::{DiagramConfig, DiagramConfigBuilder, NoiseConfig, NoiseKind, Seed, SiteSource};
pub use diagram::{build_warped_diagram, build_warped_diagram_with_noise, WarpedDiagram};
pub use error::{Result, WarpError};
pub use generation::{LloydOptions, RegionClipper, VertexWarper, VoronoiBuilder, VoronoiDiagram};
pub use geometry::{BoundingRegion, Point};
pub use noise::{Fbm, NoiseField, PerlinNoise, ValueNoise};

#[cfg(feature = "spatial-index")]
pub use spatial::SpatialIndex;
