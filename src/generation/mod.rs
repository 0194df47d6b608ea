//! Core diagram generation stages
//!
//! Sites are sampled (and optionally relaxed), the Voronoi diagram is built
//! by bisector clipping, cells are clipped to the region, shared corners are
//! welded and finally every vertex is displaced by noise.

mod clip;
mod grid;
mod lloyd;
mod neighbors;
mod sampler;
mod voronoi;
mod warp;
mod weld;

pub use clip::RegionClipper;
pub use lloyd::{relax, LloydOptions};
pub use sampler::{generate_sites, passthrough_sites, sample_sites};
pub use voronoi::{HalfEdge, VoronoiBuilder, VoronoiDiagram};
pub use warp::{VertexWarper, DECORRELATION_OFFSET};
pub use weld::weld_vertices;

use crate::cell::Site;
use crate::config::{DiagramConfig, SiteSource};
use crate::error::Result;
use crate::util::Timed;

/// Produce the sites described by a configuration
///
/// Generated sites are relaxed with Lloyd's algorithm when
/// `lloyd_iterations > 0`; passthrough sites are used as given.
pub fn sites_from_config(config: &DiagramConfig) -> Result<Vec<Site>> {
    let sites = {
        let _timer = Timed::debug("Site sampling");
        sample_sites(&config.sites, &config.region, config.seed, config.dedup_epsilon)?
    };

    match config.sites {
        SiteSource::Generate(_) if config.lloyd_iterations > 0 => {
            let options = LloydOptions {
                max_iterations: config.lloyd_iterations,
                convergence_threshold: config.lloyd_convergence,
            };
            relax(sites, &config.region, &VoronoiBuilder::from_config(config)?, options)
        }
        _ => Ok(sites),
    }
}
