//! Lloyd's Relaxation for uniform site distribution
//!
//! Lloyd's Relaxation iteratively improves the uniformity of the sites by
//! moving each one to the centroid of its clipped Voronoi cell.

use super::clip::RegionClipper;
use super::voronoi::VoronoiBuilder;
use crate::cell::Site;
use crate::error::Result;
use crate::geometry::BoundingRegion;
use crate::util::Timed;

/// Options for Lloyd's relaxation algorithm
#[derive(Debug, Clone, Copy)]
pub struct LloydOptions {
    /// Maximum number of iterations to run
    pub max_iterations: usize,
    /// Convergence threshold - stop when max displacement < this value
    /// (as a fraction of the region diagonal). Set to 0.0 to disable early
    /// termination
    pub convergence_threshold: f64,
}

impl Default for LloydOptions {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            // For a unit square this stops once no site moves more than
            // ~0.014, typically after 3-4 iterations
            convergence_threshold: 0.01,
        }
    }
}

/// Apply Lloyd's Relaxation to improve site distribution uniformity
///
/// For each iteration:
/// 1. Build the Voronoi diagram of the current sites
/// 2. Clip every cell to the region
/// 3. Move each site to the centroid of its clipped cell
///
/// Site ids are kept. A site whose cell misses the region stays where it is,
/// and sites merged as duplicates during a build are dropped.
///
/// # Errors
///
/// Propagates builder errors (non-finite or repeated sites).
pub fn relax(
    mut sites: Vec<Site>,
    region: &BoundingRegion,
    builder: &VoronoiBuilder,
    options: LloydOptions,
) -> Result<Vec<Site>> {
    let _timer = Timed::debug("Lloyd relaxation");
    let threshold = options.convergence_threshold * region.diagonal();
    let clipper = RegionClipper::new(*region);

    log::debug!(
        "[Lloyd] Starting: {} sites, max {} iterations, threshold {:.4} (abs: {:.6})",
        sites.len(),
        options.max_iterations,
        options.convergence_threshold,
        threshold
    );

    let mut iterations_run = 0;
    let mut converged = false;

    for iteration in 0..options.max_iterations {
        let _iter_timer = Timed::trace("[Lloyd] Iteration");
        let diagram = builder.build(&sites, region)?;

        let mut max_displacement: f64 = 0.0;
        sites = diagram
            .sites()
            .iter()
            .zip(diagram.cells())
            .map(|(site, cell)| {
                let position = clipper.clip(cell).centroid().unwrap_or(site.position);
                max_displacement = max_displacement.max(position.distance(site.position));
                Site {
                    id: site.id,
                    position,
                }
            })
            .collect();

        iterations_run = iteration + 1;
        log::trace!(
            "[Lloyd] Iter {}: max_disp={:.6}",
            iterations_run,
            max_displacement
        );

        if threshold > 0.0 && max_displacement < threshold {
            converged = true;
            log::debug!(
                "[Lloyd] Converged at iteration {} (max_disp {:.6} < threshold {:.6})",
                iterations_run,
                max_displacement,
                threshold
            );
            break;
        }
    }

    log::debug!(
        "[Lloyd] Finished: {} iterations (of max {}), converged={}",
        iterations_run,
        options.max_iterations,
        converged
    );

    Ok(sites)
}
