//! Site sampling
//!
//! Produces the seed sites of a diagram, either drawn uniformly inside the
//! bounding region from a seeded ChaCha stream or taken verbatim from caller
//! coordinates.
//!
//! Generated sites are numbered `0..count` in draw order and are pairwise at
//! least `epsilon` apart. A candidate that lands too close to an accepted site
//! is redrawn, which consumes more of the stream but keeps the output a pure
//! function of `(count, region, seed)`.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::grid::ProximityGrid;
use crate::cell::Site;
use crate::config::{Seed, SiteSource};
use crate::error::{Result, WarpError};
use crate::geometry::{BoundingRegion, Point};

/// Consecutive rejected candidates before the region is declared full
const MAX_ATTEMPTS: usize = 1000;

/// Sample `count` distinct sites uniformly inside `region`
///
/// # Errors
///
/// Returns `InvalidInput` if count is zero or exceeds `u32::MAX`, the region
/// has no area, epsilon is not positive, or the region cannot hold `count`
/// points that are `epsilon` apart.
///
/// # Example
///
/// ```rust
/// use warped_voronoi::*;
/// use warped_voronoi::generation::generate_sites;
///
/// let region = BoundingRegion::new(0.0, 0.0, 10.0, 10.0).unwrap();
/// let sites = generate_sites(100, &region, Seed(42), 1e-9).unwrap();
/// assert_eq!(sites.len(), 100);
/// assert!(sites.iter().all(|s| region.contains(s.position)));
/// ```
pub fn generate_sites(
    count: usize,
    region: &BoundingRegion,
    seed: Seed,
    epsilon: f64,
) -> Result<Vec<Site>> {
    validate_count(count)?;
    region.validate()?;
    if !(epsilon.is_finite() && epsilon > 0.0) {
        return Err(WarpError::InvalidInput(format!(
            "site spacing epsilon must be positive (got {})",
            epsilon
        )));
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed.0);
    let mut grid = ProximityGrid::new(epsilon);
    let mut sites = Vec::with_capacity(count);

    while sites.len() < count {
        let mut attempts = 0;
        let position = loop {
            let candidate = Point::new(
                rng.gen_range(region.min.x..region.max.x),
                rng.gen_range(region.min.y..region.max.y),
            );
            if grid.find_within(candidate).is_none() {
                break candidate;
            }
            attempts += 1;
            if attempts >= MAX_ATTEMPTS {
                log::warn!(
                    "Sampling gave up after {} sites: region too small for {} points {} apart",
                    sites.len(),
                    count,
                    epsilon
                );
                return Err(WarpError::InvalidInput(format!(
                    "cannot place {} sites at least {} apart in a {} x {} region",
                    count,
                    epsilon,
                    region.width(),
                    region.height()
                )));
            }
        };

        grid.insert(position);
        sites.push(Site::new(sites.len() as u32, position));
    }

    log::trace!("Sampled {} sites with seed {}", sites.len(), seed.0);
    Ok(sites)
}

/// Wrap caller-supplied coordinates as sites numbered by input index
///
/// Points are not deduplicated here and may lie outside the region.
///
/// # Errors
///
/// Returns `InvalidInput` if there are no points, too many points, or a
/// coordinate is not finite.
pub fn passthrough_sites(points: &[Point]) -> Result<Vec<Site>> {
    validate_count(points.len())?;
    points
        .iter()
        .enumerate()
        .map(|(index, &position)| {
            if position.is_finite() {
                Ok(Site::new(index as u32, position))
            } else {
                Err(WarpError::InvalidInput(format!(
                    "site coordinate {} is not finite ({:?})",
                    index, position
                )))
            }
        })
        .collect()
}

/// Produce sites for either source mode
pub fn sample_sites(
    source: &SiteSource,
    region: &BoundingRegion,
    seed: Seed,
    epsilon: f64,
) -> Result<Vec<Site>> {
    match source {
        SiteSource::Generate(count) => generate_sites(*count, region, seed, epsilon),
        SiteSource::Passthrough(points) => {
            region.validate()?;
            passthrough_sites(points)
        }
    }
}

fn validate_count(count: usize) -> Result<()> {
    if count == 0 {
        return Err(WarpError::InvalidInput(
            "site count must be >= 1 (got 0)".into(),
        ));
    }
    if count > u32::MAX as usize {
        return Err(WarpError::InvalidInput(format!(
            "site count must fit in 32 bits (got {})",
            count
        )));
    }
    Ok(())
}
