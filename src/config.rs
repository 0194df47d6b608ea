//! Diagram configuration and builder
//!
//! This module provides the parameter set for deterministic diagram generation.
//! The same configuration always produces the identical diagram.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, WarpError};
use crate::geometry::{BoundingRegion, Point};

/// Seed for every pseudo-random stream of a run
///
/// Integer seeds are used verbatim. String seeds are hashed with 64-bit
/// FNV-1a, which is stable across platforms and releases.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Seed(pub u64);

impl Seed {
    /// Hash a string into a seed
    pub fn from_text(text: &str) -> Self {
        const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
        const PRIME: u64 = 0x0000_0100_0000_01b3;

        let hash = text.bytes().fold(OFFSET_BASIS, |hash, byte| {
            (hash ^ u64::from(byte)).wrapping_mul(PRIME)
        });
        Self(hash)
    }
}

impl From<u64> for Seed {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<u32> for Seed {
    fn from(value: u32) -> Self {
        Self(u64::from(value))
    }
}

impl From<&str> for Seed {
    fn from(text: &str) -> Self {
        Self::from_text(text)
    }
}

impl From<String> for Seed {
    fn from(text: String) -> Self {
        Self::from_text(&text)
    }
}

/// Where the sites come from
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum SiteSource {
    /// Sample this many sites uniformly inside the region
    Generate(usize),
    /// Use caller-supplied coordinates verbatim
    Passthrough(Vec<Point>),
}

impl SiteSource {
    /// Number of requested sites (before deduplication)
    pub fn len(&self) -> usize {
        match self {
            SiteSource::Generate(count) => *count,
            SiteSource::Passthrough(points) => points.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SiteSource {
    fn default() -> Self {
        SiteSource::Generate(20)
    }
}

/// Noise function family used for warping
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoiseKind {
    /// Gradient (Perlin) noise
    #[default]
    Perlin,
    /// Lattice value noise
    Value,
}

/// Fractal noise parameters
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseConfig {
    /// Base noise family
    pub kind: NoiseKind,
    /// Number of octaves for fractal detail layers
    pub octaves: usize,
    /// Amplitude decay per octave (controls roughness)
    pub persistence: f64,
    /// Frequency multiplier per octave
    pub lacunarity: f64,
}

impl NoiseConfig {
    /// Largest accepted octave count
    pub const MAX_OCTAVES: usize = 16;

    /// Check octave count and per-octave factors
    pub fn validate(&self) -> Result<()> {
        if self.octaves == 0 || self.octaves > Self::MAX_OCTAVES {
            return Err(WarpError::InvalidInput(format!(
                "noise octaves must be in 1..={} (got {})",
                Self::MAX_OCTAVES,
                self.octaves
            )));
        }
        if !(self.persistence.is_finite() && self.persistence > 0.0) {
            return Err(WarpError::InvalidInput(format!(
                "noise persistence must be positive (got {})",
                self.persistence
            )));
        }
        if !(self.lacunarity.is_finite() && self.lacunarity > 0.0) {
            return Err(WarpError::InvalidInput(format!(
                "noise lacunarity must be positive (got {})",
                self.lacunarity
            )));
        }
        Ok(())
    }
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            kind: NoiseKind::Perlin,
            octaves: 2,
            persistence: 0.5,
            lacunarity: 2.0,
        }
    }
}

/// Configuration for deterministic diagram generation
///
/// # Example
///
/// ```rust
/// use warped_voronoi::*;
///
/// let config = DiagramConfigBuilder::new()
///     .sites(50)
///     .unwrap()
///     .seed(42u64)
///     .amplitude(0.02)
///     .unwrap()
///     .build()
///     .unwrap();
///
/// assert_eq!(config.sites.len(), 50);
/// assert_eq!(config.noise_seed, config.seed);
/// ```
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct DiagramConfig {
    /// Site count or explicit coordinates
    pub sites: SiteSource,

    /// Rectangle every cell is clipped to
    pub region: BoundingRegion,

    /// Noise frequency (scales sample coordinates)
    pub frequency: f64,

    /// Maximum displacement per axis
    pub amplitude: f64,

    /// Seed for site sampling
    pub seed: Seed,

    /// Seed for the noise field (defaults to `seed`)
    ///
    /// Lets the same site layout be re-warped with a different field.
    pub noise_seed: Seed,

    /// Noise family and octave settings
    pub noise: NoiseConfig,

    /// Sites closer than this are treated as one
    pub dedup_epsilon: f64,

    /// Unbounded rays are extended this many region diagonals past the
    /// extent of the region and the sites
    pub frame_margin: f64,

    /// Number of Lloyd relaxation iterations applied to generated sites
    ///
    /// - 0: raw uniform sampling (default)
    /// - 2-5: progressively more even, honeycomb-like cells
    pub lloyd_iterations: usize,

    /// Lloyd early-exit threshold, as a fraction of the region diagonal
    ///
    /// 0.0 disables early termination.
    pub lloyd_convergence: f64,

    /// Clip warped polygons back to the region
    ///
    /// Each cell stays a single polygon. A warped polygon that folds over
    /// itself is clipped as one ring, so the pieces left after clipping are
    /// joined by zero-area bridge edges instead of being split into separate
    /// polygons.
    pub reclip_after_warp: bool,
}

impl DiagramConfig {
    /// Largest accepted Lloyd iteration count
    pub const MAX_LLOYD_ITERATIONS: usize = 20;

    /// Re-check every parameter
    ///
    /// Builder output is always valid; this exists for hand-built or
    /// deserialized configurations.
    pub fn validate(&self) -> Result<()> {
        self.region.validate()?;
        validate_site_source(&self.sites)?;
        validate_non_negative("frequency", self.frequency)?;
        validate_non_negative("amplitude", self.amplitude)?;
        validate_positive("dedup epsilon", self.dedup_epsilon)?;
        validate_positive("frame margin", self.frame_margin)?;
        validate_non_negative("Lloyd convergence threshold", self.lloyd_convergence)?;
        if self.lloyd_iterations > Self::MAX_LLOYD_ITERATIONS {
            return Err(WarpError::InvalidInput(format!(
                "Lloyd iterations must be <= {} (got {})",
                Self::MAX_LLOYD_ITERATIONS,
                self.lloyd_iterations
            )));
        }
        self.noise.validate()
    }
}

impl Default for DiagramConfig {
    fn default() -> Self {
        let seed = Seed(10);
        Self {
            sites: SiteSource::default(),
            region: BoundingRegion::unit(),
            frequency: 3.0,
            amplitude: 0.03,
            seed,
            noise_seed: seed,
            noise: NoiseConfig::default(),
            dedup_epsilon: 1e-9,
            frame_margin: 2.0,
            lloyd_iterations: 0,
            lloyd_convergence: 0.01,
            reclip_after_warp: false,
        }
    }
}

fn validate_site_source(sites: &SiteSource) -> Result<()> {
    match sites {
        SiteSource::Generate(0) => Err(WarpError::InvalidInput(
            "site count must be >= 1 (got 0)".into(),
        )),
        SiteSource::Generate(_) => Ok(()),
        SiteSource::Passthrough(points) if points.is_empty() => Err(WarpError::InvalidInput(
            "at least one site coordinate is required".into(),
        )),
        SiteSource::Passthrough(points) => match points.iter().position(|p| !p.is_finite()) {
            Some(index) => Err(WarpError::InvalidInput(format!(
                "site coordinate {} is not finite ({:?})",
                index, points[index]
            ))),
            None => Ok(()),
        },
    }
}

fn validate_non_negative(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(WarpError::InvalidInput(format!(
            "{} must be finite and >= 0 (got {})",
            name, value
        )))
    }
}

pub(crate) fn validate_positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(WarpError::InvalidInput(format!(
            "{} must be finite and > 0 (got {})",
            name, value
        )))
    }
}

/// Builder for creating DiagramConfig with validation
///
/// # Example
///
/// ```rust
/// use warped_voronoi::*;
///
/// let region = BoundingRegion::new(0.0, 0.0, 10.0, 10.0).unwrap();
/// let config = DiagramConfigBuilder::new()
///     .points(vec![Point::new(2.0, 2.0), Point::new(8.0, 8.0)])
///     .region(region)
///     .frequency(0.5)
///     .unwrap()
///     .seed("mosaic")
///     .build()
///     .unwrap();
///
/// assert_eq!(config.region.area(), 100.0);
/// ```
#[derive(Debug, Clone)]
pub struct DiagramConfigBuilder {
    config: DiagramConfig,
    noise_seed: Option<Seed>,
}

impl DiagramConfigBuilder {
    /// Create a new builder with default values
    ///
    /// Defaults:
    /// - sites: 20 generated
    /// - region: unit square
    /// - frequency: 3.0, amplitude: 0.03
    /// - seed: 10, noise seed: same as seed
    /// - noise: 2-octave Perlin
    /// - lloyd_iterations: 0
    pub fn new() -> Self {
        Self {
            config: DiagramConfig::default(),
            noise_seed: None,
        }
    }

    /// Generate `count` uniformly distributed sites
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if count is zero.
    pub fn sites(mut self, count: usize) -> Result<Self> {
        validate_site_source(&SiteSource::Generate(count))?;
        self.config.sites = SiteSource::Generate(count);
        Ok(self)
    }

    /// Use caller-supplied site coordinates (validated in [`build`](Self::build))
    pub fn points(mut self, points: Vec<Point>) -> Self {
        self.config.sites = SiteSource::Passthrough(points);
        self
    }

    /// Set the bounding region
    pub fn region(mut self, region: BoundingRegion) -> Self {
        self.config.region = region;
        self
    }

    /// Set the noise frequency
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if frequency is negative or not finite.
    pub fn frequency(mut self, frequency: f64) -> Result<Self> {
        validate_non_negative("frequency", frequency)?;
        self.config.frequency = frequency;
        Ok(self)
    }

    /// Set the warp amplitude
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if amplitude is negative or not finite.
    pub fn amplitude(mut self, amplitude: f64) -> Result<Self> {
        validate_non_negative("amplitude", amplitude)?;
        self.config.amplitude = amplitude;
        Ok(self)
    }

    /// Set the seed for site sampling (and the noise, unless overridden)
    pub fn seed(mut self, seed: impl Into<Seed>) -> Self {
        self.config.seed = seed.into();
        self
    }

    /// Set a separate noise seed
    pub fn noise_seed(mut self, seed: impl Into<Seed>) -> Self {
        self.noise_seed = Some(seed.into());
        self
    }

    /// Set the noise family and octave settings
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for zero or too many octaves, or non-positive factors.
    pub fn noise(mut self, noise: NoiseConfig) -> Result<Self> {
        noise.validate()?;
        self.config.noise = noise;
        Ok(self)
    }

    /// Set the site deduplication tolerance
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if epsilon is not positive.
    pub fn dedup_epsilon(mut self, epsilon: f64) -> Result<Self> {
        validate_positive("dedup epsilon", epsilon)?;
        self.config.dedup_epsilon = epsilon;
        Ok(self)
    }

    /// Set how far unbounded rays are extended, in region diagonals
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if margin is not positive.
    pub fn frame_margin(mut self, margin: f64) -> Result<Self> {
        validate_positive("frame margin", margin)?;
        self.config.frame_margin = margin;
        Ok(self)
    }

    /// Set the number of Lloyd relaxation iterations
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if iterations > 20
    pub fn lloyd_iterations(mut self, iterations: usize) -> Result<Self> {
        if iterations > DiagramConfig::MAX_LLOYD_ITERATIONS {
            return Err(WarpError::InvalidInput(format!(
                "Lloyd iterations must be <= {} (got {})",
                DiagramConfig::MAX_LLOYD_ITERATIONS,
                iterations
            )));
        }
        self.config.lloyd_iterations = iterations;
        Ok(self)
    }

    /// Set the Lloyd early-exit threshold (fraction of the region diagonal)
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if threshold is negative
    pub fn lloyd_convergence(mut self, threshold: f64) -> Result<Self> {
        validate_non_negative("Lloyd convergence threshold", threshold)?;
        self.config.lloyd_convergence = threshold;
        Ok(self)
    }

    /// Clip warped polygons back to the region
    ///
    /// See [`DiagramConfig::reclip_after_warp`] for how folded polygons are
    /// handled.
    pub fn reclip_after_warp(mut self, enabled: bool) -> Self {
        self.config.reclip_after_warp = enabled;
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the region or the passthrough points are invalid.
    pub fn build(self) -> Result<DiagramConfig> {
        let mut config = self.config;
        config.noise_seed = self.noise_seed.unwrap_or(config.seed);
        config.validate()?;
        Ok(config)
    }
}

impl Default for DiagramConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = DiagramConfigBuilder::new().build().unwrap();
        assert_eq!(config.sites, SiteSource::Generate(20));
        assert_eq!(config.region, BoundingRegion::unit());
        assert_eq!(config.frequency, 3.0);
        assert_eq!(config.amplitude, 0.03);
        assert_eq!(config.seed, Seed(10));
        assert_eq!(config.noise, NoiseConfig::default());
        assert_eq!(config.lloyd_iterations, 0);
        assert!(!config.reclip_after_warp);
    }

    #[test]
    fn test_builder_custom() {
        let region = BoundingRegion::new(-5.0, -5.0, 5.0, 5.0).unwrap();
        let config = DiagramConfigBuilder::new()
            .sites(100)
            .unwrap()
            .region(region)
            .frequency(1.5)
            .unwrap()
            .amplitude(0.25)
            .unwrap()
            .seed(42u64)
            .lloyd_iterations(3)
            .unwrap()
            .reclip_after_warp(true)
            .build()
            .unwrap();

        assert_eq!(config.sites.len(), 100);
        assert_eq!(config.region, region);
        assert_eq!(config.frequency, 1.5);
        assert_eq!(config.amplitude, 0.25);
        assert_eq!(config.seed, Seed(42));
        assert_eq!(config.lloyd_iterations, 3);
        assert!(config.reclip_after_warp);
    }

    #[test]
    fn test_noise_seed_defaults_to_seed() {
        let config = DiagramConfigBuilder::new().seed(7u64).build().unwrap();
        assert_eq!(config.noise_seed, Seed(7));

        let config = DiagramConfigBuilder::new()
            .seed(7u64)
            .noise_seed(99u64)
            .build()
            .unwrap();
        assert_eq!(config.seed, Seed(7));
        assert_eq!(config.noise_seed, Seed(99));
    }

    #[test]
    fn test_string_seed_is_stable() {
        assert_eq!(Seed::from("voronoi"), Seed::from("voronoi".to_string()));
        assert_ne!(Seed::from("voronoi"), Seed::from("voronoj"));
        // FNV-1a of the empty string is the offset basis
        assert_eq!(Seed::from(""), Seed(0xcbf2_9ce4_8422_2325));
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(DiagramConfigBuilder::new().sites(0).is_err());
        assert!(DiagramConfigBuilder::new().frequency(-1.0).is_err());
        assert!(DiagramConfigBuilder::new().frequency(f64::NAN).is_err());
        assert!(DiagramConfigBuilder::new().amplitude(-0.1).is_err());
        assert!(DiagramConfigBuilder::new().dedup_epsilon(0.0).is_err());
        assert!(DiagramConfigBuilder::new().frame_margin(-1.0).is_err());
        assert!(DiagramConfigBuilder::new().lloyd_iterations(21).is_err());
        assert!(DiagramConfigBuilder::new().lloyd_convergence(-0.5).is_err());
    }

    #[test]
    fn test_zero_frequency_and_amplitude_allowed() {
        let config = DiagramConfigBuilder::new()
            .frequency(0.0)
            .unwrap()
            .amplitude(0.0)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(config.frequency, 0.0);
        assert_eq!(config.amplitude, 0.0);
    }

    #[test]
    fn test_invalid_points() {
        let result = DiagramConfigBuilder::new().points(vec![]).build();
        assert!(matches!(result, Err(WarpError::InvalidInput(_))));

        let result = DiagramConfigBuilder::new()
            .points(vec![Point::new(0.5, 0.5), Point::new(f64::NAN, 0.0)])
            .build();
        assert!(matches!(result, Err(WarpError::InvalidInput(_))));
    }

    #[test]
    fn test_invalid_noise() {
        let noise = NoiseConfig {
            octaves: 0,
            ..Default::default()
        };
        assert!(DiagramConfigBuilder::new().noise(noise).is_err());

        let noise = NoiseConfig {
            lacunarity: 0.0,
            ..Default::default()
        };
        assert!(DiagramConfigBuilder::new().noise(noise).is_err());

        let noise = NoiseConfig {
            kind: NoiseKind::Value,
            octaves: 4,
            ..Default::default()
        };
        assert!(DiagramConfigBuilder::new().noise(noise).is_ok());
    }

    #[test]
    fn test_validate_catches_hand_built_config() {
        let config = DiagramConfig {
            region: BoundingRegion {
                min: Point::new(0.0, 0.0),
                max: Point::new(0.0, 1.0),
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(DiagramConfig::default().validate().is_ok());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_config_serialization() {
        let config = DiagramConfigBuilder::new()
            .points(vec![Point::new(0.25, 0.5), Point::new(0.75, 0.5)])
            .seed("tiles")
            .build()
            .unwrap();

        let json = serde_json::to_string(&config).unwrap();
        let restored: DiagramConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(config, restored);
    }
}
