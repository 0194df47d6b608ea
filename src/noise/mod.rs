//! Deterministic 2D noise fields
//!
//! The warper only sees the [`NoiseField`] trait, so any continuous,
//! deterministic function can be substituted for the built-in ones.

mod fbm;
mod perlin;
mod value;

pub use fbm::Fbm;
pub use perlin::PerlinNoise;
pub use value::ValueNoise;

use crate::config::{NoiseConfig, NoiseKind, Seed};
use crate::geometry::Point;

/// A continuous scalar field over the plane
///
/// Implementations must be deterministic (same inputs, same output on every
/// platform), continuous in `point`, and return values in `[-1, 1]`. The seed
/// is bound when the field is constructed.
pub trait NoiseField: Send + Sync {
    /// Sample the field at `point`, with coordinates scaled by `frequency`
    fn sample(&self, point: Point, frequency: f64) -> f64;
}

impl<N: NoiseField + ?Sized> NoiseField for Box<N> {
    #[inline]
    fn sample(&self, point: Point, frequency: f64) -> f64 {
        (**self).sample(point, frequency)
    }
}

impl<N: NoiseField + ?Sized> NoiseField for &N {
    #[inline]
    fn sample(&self, point: Point, frequency: f64) -> f64 {
        (**self).sample(point, frequency)
    }
}

/// Build the fractal field described by a noise configuration
pub fn noise_from_config(config: &NoiseConfig, seed: Seed) -> Fbm<Box<dyn NoiseField>> {
    let base: Box<dyn NoiseField> = match config.kind {
        NoiseKind::Perlin => Box::new(PerlinNoise::new(seed.0)),
        NoiseKind::Value => Box::new(ValueNoise::new(seed.0)),
    };
    Fbm::new(base, config.octaves, config.persistence, config.lacunarity)
}

/// Quintic smoothstep interpolation (Ken Perlin's improved fade function)
///
/// Formula: 6t⁵ - 15t⁴ + 10t³
#[inline]
pub(crate) fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
pub(crate) fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + t * (b - a)
}
