//! Fractal Brownian motion over any base field

use super::NoiseField;
use crate::geometry::Point;

/// Sum of octaves of a base field at rising frequency and falling amplitude
///
/// The sum is divided by the total amplitude, so the result stays in
/// `[-1, 1]` whenever the base field does.
#[derive(Debug, Clone)]
pub struct Fbm<N> {
    base: N,
    octaves: usize,
    persistence: f64,
    lacunarity: f64,
}

impl<N: NoiseField> Fbm<N> {
    /// Wrap `base`; `octaves` is raised to at least one
    pub fn new(base: N, octaves: usize, persistence: f64, lacunarity: f64) -> Self {
        Self {
            base,
            octaves: octaves.max(1),
            persistence,
            lacunarity,
        }
    }

    #[inline]
    pub fn octaves(&self) -> usize {
        self.octaves
    }

    #[inline]
    pub fn base(&self) -> &N {
        &self.base
    }
}

impl<N: NoiseField> NoiseField for Fbm<N> {
    fn sample(&self, point: Point, frequency: f64) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut octave_frequency = frequency;
        let mut max_value = 0.0;

        for _ in 0..self.octaves {
            total += self.base.sample(point, octave_frequency) * amplitude;
            max_value += amplitude;
            octave_frequency *= self.lacunarity;
            amplitude *= self.persistence;
        }

        (total / max_value).clamp(-1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::PerlinNoise;

    #[test]
    fn test_single_octave_matches_base() {
        let base = PerlinNoise::new(11);
        let fbm = Fbm::new(PerlinNoise::new(11), 1, 0.5, 2.0);
        let p = Point::new(0.42, 1.7);
        assert_eq!(fbm.sample(p, 3.0), base.sample(p, 3.0));
    }

    #[test]
    fn test_range() {
        let fbm = Fbm::new(PerlinNoise::new(5), 6, 0.8, 2.0);
        for i in 0..1000 {
            let p = Point::new(i as f64 * 0.031, i as f64 * 0.017);
            let value = fbm.sample(p, 4.0);
            assert!((-1.0..=1.0).contains(&value));
        }
    }

    #[test]
    fn test_octaves_clamped_to_one() {
        let fbm = Fbm::new(PerlinNoise::new(5), 0, 0.5, 2.0);
        assert_eq!(fbm.octaves(), 1);
        assert_eq!(fbm.base().seed(), 5);
    }

    #[test]
    fn test_more_octaves_add_detail() {
        let coarse = Fbm::new(PerlinNoise::new(21), 1, 0.5, 2.0);
        let fine = Fbm::new(PerlinNoise::new(21), 4, 0.5, 2.0);
        let differs = (0..50).any(|i| {
            let p = Point::new(0.13 * i as f64, 0.29);
            coarse.sample(p, 1.0) != fine.sample(p, 1.0)
        });
        assert!(differs);
    }
}
