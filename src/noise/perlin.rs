//! 2D Perlin (gradient) noise
//!
//! Classic improved Perlin noise on the unit lattice. The permutation table is
//! shuffled from the seed, so distinct seeds give unrelated fields rather than
//! translated copies of one field.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::{fade, lerp, NoiseField};
use crate::geometry::Point;

/// Seeded 2D gradient noise
#[derive(Debug, Clone)]
pub struct PerlinNoise {
    seed: u64,
    perm: [u8; 512],
}

impl PerlinNoise {
    /// Build the permutation table for `seed`
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            perm: shuffled_permutation(&mut ChaCha8Rng::seed_from_u64(seed)),
        }
    }

    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Hash a lattice corner through the permutation table
    #[inline]
    fn hash(&self, x: i64, y: i64) -> u8 {
        let a = self.perm[(x & 255) as usize] as usize;
        self.perm[a + (y & 255) as usize]
    }

    /// Raw noise at lattice coordinates, in [-1, 1]
    fn noise(&self, x: f64, y: f64) -> f64 {
        // Find unit square containing the point
        let x0 = x.floor() as i64;
        let y0 = y.floor() as i64;
        let x1 = x0.wrapping_add(1);
        let y1 = y0.wrapping_add(1);

        // Relative position within the square
        let xf = x - x.floor();
        let yf = y - y.floor();

        let u = fade(xf);
        let v = fade(yf);

        let g00 = gradient(self.hash(x0, y0), xf, yf);
        let g10 = gradient(self.hash(x1, y0), xf - 1.0, yf);
        let g01 = gradient(self.hash(x0, y1), xf, yf - 1.0);
        let g11 = gradient(self.hash(x1, y1), xf - 1.0, yf - 1.0);

        let bottom = lerp(g00, g10, u);
        let top = lerp(g01, g11, u);
        lerp(bottom, top, v).clamp(-1.0, 1.0)
    }
}

impl NoiseField for PerlinNoise {
    fn sample(&self, point: Point, frequency: f64) -> f64 {
        let p = point * frequency;
        if !p.is_finite() {
            return 0.0;
        }
        self.noise(p.x, p.y)
    }
}

/// Shuffle 0..=255 and repeat it once so corner lookups never wrap
pub(super) fn shuffled_permutation(rng: &mut ChaCha8Rng) -> [u8; 512] {
    let mut table: Vec<u8> = (0..=255u8).collect();
    table.shuffle(rng);

    let mut perm = [0u8; 512];
    for (i, slot) in perm.iter_mut().enumerate() {
        *slot = table[i & 255];
    }
    perm
}

/// Dot product of the offset with one of 8 lattice gradients
///
/// Four diagonals and four axis directions.
#[inline]
fn gradient(hash_value: u8, x: f64, y: f64) -> f64 {
    match hash_value & 7 {
        0 => x + y,
        1 => -x + y,
        2 => x - y,
        3 => -x - y,
        4 => x,
        5 => -x,
        6 => y,
        _ => -y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Identical seed and position always produce the same result
    #[test]
    fn test_determinism() {
        let a = PerlinNoise::new(42);
        let b = PerlinNoise::new(42);
        let p = Point::new(0.5, 0.7);

        assert_eq!(a.sample(p, 3.0), a.sample(p, 3.0));
        assert_eq!(a.sample(p, 3.0).to_bits(), b.sample(p, 3.0).to_bits());
    }

    #[test]
    fn test_range() {
        let noise = PerlinNoise::new(12345);
        for i in 0..2000 {
            let p = Point::new(i as f64 * 0.173 - 50.0, i as f64 * 0.091 + 7.0);
            let value = noise.sample(p, 1.0);
            assert!(
                (-1.0..=1.0).contains(&value),
                "value {} at {:?} is outside [-1, 1]",
                value,
                p
            );
        }
    }

    /// The field vanishes on lattice points
    #[test]
    fn test_zero_on_lattice() {
        let noise = PerlinNoise::new(7);
        assert_eq!(noise.sample(Point::new(3.0, -2.0), 1.0), 0.0);
        assert_eq!(noise.sample(Point::new(0.25, 0.5), 0.0), 0.0);
    }

    /// Crossing a lattice line does not jump
    #[test]
    fn test_continuity_across_cells() {
        let noise = PerlinNoise::new(99);
        let delta = 1e-7;
        for k in -5..5 {
            let edge = k as f64;
            let before = noise.sample(Point::new(edge - delta, 0.37), 1.0);
            let after = noise.sample(Point::new(edge + delta, 0.37), 1.0);
            assert!((before - after).abs() < 1e-5, "seam at x = {}", edge);

            let below = noise.sample(Point::new(0.61, edge - delta), 1.0);
            let above = noise.sample(Point::new(0.61, edge + delta), 1.0);
            assert!((below - above).abs() < 1e-5, "seam at y = {}", edge);
        }
    }

    /// Different seeds are not lattice translations of each other
    #[test]
    fn test_seeds_are_not_phase_shifts() {
        let a = PerlinNoise::new(1);
        let b = PerlinNoise::new(2);
        let probes: Vec<Point> = (0..16)
            .map(|i| Point::new(0.3 + i as f64 * 1.7, 0.6 + i as f64 * 0.9))
            .collect();

        for dx in -16..=16 {
            for dy in -16..=16 {
                let shift = Point::new(dx as f64, dy as f64);
                let identical = probes
                    .iter()
                    .all(|&p| (a.sample(p + shift, 1.0) - b.sample(p, 1.0)).abs() < 1e-12);
                assert!(!identical, "seed 2 is seed 1 shifted by {:?}", shift);
            }
        }
    }

    #[test]
    fn test_non_finite_input() {
        let noise = PerlinNoise::new(3);
        assert_eq!(noise.sample(Point::new(f64::NAN, 0.0), 1.0), 0.0);
        assert_eq!(noise.sample(Point::new(f64::INFINITY, 0.0), 1.0), 0.0);
    }

    #[test]
    fn test_permutation_is_a_permutation() {
        let perm = shuffled_permutation(&mut ChaCha8Rng::seed_from_u64(5));
        let mut seen = [false; 256];
        for &v in &perm[..256] {
            seen[v as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
        assert_eq!(perm[..256], perm[256..]);
    }
}
