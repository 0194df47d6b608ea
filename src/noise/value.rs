//! 2D lattice value noise

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::perlin::shuffled_permutation;
use super::{fade, lerp, NoiseField};
use crate::geometry::Point;

/// Seeded value noise: random lattice values, smoothly interpolated
#[derive(Debug, Clone)]
pub struct ValueNoise {
    seed: u64,
    perm: [u8; 512],
    values: [f64; 256],
}

impl ValueNoise {
    pub fn new(seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let perm = shuffled_permutation(&mut rng);
        let mut values = [0.0; 256];
        for value in values.iter_mut() {
            *value = rng.gen_range(-1.0..=1.0);
        }
        Self { seed, perm, values }
    }

    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[inline]
    fn lattice(&self, x: i64, y: i64) -> f64 {
        let a = self.perm[(x & 255) as usize] as usize;
        self.values[self.perm[a + (y & 255) as usize] as usize]
    }

    fn noise(&self, x: f64, y: f64) -> f64 {
        let x0 = x.floor() as i64;
        let y0 = y.floor() as i64;
        let x1 = x0.wrapping_add(1);
        let y1 = y0.wrapping_add(1);

        let u = fade(x - x.floor());
        let v = fade(y - y.floor());

        let bottom = lerp(self.lattice(x0, y0), self.lattice(x1, y0), u);
        let top = lerp(self.lattice(x0, y1), self.lattice(x1, y1), u);
        lerp(bottom, top, v).clamp(-1.0, 1.0)
    }
}

impl NoiseField for ValueNoise {
    fn sample(&self, point: Point, frequency: f64) -> f64 {
        let p = point * frequency;
        if !p.is_finite() {
            return 0.0;
        }
        self.noise(p.x, p.y)
    }
}
