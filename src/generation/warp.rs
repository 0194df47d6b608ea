//! Noise displacement of cell vertices

use crate::cell::Cell;
use crate::geometry::Point;
use crate::noise::NoiseField;

/// World-space offset between the x and y noise samples
///
/// Sampling the same field twice at one point would move every vertex along
/// the diagonal; the offset decorrelates the two axes.
pub const DECORRELATION_OFFSET: f64 = 10.0;

/// Displaces vertices by `amplitude` times a noise field
///
/// Each vertex `p` moves by `(a * n(p), a * n(p + 10))`. The displacement
/// depends only on the coordinates, so vertices shared by several cells move
/// together. Large amplitudes can fold a polygon onto itself; nothing here
/// repairs that.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexWarper {
    frequency: f64,
    amplitude: f64,
}

impl VertexWarper {
    pub fn new(frequency: f64, amplitude: f64) -> Self {
        Self {
            frequency,
            amplitude,
        }
    }

    #[inline]
    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    /// Offset applied to a vertex at `p`
    pub fn displacement<N: NoiseField + ?Sized>(&self, p: Point, noise: &N) -> Point {
        let shifted = p + Point::splat(DECORRELATION_OFFSET);
        Point::new(
            self.amplitude * noise.sample(p, self.frequency),
            self.amplitude * noise.sample(shifted, self.frequency),
        )
    }

    /// Warp every vertex of a cell, keeping site and vertex ids
    pub fn warp<N: NoiseField + ?Sized>(&self, cell: &Cell, noise: &N) -> Cell {
        if self.amplitude == 0.0 {
            return cell.clone();
        }
        Cell {
            site: cell.site,
            vertices: cell
                .vertices
                .iter()
                .map(|&p| p + self.displacement(p, noise))
                .collect(),
            vertex_ids: cell.vertex_ids.clone(),
            bounded: cell.bounded,
        }
    }
}
