//! Shared vertex identifiers for the clipped tiling
//!
//! Neighbouring cells compute their common corners independently, so the
//! coordinates can differ in the last bits. Welding snaps every vertex to the
//! first one seen within tolerance and gives both the same [`VertexId`]. The
//! warper then displaces each shared vertex identically and the warped tiling
//! stays watertight.

use super::grid::ProximityGrid;
use crate::cell::{Cell, VertexId};
use crate::geometry::BoundingRegion;

/// Weld tolerance, relative to the region diagonal
const WELD_TOLERANCE: f64 = 1e-9;

/// Assign vertex ids across all cells
///
/// Returns the welded cells and the number of distinct vertices. Cells are
/// visited in order, so ids are stable for a given input. Consecutive
/// vertices that collapse onto one id are merged; a cell left with fewer than
/// three vertices becomes empty.
pub fn weld_vertices(cells: &[Cell], region: &BoundingRegion) -> (Vec<Cell>, usize) {
    let mut grid = ProximityGrid::new(WELD_TOLERANCE * region.diagonal());

    let welded = cells
        .iter()
        .map(|cell| {
            let mut ids: Vec<VertexId> = Vec::with_capacity(cell.vertices.len());
            for &vertex in &cell.vertices {
                let index = match grid.find_within(vertex) {
                    Some(existing) => existing,
                    None => grid.insert(vertex),
                };
                let id = VertexId(index as u32);
                if ids.last() != Some(&id) {
                    ids.push(id);
                }
            }
            while ids.len() > 1 && ids.first() == ids.last() {
                ids.pop();
            }

            if ids.len() < 3 {
                if !cell.is_empty() {
                    log::debug!("Cell {} collapsed while welding", cell.site);
                }
                return Cell::empty(cell.site);
            }

            Cell {
                site: cell.site,
                vertices: ids.iter().map(|id| grid.point(id.0 as usize)).collect(),
                vertex_ids: ids,
                bounded: cell.bounded,
            }
        })
        .collect();

    log::trace!("Welded {} distinct vertices", grid.len());
    (welded, grid.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::SiteId;
    use crate::geometry::Point;

    fn region() -> BoundingRegion {
        BoundingRegion::new(0.0, 0.0, 10.0, 10.0).unwrap()
    }

    #[test]
    fn test_shared_vertices_get_one_id() {
        let left = Cell::new(
            SiteId(0),
            vec![
                Point::new(0.0, 0.0),
                Point::new(5.0, 0.0),
                Point::new(5.0, 10.0),
                Point::new(0.0, 10.0),
            ],
            true,
        );
        let right = Cell::new(
            SiteId(1),
            vec![
                Point::new(5.0 + 1e-14, 0.0),
                Point::new(10.0, 0.0),
                Point::new(10.0, 10.0),
                Point::new(5.0, 10.0 - 1e-14),
            ],
            true,
        );

        let (welded, count) = weld_vertices(&[left, right], &region());
        assert_eq!(count, 6);
        assert_eq!(welded[0].vertex_ids[1], welded[1].vertex_ids[0]);
        assert_eq!(welded[0].vertex_ids[2], welded[1].vertex_ids[3]);
        // Snapped to the first occurrence
        assert_eq!(welded[1].vertices[0], Point::new(5.0, 0.0));
        assert_eq!(welded[1].vertices[3], Point::new(5.0, 10.0));
    }

    #[test]
    fn test_collapsed_vertices_are_merged() {
        let cell = Cell::new(
            SiteId(0),
            vec![
                Point::new(0.0, 0.0),
                Point::new(4.0, 0.0),
                Point::new(4.0, 1e-13),
                Point::new(4.0, 4.0),
            ],
            true,
        );
        let (welded, count) = weld_vertices(&[cell], &region());
        assert_eq!(count, 3);
        assert_eq!(welded[0].vertex_count(), 3);
        assert_eq!(welded[0].vertex_ids.len(), 3);
    }

    #[test]
    fn test_empty_cells_pass_through() {
        let (welded, count) = weld_vertices(&[Cell::empty(SiteId(4))], &region());
        assert_eq!(count, 0);
        assert!(welded[0].is_empty());
        assert_eq!(welded[0].site, SiteId(4));
    }
}
