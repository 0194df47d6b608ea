//! Demonstration of warped diagram generation and queries

use warped_voronoi::*;

fn main() -> Result<()> {
    println!("Generating warped diagram...");

    let config = DiagramConfigBuilder::new()
        .sites(200)?
        .region(BoundingRegion::new(0.0, 0.0, 100.0, 60.0)?)
        .frequency(0.08)?
        .amplitude(1.5)?
        .seed("warp-demo")
        .lloyd_iterations(3)?
        .build()?;

    let diagram = WarpedDiagram::generate(config)?;

    println!("Generated {} cells", diagram.cell_count());
    println!("Welded vertices: {}", diagram.vertex_count());
    println!("Adjacencies: {}", diagram.adjacency().len());

    // Area statistics of the clipped tiling
    let areas: Vec<f64> = diagram.clipped_cells().iter().map(Cell::area).collect();
    let total: f64 = areas.iter().sum();
    let smallest = areas.iter().copied().fold(f64::INFINITY, f64::min);
    let largest = areas.iter().copied().fold(0.0, f64::max);
    println!("\nClipped area: {:.3} (region {:.3})", total, diagram.config().region.area());
    println!("Cell areas: min {:.3}, max {:.3}", smallest, largest);

    // How far the noise moved the vertices
    let mut max_shift: f64 = 0.0;
    for (clipped, warped) in diagram.clipped_cells().iter().zip(diagram.cells()) {
        for (a, b) in clipped.vertices.iter().zip(&warped.vertices) {
            max_shift = max_shift.max(a.distance(*b));
        }
    }
    println!("Largest vertex displacement: {:.3}", max_shift);

    // Point location
    let probe = Point::new(50.0, 30.0);
    if let Some(id) = diagram.find_cell_at(probe) {
        println!("\nPoint {:?} is in cell {}", probe, id);
        let neighbors = diagram.get_neighbors(id);
        println!("Cell {} has {} neighbors: {:?}", id, neighbors.len(), neighbors);
    }

    // Re-warp the same layout with a different noise field
    let mut rewarped = diagram.config().clone();
    rewarped.noise_seed = Seed(7);
    rewarped.noise = NoiseConfig {
        kind: NoiseKind::Value,
        octaves: 4,
        ..Default::default()
    };
    let other = build_warped_diagram(&rewarped)?;
    println!(
        "\nRe-warped with value noise: same sites = {}",
        other.sites() == diagram.sites()
    );

    Ok(())
}
