//! Basic example of running the Metropolis sampler
//!
//! This example shows how to:
//! - Build a foliated triangulation on the in-memory backend
//! - Configure the run from a `CdtConfig`
//! - Run the sampler with a fixed seed
//! - Inspect move statistics and measurements

use cdt_metropolis::{CdtConfig, CdtTriangulation, Metropolis, MockBackend, MoveType};
use log::{LevelFilter, info};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .init();

    info!("Starting basic Metropolis example");

    // Configuration parameters
    let config = CdtConfig {
        passes: 20,
        output_every_n_passes: 5,
        seed: Some(2024),
        ..CdtConfig::new(240, 5)
    };
    config.validate()?;

    // Create initial triangulation
    let backend = MockBackend::stacked(config.timeslices, config.columns())?;
    let mut triangulation = CdtTriangulation::new(backend, config.timeslices);
    info!(
        "Initial triangulation: {} vertices, {} edges, {} cells, {}",
        triangulation.vertex_count(),
        triangulation.edge_count(),
        triangulation.cell_count(),
        triangulation.state_counts()?
    );

    // Run the simulation
    let mut engine = Metropolis::with_seed(
        config.to_metropolis_config(),
        config.to_action_config(),
        config.seed.unwrap_or_default(),
    );
    let results = engine.run_simulation(triangulation)?;

    // Display results
    info!("Simulation completed in {:.2?}", results.elapsed_time);
    info!("  Attempts: {}", results.steps.len());
    info!(
        "  Acceptance rate: {:.2}%",
        results.acceptance_rate() * 100.0
    );
    info!("  Average action: {:.3}", results.average_action());

    for move_type in MoveType::ALL {
        info!(
            "  {move_type}: {} attempted, {} successful ({:.2}%)",
            results.statistics.attempted(move_type),
            results.statistics.successful(move_type),
            results.statistics.acceptance_rate(move_type) * 100.0
        );
    }

    // Display measurements
    for measurement in &results.measurements {
        info!(
            "  Pass {}: S = {:.3}, {}",
            measurement.pass + 1,
            measurement.action,
            measurement.counts
        );
    }

    info!(
        "Final triangulation: {} vertices, {} cells after {} moves",
        results.triangulation.vertex_count(),
        results.triangulation.cell_count(),
        results.triangulation.modification_count()
    );
    Ok(())
}
