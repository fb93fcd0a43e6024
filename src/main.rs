//! Causal Dynamical Triangulations binary executable.
//!
//! Runs the Metropolis sampler on an in-memory foliated triangulation.

use cdt_metropolis::{CdtConfig, run};

fn main() {
    // Initialize logging
    env_logger::init();

    let config = CdtConfig::from_args();
    match run(&config) {
        Ok(results) => {
            println!(
                "{} passes, {} attempted, {} accepted ({:.2}%), final {}",
                results.config.passes,
                results.statistics.total_attempted(),
                results.accepted_steps().count(),
                results.acceptance_rate() * 100.0,
                results.counts
            );
            log::info!("CDT simulation completed successfully");
        }
        Err(e) => {
            log::error!("CDT simulation failed: {e}");
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
