#![allow(clippy::multiple_crate_versions)]
#![warn(missing_docs)]

//! Metropolis-Hastings sampling for 3D Causal Dynamical Triangulations.
//!
//! The engine drives a foliated triangulation through a Markov chain of
//! foliation-preserving Pachner moves, accepting each proposal with
//! probability a1 · a2 computed in arbitrary precision.
//!
//! # Key Features
//!
//! - (2,3), (3,2), (2,6), (6,2) and (4,4) moves behind backend traits
//! - S3 bulk action for general α, evaluated with MPFR
//! - Per-move attempted and successful counters, acceptance rates
//! - Pass-boundary checks that tracked counts match the triangulation
//! - Reproducible runs from a seed
//!
//! # Example
//!
//! ```rust
//! use cdt_metropolis::{
//!     ActionConfig, CdtTriangulation, Metropolis, MetropolisConfig, MockBackend,
//! };
//!
//! let backend = MockBackend::stacked(4, 2).expect("valid shape");
//! let triangulation = CdtTriangulation::new(backend, 4);
//!
//! let mut engine = Metropolis::with_seed(MetropolisConfig::new(2, 1), ActionConfig::default(), 1);
//! let triangulation = engine.run(triangulation).expect("run completes");
//!
//! assert_eq!(engine.measurements().len(), 2);
//! assert_eq!(triangulation.cell_count() as u64, engine.total_simplices());
//! ```

// Module declarations (avoiding mod.rs files)
/// Error types for the CDT library.
pub mod errors;

/// Sources of uniform randomness.
pub mod util;

/// Command-line configuration.
pub mod config;

/// Geometry abstraction layer for CDT simulations.
///
/// The Monte Carlo core sees triangulations only through these traits.
pub mod geometry {
    /// Foliated mesh data structures.
    pub mod mesh;
    /// Core geometry traits for CDT abstraction.
    pub mod traits;

    /// Geometry backend implementations.
    pub mod backends {
        /// In-memory foliated backend for tests, demos and the binary.
        pub mod mock;
    }
}

/// Causal Dynamical Triangulations implementation modules.
pub mod cdt {
    /// High-precision acceptance probabilities.
    pub mod acceptance;
    /// Action calculation for CDT simulations.
    pub mod action;
    /// Ergodic moves and move statistics.
    pub mod ergodic_moves;
    /// Metropolis-Hastings algorithm implementation.
    pub mod metropolis;
    /// Simplex and edge counts tracked by the engine.
    pub mod state;
    /// CDT triangulation wrapper.
    pub mod triangulation;
}

// Re-exports for convenience
pub use cdt::acceptance::{
    DEFAULT_PRECISION, acceptance_probability, calculate_a1, calculate_a2,
};
pub use cdt::action::{ActionConfig, ActionEvaluator, ActionForm, S3BulkAction, s3_bulk_action};
pub use cdt::ergodic_moves::{MoveSet, MoveStatistics, MoveType};
pub use cdt::metropolis::{
    AttemptsPerPass, Measurement, Metropolis, MetropolisConfig, MonteCarloStep, SimulationResults,
};
pub use cdt::state::StateCounts;
pub use cdt::triangulation::CdtTriangulation;
pub use config::CdtConfig;
pub use errors::{CdtError, CdtResult, RunStage};
pub use geometry::backends::mock::MockBackend;
pub use util::{RngSource, SequenceSource, UniformSource};

/// Runs a simulation on a stacked [`MockBackend`] sized from `config`.
///
/// The generator is always seeded; without `--seed` a seed is drawn and
/// logged so the run can be repeated.
///
/// # Errors
///
/// Returns [`CdtError::InvalidParameters`] for an invalid configuration,
/// [`CdtError::Backend`] if the initial triangulation cannot be built, and
/// any error raised during the run.
pub fn run(config: &CdtConfig) -> CdtResult<SimulationResults<MockBackend>> {
    config.validate()?;

    let seed = config.seed.unwrap_or_else(rand::random);
    let columns = config.columns();
    log::info!("Seed: {seed}");
    log::info!("Number of timeslices: {}", config.timeslices);
    log::info!("Columns per layer: {columns}");
    log::info!("Action: {}", config.action);

    let backend = MockBackend::stacked(config.timeslices, columns)
        .map_err(|e| CdtError::backend("initial triangulation", e))?;
    let triangulation = CdtTriangulation::new(backend, config.timeslices);

    let mut engine = Metropolis::with_parts(
        config.to_metropolis_config(),
        config.to_action_config(),
        config.action,
        RngSource::seeded(seed),
    );
    let results = engine.run_simulation(triangulation)?;

    log::info!("Simulation Results:");
    log::info!(
        "  Acceptance rate: {:.2}%",
        results.acceptance_rate() * 100.0
    );
    log::info!("  Average action: {:.3}", results.average_action());
    log::info!("  Final counts: {}", results.counts);

    Ok(results)
}

#[cfg(test)]
mod lib_tests {
    use super::*;
    use crate::cdt::action::s3_bulk_action_alpha_one;
    use crate::config::TestConfig;

    #[test]
    fn test_run() {
        let config = TestConfig::small();
        let results = run(&config).expect("Failed to run simulation");
        assert_eq!(results.measurements.len(), 3);
        assert_eq!(results.statistics.total_attempted(), 30);
        assert_eq!(
            results.triangulation.cell_count() as u64,
            results.counts.total_simplices()
        );
    }

    #[test]
    fn test_run_is_reproducible_with_seed() {
        let config = TestConfig::small();
        let first = run(&config).expect("first run");
        let second = run(&config).expect("second run");
        assert_eq!(first.steps, second.steps);
        assert_eq!(first.counts, second.counts);
    }

    #[test]
    fn test_run_with_alpha_one_action() {
        let config = CdtConfig {
            action: ActionForm::AlphaOne,
            ..TestConfig::small()
        };
        let results = run(&config).expect("alpha = 1 run");
        let expected = results
            .measurements
            .iter()
            .map(|m| {
                s3_bulk_action_alpha_one(&m.counts, config.k, config.lambda, config.precision)
                    .expect("finite action")
                    .to_f64()
            })
            .collect::<Vec<_>>();
        let actual = results.measurements.iter().map(|m| m.action).collect::<Vec<_>>();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_run_rejects_invalid_config() {
        let config = CdtConfig {
            passes: 0,
            output_every_n_passes: 0,
            ..TestConfig::small()
        };
        assert!(matches!(run(&config), Err(CdtError::InvalidParameters(_))));
    }
}
