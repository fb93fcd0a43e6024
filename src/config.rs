//! Configuration management for CDT simulations.
//!
//! [`CdtConfig`] is the command-line surface of the `cdt` binary. It
//! converts into the [`MetropolisConfig`] and [`ActionConfig`] the engine
//! consumes.

use crate::cdt::acceptance::DEFAULT_PRECISION;
use crate::cdt::action::{ActionConfig, ActionForm};
use crate::cdt::ergodic_moves::MoveSet;
use crate::cdt::metropolis::{AttemptsPerPass, MetropolisConfig};
use crate::errors::{CdtError, CdtResult};
use clap::Parser;

/// Main configuration structure for CDT simulations.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(author, version, about, long_about = None)]
pub struct CdtConfig {
    /// Approximate number of simplices in the initial triangulation
    #[arg(short = 'n', long, value_parser = clap::value_parser!(u64).range(1..))]
    pub simplices: u64,

    /// Number of timeslices in the foliation
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(3..))]
    pub timeslices: u32,

    /// Squared length of timelike edges (α)
    #[arg(long, default_value = "0.6")]
    pub alpha: f64,

    /// Gravitational coupling K
    #[arg(short = 'k', long = "coupling", default_value = "1.1")]
    pub k: f64,

    /// Cosmological coupling λ
    #[arg(long, default_value = "0.01")]
    pub lambda: f64,

    /// Closed form of the bulk action (fixed-α forms ignore --alpha)
    #[arg(long, value_enum, default_value_t = ActionForm::General)]
    pub action: ActionForm,

    /// Number of passes
    #[arg(long, default_value = "100")]
    pub passes: u32,

    /// Take a measurement every N passes (0 disables measurements)
    #[arg(long = "output-every", default_value = "10")]
    pub output_every_n_passes: u32,

    /// Attempts per pass (defaults to the current number of simplices)
    #[arg(long)]
    pub attempts_per_pass: Option<u64>,

    /// Only propose (2,3), (3,2) and (2,6) moves
    #[arg(long)]
    pub reference_moves: bool,

    /// Precision in bits for acceptance probabilities
    #[arg(long, default_value_t = DEFAULT_PRECISION)]
    pub precision: u32,

    /// Seed for the random number generator (random if omitted)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Skip the unconditional warm-up moves
    #[arg(long)]
    pub skip_warm_up: bool,
}

impl CdtConfig {
    /// Builds a new instance of `CdtConfig` from command line arguments.
    #[must_use]
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Creates a new `CdtConfig` with the given size and default parameters.
    #[must_use]
    pub const fn new(simplices: u64, timeslices: u32) -> Self {
        Self {
            simplices,
            timeslices,
            alpha: 0.6,
            k: 1.1,
            lambda: 0.01,
            action: ActionForm::General,
            passes: 100,
            output_every_n_passes: 10,
            attempts_per_pass: None,
            reference_moves: false,
            precision: DEFAULT_PRECISION,
            seed: None,
            skip_warm_up: false,
        }
    }

    /// Creates a `MetropolisConfig` from this configuration.
    #[must_use]
    pub fn to_metropolis_config(&self) -> MetropolisConfig {
        let attempts_per_pass = self
            .attempts_per_pass
            .map_or(AttemptsPerPass::TotalSimplices, AttemptsPerPass::Fixed);
        let moves = if self.reference_moves {
            MoveSet::reference()
        } else {
            MoveSet::all()
        };

        MetropolisConfig::new(self.passes, self.output_every_n_passes)
            .with_attempts_per_pass(attempts_per_pass)
            .with_moves(moves)
            .with_precision(self.precision)
            .with_warm_up(!self.skip_warm_up)
    }

    /// Creates an `ActionConfig` from this configuration.
    #[must_use]
    pub const fn to_action_config(&self) -> ActionConfig {
        ActionConfig::new(self.alpha, self.k, self.lambda)
    }

    /// Number of prism columns per layer for the initial mock triangulation.
    ///
    /// Each column contributes three simplices per layer.
    #[must_use]
    pub fn columns(&self) -> usize {
        let layers = u64::from(self.timeslices.saturating_sub(1)).max(1);
        let columns = (self.simplices / (3 * layers)).max(1);
        usize::try_from(columns).unwrap_or(usize::MAX)
    }

    /// Validates the configuration parameters.
    ///
    /// # Errors
    ///
    /// Returns [`CdtError::InvalidParameters`] or
    /// [`CdtError::UnsupportedPrecision`] describing the first problem found.
    pub fn validate(&self) -> CdtResult<()> {
        if self.simplices == 0 {
            return Err(CdtError::InvalidParameters(
                "Number of simplices must be positive".to_string(),
            ));
        }

        if self.timeslices < 3 {
            return Err(CdtError::InvalidParameters(
                "Number of timeslices must be at least 3".to_string(),
            ));
        }

        if self.attempts_per_pass == Some(0) {
            return Err(CdtError::InvalidParameters(
                "Attempts per pass must be positive".to_string(),
            ));
        }

        if self.output_every_n_passes > self.passes {
            return Err(CdtError::InvalidParameters(
                "Output cadence cannot be greater than the number of passes".to_string(),
            ));
        }

        self.to_action_config().validate()?;
        self.to_metropolis_config().validate()
    }
}

/// Configuration preset for quick testing.
#[derive(Debug, Clone)]
pub struct TestConfig;

impl TestConfig {
    /// Creates a small, fast configuration suitable for unit tests.
    #[must_use]
    pub const fn small() -> CdtConfig {
        CdtConfig {
            passes: 3,
            output_every_n_passes: 1,
            attempts_per_pass: Some(10),
            seed: Some(42),
            ..CdtConfig::new(18, 3)
        }
    }

    /// Creates a medium-sized configuration for integration tests.
    #[must_use]
    pub const fn medium() -> CdtConfig {
        CdtConfig {
            passes: 10,
            output_every_n_passes: 5,
            seed: Some(7),
            ..CdtConfig::new(72, 5)
        }
    }
}
