//! S3 bulk action for foliated 3D Causal Dynamical Triangulations.
//!
//! The action depends only on three counts of the triangulation:
//! - N1_TL = number of timelike edges
//! - N3_31 = number of (3,1) and (1,3) simplices
//! - N3_22 = number of (2,2) simplices
//!
//! and on the couplings α (squared length of timelike edges), K = 1/(8πG)
//! and λ = KΛ. All arithmetic is done with MPFR floats so that the
//! difference of two large, nearly equal actions keeps its significant
//! digits.

use crate::cdt::state::StateCounts;
use crate::errors::{CdtError, CdtResult};
use rug::Float;
use rug::float::Constant;

/// Configuration for CDT action parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionConfig {
    /// Squared length of timelike edges (α)
    pub alpha: f64,
    /// Gravitational coupling K = 1/(8πG)
    pub k: f64,
    /// Cosmological coupling λ = KΛ
    pub lambda: f64,
}

impl Default for ActionConfig {
    /// Default couplings used for 3D optimisation runs.
    fn default() -> Self {
        Self {
            alpha: 0.6,
            k: 1.1,
            lambda: 0.01,
        }
    }
}

impl ActionConfig {
    /// Creates a new action configuration.
    #[must_use]
    pub const fn new(alpha: f64, k: f64, lambda: f64) -> Self {
        Self { alpha, k, lambda }
    }

    /// Validates the couplings.
    ///
    /// # Errors
    ///
    /// Returns [`CdtError::InvalidParameters`] if any coupling is not finite
    /// or α is not positive.
    pub fn validate(&self) -> CdtResult<()> {
        if !(self.alpha.is_finite() && self.k.is_finite() && self.lambda.is_finite()) {
            return Err(CdtError::InvalidParameters(format!(
                "couplings must be finite (alpha = {}, k = {}, lambda = {})",
                self.alpha, self.k, self.lambda
            )));
        }
        if self.alpha <= 0.0 {
            return Err(CdtError::InvalidParameters(format!(
                "timelike edge length alpha must be positive, got {}",
                self.alpha
            )));
        }
        Ok(())
    }

    /// Calculates the S3 bulk action for the given counts.
    ///
    /// # Errors
    ///
    /// Returns [`CdtError::Arithmetic`] if the result is not finite.
    pub fn calculate_action(&self, counts: &StateCounts, precision: u32) -> CdtResult<Float> {
        s3_bulk_action(counts, self, precision)
    }
}

/// Evaluates the discrete action of a state.
///
/// Both evaluations in an a2 calculation go through the same evaluator at the
/// same precision.
pub trait ActionEvaluator {
    /// Bulk action of `counts` under the couplings in `config`.
    ///
    /// # Errors
    ///
    /// Implementations return an error when the action cannot be evaluated.
    fn bulk_action(
        &self,
        counts: &StateCounts,
        config: &ActionConfig,
        precision: u32,
    ) -> CdtResult<Float>;
}

impl<F> ActionEvaluator for F
where
    F: Fn(&StateCounts, &ActionConfig, u32) -> CdtResult<Float>,
{
    fn bulk_action(
        &self,
        counts: &StateCounts,
        config: &ActionConfig,
        precision: u32,
    ) -> CdtResult<Float> {
        self(counts, config, precision)
    }
}

/// The general-α S3 bulk action, see [`s3_bulk_action`].
#[derive(Debug, Clone, Copy, Default)]
pub struct S3BulkAction;

impl ActionEvaluator for S3BulkAction {
    fn bulk_action(
        &self,
        counts: &StateCounts,
        config: &ActionConfig,
        precision: u32,
    ) -> CdtResult<Float> {
        s3_bulk_action(counts, config, precision)
    }
}

/// Which closed form of the S3 bulk action to evaluate.
///
/// The fixed-α forms read only K and λ from [`ActionConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ActionForm {
    /// General α, see [`s3_bulk_action`]
    #[default]
    General,
    /// α = 1, see [`s3_bulk_action_alpha_one`]
    AlphaOne,
    /// α = -1, see [`s3_bulk_action_alpha_minus_one`]
    AlphaMinusOne,
}

impl ActionEvaluator for ActionForm {
    fn bulk_action(
        &self,
        counts: &StateCounts,
        config: &ActionConfig,
        precision: u32,
    ) -> CdtResult<Float> {
        match self {
            Self::General => s3_bulk_action(counts, config, precision),
            Self::AlphaOne => s3_bulk_action_alpha_one(counts, config.k, config.lambda, precision),
            Self::AlphaMinusOne => {
                s3_bulk_action_alpha_minus_one(counts, config.k, config.lambda, precision)
            }
        }
    }
}

impl std::fmt::Display for ActionForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::General => write!(f, "general alpha"),
            Self::AlphaOne => write!(f, "alpha = 1"),
            Self::AlphaMinusOne => write!(f, "alpha = -1"),
        }
    }
}

/// Calculates the S3 bulk action for general α.
///
/// The formula is:
///
/// S = 2πK√α N1_TL
///   + N3_31 [ -3K asinh(1 / (√3 √(4α+1))) - 3K√α acos((2α+1)/(4α+1)) - λ/12 √(3α+1) ]
///   + N3_22 [ 2K asinh(2√2 √(2α+1) / (4α+1)) - 4K√α acos(-1/(4α+1)) - λ/12 √(4α+2) ]
///
/// At α = 1 the coefficients reduce to those of
/// [`s3_bulk_action_alpha_one`].
///
/// # Errors
///
/// Returns [`CdtError::Arithmetic`] if the result is not finite, for example
/// when α is not positive.
pub fn s3_bulk_action(
    counts: &StateCounts,
    config: &ActionConfig,
    precision: u32,
) -> CdtResult<Float> {
    let p = precision;
    let alpha = Float::with_val(p, config.alpha);
    let k = Float::with_val(p, config.k);
    let lambda = Float::with_val(p, config.lambda);

    let sqrt_alpha = alpha.clone().sqrt();
    let four_alpha_plus_one = alpha.clone() * 4u32 + 1u32;
    let lambda_twelfth = lambda / 12u32;

    // 2πK√α
    let timelike_coefficient = Float::with_val(p, Constant::Pi) * 2u32 * &k * &sqrt_alpha;

    // (3,1) coefficient
    let asinh_31 = Float::with_val(p, 1u32)
        / (Float::with_val(p, 3u32).sqrt() * four_alpha_plus_one.clone().sqrt());
    let acos_31 = (alpha.clone() * 2u32 + 1u32) / &four_alpha_plus_one;
    let three_one_coefficient = -(k.clone() * 3u32 * asinh_31.asinh())
        - k.clone() * 3u32 * &sqrt_alpha * acos_31.acos()
        - lambda_twelfth.clone() * (alpha.clone() * 3u32 + 1u32).sqrt();

    // (2,2) coefficient
    let asinh_22 = Float::with_val(p, 8u32).sqrt() * (alpha.clone() * 2u32 + 1u32).sqrt()
        / &four_alpha_plus_one;
    let acos_22 = Float::with_val(p, -1i32) / four_alpha_plus_one;
    let two_two_coefficient = k.clone() * 2u32 * asinh_22.asinh()
        - k * 4u32 * &sqrt_alpha * acos_22.acos()
        - lambda_twelfth * (alpha * 4u32 + 2u32).sqrt();

    let action = timelike_coefficient * counts.timelike_edges
        + three_one_coefficient * counts.three_one_simplices
        + two_two_coefficient * counts.two_two_simplices;

    finite(action, "S3 bulk action")
}

/// Calculates the S3 bulk action at α = 1.
///
/// S = 2πK N1_TL + N3_31 (-3.548K - 0.167λ) + N3_22 (-5.355K - 0.204λ)
///
/// # Errors
///
/// Returns [`CdtError::Arithmetic`] if the result is not finite.
pub fn s3_bulk_action_alpha_one(
    counts: &StateCounts,
    k: f64,
    lambda: f64,
    precision: u32,
) -> CdtResult<Float> {
    let p = precision;
    let k = Float::with_val(p, k);
    let lambda = Float::with_val(p, lambda);

    let timelike_coefficient = Float::with_val(p, Constant::Pi) * 2u32 * &k;
    let three_one_coefficient =
        Float::with_val(p, -3.548) * &k + Float::with_val(p, -0.167) * &lambda;
    let two_two_coefficient = Float::with_val(p, -5.355) * k + Float::with_val(p, -0.204) * lambda;

    let action = timelike_coefficient * counts.timelike_edges
        + three_one_coefficient * counts.three_one_simplices
        + two_two_coefficient * counts.two_two_simplices;

    finite(action, "S3 bulk action at alpha = 1")
}

/// Calculates the S3 bulk action at α = -1.
///
/// The action is purely imaginary here; the returned value is its
/// coefficient of i, which is the Euclidean dynamically triangulated action:
///
/// S/i = -2πK N1_TL + N3_31 (2.673K + 0.118λ) + N3_22 (7.386K + 0.118λ)
///
/// # Errors
///
/// Returns [`CdtError::Arithmetic`] if the result is not finite.
pub fn s3_bulk_action_alpha_minus_one(
    counts: &StateCounts,
    k: f64,
    lambda: f64,
    precision: u32,
) -> CdtResult<Float> {
    let p = precision;
    let k = Float::with_val(p, k);
    let lambda = Float::with_val(p, lambda);
    let lambda_term = Float::with_val(p, 0.118) * &lambda;

    let timelike_coefficient = -(Float::with_val(p, Constant::Pi) * 2u32 * &k);
    let three_one_coefficient = Float::with_val(p, 2.673) * &k + &lambda_term;
    let two_two_coefficient = Float::with_val(p, 7.386) * k + lambda_term;

    let action = timelike_coefficient * counts.timelike_edges
        + three_one_coefficient * counts.three_one_simplices
        + two_two_coefficient * counts.two_two_simplices;

    finite(action, "S3 bulk action at alpha = -1")
}

fn finite(value: Float, what: &str) -> CdtResult<Float> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CdtError::Arithmetic(format!("{what} is not finite: {value}")))
    }
}
