//! Acceptance probabilities for the Metropolis-Hastings sampler.
//!
//! A proposed move is accepted with probability a1 · a2, where
//! - a1 = attempted(move) / total attempted, the empirical selection
//!   probability of the move, and
//! - a2 = min(1, exp(S_new - S_current)), the action ratio of the proposed
//!   state to the current one.
//!
//! Both factors are computed with MPFR floats at a caller-chosen precision.

use crate::cdt::action::{ActionConfig, ActionEvaluator};
use crate::cdt::ergodic_moves::{MoveStatistics, MoveType};
use crate::cdt::state::StateCounts;
use crate::errors::{CdtError, CdtResult};
use rug::Float;

/// Default working precision in bits.
pub const DEFAULT_PRECISION: u32 = 256;

/// Checks that `bits` is a precision MPFR can work with.
///
/// # Errors
///
/// Returns [`CdtError::UnsupportedPrecision`] if `bits` is out of range.
pub fn validate_precision(bits: u32) -> CdtResult<()> {
    let min = rug::float::prec_min();
    let max = rug::float::prec_max();
    if (min..=max).contains(&bits) {
        Ok(())
    } else {
        Err(CdtError::UnsupportedPrecision { bits, min, max })
    }
}

/// Calculates a1 = attempted(`move_type`) / total attempted.
///
/// Callers attempting a move pass statistics that already include that
/// attempt, see [`MoveStatistics::with_attempt`].
///
/// # Errors
///
/// Returns [`CdtError::NoAttemptedMoves`] if nothing has been attempted.
pub fn calculate_a1(
    move_type: MoveType,
    statistics: &MoveStatistics,
    precision: u32,
) -> CdtResult<Float> {
    let total = statistics.total_attempted();
    if total == 0 {
        return Err(CdtError::NoAttemptedMoves);
    }

    let this_move = statistics.attempted(move_type);
    let a1 = Float::with_val(precision, this_move) / total;

    log::trace!("{move_type} move: a1 = {this_move}/{total}");
    Ok(a1)
}

/// Calculates a2 = min(1, exp(S_new - S_current)).
///
/// S_current is the action of `counts` and S_new the action of the counts
/// projected through [`MoveType::proposal_delta`]. A (4,4) move leaves every
/// count unchanged, so its a2 is exactly one. A projection that would make a
/// count negative describes a state that cannot exist and gets a2 = 0.
///
/// # Errors
///
/// Returns an error if the evaluator fails or the exponent is not finite.
pub fn calculate_a2<E>(
    move_type: MoveType,
    counts: &StateCounts,
    action_config: &ActionConfig,
    evaluator: &E,
    precision: u32,
) -> CdtResult<Float>
where
    E: ActionEvaluator + ?Sized,
{
    if move_type == MoveType::FourFour {
        return Ok(Float::with_val(precision, 1u32));
    }

    let Some(proposed) = counts.projected(move_type) else {
        log::warn!("{move_type} move from ({counts}) projects a negative count; a2 = 0");
        return Ok(Float::new(precision));
    };

    let current_action = evaluator.bulk_action(counts, action_config, precision)?;
    let new_action = evaluator.bulk_action(&proposed, action_config, precision)?;
    let exponent = new_action - current_action;

    if !exponent.is_finite() {
        return Err(CdtError::Arithmetic(format!(
            "a2 exponent for {move_type} move is not finite: {exponent}"
        )));
    }

    log::trace!("{move_type} move: S_new - S_current = {}", exponent.to_f64());

    if exponent >= 0 {
        Ok(Float::with_val(precision, 1u32))
    } else {
        Ok(exponent.exp())
    }
}

/// Combined acceptance probability a1 · a2.
#[must_use]
pub fn acceptance_probability(a1: &Float, a2: &Float) -> Float {
    a1.clone() * a2
}
