//! Integer state of a foliated triangulation as seen by the bulk action.

use crate::cdt::ergodic_moves::{CountDelta, MoveType};
use crate::errors::{CdtError, CdtResult};
use std::fmt;

/// Counts of the sub-structures the S3 bulk action depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StateCounts {
    /// Number of timelike edges (N1_TL)
    pub timelike_edges: u64,
    /// Number of (3,1) and (1,3) simplices (N3_31)
    pub three_one_simplices: u64,
    /// Number of (2,2) simplices (N3_22)
    pub two_two_simplices: u64,
}

impl StateCounts {
    /// Creates a new set of counts.
    #[must_use]
    pub const fn new(
        timelike_edges: u64,
        three_one_simplices: u64,
        two_two_simplices: u64,
    ) -> Self {
        Self {
            timelike_edges,
            three_one_simplices,
            two_two_simplices,
        }
    }

    /// Total number of top-dimensional simplices.
    #[must_use]
    pub const fn total_simplices(&self) -> u64 {
        self.three_one_simplices + self.two_two_simplices
    }

    /// Counts after adding `delta`, or `None` if any count would go negative.
    #[must_use]
    pub const fn checked_add(&self, delta: CountDelta) -> Option<Self> {
        let Some(timelike_edges) = self.timelike_edges.checked_add_signed(delta.timelike_edges)
        else {
            return None;
        };
        let Some(three_one_simplices) = self
            .three_one_simplices
            .checked_add_signed(delta.three_one_simplices)
        else {
            return None;
        };
        let Some(two_two_simplices) = self
            .two_two_simplices
            .checked_add_signed(delta.two_two_simplices)
        else {
            return None;
        };
        Some(Self::new(
            timelike_edges,
            three_one_simplices,
            two_two_simplices,
        ))
    }

    /// Counts of the state a move proposes, used only to evaluate its action.
    #[must_use]
    pub const fn projected(&self, move_type: MoveType) -> Option<Self> {
        self.checked_add(move_type.proposal_delta())
    }

    /// Counts after committing `move_type`, without modifying `self`.
    ///
    /// # Errors
    ///
    /// Returns [`CdtError::CountUnderflow`] naming the first counter that
    /// would become negative.
    pub fn after(&self, move_type: MoveType) -> CdtResult<Self> {
        let delta = move_type.commit_delta();
        let underflow = |field| CdtError::CountUnderflow { move_type, field };

        let timelike_edges = self
            .timelike_edges
            .checked_add_signed(delta.timelike_edges)
            .ok_or_else(|| underflow("timelike_edges"))?;
        let three_one_simplices = self
            .three_one_simplices
            .checked_add_signed(delta.three_one_simplices)
            .ok_or_else(|| underflow("three_one_simplices"))?;
        let two_two_simplices = self
            .two_two_simplices
            .checked_add_signed(delta.two_two_simplices)
            .ok_or_else(|| underflow("two_two_simplices"))?;

        Ok(Self::new(
            timelike_edges,
            three_one_simplices,
            two_two_simplices,
        ))
    }

    /// Applies the committed effect of a successful move.
    ///
    /// This is the only place counts change during a run. On error `self`
    /// is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`CdtError::CountUnderflow`] if the move would make a count
    /// negative.
    pub fn apply_move_effect(&mut self, move_type: MoveType) -> CdtResult<()> {
        *self = self.after(move_type)?;
        Ok(())
    }
}

impl fmt::Display for StateCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "N1_TL = {}, N3_31 = {}, N3_22 = {}",
            self.timelike_edges, self.three_one_simplices, self.two_two_simplices
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_simplices() {
        let counts = StateCounts::new(10, 4, 6);
        assert_eq!(counts.total_simplices(), 10);
    }

    #[test]
    fn test_apply_two_three_then_three_two_round_trips() {
        let start = StateCounts::new(5, 8, 3);
        let mut counts = start;

        counts
            .apply_move_effect(MoveType::TwoThree)
            .expect("(2,3) commit");
        assert_eq!(counts, StateCounts::new(6, 8, 4));

        counts
            .apply_move_effect(MoveType::ThreeTwo)
            .expect("(3,2) commit");
        assert_eq!(counts, start);
    }

    #[test]
    fn test_apply_two_six() {
        let mut counts = StateCounts::new(1, 1, 1);
        counts
            .apply_move_effect(MoveType::TwoSix)
            .expect("(2,6) commit");
        assert_eq!(counts, StateCounts::new(3, 5, 1));
    }

    #[test]
    fn test_underflow_leaves_counts_untouched() {
        let mut counts = StateCounts::new(1, 0, 3);
        let error = counts
            .apply_move_effect(MoveType::SixTwo)
            .expect_err("(6,2) needs two timelike edges");

        assert!(matches!(
            error,
            CdtError::CountUnderflow {
                move_type: MoveType::SixTwo,
                field: "timelike_edges"
            }
        ));
        assert_eq!(counts, StateCounts::new(1, 0, 3));
    }

    #[test]
    fn test_projection_uses_proposal_table() {
        let counts = StateCounts::new(4, 4, 4);
        assert_eq!(
            counts.projected(MoveType::TwoThree),
            Some(StateCounts::new(3, 4, 5))
        );
        assert_eq!(
            counts.projected(MoveType::SixTwo),
            Some(StateCounts::new(2, 4, 0))
        );
        assert_eq!(counts.projected(MoveType::FourFour), Some(counts));
        assert_eq!(StateCounts::default().projected(MoveType::ThreeTwo), None);
    }
}
