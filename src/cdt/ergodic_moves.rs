//! Ergodic moves for foliated 3D Causal Dynamical Triangulations.
//!
//! This module defines the five foliation-preserving Pachner moves and the
//! bookkeeping that goes with them:
//! - (2,3) and (3,2) moves: exchange a timelike edge for a (2,2) simplex
//! - (2,6) and (6,2) moves: insert or remove a vertex in a spacelike triangle
//! - (4,4) moves: flip the four simplices around a spacelike edge

use crate::errors::{CdtError, CdtResult};
use num_traits::cast::NumCast;
use std::fmt;

/// Types of ergodic moves available in 3D CDT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MoveType {
    /// (2,3) move: two simplices sharing a timelike face become three
    TwoThree,
    /// (3,2) move: three simplices around a timelike edge become two
    ThreeTwo,
    /// (2,6) move: add a vertex inside a spacelike triangle
    TwoSix,
    /// (6,2) move: remove a vertex of degree six
    SixTwo,
    /// (4,4) move: re-triangulate the octahedron around a spacelike edge
    FourFour,
}

/// Signed change in the state counts caused by a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CountDelta {
    /// Change in timelike edges
    pub timelike_edges: i64,
    /// Change in (3,1) and (1,3) simplices
    pub three_one_simplices: i64,
    /// Change in (2,2) simplices
    pub two_two_simplices: i64,
}

impl CountDelta {
    /// Creates a new delta.
    #[must_use]
    pub const fn new(
        timelike_edges: i64,
        three_one_simplices: i64,
        two_two_simplices: i64,
    ) -> Self {
        Self {
            timelike_edges,
            three_one_simplices,
            two_two_simplices,
        }
    }
}

impl MoveType {
    /// Number of move types.
    pub const COUNT: usize = 5;

    /// All move types in canonical order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::TwoThree,
        Self::ThreeTwo,
        Self::TwoSix,
        Self::SixTwo,
        Self::FourFour,
    ];

    /// Position of this move in [`MoveType::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::TwoThree => 0,
            Self::ThreeTwo => 1,
            Self::TwoSix => 2,
            Self::SixTwo => 3,
            Self::FourFour => 4,
        }
    }

    /// Conventional `(p,q)` name of the move.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::TwoThree => "(2,3)",
            Self::ThreeTwo => "(3,2)",
            Self::TwoSix => "(2,6)",
            Self::SixTwo => "(6,2)",
            Self::FourFour => "(4,4)",
        }
    }

    /// Count change used to evaluate the action of the proposed state.
    ///
    /// | Move  | timelike | (3,1)+(1,3) | (2,2) |
    /// |-------|----------|-------------|-------|
    /// | (2,3) | -1       | 0           | +1    |
    /// | (3,2) | +1       | 0           | -1    |
    /// | (2,6) | +2       | +4          | 0     |
    /// | (6,2) | -2       | 0           | -4    |
    /// | (4,4) | 0        | 0           | 0     |
    #[must_use]
    pub const fn proposal_delta(self) -> CountDelta {
        match self {
            Self::TwoThree => CountDelta::new(-1, 0, 1),
            Self::ThreeTwo => CountDelta::new(1, 0, -1),
            Self::TwoSix => CountDelta::new(2, 4, 0),
            Self::SixTwo => CountDelta::new(-2, 0, -4),
            Self::FourFour => CountDelta::new(0, 0, 0),
        }
    }

    /// Count change committed once the move has been executed.
    ///
    /// A (2,3) move adds one timelike edge and one (2,2) simplex and the
    /// (3,2) move undoes it, which is where this table departs from
    /// [`MoveType::proposal_delta`]. The (2,6), (6,2) and (4,4) rows agree.
    #[must_use]
    pub const fn commit_delta(self) -> CountDelta {
        match self {
            Self::TwoThree => CountDelta::new(1, 0, 1),
            Self::ThreeTwo => CountDelta::new(-1, 0, -1),
            Self::TwoSix | Self::SixTwo | Self::FourFour => self.proposal_delta(),
        }
    }
}

impl fmt::Display for MoveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One counter per move type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MoveCounts([u64; MoveType::COUNT]);

impl MoveCounts {
    /// Counter for a single move type.
    #[must_use]
    pub const fn get(&self, move_type: MoveType) -> u64 {
        self.0[move_type.index()]
    }

    /// Increments the counter for a move type.
    pub const fn increment(&mut self, move_type: MoveType) {
        self.0[move_type.index()] += 1;
    }

    /// Sum over all move types.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.0.iter().sum()
    }

    /// Iterates `(move, count)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (MoveType, u64)> + '_ {
        MoveType::ALL.iter().map(|&m| (m, self.get(m)))
    }
}

/// Statistics tracking for ergodic moves.
///
/// Counters only ever grow during a run. Successful counts include the
/// warm-up moves, which are also tallied separately so that acceptance rates
/// reflect sampled attempts only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveStatistics {
    attempted: MoveCounts,
    successful: MoveCounts,
    seeded: MoveCounts,
}

impl MoveStatistics {
    /// Creates a new statistics tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an attempted move.
    pub const fn record_attempt(&mut self, move_type: MoveType) {
        self.attempted.increment(move_type);
    }

    /// Records a successful move.
    pub const fn record_success(&mut self, move_type: MoveType) {
        self.successful.increment(move_type);
    }

    /// Records a warm-up move, which succeeds without being attempted.
    pub const fn record_seed(&mut self, move_type: MoveType) {
        self.successful.increment(move_type);
        self.seeded.increment(move_type);
    }

    /// Copy of these statistics with one more attempt of `move_type`.
    #[must_use]
    pub fn with_attempt(&self, move_type: MoveType) -> Self {
        let mut next = self.clone();
        next.record_attempt(move_type);
        next
    }

    /// Attempted moves of the given type.
    #[must_use]
    pub const fn attempted(&self, move_type: MoveType) -> u64 {
        self.attempted.get(move_type)
    }

    /// Successful moves of the given type, including warm-up moves.
    #[must_use]
    pub const fn successful(&self, move_type: MoveType) -> u64 {
        self.successful.get(move_type)
    }

    /// Attempted counters for every move type.
    #[must_use]
    pub const fn attempted_counts(&self) -> &MoveCounts {
        &self.attempted
    }

    /// Successful counters for every move type.
    #[must_use]
    pub const fn successful_counts(&self) -> &MoveCounts {
        &self.successful
    }

    /// Total attempted moves across all types.
    #[must_use]
    pub fn total_attempted(&self) -> u64 {
        self.attempted.total()
    }

    /// Total successful moves across all types, including warm-up moves.
    #[must_use]
    pub fn total_successful(&self) -> u64 {
        self.successful.total()
    }

    /// Calculates acceptance rate for a specific move type.
    #[must_use]
    pub fn acceptance_rate(&self, move_type: MoveType) -> f64 {
        let attempted = self.attempted.get(move_type);
        let accepted = self.successful.get(move_type) - self.seeded.get(move_type);
        ratio(accepted, attempted)
    }

    /// Calculates overall acceptance rate.
    #[must_use]
    pub fn total_acceptance_rate(&self) -> f64 {
        let accepted = self.successful.total() - self.seeded.total();
        ratio(accepted, self.attempted.total())
    }
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    let numerator: f64 = NumCast::from(numerator).unwrap_or(0.0);
    let denominator: f64 = NumCast::from(denominator).unwrap_or(1.0);
    numerator / denominator
}

/// The move types a run may propose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveSet(Vec<MoveType>);

impl MoveSet {
    /// All five moves.
    #[must_use]
    pub fn all() -> Self {
        Self(MoveType::ALL.to_vec())
    }

    /// The (2,3), (3,2) and (2,6) moves only.
    #[must_use]
    pub fn reference() -> Self {
        Self(vec![MoveType::TwoThree, MoveType::ThreeTwo, MoveType::TwoSix])
    }

    /// Builds a move set from any non-empty list, dropping duplicates.
    ///
    /// # Errors
    ///
    /// Returns [`CdtError::InvalidParameters`] if `moves` is empty.
    pub fn new(moves: impl IntoIterator<Item = MoveType>) -> CdtResult<Self> {
        let mut moves: Vec<MoveType> = moves.into_iter().collect();
        moves.sort_unstable();
        moves.dedup();
        if moves.is_empty() {
            return Err(CdtError::InvalidParameters(
                "move set must contain at least one move".to_string(),
            ));
        }
        Ok(Self(moves))
    }

    /// Moves in canonical order.
    #[must_use]
    pub fn as_slice(&self) -> &[MoveType] {
        &self.0
    }

    /// Number of moves in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty (never true for a validated set).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the set contains `move_type`.
    #[must_use]
    pub fn contains(&self, move_type: MoveType) -> bool {
        self.0.contains(&move_type)
    }

    /// Move at a uniformly drawn index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<MoveType> {
        self.0.get(index).copied()
    }
}

impl Default for MoveSet {
    fn default() -> Self {
        Self::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_move_statistics() {
        let mut stats = MoveStatistics::new();

        stats.record_attempt(MoveType::TwoThree);
        stats.record_attempt(MoveType::TwoThree);
        stats.record_success(MoveType::TwoThree);

        assert_eq!(stats.attempted(MoveType::TwoThree), 2);
        assert_eq!(stats.successful(MoveType::TwoThree), 1);
        assert_relative_eq!(stats.acceptance_rate(MoveType::TwoThree), 0.5);
    }

    #[test]
    fn test_seeded_moves_do_not_count_as_attempts() {
        let mut stats = MoveStatistics::new();
        stats.record_seed(MoveType::TwoSix);

        assert_eq!(stats.successful(MoveType::TwoSix), 1);
        assert_eq!(stats.attempted(MoveType::TwoSix), 0);
        assert_eq!(stats.total_attempted(), 0);
        assert_relative_eq!(stats.acceptance_rate(MoveType::TwoSix), 0.0);

        stats.record_attempt(MoveType::TwoSix);
        stats.record_success(MoveType::TwoSix);
        assert_relative_eq!(stats.acceptance_rate(MoveType::TwoSix), 1.0);
    }

    #[test]
    fn test_total_acceptance_rate() {
        let mut stats = MoveStatistics::new();

        stats.record_attempt(MoveType::TwoThree);
        stats.record_success(MoveType::TwoThree);
        stats.record_attempt(MoveType::SixTwo);

        assert_relative_eq!(stats.total_acceptance_rate(), 0.5);
    }

    #[test]
    fn test_with_attempt_leaves_original_untouched() {
        let stats = MoveStatistics::new();
        let pending = stats.with_attempt(MoveType::FourFour);

        assert_eq!(stats.total_attempted(), 0);
        assert_eq!(pending.attempted(MoveType::FourFour), 1);
    }

    #[test]
    fn test_commit_deltas_pair_up() {
        let add = MoveType::TwoThree.commit_delta();
        let remove = MoveType::ThreeTwo.commit_delta();
        assert_eq!(add.timelike_edges + remove.timelike_edges, 0);
        assert_eq!(add.two_two_simplices + remove.two_two_simplices, 0);
        assert_eq!(MoveType::TwoSix.commit_delta(), CountDelta::new(2, 4, 0));
        assert_eq!(MoveType::FourFour.commit_delta(), CountDelta::default());
    }

    #[test]
    fn test_move_set_construction() {
        let set = MoveSet::new([MoveType::SixTwo, MoveType::TwoThree, MoveType::SixTwo])
            .expect("non-empty move set");
        assert_eq!(set.as_slice(), &[MoveType::TwoThree, MoveType::SixTwo]);
        assert!(MoveSet::new([]).is_err());
        assert_eq!(MoveSet::default().len(), MoveType::COUNT);
        assert!(!MoveSet::reference().contains(MoveType::FourFour));
    }

    #[test]
    fn test_index_matches_canonical_order() {
        for (position, move_type) in MoveType::ALL.iter().enumerate() {
            assert_eq!(move_type.index(), position);
        }
    }
}
