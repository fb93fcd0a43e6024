//! Metropolis-Hastings algorithm for Causal Dynamical Triangulations.
//!
//! The engine owns the triangulation for the duration of a run. Each pass
//! makes a number of move attempts; each attempt picks a move uniformly from
//! the configured [`MoveSet`], computes a1 · a2 in high precision, and
//! compares it with a uniform trial draw. Accepted moves are executed by the
//! backend and only then committed to the state counts and statistics, so a
//! failed attempt leaves the bookkeeping at its last committed values.

use crate::cdt::acceptance::{
    DEFAULT_PRECISION, acceptance_probability, calculate_a1, calculate_a2, validate_precision,
};
use crate::cdt::action::{ActionConfig, ActionEvaluator, S3BulkAction};
use crate::cdt::ergodic_moves::{MoveSet, MoveStatistics, MoveType};
use crate::cdt::state::StateCounts;
use crate::cdt::triangulation::CdtTriangulation;
use crate::errors::{CdtError, CdtResult, RunStage};
use crate::geometry::traits::{ErgodicBackend, MovableSummary};
use crate::util::{RngSource, UniformSource};
use num_traits::cast::NumCast;
use rand::rngs::{StdRng, ThreadRng};
use std::time::{Duration, Instant};

/// Moves made unconditionally before the first pass.
pub const WARM_UP_MOVES: [MoveType; 3] = [MoveType::TwoThree, MoveType::ThreeTwo, MoveType::TwoSix];

/// How many move attempts make up one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttemptsPerPass {
    /// The current total simplex count, read at the start of each pass
    #[default]
    TotalSimplices,
    /// A fixed number of attempts
    Fixed(u64),
}

impl AttemptsPerPass {
    /// Number of attempts for a pass starting from `counts`.
    #[must_use]
    pub const fn resolve(self, counts: &StateCounts) -> u64 {
        match self {
            Self::TotalSimplices => counts.total_simplices(),
            Self::Fixed(attempts) => attempts,
        }
    }
}

/// Configuration for the Metropolis-Hastings algorithm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetropolisConfig {
    /// Number of passes to perform
    pub passes: u32,
    /// Take a measurement every N passes (0 = never)
    pub output_every_n_passes: u32,
    /// Attempts per pass
    pub attempts_per_pass: AttemptsPerPass,
    /// Moves that may be proposed
    pub moves: MoveSet,
    /// MPFR precision in bits for a1 and a2
    pub precision: u32,
    /// Whether to make the unconditional seeding moves before the first pass
    pub warm_up: bool,
}

impl Default for MetropolisConfig {
    fn default() -> Self {
        Self {
            passes: 100,
            output_every_n_passes: 10,
            attempts_per_pass: AttemptsPerPass::default(),
            moves: MoveSet::default(),
            precision: DEFAULT_PRECISION,
            warm_up: true,
        }
    }
}

impl MetropolisConfig {
    /// Creates a new Metropolis configuration.
    #[must_use]
    pub fn new(passes: u32, output_every_n_passes: u32) -> Self {
        Self {
            passes,
            output_every_n_passes,
            ..Self::default()
        }
    }

    /// Sets the number of attempts per pass.
    #[must_use]
    pub const fn with_attempts_per_pass(mut self, attempts_per_pass: AttemptsPerPass) -> Self {
        self.attempts_per_pass = attempts_per_pass;
        self
    }

    /// Restricts the moves that may be proposed.
    #[must_use]
    pub fn with_moves(mut self, moves: MoveSet) -> Self {
        self.moves = moves;
        self
    }

    /// Sets the MPFR precision in bits.
    #[must_use]
    pub const fn with_precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }

    /// Enables or disables the warm-up moves.
    #[must_use]
    pub const fn with_warm_up(mut self, warm_up: bool) -> Self {
        self.warm_up = warm_up;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CdtError::InvalidParameters`] for zero passes or an empty
    /// move set, and [`CdtError::UnsupportedPrecision`] for a precision MPFR
    /// cannot use.
    pub fn validate(&self) -> CdtResult<()> {
        if self.passes == 0 {
            return Err(CdtError::InvalidParameters(
                "number of passes must be positive".to_string(),
            ));
        }
        if self.moves.is_empty() {
            return Err(CdtError::InvalidParameters(
                "move set must contain at least one move".to_string(),
            ));
        }
        validate_precision(self.precision)
    }

    /// Whether a measurement is due after the zero-based `pass`.
    #[must_use]
    pub const fn is_output_pass(&self, pass: u32) -> bool {
        self.output_every_n_passes != 0 && (pass + 1) % self.output_every_n_passes == 0
    }
}

/// Record of a single move attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct MonteCarloStep {
    /// Where in the run the attempt happened
    pub stage: RunStage,
    /// Move type attempted
    pub move_type: MoveType,
    /// Uniform trial value
    pub trial: f64,
    /// Move-frequency factor
    pub a1: f64,
    /// Action factor
    pub a2: f64,
    /// Whether the move was accepted
    pub accepted: bool,
}

/// Measurement data collected during simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    /// Zero-based pass after which the measurement was taken
    pub pass: u32,
    /// Current action value
    pub action: f64,
    /// State counts at that point
    pub counts: StateCounts,
}

/// Metropolis-Hastings engine.
///
/// `E` evaluates the bulk action and `R` supplies the uniform draws; both
/// default to the production choices.
pub struct Metropolis<B, E = S3BulkAction, R = RngSource<ThreadRng>>
where
    B: ErgodicBackend,
{
    config: MetropolisConfig,
    action_config: ActionConfig,
    evaluator: E,
    rng: R,
    counts: StateCounts,
    statistics: MoveStatistics,
    universe: Option<CdtTriangulation<B>>,
    steps: Vec<MonteCarloStep>,
    measurements: Vec<Measurement>,
    sampled_attempts: u64,
}

impl<B: ErgodicBackend> Metropolis<B> {
    /// Creates an engine drawing from the thread-local generator.
    #[must_use]
    pub fn new(config: MetropolisConfig, action_config: ActionConfig) -> Self {
        Self::with_parts(config, action_config, S3BulkAction, RngSource::thread())
    }
}

impl<B: ErgodicBackend> Metropolis<B, S3BulkAction, RngSource<StdRng>> {
    /// Creates a reproducible engine for a given seed.
    #[must_use]
    pub fn with_seed(config: MetropolisConfig, action_config: ActionConfig, seed: u64) -> Self {
        Self::with_parts(config, action_config, S3BulkAction, RngSource::seeded(seed))
    }
}

impl<B, E, R> Metropolis<B, E, R>
where
    B: ErgodicBackend,
    E: ActionEvaluator,
    R: UniformSource,
{
    /// Creates an engine from its parts.
    pub fn with_parts(
        config: MetropolisConfig,
        action_config: ActionConfig,
        evaluator: E,
        rng: R,
    ) -> Self {
        Self {
            config,
            action_config,
            evaluator,
            rng,
            counts: StateCounts::default(),
            statistics: MoveStatistics::new(),
            universe: None,
            steps: Vec::new(),
            measurements: Vec::new(),
            sampled_attempts: 0,
        }
    }

    /// Runs the configured number of passes.
    ///
    /// Takes ownership of the triangulation and hands it back when the run
    /// completes. On error the triangulation is dropped and the counts and
    /// statistics keep their last committed values.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid parameters, a failing collaborator, a
    /// count underflow or drift. Failures inside a move attempt are wrapped
    /// in [`CdtError::MoveAttempt`] naming the stage and move.
    pub fn run(&mut self, triangulation: CdtTriangulation<B>) -> CdtResult<CdtTriangulation<B>> {
        self.config.validate()?;
        self.action_config.validate()?;

        log::info!(
            "Starting Metropolis run: {} passes, alpha = {}, K = {}, lambda = {}",
            self.config.passes,
            self.action_config.alpha,
            self.action_config.k,
            self.action_config.lambda
        );

        self.initialize(triangulation)?;
        if self.config.warm_up {
            self.warm_up()?;
        }
        for pass in 0..self.config.passes {
            self.run_pass(pass)?;
        }

        log::info!(
            "Run complete: {} attempted, {} successful, {}",
            self.statistics.total_attempted(),
            self.statistics.total_successful(),
            self.counts
        );
        self.universe.take().ok_or(CdtError::MissingTriangulation)
    }

    /// Runs a simulation and bundles everything a caller inspects afterwards.
    ///
    /// # Errors
    ///
    /// See [`Metropolis::run`].
    pub fn run_simulation(
        &mut self,
        triangulation: CdtTriangulation<B>,
    ) -> CdtResult<SimulationResults<B>> {
        let start_time = Instant::now();
        let triangulation = self.run(triangulation)?;
        let elapsed_time = start_time.elapsed();
        log::info!("Simulation completed in {elapsed_time:.2?}");

        Ok(SimulationResults {
            config: self.config.clone(),
            action_config: self.action_config.clone(),
            steps: std::mem::take(&mut self.steps),
            measurements: std::mem::take(&mut self.measurements),
            statistics: self.statistics.clone(),
            counts: self.counts,
            elapsed_time,
            triangulation,
        })
    }

    /// Loads a triangulation and initializes the counts from its
    /// classification. Statistics and history start afresh.
    ///
    /// # Errors
    ///
    /// Returns [`CdtError::Backend`] if classification fails.
    pub fn initialize(&mut self, mut triangulation: CdtTriangulation<B>) -> CdtResult<()> {
        self.counts = triangulation.state_counts()?;
        self.statistics = MoveStatistics::new();
        self.steps.clear();
        self.measurements.clear();
        self.sampled_attempts = 0;

        log::info!(
            "Loaded {} backend: {} cells, {}",
            triangulation.geometry().backend_name(),
            triangulation.cell_count(),
            self.counts
        );
        self.universe = Some(triangulation);
        Ok(())
    }

    /// Applies one (2,3), one (3,2) and one (2,6) move unconditionally.
    ///
    /// Warm-up moves count as successful but not as attempted.
    ///
    /// # Errors
    ///
    /// Returns [`CdtError::MoveAttempt`] with stage `warm-up` if a move
    /// cannot be executed or committed.
    pub fn warm_up(&mut self) -> CdtResult<()> {
        for move_type in WARM_UP_MOVES {
            self.commit(move_type)
                .map_err(|e| e.during(RunStage::WarmUp, move_type))?;
            self.statistics.record_seed(move_type);
            log::debug!("Warm-up {move_type} move applied: {}", self.counts);
        }
        log::info!("Warm-up complete: {}", self.counts);
        Ok(())
    }

    /// Picks a move uniformly from the configured move set.
    ///
    /// # Errors
    ///
    /// Returns [`CdtError::InvalidParameters`] if the move set is empty.
    pub fn select_move(&mut self) -> CdtResult<MoveType> {
        let index = self.rng.next_index(self.config.moves.len());
        self.config.moves.get(index).ok_or_else(|| {
            CdtError::InvalidParameters("move set must contain at least one move".to_string())
        })
    }

    /// Attempts a single move outside of a pass.
    ///
    /// # Errors
    ///
    /// Returns [`CdtError::MoveAttempt`] with stage `standalone attempt`.
    pub fn attempt_move(&mut self, move_type: MoveType) -> CdtResult<MonteCarloStep> {
        self.attempt(move_type, RunStage::Standalone)
    }

    /// Runs one pass of move attempts, then checks that the tracked simplex
    /// total still matches the triangulation.
    ///
    /// # Errors
    ///
    /// Returns the first failing attempt, or [`CdtError::CountDrift`].
    pub fn run_pass(&mut self, pass: u32) -> CdtResult<()> {
        let attempts = self.config.attempts_per_pass.resolve(&self.counts);
        if log::log_enabled!(log::Level::Debug) {
            let movable = self.movable_summary()?;
            log::debug!("Pass {pass}: {attempts} attempts, movable {movable:?}");
        }

        for _ in 0..attempts {
            let move_type = self.select_move()?;
            self.sampled_attempts += 1;
            let stage = RunStage::Pass {
                pass,
                attempt: self.sampled_attempts,
            };
            self.attempt(move_type, stage)?;
        }

        self.check_drift()?;
        if self.config.is_output_pass(pass) {
            self.measure(pass)?;
        }
        Ok(())
    }

    fn attempt(&mut self, move_type: MoveType, stage: RunStage) -> CdtResult<MonteCarloStep> {
        let step = self
            .try_attempt(move_type, stage)
            .map_err(|e| e.during(stage, move_type))?;
        self.steps.push(step.clone());
        Ok(step)
    }

    fn try_attempt(&mut self, move_type: MoveType, stage: RunStage) -> CdtResult<MonteCarloStep> {
        if self.universe.is_none() {
            return Err(CdtError::MissingTriangulation);
        }

        let precision = self.config.precision;
        let pending = self.statistics.with_attempt(move_type);
        let a1 = calculate_a1(move_type, &pending, precision)?;
        let mut a2 = calculate_a2(
            move_type,
            &self.counts,
            &self.action_config,
            &self.evaluator,
            precision,
        )?;
        if !a2.is_zero() && self.counts.after(move_type).is_err() {
            log::warn!("{move_type} move from ({}) would underflow on commit; a2 = 0", self.counts);
            a2 = rug::Float::new(precision);
        }

        let probability = acceptance_probability(&a1, &a2);
        let trial = self.rng.next_probability();
        let accepted = !probability.is_zero() && probability >= trial;

        if accepted {
            self.commit(move_type)?;
            self.statistics = pending;
            self.statistics.record_success(move_type);
        } else {
            self.statistics = pending;
        }

        let step = MonteCarloStep {
            stage,
            move_type,
            trial,
            a1: a1.to_f64(),
            a2: a2.to_f64(),
            accepted,
        };
        log::debug!(
            "{stage}: {move_type} a1 = {:.6}, a2 = {:.6}, trial = {trial:.6} -> {}",
            step.a1,
            step.a2,
            if accepted { "accepted" } else { "rejected" }
        );
        Ok(step)
    }

    /// Executes a move on the triangulation and commits its count effect.
    ///
    /// Counts change only after the backend succeeded.
    fn commit(&mut self, move_type: MoveType) -> CdtResult<()> {
        self.counts.after(move_type)?;
        let universe = self
            .universe
            .take()
            .ok_or(CdtError::MissingTriangulation)?;
        self.universe = Some(universe.apply_move(move_type)?);
        self.counts.apply_move_effect(move_type)
    }

    fn check_drift(&self) -> CdtResult<()> {
        let universe = self
            .universe
            .as_ref()
            .ok_or(CdtError::MissingTriangulation)?;
        let tracked = self.counts.total_simplices();
        let actual = universe.cell_count() as u64;
        if tracked == actual {
            Ok(())
        } else {
            Err(CdtError::CountDrift { tracked, actual })
        }
    }

    fn measure(&mut self, pass: u32) -> CdtResult<()> {
        let action = self
            .evaluator
            .bulk_action(&self.counts, &self.action_config, self.config.precision)?
            .to_f64();
        if let Some(universe) = self.universe.as_mut() {
            universe.record_measurement(pass, action);
        }
        self.measurements.push(Measurement {
            pass,
            action,
            counts: self.counts,
        });
        log::info!(
            "Pass {}/{}: S = {action:.6}, {}, acceptance {:.2}%",
            pass + 1,
            self.config.passes,
            self.counts,
            self.statistics.total_acceptance_rate() * 100.0
        );
        Ok(())
    }

    /// Sizes of the movable sets of the loaded triangulation.
    ///
    /// # Errors
    ///
    /// Returns [`CdtError::MissingTriangulation`] outside a run, or a
    /// classifier failure.
    pub fn movable_summary(&mut self) -> CdtResult<MovableSummary> {
        let universe = self
            .universe
            .as_mut()
            .ok_or(CdtError::MissingTriangulation)?;
        Ok(universe.classification()?.summary())
    }

    /// Run configuration.
    #[must_use]
    pub const fn config(&self) -> &MetropolisConfig {
        &self.config
    }

    /// Action couplings.
    #[must_use]
    pub const fn action_config(&self) -> &ActionConfig {
        &self.action_config
    }

    /// Timelike edge length squared (α).
    #[must_use]
    pub const fn alpha(&self) -> f64 {
        self.action_config.alpha
    }

    /// Gravitational coupling K.
    #[must_use]
    pub const fn k(&self) -> f64 {
        self.action_config.k
    }

    /// Cosmological coupling λ.
    #[must_use]
    pub const fn lambda(&self) -> f64 {
        self.action_config.lambda
    }

    /// Number of passes.
    #[must_use]
    pub const fn passes(&self) -> u32 {
        self.config.passes
    }

    /// Measurement cadence in passes.
    #[must_use]
    pub const fn output_every_n_passes(&self) -> u32 {
        self.config.output_every_n_passes
    }

    /// Current state counts.
    #[must_use]
    pub const fn state_counts(&self) -> StateCounts {
        self.counts
    }

    /// Current number of timelike edges.
    #[must_use]
    pub const fn timelike_edges(&self) -> u64 {
        self.counts.timelike_edges
    }

    /// Current number of (3,1) and (1,3) simplices.
    #[must_use]
    pub const fn three_one_simplices(&self) -> u64 {
        self.counts.three_one_simplices
    }

    /// Current number of (2,2) simplices.
    #[must_use]
    pub const fn two_two_simplices(&self) -> u64 {
        self.counts.two_two_simplices
    }

    /// Current total of top-dimensional simplices.
    #[must_use]
    pub const fn total_simplices(&self) -> u64 {
        self.counts.total_simplices()
    }

    /// Move statistics.
    #[must_use]
    pub const fn statistics(&self) -> &MoveStatistics {
        &self.statistics
    }

    /// Attempted moves of a type.
    #[must_use]
    pub const fn attempted(&self, move_type: MoveType) -> u64 {
        self.statistics.attempted(move_type)
    }

    /// Successful moves of a type, including warm-up moves.
    #[must_use]
    pub const fn successful(&self, move_type: MoveType) -> u64 {
        self.statistics.successful(move_type)
    }

    /// Total attempted moves.
    #[must_use]
    pub fn total_attempted_moves(&self) -> u64 {
        self.statistics.total_attempted()
    }

    /// Attempts recorded so far.
    ///
    /// [`Metropolis::run_simulation`] moves them into its results.
    #[must_use]
    pub fn steps(&self) -> &[MonteCarloStep] {
        &self.steps
    }

    /// Measurements taken so far, moved out like [`Metropolis::steps`].
    #[must_use]
    pub fn measurements(&self) -> &[Measurement] {
        &self.measurements
    }

    /// The triangulation while it is loaded.
    #[must_use]
    pub const fn triangulation(&self) -> Option<&CdtTriangulation<B>> {
        self.universe.as_ref()
    }

    /// Hands back the loaded triangulation, if any.
    pub fn take_triangulation(&mut self) -> Option<CdtTriangulation<B>> {
        self.universe.take()
    }
}

/// Results from a simulation.
#[derive(Debug)]
pub struct SimulationResults<B: ErgodicBackend> {
    /// Configuration used for the simulation
    pub config: MetropolisConfig,
    /// Action configuration used
    pub action_config: ActionConfig,
    /// All move attempts, in order
    pub steps: Vec<MonteCarloStep>,
    /// Measurements taken during simulation
    pub measurements: Vec<Measurement>,
    /// Final move statistics
    pub statistics: MoveStatistics,
    /// Final state counts
    pub counts: StateCounts,
    /// Total simulation time
    pub elapsed_time: Duration,
    /// Final triangulation state
    pub triangulation: CdtTriangulation<B>,
}

impl<B: ErgodicBackend> SimulationResults<B> {
    /// Acceptance rate over sampled attempts; warm-up moves are excluded.
    #[must_use]
    pub fn acceptance_rate(&self) -> f64 {
        self.statistics.total_acceptance_rate()
    }

    /// Calculates the average action over all measurements.
    #[must_use]
    pub fn average_action(&self) -> f64 {
        if self.measurements.is_empty() {
            return 0.0;
        }

        let sum: f64 = self.measurements.iter().map(|m| m.action).sum();
        let count_f64: f64 = NumCast::from(self.measurements.len()).unwrap_or(1.0);

        sum / count_f64
    }

    /// Accepted attempts, in order.
    pub fn accepted_steps(&self) -> impl Iterator<Item = &MonteCarloStep> + '_ {
        self.steps.iter().filter(|step| step.accepted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::backends::mock::MockBackend;
    use crate::util::SequenceSource;
    use approx::assert_relative_eq;
    use rug::Float;

    type FlatAction = fn(&StateCounts, &ActionConfig, u32) -> CdtResult<Float>;

    fn flat_action(_: &StateCounts, _: &ActionConfig, precision: u32) -> CdtResult<Float> {
        Ok(Float::new(precision))
    }

    fn stacked() -> CdtTriangulation<MockBackend> {
        CdtTriangulation::new(MockBackend::stacked(4, 2).expect("stacked mesh"), 4)
    }

    fn scripted(
        config: MetropolisConfig,
        trials: Vec<f64>,
        indices: Vec<usize>,
    ) -> Metropolis<MockBackend, FlatAction, SequenceSource> {
        Metropolis::with_parts(
            config,
            ActionConfig::default(),
            flat_action as FlatAction,
            SequenceSource::new(trials, indices),
        )
    }

    #[test]
    fn test_metropolis_config_defaults() {
        let config = MetropolisConfig::default();
        assert_eq!(config.passes, 100);
        assert_eq!(config.output_every_n_passes, 10);
        assert_eq!(config.attempts_per_pass, AttemptsPerPass::TotalSimplices);
        assert_eq!(config.moves, MoveSet::all());
        assert_eq!(config.precision, DEFAULT_PRECISION);
        assert!(config.warm_up);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_metropolis_config_validation() {
        assert!(MetropolisConfig::new(0, 1).validate().is_err());
        assert!(matches!(
            MetropolisConfig::new(1, 1).with_precision(0).validate(),
            Err(CdtError::UnsupportedPrecision { .. })
        ));
    }

    #[test]
    fn test_output_cadence() {
        let config = MetropolisConfig::new(10, 3);
        assert!(!config.is_output_pass(0));
        assert!(config.is_output_pass(2));
        assert!(config.is_output_pass(5));
        assert!(!MetropolisConfig::new(10, 0).is_output_pass(0));
    }

    #[test]
    fn test_attempts_per_pass_resolution() {
        let counts = StateCounts::new(10, 4, 3);
        assert_eq!(AttemptsPerPass::TotalSimplices.resolve(&counts), 7);
        assert_eq!(AttemptsPerPass::Fixed(10).resolve(&counts), 10);
    }

    #[test]
    fn test_attempt_without_triangulation_reports_stage() {
        let mut engine = scripted(MetropolisConfig::default(), vec![0.0], vec![]);
        let error = engine
            .attempt_move(MoveType::TwoThree)
            .expect_err("nothing loaded");
        assert!(matches!(
            error,
            CdtError::MoveAttempt {
                stage: RunStage::Standalone,
                move_type: MoveType::TwoThree,
                ..
            }
        ));
        assert_eq!(engine.total_attempted_moves(), 0);
    }

    #[test]
    fn test_accepted_two_three_updates_counts_and_statistics() {
        let mut engine = scripted(MetropolisConfig::default(), vec![0.5], vec![]);
        engine.initialize(stacked()).expect("initialize");
        let before = engine.state_counts();

        let step = engine.attempt_move(MoveType::TwoThree).expect("attempt");

        // Only this move has been attempted, so a1 = 1, and a2 = 1 for a flat action
        assert!(step.accepted);
        assert_relative_eq!(step.a1, 1.0);
        assert_relative_eq!(step.a2, 1.0);
        assert_eq!(engine.timelike_edges(), before.timelike_edges + 1);
        assert_eq!(engine.two_two_simplices(), before.two_two_simplices + 1);
        assert_eq!(engine.three_one_simplices(), before.three_one_simplices);
        assert_eq!(engine.successful(MoveType::TwoThree), 1);
        assert_eq!(engine.attempted(MoveType::TwoThree), 1);
    }

    #[test]
    fn test_rejected_attempt_only_counts_attempt() {
        let mut engine = scripted(MetropolisConfig::default(), vec![0.1, 0.9], vec![]);
        engine.initialize(stacked()).expect("initialize");

        engine.attempt_move(MoveType::TwoSix).expect("first attempt");
        let after_first = engine.state_counts();

        // a1 = 1/2 for a second, different move, trial 0.9 rejects it
        let step = engine.attempt_move(MoveType::FourFour).expect("second attempt");
        assert!(!step.accepted);
        assert_relative_eq!(step.a1, 0.5);
        assert_eq!(engine.state_counts(), after_first);
        assert_eq!(engine.attempted(MoveType::FourFour), 1);
        assert_eq!(engine.successful(MoveType::FourFour), 0);
        assert_eq!(engine.steps().len(), 2);
    }

    #[test]
    fn test_zero_weight_move_is_never_accepted() {
        let mut engine = scripted(MetropolisConfig::default(), vec![0.0], vec![]);
        let empty = MockBackend::from_mesh(crate::geometry::mesh::FoliatedMesh::new());
        engine
            .initialize(CdtTriangulation::new(empty, 0))
            .expect("initialize");

        let step = engine.attempt_move(MoveType::ThreeTwo).expect("attempt");
        assert!(!step.accepted);
        assert_relative_eq!(step.a2, 0.0);
        assert_eq!(engine.state_counts(), StateCounts::default());
    }

    #[test]
    fn test_accepted_moves_commit_their_count_effect() {
        for move_type in MoveType::ALL {
            let mut engine = scripted(MetropolisConfig::default(), vec![0.0], vec![]);
            engine.initialize(stacked()).expect("initialize");
            engine.warm_up().expect("warm-up");
            let mut expected = engine.state_counts();

            let step = engine.attempt_move(move_type).expect("attempt");

            assert!(step.accepted, "{move_type} should be accepted");
            expected
                .apply_move_effect(move_type)
                .expect("effect applies");
            assert_eq!(engine.state_counts(), expected, "{move_type} effect");
            let mut triangulation = engine.take_triangulation().expect("loaded");
            assert_eq!(
                triangulation.state_counts().expect("classification"),
                expected
            );
        }
    }

    #[test]
    fn test_run_simulation_moves_history_into_results() {
        let config = MetropolisConfig::new(2, 1).with_attempts_per_pass(AttemptsPerPass::Fixed(4));
        let mut engine: Metropolis<MockBackend, _, _> =
            Metropolis::with_seed(config, ActionConfig::default(), 3);

        let results = engine.run_simulation(stacked()).expect("run");

        assert_eq!(results.steps.len(), 8);
        assert_eq!(results.measurements.len(), 2);
        assert!(engine.steps().is_empty());
        assert!(engine.measurements().is_empty());
        assert_eq!(engine.total_attempted_moves(), 8);
    }

    #[test]
    fn test_run_returns_triangulation_with_consistent_counts() {
        let config = MetropolisConfig::new(3, 1).with_attempts_per_pass(AttemptsPerPass::Fixed(5));
        let mut engine: Metropolis<MockBackend, _, _> =
            Metropolis::with_seed(config, ActionConfig::default(), 7);

        let mut triangulation = engine.run(stacked()).expect("run");
        assert!(engine.triangulation().is_none());
        assert_eq!(
            triangulation.state_counts().expect("classification"),
            engine.state_counts()
        );
        assert_eq!(engine.total_attempted_moves(), 15);
        assert_eq!(engine.measurements().len(), 3);
    }

    #[test]
    fn test_average_action() {
        let measurements = vec![
            Measurement {
                pass: 0,
                action: 1.0,
                counts: StateCounts::default(),
            },
            Measurement {
                pass: 1,
                action: 2.0,
                counts: StateCounts::default(),
            },
        ];

        let results = SimulationResults {
            config: MetropolisConfig::default(),
            action_config: ActionConfig::default(),
            steps: vec![],
            measurements,
            statistics: MoveStatistics::new(),
            counts: StateCounts::default(),
            elapsed_time: Duration::from_millis(100),
            triangulation: stacked(),
        };

        assert_relative_eq!(results.average_action(), 1.5);
        assert_relative_eq!(results.acceptance_rate(), 0.0);
        assert_eq!(results.accepted_steps().count(), 0);
    }
}
