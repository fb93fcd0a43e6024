//! CDT triangulation wrapper - backend-agnostic.
//!
//! [`CdtTriangulation`] is the exclusively owned handle the Metropolis
//! engine takes in and hands back. It tracks how often the geometry has been
//! modified and caches the classification of movable elements against that
//! count, so classifiers run again only after the geometry actually changed.

use crate::cdt::ergodic_moves::MoveType;
use crate::cdt::state::StateCounts;
use crate::errors::{CdtError, CdtResult};
use crate::geometry::traits::{
    ErgodicBackend, GeometryBackend, MovableElements, PachnerMoves, SimplexClassifier,
    TriangulationQuery,
};
use std::time::Instant;

/// Classification results for a backend.
pub type Movable<B> =
    MovableElements<<B as GeometryBackend>::CellHandle, <B as GeometryBackend>::EdgeHandle>;

/// CDT-specific triangulation wrapper - completely geometry-agnostic
#[derive(Debug)]
pub struct CdtTriangulation<B: ErgodicBackend> {
    geometry: B,
    metadata: CdtMetadata,
    cache: Option<CachedValue<Movable<B>>>,
}

/// CDT-specific metadata
#[derive(Debug, Clone)]
pub struct CdtMetadata {
    /// Number of time slices in the CDT foliation
    pub time_slices: u32,
    /// Dimensionality of the spacetime
    pub dimension: usize,
    /// Time when this triangulation was created
    pub creation_time: Instant,
    /// Time of last modification
    pub last_modified: Instant,
    /// Count of modifications made to the triangulation
    pub modification_count: u64,
    /// History of simulation events
    pub simulation_history: Vec<SimulationEvent>,
}

#[derive(Debug, Clone)]
struct CachedValue<T> {
    value: T,
    modification_count: u64,
}

/// Events in simulation history
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationEvent {
    /// Triangulation was created
    Created {
        /// Initial number of vertices
        vertex_count: usize,
        /// Initial number of top-dimensional cells
        cell_count: usize,
        /// Number of time slices
        time_slices: u32,
    },
    /// An ergodic move was applied to the geometry
    MoveApplied {
        /// Type of move applied
        move_type: MoveType,
        /// Modification count after the move
        modification: u64,
    },
    /// A measurement was taken
    MeasurementTaken {
        /// Pass after which the measurement was taken
        pass: u32,
        /// Action value measured
        action: f64,
    },
}

impl<B: ErgodicBackend> CdtTriangulation<B> {
    /// Create new CDT triangulation
    pub fn new(geometry: B, time_slices: u32) -> Self {
        let creation_event = SimulationEvent::Created {
            vertex_count: geometry.vertex_count(),
            cell_count: geometry.cell_count(),
            time_slices,
        };
        let now = Instant::now();

        Self {
            metadata: CdtMetadata {
                time_slices,
                dimension: geometry.dimension(),
                creation_time: now,
                last_modified: now,
                modification_count: 0,
                simulation_history: vec![creation_event],
            },
            geometry,
            cache: None,
        }
    }

    /// Get immutable reference to underlying geometry
    #[must_use]
    pub const fn geometry(&self) -> &B {
        &self.geometry
    }

    /// Consumes the wrapper and returns the geometry.
    pub fn into_geometry(self) -> B {
        self.geometry
    }

    /// CDT metadata
    #[must_use]
    pub const fn metadata(&self) -> &CdtMetadata {
        &self.metadata
    }

    /// Recorded simulation events, oldest first.
    #[must_use]
    pub fn history(&self) -> &[SimulationEvent] {
        &self.metadata.simulation_history
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.geometry.vertex_count()
    }

    /// Get the number of edges
    pub fn edge_count(&self) -> usize {
        self.geometry.edge_count()
    }

    /// Get the number of top-dimensional cells
    pub fn cell_count(&self) -> usize {
        self.geometry.cell_count()
    }

    /// Get the number of time slices in the CDT foliation
    #[must_use]
    pub const fn time_slices(&self) -> u32 {
        self.metadata.time_slices
    }

    /// Get the dimensionality of the spacetime
    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.metadata.dimension
    }

    /// Number of moves applied since creation.
    #[must_use]
    pub const fn modification_count(&self) -> u64 {
        self.metadata.modification_count
    }

    /// Whether the cached classification matches the current geometry.
    #[must_use]
    pub fn is_classification_fresh(&self) -> bool {
        self.cache
            .as_ref()
            .is_some_and(|cached| cached.modification_count == self.metadata.modification_count)
    }

    fn take_classification(&mut self) -> CdtResult<CachedValue<Movable<B>>> {
        let current = self.metadata.modification_count;
        match self.cache.take() {
            Some(cached) if cached.modification_count == current => Ok(cached),
            _ => {
                let value = self
                    .geometry
                    .classify()
                    .map_err(|e| CdtError::backend("classification", e))?;
                log::trace!(
                    "Classified {} backend at modification {current}",
                    self.geometry.backend_name()
                );
                Ok(CachedValue {
                    value,
                    modification_count: current,
                })
            }
        }
    }

    /// Movable elements of the current geometry, classified at most once per
    /// modification.
    ///
    /// # Errors
    /// Returns [`CdtError::Backend`] if a classifier fails
    pub fn classification(&mut self) -> CdtResult<&Movable<B>> {
        let cached = self.take_classification()?;
        Ok(&self.cache.insert(cached).value)
    }

    /// Counts derived from the current classification.
    ///
    /// # Errors
    /// Returns [`CdtError::Backend`] if a classifier fails
    pub fn state_counts(&mut self) -> CdtResult<StateCounts> {
        Ok(self.classification()?.state_counts())
    }

    /// Applies one Pachner move, consuming and returning the triangulation.
    ///
    /// The executor acts on the current classification; the cache is
    /// invalidated afterwards.
    ///
    /// # Errors
    /// Returns [`CdtError::Backend`] if classification or the executor fails
    pub fn apply_move(mut self, move_type: MoveType) -> CdtResult<Self> {
        let cached = self.take_classification()?;
        let Self {
            geometry,
            mut metadata,
            ..
        } = self;

        let geometry = geometry
            .execute_move(move_type, &cached.value)
            .map_err(|e| CdtError::backend("execute_move", e))?;

        metadata.modification_count += 1;
        metadata.last_modified = Instant::now();
        metadata.simulation_history.push(SimulationEvent::MoveApplied {
            move_type,
            modification: metadata.modification_count,
        });

        Ok(Self {
            geometry,
            metadata,
            cache: None,
        })
    }

    /// Records a measurement in the event history.
    pub fn record_measurement(&mut self, pass: u32, action: f64) {
        self.metadata
            .simulation_history
            .push(SimulationEvent::MeasurementTaken { pass, action });
    }

    /// Validate CDT properties
    ///
    /// # Errors
    /// Returns error if the geometry is invalid or its cells are not all
    /// classified
    pub fn validate_cdt_properties(&mut self) -> CdtResult<()> {
        if !self.geometry.is_valid() {
            return Err(CdtError::InvalidParameters(
                "Invalid geometry: triangulation is not a valid foliated complex".to_string(),
            ));
        }

        let classified = self.state_counts()?.total_simplices();
        let actual = self.cell_count() as u64;
        if classified != actual {
            return Err(CdtError::CountDrift {
                tracked: classified,
                actual,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::backends::mock::MockBackend;

    fn stacked() -> CdtTriangulation<MockBackend> {
        CdtTriangulation::new(MockBackend::stacked(3, 1).expect("stacked mesh"), 3)
    }

    #[test]
    fn test_new_records_creation() {
        let triangulation = stacked();
        assert_eq!(triangulation.dimension(), 3);
        assert_eq!(triangulation.time_slices(), 3);
        assert_eq!(triangulation.modification_count(), 0);
        assert_eq!(
            triangulation.history(),
            &[SimulationEvent::Created {
                vertex_count: 9,
                cell_count: 6,
                time_slices: 3,
            }]
        );
    }

    #[test]
    fn test_classification_is_cached_until_modified() {
        let mut triangulation = stacked();
        assert!(!triangulation.is_classification_fresh());

        let counts = triangulation.state_counts().expect("classification");
        assert_eq!(counts, StateCounts::new(12, 4, 2));
        assert!(triangulation.is_classification_fresh());

        let mut triangulation = triangulation
            .apply_move(MoveType::TwoThree)
            .expect("(2,3) move");
        assert!(!triangulation.is_classification_fresh());
        assert_eq!(triangulation.modification_count(), 1);
        assert_eq!(
            triangulation.state_counts().expect("classification"),
            StateCounts::new(13, 4, 3)
        );
    }

    #[test]
    fn test_apply_move_records_history() {
        let triangulation = stacked()
            .apply_move(MoveType::TwoSix)
            .expect("(2,6) move");
        assert!(matches!(
            triangulation.history().last(),
            Some(SimulationEvent::MoveApplied {
                move_type: MoveType::TwoSix,
                modification: 1
            })
        ));
        assert_eq!(triangulation.geometry().executions(MoveType::TwoSix), 1);
    }

    #[test]
    fn test_executor_failure_is_backend_error() {
        let triangulation = CdtTriangulation::new(
            MockBackend::stacked(3, 1)
                .expect("stacked mesh")
                .fail_on(MoveType::ThreeTwo),
            3,
        );
        let error = triangulation
            .apply_move(MoveType::ThreeTwo)
            .expect_err("injected failure");
        assert!(matches!(
            error,
            CdtError::Backend {
                operation: "execute_move",
                ..
            }
        ));
    }

    #[test]
    fn test_validate_cdt_properties() {
        let mut triangulation = stacked();
        assert!(triangulation.validate_cdt_properties().is_ok());
        triangulation.record_measurement(0, 1.5);
        assert_eq!(triangulation.history().len(), 2);
    }
}
