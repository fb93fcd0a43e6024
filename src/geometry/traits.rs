//! Core geometry traits for CDT abstraction.
//!
//! The Metropolis engine never touches triangulation storage directly. It
//! sees a backend only through these traits: read-only counts, the
//! classifiers that partition cells and edges by foliation type, and the
//! consuming Pachner-move executors.

use crate::cdt::ergodic_moves::MoveType;
use crate::cdt::state::StateCounts;
use std::hash::Hash;

/// Handle types for geometry entities - opaque to the CDT layer
pub trait GeometryHandle: Clone + Eq + Hash + std::fmt::Debug {}

impl<T> GeometryHandle for T where T: Clone + Eq + Hash + std::fmt::Debug {}

/// Core geometry backend trait.
pub trait GeometryBackend {
    /// Opaque handle type for top-dimensional cells
    type CellHandle: GeometryHandle;
    /// Opaque handle type for edges
    type EdgeHandle: GeometryHandle;
    /// Error type for backend operations
    type Error: std::error::Error + Send + Sync + 'static;

    /// Backend identifier for debugging
    fn backend_name(&self) -> &'static str;
}

/// Read-only triangulation operations
pub trait TriangulationQuery: GeometryBackend {
    /// Dimensionality of the triangulation
    fn dimension(&self) -> usize;

    /// Number of vertices
    fn vertex_count(&self) -> usize;

    /// Number of edges
    fn edge_count(&self) -> usize;

    /// Number of top-dimensional cells
    fn cell_count(&self) -> usize;

    /// Check if the triangulation is valid
    fn is_valid(&self) -> bool;
}

/// Cells partitioned by how their vertices sit on adjacent time slices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimplexClasses<C> {
    /// Three vertices on the lower slice, one on the upper
    pub three_one: Vec<C>,
    /// Two vertices on each slice
    pub two_two: Vec<C>,
    /// One vertex on the lower slice, three on the upper
    pub one_three: Vec<C>,
}

impl<C> Default for SimplexClasses<C> {
    fn default() -> Self {
        Self {
            three_one: Vec::new(),
            two_two: Vec::new(),
            one_three: Vec::new(),
        }
    }
}

/// Edges partitioned into timelike handles and a spacelike count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeClasses<E> {
    /// Edges joining adjacent time slices
    pub timelike: Vec<E>,
    /// Edges lying within a single time slice
    pub spacelike_count: usize,
}

impl<E> Default for EdgeClasses<E> {
    fn default() -> Self {
        Self {
            timelike: Vec::new(),
            spacelike_count: 0,
        }
    }
}

/// Everything the move executors may act on, from one classification pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovableElements<C, E> {
    /// Classified cells
    pub simplices: SimplexClasses<C>,
    /// Classified edges
    pub edges: EdgeClasses<E>,
}

impl<C, E> Default for MovableElements<C, E> {
    fn default() -> Self {
        Self {
            simplices: SimplexClasses::default(),
            edges: EdgeClasses::default(),
        }
    }
}

impl<C, E> MovableElements<C, E> {
    /// Counts the bulk action depends on.
    ///
    /// (3,1) and (1,3) cells are counted together.
    #[must_use]
    pub fn state_counts(&self) -> StateCounts {
        StateCounts::new(
            self.edges.timelike.len() as u64,
            (self.simplices.three_one.len() + self.simplices.one_three.len()) as u64,
            self.simplices.two_two.len() as u64,
        )
    }

    /// Sizes of each movable set.
    #[must_use]
    pub fn summary(&self) -> MovableSummary {
        MovableSummary {
            three_one: self.simplices.three_one.len(),
            two_two: self.simplices.two_two.len(),
            one_three: self.simplices.one_three.len(),
            timelike_edges: self.edges.timelike.len(),
            spacelike_edges: self.edges.spacelike_count,
        }
    }
}

/// Sizes of the movable sets, for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MovableSummary {
    /// Movable (3,1) simplices
    pub three_one: usize,
    /// Movable (2,2) simplices
    pub two_two: usize,
    /// Movable (1,3) simplices
    pub one_three: usize,
    /// Movable timelike edges
    pub timelike_edges: usize,
    /// Spacelike edges
    pub spacelike_edges: usize,
}

/// Classifiers that scan the triangulation.
pub trait SimplexClassifier: GeometryBackend {
    /// Partitions the top-dimensional cells into (3,1), (2,2) and (1,3).
    ///
    /// # Errors
    /// Returns error if a cell does not span two adjacent time slices
    fn classify_simplices(&self) -> Result<SimplexClasses<Self::CellHandle>, Self::Error>;

    /// Collects timelike edges and counts spacelike ones.
    ///
    /// # Errors
    /// Returns error if an edge references a missing vertex
    fn classify_edges(&self) -> Result<EdgeClasses<Self::EdgeHandle>, Self::Error>;

    /// Runs both classifiers.
    ///
    /// # Errors
    /// Returns the first classifier error
    #[allow(clippy::type_complexity)]
    fn classify(
        &self,
    ) -> Result<MovableElements<Self::CellHandle, Self::EdgeHandle>, Self::Error> {
        Ok(MovableElements {
            simplices: self.classify_simplices()?,
            edges: self.classify_edges()?,
        })
    }
}

/// Executors for the foliation-preserving Pachner moves.
pub trait PachnerMoves: GeometryBackend + Sized {
    /// Rewrites the triangulation with one move, taking and returning ownership.
    ///
    /// Executors only change geometry; move statistics belong to the caller.
    ///
    /// # Errors
    /// Returns error if no element in `movable` supports the move or a
    /// supplied handle no longer exists
    fn execute_move(
        self,
        move_type: MoveType,
        movable: &MovableElements<Self::CellHandle, Self::EdgeHandle>,
    ) -> Result<Self, Self::Error>;
}

/// Everything the Metropolis engine needs from a backend.
pub trait ErgodicBackend: TriangulationQuery + SimplexClassifier + PachnerMoves {}

impl<T> ErgodicBackend for T where T: TriangulationQuery + SimplexClassifier + PachnerMoves {}
