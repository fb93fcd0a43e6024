//! Mock geometry backend for testing.
//!
//! An in-memory foliated complex that implements the classifiers and all
//! five Pachner moves combinatorially. Each move rewrites cells and edges so
//! that the change in classification matches [`MoveType::commit_delta`],
//! which lets the engine's bookkeeping be checked against a real backend
//! without a geometry library.

use crate::cdt::ergodic_moves::{MoveCounts, MoveType};
use crate::geometry::mesh::{FoliatedMesh, MeshError, SimplexKind};
use crate::geometry::traits::{
    EdgeClasses, GeometryBackend, MovableElements, PachnerMoves, SimplexClasses,
    SimplexClassifier, TriangulationQuery,
};

/// Mock backend for testing
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    mesh: FoliatedMesh,
    fail_on: Option<MoveType>,
    executions: MoveCounts,
}

/// Mock cell handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MockCellHandle(pub usize);

/// Mock edge handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MockEdgeHandle(pub usize);

/// Mock backend errors
#[derive(Debug, thiserror::Error)]
pub enum MockError {
    /// Mesh insertion failed
    #[error(transparent)]
    Mesh(#[from] MeshError),

    /// Requested shape cannot be built
    #[error("Invalid shape: {0}")]
    Shape(String),

    /// No supplied element supports the move
    #[error("{move_type} move has nothing to act on: {reason}")]
    NotMovable {
        /// Move that was requested
        move_type: MoveType,
        /// What was missing
        reason: &'static str,
    },

    /// Cell handle no longer exists
    #[error("Stale cell handle: {0}")]
    StaleCell(usize),

    /// Edge handle no longer exists
    #[error("Stale edge handle: {0}")]
    StaleEdge(usize),

    /// Failure requested with [`MockBackend::fail_on`]
    #[error("Injected failure for {0} move")]
    Injected(MoveType),
}

type Movable = MovableElements<MockCellHandle, MockEdgeHandle>;

impl MockBackend {
    /// Create a new, empty mock backend
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing mesh.
    #[must_use]
    pub fn from_mesh(mesh: FoliatedMesh) -> Self {
        Self {
            mesh,
            ..Self::default()
        }
    }

    /// Builds `columns` independent stacks of triangular prisms over
    /// `time_slices` slices.
    ///
    /// Each prism between adjacent slices is split into one (3,1), one (2,2)
    /// and one (1,3) tetrahedron with six timelike edges, so a stack has
    /// `N1_TL = 6L`, `N3_31 = 2L`, `N3_22 = L` for `L = time_slices - 1`.
    ///
    /// # Errors
    /// Returns error if `time_slices < 2` or `columns == 0`
    pub fn stacked(time_slices: u32, columns: usize) -> Result<Self, MockError> {
        if time_slices < 2 || columns == 0 {
            return Err(MockError::Shape(format!(
                "need at least 2 time slices and 1 column, got {time_slices} and {columns}"
            )));
        }

        let mut mesh = FoliatedMesh::new();
        for _ in 0..columns {
            let mut triangles = Vec::with_capacity(time_slices as usize);
            for t in 0..time_slices {
                let triangle = [
                    mesh.add_vertex(t),
                    mesh.add_vertex(t),
                    mesh.add_vertex(t),
                ];
                for i in 0..3 {
                    mesh.add_edge(triangle[i], triangle[(i + 1) % 3])?;
                }
                triangles.push(triangle);
            }

            for layer in triangles.windows(2) {
                let [l0, l1, l2] = layer[0];
                let [u0, u1, u2] = layer[1];
                mesh.add_cell([l0, l1, l2, u0])?;
                mesh.add_cell([l1, l2, u0, u1])?;
                mesh.add_cell([l2, u0, u1, u2])?;
                for (a, b) in [(l0, u0), (l1, u0), (l1, u1), (l2, u0), (l2, u1), (l2, u2)] {
                    mesh.add_edge(a, b)?;
                }
            }
        }

        log::debug!(
            "Built mock triangulation: {columns} column(s), {time_slices} slices, {} cells",
            mesh.cell_count()
        );
        Ok(Self::from_mesh(mesh))
    }

    /// Makes every later execution of `move_type` fail.
    #[must_use]
    pub const fn fail_on(mut self, move_type: MoveType) -> Self {
        self.fail_on = Some(move_type);
        self
    }

    /// Successful executions of `move_type` so far.
    #[must_use]
    pub const fn executions(&self, move_type: MoveType) -> u64 {
        self.executions.get(move_type)
    }

    /// Underlying mesh.
    #[must_use]
    pub const fn mesh(&self) -> &FoliatedMesh {
        &self.mesh
    }

    fn live_cell(&self, handle: MockCellHandle) -> Result<[usize; 4], MockError> {
        self.mesh
            .cell(handle.0)
            .map(|cell| cell.vertex_indices)
            .ok_or(MockError::StaleCell(handle.0))
    }

    fn live_edge(&self, handle: MockEdgeHandle) -> Result<(usize, usize), MockError> {
        self.mesh
            .edge(handle.0)
            .map(|edge| edge.vertex_indices)
            .ok_or(MockError::StaleEdge(handle.0))
    }

    /// Splits a cell into its vertices on the lower and upper slice.
    fn split_by_slice(&self, vertices: [usize; 4]) -> Result<(Vec<usize>, Vec<usize>), MockError> {
        let mut slices = [0; 4];
        for (slice, &vertex) in slices.iter_mut().zip(&vertices) {
            *slice = self.mesh.slice_of(vertex)?;
        }
        let lower_slice = slices.iter().copied().min().unwrap_or_default();
        let (lower, upper): (Vec<_>, Vec<_>) = vertices
            .iter()
            .zip(slices)
            .partition(|&(_, slice)| slice == lower_slice);
        Ok((
            lower.into_iter().map(|(&v, _)| v).collect(),
            upper.into_iter().map(|(&v, _)| v).collect(),
        ))
    }

    /// (2,3): adds a (2,2) cell around a timelike edge, together with a new
    /// timelike edge.
    fn two_three(&mut self, movable: &Movable) -> Result<(), MockError> {
        let not_movable = |reason| MockError::NotMovable {
            move_type: MoveType::TwoThree,
            reason,
        };
        let edge = *movable
            .edges
            .timelike
            .first()
            .ok_or_else(|| not_movable("no timelike edge"))?;
        let (a, b) = self.live_edge(edge)?;
        let (low, high) = if self.mesh.slice_of(a)? < self.mesh.slice_of(b)? {
            (a, b)
        } else {
            (b, a)
        };

        let low_slice = self.mesh.slice_of(low)?;
        let high_slice = self.mesh.slice_of(high)?;
        let low_partner = self
            .mesh
            .vertices_on(low_slice)
            .find(|&v| v != low)
            .ok_or_else(|| not_movable("lower slice has a single vertex"))?;
        let high_partner = self
            .mesh
            .vertices_on(high_slice)
            .find(|&v| v != high)
            .ok_or_else(|| not_movable("upper slice has a single vertex"))?;

        self.mesh.add_cell([low, low_partner, high, high_partner])?;
        self.mesh.add_edge(low_partner, high)?;
        Ok(())
    }

    /// (3,2): removes a timelike edge and a (2,2) cell, preferring a cell
    /// that contains the edge.
    fn three_two(&mut self, movable: &Movable) -> Result<(), MockError> {
        let not_movable = |reason| MockError::NotMovable {
            move_type: MoveType::ThreeTwo,
            reason,
        };
        let first_edge = *movable
            .edges
            .timelike
            .first()
            .ok_or_else(|| not_movable("no timelike edge"))?;
        let first_cell = *movable
            .simplices
            .two_two
            .first()
            .ok_or_else(|| not_movable("no (2,2) simplex"))?;

        let mut chosen = (first_edge, first_cell);
        'search: for &edge in &movable.edges.timelike {
            let (a, b) = self.live_edge(edge)?;
            for &cell in &movable.simplices.two_two {
                let vertices = self.live_cell(cell)?;
                if vertices.contains(&a) && vertices.contains(&b) {
                    chosen = (edge, cell);
                    break 'search;
                }
            }
        }

        let (edge, cell) = chosen;
        self.live_edge(edge)?;
        self.live_cell(cell)?;
        self.mesh.remove_edge(edge.0);
        self.mesh.remove_cell(cell.0);
        Ok(())
    }

    /// (2,6): inserts a vertex into a spacelike triangle shared by a (1,3)
    /// and a (3,1) cell, replacing the pair with six cells.
    fn two_six(&mut self, movable: &Movable) -> Result<(), MockError> {
        let candidates = movable
            .simplices
            .one_three
            .iter()
            .chain(&movable.simplices.three_one);

        for &handle in candidates {
            let vertices = self.live_cell(handle)?;
            let Some((triangle, apex)) = self.spacelike_face(vertices)? else {
                continue;
            };
            let Some((partner, opposite)) = self.partner_across(handle.0, triangle, apex)? else {
                continue;
            };

            let slice = self.mesh.slice_of(triangle[0])?;
            self.mesh.remove_cell(handle.0);
            self.mesh.remove_cell(partner);

            let centre = self.mesh.add_vertex(slice);
            let [a, b, c] = triangle;
            for tip in [apex, opposite] {
                self.mesh.add_cell([centre, a, b, tip])?;
                self.mesh.add_cell([centre, b, c, tip])?;
                self.mesh.add_cell([centre, c, a, tip])?;
                self.mesh.add_edge(centre, tip)?;
            }
            for corner in triangle {
                self.mesh.add_edge(centre, corner)?;
            }
            return Ok(());
        }

        Err(MockError::NotMovable {
            move_type: MoveType::TwoSix,
            reason: "no spacelike triangle shared by a (1,3) and a (3,1) simplex",
        })
    }

    /// Triangle on one slice and the apex on the other, for (3,1)/(1,3) cells.
    fn spacelike_face(
        &self,
        vertices: [usize; 4],
    ) -> Result<Option<([usize; 3], usize)>, MockError> {
        let (lower, upper) = self.split_by_slice(vertices)?;
        let (mut face, apex) = match (lower.as_slice(), upper.as_slice()) {
            (&[a, b, c], &[apex]) | (&[apex], &[a, b, c]) => ([a, b, c], apex),
            _ => return Ok(None),
        };
        face.sort_unstable();
        Ok(Some((face, apex)))
    }

    /// The other cell sharing `triangle`, with its apex on the opposite slice.
    fn partner_across(
        &self,
        cell: usize,
        triangle: [usize; 3],
        apex: usize,
    ) -> Result<Option<(usize, usize)>, MockError> {
        let apex_slice = self.mesh.slice_of(apex)?;
        for (id, other) in self.mesh.cells() {
            if id == cell || other.kind == SimplexKind::TwoTwo {
                continue;
            }
            if !triangle.iter().all(|v| other.vertex_indices.contains(v)) {
                continue;
            }
            let Some(&tip) = other
                .vertex_indices
                .iter()
                .find(|v| !triangle.contains(v))
            else {
                continue;
            };
            if self.mesh.slice_of(tip)? != apex_slice {
                return Ok(Some((id, tip)));
            }
        }
        Ok(None)
    }

    /// (6,2): removes four (2,2) cells and two timelike edges.
    fn six_two(&mut self, movable: &Movable) -> Result<(), MockError> {
        let cells = movable.simplices.two_two.get(..4).ok_or(MockError::NotMovable {
            move_type: MoveType::SixTwo,
            reason: "fewer than four (2,2) simplices",
        })?;
        let edges = movable.edges.timelike.get(..2).ok_or(MockError::NotMovable {
            move_type: MoveType::SixTwo,
            reason: "fewer than two timelike edges",
        })?;

        for &cell in cells {
            self.live_cell(cell)?;
        }
        for &edge in edges {
            self.live_edge(edge)?;
        }
        for &cell in cells {
            self.mesh.remove_cell(cell.0);
        }
        for &edge in edges {
            self.mesh.remove_edge(edge.0);
        }
        Ok(())
    }

    /// (4,4): retriangulates around a spacelike edge without changing counts.
    fn four_four(movable: &Movable) -> Result<(), MockError> {
        if movable.edges.spacelike_count == 0 {
            return Err(MockError::NotMovable {
                move_type: MoveType::FourFour,
                reason: "no spacelike edge",
            });
        }
        Ok(())
    }
}

impl GeometryBackend for MockBackend {
    type CellHandle = MockCellHandle;
    type EdgeHandle = MockEdgeHandle;
    type Error = MockError;

    fn backend_name(&self) -> &'static str {
        "mock"
    }
}

impl TriangulationQuery for MockBackend {
    fn dimension(&self) -> usize {
        3
    }

    fn vertex_count(&self) -> usize {
        self.mesh.vertex_count()
    }

    fn edge_count(&self) -> usize {
        self.mesh.edge_count()
    }

    fn cell_count(&self) -> usize {
        self.mesh.cell_count()
    }

    fn is_valid(&self) -> bool {
        self.mesh.is_consistent()
    }
}

impl SimplexClassifier for MockBackend {
    fn classify_simplices(&self) -> Result<SimplexClasses<Self::CellHandle>, Self::Error> {
        let mut classes = SimplexClasses::default();
        for (id, cell) in self.mesh.cells() {
            let bucket = match cell.kind {
                SimplexKind::ThreeOne => &mut classes.three_one,
                SimplexKind::TwoTwo => &mut classes.two_two,
                SimplexKind::OneThree => &mut classes.one_three,
            };
            bucket.push(MockCellHandle(id));
        }
        Ok(classes)
    }

    fn classify_edges(&self) -> Result<EdgeClasses<Self::EdgeHandle>, Self::Error> {
        let mut classes = EdgeClasses::default();
        for (id, edge) in self.mesh.edges() {
            if edge.is_timelike {
                classes.timelike.push(MockEdgeHandle(id));
            } else {
                classes.spacelike_count += 1;
            }
        }
        Ok(classes)
    }
}

impl PachnerMoves for MockBackend {
    fn execute_move(mut self, move_type: MoveType, movable: &Movable) -> Result<Self, Self::Error> {
        if self.fail_on == Some(move_type) {
            return Err(MockError::Injected(move_type));
        }

        match move_type {
            MoveType::TwoThree => self.two_three(movable)?,
            MoveType::ThreeTwo => self.three_two(movable)?,
            MoveType::TwoSix => self.two_six(movable)?,
            MoveType::SixTwo => self.six_two(movable)?,
            MoveType::FourFour => Self::four_four(movable)?,
        }

        self.executions.increment(move_type);
        log::trace!("Mock backend executed {move_type} move");
        Ok(self)
    }
}
