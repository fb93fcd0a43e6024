//! Foliated mesh data structures.
//!
//! Every vertex carries the time slice it lives on. Edges and cells are
//! classified purely from the slices of their vertices, so the mesh needs no
//! coordinates.

use std::collections::BTreeMap;
use std::fmt;

/// Foliation type of a top-dimensional cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimplexKind {
    /// Three vertices on the lower slice
    ThreeOne,
    /// Two vertices on each slice
    TwoTwo,
    /// Three vertices on the upper slice
    OneThree,
}

impl SimplexKind {
    /// Classifies a tetrahedron from the time slices of its vertices.
    ///
    /// Returns `None` if the vertices do not span exactly two adjacent slices.
    #[must_use]
    pub fn classify(slices: [u32; 4]) -> Option<Self> {
        let lower = *slices.iter().min()?;
        let upper = *slices.iter().max()?;
        if upper.checked_sub(lower) != Some(1) {
            return None;
        }
        match slices.iter().filter(|&&slice| slice == lower).count() {
            3 => Some(Self::ThreeOne),
            2 => Some(Self::TwoTwo),
            1 => Some(Self::OneThree),
            _ => None,
        }
    }
}

impl fmt::Display for SimplexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ThreeOne => "(3,1)",
            Self::TwoTwo => "(2,2)",
            Self::OneThree => "(1,3)",
        };
        f.write_str(name)
    }
}

/// A vertex in the mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vertex {
    /// Time slice the vertex lives on
    pub time_slice: u32,
}

/// An edge in the mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    /// Ids of the two vertices forming this edge
    pub vertex_indices: (usize, usize),
    /// Whether this edge is timelike (connects different time slices)
    pub is_timelike: bool,
}

/// A tetrahedron in the mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    /// Ids of the four vertices
    pub vertex_indices: [usize; 4],
    /// Foliation type, fixed when the cell is inserted
    pub kind: SimplexKind,
}

/// Reasons a mesh insertion is refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MeshError {
    /// A referenced vertex does not exist
    #[error("Unknown vertex: {0}")]
    UnknownVertex(usize),

    /// Edge endpoints must be distinct and on equal or adjacent slices
    #[error("Edge ({0}, {1}) does not respect the foliation")]
    NonCausalEdge(usize, usize),

    /// Cell vertices must span two adjacent slices
    #[error("Cell {0:?} does not span two adjacent time slices")]
    NonCausalCell([usize; 4]),
}

/// Foliated mesh keyed by stable ids.
///
/// Ids are never reused, so a handle to a removed element stays invalid.
#[derive(Debug, Clone, Default)]
pub struct FoliatedMesh {
    vertices: BTreeMap<usize, Vertex>,
    edges: BTreeMap<usize, Edge>,
    cells: BTreeMap<usize, Cell>,
    next_id: usize,
}

impl FoliatedMesh {
    /// Create a new empty mesh
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn fresh_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Adds a vertex on `time_slice` and returns its id.
    pub fn add_vertex(&mut self, time_slice: u32) -> usize {
        let id = self.fresh_id();
        self.vertices.insert(id, Vertex { time_slice });
        id
    }

    /// Time slice of a vertex.
    ///
    /// # Errors
    /// Returns error if the vertex does not exist
    pub fn slice_of(&self, vertex: usize) -> Result<u32, MeshError> {
        self.vertices
            .get(&vertex)
            .map(|v| v.time_slice)
            .ok_or(MeshError::UnknownVertex(vertex))
    }

    /// Ids of the vertices on `time_slice`, in id order.
    pub fn vertices_on(&self, time_slice: u32) -> impl Iterator<Item = usize> + '_ {
        self.vertices
            .iter()
            .filter(move |(_, vertex)| vertex.time_slice == time_slice)
            .map(|(&id, _)| id)
    }

    /// Adds an edge and returns its id.
    ///
    /// # Errors
    /// Returns error if an endpoint is missing or the edge skips a slice
    pub fn add_edge(&mut self, a: usize, b: usize) -> Result<usize, MeshError> {
        let (slice_a, slice_b) = (self.slice_of(a)?, self.slice_of(b)?);
        if a == b || slice_a.abs_diff(slice_b) > 1 {
            return Err(MeshError::NonCausalEdge(a, b));
        }
        let id = self.fresh_id();
        self.edges.insert(
            id,
            Edge {
                vertex_indices: (a, b),
                is_timelike: slice_a != slice_b,
            },
        );
        Ok(id)
    }

    /// Adds a tetrahedron and returns its id.
    ///
    /// # Errors
    /// Returns error if a vertex is missing or the cell is not causal
    pub fn add_cell(&mut self, vertex_indices: [usize; 4]) -> Result<usize, MeshError> {
        let mut slices = [0; 4];
        for (slice, &vertex) in slices.iter_mut().zip(&vertex_indices) {
            *slice = self.slice_of(vertex)?;
        }
        let kind = SimplexKind::classify(slices).ok_or(MeshError::NonCausalCell(vertex_indices))?;
        let id = self.fresh_id();
        self.cells.insert(
            id,
            Cell {
                vertex_indices,
                kind,
            },
        );
        Ok(id)
    }

    /// Removes an edge, returning it if it existed.
    pub fn remove_edge(&mut self, id: usize) -> Option<Edge> {
        self.edges.remove(&id)
    }

    /// Removes a cell, returning it if it existed.
    pub fn remove_cell(&mut self, id: usize) -> Option<Cell> {
        self.cells.remove(&id)
    }

    /// Looks up an edge.
    #[must_use]
    pub fn edge(&self, id: usize) -> Option<&Edge> {
        self.edges.get(&id)
    }

    /// Looks up a cell.
    #[must_use]
    pub fn cell(&self, id: usize) -> Option<&Cell> {
        self.cells.get(&id)
    }

    /// Cells in id order.
    pub fn cells(&self) -> impl Iterator<Item = (usize, &Cell)> + '_ {
        self.cells.iter().map(|(&id, cell)| (id, cell))
    }

    /// Edges in id order.
    pub fn edges(&self) -> impl Iterator<Item = (usize, &Edge)> + '_ {
        self.edges.iter().map(|(&id, edge)| (id, edge))
    }

    /// Get the number of vertices
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of edges
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Get the number of cells
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Checks that every edge and cell references live vertices and that
    /// each stored cell kind still matches its vertices' slices.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let edges_ok = self.edges.values().all(|edge| {
            let (a, b) = edge.vertex_indices;
            matches!(
                (self.slice_of(a), self.slice_of(b)),
                (Ok(sa), Ok(sb)) if (sa != sb) == edge.is_timelike
            )
        });
        let cells_ok = self.cells.values().all(|cell| {
            let mut slices = [0; 4];
            for (slice, &vertex) in slices.iter_mut().zip(&cell.vertex_indices) {
                match self.slice_of(vertex) {
                    Ok(s) => *slice = s,
                    Err(_) => return false,
                }
            }
            SimplexKind::classify(slices) == Some(cell.kind)
        });
        edges_ok && cells_ok
    }
}
