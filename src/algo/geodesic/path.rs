//! Vertex-to-vertex path queries.
//!
//! A path query picks a search strategy through [`PathAlgorithm`] and always
//! answers with a [`MeshPath`]: the vertex sequence, the half-edges joining
//! consecutive vertices and the total length. Invalid or unreachable queries
//! answer with an empty path instead of an error.

use std::fmt;

use log::{debug, warn};

use crate::error::MeshError;
use crate::mesh::{EdgeId, EdgeIndex, HalfEdgeId, HalfEdgeMesh, MeshIndex, VertexId};

use super::{astar_path_within, dijkstra_path_within};

/// A search strategy answering single source/target queries.
///
/// Implement this to plug another search into [`shortest_path_with`].
pub trait PathSearch {
    /// Vertex path from `source` to `target` and its length, or `None` when
    /// there is none.
    fn find_path<I: MeshIndex>(
        &self,
        mesh: &HalfEdgeMesh<I>,
        source: VertexId<I>,
        target: VertexId<I>,
    ) -> Option<(Vec<VertexId<I>>, f64)>;
}

/// Built-in search strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PathAlgorithm {
    /// Dijkstra with early exit at the target.
    #[default]
    Dijkstra,
    /// A* with the straight-line distance heuristic.
    AStar,
}

impl fmt::Display for PathAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathAlgorithm::Dijkstra => f.write_str("dijkstra"),
            PathAlgorithm::AStar => f.write_str("astar"),
        }
    }
}

impl PathSearch for PathAlgorithm {
    fn find_path<I: MeshIndex>(
        &self,
        mesh: &HalfEdgeMesh<I>,
        source: VertexId<I>,
        target: VertexId<I>,
    ) -> Option<(Vec<VertexId<I>>, f64)> {
        PathOptions::default().with_algorithm(*self).find_path(mesh, source, target)
    }
}

/// Options for path queries.
#[derive(Debug, Clone, Default)]
pub struct PathOptions {
    /// Search strategy.
    pub algorithm: PathAlgorithm,
    /// Longest path worth searching for. Targets farther away are treated as
    /// unreachable. `None` for no limit.
    pub max_distance: Option<f64>,
}

impl PathOptions {
    /// Set the search strategy.
    pub fn with_algorithm(mut self, algorithm: PathAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Bound the search radius around each source.
    pub fn with_max_distance(mut self, max_distance: f64) -> Self {
        self.max_distance = Some(max_distance);
        self
    }
}

impl PathSearch for PathOptions {
    fn find_path<I: MeshIndex>(
        &self,
        mesh: &HalfEdgeMesh<I>,
        source: VertexId<I>,
        target: VertexId<I>,
    ) -> Option<(Vec<VertexId<I>>, f64)> {
        match self.algorithm {
            PathAlgorithm::Dijkstra => dijkstra_path_within(mesh, source, target, self.max_distance),
            PathAlgorithm::AStar => astar_path_within(mesh, source, target, self.max_distance),
        }
    }
}

/// A path along mesh edges.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshPath<I: MeshIndex = u32> {
    /// Vertices from source to target.
    pub vertices: Vec<VertexId<I>>,
    /// Half-edge from each vertex to the next one.
    pub halfedges: Vec<HalfEdgeId<I>>,
    /// Sum of the edge lengths.
    pub length: f64,
}

impl<I: MeshIndex> Default for MeshPath<I> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<I: MeshIndex> MeshPath<I> {
    /// The path answering an invalid or unreachable query.
    pub fn empty() -> Self {
        Self {
            vertices: Vec::new(),
            halfedges: Vec::new(),
            length: 0.0,
        }
    }

    /// Whether the path has no vertex.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Undirected edge ids of the path's half-edges.
    pub fn edges(&self, index: &EdgeIndex<I>) -> Vec<EdgeId<I>> {
        self.halfedges.iter().map(|&he| index.edge(he)).collect()
    }

    fn from_vertices(mesh: &HalfEdgeMesh<I>, vertices: Vec<VertexId<I>>, length: f64) -> Self {
        let halfedges = path_halfedges(mesh, &vertices);
        Self {
            vertices,
            halfedges,
            length,
        }
    }
}

/// Half-edges joining consecutive vertices of `vertices`.
///
/// A pair with no connecting half-edge is logged and skipped.
pub fn path_halfedges<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    vertices: &[VertexId<I>],
) -> Vec<HalfEdgeId<I>> {
    vertices
        .windows(2)
        .filter_map(|w| {
            let found = mesh.find_halfedge(w[0], w[1]);
            if found.is_none() {
                let err = MeshError::MissingHalfEdge {
                    from: w[0].index(),
                    to: w[1].index(),
                };
                warn!("path segment skipped: {}", err);
            }
            found
        })
        .collect()
}

/// Shortest path between two vertices with the strategy in `options`.
///
/// Empty when an endpoint is not a vertex of the mesh or the target cannot be
/// reached. `source == target` gives the single-vertex path of length 0.
///
/// # Example
///
/// ```
/// use tessera::prelude::*;
/// use tessera::algo::geodesic::{shortest_path, PathAlgorithm, PathOptions};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
/// ];
/// let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
///
/// let options = PathOptions::default().with_algorithm(PathAlgorithm::AStar);
/// let path = shortest_path(&mesh, VertexId::new(1), VertexId::new(2), &options);
/// assert_eq!(path.vertices, vec![VertexId::new(1), VertexId::new(2)]);
/// assert!((path.length - 2.0_f64.sqrt()).abs() < 1e-12);
/// ```
pub fn shortest_path<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    source: VertexId<I>,
    target: VertexId<I>,
    options: &PathOptions,
) -> MeshPath<I> {
    shortest_path_with(mesh, source, target, options)
}

/// Shortest path between two vertices with a custom strategy.
pub fn shortest_path_with<I: MeshIndex, S: PathSearch>(
    mesh: &HalfEdgeMesh<I>,
    source: VertexId<I>,
    target: VertexId<I>,
    search: &S,
) -> MeshPath<I> {
    if !mesh.contains_vertex(source) || !mesh.contains_vertex(target) {
        debug!("path query {:?} -> {:?} outside the mesh", source, target);
        return MeshPath::empty();
    }
    if source == target {
        return MeshPath::from_vertices(mesh, vec![source], 0.0);
    }

    match search.find_path(mesh, source, target) {
        Some((vertices, length)) => {
            debug!(
                "path {:?} -> {:?}: {} vertices, length {:.6}",
                source,
                target,
                vertices.len(),
                length
            );
            MeshPath::from_vertices(mesh, vertices, length)
        }
        None => {
            debug!("path {:?} -> {:?}: unreachable", source, target);
            MeshPath::empty()
        }
    }
}

/// Path visiting `waypoints` in order.
///
/// Legs between consecutive waypoints are concatenated, keeping each junction
/// vertex once. If any leg is empty the whole result is empty. A single
/// waypoint gives the single-vertex path.
pub fn shortest_path_through<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    waypoints: &[VertexId<I>],
    options: &PathOptions,
) -> MeshPath<I> {
    match waypoints {
        [] => return MeshPath::empty(),
        [only] => return shortest_path(mesh, *only, *only, options),
        _ => {}
    }

    let mut result = MeshPath::empty();
    for pair in waypoints.windows(2) {
        let leg = shortest_path(mesh, pair[0], pair[1], options);
        if leg.is_empty() {
            debug!("waypoint leg {:?} -> {:?} failed", pair[0], pair[1]);
            return MeshPath::empty();
        }

        let skip = usize::from(!result.vertices.is_empty());
        result.vertices.extend(leg.vertices.into_iter().skip(skip));
        result.halfedges.extend(leg.halfedges);
        result.length += leg.length;
    }
    result
}
