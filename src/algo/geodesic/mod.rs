//! Shortest paths over the vertex-adjacency graph.
//!
//! # Available Algorithms
//!
//! - [`dijkstra`]: single or multi-source distances with optional predecessors
//! - [`astar_path`]: A* with the Euclidean heuristic for one source/target pair
//! - [`shortest_path`]: the path query used by the viewer, with the strategy
//!   picked by [`PathAlgorithm`]
//!
//! # Example
//!
//! ```no_run
//! use tessera::prelude::*;
//! use tessera::algo::geodesic::{dijkstra, shortest_path, DijkstraOptions, PathOptions};
//!
//! let mesh: HalfEdgeMesh = tessera::io::load("mesh.obj").unwrap();
//!
//! let path = shortest_path(&mesh, VertexId::new(0), VertexId::new(10), &PathOptions::default());
//! println!("{} vertices, length {}", path.len(), path.length);
//!
//! let field = dijkstra(&mesh, VertexId::new(0), &DijkstraOptions::default());
//! if let Some((v, d)) = field.farthest_vertex() {
//!     println!("Farthest vertex: {:?} at distance {}", v, d);
//! }
//! ```

mod astar;
mod dijkstra;
mod path;

use std::marker::PhantomData;

pub use astar::{astar_path, astar_path_within};
pub use dijkstra::{dijkstra, dijkstra_multiple, dijkstra_path, dijkstra_path_within, DijkstraOptions};
pub use path::{
    path_halfedges, shortest_path, shortest_path_through, shortest_path_with, MeshPath,
    PathAlgorithm, PathOptions, PathSearch,
};

use crate::mesh::{MeshIndex, VertexId};

/// Distances (and optionally predecessors) from a Dijkstra run.
#[derive(Debug, Clone)]
pub struct GeodesicResult<I: MeshIndex = u32> {
    /// Distance to each vertex; `f64::INFINITY` when unreachable.
    distances: Vec<f64>,
    /// Previous vertex on a shortest path, when requested.
    predecessors: Option<Vec<Option<usize>>>,
    _marker: PhantomData<I>,
}

impl<I: MeshIndex> GeodesicResult<I> {
    pub(crate) fn new(distances: Vec<f64>, predecessors: Option<Vec<Option<usize>>>) -> Self {
        Self {
            distances,
            predecessors,
            _marker: PhantomData,
        }
    }

    /// Distance to a vertex, `f64::INFINITY` if unreachable.
    #[inline]
    pub fn distance(&self, v: VertexId<I>) -> f64 {
        self.distances[v.index()]
    }

    /// All distances, indexed by vertex.
    #[inline]
    pub fn distances(&self) -> &[f64] {
        &self.distances
    }

    /// Number of vertices.
    #[inline]
    pub fn len(&self) -> usize {
        self.distances.len()
    }

    /// Check if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    /// Previous vertex on the shortest path to `v`.
    ///
    /// `None` for sources, unreachable vertices, or when predecessors were not
    /// stored.
    pub fn predecessor(&self, v: VertexId<I>) -> Option<VertexId<I>> {
        self.predecessors
            .as_ref()?
            .get(v.index())
            .copied()
            .flatten()
            .map(VertexId::new)
    }

    /// Vertex with the largest finite distance.
    pub fn farthest_vertex(&self) -> Option<(VertexId<I>, f64)> {
        self.distances
            .iter()
            .enumerate()
            .filter(|(_, d)| d.is_finite())
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, &d)| (VertexId::new(i), d))
    }

    /// Shortest path from a source to `target`, both included.
    ///
    /// Built by walking predecessors back from the target and reversing.
    /// Returns `None` without stored predecessors, for an unreachable target or
    /// one outside the mesh.
    pub fn path_to(&self, target: VertexId<I>) -> Option<Vec<VertexId<I>>> {
        let predecessors = self.predecessors.as_ref()?;
        if !self.distances.get(target.index())?.is_finite() {
            return None;
        }

        let mut path = vec![target];
        let mut current = target.index();
        while let Some(prev) = predecessors[current] {
            path.push(VertexId::new(prev));
            current = prev;
            if path.len() > self.distances.len() {
                return None;
            }
        }

        path.reverse();
        Some(path)
    }

    /// Whether a vertex was reached.
    #[inline]
    pub fn is_reachable(&self, v: VertexId<I>) -> bool {
        self.distances[v.index()].is_finite()
    }

    /// Number of reached vertices.
    pub fn reachable_count(&self) -> usize {
        self.distances.iter().filter(|d| d.is_finite()).count()
    }
}
