//! Dijkstra's algorithm over the vertex-adjacency graph.
//!
//! Edge weights are Euclidean edge lengths, so distances are exact on the edge
//! graph and approximate true geodesic distances on the surface.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use log::{debug, warn};

use crate::mesh::{HalfEdgeMesh, MeshIndex, VertexId};

use super::GeodesicResult;

/// Options for Dijkstra's algorithm.
#[derive(Debug, Clone, Default)]
pub struct DijkstraOptions {
    /// Whether to store predecessor information for path reconstruction.
    pub store_predecessors: bool,

    /// Maximum distance to explore. Vertices beyond this distance won't be settled.
    /// Set to `None` for no limit.
    pub max_distance: Option<f64>,

    /// Target vertex for early termination.
    /// If set, the search stops as soon as this vertex is popped from the queue.
    pub target: Option<usize>,
}

impl DijkstraOptions {
    /// Enable predecessor storage for path reconstruction.
    pub fn with_predecessors(mut self, store: bool) -> Self {
        self.store_predecessors = store;
        self
    }

    /// Set maximum distance to explore.
    pub fn with_max_distance(mut self, max_dist: f64) -> Self {
        self.max_distance = Some(max_dist);
        self
    }

    /// Set target vertex for early termination.
    pub fn with_target(mut self, target: usize) -> Self {
        self.target = Some(target);
        self
    }
}

/// Min-priority queue entry shared by Dijkstra and A*.
#[derive(Debug, Clone, Copy)]
pub(super) struct QueueEntry {
    pub vertex: usize,
    /// Distance for Dijkstra, `g + h` for A*.
    pub priority: f64,
}

impl QueueEntry {
    pub fn new(vertex: usize, priority: f64) -> Self {
        Self { vertex, priority }
    }
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap: reverse so the smallest priority pops first.
        // Ties go to the lower vertex index so results are deterministic.
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.vertex.cmp(&self.vertex))
    }
}

/// Compute edge-graph distances from a single source vertex.
///
/// # Example
///
/// ```no_run
/// use tessera::prelude::*;
/// use tessera::algo::geodesic::{dijkstra, DijkstraOptions};
///
/// let mesh: HalfEdgeMesh = tessera::io::load("mesh.obj").unwrap();
/// let source = VertexId::new(0);
///
/// let result = dijkstra(&mesh, source, &DijkstraOptions::default().with_predecessors(true));
/// if let Some(path) = result.path_to(VertexId::new(10)) {
///     println!("Path: {:?}", path);
/// }
/// ```
pub fn dijkstra<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    source: VertexId<I>,
    options: &DijkstraOptions,
) -> GeodesicResult<I> {
    dijkstra_multiple(mesh, &[source], options)
}

/// Compute edge-graph distances from the nearest of several sources.
///
/// All sources start at distance 0. Sources outside the mesh are ignored
/// with a warning.
pub fn dijkstra_multiple<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    sources: &[VertexId<I>],
    options: &DijkstraOptions,
) -> GeodesicResult<I> {
    let n = mesh.num_vertices();
    let mut distances = vec![f64::INFINITY; n];
    let mut predecessors: Option<Vec<Option<usize>>> =
        options.store_predecessors.then(|| vec![None; n]);

    let mut heap = BinaryHeap::new();
    for &source in sources {
        if mesh.contains_vertex(source) {
            distances[source.index()] = 0.0;
            heap.push(QueueEntry::new(source.index(), 0.0));
        } else {
            warn!("dijkstra source {:?} is not a vertex of the mesh", source);
        }
    }

    let mut settled = 0usize;
    while let Some(QueueEntry { vertex: u, priority: dist_u }) = heap.pop() {
        // Stale entry: a shorter path to u was already settled.
        if dist_u > distances[u] {
            continue;
        }
        settled += 1;

        if options.target == Some(u) {
            break;
        }

        for he in mesh.vertex_halfedges(VertexId::new(u)) {
            let v = mesh.dest(he).index();
            let new_dist = dist_u + mesh.edge_length(he);

            if options.max_distance.is_some_and(|max| new_dist > max) {
                continue;
            }

            if new_dist < distances[v] {
                distances[v] = new_dist;
                if let Some(preds) = predecessors.as_mut() {
                    preds[v] = Some(u);
                }
                heap.push(QueueEntry::new(v, new_dist));
            }
        }
    }

    debug!(
        "dijkstra from {} source(s): settled {} of {} vertices",
        sources.len(),
        settled,
        n
    );
    GeodesicResult::new(distances, predecessors)
}

/// Shortest vertex path from `source` to `target` and its length.
///
/// Returns `None` if either endpoint is not a vertex of the mesh or the target
/// is unreachable.
pub fn dijkstra_path<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    source: VertexId<I>,
    target: VertexId<I>,
) -> Option<(Vec<VertexId<I>>, f64)> {
    dijkstra_path_within(mesh, source, target, None)
}

/// Like [`dijkstra_path`], but vertices farther than `max_distance` from the
/// source are never settled, so a longer path answers `None`.
pub fn dijkstra_path_within<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    source: VertexId<I>,
    target: VertexId<I>,
    max_distance: Option<f64>,
) -> Option<(Vec<VertexId<I>>, f64)> {
    if !mesh.contains_vertex(source) || !mesh.contains_vertex(target) {
        return None;
    }
    let mut options = DijkstraOptions::default()
        .with_predecessors(true)
        .with_target(target.index());
    if let Some(max) = max_distance {
        options = options.with_max_distance(max);
    }
    let result = dijkstra(mesh, source, &options);
    let path = result.path_to(target)?;
    Some((path, result.distance(target)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::build_from_triangles;
    use nalgebra::Point3;

    fn create_single_triangle() -> HalfEdgeMesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
        ];
        build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap()
    }

    fn create_grid_mesh(n: usize) -> HalfEdgeMesh {
        let mut vertices = Vec::new();
        let mut faces = Vec::new();

        for j in 0..=n {
            for i in 0..=n {
                vertices.push(Point3::new(i as f64, j as f64, 0.0));
            }
        }

        for j in 0..n {
            for i in 0..n {
                let v00 = j * (n + 1) + i;
                let v10 = j * (n + 1) + i + 1;
                let v01 = (j + 1) * (n + 1) + i;
                let v11 = (j + 1) * (n + 1) + i + 1;

                faces.push([v00, v10, v11]);
                faces.push([v00, v11, v01]);
            }
        }

        build_from_triangles(&vertices, &faces).unwrap()
    }

    #[test]
    fn test_dijkstra_single_triangle() {
        let mesh = create_single_triangle();
        let result = dijkstra(&mesh, VertexId::new(0), &DijkstraOptions::default());

        assert_eq!(result.len(), 3);
        assert_eq!(result.distance(VertexId::new(0)), 0.0);
        assert!((result.distance(VertexId::new(1)) - 1.0).abs() < 1e-10);
        assert!((result.distance(VertexId::new(2)) - 1.25_f64.sqrt()).abs() < 1e-10);
    }

    #[test]
    fn test_dijkstra_grid_diagonal() {
        let mesh = create_grid_mesh(2);
        let result = dijkstra(&mesh, VertexId::new(0), &DijkstraOptions::default());

        assert_eq!(result.reachable_count(), 9);
        // (0,0) -> (2,2) along the two diagonal edges
        let d = result.distance(VertexId::new(8));
        assert!((d - 2.0 * 2.0_f64.sqrt()).abs() < 1e-10);
    }

    #[test]
    fn test_dijkstra_path_reconstruction() {
        let mesh = create_single_triangle();
        let options = DijkstraOptions::default().with_predecessors(true);
        let result = dijkstra(&mesh, VertexId::new(0), &options);

        assert_eq!(result.path_to(VertexId::new(0)), Some(vec![VertexId::new(0)]));
        assert_eq!(
            result.path_to(VertexId::new(1)),
            Some(vec![VertexId::new(0), VertexId::new(1)])
        );
    }

    #[test]
    fn test_dijkstra_path() {
        let mesh = create_grid_mesh(3);
        let (path, length) = dijkstra_path(&mesh, VertexId::new(0), VertexId::new(15)).unwrap();

        assert_eq!(path.first(), Some(&VertexId::new(0)));
        assert_eq!(path.last(), Some(&VertexId::new(15)));
        assert!((length - 3.0 * 2.0_f64.sqrt()).abs() < 1e-10);

        let summed: f64 = path
            .windows(2)
            .map(|w| (mesh.position(w[1]) - mesh.position(w[0])).norm())
            .sum();
        assert!((summed - length).abs() < 1e-10);

        assert!(dijkstra_path(&mesh, VertexId::new(0), VertexId::new(99)).is_none());
    }

    #[test]
    fn test_dijkstra_max_distance() {
        let mesh = create_grid_mesh(3);
        let options = DijkstraOptions::default().with_max_distance(1.5);
        let result = dijkstra(&mesh, VertexId::new(0), &options);

        assert!(result.is_reachable(VertexId::new(0)));
        assert!(result.is_reachable(VertexId::new(1)));
        assert!(result.is_reachable(VertexId::new(4)));
        assert!(result.is_reachable(VertexId::new(5))); // diagonal, sqrt(2)
        assert!(!result.is_reachable(VertexId::new(2)));
        assert!(!result.is_reachable(VertexId::new(15)));
    }

    #[test]
    fn test_dijkstra_path_within() {
        let mesh = create_grid_mesh(3);
        let (source, target) = (VertexId::new(0), VertexId::new(3));

        let (path, length) = dijkstra_path_within(&mesh, source, target, Some(3.0)).unwrap();
        assert_eq!(path.len(), 4);
        assert!((length - 3.0).abs() < 1e-10);

        assert!(dijkstra_path_within(&mesh, source, target, Some(2.5)).is_none());
        assert!(dijkstra_path_within(&mesh, source, VertexId::new(1), Some(2.5)).is_some());
    }

    #[test]
    fn test_dijkstra_target_stops_early() {
        let mesh = create_grid_mesh(3);
        let options = DijkstraOptions::default().with_target(1);
        let result = dijkstra(&mesh, VertexId::new(0), &options);

        assert!((result.distance(VertexId::new(1)) - 1.0).abs() < 1e-10);
        // The far corner was never relaxed.
        assert!(!result.is_reachable(VertexId::new(15)));
    }

    #[test]
    fn test_dijkstra_multiple_sources() {
        let mesh = create_grid_mesh(2);
        let sources = vec![VertexId::new(0), VertexId::new(8)];
        let result = dijkstra_multiple(&mesh, &sources, &DijkstraOptions::default());

        assert_eq!(result.distance(VertexId::new(0)), 0.0);
        assert_eq!(result.distance(VertexId::new(8)), 0.0);
        assert!((result.distance(VertexId::new(4)) - 2.0_f64.sqrt()).abs() < 1e-10);
    }

    #[test]
    fn test_farthest_vertex() {
        let mesh = create_single_triangle();
        let result = dijkstra(&mesh, VertexId::new(0), &DijkstraOptions::default());

        let (farthest, dist) = result.farthest_vertex().unwrap();
        assert_eq!(farthest, VertexId::new(2));
        assert!((dist - 1.25_f64.sqrt()).abs() < 1e-10);
    }

    #[test]
    fn test_dijkstra_invalid_sources() {
        let mesh = create_single_triangle();
        let result = dijkstra_multiple(&mesh, &[], &DijkstraOptions::default());
        assert_eq!(result.reachable_count(), 0);

        let result = dijkstra(&mesh, VertexId::new(7), &DijkstraOptions::default());
        assert_eq!(result.reachable_count(), 0);

        let empty: HalfEdgeMesh = HalfEdgeMesh::new();
        assert!(dijkstra(&empty, VertexId::new(0), &DijkstraOptions::default()).is_empty());
    }

    #[test]
    fn test_dijkstra_preserves_triangle_inequality() {
        let mesh = create_grid_mesh(3);
        let result = dijkstra(&mesh, VertexId::new(0), &DijkstraOptions::default());

        for v in mesh.vertex_ids() {
            let d_v = result.distance(v);
            for he in mesh.vertex_halfedges(v) {
                let d_u = result.distance(mesh.dest(he));
                assert!((d_v - d_u).abs() <= mesh.edge_length(he) + 1e-10);
            }
        }
    }
}
