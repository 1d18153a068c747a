//! A* search over the vertex-adjacency graph.
//!
//! Uses the straight-line distance to the target as heuristic. It never
//! overestimates the remaining edge-path length, so the result is as short as
//! Dijkstra's while usually settling far fewer vertices.

use std::collections::BinaryHeap;

use log::debug;

use crate::mesh::{HalfEdgeMesh, MeshIndex, VertexId};

use super::dijkstra::QueueEntry;

/// Shortest vertex path from `source` to `target` and its length.
///
/// Returns `None` if either endpoint is not a vertex of the mesh or the target
/// is unreachable.
pub fn astar_path<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    source: VertexId<I>,
    target: VertexId<I>,
) -> Option<(Vec<VertexId<I>>, f64)> {
    astar_path_within(mesh, source, target, None)
}

/// Like [`astar_path`], but partial paths longer than `max_distance` are
/// dropped, so a longer path answers `None`.
pub fn astar_path_within<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    source: VertexId<I>,
    target: VertexId<I>,
    max_distance: Option<f64>,
) -> Option<(Vec<VertexId<I>>, f64)> {
    if !mesh.contains_vertex(source) || !mesh.contains_vertex(target) {
        return None;
    }

    let n = mesh.num_vertices();
    let goal = *mesh.position(target);
    let heuristic = |v: usize| (mesh.position(VertexId::<I>::new(v)) - goal).norm();

    let mut g_score = vec![f64::INFINITY; n];
    let mut came_from: Vec<Option<usize>> = vec![None; n];
    let mut closed = vec![false; n];
    let mut open = BinaryHeap::new();

    g_score[source.index()] = 0.0;
    open.push(QueueEntry::new(source.index(), heuristic(source.index())));

    let mut expanded = 0usize;
    while let Some(QueueEntry { vertex: current, .. }) = open.pop() {
        if current == target.index() {
            let mut path = vec![target];
            let mut v = current;
            while let Some(prev) = came_from[v] {
                path.push(VertexId::new(prev));
                v = prev;
            }
            path.reverse();
            debug!("A*: expanded {} of {} vertices", expanded, n);
            return Some((path, g_score[current]));
        }

        if closed[current] {
            continue;
        }
        closed[current] = true;
        expanded += 1;

        for he in mesh.vertex_halfedges(VertexId::new(current)) {
            let neighbor = mesh.dest(he).index();
            if closed[neighbor] {
                continue;
            }

            let tentative = g_score[current] + mesh.edge_length(he);
            if max_distance.is_some_and(|max| tentative > max) {
                continue;
            }
            if tentative < g_score[neighbor] {
                came_from[neighbor] = Some(current);
                g_score[neighbor] = tentative;
                open.push(QueueEntry::new(neighbor, tentative + heuristic(neighbor)));
            }
        }
    }

    debug!("A*: target {:?} unreachable after expanding {} vertices", target, expanded);
    None
}
