//! Mesh construction utilities.
//!
//! Builds half-edge meshes from face-vertex lists as found in OBJ and PLY
//! files. Faces may have any number of corners (at least three).

use std::collections::HashMap;

use log::debug;
use nalgebra::Point3;

use super::halfedge::{Face, HalfEdge, HalfEdgeMesh};
use super::index::{FaceId, HalfEdgeId, MeshIndex, VertexId};
use crate::error::{MeshError, Result};

/// Build a half-edge mesh from vertices and polygonal faces.
///
/// Half-edges of face `i` are stored contiguously, in the face's winding
/// order, and `face(i).halfedge` leaves `faces[i][0]`. Boundary half-edges
/// are appended after all interior ones.
///
/// # Errors
/// - [`MeshError::EmptyMesh`] if `faces` is empty
/// - [`MeshError::InvalidVertexIndex`] if a face references a missing vertex
/// - [`MeshError::DegenerateFace`] if a face has fewer than three corners or
///   repeats a vertex
/// - [`MeshError::NonManifoldEdge`] if two faces use the same directed edge
///
/// # Example
/// ```
/// use tessera::mesh::{build_from_polygons, HalfEdgeMesh};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(1.0, 1.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
/// ];
/// let mesh: HalfEdgeMesh = build_from_polygons(&vertices, &[vec![0, 1, 2, 3]]).unwrap();
/// assert_eq!(mesh.num_faces(), 1);
/// assert_eq!(mesh.num_halfedges(), 8);
/// ```
pub fn build_from_polygons<I: MeshIndex>(
    vertices: &[Point3<f64>],
    faces: &[Vec<usize>],
) -> Result<HalfEdgeMesh<I>> {
    if faces.is_empty() {
        return Err(MeshError::EmptyMesh);
    }

    for (fi, face) in faces.iter().enumerate() {
        if face.len() < 3 {
            return Err(MeshError::DegenerateFace { face: fi });
        }
        for (k, &vi) in face.iter().enumerate() {
            if vi >= vertices.len() {
                return Err(MeshError::InvalidVertexIndex { face: fi, vertex: vi });
            }
            if face[..k].contains(&vi) {
                return Err(MeshError::DegenerateFace { face: fi });
            }
        }
    }

    let num_corners: usize = faces.iter().map(Vec::len).sum();
    let mut mesh = HalfEdgeMesh::with_capacity(vertices.len(), num_corners, faces.len());

    let vertex_ids: Vec<VertexId<I>> = vertices
        .iter()
        .map(|&pos| mesh.add_vertex(pos))
        .collect();

    // Directed edge (v0, v1) -> interior half-edge, plus the same keys in
    // creation order so twin linking is deterministic.
    let mut edge_map: HashMap<(usize, usize), HalfEdgeId<I>> = HashMap::with_capacity(num_corners);
    let mut directed: Vec<(usize, usize)> = Vec::with_capacity(num_corners);

    for (fi, face) in faces.iter().enumerate() {
        let n = face.len();
        let base = mesh.num_halfedges();
        let face_id = FaceId::<I>::new(fi);
        mesh.faces.push(Face::new(HalfEdgeId::new(base)));

        for k in 0..n {
            let (v0, v1) = (face[k], face[(k + 1) % n]);
            let he = HalfEdgeId::<I>::new(base + k);

            if edge_map.insert((v0, v1), he).is_some() {
                return Err(MeshError::NonManifoldEdge { v0, v1 });
            }
            directed.push((v0, v1));

            mesh.halfedges.push(HalfEdge {
                origin: vertex_ids[v0],
                twin: HalfEdgeId::invalid(),
                next: HalfEdgeId::new(base + (k + 1) % n),
                prev: HalfEdgeId::new(base + (k + n - 1) % n),
                face: face_id,
            });

            // Overwritten for shared vertices; boundary vertices are fixed below.
            mesh.vertex_mut(vertex_ids[v0]).halfedge = he;
        }
    }

    for (i, &(v0, v1)) in directed.iter().enumerate() {
        let he = HalfEdgeId::<I>::new(i);
        if let Some(&twin) = edge_map.get(&(v1, v0)) {
            mesh.halfedge_mut(he).twin = twin;
        } else {
            let boundary_he = HalfEdgeId::<I>::new(mesh.num_halfedges());
            mesh.halfedges.push(HalfEdge {
                origin: vertex_ids[v1],
                twin: he,
                ..HalfEdge::new()
            });
            mesh.halfedge_mut(he).twin = boundary_he;
        }
    }

    link_boundary_loops(&mut mesh);
    link_boundary_fans(&mut mesh);
    fix_boundary_vertex_halfedges(&mut mesh);

    Ok(mesh)
}

/// Build a half-edge mesh from vertices and triangle faces.
///
/// # Example
/// ```
/// use tessera::mesh::{build_from_triangles, HalfEdgeMesh};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.5, 1.0, 0.0),
/// ];
/// let faces = vec![[0, 1, 2]];
///
/// let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
/// assert_eq!(mesh.num_vertices(), 3);
/// assert_eq!(mesh.num_faces(), 1);
/// ```
pub fn build_from_triangles<I: MeshIndex>(
    vertices: &[Point3<f64>],
    faces: &[[usize; 3]],
) -> Result<HalfEdgeMesh<I>> {
    let polygons: Vec<Vec<usize>> = faces.iter().map(|f| f.to_vec()).collect();
    build_from_polygons(vertices, &polygons)
}

/// Link boundary half-edges into loops.
///
/// The successor of a boundary half-edge arriving at `v` is found by rotating
/// around `v` through its faces until the next boundary half-edge leaving `v`.
/// This stays correct at vertices where two boundary loops touch.
fn link_boundary_loops<I: MeshIndex>(mesh: &mut HalfEdgeMesh<I>) {
    let boundary_hes: Vec<HalfEdgeId<I>> = mesh
        .halfedge_ids()
        .filter(|&he| mesh.is_boundary_halfedge(he))
        .collect();
    let limit = mesh.num_halfedges();

    for &he in &boundary_hes {
        let mut h = mesh.twin(he);
        for _ in 0..limit {
            let candidate = mesh.twin(mesh.prev(h));
            if mesh.is_boundary_halfedge(candidate) {
                mesh.halfedge_mut(he).next = candidate;
                mesh.halfedge_mut(candidate).prev = he;
                break;
            }
            h = candidate;
        }
    }
}

/// Chain the face fans of a vertex that several boundary gaps pass through.
///
/// After [`link_boundary_loops`] each fan's incoming boundary half-edge leads
/// back into the same fan, so a bowtie vertex would circulate over one fan
/// only. Here the incoming half-edge of fan `i` is relinked to the outgoing
/// half-edge of fan `i + 1`, which merges the loops through the vertex and
/// lets the one-ring walk visit every fan.
fn link_boundary_fans<I: MeshIndex>(mesh: &mut HalfEdgeMesh<I>) {
    let mut outgoing: Vec<Vec<HalfEdgeId<I>>> = vec![Vec::new(); mesh.num_vertices()];
    for he in mesh.halfedge_ids() {
        if mesh.is_boundary_halfedge(he) {
            outgoing[mesh.origin(he).index()].push(he);
        }
    }

    for (v, fans) in outgoing.iter().enumerate() {
        if fans.len() < 2 {
            continue;
        }
        debug!("Vertex {} joins {} boundary fans", v, fans.len());

        let incoming: Vec<HalfEdgeId<I>> = fans.iter().map(|&he| mesh.prev(he)).collect();
        for (k, &into) in incoming.iter().enumerate() {
            let out = fans[(k + 1) % fans.len()];
            mesh.halfedge_mut(into).next = out;
            mesh.halfedge_mut(out).prev = into;
        }
    }
}

/// Ensure boundary vertices point to a boundary half-edge.
fn fix_boundary_vertex_halfedges<I: MeshIndex>(mesh: &mut HalfEdgeMesh<I>) {
    for vid in mesh.vertex_ids().collect::<Vec<_>>() {
        let start_he = mesh.vertex(vid).halfedge;
        if !start_he.is_valid() {
            continue;
        }

        let mut he = start_he;
        loop {
            if mesh.is_boundary_halfedge(he) {
                mesh.vertex_mut(vid).halfedge = he;
                break;
            }
            he = mesh.next(mesh.twin(he));
            if he == start_he || !he.is_valid() {
                break;
            }
        }
    }
}

/// Convert a half-edge mesh back to a face-vertex representation.
///
/// Returns the vertex positions and one index list per face, each starting at
/// the face's first vertex.
pub fn to_face_vertex<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> (Vec<Point3<f64>>, Vec<Vec<usize>>) {
    let vertices: Vec<Point3<f64>> = mesh.vertex_ids().map(|v| *mesh.position(v)).collect();

    let faces: Vec<Vec<usize>> = mesh
        .face_ids()
        .map(|f| mesh.face_vertices(f).map(VertexId::index).collect())
        .collect();

    (vertices, faces)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_triangle() -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
        ];
        (vertices, vec![[0, 1, 2]])
    }

    fn two_quads() -> (Vec<Point3<f64>>, Vec<Vec<usize>>) {
        // Two quads sharing the edge 1-2
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
        ];
        (vertices, vec![vec![0, 1, 2, 3], vec![1, 4, 5, 2]])
    }

    #[test]
    fn test_single_triangle() {
        let (vertices, faces) = single_triangle();
        let mesh: HalfEdgeMesh<u32> = build_from_triangles(&vertices, &faces).unwrap();

        assert_eq!(mesh.num_vertices(), 3);
        assert_eq!(mesh.num_faces(), 1);
        // 3 interior half-edges + 3 boundary half-edges
        assert_eq!(mesh.num_halfedges(), 6);
        assert!(mesh.is_valid());

        for v in mesh.vertex_ids() {
            assert!(mesh.is_boundary_vertex(v));
            assert!(mesh.is_boundary_halfedge(mesh.vertex(v).halfedge));
        }
    }

    #[test]
    fn test_face_layout() {
        let (vertices, faces) = two_quads();
        let mesh: HalfEdgeMesh<u32> = build_from_polygons(&vertices, &faces).unwrap();

        assert_eq!(mesh.num_faces(), 2);
        // 8 interior half-edges + 6 boundary half-edges
        assert_eq!(mesh.num_halfedges(), 14);
        assert!(mesh.is_valid());

        let f1 = FaceId::new(1);
        assert_eq!(mesh.face(f1).halfedge, HalfEdgeId::new(4));
        let corners: Vec<usize> = mesh.face_vertices(f1).map(|v| v.index()).collect();
        assert_eq!(corners, vec![1, 4, 5, 2]);
    }

    #[test]
    fn test_boundary_loop() {
        let (vertices, faces) = two_quads();
        let mesh: HalfEdgeMesh<u32> = build_from_polygons(&vertices, &faces).unwrap();

        let start = (0..mesh.num_halfedges())
            .map(HalfEdgeId::<u32>::new)
            .find(|&he| mesh.is_boundary_halfedge(he))
            .unwrap();

        let mut he = start;
        let mut count = 0;
        loop {
            assert!(mesh.is_boundary_halfedge(he));
            assert_eq!(mesh.dest(he), mesh.origin(mesh.next(he)));
            he = mesh.next(he);
            count += 1;
            if he == start {
                break;
            }
        }
        assert_eq!(count, 6);
    }

    #[test]
    fn test_bowtie_vertex() {
        // Two triangles touching only at vertex 0
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(-1.0, 0.0, 0.0),
            Point3::new(-1.0, -1.0, 0.0),
        ];
        let faces = vec![vec![0, 1, 2], vec![0, 3, 4]];
        let mesh: HalfEdgeMesh<u32> = build_from_polygons(&vertices, &faces).unwrap();
        assert!(mesh.is_valid());

        // The two triangle outlines merge into one figure-eight loop.
        for he in mesh.halfedge_ids().filter(|&he| mesh.is_boundary_halfedge(he)) {
            assert_eq!(mesh.dest(he), mesh.origin(mesh.next(he)));
            let mut h = he;
            for _ in 0..6 {
                h = mesh.next(h);
            }
            assert_eq!(h, he);
            assert_ne!(mesh.next(mesh.next(mesh.next(he))), he);
        }

        // The one-ring of the shared vertex reaches both triangles.
        let v0 = VertexId::new(0);
        assert_eq!(mesh.valence(v0), 4);
        assert_eq!(mesh.vertex_faces(v0).count(), 2);
        for v in 1..5 {
            assert!(mesh.find_halfedge(v0, VertexId::new(v)).is_some());
            assert!(mesh.find_halfedge(VertexId::new(v), v0).is_some());
        }
    }

    #[test]
    fn test_roundtrip() {
        let (vertices, faces) = two_quads();
        let mesh: HalfEdgeMesh<u32> = build_from_polygons(&vertices, &faces).unwrap();

        let (out_verts, out_faces) = to_face_vertex(&mesh);
        assert_eq!(out_faces, faces);
        for (v_in, v_out) in vertices.iter().zip(out_verts.iter()) {
            assert!((v_in - v_out).norm() < 1e-10);
        }
    }

    #[test]
    fn test_invalid_vertex_index() {
        let vertices = vec![Point3::new(0.0, 0.0, 0.0)];
        let faces = vec![[0, 1, 2]];

        let result: Result<HalfEdgeMesh<u32>> = build_from_triangles(&vertices, &faces);
        assert!(matches!(
            result,
            Err(MeshError::InvalidVertexIndex { face: 0, vertex: 1 })
        ));
    }

    #[test]
    fn test_degenerate_face() {
        let (vertices, _) = single_triangle();

        let result: Result<HalfEdgeMesh<u32>> = build_from_triangles(&vertices, &[[0, 0, 2]]);
        assert!(matches!(result, Err(MeshError::DegenerateFace { face: 0 })));

        let result: Result<HalfEdgeMesh<u32>> = build_from_polygons(&vertices, &[vec![0, 1]]);
        assert!(matches!(result, Err(MeshError::DegenerateFace { face: 0 })));
    }

    #[test]
    fn test_duplicate_directed_edge() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, -1.0, 0.0),
        ];
        // Both faces traverse 0 -> 1.
        let faces = vec![[0, 1, 2], [0, 1, 3]];
        let result: Result<HalfEdgeMesh<u32>> = build_from_triangles(&vertices, &faces);
        assert!(matches!(result, Err(MeshError::NonManifoldEdge { v0: 0, v1: 1 })));
    }

    #[test]
    fn test_empty_faces() {
        let result: Result<HalfEdgeMesh<u32>> =
            build_from_polygons(&[Point3::new(0.0, 0.0, 0.0)], &[]);
        assert!(matches!(result, Err(MeshError::EmptyMesh)));
    }
}
