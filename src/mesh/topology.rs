//! Topology preparation for display and analysis.
//!
//! Everything here is derived from a built [`HalfEdgeMesh`]: bounding-box
//! normalization, face and vertex normals, fan triangulation into a flat index
//! buffer, and the deduplicated undirected edge list.

use std::collections::BTreeSet;

use log::debug;
use nalgebra::{Point3, Vector3};

use super::halfedge::HalfEdgeMesh;
use super::index::{EdgeId, FaceId, HalfEdgeId, MeshIndex, VertexId};
use crate::error::{MeshError, Result};

/// Default length of the longest bounding-box axis after normalization.
pub const DEFAULT_TARGET_EXTENT: f64 = 2.0;

/// The similarity transform applied by [`normalize`].
///
/// A normalized position is `(p - center) * scale`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalization {
    /// Bounding-box center before normalization.
    pub center: Point3<f64>,
    /// Uniform scale factor.
    pub scale: f64,
}

impl Normalization {
    /// Map an original position into normalized space.
    pub fn apply(&self, p: &Point3<f64>) -> Point3<f64> {
        Point3::from((p - self.center) * self.scale)
    }

    /// Map a normalized position back to the original space.
    pub fn invert(&self, p: &Point3<f64>) -> Point3<f64> {
        self.center + p.coords / self.scale
    }
}

/// Center the mesh on the origin and scale it so its longest bounding-box axis
/// measures `target_extent`.
///
/// Returns `Ok(None)` for a mesh without vertices. A mesh whose bounding box
/// has zero extent (a single point) is translated but not scaled.
pub fn normalize<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    target_extent: f64,
) -> Result<Option<Normalization>> {
    if !(target_extent > 0.0 && target_extent.is_finite()) {
        return Err(MeshError::invalid_param(
            "target_extent",
            target_extent,
            "must be positive and finite",
        ));
    }

    let Some((min, max)) = mesh.bounding_box() else {
        return Ok(None);
    };

    let center = nalgebra::center(&min, &max);
    let extent = (max - min).max();
    let scale = if extent > 0.0 { target_extent / extent } else { 1.0 };
    let transform = Normalization { center, scale };

    for v in &mut mesh.vertices {
        v.position = transform.apply(&v.position);
    }

    debug!(
        "normalized mesh: center ({:.4}, {:.4}, {:.4}), scale {:.6}",
        center.x, center.y, center.z, scale
    );
    Ok(Some(transform))
}

/// Per-face and per-vertex unit normals.
#[derive(Debug, Clone, Default)]
pub struct Normals {
    /// One normal per face, indexed by face id.
    pub face: Vec<Vector3<f64>>,
    /// One normal per vertex, indexed by vertex id.
    pub vertex: Vec<Vector3<f64>>,
}

/// Compute face and vertex normals.
///
/// The face normal is the normalized cross product of the two edges leaving
/// the face's first corner. The vertex normal is the normalized sum of the
/// unnormalized incident face normals, which weights faces by area. Isolated
/// vertices and degenerate faces get a zero normal.
pub fn compute_normals<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> Normals {
    let face = mesh.face_ids().map(|f| mesh.face_normal(f)).collect();
    let vertex = mesh.vertex_ids().map(|v| mesh.vertex_normal(v)).collect();
    Normals { face, vertex }
}

/// Fan-triangulate one face: `(v0, vi, vi+1)` for `i` in `1..k-1`.
///
/// Triangles already yield themselves.
pub fn triangulate_face<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    f: FaceId<I>,
) -> Vec<[VertexId<I>; 3]> {
    let corners: Vec<VertexId<I>> = mesh.face_vertices(f).collect();
    if corners.len() < 3 {
        return Vec::new();
    }
    (1..corners.len() - 1)
        .map(|i| [corners[0], corners[i], corners[i + 1]])
        .collect()
}

/// Flat triangle index buffer of the whole mesh, three indices per triangle.
pub fn triangle_index_buffer<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> Vec<u32> {
    let mut indices = Vec::with_capacity(mesh.num_faces() * 3);
    for f in mesh.face_ids() {
        for tri in triangulate_face(mesh, f) {
            indices.extend(tri.iter().map(|v| v.index() as u32));
        }
    }
    indices
}

/// Whether `he` stands for its undirected edge: it is on the boundary, or it
/// has the lower index of its twin pair.
#[inline]
pub fn is_canonical_halfedge<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, he: HalfEdgeId<I>) -> bool {
    mesh.is_boundary_halfedge(he) || he < mesh.twin(he)
}

/// Deduplicated undirected edges as sorted `(min, max)` vertex pairs.
pub fn unique_edges<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> Vec<(usize, usize)> {
    let mut edges = BTreeSet::new();
    for he in mesh.halfedge_ids() {
        if !is_canonical_halfedge(mesh, he) {
            continue;
        }
        let a = mesh.origin(he).index();
        let b = mesh.dest(he).index();
        edges.insert((a.min(b), a.max(b)));
    }
    edges.into_iter().collect()
}

/// Flat line index buffer: [`unique_edges`] with two indices per edge.
pub fn edge_index_buffer<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> Vec<u32> {
    unique_edges(mesh)
        .into_iter()
        .flat_map(|(a, b)| [a as u32, b as u32])
        .collect()
}

/// Dense numbering of the undirected edges of a mesh.
///
/// Each twin pair maps to one [`EdgeId`]. The representative half-edge of an
/// edge is the lower-indexed half of the pair.
#[derive(Debug, Clone)]
pub struct EdgeIndex<I: MeshIndex = u32> {
    halfedge_edge: Vec<EdgeId<I>>,
    edge_halfedge: Vec<HalfEdgeId<I>>,
}

impl<I: MeshIndex> EdgeIndex<I> {
    /// Number the edges of `mesh`.
    pub fn new(mesh: &HalfEdgeMesh<I>) -> Self {
        let mut halfedge_edge = vec![EdgeId::invalid(); mesh.num_halfedges()];
        let mut edge_halfedge = Vec::with_capacity(mesh.num_halfedges() / 2);

        for he in mesh.halfedge_ids() {
            let twin = mesh.twin(he);
            if twin.is_valid() && twin < he {
                continue;
            }
            let e = EdgeId::new(edge_halfedge.len());
            edge_halfedge.push(he);
            halfedge_edge[he.index()] = e;
            if twin.is_valid() {
                halfedge_edge[twin.index()] = e;
            }
        }

        Self {
            halfedge_edge,
            edge_halfedge,
        }
    }

    /// Number of undirected edges.
    pub fn num_edges(&self) -> usize {
        self.edge_halfedge.len()
    }

    /// Edge containing a half-edge.
    #[inline]
    pub fn edge(&self, he: HalfEdgeId<I>) -> EdgeId<I> {
        self.halfedge_edge[he.index()]
    }

    /// Representative half-edge of an edge.
    #[inline]
    pub fn halfedge(&self, e: EdgeId<I>) -> HalfEdgeId<I> {
        self.edge_halfedge[e.index()]
    }

    /// Iterate over all edge ids.
    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId<I>> + '_ {
        (0..self.edge_halfedge.len()).map(EdgeId::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{build_from_polygons, build_from_triangles};

    fn cube(size: f64, offset: Vector3<f64>) -> HalfEdgeMesh {
        let vertices: Vec<Point3<f64>> = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [1.0, 0.0, 1.0],
            [1.0, 1.0, 1.0],
            [0.0, 1.0, 1.0],
        ]
        .iter()
        .map(|p| Point3::new(p[0], p[1], p[2]) * size + offset)
        .collect();
        let faces = vec![
            vec![0, 3, 2, 1],
            vec![4, 5, 6, 7],
            vec![0, 1, 5, 4],
            vec![1, 2, 6, 5],
            vec![2, 3, 7, 6],
            vec![3, 0, 4, 7],
        ];
        build_from_polygons(&vertices, &faces).unwrap()
    }

    #[test]
    fn test_normalize_cube() {
        let mut mesh = cube(5.0, Vector3::new(10.0, -3.0, 7.0));
        let t = normalize(&mut mesh, DEFAULT_TARGET_EXTENT).unwrap().unwrap();

        assert!((t.scale - 0.4).abs() < 1e-12);
        let (min, max) = mesh.bounding_box().unwrap();
        for i in 0..3 {
            assert!((min[i] + 1.0).abs() < 1e-12);
            assert!((max[i] - 1.0).abs() < 1e-12);
        }

        let back = t.invert(mesh.position(VertexId::new(6)));
        assert!((back - Point3::new(15.0, 2.0, 12.0)).norm() < 1e-9);
    }

    #[test]
    fn test_normalize_degenerate() {
        let mut empty = HalfEdgeMesh::<u32>::new();
        assert!(normalize(&mut empty, 2.0).unwrap().is_none());

        let mut point = HalfEdgeMesh::<u32>::new();
        point.add_vertex(Point3::new(3.0, 3.0, 3.0));
        let t = normalize(&mut point, 2.0).unwrap().unwrap();
        assert_eq!(t.scale, 1.0);
        assert_eq!(*point.position(VertexId::new(0)), Point3::origin());

        assert!(normalize(&mut point, 0.0).is_err());
    }

    #[test]
    fn test_cube_buffers() {
        let mesh = cube(1.0, Vector3::zeros());
        assert_eq!(triangle_index_buffer(&mesh).len(), 36);

        let edges = unique_edges(&mesh);
        assert_eq!(edges.len(), 12);
        assert!(edges.windows(2).all(|w| w[0] < w[1]));
        assert!(edges.iter().all(|&(a, b)| a < b));
        assert_eq!(edge_index_buffer(&mesh).len(), 24);

        let index = EdgeIndex::new(&mesh);
        assert_eq!(index.num_edges(), 12);
        for he in mesh.halfedge_ids() {
            assert_eq!(index.edge(he), index.edge(mesh.twin(he)));
        }
    }

    #[test]
    fn test_fan_triangulation() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
            Point3::new(1.0, 2.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mesh: HalfEdgeMesh = build_from_polygons(&vertices, &[vec![0, 1, 2, 3, 4]]).unwrap();
        let f = FaceId::new(0);

        let tris = triangulate_face(&mesh, f);
        assert_eq!(tris.len(), 3);
        assert!(tris.iter().all(|t| t[0] == VertexId::new(0)));

        let fan_area: f64 = tris
            .iter()
            .map(|t| {
                let [a, b, c] = t.map(|v| *mesh.position(v));
                (b - a).cross(&(c - a)).norm() * 0.5
            })
            .sum();
        assert!((fan_area - mesh.face_area(f)).abs() < 1e-12);
        assert!((fan_area - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_normals() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mut mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
        mesh.add_vertex(Point3::new(5.0, 5.0, 5.0));

        let normals = compute_normals(&mesh);
        assert_eq!(normals.face.len(), 1);
        assert!((normals.face[0] - Vector3::z()).norm() < 1e-12);
        assert!((normals.vertex[0] - Vector3::z()).norm() < 1e-12);
        assert_eq!(normals.vertex[3], Vector3::zeros());
    }
}
