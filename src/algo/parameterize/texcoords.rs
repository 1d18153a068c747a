//! Per-corner texture coordinates.
//!
//! OBJ files index texture coordinates per face corner, independently of the
//! position index, so one vertex may carry several texture coordinates along a
//! seam. [`TexCoords`] keeps the shared coordinate table plus one optional
//! table index per half-edge, standing for the corner at the half-edge's
//! origin inside its face.

use nalgebra::Point2;

use crate::mesh::{FaceId, HalfEdgeId, HalfEdgeMesh, MeshIndex};

/// Texture coordinate table with a corner assignment per interior half-edge.
#[derive(Debug, Clone, Default)]
pub struct TexCoords {
    coords: Vec<Point2<f64>>,
    corners: Vec<Option<usize>>,
}

impl TexCoords {
    /// Create a table with no corner assigned yet.
    pub fn new(coords: Vec<Point2<f64>>, num_halfedges: usize) -> Self {
        Self {
            coords,
            corners: vec![None; num_halfedges],
        }
    }

    /// Build from one optional index list per face, in face-corner order.
    ///
    /// A face gets texture indices only if its list has one in-range index per
    /// corner; other faces stay untextured.
    pub fn from_face_indices<I: MeshIndex>(
        mesh: &HalfEdgeMesh<I>,
        coords: Vec<Point2<f64>>,
        face_indices: &[Option<Vec<usize>>],
    ) -> Self {
        let mut tex = Self::new(coords, mesh.num_halfedges());
        for (f, indices) in mesh.face_ids().zip(face_indices) {
            let Some(indices) = indices else { continue };
            if indices.len() != mesh.face_valence(f) || indices.iter().any(|&t| t >= tex.len()) {
                continue;
            }
            for (he, &t) in mesh.face_halfedges(f).zip(indices) {
                tex.corners[he.index()] = Some(t);
            }
        }
        tex
    }

    /// Per-vertex coordinates: every corner uses its vertex's index.
    pub fn from_vertex_coords<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, coords: Vec<Point2<f64>>) -> Self {
        let mut tex = Self::new(coords, mesh.num_halfedges());
        for he in mesh.halfedge_ids() {
            let v = mesh.origin(he).index();
            if !mesh.is_boundary_halfedge(he) && v < tex.len() {
                tex.corners[he.index()] = Some(v);
            }
        }
        tex
    }

    /// Number of entries in the coordinate table.
    #[inline]
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    /// Check if the coordinate table is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// The coordinate table.
    pub fn coords(&self) -> &[Point2<f64>] {
        &self.coords
    }

    /// Table index of the corner at the origin of `he`.
    #[inline]
    pub fn corner<I: MeshIndex>(&self, he: HalfEdgeId<I>) -> Option<usize> {
        self.corners.get(he.index()).copied().flatten()
    }

    /// Coordinate of the corner at the origin of `he`.
    pub fn corner_uv<I: MeshIndex>(&self, he: HalfEdgeId<I>) -> Option<Point2<f64>> {
        self.corner(he).map(|t| self.coords[t])
    }

    /// Assign a table index to the corner at the origin of `he`.
    pub fn set_corner<I: MeshIndex>(&mut self, he: HalfEdgeId<I>, index: Option<usize>) {
        self.corners[he.index()] = index;
    }

    /// Whether every corner of `f` has a texture index.
    pub fn is_face_textured<I: MeshIndex>(&self, mesh: &HalfEdgeMesh<I>, f: FaceId<I>) -> bool {
        mesh.face_halfedges(f).all(|he| self.corner(he).is_some())
    }

    /// First face lacking a full set of corner indices.
    pub fn first_untextured_face<I: MeshIndex>(&self, mesh: &HalfEdgeMesh<I>) -> Option<FaceId<I>> {
        mesh.face_ids().find(|&f| !self.is_face_textured(mesh, f))
    }

    /// Texture indices of the corners of `f`, in face order.
    pub fn face_indices<I: MeshIndex>(&self, mesh: &HalfEdgeMesh<I>, f: FaceId<I>) -> Option<Vec<usize>> {
        mesh.face_halfedges(f).map(|he| self.corner(he)).collect()
    }
}
