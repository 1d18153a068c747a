//! The parameterization mesh and its correspondence with the source mesh.
//!
//! The texture layout of a mesh is itself a polygon mesh: its vertices are the
//! texture coordinates and each layout face connects the texture indices of
//! the corners of one source face. Vertices split along a seam become separate
//! vertices there, so every chart of the layout is a connected component with
//! its own boundary.

use std::collections::HashSet;

use log::{debug, warn};
use nalgebra::{Point2, Point3};

use crate::error::{MeshError, Result};
use crate::mesh::{build_from_polygons, FaceId, HalfEdgeId, HalfEdgeMesh, MeshIndex};

use super::texcoords::TexCoords;
use super::uv::UVMap;

/// A UV layout as a half-edge mesh, linked half-edge by half-edge to its
/// source mesh.
#[derive(Debug, Clone)]
pub struct ParameterizationMesh<I: MeshIndex = u32> {
    /// The layout with positions `(u, v, 0)`.
    pub para: HalfEdgeMesh<I>,
    /// Per layout vertex UV coordinates.
    pub uv: UVMap<I>,
    mesh_to_para: Vec<HalfEdgeId<I>>,
    para_to_mesh: Vec<HalfEdgeId<I>>,
}

impl<I: MeshIndex> ParameterizationMesh<I> {
    /// Build the layout of `mesh` described by `tex`.
    ///
    /// # Errors
    /// - [`MeshError::EmptyMesh`] if `mesh` has no faces
    /// - [`MeshError::MissingTexCoords`] naming the first face whose corners
    ///   are not all textured
    /// - [`MeshError::InvalidState`] if no texture face can be laid out
    ///
    /// Texture faces that repeat a coordinate, or that reuse a directed UV
    /// edge already taken by an earlier face, are left out with a warning.
    /// The half-edges of such faces have no layout counterpart.
    pub fn build(mesh: &HalfEdgeMesh<I>, tex: &TexCoords) -> Result<Self> {
        if mesh.num_faces() == 0 {
            return Err(MeshError::EmptyMesh);
        }
        if let Some(f) = tex.first_untextured_face(mesh) {
            return Err(MeshError::MissingTexCoords { face: f.index() });
        }

        let positions: Vec<Point3<f64>> = tex
            .coords()
            .iter()
            .map(|uv| Point3::new(uv.x, uv.y, 0.0))
            .collect();

        // Layout faces that collapse or reuse a directed texture edge are left
        // out; their mesh half-edges stay unmapped.
        let mut used_edges: HashSet<(usize, usize)> = HashSet::new();
        let mut sources: Vec<FaceId<I>> = Vec::with_capacity(mesh.num_faces());
        let mut faces: Vec<Vec<usize>> = Vec::with_capacity(mesh.num_faces());
        for f in mesh.face_ids() {
            let Some(indices) = tex.face_indices(mesh, f) else {
                continue;
            };
            let n = indices.len();
            let repeats = (0..n).any(|k| indices[..k].contains(&indices[k]));
            let edges: Vec<(usize, usize)> = (0..n).map(|k| (indices[k], indices[(k + 1) % n])).collect();

            if n < 3 || repeats {
                warn!("Texture face {:?} repeats a coordinate; left out of the layout", f);
                continue;
            }
            if edges.iter().any(|e| used_edges.contains(e)) {
                warn!("Texture face {:?} reuses a directed UV edge; left out of the layout", f);
                continue;
            }
            used_edges.extend(edges);
            sources.push(f);
            faces.push(indices);
        }

        if faces.is_empty() {
            return Err(MeshError::InvalidState("texture layout has no usable faces".to_string()));
        }

        let para: HalfEdgeMesh<I> = build_from_polygons(&positions, &faces)
            .map_err(|e| MeshError::InvalidState(format!("texture layout is not a polygon mesh: {}", e)))?;

        let mut mesh_to_para = vec![HalfEdgeId::invalid(); mesh.num_halfedges()];
        let mut para_to_mesh = vec![HalfEdgeId::invalid(); para.num_halfedges()];
        for (&f, pf) in sources.iter().zip(para.face_ids()) {
            for (he, phe) in mesh.face_halfedges(f).zip(para.face_halfedges(pf)) {
                mesh_to_para[he.index()] = phe;
                para_to_mesh[phe.index()] = he;
            }
        }

        let uv = UVMap::new(tex.coords().to_vec());

        debug!(
            "Parameterization mesh: {} UV vertices for {} mesh vertices, {} of {} faces",
            para.num_vertices(),
            mesh.num_vertices(),
            para.num_faces(),
            mesh.num_faces()
        );

        Ok(Self {
            para,
            uv,
            mesh_to_para,
            para_to_mesh,
        })
    }

    /// Layout half-edge matching an interior mesh half-edge.
    ///
    /// Invalid for boundary half-edges of the source mesh.
    #[inline]
    pub fn mesh_to_para(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        self.mesh_to_para[he.index()]
    }

    /// Mesh half-edge matching an interior layout half-edge.
    ///
    /// Invalid for boundary half-edges of the layout.
    #[inline]
    pub fn para_to_mesh(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        self.para_to_mesh[he.index()]
    }

    /// UV coordinate at the origin of an interior mesh half-edge.
    pub fn corner_uv(&self, he: HalfEdgeId<I>) -> Option<Point2<f64>> {
        let phe = *self.mesh_to_para.get(he.index())?;
        phe.is_valid().then(|| self.uv.get(self.para.origin(phe)))
    }
}
