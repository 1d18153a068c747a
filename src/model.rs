//! The loaded-mesh facade a viewer works with.
//!
//! [`MeshModel`] owns one mesh together with everything derived from it:
//! normals, flat index buffers for drawing, the edge numbering and the active
//! curvature field. Loading replaces all of it at once; a failed load leaves
//! the model empty.
//!
//! # Example
//!
//! ```no_run
//! use tessera::algo::curvature::CurvatureKind;
//! use tessera::algo::geodesic::PathOptions;
//! use tessera::model::{LoadOptions, MeshModel};
//! use tessera::mesh::VertexId;
//!
//! let mut model: MeshModel = MeshModel::new();
//! model.load("bunny.obj", &LoadOptions::default().with_curvature_kind(CurvatureKind::Mean)).unwrap();
//!
//! let path = model.shortest_path(VertexId::new(0), VertexId::new(42), &PathOptions::default());
//! println!("{} vertices, length {:.4}", path.len(), path.length);
//! ```

use std::io::BufRead;
use std::path::Path;

use log::{debug, info};

use crate::algo::curvature::{compute_curvature, CurvatureField, CurvatureKind, CurvatureOptions};
use crate::algo::geodesic::{shortest_path, shortest_path_through, MeshPath, PathOptions};
use crate::algo::parameterize::{
    analyze_distortion, detect_boundary_layout, segment_charts, BoundaryLayout, ChartSegmentation,
    DistortionOptions, DistortionReport, ParameterizationMesh, TexCoords,
};
use crate::error::{MeshError, Result};
use crate::io::{self, obj, ply, Format};
use crate::mesh::topology::DEFAULT_TARGET_EXTENT;
use crate::mesh::{
    compute_normals, edge_index_buffer, normalize, triangle_index_buffer, EdgeId, EdgeIndex,
    HalfEdgeMesh, MeshIndex, Normalization, Normals, VertexId,
};

/// Options for [`MeshModel::load`].
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Center and rescale the mesh after loading.
    pub normalize: bool,
    /// Longest bounding-box axis after normalization.
    pub target_extent: f64,
    /// Curvature field computed on load.
    pub curvature: CurvatureOptions,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            normalize: true,
            target_extent: DEFAULT_TARGET_EXTENT,
            curvature: CurvatureOptions::default(),
        }
    }
}

impl LoadOptions {
    /// Enable or disable normalization.
    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    /// Set the normalized extent.
    pub fn with_target_extent(mut self, extent: f64) -> Self {
        self.target_extent = extent;
        self
    }

    /// Set the curvature field computed on load.
    pub fn with_curvature_kind(mut self, kind: CurvatureKind) -> Self {
        self.curvature.kind = kind;
        self
    }

    /// Replace all curvature options.
    pub fn with_curvature(mut self, curvature: CurvatureOptions) -> Self {
        self.curvature = curvature;
        self
    }
}

/// Everything learned from a mesh's texture coordinates.
#[derive(Debug, Clone)]
pub struct UvAnalysis<I: MeshIndex = u32> {
    /// The layout as a mesh.
    pub para: ParameterizationMesh<I>,
    /// Distortion, flips and cut length.
    pub distortion: DistortionReport<I>,
    /// Chart label per face.
    pub charts: ChartSegmentation,
    /// Corners and segments of the layout boundary.
    pub boundary: BoundaryLayout<I>,
}

/// A loaded mesh and its derived data.
#[derive(Debug, Clone)]
pub struct MeshModel<I: MeshIndex = u32> {
    mesh: HalfEdgeMesh<I>,
    tex: Option<TexCoords>,
    normalization: Option<Normalization>,
    normals: Normals,
    triangles: Vec<u32>,
    edges: Vec<u32>,
    edge_index: Option<EdgeIndex<I>>,
    curvature_options: CurvatureOptions,
    curvature: CurvatureField,
}

impl<I: MeshIndex> Default for MeshModel<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: MeshIndex> MeshModel<I> {
    /// An empty model.
    pub fn new() -> Self {
        Self {
            mesh: HalfEdgeMesh::new(),
            tex: None,
            normalization: None,
            normals: Normals::default(),
            triangles: Vec::new(),
            edges: Vec::new(),
            edge_index: None,
            curvature_options: CurvatureOptions::default(),
            curvature: CurvatureField::default(),
        }
    }

    /// Load a mesh file, replacing the current mesh.
    ///
    /// The model is cleared before reading; on error it stays empty.
    pub fn load<P: AsRef<Path>>(&mut self, path: P, options: &LoadOptions) -> Result<()> {
        self.clear();
        let path = path.as_ref();
        let (mesh, tex) = io::load_with_uvs(path)?;
        info!("Loaded {}", path.display());
        self.install(mesh, tex, options)
    }

    /// Load from an in-memory reader in the given format.
    pub fn load_from_reader<R: BufRead>(
        &mut self,
        mut reader: R,
        format: Format,
        options: &LoadOptions,
    ) -> Result<()> {
        self.clear();
        let (mesh, tex) = match format {
            Format::Obj => obj::parse_with_uvs(reader)?,
            Format::Ply => ply::parse_with_uvs(&mut reader)?,
        };
        self.install(mesh, tex, options)
    }

    /// Replace the model with an already built mesh.
    pub fn set_mesh(
        &mut self,
        mesh: HalfEdgeMesh<I>,
        tex: Option<TexCoords>,
        options: &LoadOptions,
    ) -> Result<()> {
        self.clear();
        self.install(mesh, tex, options)
    }

    fn install(
        &mut self,
        mut mesh: HalfEdgeMesh<I>,
        tex: Option<TexCoords>,
        options: &LoadOptions,
    ) -> Result<()> {
        if mesh.num_faces() == 0 {
            return Err(MeshError::EmptyMesh);
        }

        let normalization = if options.normalize {
            normalize(&mut mesh, options.target_extent)?
        } else {
            None
        };

        self.normals = compute_normals(&mesh);
        self.triangles = triangle_index_buffer(&mesh);
        self.edges = edge_index_buffer(&mesh);
        self.edge_index = Some(EdgeIndex::new(&mesh));
        self.curvature_options = options.curvature.clone();
        self.curvature = compute_curvature(&mesh, &self.curvature_options);
        self.normalization = normalization;
        self.tex = tex;
        self.mesh = mesh;

        debug!(
            "Model: {} vertices, {} faces, {} triangles, {} edges, curvature {}",
            self.mesh.num_vertices(),
            self.mesh.num_faces(),
            self.triangles.len() / 3,
            self.edges.len() / 2,
            self.curvature.kind
        );
        Ok(())
    }

    /// Drop the mesh and all derived data.
    pub fn clear(&mut self) {
        self.mesh.clear();
        self.tex = None;
        self.normalization = None;
        self.normals = Normals::default();
        self.triangles.clear();
        self.edges.clear();
        self.edge_index = None;
        self.curvature = CurvatureField::default();
    }

    /// Whether a mesh is loaded.
    pub fn is_empty(&self) -> bool {
        self.mesh.num_faces() == 0
    }

    /// The mesh, in normalized coordinates if normalization was requested.
    pub fn mesh(&self) -> &HalfEdgeMesh<I> {
        &self.mesh
    }

    /// Texture coordinates read with the mesh.
    pub fn tex_coords(&self) -> Option<&TexCoords> {
        self.tex.as_ref()
    }

    /// Transform applied on load.
    pub fn normalization(&self) -> Option<&Normalization> {
        self.normalization.as_ref()
    }

    /// Face and vertex normals.
    pub fn normals(&self) -> &Normals {
        &self.normals
    }

    /// Fan-triangulated vertex indices, three per triangle.
    pub fn triangle_indices(&self) -> &[u32] {
        &self.triangles
    }

    /// Unique edge vertex indices, two per edge.
    pub fn edge_indices(&self) -> &[u32] {
        &self.edges
    }

    /// The active curvature field.
    pub fn curvature(&self) -> &CurvatureField {
        &self.curvature
    }

    /// Switch the active curvature field and recompute it.
    pub fn set_curvature_kind(&mut self, kind: CurvatureKind) {
        self.set_curvature_options(self.curvature_options.clone().with_kind(kind));
    }

    /// Replace the curvature options and recompute the field.
    pub fn set_curvature_options(&mut self, options: CurvatureOptions) {
        self.curvature_options = options;
        self.curvature = if self.is_empty() {
            CurvatureField::default()
        } else {
            compute_curvature(&self.mesh, &self.curvature_options)
        };
    }

    /// Shortest path between two vertices; empty when there is none.
    pub fn shortest_path(
        &self,
        source: VertexId<I>,
        target: VertexId<I>,
        options: &PathOptions,
    ) -> MeshPath<I> {
        shortest_path(&self.mesh, source, target, options)
    }

    /// Shortest path through `waypoints` in order; empty if any leg fails.
    pub fn path_through(&self, waypoints: &[VertexId<I>], options: &PathOptions) -> MeshPath<I> {
        shortest_path_through(&self.mesh, waypoints, options)
    }

    /// Edge ids along a path, for highlighting.
    pub fn path_edges(&self, path: &MeshPath<I>) -> Vec<EdgeId<I>> {
        self.edge_index
            .as_ref()
            .map(|index| path.edges(index))
            .unwrap_or_default()
    }

    /// Chart labels from the loaded texture coordinates.
    pub fn charts(&self) -> Result<ChartSegmentation> {
        let tex = self.require_tex()?;
        Ok(segment_charts(&self.mesh, tex))
    }

    /// Build the parameterization mesh and analyze it.
    ///
    /// # Errors
    /// - [`MeshError::EmptyMesh`] without a loaded mesh
    /// - [`MeshError::MissingTexCoords`] if the mesh has no or incomplete
    ///   texture coordinates
    pub fn analyze_parameterization(&self, options: &DistortionOptions) -> Result<UvAnalysis<I>> {
        let tex = self.require_tex()?;
        let para = ParameterizationMesh::build(&self.mesh, tex)?;
        let distortion = analyze_distortion(&self.mesh, &para, options);
        let charts = segment_charts(&self.mesh, tex);
        let boundary = detect_boundary_layout(&para);

        Ok(UvAnalysis {
            para,
            distortion,
            charts,
            boundary,
        })
    }

    fn require_tex(&self) -> Result<&TexCoords> {
        if self.is_empty() {
            return Err(MeshError::EmptyMesh);
        }
        self.tex.as_ref().ok_or(MeshError::MissingTexCoords { face: 0 })
    }
}
