//! # Tessera
//!
//! The geometry-processing core of a mesh viewer.
//!
//! Tessera keeps a polygon mesh in a half-edge arena and derives what a viewer
//! draws on top of it: curvature fields, shortest paths between picked
//! vertices, and a report on how well the mesh's UV layout preserves shape.
//!
//! ## Modules
//!
//! - [`mesh`]: typed ids, the half-edge arena, builders and topology
//!   preparation (normalization, normals, index buffers, edge numbering)
//! - [`io`]: OBJ with per-corner texture coordinates, and PLY
//! - [`algo::curvature`]: Gaussian, mean and max fields rescaled to `[0, 1]`
//! - [`algo::geodesic`]: Dijkstra and A* paths over the vertex graph
//! - [`algo::parameterize`]: Jacobian distortion, flipped faces, cut length,
//!   charts and boundary corners
//! - [`model`]: [`MeshModel`](model::MeshModel), which loads a file and keeps
//!   every derived buffer in sync
//!
//! ## Building a Mesh
//!
//! ```
//! use tessera::prelude::*;
//! use nalgebra::Point3;
//!
//! // A unit square made of two triangles.
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2], [0, 2, 3]]).unwrap();
//!
//! let path = shortest_path(&mesh, VertexId::new(0), VertexId::new(2), &PathOptions::default());
//! assert_eq!(path.len(), 2);
//! assert!((path.length - 2.0_f64.sqrt()).abs() < 1e-12);
//! ```
//!
//! ## The Viewer Pipeline
//!
//! ```no_run
//! use tessera::prelude::*;
//! use tessera::algo::parameterize::DistortionOptions;
//!
//! let mut model: MeshModel = MeshModel::new();
//! model.load("model.obj", &LoadOptions::default().with_curvature_kind(CurvatureKind::Mean)).unwrap();
//!
//! let triangles = model.triangle_indices();
//! let lines = model.edge_indices();
//! let curvature = &model.curvature().values;
//! let path = model.shortest_path(VertexId::new(0), VertexId::new(10), &PathOptions::default());
//!
//! if model.tex_coords().is_some() {
//!     let uv = model.analyze_parameterization(&DistortionOptions::default()).unwrap();
//!     println!("average distortion {:.4}, {} charts", uv.distortion.average, uv.charts.num_charts);
//! }
//! # let _ = (triangles, lines, curvature, path);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod io;
pub mod mesh;
pub mod model;

/// Common imports.
///
/// ```
/// use tessera::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::curvature::{compute_curvature, CurvatureKind, CurvatureOptions};
    pub use crate::algo::geodesic::{shortest_path, MeshPath, PathAlgorithm, PathOptions};
    pub use crate::error::{MeshError, Result};
    pub use crate::mesh::{
        build_from_polygons, build_from_triangles, to_face_vertex, EdgeId, Face, FaceId, HalfEdge,
        HalfEdgeId, HalfEdgeMesh, MeshIndex, Vertex, VertexId,
    };
    pub use crate::model::{LoadOptions, MeshModel};
}

pub use nalgebra;
