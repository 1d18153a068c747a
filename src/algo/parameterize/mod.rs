//! UV parameterization analysis.
//!
//! Loaded meshes may carry texture coordinates. This module turns them into a
//! parameterization mesh aligned with the surface and measures how good the
//! layout is.
//!
//! # Components
//!
//! - [`TexCoords`]: per-corner texture indices as read from a file
//! - [`ParameterizationMesh`]: the layout as a half-edge mesh with half-edge
//!   correspondence to the surface
//! - [`analyze_distortion`]: per-face Jacobian distortion, flipped faces and
//!   cut length
//! - [`segment_charts`] and [`detect_boundary_layout`]: chart labels and
//!   boundary corners
//!
//! # Example
//!
//! ```no_run
//! use tessera::algo::parameterize::{analyze_distortion, DistortionOptions, ParameterizationMesh};
//! use tessera::mesh::HalfEdgeMesh;
//!
//! let (mesh, tex): (HalfEdgeMesh, _) = tessera::io::load_with_uvs("input.obj").unwrap();
//! let tex = tex.expect("mesh has no texture coordinates");
//!
//! let pm = ParameterizationMesh::build(&mesh, &tex).unwrap();
//! let report = analyze_distortion(&mesh, &pm, &DistortionOptions::default());
//! println!("average distortion {:.4}, {} flipped", report.average, report.flipped.len());
//! ```
//!
//! # References
//!
//! - Sander, P. V., et al. (2001). "Texture Mapping Progressive Meshes."
//!   ACM SIGGRAPH.

mod charts;
mod correspondence;
mod distortion;
mod texcoords;
mod uv;

pub use charts::{
    chart_color, detect_boundary_layout, layout_edge_colors, segment_charts, BoundaryCorner,
    BoundaryLayout, BoundaryLoop, BoundarySegment, ChartSegmentation, BOUNDARY_EDGE_COLOR,
    CHART_PALETTE, INTERIOR_EDGE_COLOR,
};
pub use correspondence::ParameterizationMesh;
pub use distortion::{
    analyze_distortion, cut_edges, CutEdges, DistortionOptions, DistortionReport,
    DEFAULT_DET_EPSILON,
};
pub use texcoords::TexCoords;
pub use uv::UVMap;
