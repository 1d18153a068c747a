//! Core mesh data structures.
//!
//! This module provides the half-edge mesh representation and the topology
//! preparation built on top of it.
//!
//! # Overview
//!
//! The primary type is [`HalfEdgeMesh`], which represents a polygon mesh using
//! a half-edge (doubly-connected edge list) data structure. This representation
//! provides O(1) adjacency queries, which the curvature, path and
//! parameterization algorithms rely on.
//!
//! # Index Types
//!
//! Mesh elements are identified by type-safe index wrappers:
//! - [`VertexId`] - Identifies a vertex
//! - [`HalfEdgeId`] - Identifies a half-edge
//! - [`FaceId`] - Identifies a face
//! - [`EdgeId`] - Identifies an undirected edge of an [`EdgeIndex`]
//!
//! These indices are generic over the underlying integer type ([`MeshIndex`] trait),
//! allowing you to choose `u16`, `u32`, or `u64` based on mesh size.
//!
//! # Construction
//!
//! Meshes are typically constructed from file I/O or from face-vertex lists:
//!
//! ```
//! use tessera::mesh::{HalfEdgeMesh, build_from_triangles, triangle_index_buffer};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 2]];
//!
//! let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
//! assert_eq!(triangle_index_buffer(&mesh), vec![0, 1, 2]);
//! ```

mod builder;
mod halfedge;
mod index;
pub mod topology;

pub use builder::{build_from_polygons, build_from_triangles, to_face_vertex};
pub use halfedge::{Circulator, Face, HalfEdge, HalfEdgeMesh, Vertex};
pub use index::{EdgeId, FaceId, HalfEdgeId, MeshIndex, VertexId};
pub use topology::{
    compute_normals, edge_index_buffer, normalize, triangle_index_buffer, triangulate_face,
    unique_edges, EdgeIndex, Normalization, Normals,
};
