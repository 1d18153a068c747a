//! Geometry processing algorithms.
//!
//! - **Curvature**: per-vertex Gaussian, mean and max curvature fields
//! - **Geodesics**: shortest vertex paths with Dijkstra or A*
//! - **Parameterization**: UV distortion, seams and chart segmentation
//!
//! Every algorithm recomputes its result from scratch on the mesh it is given.

pub mod curvature;
pub mod geodesic;
pub mod parameterize;
