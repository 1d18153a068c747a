//! Parameterization distortion analysis.
//!
//! Compares each mesh triangle with its UV image through the 2×2 Jacobian of
//! the map. The UV layout is first rescaled as a whole so that its area
//! matches the surface area, which makes the measure independent of the
//! layout's scale.
//!
//! # Metric
//!
//! With singular values `σmax ≥ σmin` of the Jacobian, the per-triangle
//! distortion is
//!
//! ```text
//! (σmax² + σmin² + 1/σmax² + 1/σmin²) / 4
//! ```
//!
//! which is exactly 1 for an isometry and grows with stretch or shrink in
//! either direction. Polygons are fan-triangulated; a polygon's value is the
//! area-weighted mean of its triangles.
//!
//! # Cut length
//!
//! Seams are edges whose two sides use different texture coordinates at
//! either endpoint. They open up into two boundary edges in UV space and count
//! twice; boundary edges of the surface count once.

use std::collections::BTreeSet;

use log::{debug, info, warn};
use nalgebra::{Matrix2, Point2, Vector2, Vector3};

use crate::mesh::{EdgeIndex, FaceId, HalfEdgeMesh, MeshIndex};

use super::correspondence::ParameterizationMesh;

/// Determinants at or below this magnitude mark a degenerate UV triangle.
pub const DEFAULT_DET_EPSILON: f64 = 1e-12;

/// Options for [`analyze_distortion`].
#[derive(Debug, Clone)]
pub struct DistortionOptions {
    /// UV triangles with `|det| <= epsilon` are skipped.
    pub epsilon: f64,
}

impl Default for DistortionOptions {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_DET_EPSILON,
        }
    }
}

impl DistortionOptions {
    /// Set the degeneracy threshold.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }
}

/// Result of [`analyze_distortion`].
#[derive(Debug, Clone)]
pub struct DistortionReport<I: MeshIndex = u32> {
    /// Per-face distortion; `None` when every triangle of the face was skipped.
    pub per_face: Vec<Option<f64>>,
    /// Faces with at least one UV triangle of negative orientation.
    pub flipped: BTreeSet<FaceId<I>>,
    /// Area-weighted mean distortion over the total surface area.
    pub average: f64,
    /// `sqrt(total_uv_area / total_area)`, applied to mesh lengths.
    pub area_factor: f64,
    /// Surface area of the mesh.
    pub total_area: f64,
    /// Area of the UV layout.
    pub total_uv_area: f64,
    /// Seam length counted twice plus boundary length.
    pub cut_length: f64,
    /// Cut length over the bounding-box diagonal of the mesh.
    pub normalized_cut_length: f64,
    /// Faces whose UV image keeps its orientation.
    pub n_positive: usize,
    /// Faces whose UV image is mirrored.
    pub n_negative: usize,
    /// Faces without any usable triangle.
    pub skipped: usize,
    /// Bounding box of the UV coordinates.
    pub uv_bbox: Option<(Point2<f64>, Point2<f64>)>,
}

impl<I: MeshIndex> Default for DistortionReport<I> {
    fn default() -> Self {
        Self {
            per_face: Vec::new(),
            flipped: BTreeSet::new(),
            average: 0.0,
            area_factor: 0.0,
            total_area: 0.0,
            total_uv_area: 0.0,
            cut_length: 0.0,
            normalized_cut_length: 0.0,
            n_positive: 0,
            n_negative: 0,
            skipped: 0,
            uv_bbox: None,
        }
    }
}

impl<I: MeshIndex> DistortionReport<I> {
    /// Distortion of a face, if it could be measured.
    #[inline]
    pub fn face(&self, f: FaceId<I>) -> Option<f64> {
        self.per_face.get(f.index()).copied().flatten()
    }

    /// Whether a face is mirrored in UV space.
    #[inline]
    pub fn is_flipped(&self, f: FaceId<I>) -> bool {
        self.flipped.contains(&f)
    }

    /// Largest per-face distortion.
    pub fn max(&self) -> Option<f64> {
        self.per_face.iter().flatten().copied().max_by(f64::total_cmp)
    }
}

/// Seam classification of the edges of a mesh.
#[derive(Debug, Clone, Default)]
pub struct CutEdges {
    /// Per edge: boundary of the surface or seam of the layout.
    pub is_cut: Vec<bool>,
    /// Boundary length plus twice the seam length.
    pub length: f64,
}

impl CutEdges {
    /// Number of cut edges.
    pub fn count(&self) -> usize {
        self.is_cut.iter().filter(|&&c| c).count()
    }
}

/// One fan triangle of a face: 3D corners and UV corners.
type CornerTriangle = ([Vector3<f64>; 3], [Vector2<f64>; 3]);

fn fan_triangles<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    pm: &ParameterizationMesh<I>,
    f: FaceId<I>,
) -> Vec<CornerTriangle> {
    let corners: Vec<(Vector3<f64>, Vector2<f64>)> = mesh
        .face_halfedges(f)
        .filter_map(|he| {
            let uv = pm.corner_uv(he)?;
            Some((mesh.position(mesh.origin(he)).coords, uv.coords))
        })
        .collect();

    if corners.len() != mesh.face_valence(f) {
        return Vec::new();
    }

    (1..corners.len().saturating_sub(1))
        .map(|k| {
            let (a, b, c) = (corners[0], corners[k], corners[k + 1]);
            ([a.0, b.0, c.0], [a.1, b.1, c.1])
        })
        .collect()
}

fn uv_cross(u1: &Vector2<f64>, u2: &Vector2<f64>) -> f64 {
    u1.x * u2.y - u1.y * u2.x
}

/// Distortion of one triangle, and whether its UV image is mirrored.
///
/// Returns `None` for triangles that are degenerate in 3D or in UV space.
fn triangle_distortion(
    positions: &[Vector3<f64>; 3],
    uvs: &[Vector2<f64>; 3],
    factor: f64,
    epsilon: f64,
) -> Option<(f64, bool)> {
    let p1 = (positions[1] - positions[0]) * factor;
    let p2 = (positions[2] - positions[0]) * factor;
    let q1 = uvs[1] - uvs[0];
    let q2 = uvs[2] - uvs[0];

    let normal = p1.cross(&p2).try_normalize(f64::EPSILON)?;
    let e1 = p1.try_normalize(f64::EPSILON)?;
    let e2 = normal.cross(&e1);

    let mesh_m = Matrix2::new(p1.norm(), p2.dot(&e1), 0.0, p2.dot(&e2));
    let mut para_m = Matrix2::new(q1.x, q2.x, q1.y, q2.y);

    let det = para_m.determinant();
    if det.abs() <= epsilon {
        return None;
    }
    let flipped = det < 0.0;
    if flipped {
        let mirrored = -para_m.row(0);
        para_m.set_row(0, &mirrored);
    }

    let jacobian = para_m * mesh_m.try_inverse()?;
    let sigma = jacobian.singular_values();
    let (s_max, s_min) = (sigma.max(), sigma.min());
    if s_min <= f64::EPSILON {
        return None;
    }

    let d = (s_max * s_max + s_min * s_min + 1.0 / (s_max * s_max) + 1.0 / (s_min * s_min)) * 0.25;
    Some((d, flipped))
}

/// Measure the distortion of the UV layout `pm` of `mesh`.
///
/// Cut lengths are included; see [`cut_edges`] for the classification alone.
///
/// # Example
///
/// ```
/// use nalgebra::{Point2, Point3};
/// use tessera::prelude::*;
/// use tessera::algo::parameterize::{analyze_distortion, DistortionOptions, ParameterizationMesh, TexCoords};
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
/// ];
/// let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
/// let uvs = vec![Point2::new(0.0, 0.0), Point2::new(2.0, 0.0), Point2::new(0.0, 2.0)];
/// let tex = TexCoords::from_vertex_coords(&mesh, uvs);
/// let pm = ParameterizationMesh::build(&mesh, &tex).unwrap();
///
/// let report = analyze_distortion(&mesh, &pm, &DistortionOptions::default());
/// assert!((report.average - 1.0).abs() < 1e-9);
/// ```
pub fn analyze_distortion<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    pm: &ParameterizationMesh<I>,
    options: &DistortionOptions,
) -> DistortionReport<I> {
    let triangles: Vec<Vec<CornerTriangle>> = mesh
        .face_ids()
        .map(|f| fan_triangles(mesh, pm, f))
        .collect();

    let mut total_area = 0.0;
    let mut total_uv_area = 0.0;
    for (p, q) in triangles.iter().flatten() {
        total_area += (p[1] - p[0]).cross(&(p[2] - p[0])).norm() * 0.5;
        total_uv_area += uv_cross(&(q[1] - q[0]), &(q[2] - q[0])).abs() * 0.5;
    }

    let mut report = DistortionReport {
        per_face: vec![None; mesh.num_faces()],
        total_area,
        total_uv_area,
        uv_bbox: pm.uv.bounding_box(),
        ..DistortionReport::default()
    };

    if total_area <= f64::EPSILON || total_uv_area <= f64::EPSILON {
        warn!(
            "Distortion: degenerate input (surface area {}, UV area {})",
            total_area, total_uv_area
        );
        report.skipped = mesh.num_faces();
        return report;
    }

    let factor = (total_uv_area / total_area).sqrt();
    report.area_factor = factor;

    let mut weighted_sum = 0.0;
    for (f, face_triangles) in mesh.face_ids().zip(&triangles) {
        let mut face_sum = 0.0;
        let mut face_area = 0.0;
        let mut face_flipped = false;

        for (p, q) in face_triangles {
            let Some((d, flipped)) = triangle_distortion(p, q, factor, options.epsilon) else {
                continue;
            };
            let area = (p[1] - p[0]).cross(&(p[2] - p[0])).norm() * 0.5;
            face_sum += d * area;
            face_area += area;
            face_flipped |= flipped;
        }

        if face_area <= 0.0 {
            report.skipped += 1;
            continue;
        }

        report.per_face[f.index()] = Some(face_sum / face_area);
        weighted_sum += face_sum;
        if face_flipped {
            report.flipped.insert(f);
            report.n_negative += 1;
        } else {
            report.n_positive += 1;
        }
    }

    report.average = weighted_sum / total_area;

    let edges = EdgeIndex::new(mesh);
    let cuts = cut_edges(mesh, pm, &edges);
    report.cut_length = cuts.length;
    report.normalized_cut_length = match mesh.bounding_box() {
        Some((min, max)) if (max - min).norm() > 0.0 => cuts.length / (max - min).norm(),
        _ => 0.0,
    };

    if report.skipped > 0 {
        debug!("Distortion: skipped {} degenerate faces", report.skipped);
    }
    info!(
        "Distortion: average {:.6}, {} flipped of {} faces, cut length {:.6} (normalized {:.6})",
        report.average,
        report.flipped.len(),
        mesh.num_faces(),
        report.cut_length,
        report.normalized_cut_length
    );

    report
}

/// Classify every edge of `mesh` as cut or not.
///
/// An interior edge is a seam when its two half-edges disagree on the texture
/// coordinate at either endpoint, that is when the layout does not glue the
/// two incident faces along it.
pub fn cut_edges<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    pm: &ParameterizationMesh<I>,
    edges: &EdgeIndex<I>,
) -> CutEdges {
    let mut cuts = CutEdges {
        is_cut: vec![false; edges.num_edges()],
        length: 0.0,
    };

    for e in edges.edge_ids() {
        let he = edges.halfedge(e);
        if mesh.is_boundary_edge(he) {
            cuts.is_cut[e.index()] = true;
            cuts.length += mesh.edge_length(he);
            continue;
        }

        let (p0, p1) = (pm.mesh_to_para(he), pm.mesh_to_para(mesh.twin(he)));
        if !p0.is_valid() || !p1.is_valid() {
            continue;
        }
        let para = &pm.para;
        let is_cut = para.origin(p0) != para.dest(p1) || para.dest(p0) != para.origin(p1);
        if is_cut {
            cuts.is_cut[e.index()] = true;
            cuts.length += 2.0 * mesh.edge_length(he);
        }
    }

    cuts
}
