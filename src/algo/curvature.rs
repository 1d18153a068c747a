//! Discrete curvature estimation.
//!
//! Computes one scalar per vertex, selected by [`CurvatureKind`], and rescales
//! the field to `[0, 1]` for color mapping.
//!
//! # Curvature Types
//!
//! - **Gaussian K**: angle defect `2π − Σθ` divided by the mixed Voronoi area
//! - **Mean**: `0.5 · sqrt(A_mixed)`, the viewer's historical mean measure
//! - **Max**: Gaussian + Mean
//! - **MeanLaplacian**: magnitude of the cotangent Laplace-Beltrami operator,
//!   `H = |Δx| / 2`, signed against the vertex normal
//!
//! Boundary vertices always get 0 and take no part in normalization.
//!
//! # Example
//!
//! ```no_run
//! use tessera::prelude::*;
//! use tessera::algo::curvature::{compute_curvature, CurvatureKind, CurvatureOptions};
//!
//! let mesh: HalfEdgeMesh = tessera::io::load("mesh.obj").unwrap();
//! let field = compute_curvature(&mesh, &CurvatureOptions::new(CurvatureKind::Gaussian));
//! println!("value at v0: {}", field.get(VertexId::<u32>::new(0)));
//! ```
//!
//! # References
//!
//! - Meyer, M., et al. (2003). "Discrete Differential-Geometry Operators for
//!   Triangulated 2-Manifolds." Visualization and Mathematics III.

use std::f64::consts::PI;
use std::fmt;

use log::{debug, trace};
use nalgebra::{Point3, Vector3};

use crate::mesh::{HalfEdgeId, HalfEdgeMesh, MeshIndex, VertexId};

/// Default area threshold below which triangles and vertex areas are ignored.
pub const DEFAULT_AREA_EPSILON: f64 = 1e-4;

/// Which scalar field to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CurvatureKind {
    /// Angle defect over mixed area.
    #[default]
    Gaussian,
    /// `0.5 · sqrt(A_mixed)`.
    Mean,
    /// Gaussian + Mean.
    Max,
    /// Cotangent Laplace-Beltrami mean curvature.
    MeanLaplacian,
    /// All zeros.
    None,
}

impl fmt::Display for CurvatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CurvatureKind::Gaussian => "gaussian",
            CurvatureKind::Mean => "mean",
            CurvatureKind::Max => "max",
            CurvatureKind::MeanLaplacian => "mean-laplacian",
            CurvatureKind::None => "none",
        };
        f.write_str(name)
    }
}

/// Area used as the denominator of the Gaussian curvature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GaussianArea {
    /// Mixed Voronoi area.
    #[default]
    Mixed,
    /// One third of each incident corner triangle.
    Barycentric,
}

/// Options for [`compute_curvature`].
#[derive(Debug, Clone)]
pub struct CurvatureOptions {
    /// Field to compute.
    pub kind: CurvatureKind,
    /// Rescale non-boundary values to `[0, 1]`.
    pub normalize: bool,
    /// Triangles and vertex areas at or below this are ignored.
    pub area_epsilon: f64,
    /// Denominator of the Gaussian curvature.
    pub gaussian_area: GaussianArea,
}

impl Default for CurvatureOptions {
    fn default() -> Self {
        Self {
            kind: CurvatureKind::Gaussian,
            normalize: true,
            area_epsilon: DEFAULT_AREA_EPSILON,
            gaussian_area: GaussianArea::Mixed,
        }
    }
}

impl CurvatureOptions {
    /// Default options computing `kind`.
    pub fn new(kind: CurvatureKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    /// Set the field to compute.
    pub fn with_kind(mut self, kind: CurvatureKind) -> Self {
        self.kind = kind;
        self
    }

    /// Enable or disable `[0, 1]` rescaling.
    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    /// Set the area threshold.
    pub fn with_area_epsilon(mut self, epsilon: f64) -> Self {
        self.area_epsilon = epsilon;
        self
    }

    /// Set the Gaussian curvature denominator.
    pub fn with_gaussian_area(mut self, area: GaussianArea) -> Self {
        self.gaussian_area = area;
        self
    }
}

/// All curvature quantities of one interior vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexCurvature {
    /// `2π` minus the sum of incident corner angles.
    pub angle_defect: f64,
    /// Mixed Voronoi area.
    pub mixed_area: f64,
    /// Gaussian curvature.
    pub gaussian: f64,
    /// `0.5 · sqrt(mixed_area)`.
    pub mean: f64,
    /// Signed cotangent-Laplacian mean curvature.
    pub mean_laplacian: f64,
}

impl VertexCurvature {
    /// The scalar selected by `kind`.
    pub fn value(&self, kind: CurvatureKind) -> f64 {
        match kind {
            CurvatureKind::Gaussian => self.gaussian,
            CurvatureKind::Mean => self.mean,
            CurvatureKind::Max => self.gaussian + self.mean,
            CurvatureKind::MeanLaplacian => self.mean_laplacian,
            CurvatureKind::None => 0.0,
        }
    }
}

/// Per-vertex scalar field produced by [`compute_curvature`].
#[derive(Debug, Clone, Default)]
pub struct CurvatureField {
    /// One value per vertex.
    pub values: Vec<f64>,
    /// The field these values represent.
    pub kind: CurvatureKind,
    /// Raw `(min, max)` over non-boundary vertices, before rescaling.
    pub range: Option<(f64, f64)>,
}

impl CurvatureField {
    /// Value at a vertex.
    #[inline]
    pub fn get<I: MeshIndex>(&self, v: VertexId<I>) -> f64 {
        self.values[v.index()]
    }

    /// Number of values.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// The corner triangle of `v` in the face of outgoing half-edge `he`:
/// `(v, dest(he), origin(prev(he)))`.
fn corner_triangle<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    he: HalfEdgeId<I>,
) -> [Point3<f64>; 3] {
    [
        *mesh.position(mesh.origin(he)),
        *mesh.position(mesh.dest(he)),
        *mesh.position(mesh.origin(mesh.prev(he))),
    ]
}

/// Angle at `a` in triangle `(a, b, c)`.
fn triangle_angle(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> f64 {
    let (Some(ab), Some(ac)) = ((b - a).try_normalize(0.0), (c - a).try_normalize(0.0)) else {
        return 0.0;
    };
    ab.dot(&ac).clamp(-1.0, 1.0).acos()
}

/// Cotangent of the angle at `a` in triangle `(a, b, c)`.
fn cotangent_angle(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> f64 {
    let ab = b - a;
    let ac = c - a;
    let cross_norm = ab.cross(&ac).norm();
    if cross_norm < 1e-12 {
        0.0
    } else {
        ab.dot(&ac) / cross_norm
    }
}

fn triangle_area(p: &[Point3<f64>; 3]) -> f64 {
    0.5 * (p[1] - p[0]).cross(&(p[2] - p[0])).norm()
}

/// Mixed Voronoi contribution of the corner triangle `(v, a, b)` to `v`.
fn mixed_area_contribution(tri: &[Point3<f64>; 3], epsilon: f64) -> f64 {
    let [pv, pa, pb] = tri;
    let area = triangle_area(tri);
    if area <= epsilon {
        return 0.0;
    }

    let va = pa - pv;
    let vb = pb - pv;
    let non_obtuse =
        va.dot(&vb) >= 0.0 && (pv - pa).dot(&(pb - pa)) >= 0.0 && (pv - pb).dot(&(pa - pb)) >= 0.0;

    if non_obtuse {
        let cot_a = cotangent_angle(pa, pv, pb);
        let cot_b = cotangent_angle(pb, pv, pa);
        (va.norm_squared() * cot_b + vb.norm_squared() * cot_a) / 8.0
    } else if va.dot(&vb) < 0.0 {
        area / 2.0
    } else {
        area / 4.0
    }
}

/// Unnormalized Laplace-Beltrami `0.5 · Σ (cot α + cot β)(x_j − x_i)`.
fn laplacian_vector<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, v: VertexId<I>) -> Vector3<f64> {
    let p_v = mesh.position(v);
    let mut laplacian = Vector3::zeros();

    for he in mesh.vertex_halfedges(v) {
        let p_j = mesh.position(mesh.dest(he));
        let mut cot_sum = 0.0;

        if !mesh.is_boundary_halfedge(he) {
            let p_opp = mesh.position(mesh.origin(mesh.prev(he)));
            cot_sum += cotangent_angle(p_opp, p_v, p_j);
        }

        let twin = mesh.twin(he);
        if !mesh.is_boundary_halfedge(twin) {
            let p_opp = mesh.position(mesh.dest(mesh.next(twin)));
            cot_sum += cotangent_angle(p_opp, p_v, p_j);
        }

        laplacian += cot_sum.max(0.0) * (p_j - p_v);
    }

    0.5 * laplacian
}

/// Every curvature quantity at `v`, or `None` for a boundary vertex.
pub fn vertex_curvature<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    v: VertexId<I>,
    options: &CurvatureOptions,
) -> Option<VertexCurvature> {
    if mesh.is_boundary_vertex(v) {
        return None;
    }

    let eps = options.area_epsilon;
    let mut angle_defect = 2.0 * PI;
    let mut mixed_area = 0.0;
    let mut barycentric_area = 0.0;

    for he in mesh.vertex_halfedges(v) {
        let tri = corner_triangle(mesh, he);
        angle_defect -= triangle_angle(&tri[0], &tri[1], &tri[2]);
        mixed_area += mixed_area_contribution(&tri, eps);
        barycentric_area += triangle_area(&tri) / 3.0;
    }

    let gaussian_area = match options.gaussian_area {
        GaussianArea::Mixed => mixed_area,
        GaussianArea::Barycentric => barycentric_area,
    };
    let gaussian = if gaussian_area > eps {
        angle_defect / gaussian_area
    } else {
        0.0
    };

    let (mean, mean_laplacian) = if mixed_area > eps {
        let lap = laplacian_vector(mesh, v) / mixed_area;
        let sign = if lap.dot(&mesh.vertex_normal(v)) >= 0.0 { 1.0 } else { -1.0 };
        (0.5 * mixed_area.sqrt(), sign * lap.norm() / 2.0)
    } else {
        (0.0, 0.0)
    };

    Some(VertexCurvature {
        angle_defect,
        mixed_area,
        gaussian,
        mean,
        mean_laplacian,
    })
}

/// Rescale `values` to `[0, 1]` using the min/max of non-boundary entries.
///
/// Returns the raw `(min, max)`, or `None` when every vertex is on the
/// boundary. Values are left as-is when `max == min`; boundary entries are
/// never touched.
pub fn normalize_field(values: &mut [f64], is_boundary: &[bool]) -> Option<(f64, f64)> {
    let range = field_range(values, is_boundary)?;
    let (min, max) = range;
    let span = max - min;
    if span > 0.0 {
        for (value, _) in values
            .iter_mut()
            .zip(is_boundary)
            .filter(|(_, boundary)| !**boundary)
        {
            *value = (*value - min) / span;
        }
    }
    Some(range)
}

fn field_range(values: &[f64], is_boundary: &[bool]) -> Option<(f64, f64)> {
    values
        .iter()
        .zip(is_boundary)
        .filter(|(_, boundary)| !**boundary)
        .map(|(&v, _)| v)
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((f64::min(lo, v), f64::max(hi, v))),
        })
}

/// Compute the curvature field selected by `options.kind`.
///
/// # Example
///
/// ```
/// use tessera::mesh::{build_from_polygons, HalfEdgeMesh};
/// use tessera::algo::curvature::{compute_curvature, CurvatureKind, CurvatureOptions};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(1.0, 1.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
/// ];
/// let mesh: HalfEdgeMesh = build_from_polygons(&vertices, &[vec![0, 1, 2, 3]]).unwrap();
///
/// // Every vertex of a lone quad is on the boundary.
/// let field = compute_curvature(&mesh, &CurvatureOptions::new(CurvatureKind::Mean));
/// assert!(field.values.iter().all(|&k| k == 0.0));
/// assert!(field.range.is_none());
/// ```
pub fn compute_curvature<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    options: &CurvatureOptions,
) -> CurvatureField {
    let kind = options.kind;
    let is_boundary: Vec<bool> = mesh.vertex_ids().map(|v| mesh.is_boundary_vertex(v)).collect();

    let mut values: Vec<f64> = mesh
        .vertex_ids()
        .map(|v| {
            if kind == CurvatureKind::None {
                return 0.0;
            }
            let value = vertex_curvature(mesh, v, options).map_or(0.0, |c| c.value(kind));
            trace!("{:?}: {} = {}", v, kind, value);
            value
        })
        .collect();

    let range = if options.normalize {
        normalize_field(&mut values, &is_boundary)
    } else {
        field_range(&values, &is_boundary)
    };

    debug!(
        "{} curvature over {} vertices ({} interior), raw range {:?}",
        kind,
        values.len(),
        is_boundary.iter().filter(|&&b| !b).count(),
        range
    );

    CurvatureField {
        values,
        kind,
        range,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{build_from_polygons, build_from_triangles, HalfEdgeMesh};

    fn create_flat_grid(n: usize) -> HalfEdgeMesh {
        let mut vertices = Vec::new();
        let mut faces = Vec::new();

        for j in 0..=n {
            for i in 0..=n {
                vertices.push(Point3::new(i as f64, j as f64, 0.0));
            }
        }

        for j in 0..n {
            for i in 0..n {
                let v00 = j * (n + 1) + i;
                let v10 = j * (n + 1) + i + 1;
                let v01 = (j + 1) * (n + 1) + i;
                let v11 = (j + 1) * (n + 1) + i + 1;

                faces.push([v00, v10, v11]);
                faces.push([v00, v11, v01]);
            }
        }

        build_from_triangles(&vertices, &faces).unwrap()
    }

    fn create_icosphere(subdivisions: usize) -> HalfEdgeMesh {
        let phi = (1.0 + 5.0_f64.sqrt()) / 2.0;
        let scale = 1.0 / (1.0 + phi * phi).sqrt();

        let mut vertices = vec![
            Point3::new(-1.0, phi, 0.0) * scale,
            Point3::new(1.0, phi, 0.0) * scale,
            Point3::new(-1.0, -phi, 0.0) * scale,
            Point3::new(1.0, -phi, 0.0) * scale,
            Point3::new(0.0, -1.0, phi) * scale,
            Point3::new(0.0, 1.0, phi) * scale,
            Point3::new(0.0, -1.0, -phi) * scale,
            Point3::new(0.0, 1.0, -phi) * scale,
            Point3::new(phi, 0.0, -1.0) * scale,
            Point3::new(phi, 0.0, 1.0) * scale,
            Point3::new(-phi, 0.0, -1.0) * scale,
            Point3::new(-phi, 0.0, 1.0) * scale,
        ];

        let mut faces = vec![
            [0, 11, 5],
            [0, 5, 1],
            [0, 1, 7],
            [0, 7, 10],
            [0, 10, 11],
            [1, 5, 9],
            [5, 11, 4],
            [11, 10, 2],
            [10, 7, 6],
            [7, 1, 8],
            [3, 9, 4],
            [3, 4, 2],
            [3, 2, 6],
            [3, 6, 8],
            [3, 8, 9],
            [4, 9, 5],
            [2, 4, 11],
            [6, 2, 10],
            [8, 6, 7],
            [9, 8, 1],
        ];

        for _ in 0..subdivisions {
            let mut new_faces = Vec::new();
            let mut edge_midpoints: std::collections::HashMap<(usize, usize), usize> =
                std::collections::HashMap::new();

            for face in &faces {
                let mut mids = [0usize; 3];
                for i in 0..3 {
                    let v0 = face[i];
                    let v1 = face[(i + 1) % 3];
                    let key = (v0.min(v1), v0.max(v1));
                    mids[i] = *edge_midpoints.entry(key).or_insert_with(|| {
                        let mid = (vertices[v0].coords + vertices[v1].coords).normalize();
                        vertices.push(Point3::from(mid));
                        vertices.len() - 1
                    });
                }

                new_faces.push([face[0], mids[0], mids[2]]);
                new_faces.push([face[1], mids[1], mids[0]]);
                new_faces.push([face[2], mids[2], mids[1]]);
                new_faces.push([mids[0], mids[1], mids[2]]);
            }
            faces = new_faces;
        }

        build_from_triangles(&vertices, &faces).unwrap()
    }

    fn raw(kind: CurvatureKind) -> CurvatureOptions {
        CurvatureOptions::new(kind).with_normalize(false)
    }

    #[test]
    fn test_flat_interior_has_zero_gaussian() {
        let mesh = create_flat_grid(3);
        let field = compute_curvature(&mesh, &raw(CurvatureKind::Gaussian));

        // (1,1) is interior
        let k = field.get(VertexId::<u32>::new(5));
        assert!(k.abs() < 1e-9, "flat interior K = {}", k);

        let lap = compute_curvature(&mesh, &raw(CurvatureKind::MeanLaplacian));
        assert!(lap.get(VertexId::<u32>::new(5)).abs() < 1e-9);
    }

    #[test]
    fn test_boundary_vertices_are_zero() {
        let mesh = create_flat_grid(3);
        let field = compute_curvature(&mesh, &raw(CurvatureKind::Mean));
        for v in mesh.vertex_ids() {
            if mesh.is_boundary_vertex(v) {
                assert_eq!(field.get(v), 0.0);
            } else {
                assert!(field.get(v) > 0.0);
            }
        }
    }

    #[test]
    fn test_gauss_bonnet() {
        // Σ K·A = Σ defect = 2π·χ = 4π on a sphere
        let mesh = create_icosphere(2);
        let options = CurvatureOptions::default();

        let total: f64 = mesh
            .vertex_ids()
            .map(|v| {
                let c = vertex_curvature(&mesh, v, &options).unwrap();
                c.gaussian * c.mixed_area
            })
            .sum();

        assert!(
            (total - 4.0 * PI).abs() < 1e-6,
            "Gauss-Bonnet violated: got {}",
            total
        );
    }

    #[test]
    fn test_sphere_laplacian_mean() {
        let mesh = create_icosphere(3);
        let options = CurvatureOptions::default().with_area_epsilon(0.0);
        for v in mesh.vertex_ids().step_by(17) {
            let c = vertex_curvature(&mesh, v, &options).unwrap();
            assert!(
                (c.mean_laplacian.abs() - 1.0).abs() < 0.25,
                "unit sphere H = {}",
                c.mean_laplacian
            );
            assert!((c.gaussian - 1.0).abs() < 0.25, "unit sphere K = {}", c.gaussian);
        }
    }

    #[test]
    fn test_mean_and_max_formulas() {
        let mesh = create_icosphere(1);
        let options = CurvatureOptions::default();
        let v = VertexId::<u32>::new(0);
        let c = vertex_curvature(&mesh, v, &options).unwrap();

        assert!((c.mean - 0.5 * c.mixed_area.sqrt()).abs() < 1e-12);
        assert!((c.value(CurvatureKind::Max) - (c.gaussian + c.mean)).abs() < 1e-12);
        assert_eq!(c.value(CurvatureKind::None), 0.0);
    }

    #[test]
    fn test_barycentric_area_option() {
        let mesh = create_icosphere(1);
        let v = VertexId::<u32>::new(3);
        let bary = CurvatureOptions::default().with_gaussian_area(GaussianArea::Barycentric);
        let c = vertex_curvature(&mesh, v, &bary).unwrap();

        let area: f64 = mesh.vertex_faces(v).map(|f| mesh.face_area(f) / 3.0).sum();
        assert!((c.gaussian - c.angle_defect / area).abs() < 1e-9);
    }

    #[test]
    fn test_normalized_closed_mesh() {
        // A bumpy sphere so values are not all equal.
        let mut mesh = create_icosphere(1);
        let bump = VertexId::<u32>::new(0);
        let p = *mesh.position(bump);
        mesh.set_position(bump, p * 1.4);

        for kind in [CurvatureKind::Gaussian, CurvatureKind::Mean, CurvatureKind::Max] {
            let field = compute_curvature(&mesh, &CurvatureOptions::new(kind));
            let min = field.values.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = field.values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            assert!(min.abs() < 1e-12, "{}: min {}", kind, min);
            assert!((max - 1.0).abs() < 1e-12, "{}: max {}", kind, max);
            assert!(field.range.is_some());
        }
    }

    #[test]
    fn test_normalize_field() {
        let mut values = vec![5.0, 2.0, 4.0, 100.0];
        let boundary = [false, false, false, true];
        let range = normalize_field(&mut values, &boundary);

        assert_eq!(range, Some((2.0, 5.0)));
        assert_eq!(values, vec![1.0, 0.0, 2.0 / 3.0, 100.0]);

        let mut flat = vec![3.0, 3.0];
        assert_eq!(normalize_field(&mut flat, &[false, false]), Some((3.0, 3.0)));
        assert_eq!(flat, vec![3.0, 3.0]);

        let mut all_boundary = vec![1.0];
        assert_eq!(normalize_field(&mut all_boundary, &[true]), None);
    }

    #[test]
    fn test_flat_quad_is_all_boundary() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mesh: HalfEdgeMesh = build_from_polygons(&vertices, &[vec![0, 1, 2, 3]]).unwrap();
        for kind in [CurvatureKind::Gaussian, CurvatureKind::Max] {
            let field = compute_curvature(&mesh, &CurvatureOptions::new(kind));
            assert!(field.values.iter().all(|&k| k == 0.0));
        }
    }

    #[test]
    fn test_tiny_triangles_fall_below_epsilon() {
        let mesh = create_icosphere(1);
        let mut scaled = mesh.clone();
        for v in mesh.vertex_ids() {
            scaled.set_position(v, *mesh.position(v) * 1e-3);
        }
        let c = vertex_curvature(&scaled, VertexId::new(0), &CurvatureOptions::default()).unwrap();
        assert_eq!(c.mixed_area, 0.0);
        assert_eq!(c.gaussian, 0.0);
        assert_eq!(c.mean, 0.0);
    }
}
