//! Chart segmentation and boundary layout of a UV parameterization.
//!
//! A chart is a maximal set of faces glued together in UV space, i.e.
//! connected through shared texture coordinates. [`segment_charts`] labels the
//! faces of a mesh by chart; [`detect_boundary_layout`] walks the boundary
//! loops of the layout and classifies boundary vertices by the interior angle
//! of their face fan, which is how quad-like charts reveal their corners.

use std::collections::VecDeque;
use std::f64::consts::FRAC_PI_2;
use std::ops::Range;

use log::{debug, warn};
use nalgebra::Vector3;

use crate::mesh::{EdgeIndex, FaceId, HalfEdgeId, HalfEdgeMesh, MeshIndex, VertexId};

use super::correspondence::ParameterizationMesh;
use super::texcoords::TexCoords;

/// Color of boundary edges in a layout view.
pub const BOUNDARY_EDGE_COLOR: [u8; 3] = [229, 156, 59];

/// Color of interior edges in a layout view.
pub const INTERIOR_EDGE_COLOR: [u8; 3] = [100, 100, 100];

/// Face colors cycled by chart id.
pub const CHART_PALETTE: [[u8; 3]; 12] = [
    [141, 211, 199],
    [255, 255, 179],
    [190, 186, 218],
    [251, 128, 114],
    [128, 177, 211],
    [253, 180, 98],
    [179, 222, 105],
    [252, 205, 229],
    [217, 217, 217],
    [188, 128, 189],
    [204, 235, 197],
    [255, 237, 111],
];

/// Palette color of a chart.
#[inline]
pub fn chart_color(chart: usize) -> [u8; 3] {
    CHART_PALETTE[chart % CHART_PALETTE.len()]
}

/// Chart label of every face.
#[derive(Debug, Clone, Default)]
pub struct ChartSegmentation {
    /// Chart id per face.
    pub face_chart: Vec<usize>,
    /// Number of charts.
    pub num_charts: usize,
}

impl ChartSegmentation {
    /// Chart of a face.
    #[inline]
    pub fn chart<I: MeshIndex>(&self, f: FaceId<I>) -> usize {
        self.face_chart[f.index()]
    }

    /// Number of faces in each chart.
    pub fn chart_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.num_charts];
        for &c in &self.face_chart {
            sizes[c] += 1;
        }
        sizes
    }

    /// Palette color per face.
    pub fn face_colors(&self) -> Vec<[u8; 3]> {
        self.face_chart.iter().map(|&c| chart_color(c)).collect()
    }
}

/// Group faces into charts by breadth-first search over shared texture indices.
///
/// Faces without a full set of texture indices each form a chart of their own.
/// Chart ids follow the order of each chart's lowest face.
pub fn segment_charts<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, tex: &TexCoords) -> ChartSegmentation {
    let face_tex: Vec<Option<Vec<usize>>> = mesh
        .face_ids()
        .map(|f| tex.face_indices(mesh, f))
        .collect();

    let mut tex_faces: Vec<Vec<usize>> = vec![Vec::new(); tex.len()];
    for (fi, indices) in face_tex.iter().enumerate() {
        for &t in indices.iter().flatten() {
            tex_faces[t].push(fi);
        }
    }

    let mut face_chart = vec![usize::MAX; mesh.num_faces()];
    let mut num_charts = 0;
    let mut queue = VecDeque::new();

    for seed in 0..mesh.num_faces() {
        if face_chart[seed] != usize::MAX {
            continue;
        }
        let chart = num_charts;
        num_charts += 1;
        face_chart[seed] = chart;
        queue.push_back(seed);

        while let Some(fi) = queue.pop_front() {
            for &t in face_tex[fi].iter().flatten() {
                for &gi in &tex_faces[t] {
                    if face_chart[gi] == usize::MAX {
                        face_chart[gi] = chart;
                        queue.push_back(gi);
                    }
                }
            }
        }
    }

    debug!("Charts: {} charts over {} faces", num_charts, mesh.num_faces());

    ChartSegmentation {
        face_chart,
        num_charts,
    }
}

/// One boundary loop of a layout.
#[derive(Debug, Clone)]
pub struct BoundaryLoop<I: MeshIndex = u32> {
    /// Boundary half-edges in loop order.
    pub halfedges: Vec<HalfEdgeId<I>>,
    /// Quantized turning valence at the destination of each half-edge.
    pub valences: Vec<i64>,
    /// `Σ (2 − k)` over the loop; 4 for a disk.
    pub euler: i64,
    /// Summed signed turning of the fan edges; positive for a
    /// counter-clockwise layout.
    pub orientation: f64,
    /// This loop's range in [`BoundaryLayout::corners`].
    pub corners: Range<usize>,
}

impl<I: MeshIndex> BoundaryLoop<I> {
    /// Number of boundary half-edges.
    pub fn len(&self) -> usize {
        self.halfedges.len()
    }

    /// Check if the loop has no half-edges.
    pub fn is_empty(&self) -> bool {
        self.halfedges.is_empty()
    }
}

/// A boundary vertex whose valence is not 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryCorner<I: MeshIndex = u32> {
    /// The layout vertex.
    pub vertex: VertexId<I>,
    /// `round(angle / (π/2))`.
    pub valence: i64,
    /// Index of the loop.
    pub loop_index: usize,
}

/// Boundary run between two consecutive corners of a loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundarySegment<I: MeshIndex = u32> {
    /// Corner the segment leaves.
    pub start: VertexId<I>,
    /// Corner the segment reaches.
    pub end: VertexId<I>,
    /// Index of the loop.
    pub loop_index: usize,
}

/// Corners, loops and segments of the boundary of a UV layout.
#[derive(Debug, Clone)]
pub struct BoundaryLayout<I: MeshIndex = u32> {
    /// Boundary loops.
    pub loops: Vec<BoundaryLoop<I>>,
    /// Corners, grouped by loop in loop order.
    pub corners: Vec<BoundaryCorner<I>>,
    /// Segments, grouped by loop.
    pub segments: Vec<BoundarySegment<I>>,
    /// Segment id per layout half-edge; set on boundary half-edges of loops
    /// with at least one corner.
    pub halfedge_segment: Vec<Option<usize>>,
    /// `Σ (k − 1)` over all corners.
    pub inner_segments: i64,
}

impl<I: MeshIndex> BoundaryLayout<I> {
    /// Number of boundary loops.
    pub fn num_loops(&self) -> usize {
        self.loops.len()
    }

    /// Whether every loop has Euler sum 4 and positive orientation and the
    /// segment count matches the corner valences.
    pub fn is_consistent(&self) -> bool {
        self.loops.iter().all(|l| l.euler == 4 && l.orientation > 0.0)
            && self.segments.len() as i64 - self.inner_segments == 4 * self.loops.len() as i64
    }

    /// Segment of a boundary half-edge.
    #[inline]
    pub fn segment_of(&self, he: HalfEdgeId<I>) -> Option<usize> {
        self.halfedge_segment.get(he.index()).copied().flatten()
    }
}

fn vector_angle(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    let denom = a.norm() * b.norm();
    if denom <= f64::EPSILON {
        return 0.0;
    }
    (a.dot(b) / denom).clamp(-1.0, 1.0).acos()
}

/// Walk every boundary loop of the layout and find its corners.
///
/// At each boundary vertex the interior angles of its face fan are summed and
/// quantized to `k = round(angle / (π/2))`; the vertex is a corner when
/// `k ≠ 2`. A loop whose `Σ (2 − k)` is not 4, or that turns clockwise, is
/// reported with a warning but still returned.
pub fn detect_boundary_layout<I: MeshIndex>(pm: &ParameterizationMesh<I>) -> BoundaryLayout<I> {
    let para = &pm.para;
    let mut visited = vec![false; para.num_halfedges()];
    let mut layout = BoundaryLayout {
        loops: Vec::new(),
        corners: Vec::new(),
        segments: Vec::new(),
        halfedge_segment: vec![None; para.num_halfedges()],
        inner_segments: 0,
    };

    for start in para.halfedge_ids() {
        if !para.is_boundary_halfedge(start) || visited[start.index()] {
            continue;
        }

        let loop_index = layout.loops.len();
        let first_corner = layout.corners.len();
        let mut halfedges = Vec::new();
        let mut valences = Vec::new();
        let mut euler = 0;
        let mut orientation = 0.0;

        let mut bh = start;
        loop {
            visited[bh.index()] = true;
            halfedges.push(bh);
            let v = para.dest(bh);

            // Rotate through the fan at v until the next boundary half-edge.
            let mut angle = 0.0;
            let mut h = para.twin(bh);
            let mut guard = 0;
            while !para.is_boundary_halfedge(h) && guard < para.num_halfedges() {
                let vec0 = para.edge_vector(h);
                h = para.twin(para.prev(h));
                let vec1 = para.edge_vector(h);

                orientation += vec0.x * vec1.y - vec0.y * vec1.x;
                angle += vector_angle(&vec0, &vec1);
                guard += 1;
            }

            let k = (angle / FRAC_PI_2).round() as i64;
            if k != 2 {
                layout.corners.push(BoundaryCorner {
                    vertex: v,
                    valence: k,
                    loop_index,
                });
                layout.inner_segments += k - 1;
            }
            euler += 2 - k;
            valences.push(k);

            bh = h;
            if bh == start || !bh.is_valid() || visited[bh.index()] {
                break;
            }
        }

        if euler != 4 {
            warn!("Boundary loop {}: Euler sum {} instead of 4", loop_index, euler);
        }
        if orientation <= 0.0 {
            warn!("Boundary loop {}: layout is not counter-clockwise", loop_index);
        }

        let corners = first_corner..layout.corners.len();
        add_segments(&mut layout, loop_index, &halfedges, &valences, para);

        layout.loops.push(BoundaryLoop {
            halfedges,
            valences,
            euler,
            orientation,
            corners,
        });
    }

    let n_segments = layout.segments.len() as i64;
    if n_segments - layout.inner_segments != 4 * layout.loops.len() as i64 {
        warn!(
            "Boundary layout: {} segments and {} inner segments do not match {} loops",
            n_segments,
            layout.inner_segments,
            layout.loops.len()
        );
    }

    debug!(
        "Boundary layout: {} loops, {} corners, {} segments",
        layout.loops.len(),
        layout.corners.len(),
        layout.segments.len()
    );

    layout
}

/// Split one loop at its corners. Segment `j` starts at the `j`-th corner and
/// owns the half-edges up to and including the one arriving at the next.
fn add_segments<I: MeshIndex>(
    layout: &mut BoundaryLayout<I>,
    loop_index: usize,
    halfedges: &[HalfEdgeId<I>],
    valences: &[i64],
    para: &HalfEdgeMesh<I>,
) {
    let corner_at: Vec<usize> = (0..valences.len()).filter(|&i| valences[i] != 2).collect();
    let n = halfedges.len();
    let c = corner_at.len();

    for j in 0..c {
        let (from, to) = (corner_at[j], corner_at[(j + 1) % c]);
        let segment = layout.segments.len();
        layout.segments.push(BoundarySegment {
            start: para.dest(halfedges[from]),
            end: para.dest(halfedges[to]),
            loop_index,
        });

        let mut i = (from + 1) % n;
        loop {
            layout.halfedge_segment[halfedges[i].index()] = Some(segment);
            if i == to {
                break;
            }
            i = (i + 1) % n;
        }
    }
}

/// Display color of every layout edge: boundary or interior.
pub fn layout_edge_colors<I: MeshIndex>(para: &HalfEdgeMesh<I>, edges: &EdgeIndex<I>) -> Vec<[u8; 3]> {
    edges
        .edge_ids()
        .map(|e| {
            if para.is_boundary_edge(edges.halfedge(e)) {
                BOUNDARY_EDGE_COLOR
            } else {
                INTERIOR_EDGE_COLOR
            }
        })
        .collect()
}
