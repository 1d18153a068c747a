//! Property-based tests for mesh operations.
//!
//! These tests use proptest to generate random height-field grids and
//! polygons and verify invariants of the derived buffers, paths and fields.
//!
//! Run with: cargo test --test proptest_mesh

use std::collections::BTreeSet;
use std::f64::consts::TAU;

use nalgebra::Point3;
use proptest::prelude::*;
use tessera::algo::curvature::normalize_field;
use tessera::mesh::{triangle_index_buffer, unique_edges};
use tessera::prelude::*;

// =============================================================================
// Strategies for generating random meshes
// =============================================================================

/// A height-field grid: columns, rows, one height per vertex and one diagonal
/// choice per quad.
#[derive(Debug, Clone)]
struct Grid {
    cols: usize,
    rows: usize,
    heights: Vec<f64>,
    flips: Vec<bool>,
}

impl Grid {
    fn vertices(&self) -> Vec<Point3<f64>> {
        (0..=self.rows)
            .flat_map(|j| (0..=self.cols).map(move |i| (i, j)))
            .zip(&self.heights)
            .map(|((i, j), &z)| Point3::new(i as f64, j as f64, z))
            .collect()
    }

    fn faces(&self) -> Vec<[usize; 3]> {
        let stride = self.cols + 1;
        let mut faces = Vec::with_capacity(self.cols * self.rows * 2);
        for j in 0..self.rows {
            for i in 0..self.cols {
                let v00 = j * stride + i;
                let (v10, v01, v11) = (v00 + 1, v00 + stride, v00 + stride + 1);
                if self.flips[j * self.cols + i] {
                    faces.push([v00, v10, v01]);
                    faces.push([v10, v11, v01]);
                } else {
                    faces.push([v00, v10, v11]);
                    faces.push([v00, v11, v01]);
                }
            }
        }
        faces
    }

    fn mesh(&self) -> HalfEdgeMesh {
        build_from_triangles(&self.vertices(), &self.faces()).unwrap()
    }
}

fn arb_grid(max_side: usize) -> impl Strategy<Value = Grid> {
    (1..=max_side, 1..=max_side).prop_flat_map(|(cols, rows)| {
        let heights = prop::collection::vec(-1.0..1.0f64, (cols + 1) * (rows + 1));
        let flips = prop::collection::vec(any::<bool>(), cols * rows);
        (heights, flips).prop_map(move |(heights, flips)| Grid {
            cols,
            rows,
            heights,
            flips,
        })
    })
}

/// A convex polygon: regular n-gon with a random radius.
fn arb_polygon() -> impl Strategy<Value = (usize, f64)> {
    (3usize..12, 0.1..10.0f64)
}

// =============================================================================
// Edge buffer properties
// =============================================================================

proptest! {
    #[test]
    fn proptest_unique_edges_match_face_edges(grid in arb_grid(6)) {
        let mesh = grid.mesh();
        let edges = unique_edges(&mesh);

        let expected: BTreeSet<(usize, usize)> = grid
            .faces()
            .iter()
            .flat_map(|f| [(f[0], f[1]), (f[1], f[2]), (f[2], f[0])])
            .map(|(a, b)| (a.min(b), a.max(b)))
            .collect();

        prop_assert!(edges.windows(2).all(|w| w[0] < w[1]), "edges must be sorted and unique");
        prop_assert!(edges.iter().all(|&(a, b)| a < b));
        prop_assert_eq!(edges.len(), expected.len());
        prop_assert_eq!(edges.into_iter().collect::<BTreeSet<_>>(), expected);
    }

    #[test]
    fn proptest_fan_triangulation_preserves_area((n, radius) in arb_polygon()) {
        let vertices: Vec<Point3<f64>> = (0..n)
            .map(|i| {
                let t = TAU * i as f64 / n as f64;
                Point3::new(radius * t.cos(), radius * t.sin(), 0.0)
            })
            .collect();
        let polygon: Vec<usize> = (0..n).collect();
        let mesh: HalfEdgeMesh = build_from_polygons(&vertices, &[polygon]).unwrap();

        let indices = triangle_index_buffer(&mesh);
        prop_assert_eq!(indices.len(), 3 * (n - 2));

        let area: f64 = indices
            .chunks(3)
            .map(|t| {
                let a = vertices[t[0] as usize];
                let b = vertices[t[1] as usize];
                let c = vertices[t[2] as usize];
                0.5 * (b - a).cross(&(c - a)).norm()
            })
            .sum();
        let expected = 0.5 * n as f64 * radius * radius * (TAU / n as f64).sin();
        prop_assert!((area - expected).abs() < 1e-9 * expected.max(1.0));
    }
}

// =============================================================================
// Path properties
// =============================================================================

proptest! {
    #[test]
    fn proptest_path_walks_mesh_edges(
        grid in arb_grid(6),
        picks in (any::<prop::sample::Index>(), any::<prop::sample::Index>()),
    ) {
        let mesh = grid.mesh();
        let source = VertexId::new(picks.0.index(mesh.num_vertices()));
        let target = VertexId::new(picks.1.index(mesh.num_vertices()));

        let dijkstra = shortest_path(&mesh, source, target, &PathOptions::default());
        let astar = shortest_path(
            &mesh,
            source,
            target,
            &PathOptions::default().with_algorithm(PathAlgorithm::AStar),
        );

        // The grid is connected, so a path always exists.
        prop_assert!(!dijkstra.is_empty());
        prop_assert_eq!(dijkstra.vertices.first(), Some(&source));
        prop_assert_eq!(dijkstra.vertices.last(), Some(&target));
        prop_assert_eq!(dijkstra.halfedges.len() + 1, dijkstra.len());

        for (i, &he) in dijkstra.halfedges.iter().enumerate() {
            prop_assert_eq!(mesh.origin(he), dijkstra.vertices[i]);
            prop_assert_eq!(mesh.dest(he), dijkstra.vertices[i + 1]);
        }

        let summed: f64 = dijkstra.halfedges.iter().map(|&he| mesh.edge_length(he)).sum();
        prop_assert!((summed - dijkstra.length).abs() < 1e-9);
        prop_assert!((astar.length - dijkstra.length).abs() < 1e-9);
    }
}

// =============================================================================
// Curvature properties
// =============================================================================

proptest! {
    #[test]
    fn proptest_normalized_curvature_in_unit_interval(grid in arb_grid(6)) {
        let mesh = grid.mesh();

        for kind in [CurvatureKind::Gaussian, CurvatureKind::Mean, CurvatureKind::Max] {
            let field = compute_curvature(&mesh, &CurvatureOptions::new(kind));
            prop_assert_eq!(field.len(), mesh.num_vertices());

            for v in mesh.vertex_ids() {
                let value = field.get(v);
                prop_assert!(value.is_finite());
                if !mesh.is_boundary_vertex(v) {
                    prop_assert!((-1e-12..=1.0 + 1e-12).contains(&value), "{}: {}", kind, value);
                }
            }
        }
    }

    #[test]
    fn proptest_normalize_field_bounds(
        values in prop::collection::vec(-1e3..1e3f64, 1..64),
        seed in any::<u64>(),
    ) {
        let is_boundary: Vec<bool> = (0..values.len()).map(|i| (seed >> (i % 64)) & 1 == 1).collect();
        let mut rescaled = values.clone();
        let range = normalize_field(&mut rescaled, &is_boundary);

        if is_boundary.iter().all(|&b| b) {
            prop_assert_eq!(range, None);
            prop_assert_eq!(&rescaled, &values);
        } else {
            let (min, max) = range.unwrap();
            prop_assert!(min <= max);
            for ((&raw, &scaled), &boundary) in values.iter().zip(&rescaled).zip(&is_boundary) {
                if boundary {
                    prop_assert_eq!(raw, scaled);
                } else if max > min {
                    prop_assert!((-1e-12..=1.0 + 1e-12).contains(&scaled));
                } else {
                    prop_assert_eq!(raw, scaled);
                }
            }
        }
    }
}
