//! Half-edge arena for polygon meshes.
//!
//! Vertices, half-edges and faces live in three `Vec`s and refer to each other
//! through typed ids. Each half-edge knows its origin, its twin, the next and
//! previous half-edge of its loop, and its face.
//!
//! A face owns a contiguous run of half-edges; [`Face::halfedge`] is the one
//! leaving the face's first corner. Boundary half-edges carry an invalid face
//! id and are chained into boundary loops. Every boundary vertex stores a
//! boundary half-edge as its outgoing half-edge, so a one-ring walk from
//! [`HalfEdgeMesh::vertex_halfedges`] sweeps each incident face once and stops
//! at the boundary.

use nalgebra::{Point3, Vector3};

use super::index::{FaceId, HalfEdgeId, MeshIndex, VertexId};

/// A mesh vertex.
#[derive(Debug, Clone)]
pub struct Vertex<I: MeshIndex = u32> {
    /// Position in model space.
    pub position: Point3<f64>,

    /// An outgoing half-edge; a boundary half-edge on boundary vertices,
    /// invalid on isolated ones.
    pub halfedge: HalfEdgeId<I>,
}

impl<I: MeshIndex> Vertex<I> {
    /// An isolated vertex at `position`.
    pub fn new(position: Point3<f64>) -> Self {
        Self {
            position,
            halfedge: HalfEdgeId::invalid(),
        }
    }
}

/// One directed side of an edge.
#[derive(Debug, Clone, Copy)]
pub struct HalfEdge<I: MeshIndex = u32> {
    /// Vertex the half-edge leaves.
    pub origin: VertexId<I>,
    /// Same edge, opposite direction.
    pub twin: HalfEdgeId<I>,
    /// Successor in the face (or boundary) loop.
    pub next: HalfEdgeId<I>,
    /// Predecessor in the face (or boundary) loop.
    pub prev: HalfEdgeId<I>,
    /// Owning face; invalid on the boundary.
    pub face: FaceId<I>,
}

impl<I: MeshIndex> HalfEdge<I> {
    /// A half-edge with every link unset.
    pub fn new() -> Self {
        Self {
            origin: VertexId::invalid(),
            twin: HalfEdgeId::invalid(),
            next: HalfEdgeId::invalid(),
            prev: HalfEdgeId::invalid(),
            face: FaceId::invalid(),
        }
    }

    /// Whether no face owns this half-edge.
    #[inline]
    pub fn is_boundary(&self) -> bool {
        !self.face.is_valid()
    }
}

impl<I: MeshIndex> Default for HalfEdge<I> {
    fn default() -> Self {
        Self::new()
    }
}

/// A polygonal face.
#[derive(Debug, Clone, Copy)]
pub struct Face<I: MeshIndex = u32> {
    /// Half-edge leaving the first corner.
    pub halfedge: HalfEdgeId<I>,
}

impl<I: MeshIndex> Face<I> {
    /// A face whose loop starts at `halfedge`.
    pub fn new(halfedge: HalfEdgeId<I>) -> Self {
        Self { halfedge }
    }
}

impl<I: MeshIndex> Default for Face<I> {
    fn default() -> Self {
        Self::new(HalfEdgeId::invalid())
    }
}

/// Polygon mesh stored as a half-edge arena.
///
/// Build one with [`build_from_polygons`](crate::mesh::build_from_polygons)
/// or [`build_from_triangles`](crate::mesh::build_from_triangles).
#[derive(Debug, Clone)]
pub struct HalfEdgeMesh<I: MeshIndex = u32> {
    pub(crate) vertices: Vec<Vertex<I>>,
    pub(crate) halfedges: Vec<HalfEdge<I>>,
    pub(crate) faces: Vec<Face<I>>,
}

impl<I: MeshIndex> Default for HalfEdgeMesh<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: MeshIndex> HalfEdgeMesh<I> {
    /// An empty mesh.
    pub fn new() -> Self {
        Self::with_capacity(0, 0, 0)
    }

    /// An empty mesh with room for the given element counts.
    ///
    /// `num_corners` is the total number of face corners, which is also the
    /// number of interior half-edges.
    pub fn with_capacity(num_vertices: usize, num_corners: usize, num_faces: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(num_vertices),
            halfedges: Vec::with_capacity(num_corners + num_corners / 4),
            faces: Vec::with_capacity(num_faces),
        }
    }

    /// Drop every element, keeping the allocations.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.halfedges.clear();
        self.faces.clear();
    }

    /// True when there are no vertices.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Interior plus boundary half-edges.
    #[inline]
    pub fn num_halfedges(&self) -> usize {
        self.halfedges.len()
    }

    /// Number of faces.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Vertex record of `v`.
    #[inline]
    pub fn vertex(&self, v: VertexId<I>) -> &Vertex<I> {
        &self.vertices[v.index()]
    }

    /// Mutable vertex record of `v`.
    #[inline]
    pub fn vertex_mut(&mut self, v: VertexId<I>) -> &mut Vertex<I> {
        &mut self.vertices[v.index()]
    }

    /// Half-edge record of `he`.
    #[inline]
    pub fn halfedge(&self, he: HalfEdgeId<I>) -> &HalfEdge<I> {
        &self.halfedges[he.index()]
    }

    /// Mutable half-edge record of `he`.
    #[inline]
    pub fn halfedge_mut(&mut self, he: HalfEdgeId<I>) -> &mut HalfEdge<I> {
        &mut self.halfedges[he.index()]
    }

    /// Face record of `f`.
    #[inline]
    pub fn face(&self, f: FaceId<I>) -> &Face<I> {
        &self.faces[f.index()]
    }

    /// Position of `v`.
    #[inline]
    pub fn position(&self, v: VertexId<I>) -> &Point3<f64> {
        &self.vertex(v).position
    }

    /// Move `v` to `position`.
    #[inline]
    pub fn set_position(&mut self, v: VertexId<I>, position: Point3<f64>) {
        self.vertex_mut(v).position = position;
    }

    /// Whether `v` is a valid id inside this mesh.
    #[inline]
    pub fn contains_vertex(&self, v: VertexId<I>) -> bool {
        v.is_valid() && v.index() < self.vertices.len()
    }

    // ---- connectivity ----

    /// Opposite half-edge.
    #[inline]
    pub fn twin(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        self.halfedge(he).twin
    }

    /// Next half-edge in the loop.
    #[inline]
    pub fn next(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        self.halfedge(he).next
    }

    /// Previous half-edge in the loop.
    #[inline]
    pub fn prev(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        self.halfedge(he).prev
    }

    /// Vertex `he` leaves.
    #[inline]
    pub fn origin(&self, he: HalfEdgeId<I>) -> VertexId<I> {
        self.halfedge(he).origin
    }

    /// Vertex `he` points at.
    #[inline]
    pub fn dest(&self, he: HalfEdgeId<I>) -> VertexId<I> {
        self.origin(self.twin(he))
    }

    /// Face owning `he`; invalid on the boundary.
    #[inline]
    pub fn face_of(&self, he: HalfEdgeId<I>) -> FaceId<I> {
        self.halfedge(he).face
    }

    /// Whether `he` has no face.
    #[inline]
    pub fn is_boundary_halfedge(&self, he: HalfEdgeId<I>) -> bool {
        self.halfedge(he).is_boundary()
    }

    /// Whether either side of the edge through `he` is a boundary half-edge.
    #[inline]
    pub fn is_boundary_edge(&self, he: HalfEdgeId<I>) -> bool {
        self.is_boundary_halfedge(he) || self.is_boundary_halfedge(self.twin(he))
    }

    /// Whether `v` touches the boundary. Isolated vertices do.
    pub fn is_boundary_vertex(&self, v: VertexId<I>) -> bool {
        self.is_isolated(v) || self.vertex_halfedges(v).any(|he| self.is_boundary_halfedge(he))
    }

    /// Whether `v` has no incident edge.
    #[inline]
    pub fn is_isolated(&self, v: VertexId<I>) -> bool {
        !self.vertex(v).halfedge.is_valid()
    }

    /// The half-edge from `from` to `to`, if they share an edge.
    pub fn find_halfedge(&self, from: VertexId<I>, to: VertexId<I>) -> Option<HalfEdgeId<I>> {
        if !(self.contains_vertex(from) && self.contains_vertex(to)) {
            return None;
        }
        self.vertex_halfedges(from).find(|&he| self.dest(he) == to)
    }

    /// Number of edges at `v`.
    pub fn valence(&self, v: VertexId<I>) -> usize {
        self.vertex_halfedges(v).count()
    }

    /// Number of corners of `f`.
    pub fn face_valence(&self, f: FaceId<I>) -> usize {
        self.face_halfedges(f).count()
    }

    /// True when every face has three corners.
    pub fn is_triangle_mesh(&self) -> bool {
        self.face_ids().all(|f| self.face_valence(f) == 3)
    }

    // ---- iteration ----

    /// All vertex ids.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId<I>> + '_ {
        (0..self.vertices.len()).map(VertexId::new)
    }

    /// All half-edge ids, boundary ones last.
    pub fn halfedge_ids(&self) -> impl Iterator<Item = HalfEdgeId<I>> + '_ {
        (0..self.halfedges.len()).map(HalfEdgeId::new)
    }

    /// All face ids.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId<I>> + '_ {
        (0..self.faces.len()).map(FaceId::new)
    }

    /// Outgoing half-edges of `v`, starting from its stored half-edge.
    pub fn vertex_halfedges(&self, v: VertexId<I>) -> Circulator<'_, I> {
        Circulator::new(self, self.vertex(v).halfedge, |mesh, he| mesh.next(mesh.twin(he)))
    }

    /// Faces around `v`.
    pub fn vertex_faces(&self, v: VertexId<I>) -> impl Iterator<Item = FaceId<I>> + '_ {
        self.vertex_halfedges(v)
            .map(|he| self.face_of(he))
            .filter(|f| f.is_valid())
    }

    /// Half-edges of `f` in winding order, from its first corner.
    pub fn face_halfedges(&self, f: FaceId<I>) -> Circulator<'_, I> {
        Circulator::new(self, self.face(f).halfedge, |mesh, he| mesh.next(he))
    }

    /// Corners of `f` in winding order.
    pub fn face_vertices(&self, f: FaceId<I>) -> impl Iterator<Item = VertexId<I>> + '_ {
        self.face_halfedges(f).map(|he| self.origin(he))
    }

    // ---- geometry ----

    /// Destination minus origin.
    pub fn edge_vector(&self, he: HalfEdgeId<I>) -> Vector3<f64> {
        self.position(self.dest(he)) - self.position(self.origin(he))
    }

    /// Length of the edge through `he`.
    pub fn edge_length(&self, he: HalfEdgeId<I>) -> f64 {
        self.edge_vector(he).norm()
    }

    /// Cross product of the two edges leaving the first corner of `f`.
    ///
    /// This is the face normal used for shading; its length is twice the area
    /// of the first corner triangle.
    pub fn face_cross(&self, f: FaceId<I>) -> Vector3<f64> {
        let he = self.face(f).halfedge;
        let p0 = self.position(self.origin(he));
        let p2 = self.position(self.dest(self.next(he)));
        self.edge_vector(he).cross(&(p2 - p0))
    }

    /// Unit normal of `f`, zero if degenerate.
    pub fn face_normal(&self, f: FaceId<I>) -> Vector3<f64> {
        self.face_cross(f)
            .try_normalize(f64::EPSILON)
            .unwrap_or_else(Vector3::zeros)
    }

    /// Half the summed fan cross products of `f`.
    ///
    /// For a planar polygon, convex or not, its norm is the polygon's area.
    pub fn face_vector_area(&self, f: FaceId<I>) -> Vector3<f64> {
        let corners: Vec<&Point3<f64>> = self.face_vertices(f).map(|v| self.position(v)).collect();
        let Some((&p0, rest)) = corners.split_first() else {
            return Vector3::zeros();
        };
        let twice: Vector3<f64> = rest
            .windows(2)
            .map(|w| (w[0] - p0).cross(&(w[1] - p0)))
            .sum();
        twice * 0.5
    }

    /// Area of `f`.
    pub fn face_area(&self, f: FaceId<I>) -> f64 {
        self.face_vector_area(f).norm()
    }

    /// Sum of [`face_area`](Self::face_area) over all faces.
    pub fn surface_area(&self) -> f64 {
        self.face_ids().map(|f| self.face_area(f)).sum()
    }

    /// Normalized sum of the incident [`face_cross`](Self::face_cross)
    /// vectors, so larger faces weigh more. Zero for isolated vertices.
    pub fn vertex_normal(&self, v: VertexId<I>) -> Vector3<f64> {
        self.vertex_faces(v)
            .map(|f| self.face_cross(f))
            .sum::<Vector3<f64>>()
            .try_normalize(f64::EPSILON)
            .unwrap_or_else(Vector3::zeros)
    }

    /// Axis-aligned bounds as `(min, max)`, or `None` without vertices.
    pub fn bounding_box(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let mut points = self.vertices.iter().map(|v| v.position);
        let first = points.next()?;
        Some(points.fold((first, first), |(lo, hi), p| (lo.inf(&p), hi.sup(&p))))
    }

    /// Append an isolated vertex.
    pub fn add_vertex(&mut self, position: Point3<f64>) -> VertexId<I> {
        self.vertices.push(Vertex::new(position));
        VertexId::new(self.vertices.len() - 1)
    }

    /// Check the arena's link invariants: vertex half-edges leave their
    /// vertex, twins are mutual, `next`/`prev` agree and faces have a loop.
    pub fn is_valid(&self) -> bool {
        let vertices_ok = self.vertex_ids().all(|v| {
            let he = self.vertex(v).halfedge;
            !he.is_valid() || self.origin(he) == v
        });

        let halfedges_ok = self.halfedge_ids().all(|he| {
            let h = self.halfedge(he);
            h.twin.is_valid()
                && self.twin(h.twin) == he
                && (!h.next.is_valid() || self.prev(h.next) == he)
                && (!h.prev.is_valid() || self.next(h.prev) == he)
        });

        vertices_ok && halfedges_ok && self.faces.iter().all(|f| f.halfedge.is_valid())
    }
}

/// Walks a cycle of half-edges: the loop of a face or the fan of a vertex.
///
/// Stops when it returns to the first half-edge or reaches an unlinked one.
pub struct Circulator<'a, I: MeshIndex = u32> {
    mesh: &'a HalfEdgeMesh<I>,
    step: fn(&HalfEdgeMesh<I>, HalfEdgeId<I>) -> HalfEdgeId<I>,
    start: HalfEdgeId<I>,
    current: Option<HalfEdgeId<I>>,
}

impl<'a, I: MeshIndex> Circulator<'a, I> {
    fn new(
        mesh: &'a HalfEdgeMesh<I>,
        start: HalfEdgeId<I>,
        step: fn(&HalfEdgeMesh<I>, HalfEdgeId<I>) -> HalfEdgeId<I>,
    ) -> Self {
        Self {
            mesh,
            step,
            start,
            current: start.is_valid().then_some(start),
        }
    }
}

impl<I: MeshIndex> Iterator for Circulator<'_, I> {
    type Item = HalfEdgeId<I>;

    fn next(&mut self) -> Option<Self::Item> {
        let he = self.current?;
        let following = (self.step)(self.mesh, he);
        self.current = (following.is_valid() && following != self.start).then_some(following);
        Some(he)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{build_from_polygons, build_from_triangles};

    fn hexagon() -> HalfEdgeMesh {
        let vertices: Vec<Point3<f64>> = (0..6)
            .map(|i| {
                let a = i as f64 * std::f64::consts::PI / 3.0;
                Point3::new(a.cos(), a.sin(), 0.0)
            })
            .collect();
        build_from_polygons(&vertices, &[vec![0, 1, 2, 3, 4, 5]]).unwrap()
    }

    #[test]
    fn test_empty_mesh() {
        let mesh = HalfEdgeMesh::<u32>::new();
        assert_eq!(mesh.num_vertices(), 0);
        assert_eq!(mesh.num_halfedges(), 0);
        assert_eq!(mesh.num_faces(), 0);
        assert!(mesh.is_valid());
        assert!(mesh.bounding_box().is_none());
    }

    #[test]
    fn test_isolated_vertex() {
        let mut mesh = HalfEdgeMesh::<u32>::new();
        let v0 = mesh.add_vertex(Point3::new(0.0, 0.0, 0.0));
        let v1 = mesh.add_vertex(Point3::new(1.0, 0.0, 0.0));

        assert_eq!(v1, VertexId::new(1));
        assert!(mesh.is_isolated(v0));
        assert!(mesh.is_boundary_vertex(v0));
        assert_eq!(mesh.valence(v0), 0);
        assert_eq!(mesh.vertex_normal(v0), Vector3::zeros());
        assert!(mesh.find_halfedge(v0, v1).is_none());
    }

    #[test]
    fn test_polygon_area_and_normal() {
        let mesh = hexagon();
        let f = FaceId::new(0);

        assert_eq!(mesh.face_valence(f), 6);
        assert!(!mesh.is_triangle_mesh());

        // Regular hexagon with circumradius 1.
        let expected = 1.5 * 3.0_f64.sqrt();
        assert!((mesh.face_area(f) - expected).abs() < 1e-12);
        assert!((mesh.surface_area() - expected).abs() < 1e-12);
        assert!((mesh.face_normal(f) - Vector3::z()).norm() < 1e-12);
    }

    #[test]
    fn test_bounding_box() {
        let (min, max) = hexagon().bounding_box().unwrap();
        assert!((min - Point3::new(-1.0, -(0.75_f64.sqrt()), 0.0)).norm() < 1e-12);
        assert!((max - Point3::new(1.0, 0.75_f64.sqrt(), 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_find_halfedge() {
        let mesh = hexagon();
        let v0 = VertexId::new(0);
        let v1 = VertexId::new(1);
        let v3 = VertexId::new(3);

        let he = mesh.find_halfedge(v0, v1).unwrap();
        assert_eq!(mesh.origin(he), v0);
        assert_eq!(mesh.dest(he), v1);
        assert!(!mesh.is_boundary_halfedge(he));

        // The reverse direction is the boundary twin.
        let back = mesh.find_halfedge(v1, v0).unwrap();
        assert_eq!(mesh.twin(he), back);
        assert!(mesh.is_boundary_halfedge(back));
        assert!(mesh.is_boundary_edge(he));

        assert!(mesh.find_halfedge(v0, v3).is_none());
        assert!(mesh.find_halfedge(v0, VertexId::new(99)).is_none());
    }

    #[test]
    fn test_vertex_fan() {
        // Square split into four triangles around a center vertex.
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.5, 0.5, 0.0),
        ];
        let faces = vec![[0, 1, 4], [1, 2, 4], [2, 3, 4], [3, 0, 4]];
        let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();

        let center = VertexId::new(4);
        assert_eq!(mesh.valence(center), 4);
        assert_eq!(mesh.vertex_faces(center).count(), 4);
        assert!(!mesh.is_boundary_vertex(center));
        assert!((mesh.vertex_normal(center) - Vector3::z()).norm() < 1e-12);

        // A corner starts on its boundary half-edge.
        let corner = VertexId::new(0);
        let first = mesh.vertex_halfedges(corner).next().unwrap();
        assert!(mesh.is_boundary_halfedge(first));
        assert_eq!(mesh.vertex_faces(corner).count(), 2);
        assert_eq!(mesh.valence(corner), 3);
    }

    #[test]
    fn test_clear() {
        let mut mesh = hexagon();
        mesh.clear();
        assert!(mesh.is_empty());
        assert_eq!(mesh.num_faces(), 0);
        assert_eq!(mesh.num_halfedges(), 0);
    }
}
