//! Per-vertex UV coordinates of a parameterization mesh.

use std::marker::PhantomData;

use nalgebra::Point2;

use crate::mesh::{MeshIndex, VertexId};

/// One UV coordinate per vertex of a parameterization mesh.
///
/// Vertices of that mesh are texture coordinates of the source mesh, so a
/// vertex cut by a seam shows up here once per side.
///
/// ```
/// use nalgebra::Point2;
/// use tessera::algo::parameterize::UVMap;
/// use tessera::mesh::VertexId;
///
/// let uv: UVMap = UVMap::new(vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.5)]);
/// assert_eq!(uv.get(VertexId::new(1)), Point2::new(1.0, 0.5));
/// ```
#[derive(Debug, Clone)]
pub struct UVMap<I: MeshIndex = u32> {
    coords: Vec<Point2<f64>>,
    _marker: PhantomData<I>,
}

impl<I: MeshIndex> Default for UVMap<I> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<I: MeshIndex> UVMap<I> {
    /// Wrap `coords`; entry `i` belongs to vertex `i`.
    pub fn new(coords: Vec<Point2<f64>>) -> Self {
        Self {
            coords,
            _marker: PhantomData,
        }
    }

    /// Coordinate of `v`.
    #[inline]
    pub fn get(&self, v: VertexId<I>) -> Point2<f64> {
        self.coords[v.index()]
    }

    /// Number of coordinates.
    #[inline]
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    /// True when there are no coordinates.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Axis-aligned UV bounds as `(min, max)`.
    pub fn bounding_box(&self) -> Option<(Point2<f64>, Point2<f64>)> {
        let (first, rest) = self.coords.split_first()?;
        Some(rest.iter().fold((*first, *first), |(lo, hi), p| (lo.inf(p), hi.sup(p))))
    }
}
