//! Core data types for d-dimensional convex hull computation

use ndarray::Array2;
use num_traits::Float;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};
use std::fmt;

use crate::Scalar;
use crate::matrix;

/// Identity handle for an input point.
///
/// The engine never owns coordinates; it refers to the caller's point cloud
/// through these indices. Handles compare and hash by identity, which makes
/// them usable as ridge keys, and stay valid for as long as the borrowed
/// cloud does.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PointId(pub usize);

impl PointId {
    /// Position of the point in the caller's cloud.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// A (d-1)-dimensional oriented facet of the hull.
///
/// `neighbours[i]` is the index of the facet sharing the ridge opposite
/// `vertices[i]`. The supporting hyperplane is `normal . x + offset = 0`,
/// oriented so the hull interior has strictly negative signed distance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Facet<T> {
    pub(crate) vertices: Vec<PointId>,
    pub(crate) neighbours: Vec<usize>,
    // front of `outside` is the furthest point above the hyperplane
    pub(crate) outside: VecDeque<PointId>,
    pub(crate) coplanar: Vec<PointId>,
    pub(crate) normal: Vec<T>,
    pub(crate) offset: T,
}

impl<T: Scalar> Facet<T> {
    /// Facet of the initial simplex: the basis with `omitted` left out.
    ///
    /// `neighbours` are seeded with the basis positions, which coincide with
    /// the facet indices of the initial simplex. The pair swap keeps every
    /// facet's vertex order consistent with an outward normal; whether a
    /// given parity needs the swap depends on the chirality of the basis.
    pub(crate) fn from_simplex(
        dimension: usize,
        simplex: &[PointId],
        omitted: usize,
        swap: bool,
    ) -> Self {
        let mut vertices = Vec::with_capacity(dimension);
        let mut neighbours = Vec::with_capacity(dimension);
        for (v, &id) in simplex.iter().enumerate() {
            if v != omitted {
                vertices.push(id);
                neighbours.push(v);
            }
        }
        if swap == ((dimension - omitted) % 2 == 0) {
            vertices.swap(0, dimension - 1);
            neighbours.swap(0, dimension - 1);
        }
        Self {
            vertices,
            neighbours,
            outside: VecDeque::new(),
            coplanar: Vec::new(),
            normal: vec![T::zero(); dimension],
            offset: T::zero(),
        }
    }

    /// Cone facet wrapping an apex: the parent's vertices with the one at
    /// `against` replaced by the apex. Only the neighbour across the
    /// inherited ridge is known at construction; the rest are filled in by
    /// ridge matching.
    pub(crate) fn wrap(
        dimension: usize,
        vertices: &[PointId],
        against: usize,
        apex: PointId,
        neighbour: usize,
    ) -> Self {
        debug_assert_eq!(vertices.len(), dimension);
        let mut vertices = vertices.to_vec();
        vertices[against] = apex;
        let mut neighbours = vec![usize::MAX; dimension];
        neighbours[against] = neighbour;
        Self {
            vertices,
            neighbours,
            outside: VecDeque::new(),
            coplanar: Vec::new(),
            normal: vec![T::zero(); dimension],
            offset: T::zero(),
        }
    }

    /// Rebuild a tombstoned facet in place, reusing its allocations.
    pub(crate) fn reuse(
        &mut self,
        vertices: &[PointId],
        against: usize,
        apex: PointId,
        neighbour: usize,
    ) {
        debug_assert_eq!(self.vertices.len(), vertices.len());
        self.vertices.clear();
        self.vertices.extend_from_slice(vertices);
        self.vertices[against] = apex;
        for n in &mut self.neighbours {
            *n = usize::MAX;
        }
        self.neighbours[against] = neighbour;
        self.outside.clear();
        self.coplanar.clear();
    }

    /// Signed distance from a point to the facet's hyperplane.
    ///
    /// Positive means above (outside), negative below (inside). Only the
    /// first d coordinates of `point` are read.
    pub fn distance(&self, point: &[T]) -> T {
        let mut acc = self.offset;
        for (n, x) in self.normal.iter().zip(point) {
            acc += *n * *x;
        }
        acc
    }

    /// The facet's d vertices, in orientation-consistent order.
    pub fn vertices(&self) -> &[PointId] {
        &self.vertices
    }

    /// Facet indices of the d neighbours; `neighbours()[i]` lies across the
    /// ridge opposite `vertices()[i]`.
    pub fn neighbours(&self) -> &[usize] {
        &self.neighbours
    }

    /// Unit normal of the supporting hyperplane.
    pub fn normal(&self) -> &[T] {
        &self.normal
    }

    /// Signed offset of the supporting hyperplane.
    pub fn offset(&self) -> T {
        self.offset
    }

    /// Points recorded within the coplanarity tolerance of the hyperplane.
    pub fn coplanar(&self) -> &[PointId] {
        &self.coplanar
    }

    /// Points strictly above the hyperplane still awaiting assignment;
    /// empty once the hull is complete.
    pub fn outside(&self) -> impl ExactSizeIterator<Item = PointId> + '_ {
        self.outside.iter().copied()
    }
}

/// Cosine of the dihedral angle between two facets' hyperplanes.
pub(crate) fn cos_of_dihedral_angle<T: Scalar>(a: &Facet<T>, b: &Facet<T>) -> T {
    let mut acc = T::zero();
    for (x, y) in a.normal.iter().zip(&b.normal) {
        acc += *x * *y;
    }
    acc
}

/// The result of a convex hull computation, detached from the builder.
///
/// Facet indices are compacted and stable; point handles keep referring to
/// the caller's cloud.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvexHull<T> {
    dimension: usize,
    tolerance: T,
    inner_point: Vec<T>,
    facets: Vec<Facet<T>>,
}

impl<T: Scalar> ConvexHull<T> {
    pub(crate) fn new(
        dimension: usize,
        tolerance: T,
        inner_point: Vec<T>,
        facets: Vec<Facet<T>>,
    ) -> Self {
        Self {
            dimension,
            tolerance,
            inner_point,
            facets,
        }
    }

    /// Dimension of the ambient space.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// The facets of the hull.
    pub fn facets(&self) -> &[Facet<T>] {
        &self.facets
    }

    /// Number of facets; at least d+1 for a full-dimensional cloud.
    pub fn num_facets(&self) -> usize {
        self.facets.len()
    }

    /// The interior reference point every hyperplane is oriented against.
    pub fn inner_point(&self) -> &[T] {
        &self.inner_point
    }

    /// Handles of the points that ended up as hull vertices, sorted and
    /// deduplicated.
    pub fn hull_vertices(&self) -> Vec<PointId> {
        let set: BTreeSet<PointId> = self
            .facets
            .iter()
            .flat_map(|f| f.vertices.iter().copied())
            .collect();
        set.into_iter().collect()
    }

    /// d-dimensional measure of the hull.
    ///
    /// Sums, over all facets, the measure of the simplex spanned by the facet
    /// and the interior reference point. `points` must be the cloud the hull
    /// was built from.
    pub fn volume<P: AsRef<[T]>>(&self, points: &[P]) -> T {
        let d = self.dimension;
        let mut m = Array2::from_elem((d, d), T::zero());
        let mut total = T::zero();
        for facet in &self.facets {
            for (r, &v) in facet.vertices.iter().enumerate() {
                let x = points[v.index()].as_ref();
                for c in 0..d {
                    m[[r, c]] = x[c] - self.inner_point[c];
                }
            }
            total += Float::abs(matrix::lup_det(&mut m, d, self.tolerance));
        }
        let mut factorial = T::one();
        let mut k = T::one();
        for _ in 1..d {
            k += T::one();
            factorial *= k;
        }
        total / factorial
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facet_distance() {
        let facet = Facet {
            vertices: vec![PointId(0), PointId(1)],
            neighbours: vec![1, 2],
            outside: VecDeque::new(),
            coplanar: Vec::new(),
            normal: vec![0.0, 1.0],
            offset: -1.0,
        };
        assert_eq!(facet.distance(&[0.0, 3.0]), 2.0);
        assert_eq!(facet.distance(&[5.0, 0.0]), -1.0);
    }

    #[test]
    fn test_simplex_facet_orientation_rule() {
        let basis: Vec<PointId> = (0..4).map(PointId).collect();
        // omitted = 3, dimension = 3: (3 - 3) % 2 == 0, so swap fires only
        // for a positively oriented basis
        let plain = Facet::<f64>::from_simplex(3, &basis, 3, false);
        let swapped = Facet::<f64>::from_simplex(3, &basis, 3, true);
        assert_eq!(plain.vertices, vec![PointId(0), PointId(1), PointId(2)]);
        assert_eq!(swapped.vertices, vec![PointId(2), PointId(1), PointId(0)]);
        assert_eq!(swapped.neighbours, vec![2, 1, 0]);
    }
}
