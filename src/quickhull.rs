//! Quickhull algorithm implementation for d-dimensional convex hulls
//!
//! Based on:
//! - Barber, C.B., Dobkin, D.P., and Huhdanpaa, H.T., "The Quickhull algorithm
//!   for convex hulls," ACM Trans. on Mathematical Software, 22(4):469-483, 1996.
//!
//! The build is incremental: an initial d-simplex is grown one apex at a
//! time. Every iteration picks the facet with the furthest outside point,
//! carves the region visible from that point out of the hull and wraps the
//! resulting horizon with a cone of new facets. All bookkeeping (facet slots,
//! ridge pairing, outside sets, the distance ranking) is strictly serial and
//! owned by the builder.

use ordered_float::NotNan;
use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap, HashSet};

use crate::matrix::WorkMatrices;
use crate::types::{ConvexHull, Facet, PointId};
use crate::{ConvexHullError, Result, Scalar};

const MAX_ITERATIONS: usize = 100_000;

/// Incremental d-dimensional convex hull builder.
///
/// The builder borrows the point cloud and refers to points exclusively by
/// [`PointId`]; handles must stay valid (and coordinates unchanged) until the
/// build completes. The expected call sequence is [`add_points`],
/// [`get_affine_basis`], [`create_initial_simplex`], [`create_convex_hull`],
/// then [`facets`] or [`into_hull`].
///
/// [`add_points`]: QuickHull::add_points
/// [`get_affine_basis`]: QuickHull::get_affine_basis
/// [`create_initial_simplex`]: QuickHull::create_initial_simplex
/// [`create_convex_hull`]: QuickHull::create_convex_hull
/// [`facets`]: QuickHull::facets
/// [`into_hull`]: QuickHull::into_hull
pub struct QuickHull<'a, T, P> {
    pub(crate) dimension: usize,
    pub(crate) eps: T,
    points: &'a [P],
    mats: WorkMatrices<T>,
    /// Points not yet claimed by any facet's outside set.
    outside: Vec<PointId>,
    pub(crate) facets: Vec<Facet<T>>,
    /// Free list of tombstoned facet slots, reused by `add_facet`.
    removed: Vec<usize>,
    /// Facets ordered by their furthest outside distance; last is best.
    ranking: BTreeSet<(NotNan<T>, usize)>,
    ranking_index: HashMap<usize, NotNan<T>>,
    /// Ridges of freshly created cone facets still waiting for their twin,
    /// keyed by the sorted vertex handles of the ridge.
    pending_ridges: HashMap<Vec<PointId>, (usize, usize)>,
    visited: HashSet<usize>,
    visible: HashSet<usize>,
    pub(crate) inner_point: Vec<T>,
}

impl<'a, T, P> QuickHull<'a, T, P>
where
    T: Scalar,
    P: AsRef<[T]>,
{
    /// Create a builder for `dimension`-space with tolerance `eps` over the
    /// given point cloud. Requires `dimension >= 2` and `eps >= 0`.
    pub fn new(dimension: usize, eps: T, points: &'a [P]) -> Result<Self> {
        if dimension < 2 {
            return Err(ConvexHullError::InvalidDimension(dimension));
        }
        if eps < T::zero() {
            return Err(ConvexHullError::NegativeTolerance);
        }
        Ok(Self {
            dimension,
            eps,
            points,
            mats: WorkMatrices::new(dimension, eps),
            outside: Vec::new(),
            facets: Vec::new(),
            removed: Vec::new(),
            ranking: BTreeSet::new(),
            ranking_index: HashMap::new(),
            pending_ridges: HashMap::new(),
            visited: HashSet::new(),
            visible: HashSet::new(),
            inner_point: vec![T::zero(); dimension],
        })
    }

    /// Dimension of the ambient space.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// The numerical tolerance governing pivoting, coplanarity and apex
    /// selection.
    pub fn tolerance(&self) -> T {
        self.eps
    }

    /// The interior reference point; meaningful once the initial simplex
    /// exists.
    pub fn inner_point(&self) -> &[T] {
        &self.inner_point
    }

    /// The facet store. Meaningful as a hull description after
    /// [`create_convex_hull`](QuickHull::create_convex_hull) has compacted it.
    pub fn facets(&self) -> &[Facet<T>] {
        &self.facets
    }

    pub(crate) fn coords(&self, id: PointId) -> &'a [T] {
        self.points[id.index()].as_ref()
    }

    /// Append point handles to the outside pool. May be called repeatedly
    /// before the build begins.
    pub fn add_points<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = PointId>,
    {
        self.outside.extend(ids);
    }

    /// Detach the computed hull from the builder.
    pub fn into_hull(self) -> ConvexHull<T> {
        ConvexHull::new(self.dimension, self.eps, self.inner_point, self.facets)
    }

    /// Move the pool point furthest from the affine span of `basis` to the
    /// end of the basis.
    ///
    /// The span is orthonormalized against the last basis point as origin;
    /// each candidate's residual after projecting onto the Q columns is its
    /// distance to the span. Fails when the span itself is numerically rank
    /// deficient or no residual strictly exceeds the tolerance.
    fn steal_best(&mut self, basis: &mut Vec<PointId>) -> bool {
        debug_assert!(!basis.is_empty());
        let rank = basis.len() - 1;
        debug_assert!(rank < self.dimension);
        let dim = self.dimension;
        let origin: Vec<T> = self.coords(basis[rank])[..dim].to_vec();
        for (r, &b) in basis[..rank].iter().enumerate() {
            let x = self.coords(b);
            for c in 0..dim {
                self.mats.s[[r, c]] = x[c] - origin[c];
            }
        }
        if !self.mats.householder(rank) {
            return false;
        }
        self.mats.reconstruct_q(rank);
        let mut apex = vec![T::zero(); dim];
        let mut projection = vec![T::zero(); dim];
        let mut distance = T::zero();
        let mut furthest = None;
        for (candidate, &id) in self.outside.iter().enumerate() {
            let x = self.coords(id);
            for c in 0..dim {
                apex[c] = x[c] - origin[c];
            }
            projection.copy_from_slice(&apex);
            for i in 0..rank {
                let mut dot = T::zero();
                for k in 0..dim {
                    dot += apex[k] * self.mats.m[[i, k]];
                }
                for k in 0..dim {
                    projection[k] -= dot * self.mats.m[[i, k]];
                }
            }
            let mut norm = T::zero();
            for k in 0..dim {
                norm += projection[k] * projection[k];
            }
            let d = norm.sqrt();
            if distance < d {
                distance = d;
                furthest = Some(candidate);
            }
        }
        match furthest {
            Some(candidate) if self.eps < distance => {
                let id = self.outside.remove(candidate);
                basis.push(id);
                true
            }
            _ => false,
        }
    }

    /// Greedily collect d+1 affinely independent points from the pool.
    ///
    /// A returned sequence shorter than d+1 signals rank deficiency: the
    /// cloud spans a lower-dimensional affine subspace and the build must not
    /// proceed. The seed point is put back at the front of the pool after the
    /// second point is found, so it is reconsidered as an apex candidate.
    pub fn get_affine_basis(&mut self) -> Vec<PointId> {
        debug_assert!(self.facets.is_empty());
        let mut basis = Vec::with_capacity(self.dimension + 1);
        if self.outside.is_empty() {
            return basis;
        }
        basis.push(self.outside.remove(0));
        if !self.steal_best(&mut basis) {
            return basis;
        }
        let seed = basis.remove(0);
        self.outside.insert(0, seed);
        for _ in 0..self.dimension {
            if !self.steal_best(&mut basis) {
                return basis;
            }
        }
        basis
    }

    /// Oriented (rank = d) or non-oriented (rank < d) measure of the
    /// parallelotope spanned from the last handle, as origin, to each of the
    /// preceding ones.
    ///
    /// Full rank uses the signed LUP determinant; lower rank the square root
    /// of the Gram determinant, which is invariant under reordering of the
    /// spanning vectors.
    pub fn hypervolume(&mut self, ids: &[PointId]) -> T {
        if ids.len() < 2 {
            return T::zero();
        }
        let rank = ids.len() - 1;
        debug_assert!(rank <= self.dimension);
        let dim = self.dimension;
        let origin = self.coords(ids[rank]);
        for (r, &id) in ids[..rank].iter().enumerate() {
            let x = self.coords(id);
            for c in 0..dim {
                self.mats.m[[r, c]] = x[c] - origin[c];
            }
        }
        if rank == dim {
            self.mats.det(dim)
        } else {
            self.mats.gram(rank);
            self.mats.det_shadow(rank).sqrt()
        }
    }

    /// Fit the facet's supporting hyperplane through its d vertices.
    ///
    /// The offset is the negated vertex-matrix determinant; each normal
    /// component is the determinant with the corresponding coordinate row
    /// replaced by ones. Both are then scaled to a unit normal. The interior
    /// reference point must land strictly below; a violation is only logged
    /// here and left for the verifier to report.
    fn set_hyperplane_equation(&mut self, f: usize) {
        let dim = self.dimension;
        for r in 0..dim {
            let x = self.coords(self.facets[f].vertices[r]);
            for c in 0..dim {
                self.mats.s[[r, c]] = x[c];
            }
        }
        self.mats.transpose_shadow();
        self.mats.copy_shadow();
        let mut offset = -self.mats.det(dim);
        let mut normal = vec![T::zero(); dim];
        let mut norm = T::zero();
        for i in 0..dim {
            self.mats.restore_row(i);
            let n = self.mats.det(dim);
            norm += n * n;
            normal[i] = n;
        }
        norm = norm.sqrt();
        for n in &mut normal {
            *n /= norm;
        }
        offset /= norm;
        self.facets[f].normal = normal;
        self.facets[f].offset = offset;
        if !(self.facets[f].distance(&self.inner_point) < T::zero()) {
            log::warn!(
                "facet {} is not oriented against the interior reference point",
                f
            );
        }
    }

    /// Insert a cone facet, reusing a tombstoned slot when one is free.
    fn add_facet(
        &mut self,
        vertices: &[PointId],
        against: usize,
        apex: PointId,
        neighbour: usize,
    ) -> usize {
        if let Some(f) = self.removed.pop() {
            self.facets[f].reuse(vertices, against, apex, neighbour);
            f
        } else {
            let f = self.facets.len();
            self.facets
                .push(Facet::wrap(self.dimension, vertices, against, apex, neighbour));
            f
        }
    }

    /// Enter a facet into the ranking, keyed by its furthest outside
    /// distance. Distances not strictly above the tolerance (NaN included)
    /// never rank.
    fn rank(&mut self, distance: T, f: usize) {
        if self.eps < distance
            && let Ok(key) = NotNan::new(distance)
        {
            self.ranking.insert((key, f));
            self.ranking_index.insert(f, key);
        }
    }

    /// Drop a facet from the ranking and tombstone its slot.
    fn unrank(&mut self, f: usize) {
        if let Some(key) = self.ranking_index.remove(&f) {
            self.ranking.remove(&(key, f));
        }
        self.removed.push(f);
    }

    fn best_facet(&self) -> Option<usize> {
        debug_assert_eq!(self.ranking.len(), self.ranking_index.len());
        self.ranking.iter().next_back().map(|&(_, f)| f)
    }

    /// Distribute the pool over facet `f` and return the furthest distance
    /// seen.
    ///
    /// Points strictly above the hyperplane move into the facet's outside
    /// set, a new maximum to the front. Points within the coplanarity band
    /// are recorded in the facet's coplanar bag but stay in the pool: a point
    /// coplanar to one facet may still be strictly outside another.
    fn partition(&mut self, f: usize) -> T {
        let mut distance = T::zero();
        let pool = std::mem::take(&mut self.outside);
        for id in pool {
            let d = self.facets[f].distance(self.coords(id));
            if self.eps < d {
                if distance < d {
                    distance = d;
                    self.facets[f].outside.push_front(id);
                } else {
                    self.facets[f].outside.push_back(id);
                }
            } else {
                if !(d < -self.eps) {
                    self.facets[f].coplanar.push(id);
                }
                self.outside.push(id);
            }
        }
        distance
    }

    /// Point the slot in `f`'s neighbour list that held `from` at `to`.
    fn replace_neighbour(&mut self, f: usize, from: usize, to: usize) {
        if from == to {
            return;
        }
        for n in &mut self.facets[f].neighbours {
            if *n == from {
                *n = to;
                return;
            }
        }
    }

    /// Pair the new facet's open ridges with other cone facets.
    ///
    /// A ridge is the facet minus one vertex, identified by its sorted vertex
    /// handles. The ridge opposite `skip` is already linked to the parent's
    /// invisible neighbour. Matching ridges cross-link both facets' neighbour
    /// slots and leave the pending map; once the horizon is fully wrapped the
    /// map is empty again.
    fn find_adjacent_facets(&mut self, f: usize, skip: usize) {
        let vertices = self.facets[f].vertices.clone();
        for v in 0..self.dimension {
            if v == skip {
                continue;
            }
            let mut key = Vec::with_capacity(self.dimension - 1);
            for (i, &vertex) in vertices.iter().enumerate() {
                if i != v {
                    key.push(vertex);
                }
            }
            key.sort_unstable();
            match self.pending_ridges.entry(key) {
                Entry::Occupied(entry) => {
                    let (other_f, other_v) = entry.remove();
                    self.facets[other_f].neighbours[other_v] = f;
                    self.facets[f].neighbours[v] = other_f;
                }
                Entry::Vacant(entry) => {
                    entry.insert((f, v));
                }
            }
        }
    }

    /// Depth-first traversal of the facets visible from `apex`, starting at
    /// `f`. Returns whether `f` is visible.
    ///
    /// Visible facets surrender their outside points back to the pool, lose
    /// their coplanar bags and are tombstoned. Every ridge between a visible
    /// facet and an invisible neighbour is on the horizon and spawns exactly
    /// one cone facet, oriented by inheriting the parent's vertex order with
    /// the apex substituted. Recursion depth is bounded by the number of
    /// visible facets.
    fn process_visibles(&mut self, newfacets: &mut Vec<usize>, f: usize, apex: PointId) -> bool {
        debug_assert!(self.visible.len() <= self.visited.len());
        if !self.visited.insert(f) {
            return self.visible.contains(&f);
        }
        if !(T::zero() < self.facets[f].distance(self.coords(apex))) {
            return false;
        }
        self.visible.insert(f);
        let reclaimed = std::mem::take(&mut self.facets[f].outside);
        self.outside.extend(reclaimed);
        self.facets[f].coplanar.clear();
        let vertices = self.facets[f].vertices.clone();
        for v in 0..self.dimension {
            let neighbour = self.facets[f].neighbours[v];
            if !self.process_visibles(newfacets, neighbour, apex) {
                let newfacet = self.add_facet(&vertices, v, apex, neighbour);
                self.set_hyperplane_equation(newfacet);
                newfacets.push(newfacet);
                self.replace_neighbour(neighbour, f, newfacet);
                self.find_adjacent_facets(newfacet, v);
            }
        }
        self.unrank(f);
        true
    }

    /// Erect the initial simplex over a basis of exactly d+1 affinely
    /// independent handles and return its oriented hypervolume.
    ///
    /// The centroid of the basis becomes the interior reference point for
    /// the rest of the build; the hypervolume's sign decides the global
    /// orientation swap applied to every simplex facet. All pool points are
    /// distributed across the d+1 facets, and whatever remains unclaimed is
    /// interior and dropped.
    pub fn create_initial_simplex(&mut self, basis: &[PointId]) -> Result<T> {
        if basis.len() != self.dimension + 1 {
            return Err(ConvexHullError::RankDeficient {
                rank: basis.len().saturating_sub(1),
            });
        }
        debug_assert!(self.facets.is_empty());
        let dim = self.dimension;
        let mut inner = vec![T::zero(); dim];
        for &id in basis {
            let x = self.coords(id);
            for c in 0..dim {
                inner[c] += x[c];
            }
        }
        let mut count = T::zero();
        for _ in 0..=dim {
            count += T::one();
        }
        for c in inner.iter_mut() {
            *c /= count;
        }
        self.inner_point = inner;
        let volume = self.hypervolume(basis);
        let swap = volume < T::zero();
        for omitted in 0..=dim {
            let f = self.facets.len();
            self.facets
                .push(Facet::from_simplex(dim, basis, omitted, swap));
            self.set_hyperplane_equation(f);
            let distance = self.partition(f);
            self.rank(distance, f);
        }
        self.outside.clear();
        debug_assert!(self.check());
        Ok(volume)
    }

    /// Expand the initial simplex to the convex hull of all added points.
    ///
    /// Each iteration takes the facet with the globally furthest outside
    /// point, carves the region visible from that apex and repartitions the
    /// reclaimed points over the new cone. Terminates when no facet has an
    /// outside point beyond the tolerance, then compacts the facet store.
    pub fn create_convex_hull(&mut self) -> Result<()> {
        debug_assert_eq!(self.facets.len(), self.dimension + 1);
        debug_assert!(self.removed.is_empty());
        let mut newfacets = Vec::new();
        let mut iterations = 0usize;
        while let Some(f) = self.best_facet() {
            iterations += 1;
            if iterations > MAX_ITERATIONS {
                log::error!(
                    "max iterations exceeded with {} facets alive",
                    self.facets.len() - self.removed.len()
                );
                return Err(ConvexHullError::MaxIterationsExceeded);
            }
            if iterations % 512 == 0 {
                log::debug!(
                    "iteration {}: {} facets alive, {} tombstoned",
                    iterations,
                    self.facets.len() - self.removed.len(),
                    self.removed.len()
                );
            }
            let apex = match self.facets[f].outside.pop_front() {
                Some(apex) => apex,
                None => {
                    return Err(ConvexHullError::ComputationFailed(format!(
                        "ranked facet {f} has no outside points"
                    )));
                }
            };
            if !self.process_visibles(&mut newfacets, f, apex) {
                return Err(ConvexHullError::ComputationFailed(format!(
                    "facet {f} is not visible from its own furthest point"
                )));
            }
            self.visited.clear();
            self.visible.clear();
            debug_assert!(self.pending_ridges.is_empty());
            for i in 0..newfacets.len() {
                let n = newfacets[i];
                debug_assert!(self.check_local_convexity(n));
                let distance = self.partition(n);
                self.rank(distance, n);
            }
            newfacets.clear();
            self.outside.clear();
        }
        debug_assert!(self.ranking_index.is_empty());
        self.compactify();
        Ok(())
    }

    /// Fill tombstoned slots by relocating facets from the tail, rewriting
    /// the moved facet's back-pointers and its ranking entry. Free slots are
    /// processed in descending order so a relocated facet is never itself a
    /// tombstone.
    fn compactify(&mut self) {
        debug_assert_eq!(self.ranking.len(), self.ranking_index.len());
        let mut removed = std::mem::take(&mut self.removed);
        debug_assert!(self.dimension < self.facets.len() - removed.len());
        removed.sort_unstable_by(|a, b| b.cmp(a));
        let mut source = self.facets.len();
        for destination in removed {
            debug_assert!(destination < source);
            source -= 1;
            if destination == source {
                self.facets.pop();
                continue;
            }
            self.facets.swap_remove(destination);
            let neighbours = self.facets[destination].neighbours.clone();
            for n in neighbours {
                self.replace_neighbour(n, source, destination);
            }
            if let Some(key) = self.ranking_index.remove(&source) {
                self.ranking.remove(&(key, source));
                self.ranking.insert((key, destination));
                self.ranking_index.insert(destination, key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build<'a>(dimension: usize, points: &'a [Vec<f64>]) -> QuickHull<'a, f64, Vec<f64>> {
        let mut hull = QuickHull::new(dimension, 1e-10, points).unwrap();
        hull.add_points((0..points.len()).map(PointId));
        let basis = hull.get_affine_basis();
        assert_eq!(basis.len(), dimension + 1);
        hull.create_initial_simplex(&basis).unwrap();
        hull.create_convex_hull().unwrap();
        hull
    }

    #[test]
    fn test_square_with_interior_point() {
        let points = vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
            vec![0.0, 1.0],
            vec![0.5, 0.5],
        ];
        let hull = build(2, &points);
        assert_eq!(hull.facets().len(), 4);
        assert!(hull.check());
        for facet in hull.facets() {
            assert_eq!(facet.outside().len(), 0);
            assert!(!facet.vertices().contains(&PointId(4)));
        }
    }

    #[test]
    fn test_collinear_points_are_rank_deficient() {
        let points = vec![vec![0.0, 0.0], vec![1.0, 1.0], vec![2.0, 2.0]];
        let mut hull = QuickHull::new(2, 1e-10, &points).unwrap();
        hull.add_points((0..points.len()).map(PointId));
        let basis = hull.get_affine_basis();
        assert!(basis.len() < 3);
    }

    #[test]
    fn test_tetrahedron_is_its_own_hull() {
        let points = vec![
            vec![0.0, 0.0, 0.0],
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
        ];
        let hull = build(3, &points);
        // the main loop never runs; the simplex survives unchanged
        assert_eq!(hull.facets().len(), 4);
        assert!(hull.check());
    }

    #[test]
    fn test_invalid_parameters_are_rejected() {
        let points = vec![vec![0.0, 0.0]];
        assert!(matches!(
            QuickHull::<f64, _>::new(1, 1e-10, &points),
            Err(ConvexHullError::InvalidDimension(1))
        ));
        assert!(matches!(
            QuickHull::<f64, _>::new(2, -1.0, &points),
            Err(ConvexHullError::NegativeTolerance)
        ));
    }

    #[test]
    fn test_oriented_hypervolume_of_unit_simplex() {
        let points = vec![
            vec![0.0, 0.0, 0.0],
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
        ];
        let mut hull = QuickHull::<f64, _>::new(3, 1e-10, &points).unwrap();
        let ids: Vec<PointId> = (1..4).chain(0..1).map(PointId).collect();
        let volume = hull.hypervolume(&ids);
        assert!((volume.abs() - 1.0).abs() < 1e-10);
    }
}
