//! Self-verification of a computed hull
//!
//! Based on:
//! - Mehlhorn, K., Naeher, S., Schilz, T., Schirra, S., Seel, M., Seidel, R.,
//!   and Uhrig, C., "Checking geometric programs or verification of geometric
//!   structures," Proc. 12th Annu. ACM Sympos. Comput. Geom., 159-165, 1996.
//!
//! Two independent certificates: every ridge must be locally convex, and a
//! ray shot from the interior reference point must leave the facet
//! arrangement through exactly one facet. Together they certify that the
//! facets bound a single convex region.

use ndarray::Array2;
use num_traits::Float;

use crate::Scalar;
use crate::quickhull::QuickHull;
use crate::types::cos_of_dihedral_angle;

impl<'a, T, P> QuickHull<'a, T, P>
where
    T: Scalar,
    P: AsRef<[T]>,
{
    /// Whether facet `f` is convex across each of its ridges.
    ///
    /// For every neighbour whose hyperplane is not numerically coincident,
    /// the neighbour's vertex facing `f` must not lie above `f`'s hyperplane
    /// by more than the tolerance.
    pub(crate) fn check_local_convexity(&self, f: usize) -> bool {
        let facet = &self.facets[f];
        for &n in &facet.neighbours {
            let neighbour = &self.facets[n];
            // coincident hyperplanes have cosine 1; skip to dodge roundoff
            if cos_of_dihedral_angle(facet, neighbour) < T::one() {
                for v in 0..self.dimension {
                    if neighbour.neighbours[v] == f {
                        if self.eps < facet.distance(self.coords(neighbour.vertices[v])) {
                            return false;
                        }
                        break;
                    }
                }
            }
        }
        true
    }

    /// Certify the hull: local convexity at every ridge plus the global
    /// ray-shooting parity test.
    ///
    /// Returns false as soon as any certificate fails; the engine never
    /// attempts repair.
    pub fn check(&self) -> bool {
        let dim = self.dimension;
        if self.facets.len() <= dim {
            return false;
        }
        for f in 0..self.facets.len() {
            if !self.check_local_convexity(f) {
                return false;
            }
        }
        let first = &self.facets[0];
        if !(first.distance(&self.inner_point) < T::zero()) {
            return false;
        }
        // ray from the interior point through the first facet's centroid
        let mut ray = vec![T::zero(); dim];
        for &v in &first.vertices {
            let x = self.coords(v);
            for c in 0..dim {
                ray[c] += x[c];
            }
        }
        let mut count = T::zero();
        for _ in 0..dim {
            count += T::one();
        }
        for c in 0..dim {
            ray[c] = ray[c] / count - self.inner_point[c];
        }
        {
            let mut dot = T::zero();
            for c in 0..dim {
                dot += ray[c] * first.normal[c];
            }
            if !(T::zero() < dot) {
                return false; // ray does not exit through the first facet
            }
        }
        let mut g = Array2::from_elem((dim, dim + 1), T::zero());
        let mut intersection = vec![T::zero(); dim];
        let mut extent = vec![T::zero(); dim];
        let mut columns = T::zero();
        for _ in 0..=dim {
            columns += T::one();
        }
        for f in 1..self.facets.len() {
            let facet = &self.facets[f];
            let numerator = facet.distance(&self.inner_point);
            if !(numerator < T::zero()) {
                return false; // interior point leaked to the outside
            }
            let mut denominator = T::zero();
            for c in 0..dim {
                denominator += ray[c] * facet.normal[c];
            }
            if !(T::zero() < denominator) {
                continue; // ray parallel to or receding from this facet
            }
            let scale = -(numerator / denominator);
            for c in 0..dim {
                intersection[c] = self.inner_point[c] + ray[c] * scale;
            }
            // augmented system: facet vertices as columns, the intersection
            // point as the last column
            for (v, &id) in facet.vertices.iter().enumerate() {
                let x = self.coords(id);
                for r in 0..dim {
                    g[[r, v]] = x[r];
                }
            }
            for r in 0..dim {
                g[[r, dim]] = intersection[r];
            }
            // centre each row, then shift by half the bounding-box diagonal
            // along the normal to keep the pivots away from the origin
            for r in 0..dim {
                let mut sum = T::zero();
                for c in 0..=dim {
                    sum += g[[r, c]];
                }
                let mean = sum / columns;
                for c in 0..=dim {
                    g[[r, c]] -= mean;
                }
                let mut lo = g[[r, 0]];
                let mut hi = g[[r, 0]];
                for c in 1..=dim {
                    let x = g[[r, c]];
                    if x < lo {
                        lo = x;
                    }
                    if hi < x {
                        hi = x;
                    }
                }
                extent[r] = hi - lo;
            }
            let mut diagonal = T::zero();
            for r in 0..dim {
                diagonal += extent[r] * extent[r];
            }
            let shift = diagonal.sqrt() / (T::one() + T::one());
            for r in 0..dim {
                let offset = shift * facet.normal[r];
                for c in 0..=dim {
                    g[[r, c]] += offset;
                }
            }
            // Gaussian elimination with partial pivoting
            let mut singular = false;
            for i in 0..dim {
                let mut pivot = i;
                let mut max = Float::abs(g[[i, i]]);
                for p in (i + 1)..dim {
                    let y = Float::abs(g[[p, i]]);
                    if max < y {
                        max = y;
                        pivot = p;
                    }
                }
                if !(self.eps < max) {
                    // a vertex coincided with the shifted origin; the facet
                    // geometry is degenerate
                    singular = true;
                    break;
                }
                if pivot != i {
                    for c in 0..=dim {
                        let t = g[[i, c]];
                        g[[i, c]] = g[[pivot, c]];
                        g[[pivot, c]] = t;
                    }
                }
                let gii = g[[i, i]];
                for j in (i + 1)..dim {
                    let gji = g[[j, i]] / gii;
                    for k in (i + 1)..=dim {
                        let update = gji * g[[i, k]];
                        g[[j, k]] -= update;
                    }
                    g[[j, i]] = T::zero();
                }
            }
            if singular {
                return false;
            }
            // back substitution; a solution with every barycentric
            // coordinate in [0, 1] means the ray pierces this facet too
            let mut in_range = true;
            for i in (0..dim).rev() {
                let mut xi = g[[i, dim]];
                for j in (i + 1)..dim {
                    xi -= g[[i, j]] * g[[j, dim]];
                }
                xi /= g[[i, i]];
                g[[i, dim]] = xi;
                if xi < T::zero() || T::one() < xi {
                    in_range = false;
                    break;
                }
            }
            if in_range {
                return false; // second exit facet: not a single convex region
            }
        }
        true
    }
}
