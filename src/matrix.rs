//! Dense working matrices for the hull engine
//!
//! The engine keeps two d x d scratch matrices alive for its whole lifetime:
//! `m` (primary) and `s` (shadow). Hyperplane fitting, the affine-basis
//! selector and the hypervolume routines all run on these two buffers, so no
//! per-call allocation happens on the hot path.

use ndarray::Array2;
use num_traits::Float;

use crate::Scalar;

/// Determinant of the n x n leading block via in-place LUP factorization.
///
/// Partial pivoting by absolute value; a pivot whose magnitude does not
/// strictly exceed `eps` makes the block singular and the determinant zero.
/// Each row exchange flips the sign. The factorization (L below the
/// diagonal, U on and above) is left in `a` and not meaningful to callers.
pub(crate) fn lup_det<T: Scalar>(a: &mut Array2<T>, n: usize, eps: T) -> T {
    debug_assert!(0 < n);
    let mut det = T::one();
    for i in 0..n {
        let mut pivot = i;
        let mut max = Float::abs(a[[i, i]]);
        for p in (i + 1)..n {
            let y = Float::abs(a[[p, i]]);
            if max < y {
                max = y;
                pivot = p;
            }
        }
        if !(eps < max) {
            return T::zero(); // singular
        }
        if pivot != i {
            det = -det;
            for c in 0..n {
                let t = a[[i, c]];
                a[[i, c]] = a[[pivot, c]];
                a[[pivot, c]] = t;
            }
        }
        let dia = a[[i, i]];
        for j in (i + 1)..n {
            a[[j, i]] /= dia;
        }
        det *= dia;
        for j in (i + 1)..n {
            let mji = a[[j, i]];
            for k in (i + 1)..n {
                let update = mji * a[[i, k]];
                a[[j, k]] -= update;
            }
        }
    }
    det
}

/// The two working matrices and the operations the hull engine needs on them.
pub(crate) struct WorkMatrices<T> {
    dimension: usize,
    eps: T,
    pub(crate) m: Array2<T>,
    pub(crate) s: Array2<T>,
}

impl<T: Scalar> WorkMatrices<T> {
    pub(crate) fn new(dimension: usize, eps: T) -> Self {
        Self {
            dimension,
            eps,
            m: Array2::from_elem((dimension, dimension), T::zero()),
            s: Array2::from_elem((dimension, dimension), T::zero()),
        }
    }

    /// Transpose the shadow matrix in place.
    pub(crate) fn transpose_shadow(&mut self) {
        for r in 0..self.dimension {
            for c in (r + 1)..self.dimension {
                let t = self.s[[r, c]];
                self.s[[r, c]] = self.s[[c, r]];
                self.s[[c, r]] = t;
            }
        }
    }

    /// Copy the shadow matrix into the primary one.
    pub(crate) fn copy_shadow(&mut self) {
        self.m.assign(&self.s);
    }

    /// Rebuild the primary matrix from the shadow, with row `identity`
    /// replaced by the all-ones vector. Every row is refreshed since the
    /// determinant destroys the primary matrix.
    pub(crate) fn restore_row(&mut self, identity: usize) {
        for r in 0..self.dimension {
            if r == identity {
                for c in 0..self.dimension {
                    self.m[[r, c]] = T::one();
                }
            } else {
                for c in 0..self.dimension {
                    self.m[[r, c]] = self.s[[r, c]];
                }
            }
        }
    }

    /// Gram block: s[0..size][0..size] = m * m^T restricted to the leading
    /// `size` rows of m. Used for the non-oriented rank-deficient measure.
    pub(crate) fn gram(&mut self, size: usize) {
        debug_assert!(size < self.dimension);
        for r in 0..size {
            for c in 0..size {
                let mut acc = T::zero();
                for k in 0..self.dimension {
                    acc += self.m[[r, k]] * self.m[[c, k]];
                }
                self.s[[r, c]] = acc;
            }
        }
    }

    /// LUP determinant of the n x n leading block of the primary matrix.
    pub(crate) fn det(&mut self, n: usize) -> T {
        lup_det(&mut self.m, n, self.eps)
    }

    /// LUP determinant of the n x n leading block of the shadow matrix.
    pub(crate) fn det_shadow(&mut self, n: usize) -> T {
        lup_det(&mut self.s, n, self.eps)
    }

    /// Packed Householder QR of the `rank` x d leading rows of the shadow
    /// matrix, in place.
    ///
    /// Returns false when a sub-column norm or reflector scale fails to
    /// exceed the tolerance, i.e. the rows are numerically rank deficient.
    /// The reflector sign is chosen against cancellation.
    pub(crate) fn householder(&mut self, rank: usize) -> bool {
        let dim = self.dimension;
        debug_assert!(rank <= dim);
        for i in 0..rank {
            let mut norm = T::zero();
            for j in i..dim {
                let q = self.s[[i, j]];
                norm += q * q;
            }
            norm = norm.sqrt();
            if !(self.eps < norm) {
                return false;
            }
            let head = self.s[[i, i]];
            let sign = T::zero() < head;
            let mut factor = norm * (norm + if sign { head } else { -head });
            if !(self.eps < factor) {
                return false;
            }
            factor = T::one() / factor.sqrt();
            self.s[[i, i]] = if sign { head + norm } else { head - norm };
            for k in i..dim {
                self.s[[i, k]] *= factor;
            }
            for j in (i + 1)..rank {
                let mut dot = T::zero();
                for k in i..dim {
                    dot += self.s[[i, k]] * self.s[[j, k]];
                }
                for k in i..dim {
                    let update = self.s[[i, k]] * dot;
                    self.s[[j, k]] -= update;
                }
            }
        }
        true
    }

    /// Reconstruct the first `rank` columns of Q from the packed QR in the
    /// shadow matrix, writing column i into row i of the primary matrix.
    /// Reflectors are applied in reverse order to the standard basis vectors.
    pub(crate) fn reconstruct_q(&mut self, rank: usize) {
        let dim = self.dimension;
        debug_assert!(rank <= dim);
        for i in 0..rank {
            for c in 0..dim {
                self.m[[i, c]] = T::zero();
            }
            self.m[[i, i]] = T::one();
            for j in (0..rank).rev() {
                let mut dot = T::zero();
                for k in j..dim {
                    dot += self.s[[j, k]] * self.m[[i, k]];
                }
                for k in j..dim {
                    let update = self.s[[j, k]] * dot;
                    self.m[[i, k]] -= update;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPS: f64 = 1e-12;

    fn work(dim: usize) -> WorkMatrices<f64> {
        WorkMatrices::new(dim, EPS)
    }

    #[test]
    fn test_det_identity() {
        let mut w = work(4);
        for i in 0..4 {
            w.m[[i, i]] = 1.0;
        }
        assert_relative_eq!(w.det(4), 1.0);
    }

    #[test]
    fn test_det_known_3x3() {
        let mut w = work(3);
        let a = [[2.0, 0.0, 1.0], [1.0, 3.0, 2.0], [0.0, 1.0, 1.0]];
        for r in 0..3 {
            for c in 0..3 {
                w.m[[r, c]] = a[r][c];
            }
        }
        assert_relative_eq!(w.det(3), 3.0, epsilon = 1e-10);
    }

    #[test]
    fn test_det_sign_flips_under_row_swap() {
        let mut w = work(2);
        w.m[[0, 0]] = 1.0;
        w.m[[0, 1]] = 2.0;
        w.m[[1, 0]] = 3.0;
        w.m[[1, 1]] = 4.0;
        assert_relative_eq!(w.det(2), -2.0, epsilon = 1e-10);

        w.m[[0, 0]] = 3.0;
        w.m[[0, 1]] = 4.0;
        w.m[[1, 0]] = 1.0;
        w.m[[1, 1]] = 2.0;
        assert_relative_eq!(w.det(2), 2.0, epsilon = 1e-10);
    }

    #[test]
    fn test_det_singular_is_zero() {
        let mut w = work(3);
        for c in 0..3 {
            w.m[[0, c]] = 1.0;
            w.m[[1, c]] = 2.0; // row 1 = 2 * row 0
            w.m[[2, c]] = (c + 1) as f64;
        }
        assert_relative_eq!(w.det(3), 0.0);
    }

    #[test]
    fn test_householder_rejects_dependent_rows() {
        let mut w = work(3);
        for c in 0..3 {
            w.s[[0, c]] = 1.0;
            w.s[[1, c]] = 2.0;
        }
        assert!(!w.householder(2));
    }

    #[test]
    fn test_reconstructed_q_is_orthonormal() {
        let mut w = work(3);
        let rows = [[1.0, 1.0, 0.0], [1.0, 0.0, 1.0]];
        for r in 0..2 {
            for c in 0..3 {
                w.s[[r, c]] = rows[r][c];
            }
        }
        assert!(w.householder(2));
        w.reconstruct_q(2);
        for i in 0..2 {
            for j in 0..2 {
                let mut dot = 0.0;
                for k in 0..3 {
                    dot += w.m[[i, k]] * w.m[[j, k]];
                }
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(dot, expected, epsilon = 1e-10);
            }
        }
        // the original rows must lie in the span of the Q columns
        for row in &rows {
            let mut residual = [row[0], row[1], row[2]];
            for i in 0..2 {
                let mut dot = 0.0;
                for k in 0..3 {
                    dot += row[k] * w.m[[i, k]];
                }
                for k in 0..3 {
                    residual[k] -= dot * w.m[[i, k]];
                }
            }
            let norm: f64 = residual.iter().map(|x| x * x).sum::<f64>().sqrt();
            assert_relative_eq!(norm, 0.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_gram_measure_is_permutation_symmetric() {
        let rows = [[1.0, 2.0, 0.0], [0.0, 1.0, 3.0]];
        let measure = |order: [usize; 2]| {
            let mut w = work(3);
            for (r, &src) in order.iter().enumerate() {
                for c in 0..3 {
                    w.m[[r, c]] = rows[src][c];
                }
            }
            w.gram(2);
            w.det_shadow(2).sqrt()
        };
        assert_relative_eq!(measure([0, 1]), measure([1, 0]), epsilon = 1e-10);
    }
}
