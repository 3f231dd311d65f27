//! d-dimensional Convex Hull Library
//!
//! This library implements the Quickhull algorithm for computing convex hulls
//! in Euclidean spaces of any dimension d >= 2.
//!
//! The hull is returned as a set of (d-1)-dimensional facets, each carrying its
//! oriented vertex list, the neighbouring facet across every ridge, and the
//! supporting hyperplane equation `normal . x + offset = 0` oriented so that
//! the interior of the hull lies on the negative side.
//!
//! # Example
//! ```
//! use math_quickhull::convex_hull;
//!
//! let points = vec![
//!     vec![0.0, 0.0, 0.0],
//!     vec![1.0, 0.0, 0.0],
//!     vec![0.0, 1.0, 0.0],
//!     vec![0.0, 0.0, 1.0],
//! ];
//!
//! let hull = convex_hull(3, 1e-10, &points).unwrap();
//! assert_eq!(hull.num_facets(), 4);
//! ```

mod export;
mod matrix;
mod quickhull;
mod types;
mod validation;

// Make testdata publicly available for tests and benches
pub mod testdata;

pub use export::export_obj;
pub use quickhull::QuickHull;
pub use types::{ConvexHull, Facet, PointId};

use num_traits::float::FloatCore;
use num_traits::{Float, NumAssign};
use std::fmt::Debug;

/// Scalar types the hull engine can run on.
///
/// The engine only needs the field operations, absolute value, square root
/// and a total order on non-NaN values, so any float-like type satisfying the
/// `num_traits` float traits works (`f64` and `f32` in particular).
pub trait Scalar: Float + FloatCore + NumAssign + Debug + 'static {}

impl<T> Scalar for T where T: Float + FloatCore + NumAssign + Debug + 'static {}

/// Error types for convex hull operations
#[derive(Debug, thiserror::Error)]
pub enum ConvexHullError {
    #[error("dimension must be at least 2, got {0}")]
    InvalidDimension(usize),

    #[error("tolerance must be non-negative")]
    NegativeTolerance,

    #[error("need at least {needed} points for a {dimension}-dimensional hull, got {got}")]
    InsufficientVertices {
        dimension: usize,
        needed: usize,
        got: usize,
    },

    #[error("point cloud spans only a {rank}-dimensional affine subspace")]
    RankDeficient { rank: usize },

    #[error("maximum iterations exceeded")]
    MaxIterationsExceeded,

    #[error("hull construction failed: {0}")]
    ComputationFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConvexHullError>;

/// Build the convex hull of a point cloud in one call.
///
/// Runs the whole build sequence: seed an affine basis, erect the initial
/// simplex, expand it to the full hull and detach the result. Rank-deficient
/// input (a cloud spanning a lower-dimensional affine subspace) is reported
/// as [`ConvexHullError::RankDeficient`].
pub fn convex_hull<T, P>(dimension: usize, eps: T, points: &[P]) -> Result<ConvexHull<T>>
where
    T: Scalar,
    P: AsRef<[T]>,
{
    if points.len() < dimension + 1 {
        return Err(ConvexHullError::InsufficientVertices {
            dimension,
            needed: dimension + 1,
            got: points.len(),
        });
    }
    let mut hull = QuickHull::new(dimension, eps, points)?;
    hull.add_points((0..points.len()).map(PointId));
    let basis = hull.get_affine_basis();
    if basis.len() != dimension + 1 {
        return Err(ConvexHullError::RankDeficient {
            rank: basis.len().saturating_sub(1),
        });
    }
    hull.create_initial_simplex(&basis)?;
    hull.create_convex_hull()?;
    Ok(hull.into_hull())
}
