//! Test data for convex hull tests
//!
//! Point-cloud generators used by the test suite and benches. Clouds are
//! plain `Vec<Vec<f64>>` so they can be handed straight to the builder.

use rand::Rng;

/// All 2^d corners of the axis-aligned hypercube with the given edge length,
/// centred at the origin.
pub fn hypercube_corners(dimension: usize, size: f64) -> Vec<Vec<f64>> {
    let s = size / 2.0;
    (0..1usize << dimension)
        .map(|mask| {
            (0..dimension)
                .map(|c| if mask >> c & 1 == 1 { s } else { -s })
                .collect()
        })
        .collect()
}

/// The d+1 corners of the standard simplex: the origin and the unit basis
/// points.
pub fn simplex_corners(dimension: usize) -> Vec<Vec<f64>> {
    let mut points = vec![vec![0.0; dimension]];
    for c in 0..dimension {
        let mut x = vec![0.0; dimension];
        x[c] = 1.0;
        points.push(x);
    }
    points
}

/// The 2d vertices of the cross polytope: +-radius along every axis.
/// For d = 3 this is the octahedron.
pub fn cross_polytope_vertices(dimension: usize, radius: f64) -> Vec<Vec<f64>> {
    let mut points = Vec::with_capacity(2 * dimension);
    for c in 0..dimension {
        for sign in [radius, -radius] {
            let mut x = vec![0.0; dimension];
            x[c] = sign;
            points.push(x);
        }
    }
    points
}

/// Random points on the d-dimensional sphere of the given radius.
///
/// Directions are isotropic: Gaussian coordinates via Box-Muller, then
/// normalized onto the sphere.
pub fn random_sphere_points(dimension: usize, n: usize, radius: f64) -> Vec<Vec<f64>> {
    let mut rng = rand::rng();
    let mut points = Vec::with_capacity(n);
    while points.len() < n {
        let mut x = Vec::with_capacity(dimension + 1);
        while x.len() < dimension {
            let u1 = rng.random::<f64>().max(f64::MIN_POSITIVE);
            let u2 = rng.random::<f64>();
            let r = (-2.0 * u1.ln()).sqrt();
            let (sin, cos) = (2.0 * std::f64::consts::PI * u2).sin_cos();
            x.push(r * cos);
            x.push(r * sin);
        }
        x.truncate(dimension);
        let norm = x.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm < 1e-12 {
            continue;
        }
        points.push(x.iter().map(|v| v / norm * radius).collect());
    }
    points
}

/// Hypercube corners plus `n_interior` uniform random points strictly inside
/// the cube.
pub fn cube_with_interior_points(dimension: usize, size: f64, n_interior: usize) -> Vec<Vec<f64>> {
    let mut points = hypercube_corners(dimension, size);
    let mut rng = rand::rng();
    for _ in 0..n_interior {
        points.push(
            (0..dimension)
                .map(|_| (rng.random::<f64>() - 0.5) * size * 0.99)
                .collect(),
        );
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hypercube_corners() {
        let corners = hypercube_corners(4, 2.0);
        assert_eq!(corners.len(), 16);
        for corner in &corners {
            assert!(corner.iter().all(|&c| c == 1.0 || c == -1.0));
        }
    }

    #[test]
    fn test_simplex_corners() {
        let corners = simplex_corners(5);
        assert_eq!(corners.len(), 6);
        assert_eq!(corners[0], vec![0.0; 5]);
    }

    #[test]
    fn test_cross_polytope_vertices() {
        let vertices = cross_polytope_vertices(3, 2.0);
        assert_eq!(vertices.len(), 6);
        for v in &vertices {
            let norm: f64 = v.iter().map(|x| x * x).sum::<f64>().sqrt();
            assert!((norm - 2.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_random_sphere_points() {
        let points = random_sphere_points(4, 100, 1.5);
        assert_eq!(points.len(), 100);
        for p in &points {
            assert_eq!(p.len(), 4);
            let norm: f64 = p.iter().map(|x| x * x).sum::<f64>().sqrt();
            assert!((norm - 1.5).abs() < 1e-9);
        }
    }
}
