//! Export functions for convex hulls

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::types::ConvexHull;
use crate::{ConvexHullError, Result};

/// Export a 3-dimensional convex hull to Wavefront OBJ format.
///
/// Writes the full input cloud as vertices (v), one normal per facet (vn)
/// and the facets as triangles (f), using OBJ's 1-based indexing. `points`
/// must be the cloud the hull was built from. Hulls of any other dimension
/// are rejected, the format only describes 3D geometry.
pub fn export_obj<P, Q>(hull: &ConvexHull<f64>, points: &[P], path: Q) -> Result<()>
where
    P: AsRef<[f64]>,
    Q: AsRef<Path>,
{
    if hull.dimension() != 3 {
        return Err(ConvexHullError::InvalidDimension(hull.dimension()));
    }
    let mut file = File::create(path)?;

    writeln!(file, "# Convex Hull OBJ Export")?;
    writeln!(file, "# Vertices: {}", points.len())?;
    writeln!(file, "# Facets: {}", hull.num_facets())?;
    writeln!(file)?;

    for point in points {
        let x = point.as_ref();
        writeln!(file, "v {} {} {}", x[0], x[1], x[2])?;
    }

    writeln!(file)?;

    for facet in hull.facets() {
        let n = facet.normal();
        writeln!(file, "vn {} {} {}", n[0], n[1], n[2])?;
    }

    writeln!(file)?;

    for (i, facet) in hull.facets().iter().enumerate() {
        let v = facet.vertices();
        writeln!(
            file,
            "f {}//{} {}//{} {}//{}",
            v[0].index() + 1,
            i + 1,
            v[1].index() + 1,
            i + 1,
            v[2].index() + 1,
            i + 1
        )?;
    }

    Ok(())
}
