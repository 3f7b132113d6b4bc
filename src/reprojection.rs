//! Reprojection of `geo` geometries between CRS definitions, delegating the
//! transform math to PROJ.

use anyhow::{Context, Result};
use geo::{Coord, MapCoords};
use proj::Proj;

/// The default/only CRS used by GeoJSON.
pub const WGS84: &str = "EPSG:4326";

/// Build a PROJ transformer between two CRS definitions (EPSG codes or PROJ
/// strings).
pub fn projector(from_crs: &str, to_crs: &str) -> Result<Proj> {
    Proj::new_known_crs(from_crs, to_crs, None).with_context(|| {
        format!(
            "Failed to create projection from {:?} to {:?}",
            from_crs, to_crs
        )
    })
}

/// Reproject a geometry using an existing transformer.
pub fn reproject_with<G>(geom: &G, proj: &Proj) -> Result<G>
where
    G: MapCoords<f64, f64, Output = G>,
{
    geom.try_map_coords(|c: Coord<f64>| {
        let (x, y) = proj.convert((c.x, c.y))?;
        Ok::<_, proj::ProjError>(Coord { x, y })
    })
    .context("Failed to reproject geometry")
}

/// Reproject a geometry from one CRS to another.
pub fn reproject<G>(geom: &G, from_crs: &str, to_crs: &str) -> Result<G>
where
    G: MapCoords<f64, f64, Output = G>,
{
    reproject_with(geom, &projector(from_crs, to_crs)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Point;

    #[test]
    fn test_identity_reprojection() {
        // May be skipped when the PROJ database is unavailable
        if let Ok(proj) = projector(WGS84, WGS84) {
            let p = Point::new(133.0, -25.0);
            let q = reproject_with(&p, &proj).unwrap();
            assert!((q.x() - p.x()).abs() < 1e-9);
            assert!((q.y() - p.y()).abs() < 1e-9);
        }
    }

    #[test]
    fn test_reproject_to_projected_crs() {
        let p = Point::new(133.0, -25.0);
        // EPSG:3112 is GDA94 / Geoscience Australia Lambert, units in metres
        if let Ok(q) = reproject(&p, WGS84, "EPSG:3112") {
            assert!(q.x().abs() > 1_000.0);
            assert!(q.y().abs() > 1_000.0);
        }
    }
}
