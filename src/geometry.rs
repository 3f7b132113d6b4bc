//! Construction of stamp footprints: approximate geodesic squares around a
//! centre point, optionally rotated on the spherical surface.

use anyhow::{bail, Result};
use geo::{Coord, LineString, Point, Polygon};
use rand::Rng;

use crate::reprojection::{reproject, WGS84};
use crate::rotation::rotate;

/// Mean earth radius in metres.
pub const EARTH_RADIUS_M: f64 = 6.3781e6;

/// An interpolated linestring between two points with `npoints` vertices
/// (endpoints included).
pub fn linterpolate(a: Point<f64>, b: Point<f64>, npoints: usize) -> LineString<f64> {
    let n = npoints.max(2);
    let coords: Vec<Coord<f64>> = (0..n)
        .map(|i| {
            let t = i as f64 / (n - 1) as f64;
            Coord {
                x: a.x() + (b.x() - a.x()) * t,
                y: a.y() + (b.y() - a.y()) * t,
            }
        })
        .collect();
    LineString::from(coords)
}

/// Make a box around a centre point with sides of approximately `distance`
/// kilometres.
///
/// The box is built on the surface of the earth, so it is not an exact
/// square; the east-west extent is widened with latitude so the ground
/// distance stays close to `distance`.
///
/// `projection` gives the CRS of the input point (WGS84 when `None`) and
/// `output_projection` the CRS of the returned polygon (same as the input
/// when `None`). `npoints` is the number of vertices per side; 2 returns
/// just the corners, larger values interpolate the sides so the shape
/// survives reprojection.
pub fn make_box(
    centre: Point<f64>,
    distance: f64,
    npoints: usize,
    projection: Option<&str>,
    output_projection: Option<&str>,
) -> Result<Polygon<f64>> {
    if npoints < 2 {
        bail!("npoints must be >= 2, got {}", npoints);
    }

    // Work in WGS84 radians
    let centre_wgs84 = match projection {
        Some(crs) => reproject(&centre, crs, WGS84)?,
        None => centre,
    };
    let lon0 = centre_wgs84.x().to_radians();
    let lat0 = centre_wgs84.y().to_radians();

    // Latitude difference is independent of longitude
    let angular = distance * 1000.0 / EARTH_RADIUS_M;
    let lat1 = lat0 - angular / 2.0;
    let lat2 = lat0 + angular / 2.0;

    // Half the longitude span at a given latitude
    let half_dlon = |lat: f64| angular / lat.cos() / 2.0;
    let to_point = |lon: f64, lat: f64| Point::new(lon.to_degrees(), lat.to_degrees());

    let south_west = to_point(lon0 - half_dlon(lat1), lat1);
    let south_east = to_point(lon0 + half_dlon(lat1), lat1);
    let north_east = to_point(lon0 + half_dlon(lat2), lat2);
    let north_west = to_point(lon0 - half_dlon(lat2), lat2);

    // Walk the ring, interpolating each side and dropping the duplicated
    // joint vertex between consecutive sides
    let mut ring: Vec<Coord<f64>> = Vec::new();
    for (a, b) in [
        (south_west, south_east),
        (south_east, north_east),
        (north_east, north_west),
        (north_west, south_west),
    ] {
        let side = linterpolate(a, b, npoints);
        let side = side.0;
        ring.extend_from_slice(&side[..side.len() - 1]);
    }
    ring.push(ring[0]);
    let shape = Polygon::new(LineString::from(ring), vec![]);

    match (projection, output_projection) {
        // back to the input projection
        (Some(crs), None) => reproject(&shape, WGS84, crs),
        // explicit output projection wins
        (_, Some(out)) => reproject(&shape, WGS84, out),
        (None, None) => Ok(shape),
    }
}

/// Make a rotated box ("stamp" footprint) with some angle and size.
///
/// `angle` is in degrees from north; when `None`, a uniform random angle in
/// [0, 360) is drawn. `distance` is the approximate side length in
/// kilometres. The centre is WGS84 longitude/latitude.
pub fn make_stamp(centre: Point<f64>, angle: Option<f64>, distance: f64) -> Result<Polygon<f64>> {
    let angle = angle.unwrap_or_else(|| rand::thread_rng().gen_range(0.0..360.0));
    let shape = make_box(centre, distance, 2, None, None)?;
    Ok(rotate(&shape, centre, angle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::{BoundingRect, Centroid};

    #[test]
    fn test_linterpolate() {
        let line = linterpolate(Point::new(0.0, 0.0), Point::new(1.0, 2.0), 5);
        assert_eq!(line.0.len(), 5);
        assert_relative_eq!(line.0[2].x, 0.5);
        assert_relative_eq!(line.0[2].y, 1.0);
    }

    #[test]
    fn test_make_box_extent() {
        let centre = Point::new(133.0, -25.0);
        let distance = 25.0;
        let shape = make_box(centre, distance, 2, None, None).unwrap();
        let rect = shape.bounding_rect().unwrap();

        // North-south extent should match the angular distance exactly
        let expected_height = (distance * 1000.0 / EARTH_RADIUS_M).to_degrees();
        assert_relative_eq!(rect.height(), expected_height, epsilon = 1e-9);

        // East-west extent widens with latitude
        assert!(rect.width() > expected_height);
        assert!(rect.width() < expected_height / (-25f64).to_radians().cos() * 1.01);

        // The box is a slight trapezoid, so the centroid is only close
        let centroid = shape.centroid().unwrap();
        assert_relative_eq!(centroid.x(), centre.x(), epsilon = 1e-9);
        assert_relative_eq!(centroid.y(), centre.y(), epsilon = 1e-4);
    }

    #[test]
    fn test_make_box_rejects_degenerate_sides() {
        let centre = Point::new(133.0, -25.0);
        assert!(make_box(centre, 25.0, 1, None, None).is_err());
    }

    #[test]
    fn test_make_stamp_keeps_centre() {
        let centre = Point::new(116.35, -42.01);
        for angle in [0.0, 34.0, 215.0] {
            let stamp = make_stamp(centre, Some(angle), 10.0).unwrap();
            let centroid = stamp.centroid().unwrap();
            assert_relative_eq!(centroid.x(), centre.x(), epsilon = 1e-4);
            assert_relative_eq!(centroid.y(), centre.y(), epsilon = 1e-4);
        }
    }

    #[test]
    fn test_make_stamp_random_angle() {
        let centre = Point::new(116.35, -42.01);
        // No angle supplied still produces a closed ring around the centre
        let stamp = make_stamp(centre, None, 10.0).unwrap();
        assert_eq!(stamp.exterior().0.first(), stamp.exterior().0.last());
    }
}
