//! Rotation of geographic geometries on the spherical surface.
//!
//! Coordinates move through three frames: geographic (longitude/latitude in
//! degrees), spherical (inclination/azimuth in radians, physics/ISO
//! convention) and cartesian unit vectors. Rotations are applied in the
//! cartesian frame with a Rodrigues rotation matrix.

use geo::{Coord, MapCoords, Point};

/// Rodrigues rotation matrix about `axis` with a counterclockwise
/// (right-hand) `angle` in radians. The axis does not need to be normalised.
pub fn rotation_matrix(axis: [f64; 3], angle: f64) -> [[f64; 3]; 3] {
    let norm = (axis[0] * axis[0] + axis[1] * axis[1] + axis[2] * axis[2]).sqrt();
    let (ux, uy, uz) = (axis[0] / norm, axis[1] / norm, axis[2] / norm);
    let (sin, cos) = angle.sin_cos();
    let omc = 1.0 - cos;
    [
        [
            cos + ux * ux * omc,
            ux * uy * omc - uz * sin,
            ux * uz * omc + uy * sin,
        ],
        [
            uy * ux * omc + uz * sin,
            cos + uy * uy * omc,
            uy * uz * omc - ux * sin,
        ],
        [
            uz * ux * omc - uy * sin,
            uz * uy * omc + ux * sin,
            cos + uz * uz * omc,
        ],
    ]
}

fn mat_vec(m: &[[f64; 3]; 3], v: [f64; 3]) -> [f64; 3] {
    [
        m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
        m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
        m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
    ]
}

/// Convert geographic (longitude, latitude) in degrees to spherical
/// (inclination, azimuth) in radians. Inclination runs 0..pi from the north
/// pole, azimuth lies in [0, 2*pi).
pub fn geographic_to_spherical(lon: f64, lat: f64) -> (f64, f64) {
    ((90.0 - lat).to_radians(), (lon + 180.0).to_radians())
}

/// Convert spherical (inclination, azimuth) in radians back to geographic
/// (longitude, latitude) in degrees.
pub fn spherical_to_geographic(inclination: f64, azimuth: f64) -> (f64, f64) {
    (azimuth.to_degrees() - 180.0, 90.0 - inclination.to_degrees())
}

/// Convert spherical (inclination, azimuth) to a cartesian unit vector.
pub fn spherical_to_cartesian(inclination: f64, azimuth: f64) -> [f64; 3] {
    [
        inclination.sin() * azimuth.cos(),
        inclination.sin() * azimuth.sin(),
        inclination.cos(),
    ]
}

/// Convert a cartesian vector to spherical (inclination, azimuth), assuming
/// it lies on (or near) the unit sphere.
pub fn cartesian_to_spherical(v: [f64; 3]) -> (f64, f64) {
    let radius = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    let inclination = (v[2] / radius).acos();
    let mut azimuth = v[1].atan2(v[0]);
    if azimuth < 0.0 {
        azimuth += 2.0 * std::f64::consts::PI;
    }
    (inclination, azimuth)
}

/// Geographic (degrees) to cartesian unit vector.
pub fn geographic_to_cartesian(lon: f64, lat: f64) -> [f64; 3] {
    let (inclination, azimuth) = geographic_to_spherical(lon, lat);
    spherical_to_cartesian(inclination, azimuth)
}

/// Cartesian unit vector to geographic (degrees).
pub fn cartesian_to_geographic(v: [f64; 3]) -> (f64, f64) {
    let (inclination, azimuth) = cartesian_to_spherical(v);
    spherical_to_geographic(inclination, azimuth)
}

/// Rotate a geometry through `angle` degrees about an axis through `pole`
/// (given in WGS84 longitude/latitude) and the centre of the earth.
///
/// Works for any `geo` geometry type that supports coordinate mapping.
pub fn rotate<G>(geom: &G, pole: Point<f64>, angle: f64) -> G
where
    G: MapCoords<f64, f64, Output = G>,
{
    let axis = geographic_to_cartesian(pole.x(), pole.y());
    let matrix = rotation_matrix(axis, angle.to_radians());
    geom.map_coords(|c: Coord<f64>| {
        let v = geographic_to_cartesian(c.x, c.y);
        let (lon, lat) = cartesian_to_geographic(mat_vec(&matrix, v));
        Coord { x: lon, y: lat }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::{Centroid, LineString, Polygon};

    #[test]
    fn test_conversion_round_trip() {
        let points = [
            (-139.0, 0.0),
            (130.0, -34.0),
            (131.0, -35.0),
            (132.0, -39.0),
            (0.0, 45.0),
        ];
        for (lon, lat) in points {
            let v = geographic_to_cartesian(lon, lat);
            let norm = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
            assert_relative_eq!(norm, 1.0, epsilon = 1e-12);
            let (lon2, lat2) = cartesian_to_geographic(v);
            assert_relative_eq!(lon2, lon, epsilon = 1e-9);
            assert_relative_eq!(lat2, lat, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_rotation_matrix_is_special_orthogonal() {
        let m = rotation_matrix(geographic_to_cartesian(116.35, -42.01), 34f64.to_radians());

        // M * M^T should be the identity
        for i in 0..3 {
            for j in 0..3 {
                let dot: f64 = (0..3).map(|k| m[i][k] * m[j][k]).sum();
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(dot, expected, epsilon = 1e-12);
            }
        }

        let det = m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0]);
        assert_relative_eq!(det, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rotation_about_pole_fixes_pole() {
        let pole = Point::new(116.35, -42.01);
        for angle in [10.0, 34.0, 120.0, 275.0] {
            let rotated = rotate(&pole, pole, angle);
            assert_relative_eq!(rotated.x(), pole.x(), epsilon = 1e-9);
            assert_relative_eq!(rotated.y(), pole.y(), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_rotate_polygon_about_centroid_keeps_centroid() {
        let square = Polygon::new(
            LineString::from(vec![
                (116.30, -42.06),
                (116.40, -42.06),
                (116.40, -41.96),
                (116.30, -41.96),
                (116.30, -42.06),
            ]),
            vec![],
        );
        let centre = square.centroid().unwrap();
        let rotated = rotate(&square, centre, 34.0);
        let rotated_centre = rotated.centroid().unwrap();
        assert_relative_eq!(rotated_centre.x(), centre.x(), epsilon = 1e-4);
        assert_relative_eq!(rotated_centre.y(), centre.y(), epsilon = 1e-4);
    }
}
