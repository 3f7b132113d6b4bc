//! Stamp geometry: a rotated square region around a point of interest, with
//! a local oblique Mercator projection and a raster grid derived from it.

use anyhow::{Context, Result};
use geo::{BoundingRect, Point, Polygon};

use crate::geo_core::BoundingBox;
use crate::geometry::make_stamp;

/// Default raster grid size for a stamp, in pixels per side.
pub const DEFAULT_PIXELS: usize = 500;

/// Default stamp side length in kilometres.
pub const DEFAULT_DISTANCE_KM: f64 = 25.0;

/// A rotated square region ("stamp") on the earth's surface.
///
/// A stamp is defined by its centre (WGS84 longitude/latitude), a rotation
/// angle in degrees from north, a side length in kilometres, and a raster
/// grid size in pixels. It derives a local oblique Mercator CRS centred on
/// the stamp, so every coverage warped into it shares the same grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Stamp {
    pub lon: f64,
    pub lat: f64,
    pub angle: f64,
    /// Side length in kilometres.
    pub distance: f64,
    /// Grid width in pixels.
    pub width: usize,
    /// Grid height in pixels.
    pub height: usize,
}

impl Stamp {
    /// Create a stamp with the default 500x500 pixel grid.
    pub fn new(lon: f64, lat: f64, angle: f64, distance: f64) -> Self {
        Stamp {
            lon,
            lat,
            angle,
            distance,
            width: DEFAULT_PIXELS,
            height: DEFAULT_PIXELS,
        }
    }

    /// Override the raster grid size.
    pub fn with_pixels(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn centre(&self) -> Point<f64> {
        Point::new(self.lon, self.lat)
    }

    /// The local oblique Mercator CRS for this stamp, as a PROJ string.
    pub fn local_projection(&self) -> String {
        format!(
            "+proj=omerc +lat_0={} +lonc={} +alpha={} \
             +k=1 +x_0=0 +y_0=0 +gamma=0 \
             +ellps=WGS84 +towgs84=0,0,0,0,0,0,0 +units=m +no_defs",
            self.lat, self.lon, self.angle
        )
    }

    /// The stamp footprint polygon in WGS84.
    pub fn footprint(&self) -> Result<Polygon<f64>> {
        make_stamp(self.centre(), Some(self.angle), self.distance)
    }

    /// WGS84 bounding box of the footprint. This is what gets requested from
    /// a coverage service before warping into the local grid.
    pub fn bounds(&self) -> Result<BoundingBox> {
        let rect = self
            .footprint()?
            .bounding_rect()
            .context("Stamp footprint has no bounding rectangle")?;
        Ok(rect.into())
    }

    /// Pixel size (x, y) of the local grid in metres.
    pub fn pixel_size(&self) -> (f64, f64) {
        let metres = self.distance * 1000.0;
        (
            metres / (self.width - 1) as f64,
            metres / (self.height - 1) as f64,
        )
    }

    /// Top-left corner of the local grid in metres, centred on the stamp.
    pub fn grid_origin(&self) -> (f64, f64) {
        let half = self.distance * 1000.0 / 2.0;
        (-half, half)
    }

    /// GDAL-ordered geotransform for the local grid:
    /// `[x0, xres, 0, y0, 0, -yres]`.
    pub fn geo_transform(&self) -> [f64; 6] {
        let (x0, y0) = self.grid_origin();
        let (xres, yres) = self.pixel_size();
        [x0, xres, 0.0, y0, 0.0, -yres]
    }

    /// Extent of the local grid as (min_x, min_y, max_x, max_y) in metres.
    pub fn grid_extent(&self) -> (f64, f64, f64, f64) {
        let (x0, y0) = self.grid_origin();
        let (xres, yres) = self.pixel_size();
        (
            x0,
            y0 - yres * self.height as f64,
            x0 + xres * self.width as f64,
            y0,
        )
    }

    /// Reconstruct a stamp from a stored local-projection string.
    ///
    /// Side length and grid size are not recoverable from the projection and
    /// fall back to the defaults.
    pub fn from_local_projection(projection: &str) -> Result<Stamp> {
        let mut lat = None;
        let mut lon = None;
        let mut angle = None;
        for token in projection.split('+') {
            let mut parts = token.trim().splitn(2, '=');
            match (parts.next(), parts.next()) {
                (Some("lat_0"), Some(value)) => lat = Some(value.parse::<f64>()?),
                (Some("lonc"), Some(value)) => lon = Some(value.parse::<f64>()?),
                (Some("alpha"), Some(value)) => angle = Some(value.parse::<f64>()?),
                _ => {}
            }
        }
        Ok(Stamp::new(
            lon.context("projection string has no +lonc")?,
            lat.context("projection string has no +lat_0")?,
            angle.context("projection string has no +alpha")?,
            DEFAULT_DISTANCE_KM,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn stamp() -> Stamp {
        Stamp::new(133.2, -24.8, 30.0, 25.0)
    }

    #[test]
    fn test_local_projection_fields() {
        let crs = stamp().local_projection();
        assert!(crs.contains("+proj=omerc"));
        assert!(crs.contains("+lat_0=-24.8"));
        assert!(crs.contains("+lonc=133.2"));
        assert!(crs.contains("+alpha=30"));
        assert!(crs.contains("+units=m"));
    }

    #[test]
    fn test_grid_geometry() {
        let s = stamp();
        let (xres, yres) = s.pixel_size();
        assert_relative_eq!(xres, 25_000.0 / 499.0);
        assert_relative_eq!(yres, 25_000.0 / 499.0);

        let gt = s.geo_transform();
        assert_relative_eq!(gt[0], -12_500.0);
        assert_relative_eq!(gt[3], 12_500.0);
        assert_relative_eq!(gt[5], -yres);

        let (min_x, min_y, max_x, max_y) = s.grid_extent();
        assert_relative_eq!(max_x - min_x, xres * 500.0);
        assert_relative_eq!(max_y - min_y, yres * 500.0);
        assert_relative_eq!(min_x, -12_500.0);
        assert_relative_eq!(max_y, 12_500.0);
    }

    #[test]
    fn test_projection_round_trip() {
        let s = stamp();
        let parsed = Stamp::from_local_projection(&s.local_projection()).unwrap();
        assert_relative_eq!(parsed.lon, s.lon);
        assert_relative_eq!(parsed.lat, s.lat);
        assert_relative_eq!(parsed.angle, s.angle);
        assert_relative_eq!(parsed.distance, DEFAULT_DISTANCE_KM);
        assert_eq!(parsed.width, DEFAULT_PIXELS);
    }

    #[test]
    fn test_from_local_projection_rejects_garbage() {
        assert!(Stamp::from_local_projection("+proj=longlat +datum=WGS84").is_err());
    }

    #[test]
    fn test_bounds_contain_centre() {
        let s = stamp();
        let bounds = s.bounds().unwrap();
        assert!(bounds.contains(s.lon, s.lat));
        // A 25 km stamp spans roughly a quarter of a degree
        assert!(bounds.height() > 0.2 && bounds.height() < 0.4);
    }
}
