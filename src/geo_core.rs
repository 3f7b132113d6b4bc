use anyhow::{Context, Result};
use geo::Point;
use proj::Proj;

/// Axis-aligned bounding box in a single CRS, stored as
/// (min_x, min_y, max_x, max_y).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        BoundingBox {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Intersection with another box, or `None` when they do not overlap.
    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        let min_x = self.min_x.max(other.min_x);
        let min_y = self.min_y.max(other.min_y);
        let max_x = self.max_x.min(other.max_x);
        let max_y = self.max_y.min(other.max_y);
        if min_x < max_x && min_y < max_y {
            Some(BoundingBox::new(min_x, min_y, max_x, max_y))
        } else {
            None
        }
    }

    /// Transform the corner coordinates to another CRS.
    ///
    /// Only the corners are transformed, so this is exact for axis-preserving
    /// transforms and an approximation otherwise.
    pub fn transform(&self, from_crs: &str, to_crs: &str) -> Result<Self> {
        let (min_x, min_y) = transform_coords(from_crs, to_crs, self.min_x, self.min_y)?;
        let (max_x, max_y) = transform_coords(from_crs, to_crs, self.max_x, self.max_y)?;
        Ok(BoundingBox::new(min_x, min_y, max_x, max_y))
    }
}

impl From<geo::Rect<f64>> for BoundingBox {
    fn from(rect: geo::Rect<f64>) -> Self {
        BoundingBox::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y)
    }
}

/// Transform a single coordinate pair between two CRS definitions.
///
/// CRS definitions can be EPSG codes (`"EPSG:4326"`) or PROJ strings.
pub fn transform_coords(from_crs: &str, to_crs: &str, x: f64, y: f64) -> Result<(f64, f64)> {
    let proj = Proj::new_known_crs(from_crs, to_crs, None)
        .context("Failed to create Proj transformation")?;
    let result = proj
        .convert((x, y))
        .context("Failed to transform coordinates")?;
    Ok(result)
}

/// Transform a `Point` between two CRS definitions.
pub fn transform_point(from_crs: &str, to_crs: &str, point: Point<f64>) -> Result<Point<f64>> {
    let (x, y) = transform_coords(from_crs, to_crs, point.x(), point.y())?;
    Ok(Point::new(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box() {
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 2.0);
        assert_eq!(bbox.width(), 1.0);
        assert_eq!(bbox.height(), 2.0);
        assert!(bbox.contains(0.5, 1.0));
        assert!(!bbox.contains(1.5, 1.0));
    }

    #[test]
    fn test_intersection() {
        let a = BoundingBox::new(0.0, 0.0, 2.0, 2.0);
        let b = BoundingBox::new(1.0, 1.0, 3.0, 3.0);
        let i = a.intersection(&b).unwrap();
        assert_eq!(i, BoundingBox::new(1.0, 1.0, 2.0, 2.0));

        let c = BoundingBox::new(5.0, 5.0, 6.0, 6.0);
        assert!(a.intersection(&c).is_none());
    }

    #[test]
    fn test_transform_coords() {
        // May be skipped when the PROJ database is unavailable
        let result = transform_coords("EPSG:4326", "EPSG:3112", 133.0, -25.0);
        if let Ok((x, y)) = result {
            assert!(x.is_finite());
            assert!(y.is_finite());
        }
    }

    #[test]
    fn test_transform_point_matches_transform_coords() {
        // May be skipped when the PROJ database is unavailable
        if let Ok((x, y)) = transform_coords("EPSG:4326", "EPSG:3112", 133.0, -25.0) {
            let point = transform_point("EPSG:4326", "EPSG:3112", Point::new(133.0, -25.0)).unwrap();
            assert_eq!(point.x(), x);
            assert_eq!(point.y(), y);
        }
    }

    #[test]
    fn test_bounding_box_transform() {
        let bbox = BoundingBox::new(132.0, -26.0, 134.0, -24.0);
        // May be skipped when the PROJ database is unavailable
        if let Ok(projected) = bbox.transform("EPSG:4326", "EPSG:3112") {
            // Lambert coordinates are in metres, so the box is much wider
            assert!(projected.width() > 100_000.0);
            assert!(projected.height() > 100_000.0);
        }
    }
}
