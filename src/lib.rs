//! Data-access utilities for exploration geoscience: fetch aligned raster
//! coverages from public WCS endpoints for a rotated "stamp" around a point
//! of interest, and clean point-deposit labels for supervised learning.

pub mod collect;
pub mod deposits;
pub mod fetch;
pub mod geo_core;
pub mod geometry;
pub mod raster;
pub mod reprojection;
pub mod rotation;
pub mod stamp;
pub mod utilities;
pub mod vector;

pub use collect::wcs::CoverageService;
pub use geo_core::BoundingBox;
pub use stamp::Stamp;
