pub mod endpoints;
pub mod wcs;
