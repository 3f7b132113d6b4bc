//! Raster helpers: warp a downloaded coverage onto a stamp's local grid,
//! rotate a grid about its centre, read bands with their mask applied, and
//! strip CRS information from challenge outputs.

use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};
use gdal::{Dataset, DriverManager};

use crate::stamp::Stamp;

/// Warp a raster onto the local grid of a stamp.
///
/// The output is a Float32 GeoTIFF in the stamp's oblique Mercator CRS with
/// exactly `stamp.width` x `stamp.height` pixels. Resampling and projection
/// are delegated to `gdalwarp`.
pub fn warp_to_stamp(input: &Path, output: &Path, stamp: &Stamp) -> Result<()> {
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {:?}", parent))?;
    }

    let (min_x, min_y, max_x, max_y) = stamp.grid_extent();
    let status = Command::new("gdalwarp")
        .arg("-of")
        .arg("GTiff")
        .arg("-t_srs")
        .arg(stamp.local_projection())
        .arg("-te")
        .arg(min_x.to_string())
        .arg(min_y.to_string())
        .arg(max_x.to_string())
        .arg(max_y.to_string())
        .arg("-ts")
        .arg(stamp.width.to_string())
        .arg(stamp.height.to_string())
        .arg("-r")
        .arg("near")
        .arg("-ot")
        .arg("Float32")
        .arg("-overwrite")
        .arg("-q")
        .arg(input)
        .arg(output)
        .status()
        .context("Failed to execute gdalwarp. Make sure GDAL is installed and gdalwarp is in PATH")?;

    if !status.success() {
        anyhow::bail!(
            "gdalwarp failed warping {:?} onto the stamp grid ({})",
            input,
            status
        );
    }
    Ok(())
}

/// Rotate a raster about the centre of its grid, keeping the pixel count.
///
/// The grid is warped into a local oblique Mercator projection rotated
/// through `-angle`, so the data rotates while the output stays north-up in
/// the new frame. The input must carry a geographic CRS and geotransform.
pub fn rotate_raster(input: &Path, output: &Path, angle: f64) -> Result<()> {
    let (width, height, centre_lon, centre_lat) = {
        let dataset =
            Dataset::open(input).with_context(|| format!("Failed to open raster {:?}", input))?;
        let transform = dataset.geo_transform().context("Raster has no geotransform")?;
        let (width, height) = dataset.raster_size();
        (
            width,
            height,
            transform[0] + transform[1] * width as f64 / 2.0,
            transform[3] + transform[5] * height as f64 / 2.0,
        )
    };
    let crs = format!(
        "+proj=omerc +lat_0={} +lonc={} +alpha={} \
         +k=1 +x_0=0 +y_0=0 +gamma=0 \
         +ellps=WGS84 +towgs84=0,0,0,0,0,0,0 +units=m +no_defs",
        centre_lat, centre_lon, -angle
    );

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {:?}", parent))?;
    }
    let status = Command::new("gdalwarp")
        .arg("-of")
        .arg("GTiff")
        .arg("-t_srs")
        .arg(&crs)
        .arg("-ts")
        .arg(width.to_string())
        .arg(height.to_string())
        .arg("-r")
        .arg("near")
        .arg("-overwrite")
        .arg("-q")
        .arg(input)
        .arg(output)
        .status()
        .context("Failed to execute gdalwarp. Make sure GDAL is installed and gdalwarp is in PATH")?;

    if !status.success() {
        anyhow::bail!("gdalwarp failed rotating {:?} ({})", input, status);
    }
    Ok(())
}

/// A raster band held in memory, nodata pixels replaced with NaN.
#[derive(Debug, Clone)]
pub struct BandData {
    pub width: usize,
    pub height: usize,
    /// Row-major pixel values.
    pub values: Vec<f32>,
}

/// Read one band of a raster, applying its nodata mask.
///
/// Masked pixels come back as NaN, so the result can go straight into the
/// quantile helpers. Band indices start at 1.
pub fn read_band(path: &Path, band_index: usize) -> Result<BandData> {
    let dataset =
        Dataset::open(path).with_context(|| format!("Failed to open raster {:?}", path))?;
    let (width, height) = dataset.raster_size();
    let band = dataset
        .rasterband(band_index)
        .with_context(|| format!("Raster has no band {}", band_index))?;
    let nodata = band.no_data_value().map(|v| v as f32);
    let buffer = band
        .read_as::<f32>((0, 0), (width, height), (width, height), None)
        .context("Failed to read raster band")?;

    let mut values = buffer.into_shape_and_vec().1;
    if let Some(nodata) = nodata {
        for value in values.iter_mut() {
            if *value == nodata {
                *value = f32::NAN;
            }
        }
    }
    Ok(BandData {
        width,
        height,
        values,
    })
}

/// Rewrite a single-band GeoTIFF in place with its CRS removed.
///
/// The geotransform and nodata value are kept, so pixel geometry survives
/// while the georeferencing needed to locate the stamp does not.
pub fn strip_crs(path: &Path) -> Result<()> {
    let (width, height, transform, nodata, mut buffer) = {
        let dataset =
            Dataset::open(path).with_context(|| format!("Failed to open raster {:?}", path))?;
        let transform = dataset.geo_transform().context("Raster has no geotransform")?;
        let (width, height) = dataset.raster_size();
        let band = dataset.rasterband(1).context("Raster has no band 1")?;
        let nodata = band.no_data_value();
        let buffer = band
            .read_as::<f32>((0, 0), (width, height), (width, height), None)
            .context("Failed to read raster band")?;
        (width, height, transform, nodata, buffer)
    };

    let driver = DriverManager::get_driver_by_name("GTiff")
        .context("GTiff driver unavailable in this GDAL build")?;
    let tmp = path.with_extension("nocrs.tif");
    {
        let mut dataset = driver
            .create_with_band_type::<f32, _>(&tmp, width, height, 1)
            .with_context(|| format!("Failed to create {:?}", tmp))?;
        dataset
            .set_geo_transform(&transform)
            .context("Failed to set geotransform")?;
        let mut band = dataset.rasterband(1)?;
        if let Some(value) = nodata {
            band.set_no_data_value(Some(value))
                .context("Failed to set nodata value")?;
        }
        band.write((0, 0), (width, height), &mut buffer)
            .context("Failed to write raster band")?;
    }
    std::fs::rename(&tmp, path)
        .with_context(|| format!("Failed to replace {:?} with CRS-free copy", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdal::raster::Buffer;

    fn write_test_raster(path: &Path, values: Vec<f32>, nodata: Option<f64>) {
        let driver = DriverManager::get_driver_by_name("GTiff").unwrap();
        let mut dataset = driver
            .create_with_band_type::<f32, _>(path, 2, 2, 1)
            .unwrap();
        dataset
            .set_geo_transform(&[133.0, 0.01, 0.0, -25.0, 0.0, -0.01])
            .unwrap();
        let mut band = dataset.rasterband(1).unwrap();
        if let Some(value) = nodata {
            band.set_no_data_value(Some(value)).unwrap();
        }
        let mut buffer = Buffer::new((2, 2), values);
        band.write((0, 0), (2, 2), &mut buffer).unwrap();
    }

    #[test]
    fn test_read_band_masks_nodata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("band.tif");
        write_test_raster(&path, vec![1.0, 2.0, -999.0, 4.0], Some(-999.0));

        let band = read_band(&path, 1).unwrap();
        assert_eq!((band.width, band.height), (2, 2));
        assert_eq!(band.values[0], 1.0);
        assert!(band.values[2].is_nan());
        assert_eq!(band.values[3], 4.0);
    }

    #[test]
    fn test_read_band_without_nodata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.tif");
        write_test_raster(&path, vec![1.0, 2.0, 3.0, 4.0], None);

        let band = read_band(&path, 1).unwrap();
        assert!(band.values.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_strip_crs_keeps_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("strip.tif");
        write_test_raster(&path, vec![1.0, 2.0, 3.0, 4.0], Some(-999.0));

        strip_crs(&path).unwrap();
        let band = read_band(&path, 1).unwrap();
        assert_eq!(band.values, vec![1.0, 2.0, 3.0, 4.0]);
    }
}
