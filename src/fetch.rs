//! Fetch-and-regrid loops: one layer for one stamp, every registered
//! coverage for one stamp, and batches of stamps in parallel.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Deserialize;

use crate::collect::endpoints::{self, Endpoint};
use crate::collect::wcs::CoverageService;
use crate::raster::{strip_crs, warp_to_stamp};
use crate::stamp::Stamp;

/// Worker-pool width for the batch runner.
pub const PARALLEL_WORKERS: usize = 10;

fn progress_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>4}/{len:4} {msg}")
        .unwrap()
        .progress_chars("##-")
}

/// A single failed layer within a stamp fetch.
#[derive(Debug, Clone)]
pub struct FetchFailure {
    pub layer: String,
    pub url: String,
    pub reason: String,
}

/// Per-stamp outcome of [`get_coverages`].
#[derive(Debug, Clone, Default)]
pub struct FetchReport {
    pub fetched: usize,
    pub skipped: usize,
    pub failed: Vec<FetchFailure>,
}

impl FetchReport {
    /// True when every registered layer is present on disk.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn attempted(&self) -> usize {
        self.fetched + self.skipped + self.failed.len()
    }
}

/// Get the raster for one WCS layer in a stamp area, warped onto the
/// stamp's local grid.
///
/// The coverage is downloaded for the stamp's WGS84 bounding box (snapped to
/// the layer's advertised bounds), warped into the stamp CRS, and written to
/// `output` as a Float32 GeoTIFF. With `remove_crs` the output keeps its
/// pixel geometry but loses the georeferencing. The intermediate download is
/// deleted whether or not the fetch succeeds.
pub fn get_stamp(wcs_url: &str, stamp: &Stamp, output: &Path, remove_crs: bool) -> Result<()> {
    let service = CoverageService::new(wcs_url)?;
    let bounds = service.snap_bounds(stamp.bounds()?, None)?;

    let temp = tempfile::Builder::new()
        .prefix("coverage-")
        .suffix(".tif")
        .tempfile()
        .context("Failed to create temporary download file")?;
    service.get_coverage(bounds, None, Some((stamp.width, stamp.height)), temp.path())?;

    warp_to_stamp(temp.path(), output, stamp)?;
    if remove_crs {
        strip_crs(output)?;
    }
    Ok(())
}

/// Fetch every registered coverage for one stamp into a per-theme folder
/// tree under `root`.
///
/// Layers whose output file already exists are skipped, so an interrupted
/// run can be resumed. Individual layer failures are collected in the
/// returned report rather than aborting the run.
pub fn get_coverages(
    root: &Path,
    stamp: &Stamp,
    remove_crs: bool,
    show_progress: bool,
) -> Result<FetchReport> {
    let progress = if show_progress {
        let bar = ProgressBar::new(endpoints::total_coverages() as u64);
        bar.set_style(progress_style());
        bar.set_message("Downloading coverages");
        Some(bar)
    } else {
        None
    };

    let mut report = FetchReport::default();
    for group in endpoints::THEMES {
        let folder = root.join(group.subdir);
        std::fs::create_dir_all(&folder)
            .with_context(|| format!("Failed to create theme folder {:?}", folder))?;

        for endpoint in group.endpoints {
            fetch_one(&folder, endpoint, stamp, remove_crs, &mut report);
            if let Some(bar) = &progress {
                bar.inc(1);
            }
        }
    }
    if let Some(bar) = &progress {
        bar.finish_with_message("Done");
    }
    Ok(report)
}

fn fetch_one(
    folder: &Path,
    endpoint: &Endpoint,
    stamp: &Stamp,
    remove_crs: bool,
    report: &mut FetchReport,
) {
    let output = folder.join(format!("{}.tif", endpoint.layer));
    if output.exists() {
        report.skipped += 1;
        return;
    }
    match get_stamp(endpoint.url, stamp, &output, remove_crs) {
        Ok(()) => report.fetched += 1,
        Err(err) => {
            log::warn!(
                "Failed to get {} for ({}, {}): {:#}",
                endpoint.layer,
                stamp.lon,
                stamp.lat,
                err
            );
            report.failed.push(FetchFailure {
                layer: endpoint.layer.to_string(),
                url: endpoint.url.to_string(),
                reason: format!("{:#}", err),
            });
        }
    }
}

/// One row of a batch run: a stamp id and its stored local projection.
#[derive(Debug, Clone, Deserialize)]
pub struct StampJob {
    pub id: String,
    pub local_projection: String,
}

/// Load batch jobs from a CSV with `id` and `local_projection` columns.
pub fn load_stamp_jobs(path: &Path) -> Result<Vec<StampJob>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open stamp jobs CSV {:?}", path))?;
    let mut jobs = Vec::new();
    for result in reader.deserialize() {
        let job: StampJob = result.context("Failed to deserialize stamp job record")?;
        jobs.push(job);
    }
    Ok(jobs)
}

/// Outcome of one stamp within a batch run.
#[derive(Debug)]
pub struct StampOutcome {
    pub id: String,
    pub report: Result<FetchReport>,
}

/// Fetch coverages for many stamps concurrently.
///
/// Each job's outputs land under `root/<id>/...`. Work runs on a dedicated
/// pool of `workers` threads; per-stamp failures are logged and reported,
/// never fatal to the batch.
pub fn get_coverages_parallel(
    jobs: &[StampJob],
    root: &Path,
    workers: usize,
) -> Result<Vec<StampOutcome>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .build()
        .context("Failed to build worker pool")?;

    let progress = Arc::new(Mutex::new({
        let bar = ProgressBar::new(jobs.len() as u64);
        bar.set_style(progress_style());
        bar.set_message("Stamps");
        bar
    }));

    let outcomes: Vec<StampOutcome> = pool.install(|| {
        jobs.par_iter()
            .map(|job| {
                let report = run_job(job, root);
                if let Err(err) = &report {
                    log::error!("Stamp {} generated an error: {:#}", job.id, err);
                }
                progress.lock().unwrap().inc(1);
                StampOutcome {
                    id: job.id.clone(),
                    report,
                }
            })
            .collect()
    });

    progress.lock().unwrap().finish_with_message("All stamps processed");
    Ok(outcomes)
}

fn run_job(job: &StampJob, root: &Path) -> Result<FetchReport> {
    let stamp = Stamp::from_local_projection(&job.local_projection)
        .with_context(|| format!("Bad local projection for stamp {}", job.id))?;
    get_coverages(&stamp_root(root, &job.id), &stamp, false, false)
}

fn stamp_root(root: &Path, id: &str) -> PathBuf {
    root.join(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_report_bookkeeping() {
        let mut report = FetchReport::default();
        report.fetched = 3;
        report.skipped = 2;
        assert!(report.is_complete());
        assert_eq!(report.attempted(), 5);

        report.failed.push(FetchFailure {
            layer: "tmi".to_string(),
            url: "http://example.com/wcs".to_string(),
            reason: "boom".to_string(),
        });
        assert!(!report.is_complete());
        assert_eq!(report.attempted(), 6);
    }

    #[test]
    fn test_load_stamp_jobs() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "id,local_projection").unwrap();
        writeln!(
            file,
            "S0001,\"+proj=omerc +lat_0=-24.8 +lonc=133.2 +alpha=30 +k=1 +x_0=0 +y_0=0 +gamma=0 +ellps=WGS84 +towgs84=0,0,0,0,0,0,0 +units=m +no_defs\""
        )
        .unwrap();
        file.flush().unwrap();

        let jobs = load_stamp_jobs(file.path()).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].id, "S0001");

        let stamp = Stamp::from_local_projection(&jobs[0].local_projection).unwrap();
        assert_eq!(stamp.angle, 30.0);
        assert_eq!(stamp.lon, 133.2);
    }

    #[test]
    fn test_stamp_root_layout() {
        let root = Path::new("/data/stamps");
        assert_eq!(stamp_root(root, "S0001"), Path::new("/data/stamps/S0001"));
    }
}
