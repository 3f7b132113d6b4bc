//! Fetch aligned WCS coverages for one stamp, or for a batch of stamps.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use explore_australia::fetch::{self, PARALLEL_WORKERS};
use explore_australia::stamp::Stamp;

/// Get geophysics and remote-sensing coverages for a stamp.
///
/// Because the stamp is a square on the surface of the earth, it might not
/// be an exact square; distances are approximate, depending on latitude.
#[derive(Debug, Parser)]
#[command(name = "get_coverages")]
struct Args {
    /// Output folder for a single stamp, or the root folder in batch mode
    name: PathBuf,

    /// Central latitude of the coverage, in degrees
    #[arg(long)]
    lat: Option<f64>,

    /// Central longitude of the coverage, in degrees
    #[arg(long)]
    lon: Option<f64>,

    /// Approximate length of the sides of the coverage, in km
    #[arg(long, default_value_t = 25.0)]
    distance: f64,

    /// Angle to rotate the box through, in degrees from north
    #[arg(long)]
    angle: Option<f64>,

    /// Remove the coordinate reference system from the output rasters
    #[arg(long = "no-crs")]
    no_crs: bool,

    /// CSV of id,local_projection rows; switches to batch mode
    #[arg(long)]
    stamps: Option<PathBuf>,

    /// Worker threads for batch mode
    #[arg(long, default_value_t = PARALLEL_WORKERS)]
    workers: usize,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if let Some(stamps) = &args.stamps {
        let jobs = fetch::load_stamp_jobs(stamps)?;
        let outcomes = fetch::get_coverages_parallel(&jobs, &args.name, args.workers)?;

        let mut complete = 0usize;
        for outcome in &outcomes {
            match &outcome.report {
                Ok(report) if report.is_complete() => complete += 1,
                Ok(report) => {
                    for failure in &report.failed {
                        eprintln!(
                            "Stamp {}: failed to get {} ({})",
                            outcome.id, failure.layer, failure.reason
                        );
                    }
                }
                Err(err) => eprintln!("Stamp {}: {:#}", outcome.id, err),
            }
        }
        println!("{}/{} stamps complete", complete, outcomes.len());
    } else {
        let lat = args.lat.context("--lat is required without --stamps")?;
        let lon = args.lon.context("--lon is required without --stamps")?;
        let stamp = Stamp::new(lon, lat, args.angle.unwrap_or(0.0), args.distance);

        let report = fetch::get_coverages(&args.name, &stamp, args.no_crs, true)?;
        for failure in &report.failed {
            eprintln!("Failed to get {} ({})", failure.url, failure.reason);
        }
        println!(
            "{} fetched, {} already present, {} failed",
            report.fetched,
            report.skipped,
            report.failed.len()
        );
    }
    Ok(())
}
