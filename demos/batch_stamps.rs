use anyhow::Result;
use explore_australia::fetch::{get_coverages_parallel, load_stamp_jobs, PARALLEL_WORKERS};

/// Example: run a batch of stamps from a CSV of id,local_projection rows.
fn main() -> Result<()> {
    env_logger::init();

    let jobs = load_stamp_jobs("./stamps.csv".as_ref())?;
    println!("Loaded {} stamp jobs", jobs.len());

    let outcomes = get_coverages_parallel(&jobs, "./output/stamps".as_ref(), PARALLEL_WORKERS)?;
    let complete = outcomes
        .iter()
        .filter(|o| o.report.as_ref().map(|r| r.is_complete()).unwrap_or(false))
        .count();
    println!("{}/{} stamps complete", complete, outcomes.len());
    Ok(())
}
