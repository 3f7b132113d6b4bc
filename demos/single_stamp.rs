use anyhow::Result;
use explore_australia::fetch::get_coverages;
use explore_australia::stamp::Stamp;

/// Example: fetch all registered coverages for one stamp near Kalgoorlie.
fn main() -> Result<()> {
    env_logger::init();

    // 25 km stamp rotated 34 degrees from north
    let stamp = Stamp::new(121.47, -30.75, 34.0, 25.0);
    println!("Local projection: {}", stamp.local_projection());

    let report = get_coverages("./output/kalgoorlie".as_ref(), &stamp, false, true)?;
    println!(
        "{} fetched, {} skipped, {} failed",
        report.fetched,
        report.skipped,
        report.failed.len()
    );
    for failure in &report.failed {
        println!("  failed: {} ({})", failure.layer, failure.reason);
    }
    Ok(())
}
