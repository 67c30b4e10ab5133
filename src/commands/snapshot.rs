use crate::data::{load_price_series, write_snapshot};
use anyhow::Result;
use log::info;
use std::path::Path;

/// Converts a CSV or JSON price file into the binary snapshot format
/// for fast repeated loads.
pub fn run(input: &Path, output: &Path) -> Result<()> {
    let prices = load_price_series(input)?;
    write_snapshot(output, &prices)?;
    info!(
        "Snapshot of {} trading days written to {}",
        prices.len(),
        output.display()
    );
    Ok(())
}
