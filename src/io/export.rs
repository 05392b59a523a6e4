//! CSV export for simulation epoch results.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::sim::types::EpochResult;

/// Schema v1 column header for CSV telemetry export.
const HEADER: &str = "epoch,time_hr,requested_kw,real_power_kw,reactive_power_kvar,\
                      state_of_charge,kwh_stored,customer_id,node,warning";

/// Exports epoch results to a CSV file at the given path.
///
/// Writes a header row followed by one data row per epoch using the schema
/// v1 column layout. Produces deterministic output for identical inputs.
///
/// # Arguments
///
/// * `results` - Complete simulation epoch results
/// * `path` - Output file path
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(results: &[EpochResult], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(results, buf)
}

/// Writes epoch results as CSV to any writer.
///
/// # Arguments
///
/// * `results` - Complete simulation epoch results
/// * `writer` - Destination implementing `Write`
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(results: &[EpochResult], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    // Header
    wtr.write_record(HEADER.split(',').map(str::trim))?;

    // Data rows; absent identity fields are written as empty cells.
    for r in results {
        wtr.write_record(&[
            r.epoch.to_string(),
            format!("{:.4}", r.time_hr),
            format!("{:.4}", r.requested_kw),
            format!("{:.4}", r.real_power_kw),
            format!("{:.4}", r.reactive_power_kvar),
            format!("{:.4}", r.state_of_charge),
            format!("{:.4}", r.kwh_stored),
            r.customer_id.clone().unwrap_or_default(),
            r.node.map(|n| n.to_string()).unwrap_or_default(),
            r.warning.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
