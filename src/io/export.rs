//! CSV export of a charging plan for external visualization.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::planner::ChargingPlan;

/// Builds the header row: fixed columns, then one SOC and one power column
/// per vehicle.
fn header(vehicles: usize) -> Vec<String> {
    let mut cols: Vec<String> = ["timestep", "time_hr", "price", "fleet_power"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    cols.extend((0..vehicles).map(|i| format!("soc_{i}")));
    cols.extend((0..vehicles).map(|i| format!("power_{i}")));
    cols
}

/// Exports a plan to a CSV file at the given path.
///
/// Writes one row per step `0..=T`. The final row carries the terminal
/// state; its power columns are empty because no control is applied at `T`.
///
/// # Arguments
///
/// * `plan` - Solved charging plan
/// * `dt_hours` - Step duration in hours, for the `time_hr` column
/// * `path` - Output file path
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(plan: &ChargingPlan, dt_hours: f64, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(plan, dt_hours, buf)
}

/// Writes a plan as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(plan: &ChargingPlan, dt_hours: f64, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    let n = plan.vehicles();
    let steps = plan.steps();

    wtr.write_record(header(n))?;

    for t in 0..=steps {
        let mut row = Vec::with_capacity(4 + 2 * n);
        row.push(t.to_string());
        row.push(format!("{:.2}", t as f64 * dt_hours));
        row.push(format!("{:.4}", plan.prices.at(t)));
        if t < steps {
            row.push(format!("{:.6}", plan.fleet_power(t)));
        } else {
            row.push(String::new());
        }
        row.extend((0..n).map(|i| format!("{:.6}", plan.soc.get(i, t))));
        if t < steps {
            row.extend((0..n).map(|i| format!("{:.6}", plan.power.get(i, t))));
        } else {
            row.extend((0..n).map(|_| String::new()));
        }
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}
