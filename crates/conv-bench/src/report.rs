//! CSV timing report

use crate::error::Result;
use crate::sweep::{Column, SweepRow};
use chrono::{DateTime, Utc};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// `conv_timing<YYYY-mm-dd-HH-MM-SS>.csv`
pub fn report_file_name(at: DateTime<Utc>) -> String {
    format!("conv_timing{}.csv", at.format("%Y-%m-%d-%H-%M-%S"))
}

/// Header line: times, then absolute errors, then relative errors
pub fn header(columns: &[Column]) -> String {
    let mut fields = vec!["filter_size".to_string()];
    fields.extend(columns.iter().map(|c| format!("{} time (sec)", c)));
    fields.extend(columns.iter().map(|c| format!("err {}", c)));
    fields.extend(columns.iter().map(|c| format!("rel err {}", c)));
    fields.join(", ")
}

fn row_line(row: &SweepRow) -> String {
    let mut fields = vec![row.filter_size.to_string()];
    fields.extend(row.measurements.iter().map(|m| m.seconds.to_string()));
    fields.extend(row.measurements.iter().map(|m| m.abs_error.to_string()));
    fields.extend(row.measurements.iter().map(|m| m.rel_error.to_string()));
    fields.join(",")
}

/// Write the report for `rows` into `dir`, creating it if needed
pub fn write_report(
    dir: &Path,
    columns: &[Column],
    rows: &[SweepRow],
    at: DateTime<Utc>,
) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(report_file_name(at));
    let mut out = BufWriter::new(fs::File::create(&path)?);

    writeln!(out, "{}", header(columns))?;
    for row in rows {
        writeln!(out, "{}", row_line(row))?;
    }
    out.flush()?;
    Ok(path)
}
