//! Convolution Equivalence Harness
//!
//! Sweeps filter sizes over a seeded random signal, times every correlation
//! strategy and writes agreement with the direct kernel to a CSV report.

use chrono::Utc;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

mod error;
mod report;
mod settings;
mod sweep;
mod timing;

pub use error::{BenchError, Result};
pub use report::{header, report_file_name, write_report};
pub use settings::{BenchConfig, Dimensionality, ENV_PREFIX};
pub use sweep::{columns, run_sweep, Column, Measurement, SweepRow};
pub use timing::{time_repeated, Timed, TrimmedTimings};

/// Initialize logging
pub fn init_logging() -> std::result::Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
}

/// Run the sweep and write its report; returns the report path
pub fn run(config: &BenchConfig) -> Result<PathBuf> {
    let rows = run_sweep(config)?;
    let path = write_report(&config.output_dir, &columns(config), &rows, Utc::now())?;
    info!(path = %path.display(), rows = rows.len(), "report written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let config = BenchConfig {
            input_size: 16,
            max_filter_size: 16,
            filter_step: 5,
            exec_number: 1,
            repetitions: 3,
            output_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let path = run(&config).unwrap();
        let contents = std::fs::read_to_string(path).unwrap();
        // Header plus filter sizes 1, 6, 11, 16
        assert_eq!(contents.lines().count(), 5);
        assert!(contents.starts_with("filter_size, naive time (sec)"));
    }
}
