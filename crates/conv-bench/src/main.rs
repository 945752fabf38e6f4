//! Convolution bench - Main Entry Point
//!
//! Usage: `conv-bench [config-file]`; `CONV_BENCH_*` variables override both.

use anyhow::Context;
use conv_bench::{init_logging, run, BenchConfig};
use std::path::PathBuf;
use tracing::info;

fn main() -> anyhow::Result<()> {
    init_logging()?;

    info!("=== Convolution bench v{} ===", env!("CARGO_PKG_VERSION"));

    let path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = BenchConfig::load(path.as_deref()).context("loading bench configuration")?;
    let report = run(&config)?;

    info!("Report: {}", report.display());
    Ok(())
}
