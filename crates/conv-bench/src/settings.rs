//! Sweep configuration
//!
//! Layered as built-in defaults, then an optional file, then `CONV_BENCH_*`
//! environment variables.

use crate::error::{BenchError, Result};
use config::{Config, Environment, File, Map};
use conv_kernels::{ConvStrategy, Device, PaddingMode, DEFAULT_TOLERANCE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "CONV_BENCH";

/// Signal dimensionality of a sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dimensionality {
    /// `input_size` samples, `k` taps
    #[serde(rename = "1d")]
    OneD,
    /// `input_size x input_size` image, `k x k` filter
    #[serde(rename = "2d")]
    TwoD,
}

impl Dimensionality {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Dimensionality::OneD => "1d",
            Dimensionality::TwoD => "2d",
        }
    }
}

/// Harness configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchConfig {
    /// Signal length (or image side)
    pub input_size: usize,

    /// 1D or 2D sweep
    pub dims: Dimensionality,

    /// Padding convention for every trial
    pub mode: PaddingMode,

    /// Output stride
    pub stride: usize,

    /// Smallest filter size in the sweep
    pub min_filter_size: usize,

    /// Largest filter size in the sweep (inclusive)
    pub max_filter_size: usize,

    /// Increment between filter sizes
    pub filter_step: usize,

    /// Executions per timed repetition
    pub exec_number: usize,

    /// Timed repetitions per strategy
    pub repetitions: usize,

    /// Seed for the random signal and filters
    pub seed: u64,

    /// Directory receiving the CSV report
    pub output_dir: PathBuf,

    /// Strategies to time, in column order
    pub strategies: Vec<ConvStrategy>,

    /// Also time true convolution with a pre-flipped filter
    pub include_reference: bool,

    /// Relative error above which a trial is reported as a mismatch
    pub tolerance: f64,

    /// Execution target
    pub device: Device,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            input_size: 256,
            dims: Dimensionality::OneD,
            mode: PaddingMode::Full,
            stride: 1,
            min_filter_size: 1,
            max_filter_size: 256,
            filter_step: 1,
            exec_number: 10,
            repetitions: 200,
            seed: 231,
            output_dir: PathBuf::from("results"),
            strategies: ConvStrategy::ALL.to_vec(),
            include_reference: true,
            tolerance: DEFAULT_TOLERANCE,
            device: Device::Cpu,
        }
    }
}

impl BenchConfig {
    /// Load defaults, then `path` if given, then environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_from(path, None)
    }

    /// `env` replaces the process environment when given
    fn load_from(path: Option<&Path>, env: Option<Map<String, String>>) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("strategies")
                .source(env),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject sweeps that cannot run
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| Err(BenchError::InvalidSweep(reason.to_string()));
        if self.input_size == 0 {
            return invalid("input_size must be at least 1");
        }
        if self.stride == 0 || self.filter_step == 0 {
            return invalid("stride and filter_step must be at least 1");
        }
        if self.exec_number == 0 || self.repetitions == 0 {
            return invalid("exec_number and repetitions must be at least 1");
        }
        if self.min_filter_size == 0 || self.min_filter_size > self.max_filter_size {
            return invalid("filter sizes must satisfy 1 <= min_filter_size <= max_filter_size");
        }
        if self.max_filter_size > self.input_size {
            return invalid("max_filter_size cannot exceed input_size");
        }
        if self.strategies.is_empty() {
            return invalid("at least one strategy is required");
        }
        if self.tolerance.is_nan() || self.tolerance <= 0.0 {
            return invalid("tolerance must be positive");
        }
        Ok(())
    }

    /// Filter sizes visited by the sweep
    pub fn filter_sizes(&self) -> impl Iterator<Item = usize> {
        (self.min_filter_size..=self.max_filter_size).step_by(self.filter_step.max(1))
    }
}
