//! Filter-size sweep over the correlation strategies
//!
//! Every trial is checked against the direct kernel. Mismatches beyond the
//! configured tolerance are logged, not raised, so a sweep always completes.

use crate::error::Result;
use crate::settings::{BenchConfig, Dimensionality};
use crate::timing::time_repeated;
use conv_kernels::{
    absolute_error, convolve2d_direct, convolve_direct, ensure_equivalent, ConvError, ConvStrategy,
    ExecutionContext, Pad, PaddingMode,
};
use ndarray::{s, Array2};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::StandardNormal;
use std::fmt;
use tracing::{debug, info, warn};

/// One timed column of the report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    /// A correlation strategy
    Strategy(ConvStrategy),
    /// True convolution fed a pre-flipped filter
    Reference,
}

impl Column {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Column::Strategy(strategy) => strategy.as_str(),
            Column::Reference => "reference",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timing and agreement of one column for one filter size
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub column: Column,
    /// Trimmed mean seconds per repetition
    pub seconds: f64,
    /// `sum |direct - candidate|`
    pub abs_error: f64,
    /// `max |direct - candidate| / max(eps, |direct| + |candidate|)`
    pub rel_error: f64,
}

/// All measurements for one filter size, in column order
#[derive(Debug, Clone, PartialEq)]
pub struct SweepRow {
    pub filter_size: usize,
    pub measurements: Vec<Measurement>,
}

/// Columns timed under `config`
pub fn columns(config: &BenchConfig) -> Vec<Column> {
    let mut columns: Vec<Column> =
        config.strategies.iter().copied().map(Column::Strategy).collect();
    if config.include_reference {
        columns.push(Column::Reference);
    }
    columns
}

/// Run the sweep described by `config`
pub fn run_sweep(config: &BenchConfig) -> Result<Vec<SweepRow>> {
    config.validate()?;
    ExecutionContext {
        device: config.device,
    }
    .ensure_available()?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    info!(
        dims = config.dims.as_str(),
        input_size = config.input_size,
        mode = config.mode.as_str(),
        stride = config.stride,
        "starting sweep"
    );

    let rows = match config.dims {
        Dimensionality::OneD => {
            let signal = random_vec(&mut rng, config.input_size);
            config
                .filter_sizes()
                .map(|size| {
                    let filter = random_vec(&mut rng, size);
                    sweep_1d(config, &signal, &filter)
                })
                .collect::<Result<Vec<_>>>()?
        }
        Dimensionality::TwoD => {
            let signal = random_array(&mut rng, config.input_size);
            config
                .filter_sizes()
                .map(|size| {
                    let filter = random_array(&mut rng, size);
                    sweep_2d(config, &signal, &filter)
                })
                .collect::<Result<Vec<_>>>()?
        }
    };

    info!(rows = rows.len(), "sweep finished");
    Ok(rows)
}

fn random_vec(rng: &mut StdRng, len: usize) -> Vec<f64> {
    (0..len).map(|_| rng.sample(StandardNormal)).collect()
}

fn random_array(rng: &mut StdRng, side: usize) -> Array2<f64> {
    Array2::from_shape_fn((side, side), |_| rng.sample(StandardNormal))
}

fn sweep_1d(config: &BenchConfig, signal: &[f64], filter: &[f64]) -> Result<SweepRow> {
    let pad = Pad::Mode(config.mode).resolve(filter.len());
    let stride = config.stride;
    let baseline = ConvStrategy::Direct.kernels().correlate_1d;
    let expected = baseline(signal, filter, pad, stride)?;
    let flipped: Vec<f64> = filter.iter().rev().copied().collect();

    let mut measurements = Vec::new();
    for column in columns(config) {
        let timed = match column {
            Column::Strategy(strategy) => {
                let correlate = strategy.kernels().correlate_1d;
                time_repeated(
                    || correlate(signal, filter, pad, stride),
                    config.exec_number,
                    config.repetitions,
                )?
            }
            Column::Reference => time_repeated(
                || reference_1d(signal, &flipped, config.mode, stride),
                config.exec_number,
                config.repetitions,
            )?,
        };
        let output = timed.last?;
        let measurement = measure(config, filter.len(), column, timed.seconds, &expected, &output)?;
        measurements.push(measurement);
    }

    Ok(SweepRow {
        filter_size: filter.len(),
        measurements,
    })
}

fn sweep_2d(config: &BenchConfig, signal: &Array2<f64>, filter: &Array2<f64>) -> Result<SweepRow> {
    let pad = Pad::Mode(config.mode);
    let pad = (pad.resolve(filter.nrows()), pad.resolve(filter.ncols()));
    let stride = config.stride;
    let baseline = ConvStrategy::Direct.kernels().correlate_2d;
    let expected = baseline(signal.view(), filter.view(), pad, stride)?;
    let expected: Vec<f64> = expected.iter().copied().collect();
    let flipped = filter.slice(s![..;-1, ..;-1]);

    let mut measurements = Vec::new();
    for column in columns(config) {
        let timed = match column {
            Column::Strategy(strategy) => {
                let correlate = strategy.kernels().correlate_2d;
                time_repeated(
                    || correlate(signal.view(), filter.view(), pad, stride),
                    config.exec_number,
                    config.repetitions,
                )?
            }
            Column::Reference => time_repeated(
                || reference_2d(signal, flipped, config.mode, stride),
                config.exec_number,
                config.repetitions,
            )?,
        };
        let output: Vec<f64> = timed.last?.iter().copied().collect();
        let measurement =
            measure(config, filter.nrows(), column, timed.seconds, &expected, &output)?;
        measurements.push(measurement);
    }

    Ok(SweepRow {
        filter_size: filter.nrows(),
        measurements,
    })
}

/// True convolution with a pre-flipped filter. It shares no code with the
/// correlation kernels, so it checks them independently. Stride is applied by
/// subsampling the unit-stride output.
fn reference_1d(
    signal: &[f64],
    flipped: &[f64],
    mode: PaddingMode,
    stride: usize,
) -> std::result::Result<Vec<f64>, ConvError> {
    let full = convolve_direct(signal, flipped, mode)?;
    Ok(full.into_iter().step_by(stride).collect())
}

fn reference_2d(
    signal: &Array2<f64>,
    flipped: ndarray::ArrayView2<f64>,
    mode: PaddingMode,
    stride: usize,
) -> std::result::Result<Array2<f64>, ConvError> {
    let full = convolve2d_direct(signal.view(), flipped, mode)?;
    let step = stride as isize;
    Ok(full.slice(s![..;step, ..;step]).to_owned())
}

fn measure(
    config: &BenchConfig,
    filter_size: usize,
    column: Column,
    seconds: f64,
    expected: &[f64],
    output: &[f64],
) -> Result<Measurement> {
    let rel_error = match ensure_equivalent(expected, output, config.tolerance) {
        Ok(relative) => relative,
        Err(ConvError::NumericMismatch {
            relative_error,
            tolerance,
        }) => {
            warn!(
                %column,
                filter_size,
                relative_error,
                tolerance,
                "numeric mismatch against direct kernel"
            );
            relative_error
        }
        Err(other) => return Err(other.into()),
    };
    let abs_error = absolute_error(expected, output);
    debug!(%column, filter_size, seconds, abs_error, rel_error, "trial");

    Ok(Measurement {
        column,
        seconds,
        abs_error,
        rel_error,
    })
}
