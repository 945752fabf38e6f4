//! Kernel selection
//!
//! Each strategy resolves to a static table of function pointers; string names
//! are only parsed at the edges (configuration, reports).

use crate::direct::{correlate2d_direct_padded, correlate_direct_padded};
use crate::error::{ConvError, Result};
use crate::fft::{correlate2d_fft_padded, correlate_fft_padded, FftLength};
use crate::params::PaddingMode;
use crate::transform::RustFftTransform;
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 1D kernel: `(signal, filter, pad, stride)`
pub type Correlate1dFn = fn(&[f64], &[f64], usize, usize) -> Result<Vec<f64>>;

/// 2D kernel: `(signal, filter, (pad_rows, pad_cols), stride)`
pub type Correlate2dFn =
    fn(ArrayView2<f64>, ArrayView2<f64>, (usize, usize), usize) -> Result<Array2<f64>>;

/// Function pointers implementing one strategy
pub struct KernelTable {
    pub correlate_1d: Correlate1dFn,
    pub correlate_2d: Correlate2dFn,
}

static DIRECT_KERNELS: KernelTable = KernelTable {
    correlate_1d: correlate_direct_padded,
    correlate_2d: correlate2d_direct_padded,
};

static FFT_KERNELS: KernelTable = KernelTable {
    correlate_1d: fft_minimal_1d,
    correlate_2d: fft_minimal_2d,
};

static FFT_POW2_KERNELS: KernelTable = KernelTable {
    correlate_1d: fft_pow2_1d,
    correlate_2d: fft_pow2_2d,
};

fn fft_minimal_1d(signal: &[f64], filter: &[f64], pad: usize, stride: usize) -> Result<Vec<f64>> {
    let mut transform = RustFftTransform::new();
    correlate_fft_padded(&mut transform, signal, filter, pad, stride, FftLength::Minimal)
}

fn fft_pow2_1d(signal: &[f64], filter: &[f64], pad: usize, stride: usize) -> Result<Vec<f64>> {
    let mut transform = RustFftTransform::new();
    correlate_fft_padded(&mut transform, signal, filter, pad, stride, FftLength::PowerOfTwo)
}

fn fft_minimal_2d(
    signal: ArrayView2<f64>,
    filter: ArrayView2<f64>,
    pad: (usize, usize),
    stride: usize,
) -> Result<Array2<f64>> {
    let mut transform = RustFftTransform::new();
    correlate2d_fft_padded(&mut transform, signal, filter, pad, stride, FftLength::Minimal)
}

fn fft_pow2_2d(
    signal: ArrayView2<f64>,
    filter: ArrayView2<f64>,
    pad: (usize, usize),
    stride: usize,
) -> Result<Array2<f64>> {
    let mut transform = RustFftTransform::new();
    correlate2d_fft_padded(&mut transform, signal, filter, pad, stride, FftLength::PowerOfTwo)
}

/// Correlation strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvStrategy {
    /// Sliding-window multiply-accumulate
    #[serde(alias = "naive")]
    Direct,
    /// FFT at the minimal wraparound-free length
    Fft,
    /// FFT at the next power of two
    #[serde(alias = "fftw")]
    FftPow2,
}

impl ConvStrategy {
    /// Every strategy, direct first
    pub const ALL: [ConvStrategy; 3] =
        [ConvStrategy::Direct, ConvStrategy::Fft, ConvStrategy::FftPow2];

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ConvStrategy::Direct => "naive",
            ConvStrategy::Fft => "fft",
            ConvStrategy::FftPow2 => "fftw",
        }
    }

    /// Kernel table for this strategy
    pub fn kernels(self) -> &'static KernelTable {
        match self {
            ConvStrategy::Direct => &DIRECT_KERNELS,
            ConvStrategy::Fft => &FFT_KERNELS,
            ConvStrategy::FftPow2 => &FFT_POW2_KERNELS,
        }
    }

    /// 1D correlation under a padding mode
    pub fn correlate(self, signal: &[f64], filter: &[f64], mode: PaddingMode) -> Result<Vec<f64>> {
        (self.kernels().correlate_1d)(signal, filter, mode.padding(filter.len()), 1)
    }

    /// 2D correlation under a padding mode
    pub fn correlate2d(
        self,
        signal: ArrayView2<f64>,
        filter: ArrayView2<f64>,
        mode: PaddingMode,
    ) -> Result<Array2<f64>> {
        let pad = (mode.padding(filter.nrows()), mode.padding(filter.ncols()));
        (self.kernels().correlate_2d)(signal, filter, pad, 1)
    }
}

impl fmt::Display for ConvStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConvStrategy {
    type Err = ConvError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "direct" | "naive" => Ok(ConvStrategy::Direct),
            "fft" => Ok(ConvStrategy::Fft),
            "fft_pow2" | "fftw" => Ok(ConvStrategy::FftPow2),
            other => Err(ConvError::invalid(format!("unknown strategy '{}'", other))),
        }
    }
}
