//! Spectral Convolution Kernels
//!
//! Cross-correlation computed three equivalent ways (direct sliding window,
//! FFT, power-of-two padded FFT) plus energy-preserving spectral truncation.
//! All kernels are pure: inputs are borrowed, outputs freshly allocated.

mod accuracy;
mod compress;
mod direct;
mod energy;
mod error;
mod fft;
mod layer;
mod params;
mod strategy;
mod transform;

pub use accuracy::{
    absolute_error, ensure_equivalent, relative_error, DEFAULT_TOLERANCE, RELATIVE_ERROR_EPS,
};
pub use compress::{compress_signal, compress_signal_with, Compression};
pub use direct::{
    convolve2d_direct, convolve_direct, correlate2d_direct, correlate2d_direct_padded,
    correlate_direct, correlate_direct_padded,
};
pub use energy::{
    band_energy, energy_cutoff, preserve_energy, preserve_energy_with, retained_fraction,
    EnergyRate, Truncation,
};
pub use error::{ConvError, Result};
pub use fft::{
    correlate2d_fft, correlate2d_fft_padded, correlate_fft, correlate_fft_padded,
    correlate_fft_with_len, min_fft_len, FftLength,
};
pub use layer::{conv1d_forward, conv2d_forward, ConvCache1d, ConvCache2d};
pub use params::{
    output_len, padded_len, ConvParams, Device, ExecutionContext, Pad, PaddingMode, MAX_AXIS_LEN,
};
pub use strategy::{ConvStrategy, Correlate1dFn, Correlate2dFn, KernelTable};
pub use transform::{
    conjugate_filter_spectrum, hermitian_deviation, next_power_of_two, RustFftTransform, Transform,
};

pub use rustfft::num_complex::Complex64;
