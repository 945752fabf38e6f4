//! FFT utilities
//!
//! The kernels only see the [`Transform`] trait; [`RustFftTransform`] backs it
//! with `rustfft`.

use ndarray::{s, Array2, ArrayView2};
use rustfft::{num_complex::Complex64, FftPlanner};

/// Smallest power of two >= `n` (1 for `n == 0`)
pub fn next_power_of_two(n: usize) -> usize {
    n.max(1).next_power_of_two()
}

/// Forward/inverse discrete Fourier transform capability
pub trait Transform {
    /// Unnormalised forward DFT in place
    fn process_forward(&mut self, buffer: &mut [Complex64]);

    /// Unnormalised inverse DFT in place
    fn process_inverse(&mut self, buffer: &mut [Complex64]);

    /// Transform a real signal zero-padded (or truncated) to `len` points
    fn forward(&mut self, signal: &[f64], len: usize) -> Vec<Complex64> {
        let mut buffer = vec![Complex64::new(0.0, 0.0); len];
        for (dst, &src) in buffer.iter_mut().zip(signal) {
            *dst = Complex64::new(src, 0.0);
        }
        self.process_forward(&mut buffer);
        buffer
    }

    /// Normalised inverse transform
    fn inverse_complex(&mut self, spectrum: &[Complex64]) -> Vec<Complex64> {
        let mut buffer = spectrum.to_vec();
        self.process_inverse(&mut buffer);
        let scale = 1.0 / buffer.len().max(1) as f64;
        buffer.iter_mut().for_each(|c| *c *= scale);
        buffer
    }

    /// Normalised inverse transform, real part only
    fn inverse(&mut self, spectrum: &[Complex64]) -> Vec<f64> {
        self.inverse_complex(spectrum).iter().map(|c| c.re).collect()
    }

    /// 2D transform of a real array zero-padded to `shape`
    fn forward_2d(&mut self, signal: ArrayView2<f64>, shape: (usize, usize)) -> Array2<Complex64> {
        let mut buffer = Array2::from_elem(shape, Complex64::new(0.0, 0.0));
        let rows = signal.nrows().min(shape.0);
        let cols = signal.ncols().min(shape.1);
        buffer
            .slice_mut(s![..rows, ..cols])
            .zip_mut_with(&signal.slice(s![..rows, ..cols]), |dst, &src| {
                *dst = Complex64::new(src, 0.0)
            });
        self.process_2d(&mut buffer, false);
        buffer
    }

    /// Normalised 2D inverse transform
    fn inverse_2d_complex(&mut self, spectrum: &Array2<Complex64>) -> Array2<Complex64> {
        let mut buffer = spectrum.clone();
        self.process_2d(&mut buffer, true);
        let scale = 1.0 / buffer.len().max(1) as f64;
        buffer.mapv_inplace(|c| c * scale);
        buffer
    }

    /// Row pass followed by a column pass
    fn process_2d(&mut self, buffer: &mut Array2<Complex64>, inverse: bool) {
        let mut line = vec![Complex64::new(0.0, 0.0); buffer.ncols()];
        for mut row in buffer.rows_mut() {
            line.iter_mut().zip(row.iter()).for_each(|(dst, src)| *dst = *src);
            if inverse {
                self.process_inverse(&mut line);
            } else {
                self.process_forward(&mut line);
            }
            row.iter_mut().zip(line.iter()).for_each(|(dst, src)| *dst = *src);
        }

        let mut line = vec![Complex64::new(0.0, 0.0); buffer.nrows()];
        for mut column in buffer.columns_mut() {
            line.iter_mut().zip(column.iter()).for_each(|(dst, src)| *dst = *src);
            if inverse {
                self.process_inverse(&mut line);
            } else {
                self.process_forward(&mut line);
            }
            column.iter_mut().zip(line.iter()).for_each(|(dst, src)| *dst = *src);
        }
    }
}

/// `rustfft`-backed transform. Plans are cached by the planner per length.
pub struct RustFftTransform {
    planner: FftPlanner<f64>,
}

impl RustFftTransform {
    /// Create a new transform with an empty plan cache
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
        }
    }
}

impl Default for RustFftTransform {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform for RustFftTransform {
    fn process_forward(&mut self, buffer: &mut [Complex64]) {
        if buffer.is_empty() {
            return;
        }
        let fft = self.planner.plan_fft_forward(buffer.len());
        fft.process(buffer);
    }

    fn process_inverse(&mut self, buffer: &mut [Complex64]) {
        if buffer.is_empty() {
            return;
        }
        let fft = self.planner.plan_fft_inverse(buffer.len());
        fft.process(buffer);
    }
}

/// Conjugated spectrum of `filter` zero-padded to `len`.
///
/// Multiplying a signal spectrum by this yields cross-correlation with the
/// no-flip convention of the direct kernel.
pub fn conjugate_filter_spectrum<T: Transform + ?Sized>(
    transform: &mut T,
    filter: &[f64],
    len: usize,
) -> Vec<Complex64> {
    let mut spectrum = transform.forward(filter, len);
    spectrum.iter_mut().for_each(|c| *c = c.conj());
    spectrum
}

/// Largest `|X[k] - conj(X[N-k])|` over `1 <= k < ceil(N/2)`.
///
/// Zero (up to rounding) for the spectrum of a real signal.
pub fn hermitian_deviation(spectrum: &[Complex64]) -> f64 {
    let n = spectrum.len();
    (1..(n + 1) / 2)
        .map(|k| (spectrum[k] - spectrum[n - k].conj()).norm())
        .fold(0.0, f64::max)
}
