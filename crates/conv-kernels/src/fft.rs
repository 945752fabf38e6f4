//! FFT-based correlation
//!
//! Signal and filter are zero-padded to a common length `N`, transformed, and
//! the signal spectrum is multiplied by the conjugate filter spectrum. The
//! inverse is a circular correlation; as long as `N` is large enough, output
//! `i` sits at circular index `i - pad (mod N)`, so negative lags are read
//! from the tail and the rest from the head.

use crate::error::{ConvError, Result};
use crate::params::{output_len, PaddingMode};
use crate::transform::{conjugate_filter_spectrum, next_power_of_two, RustFftTransform, Transform};
use ndarray::{Array2, ArrayView2};
use rustfft::num_complex::Complex64;
use tracing::{debug, warn};

/// Largest tolerated imaginary residue relative to the real magnitude
const IMAGINARY_TOLERANCE: f64 = 1e-9;

/// How the transform length is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FftLength {
    /// Smallest length that avoids circular wraparound
    Minimal,
    /// Minimal length rounded up to a power of two
    PowerOfTwo,
    /// Caller-chosen length; must not be below the minimal one
    Exact(usize),
}

impl FftLength {
    /// Pick the length for an axis whose wraparound-free minimum is `min_len`
    pub fn resolve(self, min_len: usize) -> Result<usize> {
        match self {
            FftLength::Minimal => Ok(min_len),
            FftLength::PowerOfTwo => Ok(next_power_of_two(min_len)),
            FftLength::Exact(n) if n >= min_len => Ok(n),
            FftLength::Exact(n) => Err(ConvError::invalid(format!(
                "transform length {} is below the {} points needed for linear correlation",
                n, min_len
            ))),
        }
    }
}

impl From<bool> for FftLength {
    fn from(pad_to_power_of_two: bool) -> Self {
        if pad_to_power_of_two {
            FftLength::PowerOfTwo
        } else {
            FftLength::Minimal
        }
    }
}

/// Minimum transform length for one axis.
///
/// `signal + pad` keeps the zeros needed by negative lags free of signal
/// samples; the filter itself must also fit.
pub fn min_fft_len(signal_len: usize, filter_len: usize, pad: usize) -> usize {
    (signal_len + pad).max(filter_len)
}

/// Cross-correlate via FFT. Matches [`crate::correlate_direct`] up to rounding.
pub fn correlate_fft(
    signal: &[f64],
    filter: &[f64],
    mode: PaddingMode,
    pad_to_power_of_two: bool,
) -> Result<Vec<f64>> {
    let mut transform = RustFftTransform::new();
    correlate_fft_padded(
        &mut transform,
        signal,
        filter,
        mode.padding(filter.len()),
        1,
        pad_to_power_of_two.into(),
    )
}

/// Cross-correlate with an explicit transform length `n`
pub fn correlate_fft_with_len<T: Transform + ?Sized>(
    transform: &mut T,
    signal: &[f64],
    filter: &[f64],
    mode: PaddingMode,
    n: usize,
) -> Result<Vec<f64>> {
    correlate_fft_padded(
        transform,
        signal,
        filter,
        mode.padding(filter.len()),
        1,
        FftLength::Exact(n),
    )
}

/// FFT cross-correlation with explicit padding and stride.
///
/// Strided outputs are taken from the stride-1 result.
pub fn correlate_fft_padded<T: Transform + ?Sized>(
    transform: &mut T,
    signal: &[f64],
    filter: &[f64],
    pad: usize,
    stride: usize,
    length: FftLength,
) -> Result<Vec<f64>> {
    let out_len = output_len(signal.len(), filter.len(), pad, stride)?;
    let n = length.resolve(min_fft_len(signal.len(), filter.len(), pad))?;
    debug!(
        signal_len = signal.len(),
        filter_len = filter.len(),
        n,
        "fft correlation"
    );

    let mut product = transform.forward(signal, n);
    let filter_spectrum = conjugate_filter_spectrum(transform, filter, n);
    product
        .iter_mut()
        .zip(filter_spectrum.iter())
        .for_each(|(x, w)| *x *= *w);

    let circular = transform.inverse_complex(&product);
    if cfg!(debug_assertions) {
        warn_on_imaginary_residue(circular.iter());
    }

    let output = (0..out_len)
        .map(|i| circular[circular_index(i * stride, pad, n)].re)
        .collect();
    Ok(output)
}

/// 2D FFT cross-correlation
pub fn correlate2d_fft(
    signal: ArrayView2<f64>,
    filter: ArrayView2<f64>,
    mode: PaddingMode,
    pad_to_power_of_two: bool,
) -> Result<Array2<f64>> {
    let pad = (mode.padding(filter.nrows()), mode.padding(filter.ncols()));
    let mut transform = RustFftTransform::new();
    correlate2d_fft_padded(
        &mut transform,
        signal,
        filter,
        pad,
        1,
        pad_to_power_of_two.into(),
    )
}

/// 2D FFT cross-correlation with per-axis padding and a shared stride.
///
/// `FftLength::Exact` applies the same length to both axes.
pub fn correlate2d_fft_padded<T: Transform + ?Sized>(
    transform: &mut T,
    signal: ArrayView2<f64>,
    filter: ArrayView2<f64>,
    pad: (usize, usize),
    stride: usize,
    length: FftLength,
) -> Result<Array2<f64>> {
    let (height, width) = signal.dim();
    let (fh, fw) = filter.dim();
    let out_h = output_len(height, fh, pad.0, stride)?;
    let out_w = output_len(width, fw, pad.1, stride)?;
    let n_rows = length.resolve(min_fft_len(height, fh, pad.0))?;
    let n_cols = length.resolve(min_fft_len(width, fw, pad.1))?;
    debug!(height, width, fh, fw, n_rows, n_cols, "fft 2d correlation");

    let signal_spectrum = transform.forward_2d(signal, (n_rows, n_cols));
    let mut product = transform.forward_2d(filter, (n_rows, n_cols));
    product.zip_mut_with(&signal_spectrum, |w, &x| *w = x * w.conj());

    let circular = transform.inverse_2d_complex(&product);
    if cfg!(debug_assertions) {
        warn_on_imaginary_residue(circular.iter());
    }

    Ok(Array2::from_shape_fn((out_h, out_w), |(r, c)| {
        circular[[
            circular_index(r * stride, pad.0, n_rows),
            circular_index(c * stride, pad.1, n_cols),
        ]]
        .re
    }))
}

/// Index of linear output `index` in a circular result of length `n`
fn circular_index(index: usize, pad: usize, n: usize) -> usize {
    (index + n - pad) % n
}

fn warn_on_imaginary_residue<'a>(values: impl Iterator<Item = &'a Complex64>) {
    let (max_re, max_im) = values.fold((0.0f64, 0.0f64), |(re, im), c| {
        (re.max(c.re.abs()), im.max(c.im.abs()))
    });
    if max_im > IMAGINARY_TOLERANCE * max_re.max(1.0) {
        warn!(max_im, max_re, "inverse transform left an imaginary residue");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direct::{correlate2d_direct, correlate_direct, correlate_direct_padded};
    use ndarray::array;

    const SIGNAL: [f64; 16] = [
        1.0, 2.0, 3.0, 5.0, 1.0, -1.0, 2.0, 3.0, 5.0, 8.0, 3.0, 9.0, 1.0, 2.0, 5.0, 1.0,
    ];
    const FILTER: [f64; 4] = [4.0, 5.0, 3.0, 4.0];

    fn assert_close(a: &[f64], b: &[f64]) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b) {
            assert!((x - y).abs() < 1e-9, "{} != {}", x, y);
        }
    }

    #[test]
    fn test_valid_literal() {
        let direct = correlate_direct(&SIGNAL, &FILTER, PaddingMode::Valid).unwrap();
        let fft = correlate_fft(&SIGNAL, &FILTER, PaddingMode::Valid, false).unwrap();
        let fftw = correlate_fft(&SIGNAL, &FILTER, PaddingMode::Valid, true).unwrap();
        assert_close(&fft, &direct);
        assert_close(&fftw, &direct);
    }

    #[test]
    fn test_full_matches_direct() {
        let direct = correlate_direct(&SIGNAL, &FILTER, PaddingMode::Full).unwrap();
        let fft = correlate_fft(&SIGNAL, &FILTER, PaddingMode::Full, false).unwrap();
        let fftw = correlate_fft(&SIGNAL, &FILTER, PaddingMode::Full, true).unwrap();
        assert_eq!(fft.len(), 19);
        assert_close(&fft, &direct);
        assert_close(&fftw, &direct);
    }

    #[test]
    fn test_oversized_transform_rotates_tail() {
        let mut transform = RustFftTransform::new();
        let direct = correlate_direct(&SIGNAL, &FILTER, PaddingMode::Full).unwrap();
        let fft = correlate_fft_with_len(&mut transform, &SIGNAL, &FILTER, PaddingMode::Full, 64)
            .unwrap();
        assert_close(&fft, &direct);
    }

    #[test]
    fn test_undersized_transform_rejected() {
        let mut transform = RustFftTransform::new();
        // Full needs 16 + 4 - 1 = 19 points
        let err = correlate_fft_with_len(&mut transform, &SIGNAL, &FILTER, PaddingMode::Full, 18)
            .unwrap_err();
        assert!(matches!(err, ConvError::InvalidConfiguration(_)));
        // Valid needs only the signal length
        let valid = PaddingMode::Valid;
        assert!(correlate_fft_with_len(&mut transform, &SIGNAL, &FILTER, valid, 16).is_ok());
        assert!(correlate_fft_with_len(&mut transform, &SIGNAL, &FILTER, valid, 15).is_err());
    }

    #[test]
    fn test_scalar_filter_scales_signal() {
        let out = correlate_fft(&SIGNAL, &[2.5], PaddingMode::Valid, false).unwrap();
        let expected: Vec<f64> = SIGNAL.iter().map(|v| v * 2.5).collect();
        assert_close(&out, &expected);
    }

    #[test]
    fn test_strided_matches_direct() {
        let mut transform = RustFftTransform::new();
        for stride in 1..4 {
            let direct = correlate_direct_padded(&SIGNAL, &FILTER, 2, stride).unwrap();
            let fft = correlate_fft_padded(
                &mut transform,
                &SIGNAL,
                &FILTER,
                2,
                stride,
                FftLength::Minimal,
            )
            .unwrap();
            assert_close(&fft, &direct);
        }
    }

    #[test]
    fn test_huge_padding_is_rejected() {
        let mut transform = RustFftTransform::new();
        for length in [FftLength::Minimal, FftLength::PowerOfTwo] {
            let err = correlate_fft_padded(
                &mut transform,
                &[1.0, 2.0],
                &[1.0],
                usize::MAX / 2 + 1,
                1,
                length,
            )
            .unwrap_err();
            assert!(matches!(err, ConvError::InvalidConfiguration(_)));
        }
    }

    #[test]
    fn test_large_explicit_padding() {
        // Filter longer than signal + pad must still fit the transform
        let mut transform = RustFftTransform::new();
        let direct =
            correlate_direct_padded(&[1.0, 2.0], &[1.0, 1.0, 1.0, 1.0, 1.0], 2, 1).unwrap();
        let fft = correlate_fft_padded(
            &mut transform,
            &[1.0, 2.0],
            &[1.0, 1.0, 1.0, 1.0, 1.0],
            2,
            1,
            FftLength::Minimal,
        )
        .unwrap();
        assert_close(&fft, &direct);
    }

    #[test]
    fn test_2d_matches_direct() {
        let signal = array![
            [1.0, 2.0, 0.5, -1.0],
            [3.0, -2.0, 4.0, 1.0],
            [0.0, 1.5, 2.0, 2.0]
        ];
        let filter = array![[1.0, -1.0], [0.5, 2.0]];
        for mode in [PaddingMode::Valid, PaddingMode::Full] {
            let direct = correlate2d_direct(signal.view(), filter.view(), mode).unwrap();
            for pow2 in [false, true] {
                let fft = correlate2d_fft(signal.view(), filter.view(), mode, pow2).unwrap();
                assert_eq!(fft.dim(), direct.dim());
                for (a, b) in fft.iter().zip(direct.iter()) {
                    assert!((a - b).abs() < 1e-9);
                }
            }
        }
    }

    #[test]
    fn test_length_resolution() {
        assert_eq!(FftLength::Minimal.resolve(19).unwrap(), 19);
        assert_eq!(FftLength::PowerOfTwo.resolve(19).unwrap(), 32);
        assert_eq!(FftLength::Exact(20).resolve(19).unwrap(), 20);
        assert!(FftLength::Exact(18).resolve(19).is_err());
    }
}
