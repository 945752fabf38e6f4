//! Direct (sliding-window) correlation

use crate::error::Result;
use crate::params::{output_len, padded_len, PaddingMode};
use ndarray::{Array2, ArrayView2};
use tracing::trace;

/// Cross-correlate `signal` with `filter` (no kernel flip).
pub fn correlate_direct(signal: &[f64], filter: &[f64], mode: PaddingMode) -> Result<Vec<f64>> {
    correlate_direct_padded(signal, filter, mode.padding(filter.len()), 1)
}

/// Cross-correlation with explicit zero padding on both ends and a stride.
pub fn correlate_direct_padded(
    signal: &[f64],
    filter: &[f64],
    pad: usize,
    stride: usize,
) -> Result<Vec<f64>> {
    let out_len = output_len(signal.len(), filter.len(), pad, stride)?;
    trace!(
        signal_len = signal.len(),
        filter_len = filter.len(),
        pad,
        stride,
        "direct correlation"
    );

    let mut padded = vec![0.0; padded_len(signal.len(), pad)?];
    padded[pad..pad + signal.len()].copy_from_slice(signal);

    let output = (0..out_len)
        .map(|i| {
            let start = i * stride;
            padded[start..start + filter.len()]
                .iter()
                .zip(filter)
                .map(|(x, w)| x * w)
                .sum::<f64>()
        })
        .collect();
    Ok(output)
}

/// True convolution: `out[i] = sum_j signal[i + offset - j] * filter[j]`.
///
/// `offset` is `filter.len() - 1 - pad`, so FULL starts at the first partial
/// overlap and VALID at the first full one. Samples outside the signal are zero.
pub fn convolve_direct(signal: &[f64], filter: &[f64], mode: PaddingMode) -> Result<Vec<f64>> {
    let pad = mode.padding(filter.len());
    let out_len = output_len(signal.len(), filter.len(), pad, 1)?;
    let offset = filter.len() - 1 - pad;

    let output = (0..out_len)
        .map(|i| {
            let k = i + offset;
            let first = (k + 1).saturating_sub(signal.len());
            let last = k.min(filter.len() - 1);
            (first..=last).map(|j| signal[k - j] * filter[j]).sum::<f64>()
        })
        .collect();
    Ok(output)
}

/// 2D cross-correlation
pub fn correlate2d_direct(
    signal: ArrayView2<f64>,
    filter: ArrayView2<f64>,
    mode: PaddingMode,
) -> Result<Array2<f64>> {
    let pad = (mode.padding(filter.nrows()), mode.padding(filter.ncols()));
    correlate2d_direct_padded(signal, filter, pad, 1)
}

/// 2D cross-correlation with per-axis padding `(rows, cols)` and a shared stride
pub fn correlate2d_direct_padded(
    signal: ArrayView2<f64>,
    filter: ArrayView2<f64>,
    pad: (usize, usize),
    stride: usize,
) -> Result<Array2<f64>> {
    let (height, width) = signal.dim();
    let (fh, fw) = filter.dim();
    let out_h = output_len(height, fh, pad.0, stride)?;
    let out_w = output_len(width, fw, pad.1, stride)?;

    let mut padded =
        Array2::<f64>::zeros((padded_len(height, pad.0)?, padded_len(width, pad.1)?));
    padded
        .slice_mut(ndarray::s![pad.0..pad.0 + height, pad.1..pad.1 + width])
        .assign(&signal);

    let mut output = Array2::<f64>::zeros((out_h, out_w));
    for ((r, c), out) in output.indexed_iter_mut() {
        let (row, col) = (r * stride, c * stride);
        let window = padded.slice(ndarray::s![row..row + fh, col..col + fw]);
        *out = window.iter().zip(filter.iter()).map(|(x, w)| x * w).sum::<f64>();
    }
    Ok(output)
}

/// 2D true convolution, the per-axis analogue of [`convolve_direct`]
pub fn convolve2d_direct(
    signal: ArrayView2<f64>,
    filter: ArrayView2<f64>,
    mode: PaddingMode,
) -> Result<Array2<f64>> {
    let (height, width) = signal.dim();
    let (fh, fw) = filter.dim();
    let pad = (mode.padding(fh), mode.padding(fw));
    let out_h = output_len(height, fh, pad.0, 1)?;
    let out_w = output_len(width, fw, pad.1, 1)?;
    let offset = (fh - 1 - pad.0, fw - 1 - pad.1);

    let mut output = Array2::<f64>::zeros((out_h, out_w));
    for ((r, c), out) in output.indexed_iter_mut() {
        let (kr, kc) = (r + offset.0, c + offset.1);
        let rows = (kr + 1).saturating_sub(height)..=kr.min(fh - 1);
        let cols = (kc + 1).saturating_sub(width)..=kc.min(fw - 1);
        let mut acc = 0.0;
        for a in rows {
            for b in cols.clone() {
                acc += signal[[kr - a, kc - b]] * filter[[a, b]];
            }
        }
        *out = acc;
    }
    Ok(output)
}
