//! Batched multi-channel forward pass
//!
//! Each output map is the bias plus the sum over input channels of the
//! selected strategy's correlation.

use crate::error::{ConvError, Result};
use crate::params::{output_len, ConvParams, ExecutionContext};
use crate::strategy::ConvStrategy;
use ndarray::{s, Array1, Array3, Array4, ArrayView1, ArrayView3, ArrayView4};
use tracing::debug;

/// Inputs of a 1D forward pass, kept for a caller-side backward pass
#[derive(Debug, Clone)]
pub struct ConvCache1d {
    input: Array3<f64>,
    weights: Array3<f64>,
    bias: Array1<f64>,
    params: ConvParams,
}

impl ConvCache1d {
    pub fn input(&self) -> &Array3<f64> {
        &self.input
    }

    pub fn weights(&self) -> &Array3<f64> {
        &self.weights
    }

    pub fn bias(&self) -> &Array1<f64> {
        &self.bias
    }

    pub fn params(&self) -> &ConvParams {
        &self.params
    }
}

/// Inputs of a 2D forward pass
#[derive(Debug, Clone)]
pub struct ConvCache2d {
    input: Array4<f64>,
    weights: Array4<f64>,
    bias: Array1<f64>,
    params: ConvParams,
}

impl ConvCache2d {
    pub fn input(&self) -> &Array4<f64> {
        &self.input
    }

    pub fn weights(&self) -> &Array4<f64> {
        &self.weights
    }

    pub fn bias(&self) -> &Array1<f64> {
        &self.bias
    }

    pub fn params(&self) -> &ConvParams {
        &self.params
    }
}

fn check_shapes(
    channels: usize,
    weight_channels: usize,
    filters: usize,
    bias_len: usize,
) -> Result<()> {
    if channels == 0 {
        return Err(ConvError::invalid("input must have at least one channel"));
    }
    if channels != weight_channels {
        return Err(ConvError::invalid(format!(
            "input has {} channels but filters expect {}",
            channels, weight_channels
        )));
    }
    if bias_len != filters {
        return Err(ConvError::invalid(format!(
            "bias has {} entries for {} filters",
            bias_len, filters
        )));
    }
    Ok(())
}

/// 1D forward pass.
///
/// `x`: `(batch, channels, width)`, `w`: `(filters, channels, filter_width)`,
/// `b`: `(filters,)`. Returns `(batch, filters, out_width)`.
pub fn conv1d_forward(
    ctx: &ExecutionContext,
    strategy: ConvStrategy,
    x: ArrayView3<f64>,
    w: ArrayView3<f64>,
    b: ArrayView1<f64>,
    params: &ConvParams,
) -> Result<(Array3<f64>, ConvCache1d)> {
    ctx.ensure_available()?;
    params.validate()?;

    let (batch, channels, width) = x.dim();
    let (filters, weight_channels, filter_width) = w.dim();
    check_shapes(channels, weight_channels, filters, b.len())?;

    let pad = params.pad.resolve(filter_width);
    let out_width = output_len(width, filter_width, pad, params.stride)?;
    let correlate = strategy.kernels().correlate_1d;
    debug!(%strategy, batch, channels, filters, out_width, "conv1d forward");

    let mut out = Array3::<f64>::zeros((batch, filters, out_width));
    for n in 0..batch {
        for f in 0..filters {
            let mut acc = out.slice_mut(s![n, f, ..]);
            acc.fill(b[f]);
            for c in 0..channels {
                let signal = x.slice(s![n, c, ..]).to_vec();
                let filter = w.slice(s![f, c, ..]).to_vec();
                let partial = correlate(&signal, &filter, pad, params.stride)?;
                acc.iter_mut().zip(partial).for_each(|(o, p)| *o += p);
            }
        }
    }

    let cache = ConvCache1d {
        input: x.to_owned(),
        weights: w.to_owned(),
        bias: b.to_owned(),
        params: *params,
    };
    Ok((out, cache))
}

/// 2D forward pass.
///
/// `x`: `(batch, channels, height, width)`, `w`: `(filters, channels, fh, fw)`,
/// `b`: `(filters,)`. Returns `(batch, filters, out_h, out_w)`.
pub fn conv2d_forward(
    ctx: &ExecutionContext,
    strategy: ConvStrategy,
    x: ArrayView4<f64>,
    w: ArrayView4<f64>,
    b: ArrayView1<f64>,
    params: &ConvParams,
) -> Result<(Array4<f64>, ConvCache2d)> {
    ctx.ensure_available()?;
    params.validate()?;

    let (batch, channels, height, width) = x.dim();
    let (filters, weight_channels, fh, fw) = w.dim();
    check_shapes(channels, weight_channels, filters, b.len())?;

    let pad = (params.pad.resolve(fh), params.pad.resolve(fw));
    let out_h = output_len(height, fh, pad.0, params.stride)?;
    let out_w = output_len(width, fw, pad.1, params.stride)?;
    let correlate = strategy.kernels().correlate_2d;
    debug!(%strategy, batch, channels, filters, out_h, out_w, "conv2d forward");

    let mut out = Array4::<f64>::zeros((batch, filters, out_h, out_w));
    for n in 0..batch {
        for f in 0..filters {
            let mut acc = out.slice_mut(s![n, f, .., ..]);
            acc.fill(b[f]);
            for c in 0..channels {
                let partial = correlate(
                    x.slice(s![n, c, .., ..]),
                    w.slice(s![f, c, .., ..]),
                    pad,
                    params.stride,
                )?;
                acc += &partial;
            }
        }
    }

    let cache = ConvCache2d {
        input: x.to_owned(),
        weights: w.to_owned(),
        bias: b.to_owned(),
        params: *params,
    };
    Ok((out, cache))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{Pad, PaddingMode};
    use ndarray::{array, Array};

    #[test]
    fn test_conv1d_sums_channels_and_bias() {
        // Two channels, one filter picking channel 0 forward and channel 1 scaled
        let x = array![[[1.0, 2.0, 3.0, 4.0], [1.0, 1.0, 1.0, 1.0]]];
        let w = array![[[1.0, 0.0], [0.0, 2.0]]];
        let b = array![0.5];
        let (out, cache) = conv1d_forward(
            &ExecutionContext::cpu(),
            ConvStrategy::Direct,
            x.view(),
            w.view(),
            b.view(),
            &ConvParams::default(),
        )
        .unwrap();
        assert_eq!(out, array![[[3.5, 4.5, 5.5]]]);
        assert_eq!(cache.input(), &x);
        assert_eq!(cache.params().stride, 1);
    }

    #[test]
    fn test_conv1d_strategies_agree_with_stride() {
        let x = Array::from_shape_fn((2, 3, 11), |(n, c, i)| {
            ((n + 2 * c + 3 * i) % 7) as f64 - 3.0
        });
        let w = Array::from_shape_fn((4, 3, 3), |(f, c, i)| ((f + c * i) % 5) as f64 * 0.5 - 1.0);
        let b = array![0.1, -0.2, 0.3, 0.0];
        let params = ConvParams {
            stride: 2,
            pad: Pad::Zeros(1),
        };
        let ctx = ExecutionContext::cpu();
        let (reference, _) =
            conv1d_forward(&ctx, ConvStrategy::Direct, x.view(), w.view(), b.view(), &params)
                .unwrap();
        assert_eq!(reference.dim(), (2, 4, 6));
        for strategy in [ConvStrategy::Fft, ConvStrategy::FftPow2] {
            let (out, _) =
                conv1d_forward(&ctx, strategy, x.view(), w.view(), b.view(), &params).unwrap();
            for (a, r) in out.iter().zip(reference.iter()) {
                assert!((a - r).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_conv2d_strategies_agree() {
        let x = Array::from_shape_fn((1, 2, 6, 5), |(_, c, i, j)| ((c + i * j) % 4) as f64 - 1.5);
        let w = Array::from_shape_fn((3, 2, 2, 3), |(f, c, i, j)| ((f + c + i + j) % 3) as f64);
        let b = array![1.0, 0.0, -1.0];
        let params = ConvParams::with_mode(PaddingMode::Full);
        let ctx = ExecutionContext::cpu();
        let (reference, cache) =
            conv2d_forward(&ctx, ConvStrategy::Direct, x.view(), w.view(), b.view(), &params)
                .unwrap();
        assert_eq!(reference.dim(), (1, 3, 7, 7));
        assert_eq!(cache.weights().dim(), (3, 2, 2, 3));
        for strategy in [ConvStrategy::Fft, ConvStrategy::FftPow2] {
            let (out, _) =
                conv2d_forward(&ctx, strategy, x.view(), w.view(), b.view(), &params).unwrap();
            for (a, r) in out.iter().zip(reference.iter()) {
                assert!((a - r).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_rejects_mismatched_shapes() {
        let ctx = ExecutionContext::cpu();
        let params = ConvParams::default();
        let x = Array3::<f64>::zeros((1, 2, 8));
        let w = Array3::<f64>::zeros((1, 3, 2));
        let b = array![0.0];
        let err = conv1d_forward(&ctx, ConvStrategy::Fft, x.view(), w.view(), b.view(), &params)
            .unwrap_err();
        assert!(matches!(err, ConvError::InvalidConfiguration(_)));

        let w = Array3::<f64>::zeros((2, 2, 2));
        let err = conv1d_forward(&ctx, ConvStrategy::Fft, x.view(), w.view(), b.view(), &params);
        assert!(err.is_err());
    }

    #[test]
    fn test_rejects_zero_stride_and_accelerator() {
        let x = Array3::<f64>::ones((1, 1, 8));
        let w = Array3::<f64>::ones((1, 1, 2));
        let b = array![0.0];
        let params = ConvParams {
            stride: 0,
            ..Default::default()
        };
        let cpu = ExecutionContext::cpu();
        let strategy = ConvStrategy::Direct;
        assert!(conv1d_forward(&cpu, strategy, x.view(), w.view(), b.view(), &params).is_err());
        assert!(conv1d_forward(
            &ExecutionContext::accelerator(),
            strategy,
            x.view(),
            w.view(),
            b.view(),
            &ConvParams::default()
        )
        .is_err());
    }

    #[test]
    fn test_rejects_huge_explicit_padding() {
        let ctx = ExecutionContext::cpu();
        let params = ConvParams {
            stride: 1,
            pad: Pad::Zeros(usize::MAX / 2 + 1),
        };
        let x = Array3::<f64>::ones((1, 1, 4));
        let w = Array3::<f64>::ones((1, 1, 2));
        let b = array![0.0];
        for strategy in ConvStrategy::ALL {
            let err = conv1d_forward(&ctx, strategy, x.view(), w.view(), b.view(), &params)
                .unwrap_err();
            assert!(matches!(err, ConvError::InvalidConfiguration(_)));
        }

        let x = Array4::<f64>::ones((1, 1, 4, 4));
        let w = Array4::<f64>::ones((1, 1, 2, 2));
        let out = conv2d_forward(&ctx, ConvStrategy::Fft, x.view(), w.view(), b.view(), &params);
        assert!(out.is_err());
    }
}
