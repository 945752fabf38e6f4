//! Padding, stride and execution context parameters

use crate::error::{ConvError, Result};
use serde::{Deserialize, Serialize};

/// Output-size convention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaddingMode {
    /// Only fully-overlapping windows: `signal - filter + 1` outputs
    Valid,
    /// Every partial overlap: `signal + filter - 1` outputs
    Full,
}

impl PaddingMode {
    /// Zeros added on each side of the signal for a filter of `filter_len`
    pub fn padding(self, filter_len: usize) -> usize {
        match self {
            PaddingMode::Valid => 0,
            PaddingMode::Full => filter_len.saturating_sub(1),
        }
    }

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            PaddingMode::Valid => "valid",
            PaddingMode::Full => "full",
        }
    }
}

/// Zero padding applied before sliding the filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pad {
    /// Derive the padding from the filter length
    Mode(PaddingMode),
    /// Explicit number of zeros on each side
    Zeros(usize),
}

impl Pad {
    /// Resolve to a zero count for a filter extent
    pub fn resolve(self, filter_len: usize) -> usize {
        match self {
            Pad::Mode(mode) => mode.padding(filter_len),
            Pad::Zeros(p) => p,
        }
    }
}

impl From<PaddingMode> for Pad {
    fn from(mode: PaddingMode) -> Self {
        Pad::Mode(mode)
    }
}

/// Layer configuration record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvParams {
    /// Step between consecutive windows (>= 1)
    pub stride: usize,
    /// Zero padding on each side
    pub pad: Pad,
}

impl Default for ConvParams {
    fn default() -> Self {
        Self {
            stride: 1,
            pad: Pad::Mode(PaddingMode::Valid),
        }
    }
}

impl ConvParams {
    /// Stride-1 params for a padding mode
    pub fn with_mode(mode: PaddingMode) -> Self {
        Self {
            stride: 1,
            pad: mode.into(),
        }
    }

    /// Reject a zero stride
    pub fn validate(&self) -> Result<()> {
        if self.stride == 0 {
            return Err(ConvError::invalid("stride must be a positive integer"));
        }
        Ok(())
    }
}

/// Largest padded extent a kernel will allocate along one axis
pub const MAX_AXIS_LEN: usize = isize::MAX as usize / std::mem::size_of::<[f64; 2]>();

/// `signal_len + 2 * pad`, rejected when it overflows or exceeds [`MAX_AXIS_LEN`]
pub fn padded_len(signal_len: usize, pad: usize) -> Result<usize> {
    pad.checked_mul(2)
        .and_then(|both| both.checked_add(signal_len))
        .filter(|&padded| padded <= MAX_AXIS_LEN)
        .ok_or_else(|| {
            ConvError::invalid(format!(
                "padding {} on a signal of length {} exceeds the supported extent",
                pad, signal_len
            ))
        })
}

/// Number of outputs along one axis after padding and striding.
pub fn output_len(
    signal_len: usize,
    filter_len: usize,
    pad: usize,
    stride: usize,
) -> Result<usize> {
    if stride == 0 {
        return Err(ConvError::invalid("stride must be a positive integer"));
    }
    if signal_len == 0 || filter_len == 0 {
        return Err(ConvError::invalid("signal and filter must be non-empty"));
    }
    let padded = padded_len(signal_len, pad)?;
    if filter_len > padded {
        return Err(ConvError::invalid(format!(
            "filter length {} exceeds padded signal length {}",
            filter_len, padded
        )));
    }
    Ok((padded - filter_len) / stride + 1)
}

/// Execution target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Device {
    #[default]
    Cpu,
    Accelerator,
}

/// Explicit execution context passed into every layer call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExecutionContext {
    pub device: Device,
}

impl ExecutionContext {
    /// Host CPU context
    pub fn cpu() -> Self {
        Self { device: Device::Cpu }
    }

    /// Context targeting an accelerator
    pub fn accelerator() -> Self {
        Self {
            device: Device::Accelerator,
        }
    }

    /// Whether kernels can run in this context. Only host kernels are built.
    pub fn is_available(&self) -> bool {
        matches!(self.device, Device::Cpu)
    }

    /// Fail fast when the context cannot run kernels
    pub fn ensure_available(&self) -> Result<()> {
        if self.is_available() {
            Ok(())
        } else {
            Err(ConvError::invalid(format!(
                "no kernels available for device {:?}",
                self.device
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padding_per_mode() {
        assert_eq!(PaddingMode::Valid.padding(4), 0);
        assert_eq!(PaddingMode::Full.padding(4), 3);
        assert_eq!(PaddingMode::Full.padding(1), 0);
    }

    #[test]
    fn test_output_len_shape_law() {
        assert_eq!(output_len(16, 4, 0, 1).unwrap(), 13);
        assert_eq!(output_len(16, 4, 3, 1).unwrap(), 19);
        assert_eq!(output_len(10, 3, 1, 2).unwrap(), 5);
    }

    #[test]
    fn test_output_len_rejects_bad_config() {
        assert!(output_len(3, 4, 0, 1).is_err());
        assert!(output_len(8, 3, 0, 0).is_err());
        assert!(output_len(0, 1, 0, 1).is_err());
        // Full padding makes a longer filter legal
        assert_eq!(output_len(3, 4, 3, 1).unwrap(), 6);
    }

    #[test]
    fn test_oversized_padding_is_rejected() {
        assert_eq!(padded_len(5, 2).unwrap(), 9);
        for pad in [usize::MAX / 2 + 1, usize::MAX, MAX_AXIS_LEN] {
            assert!(matches!(
                output_len(2, 1, pad, 1),
                Err(ConvError::InvalidConfiguration(_))
            ));
        }
        assert!(padded_len(MAX_AXIS_LEN, 0).is_ok());
        assert!(padded_len(MAX_AXIS_LEN, 1).is_err());
    }

    #[test]
    fn test_params_validate() {
        assert!(ConvParams::default().validate().is_ok());
        let params = ConvParams {
            stride: 0,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ConvError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_execution_context() {
        assert!(ExecutionContext::cpu().ensure_available().is_ok());
        assert!(ExecutionContext::default().is_available());
        assert!(ExecutionContext::accelerator().ensure_available().is_err());
    }
}
