//! Lossy round trip of a real signal through a truncated spectrum

use crate::energy::{energy_cutoff, preserve_energy_with, retained_fraction, Truncation};
use crate::error::{ConvError, Result};
use crate::transform::{next_power_of_two, RustFftTransform, Transform};
use tracing::debug;

/// Result of [`compress_signal`]
#[derive(Debug, Clone, PartialEq)]
pub struct Compression {
    /// First `signal.len()` real samples of the inverse transform
    pub reconstructed: Vec<f64>,
    /// Exclusive index of the last retained positive-frequency coefficient
    pub cutoff: usize,
    /// Transform length (next power of two of the signal length)
    pub fft_len: usize,
}

/// Transform `signal`, keep `energy_rate` of its spectral energy, transform back.
///
/// With [`Truncation::HalfSpectrum`] the mirrored half is dropped, which
/// halves every non-DC, non-Nyquist component of the reconstruction.
pub fn compress_signal(
    signal: &[f64],
    energy_rate: f64,
    truncation: Truncation,
) -> Result<Compression> {
    let mut transform = RustFftTransform::new();
    compress_signal_with(&mut transform, signal, energy_rate, truncation)
}

/// [`compress_signal`] on a caller-provided transform
pub fn compress_signal_with<T: Transform + ?Sized>(
    transform: &mut T,
    signal: &[f64],
    energy_rate: f64,
    truncation: Truncation,
) -> Result<Compression> {
    if signal.is_empty() {
        return Err(ConvError::invalid("signal must be non-empty"));
    }

    let fft_len = next_power_of_two(signal.len());
    let spectrum = transform.forward(signal, fft_len);
    let cutoff = energy_cutoff(&spectrum, energy_rate)?;
    let truncated = preserve_energy_with(&spectrum, energy_rate, truncation)?;
    debug!(
        fft_len,
        cutoff,
        retained = retained_fraction(&spectrum, &truncated),
        "compressed signal"
    );

    let mut reconstructed = transform.inverse(&truncated);
    reconstructed.truncate(signal.len());
    Ok(Compression {
        reconstructed,
        cutoff,
        fft_len,
    })
}
