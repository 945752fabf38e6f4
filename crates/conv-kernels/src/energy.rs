//! Energy-preserving spectral truncation
//!
//! Only the unique positive frequencies of a real signal's spectrum are
//! inspected: indices `1..ceil(N/2)`. The DC term and, for even `N`, the
//! Nyquist term at `N/2` are always kept and never counted toward the budget.
//!
//! [`Truncation::HalfSpectrum`] zeroes the whole mirrored upper half, so the
//! result is not Hermitian and its inverse transform is not real. Callers that
//! need a real reconstruction use [`Truncation::Mirrored`].

use crate::error::{ConvError, Result};
use rustfft::num_complex::Complex64;
use tracing::debug;

/// Fraction of spectral energy to retain, in `(0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct EnergyRate(f64);

impl EnergyRate {
    /// Validate a raw rate
    pub fn new(rate: f64) -> Result<Self> {
        if rate > 0.0 && rate <= 1.0 {
            Ok(Self(rate))
        } else {
            Err(ConvError::invalid(format!(
                "energy rate {} is outside (0, 1]",
                rate
            )))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Whether every coefficient is retained
    pub fn is_full(self) -> bool {
        self.0 >= 1.0
    }
}

impl TryFrom<f64> for EnergyRate {
    type Error = ConvError;

    fn try_from(rate: f64) -> Result<Self> {
        Self::new(rate)
    }
}

/// What happens to the mirrored upper half of the spectrum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Truncation {
    /// Keep the lower half up to the cutoff, zero everything above it
    #[default]
    HalfSpectrum,
    /// Also keep the conjugate mirror of every retained coefficient
    Mirrored,
}

/// One past the last inspected index
fn band_end(len: usize) -> usize {
    (len + 1) / 2
}

fn nyquist_index(len: usize) -> Option<usize> {
    (len >= 2 && len % 2 == 0).then_some(len / 2)
}

/// Energy of the inspected band (`|X[k]|²` summed over `1..ceil(N/2)`)
pub fn band_energy(spectrum: &[Complex64]) -> f64 {
    spectrum
        .iter()
        .take(band_end(spectrum.len()))
        .skip(1)
        .map(|c| c.norm_sqr())
        .sum()
}

/// Share of `original`'s band energy still present in `truncated`
pub fn retained_fraction(original: &[Complex64], truncated: &[Complex64]) -> f64 {
    let full = band_energy(original);
    if full == 0.0 {
        return 1.0;
    }
    band_energy(truncated) / full
}

/// Exclusive cutoff index: indices `1..cutoff` hold at least
/// `energy_rate` of the band energy.
///
/// Non-decreasing in `energy_rate`; `1` when the band is empty or silent.
pub fn energy_cutoff(spectrum: &[Complex64], energy_rate: f64) -> Result<usize> {
    let rate = EnergyRate::new(energy_rate)?;
    if spectrum.is_empty() {
        return Err(ConvError::invalid("spectrum must be non-empty"));
    }

    let end = band_end(spectrum.len());
    let squared_abs: Vec<f64> = spectrum[1..end].iter().map(|c| c.norm_sqr()).collect();
    let full_energy: f64 = squared_abs.iter().sum();
    let preserved_energy = full_energy * rate.value();

    let mut current_energy = 0.0;
    let mut index = 0;
    while current_energy < preserved_energy && index < squared_abs.len() {
        current_energy += squared_abs[index];
        index += 1;
    }
    // Offset past the DC term
    Ok(index + 1)
}

/// Zero every coefficient past the energy cutoff (DC and Nyquist kept).
///
/// `energy_rate == 1.0` returns the input unchanged.
pub fn preserve_energy(spectrum: &[Complex64], energy_rate: f64) -> Result<Vec<Complex64>> {
    preserve_energy_with(spectrum, energy_rate, Truncation::HalfSpectrum)
}

/// [`preserve_energy`] with an explicit treatment of the upper half
pub fn preserve_energy_with(
    spectrum: &[Complex64],
    energy_rate: f64,
    truncation: Truncation,
) -> Result<Vec<Complex64>> {
    let cutoff = energy_cutoff(spectrum, energy_rate)?;
    if EnergyRate::new(energy_rate)?.is_full() {
        return Ok(spectrum.to_vec());
    }

    let len = spectrum.len();
    let mut truncated = vec![Complex64::new(0.0, 0.0); len];
    truncated[..cutoff].copy_from_slice(&spectrum[..cutoff]);
    if let Some(nyquist) = nyquist_index(len) {
        truncated[nyquist] = spectrum[nyquist];
    }
    if truncation == Truncation::Mirrored {
        for k in 1..cutoff {
            truncated[len - k] = spectrum[len - k];
        }
    }

    debug!(
        len,
        cutoff,
        energy_rate,
        ?truncation,
        "truncated spectrum"
    );
    Ok(truncated)
}
