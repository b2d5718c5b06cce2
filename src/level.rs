//! Level conversions between dB quantities and their physical units.
//!
//! All conversions are pure, elementwise-over-array functions, each the
//! exact algebraic inverse of its counterpart:
//!
//! | Forward | Inverse | Reference |
//! |---|---|---|
//! | SPL = 20·log10(p / 2e-5) | p = 2e-5·10^(L/20) | 2×10⁻⁵ Pa |
//! | SWL = 10·log10(P / 1e-12) | P = 1e-12·10^(L/10) | 10⁻¹² W |
//! | SIL = 10·log10(I / 1e-12) | I = 1e-12·10^(L/10) | 10⁻¹² W/m² |
//!
//! The conversions are never rounded; [`round_db`] is a separate, lossy
//! presentation step so round-trips hold at floating precision.

use ndarray::Array1;

use crate::error::{PropagationError, Result};

/// Reference sound pressure, 20 µPa.
pub const REF_PRESSURE: f64 = 2e-5;
/// Reference sound power, 1 pW.
pub const REF_POWER: f64 = 1e-12;
/// Reference sound intensity, 1 pW/m².
pub const REF_INTENSITY: f64 = 1e-12;

fn check_positive(
    values: &Array1<f64>,
    quantity: &'static str,
    operation: &'static str,
) -> Result<()> {
    if let Some(&bad) = values.iter().find(|&&v| v <= 0.0) {
        return Err(PropagationError::Domain {
            quantity,
            operation,
            value: bad,
        });
    }
    Ok(())
}

fn check_distance(distance: f64, operation: &'static str) -> Result<()> {
    if distance <= 0.0 {
        return Err(PropagationError::Domain {
            quantity: "distance",
            operation,
            value: distance,
        });
    }
    Ok(())
}

/// Sound pressure level from effective sound pressure given in Pa.
pub fn spl_from_pressure(pressure: &Array1<f64>) -> Result<Array1<f64>> {
    check_positive(pressure, "pressure", "spl_from_pressure")?;
    Ok(pressure.mapv(|p| 20.0 * (p / REF_PRESSURE).log10()))
}

/// Effective sound pressure, in Pa, from sound pressure level.
pub fn pressure_from_spl(spl: &Array1<f64>) -> Array1<f64> {
    spl.mapv(|l| REF_PRESSURE * 10f64.powf(l / 20.0))
}

/// Sound power level from sound power given in W.
pub fn swl_from_power(power: &Array1<f64>) -> Result<Array1<f64>> {
    check_positive(power, "power", "swl_from_power")?;
    Ok(power.mapv(|p| 10.0 * (p / REF_POWER).log10()))
}

/// Sound power, in W, from sound power level.
pub fn power_from_swl(swl: &Array1<f64>) -> Array1<f64> {
    swl.mapv(|l| REF_POWER * 10f64.powf(l / 10.0))
}

/// Sound intensity level from sound intensity given in W/m².
pub fn sil_from_intensity(intensity: &Array1<f64>) -> Result<Array1<f64>> {
    check_positive(intensity, "intensity", "sil_from_intensity")?;
    Ok(intensity.mapv(|i| 10.0 * (i / REF_INTENSITY).log10()))
}

/// Sound intensity, in W/m², from sound intensity level.
pub fn intensity_from_sil(sil: &Array1<f64>) -> Array1<f64> {
    sil.mapv(|l| REF_INTENSITY * 10f64.powf(l / 10.0))
}

/// Sound intensity at `distance` m away from a point source of `power` W.
///
/// # Formula
/// I = P / (4π·r²) — inverse-square spreading.
pub fn intensity_from_power(power: &Array1<f64>, distance: f64) -> Result<Array1<f64>> {
    check_positive(power, "power", "intensity_from_power")?;
    check_distance(distance, "intensity_from_power")?;
    let spread = 4.0 * std::f64::consts::PI * distance * distance;
    Ok(power.mapv(|p| p / spread))
}

/// Sound pressure level at `distance` m away from a point source with
/// sound power level `swl` and directivity factor `q`.
///
/// # Formula
/// SPL = SWL − |10·log10(Q / (4π·r²))| — free-field point-source
/// approximation.
pub fn spl_from_swl(swl: &Array1<f64>, q: f64, distance: f64) -> Result<Array1<f64>> {
    if q <= 0.0 {
        return Err(PropagationError::Domain {
            quantity: "directivity",
            operation: "spl_from_swl",
            value: q,
        });
    }
    check_distance(distance, "spl_from_swl")?;
    let diff = (10.0 * (q / (4.0 * std::f64::consts::PI * distance * distance)).log10()).abs();
    Ok(swl.mapv(|l| l - diff))
}

/// Scalar sound power from a waveform: the mean of squared samples (RMS²).
pub fn power_from_wave(wave: &[f64]) -> f64 {
    if wave.is_empty() {
        return 0.0;
    }
    wave.iter().map(|s| s * s).sum::<f64>() / wave.len() as f64
}

/// Round dB levels to one decimal for presentation.
///
/// Lossy, opt-in display convention; never applied inside the core
/// conversions.
pub fn round_db(levels: &Array1<f64>) -> Array1<f64> {
    levels.mapv(|l| (l * 10.0).round() / 10.0)
}
