//! ISO 9613-2 outdoor attenuation terms.
//!
//! Three additive loss terms make up the outdoor propagation model:
//!
//! - divergence, from geometric spreading: `Adiv = 20·log10(r) + 11`
//! - atmospheric absorption: `Aatm = α(f)·r` with α in dB/m from the air
//!   model
//! - ground effect `Agr = As + Ar + Am`: source-side, receiver-side and
//!   mean-ground corrections from the heights, the horizontal distance and
//!   the ground factors G (0 = hard, 1 = porous, in between = mixed)
//!
//! The total SPL at a receiver is `SWL − Adiv − Aatm − Agr`, per frequency
//! band. Band coefficients of the ground effect follow the standard's fixed
//! 63 Hz…8 kHz octave table; a frequency selects its row by octave
//! membership, and bands at or above 2 kHz use the simplified
//! `−1.5·(1 − G)` term.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::air::Air;
use crate::error::{PropagationError, Result};

/// Ground factors for the two endpoints and the ground between them.
///
/// Each factor is 0 for acoustically hard ground, 1 for porous ground, and
/// in between for mixed surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ground {
    /// Ground factor of the area surrounding the source.
    pub source_factor: f64,
    /// Ground factor of the area surrounding the receiver.
    pub receiver_factor: f64,
    /// Ground factor of the region between source and receiver.
    pub mean_factor: f64,
}

impl Ground {
    /// Build a ground description, validating each factor against [0, 1].
    pub fn new(source_factor: f64, receiver_factor: f64, mean_factor: f64) -> Result<Self> {
        for (field, value) in [
            ("source ground factor", source_factor),
            ("receiver ground factor", receiver_factor),
            ("mean ground factor", mean_factor),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(PropagationError::Validation {
                    field,
                    value,
                    min: 0.0,
                    max: 1.0,
                });
            }
        }
        Ok(Self {
            source_factor,
            receiver_factor,
            mean_factor,
        })
    }

    /// Acoustically hard ground everywhere (paving, water, concrete).
    pub fn hard() -> Self {
        Self {
            source_factor: 0.0,
            receiver_factor: 0.0,
            mean_factor: 0.0,
        }
    }

    /// Porous ground everywhere (grass, vegetation, farmland).
    pub fn porous() -> Self {
        Self {
            source_factor: 1.0,
            receiver_factor: 1.0,
            mean_factor: 1.0,
        }
    }
}

/// Divergence attenuation from spherical spreading.
///
/// # Formula
/// `Adiv = 20·log10(r) + 11`, r the 3D source–receiver distance in m.
pub fn divergence(r: f64) -> Result<f64> {
    if r <= 0.0 {
        return Err(PropagationError::Domain {
            quantity: "distance",
            operation: "divergence",
            value: r,
        });
    }
    Ok(20.0 * r.log10() + 11.0)
}

/// Atmospheric attenuation over `r` meters.
///
/// # Arguments
/// * `alpha_db_per_m` - Per-band absorption coefficient in dB/m
/// * `r` - 3D source–receiver distance in m
pub fn atmosphere(alpha_db_per_m: &Array1<f64>, r: f64) -> Result<Array1<f64>> {
    if r <= 0.0 {
        return Err(PropagationError::Domain {
            quantity: "distance",
            operation: "atmosphere",
            value: r,
        });
    }
    Ok(alpha_db_per_m * r)
}

fn dp(d: f64) -> f64 {
    1.0 - (-d / 50.0).exp()
}

fn c125(h: f64, d: f64) -> f64 {
    1.5 + 3.0 * (-0.12 * (h - 5.0).powi(2)).exp() * dp(d)
        + 5.7 * (-0.09 * h * h).exp() * (1.0 - (-2.8e-6 * d * d).exp())
}

fn c250(h: f64, d: f64) -> f64 {
    1.5 + 8.6 * (-0.09 * h * h).exp() * dp(d)
}

fn c500(h: f64, d: f64) -> f64 {
    1.5 + 14.0 * (-0.46 * h * h).exp() * dp(d)
}

fn c1000(h: f64, d: f64) -> f64 {
    1.5 + 5.0 * (-0.9 * h * h).exp() * dp(d)
}

// Upper octave-band edges (center·√2) for the tabulated rows.
const EDGE_63: f64 = 89.0;
const EDGE_125: f64 = 177.0;
const EDGE_250: f64 = 355.0;
const EDGE_500: f64 = 710.0;
const EDGE_1000: f64 = 1420.0;

/// Source- or receiver-side ground term for one frequency band.
fn side_term(f: f64, g: f64, h: f64, d: f64) -> f64 {
    if f < EDGE_63 {
        -1.5
    } else if f < EDGE_125 {
        -1.5 + g * c125(h, d)
    } else if f < EDGE_250 {
        -1.5 + g * c250(h, d)
    } else if f < EDGE_500 {
        -1.5 + g * c500(h, d)
    } else if f < EDGE_1000 {
        -1.5 + g * c1000(h, d)
    } else {
        -1.5 * (1.0 - g)
    }
}

/// Ground-effect attenuation per frequency band.
///
/// # Arguments
/// * `freqs` - Band center frequencies in Hz
/// * `d` - Source–receiver distance projected on the ground plane, in m
/// * `source_height` - Source height above ground, in m
/// * `receiver_height` - Receiver height above ground, in m
/// * `ground` - Ground factors at the source, the receiver and in between
///
/// # Details
/// `Agr = As + Ar + Am`. The mean term uses
/// `q = 1 − 30·(hs + hr)/d` when `d > 30·(hs + hr)`, else 0; at the 63 Hz
/// band `Am = −3q`, elsewhere `Am = −3q·(1 − Gm)`. At `d = 0` both `dp`
/// and `q` vanish, reducing the result to the height-independent terms.
pub fn ground(
    freqs: &Array1<f64>,
    d: f64,
    source_height: f64,
    receiver_height: f64,
    ground: &Ground,
) -> Array1<f64> {
    let m = 30.0 * (source_height + receiver_height);
    let q = if d > m { 1.0 - m / d } else { 0.0 };

    freqs.mapv(|f| {
        let a_s = side_term(f, ground.source_factor, source_height, d);
        let a_r = side_term(f, ground.receiver_factor, receiver_height, d);
        let a_m = if f < EDGE_63 {
            -3.0 * q
        } else {
            -3.0 * q * (1.0 - ground.mean_factor)
        };
        a_s + a_r + a_m
    })
}

/// Total SPL at a receiver from a source's per-band power level.
///
/// # Arguments
/// * `swl` - Sound power level per band, dB re 1 pW
/// * `air` - Atmosphere providing the per-band absorption
/// * `distance` - 3D source–receiver distance in m
/// * `ground_distance` - Ground-plane projected distance in m
/// * `source_height` / `receiver_height` - Heights above ground in m
/// * `ground_factors` - Ground factors
///
/// # Formula
/// `SPL = SWL − Adiv − Aatm − Agr`, per band, unrounded. Apply
/// [`crate::level::round_db`] for presentation.
///
/// # Errors
/// [`PropagationError::ShapeMismatch`] when `swl` does not align with the
/// air's band set; [`PropagationError::Domain`] for non-positive distance.
pub fn total_spl(
    swl: &Array1<f64>,
    air: &Air,
    distance: f64,
    ground_distance: f64,
    source_height: f64,
    receiver_height: f64,
    ground_factors: &Ground,
) -> Result<Array1<f64>> {
    if swl.len() != air.n_bands() {
        return Err(PropagationError::ShapeMismatch {
            operation: "total_spl",
            expected: air.n_bands(),
            found: swl.len(),
        });
    }
    let a_div = divergence(distance)?;
    let a_atm = atmosphere(air.absorption_db_per_m(), distance)?;
    let a_gr = ground(
        air.frequencies(),
        ground_distance,
        source_height,
        receiver_height,
        ground_factors,
    );
    Ok(swl - a_div - &a_atm - &a_gr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn divergence_at_one_meter_is_11_db() {
        assert!((divergence(1.0).unwrap() - 11.0).abs() < 1e-12);
        // +6 dB per doubling
        let d1 = divergence(10.0).unwrap();
        let d2 = divergence(20.0).unwrap();
        assert!((d2 - d1 - 6.0206).abs() < 1e-3);
    }

    #[test]
    fn divergence_rejects_non_positive_distance() {
        assert!(divergence(0.0).is_err());
        assert!(divergence(-1.0).is_err());
    }

    #[test]
    fn atmosphere_is_linear_in_distance() {
        let alpha = Array1::from(vec![0.001, 0.01]);
        let a = atmosphere(&alpha, 100.0).unwrap();
        assert!((a[0] - 0.1).abs() < 1e-12);
        assert!((a[1] - 1.0).abs() < 1e-12);
        assert!(atmosphere(&alpha, 0.0).is_err());
    }

    #[test]
    fn ground_factors_are_validated() {
        assert!(Ground::new(0.5, 0.0, 1.0).is_ok());
        assert!(Ground::new(-0.1, 0.0, 0.0).is_err());
        assert!(Ground::new(0.0, 1.2, 0.0).is_err());
    }

    #[test]
    fn hard_ground_at_zero_distance_reduces_to_fixed_terms() {
        // dp(0) = 0 and q = 0, so only the height-independent rows remain.
        let freqs = Array1::from(vec![63.0, 125.0, 250.0, 500.0, 1000.0, 2000.0]);
        let a = ground(&freqs, 0.0, 2.0, 1.5, &Ground::hard());
        // G = 0: every side term is -1.5, Am = 0
        for &v in a.iter() {
            assert!((v + 3.0).abs() < 1e-12, "expected -3.0, got {v}");
        }
    }

    #[test]
    fn mean_term_engages_past_30_times_height_sum() {
        let freqs = Array1::from(vec![63.0]);
        let g = Ground::porous();
        // hs + hr = 2 m, threshold 60 m
        let near = ground(&freqs, 59.0, 1.0, 1.0, &g);
        let far = ground(&freqs, 120.0, 1.0, 1.0, &g);
        // q = 0 below threshold, q = 0.5 at 120 m: Am = -1.5 at 63 Hz
        assert!((far[0] - near[0] + 1.5).abs() < 1e-9);
    }

    #[test]
    fn high_bands_use_simplified_term() {
        let freqs = Array1::from(vec![2000.0, 4000.0, 8000.0]);
        let a = ground(&freqs, 10.0, 1.0, 1.0, &Ground::porous());
        // G = 1: -1.5·(1-G) = 0 on both sides, q = 0 at 10 m
        for &v in a.iter() {
            assert!(v.abs() < 1e-12);
        }
    }

    #[test]
    fn total_spl_checks_band_alignment() {
        let air = Air::default(); // 9 bands
        let swl = Array1::from_elem(6, 100.0);
        let err = total_spl(&swl, &air, 10.0, 9.5, 2.0, 1.5, &Ground::hard()).unwrap_err();
        assert!(matches!(
            err,
            PropagationError::ShapeMismatch {
                expected: 9,
                found: 6,
                ..
            }
        ));
    }

    #[test]
    fn total_spl_subtracts_all_terms() {
        let air = Air::default();
        let swl = Array1::from_elem(air.n_bands(), 100.0);
        let g = Ground::hard();
        let spl = total_spl(&swl, &air, 10.0, 9.5, 2.0, 1.5, &g).unwrap();
        let a_div = divergence(10.0).unwrap();
        let a_atm = atmosphere(air.absorption_db_per_m(), 10.0).unwrap();
        let a_gr = ground(air.frequencies(), 9.5, 2.0, 1.5, &g);
        for i in 0..air.n_bands() {
            let expected = 100.0 - a_div - a_atm[i] - a_gr[i];
            assert!((spl[i] - expected).abs() < 1e-12);
        }
    }
}
