//! Receivers: geometry plus level evaluation against a source.
//!
//! A receiver holds only its own geometry; the atmosphere is passed
//! explicitly to every evaluation call, so one receiver can be evaluated
//! under different atmospheres. Evaluation never mutates the source or the
//! air.

use ndarray::Array1;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::air::Air;
use crate::attenuation::{self, Ground};
use crate::error::{PropagationError, Result};
use crate::level;
use crate::source::Source;
use crate::space::{projected_distance, Coordinate, Object3D, Orientation, Plane};

/// A sound receiver (microphone, listener position).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Receiver {
    position: Coordinate,
    orientation: Orientation,
}

impl Receiver {
    pub fn new(position: Coordinate, orientation: Orientation) -> Self {
        Self {
            position,
            orientation,
        }
    }

    pub fn position(&self) -> &Coordinate {
        &self.position
    }

    pub fn set_position(&mut self, position: Coordinate) {
        self.position = position;
    }

    pub fn orientation(&self) -> &Orientation {
        &self.orientation
    }

    pub fn set_orientation(&mut self, orientation: Orientation) {
        self.orientation = orientation;
    }

    /// 3D distance to a source, in m.
    pub fn distance_from_source(&self, source: &Source) -> f64 {
        self.position.distance_to(source.position())
    }

    /// Ground-plane (xy) projected distance to a source, in m.
    pub fn horizontal_distance_from_source(&self, source: &Source) -> f64 {
        projected_distance(Plane::Xy, &self.position, source.position())
    }

    fn check_bands(&self, source: &Source, air: &Air, operation: &'static str) -> Result<()> {
        if source.n_bands() != air.n_bands() {
            return Err(PropagationError::ShapeMismatch {
                operation,
                expected: air.n_bands(),
                found: source.n_bands(),
            });
        }
        Ok(())
    }

    /// Sound pressure level per band from a source, via the full ISO
    /// 9613-2 composition (divergence, atmosphere, ground effect).
    ///
    /// Unrounded; apply [`level::round_db`] for presentation.
    pub fn spl_from_source(
        &self,
        source: &Source,
        air: &Air,
        ground: &Ground,
    ) -> Result<Array1<f64>> {
        self.check_bands(source, air, "spl_from_source")?;
        attenuation::total_spl(
            &source.swl(),
            air,
            self.distance_from_source(source),
            self.horizontal_distance_from_source(source),
            source.position().z,
            self.position.z,
            ground,
        )
    }

    /// Complex pressure amplitude per band from a source.
    ///
    /// # Details
    /// Magnitude is the effective pressure from [`Receiver::spl_from_source`];
    /// the phase term is `exp(−i·k·r)` with `k = 2π·f / c(air)`. Callers
    /// model coherent summation by adding the complex pressures of several
    /// sources and converting the magnitude of the sum back through
    /// [`level::spl_from_pressure`], which captures constructive and
    /// destructive interference. Summing SPL values directly is wrong and
    /// deliberately unsupported.
    pub fn pressure_from_source(
        &self,
        source: &Source,
        air: &Air,
        ground: &Ground,
    ) -> Result<Array1<Complex64>> {
        let spl = self.spl_from_source(source, air, ground)?;
        let magnitude = level::pressure_from_spl(&spl);
        let r = self.distance_from_source(source);
        let c = air.sound_speed();

        let mut pressure = Array1::zeros(magnitude.len());
        for (i, (&f, &mag)) in air.frequencies().iter().zip(magnitude.iter()).enumerate() {
            let k = 2.0 * PI * f / c;
            pressure[i] = Complex64::from_polar(mag, -k * r);
        }
        Ok(pressure)
    }

    /// Sound intensity per band from a source, in W/m².
    ///
    /// Inverse-square spreading of the source power with linear (1/m)
    /// atmospheric decay over the path.
    pub fn intensity_from_source(&self, source: &Source, air: &Air) -> Result<Array1<f64>> {
        self.check_bands(source, air, "intensity_from_source")?;
        let r = self.distance_from_source(source);
        let intensity = level::intensity_from_power(source.power(), r)?;
        Ok(&intensity * &air.absorption_per_m().mapv(|a| (-a * r).exp()))
    }

    /// Sound intensity level per band from a source, dB re 1 pW/m².
    pub fn sil_from_source(&self, source: &Source, air: &Air) -> Result<Array1<f64>> {
        let intensity = self.intensity_from_source(source, air)?;
        level::sil_from_intensity(&intensity)
    }
}

impl Object3D for Receiver {
    fn position(&self) -> &Coordinate {
        Receiver::position(self)
    }

    fn orientation(&self) -> &Orientation {
        Receiver::orientation(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn six_band_air() -> Air {
        Air::new(
            23.2,
            66.5,
            101_310.0,
            Array1::from(vec![125.0, 250.0, 500.0, 1000.0, 2000.0, 4000.0]),
        )
        .unwrap()
    }

    fn source_100db() -> Source {
        Source::from_swl(
            Coordinate::new(1.5, 1.0, 2.8),
            Orientation::new(0.0, 1.0, 0.0).unwrap(),
            Array1::from_elem(6, 100.0),
            1.0,
        )
        .unwrap()
    }

    fn receiver() -> Receiver {
        Receiver::new(
            Coordinate::new(2.3, 9.4, 1.67),
            Orientation::new(0.0, -1.0, 0.0).unwrap(),
        )
    }

    #[test]
    fn distance_from_source_matches_euclidean_formula() {
        let d = receiver().distance_from_source(&source_100db());
        let expected = (0.8f64.powi(2) + 8.4f64.powi(2) + 1.13f64.powi(2)).sqrt();
        assert!((d - expected).abs() < 1e-9);
        assert!((d - 8.5133).abs() < 1e-3);
        // Same distance through the Object3D seam
        let via_trait = receiver().distance_to_object(&source_100db());
        assert!((via_trait - d).abs() < 1e-12);
    }

    #[test]
    fn horizontal_distance_ignores_height() {
        let d = receiver().horizontal_distance_from_source(&source_100db());
        let expected = (0.8f64.powi(2) + 8.4f64.powi(2)).sqrt();
        assert!((d - expected).abs() < 1e-9);
    }

    #[test]
    fn spl_is_attenuated_below_the_power_level() {
        let spl = receiver()
            .spl_from_source(&source_100db(), &six_band_air(), &Ground::porous())
            .unwrap();
        assert_eq!(spl.len(), 6);
        for &l in spl.iter() {
            assert!(l < 100.0, "attenuation only reduces level, got {l}");
        }
    }

    #[test]
    fn band_mismatch_is_a_shape_error() {
        let air = Air::default(); // 9 bands
        let err = receiver()
            .spl_from_source(&source_100db(), &air, &Ground::hard())
            .unwrap_err();
        assert!(matches!(err, PropagationError::ShapeMismatch { .. }));
    }

    #[test]
    fn pressure_magnitude_matches_spl() {
        let air = six_band_air();
        let g = Ground::porous();
        let rec = receiver();
        let src = source_100db();
        let spl = rec.spl_from_source(&src, &air, &g).unwrap();
        let pressure = rec.pressure_from_source(&src, &air, &g).unwrap();
        let expected = level::pressure_from_spl(&spl);
        for (p, e) in pressure.iter().zip(expected.iter()) {
            assert!((p.norm() - e).abs() < 1e-12);
        }
    }

    #[test]
    fn pressure_phase_is_minus_kr() {
        let air = six_band_air();
        let rec = receiver();
        let src = source_100db();
        let r = rec.distance_from_source(&src);
        let pressure = rec
            .pressure_from_source(&src, &air, &Ground::hard())
            .unwrap();
        let k0 = 2.0 * PI * air.frequencies()[0] / air.sound_speed();
        let expected = (-k0 * r).rem_euclid(2.0 * PI);
        let got = pressure[0].arg().rem_euclid(2.0 * PI);
        assert!((got - expected).abs() < 1e-9);
    }

    #[test]
    fn coherent_equidistant_pair_doubles_pressure() {
        let air = six_band_air();
        let g = Ground::porous();
        let ori = Orientation::new(0.0, 1.0, 0.0).unwrap();
        let power = Array1::from_elem(6, 200.0);
        let src1 =
            Source::from_power(Coordinate::new(0.0, 20.0, 1.0), ori, power.clone(), 1.0).unwrap();
        let src2 =
            Source::from_power(Coordinate::new(0.0, -20.0, 1.0), ori, power, 1.0).unwrap();
        let rec = Receiver::new(Coordinate::new(0.0, 0.0, 1.0), ori);

        let p1 = rec.pressure_from_source(&src1, &air, &g).unwrap();
        let p2 = rec.pressure_from_source(&src2, &air, &g).unwrap();
        let sum = &p1 + &p2;

        let single = level::spl_from_pressure(&p1.mapv(|p| p.norm())).unwrap();
        let combined = level::spl_from_pressure(&sum.mapv(|p| p.norm())).unwrap();
        for (c, s) in combined.iter().zip(single.iter()) {
            // in phase and equidistant: amplitudes add, +20·log10(2) dB
            assert!((c - s - 6.0206).abs() < 1e-3, "got {} vs {}", c, s);
        }
    }

    #[test]
    fn intensity_and_sil_are_consistent() {
        let air = six_band_air();
        let rec = receiver();
        let src = source_100db();
        let intensity = rec.intensity_from_source(&src, &air).unwrap();
        let sil = rec.sil_from_source(&src, &air).unwrap();
        let expected = level::sil_from_intensity(&intensity).unwrap();
        for (a, b) in sil.iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
        for &i in intensity.iter() {
            assert!(i > 0.0);
        }
    }
}
