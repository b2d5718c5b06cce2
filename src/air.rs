//! Air properties and atmospheric absorption.
//!
//! Sound propagates through air, and many of its properties affect the
//! propagation. This module derives the acoustically relevant properties
//! (sound speed, density, impedance, viscosity, specific heats, Prandtl
//! number) from temperature, relative humidity and atmospheric pressure
//! using the Pierce empirical fits, and the frequency-dependent absorption
//! coefficient using the ISO 9613-1 / ANSI S1.26 two-relaxation-process
//! model (N2 and O2 molecular relaxation).

use log::debug;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::{PropagationError, Result};

/// Valid temperature range, degrees Celsius.
pub const TEMPERATURE_RANGE: (f64, f64) = (0.0, 50.0);
/// Valid relative humidity range, percent.
pub const HUMIDITY_RANGE: (f64, f64) = (0.0, 100.0);
/// Valid atmospheric pressure range, Pascals.
pub const PRESSURE_RANGE: (f64, f64) = (90_000.0, 115_000.0);

/// Default octave band center frequencies, 63 Hz to 16 kHz.
pub const DEFAULT_BANDS: [f64; 9] = [
    63.0, 125.0, 250.0, 500.0, 1000.0, 2000.0, 4000.0, 8000.0, 16000.0,
];

/// Derived air properties, a pure function of (temperature, humidity,
/// pressure). Snapshot semantics: values are only updated by an explicit
/// [`Air::recalculate`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AirProperties {
    /// Sound speed [m/s].
    pub sound_speed: f64,
    /// Volumetric density [kg/m³].
    pub density: f64,
    /// Characteristic impedance, sound speed times density [rayl].
    pub impedance: f64,
    /// Dynamic viscosity [N·s/m²].
    pub viscosity: f64,
    /// Thermal conductivity [W/(m·K)].
    pub thermal_conductivity: f64,
    /// Specific heat at constant pressure [J/(kg·K)].
    pub spec_heat_cp: f64,
    /// Specific heat at constant volume [J/(kg·K)].
    pub spec_heat_cv: f64,
    /// Ratio of specific heats Cp/Cv [-].
    pub spec_heat_ratio: f64,
    /// Prandtl number [-].
    pub prandtl: f64,
}

/// Calculate the acoustically relevant air properties.
///
/// # Arguments
/// * `temp` - Temperature in °C
/// * `hum` - Relative humidity in %
/// * `atm` - Atmospheric pressure in Pa
///
/// # Details
/// Polynomial fits from Pierce, "Acoustics: An Introduction to Its Physical
/// Principles and Applications". Valid for the ranges enforced by
/// [`Air::new`]; the function itself is total over finite inputs.
pub fn properties(temp: f64, hum: f64, atm: f64) -> AirProperties {
    let thermal_conductivity = 0.026; // W/(m·K)
    let t = temp + 273.16; // K
    let air_const = 287.031; // J/(kg·K), dry air
    let h2o_const = 461.521; // J/(kg·K), water vapor

    // Saturation vapor pressure polynomial (Pierce)
    let pierce =
        0.0658 * t.powi(3) - 53.7558 * t.powi(2) + 14_703.8127 * t - 1_345_485.0465;

    let viscosity = 7.72488e-8 * t - 5.95238e-11 * t.powi(2) + 2.71368e-14 * t.powi(3);

    // Valid for 260 K < T < 600 K
    let spec_heat_cp = 4168.8
        * (0.249679 - 7.55179e-5 * t + 1.69194e-7 * t.powi(2) - 6.46128e-11 * t.powi(3));
    let spec_heat_cv = spec_heat_cp - air_const;
    let spec_heat_ratio = spec_heat_cp / spec_heat_cv;
    let prandtl = viscosity * spec_heat_cp / thermal_conductivity;

    let density =
        atm / (air_const * t) - (1.0 / air_const - 1.0 / h2o_const) * hum / 100.0 * pierce / t;
    let sound_speed = (spec_heat_ratio * atm / density).sqrt();

    AirProperties {
        sound_speed,
        density,
        impedance: sound_speed * density,
        viscosity,
        thermal_conductivity,
        spec_heat_cp,
        spec_heat_cv,
        spec_heat_ratio,
        prandtl,
    }
}

/// Calculate the atmospheric absorption coefficient per frequency.
///
/// # Arguments
/// * `temp` - Temperature in °C
/// * `hum` - Relative humidity in %
/// * `atm` - Atmospheric pressure in Pa
/// * `freqs` - Frequencies of analysis in Hz
///
/// # Returns
/// `(per_meter, db_per_meter)` arrays, same length and order as `freqs`.
///
/// # Details
/// Two-relaxation-process model of ISO 9613-1 / ANSI S1.26: classical
/// (translational) absorption plus nitrogen and oxygen molecular
/// relaxation, each with a humidity- and pressure-dependent relaxation
/// frequency. The dB/m coefficient converts to 1/m by dividing by
/// 20·log10(e).
pub fn absorption(temp: f64, hum: f64, atm: f64, freqs: &Array1<f64>) -> (Array1<f64>, Array1<f64>) {
    let t0 = 293.15; // reference temperature [K]
    let t01 = 273.16; // triple point [K]
    let t = temp + 273.15; // input temperature [K]
    let ps0 = 1.01325e5; // 1 atm [Pa]

    // Molar concentration of water vapor from saturation pressure
    let csat = -6.8346 * (t01 / t).powf(1.261) + 4.6151;
    let rhosat = 10f64.powf(csat);
    let h = rhosat * hum * ps0 / atm;

    // N2 relaxation frequency [Hz]
    let fr_n2 = (atm / ps0)
        * (t0 / t).sqrt()
        * (9.0 + 280.0 * h * (-4.17 * ((t0 / t).powf(1.0 / 3.0) - 1.0)).exp());

    // O2 relaxation frequency [Hz]
    let fr_o2 = (atm / ps0) * (24.0 + 4.04e4 * h * (0.02 + h) / (0.391 + h));

    // Absorption in nepers/m, then dB/m and 1/m
    let db_per_m = freqs.mapv(|f| {
        let f2 = f * f;
        let alpha = f2
            * (1.84e-11 / ((t0 / t).sqrt() * atm / ps0)
                + (t / t0).powf(-2.5)
                    * (0.10680 * (-3352.0 / t).exp() * fr_n2 / (f2 + fr_n2 * fr_n2)
                        + 0.01278 * (-2293.1 / t).exp() * fr_o2 / (f2 + fr_o2 * fr_o2)));
        20.0 * alpha / std::f64::consts::LN_10
    });
    let per_m = &db_per_m / (20.0 * std::f64::consts::E.log10());

    (per_m, db_per_m)
}

fn check_range(field: &'static str, value: f64, range: (f64, f64)) -> Result<f64> {
    if !(range.0..=range.1).contains(&value) {
        return Err(PropagationError::Validation {
            field,
            value,
            min: range.0,
            max: range.1,
        });
    }
    Ok(value)
}

/// Atmosphere snapshot: validated base parameters plus derived properties
/// and a per-band absorption coefficient array.
///
/// Setters validate and store the base parameters but do not re-derive;
/// callers must invoke [`Air::recalculate`] explicitly afterwards. The
/// invariant that the absorption arrays match the stored frequency set in
/// length and order is maintained by recomputing both together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Air {
    temperature: f64,
    humidity: f64,
    pressure: f64,
    frequencies: Array1<f64>,
    props: AirProperties,
    absorption_per_m: Array1<f64>,
    absorption_db_per_m: Array1<f64>,
}

impl Air {
    /// Build an atmosphere and derive its properties.
    ///
    /// # Arguments
    /// * `temp` - Temperature in °C, within [0, 50]
    /// * `hum` - Relative humidity in %, within [0, 100]
    /// * `atm` - Atmospheric pressure in Pa, within [90 000, 115 000]
    /// * `freqs` - Frequencies of analysis in Hz
    ///
    /// # Errors
    /// [`PropagationError::Validation`] naming the offending field when a
    /// parameter is outside its physical range.
    pub fn new(temp: f64, hum: f64, atm: f64, freqs: Array1<f64>) -> Result<Self> {
        let temperature = check_range("temperature", temp, TEMPERATURE_RANGE)?;
        let humidity = check_range("humidity", hum, HUMIDITY_RANGE)?;
        let pressure = check_range("atmospheric pressure", atm, PRESSURE_RANGE)?;

        let props = properties(temperature, humidity, pressure);
        let (absorption_per_m, absorption_db_per_m) =
            absorption(temperature, humidity, pressure, &freqs);

        Ok(Self {
            temperature,
            humidity,
            pressure,
            frequencies: freqs,
            props,
            absorption_per_m,
            absorption_db_per_m,
        })
    }

    /// Re-derive properties and absorption from the current base
    /// parameters and frequency set.
    ///
    /// Pure re-derivation: calling this twice with unchanged inputs yields
    /// identical outputs.
    pub fn recalculate(&mut self) {
        debug!(
            "recalculating air properties: {} °C, {} %, {} Pa, {} bands",
            self.temperature,
            self.humidity,
            self.pressure,
            self.frequencies.len()
        );
        self.props = properties(self.temperature, self.humidity, self.pressure);
        let (per_m, db_per_m) = absorption(
            self.temperature,
            self.humidity,
            self.pressure,
            &self.frequencies,
        );
        self.absorption_per_m = per_m;
        self.absorption_db_per_m = db_per_m;
    }

    /// Temperature in °C.
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Set the temperature. Derived state is stale until [`Air::recalculate`].
    pub fn set_temperature(&mut self, temp: f64) -> Result<()> {
        self.temperature = check_range("temperature", temp, TEMPERATURE_RANGE)?;
        Ok(())
    }

    /// Relative humidity in %.
    pub fn humidity(&self) -> f64 {
        self.humidity
    }

    /// Set the humidity. Derived state is stale until [`Air::recalculate`].
    pub fn set_humidity(&mut self, hum: f64) -> Result<()> {
        self.humidity = check_range("humidity", hum, HUMIDITY_RANGE)?;
        Ok(())
    }

    /// Atmospheric pressure in Pa.
    pub fn pressure(&self) -> f64 {
        self.pressure
    }

    /// Set the pressure. Derived state is stale until [`Air::recalculate`].
    pub fn set_pressure(&mut self, atm: f64) -> Result<()> {
        self.pressure = check_range("atmospheric pressure", atm, PRESSURE_RANGE)?;
        Ok(())
    }

    /// Frequencies for which the absorption was calculated, in Hz.
    pub fn frequencies(&self) -> &Array1<f64> {
        &self.frequencies
    }

    /// Number of frequency bands.
    pub fn n_bands(&self) -> usize {
        self.frequencies.len()
    }

    /// Replace the frequency set. Absorption arrays are stale until
    /// [`Air::recalculate`].
    pub fn set_frequencies(&mut self, freqs: Array1<f64>) {
        self.frequencies = freqs;
    }

    /// Derived properties snapshot.
    pub fn properties(&self) -> &AirProperties {
        &self.props
    }

    /// Sound speed in m/s.
    pub fn sound_speed(&self) -> f64 {
        self.props.sound_speed
    }

    /// Characteristic impedance in rayl.
    pub fn impedance(&self) -> f64 {
        self.props.impedance
    }

    /// Absorption coefficient per band, linear [1/m].
    pub fn absorption_per_m(&self) -> &Array1<f64> {
        &self.absorption_per_m
    }

    /// Absorption coefficient per band [dB/m].
    pub fn absorption_db_per_m(&self) -> &Array1<f64> {
        &self.absorption_db_per_m
    }
}

impl Default for Air {
    /// 20 °C, 50 % humidity, 101 325 Pa, nine octave bands 63 Hz…16 kHz.
    fn default() -> Self {
        Air::new(20.0, 50.0, 101_325.0, Array1::from(DEFAULT_BANDS.to_vec()))
            .expect("default air parameters are in range")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sound_speed_near_343_at_room_conditions() {
        let props = properties(20.0, 50.0, 101_325.0);
        assert!(
            (props.sound_speed - 343.0).abs() < 3.0,
            "sound_speed={}",
            props.sound_speed
        );
        assert!((props.density - 1.2).abs() < 0.05, "density={}", props.density);
        assert!(
            (props.impedance - props.sound_speed * props.density).abs() < 1e-9
        );
    }

    #[test]
    fn spec_heat_ratio_near_1_4() {
        let props = properties(20.0, 50.0, 101_325.0);
        assert!((props.spec_heat_ratio - 1.4).abs() < 0.01);
        assert!((props.prandtl - 0.7).abs() < 0.05);
    }

    #[test]
    fn absorption_is_non_negative_and_keeps_shape() {
        let freqs = Array1::from(vec![125.0, 250.0, 500.0, 1000.0, 2000.0, 4000.0]);
        let (per_m, db_per_m) = absorption(23.2, 66.5, 101_310.0, &freqs);
        assert_eq!(per_m.len(), 6);
        assert_eq!(db_per_m.len(), 6);
        for &a in per_m.iter().chain(db_per_m.iter()) {
            assert!(a >= 0.0, "absorption must be non-negative, got {a}");
        }
    }

    #[test]
    fn absorption_grows_with_frequency() {
        let freqs = Array1::from(vec![125.0, 1000.0, 8000.0]);
        let (_, db_per_m) = absorption(20.0, 50.0, 101_325.0, &freqs);
        assert!(db_per_m[0] < db_per_m[1]);
        assert!(db_per_m[1] < db_per_m[2]);
    }

    #[test]
    fn constructor_validates_ranges() {
        let freqs = Array1::from(vec![1000.0]);
        assert!(Air::new(-1.0, 50.0, 101_325.0, freqs.clone()).is_err());
        assert!(Air::new(20.0, 101.0, 101_325.0, freqs.clone()).is_err());
        assert!(Air::new(20.0, 50.0, 80_000.0, freqs.clone()).is_err());
        assert!(Air::new(0.0, 0.0, 90_000.0, freqs).is_ok());
    }

    #[test]
    fn validation_error_names_the_field() {
        let freqs = Array1::from(vec![1000.0]);
        let err = Air::new(60.0, 50.0, 101_325.0, freqs).unwrap_err();
        assert!(err.to_string().contains("temperature"));
    }

    #[test]
    fn setters_defer_derivation_until_recalculate() {
        let mut air = Air::default();
        let speed_before = air.sound_speed();
        air.set_temperature(40.0).unwrap();
        assert_eq!(air.sound_speed(), speed_before, "setter must not re-derive");
        air.recalculate();
        assert!(air.sound_speed() > speed_before);
    }

    #[test]
    fn recalculate_is_deterministic() {
        let mut air = Air::new(
            23.2,
            66.5,
            101_310.0,
            Array1::from(vec![125.0, 1000.0, 4000.0]),
        )
        .unwrap();
        let first = air.clone();
        air.recalculate();
        air.recalculate();
        assert_eq!(air, first);
    }

    #[test]
    fn frequency_change_requires_recalculate_to_restore_alignment() {
        let mut air = Air::default();
        air.set_frequencies(Array1::from(vec![500.0, 1000.0]));
        air.recalculate();
        assert_eq!(air.absorption_db_per_m().len(), 2);
        assert_eq!(air.absorption_per_m().len(), 2);
    }
}
