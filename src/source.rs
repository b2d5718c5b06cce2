//! Sound sources and the electrical signal chain that feeds them.
//!
//! A [`Source`] carries geometry plus a per-band acoustic power in Watts
//! and a directivity factor Q. The directivity factor is a required
//! constructor parameter: 1 is a free-field omnidirectional source, 2 a
//! source on a reflecting plane, and so on.
//!
//! [`SourceChain`] models the electrical path of a reinforcement system
//! (DAC → amplifier → speaker): it derives an output power from the RMS²
//! of an amplified audio waveform and builds a `Source` with it.

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{PropagationError, Result};
use crate::level;
use crate::space::{Coordinate, Object3D, Orientation};

/// Raw audio buffer: samples plus sample rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Audio {
    /// Sample amplitudes, arbitrary linear units.
    pub samples: Vec<f64>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl Audio {
    pub fn new(samples: Vec<f64>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Buffer duration in seconds.
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// A point sound source with per-band acoustic power.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    position: Coordinate,
    orientation: Orientation,
    power: Array1<f64>,
    directivity: f64,
}

impl Source {
    /// Build a source from per-band acoustic power in Watts.
    ///
    /// # Arguments
    /// * `position` - Location in meters
    /// * `orientation` - Unit emission direction
    /// * `power` - Acoustic power per frequency band, in W (> 0)
    /// * `directivity` - Directivity factor Q (> 0); 1 = omnidirectional
    pub fn from_power(
        position: Coordinate,
        orientation: Orientation,
        power: Array1<f64>,
        directivity: f64,
    ) -> Result<Self> {
        if let Some(&bad) = power.iter().find(|&&p| p <= 0.0) {
            return Err(PropagationError::Domain {
                quantity: "power",
                operation: "Source::from_power",
                value: bad,
            });
        }
        if directivity <= 0.0 {
            return Err(PropagationError::Domain {
                quantity: "directivity",
                operation: "Source::from_power",
                value: directivity,
            });
        }
        Ok(Self {
            position,
            orientation,
            power,
            directivity,
        })
    }

    /// Build a source from a per-band sound power level in dB re 1 pW.
    pub fn from_swl(
        position: Coordinate,
        orientation: Orientation,
        swl: Array1<f64>,
        directivity: f64,
    ) -> Result<Self> {
        Self::from_power(
            position,
            orientation,
            level::power_from_swl(&swl),
            directivity,
        )
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

    /// Acoustic power per band, in W.
    pub fn power(&self) -> &Array1<f64> {
        &self.power
    }

    /// Directivity factor Q.
    pub fn directivity(&self) -> f64 {
        self.directivity
    }

    /// Number of frequency bands the power is specified for.
    pub fn n_bands(&self) -> usize {
        self.power.len()
    }

    /// Sound power level per band, dB re 1 pW.
    pub fn swl(&self) -> Array1<f64> {
        level::swl_from_power(&self.power).expect("source power is validated positive")
    }
}

impl Object3D for Source {
    fn position(&self) -> &Coordinate {
        Source::position(self)
    }

    fn orientation(&self) -> &Orientation {
        Source::orientation(self)
    }
}

/// Electrical output chain: DAC, power amplifier and speaker.
///
/// Holds named audio buffers and derives the acoustic output power of a
/// buffer played through the chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceChain {
    /// DAC full-scale output voltage [V].
    dac_vout: f64,
    /// Amplifier rated power [W].
    amp_power: f64,
    /// Volume knob position, 0 (min) to 1 (max).
    amp_knob: f64,
    /// Speaker input impedance [Ω].
    speaker_impedance: f64,
    audios: HashMap<String, Audio>,
}

impl SourceChain {
    /// Build a chain, validating the knob position against [0, 1].
    pub fn new(dac_vout: f64, amp_power: f64, amp_knob: f64, speaker_impedance: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&amp_knob) {
            return Err(PropagationError::Validation {
                field: "amplifier knob",
                value: amp_knob,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(Self {
            dac_vout,
            amp_power,
            amp_knob,
            speaker_impedance,
            audios: HashMap::new(),
        })
    }

    /// Register an audio buffer under a name.
    pub fn add_audio(&mut self, name: impl Into<String>, audio: Audio) {
        self.audios.insert(name.into(), audio);
    }

    /// Fetch a registered audio buffer.
    pub fn audio(&self, name: &str) -> Option<&Audio> {
        self.audios.get(name)
    }

    /// Chain amplitude gain applied to the waveform.
    fn gain(&self) -> f64 {
        self.dac_vout * self.amp_knob * (self.amp_power / self.speaker_impedance).sqrt()
    }

    /// Output power of a named buffer through the chain: RMS² of the
    /// amplified waveform.
    pub fn output_power(&self, name: &str) -> Result<f64> {
        let audio = self
            .audios
            .get(name)
            .ok_or_else(|| PropagationError::UnknownAudio {
                name: name.to_string(),
            })?;
        let gain = self.gain();
        let amplified: Vec<f64> = audio.samples.iter().map(|s| s * gain).collect();
        Ok(level::power_from_wave(&amplified))
    }

    /// Build a [`Source`] whose per-band power is the chain output power
    /// of the named buffer, broadcast over `n_bands` bands.
    pub fn source(
        &self,
        name: &str,
        position: Coordinate,
        orientation: Orientation,
        directivity: f64,
        n_bands: usize,
    ) -> Result<Source> {
        let power = self.output_power(name)?;
        Source::from_power(
            position,
            orientation,
            Array1::from_elem(n_bands, power),
            directivity,
        )
    }
}
