#![doc = include_str!("../README.md")]

/// Air properties and atmospheric absorption.
pub mod air;
/// ISO 9613-2 attenuation terms and their composition.
pub mod attenuation;
/// Error types for propagation operations.
pub mod error;
/// Receiver lattices for bulk field evaluation.
pub mod grid;
/// dB-domain level conversions.
pub mod level;
/// Receivers and per-source evaluation.
pub mod receiver;
/// Sources and the electrical signal chain.
pub mod source;
/// Points, unit directions and distances.
pub mod space;

pub use air::{Air, AirProperties};
pub use attenuation::Ground;
pub use error::{PropagationError, Result};
pub use grid::ReceiversGrid;
pub use receiver::Receiver;
pub use source::{Audio, Source, SourceChain};
pub use space::{distance, projected_distance, Coordinate, Object3D, Orientation, Plane};
