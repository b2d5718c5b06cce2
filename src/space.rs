//! Geometry primitives: points, unit directions and their distances.
//!
//! `Coordinate` is a plain 3-vector in meters. `Orientation` wraps a
//! 3-vector that is renormalized to unit length at every construction and
//! mutation, so the unit-norm invariant holds at the type level instead of
//! being re-checked by consumers.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

use crate::error::{PropagationError, Result};

/// A point (or displacement) in 3D space, in meters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Coordinate {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean norm of the vector.
    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        (*other - *self).norm()
    }
}

impl Add for Coordinate {
    type Output = Coordinate;

    fn add(self, rhs: Coordinate) -> Coordinate {
        Coordinate::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Coordinate {
    type Output = Coordinate;

    fn sub(self, rhs: Coordinate) -> Coordinate {
        Coordinate::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl From<[f64; 3]> for Coordinate {
    fn from(v: [f64; 3]) -> Self {
        Coordinate::new(v[0], v[1], v[2])
    }
}

/// Coordinate planes used for ground-projection distances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plane {
    /// The horizontal (ground) plane; z is zeroed.
    Xy,
    /// The xz plane; y is zeroed.
    Xz,
    /// The yz plane; x is zeroed.
    Yz,
}

impl Plane {
    /// Project a point onto this plane by zeroing the orthogonal axis.
    pub fn project(&self, p: &Coordinate) -> Coordinate {
        match self {
            Plane::Xy => Coordinate::new(p.x, p.y, 0.0),
            Plane::Xz => Coordinate::new(p.x, 0.0, p.z),
            Plane::Yz => Coordinate::new(0.0, p.y, p.z),
        }
    }
}

/// Euclidean distance between two points.
pub fn distance(p1: &Coordinate, p2: &Coordinate) -> f64 {
    p1.distance_to(p2)
}

/// Distance between the projections of two points onto `plane`.
///
/// Used for the horizontal source–receiver distance of the ground-effect
/// model (`plane = Plane::Xy`).
pub fn projected_distance(plane: Plane, p1: &Coordinate, p2: &Coordinate) -> f64 {
    plane.project(p1).distance_to(&plane.project(p2))
}

/// A direction in 3D space, always of unit length.
///
/// Construction fails with [`PropagationError::DegenerateOrientation`] when
/// the raw vector has zero norm; any other input is normalized. Mutation
/// goes through [`Orientation::set`], which renormalizes, so the invariant
/// ‖v‖ = 1 cannot be broken from outside.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 3]", into = "[f64; 3]")]
pub struct Orientation {
    x: f64,
    y: f64,
    z: f64,
}

impl Orientation {
    /// Build a unit direction from a raw (not all zero) vector.
    pub fn new(x: f64, y: f64, z: f64) -> Result<Self> {
        let norm = (x * x + y * y + z * z).sqrt();
        if norm == 0.0 {
            return Err(PropagationError::DegenerateOrientation { x, y, z });
        }
        Ok(Self {
            x: x / norm,
            y: y / norm,
            z: z / norm,
        })
    }

    /// Replace the direction, renormalizing the new raw vector.
    pub fn set(&mut self, x: f64, y: f64, z: f64) -> Result<()> {
        *self = Orientation::new(x, y, z)?;
        Ok(())
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn z(&self) -> f64 {
        self.z
    }

    /// The direction as a plain (unit-length) vector.
    pub fn as_coordinate(&self) -> Coordinate {
        Coordinate::new(self.x, self.y, self.z)
    }
}

impl TryFrom<[f64; 3]> for Orientation {
    type Error = PropagationError;

    fn try_from(v: [f64; 3]) -> Result<Self> {
        Orientation::new(v[0], v[1], v[2])
    }
}

impl From<Orientation> for [f64; 3] {
    fn from(o: Orientation) -> [f64; 3] {
        [o.x, o.y, o.z]
    }
}

impl TryFrom<Coordinate> for Orientation {
    type Error = PropagationError;

    fn try_from(c: Coordinate) -> Result<Self> {
        Orientation::new(c.x, c.y, c.z)
    }
}

/// Anything placed in the venue with a position and an orientation.
///
/// Sources and receivers both implement this; position and orientation are
/// exclusively owned by the implementing entity, so the unit-norm
/// orientation invariant cannot be broken through aliasing.
pub trait Object3D {
    fn position(&self) -> &Coordinate;
    fn orientation(&self) -> &Orientation;

    /// 3D distance to another placed object, in m.
    fn distance_to_object(&self, other: &dyn Object3D) -> f64 {
        self.position().distance_to(other.position())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn distance_is_zero_on_equal_points() {
        let p = Coordinate::new(1.5, -2.0, 3.25);
        assert!(distance(&p, &p).abs() < EPS);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Coordinate::new(1.5, 1.0, 2.8);
        let b = Coordinate::new(2.3, 9.4, 1.67);
        assert!((distance(&a, &b) - distance(&b, &a)).abs() < EPS);
    }

    #[test]
    fn euclidean_distance_matches_formula() {
        let a = Coordinate::new(1.5, 1.0, 2.8);
        let b = Coordinate::new(2.3, 9.4, 1.67);
        let expected = (0.8f64.powi(2) + 8.4f64.powi(2) + 1.13f64.powi(2)).sqrt();
        assert!((distance(&a, &b) - expected).abs() < EPS);
    }

    #[test]
    fn projection_zeroes_the_orthogonal_axis() {
        let a = Coordinate::new(0.0, 0.0, 0.0);
        let b = Coordinate::new(3.0, 4.0, 100.0);
        assert!((projected_distance(Plane::Xy, &a, &b) - 5.0).abs() < EPS);
        let c = Coordinate::new(0.0, 3.0, 4.0);
        assert!((projected_distance(Plane::Yz, &a, &c) - 5.0).abs() < EPS);
    }

    #[test]
    fn orientation_is_unit_norm_after_construction() {
        let o = Orientation::new(3.0, -4.0, 12.0).unwrap();
        let norm = o.as_coordinate().norm();
        assert!((norm - 1.0).abs() < EPS);
    }

    #[test]
    fn orientation_is_unit_norm_after_mutation() {
        let mut o = Orientation::new(0.0, 1.0, 0.0).unwrap();
        o.set(10.0, 0.0, -10.0).unwrap();
        assert!((o.as_coordinate().norm() - 1.0).abs() < EPS);
        assert!(o.y().abs() < EPS);
    }

    #[test]
    fn zero_vector_is_rejected() {
        let err = Orientation::new(0.0, 0.0, 0.0).unwrap_err();
        assert!(matches!(
            err,
            crate::error::PropagationError::DegenerateOrientation { .. }
        ));
    }

    #[test]
    fn vector_arithmetic() {
        let a = Coordinate::new(1.0, 2.0, 3.0);
        let b = Coordinate::new(0.5, -2.0, 1.0);
        assert_eq!(a + b, Coordinate::new(1.5, 0.0, 4.0));
        assert_eq!(a - b, Coordinate::new(0.5, 4.0, 2.0));
    }
}
