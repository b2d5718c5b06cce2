//! Rectangular receiver lattices for bulk SPL / pressure field evaluation.
//!
//! A grid owns its receivers, laid out row-major with y as the outer axis
//! and x as the inner axis at a fixed height z. Evaluation fans a single
//! source out over every receiver in parallel; each receiver reads only
//! its own geometry plus the shared source and air, so the parallel result
//! is identical to sequential evaluation.

use log::debug;
use ndarray::{Array1, Array3};
use num_complex::Complex64;
use rayon::prelude::*;

use crate::air::Air;
use crate::attenuation::Ground;
use crate::error::{PropagationError, Result};
use crate::receiver::Receiver;
use crate::source::Source;
use crate::space::{Coordinate, Orientation};

fn axis_steps(
    step_field: &'static str,
    extent_field: &'static str,
    min: f64,
    max: f64,
    step: f64,
) -> Result<Array1<f64>> {
    if step <= 0.0 {
        return Err(PropagationError::Validation {
            field: step_field,
            value: step,
            min: f64::MIN_POSITIVE,
            max: f64::INFINITY,
        });
    }
    if max <= min {
        return Err(PropagationError::Validation {
            field: extent_field,
            value: max - min,
            min: f64::MIN_POSITIVE,
            max: f64::INFINITY,
        });
    }
    let n = ((max - min) / step).ceil() as usize;
    Ok(Array1::from_iter((0..n).map(|i| min + i as f64 * step)))
}

/// A rectangular lattice of receivers at fixed height.
#[derive(Debug, Clone)]
pub struct ReceiversGrid {
    xs: Array1<f64>,
    ys: Array1<f64>,
    z: f64,
    receivers: Vec<Receiver>,
}

impl ReceiversGrid {
    /// Build a grid spanning `[min, max)` with the given step on each axis.
    ///
    /// # Arguments
    /// * `min_x`, `max_x`, `step_x` - x axis extent and spacing, in m
    /// * `min_y`, `max_y`, `step_y` - y axis extent and spacing, in m
    /// * `z` - Receiver height above ground, in m
    ///
    /// # Details
    /// Axis lengths are `⌈(max − min) / step⌉`. Receivers are stored
    /// row-major, y outer and x inner, all oriented along +x.
    ///
    /// # Errors
    /// [`PropagationError::Validation`] for a non-positive step or an empty
    /// extent.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        min_x: f64,
        max_x: f64,
        step_x: f64,
        min_y: f64,
        max_y: f64,
        step_y: f64,
        z: f64,
    ) -> Result<Self> {
        let xs = axis_steps("x axis step", "x axis extent", min_x, max_x, step_x)?;
        let ys = axis_steps("y axis step", "y axis extent", min_y, max_y, step_y)?;

        let orientation = Orientation::new(1.0, 0.0, 0.0).expect("+x is a valid direction");
        let mut receivers = Vec::with_capacity(xs.len() * ys.len());
        for &y in ys.iter() {
            for &x in xs.iter() {
                receivers.push(Receiver::new(Coordinate::new(x, y, z), orientation));
            }
        }
        debug!(
            "generated receiver grid: {} x {} points at z = {} m",
            ys.len(),
            xs.len(),
            z
        );
        Ok(Self {
            xs,
            ys,
            z,
            receivers,
        })
    }

    /// Rebuild the lattice with new extents. Exclusive mutation: not safe
    /// to call concurrently with reads of the same grid.
    #[allow(clippy::too_many_arguments)]
    pub fn regenerate(
        &mut self,
        min_x: f64,
        max_x: f64,
        step_x: f64,
        min_y: f64,
        max_y: f64,
        step_y: f64,
        z: f64,
    ) -> Result<()> {
        *self = Self::new(min_x, max_x, step_x, min_y, max_y, step_y, z)?;
        Ok(())
    }

    /// x axis sample positions, in m.
    pub fn xs(&self) -> &Array1<f64> {
        &self.xs
    }

    /// y axis sample positions, in m.
    pub fn ys(&self) -> &Array1<f64> {
        &self.ys
    }

    /// Receiver height, in m.
    pub fn z(&self) -> f64 {
        self.z
    }

    /// The receivers in row-major (y outer, x inner) order.
    pub fn receivers(&self) -> &[Receiver] {
        &self.receivers
    }

    /// (ny, nx) lattice dimensions.
    pub fn shape(&self) -> (usize, usize) {
        (self.ys.len(), self.xs.len())
    }

    /// Evaluate the SPL field of one source over the whole grid.
    ///
    /// # Returns
    /// Array of shape `(ny, nx, n_bands)`, addressed `[y, x, band]` in the
    /// ordering established at construction.
    pub fn eval_spl(&self, source: &Source, air: &Air, ground: &Ground) -> Result<Array3<f64>> {
        let per_receiver: Vec<Array1<f64>> = self
            .receivers
            .par_iter()
            .map(|rec| rec.spl_from_source(source, air, ground))
            .collect::<Result<_>>()?;
        self.assemble(per_receiver, air.n_bands(), f64::NAN)
    }

    /// Evaluate the complex pressure field of one source over the grid.
    ///
    /// Fields of several sources may be summed elementwise and converted
    /// back to SPL through [`crate::level::spl_from_pressure`] for coherent
    /// combination.
    pub fn eval_pressure(
        &self,
        source: &Source,
        air: &Air,
        ground: &Ground,
    ) -> Result<Array3<Complex64>> {
        let per_receiver: Vec<Array1<Complex64>> = self
            .receivers
            .par_iter()
            .map(|rec| rec.pressure_from_source(source, air, ground))
            .collect::<Result<_>>()?;
        self.assemble(per_receiver, air.n_bands(), Complex64::new(f64::NAN, 0.0))
    }

    fn assemble<T: Copy>(
        &self,
        per_receiver: Vec<Array1<T>>,
        n_bands: usize,
        fill: T,
    ) -> Result<Array3<T>> {
        let (ny, nx) = self.shape();
        let mut field = Array3::from_elem((ny, nx, n_bands), fill);
        for (idx, bands) in per_receiver.into_iter().enumerate() {
            let (iy, ix) = (idx / nx, idx % nx);
            for (ib, &v) in bands.iter().enumerate() {
                field[[iy, ix, ib]] = v;
            }
        }
        Ok(field)
    }
}
