//! A framework for propagating paraxial X-ray wavefields through 2D and 3D media.
//!
//! The field envelope is marched along the optical axis (z) with finite differences:
//! a Crank-Nicolson stepper for 2D simulations and an alternating-direction implicit
//! stepper for 3D simulations, both with optional transparent boundaries. The exit
//! field can be turned into a far-field diffraction pattern with [`far_field::FarField`].
//!
//! To get started, refer to the `demos` directory in the main repository.

mod discretization;
mod simulation;

pub mod far_field;
pub mod paraxial;
pub mod prelude;

pub use discretization::Discretization;
pub use simulation::{
    RunDescriptor, SaveSettings, SaveType, Simulation, SimulationDescriptor, SimulationParameters,
    WaveDescriptor,
};

use ndarray::{Array, Dimension};
use num_complex::Complex64;

use crate::paraxial::{MaterialModel, ParaxialSource};

/// Represents an error in the simulation.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Init {array_name} array does not have expected length \
        ( {array_name} array length: {input_length}, \
        expected length: {expected_length} )")]
    BadInit {
        array_name: String,
        input_length: usize,
        expected_length: usize,
    },
    #[error("Invalid {axis} discretization \
        ( min: {min}, max: {max}, step: {step}, downsampling ratio: {downsampling_ratio} )")]
    BadDiscretization {
        axis: &'static str,
        min: f64,
        max: f64,
        step: f64,
        downsampling_ratio: usize,
    },
    #[error("Invalid wave parameter {name}: {value}")]
    BadWave { name: &'static str, value: f64 },
    #[error("The requested scattering angle {requested}° exceeds the largest angle \
        representable on the grid ({max}°). Increase the spatial resolution!")]
    ScatteringAngleTooLarge { requested: f64, max: f64 },
    #[error("Invalid far field angle range [{min}°, {max}°]")]
    BadAngleRange { min: f64, max: f64 },
    #[error("{array_name} array has shape {found:?}, expected {expected:?}")]
    ShapeMismatch {
        array_name: &'static str,
        found: Vec<usize>,
        expected: Vec<usize>,
    },
    #[error("{axis} axis is required by {required_by}")]
    MissingAxis {
        axis: &'static str,
        required_by: &'static str,
    },
    #[error(transparent)]
    SingularSystem(#[from] paraxial::SingularPivot),
    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),
    #[error(transparent)]
    H5Error(#[from] hdf5::Error),
}

/// Advances the field by one longitudinal step.
///
/// Implementations own whatever scratch buffers they need; the field itself is
/// owned by the [`Simulation`] and only borrowed for the duration of one step.
pub trait Solver {
    /// Shape of the field on one z-plane: `Ix1` for 2D simulations, `Ix2` for 3D.
    type Dim: Dimension;

    fn name(&self) -> &'static str;

    /// Samples the source on the first z-plane.
    fn initial_field(
        &self,
        source: &dyn ParaxialSource,
        sim_params: &SimulationParameters,
    ) -> Result<Array<Complex64, Self::Dim>, Error>;

    /// Replaces `field` (the solution at `z`) with the solution at `z + dz`.
    fn solve_step(
        &mut self,
        field: &mut Array<Complex64, Self::Dim>,
        desc: StepDescriptor,
    ) -> Result<(), Error>;
}

/// Describes the step a `Solver` should compute.
pub struct StepDescriptor<'a> {
    pub sim_params: &'a SimulationParameters,
    pub material: &'a dyn MaterialModel,
    /// Longitudinal index of the plane the incoming field lives on.
    pub step: usize,
}

impl StepDescriptor<'_> {
    /// z-coordinate of the incoming field.
    #[inline]
    pub fn z(&self) -> f64 {
        self.sim_params.z.coord(self.step as isize)
    }
}
