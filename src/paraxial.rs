pub mod components;

mod adi_solver;
mod boundary;
mod crank_nicolson;
mod tridiagonal;

pub use adi_solver::{AdiSolver, AdiSolverDescriptor, SweepOrder};
pub use boundary::{edge_factor, edge_wavenumber, NEGLIGIBLE_MAGNITUDE};
pub use crank_nicolson::{CrankNicolson, CrankNicolsonDescriptor};
pub use tridiagonal::{SingularPivot, TridiagonalSystem};

use ndarray::{Array1, Array2};
use num_complex::Complex64;

use crate::{Discretization, Error};

/// Local X-ray optical constants, `n = 1 - delta + i beta`.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct MaterialSample {
    pub delta: f64,
    pub beta: f64,
}

/// Describes the refractive index of the medium the beam travels through.
///
/// Samples are taken concurrently from several rows, so implementations must be
/// pure functions of position.
pub trait MaterialModel: Send + Sync {
    fn sample_2d(&self, x: f64, z: f64) -> MaterialSample;
    fn sample_3d(&self, x: f64, y: f64, z: f64) -> MaterialSample;
}

/// Generates the incident field on the first z-plane.
pub trait ParaxialSource {
    fn field_2d(&self, x: f64, z: f64) -> Complex64;
    fn field_3d(&self, x: f64, y: f64, z: f64) -> Complex64;

    /// Samples a transverse line of `x.node_count()` nodes.
    fn line(&self, x: &Discretization, z: f64) -> Result<Array1<Complex64>, Error> {
        Ok(Array1::from_shape_fn(x.node_count(), |j| {
            self.field_2d(x.coord(j as isize), z)
        }))
    }

    /// Samples a transverse plane, rows along y and columns along x.
    fn plane(
        &self,
        x: &Discretization,
        y: &Discretization,
        z: f64,
    ) -> Result<Array2<Complex64>, Error> {
        Ok(Array2::from_shape_fn((y.node_count(), x.node_count()), |(i, j)| {
            self.field_3d(x.coord(j as isize), y.coord(i as isize), z)
        }))
    }
}

/// Treatment of the field just outside the transverse edges of the grid.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum BoundaryCondition {
    /// The field vanishes outside the domain.
    #[default]
    Dirichlet,
    /// The outgoing wave is extrapolated from the two outermost samples.
    Transparent,
}
