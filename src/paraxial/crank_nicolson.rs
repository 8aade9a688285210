use ndarray::{Array1, Ix1};
use num_complex::Complex64;

use crate::paraxial::boundary::{absorb_implicit_edges, explicit_edge_term};
use crate::paraxial::{BoundaryCondition, ParaxialSource, TridiagonalSystem};
use crate::{Error, SimulationParameters, Solver, StepDescriptor};

/// Describes the composition of a `CrankNicolson` solver.
#[derive(Copy, Clone, Debug, Default)]
pub struct CrankNicolsonDescriptor {
    pub boundary: BoundaryCondition,
}

/// Crank-Nicolson stepper for 2D simulations (one transverse axis).
///
/// The transverse Laplacian and the material term are both centred at
/// `z + dz / 2`, giving one tridiagonal system per step.
pub struct CrankNicolson {
    boundary: BoundaryCondition,
    system: TridiagonalSystem,
}

impl CrankNicolson {
    #[inline]
    pub fn new(desc: CrankNicolsonDescriptor) -> Self {
        Self {
            boundary: desc.boundary,
            system: TridiagonalSystem::new(0),
        }
    }
}

impl Solver for CrankNicolson {
    type Dim = Ix1;

    fn name(&self) -> &'static str {
        "CrankNicolson"
    }

    fn initial_field(
        &self,
        source: &dyn ParaxialSource,
        sim_params: &SimulationParameters,
    ) -> Result<Array1<Complex64>, Error> {
        source.line(&sim_params.x, sim_params.z.min)
    }

    fn solve_step(
        &mut self,
        field: &mut Array1<Complex64>,
        desc: StepDescriptor,
    ) -> Result<(), Error> {
        let sim_params = desc.sim_params;
        let n = sim_params.x.node_count();
        if field.len() != n {
            return Err(Error::ShapeMismatch {
                array_name: "Field",
                found: vec![field.len()],
                expected: vec![n],
            });
        }
        if self.system.len() != n {
            self.system = TridiagonalSystem::new(n);
        }

        let im = Complex64::i();
        let k = sim_params.wavenumber;
        let dx = sim_params.x.step;
        let dz = sim_params.z.step;
        let z_mid = desc.z() + 0.5 * dz;
        let laplace = 1.0 / (k * dx * dx);
        let coupling = -0.25 * im * laplace;
        let explicit_coupling = 0.25 * im * laplace;

        let system = &mut self.system;
        for j in 0..n {
            let m = desc.material.sample_2d(sim_params.x.coord(j as isize), z_mid);
            let attenuation = 0.5 * k * Complex64::new(m.beta, m.delta);

            system.diag[j] = 1.0 / dz + 0.5 * im * laplace + attenuation;
            if j > 0 {
                system.subdiag[j - 1] = coupling;
            }

            let mut rhs = (1.0 / dz - 0.5 * im * laplace - attenuation) * field[j];
            if j > 0 {
                rhs += explicit_coupling * field[j - 1];
            }
            if j + 1 < n {
                rhs += explicit_coupling * field[j + 1];
            }
            system.rhs[j] = rhs;
        }

        if self.boundary == BoundaryCondition::Transparent && n >= 2 {
            absorb_implicit_edges(&mut system.diag, field.view(), coupling);
            system.rhs[0] += explicit_edge_term(field[0], field[1], explicit_coupling);
            system.rhs[n - 1] += explicit_edge_term(field[n - 1], field[n - 2], explicit_coupling);
        }

        let solution = system.solve()?;
        field
            .iter_mut()
            .zip(solution)
            .for_each(|(value, &solved)| *value = solved);

        Ok(())
    }
}
