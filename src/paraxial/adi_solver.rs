use ndarray::{Array2, ArrayView2, ArrayViewMut2, Axis, Ix2};
use num_complex::Complex64;
use rayon::prelude::*;

use crate::paraxial::boundary::{absorb_implicit_edges, explicit_edge_term};
use crate::paraxial::{
    BoundaryCondition, MaterialSample, ParaxialSource, SingularPivot, TridiagonalSystem,
};
use crate::{Error, SimulationParameters, Solver, StepDescriptor};

/// Which transverse direction is treated implicitly in the first half-step.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SweepOrder {
    #[default]
    XFirst,
    YFirst,
}

/// Describes the composition of an `AdiSolver`.
#[derive(Copy, Clone, Debug, Default)]
pub struct AdiSolverDescriptor {
    pub boundary: BoundaryCondition,
    pub order: SweepOrder,
}

/// Peaceman-Rachford alternating direction implicit stepper for 3D simulations.
///
/// Each step is split into two half-steps of `dz / 2`. The first treats one
/// transverse direction implicitly and the other explicitly, the second swaps
/// the roles. Every half-step is a set of independent tridiagonal systems, one
/// per grid line, which are solved in parallel.
pub struct AdiSolver {
    boundary: BoundaryCondition,
    order: SweepOrder,
    /// Output buffer of the running half-step. Only an intermediate between calls.
    current: Array2<Complex64>,
}

impl AdiSolver {
    #[inline]
    pub fn new(desc: AdiSolverDescriptor) -> Self {
        Self {
            boundary: desc.boundary,
            order: desc.order,
            current: Array2::zeros((0, 0)),
        }
    }
}

/// The coefficients of one half-step, expressed on lines of the implicit direction.
struct HalfStep<'a> {
    wavenumber: f64,
    half_dz: f64,
    implicit_step: f64,
    explicit_step: f64,
    boundary: BoundaryCondition,
    /// Material at `(line, node)` of the half-step's view.
    sample: &'a (dyn Fn(usize, usize) -> MaterialSample + Sync),
}

impl HalfStep<'_> {
    /// Solves one system per row of `prev`, the implicit direction running along
    /// the rows, and writes the solutions to the matching rows of `out`.
    fn sweep(
        &self,
        prev: ArrayView2<Complex64>,
        mut out: ArrayViewMut2<Complex64>,
    ) -> Result<(), SingularPivot> {
        let (nlines, nnodes) = prev.dim();
        let im = Complex64::i();
        let k = self.wavenumber;
        let implicit = 1.0 / (k * self.implicit_step * self.implicit_step);
        let explicit = 1.0 / (k * self.explicit_step * self.explicit_step);
        let coupling = -0.5 * im * implicit;
        let explicit_coupling = 0.5 * im * explicit;
        let diag_base = 1.0 / self.half_dz + im * implicit;
        let rhs_base = 1.0 / self.half_dz - im * explicit;

        out.axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .try_for_each_init(
                || TridiagonalSystem::new(nnodes),
                |system, (line, mut solution_row)| {
                    for node in 0..nnodes {
                        let MaterialSample { delta, beta } = (self.sample)(line, node);
                        system.diag[node] = diag_base + k * beta + im * k * delta;
                        if node > 0 {
                            system.subdiag[node - 1] = coupling;
                        }

                        let mut rhs = rhs_base * prev[[line, node]];
                        if line > 0 {
                            rhs += explicit_coupling * prev[[line - 1, node]];
                        }
                        if line + 1 < nlines {
                            rhs += explicit_coupling * prev[[line + 1, node]];
                        }
                        system.rhs[node] = rhs;
                    }

                    if self.boundary == BoundaryCondition::Transparent {
                        absorb_implicit_edges(&mut system.diag, prev.row(line), coupling);
                        if nlines >= 2 && (line == 0 || line == nlines - 1) {
                            let inner = if line == 0 { 1 } else { nlines - 2 };
                            for node in 0..nnodes {
                                system.rhs[node] += explicit_edge_term(
                                    prev[[line, node]],
                                    prev[[inner, node]],
                                    explicit_coupling,
                                );
                            }
                        }
                    }

                    let solution = system.solve()?;
                    solution_row
                        .iter_mut()
                        .zip(solution)
                        .for_each(|(value, &solved)| *value = solved);
                    Ok(())
                },
            )
    }
}

impl AdiSolver {
    /// Half-step with x implicit. Lines are rows (fixed y).
    fn x_implicit(
        &mut self,
        prev: &Array2<Complex64>,
        z: f64,
        desc: &StepDescriptor,
        dy: f64,
    ) -> Result<(), Error> {
        let sim_params = desc.sim_params;
        let y = sim_params.y.as_ref().ok_or(Error::MissingAxis {
            axis: "y",
            required_by: self.name(),
        })?;
        let sample = |line: usize, node: usize| {
            desc.material.sample_3d(sim_params.x.coord(node as isize), y.coord(line as isize), z)
        };
        HalfStep {
            wavenumber: sim_params.wavenumber,
            half_dz: 0.5 * sim_params.z.step,
            implicit_step: sim_params.x.step,
            explicit_step: dy,
            boundary: self.boundary,
            sample: &sample,
        }
        .sweep(prev.view(), self.current.view_mut())?;
        Ok(())
    }

    /// Half-step with y implicit. Works on transposed views, so lines are columns (fixed x).
    fn y_implicit(
        &mut self,
        prev: &Array2<Complex64>,
        z: f64,
        desc: &StepDescriptor,
        dy: f64,
    ) -> Result<(), Error> {
        let sim_params = desc.sim_params;
        let y = sim_params.y.as_ref().ok_or(Error::MissingAxis {
            axis: "y",
            required_by: self.name(),
        })?;
        let sample = |line: usize, node: usize| {
            desc.material.sample_3d(sim_params.x.coord(line as isize), y.coord(node as isize), z)
        };
        HalfStep {
            wavenumber: sim_params.wavenumber,
            half_dz: 0.5 * sim_params.z.step,
            implicit_step: dy,
            explicit_step: sim_params.x.step,
            boundary: self.boundary,
            sample: &sample,
        }
        .sweep(prev.view().reversed_axes(), self.current.view_mut().reversed_axes())?;
        Ok(())
    }
}

impl Solver for AdiSolver {
    type Dim = Ix2;

    fn name(&self) -> &'static str {
        "ADI"
    }

    fn initial_field(
        &self,
        source: &dyn ParaxialSource,
        sim_params: &SimulationParameters,
    ) -> Result<Array2<Complex64>, Error> {
        let y = sim_params.y.as_ref().ok_or(Error::MissingAxis {
            axis: "y",
            required_by: self.name(),
        })?;
        source.plane(&sim_params.x, y, sim_params.z.min)
    }

    fn solve_step(
        &mut self,
        field: &mut Array2<Complex64>,
        desc: StepDescriptor,
    ) -> Result<(), Error> {
        let sim_params = desc.sim_params;
        let y = sim_params.y.as_ref().ok_or(Error::MissingAxis {
            axis: "y",
            required_by: self.name(),
        })?;
        let expected = (y.node_count(), sim_params.x.node_count());
        if field.dim() != expected {
            return Err(Error::ShapeMismatch {
                array_name: "Field",
                found: field.shape().to_vec(),
                expected: vec![expected.0, expected.1],
            });
        }
        if self.current.dim() != expected {
            self.current = Array2::zeros(expected);
        }

        let z = desc.z();
        let z_half = z + 0.5 * sim_params.z.step;
        let dy = y.step;

        // The second half-step must see the complete output of the first, so the
        // buffers are swapped in between.
        match self.order {
            SweepOrder::XFirst => {
                self.x_implicit(field, z, &desc, dy)?;
                std::mem::swap(field, &mut self.current);
                self.y_implicit(field, z_half, &desc, dy)?;
            }
            SweepOrder::YFirst => {
                self.y_implicit(field, z, &desc, dy)?;
                std::mem::swap(field, &mut self.current);
                self.x_implicit(field, z_half, &desc, dy)?;
            }
        }
        std::mem::swap(field, &mut self.current);

        Ok(())
    }
}
