use std::path::Path;

use ndarray::{Array, Axis, Dimension, Ix1, RemoveAxis, Slice};
use num_complex::Complex64;

use crate::far_field::FarFieldPattern;
use crate::paraxial::{MaterialModel, ParaxialSource};
use crate::{Discretization, Error, Solver, StepDescriptor};

/// Planck constant times the speed of light, in eV nm.
const HC_EV_NM: f64 = 1239.841984;

/// How the wave is specified. Lengths in nm, energies in eV.
#[derive(Copy, Clone, Debug)]
pub enum WaveDescriptor {
    Wavenumber(f64),
    Wavelength(f64),
    Energy(f64),
}

/// Simulation specific parameters. Fixed for the lifetime of a `Simulation`.
#[derive(Copy, Clone, Debug)]
pub struct SimulationParameters {
    /// `2 pi / wavelength`, in nm⁻¹.
    pub wavenumber: f64,
    /// Transverse axis.
    pub x: Discretization,
    /// Vertical axis, only used by 3D solvers.
    pub y: Option<Discretization>,
    /// Longitudinal (optical) axis.
    pub z: Discretization,
}

impl SimulationParameters {
    pub fn new(
        wave: WaveDescriptor,
        x: Discretization,
        y: Option<Discretization>,
        z: Discretization,
    ) -> Result<Self, Error> {
        let (name, value) = match wave {
            WaveDescriptor::Wavenumber(k) => ("wavenumber", k),
            WaveDescriptor::Wavelength(lambda) => ("wavelength", lambda),
            WaveDescriptor::Energy(energy) => ("energy", energy),
        };
        if !(value.is_finite() && value > 0.0) {
            return Err(Error::BadWave { name, value });
        }
        let wavenumber = match wave {
            WaveDescriptor::Wavenumber(k) => k,
            WaveDescriptor::Wavelength(lambda) => 2.0 * std::f64::consts::PI / lambda,
            WaveDescriptor::Energy(energy) => 2.0 * std::f64::consts::PI * energy / HC_EV_NM,
        };

        Ok(Self { wavenumber, x, y, z })
    }

    /// Wavelength in nm.
    #[inline]
    pub fn wavelength(&self) -> f64 {
        2.0 * std::f64::consts::PI / self.wavenumber
    }

    /// Photon energy in eV.
    #[inline]
    pub fn energy(&self) -> f64 {
        HC_EV_NM / self.wavelength()
    }

    /// Downsampling ratio of each axis of a field of dimension `ndim`, outermost first.
    fn transverse_ratios(&self, ndim: usize) -> Vec<usize> {
        match (ndim, &self.y) {
            (1, _) => vec![self.x.downsampling_ratio],
            (2, Some(y)) => vec![y.downsampling_ratio, self.x.downsampling_ratio],
            _ => vec![1; ndim],
        }
    }
}

/// Describes a simulation.
pub struct SimulationDescriptor<S: Solver> {
    /// The `Solver` for the simulation.
    pub solver: S,
    /// The parameters for the simulation.
    pub sim_params: SimulationParameters,
    /// The medium the beam propagates through.
    pub material: Box<dyn MaterialModel>,
    /// The incident field at `z.min`.
    pub source: Box<dyn ParaxialSource>,
}

/// Describes a simulation run.
pub struct RunDescriptor<P: AsRef<Path>> {
    /// How far, in nm, the field should be propagated. `None` runs to the end of the z-axis.
    pub distance: Option<f64>,
    /// Whether or not to print information to the console.
    pub verbose: bool,
    /// What, if any, information to save to file.
    pub save_settings: Option<SaveSettings<P>>,
}

/// How data should be saved to file.
#[derive(Debug)]
pub struct SaveSettings<P: AsRef<Path>> {
    /// The path to the save file.
    pub filename: P,
    /// What information to save.
    pub save_type: SaveType,
    /// Whether or not to overwrite any possible saved data.
    pub overwrite: bool,
}

/// Represents what data to save.
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum SaveType {
    /// Save every recorded z-plane.
    Full,
    /// Save only the field at the current z-plane.
    End,
}

/// The main `struct` of the framework. Owns the field and marches it along z.
pub struct Simulation<S: Solver> {
    solver: S,
    sim_params: SimulationParameters,
    material: Box<dyn MaterialModel>,
    source: Box<dyn ParaxialSource>,
    field: Array<Complex64, S::Dim>,
    step: usize,
    history: Vec<Array<Complex64, S::Dim>>,
}

impl<S: Solver> Simulation<S> {
    /// Creates a new `Simulation` instance, sampling the source on the first plane.
    #[inline]
    pub fn new(desc: SimulationDescriptor<S>) -> Result<Self, Error> {
        let field = desc.solver.initial_field(desc.source.as_ref(), &desc.sim_params)?;
        let mut history = Vec::with_capacity(desc.sim_params.z.recorded_count());
        history.push(field.clone());

        Ok(Self {
            history,
            field,
            step: 0,
            solver: desc.solver,
            sim_params: desc.sim_params,
            material: desc.material,
            source: desc.source,
        })
    }

    #[inline]
    pub fn parameters(&self) -> &SimulationParameters {
        &self.sim_params
    }

    #[inline]
    pub fn solver(&self) -> &S {
        &self.solver
    }

    /// The field at the current z-plane.
    #[inline]
    pub fn field(&self) -> &Array<Complex64, S::Dim> {
        &self.field
    }

    /// Number of steps taken so far.
    #[inline]
    pub fn step_index(&self) -> usize {
        self.step
    }

    /// z-coordinate of the current plane.
    #[inline]
    pub fn z(&self) -> f64 {
        self.sim_params.z.coord(self.step as isize)
    }

    /// Steps left before the end of the z-axis.
    #[inline]
    pub fn remaining_steps(&self) -> usize {
        (self.sim_params.z.node_count() - 1).saturating_sub(self.step)
    }

    pub fn intensity(&self) -> Array<f64, S::Dim> {
        self.field.mapv(|v| v.norm_sqr())
    }

    pub fn phase(&self) -> Array<f64, S::Dim> {
        self.field.mapv(|v| v.arg())
    }

    /// Recorded planes stacked along a new leading z-axis. Every
    /// `z.downsampling_ratio`-th plane is kept, starting with the first.
    pub fn history(&self) -> Result<Array<Complex64, <S::Dim as Dimension>::Larger>, Error>
    where
        <S::Dim as Dimension>::Larger: RemoveAxis,
    {
        let views = self.history.iter().map(|plane| plane.view()).collect::<Vec<_>>();
        Ok(ndarray::stack(Axis(0), &views)?)
    }

    /// Propagates the field by one longitudinal step.
    pub fn step(&mut self) -> Result<(), Error> {
        self.solver.solve_step(
            &mut self.field,
            StepDescriptor {
                sim_params: &self.sim_params,
                material: self.material.as_ref(),
                step: self.step,
            },
        )?;
        self.step += 1;

        if self.step % self.sim_params.z.downsampling_ratio == 0 {
            self.history.push(self.field.clone());
        }
        log::trace!("{}: z = {}", self.solver.name(), self.z());

        Ok(())
    }

    /// Returns to the incident field at `z.min`, discarding the history.
    pub fn reset(&mut self) -> Result<(), Error> {
        self.field = self.solver.initial_field(self.source.as_ref(), &self.sim_params)?;
        self.step = 0;
        self.history.clear();
        self.history.push(self.field.clone());
        Ok(())
    }

    /// Does a computational run.
    pub fn run<P: AsRef<Path>>(&mut self, desc: RunDescriptor<P>) -> Result<(), Error>
    where
        <S::Dim as Dimension>::Larger: RemoveAxis,
    {
        let remaining = self.remaining_steps();
        let nsteps = match desc.distance {
            Some(distance) => {
                let requested = (distance / self.sim_params.z.step).round().max(0.0) as usize;
                if requested > remaining {
                    log::warn!(
                        "{} nm requested but only {} steps remain before z = {}; stopping there",
                        distance,
                        remaining,
                        self.sim_params.z.max
                    );
                }
                requested.min(remaining)
            }
            None => remaining,
        };

        // setup output if verbose
        let bar = if desc.verbose {
            println!(
                "# of z steps: {}\n\
                solver:       {}\n\
                wavelength:   {:<9.3e} nm",
                nsteps,
                self.solver.name(),
                self.sim_params.wavelength(),
            );
            Some(indicatif::ProgressBar::new(nsteps as u64))
        } else {
            None
        };

        for _ in 0..nsteps {
            self.step()?;
            if let Some(ref bar) = bar {
                bar.inc(1)
            }
        }

        if let Some(ref bar) = bar {
            bar.finish();
        }

        if let Some(SaveSettings {
            ref filename,
            save_type,
            overwrite,
        }) = desc.save_settings
        {
            self.save(filename, save_type, overwrite)?;
        }

        Ok(())
    }

    /// Writes the current field (and with `SaveType::Full` the recorded history)
    /// into a new group of an HDF5 file.
    pub fn save<P: AsRef<Path>>(
        &self,
        filename: P,
        save_type: SaveType,
        overwrite: bool,
    ) -> Result<(), Error>
    where
        <S::Dim as Dimension>::Larger: RemoveAxis,
    {
        let file = open_h5(filename.as_ref(), overwrite)?;
        let group = file.create_group(&format!("run{}", file.member_names()?.len()))?;

        let ratios = self.sim_params.transverse_ratios(self.field.ndim());
        let exit = self.field.slice_each_axis(|ax| Slice::new(0, None, ratios[ax.axis.index()] as isize));
        write_dataset(&group, "amplitude", &exit.mapv(|v| v.norm()))?;
        write_dataset(&group, "phase", &exit.mapv(|v| v.arg()))?;

        if save_type == SaveType::Full {
            let history = self.history()?;
            let history = history.slice_each_axis(|ax| match ax.axis.index() {
                0 => Slice::from(..),
                i => Slice::new(0, None, ratios[i - 1] as isize),
            });
            write_dataset(&group, "history_amplitude", &history.mapv(|v| v.norm()))?;
            write_dataset(&group, "history_phase", &history.mapv(|v| v.arg()))?;
        }

        // save parameters as group attributes
        let mut attributes = vec![
            ("wavenumber", self.sim_params.wavenumber),
            ("x_step", self.sim_params.x.step),
            ("z_step", self.sim_params.z.step),
            ("z_position", self.z()),
        ];
        if let Some(y) = self.sim_params.y {
            attributes.push(("y_step", y.step));
        }
        write_attributes(&group, &attributes)?;

        file.close()?;
        log::info!("saved {} field to {}", self.solver.name(), filename.as_ref().display());
        Ok(())
    }

    /// Writes a far-field pattern and its angular range into a new group of an HDF5 file.
    pub fn save_far_field<P: AsRef<Path>, D: Dimension>(
        &self,
        filename: P,
        pattern: &FarFieldPattern<D>,
        overwrite: bool,
    ) -> Result<(), Error> {
        let file = open_h5(filename.as_ref(), overwrite)?;
        let group = file.create_group(&format!("far_field{}", file.member_names()?.len()))?;
        write_dataset(&group, "intensity", &pattern.values)?;
        write_attributes(&group, &pattern.range.attributes())?;
        file.close()?;
        Ok(())
    }
}

impl<S: Solver<Dim = Ix1>> Simulation<S> {
    /// Indices `(ix, iz)` into `history()` of the recorded node closest to `(x, z)`.
    pub fn closest_index(&self, x: f64, z: f64) -> (usize, usize) {
        let z_axis = &self.sim_params.z;
        let recorded_step = z_axis.step * z_axis.downsampling_ratio as f64;
        let raw = ((z - z_axis.min) / recorded_step).round();
        let iz = if raw <= 0.0 {
            0
        } else {
            (raw as usize).min(self.history.len() - 1)
        };
        (self.sim_params.x.closest_index(x), iz)
    }

    /// Intensity at `(x, z)`, bilinearly interpolated between the recorded planes.
    /// `None` outside the grid or beyond the last recorded plane.
    pub fn intensity_at(&self, x: f64, z: f64) -> Option<f64> {
        let x_axis = &self.sim_params.x;
        let z_axis = &self.sim_params.z;
        let recorded_step = z_axis.step * z_axis.downsampling_ratio as f64;
        let (ix, tx) = bracket((x - x_axis.min) / x_axis.step, x_axis.node_count())?;
        let (iz, tz) = bracket((z - z_axis.min) / recorded_step, self.history.len())?;

        let sample = |iz: usize, ix: usize| self.history[iz][ix].norm_sqr();
        let ix_next = (ix + 1).min(x_axis.node_count() - 1);
        let iz_next = (iz + 1).min(self.history.len() - 1);
        let lower = (1.0 - tx) * sample(iz, ix) + tx * sample(iz, ix_next);
        let upper = (1.0 - tx) * sample(iz_next, ix) + tx * sample(iz_next, ix_next);
        Some((1.0 - tz) * lower + tz * upper)
    }
}

/// Lower node and fractional offset of a position given in units of the grid step.
fn bracket(position: f64, count: usize) -> Option<(usize, f64)> {
    let last = count.checked_sub(1)? as f64;
    if !(position >= -1e-9 && position <= last + 1e-9) {
        return None;
    }
    let lower = (position.max(0.0).floor() as usize).min(count.saturating_sub(2));
    Some((lower, (position - lower as f64).clamp(0.0, 1.0)))
}

fn open_h5(filename: &Path, overwrite: bool) -> Result<hdf5::File, Error> {
    if filename.exists() && !overwrite {
        Ok(hdf5::File::append(filename)?)
    } else {
        Ok(hdf5::File::create(filename)?)
    }
}

fn write_dataset<D: Dimension>(
    group: &hdf5::Group,
    name: &str,
    data: &Array<f64, D>,
) -> Result<(), Error> {
    let dataset = group.new_dataset::<f64>().shape(data.shape().to_vec()).create(name)?;
    dataset.write(data.view())?;
    Ok(())
}

fn write_attributes(group: &hdf5::Group, attributes: &[(&str, f64)]) -> Result<(), Error> {
    for &(name, value) in attributes {
        let attr = group.new_attr::<f64>()
            .shape(hdf5::Extents::Scalar)
            .create(name)?;
        attr.write_scalar(&value)?;
    }
    Ok(())
}
