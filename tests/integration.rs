use approx::assert_relative_eq;
use ndarray::{Array1, Ix1};
use num_complex::Complex64;

use paraxial::far_field::angle_to_index;
use paraxial::paraxial::components::{
    ArraySource, GaussianBeam, GaussianBeamDescriptor, PlaneWave, Vacuum,
};
use paraxial::prelude::*;

fn params_2d(k: f64, half_width: f64, dx: f64, length: f64, dz: f64) -> SimulationParameters {
    SimulationParameters::new(
        WaveDescriptor::Wavenumber(k),
        Discretization::new("x", -half_width, half_width, dx).unwrap(),
        None,
        Discretization::with_downsampling("z", 0.0, length, dz, 2).unwrap(),
    )
    .unwrap()
}

fn beam(k: f64) -> GaussianBeam {
    GaussianBeam::new(GaussianBeamDescriptor {
        wavenumber: k,
        waist: 2.0,
        center_x: 0.0,
        center_y: 0.0,
        angle_x: 0.0,
        angle_y: 0.0,
    })
}

fn quiet_run() -> RunDescriptor<&'static str> {
    RunDescriptor {
        distance: None,
        verbose: false,
        save_settings: None,
    }
}

#[test]
fn run_2d_records_every_other_plane() {
    let sim_params = params_2d(20.0, 20.0, 0.5, 10.0, 1.0);
    let mut simulation = Simulation::new(SimulationDescriptor {
        solver: CrankNicolson::new(CrankNicolsonDescriptor::default()),
        sim_params,
        material: Box::new(Vacuum),
        source: Box::new(beam(20.0)),
    })
    .unwrap();

    simulation.run(quiet_run()).unwrap();

    assert_eq!(simulation.step_index(), 10);
    assert_eq!(simulation.remaining_steps(), 0);
    assert_relative_eq!(simulation.z(), 10.0);
    let history = simulation.history().unwrap();
    assert_eq!(history.dim(), (6, 81));
    assert_eq!(history.row(5), simulation.field().view());

    simulation.reset().unwrap();
    assert_eq!(simulation.step_index(), 0);
    assert_eq!(simulation.history().unwrap().dim(), (1, 81));
}

#[test]
fn run_stops_after_requested_distance() {
    let sim_params = params_2d(20.0, 10.0, 0.5, 10.0, 1.0);
    let mut simulation = Simulation::new(SimulationDescriptor {
        solver: CrankNicolson::new(CrankNicolsonDescriptor::default()),
        sim_params,
        material: Box::new(Vacuum),
        source: Box::new(beam(20.0)),
    })
    .unwrap();

    simulation
        .run(RunDescriptor {
            distance: Some(3.0),
            ..quiet_run()
        })
        .unwrap();
    assert_eq!(simulation.step_index(), 3);
    assert_relative_eq!(simulation.z(), 3.0);
}

#[test]
fn source_must_match_the_grid() {
    let sim_params = params_2d(1.0, 1.0, 0.5, 1.0, 0.5);
    let coarse = Discretization::new("x", -1.0, 1.0, 1.0).unwrap();
    let source = ArraySource::line(coarse, Array1::from_elem(3, Complex64::new(1.0, 0.0))).unwrap();

    let result = Simulation::new(SimulationDescriptor {
        solver: CrankNicolson::new(CrankNicolsonDescriptor::default()),
        sim_params,
        material: Box::new(Vacuum),
        source: Box::new(source),
    });
    match result {
        Err(Error::BadInit { input_length, expected_length, .. }) => {
            assert_eq!(input_length, 3);
            assert_eq!(expected_length, 5);
        }
        _ => panic!("expected BadInit"),
    }
}

#[test]
fn bad_discretization_is_rejected() {
    assert!(Discretization::new("x", 1.0, 0.0, 0.1).is_err());
    assert!(Discretization::new("x", 0.0, 1.0, 0.0).is_err());
    assert!(Discretization::with_downsampling("z", 0.0, 1.0, 0.1, 0).is_err());
}

#[test]
fn adi_needs_a_vertical_axis() {
    let sim_params = params_2d(1.0, 1.0, 0.5, 1.0, 0.5);
    let result = Simulation::new(SimulationDescriptor {
        solver: AdiSolver::new(AdiSolverDescriptor::default()),
        sim_params,
        material: Box::new(Vacuum),
        source: Box::new(PlaneWave { amplitude: 1.0, wavenumber: 1.0, angle: 0.0 }),
    });
    assert!(matches!(result, Err(Error::MissingAxis { axis: "y", .. })));
}

#[test]
fn plane_wave_3d_is_stationary_with_transparent_edges() {
    let sim_params = SimulationParameters::new(
        WaveDescriptor::Wavenumber(5.0),
        Discretization::new("x", 0.0, 15.0, 1.0).unwrap(),
        Some(Discretization::new("y", 0.0, 11.0, 1.0).unwrap()),
        Discretization::new("z", 0.0, 10.0, 1.0).unwrap(),
    )
    .unwrap();
    let mut simulation = Simulation::new(SimulationDescriptor {
        solver: AdiSolver::new(AdiSolverDescriptor {
            boundary: BoundaryCondition::Transparent,
            order: SweepOrder::YFirst,
        }),
        sim_params,
        material: Box::new(Vacuum),
        source: Box::new(PlaneWave { amplitude: 2.0, wavenumber: 5.0, angle: 0.0 }),
    })
    .unwrap();

    simulation.run(quiet_run()).unwrap();

    assert_eq!(simulation.field().dim(), (12, 16));
    for value in simulation.intensity().iter() {
        assert_relative_eq!(*value, 4.0, epsilon = 1e-10);
    }
    assert_eq!(simulation.history().unwrap().dim(), (11, 12, 16));
}

#[test]
fn tilted_plane_wave_scatters_into_its_angle() {
    let k = 10.0;
    let angle = 2.0;
    let sim_params = params_2d(k, 100.0, 0.5, 10.0, 1.0);
    let mut simulation = Simulation::new(SimulationDescriptor {
        solver: CrankNicolson::new(CrankNicolsonDescriptor {
            boundary: BoundaryCondition::Transparent,
        }),
        sim_params,
        material: Box::new(Vacuum),
        source: Box::new(PlaneWave { amplitude: 1.0, wavenumber: k, angle }),
    })
    .unwrap();
    simulation.run(quiet_run()).unwrap();

    let signal_length = 4096;
    let far_field = FarField::<Ix1>::new(FarFieldDescriptor {
        angle_min: -10.0,
        angle_max: 10.0,
        signal_length,
        ..Default::default()
    })
    .unwrap();
    let pattern = far_field.compute(simulation.field().view(), &sim_params).unwrap();

    let start = angle_to_index(-10.0, signal_length, 0.5, k);
    let end = angle_to_index(10.0, signal_length, 0.5, k);
    assert_eq!(pattern.values.len(), end - start + 1);

    let (peak, _) = pattern
        .values
        .iter()
        .enumerate()
        .fold((0, f64::MIN), |best, (i, &v)| if v > best.1 { (i, v) } else { best });
    let expected = angle_to_index(angle, signal_length, 0.5, k);
    assert!((start + peak) as isize - expected as isize <= 1);
    assert!(expected as isize - (start + peak) as isize <= 1);
}

#[test]
fn saves_fields_and_far_field() {
    let path = std::env::temp_dir().join("paraxial_integration_save.h5");
    let sim_params = params_2d(20.0, 5.0, 0.5, 4.0, 1.0);
    let mut simulation = Simulation::new(SimulationDescriptor {
        solver: CrankNicolson::new(CrankNicolsonDescriptor::default()),
        sim_params,
        material: Box::new(Vacuum),
        source: Box::new(beam(20.0)),
    })
    .unwrap();

    simulation
        .run(RunDescriptor {
            distance: None,
            verbose: false,
            save_settings: Some(SaveSettings {
                filename: &path,
                save_type: SaveType::Full,
                overwrite: true,
            }),
        })
        .unwrap();

    let far_field = FarField::<Ix1>::new(FarFieldDescriptor {
        signal_length: 64,
        angle_min: -5.0,
        angle_max: 5.0,
        ..Default::default()
    })
    .unwrap();
    let pattern = far_field.compute(simulation.field().view(), &sim_params).unwrap();
    simulation.save_far_field(&path, &pattern, false).unwrap();

    let file = hdf5::File::open(&path).unwrap();
    let run = file.group("run0").unwrap();
    assert_eq!(run.dataset("amplitude").unwrap().shape(), vec![21]);
    assert_eq!(run.dataset("history_phase").unwrap().shape(), vec![3, 21]);
    let wavenumber = run.attr("wavenumber").unwrap().read_scalar::<f64>().unwrap();
    assert_relative_eq!(wavenumber, 20.0);

    let saved = file.group("far_field1").unwrap();
    assert_eq!(saved.dataset("intensity").unwrap().shape(), vec![pattern.values.len()]);
    let q_max = saved.attr("qmax").unwrap().read_scalar::<f64>().unwrap();
    assert_relative_eq!(q_max, pattern.range.q_max);

    file.close().unwrap();
    let _ = std::fs::remove_file(&path);
}
