use paraxial::prelude::*;
use paraxial::paraxial::components;

use tracing_subscriber::EnvFilter;

use ndarray::{Array2, Ix2};
use num_complex::Complex64;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let energy = 10_000.0; // [eV]
    let radius = 150.0; // [nm]

    let sim_params = SimulationParameters::new(
        WaveDescriptor::Energy(energy),
        Discretization::new("x", -400.0, 400.0, 4.0).unwrap(), // [nm]
        Some(Discretization::new("y", -400.0, 400.0, 4.0).unwrap()),
        Discretization::new("z", 0.0, 400.0, 4.0).unwrap(),
    )
    .unwrap();
    let y = sim_params.y.unwrap();

    let mut simulation = Simulation::new(SimulationDescriptor {
        solver: AdiSolver::new(AdiSolverDescriptor {
            boundary: BoundaryCondition::Transparent,
            order: SweepOrder::XFirst,
        }),
        sim_params,
        material: Box::new(components::Sphere {
            center: [0.0, 0.0, 200.0],
            radius,
            delta: 5e-6,
            beta: 2e-8,
        }),
        source: Box::new(components::PlaneWave {
            amplitude: 1.0,
            wavenumber: sim_params.wavenumber,
            angle: 0.0,
        }),
    })
    .unwrap();

    println!(
        "\n-- General Simulation Info --\n\
        # of points:  {} x {}\n\
        wavelength:   {:<9.3e} nm\n\
        max angle:    {:<9.3e}°\n",
        sim_params.x.node_count(),
        y.node_count(),
        sim_params.wavelength(),
        paraxial::far_field::max_scattering_angle(sim_params.x.step, y.step, sim_params.wavenumber),
    );

    simulation.run(RunDescriptor {
        distance: None,
        verbose: true,
        save_settings: Some(SaveSettings {
            filename: "data/sphere.h5",
            save_type: SaveType::End,
            overwrite: true,
        }),
    })
    .unwrap();

    // the unscattered plane wave is the coherent background
    let mut far_field = FarField::<Ix2>::new(FarFieldDescriptor {
        angle_min: -0.5,
        angle_max: 0.5,
        signal_length: 1024,
        padding: Padding::Zero,
        pad_value: Complex64::new(0.0, 0.0),
    })
    .unwrap();
    far_field.attach_reference(Array2::from_elem(
        (y.node_count(), sim_params.x.node_count()),
        Complex64::new(1.0, 0.0),
    ));

    let pattern = far_field.compute(simulation.field().view(), &sim_params).unwrap();
    println!(
        "far field: {:?} bins, q in [{:.3e}, {:.3e}] nm⁻¹",
        pattern.values.dim(),
        pattern.range.q_min,
        pattern.range.q_max,
    );
    simulation.save_far_field("data/sphere.h5", &pattern, false).unwrap();
}
