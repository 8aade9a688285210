use paraxial::prelude::*;
use paraxial::paraxial::components;

use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let energy = 12_000.0; // [eV]
    let waist = 50.0; // [nm]

    let sim_params = SimulationParameters::new(
        WaveDescriptor::Energy(energy),
        Discretization::new("x", -1_000.0, 1_000.0, 2.0).unwrap(), // [nm]
        None,
        Discretization::with_downsampling("z", 0.0, 200_000.0, 100.0, 10).unwrap(),
    )
    .unwrap();

    // a beam focused on the entrance plane, spreading in free space
    let beam = components::GaussianBeam::new(components::GaussianBeamDescriptor {
        wavenumber: sim_params.wavenumber,
        waist,
        center_x: 0.0,
        center_y: 0.0,
        angle_x: 0.0,
        angle_y: 0.0,
    });

    println!(
        "\n-- General Simulation Info --\n\
        # of points:    {}\n\
        Δx:             {:<9.2e} nm\n\
        Δz:             {:<9.2e} nm\n\
        Rayleigh range: {:<9.2e} nm\n\
        divergence:     {:<9.2e} rad\n",
        sim_params.x.node_count(),
        sim_params.x.step,
        sim_params.z.step,
        beam.rayleigh_range(),
        beam.divergence(),
    );

    let mut simulation = Simulation::new(SimulationDescriptor {
        solver: CrankNicolson::new(CrankNicolsonDescriptor {
            boundary: BoundaryCondition::Transparent,
        }),
        sim_params,
        material: Box::new(components::Vacuum),
        source: Box::new(beam),
    })
    .unwrap();

    println!("-- Run Part 1 --");
    // propagate to one Rayleigh range and save the field there
    simulation.run(RunDescriptor {
        distance: Some(beam.rayleigh_range()),
        verbose: true,
        save_settings: Some(SaveSettings {
            filename: "data/gaussian_beam.h5",
            save_type: SaveType::End,
            overwrite: true,
        }),
    })
    .unwrap();

    println!(
        "on-axis intensity at z = {:.0} nm: {:.4} (expected {:.4})\n",
        simulation.z(),
        simulation.intensity_at(0.0, simulation.z()).unwrap(),
        beam.field_2d(0.0, simulation.z()).norm_sqr(),
    );

    println!("-- Run Part 2 --");
    // march to the end of the domain and save the recorded history
    simulation.run(RunDescriptor {
        distance: None,
        verbose: true,
        save_settings: Some(SaveSettings {
            filename: "data/gaussian_beam.h5",
            save_type: SaveType::Full,
            overwrite: false,
        }),
    })
    .unwrap();
}
