//! Includes commonly used library components.

pub use crate::{
    Discretization,
    Error,
    RunDescriptor,
    SaveSettings,
    SaveType,
    Simulation,
    SimulationDescriptor,
    SimulationParameters,
    Solver,
    StepDescriptor,
    WaveDescriptor,
};
pub use crate::far_field::{FarField, FarFieldDescriptor, FarFieldPattern, Padding};
pub use crate::paraxial::{
    AdiSolver,
    AdiSolverDescriptor,
    BoundaryCondition,
    CrankNicolson,
    CrankNicolsonDescriptor,
    MaterialModel,
    MaterialSample,
    ParaxialSource,
    SweepOrder,
};
