//! Materials and sources.

mod array_source;
mod gaussian_beam;
mod materials;
mod plane_wave;

pub use array_source::ArraySource;
pub use gaussian_beam::{GaussianBeam, GaussianBeamDescriptor};
pub use materials::{MaterialFn, Sphere, Uniform, Vacuum};
pub use plane_wave::PlaneWave;
