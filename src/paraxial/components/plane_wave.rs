use num_complex::Complex64;

use crate::paraxial::ParaxialSource;

/// A plane wave, optionally tilted in the x-z plane by `angle` degrees.
#[derive(Copy, Clone, Debug)]
pub struct PlaneWave {
    pub amplitude: f64,
    pub wavenumber: f64,
    pub angle: f64,
}

impl ParaxialSource for PlaneWave {
    #[inline]
    fn field_2d(&self, x: f64, _z: f64) -> Complex64 {
        Complex64::from_polar(self.amplitude, self.wavenumber * self.angle.to_radians().sin() * x)
    }
    #[inline]
    fn field_3d(&self, x: f64, _y: f64, z: f64) -> Complex64 {
        self.field_2d(x, z)
    }
}
