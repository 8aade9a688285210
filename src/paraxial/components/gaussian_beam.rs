use num_complex::Complex64;

use crate::paraxial::ParaxialSource;

/// Describes a `GaussianBeam`. Lengths in nm, angles in degrees.
#[derive(Copy, Clone, Debug)]
pub struct GaussianBeamDescriptor {
    pub wavenumber: f64,
    pub waist: f64,
    pub center_x: f64,
    pub center_y: f64,
    /// Tilt of the beam axis towards +x.
    pub angle_x: f64,
    /// Tilt of the beam axis towards +y.
    pub angle_y: f64,
}

/// A Gaussian beam with its waist at `z = 0`.
#[derive(Copy, Clone, Debug)]
pub struct GaussianBeam {
    wavenumber: f64,
    waist: f64,
    center_x: f64,
    center_y: f64,
    kx: f64,
    ky: f64,
}

impl GaussianBeam {
    pub fn new(desc: GaussianBeamDescriptor) -> Self {
        Self {
            wavenumber: desc.wavenumber,
            waist: desc.waist,
            center_x: desc.center_x,
            center_y: desc.center_y,
            kx: desc.wavenumber * desc.angle_x.to_radians().sin(),
            ky: desc.wavenumber * desc.angle_y.to_radians().sin(),
        }
    }

    #[inline]
    pub fn waist(&self) -> f64 {
        self.waist
    }

    /// Distance from the waist over which the beam area doubles.
    #[inline]
    pub fn rayleigh_range(&self) -> f64 {
        0.5 * self.wavenumber * self.waist * self.waist
    }

    /// Far-field half-angle divergence in radians.
    #[inline]
    pub fn divergence(&self) -> f64 {
        2.0 / (self.wavenumber * self.waist)
    }

    /// Beam radius at `z`.
    #[inline]
    pub fn spot_size(&self, z: f64) -> f64 {
        self.waist * (1.0 + (z / self.rayleigh_range()).powi(2)).sqrt()
    }

    #[inline]
    pub fn inverse_radius_of_curvature(&self, z: f64) -> f64 {
        let z_r = self.rayleigh_range();
        z / (z * z + z_r * z_r)
    }

    /// Gouy phase of the 3D beam; the 2D beam accumulates half of it.
    #[inline]
    pub fn gouy_phase(&self, z: f64) -> f64 {
        (z / self.rayleigh_range()).atan()
    }

    fn envelope(&self, r_sq: f64, z: f64, amplitude: f64, gouy: f64) -> Complex64 {
        let w = self.spot_size(z);
        let phase = 0.5 * self.wavenumber * r_sq * self.inverse_radius_of_curvature(z) - gouy;
        Complex64::from_polar(amplitude * (-r_sq / (w * w)).exp(), phase)
    }
}

impl ParaxialSource for GaussianBeam {
    fn field_2d(&self, x: f64, z: f64) -> Complex64 {
        let dx = x - self.center_x;
        let amplitude = (self.waist / self.spot_size(z)).sqrt();
        self.envelope(dx * dx, z, amplitude, 0.5 * self.gouy_phase(z))
            * Complex64::from_polar(1.0, self.kx * dx)
    }

    fn field_3d(&self, x: f64, y: f64, z: f64) -> Complex64 {
        let dx = x - self.center_x;
        let dy = y - self.center_y;
        let amplitude = self.waist / self.spot_size(z);
        self.envelope(dx * dx + dy * dy, z, amplitude, self.gouy_phase(z))
            * Complex64::from_polar(1.0, self.kx * dx + self.ky * dy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn beam() -> GaussianBeam {
        GaussianBeam::new(GaussianBeamDescriptor {
            wavenumber: 50.0,
            waist: 20.0,
            center_x: 5.0,
            center_y: 0.0,
            angle_x: 0.0,
            angle_y: 0.0,
        })
    }

    #[test]
    fn peak_at_center_of_waist() {
        let beam = beam();
        assert_relative_eq!(beam.field_2d(5.0, 0.0).re, 1.0);
        assert_relative_eq!(beam.field_3d(5.0, 0.0, 0.0).norm(), 1.0);
        assert_relative_eq!(beam.field_2d(25.0, 0.0).norm(), (-1.0f64).exp());
    }

    #[test]
    fn spot_size_grows_by_sqrt2_at_rayleigh_range() {
        let beam = beam();
        let z_r = beam.rayleigh_range();
        assert_relative_eq!(beam.spot_size(z_r), beam.waist() * 2f64.sqrt(), epsilon = 1e-9);
        assert_relative_eq!(beam.gouy_phase(z_r), std::f64::consts::FRAC_PI_4);
        assert_relative_eq!(beam.field_3d(5.0, 0.0, z_r).norm(), 0.5f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn tilt_adds_linear_phase() {
        let tilted = GaussianBeam::new(GaussianBeamDescriptor {
            angle_x: 1.0,
            ..GaussianBeamDescriptor {
                wavenumber: 50.0,
                waist: 20.0,
                center_x: 0.0,
                center_y: 0.0,
                angle_x: 0.0,
                angle_y: 0.0,
            }
        });
        let value = tilted.field_2d(1.0, 0.0);
        assert_relative_eq!(value.arg(), 50.0 * 1f64.to_radians().sin(), epsilon = 1e-12);
    }
}
