use crate::paraxial::{MaterialModel, MaterialSample};

/// Empty space.
#[derive(Copy, Clone, Debug, Default)]
pub struct Vacuum;

impl MaterialModel for Vacuum {
    #[inline]
    fn sample_2d(&self, _x: f64, _z: f64) -> MaterialSample {
        MaterialSample::default()
    }
    #[inline]
    fn sample_3d(&self, _x: f64, _y: f64, _z: f64) -> MaterialSample {
        MaterialSample::default()
    }
}

/// A homogeneous medium filling the whole domain.
#[derive(Copy, Clone, Debug)]
pub struct Uniform {
    pub delta: f64,
    pub beta: f64,
}

impl MaterialModel for Uniform {
    #[inline]
    fn sample_2d(&self, _x: f64, _z: f64) -> MaterialSample {
        MaterialSample { delta: self.delta, beta: self.beta }
    }
    #[inline]
    fn sample_3d(&self, _x: f64, _y: f64, _z: f64) -> MaterialSample {
        MaterialSample { delta: self.delta, beta: self.beta }
    }
}

/// A material described by a closure of `(x, y, z)`. 2D simulations sample the
/// plane `y = 0`.
pub struct MaterialFn<F>
where
    F: Fn(f64, f64, f64) -> MaterialSample + Send + Sync,
{
    pub sample_fn: F,
}

impl<F> MaterialModel for MaterialFn<F>
where
    F: Fn(f64, f64, f64) -> MaterialSample + Send + Sync,
{
    #[inline]
    fn sample_2d(&self, x: f64, z: f64) -> MaterialSample {
        (self.sample_fn)(x, 0.0, z)
    }
    #[inline]
    fn sample_3d(&self, x: f64, y: f64, z: f64) -> MaterialSample {
        (self.sample_fn)(x, y, z)
    }
}

/// A ball of uniform material in vacuum. In 2D it is the disc cut by `y = center[1]`.
#[derive(Copy, Clone, Debug)]
pub struct Sphere {
    /// Centre as `[x, y, z]`.
    pub center: [f64; 3],
    pub radius: f64,
    pub delta: f64,
    pub beta: f64,
}

impl Sphere {
    #[inline]
    fn sample(&self, r_sq: f64) -> MaterialSample {
        if r_sq <= self.radius * self.radius {
            MaterialSample { delta: self.delta, beta: self.beta }
        } else {
            MaterialSample::default()
        }
    }
}

impl MaterialModel for Sphere {
    fn sample_2d(&self, x: f64, z: f64) -> MaterialSample {
        let [cx, _, cz] = self.center;
        self.sample((x - cx).powi(2) + (z - cz).powi(2))
    }
    fn sample_3d(&self, x: f64, y: f64, z: f64) -> MaterialSample {
        let [cx, cy, cz] = self.center;
        self.sample((x - cx).powi(2) + (y - cy).powi(2) + (z - cz).powi(2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_is_bounded() {
        let sphere = Sphere { center: [0.0, 0.0, 100.0], radius: 10.0, delta: 1e-5, beta: 1e-7 };
        assert_eq!(sphere.sample_3d(0.0, 0.0, 95.0).delta, 1e-5);
        assert_eq!(sphere.sample_3d(8.0, 8.0, 100.0), MaterialSample::default());
        assert_eq!(sphere.sample_2d(8.0, 100.0).beta, 1e-7);
    }

    #[test]
    fn closure_material_samples_midplane_in_2d() {
        let material = MaterialFn {
            sample_fn: |x: f64, y: f64, _z: f64| MaterialSample { delta: x, beta: y },
        };
        assert_eq!(material.sample_2d(3.0, 7.0), MaterialSample { delta: 3.0, beta: 0.0 });
        assert_eq!(material.sample_3d(3.0, 2.0, 7.0), MaterialSample { delta: 3.0, beta: 2.0 });
    }
}
