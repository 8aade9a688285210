use ndarray::{Array1, Array2};
use num_complex::Complex64;

use crate::paraxial::ParaxialSource;
use crate::{Discretization, Error};

enum Samples {
    Line(Array1<Complex64>),
    Plane(Array2<Complex64>),
}

/// An incident field given directly as samples on the simulation grid.
pub struct ArraySource {
    x: Discretization,
    y: Option<Discretization>,
    samples: Samples,
}

impl ArraySource {
    /// A line for 2D simulations; one sample per node of `x`.
    pub fn line(x: Discretization, values: Array1<Complex64>) -> Result<Self, Error> {
        check_len("Source", values.len(), x.node_count())?;
        Ok(Self { x, y: None, samples: Samples::Line(values) })
    }

    /// A plane for 3D simulations; rows along `y`, columns along `x`.
    pub fn plane(
        x: Discretization,
        y: Discretization,
        values: Array2<Complex64>,
    ) -> Result<Self, Error> {
        let (rows, cols) = values.dim();
        check_len("Source row", rows, y.node_count())?;
        check_len("Source column", cols, x.node_count())?;
        Ok(Self { x, y: Some(y), samples: Samples::Plane(values) })
    }
}

fn check_len(array_name: &str, input_length: usize, expected_length: usize) -> Result<(), Error> {
    if input_length != expected_length {
        return Err(Error::BadInit {
            array_name: array_name.to_string(),
            input_length,
            expected_length,
        });
    }
    Ok(())
}

impl ParaxialSource for ArraySource {
    /// Nearest sample; the source has no z-dependence.
    fn field_2d(&self, x: f64, _z: f64) -> Complex64 {
        let j = self.x.closest_index(x);
        match &self.samples {
            Samples::Line(values) => values[j],
            Samples::Plane(values) => values[[values.nrows() / 2, j]],
        }
    }

    fn field_3d(&self, x: f64, y: f64, z: f64) -> Complex64 {
        match (&self.samples, &self.y) {
            (Samples::Plane(values), Some(y_disc)) => {
                values[[y_disc.closest_index(y), self.x.closest_index(x)]]
            }
            _ => self.field_2d(x, z),
        }
    }

    fn line(&self, x: &Discretization, _z: f64) -> Result<Array1<Complex64>, Error> {
        match &self.samples {
            Samples::Line(values) => {
                check_len("Source", values.len(), x.node_count())?;
                Ok(values.clone())
            }
            Samples::Plane(values) => {
                check_len("Source column", values.ncols(), x.node_count())?;
                Ok(values.row(values.nrows() / 2).to_owned())
            }
        }
    }

    fn plane(
        &self,
        x: &Discretization,
        y: &Discretization,
        _z: f64,
    ) -> Result<Array2<Complex64>, Error> {
        match &self.samples {
            Samples::Plane(values) => {
                check_len("Source row", values.nrows(), y.node_count())?;
                check_len("Source column", values.ncols(), x.node_count())?;
                Ok(values.clone())
            }
            Samples::Line(values) => {
                check_len("Source", values.len(), x.node_count())?;
                let line = values.view().insert_axis(ndarray::Axis(0));
                Ok(line.broadcast((y.node_count(), x.node_count())).map_or_else(
                    || Array2::zeros((y.node_count(), x.node_count())),
                    |view| view.to_owned(),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_length() {
        let x = Discretization::new("x", 0.0, 1.0, 0.25).unwrap();
        let values = Array1::from_elem(4, Complex64::new(1.0, 0.0));
        match ArraySource::line(x, values) {
            Err(Error::BadInit { input_length, expected_length, .. }) => {
                assert_eq!(input_length, 4);
                assert_eq!(expected_length, 5);
            }
            _ => panic!("expected BadInit"),
        }
    }

    #[test]
    fn line_must_match_simulation_grid() {
        let x = Discretization::new("x", 0.0, 1.0, 0.25).unwrap();
        let source = ArraySource::line(x, Array1::from_elem(5, Complex64::new(1.0, 0.0))).unwrap();
        let finer = Discretization::new("x", 0.0, 1.0, 0.1).unwrap();
        assert!(source.line(&x, 0.0).is_ok());
        assert!(source.line(&finer, 0.0).is_err());
    }

    #[test]
    fn line_extends_uniformly_along_y() {
        let x = Discretization::new("x", 0.0, 2.0, 1.0).unwrap();
        let y = Discretization::new("y", 0.0, 1.0, 0.5).unwrap();
        let values = Array1::from(vec![
            Complex64::new(1.0, 0.0),
            Complex64::new(2.0, 0.0),
            Complex64::new(3.0, 0.0),
        ]);
        let plane = ArraySource::line(x, values).unwrap().plane(&x, &y, 0.0).unwrap();
        assert_eq!(plane.dim(), (3, 3));
        assert_eq!(plane[[2, 1]], Complex64::new(2.0, 0.0));
    }
}
