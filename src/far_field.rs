//! Far-field diffraction patterns from the exit field of a simulation.
//!
//! The exit field is (optionally) reference subtracted, centred in a padded
//! buffer, Fourier transformed and shifted so that the zero frequency sits in
//! the middle. The requested angular window is then cut out of the spectrum.
//! A 1D exit field gives an amplitude pattern normalised by `sqrt(N)`, a 2D exit
//! field gives an intensity pattern normalised by `N`.

use std::f64::consts::PI;
use std::ops::Range;
use std::sync::{Mutex, PoisonError};

use ndarray::{
    Array, Array1, Array2, ArrayView, ArrayView1, ArrayView2, Axis, Dimension, Ix1, Ix2,
};
use num_complex::Complex64;
use rayon::prelude::*;
use rustfft::FftPlanner;

use crate::{Error, SimulationParameters};

/// Samples used on each edge by `Padding::LinearFit`.
pub const LINEAR_FIT_SAMPLES: usize = 10;

/// How the region around the centred field is filled before the transform.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Padding {
    /// Leave the pad region at `pad_value`.
    #[default]
    Zero,
    /// Repeat the first sample of the field.
    Constant,
    /// Extrapolate a straight line fitted to the samples closest to each edge.
    /// Experimental, the extrapolation is unreliable for oscillating fields.
    LinearFit,
}

/// Describes a far-field extraction.
#[derive(Copy, Clone, Debug)]
pub struct FarFieldDescriptor {
    /// Lower end of the angular window in degrees.
    pub angle_min: f64,
    /// Upper end of the angular window in degrees.
    pub angle_max: f64,
    /// FFT length. Fields at least this long are transformed unpadded.
    pub signal_length: usize,
    pub padding: Padding,
    /// Initial value of the pad region.
    pub pad_value: Complex64,
}

impl Default for FarFieldDescriptor {
    fn default() -> Self {
        Self {
            angle_min: -1.0,
            angle_max: 1.0,
            signal_length: 1 << 14,
            padding: Padding::Zero,
            pad_value: Complex64::new(0.0, 0.0),
        }
    }
}

/// An in-place forward discrete Fourier transform, `X_m = sum_j x_j exp(-2 pi i j m / N)`.
///
/// Lines are transformed concurrently, so implementations must be shareable.
pub trait SpectralTransform: Send + Sync {
    fn forward(&self, buffer: &mut [Complex64]);
}

/// `SpectralTransform` backed by `rustfft`. Plans are cached by the planner.
pub struct RustFftTransform {
    planner: Mutex<FftPlanner<f64>>,
}

impl RustFftTransform {
    pub fn new() -> Self {
        Self {
            planner: Mutex::new(FftPlanner::new()),
        }
    }
}

impl Default for RustFftTransform {
    fn default() -> Self {
        Self::new()
    }
}

impl SpectralTransform for RustFftTransform {
    fn forward(&self, buffer: &mut [Complex64]) {
        let fft = self
            .planner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .plan_fft_forward(buffer.len());
        fft.process(buffer);
    }
}

/// Angular extent of a far-field pattern, in degrees and as momentum transfer.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AngularRange {
    pub phi_min: f64,
    pub phi_max: f64,
    pub q_min: f64,
    pub q_max: f64,
}

impl AngularRange {
    pub fn new(phi_min: f64, phi_max: f64, wavenumber: f64) -> Self {
        let q = |phi: f64| phi * wavenumber * PI / 180.0;
        Self {
            phi_min,
            phi_max,
            q_min: q(phi_min),
            q_max: q(phi_max),
        }
    }

    /// Name and value pairs as stored alongside a saved pattern.
    pub fn attributes(&self) -> [(&'static str, f64); 4] {
        [
            ("phiMin", self.phi_min),
            ("phiMax", self.phi_max),
            ("qmin", self.q_min),
            ("qmax", self.q_max),
        ]
    }
}

/// A windowed far-field pattern.
#[derive(Clone, Debug)]
pub struct FarFieldPattern<D: Dimension> {
    pub values: Array<f64, D>,
    pub range: AngularRange,
}

impl<D: Dimension> FarFieldPattern<D> {
    /// `true` if the requested window did not contain a single frequency bin.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Extracts far-field patterns from exit fields of dimension `D`.
pub struct FarField<D: Dimension> {
    desc: FarFieldDescriptor,
    reference: Option<Array<Complex64, D>>,
    transform: Box<dyn SpectralTransform>,
}

impl<D: Dimension> FarField<D> {
    #[inline]
    pub fn new(desc: FarFieldDescriptor) -> Result<Self, Error> {
        Self::with_transform(desc, Box::new(RustFftTransform::new()))
    }

    /// Uses `transform` instead of the default `rustfft` backend.
    pub fn with_transform(
        desc: FarFieldDescriptor,
        transform: Box<dyn SpectralTransform>,
    ) -> Result<Self, Error> {
        let in_range = |angle: f64| angle.is_finite() && angle.abs() <= 90.0;
        if !(in_range(desc.angle_min) && in_range(desc.angle_max)) {
            return Err(Error::BadAngleRange {
                min: desc.angle_min,
                max: desc.angle_max,
            });
        }

        Ok(Self {
            desc,
            reference: None,
            transform,
        })
    }

    #[inline]
    pub fn descriptor(&self) -> &FarFieldDescriptor {
        &self.desc
    }

    /// Field subtracted from every exit field before padding.
    pub fn attach_reference(&mut self, reference: Array<Complex64, D>) {
        self.reference = Some(reference);
    }

    pub fn detach_reference(&mut self) -> Option<Array<Complex64, D>> {
        self.reference.take()
    }

    #[inline]
    pub fn reference(&self) -> Option<&Array<Complex64, D>> {
        self.reference.as_ref()
    }

    fn angular_range(&self, wavenumber: f64) -> AngularRange {
        AngularRange::new(self.desc.angle_min, self.desc.angle_max, wavenumber)
    }

    fn window(&self, size: usize, step: f64, wavenumber: f64) -> Range<usize> {
        if size == 0 || self.desc.angle_min > self.desc.angle_max {
            return 0..0;
        }
        angle_to_index(self.desc.angle_min, size, step, wavenumber)
            ..angle_to_index(self.desc.angle_max, size, step, wavenumber) + 1
    }

    fn subtract_reference(
        &self,
        field: ArrayView<Complex64, D>,
    ) -> Result<Array<Complex64, D>, Error> {
        match &self.reference {
            Some(reference) if reference.shape() != field.shape() => Err(Error::ShapeMismatch {
                array_name: "Reference",
                found: reference.shape().to_vec(),
                expected: field.shape().to_vec(),
            }),
            Some(reference) => {
                let mut difference = field.to_owned();
                difference -= reference;
                Ok(difference)
            }
            None => Ok(field.to_owned()),
        }
    }

    fn warn_experimental_padding(&self) {
        if self.desc.padding == Padding::LinearFit {
            log::warn!("linear-fit padding is experimental and may be unreliable");
        }
    }
}

fn warn_unresolved(window: &Range<usize>, size: usize, axis: &str) {
    if window.len() == size {
        log::warn!(
            "far field window covers the whole {} spectrum; the spatial resolution is insufficient",
            axis
        );
    }
}

impl FarField<Ix1> {
    /// Amplitude pattern of the exit field of a 2D simulation.
    pub fn compute(
        &self,
        field: ArrayView1<Complex64>,
        sim_params: &SimulationParameters,
    ) -> Result<FarFieldPattern<Ix1>, Error> {
        let k = sim_params.wavenumber;
        let range = self.angular_range(k);
        let size = self.desc.signal_length.max(field.len());
        let window = self.window(size, sim_params.x.step, k);
        if window.is_empty() {
            log::warn!(
                "far field window [{}°, {}°] is empty",
                self.desc.angle_min,
                self.desc.angle_max
            );
            return Ok(FarFieldPattern {
                values: Array1::zeros(0),
                range,
            });
        }
        warn_unresolved(&window, size, "x");
        self.warn_experimental_padding();

        let field = self.subtract_reference(field)?;
        let mut buffer = vec![self.desc.pad_value; size];
        pad_signal(&mut buffer, field.view(), self.desc.padding, self.desc.pad_value);
        self.transform.forward(&mut buffer);
        fftshift(&mut buffer);

        let norm = (size as f64).sqrt();
        let values = buffer[window].iter().map(|v| v.norm() / norm).collect::<Array1<f64>>();
        log::debug!("far field: {} of {} bins", values.len(), size);

        Ok(FarFieldPattern { values, range })
    }
}

impl FarField<Ix2> {
    /// Intensity pattern of the exit field of a 3D simulation, rows along y.
    ///
    /// The window must be representable on the grid (see [`verify_consistent_angles`]);
    /// this is checked before any transform is done.
    pub fn compute(
        &self,
        field: ArrayView2<Complex64>,
        sim_params: &SimulationParameters,
    ) -> Result<FarFieldPattern<Ix2>, Error> {
        let y = sim_params.y.as_ref().ok_or(Error::MissingAxis {
            axis: "y",
            required_by: "FarField",
        })?;
        let k = sim_params.wavenumber;
        verify_consistent_angles(self.desc.angle_max, sim_params.x.step, y.step, k)?;

        let range = self.angular_range(k);
        let (ny, nx) = field.dim();
        let rows_size = self.desc.signal_length.max(ny);
        let cols_size = self.desc.signal_length.max(nx);
        let rows = self.window(rows_size, y.step, k);
        let cols = self.window(cols_size, sim_params.x.step, k);
        if rows.is_empty() || cols.is_empty() {
            log::warn!(
                "far field window [{}°, {}°] is empty",
                self.desc.angle_min,
                self.desc.angle_max
            );
            return Ok(FarFieldPattern {
                values: Array2::zeros((rows.len(), cols.len())),
                range,
            });
        }
        warn_unresolved(&rows, rows_size, "y");
        warn_unresolved(&cols, cols_size, "x");
        self.warn_experimental_padding();

        let field = self.subtract_reference(field)?;
        let FarFieldDescriptor { padding, pad_value, .. } = self.desc;
        let transform = self.transform.as_ref();

        // y pass, one transform per column
        let mut partial = Array2::<Complex64>::zeros((rows.len(), nx));
        partial
            .axis_iter_mut(Axis(1))
            .into_par_iter()
            .zip(field.axis_iter(Axis(1)).into_par_iter())
            .for_each_init(
                || vec![pad_value; rows_size],
                |buffer, (mut out, column)| {
                    pad_signal(buffer, column, padding, pad_value);
                    transform.forward(buffer);
                    fftshift(buffer);
                    out.iter_mut()
                        .zip(&buffer[rows.clone()])
                        .for_each(|(value, &spectral)| *value = spectral);
                },
            );

        // x pass over the windowed rows
        let norm = cols_size as f64;
        let mut values = Array2::<f64>::zeros((rows.len(), cols.len()));
        values
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .zip(partial.axis_iter(Axis(0)).into_par_iter())
            .for_each_init(
                || vec![pad_value; cols_size],
                |buffer, (mut out, row)| {
                    pad_signal(buffer, row, padding, pad_value);
                    transform.forward(buffer);
                    fftshift(buffer);
                    out.iter_mut()
                        .zip(&buffer[cols.clone()])
                        .for_each(|(value, spectral)| *value = spectral.norm_sqr() / norm);
                },
            );
        log::debug!("far field: {:?} bins", values.dim());

        Ok(FarFieldPattern { values, range })
    }
}

/// Index in a shifted spectrum of `size` bins of the frequency scattered at
/// `angle` degrees. Saturates to `0` and `size - 1` beyond the representable range.
pub fn angle_to_index(angle: f64, size: usize, step: f64, wavenumber: f64) -> usize {
    if size == 0 {
        return 0;
    }
    let n = (size as f64 * wavenumber * step * angle.to_radians().sin() / (2.0 * PI)).floor();
    let index = n + (size / 2) as f64;
    if index <= 0.0 {
        0
    } else {
        (index as usize).min(size - 1)
    }
}

/// Largest scattering angle, in degrees, that a grid with steps `dx` and `dy` resolves.
pub fn max_scattering_angle(dx: f64, dy: f64, wavenumber: f64) -> f64 {
    let coarse = dx.max(dy);
    let ratio = PI / (coarse * wavenumber);
    if ratio >= 1.0 {
        180.0
    } else {
        2.0 * ratio.asin().to_degrees()
    }
}

/// Fails if `angle_max` is beyond what a grid with steps `dx` and `dy` resolves.
pub fn verify_consistent_angles(
    angle_max: f64,
    dx: f64,
    dy: f64,
    wavenumber: f64,
) -> Result<(), Error> {
    let max = max_scattering_angle(dx, dy, wavenumber);
    if angle_max > max {
        return Err(Error::ScatteringAngleTooLarge {
            requested: angle_max,
            max,
        });
    }
    Ok(())
}

/// Moves the zero-frequency bin from index `0` to index `len / 2`.
pub fn fftshift<T>(values: &mut [T]) {
    let half = values.len() / 2;
    values.rotate_right(half);
}

/// Centres `field` in `buffer` and fills the rest according to `padding`.
/// `buffer` must be at least as long as `field`.
fn pad_signal(
    buffer: &mut [Complex64],
    field: ArrayView1<Complex64>,
    padding: Padding,
    pad_value: Complex64,
) {
    let n = field.len();
    let start = (buffer.len() - n) / 2;
    let end = start + n;
    buffer.iter_mut().for_each(|value| *value = pad_value);
    buffer[start..end]
        .iter_mut()
        .zip(field.iter())
        .for_each(|(value, &sample)| *value = sample);
    if n == 0 || end - start == buffer.len() {
        return;
    }

    match padding {
        Padding::Zero => {}
        Padding::Constant => {
            let edge = field[0];
            buffer[..start].iter_mut().for_each(|value| *value = edge);
            buffer[end..].iter_mut().for_each(|value| *value = edge);
        }
        Padding::LinearFit => {
            let m = n.min(LINEAR_FIT_SAMPLES);

            let (intercept, slope) = fit_line((0..m).map(|i| (i as f64, field[i])));
            for (d, value) in buffer[..start].iter_mut().rev().enumerate() {
                *value = intercept - slope * (d + 1) as f64;
            }

            let (intercept, slope) = fit_line((n - m..n).map(|i| (i as f64, field[i])));
            for (d, value) in buffer[end..].iter_mut().enumerate() {
                *value = intercept + slope * (n + d) as f64;
            }
        }
    }
}

/// Least squares line through complex samples, real and imaginary parts independently.
/// Returns `(intercept, slope)`.
fn fit_line(samples: impl Iterator<Item = (f64, Complex64)>) -> (Complex64, Complex64) {
    let samples = samples.collect::<Vec<_>>();
    let count = samples.len() as f64;
    let x_mean = samples.iter().map(|&(x, _)| x).sum::<f64>() / count;
    let y_mean = samples.iter().map(|&(_, y)| y).sum::<Complex64>() / count;
    let sxx = samples.iter().map(|&(x, _)| (x - x_mean).powi(2)).sum::<f64>();
    let sxy = samples
        .iter()
        .map(|&(x, y)| (y - y_mean) * (x - x_mean))
        .sum::<Complex64>();
    let slope = if sxx > 0.0 { sxy / sxx } else { Complex64::new(0.0, 0.0) };
    (y_mean - slope * x_mean, slope)
}
