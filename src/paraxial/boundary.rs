//! Transparent boundary synthesis.
//!
//! The field just outside the grid is extrapolated from the two outermost samples
//! of the previous solution, `u[edge + 1] = u[edge] * exp(i kEdge)` with
//! `kEdge = -i ln(u[edge] / u[edge - 1])`. Only outgoing waves are let through:
//! the real part of `kEdge` is clamped to be non-negative.

use ndarray::ArrayView1;
use num_complex::Complex64;

/// Inner samples at or below this magnitude disable the boundary estimate.
pub const NEGLIGIBLE_MAGNITUDE: f64 = 1e-6;

/// Estimates the dimensionless transverse wavenumber `kEdge` (per grid step) at an
/// edge, or `None` when the inner sample is too small to divide by.
pub fn edge_wavenumber(outer: Complex64, inner: Complex64) -> Option<Complex64> {
    if !(inner.norm() > NEGLIGIBLE_MAGNITUDE) {
        return None;
    }
    let ratio = outer / inner;
    // -i ln(r) = arg(r) - i ln|r|
    Some(Complex64::new(ratio.arg().max(0.0), -ratio.norm().ln()))
}

/// The factor `exp(i kEdge)` relating the ghost node to the edge node.
pub fn edge_factor(outer: Complex64, inner: Complex64) -> Option<Complex64> {
    edge_wavenumber(outer, inner).map(|k_edge| Complex64::from_polar((-k_edge.im).exp(), k_edge.re))
}

/// Folds the ghost nodes of the implicit direction into the first and last
/// diagonal entries. `coupling` is the off-diagonal coefficient of the system.
pub(crate) fn absorb_implicit_edges(
    diag: &mut [Complex64],
    line: ArrayView1<Complex64>,
    coupling: Complex64,
) {
    let n = line.len();
    if n < 2 {
        return;
    }
    if let Some(factor) = edge_factor(line[n - 1], line[n - 2]) {
        diag[n - 1] += coupling * factor;
    }
    if let Some(factor) = edge_factor(line[0], line[1]) {
        diag[0] += coupling * factor;
    }
}

/// Contribution of the ghost node of the explicit direction to the right hand side.
/// `coupling` is the explicit neighbour coefficient.
#[inline]
pub(crate) fn explicit_edge_term(
    outer: Complex64,
    inner: Complex64,
    coupling: Complex64,
) -> Complex64 {
    match edge_factor(outer, inner) {
        Some(factor) => coupling * factor * outer,
        None => Complex64::new(0.0, 0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array1;

    #[test]
    fn recovers_outgoing_plane_wave() {
        let q = 0.3;
        let dx = 0.5;
        let wave = |j: f64| Complex64::from_polar(2.0, q * dx * j + 0.1);

        let k_edge = edge_wavenumber(wave(10.0), wave(9.0)).unwrap();
        assert_relative_eq!(k_edge.re, q * dx, epsilon = 1e-12);
        assert_relative_eq!(k_edge.im, 0.0, epsilon = 1e-12);

        let factor = edge_factor(wave(10.0), wave(9.0)).unwrap();
        let ghost = wave(10.0) * factor;
        assert_relative_eq!(ghost.re, wave(11.0).re, epsilon = 1e-12);
        assert_relative_eq!(ghost.im, wave(11.0).im, epsilon = 1e-12);
    }

    #[test]
    fn incoming_waves_are_clamped() {
        let wave = |j: f64| Complex64::from_polar(1.0, -0.4 * j);
        let k_edge = edge_wavenumber(wave(1.0), wave(0.0)).unwrap();
        assert_eq!(k_edge.re, 0.0);
    }

    #[test]
    fn decaying_field_gives_decay_factor() {
        let k_edge = edge_wavenumber(Complex64::new(0.5, 0.0), Complex64::new(1.0, 0.0)).unwrap();
        assert_relative_eq!(k_edge.im, 2f64.ln(), epsilon = 1e-12);
        let factor = edge_factor(Complex64::new(0.0, 0.0), Complex64::new(1.0, 0.0)).unwrap();
        assert_eq!(factor, Complex64::new(0.0, 0.0));
    }

    #[test]
    fn negligible_neighbour_skips_correction() {
        let coupling = Complex64::new(0.0, -0.5);
        let line = Array1::from(vec![
            Complex64::new(1.0, 0.0),
            Complex64::new(0.0, 0.0),
            Complex64::new(1.0, 0.0),
            Complex64::new(1e-7, 0.0),
            Complex64::new(1.0, 0.0),
        ]);
        let mut diag = vec![Complex64::new(3.0, 1.0); 5];
        absorb_implicit_edges(&mut diag, line.view(), coupling);
        assert!(diag.iter().all(|&d| d == Complex64::new(3.0, 1.0)));

        let term = explicit_edge_term(line[0], line[1], coupling);
        assert_eq!(term, Complex64::new(0.0, 0.0));
        assert!(edge_wavenumber(line[4], line[3]).is_none());
    }

    #[test]
    fn uniform_line_gets_full_coupling() {
        let coupling = Complex64::new(0.0, -0.25);
        let line = Array1::from_elem(4, Complex64::new(0.0, 2.0));
        let mut diag = vec![Complex64::new(1.0, 0.0); 4];
        absorb_implicit_edges(&mut diag, line.view(), coupling);
        assert_eq!(diag[0], Complex64::new(1.0, -0.25));
        assert_eq!(diag[3], Complex64::new(1.0, -0.25));
        assert_eq!(diag[1], Complex64::new(1.0, 0.0));
    }
}
