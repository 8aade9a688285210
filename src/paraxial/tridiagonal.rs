use num_complex::Complex64;

/// A zero pivot was met while eliminating.
#[derive(thiserror::Error, Copy, Clone, Debug, PartialEq, Eq)]
#[error("Tridiagonal system is singular at row {row}")]
pub struct SingularPivot {
    pub row: usize,
}

/// A symmetric complex tridiagonal system `A x = rhs`.
///
/// The buffers are sized once and reused for every line of a sweep, so a worker
/// keeps a single `TridiagonalSystem` for a whole half-step.
#[derive(Clone, Debug)]
pub struct TridiagonalSystem {
    /// Main diagonal, length `n`.
    pub diag: Vec<Complex64>,
    /// Sub- (and super-) diagonal, length `n - 1`.
    pub subdiag: Vec<Complex64>,
    /// Right hand side, length `n`. Holds the solution after [`Self::solve`].
    pub rhs: Vec<Complex64>,
    scratch: Vec<Complex64>,
}

impl TridiagonalSystem {
    pub fn new(n: usize) -> Self {
        let zero = Complex64::new(0.0, 0.0);
        Self {
            diag: vec![zero; n],
            subdiag: vec![zero; n.saturating_sub(1)],
            rhs: vec![zero; n],
            scratch: vec![zero; n],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.diag.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.diag.is_empty()
    }

    /// Solves the system with the Thomas algorithm, leaving the solution in `rhs`.
    ///
    /// The diagonal is overwritten with the eliminated pivots.
    pub fn solve(&mut self) -> Result<&[Complex64], SingularPivot> {
        let n = self.len();
        if n == 0 {
            return Ok(&self.rhs);
        }

        // forward elimination
        let mut pivot = self.diag[0];
        if pivot.norm() == 0.0 {
            return Err(SingularPivot { row: 0 });
        }
        self.rhs[0] /= pivot;
        for i in 1..n {
            let off = self.subdiag[i - 1];
            self.scratch[i - 1] = off / pivot;
            pivot = self.diag[i] - off * self.scratch[i - 1];
            if pivot.norm() == 0.0 {
                return Err(SingularPivot { row: i });
            }
            self.diag[i] = pivot;
            self.rhs[i] = (self.rhs[i] - off * self.rhs[i - 1]) / pivot;
        }

        // back substitution
        for i in (0..n - 1).rev() {
            let next = self.rhs[i + 1];
            self.rhs[i] -= self.scratch[i] * next;
        }

        Ok(&self.rhs)
    }
}
