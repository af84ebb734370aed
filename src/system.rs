//! Sparse symmetric positive-definite linear systems.
//!
//! Both solvers assemble their matrix as triplets and hand them to
//! [`SpdSystem`], which either factors the matrix once (sparse Cholesky)
//! or keeps it for Jacobi-preconditioned conjugate-gradient solves.

use crate::types::{Error, Result, SolveMethod};
use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::factorization::CscCholesky;
use nalgebra_sparse::{CooMatrix, CscMatrix};

/// Relative residual at which conjugate gradient stops.
const CG_TOLERANCE: f64 = 1e-12;

/// A factored (or factorable) sparse SPD system of a fixed size.
///
/// The factorisation is owned exclusively by the instance; the type is
/// deliberately not `Clone`.
pub struct SpdSystem {
    size: usize,
    matrix: CscMatrix<f64>,
    jacobi: Vec<f64>,
    cholesky: Option<CscCholesky<f64>>,
}

impl SpdSystem {
    /// Assemble from `(row, col, value)` triplets and prepare for solving.
    ///
    /// Duplicate triplets are summed. With [`SolveMethod::Cholesky`] the
    /// matrix is factored immediately; a factorisation failure means the
    /// assembled matrix was not positive definite and is surfaced as an
    /// error rather than recovered.
    pub fn assemble(
        size: usize,
        triplets: &[(usize, usize, f64)],
        method: SolveMethod,
    ) -> Result<Self> {
        let mut coo = CooMatrix::new(size, size);
        for &(i, j, v) in triplets {
            coo.push(i, j, v);
        }
        let matrix = CscMatrix::from(&coo);

        let mut diag = vec![0.0f64; size];
        for (i, j, v) in matrix.triplet_iter() {
            if i == j {
                diag[i] += *v;
            }
        }
        let jacobi = diag
            .into_iter()
            .map(|d| if d > 0.0 { 1.0 / d } else { 1.0 })
            .collect();

        let cholesky = match method {
            SolveMethod::Cholesky if size > 0 => {
                let factor = CscCholesky::factor(&matrix).map_err(|_| {
                    Error::Factorization("matrix is not positive definite".into())
                })?;
                Some(factor)
            }
            _ => None,
        };

        Ok(Self {
            size,
            matrix,
            jacobi,
            cholesky,
        })
    }

    /// Number of unknowns.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Solve `A x = b`.
    pub fn solve(&self, b: &[f64]) -> Vec<f64> {
        debug_assert_eq!(b.len(), self.size);
        if self.size == 0 {
            return Vec::new();
        }
        match &self.cholesky {
            Some(factor) => {
                let rhs = DMatrix::from_column_slice(self.size, 1, b);
                let x = factor.solve(&rhs);
                (0..self.size).map(|i| x[(i, 0)]).collect()
            }
            None => self.conjugate_gradient(b),
        }
    }

    fn spmv(&self, x: &DVector<f64>) -> DVector<f64> {
        let mut y = DVector::zeros(self.size);
        for (i, j, v) in self.matrix.triplet_iter() {
            y[i] += *v * x[j];
        }
        y
    }

    fn precondition(&self, r: &DVector<f64>) -> DVector<f64> {
        DVector::from_iterator(self.size, r.iter().zip(&self.jacobi).map(|(ri, di)| ri * di))
    }

    fn conjugate_gradient(&self, b: &[f64]) -> Vec<f64> {
        let b = DVector::from_column_slice(b);
        let mut x = DVector::zeros(self.size);
        let b_norm = b.norm();
        if b_norm == 0.0 {
            return x.as_slice().to_vec();
        }
        let tolerance = CG_TOLERANCE * b_norm;

        let mut r = b;
        let mut z = self.precondition(&r);
        let mut p = z.clone();
        let mut rz = r.dot(&z);
        let max_iterations = 20 * self.size + 50;

        for _ in 0..max_iterations {
            if r.norm() <= tolerance {
                break;
            }
            let ap = self.spmv(&p);
            let pap = p.dot(&ap);
            if pap <= 0.0 {
                log::warn!("conjugate gradient hit a non-positive curvature direction");
                break;
            }
            let alpha = rz / pap;
            x.axpy(alpha, &p, 1.0);
            r.axpy(-alpha, &ap, 1.0);
            z = self.precondition(&r);
            let rz_next = r.dot(&z);
            let beta = rz_next / rz;
            rz = rz_next;
            p *= beta;
            p += &z;
        }

        x.as_slice().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn laplacian_1d(n: usize) -> Vec<(usize, usize, f64)> {
        let mut t = Vec::new();
        for i in 0..n {
            t.push((i, i, 2.0));
            if i + 1 < n {
                t.push((i, i + 1, -1.0));
                t.push((i + 1, i, -1.0));
            }
        }
        t
    }

    #[test]
    fn test_cholesky_solves_tridiagonal() {
        let triplets = laplacian_1d(5);
        let system = SpdSystem::assemble(5, &triplets, SolveMethod::Cholesky).unwrap();
        // b chosen so that x = [1, 2, 3, 4, 5] is the exact solution.
        let b = vec![0.0, 0.0, 0.0, 0.0, 6.0];
        let x = system.solve(&b);
        for (i, &xi) in x.iter().enumerate() {
            assert!((xi - (i + 1) as f64).abs() < 1e-9, "x[{}] = {}", i, xi);
        }
    }

    #[test]
    fn test_cg_matches_cholesky() {
        let triplets = laplacian_1d(8);
        let chol = SpdSystem::assemble(8, &triplets, SolveMethod::Cholesky).unwrap();
        let cg = SpdSystem::assemble(8, &triplets, SolveMethod::ConjugateGradient).unwrap();
        let b: Vec<f64> = (0..8).map(|i| (i as f64).sin() + 2.0).collect();
        let xa = chol.solve(&b);
        let xb = cg.solve(&b);
        for (a, b) in xa.iter().zip(&xb) {
            assert!((a - b).abs() < 1e-8);
        }
    }

    #[test]
    fn test_duplicate_triplets_are_summed() {
        let triplets = vec![(0, 0, 1.5), (0, 0, 0.5)];
        let system = SpdSystem::assemble(1, &triplets, SolveMethod::Cholesky).unwrap();
        let x = system.solve(&[4.0]);
        assert!((x[0] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_system() {
        let system = SpdSystem::assemble(0, &[], SolveMethod::Cholesky).unwrap();
        assert_eq!(system.size(), 0);
        assert!(system.solve(&[]).is_empty());
    }

    #[test]
    fn test_indefinite_matrix_is_rejected() {
        let triplets = vec![(0, 0, -1.0)];
        assert!(SpdSystem::assemble(1, &triplets, SolveMethod::Cholesky).is_err());
    }
}
