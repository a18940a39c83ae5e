// SPDX-License-Identifier: MIT
// Reconstruction quality measures.

use nalgebra::DMatrix;

use crate::error::{CoreError, CoreResult};

/// Square root of the sum of squared entries.
pub fn frobenius_norm(matrix: &DMatrix<f64>) -> f64 {
    matrix.norm()
}

/// `‖a − b‖_F`; the operands must have the same shape.
pub fn frobenius_error(a: &DMatrix<f64>, b: &DMatrix<f64>) -> CoreResult<f64> {
    if a.shape() != b.shape() {
        return Err(CoreError::ShapeMismatch {
            expected: a.shape(),
            actual: b.shape(),
        });
    }
    Ok((a - b).norm())
}

/// Eckart-Young lower bound: `sqrt(Σ_{i>k} s_i²)`.
pub fn theoretical_error(singular_values: &[f64], rank: usize) -> f64 {
    singular_values
        .iter()
        .skip(rank)
        .map(|s| s * s)
        .sum::<f64>()
        .sqrt()
}

/// Share of `Σ s_i²` carried by the first `rank` values. A zero matrix retains everything.
pub fn energy_retained(singular_values: &[f64], rank: usize) -> f64 {
    let total: f64 = singular_values.iter().map(|s| s * s).sum();
    if total == 0.0 {
        return 1.0;
    }
    let kept: f64 = singular_values.iter().take(rank).map(|s| s * s).sum();
    kept / total
}

/// Numbers stored by a rank-`k` truncation relative to the dense matrix.
pub fn storage_ratio(rows: usize, cols: usize, rank: usize) -> f64 {
    (rank * (rows + cols + 1)) as f64 / (rows * cols) as f64
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReconstructionMetrics {
    pub rank: usize,
    pub frobenius_error: f64,
    pub theoretical_error: f64,
    pub relative_error: f64,
    pub energy_retained: f64,
    pub storage_ratio: f64,
}

impl ReconstructionMetrics {
    /// Compare `reconstruction` against `original` for a rank-`rank` truncation.
    pub fn measure(
        original: &DMatrix<f64>,
        reconstruction: &DMatrix<f64>,
        singular_values: &[f64],
        rank: usize,
    ) -> CoreResult<Self> {
        let error = frobenius_error(original, reconstruction)?;
        let norm = frobenius_norm(original);
        let (rows, cols) = original.shape();
        Ok(Self {
            rank,
            frobenius_error: error,
            theoretical_error: theoretical_error(singular_values, rank),
            relative_error: if norm == 0.0 { 0.0 } else { error / norm },
            energy_retained: energy_retained(singular_values, rank),
            storage_ratio: storage_ratio(rows, cols, rank),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_theoretical_error() {
        let s = [3.0, 2.0, 2.0, 1.0];
        assert_abs_diff_eq!(theoretical_error(&s, 1), 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(theoretical_error(&s, 4), 0.0);
    }

    #[test]
    fn test_energy_retained() {
        let s = [3.0, 1.0];
        assert_abs_diff_eq!(energy_retained(&s, 1), 0.9, epsilon = 1e-12);
        assert_abs_diff_eq!(energy_retained(&s, 2), 1.0);
        assert_abs_diff_eq!(energy_retained(&[0.0, 0.0], 1), 1.0);
    }

    #[test]
    fn test_storage_ratio() {
        assert_abs_diff_eq!(storage_ratio(100, 100, 10), 0.201, epsilon = 1e-12);
    }

    #[test]
    fn test_shape_mismatch() {
        let a = DMatrix::<f64>::zeros(2, 3);
        let b = DMatrix::<f64>::zeros(3, 2);
        assert!(frobenius_error(&a, &b).is_err());
    }
}
