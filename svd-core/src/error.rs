// SPDX-License-Identifier: MIT
// Error kinds raised by the decomposition, reconstruction and normalization stages.
// Every failure is local and deterministic; no stage returns partial output.

use std::fmt;

/// Why a decomposition could not be produced.
#[derive(Debug, Clone, PartialEq)]
pub enum DecompositionFailure {
    /// One of the dimensions is zero.
    Empty { rows: usize, cols: usize },
    /// NaN or infinity at the given position.
    NonFinite { row: usize, col: usize, value: f64 },
    /// The iterative SVD did not converge within the iteration budget.
    NoConvergence { max_iterations: usize },
    /// An orthonormal complement could not be built for a factor.
    BasisCompletion { dim: usize, found: usize },
    /// The factors do not multiply back to the input.
    Inaccurate { residual: f64, tolerance: f64 },
    /// The singular vectors drifted away from orthonormality.
    NotOrthonormal { drift: f64 },
}

impl fmt::Display for DecompositionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecompositionFailure::Empty { rows, cols } => {
                write!(f, "matrix is empty ({}x{})", rows, cols)
            }
            DecompositionFailure::NonFinite { row, col, value } => {
                write!(f, "non-finite value {} at ({}, {})", value, row, col)
            }
            DecompositionFailure::NoConvergence { max_iterations } => {
                write!(f, "SVD did not converge after {} iterations", max_iterations)
            }
            DecompositionFailure::BasisCompletion { dim, found } => {
                write!(f, "could only build {} of {} orthonormal basis vectors", found, dim)
            }
            DecompositionFailure::Inaccurate { residual, tolerance } => write!(
                f,
                "factors reproduce the input only to {:.3e} (tolerance {:.3e})",
                residual, tolerance
            ),
            DecompositionFailure::NotOrthonormal { drift } => {
                write!(f, "singular vectors are off orthonormal by {:.3e}", drift)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CoreError {
    /// The input matrix cannot be decomposed.
    Decomposition(DecompositionFailure),
    /// Rank outside `[1, max]`.
    InvalidRank { rank: usize, max: usize },
    /// Normalization input is constant (max == min within tolerance).
    DegenerateRange { value: f64 },
    /// Normalization input holds NaN or infinity.
    NonFinite { row: usize, col: usize, value: f64 },
    /// Normalization input has no elements.
    EmptyMatrix { rows: usize, cols: usize },
    /// Hand-assembled factors do not fit together.
    FactorShape { reason: String },
    /// Buffer length or operand shapes disagree.
    ShapeMismatch { expected: (usize, usize), actual: (usize, usize) },
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::Decomposition(failure) => write!(f, "Decomposition failed: {}", failure),
            CoreError::InvalidRank { rank, max } => {
                write!(f, "Invalid rank {}: must be between 1 and {}", rank, max)
            }
            CoreError::DegenerateRange { value } => {
                write!(f, "Cannot normalize a constant matrix (every value is {})", value)
            }
            CoreError::NonFinite { row, col, value } => {
                write!(f, "Cannot normalize non-finite value {} at ({}, {})", value, row, col)
            }
            CoreError::EmptyMatrix { rows, cols } => {
                write!(f, "Cannot normalize an empty {}x{} matrix", rows, cols)
            }
            CoreError::FactorShape { reason } => write!(f, "Inconsistent SVD factors: {}", reason),
            CoreError::ShapeMismatch { expected, actual } => write!(
                f,
                "Shape mismatch: expected {}x{}, got {}x{}",
                expected.0, expected.1, actual.0, actual.1
            ),
        }
    }
}

impl std::error::Error for CoreError {}

impl From<DecompositionFailure> for CoreError {
    fn from(failure: DecompositionFailure) -> Self {
        Self::Decomposition(failure)
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
