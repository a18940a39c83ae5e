// SPDX-License-Identifier: MIT
//! # Decomposer
//!
//! Computes the full singular value decomposition `M = U · diag(S) · V` of a
//! real matrix. `U` is `rows x rows`, `V` is `cols x cols` (stored with the
//! right singular vectors as rows) and `S` holds the `min(rows, cols)`
//! singular values in descending order.
//!
//! The thin factors come from nalgebra's bidiagonal SVD. Its result is
//! checked before use: the factors must multiply back to the input and the
//! singular vectors must be orthonormal. nalgebra gets some rank-deficient
//! inputs wrong (constant and rank-1 matrices among them), so a rejected
//! result is recomputed with one-sided Jacobi, which is slower but exact on
//! those shapes. The thin factors are then completed to square orthonormal
//! bases by Gram-Schmidt against the standard basis. The completed part never
//! takes part in a truncated product.

use log::debug;
use nalgebra::linalg::SVD;
use nalgebra::{DMatrix, DVector};

use crate::error::{CoreError, CoreResult, DecompositionFailure};

/// Residual norm below which a completion candidate is treated as dependent.
const COMPLETION_TOLERANCE: f64 = 1e-8;

/// Accepted `||U S V - M||_F`, relative to `max(1, ||M||_F)`.
const RESIDUAL_TOLERANCE: f64 = 1e-9;

/// Accepted largest entry of `UᵀU - I` and `V Vᵀ - I`.
const ORTHONORMALITY_TOLERANCE: f64 = 1e-9;

/// Sweep cap for the Jacobi fallback.
const JACOBI_MAX_SWEEPS: usize = 60;

/// Convergence knobs for the iterative SVD.
#[derive(Clone, Copy, Debug)]
pub struct DecomposeOptions {
    /// Off-diagonal magnitude treated as zero.
    pub epsilon: f64,
    /// Iteration cap; `0` iterates until convergence.
    pub max_iterations: usize,
}

impl Default for DecomposeOptions {
    fn default() -> Self {
        Self {
            epsilon: f64::EPSILON,
            max_iterations: 0,
        }
    }
}

/// Full SVD factors of a `rows x cols` matrix.
#[derive(Clone, Debug)]
pub struct SvdFactors {
    u: DMatrix<f64>,
    singular_values: DVector<f64>,
    v: DMatrix<f64>,
}

impl SvdFactors {
    /// Assemble factors from parts, checking that their shapes agree.
    ///
    /// `u` must be square `rows x rows`, `v` square `cols x cols`, and
    /// `singular_values` must hold `min(rows, cols)` non-negative values in
    /// descending order.
    pub fn from_parts(
        u: DMatrix<f64>,
        singular_values: Vec<f64>,
        v: DMatrix<f64>,
    ) -> CoreResult<Self> {
        if !u.is_square() || !v.is_square() {
            return Err(CoreError::FactorShape {
                reason: format!(
                    "U ({}x{}) and V ({}x{}) must be square",
                    u.nrows(),
                    u.ncols(),
                    v.nrows(),
                    v.ncols()
                ),
            });
        }
        let expected = u.nrows().min(v.nrows());
        if singular_values.len() != expected {
            return Err(CoreError::FactorShape {
                reason: format!(
                    "expected {} singular values, got {}",
                    expected,
                    singular_values.len()
                ),
            });
        }
        if singular_values.iter().any(|s| !s.is_finite() || *s < 0.0) {
            return Err(CoreError::FactorShape {
                reason: "singular values must be finite and non-negative".to_string(),
            });
        }
        if singular_values.windows(2).any(|w| w[0] < w[1]) {
            return Err(CoreError::FactorShape {
                reason: "singular values must be in descending order".to_string(),
            });
        }
        Ok(Self {
            u,
            singular_values: DVector::from_vec(singular_values),
            v,
        })
    }

    /// Left singular basis, `rows x rows`.
    pub fn u(&self) -> &DMatrix<f64> {
        &self.u
    }

    /// Singular values, descending.
    pub fn singular_values(&self) -> &[f64] {
        self.singular_values.as_slice()
    }

    /// Right singular basis as rows, `cols x cols`.
    pub fn v(&self) -> &DMatrix<f64> {
        &self.v
    }

    /// Shape of the decomposed matrix.
    pub fn shape(&self) -> (usize, usize) {
        (self.u.nrows(), self.v.ncols())
    }

    /// Number of singular values, i.e. the largest admissible rank.
    pub fn max_rank(&self) -> usize {
        self.singular_values.len()
    }
}

/// Decompose with default convergence settings.
pub fn decompose(matrix: &DMatrix<f64>) -> CoreResult<SvdFactors> {
    decompose_with(matrix, &DecomposeOptions::default())
}

/// Decompose `matrix` into full, descending-ordered SVD factors.
///
/// `options` tune the bidiagonal SVD only; the Jacobi fallback runs until its
/// columns are orthogonal or [`JACOBI_MAX_SWEEPS`] sweeps have passed.
pub fn decompose_with(matrix: &DMatrix<f64>, options: &DecomposeOptions) -> CoreResult<SvdFactors> {
    let (rows, cols) = matrix.shape();
    validate_input(matrix)?;
    let tolerance = RESIDUAL_TOLERANCE * matrix.norm().max(1.0);

    let factors = match bidiagonal_svd(matrix, options).and_then(|f| verify(matrix, f, tolerance)) {
        Ok(factors) => factors,
        Err(failure) => {
            debug!(
                "bidiagonal SVD of {}x{} matrix rejected ({}), retrying with Jacobi",
                rows, cols, failure
            );
            verify(matrix, jacobi_svd(matrix)?, tolerance)?
        }
    };

    debug!(
        "decomposed {}x{} matrix: {} singular values, largest {:.4}",
        rows,
        cols,
        factors.max_rank(),
        factors.singular_values().first().copied().unwrap_or(0.0)
    );
    Ok(factors)
}

fn bidiagonal_svd(
    matrix: &DMatrix<f64>,
    options: &DecomposeOptions,
) -> Result<SvdFactors, DecompositionFailure> {
    let (rows, cols) = matrix.shape();
    let no_convergence = DecompositionFailure::NoConvergence {
        max_iterations: options.max_iterations,
    };
    let svd = SVD::try_new(matrix.clone(), true, true, options.epsilon, options.max_iterations)
        .ok_or_else(|| no_convergence.clone())?;
    let (thin_u, thin_v_t) = match (svd.u, svd.v_t) {
        (Some(u), Some(v_t)) => (u, v_t),
        _ => return Err(no_convergence),
    };

    let (thin_u, singular_values, thin_v_t) =
        sort_descending(&thin_u, &svd.singular_values, &thin_v_t);

    Ok(SvdFactors {
        u: complete_orthonormal_columns(thin_u, rows)?,
        singular_values,
        v: complete_orthonormal_columns(thin_v_t.transpose(), cols)?.transpose(),
    })
}

/// SVD by one-sided Jacobi on the tall orientation of `matrix`.
fn jacobi_svd(matrix: &DMatrix<f64>) -> Result<SvdFactors, DecompositionFailure> {
    let (rows, cols) = matrix.shape();
    if rows >= cols {
        let (u, singular_values, v) = one_sided_jacobi(matrix.clone())?;
        Ok(SvdFactors {
            u: complete_orthonormal_columns(u, rows)?,
            singular_values,
            v: v.transpose(),
        })
    } else {
        // Mᵀ = U S Vᵀ gives M = V S Uᵀ.
        let (u, singular_values, v) = one_sided_jacobi(matrix.transpose())?;
        Ok(SvdFactors {
            u: v,
            singular_values,
            v: complete_orthonormal_columns(u, cols)?.transpose(),
        })
    }
}

/// Hestenes one-sided Jacobi on a matrix with `rows >= cols`.
///
/// Rotates column pairs until every pair is orthogonal, accumulating the
/// rotations in `V`. Returns the normalized columns for the singular values
/// above the noise floor, all `cols` singular values in descending order,
/// and the full right basis as columns, in the same order.
fn one_sided_jacobi(
    mut a: DMatrix<f64>,
) -> Result<(DMatrix<f64>, DVector<f64>, DMatrix<f64>), DecompositionFailure> {
    let (rows, cols) = a.shape();
    let mut v = DMatrix::<f64>::identity(cols, cols);
    let tolerance = f64::EPSILON * rows as f64;

    let mut sweeps = 0;
    loop {
        let mut rotated = false;
        for p in 0..cols.saturating_sub(1) {
            for q in p + 1..cols {
                let alpha = a.column(p).norm_squared();
                let beta = a.column(q).norm_squared();
                let gamma = a.column(p).dot(&a.column(q));
                if gamma.abs() <= tolerance * alpha.sqrt() * beta.sqrt() {
                    continue;
                }
                rotated = true;
                let zeta = (beta - alpha) / (2.0 * gamma);
                let t = zeta.signum() / (zeta.abs() + (1.0 + zeta * zeta).sqrt());
                let c = 1.0 / (1.0 + t * t).sqrt();
                let s = c * t;
                rotate_columns(&mut a, p, q, c, s);
                rotate_columns(&mut v, p, q, c, s);
            }
        }
        if !rotated {
            break;
        }
        sweeps += 1;
        if sweeps == JACOBI_MAX_SWEEPS {
            return Err(DecompositionFailure::NoConvergence {
                max_iterations: JACOBI_MAX_SWEEPS,
            });
        }
    }

    let norms: Vec<f64> = (0..cols).map(|j| a.column(j).norm()).collect();
    let mut order: Vec<usize> = (0..cols).collect();
    order.sort_by(|&x, &y| norms[y].total_cmp(&norms[x]));

    // Columns at the noise floor carry no direction; completion replaces them.
    let largest = order.first().map_or(0.0, |&j| norms[j]);
    let floor = largest * f64::EPSILON * rows as f64;
    let kept = order.iter().take_while(|&&j| norms[j] > floor).count();

    let u = DMatrix::from_fn(rows, kept, |r, c| a[(r, order[c])] / norms[order[c]]);
    let singular_values = DVector::from_fn(cols, |i, _| norms[order[i]]);
    let sorted_v = DMatrix::from_fn(cols, cols, |r, c| v[(r, order[c])]);
    Ok((u, singular_values, sorted_v))
}

/// Apply the plane rotation `[c s; -s c]` to columns `p` and `q`.
fn rotate_columns(m: &mut DMatrix<f64>, p: usize, q: usize, c: f64, s: f64) {
    for r in 0..m.nrows() {
        let mp = m[(r, p)];
        let mq = m[(r, q)];
        m[(r, p)] = c * mp - s * mq;
        m[(r, q)] = s * mp + c * mq;
    }
}

/// Accept factors only if they reproduce `matrix` and their leading
/// singular vectors are orthonormal.
fn verify(
    matrix: &DMatrix<f64>,
    factors: SvdFactors,
    tolerance: f64,
) -> Result<SvdFactors, DecompositionFailure> {
    let k = factors.max_rank();
    let u = factors.u.columns(0, k);
    let v = factors.v.rows(0, k);

    let residual = (u * DMatrix::from_diagonal(&factors.singular_values) * v - matrix).norm();
    if residual > tolerance {
        return Err(DecompositionFailure::Inaccurate {
            residual,
            tolerance,
        });
    }

    let identity = DMatrix::<f64>::identity(k, k);
    let drift = (u.transpose() * u - &identity)
        .amax()
        .max((v * v.transpose() - &identity).amax());
    if drift > ORTHONORMALITY_TOLERANCE {
        return Err(DecompositionFailure::NotOrthonormal { drift });
    }
    Ok(factors)
}

fn validate_input(matrix: &DMatrix<f64>) -> CoreResult<()> {
    let (rows, cols) = matrix.shape();
    if rows == 0 || cols == 0 {
        return Err(DecompositionFailure::Empty { rows, cols }.into());
    }
    for c in 0..cols {
        for r in 0..rows {
            let value = matrix[(r, c)];
            if !value.is_finite() {
                return Err(DecompositionFailure::NonFinite { row: r, col: c, value }.into());
            }
        }
    }
    Ok(())
}

/// Reorder singular triplets so the values are descending.
fn sort_descending(
    u: &DMatrix<f64>,
    singular_values: &DVector<f64>,
    v_t: &DMatrix<f64>,
) -> (DMatrix<f64>, DVector<f64>, DMatrix<f64>) {
    let mut order: Vec<usize> = (0..singular_values.len()).collect();
    order.sort_by(|&a, &b| singular_values[b].total_cmp(&singular_values[a]));

    let sorted_u = DMatrix::from_fn(u.nrows(), order.len(), |r, c| u[(r, order[c])]);
    let sorted_s = DVector::from_fn(order.len(), |i, _| singular_values[order[i]]);
    let sorted_v_t = DMatrix::from_fn(order.len(), v_t.ncols(), |r, c| v_t[(order[r], c)]);
    (sorted_u, sorted_s, sorted_v_t)
}

/// Extend orthonormal columns to a full `dim x dim` orthonormal basis.
///
/// Existing columns are kept as-is and in place.
fn complete_orthonormal_columns(
    partial: DMatrix<f64>,
    dim: usize,
) -> Result<DMatrix<f64>, DecompositionFailure> {
    if partial.ncols() == dim {
        return Ok(partial);
    }

    let mut basis: Vec<DVector<f64>> = partial.column_iter().map(|c| c.into_owned()).collect();
    for axis in 0..dim {
        if basis.len() == dim {
            break;
        }
        let mut candidate = DVector::<f64>::zeros(dim);
        candidate[axis] = 1.0;
        // Two passes of classical Gram-Schmidt keep the result orthogonal to machine precision.
        for _ in 0..2 {
            for b in &basis {
                let projection = b.dot(&candidate);
                candidate -= b * projection;
            }
        }
        let norm = candidate.norm();
        if norm > COMPLETION_TOLERANCE {
            basis.push(candidate / norm);
        }
    }

    if basis.len() != dim {
        return Err(DecompositionFailure::BasisCompletion {
            dim,
            found: basis.len(),
        });
    }
    Ok(DMatrix::from_columns(&basis))
}
