// SPDX-License-Identifier: MIT
//! # Reconstructor
//!
//! Rank-`k` truncation of an SVD. The product
//! `U[:, :k] · diag(S[:k]) · V[:k, :]` is the best rank-`k` approximation of
//! the decomposed matrix in the Frobenius norm (Eckart-Young), which is why the
//! *leading* singular values are the ones kept.
//!
//! Only a `k x k` diagonal is materialized; no `rows x cols` sigma matrix is
//! ever built.

use log::debug;
use nalgebra::{DMatrix, DVector};

use crate::decompose::SvdFactors;
use crate::error::{CoreError, CoreResult};
use crate::matrix::ReconstructedMatrix;

/// Multiple of `σ₁ · ε · max(rows, cols)` that a reconstruction's spread
/// must exceed to count as non-constant.
const NOISE_FLOOR_ULPS: f64 = 1024.0;

/// Spread below which a reconstruction from `factors` is rounding noise
/// around a constant.
pub fn noise_floor(factors: &SvdFactors) -> f64 {
    let (rows, cols) = factors.shape();
    let largest = factors.singular_values().first().copied().unwrap_or(0.0);
    largest * f64::EPSILON * rows.max(cols) as f64 * NOISE_FLOOR_ULPS
}

/// Check `1 <= rank <= max`.
pub fn validate_rank(rank: usize, max: usize) -> CoreResult<()> {
    if rank == 0 || rank > max {
        return Err(CoreError::InvalidRank { rank, max });
    }
    Ok(())
}

/// Rebuild the matrix from its `rank` leading singular triplets.
///
/// The rank is checked against the number of singular values actually held by
/// `factors`.
pub fn reconstruct(factors: &SvdFactors, rank: usize) -> CoreResult<ReconstructedMatrix> {
    validate_rank(rank, factors.max_rank())?;

    let u_k = factors.u().columns(0, rank);
    let sigma_k = DMatrix::from_diagonal(&DVector::from_column_slice(
        &factors.singular_values()[..rank],
    ));
    let v_k = factors.v().rows(0, rank);

    let reconstruction = u_k * sigma_k * v_k;
    let (rows, cols) = reconstruction.shape();
    debug!("reconstructed {}x{} matrix at rank {}", rows, cols, rank);
    Ok(reconstruction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decompose::decompose;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_rank_bounds() {
        let m = DMatrix::from_fn(3, 5, |r, c| (r + 2 * c) as f64);
        let factors = decompose(&m).unwrap();
        assert_eq!(
            reconstruct(&factors, 0).unwrap_err(),
            CoreError::InvalidRank { rank: 0, max: 3 }
        );
        assert_eq!(
            reconstruct(&factors, 4).unwrap_err(),
            CoreError::InvalidRank { rank: 4, max: 3 }
        );
        assert_eq!(reconstruct(&factors, 1).unwrap().shape(), (3, 5));
        assert_eq!(reconstruct(&factors, 3).unwrap().shape(), (3, 5));
    }

    #[test]
    fn test_rank_is_checked_against_actual_factors() {
        let factors = SvdFactors::from_parts(
            DMatrix::identity(2, 2),
            vec![3.0, 1.0],
            DMatrix::identity(2, 2),
        )
        .unwrap();
        assert!(reconstruct(&factors, 2).is_ok());
        assert!(matches!(
            reconstruct(&factors, 3),
            Err(CoreError::InvalidRank { rank: 3, max: 2 })
        ));
    }

    #[test]
    fn test_rank_one_of_outer_product() {
        // x · yᵀ has rank one, so k = 1 is already exact
        let x = DVector::from_vec(vec![1.0, 2.0, 3.0]);
        let y = DVector::from_vec(vec![4.0, 0.5, -1.0, 2.0]);
        let m = &x * y.transpose();
        let factors = decompose(&m).unwrap();
        let approx = reconstruct(&factors, 1).unwrap();
        assert_abs_diff_eq!(approx, m, epsilon = 1e-10);
    }

    #[test]
    fn test_noise_floor_scales_with_largest_singular_value() {
        let small = decompose(&DMatrix::from_element(4, 6, 1.0)).unwrap();
        let large = decompose(&DMatrix::from_element(4, 6, 100.0)).unwrap();
        assert!(noise_floor(&small) > 0.0);
        assert_abs_diff_eq!(noise_floor(&large), 100.0 * noise_floor(&small), epsilon = 1e-15);

        let zero = decompose(&DMatrix::zeros(3, 3)).unwrap();
        assert_eq!(noise_floor(&zero), 0.0);
    }

    #[test]
    fn test_hand_built_factors() {
        let factors = SvdFactors::from_parts(
            DMatrix::identity(2, 2),
            vec![4.0, 2.0],
            DMatrix::identity(3, 3),
        )
        .unwrap();
        let m = reconstruct(&factors, 1).unwrap();
        let expected = DMatrix::from_row_slice(2, 3, &[4.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(m, expected);
    }
}
