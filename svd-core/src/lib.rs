// SPDX-License-Identifier: MIT
//! # svd-core: Rank-k SVD Image Approximation
//!
//! This crate holds the numerical engine behind low-rank grayscale image
//! compression: decompose an intensity matrix, keep its `k` largest singular
//! triplets, multiply them back, and map the result onto 8-bit pixels.
//!
//! ## Pipeline
//!
//! Decomposer → Reconstructor → Normalizer/Encoder, with no feedback between
//! stages. The factors produced by the decomposer are read-only and may be
//! reused for any number of ranks.
//!
//! ## Key Components
//!
//! - [`decompose`]: full SVD with descending singular values and square orthonormal factors
//! - [`reconstruct`]: rank-`k` truncation using a `k x k` diagonal
//! - [`normalize`]: min-max mapping onto `0..=255` with explicit constant-input handling
//! - [`metrics`]: Frobenius error, Eckart-Young bound, retained energy, storage ratio
//! - [`matrix`]: intensity matrix and exported image containers
//!
//! ## Usage Example
//!
//! ```rust
//! use svd_core::{decompose, normalize_and_encode, reconstruct, IntensityMatrix};
//!
//! let pixels: Vec<u8> = (0..64).map(|i| (i * 4) as u8).collect();
//! let image = IntensityMatrix::from_gray_bytes(8, 8, &pixels)?;
//!
//! let factors = decompose(image.as_matrix())?;
//! let approx = reconstruct(&factors, image.default_rank())?;
//! let exported = normalize_and_encode(&approx)?;
//! assert_eq!((exported.rows(), exported.cols()), image.shape());
//! # Ok::<(), svd_core::CoreError>(())
//! ```

pub mod decompose;
pub mod error;
pub mod matrix;
pub mod metrics;
pub mod normalize;
pub mod reconstruct;

pub use decompose::{decompose, decompose_with, DecomposeOptions, SvdFactors};
pub use error::{CoreError, CoreResult, DecompositionFailure};
pub use matrix::{default_rank, ExportedImage, IntensityMatrix, ReconstructedMatrix};
pub use metrics::ReconstructionMetrics;
pub use normalize::{
    encode_with_fallback, normalize_above_floor, normalize_and_encode, DegeneratePolicy, MID_GRAY,
};
pub use reconstruct::{noise_floor, reconstruct, validate_rank};
