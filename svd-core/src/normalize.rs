// SPDX-License-Identifier: MIT
//! # Normalizer / Encoder
//!
//! Min-max maps a real matrix onto `0..=255`:
//! `round(255 * (v - min) / (max - min))`, clamped. The minimum lands on 0 and
//! the maximum on 255, so any non-constant input uses the full 8-bit range.
//!
//! A constant matrix has no range to stretch. [`normalize_and_encode`] treats
//! only an exactly constant matrix that way, so any spread at all, however
//! small, is stretched to `0..=255`. A reconstruction of a constant image
//! carries rounding noise around the constant instead; for those callers pass
//! the noise floor of the factors (see
//! [`noise_floor`](crate::reconstruct::noise_floor)) to
//! [`normalize_above_floor`] or [`encode_with_fallback`].

use log::warn;
use nalgebra::DMatrix;

use crate::error::{CoreError, CoreResult};
use crate::matrix::ExportedImage;

/// Pixel value used for constant inputs under [`DegeneratePolicy::MidGray`].
pub const MID_GRAY: u8 = 128;

/// What to emit when the input has no usable range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DegeneratePolicy {
    /// Every pixel becomes [`MID_GRAY`].
    #[default]
    MidGray,
    /// Every pixel becomes the constant itself, rounded and clamped to `0..=255`.
    Preserve,
    /// Return [`CoreError::DegenerateRange`].
    Reject,
}

/// Minimum and maximum over all entries.
///
/// Fails on empty input or on any non-finite entry.
pub fn value_range(matrix: &DMatrix<f64>) -> CoreResult<(f64, f64)> {
    let (rows, cols) = matrix.shape();
    if rows == 0 || cols == 0 {
        return Err(CoreError::EmptyMatrix { rows, cols });
    }
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for c in 0..cols {
        for r in 0..rows {
            let v = matrix[(r, c)];
            if !v.is_finite() {
                return Err(CoreError::NonFinite { row: r, col: c, value: v });
            }
            min = min.min(v);
            max = max.max(v);
        }
    }
    Ok((min, max))
}

/// Normalize `matrix` to an 8-bit image of the same shape.
///
/// Fails with [`CoreError::DegenerateRange`] when every entry is equal.
pub fn normalize_and_encode(matrix: &DMatrix<f64>) -> CoreResult<ExportedImage> {
    normalize_above_floor(matrix, 0.0)
}

/// Normalize `matrix`, treating a spread of at most `noise_floor` as constant.
pub fn normalize_above_floor(matrix: &DMatrix<f64>, noise_floor: f64) -> CoreResult<ExportedImage> {
    let (min, max) = value_range(matrix)?;
    if max - min <= noise_floor {
        return Err(CoreError::DegenerateRange { value: (min + max) / 2.0 });
    }

    let (rows, cols) = matrix.shape();
    let scale = 255.0 / (max - min);
    let mut pixels = Vec::with_capacity(rows * cols);
    for r in 0..rows {
        for c in 0..cols {
            let v = ((matrix[(r, c)] - min) * scale).round().clamp(0.0, 255.0);
            pixels.push(v as u8);
        }
    }
    Ok(ExportedImage::new(rows, cols, pixels))
}

/// Normalize `matrix`, resolving constant input according to `policy`.
///
/// A regular result always holds both 0 and 255, so a fallback image is
/// recognizable by [`ExportedImage::is_uniform`].
pub fn encode_with_fallback(
    matrix: &DMatrix<f64>,
    policy: DegeneratePolicy,
    noise_floor: f64,
) -> CoreResult<ExportedImage> {
    match normalize_above_floor(matrix, noise_floor) {
        Err(CoreError::DegenerateRange { value }) => {
            let (rows, cols) = matrix.shape();
            let fill = match policy {
                DegeneratePolicy::Reject => return Err(CoreError::DegenerateRange { value }),
                DegeneratePolicy::MidGray => MID_GRAY,
                DegeneratePolicy::Preserve => value.round().clamp(0.0, 255.0) as u8,
            };
            warn!(
                "constant {}x{} matrix (value {:.3}); emitting flat image of {}",
                rows, cols, value, fill
            );
            Ok(ExportedImage::filled(rows, cols, fill))
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maps_extremes_to_full_range() {
        let m = DMatrix::from_row_slice(2, 2, &[-10.0, 0.0, 5.0, 20.0]);
        let img = normalize_and_encode(&m).unwrap();
        assert_eq!(img.pixels(), &[0, 85, 128, 255]);
    }

    #[test]
    fn test_rounds_rather_than_truncates() {
        // 255 * 1/3 = 85.0, 255 * 2/3 = 170.0, 255 * 0.5 = 127.5 -> 128
        let m = DMatrix::from_row_slice(1, 4, &[0.0, 1.0, 1.5, 3.0]);
        let img = normalize_and_encode(&m).unwrap();
        assert_eq!(img.pixels(), &[0, 85, 128, 255]);
    }

    #[test]
    fn test_constant_is_degenerate() {
        let m = DMatrix::from_element(3, 4, 7.5);
        assert_eq!(
            normalize_and_encode(&m).unwrap_err(),
            CoreError::DegenerateRange { value: 7.5 }
        );
    }

    #[test]
    fn test_noise_below_floor_is_degenerate() {
        let mut m = DMatrix::from_element(3, 3, 128.0);
        m[(0, 0)] = 128.0 + 1e-11;
        m[(2, 1)] = 128.0 - 2e-11;
        assert!(matches!(
            normalize_above_floor(&m, 1e-9),
            Err(CoreError::DegenerateRange { .. })
        ));
        // without a floor the same spread is stretched
        let img = normalize_and_encode(&m).unwrap();
        assert_eq!(img.get(0, 0), 255);
        assert_eq!(img.get(2, 1), 0);
    }

    #[test]
    fn test_tiny_spread_still_spans_full_range() {
        let m = DMatrix::from_row_slice(1, 2, &[0.0, 5e-10]);
        assert_eq!(normalize_and_encode(&m).unwrap().pixels(), &[0, 255]);

        let m = DMatrix::from_row_slice(1, 3, &[1e6, 1e6 + 1e-4, 1e6 + 5e-4]);
        assert_eq!(normalize_and_encode(&m).unwrap().pixels(), &[0, 51, 255]);
    }

    #[test]
    fn test_fallback_policies() {
        let m = DMatrix::from_element(2, 3, 300.0);
        let gray = encode_with_fallback(&m, DegeneratePolicy::MidGray, 0.0).unwrap();
        assert_eq!(gray, ExportedImage::filled(2, 3, MID_GRAY));
        assert!(gray.is_uniform());

        let kept = encode_with_fallback(&m, DegeneratePolicy::Preserve, 0.0).unwrap();
        assert!(kept.pixels().iter().all(|&p| p == 255));

        assert!(matches!(
            encode_with_fallback(&m, DegeneratePolicy::Reject, 0.0),
            Err(CoreError::DegenerateRange { .. })
        ));
    }

    #[test]
    fn test_fallback_passes_through_regular_input() {
        let m = DMatrix::from_row_slice(1, 2, &[1.0, 2.0]);
        let img = encode_with_fallback(&m, DegeneratePolicy::Reject, 0.0).unwrap();
        assert_eq!(img.pixels(), &[0, 255]);
        assert!(!img.is_uniform());
    }

    #[test]
    fn test_rejects_non_finite_and_empty() {
        let mut m = DMatrix::from_element(2, 2, 1.0);
        m[(1, 1)] = f64::NEG_INFINITY;
        assert!(matches!(
            normalize_and_encode(&m),
            Err(CoreError::NonFinite { row: 1, col: 1, .. })
        ));
        assert!(matches!(
            normalize_and_encode(&DMatrix::zeros(0, 0)),
            Err(CoreError::EmptyMatrix { .. })
        ));
    }
}
