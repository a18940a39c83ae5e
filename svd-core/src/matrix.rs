// SPDX-License-Identifier: MIT
//! # Intensity and exported image containers
//!
//! [`IntensityMatrix`] is the single-channel brightness matrix that enters the
//! pipeline. [`ExportedImage`] is the 8-bit raster that leaves it. Both are
//! plain owned data, so a caller serving several requests can hand each one
//! its own copy.

use nalgebra::DMatrix;

use crate::error::{CoreError, CoreResult};

/// Real-valued reconstruction of shape `(rows, cols)`.
pub type ReconstructedMatrix = DMatrix<f64>;

/// Immutable single-channel intensity matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct IntensityMatrix {
    data: DMatrix<f64>,
}

impl IntensityMatrix {
    /// Build from row-major values.
    pub fn from_row_major(rows: usize, cols: usize, values: &[f64]) -> CoreResult<Self> {
        if values.len() != rows * cols {
            return Err(CoreError::ShapeMismatch {
                expected: (rows, cols),
                actual: (values.len() / cols.max(1), cols),
            });
        }
        Ok(Self {
            data: DMatrix::from_row_slice(rows, cols, values),
        })
    }

    /// Build from a tightly packed 8-bit grayscale raster of `rows` lines of
    /// `cols` pixels.
    pub fn from_gray_bytes(rows: usize, cols: usize, pixels: &[u8]) -> CoreResult<Self> {
        if pixels.len() != rows * cols {
            return Err(CoreError::ShapeMismatch {
                expected: (rows, cols),
                actual: (pixels.len() / cols.max(1), cols),
            });
        }
        Ok(Self {
            data: DMatrix::from_fn(rows, cols, |r, c| f64::from(pixels[r * cols + c])),
        })
    }

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    pub fn shape(&self) -> (usize, usize) {
        self.data.shape()
    }

    /// Largest admissible rank, `min(rows, cols)`.
    pub fn max_rank(&self) -> usize {
        self.rows().min(self.cols())
    }

    /// Half of `min(rows, cols)`, ties to even, never below 1.
    pub fn default_rank(&self) -> usize {
        default_rank(self.rows(), self.cols())
    }

    pub fn as_matrix(&self) -> &DMatrix<f64> {
        &self.data
    }

    pub fn into_matrix(self) -> DMatrix<f64> {
        self.data
    }

    /// Row-major 8-bit view of the intensities, rounded and clamped.
    pub fn to_gray_bytes(&self) -> Vec<u8> {
        let (rows, cols) = self.shape();
        let mut out = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                out.push(self.data[(r, c)].round().clamp(0.0, 255.0) as u8);
            }
        }
        out
    }
}

impl From<DMatrix<f64>> for IntensityMatrix {
    fn from(data: DMatrix<f64>) -> Self {
        Self { data }
    }
}

/// Default rank for a `rows x cols` matrix: `min(rows, cols) / 2` rounded
/// half to even, so 3 -> 2, 5 -> 2, 7 -> 4.
pub fn default_rank(rows: usize, cols: usize) -> usize {
    let smaller = rows.min(cols);
    let half = smaller / 2;
    let rounded = if smaller % 2 == 1 && half % 2 == 1 {
        half + 1
    } else {
        half
    };
    rounded.max(1)
}

/// 8-bit single-channel raster, row-major, same shape as the source matrix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportedImage {
    rows: usize,
    cols: usize,
    pixels: Vec<u8>,
}

impl ExportedImage {
    pub(crate) fn new(rows: usize, cols: usize, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(pixels.len(), rows * cols);
        Self { rows, cols, pixels }
    }

    /// Image filled with a single value.
    pub fn filled(rows: usize, cols: usize, value: u8) -> Self {
        Self::new(rows, cols, vec![value; rows * cols])
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Raster width, i.e. the column count.
    pub fn width(&self) -> u32 {
        self.cols as u32
    }

    /// Raster height, i.e. the row count.
    pub fn height(&self) -> u32 {
        self.rows as u32
    }

    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.pixels[row * self.cols + col]
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// True when every pixel has the same value.
    pub fn is_uniform(&self) -> bool {
        self.pixels.windows(2).all(|w| w[0] == w[1])
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gray_bytes_are_row_major() {
        let m = IntensityMatrix::from_gray_bytes(2, 3, &[1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(m.shape(), (2, 3));
        assert_eq!(m.as_matrix()[(0, 2)], 3.0);
        assert_eq!(m.as_matrix()[(1, 0)], 4.0);
        assert_eq!(m.to_gray_bytes(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_length_mismatch_is_rejected() {
        assert!(IntensityMatrix::from_gray_bytes(3, 3, &[0; 8]).is_err());
        assert!(IntensityMatrix::from_row_major(2, 2, &[0.0; 5]).is_err());
    }

    #[test]
    fn test_default_rank_rounds_ties_to_even() {
        assert_eq!(default_rank(1, 1), 1);
        assert_eq!(default_rank(2, 7), 1);
        assert_eq!(default_rank(3, 3), 2);
        assert_eq!(default_rank(10, 4), 2);
        assert_eq!(default_rank(480, 640), 240);
        assert_eq!(default_rank(5, 9), 2);
        assert_eq!(default_rank(7, 20), 4);
        assert_eq!(default_rank(9, 9), 4);
        assert_eq!(default_rank(13, 40), 6);
    }

    #[test]
    fn test_uniform_detection() {
        assert!(ExportedImage::filled(2, 2, 9).is_uniform());
        assert!(ExportedImage::filled(1, 1, 0).is_uniform());
        assert!(!ExportedImage::new(1, 2, vec![0, 255]).is_uniform());
    }
}
