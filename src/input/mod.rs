//! # Image Input
//!
//! Decodes PNG/JPEG input with the `image` crate and reduces it to a single
//! intensity channel.
//!
//! Luma images (with or without alpha) are used as-is and alpha is dropped.
//! Multi-channel images go through a [`ChannelPolicy`]:
//!
//! - `RequireGray` accepts them only when every pixel has R == G == B, which
//!   covers grayscale pictures saved as RGB and rejects real color images
//! - `First` keeps the first (red) channel and drops the rest
//! - `Luma` converts with the `image` crate's luma weights
//!
//! 16-bit images are reduced to 8 bits by the `image` crate before any of this.

use std::fs;
use std::path::Path;

use image::{ColorType, DynamicImage};
use log::{debug, info};
use svd_core::IntensityMatrix;

use crate::error::{SvdError, SvdResult};

/// How to reduce a multi-channel image to one channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChannelPolicy {
    /// Accept only images whose color channels are identical everywhere.
    #[default]
    RequireGray,
    /// Take the first channel unconditionally.
    First,
    /// Weighted luma conversion.
    Luma,
}

/// Read and decode an image file into an intensity matrix.
pub fn load_intensity(path: &Path, policy: ChannelPolicy) -> SvdResult<IntensityMatrix> {
    let bytes = fs::read(path).map_err(|e| SvdError::io_at("read image", path, e))?;
    let image = image::load_from_memory(&bytes)
        .map_err(|e| SvdError::image_decode(Some(path), e.to_string()))?;
    info!(
        "loaded {} ({}x{}, {:?})",
        path.display(),
        image.width(),
        image.height(),
        image.color()
    );
    intensity_from_image(&image, policy)
}

/// Decode in-memory image bytes into an intensity matrix.
pub fn decode_intensity(bytes: &[u8], policy: ChannelPolicy) -> SvdResult<IntensityMatrix> {
    let image =
        image::load_from_memory(bytes).map_err(|e| SvdError::image_decode(None, e.to_string()))?;
    intensity_from_image(&image, policy)
}

/// Reduce a decoded image to one channel under `policy`.
pub fn intensity_from_image(
    image: &DynamicImage,
    policy: ChannelPolicy,
) -> SvdResult<IntensityMatrix> {
    let color = image.color();
    let width = image.width() as usize;
    let height = image.height() as usize;

    let pixels: Vec<u8> = if !color.has_color() {
        image.to_luma8().into_raw()
    } else {
        match policy {
            ChannelPolicy::Luma => image.to_luma8().into_raw(),
            ChannelPolicy::First => first_channel(image),
            ChannelPolicy::RequireGray => {
                ensure_gray(image, color)?;
                first_channel(image)
            }
        }
    };
    debug!(
        "reduced {:?} image to one channel with {:?}",
        color, policy
    );

    Ok(IntensityMatrix::from_gray_bytes(height, width, &pixels)?)
}

fn first_channel(image: &DynamicImage) -> Vec<u8> {
    image.to_rgb8().pixels().map(|p| p[0]).collect()
}

fn ensure_gray(image: &DynamicImage, color: ColorType) -> SvdResult<()> {
    let rgb = image.to_rgb8();
    if let Some((x, y, pixel)) = rgb
        .enumerate_pixels()
        .find(|(_, _, p)| p[0] != p[1] || p[1] != p[2])
    {
        return Err(SvdError::channel(
            format!("{:?}", color),
            format!(
                "pixel ({}, {}) has color {:?}; only grayscale images are supported",
                x, y, pixel.0
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};

    fn gray_rgb() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(3, 2, |x, y| {
            let v = (x * 40 + y * 100) as u8;
            Rgb([v, v, v])
        }))
    }

    fn colorful() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(2, 2, |x, _| {
            if x == 1 {
                Rgb([200, 10, 30])
            } else {
                Rgb([50, 50, 50])
            }
        }))
    }

    #[test]
    fn test_luma_is_used_directly() {
        let image = DynamicImage::ImageLuma8(GrayImage::from_fn(4, 3, |x, y| Luma([(x + y) as u8])));
        let matrix = intensity_from_image(&image, ChannelPolicy::RequireGray).unwrap();
        assert_eq!(matrix.shape(), (3, 4));
        assert_eq!(matrix.as_matrix()[(2, 3)], 5.0);
    }

    #[test]
    fn test_gray_stored_as_rgb_is_accepted() {
        let matrix = intensity_from_image(&gray_rgb(), ChannelPolicy::RequireGray).unwrap();
        assert_eq!(matrix.shape(), (2, 3));
        assert_eq!(matrix.as_matrix()[(1, 2)], 180.0);
    }

    #[test]
    fn test_color_is_rejected_by_default() {
        let err = intensity_from_image(&colorful(), ChannelPolicy::RequireGray).unwrap_err();
        assert_eq!(err.category(), "channel");
        assert!(err.to_string().contains("pixel (1, 0)"));
    }

    #[test]
    fn test_first_channel_policy() {
        let matrix = intensity_from_image(&colorful(), ChannelPolicy::First).unwrap();
        assert_eq!(matrix.as_matrix()[(0, 1)], 200.0);
        assert_eq!(matrix.as_matrix()[(0, 0)], 50.0);
    }

    #[test]
    fn test_luma_policy_and_alpha() {
        let matrix = intensity_from_image(&colorful(), ChannelPolicy::Luma).unwrap();
        assert_eq!(matrix.shape(), (2, 2));
        assert_eq!(matrix.as_matrix()[(0, 0)], 50.0);

        let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([90, 90, 90, 10])));
        let matrix = intensity_from_image(&rgba, ChannelPolicy::RequireGray).unwrap();
        assert_eq!(matrix.as_matrix()[(1, 1)], 90.0);
    }

    #[test]
    fn test_garbage_bytes() {
        let err = decode_intensity(b"definitely not an image", ChannelPolicy::First).unwrap_err();
        assert_eq!(err.category(), "image_decode");
    }
}
