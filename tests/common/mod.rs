//! Common test utilities for the compression tests
//!
//! Synthetic grayscale fixtures, written to temporary directories as PNG
//! when a test needs a file on disk.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use image::{GrayImage, Luma, Rgb, RgbImage};
use svd_core::IntensityMatrix;

/// Standard fixture sizes (width, height)
pub const SMALL: (u32, u32) = (16, 12);
pub const WIDE: (u32, u32) = (40, 9);

/// Horizontal ramp with a checkerboard overlay, so the spectrum has
/// several significant singular values.
pub fn textured_gray(width: u32, height: u32) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| {
        let ramp = (x * 180 / width.max(1)) as u8;
        let checker = if (x / 3 + y / 3) % 2 == 0 { 60 } else { 0 };
        Luma([ramp.saturating_add(checker).saturating_add((y * 5) as u8)])
    })
}

/// Every pixel set to `value`.
pub fn constant_gray(width: u32, height: u32, value: u8) -> GrayImage {
    GrayImage::from_pixel(width, height, Luma([value]))
}

/// A genuinely colored image.
pub fn colored(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| Rgb([(x * 10) as u8, (y * 10) as u8, 77]))
}

/// Intensity matrix of a gray fixture.
pub fn intensity_of(image: &GrayImage) -> IntensityMatrix {
    IntensityMatrix::from_gray_bytes(image.height() as usize, image.width() as usize, image.as_raw())
        .expect("fixture buffer matches its dimensions")
}

/// Save a fixture as PNG under `dir`.
pub fn save_png<P>(dir: &Path, name: &str, image: &image::ImageBuffer<P, Vec<u8>>) -> PathBuf
where
    P: image::Pixel<Subpixel = u8> + image::PixelWithColorType,
{
    let path = dir.join(name);
    image.save(&path).expect("fixture can be written");
    path
}

/// Encoded PNG bytes of a gray fixture.
pub fn png_bytes(image: &GrayImage) -> Vec<u8> {
    let mut buffer = std::io::Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, image::ImageFormat::Png)
        .expect("fixture can be encoded");
    buffer.into_inner()
}
