//! # Export
//!
//! Turns pipeline output into bytes a user can keep: PNG buffers held in
//! memory, base64 data URIs for embedding, and a side-by-side comparison of
//! the original and the reconstruction.
//!
//! Nothing here touches the disk except [`write_bytes`]; callers decide
//! whether a buffer is written, printed or handed to another layer.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose, Engine as _};
use image::{imageops, GrayImage, ImageFormat, Luma};
use log::debug;
use svd_core::{ExportedImage, IntensityMatrix};

use crate::error::{SvdError, SvdResult};

/// Background of the gap between comparison panels.
const COMPARISON_BACKGROUND: u8 = 255;

fn to_gray_image(width: u32, height: u32, pixels: Vec<u8>) -> SvdResult<GrayImage> {
    GrayImage::from_raw(width, height, pixels).ok_or_else(|| {
        SvdError::encode(
            "png",
            format!("pixel buffer does not match {}x{}", width, height),
        )
    })
}

/// View an exported image as an `image` crate buffer.
pub fn exported_to_gray(exported: &ExportedImage) -> SvdResult<GrayImage> {
    to_gray_image(
        exported.width(),
        exported.height(),
        exported.pixels().to_vec(),
    )
}

/// View the source intensities as an 8-bit buffer.
pub fn intensity_to_gray(image: &IntensityMatrix) -> SvdResult<GrayImage> {
    to_gray_image(
        image.cols() as u32,
        image.rows() as u32,
        image.to_gray_bytes(),
    )
}

/// Encode a grayscale buffer as PNG in memory.
pub fn encode_gray_png(image: &GrayImage) -> SvdResult<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| SvdError::encode("png", e.to_string()))?;
    Ok(buffer.into_inner())
}

/// Encode an exported image as a single-channel PNG in memory.
pub fn encode_png(exported: &ExportedImage) -> SvdResult<Vec<u8>> {
    let bytes = encode_gray_png(&exported_to_gray(exported)?)?;
    debug!(
        "encoded {}x{} export into {} PNG bytes",
        exported.width(),
        exported.height(),
        bytes.len()
    );
    Ok(bytes)
}

/// `data:image/png;base64,...` URI for PNG bytes.
pub fn data_uri(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", general_purpose::STANDARD.encode(png))
}

/// Place the original (left) and the reconstruction (right) on one canvas.
///
/// Panels are top-aligned; the gap and any height difference are white.
pub fn compose_comparison(
    original: &IntensityMatrix,
    exported: &ExportedImage,
    gap: u32,
) -> SvdResult<GrayImage> {
    let left = intensity_to_gray(original)?;
    let right = exported_to_gray(exported)?;

    let width = left.width() + gap + right.width();
    let height = left.height().max(right.height());
    let mut canvas = GrayImage::from_pixel(width, height, Luma([COMPARISON_BACKGROUND]));
    imageops::overlay(&mut canvas, &left, 0, 0);
    imageops::overlay(&mut canvas, &right, i64::from(left.width() + gap), 0);
    Ok(canvas)
}

/// Path of the export for `rank`. A single export keeps `output` unchanged;
/// several exports get `_k<rank>` inserted before the extension.
pub fn output_path_for_rank(output: &Path, rank: usize, multiple: bool) -> PathBuf {
    if !multiple {
        return output.to_path_buf();
    }
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match output.extension() {
        Some(ext) => format!("{}_k{}.{}", stem, rank, ext.to_string_lossy()),
        None => format!("{}_k{}", stem, rank),
    };
    output.with_file_name(name)
}

/// Write an export buffer, creating missing parent directories.
pub fn write_bytes(path: &Path, bytes: &[u8]) -> SvdResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| SvdError::io_at("create directory", parent, e))?;
    }
    fs::write(path, bytes).map_err(|e| SvdError::io_at("write export", path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_for_rank() {
        let out = Path::new("out/result_svd.png");
        assert_eq!(output_path_for_rank(out, 5, false), PathBuf::from("out/result_svd.png"));
        assert_eq!(output_path_for_rank(out, 5, true), PathBuf::from("out/result_svd_k5.png"));
        assert_eq!(
            output_path_for_rank(Path::new("plain"), 12, true),
            PathBuf::from("plain_k12")
        );
    }

    #[test]
    fn test_data_uri_prefix() {
        let uri = data_uri(&[0x89, b'P', b'N', b'G']);
        assert_eq!(uri, "data:image/png;base64,iVBORw==");
    }

    #[test]
    fn test_comparison_layout() {
        let original = IntensityMatrix::from_gray_bytes(3, 2, &[10, 20, 30, 40, 50, 60]).unwrap();
        let exported = ExportedImage::filled(2, 4, 0);
        let canvas = compose_comparison(&original, &exported, 3).unwrap();

        assert_eq!(canvas.dimensions(), (2 + 3 + 4, 3));
        assert_eq!(canvas.get_pixel(1, 2)[0], 60);
        assert_eq!(canvas.get_pixel(3, 0)[0], COMPARISON_BACKGROUND);
        assert_eq!(canvas.get_pixel(5, 0)[0], 0);
        assert_eq!(canvas.get_pixel(5, 2)[0], COMPARISON_BACKGROUND);
    }
}
