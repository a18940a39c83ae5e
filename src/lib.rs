//! # SVD Image Compression Library
//!
//! Low-rank approximation of grayscale images by truncated singular value
//! decomposition. An image is loaded as an intensity matrix, decomposed once,
//! and reconstructed from its `k` largest singular triplets for one or more
//! ranks `k`; each reconstruction is min-max normalized to 8 bits and exported
//! as PNG.
//!
//! ## Architecture
//!
//! The numeric engine lives in the `svd-core` crate. This crate wraps it with:
//! - `input`: image decoding and reduction to a single channel
//! - `session`: cached decomposition and per-rank evaluation
//! - `export`: in-memory PNG buffers, data URIs and comparison figures
//! - `config`: configuration and validation shared with the CLI
//! - `error`: error types with context, severity and recovery hints
//!
//! ## Example
//!
//! ```rust,no_run
//! use svd_image_compress::{compress_image, config::CompressConfig};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CompressConfig::new(
//!     "portrait.png".to_string(),
//!     "portrait_k40.png".to_string(),
//!     vec![40],
//! );
//! config.validate()?;
//!
//! let report = compress_image(config.to_options())?;
//! println!("{}", report.to_json());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

use log::info;
use serde_json::{json, Value};
use svd_core::{validate_rank, DegeneratePolicy, ReconstructionMetrics};

pub mod config;
pub mod error;
pub mod export;
pub mod input;
pub mod session;

/// Re-export error types for convenience
pub use error::{HasRecoverySuggestion, HasSeverity, Recoverable, SvdError, SvdResult};
pub use input::ChannelPolicy;
pub use session::{CompressionSession, Evaluation};

/// Options for one compression run.
///
/// Usually produced by [`config::CompressConfig::to_options`] after
/// validation.
#[derive(Debug, Clone)]
pub struct CompressOptions {
    /// Image to compress.
    pub input: String,

    /// PNG export path; suffixed with `_k<rank>` when several ranks are given.
    pub output: String,

    /// Ranks to evaluate. Empty means the default rank.
    pub ranks: Vec<usize>,

    /// Channel reduction for multi-channel input.
    pub channel: ChannelPolicy,

    /// Handling of constant reconstructions.
    pub degenerate: DegeneratePolicy,

    /// Side-by-side figure of the original and the first rank's export.
    pub comparison: Option<String>,

    /// Gap between the comparison panels, in pixels.
    pub comparison_gap: u32,

    /// Attach a base64 data URI of each export to the report.
    pub data_uri: bool,

    /// SVD iteration cap, `0` = until convergence.
    pub max_iterations: usize,
}

/// What one rank produced.
#[derive(Debug, Clone)]
pub struct RankOutput {
    pub path: PathBuf,
    pub metrics: ReconstructionMetrics,
    pub flat: bool,
    pub png_bytes: usize,
    pub data_uri: Option<String>,
}

/// Summary of a compression run.
#[derive(Debug, Clone)]
pub struct CompressionReport {
    pub input: PathBuf,
    pub rows: usize,
    pub cols: usize,
    pub max_rank: usize,
    pub default_rank: usize,
    pub singular_values: Vec<f64>,
    pub decompose_ms: f64,
    pub outputs: Vec<RankOutput>,
    pub comparison: Option<PathBuf>,
}

/// Number of leading singular values listed in the JSON report.
const REPORTED_SINGULAR_VALUES: usize = 10;

impl CompressionReport {
    /// Report as JSON.
    pub fn to_json(&self) -> Value {
        let outputs: Vec<Value> = self
            .outputs
            .iter()
            .map(|o| {
                json!({
                    "rank": o.metrics.rank,
                    "path": o.path.display().to_string(),
                    "png_bytes": o.png_bytes,
                    "flat": o.flat,
                    "frobenius_error": o.metrics.frobenius_error,
                    "theoretical_error": o.metrics.theoretical_error,
                    "relative_error": o.metrics.relative_error,
                    "energy_retained": o.metrics.energy_retained,
                    "storage_ratio": o.metrics.storage_ratio,
                    "data_uri": o.data_uri,
                })
            })
            .collect();
        json!({
            "input": self.input.display().to_string(),
            "shape": [self.rows, self.cols],
            "max_rank": self.max_rank,
            "default_rank": self.default_rank,
            "leading_singular_values": self
                .singular_values
                .iter()
                .take(REPORTED_SINGULAR_VALUES)
                .collect::<Vec<_>>(),
            "decompose_ms": self.decompose_ms,
            "outputs": outputs,
            "comparison": self.comparison.as_ref().map(|p| p.display().to_string()),
        })
    }
}

/// Load, decompose, evaluate every requested rank and write the exports.
///
/// All ranks are validated and every buffer is encoded before the first file
/// is written, so a bad rank or a rejected constant reconstruction writes
/// nothing.
///
/// # Errors
///
/// Returns an error if:
/// - the input cannot be read, decoded, or reduced to one channel
/// - the image cannot be decomposed
/// - a rank is outside `[1, min(rows, cols)]`
/// - a reconstruction is constant and the policy is `Reject`
/// - an export cannot be encoded or written
pub fn compress_image(options: CompressOptions) -> SvdResult<CompressionReport> {
    let input_path = PathBuf::from(&options.input);
    let image = input::load_intensity(&input_path, options.channel)?;
    let (rows, cols) = image.shape();

    let ranks = if options.ranks.is_empty() {
        vec![image.default_rank()]
    } else {
        options.ranks.clone()
    };
    for &rank in &ranks {
        validate_rank(rank, image.max_rank())
            .map_err(|e| SvdError::from(e).with_context(format!("image is {}x{}", rows, cols)))?;
    }

    let session = CompressionSession::builder(image)
        .with_max_iterations(options.max_iterations)
        .with_degenerate_policy(options.degenerate)
        .build()?;

    let output = PathBuf::from(&options.output);
    let multiple = ranks.len() > 1;
    let mut pending: Vec<(PathBuf, Vec<u8>)> = Vec::new();
    let mut outputs = Vec::with_capacity(ranks.len());
    let mut first_export = None;

    for &rank in &ranks {
        let evaluation = session.evaluate(rank)?;
        let png = export::encode_png(&evaluation.exported)?;
        let path = export::output_path_for_rank(&output, rank, multiple);
        outputs.push(RankOutput {
            path: path.clone(),
            metrics: evaluation.metrics,
            flat: evaluation.flat,
            png_bytes: png.len(),
            data_uri: options.data_uri.then(|| export::data_uri(&png)),
        });
        pending.push((path, png));
        if first_export.is_none() {
            first_export = Some(evaluation.exported);
        }
    }

    let comparison = match (&options.comparison, first_export) {
        (Some(path), Some(exported)) => {
            let figure =
                export::compose_comparison(session.image(), &exported, options.comparison_gap)?;
            let path = PathBuf::from(path);
            pending.push((path.clone(), export::encode_gray_png(&figure)?));
            Some(path)
        }
        _ => None,
    };

    for (path, bytes) in &pending {
        export::write_bytes(path, bytes)?;
        info!("wrote {}", path.display());
    }

    Ok(CompressionReport {
        input: input_path,
        rows,
        cols,
        max_rank: session.max_rank(),
        default_rank: session.default_rank(),
        singular_values: session.singular_values().to_vec(),
        decompose_ms: session.decompose_time().as_secs_f64() * 1000.0,
        outputs,
        comparison,
    })
}

/// Evaluate one rank of an in-memory image and return the PNG export.
///
/// This is the request/response form of the pipeline: nothing is written to
/// disk and the buffer belongs to the caller.
pub fn compress_bytes(
    image_bytes: &[u8],
    rank: Option<usize>,
    channel: ChannelPolicy,
    degenerate: DegeneratePolicy,
) -> SvdResult<(Evaluation, Vec<u8>)> {
    let image = input::decode_intensity(image_bytes, channel)?;
    let rank = rank.unwrap_or_else(|| image.default_rank());
    validate_rank(rank, image.max_rank())?;
    let session = CompressionSession::builder(image)
        .with_degenerate_policy(degenerate)
        .build()?;
    let evaluation = session.evaluate(rank)?;
    let png = export::encode_png(&evaluation.exported)?;
    Ok((evaluation, png))
}

/// Human-readable one-line summary of a rank output.
pub fn describe_output(output: &RankOutput) -> String {
    let m = &output.metrics;
    format!(
        "k={:<4} error={:.3} (optimum {:.3}) relative={:.4} energy={:.2}% storage={:.1}% -> {}{}",
        m.rank,
        m.frobenius_error,
        m.theoretical_error,
        m.relative_error,
        m.energy_retained * 100.0,
        m.storage_ratio * 100.0,
        output.path.display(),
        if output.flat { " (flat)" } else { "" }
    )
}
