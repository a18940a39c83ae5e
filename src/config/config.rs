//! # Compression Configuration
//!
//! Configuration structure and validation for one compression run. It is the
//! common interface between the `svdimg` CLI and the library's
//! [`compress_image`](crate::compress_image) entry point.
//!
//! ## Configuration Parameters
//!
//! | Parameter | Type | Range | Description |
//! |-----------|------|-------|-------------|
//! | `input` | `String` | Existing image path | Grayscale PNG/JPEG to compress |
//! | `output` | `String` | `*.png` | Where the normalized reconstruction is written |
//! | `ranks` | `Vec<usize>` | each ≥ 1, distinct | Ranks to evaluate; empty means the default rank |
//! | `channel` | `ChannelPolicy` | require-gray / first / luma | How multi-channel input is reduced |
//! | `degenerate` | `DegeneratePolicy` | mid-gray / preserve / reject | What to emit for a constant reconstruction |
//! | `comparison` | `Option<String>` | `*.png` | Optional side-by-side figure |
//! | `comparison_gap` | `u32` | 0-256 | White gap between the two panels, in pixels |
//! | `data_uri` | `bool` | true/false | Also print each export as a base64 data URI |
//! | `json` | `bool` | true/false | Print the run report as JSON |
//! | `max_iterations` | `usize` | any | SVD iteration cap, `0` = until convergence |
//!
//! Ranks are only checked against the image size after the image is loaded;
//! `validate` rejects what is wrong regardless of the image.
//!
//! ## Examples
//!
//! ```rust
//! use svd_image_compress::config::CompressConfig;
//!
//! let mut config = CompressConfig::default();
//! config.input = "portrait.png".to_string();
//! config.ranks = vec![10, 50];
//!
//! assert!(config.validate().is_ok());
//! let options = config.to_options();
//! assert_eq!(options.ranks, vec![10, 50]);
//! ```

use std::path::Path;

use svd_core::DegeneratePolicy;

use crate::error::{SvdError, SvdResult};
use crate::input::ChannelPolicy;

/// Output file name used when none is given.
pub const DEFAULT_OUTPUT: &str = "result_svd.png";

/// Largest allowed gap between comparison panels.
pub const MAX_COMPARISON_GAP: u32 = 256;

/// Configuration for one compression run.
#[derive(Debug, Clone)]
pub struct CompressConfig {
    /// Path of the image to compress.
    pub input: String,

    /// Path of the PNG export.
    ///
    /// With several ranks, each export gets a `_k<rank>` suffix before the
    /// extension.
    pub output: String,

    /// Ranks to evaluate against the same cached factors.
    pub ranks: Vec<usize>,

    /// Channel reduction policy for multi-channel input.
    pub channel: ChannelPolicy,

    /// Handling of constant reconstructions.
    pub degenerate: DegeneratePolicy,

    /// Optional side-by-side comparison figure path.
    pub comparison: Option<String>,

    /// Gap between comparison panels, in pixels.
    pub comparison_gap: u32,

    /// Print a `data:image/png;base64,...` URI for every export.
    pub data_uri: bool,

    /// Print the run report as JSON instead of text.
    pub json: bool,

    /// Iteration cap handed to the SVD; `0` iterates until convergence.
    pub max_iterations: usize,
}

impl Default for CompressConfig {
    /// Defaults:
    /// - `output`: "result_svd.png"
    /// - `ranks`: empty (half of the smaller image dimension)
    /// - `channel`: require-gray
    /// - `degenerate`: mid-gray
    /// - `comparison_gap`: 16
    fn default() -> Self {
        Self {
            input: String::new(),
            output: DEFAULT_OUTPUT.to_string(),
            ranks: Vec::new(),
            channel: ChannelPolicy::default(),
            degenerate: DegeneratePolicy::default(),
            comparison: None,
            comparison_gap: 16,
            data_uri: false,
            json: false,
            max_iterations: 0,
        }
    }
}

impl CompressConfig {
    /// Creates a configuration for `input` with the given output and ranks,
    /// keeping every other field at its default.
    pub fn new(input: String, output: String, ranks: Vec<usize>) -> Self {
        Self {
            input,
            output,
            ranks,
            ..Self::default()
        }
    }

    /// Validates everything that does not depend on the image itself.
    ///
    /// Failures are [`SvdError::Config`] naming the offending field.
    pub fn validate(&self) -> SvdResult<()> {
        if self.input.trim().is_empty() {
            return Err(SvdError::config("input", &self.input, "must not be empty"));
        }
        if !has_png_extension(&self.output) {
            return Err(SvdError::config("output", &self.output, "must be a .png file"));
        }
        if let Some(comparison) = &self.comparison {
            if !has_png_extension(comparison) {
                return Err(SvdError::config("comparison", comparison, "must be a .png file"));
            }
        }
        if self.ranks.contains(&0) {
            return Err(SvdError::config("ranks", "0", "must be at least 1")
                .with_recovery_suggestion("Pass ranks of 1 or more, or omit --rank"));
        }
        let mut seen = self.ranks.clone();
        seen.sort_unstable();
        seen.dedup();
        if seen.len() != self.ranks.len() {
            return Err(SvdError::config(
                "ranks",
                format!("{:?}", self.ranks),
                "must be distinct",
            ));
        }
        if self.comparison_gap > MAX_COMPARISON_GAP {
            return Err(SvdError::config(
                "comparison_gap",
                self.comparison_gap.to_string(),
                format!("must be at most {} pixels", MAX_COMPARISON_GAP),
            ));
        }
        Ok(())
    }

    /// Convert to `CompressOptions` for use with the library.
    pub fn to_options(&self) -> crate::CompressOptions {
        crate::CompressOptions {
            input: self.input.clone(),
            output: self.output.clone(),
            ranks: self.ranks.clone(),
            channel: self.channel,
            degenerate: self.degenerate,
            comparison: self.comparison.clone(),
            comparison_gap: self.comparison_gap,
            data_uri: self.data_uri,
            max_iterations: self.max_iterations,
        }
    }
}

fn has_png_extension(path: &str) -> bool {
    Path::new(path)
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("png"))
        .unwrap_or(false)
}

/// Parse a channel policy name: `require-gray`, `first` or `luma`.
pub fn parse_channel_policy(value: &str) -> Result<ChannelPolicy, String> {
    match value.to_lowercase().as_str() {
        "require-gray" | "gray" => Ok(ChannelPolicy::RequireGray),
        "first" | "red" => Ok(ChannelPolicy::First),
        "luma" => Ok(ChannelPolicy::Luma),
        _ => Err(format!(
            "Invalid channel policy: {}. Use: require-gray, first, luma",
            value
        )),
    }
}

/// Parse a degenerate-range policy name: `mid-gray`, `preserve` or `reject`.
pub fn parse_degenerate_policy(value: &str) -> Result<DegeneratePolicy, String> {
    match value.to_lowercase().as_str() {
        "mid-gray" | "gray" => Ok(DegeneratePolicy::MidGray),
        "preserve" => Ok(DegeneratePolicy::Preserve),
        "reject" => Ok(DegeneratePolicy::Reject),
        _ => Err(format!(
            "Invalid degenerate policy: {}. Use: mid-gray, preserve, reject",
            value
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> CompressConfig {
        CompressConfig::new("in.png".to_string(), "out.png".to_string(), vec![5])
    }

    #[test]
    fn test_default_config() {
        let config = CompressConfig::default();
        assert_eq!(config.output, "result_svd.png");
        assert!(config.ranks.is_empty());
        assert_eq!(config.channel, ChannelPolicy::RequireGray);
        assert_eq!(config.degenerate, DegeneratePolicy::MidGray);
        assert_eq!(config.comparison_gap, 16);
        assert!(!config.json);
    }

    #[test]
    fn test_config_validation() {
        let mut config = valid();
        assert!(config.validate().is_ok());

        config.input = " ".to_string();
        assert!(config.validate().is_err());
        config.input = "in.png".to_string();

        config.output = "out.jpg".to_string();
        assert!(config.validate().is_err());
        config.output = "OUT.PNG".to_string();
        assert!(config.validate().is_ok());

        config.ranks = vec![0];
        assert!(config.validate().is_err());
        config.ranks = vec![3, 7, 3];
        match config.validate() {
            Err(SvdError::Config { field, reason, .. }) => {
                assert_eq!(field, "ranks");
                assert_eq!(reason, "must be distinct");
            }
            other => panic!("unexpected result: {:?}", other),
        }
        config.ranks = vec![3, 7];

        config.comparison = Some("cmp.bmp".to_string());
        assert!(config.validate().is_err());
        config.comparison = Some("cmp.png".to_string());

        config.comparison_gap = MAX_COMPARISON_GAP + 1;
        assert!(config.validate().is_err());
        config.comparison_gap = 0;

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_to_options_copies_fields() {
        let mut config = valid();
        config.channel = ChannelPolicy::Luma;
        config.data_uri = true;
        let options = config.to_options();
        assert_eq!(options.input, "in.png");
        assert_eq!(options.ranks, vec![5]);
        assert_eq!(options.channel, ChannelPolicy::Luma);
        assert!(options.data_uri);
    }

    #[test]
    fn test_parse_policies() {
        assert_eq!(parse_channel_policy("FIRST"), Ok(ChannelPolicy::First));
        assert_eq!(parse_channel_policy("require-gray"), Ok(ChannelPolicy::RequireGray));
        assert!(parse_channel_policy("blue").is_err());

        assert_eq!(parse_degenerate_policy("reject"), Ok(DegeneratePolicy::Reject));
        assert_eq!(parse_degenerate_policy("Mid-Gray"), Ok(DegeneratePolicy::MidGray));
        assert!(parse_degenerate_policy("ignore").is_err());
    }
}
