//! # Error Handling
//!
//! Error types for the image compression pipeline. Every failure is local and
//! synchronous: the stage that detects it stops, returns no partial output,
//! and leaves presentation of the message to the caller.
//!
//! ## Architecture
//!
//! - **Error Types**: one [`SvdError`] variant per failure family, each carrying an [`ErrorContext`]
//! - **Error Traits**: severity, recoverability and recovery suggestions
//! - **Classification**: [`classify::is_input_error`] separates bad input from internal faults;
//!   the CLI turns it into its exit status
//!
//! Nothing here is retryable. The computation is deterministic, so running a
//! failed stage again with the same input yields the same error.
//!
//! ## Usage
//!
//! ```rust
//! use svd_image_compress::error::{SvdError, HasRecoverySuggestion};
//!
//! let error = SvdError::invalid_rank(0, 64)
//!     .with_context("evaluating rank from --rank")
//!     .with_recovery_suggestion("Pick a rank between 1 and 64");
//!
//! assert_eq!(error.category(), "invalid_rank");
//! assert_eq!(error.recovery_suggestion(), Some("Pick a rank between 1 and 64"));
//! ```

use std::{error::Error as StdError, fmt, path::Path, time::SystemTime};

use svd_core::{CoreError, DecompositionFailure};

/// Severity levels for errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Informational; output was still produced
    Info,
    /// Output was produced through a fallback
    Warning,
    /// The requested evaluation failed
    Error,
    /// Failures that point at a defect or a broken environment
    Critical,
}

/// Metadata about when and where an error occurred
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// When the error occurred
    pub timestamp: SystemTime,
    /// Additional context about the error
    pub context: Option<String>,
    /// Suggested recovery action
    pub recovery_suggestion: Option<String>,
    /// Error severity level
    pub severity: ErrorSeverity,
    /// Whether a fallback can still produce output
    pub recoverable: bool,
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self {
            timestamp: SystemTime::now(),
            context: None,
            recovery_suggestion: None,
            severity: ErrorSeverity::Error,
            recoverable: false,
        }
    }
}

impl ErrorContext {
    /// Create a new error context
    pub fn new() -> Self {
        Self::default()
    }

    fn with_severity(mut self, severity: ErrorSeverity) -> Self {
        self.severity = severity;
        self
    }

    fn with_recovery_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.recovery_suggestion = Some(suggestion.into());
        self
    }
}

/// Base error type for the compression pipeline
#[derive(Debug)]
pub enum SvdError {
    /// Configuration validation errors
    Config {
        field: String,
        value: String,
        reason: String,
        context: ErrorContext,
    },
    /// The intensity matrix could not be decomposed
    Decomposition {
        failure: DecompositionFailure,
        context: ErrorContext,
    },
    /// Rank outside `[1, max]`
    InvalidRank {
        rank: usize,
        max: usize,
        context: ErrorContext,
    },
    /// Constant reconstruction with no range to normalize
    DegenerateRange { value: f64, context: ErrorContext },
    /// Any other failure reported by the numeric core
    Core {
        source: CoreError,
        context: ErrorContext,
    },
    /// The input bytes are not a decodable image
    ImageDecode {
        path: Option<String>,
        reason: String,
        context: ErrorContext,
    },
    /// The image cannot be reduced to one channel under the chosen policy
    Channel {
        color_type: String,
        reason: String,
        context: ErrorContext,
    },
    /// Encoding an export buffer failed
    Encode {
        format: String,
        reason: String,
        context: ErrorContext,
    },
    /// I/O errors
    Io {
        operation: String,
        path: Option<String>,
        source: std::io::Error,
        context: ErrorContext,
    },
    /// External library errors
    External {
        library: String,
        source: Box<dyn StdError + Send + Sync>,
        context: ErrorContext,
    },
}

impl SvdError {
    /// Create a configuration error
    pub fn config(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Config {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a decomposition error
    pub fn decomposition(failure: DecompositionFailure) -> Self {
        let suggestion = match failure {
            DecompositionFailure::Empty { .. } => "Provide an image with at least one pixel",
            DecompositionFailure::NonFinite { .. } => "Remove NaN or infinite values from the input",
            _ => "Retry with a smaller image or a looser convergence tolerance",
        };
        Self::Decomposition {
            failure,
            context: ErrorContext::new().with_recovery_suggestion(suggestion),
        }
    }

    /// Create an invalid rank error
    pub fn invalid_rank(rank: usize, max: usize) -> Self {
        Self::InvalidRank {
            rank,
            max,
            context: ErrorContext::new()
                .with_recovery_suggestion(format!("Choose a rank between 1 and {}", max)),
        }
    }

    /// Create a degenerate range error
    pub fn degenerate_range(value: f64) -> Self {
        let mut context = ErrorContext::new()
            .with_severity(ErrorSeverity::Warning)
            .with_recovery_suggestion("Use --degenerate mid-gray or preserve to emit a flat image");
        context.recoverable = true;
        Self::DegenerateRange { value, context }
    }

    /// Create an image decode error
    pub fn image_decode(path: Option<&Path>, reason: impl Into<String>) -> Self {
        Self::ImageDecode {
            path: path.map(|p| p.display().to_string()),
            reason: reason.into(),
            context: ErrorContext::new()
                .with_recovery_suggestion("Use a PNG or JPEG grayscale image"),
        }
    }

    /// Create a channel policy error
    pub fn channel(color_type: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Channel {
            color_type: color_type.into(),
            reason: reason.into(),
            context: ErrorContext::new().with_recovery_suggestion(
                "Convert the image to grayscale or pass --channel first|luma",
            ),
        }
    }

    /// Create an encoding error
    pub fn encode(format: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Encode {
            format: format.into(),
            reason: reason.into(),
            context: ErrorContext::new().with_severity(ErrorSeverity::Critical),
        }
    }

    /// Create an I/O error
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            path: None,
            source,
            context: ErrorContext::new(),
        }
    }

    /// Create an I/O error tied to a path
    pub fn io_at(operation: impl Into<String>, path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            path: Some(path.display().to_string()),
            source,
            context: ErrorContext::new(),
        }
    }

    /// Create an external library error
    pub fn external(
        library: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            library: library.into(),
            source: Box::new(source),
            context: ErrorContext::new(),
        }
    }

    /// Add context to the error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context_mut().context = Some(context.into());
        self
    }

    /// Add recovery suggestion
    pub fn with_recovery_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context_mut().recovery_suggestion = Some(suggestion.into());
        self
    }

    /// Get the error context
    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::Config { context, .. } => context,
            Self::Decomposition { context, .. } => context,
            Self::InvalidRank { context, .. } => context,
            Self::DegenerateRange { context, .. } => context,
            Self::Core { context, .. } => context,
            Self::ImageDecode { context, .. } => context,
            Self::Channel { context, .. } => context,
            Self::Encode { context, .. } => context,
            Self::Io { context, .. } => context,
            Self::External { context, .. } => context,
        }
    }

    fn context_mut(&mut self) -> &mut ErrorContext {
        match self {
            Self::Config { context, .. } => context,
            Self::Decomposition { context, .. } => context,
            Self::InvalidRank { context, .. } => context,
            Self::DegenerateRange { context, .. } => context,
            Self::Core { context, .. } => context,
            Self::ImageDecode { context, .. } => context,
            Self::Channel { context, .. } => context,
            Self::Encode { context, .. } => context,
            Self::Io { context, .. } => context,
            Self::External { context, .. } => context,
        }
    }

    /// Get the error category as a string
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::Decomposition { .. } => "decomposition",
            Self::InvalidRank { .. } => "invalid_rank",
            Self::DegenerateRange { .. } => "degenerate_range",
            Self::Core { .. } => "core",
            Self::ImageDecode { .. } => "image_decode",
            Self::Channel { .. } => "channel",
            Self::Encode { .. } => "encode",
            Self::Io { .. } => "io",
            Self::External { .. } => "external",
        }
    }
}

impl fmt::Display for SvdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SvdError::Config {
                field,
                value,
                reason,
                ..
            } => {
                write!(
                    f,
                    "Configuration error in '{}': {} (value: {})",
                    field, reason, value
                )
            }
            SvdError::Decomposition { failure, .. } => {
                write!(f, "Decomposition failed: {}", failure)
            }
            SvdError::InvalidRank { rank, max, .. } => {
                write!(f, "Invalid rank {}: must be between 1 and {}", rank, max)
            }
            SvdError::DegenerateRange { value, .. } => {
                write!(
                    f,
                    "Reconstruction is constant (value {}); nothing to normalize",
                    value
                )
            }
            SvdError::Core { source, .. } => write!(f, "{}", source),
            SvdError::ImageDecode { path, reason, .. } => {
                if let Some(path) = path {
                    write!(f, "Cannot decode image '{}': {}", path, reason)
                } else {
                    write!(f, "Cannot decode image: {}", reason)
                }
            }
            SvdError::Channel {
                color_type, reason, ..
            } => {
                write!(f, "Unsupported {} image: {}", color_type, reason)
            }
            SvdError::Encode { format, reason, .. } => {
                write!(f, "Failed to encode {}: {}", format, reason)
            }
            SvdError::Io {
                operation,
                path,
                source,
                ..
            } => {
                if let Some(path) = path {
                    write!(
                        f,
                        "I/O error during {} on '{}': {}",
                        operation, path, source
                    )
                } else {
                    write!(f, "I/O error during {}: {}", operation, source)
                }
            }
            SvdError::External {
                library, source, ..
            } => {
                write!(f, "External library error in {}: {}", library, source)
            }
        }
    }
}

impl StdError for SvdError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Core { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            Self::External { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Result type alias using our custom error type
pub type SvdResult<T> = Result<T, SvdError>;

/// Trait for errors that a different policy could have avoided
pub trait Recoverable {
    /// Check if a fallback policy would have produced output
    fn is_recoverable(&self) -> bool;
}

impl Recoverable for SvdError {
    fn is_recoverable(&self) -> bool {
        self.context().recoverable
    }
}

/// Trait for errors with severity levels
pub trait HasSeverity {
    /// Get the severity level of this error
    fn severity(&self) -> ErrorSeverity;
}

impl HasSeverity for SvdError {
    fn severity(&self) -> ErrorSeverity {
        self.context().severity
    }
}

/// Trait for errors that provide recovery suggestions
pub trait HasRecoverySuggestion {
    /// Get recovery suggestion for this error
    fn recovery_suggestion(&self) -> Option<&str>;
}

impl HasRecoverySuggestion for SvdError {
    fn recovery_suggestion(&self) -> Option<&str> {
        self.context().recovery_suggestion.as_deref()
    }
}

/// Error classification utilities
pub mod classify {
    use super::*;

    /// Check if the error was caused by the user's image or parameters
    pub fn is_input_error(error: &SvdError) -> bool {
        matches!(
            error,
            SvdError::Config { .. }
                | SvdError::Decomposition { .. }
                | SvdError::InvalidRank { .. }
                | SvdError::DegenerateRange { .. }
                | SvdError::ImageDecode { .. }
                | SvdError::Channel { .. }
        )
    }
}

impl From<CoreError> for SvdError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::Decomposition(failure) => Self::decomposition(failure),
            CoreError::InvalidRank { rank, max } => Self::invalid_rank(rank, max),
            CoreError::DegenerateRange { value } => Self::degenerate_range(value),
            other => Self::Core {
                source: other,
                context: ErrorContext::new().with_severity(ErrorSeverity::Critical),
            },
        }
    }
}

impl From<std::io::Error> for SvdError {
    fn from(error: std::io::Error) -> Self {
        Self::io("unknown", error)
    }
}

impl From<image::ImageError> for SvdError {
    fn from(error: image::ImageError) -> Self {
        match error {
            image::ImageError::IoError(source) => Self::io("image", source),
            image::ImageError::Decoding(e) => Self::image_decode(None, e.to_string()),
            image::ImageError::Unsupported(e) => Self::image_decode(None, e.to_string()),
            other => Self::external("image", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let error = SvdError::config("ranks", "0", "must be at least 1");
        assert_eq!(error.category(), "config");
        assert!(!error.is_recoverable());
        assert!(classify::is_input_error(&error));
        assert_eq!(
            error.to_string(),
            "Configuration error in 'ranks': must be at least 1 (value: 0)"
        );
    }

    #[test]
    fn test_error_with_context() {
        let error = SvdError::encode("png", "writer closed")
            .with_context("encoding rank 12 export")
            .with_recovery_suggestion("Check free memory");

        assert_eq!(error.category(), "encode");
        assert_eq!(error.severity(), ErrorSeverity::Critical);
        assert_eq!(error.context().context.as_deref(), Some("encoding rank 12 export"));
        assert_eq!(error.recovery_suggestion(), Some("Check free memory"));
        assert!(!classify::is_input_error(&error));
    }

    #[test]
    fn test_core_error_mapping() {
        let rank: SvdError = CoreError::InvalidRank { rank: 9, max: 4 }.into();
        assert_eq!(rank.category(), "invalid_rank");
        assert_eq!(rank.recovery_suggestion(), Some("Choose a rank between 1 and 4"));
        assert_eq!(rank.to_string(), "Invalid rank 9: must be between 1 and 4");

        let flat: SvdError = CoreError::DegenerateRange { value: 128.0 }.into();
        assert!(flat.is_recoverable());
        assert_eq!(flat.severity(), ErrorSeverity::Warning);

        let decomposition: SvdError =
            CoreError::Decomposition(DecompositionFailure::Empty { rows: 0, cols: 3 }).into();
        assert_eq!(decomposition.category(), "decomposition");
        assert!(!decomposition.is_recoverable());

        let shape: SvdError = CoreError::EmptyMatrix { rows: 0, cols: 0 }.into();
        assert_eq!(shape.category(), "core");
        assert!(shape.source().is_some());
    }

    #[test]
    fn test_error_classification() {
        let channel = SvdError::channel("Rgb8", "pixel (0, 0) is not gray");
        assert!(classify::is_input_error(&channel));

        let io = SvdError::io("write export", std::io::Error::other("disk full"));
        assert!(!classify::is_input_error(&io));
        assert!(io.source().is_some());
    }
}
