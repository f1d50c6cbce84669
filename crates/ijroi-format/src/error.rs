//! Error types for ROI record operations.

use std::path::PathBuf;
use thiserror::Error;

use crate::shape::ShapeKind;

/// Broad classification of a [`RoiError`].
///
/// The decoder uses this to decide whether a failure is confined to one
/// record (and can be skipped) or must be propagated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed externally supplied bytes. Recoverable per record.
    Format,
    /// A mutually exclusive field was already set.
    State,
    /// Requested kind/mode combination is not supported.
    Unsupported,
    /// Archive or filesystem failure.
    Io,
}

/// Errors that can occur when reading, building or writing ROI records.
#[derive(Debug, Error)]
pub enum RoiError {
    /// Archive not found.
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Record does not start with the `Iout` tag.
    #[error("invalid magic tag: {found:?}")]
    InvalidMagic { found: [u8; 4] },

    /// Shape-type code not handled by the shape factory.
    #[error("unknown ROI type code: {code}")]
    UnknownType { code: u8 },

    /// Subtype code outside the catalog.
    #[error("unknown ROI subtype code: {code}")]
    UnknownSubtype { code: i16 },

    /// Declared and stored coordinate counts differ.
    #[error("coordinate count mismatch: header declares {declared}, payload holds {actual}")]
    CoordinateCountMismatch { declared: usize, actual: usize },

    /// Buffer is shorter than an offset computed from its own headers.
    #[error("truncated record: {what} needs {needed} bytes, record has {available}")]
    Truncated {
        what: &'static str,
        needed: usize,
        available: usize,
    },

    /// A header offset or length is negative.
    #[error("invalid {field}: {value}")]
    InvalidOffset { field: &'static str, value: i32 },

    /// A mutually exclusive value was already set.
    #[error("{field} is already set")]
    AlreadySet { field: &'static str },

    /// Constructor arguments do not describe a valid shape.
    #[error("invalid shape arguments: {message}")]
    InvalidArguments { message: String },

    /// Operation not implemented for this kind/mode combination.
    #[error("unsupported operation: {message}")]
    Unsupported { message: String },

    /// Requested encode-as kind is not compatible with the shape.
    #[error("{source_kind} cannot be encoded as {target}")]
    Incompatible {
        source_kind: ShapeKind,
        target: ShapeKind,
    },

    /// Invalid entry-name filter.
    #[error("invalid entry pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Zip container error.
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for ROI operations.
pub type Result<T> = std::result::Result<T, RoiError>;

impl RoiError {
    /// Create a Truncated error.
    pub fn truncated(what: &'static str, needed: usize, available: usize) -> Self {
        Self::Truncated {
            what,
            needed,
            available,
        }
    }

    /// Create an InvalidArguments error.
    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            message: message.into(),
        }
    }

    /// Create an Unsupported error.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported {
            message: message.into(),
        }
    }

    /// Classify this error.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidMagic { .. }
            | Self::UnknownType { .. }
            | Self::UnknownSubtype { .. }
            | Self::CoordinateCountMismatch { .. }
            | Self::Truncated { .. }
            | Self::InvalidOffset { .. } => ErrorCategory::Format,
            Self::AlreadySet { .. } => ErrorCategory::State,
            Self::InvalidArguments { .. } | Self::Unsupported { .. } | Self::Incompatible { .. } => {
                ErrorCategory::Unsupported
            }
            Self::FileNotFound { .. }
            | Self::Pattern(_)
            | Self::Zip(_)
            | Self::Json(_)
            | Self::Io(_) => ErrorCategory::Io,
        }
    }

    /// Whether this error is confined to a single malformed record.
    #[must_use]
    pub fn is_format_error(&self) -> bool {
        self.category() == ErrorCategory::Format
    }
}
