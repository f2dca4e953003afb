//! Error types for the filter host.
//!
//! Platform and plug-in error codes are translated here before they reach
//! callers. Resource acquisition failures and plug-in runtime failures both
//! surface as [`FilterHostError::FilterRun`], which keeps the translated
//! message and the underlying cause.

use std::path::PathBuf;

use filterhost_abi::{result_code, selector};
use filterhost_surface::SurfaceError;
use thiserror::Error;

/// Boxed error cause carried by [`FilterHostError::FilterRun`].
pub type BoxedCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error type for filter host operations.
#[derive(Error, Debug)]
pub enum FilterHostError {
    /// A filter run could not start or the plug-in failed.
    #[error("{message}")]
    FilterRun {
        /// Message shown to the user.
        message: String,
        /// Underlying platform or plug-in error.
        #[source]
        source: Option<BoxedCause>,
    },

    /// The descriptor lacks a category, title or entry point.
    #[error("Invalid plug-in descriptor for {path}: {reason}")]
    InvalidDescriptor {
        /// Module path.
        path: PathBuf,
        /// Missing field.
        reason: &'static str,
    },

    /// The plug-in does not accept the image's pixel format.
    #[error("{title} does not support {mode} images")]
    UnsupportedMode {
        /// Plug-in title.
        title: String,
        /// Pixel format name.
        mode: &'static str,
    },

    /// The user or the abort predicate cancelled the run.
    #[error("The filter was cancelled")]
    Cancelled,

    /// Pixel surface error.
    #[error("Surface error: {0}")]
    Surface(#[from] SurfaceError),

    /// Color profile error outside of a filter run.
    #[error("Color profile error: {0}")]
    ColorProfile(#[from] ColorProfileError),

    /// Plug-in resource parse error.
    #[error("PiPL error: {0}")]
    Pipl(#[from] PiplError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The blocking worker running a filter failed.
    #[error("Filter worker failed: {0}")]
    Worker(String),
}

impl FilterHostError {
    /// Build a [`FilterHostError::FilterRun`] with a cause.
    pub fn filter_run(
        message: impl Into<String>,
        source: impl Into<BoxedCause>,
    ) -> Self {
        Self::FilterRun {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Build a [`FilterHostError::FilterRun`] without a cause.
    pub fn filter_run_message(message: impl Into<String>) -> Self {
        Self::FilterRun {
            message: message.into(),
            source: None,
        }
    }

    /// The plug-in error behind a failed run, if that is what failed.
    pub fn plugin_error(&self) -> Option<&PluginError> {
        match self {
            Self::FilterRun {
                source: Some(source),
                ..
            } => source.downcast_ref::<PluginError>(),
            _ => None,
        }
    }
}

/// A non-zero result code returned by a plug-in selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginError {
    /// The `OSErr` the plug-in stored in its result slot.
    pub code: i16,
    /// Selector that failed.
    pub selector: i16,
    /// Message from the record's error string, for `errReportString`.
    pub message: Option<String>,
}

impl PluginError {
    /// Human-readable reason, preferring the plug-in's own message.
    pub fn describe(&self) -> &str {
        match &self.message {
            Some(message) if !message.is_empty() => message,
            _ => result_code::describe(self.code),
        }
    }
}

impl std::fmt::Display for PluginError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (code {} during {})",
            self.describe(),
            self.code,
            selector::name(self.selector)
        )
    }
}

impl std::error::Error for PluginError {}

/// Role of a profile in the color bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileRole {
    /// Profile embedded in the document.
    Document,
    /// Profile of the display.
    Monitor,
}

impl std::fmt::Display for ProfileRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Document => f.write_str("document"),
            Self::Monitor => f.write_str("monitor"),
        }
    }
}

/// Errors opening ICC profiles or building transforms.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ColorProfileError {
    /// Profile bytes are shorter than an ICC header.
    #[error("{role} profile is truncated: {len} bytes")]
    Truncated {
        /// Which profile.
        role: ProfileRole,
        /// Length supplied.
        len: usize,
    },

    /// Profile header lacks the `acsp` signature.
    #[error("{role} profile has an invalid signature {signature:#010x}")]
    BadSignature {
        /// Which profile.
        role: ProfileRole,
        /// Signature found.
        signature: u32,
    },

    /// Declared size disagrees with the data.
    #[error("{role} profile declares {declared} bytes but {actual} were supplied")]
    SizeMismatch {
        /// Which profile.
        role: ProfileRole,
        /// Size in the header.
        declared: u32,
        /// Bytes supplied.
        actual: usize,
    },

    /// The color engine rejected the profile body.
    #[error("{role} profile could not be parsed: {reason}")]
    Parse {
        /// Which profile.
        role: ProfileRole,
        /// Engine message.
        reason: String,
    },

    /// The color engine could not build a transform.
    #[error("color transform could not be created: {0}")]
    Transform(String),

    /// The transform failed on pixel data.
    #[error("color transform failed: {0}")]
    Apply(String),
}

/// Errors decoding plug-in property lists.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PiplError {
    /// The data ended early.
    #[error("unexpected end of data at offset {offset}")]
    UnexpectedEof {
        /// Offset of the failed read.
        offset: usize,
    },

    /// A length field is negative or overruns the data.
    #[error("invalid length {length} at offset {offset}")]
    InvalidLength {
        /// Offset of the length field.
        offset: usize,
        /// Value read.
        length: i64,
    },

    /// A string is not valid UTF-8 or Windows-1252 text.
    #[error("invalid string at offset {offset}")]
    InvalidString {
        /// Offset of the string.
        offset: usize,
    },

    /// The module kind is not a filter.
    #[error("not a filter module (kind {kind:#010x})")]
    NotAFilter {
        /// Kind found.
        kind: u32,
    },
}

/// Errors parsing enable-info expressions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnableInfoError {
    /// Unrecognized character.
    #[error("unexpected character {found:?} at {position}")]
    UnexpectedChar {
        /// Character found.
        found: char,
        /// Byte position.
        position: usize,
    },

    /// Unexpected token or end of input.
    #[error("unexpected {found} at {position}, expected {expected}")]
    UnexpectedToken {
        /// Description of the token found.
        found: String,
        /// What the parser wanted.
        expected: &'static str,
        /// Byte position.
        position: usize,
    },

    /// Integer literal does not fit.
    #[error("integer literal out of range at {position}")]
    IntegerOverflow {
        /// Byte position.
        position: usize,
    },

    /// Nesting exceeds the parser's depth limit.
    #[error("expression nested deeper than {limit} levels")]
    TooDeep {
        /// Depth limit.
        limit: usize,
    },

    /// Too many operands and operators in one expression.
    #[error("expression has more than {limit} terms")]
    TooComplex {
        /// Term limit.
        limit: usize,
    },
}

/// Result type for filter host operations.
pub type Result<T> = std::result::Result<T, FilterHostError>;
