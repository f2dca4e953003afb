//! Error types for pixel surfaces.

use thiserror::Error;

use crate::surface::SurfaceFormat;

/// Errors raised when building or combining surfaces.
///
/// Resampling itself never fails on edge cases; the only runtime error is a
/// request that pairs two incompatible formats.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurfaceError {
    /// Width or height is zero or the byte size overflows.
    #[error("invalid surface dimensions {width}x{height}")]
    InvalidDimensions {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// Stride cannot hold a full row.
    #[error("stride {stride} is smaller than the {min} bytes a row needs")]
    StrideTooSmall {
        /// Requested stride.
        stride: usize,
        /// Minimum stride for the width and format.
        min: usize,
    },

    /// Supplied buffer does not match `stride * height`.
    #[error("buffer holds {actual} bytes, expected {expected}")]
    BufferSizeMismatch {
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// Two surfaces with different pixel formats were combined.
    #[error("format mismatch: expected {expected:?}, got {actual:?}")]
    FormatMismatch {
        /// Format of the receiving surface.
        expected: SurfaceFormat,
        /// Format of the other surface.
        actual: SurfaceFormat,
    },

    /// The operation is not defined for this format.
    #[error("{operation} is not supported for {format:?} surfaces")]
    UnsupportedFormat {
        /// Operation name.
        operation: &'static str,
        /// Format of the surface.
        format: SurfaceFormat,
    },
}

/// Result type for surface operations.
pub type SurfaceResult<T> = std::result::Result<T, SurfaceError>;
