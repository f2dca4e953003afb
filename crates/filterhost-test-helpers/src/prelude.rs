//! Convenience re-exports for tests.

pub use crate::fixtures::{
    AeteBuilder, IccHeaderBuilder, PiplBuilder, checkerboard_bgra, gradient_bgra, gray16_ramp,
    solid_bgra,
};
pub use crate::must::{must, must_some, must_with};

/// Result type for tests that propagate errors with `?`.
pub type TestResult = Result<(), Box<dyn std::error::Error>>;
