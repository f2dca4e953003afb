//! Prelude for convenient imports.

pub use crate::error::{SurfaceError, SurfaceResult};
pub use crate::rect::Rect;
pub use crate::resample::ResamplingAlgorithm;
pub use crate::surface::{PixelSurface, SurfaceFormat};
