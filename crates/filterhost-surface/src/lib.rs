//! Pixel surfaces for staging image data across the filter plug-in boundary.
//!
//! A [`PixelSurface`] owns a buffer together with its width, height, row
//! stride and [`SurfaceFormat`]. Two formats exist:
//! - **BGRA32**: four 8-bit channels, alpha last
//! - **Gray16**: one 16-bit channel, no alpha
//!
//! Surfaces provide the operations a filter host needs before and after a
//! plug-in runs: transparency detection, alpha flattening, region copies,
//! the 0..=32768 range mapping used for 16-bit data, and two resampling
//! algorithms (area-weighted super sampling and bicubic) for previews.
//!
//! # Example
//!
//! ```
//! use filterhost_surface::prelude::*;
//!
//! let mut source = PixelSurface::new(64, 64, SurfaceFormat::Bgra32)?;
//! source.fill_bgra([0, 128, 255, 255]);
//!
//! let mut thumb = PixelSurface::new(16, 16, SurfaceFormat::Bgra32)?;
//! thumb.fit_surface(ResamplingAlgorithm::Auto, &source)?;
//! assert_eq!(thumb.bgra_at(8, 8), Some([0, 128, 255, 255]));
//! # Ok::<(), SurfaceError>(())
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod error;
pub mod prelude;
pub mod rect;
pub mod resample;
pub mod surface;

pub use error::{SurfaceError, SurfaceResult};
pub use rect::Rect;
pub use resample::{ResamplingAlgorithm, cubic_weight};
pub use surface::{
    PHOTOSHOP_16BIT_MAX, PixelSurface, SurfaceFormat, from_photoshop_range, to_photoshop_range,
};
