//! Host for legacy native image filter plug-ins.
//!
//! This crate loads filter modules and runs them against pixel surfaces:
//! - Discovery of modules on disk and PiPL descriptor parsing
//! - Capability detection from mode bitmasks and enable-info expressions
//! - Buffer, handle, property, UI hooks and action descriptor suites
//! - Color-managed previews through ICC profiles
//! - The Parameters/Prepare/Start/Continue/Finish run protocol
//!
//! # Safety Considerations
//!
//! Filter modules run in-process with full privileges and are NOT
//! sandboxed. A misbehaving plug-in can corrupt the host. Only one filter
//! runs at a time; suite calls are routed to the active run and fail
//! safely when none is active.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use filterhost_native::prelude::*;
//! use filterhost_surface::{PixelSurface, SurfaceFormat};
//!
//! # #[cfg(windows)]
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let host = FilterHost::new(HostConfig::default())?;
//!     host.set_progress_sink(|event| println!("{:.0}%", event.fraction() * 100.0));
//!
//!     let filters = host.enumerate_filters(
//!         Path::new("C:/Plug-ins"),
//!         &filterhost_native::windows::ResourcePiplSource,
//!     )?;
//!     let image = PixelSurface::new(640, 480, SurfaceFormat::Bgra32)?;
//!     if let Some(filter) = filters.first() {
//!         let outcome = host.run_filter(filter, &image, &FilterRequest::default())?;
//!         println!("{} leaked {:?}", filter.display_title(), outcome.leaks);
//!     }
//!     Ok(())
//! }
//! # #[cfg(not(windows))]
//! # fn main() {}
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod aete;
pub mod callbacks;
pub mod color;
pub mod config;
pub mod descriptor;
pub mod enable_info;
pub mod enumerate;
pub mod error;
pub mod handles;
pub mod host;
pub mod icc;
pub mod module;
pub mod pipl;
pub mod prelude;
pub mod run;
pub mod suites;

#[cfg(windows)]
#[cfg_attr(docsrs, doc(cfg(windows)))]
pub mod windows;

pub use aete::{AeteEnum, AeteEnums, AeteEvent, AeteParameter, PluginAete, parse_aete};
pub use callbacks::{
    AbortPredicate, HostCallbacks, PickColor, PreviewFrame, PreviewSink, ProgressEvent,
    ProgressSink,
};
pub use color::{ColorProfileConverter, profiles_require_correction};
pub use config::HostConfig;
pub use descriptor::{Capability, ImagePixelFormat, PluginDescriptor, PluginDescriptorBuilder};
pub use enumerate::{enumerate_plugins, load_module_descriptors};
pub use error::{
    ColorProfileError, EnableInfoError, FilterHostError, PiplError, PluginError, ProfileRole,
    Result,
};
pub use handles::{NativeResource, SafeHandle};
pub use host::{FilterHost, FilterTask, ParameterCache};
pub use icc::IccHeader;
pub use module::PluginModule;
pub use pipl::{PiplInfo, PiplSource, parse_pipl};
pub use run::{FilterOutcome, FilterParameters, FilterRequest, FilterRunner};
pub use suites::{DescriptorValue, DescriptorValues, LeakReport};
