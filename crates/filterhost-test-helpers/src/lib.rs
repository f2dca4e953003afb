//! Shared test utilities for the filter host crates.
//!
//! # Modules
//!
//! - [`mod@must`] - Unwrap helpers with good error messages and `#[track_caller]`
//! - [`fixtures`] - Surface fixtures and builders for PiPL, `aete` and ICC data
//! - [`prelude`] - Convenience re-exports
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! filterhost-test-helpers = { workspace = true }
//! ```
//!
//! ```rust,ignore
//! use filterhost_test_helpers::prelude::*;
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![allow(clippy::unwrap_used, clippy::panic)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod fixtures;
pub mod must;
pub mod prelude;

pub use must::*;
