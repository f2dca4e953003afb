//! Prelude for convenient imports.
//!
//! ```
//! use filterhost_abi::prelude::*;
//! ```

pub use crate::constants::{
    PHOTOSHOP_SIGNATURE, four_cc, image_mode, result_code, selector, suite,
};
pub use crate::record::{
    BufferProcs, DescriptorParameters, FilterEntryPoint, FilterRecord, HandleProcs, PropertyProcs,
    SPBasicSuite,
};
pub use crate::types::{
    FilterCase, FilterCaseInfo, OsErr, RawBuffer, RawDescriptor, RawHandle, Rect16, RgbColor,
    SupportedModes, VRect,
};
