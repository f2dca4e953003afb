//! C ABI definitions for hosting legacy image filter plug-ins.
//!
//! This crate defines the binary contract between the host and filter
//! modules:
//! - Selector values and `OSErr` result codes
//! - Image-mode and filter-case bitflags
//! - The `#[repr(C)]` filter record and every callback table it references
//! - Suite names and versions acquired through the basic suite
//!
//! # Opaque identifiers
//!
//! Handles, buffers and action descriptors cross the boundary as 64-bit
//! identifiers ([`RawHandle`], [`RawBuffer`], [`RawDescriptor`]) with zero
//! as the null value. Plug-ins may hold identifiers across calls; only
//! `lock` style calls expose memory addresses.
//!
//! # ABI Stability
//!
//! Field order and sizes are pinned with compile-time assertions. Tables
//! whose layout depends on the pointer width are asserted in units of
//! `usize`.

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod constants;
pub mod prelude;
pub mod record;
pub mod types;

pub use constants::{
    DEFAULT_HOST_SIGNATURE, PHOTOSHOP_SIGNATURE, descriptor_type, four_cc, handling, image_mode,
    play_info, procs_version, property_key, result_code, selector, sp_error, suite,
};
pub use record::{
    AboutRecord, AbortProc, ActionDescriptorProcs, BigDocument, BufferProcs, DescriptorParameters,
    DisplayPixelsProc, ERROR_STRING_CAPACITY, FILTER_CASE_COUNT, FilterCaseInfoTable,
    FilterEntryPoint, FilterRecord, HandleProcs, PSBufferSuite1, PSHandleSuite1, PSHandleSuite2,
    PSPixelMap, PSUIHooksSuite1, ProgressProc, PropertyProcs, SPBasicSuite,
};
pub use types::{
    FilterCase, FilterCaseFlags, FilterCaseInfo, OsErr, Point16, RawBuffer, RawDescriptor,
    RawHandle, Rect16, RgbColor, SupportedModes, VPoint, VRect,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_four_cc_is_big_endian() {
        assert_eq!(four_cc(*b"8BIM"), 0x3842_494D);
        assert_eq!(PHOTOSHOP_SIGNATURE.to_be_bytes(), *b"8BIM");
    }

    #[test]
    fn test_empty_record_requests_nothing() {
        let record = FilterRecord::empty();
        assert!(record.in_rect.is_empty());
        assert!(record.out_rect.is_empty());
        assert!(record.in_lo_plane > record.in_hi_plane);
        assert!(record.in_data.is_null());
        assert_eq!(record.image_h_res, 72 << 16);
    }

    #[test]
    fn test_effective_rect_prefers_32bit_copy_when_flagged() {
        let mut big = BigDocument::new();
        big.in_rect32 = VRect {
            top: 0,
            left: 0,
            bottom: 70_000,
            right: 10,
        };
        let mut record = FilterRecord::empty();
        record.in_rect = Rect16 {
            top: 0,
            left: 0,
            bottom: 5,
            right: 5,
        };
        record.big_document_data = &mut big;

        // SAFETY: `big` outlives every call below.
        let legacy = unsafe { record.effective_in_rect() };
        assert_eq!(legacy.bottom, 5);

        big.plugin_using_32bit_coordinates = 1;
        record.big_document_data = &mut big;
        // SAFETY: as above.
        let wide = unsafe { record.effective_in_rect() };
        assert_eq!(wide.bottom, 70_000);
    }
}
