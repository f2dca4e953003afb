//! The negotiated filter record and the callback tables it points to.
//!
//! Every callback uses the platform's system calling convention, matching
//! how legacy filter modules were compiled. Handles, buffers and action
//! descriptors travel as opaque 64-bit identifiers; the host never hands
//! out addresses of its bookkeeping.
//!
//! # Entry point
//!
//! ```text
//! void PluginMain(short selector, FilterRecord *record, intptr_t *data, short *result);
//! ```
//!
//! `data` is a pointer-sized slot the plug-in owns across all selectors of
//! one run; `result` receives an `OSErr`.

use core::ffi::{c_char, c_void};

use static_assertions::const_assert_eq;

use crate::types::{
    FilterCaseInfo, OsErr, Point16, RawBuffer, RawDescriptor, RawHandle, Rect16, RgbColor, VPoint,
    VRect,
};

/// Filter entry point signature.
pub type FilterEntryPoint = unsafe extern "system" fn(
    selector: i16,
    record: *mut c_void,
    data: *mut isize,
    result: *mut i16,
);

/// Returns non-zero when the user asked to abort.
pub type AbortProc = unsafe extern "system" fn() -> u8;

/// Reports `done` out of `total` units of work.
pub type ProgressProc = unsafe extern "system" fn(done: i32, total: i32);

/// Asks the host to draw preview pixels.
pub type DisplayPixelsProc = unsafe extern "system" fn(
    source: *const PSPixelMap,
    src_rect: *const VRect,
    dst_row: i32,
    dst_col: i32,
    platform_context: *mut c_void,
) -> OsErr;

/// Host-managed scratch buffers addressed by identifier.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct BufferProcs {
    /// Table version.
    pub buffer_procs_version: i16,
    /// Number of procs that follow.
    pub num_buffer_procs: i16,
    /// Allocate `size` bytes and store the identifier.
    pub allocate: Option<unsafe extern "system" fn(size: i32, buffer: *mut RawBuffer) -> OsErr>,
    /// Lock a buffer and return its address.
    pub lock: Option<unsafe extern "system" fn(buffer: RawBuffer, move_high: u8) -> *mut u8>,
    /// Unlock a buffer.
    pub unlock: Option<unsafe extern "system" fn(buffer: RawBuffer)>,
    /// Free a buffer.
    pub free: Option<unsafe extern "system" fn(buffer: RawBuffer)>,
    /// Bytes still available for buffers.
    pub space: Option<unsafe extern "system" fn() -> i32>,
}

/// Host-managed relocatable blocks addressed by identifier.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct HandleProcs {
    /// Table version.
    pub handle_procs_version: i16,
    /// Number of procs that follow.
    pub num_handle_procs: i16,
    /// Allocate a block of `size` bytes.
    pub new: Option<unsafe extern "system" fn(size: i32) -> RawHandle>,
    /// Dispose a block.
    pub dispose: Option<unsafe extern "system" fn(handle: RawHandle)>,
    /// Size of a block in bytes.
    pub get_size: Option<unsafe extern "system" fn(handle: RawHandle) -> i32>,
    /// Resize a block, preserving its prefix.
    pub set_size: Option<unsafe extern "system" fn(handle: RawHandle, size: i32) -> OsErr>,
    /// Lock a block and return its address.
    pub lock: Option<unsafe extern "system" fn(handle: RawHandle, move_high: u8) -> *mut u8>,
    /// Unlock a block.
    pub unlock: Option<unsafe extern "system" fn(handle: RawHandle)>,
    /// Ask the host to free `size` bytes.
    pub recover_space: Option<unsafe extern "system" fn(size: i32)>,
}

/// Host property access.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct PropertyProcs {
    /// Table version.
    pub property_procs_version: i16,
    /// Number of procs that follow.
    pub num_property_procs: i16,
    /// Read a property into `simple` or a new handle stored in `complex`.
    pub get_property: Option<
        unsafe extern "system" fn(
            signature: u32,
            key: u32,
            index: i32,
            simple: *mut isize,
            complex: *mut RawHandle,
        ) -> OsErr,
    >,
    /// Write a property from `simple` or the contents of `complex`.
    pub set_property: Option<
        unsafe extern "system" fn(
            signature: u32,
            key: u32,
            index: i32,
            simple: isize,
            complex: RawHandle,
        ) -> OsErr,
    >,
}

/// Pointer-based scratch buffers.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct PSBufferSuite1 {
    /// Allocate between `minimum` and `*requested` bytes; updates `requested`.
    pub new: Option<unsafe extern "system" fn(requested: *mut u32, minimum: u32) -> *mut u8>,
    /// Free a buffer and null the caller's pointer.
    pub dispose: Option<unsafe extern "system" fn(buffer: *mut *mut u8)>,
    /// Size of a buffer.
    pub get_size: Option<unsafe extern "system" fn(buffer: *mut u8) -> u32>,
    /// Bytes still available.
    pub get_space: Option<unsafe extern "system" fn() -> u32>,
}

/// Handle suite, first version.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct PSHandleSuite1 {
    /// Allocate a block.
    pub new: Option<unsafe extern "system" fn(size: i32) -> RawHandle>,
    /// Dispose a block.
    pub dispose: Option<unsafe extern "system" fn(handle: RawHandle)>,
    /// Lock or unlock a block, returning its address and previous lock state.
    pub set_lock: Option<
        unsafe extern "system" fn(
            handle: RawHandle,
            lock: u8,
            address: *mut *mut u8,
            old_lock: *mut u8,
        ),
    >,
    /// Size of a block.
    pub get_size: Option<unsafe extern "system" fn(handle: RawHandle) -> i32>,
    /// Resize a block.
    pub set_size: Option<unsafe extern "system" fn(handle: RawHandle, size: i32) -> OsErr>,
    /// Ask the host to free `size` bytes.
    pub recover_space: Option<unsafe extern "system" fn(size: i32)>,
}

/// Handle suite, second version: adds tolerant disposal of handles the
/// plug-in may have damaged or obtained elsewhere.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct PSHandleSuite2 {
    /// Allocate a block.
    pub new: Option<unsafe extern "system" fn(size: i32) -> RawHandle>,
    /// Dispose a block.
    pub dispose: Option<unsafe extern "system" fn(handle: RawHandle)>,
    /// Dispose a handle that may be unknown or corrupt without failing.
    pub dispose_regular_handle: Option<unsafe extern "system" fn(handle: RawHandle)>,
    /// Lock or unlock a block.
    pub set_lock: Option<
        unsafe extern "system" fn(
            handle: RawHandle,
            lock: u8,
            address: *mut *mut u8,
            old_lock: *mut u8,
        ),
    >,
    /// Size of a block.
    pub get_size: Option<unsafe extern "system" fn(handle: RawHandle) -> i32>,
    /// Resize a block.
    pub set_size: Option<unsafe extern "system" fn(handle: RawHandle, size: i32) -> OsErr>,
    /// Ask the host to free `size` bytes.
    pub recover_space: Option<unsafe extern "system" fn(size: i32)>,
}

/// Host UI services.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct PSUIHooksSuite1 {
    /// Native handle of the host's main window.
    pub main_app_window: Option<unsafe extern "system" fn() -> isize>,
    /// Milliseconds since the session started.
    pub tick_count: Option<unsafe extern "system" fn() -> u32>,
    /// Store the running plug-in's name in a new handle.
    pub get_plugin_name:
        Option<unsafe extern "system" fn(plugin_ref: isize, name: *mut RawHandle) -> OsErr>,
    /// Ask the host to show its color picker; `prompt` may be null.
    pub pick_color:
        Option<unsafe extern "system" fn(prompt: *const c_char, color: *mut RgbColor) -> OsErr>,
}

/// Action descriptor access for scripting parameters.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
#[allow(clippy::type_complexity)]
pub struct ActionDescriptorProcs {
    /// Create an empty descriptor.
    pub make: Option<unsafe extern "system" fn(descriptor: *mut RawDescriptor) -> OsErr>,
    /// Free a descriptor.
    pub free: Option<unsafe extern "system" fn(descriptor: RawDescriptor) -> OsErr>,
    /// Whether `key` is present.
    pub has_key:
        Option<unsafe extern "system" fn(descriptor: RawDescriptor, key: u32, has: *mut u8) -> OsErr>,
    /// Number of keys.
    pub get_count:
        Option<unsafe extern "system" fn(descriptor: RawDescriptor, count: *mut u32) -> OsErr>,
    /// Key at an insertion-order index.
    pub get_key: Option<
        unsafe extern "system" fn(descriptor: RawDescriptor, index: u32, key: *mut u32) -> OsErr,
    >,
    /// Type code of the value stored under `key`.
    pub get_type: Option<
        unsafe extern "system" fn(descriptor: RawDescriptor, key: u32, type_code: *mut u32) -> OsErr,
    >,
    /// Store an integer.
    pub put_integer:
        Option<unsafe extern "system" fn(descriptor: RawDescriptor, key: u32, value: i32) -> OsErr>,
    /// Read an integer.
    pub get_integer: Option<
        unsafe extern "system" fn(descriptor: RawDescriptor, key: u32, value: *mut i32) -> OsErr,
    >,
    /// Store a float.
    pub put_float:
        Option<unsafe extern "system" fn(descriptor: RawDescriptor, key: u32, value: f64) -> OsErr>,
    /// Read a float.
    pub get_float: Option<
        unsafe extern "system" fn(descriptor: RawDescriptor, key: u32, value: *mut f64) -> OsErr,
    >,
    /// Store a boolean.
    pub put_boolean:
        Option<unsafe extern "system" fn(descriptor: RawDescriptor, key: u32, value: u8) -> OsErr>,
    /// Read a boolean.
    pub get_boolean: Option<
        unsafe extern "system" fn(descriptor: RawDescriptor, key: u32, value: *mut u8) -> OsErr,
    >,
    /// Store an enumerated value.
    pub put_enumerated: Option<
        unsafe extern "system" fn(
            descriptor: RawDescriptor,
            key: u32,
            enum_type: u32,
            value: u32,
        ) -> OsErr,
    >,
    /// Read an enumerated value and its type.
    pub get_enumerated: Option<
        unsafe extern "system" fn(
            descriptor: RawDescriptor,
            key: u32,
            enum_type: *mut u32,
            value: *mut u32,
        ) -> OsErr,
    >,
    /// Store a NUL-terminated UTF-8 string.
    pub put_string: Option<
        unsafe extern "system" fn(descriptor: RawDescriptor, key: u32, value: *const c_char) -> OsErr,
    >,
    /// Copy a string into `buffer` (NUL-terminated, truncated to `capacity`).
    pub get_string: Option<
        unsafe extern "system" fn(
            descriptor: RawDescriptor,
            key: u32,
            buffer: *mut c_char,
            capacity: u32,
        ) -> OsErr,
    >,
    /// Length in bytes of a stored string, excluding the terminator.
    pub get_string_length: Option<
        unsafe extern "system" fn(descriptor: RawDescriptor, key: u32, length: *mut u32) -> OsErr,
    >,
}

/// Entry table of the basic suite, through which every other suite is
/// acquired by name and version.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct SPBasicSuite {
    /// Look up a suite.
    pub acquire_suite: Option<
        unsafe extern "system" fn(name: *const c_char, version: i32, suite: *mut *const c_void) -> i32,
    >,
    /// Release a suite obtained through `acquire_suite`.
    pub release_suite: Option<unsafe extern "system" fn(name: *const c_char, version: i32) -> i32>,
    /// Compare two NUL-terminated names; non-zero when equal.
    pub is_equal: Option<unsafe extern "system" fn(a: *const c_char, b: *const c_char) -> u8>,
    /// Allocate a raw block.
    pub allocate_block: Option<unsafe extern "system" fn(size: usize, block: *mut *mut c_void) -> i32>,
    /// Free a raw block.
    pub free_block: Option<unsafe extern "system" fn(block: *mut c_void) -> i32>,
    /// Resize a raw block.
    pub reallocate_block: Option<
        unsafe extern "system" fn(block: *mut c_void, new_size: usize, out: *mut *mut c_void) -> i32,
    >,
    /// Placeholder slot; always fails.
    pub undefined: Option<unsafe extern "system" fn() -> i32>,
}

/// Scripting parameters exchanged with the plug-in.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct DescriptorParameters {
    /// Structure version.
    pub descriptor_parameters_version: i16,
    /// Dialog behavior on replay.
    pub play_info: i16,
    /// Dialog behavior when recording.
    pub record_info: i16,
    /// Descriptor with the parameters, owned by whoever created it.
    pub descriptor: RawDescriptor,
    /// Procs for reading and writing descriptors.
    pub action_descriptor_procs: *const ActionDescriptorProcs,
}

/// Pixel data the plug-in asks the host to display.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct PSPixelMap {
    /// Structure version.
    pub version: i32,
    /// Area covered by `base_addr`.
    pub bounds: VRect,
    /// Image mode of the pixels.
    pub image_mode: i32,
    /// Bytes between rows.
    pub row_bytes: i32,
    /// Bytes between columns.
    pub col_bytes: i32,
    /// Bytes between planes.
    pub plane_bytes: i32,
    /// First byte of the first plane.
    pub base_addr: *mut c_void,
}

/// 32-bit coordinates for documents larger than the 16-bit fields allow.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct BigDocument {
    /// Structure version.
    pub version: i32,
    /// Non-zero when the plug-in reads and writes the 32-bit fields.
    pub plugin_using_32bit_coordinates: u8,
    /// Image size.
    pub image_size32: VPoint,
    /// Filter rectangle.
    pub filter_rect32: VRect,
    /// Requested input rectangle.
    pub in_rect32: VRect,
    /// Requested output rectangle.
    pub out_rect32: VRect,
    /// Requested mask rectangle.
    pub mask_rect32: VRect,
}

/// Information passed with the about selector.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct AboutRecord {
    /// Owner window for the about box.
    pub platform_data: *mut c_void,
    /// Basic suite.
    pub sp_basic_suite: *const SPBasicSuite,
    /// Index of the entry point within its module.
    pub plugin_ref: isize,
}

/// The record passed to every selector except about.
///
/// Rectangles are duplicated in [`BigDocument`]; the host reads the 32-bit
/// copies when the plug-in sets `plugin_using_32bit_coordinates`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct FilterRecord {
    /// Reserved, always zero.
    pub serial_number: i32,
    /// Abort predicate.
    pub abort_proc: Option<AbortProc>,
    /// Progress sink.
    pub progress_proc: Option<ProgressProc>,
    /// Parameter handle owned by the plug-in, kept by the host for replay.
    pub parameters: RawHandle,
    /// Document size.
    pub image_size: Point16,
    /// Number of planes in the document.
    pub planes: i16,
    /// Area to filter: the selection bounds or the whole image.
    pub filter_rect: Rect16,
    /// Background color.
    pub background: RgbColor,
    /// Foreground color.
    pub foreground: RgbColor,
    /// Bytes the plug-in may use.
    pub max_space: i32,
    /// Bytes the plug-in intends to use for buffers, set during prepare.
    pub buffer_space: i32,
    /// Requested input area.
    pub in_rect: Rect16,
    /// First requested input plane.
    pub in_lo_plane: i16,
    /// Last requested input plane (inclusive).
    pub in_hi_plane: i16,
    /// Requested output area.
    pub out_rect: Rect16,
    /// First requested output plane.
    pub out_lo_plane: i16,
    /// Last requested output plane (inclusive).
    pub out_hi_plane: i16,
    /// Input pixels for `in_rect`.
    pub in_data: *mut c_void,
    /// Bytes between input rows.
    pub in_row_bytes: i32,
    /// Output pixels for `out_rect`.
    pub out_data: *mut c_void,
    /// Bytes between output rows.
    pub out_row_bytes: i32,
    /// Non-zero for a floating selection.
    pub is_floating: u8,
    /// Non-zero when a selection mask exists.
    pub have_mask: u8,
    /// Non-zero when the host masks the output itself.
    pub auto_mask: u8,
    /// Requested mask area.
    pub mask_rect: Rect16,
    /// Mask bytes for `mask_rect`.
    pub mask_data: *mut c_void,
    /// Bytes between mask rows.
    pub mask_row_bytes: i32,
    /// Background color as bytes in the document's color space.
    pub back_color: [u8; 4],
    /// Foreground color as bytes in the document's color space.
    pub fore_color: [u8; 4],
    /// Host signature.
    pub host_sig: u32,
    /// Image mode.
    pub image_mode: i16,
    /// Horizontal resolution, 16.16 fixed.
    pub image_h_res: i32,
    /// Vertical resolution, 16.16 fixed.
    pub image_v_res: i32,
    /// Top left of the floating selection.
    pub float_coord: Point16,
    /// Size of the whole document.
    pub whole_size: Point16,
    /// Owner window handle.
    pub platform_data: *mut c_void,
    /// Buffer callbacks.
    pub buffer_procs: *const BufferProcs,
    /// Preview drawing callback.
    pub display_pixels: Option<DisplayPixelsProc>,
    /// Handle callbacks.
    pub handle_procs: *const HandleProcs,
    /// Layer planes in the input.
    pub in_layer_planes: i16,
    /// Transparency planes in the input.
    pub in_transparency_mask: i16,
    /// Layer mask planes in the input.
    pub in_layer_masks: i16,
    /// Inverted layer mask planes in the input.
    pub in_inverted_layer_masks: i16,
    /// Non-layer planes in the input.
    pub in_non_layer_planes: i16,
    /// Layer planes in the output.
    pub out_layer_planes: i16,
    /// Transparency planes in the output.
    pub out_transparency_mask: i16,
    /// Layer mask planes in the output.
    pub out_layer_masks: i16,
    /// Inverted layer mask planes in the output.
    pub out_inverted_layer_masks: i16,
    /// Non-layer planes in the output.
    pub out_non_layer_planes: i16,
    /// Bytes between input columns.
    pub in_column_bytes: i32,
    /// Bytes between input planes.
    pub in_plane_bytes: i32,
    /// Bytes between output columns.
    pub out_column_bytes: i32,
    /// Bytes between output planes.
    pub out_plane_bytes: i32,
    /// Scripting parameters.
    pub descriptor_parameters: *mut DescriptorParameters,
    /// Pascal string the plug-in fills before returning `errReportString`.
    pub error_string: *mut u8,
    /// Bits per channel.
    pub depth: i32,
    /// Basic suite.
    pub sp_basic_suite: *const SPBasicSuite,
    /// Index of the entry point within its module.
    pub plugin_ref: isize,
    /// Property callbacks.
    pub property_procs: *const PropertyProcs,
    /// 32-bit coordinates.
    pub big_document_data: *mut BigDocument,
    /// Selected `FilterCase`.
    pub filter_case: i16,
}

/// Capacity of the Pascal error string buffer, length byte included.
pub const ERROR_STRING_CAPACITY: usize = 256;

/// Number of filter cases in a `fici` table.
pub const FILTER_CASE_COUNT: usize = 7;

/// Per-case handling table as stored in a plug-in resource.
pub type FilterCaseInfoTable = [FilterCaseInfo; FILTER_CASE_COUNT];

const PTR: usize = core::mem::size_of::<usize>();

const_assert_eq!(core::mem::size_of::<Point16>(), 4);
const_assert_eq!(core::mem::size_of::<VPoint>(), 8);
const_assert_eq!(core::mem::size_of::<Rect16>(), 8);
const_assert_eq!(core::mem::size_of::<VRect>(), 16);
const_assert_eq!(core::mem::size_of::<RgbColor>(), 6);
const_assert_eq!(core::mem::size_of::<FilterCaseInfo>(), 4);
const_assert_eq!(core::mem::size_of::<FilterCaseInfoTable>(), 28);
const_assert_eq!(core::mem::size_of::<BufferProcs>(), PTR * 6);
const_assert_eq!(core::mem::size_of::<HandleProcs>(), PTR * 8);
const_assert_eq!(core::mem::size_of::<PropertyProcs>(), PTR * 3);
const_assert_eq!(core::mem::size_of::<PSBufferSuite1>(), PTR * 4);
const_assert_eq!(core::mem::size_of::<PSHandleSuite1>(), PTR * 6);
const_assert_eq!(core::mem::size_of::<PSHandleSuite2>(), PTR * 7);
const_assert_eq!(core::mem::size_of::<PSUIHooksSuite1>(), PTR * 4);
const_assert_eq!(core::mem::size_of::<ActionDescriptorProcs>(), PTR * 17);
const_assert_eq!(core::mem::size_of::<SPBasicSuite>(), PTR * 7);
const_assert_eq!(
    core::mem::size_of::<Option<FilterEntryPoint>>(),
    core::mem::size_of::<FilterEntryPoint>()
);

impl FilterRecord {
    /// A record with every pointer null and every field zero.
    pub const fn empty() -> Self {
        const NO_RECT: Rect16 = Rect16 {
            top: 0,
            left: 0,
            bottom: 0,
            right: 0,
        };
        const NO_POINT: Point16 = Point16 { v: 0, h: 0 };
        const BLACK: RgbColor = RgbColor {
            red: 0,
            green: 0,
            blue: 0,
        };
        Self {
            serial_number: 0,
            abort_proc: None,
            progress_proc: None,
            parameters: 0,
            image_size: NO_POINT,
            planes: 0,
            filter_rect: NO_RECT,
            background: BLACK,
            foreground: BLACK,
            max_space: 0,
            buffer_space: 0,
            in_rect: NO_RECT,
            in_lo_plane: 0,
            in_hi_plane: -1,
            out_rect: NO_RECT,
            out_lo_plane: 0,
            out_hi_plane: -1,
            in_data: core::ptr::null_mut(),
            in_row_bytes: 0,
            out_data: core::ptr::null_mut(),
            out_row_bytes: 0,
            is_floating: 0,
            have_mask: 0,
            auto_mask: 0,
            mask_rect: NO_RECT,
            mask_data: core::ptr::null_mut(),
            mask_row_bytes: 0,
            back_color: [0; 4],
            fore_color: [0; 4],
            host_sig: 0,
            image_mode: 0,
            image_h_res: 72 << 16,
            image_v_res: 72 << 16,
            float_coord: NO_POINT,
            whole_size: NO_POINT,
            platform_data: core::ptr::null_mut(),
            buffer_procs: core::ptr::null(),
            display_pixels: None,
            handle_procs: core::ptr::null(),
            in_layer_planes: 0,
            in_transparency_mask: 0,
            in_layer_masks: 0,
            in_inverted_layer_masks: 0,
            in_non_layer_planes: 0,
            out_layer_planes: 0,
            out_transparency_mask: 0,
            out_layer_masks: 0,
            out_inverted_layer_masks: 0,
            out_non_layer_planes: 0,
            in_column_bytes: 0,
            in_plane_bytes: 0,
            out_column_bytes: 0,
            out_plane_bytes: 0,
            descriptor_parameters: core::ptr::null_mut(),
            error_string: core::ptr::null_mut(),
            depth: 0,
            sp_basic_suite: core::ptr::null(),
            plugin_ref: 0,
            property_procs: core::ptr::null(),
            big_document_data: core::ptr::null_mut(),
            filter_case: 0,
        }
    }

    /// Input rectangle, honoring the 32-bit copy when the plug-in uses it.
    ///
    /// # Safety
    ///
    /// `big_document_data` must be null or point to a live [`BigDocument`].
    pub unsafe fn effective_in_rect(&self) -> VRect {
        // SAFETY: forwarded to the caller.
        match unsafe { self.big_document() } {
            Some(big) if big.plugin_using_32bit_coordinates != 0 => big.in_rect32,
            _ => VRect::from_rect16(self.in_rect),
        }
    }

    /// Output rectangle, honoring the 32-bit copy when the plug-in uses it.
    ///
    /// # Safety
    ///
    /// `big_document_data` must be null or point to a live [`BigDocument`].
    pub unsafe fn effective_out_rect(&self) -> VRect {
        // SAFETY: forwarded to the caller.
        match unsafe { self.big_document() } {
            Some(big) if big.plugin_using_32bit_coordinates != 0 => big.out_rect32,
            _ => VRect::from_rect16(self.out_rect),
        }
    }

    /// Mask rectangle, honoring the 32-bit copy when the plug-in uses it.
    ///
    /// # Safety
    ///
    /// `big_document_data` must be null or point to a live [`BigDocument`].
    pub unsafe fn effective_mask_rect(&self) -> VRect {
        // SAFETY: forwarded to the caller.
        match unsafe { self.big_document() } {
            Some(big) if big.plugin_using_32bit_coordinates != 0 => big.mask_rect32,
            _ => VRect::from_rect16(self.mask_rect),
        }
    }

    unsafe fn big_document(&self) -> Option<&BigDocument> {
        // SAFETY: the caller guarantees the pointer is null or live.
        unsafe { self.big_document_data.as_ref() }
    }
}

impl BigDocument {
    /// A zeroed block with the current version.
    pub const fn new() -> Self {
        const NO_RECT: VRect = VRect {
            top: 0,
            left: 0,
            bottom: 0,
            right: 0,
        };
        Self {
            version: crate::constants::procs_version::BIG_DOCUMENT,
            plugin_using_32bit_coordinates: 0,
            image_size32: VPoint { v: 0, h: 0 },
            filter_rect32: NO_RECT,
            in_rect32: NO_RECT,
            out_rect32: NO_RECT,
            mask_rect32: NO_RECT,
        }
    }
}

impl Default for BigDocument {
    fn default() -> Self {
        Self::new()
    }
}
