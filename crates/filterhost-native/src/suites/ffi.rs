//! `extern "system"` trampolines and the static tables that hold them.
//!
//! Every trampoline checks its pointer arguments, forwards to the active
//! session through [`with_active`] and translates [`SuiteError`] into the
//! code the plug-in expects. No trampoline panics.

use core::ffi::{CStr, c_char, c_void};

use filterhost_abi::{
    ActionDescriptorProcs, BufferProcs, FilterRecord, HandleProcs, OsErr, PSBufferSuite1,
    PSHandleSuite1, PSHandleSuite2, PSPixelMap, PSUIHooksSuite1, PropertyProcs, RawBuffer,
    RawDescriptor, RawHandle, RgbColor, SPBasicSuite, VRect, procs_version, result_code,
    sp_error,
};

use super::basic::SuiteKind;
use super::descriptor::DescriptorValue;
use super::handle::HandleSuiteVersion;
use super::pixels::{self, DecodedPixels};
use super::property::PropertyValue;
use super::session::{SessionContext, active, with_active};
use super::{SuiteError, SuiteResult, ui_hooks};
use crate::callbacks::PreviewFrame;

fn fail(call: &'static str, error: &SuiteError) -> OsErr {
    match error {
        SuiteError::PropertyUndefined { .. } | SuiteError::Cancelled => {
            tracing::debug!(call, error = %error, "Suite call declined");
        }
        _ => tracing::warn!(call, error = %error, "Suite call failed"),
    }
    error.os_err()
}

fn status(call: &'static str, result: SuiteResult<()>) -> OsErr {
    match result {
        Ok(()) => result_code::NO_ERR,
        Err(e) => fail(call, &e),
    }
}

/// Run `f` and store its value in `out`.
///
/// # Safety
///
/// `out` must be null or valid for a write of `T`.
unsafe fn write_result<T>(
    call: &'static str,
    out: *mut T,
    f: impl FnOnce(&SessionContext) -> SuiteResult<T>,
) -> OsErr {
    if out.is_null() {
        return fail(call, &SuiteError::NullPointer);
    }
    match with_active(f) {
        Ok(value) => {
            // SAFETY: non-null and writable per the caller's contract; the
            // plug-in may pass unaligned storage.
            unsafe { out.write_unaligned(value) };
            result_code::NO_ERR
        }
        Err(e) => fail(call, &e),
    }
}

/// Copy a NUL-terminated string owned by the plug-in.
///
/// # Safety
///
/// `text` must be null or point to a NUL-terminated string.
unsafe fn read_c_str(text: *const c_char) -> Option<String> {
    if text.is_null() {
        return None;
    }
    // SAFETY: non-null and NUL-terminated per the caller's contract.
    let text = unsafe { CStr::from_ptr(text) };
    Some(text.to_string_lossy().into_owned())
}

// ---------------------------------------------------------------------------
// Record procs
// ---------------------------------------------------------------------------

unsafe extern "system" fn abort_proc() -> u8 {
    u8::from(active().is_some_and(|s| s.is_aborted()))
}

unsafe extern "system" fn progress_proc(done: i32, total: i32) {
    if let Some(session) = active() {
        session.report_progress(done, total);
    }
}

unsafe extern "system" fn display_pixels(
    source: *const PSPixelMap,
    src_rect: *const VRect,
    dst_row: i32,
    dst_col: i32,
    _platform_context: *mut c_void,
) -> OsErr {
    // SAFETY: the plug-in passes null or live structures for the call.
    let (Some(map), Some(rect)) = (unsafe { source.as_ref() }, unsafe { src_rect.as_ref() }) else {
        return fail("display_pixels", &SuiteError::NullPointer);
    };
    let Some(session) = active() else {
        return fail("display_pixels", &SuiteError::NoSession);
    };
    if !session.has_preview() {
        return result_code::NO_ERR;
    }
    // SAFETY: the plug-in guarantees the pixel map describes readable
    // memory for its bounds during this call.
    let decoded = match unsafe { pixels::decode(map, *rect) } {
        Ok(Some(decoded)) => decoded,
        Ok(None) => return result_code::NO_ERR,
        Err(e) => return fail("display_pixels", &e),
    };
    let presented = match decoded {
        DecodedPixels::Color(surface) => session.present_preview(PreviewFrame {
            surface,
            row: dst_row,
            column: dst_col,
        }),
        DecodedPixels::Gray {
            samples,
            width,
            surface,
        } => session.present_gray_preview(
            &samples,
            width,
            PreviewFrame {
                surface,
                row: dst_row,
                column: dst_col,
            },
        ),
    };
    match presented {
        Ok(()) => result_code::NO_ERR,
        Err(e) => {
            tracing::warn!(error = %e, "Preview could not be displayed");
            result_code::PARAM_ERR
        }
    }
}

// ---------------------------------------------------------------------------
// Buffers
// ---------------------------------------------------------------------------

unsafe extern "system" fn buffer_allocate(size: i32, buffer: *mut RawBuffer) -> OsErr {
    // SAFETY: the plug-in passes null or a writable identifier slot.
    unsafe { write_result("buffer.allocate", buffer, |s| s.buffers().allocate(size)) }
}

unsafe extern "system" fn buffer_lock(buffer: RawBuffer, _move_high: u8) -> *mut u8 {
    with_active(|s| s.buffers().lock(buffer)).unwrap_or_else(|e| {
        fail("buffer.lock", &e);
        core::ptr::null_mut()
    })
}

unsafe extern "system" fn buffer_unlock(buffer: RawBuffer) {
    status("buffer.unlock", with_active(|s| s.buffers().unlock(buffer)));
}

unsafe extern "system" fn buffer_free(buffer: RawBuffer) {
    status("buffer.free", with_active(|s| s.buffers().free(buffer)));
}

unsafe extern "system" fn buffer_space() -> i32 {
    active().map_or(0, |s| i32::try_from(s.buffers().space()).unwrap_or(i32::MAX))
}

unsafe extern "system" fn buffer_suite_new(requested: *mut u32, minimum: u32) -> *mut u8 {
    // SAFETY: the plug-in passes null or a readable and writable size.
    let Some(requested) = (unsafe { requested.as_mut() }) else {
        fail("buffer_suite.new", &SuiteError::NullPointer);
        return core::ptr::null_mut();
    };
    match with_active(|s| s.buffers().allocate_pointer(*requested, minimum)) {
        Ok((address, granted)) => {
            *requested = granted;
            address
        }
        Err(e) => {
            fail("buffer_suite.new", &e);
            core::ptr::null_mut()
        }
    }
}

unsafe extern "system" fn buffer_suite_dispose(buffer: *mut *mut u8) {
    // SAFETY: the plug-in passes null or a readable and writable pointer slot.
    let Some(slot) = (unsafe { buffer.as_mut() }) else {
        return;
    };
    if slot.is_null() {
        return;
    }
    let address = *slot;
    if status("buffer_suite.dispose", with_active(|s| s.buffers().free_pointer(address)))
        == result_code::NO_ERR
    {
        *slot = core::ptr::null_mut();
    }
}

unsafe extern "system" fn buffer_suite_get_size(buffer: *mut u8) -> u32 {
    active().map_or(0, |s| {
        u32::try_from(s.buffers().size_of_pointer(buffer)).unwrap_or(u32::MAX)
    })
}

unsafe extern "system" fn buffer_suite_get_space() -> u32 {
    active().map_or(0, |s| u32::try_from(s.buffers().space()).unwrap_or(u32::MAX))
}

// ---------------------------------------------------------------------------
// Handles
// ---------------------------------------------------------------------------

unsafe extern "system" fn handle_new(size: i32) -> RawHandle {
    with_active(|s| s.handles().allocate(size)).unwrap_or_else(|e| {
        fail("handle.new", &e);
        0
    })
}

unsafe extern "system" fn handle_dispose(handle: RawHandle) {
    if handle != 0 {
        status("handle.dispose", with_active(|s| s.handles().dispose(handle)));
    }
}

unsafe extern "system" fn handle_dispose_regular(handle: RawHandle) {
    if handle == 0 {
        return;
    }
    if let Err(e) = with_active(|s| s.handles().dispose(handle)) {
        tracing::debug!(error = %e, "Ignoring disposal of a foreign handle");
    }
}

unsafe extern "system" fn handle_get_size(handle: RawHandle) -> i32 {
    with_active(|s| s.handles().size(handle)).unwrap_or_else(|e| {
        fail("handle.get_size", &e);
        0
    })
}

unsafe extern "system" fn handle_set_size(handle: RawHandle, size: i32) -> OsErr {
    status("handle.set_size", with_active(|s| s.handles().set_size(handle, size)))
}

unsafe extern "system" fn handle_lock(handle: RawHandle, _move_high: u8) -> *mut u8 {
    with_active(|s| s.handles().lock(handle)).unwrap_or_else(|e| {
        fail("handle.lock", &e);
        core::ptr::null_mut()
    })
}

unsafe extern "system" fn handle_unlock(handle: RawHandle) {
    status("handle.unlock", with_active(|s| s.handles().unlock(handle)));
}

unsafe extern "system" fn handle_set_lock(
    handle: RawHandle,
    lock: u8,
    address: *mut *mut u8,
    old_lock: *mut u8,
) {
    match with_active(|s| s.handles().set_lock(handle, lock != 0)) {
        Ok((ptr, was_locked)) => {
            if !address.is_null() {
                // SAFETY: non-null; the plug-in passes a writable slot.
                unsafe { address.write_unaligned(ptr) };
            }
            if !old_lock.is_null() {
                // SAFETY: as above.
                unsafe { old_lock.write(u8::from(was_locked)) };
            }
        }
        Err(e) => {
            fail("handle.set_lock", &e);
            if !address.is_null() {
                // SAFETY: as above.
                unsafe { address.write_unaligned(core::ptr::null_mut()) };
            }
        }
    }
}

unsafe extern "system" fn handle_recover_space(_size: i32) {}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

unsafe extern "system" fn get_property(
    signature: u32,
    key: u32,
    index: i32,
    simple: *mut isize,
    complex: *mut RawHandle,
) -> OsErr {
    let value = match with_active(|s| s.properties().get(signature, key, index)) {
        Ok(value) => value,
        Err(e) => return fail("property.get", &e),
    };
    match value {
        // SAFETY: the plug-in passes null or a writable slot.
        PropertyValue::Simple(v) => unsafe { write_result("property.get", simple, |_| Ok(v)) },
        PropertyValue::Complex(bytes) => {
            // SAFETY: as above.
            unsafe { write_result("property.get", complex, |s| s.handles().from_bytes(&bytes)) }
        }
    }
}

unsafe extern "system" fn set_property(
    signature: u32,
    key: u32,
    index: i32,
    simple: isize,
    complex: RawHandle,
) -> OsErr {
    let result = with_active(|s| {
        let value = if complex == 0 {
            PropertyValue::Simple(simple)
        } else {
            let bytes = s
                .handles()
                .bytes(complex)
                .map(<[u8]>::to_vec)
                .ok_or(SuiteError::UnknownHandle(complex))?;
            PropertyValue::Complex(bytes)
        };
        s.properties().set(signature, key, index, value)
    });
    status("property.set", result)
}

// ---------------------------------------------------------------------------
// Action descriptors
// ---------------------------------------------------------------------------

unsafe extern "system" fn descriptor_make(descriptor: *mut RawDescriptor) -> OsErr {
    // SAFETY: the plug-in passes null or a writable slot.
    unsafe { write_result("descriptor.make", descriptor, |s| s.descriptors().make()) }
}

unsafe extern "system" fn descriptor_free(descriptor: RawDescriptor) -> OsErr {
    status("descriptor.free", with_active(|s| s.descriptors().free(descriptor)))
}

unsafe extern "system" fn descriptor_has_key(
    descriptor: RawDescriptor,
    key: u32,
    has: *mut u8,
) -> OsErr {
    // SAFETY: the plug-in passes null or a writable slot.
    unsafe {
        write_result("descriptor.has_key", has, |s| {
            s.descriptors().has_key(descriptor, key).map(u8::from)
        })
    }
}

unsafe extern "system" fn descriptor_get_count(descriptor: RawDescriptor, count: *mut u32) -> OsErr {
    // SAFETY: the plug-in passes null or a writable slot.
    unsafe { write_result("descriptor.get_count", count, |s| s.descriptors().count(descriptor)) }
}

unsafe extern "system" fn descriptor_get_key(
    descriptor: RawDescriptor,
    index: u32,
    key: *mut u32,
) -> OsErr {
    // SAFETY: the plug-in passes null or a writable slot.
    unsafe {
        write_result("descriptor.get_key", key, |s| {
            s.descriptors().key_at(descriptor, index)
        })
    }
}

unsafe extern "system" fn descriptor_get_type(
    descriptor: RawDescriptor,
    key: u32,
    type_code: *mut u32,
) -> OsErr {
    // SAFETY: the plug-in passes null or a writable slot.
    unsafe {
        write_result("descriptor.get_type", type_code, |s| {
            s.descriptors().type_of(descriptor, key)
        })
    }
}

fn put(call: &'static str, descriptor: RawDescriptor, key: u32, value: DescriptorValue) -> OsErr {
    status(call, with_active(|s| s.descriptors().put(descriptor, key, value)))
}

unsafe extern "system" fn descriptor_put_integer(
    descriptor: RawDescriptor,
    key: u32,
    value: i32,
) -> OsErr {
    put("descriptor.put_integer", descriptor, key, DescriptorValue::Integer(value))
}

unsafe extern "system" fn descriptor_get_integer(
    descriptor: RawDescriptor,
    key: u32,
    value: *mut i32,
) -> OsErr {
    // SAFETY: the plug-in passes null or a writable slot.
    unsafe {
        write_result("descriptor.get_integer", value, |s| {
            s.descriptors().get_integer(descriptor, key)
        })
    }
}

unsafe extern "system" fn descriptor_put_float(
    descriptor: RawDescriptor,
    key: u32,
    value: f64,
) -> OsErr {
    put("descriptor.put_float", descriptor, key, DescriptorValue::Float(value))
}

unsafe extern "system" fn descriptor_get_float(
    descriptor: RawDescriptor,
    key: u32,
    value: *mut f64,
) -> OsErr {
    // SAFETY: the plug-in passes null or a writable slot.
    unsafe {
        write_result("descriptor.get_float", value, |s| {
            s.descriptors().get_float(descriptor, key)
        })
    }
}

unsafe extern "system" fn descriptor_put_boolean(
    descriptor: RawDescriptor,
    key: u32,
    value: u8,
) -> OsErr {
    put("descriptor.put_boolean", descriptor, key, DescriptorValue::Boolean(value != 0))
}

unsafe extern "system" fn descriptor_get_boolean(
    descriptor: RawDescriptor,
    key: u32,
    value: *mut u8,
) -> OsErr {
    // SAFETY: the plug-in passes null or a writable slot.
    unsafe {
        write_result("descriptor.get_boolean", value, |s| {
            s.descriptors().get_boolean(descriptor, key).map(u8::from)
        })
    }
}

unsafe extern "system" fn descriptor_put_enumerated(
    descriptor: RawDescriptor,
    key: u32,
    enum_type: u32,
    value: u32,
) -> OsErr {
    put(
        "descriptor.put_enumerated",
        descriptor,
        key,
        DescriptorValue::Enumerated { enum_type, value },
    )
}

unsafe extern "system" fn descriptor_get_enumerated(
    descriptor: RawDescriptor,
    key: u32,
    enum_type: *mut u32,
    value: *mut u32,
) -> OsErr {
    if enum_type.is_null() || value.is_null() {
        return fail("descriptor.get_enumerated", &SuiteError::NullPointer);
    }
    match with_active(|s| s.descriptors().get_enumerated(descriptor, key)) {
        Ok((t, v)) => {
            // SAFETY: both checked non-null; the plug-in passes writable slots.
            unsafe {
                enum_type.write_unaligned(t);
                value.write_unaligned(v);
            }
            result_code::NO_ERR
        }
        Err(e) => fail("descriptor.get_enumerated", &e),
    }
}

unsafe extern "system" fn descriptor_put_string(
    descriptor: RawDescriptor,
    key: u32,
    value: *const c_char,
) -> OsErr {
    // SAFETY: the plug-in passes null or a NUL-terminated string.
    let Some(text) = (unsafe { read_c_str(value) }) else {
        return fail("descriptor.put_string", &SuiteError::NullPointer);
    };
    put("descriptor.put_string", descriptor, key, DescriptorValue::Text(text))
}

unsafe extern "system" fn descriptor_get_string(
    descriptor: RawDescriptor,
    key: u32,
    buffer: *mut c_char,
    capacity: u32,
) -> OsErr {
    if buffer.is_null() || capacity == 0 {
        return fail("descriptor.get_string", &SuiteError::NullPointer);
    }
    let text = match with_active(|s| s.descriptors().get_text(descriptor, key).map(str::to_owned))
    {
        Ok(text) => text,
        Err(e) => return fail("descriptor.get_string", &e),
    };
    let bytes = text.as_bytes();
    let len = bytes.len().min(capacity as usize - 1);
    // SAFETY: `buffer` holds `capacity` bytes and `len < capacity`.
    unsafe {
        core::ptr::copy_nonoverlapping(bytes.as_ptr(), buffer.cast::<u8>(), len);
        buffer.add(len).write(0);
    }
    result_code::NO_ERR
}

unsafe extern "system" fn descriptor_get_string_length(
    descriptor: RawDescriptor,
    key: u32,
    length: *mut u32,
) -> OsErr {
    // SAFETY: the plug-in passes null or a writable slot.
    unsafe {
        write_result("descriptor.get_string_length", length, |s| {
            s.descriptors()
                .get_text(descriptor, key)
                .map(|t| u32::try_from(t.len()).unwrap_or(u32::MAX))
        })
    }
}

// ---------------------------------------------------------------------------
// UI hooks
// ---------------------------------------------------------------------------

unsafe extern "system" fn ui_main_app_window() -> isize {
    active().map_or(0, |s| ui_hooks::main_window(&s))
}

unsafe extern "system" fn ui_tick_count() -> u32 {
    active().map_or(0, |s| s.tick_count())
}

unsafe extern "system" fn ui_get_plugin_name(_plugin_ref: isize, name: *mut RawHandle) -> OsErr {
    // SAFETY: the plug-in passes null or a writable slot.
    unsafe { write_result("ui_hooks.get_plugin_name", name, ui_hooks::plugin_name) }
}

unsafe extern "system" fn ui_pick_color(prompt: *const c_char, color: *mut RgbColor) -> OsErr {
    // SAFETY: the plug-in passes null or a NUL-terminated prompt.
    let prompt = unsafe { read_c_str(prompt) };
    // SAFETY: the plug-in passes null or a writable color.
    unsafe {
        write_result("ui_hooks.pick_color", color, |s| {
            ui_hooks::pick_color(s, prompt.as_deref())
        })
    }
}

// ---------------------------------------------------------------------------
// Basic suite
// ---------------------------------------------------------------------------

unsafe extern "system" fn sp_acquire_suite(
    name: *const c_char,
    version: i32,
    suite: *mut *const c_void,
) -> i32 {
    if suite.is_null() {
        return sp_error::BAD_PARAMETER;
    }
    // SAFETY: the plug-in passes null or a NUL-terminated name.
    let Some(name) = (unsafe { read_c_str(name) }) else {
        return sp_error::BAD_PARAMETER;
    };
    match SuiteKind::resolve(&name, version) {
        Ok(kind) => {
            tracing::debug!(suite = %name, version, "Suite acquired");
            // SAFETY: checked non-null; the plug-in passes a writable slot.
            unsafe { suite.write_unaligned(suite_table(kind)) };
            sp_error::NO_ERROR
        }
        Err(e) => {
            tracing::debug!(error = %e, "Suite not provided");
            // SAFETY: as above.
            unsafe { suite.write_unaligned(core::ptr::null()) };
            e.sp_err()
        }
    }
}

unsafe extern "system" fn sp_release_suite(_name: *const c_char, _version: i32) -> i32 {
    sp_error::NO_ERROR
}

unsafe extern "system" fn sp_is_equal(a: *const c_char, b: *const c_char) -> u8 {
    if a.is_null() || b.is_null() {
        return 0;
    }
    // SAFETY: both non-null and NUL-terminated per the suite contract.
    let (a, b) = unsafe { (CStr::from_ptr(a), CStr::from_ptr(b)) };
    u8::from(a == b)
}

unsafe extern "system" fn sp_allocate_block(size: usize, block: *mut *mut c_void) -> i32 {
    if block.is_null() {
        return sp_error::BAD_PARAMETER;
    }
    // SAFETY: malloc accepts any size; zero is bumped so the result is unique.
    let memory = unsafe { libc::malloc(size.max(1)) };
    // SAFETY: checked non-null; the plug-in passes a writable slot.
    unsafe { block.write_unaligned(memory) };
    if memory.is_null() {
        sp_error::OUT_OF_MEMORY
    } else {
        sp_error::NO_ERROR
    }
}

unsafe extern "system" fn sp_free_block(block: *mut c_void) -> i32 {
    // SAFETY: blocks come from `sp_allocate_block` or `sp_reallocate_block`;
    // free accepts null.
    unsafe { libc::free(block) };
    sp_error::NO_ERROR
}

unsafe extern "system" fn sp_reallocate_block(
    block: *mut c_void,
    new_size: usize,
    out: *mut *mut c_void,
) -> i32 {
    if out.is_null() {
        return sp_error::BAD_PARAMETER;
    }
    // SAFETY: `block` is null or came from this suite's allocator.
    let memory = unsafe { libc::realloc(block, new_size.max(1)) };
    if memory.is_null() {
        return sp_error::OUT_OF_MEMORY;
    }
    // SAFETY: checked non-null; the plug-in passes a writable slot.
    unsafe { out.write_unaligned(memory) };
    sp_error::NO_ERROR
}

unsafe extern "system" fn sp_undefined() -> i32 {
    sp_error::UNIMPLEMENTED
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

pub(crate) static BUFFER_PROCS: BufferProcs = BufferProcs {
    buffer_procs_version: procs_version::BUFFER,
    num_buffer_procs: 5,
    allocate: Some(buffer_allocate),
    lock: Some(buffer_lock),
    unlock: Some(buffer_unlock),
    free: Some(buffer_free),
    space: Some(buffer_space),
};

pub(crate) static HANDLE_PROCS: HandleProcs = HandleProcs {
    handle_procs_version: procs_version::HANDLE,
    num_handle_procs: 7,
    new: Some(handle_new),
    dispose: Some(handle_dispose),
    get_size: Some(handle_get_size),
    set_size: Some(handle_set_size),
    lock: Some(handle_lock),
    unlock: Some(handle_unlock),
    recover_space: Some(handle_recover_space),
};

pub(crate) static PROPERTY_PROCS: PropertyProcs = PropertyProcs {
    property_procs_version: procs_version::PROPERTY,
    num_property_procs: 2,
    get_property: Some(get_property),
    set_property: Some(set_property),
};

pub(crate) static ACTION_DESCRIPTOR_PROCS: ActionDescriptorProcs = ActionDescriptorProcs {
    make: Some(descriptor_make),
    free: Some(descriptor_free),
    has_key: Some(descriptor_has_key),
    get_count: Some(descriptor_get_count),
    get_key: Some(descriptor_get_key),
    get_type: Some(descriptor_get_type),
    put_integer: Some(descriptor_put_integer),
    get_integer: Some(descriptor_get_integer),
    put_float: Some(descriptor_put_float),
    get_float: Some(descriptor_get_float),
    put_boolean: Some(descriptor_put_boolean),
    get_boolean: Some(descriptor_get_boolean),
    put_enumerated: Some(descriptor_put_enumerated),
    get_enumerated: Some(descriptor_get_enumerated),
    put_string: Some(descriptor_put_string),
    get_string: Some(descriptor_get_string),
    get_string_length: Some(descriptor_get_string_length),
};

static BUFFER_SUITE: PSBufferSuite1 = PSBufferSuite1 {
    new: Some(buffer_suite_new),
    dispose: Some(buffer_suite_dispose),
    get_size: Some(buffer_suite_get_size),
    get_space: Some(buffer_suite_get_space),
};

static HANDLE_SUITE_1: PSHandleSuite1 = PSHandleSuite1 {
    new: Some(handle_new),
    dispose: Some(handle_dispose),
    set_lock: Some(handle_set_lock),
    get_size: Some(handle_get_size),
    set_size: Some(handle_set_size),
    recover_space: Some(handle_recover_space),
};

static HANDLE_SUITE_2: PSHandleSuite2 = PSHandleSuite2 {
    new: Some(handle_new),
    dispose: Some(handle_dispose),
    dispose_regular_handle: Some(handle_dispose_regular),
    set_lock: Some(handle_set_lock),
    get_size: Some(handle_get_size),
    set_size: Some(handle_set_size),
    recover_space: Some(handle_recover_space),
};

static UI_HOOKS_SUITE: PSUIHooksSuite1 = PSUIHooksSuite1 {
    main_app_window: Some(ui_main_app_window),
    tick_count: Some(ui_tick_count),
    get_plugin_name: Some(ui_get_plugin_name),
    pick_color: Some(ui_pick_color),
};

pub(crate) static SP_BASIC_SUITE: SPBasicSuite = SPBasicSuite {
    acquire_suite: Some(sp_acquire_suite),
    release_suite: Some(sp_release_suite),
    is_equal: Some(sp_is_equal),
    allocate_block: Some(sp_allocate_block),
    free_block: Some(sp_free_block),
    reallocate_block: Some(sp_reallocate_block),
    undefined: Some(sp_undefined),
};

/// Address of the table for `kind`.
pub(crate) fn suite_table(kind: SuiteKind) -> *const c_void {
    match kind {
        SuiteKind::Buffer => (&raw const BUFFER_SUITE).cast(),
        SuiteKind::Handle(HandleSuiteVersion::V1) => (&raw const HANDLE_SUITE_1).cast(),
        SuiteKind::Handle(HandleSuiteVersion::V2) => (&raw const HANDLE_SUITE_2).cast(),
        SuiteKind::UiHooks => (&raw const UI_HOOKS_SUITE).cast(),
        SuiteKind::ActionDescriptor => (&raw const ACTION_DESCRIPTOR_PROCS).cast(),
    }
}

/// Point the record's callbacks at the static tables.
pub(crate) fn install_record_procs(record: &mut FilterRecord) {
    record.abort_proc = Some(abort_proc);
    record.progress_proc = Some(progress_proc);
    record.display_pixels = Some(display_pixels);
    record.buffer_procs = &raw const BUFFER_PROCS;
    record.handle_procs = &raw const HANDLE_PROCS;
    record.property_procs = &raw const PROPERTY_PROCS;
    record.sp_basic_suite = &raw const SP_BASIC_SUITE;
}
