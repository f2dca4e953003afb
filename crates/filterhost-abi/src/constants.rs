//! Selectors, result codes and four-character codes of the filter ABI.
//!
//! All values match the legacy plug-in interface bit for bit; plug-ins
//! compiled against that interface compare against these literals.

/// Build a four-character code from its ASCII spelling.
///
/// The first character lands in the most significant byte, so
/// `four_cc(*b"8BIM") == 0x3842_494D`.
pub const fn four_cc(code: [u8; 4]) -> u32 {
    u32::from_be_bytes(code)
}

/// Signature every host-side property and resource is filed under.
pub const PHOTOSHOP_SIGNATURE: u32 = four_cc(*b"8BIM");

/// Host signature advertised in the record unless configured otherwise.
pub const DEFAULT_HOST_SIGNATURE: u32 = four_cc(*b"FHST");

/// Selector values passed as the first entry-point argument.
pub mod selector {
    /// Show the about box.
    pub const ABOUT: i16 = 0;
    /// Ask the user for parameters.
    pub const PARAMETERS: i16 = 1;
    /// Negotiate memory before filtering.
    pub const PREPARE: i16 = 2;
    /// Begin filtering; the plug-in requests its first rectangles.
    pub const START: i16 = 3;
    /// Process the requested rectangles and request the next ones.
    pub const CONTINUE: i16 = 4;
    /// Filtering finished; the plug-in releases its state.
    pub const FINISH: i16 = 5;

    /// Human readable selector name for diagnostics.
    pub fn name(selector: i16) -> &'static str {
        match selector {
            ABOUT => "about",
            PARAMETERS => "parameters",
            PREPARE => "prepare",
            START => "start",
            CONTINUE => "continue",
            FINISH => "finish",
            _ => "unknown",
        }
    }
}

/// `OSErr` result codes.
pub mod result_code {
    /// Success.
    pub const NO_ERR: i16 = 0;
    /// The user cancelled the operation.
    pub const USER_CANCELED: i16 = -128;
    /// Not enough memory.
    pub const MEM_FULL: i16 = -108;
    /// A null or unknown handle was passed.
    pub const NIL_HANDLE: i16 = -109;
    /// Generic parameter error.
    pub const PARAM_ERR: i16 = -50;
    /// The filter rejected its parameters.
    pub const FILTER_BAD_PARAMETERS: i16 = -30100;
    /// The filter does not support the image mode.
    pub const FILTER_BAD_MODE: i16 = -30101;
    /// The host lacks a facility the plug-in needs.
    pub const HOST_INSUFFICIENT: i16 = -30900;
    /// A property is not defined for the requested key.
    pub const PROPERTY_UNDEFINED: i16 = -30901;
    /// The plug-in placed a message in the record's error string.
    pub const REPORT_STRING: i16 = -30904;

    /// Short description of a result code.
    pub fn describe(code: i16) -> &'static str {
        match code {
            NO_ERR => "no error",
            USER_CANCELED => "the user cancelled the operation",
            MEM_FULL => "not enough memory",
            NIL_HANDLE => "null or unknown handle",
            PARAM_ERR => "invalid parameter",
            FILTER_BAD_PARAMETERS => "the filter rejected its parameters",
            FILTER_BAD_MODE => "the filter does not support this image mode",
            HOST_INSUFFICIENT => "the host does not provide a required facility",
            PROPERTY_UNDEFINED => "property is undefined",
            REPORT_STRING => "the plug-in reported an error message",
            _ => "unrecognized plug-in error",
        }
    }
}

/// Error codes returned through the basic suite (`SPErr`).
pub mod sp_error {
    /// Success.
    pub const NO_ERROR: i32 = 0;
    /// Allocation failed.
    pub const OUT_OF_MEMORY: i32 = -108;
    /// The requested suite name or version is not provided.
    pub const SUITE_NOT_FOUND: i32 = super::four_cc(*b"S!Fd") as i32;
    /// A caller passed a null pointer.
    pub const BAD_PARAMETER: i32 = super::four_cc(*b"Parm") as i32;
    /// The undefined slot of the basic suite was called.
    pub const UNIMPLEMENTED: i32 = super::four_cc(*b"!IMP") as i32;
}

/// Image modes stored in the record's `image_mode` field.
pub mod image_mode {
    /// 1-bit bitmap.
    pub const BITMAP: i16 = 0;
    /// 8-bit grayscale.
    pub const GRAY_SCALE: i16 = 1;
    /// Indexed color.
    pub const INDEXED_COLOR: i16 = 2;
    /// 8-bit RGB.
    pub const RGB_COLOR: i16 = 3;
    /// 8-bit CMYK.
    pub const CMYK_COLOR: i16 = 4;
    /// HSL.
    pub const HSL_COLOR: i16 = 5;
    /// HSB.
    pub const HSB_COLOR: i16 = 6;
    /// Multichannel.
    pub const MULTICHANNEL: i16 = 7;
    /// Duotone.
    pub const DUOTONE: i16 = 8;
    /// 8-bit Lab.
    pub const LAB_COLOR: i16 = 9;
    /// 16-bit grayscale.
    pub const GRAY16: i16 = 10;
    /// 16-bit RGB.
    pub const RGB48: i16 = 11;
    /// 16-bit Lab.
    pub const LAB48: i16 = 12;
    /// 16-bit CMYK.
    pub const CMYK64: i16 = 13;
    /// 16-bit multichannel.
    pub const DEEP_MULTICHANNEL: i16 = 14;
    /// 16-bit duotone.
    pub const DUOTONE16: i16 = 15;
    /// 32-bit float RGB.
    pub const RGB96: i16 = 16;
    /// 32-bit float grayscale.
    pub const GRAY32: i16 = 17;
}

/// Alpha handling requested per filter case.
pub mod handling {
    /// The filter cannot process this case.
    pub const CANT_FILTER: i8 = 0;
    /// Pass the data through untouched.
    pub const NONE: i8 = 1;
    /// Matte against black.
    pub const BLACK_MAT: i8 = 2;
    /// Matte against gray.
    pub const GRAY_MAT: i8 = 3;
    /// Matte against white.
    pub const WHITE_MAT: i8 = 4;
    /// Defringe the edges.
    pub const DEFRINGE: i8 = 5;
    /// Zero color where alpha is zero, black.
    pub const BLACK_ZAP: i8 = 6;
    /// Zero color where alpha is zero, gray.
    pub const GRAY_ZAP: i8 = 7;
    /// Zero color where alpha is zero, white.
    pub const WHITE_ZAP: i8 = 8;
    /// Fill the mask.
    pub const FILL_MASK: i8 = 9;
    /// Zap with the background color.
    pub const BACKGROUND_ZAP: i8 = 10;
    /// Zap with the foreground color.
    pub const FOREGROUND_ZAP: i8 = 11;
}

/// Property keys understood by the property suite.
pub mod property_key {
    use super::four_cc;

    /// Number of channels in the document (simple).
    pub const NUMBER_OF_CHANNELS: u32 = four_cc(*b"nuch");
    /// Image mode of the document (simple).
    pub const IMAGE_MODE: u32 = four_cc(*b"mode");
    /// Horizontal big nudge distance, 16.16 fixed (simple).
    pub const BIG_NUDGE_H: u32 = four_cc(*b"bndH");
    /// Vertical big nudge distance, 16.16 fixed (simple).
    pub const BIG_NUDGE_V: u32 = four_cc(*b"bndV");
    /// Interpolation method preference (simple).
    pub const INTERPOLATION_METHOD: u32 = four_cc(*b"intp");
    /// Document caption (complex).
    pub const CAPTION: u32 = four_cc(*b"capt");
    /// Document title (complex).
    pub const TITLE: u32 = four_cc(*b"titl");
    /// Host serial string (complex).
    pub const SERIAL_STRING: u32 = four_cc(*b"sstr");
    /// Host version, major in the high word (simple).
    pub const HOST_VERSION: u32 = four_cc(*b"vers");
    /// Ruler units preference (simple).
    pub const RULER_UNITS: u32 = four_cc(*b"rulr");
}

/// Type codes of values stored in action descriptors.
pub mod descriptor_type {
    use super::four_cc;

    /// 32-bit signed integer.
    pub const INTEGER: u32 = four_cc(*b"long");
    /// 64-bit float.
    pub const FLOAT: u32 = four_cc(*b"doub");
    /// Boolean.
    pub const BOOLEAN: u32 = four_cc(*b"bool");
    /// Enumerated value with its enumeration type.
    pub const ENUMERATED: u32 = four_cc(*b"enum");
    /// Text.
    pub const TEXT: u32 = four_cc(*b"TEXT");
}

/// Dialog behavior requested through the descriptor parameters.
pub mod play_info {
    /// Replay without showing the dialog.
    pub const DONT_DISPLAY: i16 = 0;
    /// Show the dialog.
    pub const DISPLAY: i16 = 1;
    /// Replay without any UI.
    pub const SILENT: i16 = 2;
}

/// Suite names and versions acquired through the basic suite.
pub mod suite {
    /// Buffer suite name.
    pub const BUFFER: &str = "Photoshop Buffer Suite for Plug-ins";
    /// Buffer suite version.
    pub const BUFFER_VERSION: i32 = 1;
    /// Handle suite name.
    pub const HANDLE: &str = "Photoshop Handle Suite for Plug-ins";
    /// Handle suite version without the corrupt-handle recovery path.
    pub const HANDLE_VERSION_1: i32 = 1;
    /// Handle suite version with `dispose_regular_handle`.
    pub const HANDLE_VERSION_2: i32 = 2;
    /// UI hooks suite name.
    pub const UI_HOOKS: &str = "Photoshop UIHooks Suite for Plug-ins";
    /// UI hooks suite version.
    pub const UI_HOOKS_VERSION: i32 = 1;
    /// Action descriptor suite name.
    pub const ACTION_DESCRIPTOR: &str = "Photoshop ActionDescriptor Suite";
    /// Action descriptor suite version.
    pub const ACTION_DESCRIPTOR_VERSION: i32 = 1;
}

/// Version numbers of the callback tables placed in the record.
pub mod procs_version {
    /// `BufferProcs` version.
    pub const BUFFER: i16 = 2;
    /// `HandleProcs` version.
    pub const HANDLE: i16 = 1;
    /// `PropertyProcs` version.
    pub const PROPERTY: i16 = 1;
    /// `DescriptorParameters` version.
    pub const DESCRIPTOR_PARAMETERS: i16 = 0;
    /// `PSPixelMap` version.
    pub const PIXEL_MAP: i32 = 1;
    /// `BigDocument` version.
    pub const BIG_DOCUMENT: i32 = 1;
}
