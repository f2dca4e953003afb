//! Plain data types shared between the host and filter plug-ins.
//!
//! Geometry, colors, mode bitflags and the per-case transparency handling
//! table. Every type here is `#[repr(C)]` or `#[repr(transparent)]` and has
//! its size pinned by a compile-time assertion in [`crate::record`].

use bitflags::bitflags;

use crate::constants::handling;

/// Opaque identifier of a host-managed handle. Zero is the null handle.
pub type RawHandle = u64;

/// Opaque identifier of a host-managed buffer. Zero is the null buffer.
pub type RawBuffer = u64;

/// Opaque identifier of an action descriptor. Zero is the null descriptor.
pub type RawDescriptor = u64;

/// Legacy `OSErr` result type.
pub type OsErr = i16;

bitflags! {
    /// Image modes a plug-in declares support for.
    ///
    /// The bit assignment is the legacy one: the 8-bit modes occupy the low
    /// byte in reverse order, the deep modes the high byte.
    #[repr(transparent)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct SupportedModes: u16 {
        /// 1-bit bitmap
        const BITMAP            = 0x0080;
        /// 8-bit grayscale
        const GRAY_SCALE        = 0x0040;
        /// Indexed color
        const INDEXED_COLOR     = 0x0020;
        /// 8-bit RGB
        const RGB_COLOR         = 0x0010;
        /// 8-bit CMYK
        const CMYK_COLOR        = 0x0008;
        /// HSL
        const HSL_COLOR         = 0x0004;
        /// HSB
        const HSB_COLOR         = 0x0002;
        /// Multichannel
        const MULTICHANNEL      = 0x0001;
        /// Duotone
        const DUOTONE           = 0x8000;
        /// 8-bit Lab
        const LAB_COLOR         = 0x4000;
        /// 16-bit grayscale
        const GRAY16            = 0x2000;
        /// 16-bit RGB
        const RGB48             = 0x1000;
        /// 16-bit Lab
        const LAB48             = 0x0800;
        /// 16-bit CMYK
        const CMYK64            = 0x0400;
        /// 16-bit multichannel
        const DEEP_MULTICHANNEL = 0x0200;
        /// 16-bit duotone
        const DUOTONE16         = 0x0100;
    }
}

impl SupportedModes {
    /// The flag that corresponds to an `image_mode` value, if any.
    pub fn from_image_mode(mode: i16) -> Option<Self> {
        use crate::constants::image_mode as m;
        let flag = match mode {
            m::BITMAP => Self::BITMAP,
            m::GRAY_SCALE => Self::GRAY_SCALE,
            m::INDEXED_COLOR => Self::INDEXED_COLOR,
            m::RGB_COLOR => Self::RGB_COLOR,
            m::CMYK_COLOR => Self::CMYK_COLOR,
            m::HSL_COLOR => Self::HSL_COLOR,
            m::HSB_COLOR => Self::HSB_COLOR,
            m::MULTICHANNEL => Self::MULTICHANNEL,
            m::DUOTONE => Self::DUOTONE,
            m::LAB_COLOR => Self::LAB_COLOR,
            m::GRAY16 => Self::GRAY16,
            m::RGB48 => Self::RGB48,
            m::LAB48 => Self::LAB48,
            m::CMYK64 => Self::CMYK64,
            m::DEEP_MULTICHANNEL => Self::DEEP_MULTICHANNEL,
            m::DUOTONE16 => Self::DUOTONE16,
            _ => return None,
        };
        Some(flag)
    }
}

bitflags! {
    /// Behavior flags stored in `FilterCaseInfo::flags1`.
    #[repr(transparent)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct FilterCaseFlags: u8 {
        /// The host must not copy the source into the destination first.
        const DONT_COPY_TO_DESTINATION = 0b0000_0001;
        /// The filter produces output for fully transparent input.
        const WORKS_WITH_BLANK_DATA    = 0b0000_0010;
        /// The filter also processes the layer mask.
        const FILTERS_LAYER_MASK       = 0b0000_0100;
        /// The filter may write outside the selection.
        const WRITES_OUTSIDE_SELECTION = 0b0000_1000;
    }
}

/// The seven image/selection combinations a filter can be invoked on.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FilterCase {
    /// Flattened image, no selection.
    FlatImageNoSelection = 1,
    /// Flattened image with a selection.
    FlatImageWithSelection = 2,
    /// Floating selection.
    FloatingSelection = 3,
    /// Layer with editable transparency, no selection.
    EditableTransparencyNoSelection = 4,
    /// Layer with editable transparency and a selection.
    EditableTransparencyWithSelection = 5,
    /// Layer with locked transparency, no selection.
    ProtectedTransparencyNoSelection = 6,
    /// Layer with locked transparency and a selection.
    ProtectedTransparencyWithSelection = 7,
}

impl FilterCase {
    /// Every case, in table order.
    pub const ALL: [FilterCase; 7] = [
        FilterCase::FlatImageNoSelection,
        FilterCase::FlatImageWithSelection,
        FilterCase::FloatingSelection,
        FilterCase::EditableTransparencyNoSelection,
        FilterCase::EditableTransparencyWithSelection,
        FilterCase::ProtectedTransparencyNoSelection,
        FilterCase::ProtectedTransparencyWithSelection,
    ];

    /// Pick the case for an image with or without transparency and selection.
    pub fn select(has_transparency: bool, has_selection: bool) -> Self {
        match (has_transparency, has_selection) {
            (false, false) => FilterCase::FlatImageNoSelection,
            (false, true) => FilterCase::FlatImageWithSelection,
            (true, false) => FilterCase::EditableTransparencyNoSelection,
            (true, true) => FilterCase::EditableTransparencyWithSelection,
        }
    }

    /// The flattened counterpart used when a filter cannot handle alpha.
    pub fn flattened(self) -> Self {
        if self.has_selection() {
            FilterCase::FlatImageWithSelection
        } else {
            FilterCase::FlatImageNoSelection
        }
    }

    /// Whether this case carries a selection.
    pub fn has_selection(self) -> bool {
        matches!(
            self,
            FilterCase::FlatImageWithSelection
                | FilterCase::FloatingSelection
                | FilterCase::EditableTransparencyWithSelection
                | FilterCase::ProtectedTransparencyWithSelection
        )
    }

    /// Whether this case exposes a transparency plane.
    pub fn has_transparency(self) -> bool {
        !matches!(
            self,
            FilterCase::FlatImageNoSelection | FilterCase::FlatImageWithSelection
        )
    }

    /// Index into the seven-entry `FilterCaseInfo` table.
    pub fn index(self) -> usize {
        (self as i16 - 1) as usize
    }

    /// Raw value stored in the record.
    pub fn as_raw(self) -> i16 {
        self as i16
    }
}

/// Per-case alpha handling, as stored in the plug-in's `fici` property.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FilterCaseInfo {
    /// How the host prepares alpha before filtering.
    pub input_handling: i8,
    /// How the host treats alpha after filtering.
    pub output_handling: i8,
    /// `FilterCaseFlags` bits.
    pub flags1: u8,
    /// Reserved.
    pub flags2: u8,
}

impl FilterCaseInfo {
    /// Size of one entry in the serialized `fici` table.
    pub const SIZE: usize = 4;

    /// Entry for a case the filter cannot process.
    pub const CANT_FILTER: Self = Self {
        input_handling: handling::CANT_FILTER,
        output_handling: handling::CANT_FILTER,
        flags1: 0,
        flags2: 0,
    };

    /// Entry that passes data through without alpha processing.
    pub const PASS_THROUGH: Self = Self {
        input_handling: handling::NONE,
        output_handling: handling::NONE,
        flags1: 0,
        flags2: 0,
    };

    /// Decode one entry.
    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        Self {
            input_handling: bytes[0] as i8,
            output_handling: bytes[1] as i8,
            flags1: bytes[2],
            flags2: bytes[3],
        }
    }

    /// Encode one entry.
    pub fn to_bytes(self) -> [u8; 4] {
        [
            self.input_handling as u8,
            self.output_handling as u8,
            self.flags1,
            self.flags2,
        ]
    }

    /// Whether the filter can process this case at all.
    pub fn can_filter(&self) -> bool {
        self.input_handling != handling::CANT_FILTER
    }

    /// Decoded `flags1`.
    pub fn flags(&self) -> FilterCaseFlags {
        FilterCaseFlags::from_bits_truncate(self.flags1)
    }
}

/// 16-bit point, vertical first as in the legacy layout.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point16 {
    /// Vertical coordinate.
    pub v: i16,
    /// Horizontal coordinate.
    pub h: i16,
}

/// 32-bit point, vertical first.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VPoint {
    /// Vertical coordinate.
    pub v: i32,
    /// Horizontal coordinate.
    pub h: i32,
}

/// 16-bit rectangle, `top, left, bottom, right`, exclusive of bottom/right.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect16 {
    /// Top edge.
    pub top: i16,
    /// Left edge.
    pub left: i16,
    /// Bottom edge (exclusive).
    pub bottom: i16,
    /// Right edge (exclusive).
    pub right: i16,
}

impl Rect16 {
    /// Whether the rectangle covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.bottom <= self.top || self.right <= self.left
    }
}

/// 32-bit rectangle, `top, left, bottom, right`, exclusive of bottom/right.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VRect {
    /// Top edge.
    pub top: i32,
    /// Left edge.
    pub left: i32,
    /// Bottom edge (exclusive).
    pub bottom: i32,
    /// Right edge (exclusive).
    pub right: i32,
}

impl VRect {
    /// Whether the rectangle covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.bottom <= self.top || self.right <= self.left
    }

    /// Widen a legacy 16-bit rectangle.
    pub fn from_rect16(rect: Rect16) -> Self {
        Self {
            top: i32::from(rect.top),
            left: i32::from(rect.left),
            bottom: i32::from(rect.bottom),
            right: i32::from(rect.right),
        }
    }

    /// Narrow to the legacy 16-bit rectangle, saturating each edge.
    pub fn to_rect16(self) -> Rect16 {
        fn clamp(value: i32) -> i16 {
            value.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
        }
        Rect16 {
            top: clamp(self.top),
            left: clamp(self.left),
            bottom: clamp(self.bottom),
            right: clamp(self.right),
        }
    }
}

/// Legacy 16-bit-per-channel RGB color.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RgbColor {
    /// Red, 0..=65535.
    pub red: u16,
    /// Green, 0..=65535.
    pub green: u16,
    /// Blue, 0..=65535.
    pub blue: u16,
}

impl RgbColor {
    /// Expand 8-bit components to the 16-bit range.
    pub fn from_rgb8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: u16::from(red) * 257,
            green: u16::from(green) * 257,
            blue: u16::from(blue) * 257,
        }
    }

    /// Reduce to 8-bit components.
    pub fn to_rgb8(self) -> [u8; 3] {
        [
            (self.red / 257) as u8,
            (self.green / 257) as u8,
            (self.blue / 257) as u8,
        ]
    }
}
