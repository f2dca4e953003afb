//! ICC profile header model.
//!
//! Only the fixed 128-byte header is decoded here. It is enough to validate
//! that a buffer looks like a profile and to decide whether two profiles
//! describe the same color space for preview purposes.

use filterhost_abi::four_cc;

use crate::error::{ColorProfileError, ProfileRole};

/// Size of the fixed ICC header.
pub const ICC_HEADER_SIZE: usize = 128;

/// The `acsp` file signature at offset 36.
pub const ICC_SIGNATURE: u32 = four_cc(*b"acsp");

/// Color space signature of grayscale profiles.
pub const GRAY_COLOR_SPACE: u32 = four_cc(*b"GRAY");

/// Decoded ICC profile header. All fields are big-endian on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IccHeader {
    /// Declared profile size.
    pub size: u32,
    /// Preferred CMM type.
    pub cmm_type: u32,
    /// Profile version.
    pub version: u32,
    /// Device class.
    pub class: u32,
    /// Data color space.
    pub color_space: u32,
    /// Profile connection space.
    pub connection_space: u32,
    /// Creation date and time, as three words.
    pub date_time: [u32; 3],
    /// `acsp`.
    pub signature: u32,
    /// Primary platform.
    pub platform: u32,
    /// Profile flags.
    pub flags: u32,
    /// Device manufacturer.
    pub manufacturer: u32,
    /// Device model.
    pub model: u32,
    /// Device attributes, as two words.
    pub attributes: [u32; 2],
    /// Rendering intent.
    pub rendering_intent: u32,
    /// PCS illuminant, as three s15Fixed16 words.
    pub illuminant: [u32; 3],
    /// Profile creator.
    pub creator: u32,
}

fn word(bytes: &[u8], offset: usize) -> u32 {
    let mut buf = [0u8; 4];
    if let Some(slice) = bytes.get(offset..offset + 4) {
        buf.copy_from_slice(slice);
    }
    u32::from_be_bytes(buf)
}

impl IccHeader {
    /// Decode and validate the header of `bytes`.
    ///
    /// # Errors
    ///
    /// Fails when the buffer is shorter than a header, lacks the `acsp`
    /// signature, or declares a size outside `128..=bytes.len()`.
    pub fn parse(bytes: &[u8], role: ProfileRole) -> Result<Self, ColorProfileError> {
        if bytes.len() < ICC_HEADER_SIZE {
            return Err(ColorProfileError::Truncated {
                role,
                len: bytes.len(),
            });
        }

        let header = Self {
            size: word(bytes, 0),
            cmm_type: word(bytes, 4),
            version: word(bytes, 8),
            class: word(bytes, 12),
            color_space: word(bytes, 16),
            connection_space: word(bytes, 20),
            date_time: [word(bytes, 24), word(bytes, 28), word(bytes, 32)],
            signature: word(bytes, 36),
            platform: word(bytes, 40),
            flags: word(bytes, 44),
            manufacturer: word(bytes, 48),
            model: word(bytes, 52),
            attributes: [word(bytes, 56), word(bytes, 60)],
            rendering_intent: word(bytes, 64),
            illuminant: [word(bytes, 68), word(bytes, 72), word(bytes, 76)],
            creator: word(bytes, 80),
        };

        if header.signature != ICC_SIGNATURE {
            return Err(ColorProfileError::BadSignature {
                role,
                signature: header.signature,
            });
        }

        let declared = header.size as usize;
        if declared < ICC_HEADER_SIZE || declared > bytes.len() {
            return Err(ColorProfileError::SizeMismatch {
                role,
                declared: header.size,
                actual: bytes.len(),
            });
        }

        Ok(header)
    }

    /// Whether any of the twenty-one header fields differ.
    pub fn differs_from(&self, other: &IccHeader) -> bool {
        self != other
    }

    /// Whether the profile describes grayscale data.
    pub fn is_gray(&self) -> bool {
        self.color_space == GRAY_COLOR_SPACE
    }
}
