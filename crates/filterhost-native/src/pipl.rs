//! Plug-in property lists (PiPL).
//!
//! A PiPL resource describes one filter in a module. Layout, all integers
//! little-endian:
//!
//! ```text
//! i32 version   i32 count
//! count x { u32 vendor  u32 key  i32 id  i32 length  u8[length]  pad to 4 }
//! ```
//!
//! Only properties filed under `8BIM` are read. Resources are obtained
//! through a [`PiplSource`]; on Windows [`crate::windows::ResourcePiplSource`]
//! reads them from the module's resource table.

use std::path::Path;

use filterhost_abi::{
    FILTER_CASE_COUNT, FilterCaseInfo, FilterCaseInfoTable, PHOTOSHOP_SIGNATURE, SupportedModes,
    four_cc,
};

use crate::error::{PiplError, Result};

/// Property keys read from a PiPL.
pub mod key {
    use filterhost_abi::four_cc;

    /// Module kind.
    pub const KIND: u32 = four_cc(*b"kind");
    /// Menu category.
    pub const CATEGORY: u32 = four_cc(*b"catg");
    /// Menu title.
    pub const NAME: u32 = four_cc(*b"name");
    /// 32-bit Windows entry point.
    pub const ENTRY_X86: u32 = four_cc(*b"wx86");
    /// 64-bit Windows entry point.
    pub const ENTRY_X64: u32 = four_cc(*b"8664");
    /// 32-bit entry point on other platforms.
    pub const ENTRY_32: u32 = four_cc(*b"mi32");
    /// 64-bit entry point on other platforms.
    pub const ENTRY_64: u32 = four_cc(*b"mi64");
    /// Supported mode bitmask.
    pub const SUPPORTED_MODES: u32 = four_cc(*b"mode");
    /// Enable-info expression.
    pub const ENABLE_INFO: u32 = four_cc(*b"enbl");
    /// Filter case table.
    pub const FILTER_CASE_INFO: u32 = four_cc(*b"fici");
    /// Present when the filter has no about box.
    pub const NO_ABOUT_BOX: u32 = four_cc(*b"nabt");
    /// Resource id of the scripting metadata.
    pub const AETE: u32 = four_cc(*b"aete");
}

/// Kind of filter modules.
pub const FILTER_KIND: u32 = four_cc(*b"8BFM");

/// Little-endian cursor over resource bytes.
#[derive(Debug, Clone)]
pub(crate) struct ByteReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    pub(crate) fn offset(&self) -> usize {
        self.offset
    }

    pub(crate) fn bytes(&mut self, len: usize) -> std::result::Result<&'a [u8], PiplError> {
        let start = self.offset;
        let slice = start
            .checked_add(len)
            .and_then(|end| self.data.get(start..end))
            .ok_or(PiplError::UnexpectedEof { offset: start })?;
        self.offset += len;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> std::result::Result<[u8; N], PiplError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.bytes(N)?);
        Ok(out)
    }

    pub(crate) fn u8(&mut self) -> std::result::Result<u8, PiplError> {
        Ok(self.array::<1>()?[0])
    }

    pub(crate) fn i16(&mut self) -> std::result::Result<i16, PiplError> {
        Ok(i16::from_le_bytes(self.array()?))
    }

    pub(crate) fn u16(&mut self) -> std::result::Result<u16, PiplError> {
        Ok(u16::from_le_bytes(self.array()?))
    }

    pub(crate) fn i32(&mut self) -> std::result::Result<i32, PiplError> {
        Ok(i32::from_le_bytes(self.array()?))
    }

    pub(crate) fn u32(&mut self) -> std::result::Result<u32, PiplError> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    /// An `i16` count that must not be negative.
    pub(crate) fn count16(&mut self) -> std::result::Result<usize, PiplError> {
        let offset = self.offset;
        let value = self.i16()?;
        usize::try_from(value).map_err(|_negative| PiplError::InvalidLength {
            offset,
            length: i64::from(value),
        })
    }

    /// An `i32` length that must not be negative.
    pub(crate) fn length32(&mut self) -> std::result::Result<usize, PiplError> {
        let offset = self.offset;
        let value = self.i32()?;
        usize::try_from(value).map_err(|_negative| PiplError::InvalidLength {
            offset,
            length: i64::from(value),
        })
    }

    pub(crate) fn skip_to_alignment(&mut self, align: usize) {
        let rem = self.offset % align;
        if rem != 0 {
            self.offset = (self.offset + align - rem).min(self.data.len());
        }
    }

    /// Length-prefixed string.
    pub(crate) fn pascal_string(&mut self) -> std::result::Result<String, PiplError> {
        let len = usize::from(self.u8()?);
        Ok(decode_text(self.bytes(len)?))
    }

    /// Length-prefixed string padded so the length byte and text occupy
    /// an even number of bytes.
    pub(crate) fn aligned_pascal_string(&mut self) -> std::result::Result<String, PiplError> {
        let len = usize::from(self.u8()?);
        let text = decode_text(self.bytes(len)?);
        if (len + 1) % 2 != 0 {
            self.bytes(1)?;
        }
        Ok(text)
    }
}

/// Decode resource text: UTF-8 when valid, Latin-1 otherwise.
pub(crate) fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_latin1) => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}

fn c_string(data: &[u8], offset: usize) -> std::result::Result<String, PiplError> {
    let end = data
        .iter()
        .position(|&b| b == 0)
        .ok_or(PiplError::InvalidString { offset })?;
    Ok(decode_text(data.get(..end).unwrap_or_default()))
}

/// One raw property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PiplProperty<'a> {
    /// Vendor signature.
    pub vendor: u32,
    /// Property key.
    pub key: u32,
    /// Property id.
    pub id: i32,
    /// Property data without padding.
    pub data: &'a [u8],
    /// Offset of `data` within the resource.
    pub offset: usize,
}

/// Split a PiPL resource into its properties.
///
/// # Errors
///
/// Returns [`PiplError`] for truncated data or negative lengths.
pub fn read_properties(data: &[u8]) -> std::result::Result<Vec<PiplProperty<'_>>, PiplError> {
    let mut r = ByteReader::new(data);
    let _version = r.i32()?;
    let count = r.length32()?;

    let mut properties = Vec::with_capacity(count.min(256));
    for _ in 0..count {
        let vendor = r.u32()?;
        let key = r.u32()?;
        let id = r.i32()?;
        let length = r.length32()?;
        let offset = r.offset();
        let data = r.bytes(length)?;
        r.skip_to_alignment(4);
        properties.push(PiplProperty {
            vendor,
            key,
            id,
            data,
            offset,
        });
    }
    Ok(properties)
}

/// The filter facts a PiPL declares.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PiplInfo {
    /// Menu category.
    pub category: String,
    /// Menu title.
    pub title: String,
    /// Entry point for this process's architecture.
    pub entry_point: String,
    /// Supported mode bitmask, if declared.
    pub supported_modes: Option<SupportedModes>,
    /// Enable-info expression, if declared.
    pub enable_info: Option<String>,
    /// Filter case table, if declared.
    pub filter_info: Option<FilterCaseInfoTable>,
    /// Whether the filter has an about box.
    pub has_about_box: bool,
    /// Resource id of the scripting metadata, if declared.
    pub aete_resource_id: Option<i16>,
}

fn entry_point_keys() -> [u32; 2] {
    if cfg!(target_pointer_width = "64") {
        [key::ENTRY_X64, key::ENTRY_64]
    } else {
        [key::ENTRY_X86, key::ENTRY_32]
    }
}

/// Decode the filter facts of one PiPL resource.
///
/// # Errors
///
/// Returns [`PiplError::NotAFilter`] for non-filter modules and other
/// [`PiplError`]s for malformed data.
pub fn parse_pipl(data: &[u8]) -> std::result::Result<PiplInfo, PiplError> {
    let mut info = PiplInfo {
        has_about_box: true,
        ..PiplInfo::default()
    };
    let mut kind = None;
    let mut entry_points: [Option<String>; 2] = [None, None];
    let entry_keys = entry_point_keys();

    for property in read_properties(data)? {
        if property.vendor != PHOTOSHOP_SIGNATURE {
            continue;
        }
        let mut r = ByteReader::new(property.data);
        match property.key {
            key::KIND => kind = Some(r.u32()?),
            key::CATEGORY => info.category = r.pascal_string()?,
            key::NAME => info.title = r.pascal_string()?,
            key::SUPPORTED_MODES => {
                info.supported_modes = Some(SupportedModes::from_bits_retain(r.u16()?));
            }
            key::ENABLE_INFO => {
                info.enable_info = Some(c_string(property.data, property.offset)?);
            }
            key::FILTER_CASE_INFO => {
                let mut table = [FilterCaseInfo::CANT_FILTER; FILTER_CASE_COUNT];
                for entry in &mut table {
                    *entry = FilterCaseInfo::from_bytes(r.array()?);
                }
                info.filter_info = Some(table);
            }
            key::NO_ABOUT_BOX => info.has_about_box = false,
            key::AETE => info.aete_resource_id = Some(r.i16()?),
            k => {
                if let Some(slot) = entry_keys.iter().position(|&e| e == k) {
                    entry_points[slot] = Some(c_string(property.data, property.offset)?);
                }
            }
        }
    }

    match kind {
        Some(FILTER_KIND) => {}
        other => return Err(PiplError::NotAFilter {
            kind: other.unwrap_or(0),
        }),
    }

    let [primary, fallback] = entry_points;
    info.entry_point = primary.or(fallback).unwrap_or_default();
    Ok(info)
}

/// Supplier of PiPL and `aete` resources for module files.
pub trait PiplSource: Send + Sync {
    /// Every PiPL resource in the module at `path`, in resource order.
    ///
    /// # Errors
    ///
    /// Returns an error when the module cannot be read.
    fn read_pipls(&self, path: &Path) -> Result<Vec<Vec<u8>>>;

    /// The `aete` resource with `resource_id`, if the module has one.
    ///
    /// # Errors
    ///
    /// Returns an error when the module cannot be read.
    fn read_aete(&self, _path: &Path, _resource_id: i16) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn property(key: &[u8; 4], data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&PHOTOSHOP_SIGNATURE.to_le_bytes());
        out.extend_from_slice(&four_cc(*key).to_le_bytes());
        out.extend_from_slice(&0i32.to_le_bytes());
        out.extend_from_slice(&(data.len() as i32).to_le_bytes());
        out.extend_from_slice(data);
        while out.len() % 4 != 0 {
            out.push(0);
        }
        out
    }

    fn resource(properties: &[Vec<u8>]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&0i32.to_le_bytes());
        out.extend_from_slice(&(properties.len() as i32).to_le_bytes());
        for p in properties {
            out.extend_from_slice(p);
        }
        out
    }

    #[test]
    fn test_parse_minimal_filter() -> std::result::Result<(), PiplError> {
        let entry_key = if cfg!(target_pointer_width = "64") {
            b"8664"
        } else {
            b"wx86"
        };
        let data = resource(&[
            property(b"kind", &FILTER_KIND.to_le_bytes()),
            property(b"catg", b"\x04Blur"),
            property(b"name", b"\x0bGaussian..."),
            property(entry_key, b"PluginMain\0"),
            property(b"mode", &0x0010u16.to_le_bytes()),
        ]);
        let info = parse_pipl(&data)?;
        assert_eq!(info.category, "Blur");
        assert_eq!(info.title, "Gaussian...");
        assert_eq!(info.entry_point, "PluginMain");
        assert_eq!(info.supported_modes, Some(SupportedModes::RGB_COLOR));
        assert!(info.has_about_box);
        Ok(())
    }

    #[test]
    fn test_non_filter_kind_rejected() {
        let data = resource(&[property(b"kind", &four_cc(*b"8BIF").to_le_bytes())]);
        assert!(matches!(
            parse_pipl(&data),
            Err(PiplError::NotAFilter { .. })
        ));
    }

    #[test]
    fn test_other_vendors_ignored() -> std::result::Result<(), PiplError> {
        let mut foreign = property(b"name", b"\x03Bad");
        foreign[0..4].copy_from_slice(&four_cc(*b"ABCD").to_le_bytes());
        let data = resource(&[
            property(b"kind", &FILTER_KIND.to_le_bytes()),
            foreign,
            property(b"nabt", &[]),
        ]);
        let info = parse_pipl(&data)?;
        assert_eq!(info.title, "");
        assert!(!info.has_about_box);
        Ok(())
    }

    #[test]
    fn test_negative_length_rejected() {
        let mut data = resource(&[property(b"kind", &FILTER_KIND.to_le_bytes())]);
        data[20..24].copy_from_slice(&(-1i32).to_le_bytes());
        assert_eq!(
            read_properties(&data),
            Err(PiplError::InvalidLength {
                offset: 20,
                length: -1
            })
        );
    }

    #[test]
    fn test_unterminated_enable_info_rejected() {
        let data = resource(&[
            property(b"kind", &FILTER_KIND.to_le_bytes()),
            property(b"enbl", b"true"),
        ]);
        assert!(matches!(
            parse_pipl(&data),
            Err(PiplError::InvalidString { .. })
        ));
    }

    #[test]
    fn test_latin1_fallback() {
        assert_eq!(decode_text(&[0x43, 0x61, 0x66, 0xE9]), "Café");
    }

    struct PiplOnly;

    impl PiplSource for PiplOnly {
        fn read_pipls(&self, _path: &Path) -> Result<Vec<Vec<u8>>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_sources_without_aete_support_report_none() -> Result<()> {
        assert_eq!(PiplOnly.read_aete(Path::new("a.8bf"), 16000)?, None);
        Ok(())
    }
}
