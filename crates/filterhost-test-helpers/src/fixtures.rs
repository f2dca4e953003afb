//! Test fixtures and builders for common test scenarios.
//!
//! Surface fixtures produce deterministic pixel data. The builders emit
//! resource bytes in the layouts the host parses:
//! - [`PiplBuilder`]: little-endian PiPL property lists
//! - [`AeteBuilder`]: single-event `aete` resources
//! - [`IccHeaderBuilder`]: big-endian ICC profile headers

use filterhost_abi::{FilterCaseInfoTable, PHOTOSHOP_SIGNATURE, SupportedModes, four_cc};
use filterhost_surface::{PixelSurface, SurfaceFormat};

use crate::must::must;

/// A surface filled with one BGRA color.
pub fn solid_bgra(width: u32, height: u32, bgra: [u8; 4]) -> PixelSurface {
    let mut surface = must(PixelSurface::new(width, height, SurfaceFormat::Bgra32));
    surface.fill_bgra(bgra);
    surface
}

/// An opaque surface whose channels vary with position.
pub fn gradient_bgra(width: u32, height: u32) -> PixelSurface {
    let mut surface = must(PixelSurface::new(width, height, SurfaceFormat::Bgra32));
    for y in 0..height {
        for x in 0..width {
            let v = ((x * 7 + y * 13) % 256) as u8;
            surface.set_bgra(x, y, [v, 255 - v, v / 2, 255]);
        }
    }
    surface
}

/// Alternating black and white cells of `cell` pixels.
pub fn checkerboard_bgra(width: u32, height: u32, cell: u32) -> PixelSurface {
    let cell = cell.max(1);
    let mut surface = must(PixelSurface::new(width, height, SurfaceFormat::Bgra32));
    for y in 0..height {
        for x in 0..width {
            let v = if (x / cell + y / cell) % 2 == 0 { 0 } else { 255 };
            surface.set_bgra(x, y, [v, v, v, 255]);
        }
    }
    surface
}

/// A 16-bit gray surface rising left to right across the full range.
pub fn gray16_ramp(width: u32, height: u32) -> PixelSurface {
    let mut surface = must(PixelSurface::new(width, height, SurfaceFormat::Gray16));
    let span = u64::from(width.saturating_sub(1).max(1));
    for y in 0..height {
        for x in 0..width {
            let value = (u64::from(x) * 65535 / span) as u16;
            surface.set_gray16(x, y, value);
        }
    }
    surface
}

/// Builds a PiPL resource.
#[derive(Debug, Clone, Default)]
pub struct PiplBuilder {
    properties: Vec<(u32, u32, Vec<u8>)>,
}

fn pascal(text: &str) -> Vec<u8> {
    let bytes = text.as_bytes();
    let len = bytes.len().min(255);
    let mut out = Vec::with_capacity(len + 1);
    out.push(len as u8);
    out.extend_from_slice(&bytes[..len]);
    out
}

fn c_string(text: &str) -> Vec<u8> {
    let mut out = text.as_bytes().to_vec();
    out.push(0);
    out
}

impl PiplBuilder {
    /// An empty property list.
    pub fn new() -> Self {
        Self::default()
    }

    /// A filter with kind, category, title and a 64-bit Windows entry point.
    pub fn filter(category: &str, title: &str, entry_point: &str) -> Self {
        Self::new()
            .kind(*b"8BFM")
            .category(category)
            .title(title)
            .entry_point(entry_point)
    }

    /// Add a raw property filed under `vendor`.
    pub fn raw(mut self, vendor: u32, key: [u8; 4], data: Vec<u8>) -> Self {
        self.properties.push((vendor, four_cc(key), data));
        self
    }

    fn property(self, key: [u8; 4], data: Vec<u8>) -> Self {
        self.raw(PHOTOSHOP_SIGNATURE, key, data)
    }

    /// Module kind, `8BFM` for filters.
    pub fn kind(self, kind: [u8; 4]) -> Self {
        self.property(*b"kind", four_cc(kind).to_le_bytes().to_vec())
    }

    /// Menu category.
    pub fn category(self, category: &str) -> Self {
        self.property(*b"catg", pascal(category))
    }

    /// Menu title.
    pub fn title(self, title: &str) -> Self {
        self.property(*b"name", pascal(title))
    }

    /// Entry point for 64-bit and 32-bit hosts alike.
    pub fn entry_point(self, name: &str) -> Self {
        self.property(*b"8664", c_string(name))
            .property(*b"wx86", c_string(name))
    }

    /// Supported mode bitmask.
    pub fn modes(self, modes: SupportedModes) -> Self {
        self.property(*b"mode", modes.bits().to_le_bytes().to_vec())
    }

    /// Enable-info expression.
    pub fn enable_info(self, expression: &str) -> Self {
        self.property(*b"enbl", c_string(expression))
    }

    /// Filter case table.
    pub fn filter_info(self, table: FilterCaseInfoTable) -> Self {
        let data = table.iter().flat_map(|entry| entry.to_bytes()).collect();
        self.property(*b"fici", data)
    }

    /// Declare that the filter has no about box.
    pub fn no_about_box(self) -> Self {
        self.property(*b"nabt", Vec::new())
    }

    /// Resource id of the filter's `aete`.
    pub fn aete(self, resource_id: i16) -> Self {
        self.property(*b"aete", resource_id.to_le_bytes().to_vec())
    }

    /// Serialize the resource.
    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&0i32.to_le_bytes());
        out.extend_from_slice(&(self.properties.len() as i32).to_le_bytes());
        for (vendor, key, data) in &self.properties {
            out.extend_from_slice(&vendor.to_le_bytes());
            out.extend_from_slice(&key.to_le_bytes());
            out.extend_from_slice(&0i32.to_le_bytes());
            out.extend_from_slice(&(data.len() as i32).to_le_bytes());
            out.extend_from_slice(data);
            while out.len() % 4 != 0 {
                out.push(0);
            }
        }
        out
    }
}

/// One `aete` parameter: name, key, type and flags.
type AeteParameterSpec = (String, [u8; 4], [u8; 4], i16);

/// Builds an `aete` resource holding one suite with one event.
#[derive(Debug, Clone)]
pub struct AeteBuilder {
    vendor: String,
    description: String,
    event_class: [u8; 4],
    event_type: [u8; 4],
    parameters: Vec<AeteParameterSpec>,
    enums: Vec<([u8; 4], Vec<(String, [u8; 4])>)>,
}

fn aligned_pascal(out: &mut Vec<u8>, text: &str) {
    let bytes = pascal(text);
    let padded = bytes.len() % 2 != 0;
    out.extend_from_slice(&bytes);
    if padded {
        out.push(0);
    }
}

impl AeteBuilder {
    /// An event with the given vendor and description.
    pub fn new(vendor: &str, description: &str) -> Self {
        Self {
            vendor: vendor.to_string(),
            description: description.to_string(),
            event_class: *b"Fltr",
            event_type: *b"Evnt",
            parameters: Vec::new(),
            enums: Vec::new(),
        }
    }

    /// Event class and id.
    pub fn event(mut self, class: [u8; 4], id: [u8; 4]) -> Self {
        self.event_class = class;
        self.event_type = id;
        self
    }

    /// Add a parameter.
    pub fn parameter(mut self, name: &str, key: [u8; 4], type_code: [u8; 4], flags: i16) -> Self {
        self.parameters
            .push((name.to_string(), key, type_code, flags));
        self
    }

    /// Add an enumeration with named values.
    pub fn enumeration(mut self, type_code: [u8; 4], values: &[(&str, [u8; 4])]) -> Self {
        let values = values
            .iter()
            .map(|(name, code)| ((*name).to_string(), *code))
            .collect();
        self.enums.push((type_code, values));
        self
    }

    /// Serialize the resource.
    pub fn build(&self) -> Vec<u8> {
        let le = |code: [u8; 4]| four_cc(code).to_le_bytes();
        let mut out = vec![1, 0];
        out.extend_from_slice(&0i16.to_le_bytes());
        out.extend_from_slice(&0i16.to_le_bytes());
        out.extend_from_slice(&1i16.to_le_bytes());

        aligned_pascal(&mut out, &self.vendor);
        aligned_pascal(&mut out, "");
        out.extend_from_slice(&le(*b"Suit"));
        out.extend_from_slice(&1i16.to_le_bytes());
        out.extend_from_slice(&1i16.to_le_bytes());
        out.extend_from_slice(&1i16.to_le_bytes());

        aligned_pascal(&mut out, &self.vendor);
        aligned_pascal(&mut out, &self.description);
        out.extend_from_slice(&le(self.event_class));
        out.extend_from_slice(&le(self.event_type));
        out.extend_from_slice(&le(*b"null"));
        aligned_pascal(&mut out, "");
        out.extend_from_slice(&0i16.to_le_bytes());
        out.extend_from_slice(&le(*b"#ImR"));
        aligned_pascal(&mut out, "");
        out.extend_from_slice(&0i16.to_le_bytes());

        out.extend_from_slice(&(self.parameters.len() as i16).to_le_bytes());
        for (name, key, type_code, flags) in &self.parameters {
            aligned_pascal(&mut out, name);
            out.extend_from_slice(&le(*key));
            out.extend_from_slice(&le(*type_code));
            aligned_pascal(&mut out, "");
            out.extend_from_slice(&flags.to_le_bytes());
        }

        out.extend_from_slice(&0i16.to_le_bytes());
        out.extend_from_slice(&0i16.to_le_bytes());
        out.extend_from_slice(&(self.enums.len() as i16).to_le_bytes());
        for (type_code, values) in &self.enums {
            out.extend_from_slice(&le(*type_code));
            out.extend_from_slice(&(values.len() as i16).to_le_bytes());
            for (name, code) in values {
                aligned_pascal(&mut out, name);
                out.extend_from_slice(&le(*code));
                aligned_pascal(&mut out, "");
            }
        }
        out
    }
}

/// Builds ICC profiles that consist of a header and padding.
#[derive(Debug, Clone)]
pub struct IccHeaderBuilder {
    words: [u32; 21],
    size: u32,
}

impl Default for IccHeaderBuilder {
    fn default() -> Self {
        Self::rgb()
    }
}

impl IccHeaderBuilder {
    const CLASS: usize = 3;
    const COLOR_SPACE: usize = 4;
    const SIGNATURE: usize = 9;
    const RENDERING_INTENT: usize = 16;
    const CREATOR: usize = 20;

    fn base(color_space: [u8; 4]) -> Self {
        let mut words = [0u32; 21];
        words[1] = four_cc(*b"lcms");
        words[2] = 0x0430_0000;
        words[Self::CLASS] = four_cc(*b"mntr");
        words[Self::COLOR_SPACE] = four_cc(color_space);
        words[5] = four_cc(*b"XYZ ");
        words[Self::SIGNATURE] = four_cc(*b"acsp");
        words[17] = 0x0000_F6D6;
        words[18] = 0x0001_0000;
        words[19] = 0x0000_D32D;
        Self { words, size: 128 }
    }

    /// An RGB display profile header.
    pub fn rgb() -> Self {
        Self::base(*b"RGB ")
    }

    /// A grayscale display profile header.
    pub fn gray() -> Self {
        Self::base(*b"GRAY")
    }

    /// Rendering intent.
    pub fn rendering_intent(mut self, intent: u32) -> Self {
        self.words[Self::RENDERING_INTENT] = intent;
        self
    }

    /// Profile creator.
    pub fn creator(mut self, creator: [u8; 4]) -> Self {
        self.words[Self::CREATOR] = four_cc(creator);
        self
    }

    /// Replace the `acsp` signature.
    pub fn signature(mut self, signature: [u8; 4]) -> Self {
        self.words[Self::SIGNATURE] = four_cc(signature);
        self
    }

    /// Declared and actual size, at least a header.
    pub fn size(mut self, size: u32) -> Self {
        self.size = size.max(128);
        self
    }

    /// Serialize the profile.
    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.size as usize);
        out.extend_from_slice(&self.size.to_be_bytes());
        for word in self.words.iter().skip(1) {
            out.extend_from_slice(&word.to_be_bytes());
        }
        out.resize(self.size as usize, 0);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipl_properties_are_padded() {
        let data = PiplBuilder::new().title("Abc").build();
        // header, one property header, 4 bytes of pascal string
        assert_eq!(data.len(), 8 + 16 + 4);
        assert_eq!(data[4], 1);
    }

    #[test]
    fn test_icc_header_layout() {
        let bytes = IccHeaderBuilder::gray().size(140).build();
        assert_eq!(bytes.len(), 140);
        assert_eq!(&bytes[0..4], &140u32.to_be_bytes());
        assert_eq!(&bytes[16..20], b"GRAY");
        assert_eq!(&bytes[36..40], b"acsp");
    }

    #[test]
    fn test_gray_ramp_spans_range() {
        let ramp = gray16_ramp(3, 1);
        assert_eq!(ramp.gray16_at(0, 0), Some(0));
        assert_eq!(ramp.gray16_at(2, 0), Some(65535));
    }
}
