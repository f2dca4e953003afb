//! Owned pixel buffers with their layout.

use crate::error::{SurfaceError, SurfaceResult};
use crate::rect::Rect;

/// Pixel layout of a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SurfaceFormat {
    /// Blue, green, red, alpha; 8 bits each.
    Bgra32,
    /// Single 16-bit gray channel, native byte order.
    Gray16,
}

impl SurfaceFormat {
    /// Bytes occupied by one pixel.
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            SurfaceFormat::Bgra32 => 4,
            SurfaceFormat::Gray16 => 2,
        }
    }

    /// Number of channels, alpha included.
    pub const fn channel_count(self) -> usize {
        match self {
            SurfaceFormat::Bgra32 => 4,
            SurfaceFormat::Gray16 => 1,
        }
    }

    /// Bits per channel.
    pub const fn bits_per_channel(self) -> u32 {
        match self {
            SurfaceFormat::Bgra32 => 8,
            SurfaceFormat::Gray16 => 16,
        }
    }

    /// Whether the format carries an alpha channel.
    pub const fn has_alpha(self) -> bool {
        matches!(self, SurfaceFormat::Bgra32)
    }

    /// Largest value a single channel can hold.
    pub const fn max_channel_value(self) -> u32 {
        match self {
            SurfaceFormat::Bgra32 => 255,
            SurfaceFormat::Gray16 => 65535,
        }
    }
}

/// Upper end of the 16-bit range used by legacy filter plug-ins.
pub const PHOTOSHOP_16BIT_MAX: u16 = 32768;

/// Offset of the alpha byte within a BGRA pixel.
const ALPHA: usize = 3;

/// An owned pixel buffer plus width, height, stride and format.
///
/// Invariants: `stride >= width * bytes_per_pixel` and
/// `data.len() == stride * height`.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelSurface {
    width: u32,
    height: u32,
    stride: usize,
    format: SurfaceFormat,
    data: Vec<u8>,
}

impl std::fmt::Debug for PixelSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelSurface")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("stride", &self.stride)
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

impl PixelSurface {
    /// Allocate a zeroed surface with rows padded to a 4-byte boundary.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::InvalidDimensions`] for a zero dimension or
    /// a size that overflows.
    pub fn new(width: u32, height: u32, format: SurfaceFormat) -> SurfaceResult<Self> {
        let min = min_stride(width, height, format)?;
        let stride = min
            .checked_add(3)
            .map(|s| s & !3)
            .ok_or(SurfaceError::InvalidDimensions { width, height })?;
        Self::with_stride(width, height, format, stride)
    }

    /// Allocate a zeroed surface with an explicit row stride.
    ///
    /// # Errors
    ///
    /// Fails when the stride cannot hold a row or the size overflows.
    pub fn with_stride(
        width: u32,
        height: u32,
        format: SurfaceFormat,
        stride: usize,
    ) -> SurfaceResult<Self> {
        let min = min_stride(width, height, format)?;
        if stride < min {
            return Err(SurfaceError::StrideTooSmall { stride, min });
        }
        let len = stride
            .checked_mul(height as usize)
            .ok_or(SurfaceError::InvalidDimensions { width, height })?;
        Ok(Self {
            width,
            height,
            stride,
            format,
            data: vec![0; len],
        })
    }

    /// Wrap an existing buffer.
    ///
    /// # Errors
    ///
    /// Fails when the layout is invalid or `data.len() != stride * height`.
    pub fn from_raw(
        width: u32,
        height: u32,
        format: SurfaceFormat,
        stride: usize,
        data: Vec<u8>,
    ) -> SurfaceResult<Self> {
        let min = min_stride(width, height, format)?;
        if stride < min {
            return Err(SurfaceError::StrideTooSmall { stride, min });
        }
        let expected = stride
            .checked_mul(height as usize)
            .ok_or(SurfaceError::InvalidDimensions { width, height })?;
        if data.len() != expected {
            return Err(SurfaceError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            stride,
            format,
            data,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes between the starts of consecutive rows.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Pixel format.
    pub fn format(&self) -> SurfaceFormat {
        self.format
    }

    /// Channel count, alpha included.
    pub fn channel_count(&self) -> usize {
        self.format.channel_count()
    }

    /// Bits per channel.
    pub fn bits_per_channel(&self) -> u32 {
        self.format.bits_per_channel()
    }

    /// The whole buffer, padding included.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The whole buffer, padding included.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Give up the buffer.
    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// `(0, 0, width, height)`.
    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width as i32, self.height as i32)
    }

    /// Whether `(x, y)` addresses a pixel of this surface.
    pub fn is_visible(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    /// Pixel bytes of row `y`, padding excluded.
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        let range = self.row_range(y)?;
        self.data.get(range)
    }

    /// Pixel bytes of row `y`, padding excluded.
    pub fn row_mut(&mut self, y: u32) -> Option<&mut [u8]> {
        let range = self.row_range(y)?;
        self.data.get_mut(range)
    }

    fn row_range(&self, y: u32) -> Option<std::ops::Range<usize>> {
        if y >= self.height {
            return None;
        }
        let start = y as usize * self.stride;
        Some(start..start + self.width as usize * self.format.bytes_per_pixel())
    }

    pub(crate) fn offset(&self, x: usize, y: usize) -> usize {
        y * self.stride + x * self.format.bytes_per_pixel()
    }

    /// BGRA bytes at `(x, y)`; `None` off-surface or for gray surfaces.
    pub fn bgra_at(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if self.format != SurfaceFormat::Bgra32 || x >= self.width || y >= self.height {
            return None;
        }
        let at = self.offset(x as usize, y as usize);
        let px = self.data.get(at..at + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Write BGRA bytes at `(x, y)`; ignored off-surface or for gray surfaces.
    pub fn set_bgra(&mut self, x: u32, y: u32, bgra: [u8; 4]) {
        if self.format != SurfaceFormat::Bgra32 || x >= self.width || y >= self.height {
            return;
        }
        let at = self.offset(x as usize, y as usize);
        if let Some(px) = self.data.get_mut(at..at + 4) {
            px.copy_from_slice(&bgra);
        }
    }

    /// Gray value at `(x, y)`; `None` off-surface or for BGRA surfaces.
    pub fn gray16_at(&self, x: u32, y: u32) -> Option<u16> {
        if self.format != SurfaceFormat::Gray16 || x >= self.width || y >= self.height {
            return None;
        }
        let at = self.offset(x as usize, y as usize);
        let px = self.data.get(at..at + 2)?;
        Some(u16::from_ne_bytes([px[0], px[1]]))
    }

    /// Write a gray value at `(x, y)`; ignored off-surface or for BGRA surfaces.
    pub fn set_gray16(&mut self, x: u32, y: u32, value: u16) {
        if self.format != SurfaceFormat::Gray16 || x >= self.width || y >= self.height {
            return;
        }
        let at = self.offset(x as usize, y as usize);
        if let Some(px) = self.data.get_mut(at..at + 2) {
            px.copy_from_slice(&value.to_ne_bytes());
        }
    }

    /// Fill every BGRA pixel with one color.
    pub fn fill_bgra(&mut self, bgra: [u8; 4]) {
        if self.format != SurfaceFormat::Bgra32 {
            return;
        }
        for y in 0..self.height {
            if let Some(row) = self.row_mut(y) {
                for px in row.chunks_exact_mut(4) {
                    px.copy_from_slice(&bgra);
                }
            }
        }
    }

    /// Fill every gray pixel with one value.
    pub fn fill_gray16(&mut self, value: u16) {
        if self.format != SurfaceFormat::Gray16 {
            return;
        }
        let bytes = value.to_ne_bytes();
        for y in 0..self.height {
            if let Some(row) = self.row_mut(y) {
                for px in row.chunks_exact_mut(2) {
                    px.copy_from_slice(&bytes);
                }
            }
        }
    }

    /// Whether any pixel is less than fully opaque.
    ///
    /// Gray surfaces have no alpha channel and are always opaque.
    pub fn has_transparency(&self) -> bool {
        if self.format != SurfaceFormat::Bgra32 {
            return false;
        }
        (0..self.height)
            .filter_map(|y| self.row(y))
            .any(|row| row.chunks_exact(4).any(|px| px[ALPHA] < 255))
    }

    /// Force alpha to 255 inside `region`, clipped to the surface.
    pub fn set_alpha_opaque(&mut self, region: Rect) {
        if self.format != SurfaceFormat::Bgra32 {
            return;
        }
        let roi = region.intersect(&self.bounds());
        if roi.is_empty() {
            return;
        }
        for y in roi.y..roi.bottom() {
            let start = self.offset(roi.x as usize, y as usize);
            let end = start + roi.width as usize * 4;
            if let Some(span) = self.data.get_mut(start..end) {
                for px in span.chunks_exact_mut(4) {
                    px[ALPHA] = 255;
                }
            }
        }
    }

    /// Copy the pixels of `region` from `source`, clipped to both surfaces.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::FormatMismatch`] for differing formats.
    pub fn copy_region_from(&mut self, source: &PixelSurface, region: Rect) -> SurfaceResult<()> {
        self.ensure_same_format(source)?;
        let roi = region
            .intersect(&self.bounds())
            .intersect(&source.bounds());
        if roi.is_empty() {
            return Ok(());
        }
        let bpp = self.format.bytes_per_pixel();
        let span = roi.width as usize * bpp;
        for y in roi.y..roi.bottom() {
            let src_at = source.offset(roi.x as usize, y as usize);
            let dst_at = self.offset(roi.x as usize, y as usize);
            if let (Some(src), Some(dst)) = (
                source.data.get(src_at..src_at + span),
                self.data.get_mut(dst_at..dst_at + span),
            ) {
                dst.copy_from_slice(src);
            }
        }
        Ok(())
    }

    /// Map 0..=65535 onto the 0..=32768 range legacy plug-ins expect.
    ///
    /// # Errors
    ///
    /// Only defined for [`SurfaceFormat::Gray16`].
    pub fn scale_to_photoshop_range(&mut self) -> SurfaceResult<()> {
        self.map_gray16("scale_to_photoshop_range", to_photoshop_range)
    }

    /// Map 0..=32768 back onto 0..=65535; larger values saturate.
    ///
    /// # Errors
    ///
    /// Only defined for [`SurfaceFormat::Gray16`].
    pub fn from_photoshop_range(&mut self) -> SurfaceResult<()> {
        self.map_gray16("from_photoshop_range", from_photoshop_range)
    }

    fn map_gray16(&mut self, operation: &'static str, map: fn(u16) -> u16) -> SurfaceResult<()> {
        if self.format != SurfaceFormat::Gray16 {
            return Err(SurfaceError::UnsupportedFormat {
                operation,
                format: self.format,
            });
        }
        for y in 0..self.height {
            if let Some(row) = self.row_mut(y) {
                for px in row.chunks_exact_mut(2) {
                    let value = map(u16::from_ne_bytes([px[0], px[1]]));
                    px.copy_from_slice(&value.to_ne_bytes());
                }
            }
        }
        Ok(())
    }

    pub(crate) fn ensure_same_format(&self, other: &PixelSurface) -> SurfaceResult<()> {
        if self.format == other.format {
            Ok(())
        } else {
            Err(SurfaceError::FormatMismatch {
                expected: self.format,
                actual: other.format,
            })
        }
    }
}

/// Scale one 16-bit sample to the plug-in range, rounding to nearest.
pub fn to_photoshop_range(value: u16) -> u16 {
    ((u32::from(value) * 32768 + 32767) / 65535) as u16
}

/// Scale one plug-in range sample back to 16 bits, rounding to nearest.
pub fn from_photoshop_range(value: u16) -> u16 {
    let value = u32::from(value.min(PHOTOSHOP_16BIT_MAX));
    ((value * 65535 + 16384) / 32768) as u16
}

fn min_stride(width: u32, height: u32, format: SurfaceFormat) -> SurfaceResult<usize> {
    if width == 0 || height == 0 {
        return Err(SurfaceError::InvalidDimensions { width, height });
    }
    (width as usize)
        .checked_mul(format.bytes_per_pixel())
        .ok_or(SurfaceError::InvalidDimensions { width, height })
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn test_new_pads_stride_to_four_bytes() -> TestResult {
        let surface = PixelSurface::new(3, 2, SurfaceFormat::Gray16)?;
        assert_eq!(surface.stride(), 8);
        assert_eq!(surface.data().len(), 16);
        Ok(())
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert_eq!(
            PixelSurface::new(0, 4, SurfaceFormat::Bgra32),
            Err(SurfaceError::InvalidDimensions {
                width: 0,
                height: 4
            })
        );
    }

    #[test]
    fn test_stride_too_small_rejected() {
        let result = PixelSurface::with_stride(10, 1, SurfaceFormat::Bgra32, 39);
        assert_eq!(
            result,
            Err(SurfaceError::StrideTooSmall {
                stride: 39,
                min: 40
            })
        );
    }

    #[test]
    fn test_from_raw_checks_length() {
        let result = PixelSurface::from_raw(2, 2, SurfaceFormat::Bgra32, 8, vec![0; 15]);
        assert_eq!(
            result,
            Err(SurfaceError::BufferSizeMismatch {
                expected: 16,
                actual: 15
            })
        );
    }

    #[test]
    fn test_padding_is_not_a_pixel() -> TestResult {
        let mut surface = PixelSurface::with_stride(1, 2, SurfaceFormat::Bgra32, 8)?;
        surface.fill_bgra([1, 2, 3, 255]);
        assert!(!surface.has_transparency());
        assert_eq!(surface.data()[4..8], [0, 0, 0, 0]);
        Ok(())
    }

    #[test]
    fn test_set_alpha_opaque_clips_region() -> TestResult {
        let mut surface = PixelSurface::new(4, 4, SurfaceFormat::Bgra32)?;
        surface.set_alpha_opaque(Rect::new(2, 2, 10, 10));
        assert_eq!(surface.bgra_at(3, 3), Some([0, 0, 0, 255]));
        assert_eq!(surface.bgra_at(1, 1), Some([0, 0, 0, 0]));
        assert!(surface.has_transparency());
        Ok(())
    }

    #[test]
    fn test_gray_surface_is_opaque() -> TestResult {
        let surface = PixelSurface::new(2, 2, SurfaceFormat::Gray16)?;
        assert!(!surface.has_transparency());
        Ok(())
    }

    #[test]
    fn test_photoshop_range_endpoints() {
        assert_eq!(to_photoshop_range(0), 0);
        assert_eq!(to_photoshop_range(65535), 32768);
        assert_eq!(from_photoshop_range(32768), 65535);
        assert_eq!(from_photoshop_range(40000), 65535);
        assert_eq!(from_photoshop_range(16384), 32768);
    }

    #[test]
    fn test_photoshop_range_rejects_bgra() -> TestResult {
        let mut surface = PixelSurface::new(1, 1, SurfaceFormat::Bgra32)?;
        assert!(matches!(
            surface.scale_to_photoshop_range(),
            Err(SurfaceError::UnsupportedFormat { .. })
        ));
        Ok(())
    }
}
