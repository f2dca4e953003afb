//! Decoding of pixel maps passed to the display-pixels callback.

use filterhost_abi::{PSPixelMap, VRect, image_mode};
use filterhost_surface::{PixelSurface, SurfaceFormat};

use super::{SuiteError, SuiteResult};

/// Preview pixels read out of a plug-in's pixel map.
#[derive(Debug)]
pub(crate) enum DecodedPixels {
    /// Color pixels as BGRA.
    Color(PixelSurface),
    /// Gray samples, packed one byte per pixel, plus their BGRA expansion.
    Gray {
        samples: Vec<u8>,
        width: usize,
        surface: PixelSurface,
    },
}

fn scale16(value: u16) -> u8 {
    ((u32::from(value.min(32768)) * 255 + 16384) / 32768) as u8
}

/// Read the part of `map` covered by `src_rect`, clipped to its bounds.
///
/// Returns `None` when nothing is left after clipping.
///
/// # Safety
///
/// `map.base_addr` with `row_bytes`, `col_bytes` and `plane_bytes` must
/// describe readable memory for every pixel and plane inside `map.bounds`.
pub(crate) unsafe fn decode(map: &PSPixelMap, src_rect: VRect) -> SuiteResult<Option<DecodedPixels>> {
    if map.base_addr.is_null() {
        return Err(SuiteError::NullPointer);
    }
    let rect = VRect {
        top: src_rect.top.max(map.bounds.top),
        left: src_rect.left.max(map.bounds.left),
        bottom: src_rect.bottom.min(map.bounds.bottom),
        right: src_rect.right.min(map.bounds.right),
    };
    if rect.is_empty() {
        return Ok(None);
    }
    let width = (rect.right - rect.left) as u32;
    let height = (rect.bottom - rect.top) as u32;

    let mode = i16::try_from(map.image_mode)
        .ok()
        .ok_or(SuiteError::UnsupportedMode(map.image_mode))?;
    let (planes, deep) = match mode {
        image_mode::RGB_COLOR => (3, false),
        image_mode::RGB48 => (3, true),
        image_mode::GRAY_SCALE => (1, false),
        image_mode::GRAY16 => (1, true),
        _ => return Err(SuiteError::UnsupportedMode(map.image_mode)),
    };

    let base = map.base_addr.cast::<u8>().cast_const();
    let sample = |x: i32, y: i32, plane: isize| -> u8 {
        let offset = (y - map.bounds.top) as isize * map.row_bytes as isize
            + (x - map.bounds.left) as isize * map.col_bytes as isize
            + plane * map.plane_bytes as isize;
        // SAFETY: (x, y) lies inside `map.bounds` and `plane` below the
        // mode's plane count, which the caller guarantees are readable.
        unsafe {
            let at = base.offset(offset);
            if deep {
                scale16(at.cast::<u16>().read_unaligned())
            } else {
                at.read()
            }
        }
    };

    let mut surface = PixelSurface::new(width, height, SurfaceFormat::Bgra32)
        .ok()
        .ok_or(SuiteError::InvalidSize(i64::from(width) * i64::from(height)))?;

    if planes == 1 {
        let mut samples = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                let v = sample(rect.left + x as i32, rect.top + y as i32, 0);
                samples.push(v);
                surface.set_bgra(x, y, [v, v, v, 255]);
            }
        }
        return Ok(Some(DecodedPixels::Gray {
            samples,
            width: width as usize,
            surface,
        }));
    }

    for y in 0..height {
        for x in 0..width {
            let (px, py) = (rect.left + x as i32, rect.top + y as i32);
            let (r, g, b) = (sample(px, py, 0), sample(px, py, 1), sample(px, py, 2));
            surface.set_bgra(x, y, [b, g, r, 255]);
        }
    }
    Ok(Some(DecodedPixels::Color(surface)))
}
