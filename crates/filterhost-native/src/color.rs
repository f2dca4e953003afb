//! Color management bridge for previews.
//!
//! [`ColorProfileConverter`] holds the document and monitor profiles and,
//! when their headers differ, a document-to-monitor transform built with
//! `moxcms` using the perceptual intent. Whether correction is needed is
//! decided once in [`ColorProfileConverter::initialize`]; afterwards the
//! correction calls are pure functions of their inputs that only write the
//! destination surface.

use filterhost_surface::{PixelSurface, SurfaceError, SurfaceFormat};
use moxcms::{ColorProfile, Layout, RenderingIntent, TransformExecutor, TransformOptions};

use crate::error::{ColorProfileError, FilterHostError, ProfileRole, Result};
use crate::handles::{NativeResource, SafeHandle};
use crate::icc::IccHeader;

/// An opened, validated ICC profile.
#[derive(Debug)]
pub struct OpenProfile {
    role: ProfileRole,
    header: IccHeader,
    bytes: Vec<u8>,
}

impl OpenProfile {
    fn open(bytes: &[u8], role: ProfileRole) -> std::result::Result<Self, ColorProfileError> {
        let header = IccHeader::parse(bytes, role)?;
        Ok(Self {
            role,
            header,
            bytes: bytes.get(..header.size as usize).unwrap_or(bytes).to_vec(),
        })
    }

    /// Decoded header.
    pub fn header(&self) -> &IccHeader {
        &self.header
    }

    fn to_engine_profile(&self) -> std::result::Result<ColorProfile, ColorProfileError> {
        ColorProfile::new_from_slice(&self.bytes).map_err(|e| ColorProfileError::Parse {
            role: self.role,
            reason: e.to_string(),
        })
    }
}

impl NativeResource for OpenProfile {
    const KIND: &'static str = "color profile";

    fn release(self) {
        tracing::debug!(role = %self.role, "Closed color profile");
    }
}

/// A document-to-monitor transform.
pub struct ColorTransform {
    executor: Box<dyn TransformExecutor<u8> + Send + Sync>,
    gray_source: bool,
}

impl std::fmt::Debug for ColorTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColorTransform")
            .field("gray_source", &self.gray_source)
            .finish_non_exhaustive()
    }
}

impl NativeResource for ColorTransform {
    const KIND: &'static str = "color transform";

    fn release(self) {
        drop(self.executor);
    }
}

/// Scoped owner of an [`OpenProfile`].
pub type SafeProfileHandle = SafeHandle<OpenProfile>;

/// Scoped owner of a [`ColorTransform`].
pub type SafeTransformHandle = SafeHandle<ColorTransform>;

/// Whether two profiles need a preview transform, judged from their headers.
///
/// # Errors
///
/// Returns [`ColorProfileError`] when either header is malformed.
pub fn profiles_require_correction(
    document: &[u8],
    monitor: &[u8],
) -> std::result::Result<bool, ColorProfileError> {
    let document = IccHeader::parse(document, ProfileRole::Document)?;
    let monitor = IccHeader::parse(monitor, ProfileRole::Monitor)?;
    Ok(document.differs_from(&monitor))
}

/// Converts preview pixels from the document profile to the monitor profile.
#[derive(Debug)]
pub struct ColorProfileConverter {
    transform: SafeTransformHandle,
    document: SafeProfileHandle,
    monitor: SafeProfileHandle,
    correction_required: bool,
}

impl ColorProfileConverter {
    /// Open both profiles and build a transform if they differ.
    ///
    /// When the headers match both profiles are closed immediately and no
    /// correction is performed.
    ///
    /// # Errors
    ///
    /// Returns [`FilterHostError::FilterRun`] when a profile cannot be
    /// opened or the transform cannot be built. Anything opened before the
    /// failure is released first.
    pub fn initialize(document_profile: &[u8], monitor_profile: &[u8]) -> Result<Self> {
        let document = OpenProfile::open(document_profile, ProfileRole::Document).map_err(|e| {
            FilterHostError::filter_run("Unable to open the document color profile", e)
        })?;
        let document = SafeProfileHandle::new(document);

        let monitor = OpenProfile::open(monitor_profile, ProfileRole::Monitor).map_err(|e| {
            FilterHostError::filter_run("Unable to open the monitor color profile", e)
        })?;
        let monitor = SafeProfileHandle::new(monitor);

        let mut converter = Self {
            transform: SafeTransformHandle::invalid(),
            document,
            monitor,
            correction_required: false,
        };

        let (Some(doc), Some(mon)) = (
            converter.document.raw_for_abi(),
            converter.monitor.raw_for_abi(),
        ) else {
            return Ok(converter);
        };

        converter.correction_required = doc.header.differs_from(&mon.header);
        if converter.correction_required {
            let transform = create_transform(doc, mon).map_err(|e| {
                FilterHostError::filter_run("Unable to create the color transform", e)
            })?;
            converter.transform = SafeTransformHandle::new(transform);
            tracing::debug!("Preview color correction enabled");
        } else {
            converter.document.release();
            converter.monitor.release();
            tracing::debug!("Document and monitor profiles match; no correction needed");
        }

        Ok(converter)
    }

    /// Whether the profiles differ.
    pub fn correction_required(&self) -> bool {
        self.correction_required
    }

    /// Whether a transform is currently held.
    pub fn has_transform(&self) -> bool {
        self.transform.is_valid()
    }

    /// Whether either profile is still open.
    pub fn has_open_profiles(&self) -> bool {
        self.document.is_valid() || self.monitor.is_valid()
    }

    /// Convert 8-bit gray rows into the BGRA `destination`.
    ///
    /// `source` holds `destination.height()` rows of `destination.width()`
    /// bytes, `source_stride` bytes apart. Returns `false` without touching
    /// `destination` when no transform exists.
    ///
    /// # Errors
    ///
    /// Fails when `source` is too short, `destination` is not BGRA, or the
    /// transform rejects the data.
    pub fn color_correct_grayscale(
        &self,
        source: &[u8],
        source_stride: usize,
        destination: &mut PixelSurface,
    ) -> Result<bool> {
        let Some(transform) = self.transform.raw_for_abi() else {
            return Ok(false);
        };
        ensure_bgra(destination)?;

        let width = destination.width() as usize;
        let height = destination.height() as usize;
        let needed = if height == 0 {
            0
        } else {
            source_stride * (height - 1) + width
        };
        if source_stride < width || source.len() < needed {
            return Err(SurfaceError::BufferSizeMismatch {
                expected: needed,
                actual: source.len(),
            }
            .into());
        }

        let mut packed = Vec::with_capacity(width * height);
        for y in 0..height {
            let start = y * source_stride;
            packed.extend_from_slice(source.get(start..start + width).unwrap_or_default());
        }

        let converted = if transform.gray_source {
            transform_whole(transform, &packed, width * height)?
        } else {
            let expanded: Vec<u8> = packed.iter().flat_map(|&v| [v, v, v, 255]).collect();
            transform_whole(transform, &expanded, width * height)?
        };

        write_rgba_rows(&converted, destination, |_| 255);
        Ok(true)
    }

    /// Convert a BGRA `source` into the BGRA `destination`.
    ///
    /// Alpha is copied unchanged. Returns `false` without touching
    /// `destination` when no transform exists.
    ///
    /// # Errors
    ///
    /// Fails when either surface is not BGRA, the sizes differ, or the
    /// transform rejects the data.
    pub fn color_correct_bgra(
        &self,
        source: &PixelSurface,
        destination: &mut PixelSurface,
    ) -> Result<bool> {
        let Some(transform) = self.transform.raw_for_abi() else {
            return Ok(false);
        };
        ensure_bgra(source)?;
        ensure_bgra(destination)?;
        if source.width() != destination.width() || source.height() != destination.height() {
            return Err(SurfaceError::BufferSizeMismatch {
                expected: destination.width() as usize * destination.height() as usize * 4,
                actual: source.width() as usize * source.height() as usize * 4,
            }
            .into());
        }

        let width = source.width() as usize;
        let pixels = width * source.height() as usize;
        let mut alpha = Vec::with_capacity(pixels);
        let mut input = Vec::with_capacity(if transform.gray_source { pixels } else { pixels * 4 });
        for y in 0..source.height() {
            for px in source.row(y).unwrap_or_default().chunks_exact(4).take(width) {
                alpha.push(px[3]);
                if transform.gray_source {
                    input.push(luma(px[2], px[1], px[0]));
                } else {
                    input.extend_from_slice(&[px[2], px[1], px[0], px[3]]);
                }
            }
        }

        let converted = transform_whole(transform, &input, pixels)?;
        write_rgba_rows(&converted, destination, |i| {
            alpha.get(i).copied().unwrap_or(255)
        });
        Ok(true)
    }

    /// Release the transform, then the document profile, then the monitor
    /// profile. Later calls do nothing.
    pub fn dispose(&mut self) {
        self.transform.release();
        self.document.release();
        self.monitor.release();
    }
}

impl Drop for ColorProfileConverter {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn create_transform(
    document: &OpenProfile,
    monitor: &OpenProfile,
) -> std::result::Result<ColorTransform, ColorProfileError> {
    let source = document.to_engine_profile()?;
    let destination = monitor.to_engine_profile()?;
    let gray_source = document.header.is_gray();
    let source_layout = if gray_source {
        Layout::Gray
    } else {
        Layout::Rgba
    };
    let options = TransformOptions {
        rendering_intent: RenderingIntent::Perceptual,
        ..TransformOptions::default()
    };
    let executor = source
        .create_transform_8bit(source_layout, &destination, Layout::Rgba, options)
        .map_err(|e| ColorProfileError::Transform(e.to_string()))?;
    Ok(ColorTransform {
        executor,
        gray_source,
    })
}

fn transform_whole(transform: &ColorTransform, input: &[u8], pixels: usize) -> Result<Vec<u8>> {
    let mut output = vec![0u8; pixels * 4];
    transform
        .executor
        .transform(input, &mut output)
        .map_err(|e| FilterHostError::from(ColorProfileError::Apply(e.to_string())))?;
    Ok(output)
}

fn write_rgba_rows(rgba: &[u8], destination: &mut PixelSurface, alpha: impl Fn(usize) -> u8) {
    let width = destination.width() as usize;
    for y in 0..destination.height() {
        let base = y as usize * width;
        let Some(row) = destination.row_mut(y) else {
            continue;
        };
        for (x, px) in row.chunks_exact_mut(4).take(width).enumerate() {
            let i = base + x;
            if let Some(src) = rgba.get(i * 4..i * 4 + 3) {
                px[0] = src[2];
                px[1] = src[1];
                px[2] = src[0];
                px[3] = alpha(i);
            }
        }
    }
}

fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((u32::from(r) * 299 + u32::from(g) * 587 + u32::from(b) * 114 + 500) / 1000) as u8
}

fn ensure_bgra(surface: &PixelSurface) -> Result<()> {
    if surface.format() != SurfaceFormat::Bgra32 {
        return Err(SurfaceError::FormatMismatch {
            expected: SurfaceFormat::Bgra32,
            actual: surface.format(),
        }
        .into());
    }
    Ok(())
}
