//! Area-weighted (super sampling) and bicubic resampling.
//!
//! Both algorithms premultiply color by alpha while accumulating and divide
//! by the accumulated alpha at the end, so fully transparent pixels never
//! bleed color into their neighbors. Gray surfaces run the same code with a
//! constant alpha of 255 at every tap.
//!
//! Every source read goes through a bounds check or through a path whose
//! taps were proven in range beforehand; no destination region can make
//! either algorithm read outside the source.

use crate::error::SurfaceResult;
use crate::rect::Rect;
use crate::surface::{PixelSurface, SurfaceFormat};

/// Which resampling algorithm [`PixelSurface::fit_surface`] uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResamplingAlgorithm {
    /// Super sampling when shrinking, bicubic when enlarging.
    #[default]
    Auto,
    /// Area-weighted box filter.
    SuperSampling,
    /// Cubic convolution.
    Bicubic,
}

/// Sharpness coefficient of the cubic convolution kernel (Catmull-Rom).
const CUBIC_A: f64 = -0.5;

/// Cubic convolution kernel.
///
/// `(a+2)|x|^3 - (a+3)|x|^2 + 1` on `[0, 1]`,
/// `a|x|^3 - 5a|x|^2 + 8a|x| - 4a` on `[1, 2]`, zero beyond.
pub fn cubic_weight(x: f64) -> f64 {
    let x = x.abs();
    if x <= 1.0 {
        ((CUBIC_A + 2.0) * x - (CUBIC_A + 3.0)) * x * x + 1.0
    } else if x < 2.0 {
        ((CUBIC_A * x - 5.0 * CUBIC_A) * x + 8.0 * CUBIC_A) * x - 4.0 * CUBIC_A
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy)]
struct Sample {
    color: [f64; 3],
    alpha: f64,
}

/// Running sums for one destination pixel.
#[derive(Debug, Default)]
struct Accumulator {
    color: [f64; 3],
    alpha: f64,
    weight: f64,
}

impl Accumulator {
    fn add(&mut self, sample: Sample, weight: f64) {
        let wa = weight * sample.alpha;
        for (sum, c) in self.color.iter_mut().zip(sample.color) {
            *sum += c * wa;
        }
        self.alpha += wa;
        self.weight += weight;
    }

    /// Un-premultiply and round. Zero accumulated alpha yields zero color.
    fn resolve(&self, max: f64) -> ([f64; 3], f64) {
        if self.weight <= 0.0 {
            return ([0.0; 3], 0.0);
        }
        let alpha = round_clamp(self.alpha / self.weight, 255.0);
        if self.alpha <= 0.0 {
            return ([0.0; 3], alpha);
        }
        let mut color = [0.0; 3];
        for (out, sum) in color.iter_mut().zip(self.color) {
            *out = round_clamp(sum / self.alpha, max);
        }
        (color, alpha)
    }
}

fn round_clamp(value: f64, max: f64) -> f64 {
    (value + 0.5).floor().clamp(0.0, max)
}

fn fetch(surface: &PixelSurface, x: usize, y: usize) -> Sample {
    let at = surface.offset(x, y);
    let data = surface.data();
    match surface.format() {
        SurfaceFormat::Bgra32 => match data.get(at..at + 4) {
            Some(px) => Sample {
                color: [f64::from(px[0]), f64::from(px[1]), f64::from(px[2])],
                alpha: f64::from(px[3]),
            },
            None => Sample {
                color: [0.0; 3],
                alpha: 0.0,
            },
        },
        SurfaceFormat::Gray16 => {
            let value = data
                .get(at..at + 2)
                .map_or(0, |px| u16::from_ne_bytes([px[0], px[1]]));
            Sample {
                color: [f64::from(value), 0.0, 0.0],
                alpha: 255.0,
            }
        }
    }
}

fn store(surface: &mut PixelSurface, x: usize, y: usize, color: [f64; 3], alpha: f64) {
    let at = surface.offset(x, y);
    let format = surface.format();
    let data = surface.data_mut();
    match format {
        SurfaceFormat::Bgra32 => {
            if let Some(px) = data.get_mut(at..at + 4) {
                px.copy_from_slice(&[color[0] as u8, color[1] as u8, color[2] as u8, alpha as u8]);
            }
        }
        SurfaceFormat::Gray16 => {
            if let Some(px) = data.get_mut(at..at + 2) {
                px.copy_from_slice(&(color[0] as u16).to_ne_bytes());
            }
        }
    }
}

impl PixelSurface {
    /// Resize `source` into this surface with an area-weighted box filter.
    ///
    /// Each destination pixel covers a fractional rectangle of the source;
    /// every source pixel it touches contributes in proportion to the
    /// overlapping area, so partially covered edge and corner pixels are
    /// weighted by their fractional coverage. Exact for both minification
    /// and magnification.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SurfaceError::FormatMismatch`] for differing formats.
    pub fn super_sample_fit(&mut self, source: &PixelSurface) -> SurfaceResult<()> {
        self.ensure_same_format(source)?;
        let (sw, sh) = (f64::from(source.width()), f64::from(source.height()));
        let (dw, dh) = (f64::from(self.width()), f64::from(self.height()));
        let max = f64::from(self.format().max_channel_value());

        tracing::trace!(
            src_width = source.width(),
            src_height = source.height(),
            dst_width = self.width(),
            dst_height = self.height(),
            "super sampling"
        );

        let columns: Vec<Span> = (0..self.width())
            .map(|dx| Span::new(f64::from(dx) * sw / dw, f64::from(dx + 1) * sw / dw, source.width()))
            .collect();

        for dy in 0..self.height() {
            let rows = Span::new(f64::from(dy) * sh / dh, f64::from(dy + 1) * sh / dh, source.height());
            for (dx, cols) in columns.iter().enumerate() {
                let mut acc = Accumulator::default();
                for sy in rows.first..rows.last {
                    let wy = rows.coverage(sy);
                    if wy <= 0.0 {
                        continue;
                    }
                    for sx in cols.first..cols.last {
                        let wx = cols.coverage(sx);
                        if wx <= 0.0 {
                            continue;
                        }
                        acc.add(fetch(source, sx, sy), wx * wy);
                    }
                }
                let (color, alpha) = acc.resolve(max);
                store(self, dx, dy as usize, color, alpha);
            }
        }
        Ok(())
    }

    /// Resize `source` into `dst_region` of this surface with cubic
    /// convolution.
    ///
    /// Destination pixels whose 4x4 neighborhood lies inside the source use
    /// an unchecked path; the border strips around them test every tap and
    /// renormalize by the weight actually used, so edges are not darkened by
    /// missing neighbors.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SurfaceError::FormatMismatch`] for differing formats.
    pub fn bicubic_fit(&mut self, source: &PixelSurface, dst_region: Rect) -> SurfaceResult<()> {
        self.ensure_same_format(source)?;
        let roi = dst_region.intersect(&self.bounds());
        if roi.is_empty() {
            return Ok(());
        }

        let columns = CubicAxis::new(self.width(), source.width());
        let rows = CubicAxis::new(self.height(), source.height());
        let interior = Rect::from_edges(
            columns.interior.start as i32,
            rows.interior.start as i32,
            columns.interior.end as i32,
            rows.interior.end as i32,
        )
        .intersect(&roi);

        tracing::trace!(
            src_width = source.width(),
            src_height = source.height(),
            dst_width = self.width(),
            dst_height = self.height(),
            interior_width = interior.width,
            interior_height = interior.height,
            "bicubic resampling"
        );

        if interior.is_empty() {
            self.bicubic_checked(source, roi, &columns, &rows);
            return Ok(());
        }

        self.bicubic_unchecked(source, interior, &columns, &rows);
        let strips = [
            Rect::from_edges(roi.x, roi.y, roi.right(), interior.y),
            Rect::from_edges(roi.x, interior.bottom(), roi.right(), roi.bottom()),
            Rect::from_edges(roi.x, interior.y, interior.x, interior.bottom()),
            Rect::from_edges(interior.right(), interior.y, roi.right(), interior.bottom()),
        ];
        for strip in strips.iter().filter(|s| !s.is_empty()) {
            self.bicubic_checked(source, *strip, &columns, &rows);
        }
        Ok(())
    }

    /// Resize `source` to fill this surface.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SurfaceError::FormatMismatch`] for differing formats.
    pub fn fit_surface(
        &mut self,
        algorithm: ResamplingAlgorithm,
        source: &PixelSurface,
    ) -> SurfaceResult<()> {
        let algorithm = match algorithm {
            ResamplingAlgorithm::Auto
                if self.width() < source.width() || self.height() < source.height() =>
            {
                ResamplingAlgorithm::SuperSampling
            }
            ResamplingAlgorithm::Auto => ResamplingAlgorithm::Bicubic,
            other => other,
        };
        match algorithm {
            ResamplingAlgorithm::SuperSampling => self.super_sample_fit(source),
            _ => {
                let bounds = self.bounds();
                self.bicubic_fit(source, bounds)
            }
        }
    }

    fn bicubic_unchecked(
        &mut self,
        source: &PixelSurface,
        region: Rect,
        columns: &CubicAxis,
        rows: &CubicAxis,
    ) {
        let max = f64::from(self.format().max_channel_value());
        for dy in region.y..region.bottom() {
            let row = rows.tap(dy as usize);
            for dx in region.x..region.right() {
                let col = columns.tap(dx as usize);
                let mut acc = Accumulator::default();
                for (n, wy) in row.weights.iter().enumerate() {
                    let sy = (row.origin - 1 + n as i64) as usize;
                    for (m, wx) in col.weights.iter().enumerate() {
                        let sx = (col.origin - 1 + m as i64) as usize;
                        acc.add(fetch(source, sx, sy), wx * wy);
                    }
                }
                let (color, alpha) = acc.resolve(max);
                store(self, dx as usize, dy as usize, color, alpha);
            }
        }
    }

    fn bicubic_checked(
        &mut self,
        source: &PixelSurface,
        region: Rect,
        columns: &CubicAxis,
        rows: &CubicAxis,
    ) {
        let max = f64::from(self.format().max_channel_value());
        for dy in region.y..region.bottom() {
            let row = rows.tap(dy as usize);
            for dx in region.x..region.right() {
                let col = columns.tap(dx as usize);
                let mut acc = Accumulator::default();
                for (n, wy) in row.weights.iter().enumerate() {
                    let sy = row.origin - 1 + n as i64;
                    for (m, wx) in col.weights.iter().enumerate() {
                        let sx = col.origin - 1 + m as i64;
                        if source.is_visible(sx as i32, sy as i32) {
                            acc.add(fetch(source, sx as usize, sy as usize), wx * wy);
                        }
                    }
                }
                let (color, alpha) = acc.resolve(max);
                store(self, dx as usize, dy as usize, color, alpha);
            }
        }
    }
}

/// Source interval covered by one destination pixel along one axis.
#[derive(Debug, Clone, Copy)]
struct Span {
    start: f64,
    end: f64,
    first: usize,
    last: usize,
}

impl Span {
    fn new(start: f64, end: f64, limit: u32) -> Self {
        let limit = limit as usize;
        let first = (start.floor().max(0.0) as usize).min(limit);
        let last = (end.ceil().max(0.0) as usize).min(limit);
        Self {
            start,
            end,
            first,
            last,
        }
    }

    /// Fraction of source pixel `i` inside the span.
    fn coverage(&self, i: usize) -> f64 {
        let lo = (i as f64).max(self.start);
        let hi = ((i + 1) as f64).min(self.end);
        hi - lo
    }
}

/// Kernel weights for the four taps `origin - 1 ..= origin + 2`.
#[derive(Debug, Clone, Copy)]
struct Tap {
    origin: i64,
    weights: [f64; 4],
}

/// Per-axis tap cache for one bicubic pass.
#[derive(Debug)]
struct CubicAxis {
    taps: Vec<Tap>,
    /// Destination indices whose four taps all lie inside the source.
    interior: std::ops::Range<usize>,
}

impl CubicAxis {
    fn new(dst_len: u32, src_len: u32) -> Self {
        let scale = if dst_len > 1 {
            f64::from(src_len.saturating_sub(1)) / f64::from(dst_len - 1)
        } else {
            0.0
        };
        let taps: Vec<Tap> = (0..dst_len)
            .map(|d| {
                let position = if dst_len > 1 {
                    f64::from(d) * scale
                } else {
                    f64::from(src_len.saturating_sub(1)) / 2.0
                };
                let origin = position.floor();
                let frac = position - origin;
                let mut weights = [0.0; 4];
                for (m, w) in weights.iter_mut().enumerate() {
                    *w = cubic_weight(m as f64 - 1.0 - frac);
                }
                Tap {
                    origin: origin as i64,
                    weights,
                }
            })
            .collect();

        let src_len = i64::from(src_len);
        let inside = |tap: &Tap| tap.origin >= 1 && tap.origin + 2 < src_len;
        let start = taps.iter().position(inside).unwrap_or(taps.len());
        let end = taps
            .iter()
            .rposition(inside)
            .map_or(start, |last| last + 1)
            .max(start);
        Self {
            taps,
            interior: start..end,
        }
    }

    fn tap(&self, index: usize) -> Tap {
        self.taps.get(index).copied().unwrap_or(Tap {
            origin: 0,
            weights: [0.0, 1.0, 0.0, 0.0],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn test_kernel_interpolates() {
        assert!((cubic_weight(0.0) - 1.0).abs() < 1e-12);
        assert!(cubic_weight(1.0).abs() < 1e-12);
        assert!(cubic_weight(2.0).abs() < 1e-12);
        assert!(cubic_weight(2.5).abs() < 1e-12);
    }

    #[test]
    fn test_kernel_partition_of_unity() {
        for step in 0..10 {
            let frac = f64::from(step) / 10.0;
            let sum: f64 = (-1..=2).map(|m| cubic_weight(f64::from(m) - frac)).sum();
            assert!((sum - 1.0).abs() < 1e-9, "frac {frac} sums to {sum}");
        }
    }

    #[test]
    fn test_interior_is_contiguous_and_in_range() {
        let axis = CubicAxis::new(50, 10);
        for index in axis.interior.clone() {
            let tap = axis.tap(index);
            assert!(tap.origin >= 1);
            assert!(tap.origin + 2 < 10);
        }
        assert!(!axis.interior.is_empty());
    }

    #[test]
    fn test_tiny_source_has_no_interior() {
        let axis = CubicAxis::new(50, 2);
        assert!(axis.interior.is_empty());
    }

    #[test]
    fn test_single_destination_pixel_maps_to_center() {
        let axis = CubicAxis::new(1, 5);
        assert_eq!(axis.tap(0).origin, 2);
    }

    #[test]
    fn test_transparent_pixels_do_not_bleed() -> TestResult {
        let mut source = PixelSurface::new(2, 1, SurfaceFormat::Bgra32)?;
        source.set_bgra(0, 0, [0, 0, 255, 255]);
        source.set_bgra(1, 0, [255, 0, 0, 0]);
        let mut dst = PixelSurface::new(1, 1, SurfaceFormat::Bgra32)?;
        dst.super_sample_fit(&source)?;
        assert_eq!(dst.bgra_at(0, 0), Some([0, 0, 255, 128]));
        Ok(())
    }

    #[test]
    fn test_fully_transparent_area_resolves_to_zero() -> TestResult {
        let mut source = PixelSurface::new(4, 4, SurfaceFormat::Bgra32)?;
        source.fill_bgra([10, 20, 30, 0]);
        let mut dst = PixelSurface::new(2, 2, SurfaceFormat::Bgra32)?;
        dst.super_sample_fit(&source)?;
        assert_eq!(dst.bgra_at(1, 1), Some([0, 0, 0, 0]));
        Ok(())
    }
}
