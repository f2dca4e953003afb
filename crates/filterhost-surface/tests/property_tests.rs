//! Property-based tests for transparency handling and resampling.

use filterhost_surface::prelude::*;
use proptest::prelude::*;

fn surface_from(width: u32, height: u32, pixels: &[[u8; 4]]) -> PixelSurface {
    let mut surface = match PixelSurface::new(width, height, SurfaceFormat::Bgra32) {
        Ok(surface) => surface,
        Err(e) => panic!("surface allocation failed: {e}"),
    };
    for y in 0..height {
        for x in 0..width {
            let index = (y * width + x) as usize;
            surface.set_bgra(x, y, pixels[index % pixels.len()]);
        }
    }
    surface
}

fn dimensions() -> impl Strategy<Value = (u32, u32)> {
    (1u32..24, 1u32..24)
}

fn opaque_pixels() -> impl Strategy<Value = Vec<[u8; 4]>> {
    prop::collection::vec(
        (any::<u8>(), any::<u8>(), any::<u8>()).prop_map(|(b, g, r)| [b, g, r, 255]),
        1..64,
    )
}

fn any_pixels() -> impl Strategy<Value = Vec<[u8; 4]>> {
    prop::collection::vec(any::<[u8; 4]>(), 1..64)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_constant_alpha_transparency((w, h) in dimensions(), alpha in any::<u8>()) {
        let mut surface = PixelSurface::new(w, h, SurfaceFormat::Bgra32)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        surface.fill_bgra([1, 2, 3, alpha]);
        prop_assert_eq!(surface.has_transparency(), alpha < 255);
    }

    #[test]
    fn prop_opaque_full_region_clears_transparency((w, h) in dimensions(), pixels in any_pixels()) {
        let mut surface = surface_from(w, h, &pixels);
        let bounds = surface.bounds();
        surface.set_alpha_opaque(bounds);
        prop_assert!(!surface.has_transparency());
    }

    #[test]
    fn prop_one_translucent_pixel_detected(
        (w, h) in dimensions(),
        pixels in opaque_pixels(),
        fx in any::<u32>(),
        fy in any::<u32>(),
        alpha in 0u8..255,
    ) {
        let mut surface = surface_from(w, h, &pixels);
        prop_assert!(!surface.has_transparency());
        let (x, y) = (fx % w, fy % h);
        let Some([b, g, r, _]) = surface.bgra_at(x, y) else {
            return Err(TestCaseError::fail("pixel out of range"));
        };
        surface.set_bgra(x, y, [b, g, r, alpha]);
        prop_assert!(surface.has_transparency());
    }

    #[test]
    fn prop_super_sample_identity((w, h) in dimensions(), pixels in opaque_pixels()) {
        let source = surface_from(w, h, &pixels);
        let mut dst = PixelSurface::new(w, h, SurfaceFormat::Bgra32)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        dst.super_sample_fit(&source).map_err(|e| TestCaseError::fail(e.to_string()))?;
        for y in 0..h {
            for x in 0..w {
                let (Some(a), Some(b)) = (source.bgra_at(x, y), dst.bgra_at(x, y)) else {
                    return Err(TestCaseError::fail("pixel out of range"));
                };
                for c in 0..4 {
                    prop_assert!(a[c].abs_diff(b[c]) <= 1);
                }
            }
        }
    }

    #[test]
    fn prop_bicubic_identity((w, h) in dimensions(), pixels in opaque_pixels()) {
        let source = surface_from(w, h, &pixels);
        let mut dst = PixelSurface::new(w, h, SurfaceFormat::Bgra32)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        let bounds = dst.bounds();
        dst.bicubic_fit(&source, bounds).map_err(|e| TestCaseError::fail(e.to_string()))?;
        for y in 0..h {
            for x in 0..w {
                let (Some(a), Some(b)) = (source.bgra_at(x, y), dst.bgra_at(x, y)) else {
                    return Err(TestCaseError::fail("pixel out of range"));
                };
                for c in 0..4 {
                    prop_assert!(a[c].abs_diff(b[c]) <= 1);
                }
            }
        }
    }

    #[test]
    fn prop_tiny_sources_upscale_without_escaping(
        side in 1u32..3,
        pixels in any_pixels(),
        (dw, dh) in (1u32..60, 1u32..60),
    ) {
        let source = surface_from(side, side, &pixels);
        let mut dst = PixelSurface::new(dw, dh, SurfaceFormat::Bgra32)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        let bounds = dst.bounds();
        prop_assert!(dst.bicubic_fit(&source, bounds).is_ok());
        prop_assert!(dst.super_sample_fit(&source).is_ok());
    }

    #[test]
    fn prop_arbitrary_regions_are_clipped(
        pixels in any_pixels(),
        x in -40i32..40,
        y in -40i32..40,
        w in 0i32..80,
        h in 0i32..80,
    ) {
        let source = surface_from(7, 5, &pixels);
        let mut dst = PixelSurface::new(20, 20, SurfaceFormat::Bgra32)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert!(dst.bicubic_fit(&source, Rect::new(x, y, w, h)).is_ok());
    }

    #[test]
    fn prop_photoshop_range_round_trip(value in any::<u16>()) {
        let scaled = filterhost_surface::to_photoshop_range(value);
        prop_assert!(scaled <= filterhost_surface::PHOTOSHOP_16BIT_MAX);
        let restored = filterhost_surface::from_photoshop_range(scaled);
        prop_assert!(restored.abs_diff(value) <= 1);
    }
}
