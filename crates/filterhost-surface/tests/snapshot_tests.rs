//! Snapshot tests for surface error messages and resampled output.

use filterhost_surface::prelude::*;

#[test]
fn snapshot_invalid_dimensions_message() {
    let err = SurfaceError::InvalidDimensions {
        width: 0,
        height: 12,
    };
    insta::assert_snapshot!(err.to_string(), @"invalid surface dimensions 0x12");
}

#[test]
fn snapshot_stride_message() {
    let err = SurfaceError::StrideTooSmall { stride: 6, min: 8 };
    insta::assert_snapshot!(err.to_string(), @"stride 6 is smaller than the 8 bytes a row needs");
}

#[test]
fn snapshot_format_mismatch_message() {
    let err = SurfaceError::FormatMismatch {
        expected: SurfaceFormat::Bgra32,
        actual: SurfaceFormat::Gray16,
    };
    insta::assert_snapshot!(err.to_string(), @"format mismatch: expected Bgra32, got Gray16");
}

#[test]
fn snapshot_unsupported_format_message() {
    let err = SurfaceError::UnsupportedFormat {
        operation: "scale_to_photoshop_range",
        format: SurfaceFormat::Bgra32,
    };
    insta::assert_snapshot!(
        err.to_string(),
        @"scale_to_photoshop_range is not supported for Bgra32 surfaces"
    );
}

#[test]
fn snapshot_super_sampled_ramp() -> Result<(), Box<dyn std::error::Error>> {
    let mut source = PixelSurface::new(6, 1, SurfaceFormat::Gray16)?;
    for x in 0..6 {
        source.set_gray16(x, 0, (x * 1200) as u16);
    }
    let mut dst = PixelSurface::new(4, 1, SurfaceFormat::Gray16)?;
    dst.super_sample_fit(&source)?;
    let values: Vec<Option<u16>> = (0..4).map(|x| dst.gray16_at(x, 0)).collect();
    insta::assert_snapshot!(
        format!("{values:?}"),
        @"[Some(400), Some(2000), Some(4000), Some(5600)]"
    );
    Ok(())
}
