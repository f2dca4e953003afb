//! Resampling Benchmarks
//!
//! Criterion benchmarks for the preview resampling paths.

use criterion::{Criterion, criterion_group, criterion_main};
use filterhost_surface::prelude::*;

fn checkerboard(width: u32, height: u32) -> Result<PixelSurface, SurfaceError> {
    let mut surface = PixelSurface::new(width, height, SurfaceFormat::Bgra32)?;
    for y in 0..height {
        for x in 0..width {
            let v = if (x / 8 + y / 8) % 2 == 0 { 32 } else { 224 };
            surface.set_bgra(x, y, [v, v, v, 255]);
        }
    }
    Ok(surface)
}

fn bench_super_sample_shrink(c: &mut Criterion) {
    let (Ok(source), Ok(mut dst)) = (
        checkerboard(512, 512),
        PixelSurface::new(128, 128, SurfaceFormat::Bgra32),
    ) else {
        return;
    };

    c.bench_function("super_sample_512_to_128", |b| {
        b.iter(|| dst.super_sample_fit(std::hint::black_box(&source)))
    });
}

fn bench_bicubic_enlarge(c: &mut Criterion) {
    let (Ok(source), Ok(mut dst)) = (
        checkerboard(64, 64),
        PixelSurface::new(256, 256, SurfaceFormat::Bgra32),
    ) else {
        return;
    };
    let bounds = dst.bounds();

    c.bench_function("bicubic_64_to_256", |b| {
        b.iter(|| dst.bicubic_fit(std::hint::black_box(&source), bounds))
    });
}

fn bench_has_transparency(c: &mut Criterion) {
    let Ok(source) = checkerboard(1024, 1024) else {
        return;
    };

    c.bench_function("has_transparency_1024", |b| {
        b.iter(|| std::hint::black_box(&source).has_transparency())
    });
}

criterion_group!(
    benches,
    bench_super_sample_shrink,
    bench_bicubic_enlarge,
    bench_has_transparency
);
criterion_main!(benches);
