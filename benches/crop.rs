//! Crop and preview benchmarks.
//!
//! ```bash
//! cargo bench --bench crop
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use dragcrop::core::{ImageBatch, MaskBatch};
use dragcrop::crop::{CropExecutor, CropInsets};
use ndarray::Array4;
use std::time::Duration;

/// Synthetic batch with a per-pixel gradient.
fn create_test_batch(batch: usize, width: usize, height: usize) -> ImageBatch {
    let data = Array4::from_shape_fn((batch, height, width, 3), |(_, y, x, c)| {
        ((x * 7 + y * 11 + c * 13) % 256) as f32 / 255.0
    });
    ImageBatch::new(data).expect("non-empty batch")
}

fn bench_crop(c: &mut Criterion) {
    let mut group = c.benchmark_group("crop");
    group.measurement_time(Duration::from_secs(5));

    let executor = CropExecutor::default();
    let insets = CropInsets::new(64, 128, 32, 96);

    for (width, height) in [(640, 360), (1920, 1080)] {
        let image = create_test_batch(4, width, height);
        let mask = MaskBatch::ones(4, height, width).expect("non-empty mask");

        group.throughput(Throughput::Elements(4));
        group.bench_with_input(
            BenchmarkId::new("image", format!("{}x{}", width, height)),
            &image,
            |b, image| b.iter(|| black_box(executor.crop(black_box(image), None, insets))),
        );
        group.bench_with_input(
            BenchmarkId::new("image_and_mask", format!("{}x{}", width, height)),
            &(image, mask),
            |b, (image, mask)| {
                b.iter(|| black_box(executor.crop(black_box(image), Some(mask), insets)))
            },
        );
    }

    group.finish();
}

fn bench_preview(c: &mut Criterion) {
    let mut group = c.benchmark_group("preview");
    group.sample_size(20);

    let executor = CropExecutor::default();
    for (width, height) in [(800, 600), (1920, 1080), (4096, 2160)] {
        let image = create_test_batch(1, width, height);
        group.bench_with_input(
            BenchmarkId::new("render", format!("{}x{}", width, height)),
            &image,
            |b, image| b.iter(|| black_box(executor.preview(black_box(image)))),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_crop, bench_preview);
criterion_main!(benches);
