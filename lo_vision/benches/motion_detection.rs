//! ABOUTME: Benchmarks for per-frame motion analysis cost
//! ABOUTME: Uses criterion across frame sizes and blur kernels

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use lo_vision::{MotionConfig, MotionDetector};
use test_support::{frame_with_block, uniform_frame, BACKGROUND_LEVEL};

fn bench_frame_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("process_frame");

    let frame_sizes = vec![
        (160, 120, "160x120"),
        (350, 870, "350x870"),
        (640, 480, "640x480"),
    ];

    for (width, height, size_name) in frame_sizes {
        let mut detector = MotionDetector::new(MotionConfig::default()).unwrap();
        detector
            .initialize(&uniform_frame(width, height, BACKGROUND_LEVEL))
            .unwrap();
        let frame = frame_with_block(width, height, BACKGROUND_LEVEL, 10, 10, 50, 50, 200);

        group.bench_with_input(BenchmarkId::new("default", size_name), &frame, |b, f| {
            b.iter(|| detector.process(f).unwrap());
        });
    }

    group.finish();
}

fn bench_blur_kernels(c: &mut Criterion) {
    let mut group = c.benchmark_group("blur_kernel");
    let frame = frame_with_block(320, 240, BACKGROUND_LEVEL, 10, 10, 50, 50, 200);

    for kernel in [5u32, 15, 25] {
        let config = MotionConfig {
            blur_kernel: kernel,
            ..Default::default()
        };
        let mut detector = MotionDetector::new(config).unwrap();
        detector.initialize(&frame).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(kernel), &frame, |b, f| {
            b.iter(|| detector.process(f).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_frame_sizes, bench_blur_kernels);
criterion_main!(benches);
