use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use pointclouds_core::PointCloud;
use pointclouds_filters::crop_by_bounds;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_cloud(n: usize, seed: u64) -> PointCloud {
    let mut rng = StdRng::seed_from_u64(seed);
    let x: Vec<f32> = (0..n).map(|_| rng.gen_range(0.0f32..100.0)).collect();
    let y: Vec<f32> = (0..n).map(|_| rng.gen_range(0.0f32..100.0)).collect();
    let z: Vec<f32> = (0..n).map(|_| rng.gen_range(0.0f32..100.0)).collect();
    PointCloud::from_xyz(x, y, z)
}

fn bench_crop_single_axis(c: &mut Criterion) {
    let mut group = c.benchmark_group("crop_by_bounds_x");
    let min = [25.0, f32::MIN, f32::MIN];
    let max = [75.0, f32::MAX, f32::MAX];
    for size in [100_000, 1_000_000] {
        let cloud = random_cloud(size, 42);
        group.bench_with_input(BenchmarkId::new("pointclouds-rs", size), &cloud, |b, cloud| {
            b.iter(|| crop_by_bounds(cloud, min, max))
        });
    }
    group.finish();
}

fn bench_crop_box(c: &mut Criterion) {
    let mut group = c.benchmark_group("crop_by_bounds_box");
    for size in [100_000, 1_000_000] {
        let cloud = random_cloud(size, 42);
        group.bench_with_input(BenchmarkId::new("pointclouds-rs", size), &cloud, |b, cloud| {
            b.iter(|| crop_by_bounds(cloud, [10.0, 20.0, 30.0], [60.0, 70.0, 80.0]))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_crop_single_axis, bench_crop_box);
criterion_main!(benches);
