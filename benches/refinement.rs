//! Performance benchmarks for group size refinement.
//!
//! Run with: `cargo bench`
//!
//! Inputs are synthetic Gaussian blobs in a planar frame, roughly the
//! density of users across a city.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use meetup::synthetic::blob_cluster;
use meetup::{
    AffinityPropagation, CapacitatedKMeans, InitialPartitioner, Labeling, RefinementConfig,
    improve, merge, split,
};

// ============================================================================
// Synthetic Inputs
// ============================================================================

/// `groups` blobs laid out on a grid, with sizes cycling through small,
/// in-range and oversized.
fn synthetic_labeling(groups: usize) -> Labeling {
    let sizes = [3, 12, 45, 150];
    let side = (groups as f64).sqrt().ceil() as usize;
    let points = (0..groups)
        .flat_map(|g| {
            let x = (g % side) as f64 * 2_000.0;
            let y = (g / side) as f64 * 2_000.0;
            blob_cluster(
                &format!("g{}", g),
                x,
                y,
                sizes[g % sizes.len()],
                300.0,
                g,
                g as u64,
            )
        })
        .collect();
    Labeling::planar(points)
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_split(c: &mut Criterion) {
    let mut group = c.benchmark_group("split");
    let partitioner = CapacitatedKMeans::default();

    for count in [8, 32, 128] {
        let labeling = synthetic_labeling(count);
        group.bench_with_input(BenchmarkId::new("max_20", count), &labeling, |b, labeling| {
            b.iter(|| split(black_box(labeling.clone()), 20, &partitioner))
        });
    }

    group.finish();
}

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge");

    for count in [8, 32, 128, 512] {
        let labeling = synthetic_labeling(count);
        group.bench_with_input(BenchmarkId::new("min_10", count), &labeling, |b, labeling| {
            b.iter(|| merge(black_box(labeling.clone()), 10))
        });
    }

    group.finish();
}

fn bench_improve(c: &mut Criterion) {
    let mut group = c.benchmark_group("improve");
    group.sample_size(10); // Fewer samples for slow operations
    let partitioner = CapacitatedKMeans::default();
    let config = RefinementConfig::default()
        .with_min_occupancy(10)
        .with_max_occupancy(20);

    for count in [8, 32, 128] {
        let labeling = synthetic_labeling(count);
        group.bench_with_input(BenchmarkId::new("10_to_20", count), &labeling, |b, labeling| {
            b.iter(|| improve(black_box(labeling.clone()), &config, &partitioner))
        });
    }

    group.finish();
}

fn bench_affinity(c: &mut Criterion) {
    let mut group = c.benchmark_group("affinity_propagation");
    group.sample_size(10);
    let partitioner = AffinityPropagation::default();

    for count in [4, 8] {
        let positions = synthetic_labeling(count).positions();
        group.bench_with_input(
            BenchmarkId::new("points", positions.len()),
            &positions,
            |b, positions| b.iter(|| partitioner.partition(black_box(positions))),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_split, bench_merge, bench_improve, bench_affinity);
criterion_main!(benches);
