//! Tests for the initial and capacitated partitioners

use std::collections::BTreeSet;

use geo::Coord;
use meetup::synthetic::blob_cluster;
use meetup::{
    AffinityConfig, AffinityPropagation, CapacitatedKMeans, CapacitatedPartitioner,
    InitialPartitioner, Label, MeetupError, compact_labels,
};

fn positions(blobs: &[(f64, f64, usize)], std_dev: f64) -> Vec<Coord<f64>> {
    blobs
        .iter()
        .enumerate()
        .flat_map(|(i, &(x, y, count))| {
            blob_cluster("p", x, y, count, std_dev, i, i as u64 + 1)
                .into_iter()
                .map(|p| p.position)
        })
        .collect()
}

// ============================================================================
// Capacitated k-means
// ============================================================================

#[test]
fn test_kmeans_respects_capacity() {
    let points = positions(&[(0.0, 0.0, 37), (5.0, 5.0, 64)], 3.0);

    for n in [2, 3, 7, 10] {
        let labels = CapacitatedKMeans::default().partition(&points, n).unwrap();
        let capacity = points.len().div_ceil(n);

        assert_eq!(labels.len(), points.len());
        for group in 0..n {
            let count = labels.iter().filter(|&&l| l == group).count();
            assert!(count <= capacity, "group {} has {} > {}", group, count, capacity);
        }
        assert!(labels.iter().all(|&l| l < n));
    }
}

#[test]
fn test_kmeans_separates_distant_blobs() {
    let points = positions(&[(0.0, 0.0, 50), (1000.0, 0.0, 50)], 1.0);

    let labels = CapacitatedKMeans::default().partition(&points, 2).unwrap();

    let first: BTreeSet<Label> = labels[..50].iter().copied().collect();
    let second: BTreeSet<Label> = labels[50..].iter().copied().collect();
    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);
    assert_ne!(first, second);
}

#[test]
fn test_kmeans_deterministic_for_seed() {
    let points = positions(&[(0.0, 0.0, 80)], 10.0);

    let a = CapacitatedKMeans::with_seed(9).partition(&points, 4).unwrap();
    let b = CapacitatedKMeans::with_seed(9).partition(&points, 4).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_kmeans_invalid_counts() {
    let points = positions(&[(0.0, 0.0, 5)], 1.0);

    assert!(matches!(
        CapacitatedKMeans::default().partition(&points, 0),
        Err(MeetupError::InvalidPartitionCount { requested: 0, point_count: 5 })
    ));
    assert!(matches!(
        CapacitatedKMeans::default().partition(&points, 6),
        Err(MeetupError::InvalidPartitionCount { requested: 6, .. })
    ));
}

#[test]
fn test_kmeans_single_group_and_coincident_points() {
    let points = positions(&[(0.0, 0.0, 5)], 1.0);
    assert_eq!(
        CapacitatedKMeans::default().partition(&points, 1).unwrap(),
        vec![0; 5]
    );

    let same = vec![Coord { x: 3.0, y: 3.0 }; 6];
    let labels = CapacitatedKMeans::default().partition(&same, 3).unwrap();
    for group in 0..3 {
        assert_eq!(labels.iter().filter(|&&l| l == group).count(), 2);
    }
}

// ============================================================================
// Affinity propagation
// ============================================================================

#[test]
fn test_affinity_finds_separated_groups() {
    let points = positions(&[(0.0, 0.0, 15), (100.0, 0.0, 15), (0.0, 100.0, 15)], 0.1);
    let partitioner = AffinityPropagation::new(AffinityConfig {
        max_iterations: 1000,
        preference: Some(-50.0),
        ..AffinityConfig::default()
    });

    let labels = partitioner.partition(&points).unwrap();

    assert_eq!(labels.len(), 45);
    let blob_labels: Vec<BTreeSet<Label>> = labels
        .chunks(15)
        .map(|chunk| chunk.iter().copied().collect())
        .collect();
    assert!(blob_labels.iter().all(|set| set.len() == 1));
    let distinct: BTreeSet<Label> = labels.iter().copied().collect();
    assert_eq!(distinct.len(), 3);
}

#[test]
fn test_affinity_labels_are_dense_and_deterministic() {
    let points = positions(&[(0.0, 0.0, 12), (40.0, 10.0, 8)], 5.0);
    let partitioner = AffinityPropagation::default();

    let labels = partitioner.partition(&points).unwrap();

    assert_eq!(labels.len(), points.len());
    assert_eq!(compact_labels(&labels), labels);
    assert_eq!(partitioner.partition(&points).unwrap(), labels);
}

#[test]
fn test_affinity_without_convergence_uses_single_group() {
    let points = positions(&[(0.0, 0.0, 15), (100.0, 0.0, 15), (0.0, 100.0, 15)], 0.1);
    // The exemplar set must hold for `convergence_iterations` (15) rounds,
    // which cannot happen within 5 iterations.
    let partitioner = AffinityPropagation::new(AffinityConfig {
        max_iterations: 5,
        preference: Some(-50.0),
        ..AffinityConfig::default()
    });

    let labels = partitioner.partition(&points).unwrap();

    assert_eq!(labels, vec![0; 45]);
}

#[test]
fn test_affinity_trivial_inputs() {
    let partitioner = AffinityPropagation::default();
    assert!(partitioner.partition(&[]).unwrap().is_empty());
    assert_eq!(
        partitioner.partition(&[Coord { x: 1.0, y: 2.0 }]).unwrap(),
        vec![0]
    );
}
