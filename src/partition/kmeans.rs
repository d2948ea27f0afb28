//! Capacity-constrained k-means.
//!
//! Lloyd iterations where the assignment step fills groups greedily by
//! ascending point-to-centroid distance and never lets a group grow past
//! `ceil(len / n)` points. Splitting a group of `len` points into
//! `n = ceil(len / max)` parts therefore always yields parts of at most `max`.

use geo::Coord;
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{CapacitatedPartitioner, distance_sq};
use crate::{Label, MeetupError, Result};

/// Configuration for [`CapacitatedKMeans`].
#[derive(Debug, Clone)]
pub struct KMeansConfig {
    /// RNG seed for k-means++ seeding.
    pub seed: u64,
    /// Maximum number of Lloyd iterations.
    /// Default: 300
    pub max_iterations: usize,
    /// Stop once no centroid moves further than this (meters).
    /// Default: 1e-4
    pub tolerance: f64,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            max_iterations: 300,
            tolerance: 1e-4,
        }
    }
}

/// Seeded k-means with a hard per-group capacity.
#[derive(Debug, Clone, Default)]
pub struct CapacitatedKMeans {
    pub config: KMeansConfig,
}

impl CapacitatedKMeans {
    pub fn new(config: KMeansConfig) -> Self {
        Self { config }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::new(KMeansConfig {
            seed,
            ..KMeansConfig::default()
        })
    }
}

impl CapacitatedPartitioner for CapacitatedKMeans {
    fn partition(&self, points: &[Coord<f64>], n: usize) -> Result<Vec<Label>> {
        if n == 0 || n > points.len() {
            return Err(MeetupError::InvalidPartitionCount {
                requested: n,
                point_count: points.len(),
            });
        }
        if n == 1 {
            return Ok(vec![0; points.len()]);
        }

        let capacity = points.len().div_ceil(n);
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut centroids = seed_centroids(points, n, &mut rng);
        let mut assignments = assign_with_capacity(points, &centroids, capacity);
        let tolerance_sq = self.config.tolerance * self.config.tolerance;

        for iteration in 0..self.config.max_iterations {
            let updated = update_centroids(points, &assignments, &centroids);
            let max_shift_sq = centroids
                .iter()
                .zip(&updated)
                .map(|(old, new)| distance_sq(*old, *new))
                .fold(0.0, f64::max);
            centroids = updated;

            let next = assign_with_capacity(points, &centroids, capacity);
            let changed = next != assignments;
            assignments = next;

            if !changed || max_shift_sq < tolerance_sq {
                debug!(
                    "[Split] k-means settled after {} iterations ({} points, {} groups, capacity {})",
                    iteration + 1,
                    points.len(),
                    n,
                    capacity
                );
                break;
            }
        }

        Ok(assignments)
    }
}

/// k-means++ seeding: each new centroid is drawn with probability
/// proportional to its squared distance from the nearest chosen centroid.
fn seed_centroids(points: &[Coord<f64>], n: usize, rng: &mut StdRng) -> Vec<Coord<f64>> {
    let mut chosen: Vec<usize> = vec![rng.gen_range(0..points.len())];
    let mut nearest: Vec<f64> = points
        .iter()
        .map(|p| distance_sq(*p, points[chosen[0]]))
        .collect();

    while chosen.len() < n {
        let total: f64 = nearest.iter().sum();
        let next = if total > 0.0 {
            let mut target = rng.gen_range(0.0..total);
            let mut pick = points.len() - 1;
            for (i, weight) in nearest.iter().enumerate() {
                if target < *weight {
                    pick = i;
                    break;
                }
                target -= weight;
            }
            pick
        } else {
            // All remaining points coincide with a centroid; take any unused one.
            (0..points.len())
                .find(|i| !chosen.contains(i))
                .unwrap_or(0)
        };

        chosen.push(next);
        for (i, p) in points.iter().enumerate() {
            nearest[i] = nearest[i].min(distance_sq(*p, points[next]));
        }
    }

    chosen.into_iter().map(|i| points[i]).collect()
}

/// Greedy capacity-constrained assignment.
///
/// All (point, centroid) pairs are visited in ascending distance order; a
/// point takes the first centroid that still has room.
fn assign_with_capacity(
    points: &[Coord<f64>],
    centroids: &[Coord<f64>],
    capacity: usize,
) -> Vec<Label> {
    let mut pairs: Vec<(f64, usize, usize)> = Vec::with_capacity(points.len() * centroids.len());
    for (i, p) in points.iter().enumerate() {
        for (c, centroid) in centroids.iter().enumerate() {
            pairs.push((distance_sq(*p, *centroid), i, c));
        }
    }
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));

    let mut assignments: Vec<Option<Label>> = vec![None; points.len()];
    let mut counts = vec![0usize; centroids.len()];
    let mut remaining = points.len();

    for (_, i, c) in pairs {
        if remaining == 0 {
            break;
        }
        if assignments[i].is_none() && counts[c] < capacity {
            assignments[i] = Some(c);
            counts[c] += 1;
            remaining -= 1;
        }
    }

    // n * capacity >= len, so every point has found a slot.
    assignments.into_iter().map(|a| a.unwrap_or(0)).collect()
}

/// Mean of each group; an empty group keeps its previous centroid.
fn update_centroids(
    points: &[Coord<f64>],
    assignments: &[Label],
    previous: &[Coord<f64>],
) -> Vec<Coord<f64>> {
    let mut sums = vec![Coord { x: 0.0, y: 0.0 }; previous.len()];
    let mut counts = vec![0usize; previous.len()];
    for (p, &c) in points.iter().zip(assignments) {
        sums[c].x += p.x;
        sums[c].y += p.y;
        counts[c] += 1;
    }

    sums.into_iter()
        .zip(counts)
        .zip(previous)
        .map(|((sum, count), prev)| {
            if count == 0 {
                *prev
            } else {
                Coord {
                    x: sum.x / count as f64,
                    y: sum.y / count as f64,
                }
            }
        })
        .collect()
}
