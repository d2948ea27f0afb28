//! Affinity propagation.
//!
//! Points exchange "responsibility" and "availability" messages until a
//! stable set of exemplars emerges; every point then joins its most similar
//! exemplar. The number of groups is chosen by the algorithm, driven by the
//! preference (self-similarity) value.
//!
//! If the exemplar set never stabilises within `max_iterations`, the
//! messages are still oscillating and no exemplar set is trusted: every
//! point is put in a single group and a warning is logged.

use geo::Coord;
use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{InitialPartitioner, distance_sq};
use crate::{Label, Result};

/// Configuration for [`AffinityPropagation`].
#[derive(Debug, Clone)]
pub struct AffinityConfig {
    /// Damping factor in [0.5, 1.0). Higher is slower but more stable.
    /// Default: 0.95
    pub damping: f64,
    /// Maximum number of message-passing iterations.
    /// Default: 200
    pub max_iterations: usize,
    /// Iterations with an unchanged exemplar set before stopping.
    /// Default: 15
    pub convergence_iterations: usize,
    /// Self-similarity. None = median of pairwise similarities.
    pub preference: Option<f64>,
    /// Seed for the tie-breaking noise added to similarities.
    pub seed: u64,
}

impl Default for AffinityConfig {
    fn default() -> Self {
        Self {
            damping: 0.95,
            max_iterations: 200,
            convergence_iterations: 15,
            preference: None,
            seed: 0,
        }
    }
}

/// Exemplar-based initial partitioner.
#[derive(Debug, Clone, Default)]
pub struct AffinityPropagation {
    pub config: AffinityConfig,
}

impl AffinityPropagation {
    pub fn new(config: AffinityConfig) -> Self {
        Self { config }
    }
}

impl InitialPartitioner for AffinityPropagation {
    fn partition(&self, points: &[Coord<f64>]) -> Result<Vec<Label>> {
        let n = points.len();
        if n <= 1 {
            return Ok(vec![0; n]);
        }

        let similarity = self.similarity_matrix(points);
        let Some(exemplars) = self.find_exemplars(&similarity, n) else {
            warn!(
                "[Cluster] Affinity propagation did not converge within {} iterations for {} points, using a single group",
                self.config.max_iterations, n
            );
            return Ok(vec![0; n]);
        };

        Ok(assign_to_exemplars(&similarity, n, &exemplars))
    }
}

impl AffinityPropagation {
    /// Negative squared distances with the preference on the diagonal and a
    /// little seeded noise to break ties between identical points.
    fn similarity_matrix(&self, points: &[Coord<f64>]) -> Vec<f64> {
        let n = points.len();
        let mut s = vec![0.0; n * n];
        let mut off_diagonal = Vec::with_capacity(n * (n - 1));

        for i in 0..n {
            for k in 0..n {
                if i != k {
                    let value = -distance_sq(points[i], points[k]);
                    s[i * n + k] = value;
                    off_diagonal.push(value);
                }
            }
        }

        let preference = self
            .config
            .preference
            .unwrap_or_else(|| median(&mut off_diagonal));
        for i in 0..n {
            s[i * n + i] = preference;
        }

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        for value in s.iter_mut() {
            let noise: f64 = rng.gen_range(-1.0..1.0);
            *value += (f64::EPSILON * *value + f64::MIN_POSITIVE * 100.0) * noise;
        }
        s
    }

    /// Exemplar indices once the set has been stable and non-empty for
    /// `convergence_iterations` rounds; `None` if that never happens.
    fn find_exemplars(&self, s: &[f64], n: usize) -> Option<Vec<usize>> {
        let damping = self.config.damping;
        let mut r = vec![0.0; n * n];
        let mut a = vec![0.0; n * n];
        let mut exemplars: Vec<usize> = Vec::new();
        let mut stable_for = 0;

        for iteration in 0..self.config.max_iterations {
            // Responsibilities
            for i in 0..n {
                let row = i * n;
                let mut best = f64::NEG_INFINITY;
                let mut second = f64::NEG_INFINITY;
                let mut best_k = 0;
                for k in 0..n {
                    let value = a[row + k] + s[row + k];
                    if value > best {
                        second = best;
                        best = value;
                        best_k = k;
                    } else if value > second {
                        second = value;
                    }
                }
                for k in 0..n {
                    let competitor = if k == best_k { second } else { best };
                    let update = s[row + k] - competitor;
                    r[row + k] = damping * r[row + k] + (1.0 - damping) * update;
                }
            }

            // Availabilities
            for k in 0..n {
                let column_sum: f64 = (0..n)
                    .map(|i| {
                        let value = r[i * n + k];
                        if i == k { value } else { value.max(0.0) }
                    })
                    .sum();
                for i in 0..n {
                    let own = r[i * n + k];
                    let update = if i == k {
                        column_sum - own
                    } else {
                        (column_sum - own.max(0.0)).min(0.0)
                    };
                    a[i * n + k] = damping * a[i * n + k] + (1.0 - damping) * update;
                }
            }

            let current: Vec<usize> = (0..n)
                .filter(|&k| a[k * n + k] + r[k * n + k] > 0.0)
                .collect();

            if current == exemplars {
                stable_for += 1;
            } else {
                stable_for = 0;
                exemplars = current;
            }

            if !exemplars.is_empty() && stable_for >= self.config.convergence_iterations {
                info!(
                    "[Cluster] Affinity propagation converged after {} iterations with {} exemplars",
                    iteration + 1,
                    exemplars.len()
                );
                return Some(exemplars);
            }
        }

        None
    }
}

/// Label every point with the rank of its most similar exemplar.
fn assign_to_exemplars(s: &[f64], n: usize, exemplars: &[usize]) -> Vec<Label> {
    (0..n)
        .map(|i| {
            if let Some(rank) = exemplars.iter().position(|&e| e == i) {
                return rank;
            }
            let mut best_rank = 0;
            let mut best = f64::NEG_INFINITY;
            for (rank, &e) in exemplars.iter().enumerate() {
                let value = s[i * n + e];
                if value > best {
                    best = value;
                    best_rank = rank;
                }
            }
            best_rank
        })
        .collect()
}

fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_even_and_odd() {
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&mut [4.0, 1.0, 3.0, 2.0]), 2.5);
    }

    #[test]
    fn test_assign_to_exemplars_prefers_most_similar() {
        // Two exemplars (0 and 2); point 1 is closer to exemplar 2.
        let s = vec![
            0.0, -4.0, -9.0, //
            -4.0, 0.0, -1.0, //
            -9.0, -1.0, 0.0,
        ];
        assert_eq!(assign_to_exemplars(&s, 3, &[0, 2]), vec![0, 1, 1]);
    }
}
