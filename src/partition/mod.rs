//! Spatial partitioning primitives.
//!
//! The refinement engine only depends on the two traits defined here:
//! - [`InitialPartitioner`] - unconstrained clustering, one label per point
//! - [`CapacitatedPartitioner`] - split a point set into exactly `n` sub-groups
//!
//! Default implementations:
//! - [`AffinityPropagation`] - exemplar-based clustering that picks the number of groups itself
//! - [`CapacitatedKMeans`] - seeded k-means whose assignment step caps group sizes

mod affinity;
mod kmeans;

pub use affinity::{AffinityConfig, AffinityPropagation};
pub use kmeans::{CapacitatedKMeans, KMeansConfig};

use geo::Coord;

use crate::{Label, Result};

/// Unconstrained spatial clustering: one label per input point, no size guarantees.
pub trait InitialPartitioner {
    fn partition(&self, points: &[Coord<f64>]) -> Result<Vec<Label>>;
}

/// Partition a point set into exactly `n` sub-groups labeled `0..n`.
///
/// Implementations must be deterministic for a fixed configuration.
pub trait CapacitatedPartitioner {
    fn partition(&self, points: &[Coord<f64>], n: usize) -> Result<Vec<Label>>;
}

/// Squared Euclidean distance between two planar coordinates.
pub(crate) fn distance_sq(a: Coord<f64>, b: Coord<f64>) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    dx * dx + dy * dy
}
