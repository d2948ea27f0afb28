//! Nearest-neighbour search over group centroids.
//!
//! Uses an R-tree bulk-loaded from the current centroids. The index is
//! rebuilt from scratch on every merge pass; there is no incremental update.

use geo::Coord;
use rstar::{AABB, PointDistance, RTree, RTreeObject};

use crate::Label;

/// k-nearest-neighbour lookup over labeled centroids.
pub trait NearestNeighborIndex: Sized {
    /// Build an index over `(label, centroid)` pairs.
    fn build(centroids: &[(Label, Coord<f64>)]) -> Self;

    /// Labels of the `k` centroids closest to `point`, closest first.
    /// Returns fewer than `k` labels when the index is smaller.
    fn query(&self, point: Coord<f64>, k: usize) -> Vec<Label>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A group centroid with its label for R-tree queries
#[derive(Debug, Clone, Copy)]
pub struct IndexedCentroid {
    pub label: Label,
    pub x: f64,
    pub y: f64,
}

impl RTreeObject for IndexedCentroid {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.x, self.y])
    }
}

impl PointDistance for IndexedCentroid {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.x - point[0];
        let dy = self.y - point[1];
        dx * dx + dy * dy
    }
}

/// R-tree backed centroid index.
#[derive(Debug)]
pub struct CentroidIndex {
    tree: RTree<IndexedCentroid>,
}

impl NearestNeighborIndex for CentroidIndex {
    fn build(centroids: &[(Label, Coord<f64>)]) -> Self {
        let entries: Vec<IndexedCentroid> = centroids
            .iter()
            .map(|(label, c)| IndexedCentroid {
                label: *label,
                x: c.x,
                y: c.y,
            })
            .collect();
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    fn query(&self, point: Coord<f64>, k: usize) -> Vec<Label> {
        self.tree
            .nearest_neighbor_iter(&[point.x, point.y])
            .take(k)
            .map(|entry| entry.label)
            .collect()
    }

    fn len(&self) -> usize {
        self.tree.size()
    }
}
