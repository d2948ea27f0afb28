//! Labeled point sets.
//!
//! A [`Labeling`] is the full assignment of users to groups at one point in
//! time. Groups are never stored: occupancy and centroids are always derived
//! by grouping points on their label. Every refinement stage takes a labeling
//! by value and returns a new one.

use std::collections::BTreeMap;

use geo::Coord;
use serde::{Deserialize, Serialize};

use crate::geo_utils::{LocalProjection, group_centroids};
use crate::{Bounds, Label, LatLng, MeetupError, Point, Result, UserSet};

/// Every point with its current group label, plus the projection that
/// relates point positions back to geographic coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Labeling {
    projection: LocalProjection,
    points: Vec<Point>,
}

impl Labeling {
    pub fn new(projection: LocalProjection, points: Vec<Point>) -> Self {
        Self { projection, points }
    }

    /// Labeling over points that are already in a planar frame.
    pub fn planar(points: Vec<Point>) -> Self {
        Self::new(LocalProjection::default(), points)
    }

    /// Attach one label per user, in user order.
    pub fn from_users(users: &UserSet, labels: Vec<Label>) -> Result<Self> {
        if labels.len() != users.len() {
            return Err(MeetupError::LabelCountMismatch {
                expected: users.len(),
                actual: labels.len(),
            });
        }
        let points = users
            .users
            .iter()
            .zip(labels)
            .map(|(user, label)| Point::new(user.user_id.clone(), user.position, label))
            .collect();
        Ok(Self::new(users.projection, points))
    }

    pub fn projection(&self) -> &LocalProjection {
        &self.projection
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn into_points(self) -> Vec<Point> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Label of every point, in point order.
    pub fn labels(&self) -> Vec<Label> {
        self.points.iter().map(|p| p.label).collect()
    }

    /// Projected positions, in point order.
    pub fn positions(&self) -> Vec<Coord<f64>> {
        self.points.iter().map(|p| p.position).collect()
    }

    /// Distinct labels in ascending order.
    pub fn distinct_labels(&self) -> Vec<Label> {
        self.occupancy().into_keys().collect()
    }

    pub fn group_count(&self) -> usize {
        self.occupancy().len()
    }

    pub fn max_label(&self) -> Option<Label> {
        self.points.iter().map(|p| p.label).max()
    }

    /// Point count per label.
    pub fn occupancy(&self) -> BTreeMap<Label, usize> {
        let mut counts = BTreeMap::new();
        for point in &self.points {
            *counts.entry(point.label).or_insert(0) += 1;
        }
        counts
    }

    pub fn occupancy_of(&self, label: Label) -> usize {
        self.points.iter().filter(|p| p.label == label).count()
    }

    /// Centroid of every group.
    pub fn centroids(&self) -> BTreeMap<Label, Coord<f64>> {
        group_centroids(&self.points)
    }

    pub fn members(&self, label: Label) -> impl Iterator<Item = &Point> {
        self.points.iter().filter(move |p| p.label == label)
    }

    pub(crate) fn member_indices(&self, label: Label) -> Vec<usize> {
        self.points
            .iter()
            .enumerate()
            .filter(|(_, p)| p.label == label)
            .map(|(i, _)| i)
            .collect()
    }

    /// Replace every label at once. `labels` must have one entry per point.
    pub(crate) fn with_labels(mut self, labels: Vec<Label>) -> Self {
        debug_assert_eq!(labels.len(), self.points.len());
        for (point, label) in self.points.iter_mut().zip(labels) {
            point.label = label;
        }
        self
    }

    /// Map every label through `remap`.
    pub fn relabel(mut self, remap: impl Fn(Label) -> Label) -> Self {
        for point in &mut self.points {
            point.label = remap(point.label);
        }
        self
    }

    /// Renumber labels to a dense `0..K-1` range, preserving their order.
    pub fn compact(self) -> Self {
        let labels = compact_labels(&self.labels());
        self.with_labels(labels)
    }

    /// Geographic position of a point.
    pub fn location_of(&self, point: &Point) -> LatLng {
        self.projection.unproject(point.position)
    }

    /// Geographic bounding box of all points.
    pub fn geographic_bounds(&self) -> Option<Bounds> {
        let locations: Vec<LatLng> = self.points.iter().map(|p| self.location_of(p)).collect();
        Bounds::from_points(&locations)
    }
}

/// Renumber sparse labels to `0..K-1`.
///
/// Distinct labels are sorted ascending and mapped to their rank, so the
/// remap is a bijection that preserves label order.
pub fn compact_labels(labels: &[Label]) -> Vec<Label> {
    let mut distinct: Vec<Label> = labels.to_vec();
    distinct.sort_unstable();
    distinct.dedup();

    let remap: BTreeMap<Label, Label> = distinct
        .into_iter()
        .enumerate()
        .map(|(new, old)| (old, new))
        .collect();

    labels.iter().map(|label| remap[label]).collect()
}
