//! # Meetup
//!
//! Partition geographically distributed users into meetup groups whose sizes
//! fall inside a requested occupancy range, then pick a meeting point per group.
//!
//! This library provides:
//! - An initial, unconstrained spatial partition (affinity propagation)
//! - Size balancing: splitting oversized groups and merging undersized ones
//! - Meeting point generation (centroid, street-snapped centroid, landmark)
//! - A flat per-user result table and a per-group report
//! - A run-scoped on-disk cache for expensive intermediate results
//!
//! ## Quick Start
//!
//! ```rust
//! use meetup::{
//!     AffinityPropagation, CapacitatedKMeans, LatLng, Pipeline, RefinementConfig, UserSet,
//!     format_results, generate_meeting_points,
//! };
//!
//! let users = UserSet::from_locations(vec![
//!     ("alice".to_string(), LatLng::new(51.5074, -0.1278)),
//!     ("bob".to_string(), LatLng::new(51.5080, -0.1290)),
//!     ("carol".to_string(), LatLng::new(51.5090, -0.1300)),
//! ])
//! .unwrap();
//!
//! let initial = AffinityPropagation::default();
//! let capacitated = CapacitatedKMeans::default();
//! let pipeline = Pipeline::new(&initial, &capacitated);
//!
//! let config = RefinementConfig::default().with_max_occupancy(2);
//! let labeling = pipeline.run_clustering(&users, &config).unwrap();
//! let meeting_points = generate_meeting_points(&labeling, None).unwrap();
//! let rows = format_results(&labeling, &meeting_points);
//! assert_eq!(rows.len(), 3);
//! ```

use geo::Coord;
use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{MeetupError, OptionExt, Result};

// Projection, centroids, hulls and distances
pub mod geo_utils;
pub use geo_utils::LocalProjection;

// Labeled point sets and label bookkeeping
pub mod labeling;
pub use labeling::{Labeling, compact_labels};

// Clustering primitives (initial and capacitated partitioners)
pub mod partition;
pub use partition::{
    AffinityConfig, AffinityPropagation, CapacitatedKMeans, CapacitatedPartitioner,
    InitialPartitioner, KMeansConfig,
};

// k-nearest-neighbour search over group centroids
pub mod spatial_index;
pub use spatial_index::{CentroidIndex, NearestNeighborIndex};

// Size balancing: split, merge and the refinement loop
pub mod refine;
pub use refine::{
    DEFAULT_MAX_ITERS, RefinementConfig, RefinementOutcome, RefinementState, improve, merge, split,
};

// Meeting point strategies and the street network
pub mod meeting_points;
pub use meeting_points::{
    FileNetworkProvider, LandmarkLookup, MeetingPointMethod, MeetingPointResolver, MeetingPoints,
    NetworkProvider, StreetNetwork, generate_meeting_points,
};

// Run-scoped persistent cache
pub mod cache;
pub use cache::{INITIAL_CLUSTERS_KEY, RunCache};

// CSV input loading and cleaning
pub mod input;
pub use input::{InputColumns, load_user_locations, read_user_locations};

// Flat per-user output table
pub mod results;
pub use results::{ResultRow, format_results, write_results_csv};

// Per-group report for visualisation
pub mod report;
pub use report::ClusterReport;

// Initial partition + refinement entry point
pub mod pipeline;
pub use pipeline::Pipeline;

// Deterministic synthetic point sets for tests and benchmarks
pub mod synthetic;

// ============================================================================
// Core Types
// ============================================================================

/// Group assignment of a point.
pub type Label = usize;

/// A geographic coordinate in degrees (WGS84).
///
/// # Example
/// ```
/// use meetup::LatLng;
/// let point = LatLng::new(51.5074, -0.1278); // London
/// assert!(point.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

impl LatLng {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// Geographic bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Create bounds from geographic points.
    pub fn from_points(points: &[LatLng]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let mut min_lat = f64::MAX;
        let mut max_lat = f64::MIN;
        let mut min_lng = f64::MAX;
        let mut max_lng = f64::MIN;

        for p in points {
            min_lat = min_lat.min(p.latitude);
            max_lat = max_lat.max(p.latitude);
            min_lng = min_lng.min(p.longitude);
            max_lng = max_lng.max(p.longitude);
        }

        Some(Self {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        })
    }

    /// Check whether a point lies inside the bounds (edges inclusive).
    pub fn contains(&self, point: &LatLng) -> bool {
        point.latitude >= self.min_lat
            && point.latitude <= self.max_lat
            && point.longitude >= self.min_lng
            && point.longitude <= self.max_lng
    }
}

/// A user positioned in the local projected plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedUser {
    pub user_id: String,
    /// Projected position in metres
    pub position: Coord<f64>,
}

/// A labeled point: identity and position are fixed, only the label moves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub user_id: String,
    /// Projected position in metres
    pub position: Coord<f64>,
    /// Current group assignment
    pub label: Label,
}

impl Point {
    pub fn new(user_id: impl Into<String>, position: Coord<f64>, label: Label) -> Self {
        Self {
            user_id: user_id.into(),
            position,
            label,
        }
    }
}

/// Cleaned users together with the projection used to place them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSet {
    pub projection: LocalProjection,
    pub users: Vec<ProjectedUser>,
}

impl UserSet {
    /// Project geographic user locations around their mean position.
    ///
    /// Fails with [`MeetupError::EmptyInput`] if `locations` is empty and
    /// [`MeetupError::InvalidRecord`] if a coordinate is out of range.
    pub fn from_locations(locations: Vec<(String, LatLng)>) -> Result<Self> {
        if locations.is_empty() {
            return Err(MeetupError::EmptyInput);
        }
        for (index, (user_id, location)) in locations.iter().enumerate() {
            if !location.is_valid() {
                return Err(MeetupError::InvalidRecord {
                    line: index as u64 + 1,
                    reason: format!("user '{}' has an out of range coordinate", user_id),
                });
            }
        }

        let coords: Vec<LatLng> = locations.iter().map(|(_, l)| *l).collect();
        let projection = LocalProjection::around(&coords);
        let users = locations
            .into_iter()
            .map(|(user_id, location)| ProjectedUser {
                user_id,
                position: projection.project(location),
            })
            .collect();

        Ok(Self { projection, users })
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Projected positions in user order.
    pub fn positions(&self) -> Vec<Coord<f64>> {
        self.users.iter().map(|u| u.position).collect()
    }

    /// Geographic bounding box of all users.
    pub fn bounds(&self) -> Option<Bounds> {
        let points: Vec<LatLng> = self
            .users
            .iter()
            .map(|u| self.projection.unproject(u.position))
            .collect();
        Bounds::from_points(&points)
    }
}
