//! Geographic utilities: local projection, distances, group centroids and hulls.

use std::collections::BTreeMap;

use geo::{Centroid, ConvexHull, Coord, MultiPoint, Point as GeoPoint, Polygon};
use serde::{Deserialize, Serialize};

use crate::{Label, LatLng, Point};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Equirectangular projection into a local metric plane.
///
/// Positions are expressed in meters east (`x`) and north (`y`) of `origin`.
/// Distances are accurate to well under a percent across a city, which is
/// all the grouping algorithms need. `project` and `unproject` are exact
/// inverses of each other.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalProjection {
    pub origin: LatLng,
}

impl Default for LocalProjection {
    fn default() -> Self {
        Self {
            origin: LatLng::new(0.0, 0.0),
        }
    }
}

impl LocalProjection {
    pub fn new(origin: LatLng) -> Self {
        Self { origin }
    }

    /// Projection centred on the mean position of `points`.
    pub fn around(points: &[LatLng]) -> Self {
        Self::new(compute_center(points))
    }

    fn meters_per_radian_lng(&self) -> f64 {
        let scale = EARTH_RADIUS_METERS * self.origin.latitude.to_radians().cos();
        if scale.abs() < 1e-10 { 1e-10 } else { scale }
    }

    /// Geographic coordinate to local meters.
    pub fn project(&self, point: LatLng) -> Coord<f64> {
        Coord {
            x: (point.longitude - self.origin.longitude).to_radians() * self.meters_per_radian_lng(),
            y: (point.latitude - self.origin.latitude).to_radians() * EARTH_RADIUS_METERS,
        }
    }

    /// Local meters back to a geographic coordinate.
    pub fn unproject(&self, coord: Coord<f64>) -> LatLng {
        LatLng::new(
            self.origin.latitude + (coord.y / EARTH_RADIUS_METERS).to_degrees(),
            self.origin.longitude + (coord.x / self.meters_per_radian_lng()).to_degrees(),
        )
    }
}

/// Calculate the great-circle distance between two points in meters.
pub fn haversine_distance(a: &LatLng, b: &LatLng) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlng = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * h.sqrt().asin()
}

/// Mean position of a set of geographic points. Returns (0, 0) when empty.
pub fn compute_center(points: &[LatLng]) -> LatLng {
    if points.is_empty() {
        return LatLng::new(0.0, 0.0);
    }
    let n = points.len() as f64;
    let lat = points.iter().map(|p| p.latitude).sum::<f64>() / n;
    let lng = points.iter().map(|p| p.longitude).sum::<f64>() / n;
    LatLng::new(lat, lng)
}

/// Positions of every point, grouped by label.
pub fn group_positions(points: &[Point]) -> BTreeMap<Label, Vec<Coord<f64>>> {
    let mut groups: BTreeMap<Label, Vec<Coord<f64>>> = BTreeMap::new();
    for point in points {
        groups.entry(point.label).or_default().push(point.position);
    }
    groups
}

fn to_multi_point(coords: Vec<Coord<f64>>) -> MultiPoint<f64> {
    coords.into_iter().map(GeoPoint::from).collect()
}

/// Centroid of each group's point multiset, keyed by label.
pub fn group_centroids(points: &[Point]) -> BTreeMap<Label, Coord<f64>> {
    group_positions(points)
        .into_iter()
        .filter_map(|(label, coords)| to_multi_point(coords).centroid().map(|c| (label, c.0)))
        .collect()
}

/// Convex hull around each group, keyed by label.
pub fn group_hulls(points: &[Point]) -> BTreeMap<Label, Polygon<f64>> {
    group_positions(points)
        .into_iter()
        .map(|(label, coords)| (label, to_multi_point(coords).convex_hull()))
        .collect()
}
