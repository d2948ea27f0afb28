//! Tests for meeting point strategies and street network snapping

use std::cell::Cell;
use std::io::Write;

use geo::Coord;
use meetup::meeting_points::{CachedNetworkProvider, NetworkNode, network_cache_key};
use meetup::synthetic::square_cluster;
use meetup::{
    Bounds, FileNetworkProvider, LandmarkLookup, LatLng, Labeling, LocalProjection,
    MeetingPointMethod, MeetingPointResolver, MeetingPoints, MeetupError, NetworkProvider,
    RunCache, StreetNetwork, generate_meeting_points,
};
use tempfile::{NamedTempFile, TempDir};

fn two_squares() -> Labeling {
    let mut points = square_cluster("a", 0.0, 0.0, 10.0, 0);
    points.extend(square_cluster("b", 100.0, 0.0, 10.0, 1));
    Labeling::planar(points)
}

struct FixedNetwork {
    nodes: Vec<NetworkNode>,
    calls: Cell<usize>,
}

impl FixedNetwork {
    fn new(positions: &[(f64, f64)]) -> Self {
        let nodes = positions
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| NetworkNode {
                id: i as u64,
                position: Coord { x, y },
            })
            .collect();
        Self {
            nodes,
            calls: Cell::new(0),
        }
    }
}

impl NetworkProvider for FixedNetwork {
    fn fetch(
        &self,
        _bounds: &Bounds,
        mode: &str,
        _projection: &LocalProjection,
    ) -> meetup::Result<StreetNetwork> {
        self.calls.set(self.calls.get() + 1);
        Ok(StreetNetwork::new(mode, self.nodes.clone()))
    }
}

struct ShiftedLandmarks;

impl LandmarkLookup for ShiftedLandmarks {
    fn landmarks_near(&self, centroids: &MeetingPoints) -> meetup::Result<MeetingPoints> {
        Ok(centroids
            .iter()
            .map(|(label, c)| (*label, Coord { x: c.x + 1.0, y: c.y }))
            .collect())
    }
}

#[test]
fn test_centroid_is_default_method() {
    let labeling = two_squares();

    let default = generate_meeting_points(&labeling, None).unwrap();
    let explicit = generate_meeting_points(&labeling, Some(MeetingPointMethod::Centroid)).unwrap();

    assert_eq!(default, explicit);
    assert_eq!(default.len(), 2);
    assert!((default[&0].x - 0.0).abs() < 1e-9);
    assert!((default[&1].x - 100.0).abs() < 1e-9);
}

#[test]
fn test_snapping_requires_network_provider() {
    let result = generate_meeting_points(
        &two_squares(),
        Some(MeetingPointMethod::CentroidSnappedToStreet),
    );
    assert!(matches!(result, Err(MeetupError::MissingCapability { .. })));
}

#[test]
fn test_snapping_moves_to_nearest_node() {
    let network = FixedNetwork::new(&[(3.0, 4.0), (90.0, 2.0), (500.0, 500.0)]);
    let resolver = MeetingPointResolver::new().with_network(&network);

    let points = resolver
        .resolve(&two_squares(), Some(MeetingPointMethod::CentroidSnappedToStreet))
        .unwrap();

    assert_eq!(points[&0], Coord { x: 3.0, y: 4.0 });
    assert_eq!(points[&1], Coord { x: 90.0, y: 2.0 });
    assert_eq!(network.calls.get(), 1);
}

#[test]
fn test_snap_on_empty_network_fails() {
    let network = StreetNetwork::new("bike", vec![]);
    let points: MeetingPoints = [(0, Coord { x: 0.0, y: 0.0 })].into_iter().collect();
    assert!(matches!(network.snap(&points), Err(MeetupError::EmptyNetwork)));
}

#[test]
fn test_landmark_without_lookup_falls_back_to_centroids() {
    let labeling = two_squares();

    let landmarks = generate_meeting_points(&labeling, Some(MeetingPointMethod::Landmark)).unwrap();

    assert_eq!(landmarks, labeling.centroids());
}

#[test]
fn test_landmark_uses_lookup() {
    let labeling = two_squares();
    let resolver = MeetingPointResolver::new().with_landmarks(&ShiftedLandmarks);

    let points = resolver
        .resolve(&labeling, Some(MeetingPointMethod::Landmark))
        .unwrap();

    assert!((points[&0].x - 1.0).abs() < 1e-9);
    assert!((points[&1].x - 101.0).abs() < 1e-9);
}

#[test]
fn test_method_parsing() {
    assert_eq!("centroid".parse::<MeetingPointMethod>().unwrap(), MeetingPointMethod::Centroid);
    assert_eq!(
        "centroid-snapped-to-street".parse::<MeetingPointMethod>().unwrap(),
        MeetingPointMethod::CentroidSnappedToStreet
    );
    assert_eq!("Landmark".parse::<MeetingPointMethod>().unwrap(), MeetingPointMethod::Landmark);
    assert!("teleport".parse::<MeetingPointMethod>().is_err());

    for method in [
        MeetingPointMethod::Centroid,
        MeetingPointMethod::CentroidSnappedToStreet,
        MeetingPointMethod::Landmark,
    ] {
        assert_eq!(method.to_string().parse::<MeetingPointMethod>().unwrap(), method);
    }
}

#[test]
fn test_file_network_keeps_nodes_in_bounds() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"nodes": [
            {{"id": 1, "lat": 51.50, "lng": -0.12}},
            {{"id": 2, "lat": 51.51, "lng": -0.11}},
            {{"id": 3, "lat": 48.85, "lng": 2.35}}
        ]}}"#
    )
    .unwrap();

    let bounds = Bounds::from_points(&[LatLng::new(51.49, -0.13), LatLng::new(51.52, -0.10)])
        .unwrap();
    let projection = LocalProjection::new(LatLng::new(51.50, -0.12));

    let network = FileNetworkProvider::new(file.path())
        .fetch(&bounds, "walk", &projection)
        .unwrap();

    assert_eq!(network.mode, "walk");
    assert_eq!(network.len(), 2);
    assert_eq!(network.nodes[0].id, 1);
    assert!(network.nodes[0].position.x.abs() < 1e-6);
}

#[test]
fn test_file_network_without_nodes_in_bounds() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, r#"{{"nodes": [{{"id": 3, "lat": 48.85, "lng": 2.35}}]}}"#).unwrap();

    let bounds = Bounds::from_points(&[LatLng::new(51.49, -0.13), LatLng::new(51.52, -0.10)])
        .unwrap();
    let result = FileNetworkProvider::new(file.path()).fetch(
        &bounds,
        "bike",
        &LocalProjection::default(),
    );

    assert!(matches!(result, Err(MeetupError::EmptyNetwork)));
}

#[test]
fn test_cached_network_fetched_once() {
    let dir = TempDir::new().unwrap();
    let cache = RunCache::open(dir.path(), "run").unwrap();
    let inner = FixedNetwork::new(&[(1.0, 1.0)]);
    let provider = CachedNetworkProvider::new(&inner, &cache);
    let bounds = Bounds::from_points(&[LatLng::new(51.49, -0.13), LatLng::new(51.52, -0.10)])
        .unwrap();
    let projection = LocalProjection::default();

    let first = provider.fetch(&bounds, "bike", &projection).unwrap();
    let second = provider.fetch(&bounds, "bike", &projection).unwrap();

    assert_eq!(first, second);
    assert_eq!(inner.calls.get(), 1);
    assert!(cache.contains(&network_cache_key(&bounds, "bike")));

    provider.fetch(&bounds, "walk", &projection).unwrap();
    assert_eq!(inner.calls.get(), 2);
}
