//! Street networks and snapping meeting points onto them.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use geo::Coord;
use log::info;
use rstar::{AABB, PointDistance, RTree, RTreeObject};
use serde::{Deserialize, Serialize};

use super::MeetingPoints;
use crate::cache::RunCache;
use crate::geo_utils::LocalProjection;
use crate::{Bounds, LatLng, MeetupError, Result};

/// Default travel mode for street networks.
pub const DEFAULT_NETWORK_MODE: &str = "bike";

/// A node of the street graph in projected coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkNode {
    pub id: u64,
    pub position: Coord<f64>,
}

/// The intersections of a street network covering the users' bounding box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreetNetwork {
    /// Travel mode the network was built for (e.g. "bike")
    pub mode: String,
    pub nodes: Vec<NetworkNode>,
}

#[derive(Debug, Clone, Copy)]
struct IndexedNode {
    idx: usize,
    x: f64,
    y: f64,
}

impl RTreeObject for IndexedNode {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.x, self.y])
    }
}

impl PointDistance for IndexedNode {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.x - point[0];
        let dy = self.y - point[1];
        dx * dx + dy * dy
    }
}

impl StreetNetwork {
    pub fn new(mode: impl Into<String>, nodes: Vec<NetworkNode>) -> Self {
        Self {
            mode: mode.into(),
            nodes,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Move every point onto its nearest network node.
    pub fn snap(&self, points: &MeetingPoints) -> Result<MeetingPoints> {
        if self.nodes.is_empty() {
            return Err(MeetupError::EmptyNetwork);
        }

        let tree = RTree::bulk_load(
            self.nodes
                .iter()
                .enumerate()
                .map(|(idx, node)| IndexedNode {
                    idx,
                    x: node.position.x,
                    y: node.position.y,
                })
                .collect(),
        );

        points
            .iter()
            .map(|(label, point)| {
                tree.nearest_neighbor(&[point.x, point.y])
                    .map(|nearest| (*label, self.nodes[nearest.idx].position))
                    .ok_or(MeetupError::EmptyNetwork)
            })
            .collect()
    }
}

/// Source of street networks for a bounding box and travel mode.
pub trait NetworkProvider {
    fn fetch(
        &self,
        bounds: &Bounds,
        mode: &str,
        projection: &LocalProjection,
    ) -> Result<StreetNetwork>;
}

impl<P: NetworkProvider + ?Sized> NetworkProvider for &P {
    fn fetch(
        &self,
        bounds: &Bounds,
        mode: &str,
        projection: &LocalProjection,
    ) -> Result<StreetNetwork> {
        (**self).fetch(bounds, mode, projection)
    }
}

#[derive(Debug, Deserialize)]
struct NodeExport {
    nodes: Vec<ExportedNode>,
}

#[derive(Debug, Deserialize)]
struct ExportedNode {
    id: u64,
    lat: f64,
    lng: f64,
}

/// Reads street nodes from a JSON export: `{"nodes": [{"id", "lat", "lng"}, ...]}`.
///
/// Only nodes inside the requested bounds are kept.
#[derive(Debug, Clone)]
pub struct FileNetworkProvider {
    path: PathBuf,
}

impl FileNetworkProvider {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl NetworkProvider for FileNetworkProvider {
    fn fetch(
        &self,
        bounds: &Bounds,
        mode: &str,
        projection: &LocalProjection,
    ) -> Result<StreetNetwork> {
        info!(
            "[MeetingPoints] Getting {} network for region {:?} from {}",
            mode,
            bounds,
            self.path.display()
        );
        let file = File::open(&self.path)?;
        let export: NodeExport = serde_json::from_reader(BufReader::new(file))?;

        let nodes: Vec<NetworkNode> = export
            .nodes
            .into_iter()
            .map(|node| (node.id, LatLng::new(node.lat, node.lng)))
            .filter(|(_, location)| bounds.contains(location))
            .map(|(id, location)| NetworkNode {
                id,
                position: projection.project(location),
            })
            .collect();

        if nodes.is_empty() {
            return Err(MeetupError::EmptyNetwork);
        }
        Ok(StreetNetwork::new(mode, nodes))
    }
}

/// Wraps a provider with the run cache so each network is fetched once per run.
pub struct CachedNetworkProvider<'a, P> {
    inner: P,
    cache: &'a RunCache,
}

impl<'a, P: NetworkProvider> CachedNetworkProvider<'a, P> {
    pub fn new(inner: P, cache: &'a RunCache) -> Self {
        Self { inner, cache }
    }
}

/// Cache key for a network, derived from its mode and bounds.
pub fn network_cache_key(bounds: &Bounds, mode: &str) -> String {
    format!(
        "network_{}_{:.5}_{:.5}_{:.5}_{:.5}",
        mode, bounds.min_lat, bounds.min_lng, bounds.max_lat, bounds.max_lng
    )
}

impl<P: NetworkProvider> NetworkProvider for CachedNetworkProvider<'_, P> {
    fn fetch(
        &self,
        bounds: &Bounds,
        mode: &str,
        projection: &LocalProjection,
    ) -> Result<StreetNetwork> {
        let key = network_cache_key(bounds, mode);
        if let Some(network) = self.cache.get_network(&key)? {
            info!("[Cache] Loaded {} network from cache", mode);
            return Ok(network);
        }
        let network = self.inner.fetch(bounds, mode, projection)?;
        self.cache.put_network(&key, &network)?;
        Ok(network)
    }
}
