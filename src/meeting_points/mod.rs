//! Meeting point generation.
//!
//! One representative point per group, in the labeling's projected frame.
//! Meeting points refer back to groups by label only.

mod network;

pub use network::{
    CachedNetworkProvider, DEFAULT_NETWORK_MODE, FileNetworkProvider, NetworkNode,
    NetworkProvider, StreetNetwork, network_cache_key,
};

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use geo::Coord;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::{Label, Labeling, MeetupError, Result};

/// Meeting point per group label, in projected coordinates.
pub type MeetingPoints = BTreeMap<Label, Coord<f64>>;

/// Strategy for placing a group's meeting point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingPointMethod {
    /// The group centroid
    #[default]
    Centroid,
    /// The group centroid moved to the nearest street-network node
    CentroidSnappedToStreet,
    /// A landmark near the centroid (falls back to the centroid)
    Landmark,
}

impl MeetingPointMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeetingPointMethod::Centroid => "centroid",
            MeetingPointMethod::CentroidSnappedToStreet => "centroid_snapped_to_street",
            MeetingPointMethod::Landmark => "landmark",
        }
    }
}

impl fmt::Display for MeetingPointMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MeetingPointMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "centroid" => Ok(MeetingPointMethod::Centroid),
            "centroid_snapped_to_street" | "centroid_snapped_to_street_network" => {
                Ok(MeetingPointMethod::CentroidSnappedToStreet)
            }
            "landmark" => Ok(MeetingPointMethod::Landmark),
            other => Err(format!(
                "unknown meeting point method '{}', expected one of: centroid, centroid_snapped_to_street, landmark",
                other
            )),
        }
    }
}

/// Finds a real-world landmark near each centroid.
pub trait LandmarkLookup {
    fn landmarks_near(&self, centroids: &MeetingPoints) -> Result<MeetingPoints>;
}

/// Computes meeting points with the configured collaborators.
pub struct MeetingPointResolver<'a> {
    network: Option<&'a dyn NetworkProvider>,
    landmarks: Option<&'a dyn LandmarkLookup>,
    network_mode: String,
}

impl Default for MeetingPointResolver<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> MeetingPointResolver<'a> {
    pub fn new() -> Self {
        Self {
            network: None,
            landmarks: None,
            network_mode: DEFAULT_NETWORK_MODE.to_string(),
        }
    }

    pub fn with_network(mut self, provider: &'a dyn NetworkProvider) -> Self {
        self.network = Some(provider);
        self
    }

    pub fn with_landmarks(mut self, lookup: &'a dyn LandmarkLookup) -> Self {
        self.landmarks = Some(lookup);
        self
    }

    pub fn with_network_mode(mut self, mode: impl Into<String>) -> Self {
        self.network_mode = mode.into();
        self
    }

    /// Meeting point for every group in `labeling`. `None` means centroid.
    pub fn resolve(
        &self,
        labeling: &Labeling,
        method: Option<MeetingPointMethod>,
    ) -> Result<MeetingPoints> {
        let method = method.unwrap_or_default();
        let centroids = labeling.centroids();

        match method {
            MeetingPointMethod::Centroid => {
                info!("[MeetingPoints] Using group centroids as meeting points");
                Ok(centroids)
            }
            MeetingPointMethod::CentroidSnappedToStreet => {
                info!("[MeetingPoints] Snapping group centroids to the street network");
                let provider = self.network.ok_or_else(|| MeetupError::MissingCapability {
                    capability: "street network provider".to_string(),
                })?;
                let Some(bounds) = labeling.geographic_bounds() else {
                    return Ok(centroids);
                };
                let network = provider.fetch(&bounds, &self.network_mode, labeling.projection())?;
                network.snap(&centroids)
            }
            MeetingPointMethod::Landmark => match self.landmarks {
                Some(lookup) => {
                    info!("[MeetingPoints] Looking up landmarks near group centroids");
                    lookup.landmarks_near(&centroids)
                }
                None => {
                    warn!(
                        "[MeetingPoints] No landmark lookup configured, falling back to group centroids"
                    );
                    Ok(centroids)
                }
            },
        }
    }
}

/// Meeting points using the default resolver (no network, no landmarks).
pub fn generate_meeting_points(
    labeling: &Labeling,
    method: Option<MeetingPointMethod>,
) -> Result<MeetingPoints> {
    MeetingPointResolver::new().resolve(labeling, method)
}
