//! Per-group run report for visualisation.
//!
//! Everything is expressed in geographic coordinates so a map viewer can
//! draw group hulls and meeting points directly.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::geo_utils::group_hulls;
use crate::meeting_points::MeetingPoints;
use crate::{Label, LatLng, Labeling, Result};

/// Number of bins in the group size histogram.
pub const HISTOGRAM_BINS: usize = 20;

/// Summary of one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub label: Label,
    pub occupancy: usize,
    pub centroid: LatLng,
    pub meeting_point: Option<LatLng>,
    /// Closed convex hull ring around the group's members
    pub hull: Vec<LatLng>,
    pub members: Vec<String>,
}

/// One bar of the group size histogram. `upper` is exclusive except for the last bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Report over a finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterReport {
    pub run_name: String,
    pub user_count: usize,
    pub group_count: usize,
    pub smallest_group: usize,
    pub largest_group: usize,
    pub groups: Vec<GroupSummary>,
    pub size_histogram: Vec<HistogramBin>,
}

impl ClusterReport {
    pub fn build(run_name: &str, labeling: &Labeling, meeting_points: &MeetingPoints) -> Self {
        let projection = labeling.projection();
        let centroids = labeling.centroids();
        let hulls = group_hulls(labeling.points());

        let groups: Vec<GroupSummary> = labeling
            .occupancy()
            .into_iter()
            .map(|(label, occupancy)| GroupSummary {
                label,
                occupancy,
                centroid: centroids
                    .get(&label)
                    .map(|c| projection.unproject(*c))
                    .unwrap_or(projection.origin),
                meeting_point: meeting_points.get(&label).map(|c| projection.unproject(*c)),
                hull: hulls
                    .get(&label)
                    .map(|hull| {
                        hull.exterior()
                            .coords()
                            .map(|c| projection.unproject(*c))
                            .collect()
                    })
                    .unwrap_or_default(),
                members: labeling.members(label).map(|p| p.user_id.clone()).collect(),
            })
            .collect();

        let sizes: Vec<usize> = groups.iter().map(|g| g.occupancy).collect();

        Self {
            run_name: run_name.to_string(),
            user_count: labeling.len(),
            group_count: groups.len(),
            smallest_group: sizes.iter().copied().min().unwrap_or(0),
            largest_group: sizes.iter().copied().max().unwrap_or(0),
            size_histogram: size_histogram(&sizes, HISTOGRAM_BINS),
            groups,
        }
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }
}

/// Equal-width histogram of group sizes over `[min, max]`.
///
/// When every group has the same size the range is widened by half a unit
/// on each side so the single value lands in a bin.
pub fn size_histogram(sizes: &[usize], bins: usize) -> Vec<HistogramBin> {
    if sizes.is_empty() || bins == 0 {
        return Vec::new();
    }
    let mut lower = sizes.iter().copied().min().unwrap_or(0) as f64;
    let mut upper = sizes.iter().copied().max().unwrap_or(0) as f64;
    if lower == upper {
        lower -= 0.5;
        upper += 0.5;
    }
    let width = (upper - lower) / bins as f64;

    let mut histogram: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            lower: lower + width * i as f64,
            upper: lower + width * (i + 1) as f64,
            count: 0,
        })
        .collect();

    for &size in sizes {
        let bin = (((size as f64 - lower) / width) as usize).min(bins - 1);
        histogram[bin].count += 1;
    }
    histogram
}
