//! Flat per-user result table.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::meeting_points::MeetingPoints;
use crate::{Label, Labeling, Result};

/// Separator between user ids in `potential_group_members`.
pub const MEMBER_DELIMITER: &str = ",";

/// One output row per user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub user_id: String,
    /// The user's group label
    pub start_point_id: Label,
    /// Meeting point latitude (None if the group has no meeting point)
    pub start_point_latitude: Option<f64>,
    /// Meeting point longitude (None if the group has no meeting point)
    pub start_point_longitude: Option<f64>,
    /// Every user in the group, the user itself included
    pub potential_group_members: String,
}

/// Join users, their group's meeting point and their group's member list.
///
/// Rows follow the labeling's point order. A group without a meeting point
/// still produces rows, with empty meeting point fields. Member lists keep
/// the labeling's point order and include the user the row belongs to.
pub fn format_results(labeling: &Labeling, meeting_points: &MeetingPoints) -> Vec<ResultRow> {
    let mut members: BTreeMap<Label, Vec<&str>> = BTreeMap::new();
    for point in labeling.points() {
        members
            .entry(point.label)
            .or_default()
            .push(point.user_id.as_str());
    }
    let members: BTreeMap<Label, String> = members
        .into_iter()
        .map(|(label, ids)| (label, ids.join(MEMBER_DELIMITER)))
        .collect();

    let projection = labeling.projection();

    labeling
        .points()
        .iter()
        .map(|point| {
            let location = meeting_points
                .get(&point.label)
                .map(|coord| projection.unproject(*coord));
            ResultRow {
                user_id: point.user_id.clone(),
                start_point_id: point.label,
                start_point_latitude: location.map(|l| l.latitude),
                start_point_longitude: location.map(|l| l.longitude),
                potential_group_members: members.get(&point.label).cloned().unwrap_or_default(),
            }
        })
        .collect()
}

/// Write result rows as CSV with a header line.
pub fn write_results<W: Write>(writer: W, rows: &[ResultRow]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write result rows to a CSV file.
pub fn write_results_csv(path: impl AsRef<Path>, rows: &[ResultRow]) -> Result<()> {
    write_results(File::create(path)?, rows)
}
