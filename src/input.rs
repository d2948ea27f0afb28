//! Loading and cleaning user locations.
//!
//! Input is a CSV with (at least) a user id, latitude and longitude column.
//! Column names are configurable. Users that appear more than once are
//! collapsed onto the median of their reported positions.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::{info, warn};

use crate::{LatLng, MeetupError, OptionExt, Result, UserSet};

/// Names of the required input columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputColumns {
    pub user_id: String,
    pub latitude: String,
    pub longitude: String,
}

impl Default for InputColumns {
    fn default() -> Self {
        Self {
            user_id: "user_id".to_string(),
            latitude: "latitude".to_string(),
            longitude: "longitude".to_string(),
        }
    }
}

/// Load, validate, clean and project the user locations in a CSV file.
pub fn load_user_locations(path: impl AsRef<Path>, columns: &InputColumns) -> Result<UserSet> {
    let path = path.as_ref();
    info!("[Input] Loading user locations from {}", path.display());
    read_user_locations(File::open(path)?, columns)
}

/// Same as [`load_user_locations`] over any reader.
pub fn read_user_locations<R: Read>(reader: R, columns: &InputColumns) -> Result<UserSet> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let column_index = |name: &str| headers.iter().position(|h| h == name).ok_or_missing_column(name);
    let id_idx = column_index(&columns.user_id)?;
    let lat_idx = column_index(&columns.latitude)?;
    let lng_idx = column_index(&columns.longitude)?;

    let mut reports: BTreeMap<String, Vec<LatLng>> = BTreeMap::new();

    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let line = record.position().map_or(row as u64 + 2, |p| p.line());

        let user_id = record.get(id_idx).unwrap_or_default();
        if user_id.is_empty() {
            return Err(MeetupError::InvalidRecord {
                line,
                reason: format!("empty '{}'", columns.user_id),
            });
        }

        let latitude = parse_coordinate(record.get(lat_idx), &columns.latitude, line)?;
        let longitude = parse_coordinate(record.get(lng_idx), &columns.longitude, line)?;
        let location = LatLng::new(latitude, longitude);
        if !location.is_valid() {
            return Err(MeetupError::InvalidRecord {
                line,
                reason: format!("coordinate ({}, {}) is out of range", latitude, longitude),
            });
        }

        reports.entry(user_id.to_string()).or_default().push(location);
    }

    if reports.is_empty() {
        return Err(MeetupError::EmptyInput);
    }

    let locations = clean_user_locations(reports);
    info!("[Input] Found {} users", locations.len());
    UserSet::from_locations(locations)
}

fn parse_coordinate(value: Option<&str>, column: &str, line: u64) -> Result<f64> {
    let raw = value.unwrap_or_default();
    raw.parse::<f64>().map_err(|_| MeetupError::InvalidRecord {
        line,
        reason: format!("'{}' value '{}' is not a number", column, raw),
    })
}

/// Collapse repeated users onto the median of their reported positions.
///
/// Output is ordered by user id.
pub fn clean_user_locations(reports: BTreeMap<String, Vec<LatLng>>) -> Vec<(String, LatLng)> {
    let duplicated = reports.values().filter(|r| r.len() > 1).count();
    if duplicated > 0 {
        warn!(
            "[Input] Found {} users who had multiple entries in the input file. Taking their starting location to be the median of their reported locations",
            duplicated
        );
    }

    reports
        .into_iter()
        .map(|(user_id, locations)| {
            let location = if locations.len() == 1 {
                locations[0]
            } else {
                let mut lats: Vec<f64> = locations.iter().map(|l| l.latitude).collect();
                let mut lngs: Vec<f64> = locations.iter().map(|l| l.longitude).collect();
                LatLng::new(median(&mut lats), median(&mut lngs))
            };
            (user_id, location)
        })
        .collect()
}

fn median(values: &mut [f64]) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}
