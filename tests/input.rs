//! Tests for loading and cleaning user locations

use std::collections::BTreeMap;
use std::io::Write;

use meetup::input::clean_user_locations;
use meetup::{InputColumns, LatLng, MeetupError, load_user_locations, read_user_locations};
use tempfile::NamedTempFile;

fn read(csv: &str) -> meetup::Result<meetup::UserSet> {
    read_user_locations(csv.as_bytes(), &InputColumns::default())
}

#[test]
fn test_reads_users_and_projects_them() {
    let users = read(
        "user_id,latitude,longitude\n\
         alice,51.5074,-0.1278\n\
         bob,51.5080,-0.1290\n",
    )
    .unwrap();

    assert_eq!(users.len(), 2);
    let ids: Vec<&str> = users.users.iter().map(|u| u.user_id.as_str()).collect();
    assert_eq!(ids, vec!["alice", "bob"]);
    assert!((users.projection.origin.latitude - 51.5077).abs() < 1e-9);

    let alice = users.projection.unproject(users.users[0].position);
    assert!((alice.latitude - 51.5074).abs() < 1e-9);
    assert!((alice.longitude + 0.1278).abs() < 1e-9);
}

#[test]
fn test_custom_columns_and_extra_fields() {
    let columns = InputColumns {
        user_id: "id".to_string(),
        latitude: "lat".to_string(),
        longitude: "lon".to_string(),
    };
    let csv = "name,lon,id,lat\n x , -0.12 , u1 , 51.5 \n";

    let users = read_user_locations(csv.as_bytes(), &columns).unwrap();

    assert_eq!(users.len(), 1);
    assert_eq!(users.users[0].user_id, "u1");
}

#[test]
fn test_missing_column() {
    let result = read("user_id,lat,longitude\nalice,51.5,-0.12\n");

    match result {
        Err(MeetupError::MissingColumn { column }) => assert_eq!(column, "latitude"),
        other => panic!("expected MissingColumn, got {:?}", other),
    }
}

#[test]
fn test_unparseable_coordinate_reports_line() {
    let result = read("user_id,latitude,longitude\nalice,51.5,-0.12\nbob,north,-0.12\n");

    match result {
        Err(MeetupError::InvalidRecord { line, reason }) => {
            assert_eq!(line, 3);
            assert!(reason.contains("north"));
        }
        other => panic!("expected InvalidRecord, got {:?}", other),
    }
}

#[test]
fn test_out_of_range_coordinate() {
    let result = read("user_id,latitude,longitude\nalice,95.0,-0.12\n");
    assert!(matches!(result, Err(MeetupError::InvalidRecord { line: 2, .. })));
}

#[test]
fn test_empty_user_id() {
    let result = read("user_id,latitude,longitude\n,51.5,-0.12\n");
    assert!(matches!(result, Err(MeetupError::InvalidRecord { .. })));
}

#[test]
fn test_header_only_is_empty_input() {
    let result = read("user_id,latitude,longitude\n");
    assert!(matches!(result, Err(MeetupError::EmptyInput)));
}

#[test]
fn test_duplicate_users_collapse_to_median() {
    let users = read(
        "user_id,latitude,longitude\n\
         alice,51.0,-1.0\n\
         bob,52.0,0.0\n\
         alice,53.0,-3.0\n\
         alice,52.0,-2.0\n",
    )
    .unwrap();

    assert_eq!(users.len(), 2);
    let alice = users.projection.unproject(users.users[0].position);
    assert!((alice.latitude - 52.0).abs() < 1e-9);
    assert!((alice.longitude + 2.0).abs() < 1e-9);
}

#[test]
fn test_clean_even_number_of_reports() {
    let mut reports = BTreeMap::new();
    reports.insert(
        "u".to_string(),
        vec![LatLng::new(10.0, 20.0), LatLng::new(12.0, 24.0)],
    );

    let cleaned = clean_user_locations(reports);

    assert_eq!(cleaned, vec![("u".to_string(), LatLng::new(11.0, 22.0))]);
}

#[test]
fn test_load_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "user_id,latitude,longitude").unwrap();
    writeln!(file, "a,40.7128,-74.0060").unwrap();
    writeln!(file, "b,40.7130,-74.0050").unwrap();
    writeln!(file, "c,40.7140,-74.0070").unwrap();

    let users = load_user_locations(file.path(), &InputColumns::default()).unwrap();
    assert_eq!(users.len(), 3);

    let missing = load_user_locations(file.path().with_extension("missing"), &InputColumns::default());
    assert!(matches!(missing, Err(MeetupError::Io(_))));
}
