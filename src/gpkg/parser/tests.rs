use super::*;
use crate::error::GeometryFormatError;
use crate::gpkg::testing::{gpkg_blob, two_lane_road, Fixture};

use tempfile::tempdir;

#[test]
fn parses_two_lane_road() {
    let dir = tempdir().expect("create temp dir");
    let path = dir.path().join("two_lane_road.gpkg");
    two_lane_road().write_to(&path);

    let parser = GeoPackageParser::open(&path).expect("parse");

    // Metadata.
    assert_eq!(
        parser.metadata().get("schema_version").map(String::as_str),
        Some("1.0.0")
    );
    assert_eq!(
        parser.metadata().get("linear_tolerance").map(String::as_str),
        Some("0.01")
    );

    // Junctions.
    assert_eq!(parser.junctions().len(), 1);
    assert_eq!(parser.junctions()["j1"].name, "Main Junction");

    // Segments.
    assert_eq!(parser.segments().len(), 1);
    let seg = &parser.segments()["seg1"];
    assert_eq!(seg.junction_id, "j1");
    assert_eq!(seg.name, "Straight Segment");

    // Boundaries.
    assert_eq!(parser.lane_boundaries().len(), 3);
    let left = &parser.lane_boundaries()["b_left_outer"].geometry;
    assert_eq!(left.len(), 2);
    assert_eq!(left[0], glam::DVec3::new(0.0, 3.5, 0.0));
    assert_eq!(left[1], glam::DVec3::new(100.0, 3.5, 0.0));

    // Lanes.
    assert_eq!(parser.lanes().len(), 2);
    let lane_1 = &parser.lanes()["lane_1"];
    assert_eq!(lane_1.segment_id, "seg1");
    assert_eq!(lane_1.lane_type, "driving");
    assert_eq!(lane_1.direction, "forward");
    assert_eq!(lane_1.left_boundary_id, "b_left_outer");
    assert!(!lane_1.left_boundary_inverted);
    assert_eq!(lane_1.right_boundary_id, "b_center");
    assert!(!lane_1.right_boundary_inverted);

    // Branch points, grouped by branch point id.
    assert_eq!(parser.branch_point_lanes().len(), 2);
    let bp_start = &parser.branch_point_lanes()["bp_start"];
    assert_eq!(bp_start.len(), 2);
    for entry in bp_start {
        assert_eq!(entry.side, "a");
        assert_eq!(entry.lane_end, "start");
    }

    // Adjacency, grouped by lane id.
    assert_eq!(parser.adjacent_lanes().len(), 2);
    let lane_1_adj = &parser.adjacent_lanes()["lane_1"];
    assert_eq!(lane_1_adj.len(), 1);
    assert_eq!(lane_1_adj[0].adjacent_lane_id, "lane_2");
    assert_eq!(lane_1_adj[0].side, "right");
}

#[test]
fn inverted_flags_survive_parsing() {
    let dir = tempdir().expect("create temp dir");
    let path = dir.path().join("inverted.gpkg");
    Fixture::new()
        .junction("j1", "")
        .segment("s1", "j1", "")
        .boundary("b1", &[(0.0, 0.0, 0.0), (1.0, 0.0, 0.0)])
        .boundary("b2", &[(0.0, 1.0, 0.0), (1.0, 1.0, 0.0)])
        .lane("l1", "s1", ("b2", true), ("b1", false))
        .write_to(&path);

    let parser = GeoPackageParser::open(&path).expect("parse");
    let lane = &parser.lanes()["l1"];
    assert!(lane.left_boundary_inverted);
    assert!(!lane.right_boundary_inverted);
}

#[test]
fn xyz_boundary_geometry_is_decoded() {
    let dir = tempdir().expect("create temp dir");
    let path = dir.path().join("xyz.gpkg");
    Fixture::new()
        .boundary_blob("b1", gpkg_blob(&[(0.0, 0.0, 0.0), (1.0, 2.0, 3.0)], true))
        .write_to(&path);

    let parser = GeoPackageParser::open(&path).expect("parse");
    assert_eq!(
        parser.lane_boundaries()["b1"].geometry,
        vec![glam::DVec3::new(0.0, 0.0, 0.0), glam::DVec3::new(1.0, 2.0, 3.0)]
    );
}

#[test]
fn malformed_geometry_fails_construction() {
    let dir = tempdir().expect("create temp dir");
    let path = dir.path().join("bad_geometry.gpkg");
    let mut blob = gpkg_blob(&[(0.0, 0.0, 0.0)], false);
    blob[0] = b'X';
    blob[1] = b'X';
    Fixture::new().boundary_blob("b_bad", blob).write_to(&path);

    let err = GeoPackageParser::open(&path).unwrap_err();
    match err {
        Error::GeometryFormat {
            boundary_id,
            source,
        } => {
            assert_eq!(boundary_id, "b_bad");
            assert_eq!(source, GeometryFormatError::BadMagic);
        }
        other => panic!("expected GeometryFormat error, got {other:?}"),
    }
}

#[test]
fn missing_table_fails_construction() {
    let dir = tempdir().expect("create temp dir");
    let path = dir.path().join("missing_table.gpkg");
    let conn = rusqlite::Connection::open(&path).expect("create db");
    conn.execute_batch("CREATE TABLE maliput_metadata (key TEXT, value TEXT);")
        .expect("create schema");
    drop(conn);

    let err = GeoPackageParser::open(&path).unwrap_err();
    assert!(matches!(err, Error::Query(_)));
}

#[test]
fn null_columns_parse_as_empty_strings() {
    let dir = tempdir().expect("create temp dir");
    let path = dir.path().join("nulls.gpkg");
    two_lane_road().write_to(&path);
    let conn = rusqlite::Connection::open(&path).expect("open db");
    conn.execute("INSERT INTO junctions (junction_id, name) VALUES ('j2', NULL)", [])
        .expect("insert");
    drop(conn);

    let parser = GeoPackageParser::open(&path).expect("parse");
    assert_eq!(parser.junctions()["j2"].name, "");
}

#[test]
fn empty_database_tables_parse_to_empty_maps() {
    let dir = tempdir().expect("create temp dir");
    let path = dir.path().join("empty.gpkg");
    Fixture::new().write_to(&path);

    let parser = GeoPackageParser::open(&path).expect("parse");
    assert!(parser.junctions().is_empty());
    assert!(parser.segments().is_empty());
    assert!(parser.lane_boundaries().is_empty());
    assert!(parser.lanes().is_empty());
    assert!(parser.branch_point_lanes().is_empty());
    assert!(parser.adjacent_lanes().is_empty());
}
