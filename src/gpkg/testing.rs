//! Test fixtures: GeoPackage blob encoding and on-disk fixture databases.
//!
//! The blob encoder mirrors the authoring-tool encoding (8-byte header
//! followed by packed little-endian WKB), so the decoder tests exercise the
//! same byte streams a real GeoPackage carries.

use std::path::Path;

use rusqlite::{params, Connection};

/// Encodes a GeoPackage geometry blob with no envelope.
pub(crate) fn gpkg_blob(points: &[(f64, f64, f64)], has_z: bool) -> Vec<u8> {
    gpkg_blob_with_envelope(points, has_z, 0)
}

/// Encodes a GeoPackage geometry blob with the given envelope indicator;
/// envelope bytes are zero-filled (the decoder skips them).
pub(crate) fn gpkg_blob_with_envelope(
    points: &[(f64, f64, f64)],
    has_z: bool,
    envelope_indicator: u8,
) -> Vec<u8> {
    const ENVELOPE_SIZES: [usize; 5] = [0, 32, 48, 48, 64];

    let mut blob = Vec::new();
    blob.extend_from_slice(b"GP");
    blob.push(0); // version
    blob.push(envelope_indicator << 1); // flags
    blob.extend_from_slice(&0i32.to_le_bytes()); // SRS id
    blob.resize(blob.len() + ENVELOPE_SIZES[envelope_indicator as usize], 0);

    blob.push(1); // little-endian WKB
    let wkb_type = if has_z { 2u32 | 0x8000_0000 } else { 2u32 };
    blob.extend_from_slice(&wkb_type.to_le_bytes());
    blob.extend_from_slice(&(points.len() as u32).to_le_bytes());
    for &(x, y, z) in points {
        blob.extend_from_slice(&x.to_le_bytes());
        blob.extend_from_slice(&y.to_le_bytes());
        if has_z {
            blob.extend_from_slice(&z.to_le_bytes());
        }
    }
    blob
}

const FIXTURE_SCHEMA: &str = "
    CREATE TABLE maliput_metadata (key TEXT NOT NULL, value TEXT NOT NULL);
    CREATE TABLE junctions (junction_id TEXT PRIMARY KEY, name TEXT);
    CREATE TABLE segments (segment_id TEXT PRIMARY KEY, junction_id TEXT, name TEXT);
    CREATE TABLE lane_boundaries (boundary_id TEXT PRIMARY KEY, geometry BLOB);
    CREATE TABLE lanes (
        lane_id TEXT PRIMARY KEY,
        segment_id TEXT,
        lane_type TEXT,
        direction TEXT,
        left_boundary_id TEXT,
        left_boundary_inverted INTEGER,
        right_boundary_id TEXT,
        right_boundary_inverted INTEGER
    );
    CREATE TABLE branch_point_lanes (
        branch_point_id TEXT,
        lane_id TEXT,
        side TEXT,
        lane_end TEXT
    );
    CREATE TABLE view_adjacent_lanes (lane_id TEXT, adjacent_lane_id TEXT, side TEXT);
";

/// Declarative builder for on-disk fixture databases.
#[derive(Default)]
pub(crate) struct Fixture {
    metadata: Vec<(String, String)>,
    junctions: Vec<(String, String)>,
    segments: Vec<(String, String, String)>,
    boundaries: Vec<(String, Vec<u8>)>,
    lanes: Vec<(String, String, String, bool, String, bool)>,
    branch_points: Vec<(String, String, String, String)>,
    adjacencies: Vec<(String, String, String)>,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        Self::default().metadata("schema_version", "1.0.0")
    }

    pub(crate) fn metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.push((key.into(), value.into()));
        self
    }

    pub(crate) fn junction(mut self, id: &str, name: &str) -> Self {
        self.junctions.push((id.into(), name.into()));
        self
    }

    pub(crate) fn segment(mut self, id: &str, junction_id: &str, name: &str) -> Self {
        self.segments.push((id.into(), junction_id.into(), name.into()));
        self
    }

    /// Boundary with an XY linestring geometry (z written as 0 on decode).
    pub(crate) fn boundary(self, id: &str, points: &[(f64, f64, f64)]) -> Self {
        self.boundary_blob(id, gpkg_blob(points, false))
    }

    pub(crate) fn boundary_blob(mut self, id: &str, blob: Vec<u8>) -> Self {
        self.boundaries.push((id.into(), blob));
        self
    }

    pub(crate) fn lane(
        mut self,
        id: &str,
        segment_id: &str,
        left_boundary: (&str, bool),
        right_boundary: (&str, bool),
    ) -> Self {
        self.lanes.push((
            id.into(),
            segment_id.into(),
            left_boundary.0.into(),
            left_boundary.1,
            right_boundary.0.into(),
            right_boundary.1,
        ));
        self
    }

    pub(crate) fn branch_point(mut self, bp: &str, lane: &str, side: &str, end: &str) -> Self {
        self.branch_points
            .push((bp.into(), lane.into(), side.into(), end.into()));
        self
    }

    pub(crate) fn adjacent(mut self, lane: &str, adjacent: &str, side: &str) -> Self {
        self.adjacencies
            .push((lane.into(), adjacent.into(), side.into()));
        self
    }

    pub(crate) fn write_to(&self, path: &Path) {
        let conn = Connection::open(path).expect("create fixture db");
        conn.execute_batch(FIXTURE_SCHEMA).expect("create schema");

        for (key, value) in &self.metadata {
            conn.execute(
                "INSERT INTO maliput_metadata (key, value) VALUES (?1, ?2)",
                params![key, value],
            )
            .expect("insert metadata");
        }
        for (id, name) in &self.junctions {
            conn.execute(
                "INSERT INTO junctions (junction_id, name) VALUES (?1, ?2)",
                params![id, name],
            )
            .expect("insert junction");
        }
        for (id, junction_id, name) in &self.segments {
            conn.execute(
                "INSERT INTO segments (segment_id, junction_id, name) VALUES (?1, ?2, ?3)",
                params![id, junction_id, name],
            )
            .expect("insert segment");
        }
        for (id, blob) in &self.boundaries {
            conn.execute(
                "INSERT INTO lane_boundaries (boundary_id, geometry) VALUES (?1, ?2)",
                params![id, blob],
            )
            .expect("insert boundary");
        }
        for (id, segment_id, left, left_inv, right, right_inv) in &self.lanes {
            conn.execute(
                "INSERT INTO lanes (lane_id, segment_id, lane_type, direction, \
                 left_boundary_id, left_boundary_inverted, \
                 right_boundary_id, right_boundary_inverted) \
                 VALUES (?1, ?2, 'driving', 'forward', ?3, ?4, ?5, ?6)",
                params![id, segment_id, left, *left_inv as i64, right, *right_inv as i64],
            )
            .expect("insert lane");
        }
        for (bp, lane, side, end) in &self.branch_points {
            conn.execute(
                "INSERT INTO branch_point_lanes (branch_point_id, lane_id, side, lane_end) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![bp, lane, side, end],
            )
            .expect("insert branch point lane");
        }
        for (lane, adjacent, side) in &self.adjacencies {
            conn.execute(
                "INSERT INTO view_adjacent_lanes (lane_id, adjacent_lane_id, side) \
                 VALUES (?1, ?2, ?3)",
                params![lane, adjacent, side],
            )
            .expect("insert adjacency");
        }
    }
}

/// The canonical two-lane straight-road fixture: one junction, one segment,
/// three boundaries, two lanes, two single-sided branch points.
pub(crate) fn two_lane_road() -> Fixture {
    Fixture::new()
        .metadata("linear_tolerance", "0.01")
        .junction("j1", "Main Junction")
        .segment("seg1", "j1", "Straight Segment")
        .boundary("b_left_outer", &[(0.0, 3.5, 0.0), (100.0, 3.5, 0.0)])
        .boundary("b_center", &[(0.0, 0.0, 0.0), (100.0, 0.0, 0.0)])
        .boundary("b_right_outer", &[(0.0, -3.5, 0.0), (100.0, -3.5, 0.0)])
        .lane("lane_1", "seg1", ("b_left_outer", false), ("b_center", false))
        .lane("lane_2", "seg1", ("b_center", false), ("b_right_outer", false))
        .adjacent("lane_1", "lane_2", "right")
        .adjacent("lane_2", "lane_1", "left")
        .branch_point("bp_start", "lane_1", "a", "start")
        .branch_point("bp_start", "lane_2", "a", "start")
        .branch_point("bp_end", "lane_1", "a", "finish")
        .branch_point("bp_end", "lane_2", "a", "finish")
}
