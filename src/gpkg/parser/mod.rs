//! Fixed-schema table parsing for maliput GeoPackage files.
//!
//! The parser opens the database read-only, runs one query per table, and
//! fully materializes the raw record maps during construction. It is
//! read-only afterwards; the database handle is closed before construction
//! returns.

use std::path::Path;

use glam::DVec3;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::error::Error;
use crate::gpkg::db::{blob_or_empty, text_or_empty, Database};
use crate::gpkg::geometry;

/// Row of the `junctions` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawJunction {
    pub name: String,
}

/// Row of the `segments` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSegment {
    pub junction_id: String,
    pub name: String,
}

/// Row of the `lane_boundaries` table, with the geometry blob decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct RawLaneBoundary {
    pub geometry: Vec<DVec3>,
}

/// Row of the `lanes` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLane {
    pub segment_id: String,
    pub lane_type: String,
    pub direction: String,
    pub left_boundary_id: String,
    pub left_boundary_inverted: bool,
    pub right_boundary_id: String,
    pub right_boundary_inverted: bool,
}

/// Row of the `branch_point_lanes` table; `side` is "a" or "b", `lane_end`
/// is "start" or "finish".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBranchPointLane {
    pub lane_id: String,
    pub side: String,
    pub lane_end: String,
}

/// Row of the `view_adjacent_lanes` view; `side` is "left" or "right".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAdjacentLane {
    pub adjacent_lane_id: String,
    pub side: String,
}

/// Parses a maliput GeoPackage into flat record collections keyed by id.
#[derive(Debug)]
pub struct GeoPackageParser {
    metadata: FxHashMap<String, String>,
    junctions: FxHashMap<String, RawJunction>,
    segments: FxHashMap<String, RawSegment>,
    lane_boundaries: FxHashMap<String, RawLaneBoundary>,
    lanes: FxHashMap<String, RawLane>,
    branch_point_lanes: FxHashMap<String, Vec<RawBranchPointLane>>,
    adjacent_lanes: FxHashMap<String, Vec<RawAdjacentLane>>,
}

impl GeoPackageParser {
    /// Opens and fully parses the GeoPackage at `path`.
    pub fn open(path: &Path) -> Result<Self, Error> {
        trace!("parsing GeoPackage file: {}", path.display());
        let db = Database::open(path)?;

        trace!("parsing metadata");
        let metadata = Self::parse_metadata(&db)?;
        trace!("parsing junctions");
        let junctions = Self::parse_junctions(&db)?;
        trace!("parsing segments");
        let segments = Self::parse_segments(&db)?;
        trace!("parsing lane boundaries");
        let lane_boundaries = Self::parse_boundaries(&db)?;
        trace!("parsing lanes");
        let lanes = Self::parse_lanes(&db)?;
        trace!("parsing branch point lanes");
        let branch_point_lanes = Self::parse_branch_points(&db)?;
        trace!("parsing adjacent lanes");
        let adjacent_lanes = Self::parse_adjacent_lanes(&db)?;

        debug!(
            junctions = junctions.len(),
            segments = segments.len(),
            boundaries = lane_boundaries.len(),
            lanes = lanes.len(),
            "parsed GeoPackage"
        );

        Ok(Self {
            metadata,
            junctions,
            segments,
            lane_boundaries,
            lanes,
            branch_point_lanes,
            adjacent_lanes,
        })
    }

    pub fn metadata(&self) -> &FxHashMap<String, String> {
        &self.metadata
    }

    pub fn junctions(&self) -> &FxHashMap<String, RawJunction> {
        &self.junctions
    }

    pub fn segments(&self) -> &FxHashMap<String, RawSegment> {
        &self.segments
    }

    pub fn lane_boundaries(&self) -> &FxHashMap<String, RawLaneBoundary> {
        &self.lane_boundaries
    }

    pub fn lanes(&self) -> &FxHashMap<String, RawLane> {
        &self.lanes
    }

    /// Branch-point lane entries grouped by branch point id.
    pub fn branch_point_lanes(&self) -> &FxHashMap<String, Vec<RawBranchPointLane>> {
        &self.branch_point_lanes
    }

    /// Adjacency entries grouped by the referencing lane id.
    pub fn adjacent_lanes(&self) -> &FxHashMap<String, Vec<RawAdjacentLane>> {
        &self.adjacent_lanes
    }

    fn parse_metadata(db: &Database) -> Result<FxHashMap<String, String>, Error> {
        let mut stmt = db.conn().prepare("SELECT key, value FROM maliput_metadata")?;
        let mut rows = stmt.query([])?;
        let mut metadata = FxHashMap::default();
        while let Some(row) = rows.next()? {
            metadata.insert(text_or_empty(row, 0)?, text_or_empty(row, 1)?);
        }
        Ok(metadata)
    }

    fn parse_junctions(db: &Database) -> Result<FxHashMap<String, RawJunction>, Error> {
        let mut stmt = db.conn().prepare("SELECT junction_id, name FROM junctions")?;
        let mut rows = stmt.query([])?;
        let mut junctions = FxHashMap::default();
        while let Some(row) = rows.next()? {
            junctions.insert(
                text_or_empty(row, 0)?,
                RawJunction {
                    name: text_or_empty(row, 1)?,
                },
            );
        }
        Ok(junctions)
    }

    fn parse_segments(db: &Database) -> Result<FxHashMap<String, RawSegment>, Error> {
        let mut stmt = db
            .conn()
            .prepare("SELECT segment_id, junction_id, name FROM segments")?;
        let mut rows = stmt.query([])?;
        let mut segments = FxHashMap::default();
        while let Some(row) = rows.next()? {
            segments.insert(
                text_or_empty(row, 0)?,
                RawSegment {
                    junction_id: text_or_empty(row, 1)?,
                    name: text_or_empty(row, 2)?,
                },
            );
        }
        Ok(segments)
    }

    fn parse_boundaries(db: &Database) -> Result<FxHashMap<String, RawLaneBoundary>, Error> {
        let mut stmt = db
            .conn()
            .prepare("SELECT boundary_id, geometry FROM lane_boundaries")?;
        let mut rows = stmt.query([])?;
        let mut boundaries = FxHashMap::default();
        while let Some(row) = rows.next()? {
            let id = text_or_empty(row, 0)?;
            let blob = blob_or_empty(row, 1)?;
            let geometry =
                geometry::decode_linestring(&blob).map_err(|source| Error::GeometryFormat {
                    boundary_id: id.clone(),
                    source,
                })?;
            boundaries.insert(id, RawLaneBoundary { geometry });
        }
        Ok(boundaries)
    }

    fn parse_lanes(db: &Database) -> Result<FxHashMap<String, RawLane>, Error> {
        let mut stmt = db.conn().prepare(
            "SELECT lane_id, segment_id, lane_type, direction, \
             left_boundary_id, left_boundary_inverted, \
             right_boundary_id, right_boundary_inverted FROM lanes",
        )?;
        let mut rows = stmt.query([])?;
        let mut lanes = FxHashMap::default();
        while let Some(row) = rows.next()? {
            lanes.insert(
                text_or_empty(row, 0)?,
                RawLane {
                    segment_id: text_or_empty(row, 1)?,
                    lane_type: text_or_empty(row, 2)?,
                    direction: text_or_empty(row, 3)?,
                    left_boundary_id: text_or_empty(row, 4)?,
                    left_boundary_inverted: row.get::<_, i64>(5)? != 0,
                    right_boundary_id: text_or_empty(row, 6)?,
                    right_boundary_inverted: row.get::<_, i64>(7)? != 0,
                },
            );
        }
        Ok(lanes)
    }

    fn parse_branch_points(
        db: &Database,
    ) -> Result<FxHashMap<String, Vec<RawBranchPointLane>>, Error> {
        let mut stmt = db
            .conn()
            .prepare("SELECT branch_point_id, lane_id, side, lane_end FROM branch_point_lanes")?;
        let mut rows = stmt.query([])?;
        let mut branch_points: FxHashMap<String, Vec<RawBranchPointLane>> = FxHashMap::default();
        while let Some(row) = rows.next()? {
            let id = text_or_empty(row, 0)?;
            branch_points.entry(id).or_default().push(RawBranchPointLane {
                lane_id: text_or_empty(row, 1)?,
                side: text_or_empty(row, 2)?,
                lane_end: text_or_empty(row, 3)?,
            });
        }
        Ok(branch_points)
    }

    fn parse_adjacent_lanes(
        db: &Database,
    ) -> Result<FxHashMap<String, Vec<RawAdjacentLane>>, Error> {
        let mut stmt = db
            .conn()
            .prepare("SELECT lane_id, adjacent_lane_id, side FROM view_adjacent_lanes")?;
        let mut rows = stmt.query([])?;
        let mut adjacent_lanes: FxHashMap<String, Vec<RawAdjacentLane>> = FxHashMap::default();
        while let Some(row) = rows.next()? {
            let lane_id = text_or_empty(row, 0)?;
            adjacent_lanes.entry(lane_id).or_default().push(RawAdjacentLane {
                adjacent_lane_id: text_or_empty(row, 1)?,
                side: text_or_empty(row, 2)?,
            });
        }
        Ok(adjacent_lanes)
    }
}

#[cfg(test)]
mod tests;
