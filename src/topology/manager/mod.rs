//! Topology assembly over parsed GeoPackage records.
//!
//! Construction runs five phases in strict order: lane construction,
//! branch-point resolution, segment assembly with right-to-left lane
//! ordering, junction assembly, and the connection list. Any failure aborts
//! the whole build; nothing partial escapes.

use glam::DVec3;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

use crate::error::Error;
use crate::gpkg::GeoPackageParser;
use crate::topology::model::{
    Connection, Junction, Lane, LaneEnd, LaneEndWhich, RoadNetworkSource, Segment,
};

/// The fully assembled road-network topology.
#[derive(Debug)]
pub struct RoadTopology {
    junctions: FxHashMap<String, Junction>,
    connections: Vec<Connection>,
}

impl RoadTopology {
    /// Assembles junctions and connections from the parsed raw records.
    pub fn build(parser: &GeoPackageParser) -> Result<Self, Error> {
        trace!("building lanes");
        let mut lanes = build_lanes(parser)?;
        trace!("resolving branch points");
        resolve_branch_points(parser, &mut lanes)?;
        trace!("assembling segments");
        let segments = assemble_segments(parser, lanes);
        trace!("assembling junctions");
        let junctions = assemble_junctions(parser, segments)?;
        trace!("collecting connections");
        let connections = collect_connections(&junctions);

        debug!(
            junctions = junctions.len(),
            connections = connections.len(),
            "assembled road topology"
        );

        Ok(Self {
            junctions,
            connections,
        })
    }
}

impl RoadNetworkSource for RoadTopology {
    fn junctions(&self) -> &FxHashMap<String, Junction> {
        &self.junctions
    }

    fn connections(&self) -> &[Connection] {
        &self.connections
    }
}

/// Builds one `Lane` per raw lane, with boundary geometry (reversed when
/// the inversion flag is set) and left/right adjacency applied.
fn build_lanes(parser: &GeoPackageParser) -> Result<FxHashMap<String, Lane>, Error> {
    let mut lanes = FxHashMap::default();

    for (lane_id, raw) in parser.lanes() {
        if !parser.segments().contains_key(&raw.segment_id) {
            return Err(Error::Reference(format!(
                "lane '{lane_id}' references missing segment '{}'",
                raw.segment_id
            )));
        }

        let left_boundary =
            boundary_points(parser, lane_id, &raw.left_boundary_id, raw.left_boundary_inverted)?;
        let right_boundary = boundary_points(
            parser,
            lane_id,
            &raw.right_boundary_id,
            raw.right_boundary_inverted,
        )?;

        let mut left_lane_id = None;
        let mut right_lane_id = None;
        if let Some(adjacent) = parser.adjacent_lanes().get(lane_id) {
            for adj in adjacent {
                match adj.side.as_str() {
                    "left" => left_lane_id = Some(adj.adjacent_lane_id.clone()),
                    "right" => right_lane_id = Some(adj.adjacent_lane_id.clone()),
                    other => {
                        return Err(Error::Topology(format!(
                            "unrecognized adjacency side '{other}' on lane '{lane_id}'"
                        )))
                    }
                }
            }
        }

        lanes.insert(
            lane_id.clone(),
            Lane {
                id: lane_id.clone(),
                left_boundary,
                right_boundary,
                left_lane_id,
                right_lane_id,
                predecessors: FxHashMap::default(),
                successors: FxHashMap::default(),
            },
        );
    }

    Ok(lanes)
}

fn boundary_points(
    parser: &GeoPackageParser,
    lane_id: &str,
    boundary_id: &str,
    inverted: bool,
) -> Result<Vec<DVec3>, Error> {
    let boundary = parser.lane_boundaries().get(boundary_id).ok_or_else(|| {
        Error::Reference(format!(
            "lane '{lane_id}' references missing boundary '{boundary_id}'"
        ))
    })?;
    if boundary.geometry.is_empty() {
        return Err(Error::Topology(format!(
            "boundary '{boundary_id}' referenced by lane '{lane_id}' has no points"
        )));
    }

    let mut points = boundary.geometry.clone();
    if inverted {
        points.reverse();
    }
    Ok(points)
}

/// Expands each branch point's bipartite `a`/`b` sides into
/// symmetric predecessor/successor links on both lanes of every pair.
fn resolve_branch_points(
    parser: &GeoPackageParser,
    lanes: &mut FxHashMap<String, Lane>,
) -> Result<(), Error> {
    for (bp_id, entries) in parser.branch_point_lanes() {
        let side_a: Vec<_> = entries.iter().filter(|e| e.side == "a").collect();
        let side_b: Vec<_> = entries.iter().filter(|e| e.side == "b").collect();
        // Entries with any other side value take no part in the pairing; a
        // single-sided branch point legitimately produces no links.

        for la in &side_a {
            for lb in &side_b {
                let end_a = parse_lane_end(&la.lane_end)?;
                let end_b = parse_lane_end(&lb.lane_end)?;
                link(lanes, bp_id, &la.lane_id, end_a, &lb.lane_id, end_b)?;
                link(lanes, bp_id, &lb.lane_id, end_b, &la.lane_id, end_a)?;
            }
        }
    }
    Ok(())
}

/// Records on `lane_id` that its `end` meets `peer_id` at `peer_end`.
/// The first recorded end per peer wins; later pairings do not overwrite.
fn link(
    lanes: &mut FxHashMap<String, Lane>,
    bp_id: &str,
    lane_id: &str,
    end: LaneEndWhich,
    peer_id: &str,
    peer_end: LaneEndWhich,
) -> Result<(), Error> {
    let lane = lanes.get_mut(lane_id).ok_or_else(|| {
        Error::Reference(format!(
            "branch point '{bp_id}' references missing lane '{lane_id}'"
        ))
    })?;
    let edges = match end {
        LaneEndWhich::Start => &mut lane.predecessors,
        LaneEndWhich::Finish => &mut lane.successors,
    };
    edges
        .entry(peer_id.to_string())
        .or_insert_with(|| LaneEnd::new(peer_id, peer_end));
    Ok(())
}

fn parse_lane_end(value: &str) -> Result<LaneEndWhich, Error> {
    match value {
        "start" => Ok(LaneEndWhich::Start),
        "finish" => Ok(LaneEndWhich::Finish),
        other => Err(Error::Topology(format!("unrecognized lane end '{other}'"))),
    }
}

/// Buckets lanes by segment and orders each bucket right-to-left.
fn assemble_segments(
    parser: &GeoPackageParser,
    mut lanes: FxHashMap<String, Lane>,
) -> FxHashMap<String, Segment> {
    // Lanes are enumerated in sorted-id order within each segment so the
    // cycle fallback and the unreachable-lane append are deterministic.
    let mut segment_lanes: FxHashMap<&str, Vec<&str>> = FxHashMap::default();
    for (lane_id, raw) in parser.lanes() {
        segment_lanes
            .entry(raw.segment_id.as_str())
            .or_default()
            .push(lane_id.as_str());
    }
    for ids in segment_lanes.values_mut() {
        ids.sort_unstable();
    }

    let mut segments = FxHashMap::default();
    for segment_id in parser.segments().keys() {
        let ids = segment_lanes.remove(segment_id.as_str()).unwrap_or_default();
        segments.insert(
            segment_id.clone(),
            Segment {
                id: segment_id.clone(),
                lanes: order_lanes(&ids, &mut lanes),
            },
        );
    }
    segments
}

/// Orders a segment's lanes right-to-left: walk the `left_lane_id` chain
/// from every lane with no in-segment right neighbor, then append whatever
/// the walks never reached in enumeration order.
fn order_lanes(ids: &[&str], arena: &mut FxHashMap<String, Lane>) -> Vec<Lane> {
    let in_segment: FxHashSet<&str> = ids.iter().copied().collect();

    let mut starts: Vec<&str> = ids
        .iter()
        .copied()
        .filter(|id| {
            arena[*id]
                .right_lane_id
                .as_deref()
                .map_or(true, |right| !in_segment.contains(right))
        })
        .collect();
    if starts.is_empty() {
        // Every lane has an in-segment right neighbor, i.e. the adjacency
        // is cyclic; break the cycle at the first enumerated lane.
        starts.extend(ids.first().copied());
    }

    let mut order: Vec<&str> = Vec::with_capacity(ids.len());
    let mut placed: FxHashSet<&str> = FxHashSet::default();
    for start in starts {
        let mut current = start;
        while placed.insert(current) {
            order.push(current);
            // Resolve the neighbor through `in_segment` so `current` borrows
            // from `ids`, not from the arena the lanes are drained out of.
            let next = arena[current]
                .left_lane_id
                .as_deref()
                .and_then(|next| in_segment.get(next).copied());
            match next {
                Some(next) => current = next,
                None => break,
            }
        }
    }
    order.extend(ids.iter().copied().filter(|id| !placed.contains(id)));

    order.into_iter().filter_map(|id| arena.remove(id)).collect()
}

/// Buckets segments under their junctions; junctions without
/// segments are still emitted.
fn assemble_junctions(
    parser: &GeoPackageParser,
    mut segments: FxHashMap<String, Segment>,
) -> Result<FxHashMap<String, Junction>, Error> {
    let mut junctions: FxHashMap<String, Junction> = parser
        .junctions()
        .keys()
        .map(|id| {
            (
                id.clone(),
                Junction {
                    id: id.clone(),
                    segments: FxHashMap::default(),
                },
            )
        })
        .collect();

    for (segment_id, raw) in parser.segments() {
        let junction = junctions.get_mut(&raw.junction_id).ok_or_else(|| {
            Error::Reference(format!(
                "segment '{segment_id}' references missing junction '{}'",
                raw.junction_id
            ))
        })?;
        if let Some(segment) = segments.remove(segment_id) {
            junction.segments.insert(segment_id.clone(), segment);
        }
    }

    Ok(junctions)
}

/// Emits one directed connection per predecessor/successor edge,
/// then sort and deduplicate into the canonical list.
fn collect_connections(junctions: &FxHashMap<String, Junction>) -> Vec<Connection> {
    let mut connections = Vec::new();
    for junction in junctions.values() {
        for segment in junction.segments.values() {
            for lane in &segment.lanes {
                for pred_end in lane.predecessors.values() {
                    connections.push(Connection {
                        from: pred_end.clone(),
                        to: LaneEnd::new(lane.id.clone(), LaneEndWhich::Start),
                    });
                }
                for succ_end in lane.successors.values() {
                    connections.push(Connection {
                        from: LaneEnd::new(lane.id.clone(), LaneEndWhich::Finish),
                        to: succ_end.clone(),
                    });
                }
            }
        }
    }

    connections.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    connections.dedup();
    connections
}
