//! Road-network model types.
//!
//! Lanes form a graph with cycles (left/right siblings, predecessor and
//! successor ends), so every neighbor is an id reference resolved through
//! the owning map, never an owning pointer.

use glam::DVec3;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Which terminus of a lane an edge attaches to.
///
/// `Start` orders before `Finish`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum LaneEndWhich {
    Start,
    Finish,
}

/// One terminus of one lane; the endpoint type of a connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneEnd {
    pub lane_id: String,
    pub which: LaneEndWhich,
}

impl LaneEnd {
    pub fn new(lane_id: impl Into<String>, which: LaneEndWhich) -> Self {
        Self {
            lane_id: lane_id.into(),
            which,
        }
    }
}

/// A single drivable strip bounded by a left and right polyline.
///
/// `predecessors` and `successors` are keyed by the peer lane id and hold
/// the peer's end that meets this lane's start (respectively finish).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lane {
    pub id: String,
    pub left_boundary: Vec<DVec3>,
    pub right_boundary: Vec<DVec3>,
    pub left_lane_id: Option<String>,
    pub right_lane_id: Option<String>,
    pub predecessors: FxHashMap<String, LaneEnd>,
    pub successors: FxHashMap<String, LaneEnd>,
}

/// A bundle of parallel lanes, ordered right-to-left (rightmost first).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: String,
    pub lanes: Vec<Lane>,
}

impl Segment {
    /// Lane ids in segment order.
    pub fn lane_ids(&self) -> Vec<&str> {
        self.lanes.iter().map(|lane| lane.id.as_str()).collect()
    }
}

/// A named region of segments sharing topology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Junction {
    pub id: String,
    pub segments: FxHashMap<String, Segment>,
}

/// A topologically continuous pairing of two lane ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub from: LaneEnd,
    pub to: LaneEnd,
}

impl Connection {
    /// Lexicographic sort/dedup key.
    pub(crate) fn sort_key(&self) -> (&str, LaneEndWhich, &str, LaneEndWhich) {
        (
            self.from.lane_id.as_str(),
            self.from.which,
            self.to.lane_id.as_str(),
            self.to.which,
        )
    }
}

/// The narrow contract a downstream road-network loader consumes.
pub trait RoadNetworkSource {
    /// All junctions, keyed by junction id.
    fn junctions(&self) -> &FxHashMap<String, Junction>;

    /// The deduplicated connection list, sorted by
    /// `(from.lane_id, from.which, to.lane_id, to.which)`.
    fn connections(&self) -> &[Connection];
}
