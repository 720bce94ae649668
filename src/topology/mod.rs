//! In-memory road-network topology: model types and the assembly manager.

pub mod manager;
pub mod model;

pub use manager::RoadTopology;
pub use model::{
    Connection, Junction, Lane, LaneEnd, LaneEndWhich, RoadNetworkSource, Segment,
};
