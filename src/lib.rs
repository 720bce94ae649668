//! maliput-gpkg - road networks from GeoPackage files
//!
//! Loads a road-network description persisted as a GeoPackage (a SQLite-based
//! geospatial container) and materializes it into an in-memory, topologically
//! linked model of junctions, segments and lanes, ready for a downstream
//! road-network loader.
//!
//! The pipeline is single-threaded and eager:
//! database -> table parser -> topology assembly -> junctions + connections.

pub mod builder;
pub mod error;
pub mod gpkg;
pub mod topology;

pub use builder::{BuilderConfig, RoadNetworkBuilder};
pub use error::{Error, GeometryFormatError};
pub use gpkg::GeoPackageParser;
pub use topology::{
    Connection, Junction, Lane, LaneEnd, LaneEndWhich, RoadNetworkSource, RoadTopology, Segment,
};
