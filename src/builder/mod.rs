//! Road-network builder façade.
//!
//! Parses the caller's property map, loads the GeoPackage, and assembles the
//! topology the downstream road-network loader consumes through
//! [`RoadNetworkSource`](crate::topology::RoadNetworkSource).

pub mod config;

pub use config::BuilderConfig;

use std::collections::HashMap;
use std::path::Path;

use tracing::{info, trace};

use crate::error::Error;
use crate::gpkg::GeoPackageParser;
use crate::topology::RoadTopology;

/// Builds a road-network topology from a flat string property map.
pub struct RoadNetworkBuilder {
    properties: HashMap<String, String>,
}

impl RoadNetworkBuilder {
    pub fn new(properties: HashMap<String, String>) -> Self {
        Self { properties }
    }

    /// The typed configuration the property map resolves to.
    pub fn config(&self) -> Result<BuilderConfig, Error> {
        BuilderConfig::from_map(&self.properties)
    }

    /// Loads the GeoPackage named by `gpkg_file` and assembles the topology.
    pub fn build(&self) -> Result<RoadTopology, Error> {
        let config = self.config()?;
        if config.gpkg_file.is_empty() {
            return Err(Error::Config(format!(
                "missing required property '{}'",
                config::params::GPKG_FILE
            )));
        }

        info!("loading GeoPackage from {}", config.gpkg_file);
        let parser = GeoPackageParser::open(Path::new(&config.gpkg_file))?;

        trace!("building road topology");
        RoadTopology::build(&parser)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpkg::testing::two_lane_road;
    use crate::topology::RoadNetworkSource;

    use tempfile::tempdir;

    #[test]
    fn builds_from_property_map() {
        let dir = tempdir().expect("create temp dir");
        let path = dir.path().join("road.gpkg");
        two_lane_road().write_to(&path);

        let properties = HashMap::from([
            ("gpkg_file".to_string(), path.display().to_string()),
            ("linear_tolerance".to_string(), "0.01".to_string()),
        ]);
        let topology = RoadNetworkBuilder::new(properties).build().expect("build");

        assert_eq!(topology.junctions().len(), 1);
        assert_eq!(
            topology.junctions()["j1"].segments["seg1"].lane_ids(),
            vec!["lane_2", "lane_1"]
        );
        assert!(topology.connections().is_empty());
    }

    #[test]
    fn missing_gpkg_file_property_fails() {
        let err = RoadNetworkBuilder::new(HashMap::new()).build().unwrap_err();
        assert!(matches!(err, Error::Config(_)), "got {err:?}");
    }

    #[test]
    fn nonexistent_gpkg_file_fails() {
        let properties = HashMap::from([(
            "gpkg_file".to_string(),
            "/definitely/not/here.gpkg".to_string(),
        )]);
        let err = RoadNetworkBuilder::new(properties).build().unwrap_err();
        assert!(matches!(err, Error::DatabaseOpen { .. }), "got {err:?}");
    }

    #[test]
    fn unrecognized_properties_are_forwarded_untouched() {
        let properties = HashMap::from([
            ("gpkg_file".to_string(), "/road.gpkg".to_string()),
            ("opendrive_file".to_string(), "ignored.xodr".to_string()),
        ]);
        let builder = RoadNetworkBuilder::new(properties);
        let config = builder.config().expect("parse config");
        assert_eq!(config.gpkg_file, "/road.gpkg");
    }
}
