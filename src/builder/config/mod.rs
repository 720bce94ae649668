//! Builder configuration parsed from the flat property map.
//!
//! Every recognized key has a default; `gpkg_file` is the only key the
//! loading pipeline itself consumes, the rest is carried for the downstream
//! road-network loader.

use std::collections::HashMap;

use glam::DVec3;

use crate::error::Error;

/// Recognized property-map keys.
pub mod params {
    /// Path to the GeoPackage file to load. Required, no default.
    pub const GPKG_FILE: &str = "gpkg_file";
    /// Id of the road geometry handed to the downstream loader.
    pub const ROAD_GEOMETRY_ID: &str = "road_geometry_id";
    /// Linear tolerance of the road geometry.
    pub const LINEAR_TOLERANCE: &str = "linear_tolerance";
    /// Angular tolerance of the road geometry.
    pub const ANGULAR_TOLERANCE: &str = "angular_tolerance";
    /// Scale length of the road geometry.
    pub const SCALE_LENGTH: &str = "scale_length";
    /// Translation from the inertial to the backend frame, as "{x, y, z}".
    pub const INERTIAL_TO_BACKEND_FRAME_TRANSLATION: &str =
        "inertial_to_backend_frame_translation";
    /// Path to a road-rulebook configuration file.
    pub const ROAD_RULE_BOOK: &str = "road_rule_book";
    /// Path to a rule-registry configuration file.
    pub const RULE_REGISTRY: &str = "rule_registry";
    /// Path to a traffic-light-book configuration file.
    pub const TRAFFIC_LIGHT_BOOK: &str = "traffic_light_book";
    /// Path to a phase-ring-book configuration file.
    pub const PHASE_RING_BOOK: &str = "phase_ring_book";
    /// Path to an intersection-book configuration file.
    pub const INTERSECTION_BOOK: &str = "intersection_book";
}

/// Typed view of the builder property map.
#[derive(Debug, Clone, PartialEq)]
pub struct BuilderConfig {
    pub gpkg_file: String,
    pub road_geometry_id: String,
    pub linear_tolerance: f64,
    pub angular_tolerance: f64,
    pub scale_length: f64,
    pub inertial_to_backend_frame_translation: DVec3,
    pub road_rule_book: Option<String>,
    pub rule_registry: Option<String>,
    pub traffic_light_book: Option<String>,
    pub phase_ring_book: Option<String>,
    pub intersection_book: Option<String>,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            gpkg_file: String::new(),
            road_geometry_id: "maliput_sparse".to_string(),
            linear_tolerance: 1e-3,
            angular_tolerance: 1e-3,
            scale_length: 1.0,
            inertial_to_backend_frame_translation: DVec3::ZERO,
            road_rule_book: None,
            rule_registry: None,
            traffic_light_book: None,
            phase_ring_book: None,
            intersection_book: None,
        }
    }
}

impl BuilderConfig {
    /// Builds a configuration from the property map, applying defaults for
    /// absent keys. Unrecognized keys are left for the downstream loader.
    pub fn from_map(properties: &HashMap<String, String>) -> Result<Self, Error> {
        let mut config = Self::default();

        if let Some(value) = properties.get(params::GPKG_FILE) {
            config.gpkg_file = value.clone();
        }
        if let Some(value) = properties.get(params::ROAD_GEOMETRY_ID) {
            config.road_geometry_id = value.clone();
        }
        if let Some(value) = properties.get(params::LINEAR_TOLERANCE) {
            config.linear_tolerance = parse_f64(params::LINEAR_TOLERANCE, value)?;
        }
        if let Some(value) = properties.get(params::ANGULAR_TOLERANCE) {
            config.angular_tolerance = parse_f64(params::ANGULAR_TOLERANCE, value)?;
        }
        if let Some(value) = properties.get(params::SCALE_LENGTH) {
            config.scale_length = parse_f64(params::SCALE_LENGTH, value)?;
        }
        if let Some(value) = properties.get(params::INERTIAL_TO_BACKEND_FRAME_TRANSLATION) {
            config.inertial_to_backend_frame_translation = parse_vector3(value)?;
        }

        config.road_rule_book = properties.get(params::ROAD_RULE_BOOK).cloned();
        config.rule_registry = properties.get(params::RULE_REGISTRY).cloned();
        config.traffic_light_book = properties.get(params::TRAFFIC_LIGHT_BOOK).cloned();
        config.phase_ring_book = properties.get(params::PHASE_RING_BOOK).cloned();
        config.intersection_book = properties.get(params::INTERSECTION_BOOK).cloned();

        Ok(config)
    }

    /// Serializes the configuration back into a property map. Optional book
    /// paths are emitted only when set.
    pub fn to_string_map(&self) -> HashMap<String, String> {
        let translation = self.inertial_to_backend_frame_translation;
        let mut map = HashMap::from([
            (params::GPKG_FILE.to_string(), self.gpkg_file.clone()),
            (
                params::ROAD_GEOMETRY_ID.to_string(),
                self.road_geometry_id.clone(),
            ),
            (
                params::LINEAR_TOLERANCE.to_string(),
                self.linear_tolerance.to_string(),
            ),
            (
                params::ANGULAR_TOLERANCE.to_string(),
                self.angular_tolerance.to_string(),
            ),
            (
                params::SCALE_LENGTH.to_string(),
                self.scale_length.to_string(),
            ),
            (
                params::INERTIAL_TO_BACKEND_FRAME_TRANSLATION.to_string(),
                format!("{{{}, {}, {}}}", translation.x, translation.y, translation.z),
            ),
        ]);

        let books = [
            (params::ROAD_RULE_BOOK, &self.road_rule_book),
            (params::RULE_REGISTRY, &self.rule_registry),
            (params::TRAFFIC_LIGHT_BOOK, &self.traffic_light_book),
            (params::PHASE_RING_BOOK, &self.phase_ring_book),
            (params::INTERSECTION_BOOK, &self.intersection_book),
        ];
        for (key, value) in books {
            if let Some(value) = value {
                map.insert(key.to_string(), value.clone());
            }
        }
        map
    }
}

fn parse_f64(key: &str, value: &str) -> Result<f64, Error> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{key}: expected a number, got '{value}'")))
}

/// Parses the "{x, y, z}" vector syntax used by the property map.
fn parse_vector3(value: &str) -> Result<DVec3, Error> {
    let bad = || {
        Error::Config(format!(
            "{}: expected '{{x, y, z}}', got '{value}'",
            params::INERTIAL_TO_BACKEND_FRAME_TRANSLATION
        ))
    };

    let inner = value
        .trim()
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
        .ok_or_else(bad)?;
    let components: Vec<f64> = inner
        .split(',')
        .map(|part| part.trim().parse().map_err(|_| bad()))
        .collect::<Result<_, _>>()?;
    match components[..] {
        [x, y, z] => Ok(DVec3::new(x, y, z)),
        _ => Err(bad()),
    }
}
