//! Error types for GeoPackage loading.
//!
//! Every error here is fatal to the construction that raised it; there is no
//! partial-result mode. Callers get the whole road network or a single error.

use std::path::PathBuf;

use thiserror::Error;

/// Violations of the GeoPackage/WKB geometry blob encoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GeometryFormatError {
    /// Blob shorter than the minimum legal geometry (header + WKB preamble).
    #[error("geometry blob too small ({0} bytes)")]
    TooSmall(usize),
    /// First two bytes are not the "GP" magic.
    #[error("invalid GeoPackage magic")]
    BadMagic,
    /// Header version byte is not 0.
    #[error("unsupported GeoPackage version {0}")]
    UnsupportedVersion(u8),
    /// Envelope indicator outside the 0..=4 range.
    #[error("unsupported envelope indicator {0}")]
    BadEnvelope(u8),
    /// WKB byte-order marker is not 1 (little-endian).
    #[error("only little-endian WKB is supported")]
    BigEndian,
    /// WKB base geometry type is not LINESTRING (2).
    #[error("unsupported WKB geometry type {0}")]
    UnsupportedType(u32),
    /// Declared payload extends past the end of the blob.
    #[error("geometry blob truncated")]
    Truncated,
    /// Point count exceeds the sanity bound.
    #[error("point count {0} exceeds maximum")]
    TooManyPoints(u32),
}

/// Errors raised while loading a road network from a GeoPackage.
#[derive(Debug, Error)]
pub enum Error {
    /// The file is missing, unreadable, or not a SQLite database.
    #[error("failed to open GeoPackage at {}: {source}", path.display())]
    DatabaseOpen {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// A required table or column is missing, or a query failed mid-iteration.
    #[error("GeoPackage query failed: {0}")]
    Query(#[from] rusqlite::Error),

    /// A lane-boundary geometry blob violates the encoding rules.
    #[error("invalid geometry for boundary '{boundary_id}': {source}")]
    GeometryFormat {
        boundary_id: String,
        #[source]
        source: GeometryFormatError,
    },

    /// A record references an id that does not exist.
    #[error("dangling reference: {0}")]
    Reference(String),

    /// An enumerated column holds an unrecognized value, or an assembled
    /// lane violates a structural requirement.
    #[error("invalid topology: {0}")]
    Topology(String),

    /// A builder property could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
}
