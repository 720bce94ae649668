//! GeoPackage binary geometry decoding.
//!
//! Blob layout (GeoPackage 1.0.0+ standard encoding):
//!
//! ```text
//! MAGIC "GP" (2) || VERSION (1) || FLAGS (1) || SRS_ID (4) || [ENVELOPE] || WKB
//! ```
//!
//! * The envelope width is selected by bits 1-3 of the flags byte
//!   (0, 32, 48, 48 or 64 bytes); its contents are skipped, not validated.
//! * The WKB body must be little-endian and of base type LINESTRING (2),
//!   with an optional Z coordinate signalled by bit 31 of the type word.
//!
//! All multi-byte values are little-endian regardless of host, and no
//! alignment is assumed about the input buffer.

use glam::DVec3;

use crate::error::GeometryFormatError;

const GPKG_MAGIC: [u8; 2] = *b"GP";
const WKB_LINESTRING: u32 = 2;
const WKB_Z_FLAG: u32 = 0x8000_0000;
const WKB_BASE_TYPE_MASK: u32 = 0x0FFF_FFFF;

/// Envelope byte widths indexed by the 3-bit envelope indicator
/// (none, XY, XYZ, XYM, XYZM).
const ENVELOPE_SIZES: [usize; 5] = [0, 32, 48, 48, 64];

/// Upper bound on the declared point count; anything larger is treated as a
/// corrupt blob rather than an allocation request.
const MAX_POINTS: u32 = 1_000_000;

/// Header (8) + byte order (1) + WKB type (4) + point count (4); a zero-point
/// linestring is exactly this long.
const MIN_BLOB_LEN: usize = 17;

/// Decodes a GeoPackage geometry blob holding a WKB linestring into an
/// ordered sequence of 3D points. XY input gets `z = 0.0`.
pub fn decode_linestring(blob: &[u8]) -> Result<Vec<DVec3>, GeometryFormatError> {
    if blob.len() < MIN_BLOB_LEN {
        return Err(GeometryFormatError::TooSmall(blob.len()));
    }

    // ---- GeoPackage header ----
    if blob[0..2] != GPKG_MAGIC {
        return Err(GeometryFormatError::BadMagic);
    }
    let version = blob[2];
    if version != 0 {
        return Err(GeometryFormatError::UnsupportedVersion(version));
    }
    let flags = blob[3];
    let envelope_indicator = (flags >> 1) & 0x07;
    if usize::from(envelope_indicator) >= ENVELOPE_SIZES.len() {
        return Err(GeometryFormatError::BadEnvelope(envelope_indicator));
    }

    // SRS id (bytes 4..8) is consumed but not validated.
    let mut cursor = 8 + ENVELOPE_SIZES[usize::from(envelope_indicator)];

    // ---- WKB body ----
    let byte_order = *blob.get(cursor).ok_or(GeometryFormatError::Truncated)?;
    if byte_order != 1 {
        return Err(GeometryFormatError::BigEndian);
    }
    cursor += 1;

    let wkb_type = read_u32(blob, &mut cursor)?;
    let has_z = wkb_type & WKB_Z_FLAG != 0;
    let base_type = wkb_type & WKB_BASE_TYPE_MASK;
    if base_type != WKB_LINESTRING {
        return Err(GeometryFormatError::UnsupportedType(base_type));
    }

    let num_points = read_u32(blob, &mut cursor)?;
    if num_points > MAX_POINTS {
        return Err(GeometryFormatError::TooManyPoints(num_points));
    }
    let stride = if has_z { 24 } else { 16 };
    if blob.len() - cursor < num_points as usize * stride {
        return Err(GeometryFormatError::Truncated);
    }

    let mut points = Vec::with_capacity(num_points as usize);
    for _ in 0..num_points {
        let x = read_f64(blob, &mut cursor)?;
        let y = read_f64(blob, &mut cursor)?;
        let z = if has_z {
            read_f64(blob, &mut cursor)?
        } else {
            0.0
        };
        points.push(DVec3::new(x, y, z));
    }

    Ok(points)
}

fn read_u32(blob: &[u8], cursor: &mut usize) -> Result<u32, GeometryFormatError> {
    let bytes: [u8; 4] = blob
        .get(*cursor..*cursor + 4)
        .and_then(|s| s.try_into().ok())
        .ok_or(GeometryFormatError::Truncated)?;
    *cursor += 4;
    Ok(u32::from_le_bytes(bytes))
}

fn read_f64(blob: &[u8], cursor: &mut usize) -> Result<f64, GeometryFormatError> {
    let bytes: [u8; 8] = blob
        .get(*cursor..*cursor + 8)
        .and_then(|s| s.try_into().ok())
        .ok_or(GeometryFormatError::Truncated)?;
    *cursor += 8;
    Ok(f64::from_le_bytes(bytes))
}
