//! Recursive-descent scanner over a raw (E)WKB byte span.
//!
//! Decoding is strictly bounds-checked: every read and every bulk skip is
//! preceded by a remaining-byte check, so adversarial or truncated input can
//! never read out of range. Coordinate payloads are never copied, only
//! recorded as [`WkbSequence`] windows.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::datatypes::{Dimension, GeometryType};
use crate::wkb::geometry::{WkbGeometry, WkbSequence};
use crate::wkb::{Endianness, WkbError, EWKB_M, EWKB_SRID, EWKB_Z, HEADER_BYTES, TYPE_MASK};

/// Byte cursor with strict remaining-byte accounting.
#[derive(Debug)]
pub(super) struct WkbCursor<'a> {
    buf: &'a [u8],
    position: usize,
}

impl<'a> WkbCursor<'a> {
    pub(super) fn new(buf: &'a [u8]) -> Self {
        Self { buf, position: 0 }
    }

    pub(super) fn position(&self) -> usize {
        self.position
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.position
    }

    /// Fail before touching the buffer when fewer than `bytes` remain.
    fn check(&self, bytes: usize) -> Result<(), WkbError> {
        if self.remaining() < bytes {
            return Err(WkbError::TooFewBytes);
        }
        Ok(())
    }

    fn read_u8(&mut self) -> Result<u8, WkbError> {
        self.check(1)?;
        let value = self.buf[self.position];
        self.position += 1;
        Ok(value)
    }

    fn read_u32(&mut self, endianness: Endianness) -> Result<u32, WkbError> {
        self.check(4)?;
        let at = &self.buf[self.position..];
        let value = match endianness {
            Endianness::BigEndian => BigEndian::read_u32(at),
            Endianness::LittleEndian => LittleEndian::read_u32(at),
        };
        self.position += 4;
        Ok(value)
    }

    /// Advance past `bytes` bytes and return the skipped window.
    fn take(&mut self, bytes: usize) -> Result<&'a [u8], WkbError> {
        self.check(bytes)?;
        let data = &self.buf[self.position..self.position + bytes];
        self.position += bytes;
        Ok(data)
    }
}

/// Parse one geometry header plus payload into `out`, recursing for the
/// nested kinds.
///
/// Each geometry, nested ones included, reads its own endian byte and its own
/// type code, so blobs may legally mix byte orders level by level.
pub(super) fn parse_geometry<'a>(
    cursor: &mut WkbCursor<'a>,
    out: &mut WkbGeometry<'a>,
) -> Result<(), WkbError> {
    cursor.check(HEADER_BYTES)?;
    let marker = cursor.read_u8()?;
    let endianness =
        Endianness::try_from(marker).map_err(|_| WkbError::InvalidEndian(marker))?;
    let code = cursor.read_u32(endianness)?;

    let srid = if code & EWKB_SRID != 0 {
        Some(cursor.read_u32(endianness)?)
    } else {
        None
    };

    // Real producers mark Z/M either with the EWKB flag bits or with the ISO
    // thousands digit, so both are honored and OR'ed.
    let iso = code & TYPE_MASK;
    let mut has_z = code & EWKB_Z != 0;
    let mut has_m = code & EWKB_M != 0;
    match iso / 1000 {
        1 => has_z = true,
        2 => has_m = true,
        3 | 4 => {
            has_z = true;
            has_m = true;
        }
        _ => {}
    }
    let dimensions = Dimension::from_zm(has_z, has_m);

    let kind = match GeometryType::try_from(iso % 1000) {
        Ok(GeometryType::Geometry) | Err(_) => {
            return Err(WkbError::InvalidGeometryType(code))
        }
        Ok(kind) => kind,
    };
    out.set_header(kind, dimensions, srid);

    match kind {
        GeometryType::Point => {
            let sequence = read_sequence(cursor, 1, dimensions, endianness)?;
            out.push_sequence(sequence);
        }
        GeometryType::LineString => {
            let count = cursor.read_u32(endianness)?;
            let sequence = read_sequence(cursor, count, dimensions, endianness)?;
            out.push_sequence(sequence);
        }
        GeometryType::Polygon => {
            let rings = cursor.read_u32(endianness)?;
            for _ in 0..rings {
                let count = cursor.read_u32(endianness)?;
                let sequence = read_sequence(cursor, count, dimensions, endianness)?;
                out.push_sequence(sequence);
            }
        }
        GeometryType::MultiPoint
        | GeometryType::MultiLineString
        | GeometryType::MultiPolygon
        | GeometryType::GeometryCollection => {
            let count = cursor.read_u32(endianness)?;
            for _ in 0..count {
                parse_geometry(cursor, out.next_child())?;
            }
        }
        GeometryType::Geometry => unreachable!("rejected when mapping the type code"),
    }
    Ok(())
}

/// Record a `count`-coordinate window at the cursor without copying, then
/// advance past it.
///
/// The payload size is computed in `u64` so a hostile count cannot overflow
/// the byte requirement on 32-bit targets.
fn read_sequence<'a>(
    cursor: &mut WkbCursor<'a>,
    count: u32,
    dimensions: Dimension,
    endianness: Endianness,
) -> Result<WkbSequence<'a>, WkbError> {
    let bytes = count as u64 * (dimensions.size() * 8) as u64;
    if (cursor.remaining() as u64) < bytes {
        return Err(WkbError::TooFewBytes);
    }
    let data = cursor.take(bytes as usize)?;
    Ok(WkbSequence::new(data, count as usize, dimensions, endianness))
}
