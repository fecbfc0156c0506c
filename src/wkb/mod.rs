//! Streaming reader and writer for WKB and EWKB encoded geometries.
//!
//! The reader tokenizes a binary blob into a [`WkbGeometry`] descriptor tree
//! without copying coordinate bytes: every [`WkbSequence`] borrows a window of
//! the input buffer and decodes ordinates lazily on access. A single
//! [`WkbGeometry`] can be reused across many `parse` calls so that the
//! descriptor allocations amortize to zero on hot paths.
//!
//! Parsing descends one call frame per collection nesting level, so nesting
//! depth is bounded only by the thread stack. Callers handing the reader
//! untrusted input should cap blob size or parse on a stack sized for the
//! worst nesting the format can express (one level per 9 input bytes).
//!
//! The writer produces ISO WKB, with the EWKB SRID extension when a
//! spatial reference id is present.

mod geometry;
mod reader;
mod writer;

pub use geometry::{WkbGeometry, WkbSequence};
pub use writer::{
    write_geometry, write_line_string, write_multi_line_string, write_multi_point,
    write_multi_polygon, write_point, write_polygon,
};

use num_enum::{IntoPrimitive, TryFromPrimitive};
use thiserror::Error;

/// Byte length of the smallest WKB header: byte order marker plus type code.
pub(crate) const HEADER_BYTES: usize = 5;

/// EWKB flag bit marking a Z ordinate on each coordinate.
pub(crate) const EWKB_Z: u32 = 0x8000_0000;
/// EWKB flag bit marking an M ordinate on each coordinate.
pub(crate) const EWKB_M: u32 = 0x4000_0000;
/// EWKB flag bit announcing a 4-byte SRID between the header and the payload.
pub(crate) const EWKB_SRID: u32 = 0x2000_0000;
/// Mask selecting the ISO part of a type code, with the EWKB flags cleared.
pub(crate) const TYPE_MASK: u32 = 0x00FF_FFFF;

/// Byte order of a WKB encoding.
///
/// Each geometry in a blob carries its own marker, so nested geometries may
/// legally mix byte orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum Endianness {
    /// Most significant byte first, marker `0x00`.
    BigEndian = 0,
    /// Least significant byte first, marker `0x01`.
    LittleEndian = 1,
}

/// Errors raised while scanning a WKB blob.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WkbError {
    /// The input ended before the structure it announced was complete.
    #[error("unexpected end of WKB input")]
    TooFewBytes,

    /// The input continued past the end of the root geometry.
    #[error("{0} unconsumed byte(s) after the root geometry")]
    TooManyBytes(usize),

    /// The byte order marker was neither `0x00` nor `0x01`.
    #[error("invalid byte order marker {0:#04x}")]
    InvalidEndian(u8),

    /// The type code did not name a supported geometry kind.
    #[error("invalid or unsupported geometry type code {0}")]
    InvalidGeometryType(u32),
}
