//! Encode coordinate views and parsed descriptors as (E)WKB bytes.

use std::io::{self, Write};

use byteorder::{BigEndian, LittleEndian, WriteBytesExt};

use crate::coord::Coord;
use crate::datatypes::{Dimension, GeometryType};
use crate::sequence::{CoordSequence, ListSequence};
use crate::wkb::geometry::{WkbGeometry, WkbSequence};
use crate::wkb::{Endianness, EWKB_SRID};

/// ISO type code for `kind`, with the dimensionality in the thousands digit
/// and the EWKB SRID flag bit when a SRID follows the header.
fn type_code(kind: GeometryType, dimensions: Dimension, srid: bool) -> u32 {
    let offset = match dimensions {
        Dimension::XY => 0,
        Dimension::XYZ => 1000,
        Dimension::XYM => 2000,
        Dimension::XYZM => 3000,
    };
    let mut code = u32::from(kind) + offset;
    if srid {
        code |= EWKB_SRID;
    }
    code
}

fn write_u32<W: Write>(writer: &mut W, endianness: Endianness, value: u32) -> io::Result<()> {
    match endianness {
        Endianness::BigEndian => writer.write_u32::<BigEndian>(value),
        Endianness::LittleEndian => writer.write_u32::<LittleEndian>(value),
    }
}

fn write_f64<W: Write>(writer: &mut W, endianness: Endianness, value: f64) -> io::Result<()> {
    match endianness {
        Endianness::BigEndian => writer.write_f64::<BigEndian>(value),
        Endianness::LittleEndian => writer.write_f64::<LittleEndian>(value),
    }
}

fn write_header<W: Write>(
    writer: &mut W,
    endianness: Endianness,
    kind: GeometryType,
    dimensions: Dimension,
    srid: Option<u32>,
) -> io::Result<()> {
    writer.write_u8(endianness.into())?;
    write_u32(writer, endianness, type_code(kind, dimensions, srid.is_some()))?;
    if let Some(srid) = srid {
        write_u32(writer, endianness, srid)?;
    }
    Ok(())
}

/// Stored ordinates in storage order, which matches the WKB ordinate order.
fn write_coord<W: Write, C: Coord>(
    writer: &mut W,
    endianness: Endianness,
    coord: &C,
) -> io::Result<()> {
    let ordinates = coord.ordinates();
    for &value in ordinates.as_ref() {
        write_f64(writer, endianness, value)?;
    }
    Ok(())
}

/// Write one coordinate to `writer` encoded as a WKB Point.
pub fn write_point<W: Write, C: Coord>(
    writer: &mut W,
    endianness: Endianness,
    coord: &C,
) -> io::Result<()> {
    write_header(writer, endianness, GeometryType::Point, C::DIMENSION, None)?;
    write_coord(writer, endianness, coord)
}

/// Write a coordinate sequence to `writer` encoded as a WKB LineString.
pub fn write_line_string<W: Write, C: Coord>(
    writer: &mut W,
    endianness: Endianness,
    coords: &CoordSequence<C>,
) -> io::Result<()> {
    write_header(
        writer,
        endianness,
        GeometryType::LineString,
        C::DIMENSION,
        None,
    )?;
    write_u32(writer, endianness, coords.len().try_into().unwrap())?;
    for coord in coords.iter() {
        write_coord(writer, endianness, &coord)?;
    }
    Ok(())
}

/// Write a list of rings to `writer` encoded as a WKB Polygon.
pub fn write_polygon<W: Write, C: Coord>(
    writer: &mut W,
    endianness: Endianness,
    rings: &ListSequence<CoordSequence<C>>,
) -> io::Result<()> {
    write_header(writer, endianness, GeometryType::Polygon, C::DIMENSION, None)?;
    write_u32(writer, endianness, rings.len().try_into().unwrap())?;
    let mut cursor = rings.children();
    while let Some(ring) = cursor.next() {
        write_u32(writer, endianness, ring.len().try_into().unwrap())?;
        for coord in ring.iter() {
            write_coord(writer, endianness, &coord)?;
        }
    }
    Ok(())
}

/// Write each coordinate of a sequence to `writer` as a Point inside a WKB
/// MultiPoint.
pub fn write_multi_point<W: Write, C: Coord>(
    writer: &mut W,
    endianness: Endianness,
    coords: &CoordSequence<C>,
) -> io::Result<()> {
    write_header(
        writer,
        endianness,
        GeometryType::MultiPoint,
        C::DIMENSION,
        None,
    )?;
    write_u32(writer, endianness, coords.len().try_into().unwrap())?;
    for coord in coords.iter() {
        write_point(writer, endianness, &coord)?;
    }
    Ok(())
}

/// Write a list of coordinate sequences to `writer` encoded as a WKB
/// MultiLineString.
pub fn write_multi_line_string<W: Write, C: Coord>(
    writer: &mut W,
    endianness: Endianness,
    lines: &ListSequence<CoordSequence<C>>,
) -> io::Result<()> {
    write_header(
        writer,
        endianness,
        GeometryType::MultiLineString,
        C::DIMENSION,
        None,
    )?;
    write_u32(writer, endianness, lines.len().try_into().unwrap())?;
    let mut cursor = lines.children();
    while let Some(line) = cursor.next() {
        write_line_string(writer, endianness, line)?;
    }
    Ok(())
}

/// Write a doubly-nested list to `writer` encoded as a WKB MultiPolygon.
pub fn write_multi_polygon<W: Write, C: Coord>(
    writer: &mut W,
    endianness: Endianness,
    polygons: &ListSequence<ListSequence<CoordSequence<C>>>,
) -> io::Result<()> {
    write_header(
        writer,
        endianness,
        GeometryType::MultiPolygon,
        C::DIMENSION,
        None,
    )?;
    write_u32(writer, endianness, polygons.len().try_into().unwrap())?;
    let mut cursor = polygons.children();
    while let Some(polygon) = cursor.next() {
        write_polygon(writer, endianness, polygon)?;
    }
    Ok(())
}

fn write_sequence<W: Write>(
    writer: &mut W,
    endianness: Endianness,
    sequence: &WkbSequence<'_>,
) -> io::Result<()> {
    for i in 0..sequence.len() {
        for dim in 0..sequence.stride() {
            write_f64(writer, endianness, sequence.ordinate(i, dim))?;
        }
    }
    Ok(())
}

/// Re-encode a parsed descriptor tree, preserving its kind, dimensionality,
/// and EWKB SRID, in the requested byte order.
///
/// Z/M presence is always encoded with the ISO thousands digit, so input that
/// used the EWKB flag bits re-encodes to equivalent but not identical bytes.
///
/// # Panics
///
/// Panics if `geometry` has never been the target of a successful parse.
pub fn write_geometry<W: Write>(
    writer: &mut W,
    endianness: Endianness,
    geometry: &WkbGeometry<'_>,
) -> io::Result<()> {
    let kind = geometry.geometry_type();
    write_header(writer, endianness, kind, geometry.dimensions(), geometry.srid())?;
    match kind {
        GeometryType::Geometry => panic!("descriptor has not parsed a geometry"),
        GeometryType::Point => {
            write_sequence(writer, endianness, &geometry.sequences()[0])?;
        }
        GeometryType::LineString => {
            let sequence = &geometry.sequences()[0];
            write_u32(writer, endianness, sequence.len().try_into().unwrap())?;
            write_sequence(writer, endianness, sequence)?;
        }
        GeometryType::Polygon => {
            write_u32(writer, endianness, geometry.num_sequences().try_into().unwrap())?;
            for sequence in geometry.sequences() {
                write_u32(writer, endianness, sequence.len().try_into().unwrap())?;
                write_sequence(writer, endianness, sequence)?;
            }
        }
        GeometryType::MultiPoint
        | GeometryType::MultiLineString
        | GeometryType::MultiPolygon
        | GeometryType::GeometryCollection => {
            write_u32(writer, endianness, geometry.num_geometries().try_into().unwrap())?;
            for child in geometry.geometries() {
                write_geometry(writer, endianness, child)?;
            }
        }
    }
    Ok(())
}
