//! The descriptor tree produced by parsing: borrowed coordinate runs plus
//! recursive child geometries, with storage that survives [`WkbGeometry::reset`].

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::coord::{BoundingBox, Coord};
use crate::datatypes::{Dimension, GeometryType};
use crate::wkb::reader::{parse_geometry, WkbCursor};
use crate::wkb::{Endianness, WkbError};

/// A still-encoded run of coordinates inside a WKB input buffer.
///
/// The sequence borrows the payload bytes verbatim; ordinates are decoded on
/// access with the endianness recorded from the enclosing geometry header.
#[derive(Debug, Clone, Copy)]
pub struct WkbSequence<'a> {
    data: &'a [u8],
    length: usize,
    dimensions: Dimension,
    endianness: Endianness,
}

impl<'a> WkbSequence<'a> {
    pub(super) fn new(
        data: &'a [u8],
        length: usize,
        dimensions: Dimension,
        endianness: Endianness,
    ) -> Self {
        Self {
            data,
            length,
            dimensions,
            endianness,
        }
    }

    /// The number of coordinates in this sequence.
    pub fn len(&self) -> usize {
        self.length
    }

    /// Whether this sequence holds no coordinates.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// The coordinate dimensionality declared by the enclosing geometry header.
    pub fn dimensions(&self) -> Dimension {
        self.dimensions
    }

    /// The byte order the ordinates are encoded in.
    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// The number of encoded ordinates per coordinate.
    pub fn stride(&self) -> usize {
        self.dimensions.size()
    }

    /// Decode the raw ordinate `dim` of coordinate `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= len()` or `dim >= stride()`.
    pub fn ordinate(&self, i: usize, dim: usize) -> f64 {
        assert!(i < self.length);
        assert!(dim < self.stride());
        let at = (i * self.stride() + dim) * 8;
        match self.endianness {
            Endianness::BigEndian => BigEndian::read_f64(&self.data[at..]),
            Endianness::LittleEndian => LittleEndian::read_f64(&self.data[at..]),
        }
    }

    /// Decode coordinate `i` into the caller's coordinate shape.
    ///
    /// Ordinates the source lacks come back NaN; ordinates `C` cannot hold
    /// are dropped.
    ///
    /// # Panics
    ///
    /// Panics if `i >= len()`.
    pub fn value<C: Coord>(&self, i: usize) -> C {
        let x = self.ordinate(i, 0);
        let y = self.ordinate(i, 1);
        let z = if self.dimensions.has_z() {
            self.ordinate(i, 2)
        } else {
            f64::NAN
        };
        let m = if self.dimensions.has_m() {
            let dim = if self.dimensions.has_z() { 3 } else { 2 };
            self.ordinate(i, dim)
        } else {
            f64::NAN
        };
        C::from_xyzm(x, y, z, m)
    }
}

/// A parsed WKB geometry: coordinate sequences borrowed from the input plus
/// recursively parsed child geometries.
///
/// One instance is meant to be reused across many inputs. [`parse`] resets the
/// logical contents but keeps every previously grown `Vec`, including the
/// storage held by retained child nodes, so a loop over independent blobs
/// stops allocating once the largest structure has been seen.
///
/// The accessors only expose the logically live part of the tree, so nothing
/// from an earlier parse is observable after a later one.
///
/// The borrow ties the tree to the most recently parsed input; the input
/// buffer must stay alive for as long as the parsed contents are read.
///
/// [`parse`]: WkbGeometry::parse
#[derive(Debug, Clone)]
pub struct WkbGeometry<'a> {
    geometry_type: GeometryType,
    dimensions: Dimension,
    srid: Option<u32>,
    sequences: Vec<WkbSequence<'a>>,
    geometries: Vec<WkbGeometry<'a>>,
    num_geometries: usize,
}

impl<'a> WkbGeometry<'a> {
    /// Create an empty descriptor ready to be parsed into.
    pub fn new() -> Self {
        Self {
            geometry_type: GeometryType::Geometry,
            dimensions: Dimension::XY,
            srid: None,
            sequences: Vec::new(),
            geometries: Vec::new(),
            num_geometries: 0,
        }
    }

    /// Parse one complete WKB blob into this descriptor.
    ///
    /// The previous contents are discarded, their storage is retained. Every
    /// byte of `buf` must belong to the geometry; trailing input fails with
    /// [`WkbError::TooManyBytes`].
    ///
    /// # Errors
    ///
    /// On any error the descriptor holds a partial parse and must not be
    /// read, only reused for another `parse`.
    pub fn parse(&mut self, buf: &'a [u8]) -> Result<(), WkbError> {
        let consumed = self.parse_prefix(buf)?;
        if consumed != buf.len() {
            return Err(WkbError::TooManyBytes(buf.len() - consumed));
        }
        Ok(())
    }

    /// Parse one geometry from the front of `buf` and return the number of
    /// bytes it occupied.
    ///
    /// Bytes after the geometry are left for the caller, which makes this the
    /// entry point for concatenated blobs.
    ///
    /// # Errors
    ///
    /// Same failure contract as [`parse`](WkbGeometry::parse), minus the
    /// trailing-byte check.
    pub fn parse_prefix(&mut self, buf: &'a [u8]) -> Result<usize, WkbError> {
        self.reset();
        let mut cursor = WkbCursor::new(buf);
        parse_geometry(&mut cursor, self)?;
        Ok(cursor.position())
    }

    /// Clear the logical contents while keeping every grown allocation.
    ///
    /// Child nodes are reset recursively in place, so a descriptor that has
    /// parsed a large collection keeps its whole tree of storage for the next
    /// parse.
    pub fn reset(&mut self) {
        self.geometry_type = GeometryType::Geometry;
        self.dimensions = Dimension::XY;
        self.srid = None;
        self.sequences.clear();
        for child in &mut self.geometries {
            child.reset();
        }
        self.num_geometries = 0;
    }

    /// The geometry kind recorded in the header.
    ///
    /// [`GeometryType::Geometry`] until the first successful parse.
    pub fn geometry_type(&self) -> GeometryType {
        self.geometry_type
    }

    /// The coordinate dimensionality recorded in the header.
    pub fn dimensions(&self) -> Dimension {
        self.dimensions
    }

    /// The EWKB spatial reference id, when the header carried one.
    pub fn srid(&self) -> Option<u32> {
        self.srid
    }

    /// The number of coordinate sequences owned directly by this node.
    ///
    /// One for a Point or LineString, one per ring for a Polygon, zero for
    /// the nested kinds.
    pub fn num_sequences(&self) -> usize {
        self.sequences.len()
    }

    /// The coordinate sequences owned directly by this node.
    pub fn sequences(&self) -> &[WkbSequence<'a>] {
        &self.sequences
    }

    /// The number of child geometries.
    pub fn num_geometries(&self) -> usize {
        self.num_geometries
    }

    /// The child geometries parsed into this node.
    pub fn geometries(&self) -> &[WkbGeometry<'a>] {
        &self.geometries[..self.num_geometries]
    }

    pub(super) fn set_header(
        &mut self,
        geometry_type: GeometryType,
        dimensions: Dimension,
        srid: Option<u32>,
    ) {
        self.geometry_type = geometry_type;
        self.dimensions = dimensions;
        self.srid = srid;
    }

    pub(super) fn push_sequence(&mut self, sequence: WkbSequence<'a>) {
        self.sequences.push(sequence);
    }

    /// Hand out the next child slot, growing only when every retained slot is
    /// in use. Slots below the logical count were cleaned by `reset`, so the
    /// returned node is always empty.
    pub(super) fn next_child(&mut self) -> &mut WkbGeometry<'a> {
        if self.num_geometries == self.geometries.len() {
            self.geometries.push(WkbGeometry::new());
        }
        let child = &mut self.geometries[self.num_geometries];
        self.num_geometries += 1;
        child
    }

    /// Call `f` once per coordinate: first every owned sequence in order,
    /// then every child geometry recursively.
    pub fn visit_vertices<C: Coord>(&self, f: &mut impl FnMut(C)) {
        for sequence in &self.sequences {
            for i in 0..sequence.len() {
                f(sequence.value(i));
            }
        }
        for child in self.geometries() {
            child.visit_vertices(f);
        }
    }

    /// Call `f` once per consecutive coordinate pair within each sequence,
    /// then recurse into the children.
    ///
    /// Point kinds emit the degenerate self-edge `f(v, v)` once per
    /// coordinate, so edge-driven algorithms need no special case for them.
    pub fn visit_edges<C: Coord>(&self, f: &mut impl FnMut(C, C)) {
        if self.geometry_type == GeometryType::Point {
            for sequence in &self.sequences {
                for i in 0..sequence.len() {
                    let vertex = sequence.value::<C>(i);
                    f(vertex, vertex);
                }
            }
        } else {
            for sequence in &self.sequences {
                for i in 1..sequence.len() {
                    f(sequence.value(i - 1), sequence.value(i));
                }
            }
        }
        for child in self.geometries() {
            child.visit_edges(f);
        }
    }

    /// The bounding box of every vertex in the tree, or the empty box when
    /// there are none.
    pub fn bounds<C: Coord>(&self) -> C::Box {
        let mut bounds = C::Box::empty();
        self.visit_vertices::<C>(&mut |vertex| bounds.extend(&vertex));
        bounds
    }
}

impl<'a> Default for WkbGeometry<'a> {
    fn default() -> Self {
        Self::new()
    }
}
