//! Closed vocabularies describing geometry views: dimensionality, coordinate
//! layout, and geometry kind.

use std::fmt::Display;

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// The dimension of a coordinate sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    /// Two-dimensional.
    XY,

    /// Three-dimensional.
    XYZ,

    /// XYM (2D with measure).
    XYM,

    /// XYZM (3D with measure).
    XYZM,
}

impl Dimension {
    /// Returns the number of dimensions.
    pub fn size(&self) -> usize {
        match self {
            Dimension::XY => 2,
            Dimension::XYZ => 3,
            Dimension::XYM => 3,
            Dimension::XYZM => 4,
        }
    }

    /// Whether this dimension has a Z ordinate.
    pub fn has_z(&self) -> bool {
        matches!(self, Dimension::XYZ | Dimension::XYZM)
    }

    /// Whether this dimension has an M ordinate.
    pub fn has_m(&self) -> bool {
        matches!(self, Dimension::XYM | Dimension::XYZM)
    }

    /// Construct from Z and M presence.
    pub fn from_zm(has_z: bool, has_m: bool) -> Self {
        match (has_z, has_m) {
            (false, false) => Dimension::XY,
            (true, false) => Dimension::XYZ,
            (false, true) => Dimension::XYM,
            (true, true) => Dimension::XYZM,
        }
    }
}

impl From<Dimension> for geo_traits::Dimensions {
    fn from(value: Dimension) -> Self {
        match value {
            Dimension::XY => geo_traits::Dimensions::Xy,
            Dimension::XYZ => geo_traits::Dimensions::Xyz,
            Dimension::XYM => geo_traits::Dimensions::Xym,
            Dimension::XYZM => geo_traits::Dimensions::Xyzm,
        }
    }
}

impl Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dimension::XY => write!(f, "XY"),
            Dimension::XYZ => write!(f, "XYZ"),
            Dimension::XYM => write!(f, "XYM"),
            Dimension::XYZM => write!(f, "XYZM"),
        }
    }
}

/// The permitted coordinate memory layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoordType {
    /// One buffer of interleaved ordinates, `xyxyxy` (or `xyzxyz`, ...).
    Interleaved,

    /// One buffer per ordinate, `xxx` + `yyy` (+ `zzz`, ...).
    Separated,
}

/// Geometry kind, using the standard WKB numeric codes.
///
/// `Geometry` (0) stands for "not yet determined"; it is the state of a freshly created or reset
/// [`WkbGeometry`](crate::wkb::WkbGeometry) and never a legal code on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u32)]
pub enum GeometryType {
    /// Unknown or not yet determined.
    Geometry = 0,

    /// Point.
    Point = 1,

    /// LineString.
    LineString = 2,

    /// Polygon.
    Polygon = 3,

    /// MultiPoint.
    MultiPoint = 4,

    /// MultiLineString.
    MultiLineString = 5,

    /// MultiPolygon.
    MultiPolygon = 6,

    /// GeometryCollection.
    GeometryCollection = 7,
}

impl Display for GeometryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GeometryType::Geometry => "Geometry",
            GeometryType::Point => "Point",
            GeometryType::LineString => "LineString",
            GeometryType::Polygon => "Polygon",
            GeometryType::MultiPoint => "MultiPoint",
            GeometryType::MultiLineString => "MultiLineString",
            GeometryType::MultiPolygon => "MultiPolygon",
            GeometryType::GeometryCollection => "GeometryCollection",
        };
        write!(f, "{name}")
    }
}
