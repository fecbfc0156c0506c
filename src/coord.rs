//! Coordinate and bounding-box value types.
//!
//! These are the element types read out of a
//! [`CoordSequence`](crate::sequence::CoordSequence): plain `[f64; N]` bundles with named
//! accessors. Absent ordinates read as sentinels (NaN for coordinates, +inf/-inf for box
//! minimums/maximums) so code written against the widest shape works on any dimensionality.

use arrow_buffer::ScalarBuffer;

use crate::datatypes::Dimension;

/// Storage contract shared by coordinate and box values.
///
/// The associated array types carry the element arity into generic sequence code at compile
/// time: one `ScalarBuffer` per stored ordinate, in storage order. For coordinates that order is
/// `x, y (, z) (, m)`; for boxes it is all minimums then all maximums.
pub trait CoordValue: Copy + std::fmt::Debug + PartialEq {
    /// The dimension of the coordinates this value is built from.
    const DIMENSION: Dimension;

    /// The number of f64 ordinates one element occupies.
    ///
    /// Equal to `DIMENSION.size()` for coordinate values and twice that for box values.
    const NUM_ORDINATES: usize;

    /// Ordinate array, `[f64; NUM_ORDINATES]`.
    type Ordinates: AsRef<[f64]> + AsMut<[f64]> + Copy + std::fmt::Debug + Default;

    /// Buffer bundle, one `ScalarBuffer<f64>` per stored ordinate.
    type Buffers: AsRef<[ScalarBuffer<f64>]>
        + Clone
        + std::fmt::Debug
        + PartialEq
        + TryFrom<Vec<ScalarBuffer<f64>>>;

    /// Build a value from its stored ordinates.
    fn from_ordinates(ordinates: Self::Ordinates) -> Self;

    /// The stored ordinates of this value.
    fn ordinates(&self) -> Self::Ordinates;
}

/// A coordinate value with named ordinate accessors.
///
/// `z`/`m` return NaN when the type does not store that ordinate, and [`Coord::from_xyzm`]
/// drops whatever the type cannot hold, so converting between dimensionalities is total in both
/// directions.
pub trait Coord: CoordValue {
    /// The bounding-box value of the same dimensionality.
    type Box: BoundingBox<Coord = Self>;

    /// X ordinate.
    fn x(&self) -> f64 {
        self.ordinates().as_ref()[0]
    }

    /// Y ordinate.
    fn y(&self) -> f64 {
        self.ordinates().as_ref()[1]
    }

    /// Z ordinate, or NaN when this type does not store Z.
    fn z(&self) -> f64 {
        f64::NAN
    }

    /// M ordinate, or NaN when this type does not store M.
    fn m(&self) -> f64 {
        f64::NAN
    }

    /// Build from a full XYZM quadruple, dropping the ordinates this type does not store.
    fn from_xyzm(x: f64, y: f64, z: f64, m: f64) -> Self;
}

/// A bounding-box value.
///
/// Minimums of absent dimensions read as +inf and maximums as -inf, the same values
/// [`BoundingBox::empty`] holds in every dimension, so merging boxes of different
/// dimensionalities through these accessors never spuriously widens a range.
pub trait BoundingBox: CoordValue {
    /// The coordinate value this box bounds.
    type Coord: Coord<Box = Self>;

    /// The empty box: +inf minimums and -inf maximums.
    ///
    /// Extending the empty box by one coordinate yields that coordinate's degenerate box.
    fn empty() -> Self {
        let mut ordinates = Self::Ordinates::default();
        let dims = Self::NUM_ORDINATES / 2;
        let s = ordinates.as_mut();
        for d in 0..dims {
            s[d] = f64::INFINITY;
            s[dims + d] = f64::NEG_INFINITY;
        }
        Self::from_ordinates(ordinates)
    }

    /// Grow this box to cover `coord`. NaN ordinates are ignored.
    fn extend(&mut self, coord: &Self::Coord) {
        let dims = Self::NUM_ORDINATES / 2;
        let mut ordinates = self.ordinates();
        let s = ordinates.as_mut();
        let coord = coord.ordinates();
        let c = coord.as_ref();
        for d in 0..dims {
            s[d] = s[d].min(c[d]);
            s[dims + d] = s[dims + d].max(c[d]);
        }
        *self = Self::from_ordinates(ordinates);
    }

    /// Grow this box to cover `other`.
    fn merge(&mut self, other: &Self) {
        let dims = Self::NUM_ORDINATES / 2;
        let mut ordinates = self.ordinates();
        let s = ordinates.as_mut();
        let other = other.ordinates();
        let o = other.as_ref();
        for d in 0..dims {
            s[d] = s[d].min(o[d]);
            s[dims + d] = s[dims + d].max(o[dims + d]);
        }
        *self = Self::from_ordinates(ordinates);
    }

    /// Whether this box and `other` overlap in every stored dimension.
    ///
    /// The empty box intersects nothing, including itself.
    fn intersects(&self, other: &Self) -> bool {
        let dims = Self::NUM_ORDINATES / 2;
        let a = self.ordinates();
        let a = a.as_ref();
        let b = other.ordinates();
        let b = b.as_ref();
        (0..dims).all(|d| a[d] <= b[dims + d] && b[d] <= a[dims + d])
    }

    /// Minimum X.
    fn xmin(&self) -> f64 {
        self.ordinates().as_ref()[0]
    }

    /// Minimum Y.
    fn ymin(&self) -> f64 {
        self.ordinates().as_ref()[1]
    }

    /// Minimum Z, or +inf when this type does not store Z.
    fn zmin(&self) -> f64 {
        f64::INFINITY
    }

    /// Minimum M, or +inf when this type does not store M.
    fn mmin(&self) -> f64 {
        f64::INFINITY
    }

    /// Maximum X.
    fn xmax(&self) -> f64 {
        self.ordinates().as_ref()[Self::NUM_ORDINATES / 2]
    }

    /// Maximum Y.
    fn ymax(&self) -> f64 {
        self.ordinates().as_ref()[Self::NUM_ORDINATES / 2 + 1]
    }

    /// Maximum Z, or -inf when this type does not store Z.
    fn zmax(&self) -> f64 {
        f64::NEG_INFINITY
    }

    /// Maximum M, or -inf when this type does not store M.
    fn mmax(&self) -> f64 {
        f64::NEG_INFINITY
    }
}

/// An XY coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Xy([f64; 2]);

/// An XYZ coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Xyz([f64; 3]);

/// An XYM coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Xym([f64; 3]);

/// An XYZM coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Xyzm([f64; 4]);

/// An XY bounding box, stored as `[xmin, ymin, xmax, ymax]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoxXy([f64; 4]);

/// An XYZ bounding box, stored as `[xmin, ymin, zmin, xmax, ymax, zmax]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoxXyz([f64; 6]);

/// An XYM bounding box, stored as `[xmin, ymin, mmin, xmax, ymax, mmax]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoxXym([f64; 6]);

/// An XYZM bounding box, stored as `[xmin, ymin, zmin, mmin, xmax, ymax, zmax, mmax]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoxXyzm([f64; 8]);

macro_rules! impl_coord_value {
    ($type:ty, $dim:expr, $num:literal) => {
        impl CoordValue for $type {
            const DIMENSION: Dimension = $dim;
            const NUM_ORDINATES: usize = $num;
            type Ordinates = [f64; $num];
            type Buffers = [ScalarBuffer<f64>; $num];

            fn from_ordinates(ordinates: Self::Ordinates) -> Self {
                Self(ordinates)
            }

            fn ordinates(&self) -> Self::Ordinates {
                self.0
            }
        }
    };
}

impl_coord_value!(Xy, Dimension::XY, 2);
impl_coord_value!(Xyz, Dimension::XYZ, 3);
impl_coord_value!(Xym, Dimension::XYM, 3);
impl_coord_value!(Xyzm, Dimension::XYZM, 4);
impl_coord_value!(BoxXy, Dimension::XY, 4);
impl_coord_value!(BoxXyz, Dimension::XYZ, 6);
impl_coord_value!(BoxXym, Dimension::XYM, 6);
impl_coord_value!(BoxXyzm, Dimension::XYZM, 8);

impl Xy {
    /// Construct from ordinates.
    pub fn new(x: f64, y: f64) -> Self {
        Self([x, y])
    }
}

impl Xyz {
    /// Construct from ordinates.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self([x, y, z])
    }
}

impl Xym {
    /// Construct from ordinates.
    pub fn new(x: f64, y: f64, m: f64) -> Self {
        Self([x, y, m])
    }
}

impl Xyzm {
    /// Construct from ordinates.
    pub fn new(x: f64, y: f64, z: f64, m: f64) -> Self {
        Self([x, y, z, m])
    }
}

impl Coord for Xy {
    type Box = BoxXy;

    fn from_xyzm(x: f64, y: f64, _z: f64, _m: f64) -> Self {
        Self([x, y])
    }
}

impl Coord for Xyz {
    type Box = BoxXyz;

    fn z(&self) -> f64 {
        self.0[2]
    }

    fn from_xyzm(x: f64, y: f64, z: f64, _m: f64) -> Self {
        Self([x, y, z])
    }
}

impl Coord for Xym {
    type Box = BoxXym;

    fn m(&self) -> f64 {
        self.0[2]
    }

    fn from_xyzm(x: f64, y: f64, _z: f64, m: f64) -> Self {
        Self([x, y, m])
    }
}

impl Coord for Xyzm {
    type Box = BoxXyzm;

    fn z(&self) -> f64 {
        self.0[2]
    }

    fn m(&self) -> f64 {
        self.0[3]
    }

    fn from_xyzm(x: f64, y: f64, z: f64, m: f64) -> Self {
        Self([x, y, z, m])
    }
}

impl BoundingBox for BoxXy {
    type Coord = Xy;
}

impl BoundingBox for BoxXyz {
    type Coord = Xyz;

    fn zmin(&self) -> f64 {
        self.0[2]
    }

    fn zmax(&self) -> f64 {
        self.0[5]
    }
}

impl BoundingBox for BoxXym {
    type Coord = Xym;

    fn mmin(&self) -> f64 {
        self.0[2]
    }

    fn mmax(&self) -> f64 {
        self.0[5]
    }
}

impl BoundingBox for BoxXyzm {
    type Coord = Xyzm;

    fn zmin(&self) -> f64 {
        self.0[2]
    }

    fn mmin(&self) -> f64 {
        self.0[3]
    }

    fn zmax(&self) -> f64 {
        self.0[6]
    }

    fn mmax(&self) -> f64 {
        self.0[7]
    }
}

macro_rules! impl_coord_trait {
    ($type:ty, $dims:expr) => {
        impl geo_traits::CoordTrait for $type {
            type T = f64;

            fn dim(&self) -> geo_traits::Dimensions {
                $dims
            }

            fn nth_or_panic(&self, n: usize) -> Self::T {
                self.0[n]
            }

            fn x(&self) -> Self::T {
                self.0[0]
            }

            fn y(&self) -> Self::T {
                self.0[1]
            }
        }
    };
}

impl_coord_trait!(Xy, geo_traits::Dimensions::Xy);
impl_coord_trait!(Xyz, geo_traits::Dimensions::Xyz);
impl_coord_trait!(Xym, geo_traits::Dimensions::Xym);
impl_coord_trait!(Xyzm, geo_traits::Dimensions::Xyzm);

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn absent_ordinates_are_nan() {
        let c = Xy::new(1.0, 2.0);
        assert_eq!(c.x(), 1.0);
        assert_eq!(c.y(), 2.0);
        assert!(c.z().is_nan());
        assert!(c.m().is_nan());

        let c = Xym::new(1.0, 2.0, 5.0);
        assert!(c.z().is_nan());
        assert_eq!(c.m(), 5.0);
    }

    #[test]
    fn xyzm_round_trips_every_shape() {
        let (x, y, z, m) = (1.0, 2.0, 3.0, 4.0);

        let c = Xyz::from_xyzm(x, y, z, m);
        assert_eq!(c, Xyz::new(1.0, 2.0, 3.0));

        let c = Xym::from_xyzm(x, y, z, m);
        assert_eq!(c, Xym::new(1.0, 2.0, 4.0));

        let c = Xy::from_xyzm(x, y, z, m);
        assert_eq!(c, Xy::new(1.0, 2.0));

        let c = Xyzm::from_xyzm(x, y, z, m);
        assert_eq!((c.x(), c.y(), c.z(), c.m()), (x, y, z, m));
    }

    #[test]
    fn empty_box_sentinels() {
        let b = BoxXy::empty();
        assert_eq!(b.xmin(), f64::INFINITY);
        assert_eq!(b.ymin(), f64::INFINITY);
        assert_eq!(b.xmax(), f64::NEG_INFINITY);
        assert_eq!(b.ymax(), f64::NEG_INFINITY);

        // Absent dimensions read the same sentinels.
        assert_eq!(b.zmin(), f64::INFINITY);
        assert_eq!(b.zmax(), f64::NEG_INFINITY);

        assert!(!b.intersects(&b));
    }

    #[test]
    fn extend_and_merge() {
        let mut b = BoxXy::empty();
        b.extend(&Xy::new(1.0, 5.0));
        b.extend(&Xy::new(-2.0, 3.0));
        assert_eq!(b, BoxXy([-2.0, 3.0, 1.0, 5.0]));

        let mut other = BoxXy::empty();
        other.extend(&Xy::new(0.0, 10.0));
        b.merge(&other);
        assert_eq!(b, BoxXy([-2.0, 3.0, 1.0, 10.0]));
    }

    #[test]
    fn extend_ignores_nan() {
        let mut b = BoxXyz::empty();
        b.extend(&Xyz::new(1.0, 2.0, f64::NAN));
        b.extend(&Xyz::new(3.0, 0.0, -1.0));
        assert_eq!(b.zmin(), -1.0);
        assert_eq!(b.zmax(), -1.0);
        assert_eq!(b.xmin(), 1.0);
        assert_eq!(b.xmax(), 3.0);
    }

    #[test]
    fn box_intersects() {
        let a = BoxXy([0.0, 0.0, 2.0, 2.0]);
        let b = BoxXy([1.0, 1.0, 3.0, 3.0]);
        let c = BoxXy([5.0, 5.0, 6.0, 6.0]);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn geo_traits_interop() {
        use geo_traits::CoordTrait;

        let c = Xyzm::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(CoordTrait::dim(&c), geo_traits::Dimensions::Xyzm);
        assert_eq!(CoordTrait::x(&c), 1.0);
        assert_eq!(c.nth_or_panic(3), 4.0);
        assert_eq!(c.nth(2), Some(3.0));
        assert_eq!(c.nth(4), None);
    }
}
