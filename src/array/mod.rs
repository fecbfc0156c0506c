//! Nullable geometry arrays: a sequence view plus an optional validity bitmap.
//!
//! Geometry kind is a compile-time choice of nesting depth, made once through the aliases at
//! the bottom of this module. Everything else (slicing, flattening, Arrow initialization) is
//! the depth-generic [`SequenceArray`].

use arrow_array::Array;
use arrow_buffer::NullBuffer;

use crate::coord::Coord;
use crate::error::{GeoSeqError, GeoSeqResult};
use crate::sequence::{CoordSequence, ListSequence, Sequence};

/// An array of geometries: element sequence plus validity.
///
/// `None` validity means every element is valid. The bitmap spans the underlying storage from
/// its origin, so bit `sequence.offset() + i` answers for element `i`; slicing moves only the
/// sequence window and leaves the bitmap untouched.
#[derive(Debug, Clone)]
pub struct SequenceArray<S: Sequence> {
    sequence: S,
    validity: Option<NullBuffer>,
}

pub(crate) fn check<S: Sequence>(sequence: &S, validity: Option<&NullBuffer>) -> GeoSeqResult<()> {
    if let Some(validity) = validity {
        if validity.len() < sequence.offset() + sequence.len() {
            return Err(GeoSeqError::InvalidArgument(format!(
                "validity bitmap holds {} bits, too short for window offset {} length {}",
                validity.len(),
                sequence.offset(),
                sequence.len()
            )));
        }
    }
    Ok(())
}

impl<S: Sequence> SequenceArray<S> {
    /// Create a new SequenceArray from parts
    ///
    /// # Panics
    ///
    /// - if the validity bitmap is too short for the sequence window
    pub fn new(sequence: S, validity: Option<NullBuffer>) -> Self {
        Self::try_new(sequence, validity).unwrap()
    }

    /// Create a new SequenceArray from parts
    ///
    /// # Errors
    ///
    /// - if the validity bitmap is too short for the sequence window
    pub fn try_new(sequence: S, validity: Option<NullBuffer>) -> GeoSeqResult<Self> {
        check(&sequence, validity.as_ref())?;
        Ok(Self { sequence, validity })
    }

    /// Build from an Arrow array whose nesting depth matches `S`.
    ///
    /// Only the top-level validity bitmap is modeled; bitmaps on nested list levels are
    /// ignored.
    pub fn from_arrow(array: &dyn Array) -> GeoSeqResult<Self> {
        let sequence = S::from_arrow(array)?;
        Self::try_new(sequence, array.nulls().cloned())
    }

    /// The number of elements in this array.
    #[inline]
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    /// Whether this array has no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Access the element sequence.
    pub fn sequence(&self) -> &S {
        &self.sequence
    }

    /// Access the validity bitmap, if any.
    pub fn validity(&self) -> Option<&NullBuffer> {
        self.validity.as_ref()
    }

    /// Whether element `i` is null.
    ///
    /// # Panics
    ///
    /// Panics iff `i >= self.len()`.
    pub fn is_null(&self, i: usize) -> bool {
        assert!(i < self.len(), "index out of bounds");
        self.validity
            .as_ref()
            .map(|v| v.is_null(self.sequence.offset() + i))
            .unwrap_or(false)
    }

    /// Whether element `i` is valid.
    ///
    /// # Panics
    ///
    /// Panics iff `i >= self.len()`.
    pub fn is_valid(&self, i: usize) -> bool {
        !self.is_null(i)
    }

    /// The number of null elements.
    pub fn null_count(&self) -> usize {
        self.validity
            .as_ref()
            .map(|v| v.slice(self.sequence.offset(), self.sequence.len()).null_count())
            .unwrap_or(0)
    }

    /// The element at `i`, whether or not that slot is null.
    ///
    /// # Panics
    ///
    /// Panics iff `i >= self.len()`.
    pub fn value(&self, i: usize) -> S::Element {
        self.sequence.value(i)
    }

    /// The element at `i`, or `None` when that slot is null.
    ///
    /// # Panics
    ///
    /// Panics iff `i >= self.len()`.
    pub fn get(&self, i: usize) -> Option<S::Element> {
        if self.is_null(i) {
            return None;
        }
        Some(self.sequence.value(i))
    }

    /// Iterate the elements, yielding `None` for null slots.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = Option<S::Element>> + '_ {
        (0..self.len()).map(|i| self.get(i))
    }

    /// Flatten through every nesting level down to the coordinates under this array.
    ///
    /// The flattened view covers the coordinate range of every element, including elements
    /// whose validity bit is unset.
    pub fn coords(&self) -> CoordSequence<S::Coord> {
        self.sequence.coords()
    }

    /// Slice this [`SequenceArray`].
    ///
    /// Only the sequence window moves; the validity bitmap is untouched and keeps answering
    /// through the window's storage offset.
    ///
    /// # Panics
    ///
    /// Panics iff `offset + length > self.len()`.
    #[inline]
    pub fn slice(&self, offset: usize, length: usize) -> Self {
        Self {
            sequence: self.sequence.slice(offset, length),
            validity: self.validity.clone(),
        }
    }
}

impl<S: Sequence> SequenceArray<S>
where
    S::Coord: Coord,
{
    /// The bounding box of every coordinate under this array, null slots included.
    pub fn bounds(&self) -> <S::Coord as Coord>::Box {
        self.coords().bounds()
    }
}

/// An array of points: coordinates with no nesting.
pub type PointArray<C> = SequenceArray<CoordSequence<C>>;

/// An array of linestrings: one list level over coordinates.
pub type LineStringArray<C> = SequenceArray<ListSequence<CoordSequence<C>>>;

/// An array of polygons: a list of rings, each a list of coordinates.
pub type PolygonArray<C> = SequenceArray<ListSequence<ListSequence<CoordSequence<C>>>>;

/// An array of multi-points: one list level over coordinates.
pub type MultiPointArray<C> = SequenceArray<ListSequence<CoordSequence<C>>>;

/// An array of multi-linestrings: a list of linestrings.
pub type MultiLineStringArray<C> = SequenceArray<ListSequence<ListSequence<CoordSequence<C>>>>;

/// An array of multi-polygons: a list of polygons.
pub type MultiPolygonArray<C> =
    SequenceArray<ListSequence<ListSequence<ListSequence<CoordSequence<C>>>>>;

/// An array of bounding boxes: box values with no nesting, stored minimums-then-maximums.
pub type BoxArray<B> = SequenceArray<CoordSequence<B>>;

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use arrow_array::{ArrayRef, FixedSizeListArray, Float64Array, ListArray, StructArray};
    use arrow_buffer::{OffsetBuffer, ScalarBuffer};
    use arrow_schema::{DataType, Field, Fields};

    use super::*;
    use crate::coord::{BoxXy, CoordValue, Xy, Xyz};

    fn interleaved_points(coords: &[(f64, f64)], validity: Option<NullBuffer>) -> ArrayRef {
        let mut values = Vec::with_capacity(coords.len() * 2);
        for (x, y) in coords {
            values.push(*x);
            values.push(*y);
        }
        let field = Arc::new(Field::new("item", DataType::Float64, false));
        Arc::new(FixedSizeListArray::new(
            field,
            2,
            Arc::new(Float64Array::from(values)),
            validity,
        ))
    }

    fn separated_points(xs: Vec<f64>, ys: Vec<f64>) -> ArrayRef {
        let fields = Fields::from(vec![
            Field::new("x", DataType::Float64, false),
            Field::new("y", DataType::Float64, false),
        ]);
        let arrays: Vec<ArrayRef> = vec![
            Arc::new(Float64Array::from(xs)),
            Arc::new(Float64Array::from(ys)),
        ];
        Arc::new(StructArray::new(fields, arrays, None))
    }

    fn linestrings(
        coords: &[(f64, f64)],
        offsets: Vec<i32>,
        validity: Option<NullBuffer>,
    ) -> ArrayRef {
        let points = interleaved_points(coords, None);
        let field = Arc::new(Field::new("vertices", points.data_type().clone(), false));
        Arc::new(ListArray::new(
            field,
            OffsetBuffer::new(ScalarBuffer::from(offsets)),
            points,
            validity,
        ))
    }

    #[test]
    fn point_array_from_arrow() {
        let array = interleaved_points(&[(0., 1.), (2., 3.), (4., 5.)], None);
        let points = PointArray::<Xy>::from_arrow(array.as_ref()).unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points.null_count(), 0);
        assert_eq!(points.value(1), Xy::new(2., 3.));
        assert_eq!(points.get(2), Some(Xy::new(4., 5.)));
    }

    #[test]
    fn separated_point_array_from_arrow() {
        let array = separated_points(vec![0., 2., 4.], vec![1., 3., 5.]);
        let points = PointArray::<Xy>::from_arrow(array.as_ref()).unwrap();
        assert_eq!(points.sequence().stride(), 1);
        assert_eq!(points.value(2), Xy::new(4., 5.));
    }

    #[test]
    fn validity_complement() {
        let validity = NullBuffer::from_iter([true, false, true, false]);
        let array = interleaved_points(&[(0., 1.), (2., 3.), (4., 5.), (6., 7.)], Some(validity));
        let points = PointArray::<Xy>::from_arrow(array.as_ref()).unwrap();

        assert_eq!(points.null_count(), 2);
        for i in 0..points.len() {
            assert_eq!(points.is_valid(i), !points.is_null(i));
        }
        assert_eq!(points.get(1), None);
        // The slot still holds addressable storage.
        assert_eq!(points.value(1), Xy::new(2., 3.));

        let collected: Vec<Option<Xy>> = points.iter().collect();
        assert_eq!(collected[0], Some(Xy::new(0., 1.)));
        assert_eq!(collected[3], None);
    }

    #[test]
    fn sliced_array_keeps_bitmap_alignment() {
        let validity = NullBuffer::from_iter([true, false, true, true]);
        let array = interleaved_points(&[(0., 1.), (2., 3.), (4., 5.), (6., 7.)], Some(validity));
        let points = PointArray::<Xy>::from_arrow(array.as_ref()).unwrap();

        let tail = points.slice(1, 3);
        assert_eq!(tail.len(), 3);
        assert!(tail.is_null(0));
        assert!(tail.is_valid(1));
        assert_eq!(tail.null_count(), 1);
        assert_eq!(tail.value(1), Xy::new(4., 5.));
    }

    #[test]
    fn linestring_array_from_arrow() {
        let array = linestrings(
            &[(0., 0.), (1., 1.), (2., 2.), (3., 3.), (4., 4.)],
            vec![0, 2, 2, 5],
            None,
        );
        let lines = LineStringArray::<Xy>::from_arrow(array.as_ref()).unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines.value(0).len(), 2);
        assert_eq!(lines.value(1).len(), 0);
        assert_eq!(lines.value(2).value(2), Xy::new(4., 4.));
        assert_eq!(lines.coords().len(), 5);
    }

    #[test]
    fn from_arrow_accepts_sliced_input() {
        let array = linestrings(
            &[(0., 0.), (1., 1.), (2., 2.), (3., 3.), (4., 4.)],
            vec![0, 2, 2, 5],
            None,
        );
        let tail = array.slice(1, 2);
        let lines = LineStringArray::<Xy>::from_arrow(tail.as_ref()).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines.value(0).len(), 0);
        assert_eq!(lines.value(1).len(), 3);
        assert_eq!(lines.value(1).value(0), Xy::new(2., 2.));
    }

    fn polygons(coords: &[(f64, f64)], ring_offsets: Vec<i32>, geom_offsets: Vec<i32>) -> ArrayRef {
        let rings = linestrings(coords, ring_offsets, None);
        let field = Arc::new(Field::new("rings", rings.data_type().clone(), false));
        Arc::new(ListArray::new(
            field,
            OffsetBuffer::new(ScalarBuffer::from(geom_offsets)),
            rings,
            None,
        ))
    }

    #[test]
    fn polygon_array_from_arrow() {
        let array = polygons(
            &[
                (0., 0.),
                (4., 0.),
                (4., 4.),
                (0., 4.),
                (1., 1.),
                (2., 1.),
                (1., 2.),
                (9., 9.),
                (10., 9.),
                (9., 10.),
            ],
            vec![0, 4, 7, 10],
            vec![0, 2, 3],
        );
        let polys = PolygonArray::<Xy>::from_arrow(array.as_ref()).unwrap();
        assert_eq!(polys.len(), 2);

        let first = polys.value(0);
        assert_eq!(first.len(), 2);
        assert_eq!(first.value(0).len(), 4);
        assert_eq!(first.value(1).value(2), Xy::new(1., 2.));

        let second = polys.value(1);
        assert_eq!(second.len(), 1);
        assert_eq!(second.value(0).value(0), Xy::new(9., 9.));

        assert_eq!(polys.coords().len(), 10);
        let tail = polys.slice(1, 1);
        assert_eq!(tail.value(0).value(0).value(1), Xy::new(10., 9.));
    }

    #[test]
    fn nesting_depth_mismatch() {
        let points = interleaved_points(&[(0., 1.)], None);
        let err = LineStringArray::<Xy>::from_arrow(points.as_ref()).unwrap_err();
        assert!(err.to_string().contains("expected a List nesting level"));

        let lines = linestrings(&[(0., 0.), (1., 1.)], vec![0, 2], None);
        let err = PointArray::<Xy>::from_arrow(lines.as_ref()).unwrap_err();
        assert!(err
            .to_string()
            .contains("expected FixedSizeList or Struct coordinates"));
    }

    #[test]
    fn dimension_too_wide_for_storage() {
        let array = interleaved_points(&[(0., 1.), (2., 3.)], None);
        let err = PointArray::<Xyz>::from_arrow(array.as_ref()).unwrap_err();
        assert!(err.to_string().contains("too narrow"));
    }

    #[test]
    fn bitmap_too_short_rejected() {
        let array = interleaved_points(&[(0., 1.), (2., 3.)], None);
        let points = PointArray::<Xy>::from_arrow(array.as_ref()).unwrap();
        let validity = NullBuffer::from_iter([true]);
        let err =
            SequenceArray::try_new(points.sequence().clone(), Some(validity)).unwrap_err();
        assert!(err.to_string().contains("too short"));
    }

    #[test]
    fn array_bounds() {
        let array = interleaved_points(&[(0., 10.), (-5., 3.), (2., 4.)], None);
        let points = PointArray::<Xy>::from_arrow(array.as_ref()).unwrap();
        assert_eq!(points.bounds(), BoxXy::from_ordinates([-5., 3., 2., 10.]));
    }
}
