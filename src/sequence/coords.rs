use arrow_array::cast::AsArray;
use arrow_array::types::Float64Type;
use arrow_array::Array;
use arrow_buffer::ScalarBuffer;
use arrow_schema::DataType;

use crate::coord::{Coord, CoordValue};
use crate::datatypes::{CoordType, Dimension};
use crate::error::{GeoSeqError, GeoSeqResult};
use crate::sequence::Sequence;

/// A strided window of coordinates over per-ordinate buffers.
///
/// Ordinate `d` of element `i` lives at `buffers[d][(offset + i) * stride]`. Separated storage
/// uses `stride == 1` with one buffer per ordinate; interleaved storage uses
/// `stride == stored width` with per-ordinate slices of the one underlying buffer supplying the
/// starting shifts. Both layouts read through the same two-level formula, so everything built
/// on top is layout-blind.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordSequence<C: CoordValue> {
    buffers: C::Buffers,
    stride: usize,

    /// Element offset of this view into the buffers.
    offset: usize,

    /// Number of elements in this view.
    length: usize,
}

pub(super) fn check<C: CoordValue>(
    buffers: &C::Buffers,
    stride: usize,
    offset: usize,
    length: usize,
) -> GeoSeqResult<()> {
    if stride != 1 && stride < C::NUM_ORDINATES {
        return Err(GeoSeqError::InvalidArgument(format!(
            "stride must be 1 (separated) or at least {} (interleaved), got {stride}",
            C::NUM_ORDINATES
        )));
    }

    if length > 0 {
        let last = (offset + length - 1) * stride;
        for (dim, buffer) in buffers.as_ref().iter().enumerate() {
            if buffer.len() <= last {
                return Err(GeoSeqError::InvalidArgument(format!(
                    "buffer for ordinate {dim} holds {} values, too short for window \
                     offset {offset} length {length} stride {stride}",
                    buffer.len()
                )));
            }
        }
    }

    Ok(())
}

impl<C: CoordValue> CoordSequence<C> {
    /// Create a new CoordSequence from per-ordinate buffers and an explicit stride.
    ///
    /// # Errors
    ///
    /// - if the stride is neither 1 nor at least the number of stored ordinates
    /// - if any buffer is too short for the requested window
    pub fn try_new(
        buffers: C::Buffers,
        stride: usize,
        offset: usize,
        length: usize,
    ) -> GeoSeqResult<Self> {
        check::<C>(&buffers, stride, offset, length)?;
        Ok(Self {
            buffers,
            stride,
            offset,
            length,
        })
    }

    /// Create a new CoordSequence over separated (one buffer per ordinate) storage.
    pub fn from_separated(buffers: C::Buffers, offset: usize, length: usize) -> GeoSeqResult<Self> {
        Self::try_new(buffers, 1, offset, length)
    }

    /// Create a new CoordSequence over one interleaved buffer of the given stored width.
    ///
    /// The width may exceed the ordinate count of `C`, in which case the trailing ordinates of
    /// every coordinate are simply never read.
    pub fn from_interleaved(
        values: ScalarBuffer<f64>,
        width: usize,
        offset: usize,
        length: usize,
    ) -> GeoSeqResult<Self> {
        if width < C::NUM_ORDINATES {
            return Err(GeoSeqError::InvalidArgument(format!(
                "interleaved width {width} too narrow for {} ordinates",
                C::NUM_ORDINATES
            )));
        }
        if (offset + length) * width > values.len() {
            return Err(GeoSeqError::InvalidArgument(format!(
                "interleaved buffer holds {} values, too short for window offset {offset} \
                 length {length} width {width}",
                values.len()
            )));
        }

        // Ordinate d reads the same buffer shifted d values to the right.
        let shifted: Vec<ScalarBuffer<f64>> = if length == 0 {
            (0..C::NUM_ORDINATES).map(|_| values.slice(0, 0)).collect()
        } else {
            (0..C::NUM_ORDINATES)
                .map(|d| values.slice(d, values.len() - d))
                .collect()
        };
        let buffers = C::Buffers::try_from(shifted)
            .map_err(|_| GeoSeqError::InvalidArgument("ordinate buffer arity mismatch".into()))?;
        Self::try_new(buffers, width, offset, length)
    }

    /// The number of coordinates in this view.
    #[inline]
    pub fn len(&self) -> usize {
        self.length
    }

    /// Whether this view has no coordinates.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// The element offset of this view into the buffers.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The element stride: 1 for separated storage, the stored width for interleaved.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// The coordinate layout of the underlying storage.
    pub fn coord_type(&self) -> CoordType {
        if self.stride == 1 {
            CoordType::Separated
        } else {
            CoordType::Interleaved
        }
    }

    /// The dimension of the coordinates.
    pub fn dim(&self) -> Dimension {
        C::DIMENSION
    }

    /// The coordinate at `i`.
    ///
    /// # Panics
    ///
    /// Panics iff `i >= self.len()`.
    pub fn value(&self, i: usize) -> C {
        assert!(i < self.length, "index out of bounds");
        unsafe { self.value_unchecked(i) }
    }

    /// The coordinate at `i`, without the window bounds check.
    ///
    /// # Safety
    ///
    /// `i` must be less than `self.len()`.
    pub unsafe fn value_unchecked(&self, i: usize) -> C {
        let at = (self.offset + i) * self.stride;
        let mut ordinates = C::Ordinates::default();
        let out = ordinates.as_mut();
        for (d, buffer) in self.buffers.as_ref().iter().enumerate() {
            out[d] = buffer[at];
        }
        C::from_ordinates(ordinates)
    }

    /// One raw ordinate of one coordinate.
    ///
    /// # Panics
    ///
    /// Panics iff `i >= self.len()` or `dim` is not a stored ordinate.
    pub fn ordinate(&self, i: usize, dim: usize) -> f64 {
        assert!(i < self.length, "index out of bounds");
        self.buffers.as_ref()[dim][(self.offset + i) * self.stride]
    }

    /// Iterate one ordinate of every coordinate in this view.
    ///
    /// # Panics
    ///
    /// Panics iff `dim` is not a stored ordinate.
    pub fn dim_values(&self, dim: usize) -> StridedIter<'_> {
        let buffer = &self.buffers.as_ref()[dim];
        let values: &[f64] = if self.length == 0 {
            &[]
        } else {
            &buffer[self.offset * self.stride..(self.offset + self.length - 1) * self.stride + 1]
        };
        StridedIter {
            values,
            stride: self.stride,
            front: 0,
            back: self.length,
        }
    }

    /// Iterate the coordinates of this view by value.
    pub fn iter(&self) -> CoordSequenceIter<'_, C> {
        CoordSequenceIter {
            sequence: self,
            front: 0,
            back: self.length,
        }
    }

    /// Slice this [`CoordSequence`].
    ///
    /// # Panics
    ///
    /// Panics iff `offset + length > self.len()`.
    #[inline]
    pub fn slice(&self, offset: usize, length: usize) -> Self {
        assert!(
            offset + length <= self.length,
            "offset + length may not exceed length of sequence"
        );
        unsafe { self.slice_unchecked(offset, length) }
    }

    /// Slice this [`CoordSequence`] without the window bounds check.
    ///
    /// # Safety
    ///
    /// `offset + length` must not exceed `self.len()`.
    #[inline]
    pub unsafe fn slice_unchecked(&self, offset: usize, length: usize) -> Self {
        Self {
            buffers: self.buffers.clone(),
            stride: self.stride,
            offset: self.offset + offset,
            length,
        }
    }
}

impl<C: Coord> CoordSequence<C> {
    /// The bounding box of every coordinate in this view.
    ///
    /// An empty view produces [`BoundingBox::empty`](crate::coord::BoundingBox::empty). NaN
    /// ordinates never widen a bound.
    pub fn bounds(&self) -> C::Box {
        let dims = C::NUM_ORDINATES;
        let mut ordinates = <C::Box as CoordValue>::Ordinates::default();
        let out = ordinates.as_mut();
        for d in 0..dims {
            let mut lo = f64::INFINITY;
            let mut hi = f64::NEG_INFINITY;
            for value in self.dim_values(d) {
                lo = lo.min(value);
                hi = hi.max(value);
            }
            out[d] = lo;
            out[dims + d] = hi;
        }
        C::Box::from_ordinates(ordinates)
    }
}

impl<C: CoordValue> Sequence for CoordSequence<C> {
    type Coord = C;
    type Element = C;

    fn len(&self) -> usize {
        self.length
    }

    fn value(&self, i: usize) -> C {
        CoordSequence::value(self, i)
    }

    unsafe fn value_unchecked(&self, i: usize) -> C {
        CoordSequence::value_unchecked(self, i)
    }

    fn offset(&self) -> usize {
        self.offset
    }

    fn slice(&self, offset: usize, length: usize) -> Self {
        CoordSequence::slice(self, offset, length)
    }

    fn coords(&self) -> CoordSequence<C> {
        self.clone()
    }

    fn from_arrow(array: &dyn Array) -> GeoSeqResult<Self> {
        match array.data_type() {
            DataType::FixedSizeList(_, width) => {
                let width = *width as usize;
                if width < C::NUM_ORDINATES {
                    return Err(GeoSeqError::InvalidArgument(format!(
                        "coordinate width {width} too narrow for {} ordinates",
                        C::NUM_ORDINATES
                    )));
                }
                let array = array.as_fixed_size_list();
                let values = array
                    .values()
                    .as_primitive_opt::<Float64Type>()
                    .ok_or_else(|| {
                        GeoSeqError::InvalidArgument(
                            "interleaved coordinate values must be Float64".to_string(),
                        )
                    })?;
                Self::from_interleaved(values.values().clone(), width, 0, array.len())
            }
            DataType::Struct(fields) => {
                if fields.len() < C::NUM_ORDINATES {
                    return Err(GeoSeqError::InvalidArgument(format!(
                        "{} coordinate fields too narrow for {} ordinates",
                        fields.len(),
                        C::NUM_ORDINATES
                    )));
                }
                let array = array.as_struct();
                let columns: Vec<ScalarBuffer<f64>> = array.columns()[..C::NUM_ORDINATES]
                    .iter()
                    .map(|column| {
                        column
                            .as_primitive_opt::<Float64Type>()
                            .map(|a| a.values().clone())
                            .ok_or_else(|| {
                                GeoSeqError::InvalidArgument(
                                    "separated coordinate fields must be Float64".to_string(),
                                )
                            })
                    })
                    .collect::<GeoSeqResult<_>>()?;
                let buffers = C::Buffers::try_from(columns).map_err(|_| {
                    GeoSeqError::InvalidArgument("ordinate buffer arity mismatch".into())
                })?;
                Self::from_separated(buffers, 0, array.len())
            }
            dt => Err(GeoSeqError::InvalidArgument(format!(
                "expected FixedSizeList or Struct coordinates, got {dt:?}"
            ))),
        }
    }

    fn set_window(&mut self, offset: usize, length: usize) {
        self.offset = offset;
        self.length = length;
    }
}

impl<'a, C: CoordValue> IntoIterator for &'a CoordSequence<C> {
    type Item = C;
    type IntoIter = CoordSequenceIter<'a, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the coordinates of a [`CoordSequence`].
#[derive(Debug, Clone)]
pub struct CoordSequenceIter<'a, C: CoordValue> {
    sequence: &'a CoordSequence<C>,
    front: usize,
    back: usize,
}

impl<C: CoordValue> Iterator for CoordSequenceIter<'_, C> {
    type Item = C;

    fn next(&mut self) -> Option<C> {
        if self.front == self.back {
            return None;
        }
        let value = unsafe { self.sequence.value_unchecked(self.front) };
        self.front += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.back - self.front;
        (len, Some(len))
    }
}

impl<C: CoordValue> DoubleEndedIterator for CoordSequenceIter<'_, C> {
    fn next_back(&mut self) -> Option<C> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        Some(unsafe { self.sequence.value_unchecked(self.back) })
    }
}

impl<C: CoordValue> ExactSizeIterator for CoordSequenceIter<'_, C> {}

impl<C: CoordValue> std::iter::FusedIterator for CoordSequenceIter<'_, C> {}

/// Iterator over one ordinate of every coordinate in a [`CoordSequence`].
#[derive(Debug, Clone)]
pub struct StridedIter<'a> {
    values: &'a [f64],
    stride: usize,
    front: usize,
    back: usize,
}

impl Iterator for StridedIter<'_> {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        if self.front == self.back {
            return None;
        }
        let value = self.values[self.front * self.stride];
        self.front += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.back - self.front;
        (len, Some(len))
    }
}

impl DoubleEndedIterator for StridedIter<'_> {
    fn next_back(&mut self) -> Option<f64> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        Some(self.values[self.back * self.stride])
    }
}

impl ExactSizeIterator for StridedIter<'_> {}

impl std::iter::FusedIterator for StridedIter<'_> {}

#[cfg(test)]
mod test {
    use super::*;
    use crate::coord::{BoundingBox, BoxXy, CoordValue, Xy, Xyz};

    fn interleaved_xy() -> CoordSequence<Xy> {
        // Four coordinates: (0,1) (2,3) (4,5) (6,7)
        let values = ScalarBuffer::from(vec![0., 1., 2., 3., 4., 5., 6., 7.]);
        CoordSequence::from_interleaved(values, 2, 0, 4).unwrap()
    }

    fn separated_xy() -> CoordSequence<Xy> {
        let x = ScalarBuffer::from(vec![0., 2., 4., 6.]);
        let y = ScalarBuffer::from(vec![1., 3., 5., 7.]);
        CoordSequence::from_separated([x, y], 0, 4).unwrap()
    }

    #[test]
    fn interleaved_addressing() {
        let seq = interleaved_xy();
        assert_eq!(seq.len(), 4);
        assert_eq!(seq.stride(), 2);
        assert_eq!(seq.coord_type(), CoordType::Interleaved);
        for i in 0..4 {
            assert_eq!(seq.value(i), Xy::new((2 * i) as f64, (2 * i + 1) as f64));
            assert_eq!(seq.ordinate(i, 0), (2 * i) as f64);
            assert_eq!(seq.ordinate(i, 1), (2 * i + 1) as f64);
        }
    }

    #[test]
    fn separated_addressing() {
        let seq = separated_xy();
        assert_eq!(seq.stride(), 1);
        assert_eq!(seq.coord_type(), CoordType::Separated);
        for i in 0..4 {
            assert_eq!(seq.value(i), interleaved_xy().value(i));
        }
    }

    #[test]
    fn wide_interleaved_storage() {
        // XYZM-packed storage read through an XY view: z/m lanes are skipped.
        let values = ScalarBuffer::from(vec![
            1., 2., 90., 91., //
            3., 4., 92., 93.,
        ]);
        let seq: CoordSequence<Xy> = CoordSequence::from_interleaved(values, 4, 0, 2).unwrap();
        assert_eq!(seq.value(0), Xy::new(1., 2.));
        assert_eq!(seq.value(1), Xy::new(3., 4.));
    }

    #[test]
    fn narrow_interleaved_rejected() {
        let values = ScalarBuffer::from(vec![1., 2., 3., 4.]);
        let err = CoordSequence::<Xyz>::from_interleaved(values, 2, 0, 2).unwrap_err();
        assert!(err.to_string().contains("too narrow"));
    }

    #[test]
    fn short_buffer_rejected() {
        let x = ScalarBuffer::from(vec![0., 2., 4.]);
        let y = ScalarBuffer::from(vec![1., 3.]);
        assert!(CoordSequence::<Xy>::from_separated([x, y], 0, 3).is_err());
    }

    #[test]
    fn slice_composes() {
        for seq in [interleaved_xy(), separated_xy()] {
            let twice = seq.slice(1, 3).slice(1, 2);
            let once = seq.slice(2, 2);
            assert_eq!(twice.len(), 2);
            let a: Vec<Xy> = twice.iter().collect();
            let b: Vec<Xy> = once.iter().collect();
            assert_eq!(a, b);
            assert_eq!(twice.value(0), seq.value(2));
        }
    }

    #[test]
    #[should_panic(expected = "offset + length may not exceed")]
    fn slice_out_of_bounds() {
        interleaved_xy().slice(2, 3);
    }

    #[test]
    fn dim_values_strided() {
        let seq = interleaved_xy();
        let xs: Vec<f64> = seq.dim_values(0).collect();
        assert_eq!(xs, vec![0., 2., 4., 6.]);
        let ys: Vec<f64> = seq.dim_values(1).rev().collect();
        assert_eq!(ys, vec![7., 5., 3., 1.]);
        assert_eq!(seq.dim_values(0).len(), 4);

        let sliced = seq.slice(1, 2);
        let xs: Vec<f64> = sliced.dim_values(0).collect();
        assert_eq!(xs, vec![2., 4.]);
    }

    #[test]
    fn dim_values_empty() {
        let seq = interleaved_xy().slice(4, 0);
        assert_eq!(seq.dim_values(0).count(), 0);
        assert_eq!(seq.dim_values(1).next_back(), None);
    }

    #[test]
    fn by_value_iteration() {
        let seq = separated_xy();
        let forward: Vec<Xy> = seq.iter().collect();
        assert_eq!(forward.len(), 4);
        assert_eq!(forward[3], Xy::new(6., 7.));

        let mut it = seq.iter();
        assert_eq!(it.next_back(), Some(Xy::new(6., 7.)));
        assert_eq!(it.next(), Some(Xy::new(0., 1.)));
        assert_eq!(it.len(), 2);
    }

    #[test]
    fn bounds_fold() {
        let seq = interleaved_xy();
        assert_eq!(seq.bounds(), BoxXy::from_ordinates([0., 1., 6., 7.]));

        let empty = seq.slice(0, 0);
        assert_eq!(empty.bounds(), BoxXy::empty());
    }
}
