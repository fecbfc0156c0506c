use arrow_array::cast::AsArray;
use arrow_array::Array;
use arrow_buffer::OffsetBuffer;
use arrow_schema::DataType;

use crate::error::{GeoSeqError, GeoSeqResult};
use crate::sequence::{CoordSequence, Sequence};

/// A window of list elements whose offsets select runs of a child sequence.
///
/// Element `i` spans child positions `[offsets[offset + i], offsets[offset + i + 1])`, applied
/// as a further offset into the child view. One list level per geometry nesting level: rings
/// within polygons, polygons within multi-polygons, and so on.
///
/// Offsets are monotonic non-decreasing by `OffsetBuffer` construction, so element windows are
/// always well formed; only their reach into the child is validated here.
#[derive(Debug, Clone)]
pub struct ListSequence<S: Sequence> {
    offsets: OffsetBuffer<i32>,
    child: S,

    /// Offset of this view into the offsets buffer.
    offset: usize,

    /// Number of list elements in this view.
    length: usize,
}

pub(super) fn check<S: Sequence>(
    offsets: &OffsetBuffer<i32>,
    child: &S,
    offset: usize,
    length: usize,
) -> GeoSeqResult<()> {
    if offsets.len() < offset + length + 1 {
        return Err(GeoSeqError::InvalidArgument(format!(
            "offsets buffer holds {} values, too short for window offset {offset} length {length}",
            offsets.len()
        )));
    }

    if offsets[offset + length] as usize > child.len() {
        return Err(GeoSeqError::InvalidArgument(format!(
            "largest offset {} exceeds child length {}",
            offsets[offset + length],
            child.len()
        )));
    }

    Ok(())
}

impl<S: Sequence> ListSequence<S> {
    /// Create a new ListSequence from parts.
    ///
    /// # Errors
    ///
    /// - if the offsets buffer is too short for the requested window
    /// - if the window's largest offset exceeds the child length
    pub fn try_new(
        offsets: OffsetBuffer<i32>,
        child: S,
        offset: usize,
        length: usize,
    ) -> GeoSeqResult<Self> {
        check(&offsets, &child, offset, length)?;
        Ok(Self {
            offsets,
            child,
            offset,
            length,
        })
    }

    /// The number of list elements in this view.
    #[inline]
    pub fn len(&self) -> usize {
        self.length
    }

    /// Whether this view has no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// The offset of this view into the offsets buffer.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Access the underlying offsets buffer.
    pub fn offsets(&self) -> &OffsetBuffer<i32> {
        &self.offsets
    }

    /// Access the child sequence the offsets select from.
    pub fn child(&self) -> &S {
        &self.child
    }

    fn start_end(&self, i: usize) -> (usize, usize) {
        let start = self.offsets[self.offset + i] as usize;
        let end = self.offsets[self.offset + i + 1] as usize;
        (start, end)
    }

    /// The child window of element `i`.
    ///
    /// # Panics
    ///
    /// Panics iff `i >= self.len()`.
    pub fn value(&self, i: usize) -> S {
        assert!(i < self.length, "index out of bounds");
        unsafe { self.value_unchecked(i) }
    }

    /// The child window of element `i`, without the window bounds check.
    ///
    /// # Safety
    ///
    /// `i` must be less than `self.len()`.
    pub unsafe fn value_unchecked(&self, i: usize) -> S {
        let (start, end) = self.start_end(i);
        self.child.slice(start, end - start)
    }

    /// Collapse one nesting level: the single child window spanning every element of this view.
    ///
    /// For an empty view this is an empty child window positioned at the view's start.
    pub fn valid_child_elements(&self) -> S {
        let start = self.offsets[self.offset] as usize;
        let end = self.offsets[self.offset + self.length] as usize;
        self.child.slice(start, end - start)
    }

    /// Step through the child windows of this view with one reused child.
    pub fn children(&self) -> ListCursor<'_, S> {
        ListCursor {
            sequence: self,
            stash: self.child.clone(),
            child_base: self.child.offset(),
            index: 0,
        }
    }

    /// Slice this [`ListSequence`].
    ///
    /// Only the offsets window moves; the child and the offsets buffer are untouched.
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

    /// Slice this [`ListSequence`] without the window bounds check.
    ///
    /// # Safety
    ///
    /// `offset + length` must not exceed `self.len()`.
    #[inline]
    pub unsafe fn slice_unchecked(&self, offset: usize, length: usize) -> Self {
        Self {
            offsets: self.offsets.clone(),
            child: self.child.clone(),
            offset: self.offset + offset,
            length,
        }
    }
}

impl<S: Sequence> Sequence for ListSequence<S> {
    type Coord = S::Coord;
    type Element = S;

    fn len(&self) -> usize {
        self.length
    }

    fn value(&self, i: usize) -> S {
        ListSequence::value(self, i)
    }

    unsafe fn value_unchecked(&self, i: usize) -> S {
        ListSequence::value_unchecked(self, i)
    }

    fn offset(&self) -> usize {
        self.offset
    }

    fn slice(&self, offset: usize, length: usize) -> Self {
        ListSequence::slice(self, offset, length)
    }

    fn coords(&self) -> CoordSequence<S::Coord> {
        self.valid_child_elements().coords()
    }

    fn from_arrow(array: &dyn Array) -> GeoSeqResult<Self> {
        match array.data_type() {
            DataType::List(_) => {
                let array = array.as_list::<i32>();
                let child = S::from_arrow(array.values())?;
                Self::try_new(array.offsets().clone(), child, 0, array.len())
            }
            dt => Err(GeoSeqError::InvalidArgument(format!(
                "expected a List nesting level, got {dt:?}"
            ))),
        }
    }

    fn set_window(&mut self, offset: usize, length: usize) {
        self.offset = offset;
        self.length = length;
    }
}

/// Lending cursor over the child windows of a [`ListSequence`].
///
/// Deliberately not an [`Iterator`]: each step repositions one stashed child view in place and
/// lends it out, so stepping never clones buffer handles and only one child is live at a time.
#[derive(Debug)]
pub struct ListCursor<'a, S: Sequence> {
    sequence: &'a ListSequence<S>,
    stash: S,
    child_base: usize,
    index: usize,
}

impl<S: Sequence> ListCursor<'_, S> {
    /// Advance to the next child window, or `None` past the end.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<&S> {
        if self.index == self.sequence.len() {
            return None;
        }
        let (start, end) = self.sequence.start_end(self.index);
        self.index += 1;
        self.stash.set_window(self.child_base + start, end - start);
        Some(&self.stash)
    }
}

#[cfg(test)]
mod test {
    use arrow_buffer::ScalarBuffer;

    use super::*;
    use crate::coord::Xy;

    /// Six coordinates (0,1) .. (10,11) split into lists [2, 1, 0, 3].
    fn list_of_coords() -> ListSequence<CoordSequence<Xy>> {
        let values = ScalarBuffer::from((0..12).map(|v| v as f64).collect::<Vec<_>>());
        let coords = CoordSequence::from_interleaved(values, 2, 0, 6).unwrap();
        let offsets = OffsetBuffer::new(ScalarBuffer::from(vec![0i32, 2, 3, 3, 6]));
        ListSequence::try_new(offsets, coords, 0, 4).unwrap()
    }

    /// The same coordinates one level deeper: [[2, 1], [], [0, 3]].
    fn nested_lists() -> ListSequence<ListSequence<CoordSequence<Xy>>> {
        let inner = list_of_coords();
        let offsets = OffsetBuffer::new(ScalarBuffer::from(vec![0i32, 2, 2, 4]));
        ListSequence::try_new(offsets, inner, 0, 3).unwrap()
    }

    #[test]
    fn element_windows() {
        let list = list_of_coords();
        assert_eq!(list.len(), 4);
        assert_eq!(list.value(0).len(), 2);
        assert_eq!(list.value(1).len(), 1);
        assert_eq!(list.value(2).len(), 0);
        assert_eq!(list.value(3).len(), 3);

        assert_eq!(list.value(1).value(0), Xy::new(4., 5.));
        assert_eq!(list.value(3).value(2), Xy::new(10., 11.));
    }

    #[test]
    fn flatten_one_level() {
        let list = list_of_coords();
        let flat = list.valid_child_elements();
        assert_eq!(flat.len(), 6);
        assert_eq!(flat.value(0), Xy::new(0., 1.));

        let tail = list.slice(2, 2).valid_child_elements();
        assert_eq!(tail.len(), 3);
        assert_eq!(tail.value(0), Xy::new(6., 7.));

        let empty = list.slice(1, 0).valid_child_elements();
        assert_eq!(empty.len(), 0);
    }

    #[test]
    fn flatten_nested() {
        let nested = nested_lists();
        let coords = nested.coords();
        assert_eq!(coords.len(), 6);
        assert_eq!(coords.value(5), Xy::new(10., 11.));

        // Middle outer element is empty; flattening it reaches no coordinates.
        assert_eq!(nested.value(1).coords().len(), 0);
        // Dropping the first outer element drops its two inner lists' coordinates.
        assert_eq!(nested.slice(1, 2).coords().len(), 3);
    }

    #[test]
    fn cursor_matches_indexed_access() {
        let list = list_of_coords();
        let mut cursor = list.children();
        let mut seen = 0;
        while let Some(child) = cursor.next() {
            let expect = list.value(seen);
            assert_eq!(child.len(), expect.len());
            for i in 0..child.len() {
                assert_eq!(child.value(i), expect.value(i));
            }
            seen += 1;
        }
        assert_eq!(seen, list.len());
    }

    #[test]
    fn cursor_over_nested_slice() {
        let nested = nested_lists();
        let window = nested.slice(2, 1);
        let mut cursor = window.children();
        let child = cursor.next().unwrap();
        assert_eq!(child.len(), 2);
        assert_eq!(child.coords().len(), 3);
        assert!(cursor.next().is_none());
    }

    #[test]
    fn try_new_rejects_bad_windows() {
        let list = list_of_coords();

        // Window runs off the end of the offsets buffer.
        let err =
            ListSequence::try_new(list.offsets().clone(), list.child().clone(), 2, 3).unwrap_err();
        assert!(err.to_string().contains("too short"));

        // Largest offset reaches past the child.
        let short_child = list.child().slice(0, 4);
        let err =
            ListSequence::try_new(list.offsets().clone(), short_child, 0, 4).unwrap_err();
        assert!(err.to_string().contains("exceeds child length"));
    }

    #[test]
    #[should_panic(expected = "offset + length may not exceed")]
    fn slice_out_of_bounds() {
        list_of_coords().slice(3, 2);
    }
}
