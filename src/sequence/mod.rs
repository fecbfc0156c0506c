//! Zero-copy sequence views over columnar geometry memory.
//!
//! [`CoordSequence`] is the leaf view: a strided window over per-ordinate buffers.
//! [`ListSequence`] nests any sequence behind Arrow list offsets. Geometry kind is encoded as
//! nesting depth, so the same algebra serves every kind; the depth-fixing aliases live in
//! [`crate::array`].

mod coords;
mod list;

pub use coords::{CoordSequence, CoordSequenceIter, StridedIter};
pub use list::{ListCursor, ListSequence};

use arrow_array::Array;

use crate::coord::CoordValue;
use crate::error::GeoSeqResult;

/// A zero-copy window over columnar geometry memory.
///
/// Implemented by [`CoordSequence`] and [`ListSequence`] only; list nesting over those two
/// types forms the whole view algebra. Views are cheap to clone (buffer handles are refcounted)
/// and safe to share across threads for concurrent reads.
pub trait Sequence: std::fmt::Debug + Clone {
    /// The leaf coordinate value type.
    type Coord: CoordValue;

    /// The per-element value: a coordinate at the leaf, a child window for lists.
    type Element;

    /// The number of elements in this view.
    fn len(&self) -> usize;

    /// The element at `i`.
    ///
    /// # Panics
    ///
    /// Panics iff `i >= self.len()`.
    fn value(&self, i: usize) -> Self::Element;

    /// The element at `i`, without the window bounds check.
    ///
    /// # Safety
    ///
    /// `i` must be less than `self.len()`.
    unsafe fn value_unchecked(&self, i: usize) -> Self::Element;

    /// Whether this view has no elements.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The element offset of this view into its underlying buffers.
    fn offset(&self) -> usize;

    /// Return a view over `length` elements starting at `offset`, counted within this view.
    ///
    /// # Panics
    ///
    /// Panics iff `offset + length > self.len()`.
    fn slice(&self, offset: usize, length: usize) -> Self;

    /// Flatten through every list level down to the coordinates under this view.
    fn coords(&self) -> CoordSequence<Self::Coord>;

    /// Build a view over an Arrow array of matching nesting depth.
    ///
    /// Each `List` level maps to a [`ListSequence`]. The leaf must be a FixedSizeList of
    /// Float64 (interleaved coordinates) or a Struct of Float64 fields (separated), at least as
    /// wide as [`Self::Coord`] requires. Field names and other schema metadata are not
    /// inspected.
    fn from_arrow(array: &dyn Array) -> GeoSeqResult<Self>;

    /// Reposition this view in place without touching buffer handles.
    ///
    /// `offset` is absolute, not relative to the current window. Cursors use this to step a
    /// stashed child; it is not part of the public contract.
    #[doc(hidden)]
    fn set_window(&mut self, offset: usize, length: usize);
}
