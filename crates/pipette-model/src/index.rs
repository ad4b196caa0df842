// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! # Strongly Typed Indices
//!
//! Phantom-typed wrappers around `usize` so that wells, slots and parts can
//! never be mixed up. Every index compiles down to a transparent `usize`.
//!
//! ## Highlights
//!
//! - `TypedIndexTag` names the index space for `Display`/`Debug`.
//! - `TypedIndex<T>` offers `new`, `get` and `is_zero`.
//! - `WellIndex`, `SlotIndex` and `PartId` are the three index spaces of a
//!   well matrix.
//!
//! ```rust
//! use pipette_model::index::{PartId, WellIndex};
//!
//! let well = WellIndex::new(3);
//! assert_eq!(well.get(), 3);
//! assert_eq!(format!("{}", well), "WellIndex(3)");
//! assert_eq!(format!("{}", PartId::new(0)), "PartId(0)");
//! ```

/// Names an index space.
pub trait TypedIndexTag: Clone {
    const NAME: &'static str;
}

/// A `usize` index bound to the index space `T`.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypedIndex<T> {
    index: usize,
    _marker: std::marker::PhantomData<T>,
}

impl<T> TypedIndex<T> {
    /// Creates a new index.
    #[inline(always)]
    pub const fn new(index: usize) -> Self {
        Self {
            index,
            _marker: std::marker::PhantomData,
        }
    }

    /// Returns the underlying `usize`.
    #[inline(always)]
    pub const fn get(&self) -> usize {
        self.index
    }

    /// Returns `true` if this is the first index of its space.
    #[inline(always)]
    pub const fn is_zero(&self) -> bool {
        self.index == 0
    }
}

impl<T> std::fmt::Debug for TypedIndex<T>
where
    T: TypedIndexTag,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", T::NAME, self.index)
    }
}

impl<T> std::fmt::Display for TypedIndex<T>
where
    T: TypedIndexTag,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", T::NAME, self.index)
    }
}

impl<T> From<usize> for TypedIndex<T> {
    #[inline(always)]
    fn from(index: usize) -> Self {
        Self::new(index)
    }
}

impl<T> From<TypedIndex<T>> for usize {
    #[inline(always)]
    fn from(typed_index: TypedIndex<T>) -> Self {
        typed_index.index
    }
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct WellIndexTag;

impl TypedIndexTag for WellIndexTag {
    const NAME: &'static str = "WellIndex";
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct SlotIndexTag;

impl TypedIndexTag for SlotIndexTag {
    const NAME: &'static str = "SlotIndex";
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct PartIdTag;

impl TypedIndexTag for PartIdTag {
    const NAME: &'static str = "PartId";
}

/// Position of a well in the well matrix.
pub type WellIndex = TypedIndex<WellIndexTag>;

/// Position of a reagent slot (promoter, RBS, CDS, ...) within a well.
pub type SlotIndex = TypedIndex<SlotIndexTag>;

/// Interned reagent identifier. Every part belongs to exactly one slot.
pub type PartId = TypedIndex<PartIdTag>;
