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

//! Delivered (well, slot) pairs during a simulated replay.
//!
//! The mask only ever grows. Each solver owns its masks; lookahead and the
//! dynamic program clone them instead of sharing.

use crate::{
    index::{SlotIndex, WellIndex},
    matrix::WellMatrix,
    sequence::Delivery,
};
use fixedbitset::FixedBitSet;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AddedMask {
    num_slots: usize,
    bits: FixedBitSet,
}

impl AddedMask {
    /// An empty mask for `num_wells × num_slots` pairs.
    #[inline]
    pub fn new(num_wells: usize, num_slots: usize) -> Self {
        Self {
            num_slots,
            bits: FixedBitSet::with_capacity(num_wells * num_slots),
        }
    }

    /// An empty mask shaped like `matrix`.
    #[inline]
    pub fn for_matrix(matrix: &WellMatrix) -> Self {
        Self::new(matrix.num_wells(), matrix.num_slots())
    }

    #[inline(always)]
    fn flat(&self, well_index: WellIndex, slot_index: SlotIndex) -> usize {
        debug_assert!(
            slot_index.get() < self.num_slots,
            "called `AddedMask::flat` with slot index out of bounds: the len is {} but the index is {}",
            self.num_slots,
            slot_index.get()
        );

        well_index.get() * self.num_slots + slot_index.get()
    }

    /// Marks a pair as delivered.
    #[inline]
    pub fn insert(&mut self, well_index: WellIndex, slot_index: SlotIndex) {
        let i = self.flat(well_index, slot_index);
        self.bits.insert(i);
    }

    /// Returns `true` if the pair was delivered.
    #[inline]
    pub fn contains(&self, well_index: WellIndex, slot_index: SlotIndex) -> bool {
        self.bits.contains(self.flat(well_index, slot_index))
    }

    /// Marks a delivery as performed.
    #[inline]
    pub fn insert_delivery(&mut self, matrix: &WellMatrix, delivery: Delivery) {
        self.insert(delivery.well, matrix.part_slot(delivery.part));
    }

    /// Returns `true` if the delivery was performed.
    #[inline]
    pub fn contains_delivery(&self, matrix: &WellMatrix, delivery: Delivery) -> bool {
        self.contains(delivery.well, matrix.part_slot(delivery.part))
    }

    /// Number of delivered pairs.
    #[inline]
    pub fn count(&self) -> usize {
        self.bits.count_ones(..)
    }

    /// Returns `true` if nothing was delivered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits.is_clear()
    }

    /// Returns a copy with one more delivered pair.
    #[inline]
    pub fn with(&self, well_index: WellIndex, slot_index: SlotIndex) -> Self {
        let mut next = self.clone();
        next.insert(well_index, slot_index);
        next
    }
}
