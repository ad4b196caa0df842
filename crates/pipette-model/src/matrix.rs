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

//! # Well Matrix
//!
//! The read-only input of every solver: an ordered list of wells, each holding
//! exactly one reagent per slot. Reagent names are interned once into `PartId`s
//! by `WellMatrixBuilder`; the part of a well at a slot is stored in one flat
//! vector (`well * num_slots + slot`).
//!
//! ## Notes
//!
//! - Parts are keyed by `(slot, name)`: the same name in two slots yields two
//!   distinct parts, so every part has a single slot.
//! - Subsets (all wells needing one part) are derived on demand in natural
//!   order: by first appearance, scanning well by well and slot by slot.

use crate::{
    error::{ModelError, SlotArityMismatchError},
    index::{PartId, SlotIndex, WellIndex},
};
use rustc_hash::FxHashMap;

#[inline(always)]
fn flatten_index(num_slots: usize, well_index: WellIndex, slot_index: SlotIndex) -> usize {
    well_index.get() * num_slots + slot_index.get()
}

/// All wells that need one part.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Subset {
    part: PartId,
    slot: SlotIndex,
    wells: Vec<WellIndex>,
}

impl Subset {
    /// Creates a subset. `wells` must be free of duplicates.
    #[inline]
    pub fn new(part: PartId, slot: SlotIndex, wells: Vec<WellIndex>) -> Self {
        Self { part, slot, wells }
    }

    /// The reagent of this subset.
    #[inline]
    pub fn part(&self) -> PartId {
        self.part
    }

    /// The slot the reagent occupies.
    #[inline]
    pub fn slot(&self) -> SlotIndex {
        self.slot
    }

    /// The wells needing the reagent, in well order.
    #[inline]
    pub fn wells(&self) -> &[WellIndex] {
        &self.wells
    }

    /// Number of wells in the subset.
    #[inline]
    pub fn len(&self) -> usize {
        self.wells.len()
    }

    /// Returns `true` if no well needs the reagent.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.wells.is_empty()
    }

    /// Returns `true` if `well_index` belongs to the subset.
    #[inline]
    pub fn contains(&self, well_index: WellIndex) -> bool {
        self.wells.contains(&well_index)
    }
}

impl std::fmt::Display for Subset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Subset({}, wells: [", self.part)?;
        for (i, well) in self.wells.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", well.get())?;
        }
        write!(f, "])")
    }
}

/// A rectangular wells × slots matrix of interned reagents.
///
/// # Examples
///
/// ```rust
/// use pipette_model::index::{SlotIndex, WellIndex};
/// use pipette_model::matrix::WellMatrix;
///
/// let matrix = WellMatrix::from_rows(&[["p0", "r0"], ["p0", "r1"]]).unwrap();
/// assert_eq!(matrix.num_wells(), 2);
/// assert_eq!(matrix.num_slots(), 2);
/// assert_eq!(matrix.num_parts(), 3);
/// assert_eq!(
///     matrix.part(WellIndex::new(0), SlotIndex::new(0)),
///     matrix.part(WellIndex::new(1), SlotIndex::new(0))
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WellMatrix {
    num_slots: usize,
    parts: Vec<PartId>,
    part_slots: Vec<SlotIndex>,
    part_names: Vec<String>,
}

impl WellMatrix {
    /// Builds a matrix from rows of reagent names, one row per well.
    ///
    /// The slot arity is taken from the first row. An empty row list or an
    /// empty first row is rejected with `ModelError::NoSlots`.
    pub fn from_rows<R, S>(rows: &[R]) -> Result<Self, ModelError>
    where
        R: AsRef<[S]>,
        S: AsRef<str>,
    {
        let num_slots = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);
        let mut builder = WellMatrixBuilder::new(num_slots);
        for row in rows {
            builder.add_well(row.as_ref())?;
        }
        builder.build()
    }

    /// Number of wells.
    #[inline]
    pub fn num_wells(&self) -> usize {
        self.parts.len() / self.num_slots
    }

    /// Number of reagent slots per well.
    #[inline]
    pub fn num_slots(&self) -> usize {
        self.num_slots
    }

    /// Number of distinct interned parts.
    #[inline]
    pub fn num_parts(&self) -> usize {
        self.part_slots.len()
    }

    /// Number of (well, slot) deliveries, `wells · slots`.
    #[inline]
    pub fn num_operations(&self) -> usize {
        self.parts.len()
    }

    /// Returns `true` if the matrix has no wells.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Returns the part a well needs at a slot.
    ///
    /// # Panics
    ///
    /// Panics if `well_index` or `slot_index` is out of bounds.
    #[inline]
    pub fn part(&self, well_index: WellIndex, slot_index: SlotIndex) -> PartId {
        debug_assert!(
            well_index.get() < self.num_wells(),
            "called `WellMatrix::part` with well index out of bounds: the len is {} but the index is {}",
            self.num_wells(),
            well_index.get()
        );
        debug_assert!(
            slot_index.get() < self.num_slots,
            "called `WellMatrix::part` with slot index out of bounds: the len is {} but the index is {}",
            self.num_slots,
            slot_index.get()
        );

        self.parts[flatten_index(self.num_slots, well_index, slot_index)]
    }

    /// Returns the parts of one well, indexed by slot.
    #[inline]
    pub fn well_parts(&self, well_index: WellIndex) -> &[PartId] {
        debug_assert!(
            well_index.get() < self.num_wells(),
            "called `WellMatrix::well_parts` with well index out of bounds: the len is {} but the index is {}",
            self.num_wells(),
            well_index.get()
        );

        let start = well_index.get() * self.num_slots;
        &self.parts[start..start + self.num_slots]
    }

    /// Returns the slot a part occupies.
    #[inline]
    pub fn part_slot(&self, part: PartId) -> SlotIndex {
        debug_assert!(
            part.get() < self.num_parts(),
            "called `WellMatrix::part_slot` with part out of bounds: the len is {} but the index is {}",
            self.num_parts(),
            part.get()
        );

        self.part_slots[part.get()]
    }

    /// Returns the name a part was interned from.
    #[inline]
    pub fn part_name(&self, part: PartId) -> &str {
        &self.part_names[part.get()]
    }

    /// Returns `true` if `well_index` needs `part`.
    #[inline]
    pub fn needs(&self, well_index: WellIndex, part: PartId) -> bool {
        self.part(well_index, self.part_slot(part)) == part
    }

    /// Iterates over all wells.
    #[inline]
    pub fn wells(&self) -> impl DoubleEndedIterator<Item = WellIndex> + ExactSizeIterator {
        (0..self.num_wells()).map(WellIndex::new)
    }

    /// Iterates over all slots.
    #[inline]
    pub fn slots(&self) -> impl DoubleEndedIterator<Item = SlotIndex> + ExactSizeIterator {
        (0..self.num_slots).map(SlotIndex::new)
    }

    /// Iterates over all interned parts.
    #[inline]
    pub fn parts(&self) -> impl DoubleEndedIterator<Item = PartId> + ExactSizeIterator {
        (0..self.num_parts()).map(PartId::new)
    }

    /// Number of wells needing each part, indexed by `PartId`.
    pub fn part_counts(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.num_parts()];
        for part in &self.parts {
            counts[part.get()] += 1;
        }
        counts
    }

    /// Derives the per-part subsets in natural order.
    pub fn subsets(&self) -> Vec<Subset> {
        let mut subsets: Vec<Subset> = Vec::with_capacity(self.num_parts());
        let mut position: Vec<Option<usize>> = vec![None; self.num_parts()];
        for well in self.wells() {
            for slot in self.slots() {
                let part = self.part(well, slot);
                match position[part.get()] {
                    Some(i) => subsets[i].wells.push(well),
                    None => {
                        position[part.get()] = Some(subsets.len());
                        subsets.push(Subset::new(part, slot, vec![well]));
                    }
                }
            }
        }
        subsets
    }
}

impl std::fmt::Display for WellMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "WellMatrix ({} wells, {} slots, {} parts)",
            self.num_wells(),
            self.num_slots,
            self.num_parts()
        )?;
        for well in self.wells() {
            write!(f, "  {:>4}:", well.get())?;
            for part in self.well_parts(well) {
                write!(f, " {}", self.part_name(*part))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Incrementally assembles a `WellMatrix`, interning reagent names.
#[derive(Debug, Clone)]
pub struct WellMatrixBuilder {
    num_slots: usize,
    parts: Vec<PartId>,
    part_slots: Vec<SlotIndex>,
    part_names: Vec<String>,
    interned: FxHashMap<(SlotIndex, String), PartId>,
}

impl WellMatrixBuilder {
    /// Creates a builder for wells with `num_slots` reagent slots.
    pub fn new(num_slots: usize) -> Self {
        Self {
            num_slots,
            parts: Vec::new(),
            part_slots: Vec::new(),
            part_names: Vec::new(),
            interned: FxHashMap::default(),
        }
    }

    /// Number of wells added so far.
    #[inline]
    pub fn num_wells(&self) -> usize {
        if self.num_slots == 0 {
            0
        } else {
            self.parts.len() / self.num_slots
        }
    }

    /// Interns `(slot, name)` and returns its part id.
    pub fn intern(&mut self, slot_index: SlotIndex, name: &str) -> PartId {
        debug_assert!(
            slot_index.get() < self.num_slots,
            "called `WellMatrixBuilder::intern` with slot index out of bounds: the len is {} but the index is {}",
            self.num_slots,
            slot_index.get()
        );

        if let Some(&part) = self.interned.get(&(slot_index, name.to_owned())) {
            return part;
        }
        let part = PartId::new(self.part_slots.len());
        self.part_slots.push(slot_index);
        self.part_names.push(name.to_owned());
        self.interned.insert((slot_index, name.to_owned()), part);
        part
    }

    /// Appends a well given one reagent name per slot.
    pub fn add_well<S>(&mut self, names: &[S]) -> Result<WellIndex, ModelError>
    where
        S: AsRef<str>,
    {
        if self.num_slots == 0 {
            return Err(ModelError::NoSlots);
        }
        let well_index = WellIndex::new(self.num_wells());
        if names.len() != self.num_slots {
            return Err(SlotArityMismatchError {
                well_index,
                expected: self.num_slots,
                found: names.len(),
            }
            .into());
        }
        for (slot, name) in names.iter().enumerate() {
            let part = self.intern(SlotIndex::new(slot), name.as_ref());
            self.parts.push(part);
        }
        Ok(well_index)
    }

    /// Finishes the matrix.
    pub fn build(self) -> Result<WellMatrix, ModelError> {
        if self.num_slots == 0 {
            return Err(ModelError::NoSlots);
        }
        Ok(WellMatrix {
            num_slots: self.num_slots,
            parts: self.parts,
            part_slots: self.part_slots,
            part_names: self.part_names,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> WellMatrix {
        WellMatrix::from_rows(&[
            ["p0", "r0", "c0", "t0"],
            ["p0", "r1", "c1", "t1"],
            ["p0", "r2", "c2", "t2"],
        ])
        .unwrap()
    }

    #[test]
    fn test_interning_shares_parts_within_a_slot() {
        let m = scenario();
        assert_eq!(m.num_wells(), 3);
        assert_eq!(m.num_slots(), 4);
        assert_eq!(m.num_parts(), 10);
        assert_eq!(m.num_operations(), 12);
        let p0 = m.part(WellIndex::new(0), SlotIndex::new(0));
        assert_eq!(p0, m.part(WellIndex::new(2), SlotIndex::new(0)));
        assert_eq!(m.part_name(p0), "p0");
        assert_eq!(m.part_slot(p0), SlotIndex::new(0));
    }

    #[test]
    fn test_same_name_in_different_slots_is_distinct() {
        let m = WellMatrix::from_rows(&[["x", "x"]]).unwrap();
        assert_eq!(m.num_parts(), 2);
        let a = m.part(WellIndex::new(0), SlotIndex::new(0));
        let b = m.part(WellIndex::new(0), SlotIndex::new(1));
        assert_ne!(a, b);
        assert_eq!(m.part_slot(b), SlotIndex::new(1));
    }

    #[test]
    fn test_subsets_in_natural_order() {
        let m = scenario();
        let subsets = m.subsets();
        assert_eq!(subsets.len(), 10);
        assert_eq!(m.part_name(subsets[0].part()), "p0");
        assert_eq!(
            subsets[0].wells(),
            &[WellIndex::new(0), WellIndex::new(1), WellIndex::new(2)]
        );
        assert_eq!(m.part_name(subsets[1].part()), "r0");
        assert_eq!(m.part_name(subsets[2].part()), "c0");
        assert_eq!(m.part_name(subsets[4].part()), "r1");
        assert!(subsets[1..].iter().all(|s| s.len() == 1));
        let total: usize = subsets.iter().map(Subset::len).sum();
        assert_eq!(total, m.num_operations());
    }

    #[test]
    fn test_subsets_follow_first_appearance_well_by_well() {
        // Well 0 introduces a and x before well 1 introduces y.
        let m = WellMatrix::from_rows(&[["a", "x"], ["a", "y"], ["b", "y"]]).unwrap();
        let names: Vec<&str> = m.subsets().iter().map(|s| m.part_name(s.part())).collect();
        assert_eq!(names, vec!["a", "x", "y", "b"]);
    }

    #[test]
    fn test_needs_and_part_counts() {
        let m = scenario();
        let p0 = m.part(WellIndex::new(0), SlotIndex::new(0));
        let r1 = m.part(WellIndex::new(1), SlotIndex::new(1));
        assert!(m.needs(WellIndex::new(2), p0));
        assert!(!m.needs(WellIndex::new(0), r1));
        let counts = m.part_counts();
        assert_eq!(counts[p0.get()], 3);
        assert_eq!(counts[r1.get()], 1);
    }

    #[test]
    fn test_arity_mismatch_is_rejected() {
        let mut builder = WellMatrixBuilder::new(2);
        builder.add_well(&["a", "b"]).unwrap();
        let err = builder.add_well(&["a"]).unwrap_err();
        assert_eq!(
            err,
            ModelError::SlotArityMismatch(SlotArityMismatchError {
                well_index: WellIndex::new(1),
                expected: 2,
                found: 1,
            })
        );
    }

    #[test]
    fn test_zero_slots_is_rejected() {
        let rows: [[&str; 0]; 1] = [[]];
        assert_eq!(WellMatrix::from_rows(&rows), Err(ModelError::NoSlots));
        assert_eq!(WellMatrixBuilder::new(0).build(), Err(ModelError::NoSlots));
    }

    #[test]
    fn test_builder_without_wells_is_empty() {
        let m = WellMatrixBuilder::new(3).build().unwrap();
        assert!(m.is_empty());
        assert_eq!(m.num_wells(), 0);
        assert!(m.subsets().is_empty());
    }

    #[test]
    fn test_display_lists_wells() {
        let m = WellMatrix::from_rows(&[["a", "b"]]).unwrap();
        let s = m.to_string();
        assert!(s.contains("1 wells, 2 slots, 2 parts"));
        assert!(s.contains("0: a b"));
    }
}
