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

//! # Operations and Sequences
//!
//! A `Delivery` is one "put reagent R into well W" step. An `Operation` is a
//! delivery plus the solver's tip decision: `changed` is `true` iff a fresh tip
//! is mounted immediately before it. A `Sequence` orders one operation per
//! (well, slot) pair; its cost is the number of tip changes.

use crate::{
    index::{PartId, SlotIndex, WellIndex},
    matrix::WellMatrix,
};

/// Reagent `part` into well `well`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Delivery {
    pub part: PartId,
    pub well: WellIndex,
}

impl Delivery {
    #[inline]
    pub const fn new(part: PartId, well: WellIndex) -> Self {
        Self { part, well }
    }

    /// The slot this delivery fills.
    #[inline]
    pub fn slot(&self, matrix: &WellMatrix) -> SlotIndex {
        matrix.part_slot(self.part)
    }

    /// Attaches a tip decision.
    #[inline]
    pub const fn with_changed(self, changed: bool) -> Operation {
        Operation {
            part: self.part,
            well: self.well,
            changed,
        }
    }
}

impl std::fmt::Display for Delivery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}->{}", self.part, self.well)
    }
}

/// A delivery together with its tip decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Operation {
    pub part: PartId,
    pub well: WellIndex,
    pub changed: bool,
}

impl Operation {
    #[inline]
    pub const fn new(part: PartId, well: WellIndex, changed: bool) -> Self {
        Self {
            part,
            well,
            changed,
        }
    }

    /// Drops the tip decision.
    #[inline]
    pub const fn delivery(&self) -> Delivery {
        Delivery::new(self.part, self.well)
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.changed {
            write!(f, "*")?;
        }
        write!(f, "{}->{}", self.part.get(), self.well.get())
    }
}

/// Number of tip changes in an operation list.
#[inline]
pub fn route_cost(operations: &[Operation]) -> usize {
    operations.iter().filter(|op| op.changed).count()
}

/// An ordered list of operations, the output of every solver.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Sequence {
    operations: Vec<Operation>,
}

impl Sequence {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            operations: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn push(&mut self, operation: Operation) {
        self.operations.push(operation);
    }

    #[inline]
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    #[inline]
    pub fn into_operations(self) -> Vec<Operation> {
        self.operations
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Operation> {
        self.operations.iter()
    }

    /// Number of tip changes, `Σ changed`.
    #[inline]
    pub fn cost(&self) -> usize {
        route_cost(&self.operations)
    }

    /// Overwrites every `changed` flag. `flags` must match the length.
    pub fn set_changed_flags(&mut self, flags: &[bool]) {
        debug_assert!(
            flags.len() == self.operations.len(),
            "called `Sequence::set_changed_flags` with mismatched flags: the len is {} but {} flags were given",
            self.operations.len(),
            flags.len()
        );

        for (op, &changed) in self.operations.iter_mut().zip(flags) {
            op.changed = changed;
        }
    }

    /// Returns `true` if every (well, slot) pair of `matrix` is delivered
    /// exactly once with its own part.
    pub fn is_complete(&self, matrix: &WellMatrix) -> bool {
        if self.operations.len() != matrix.num_operations() {
            return false;
        }
        let mut seen = vec![false; matrix.num_operations()];
        for op in &self.operations {
            if op.part.get() >= matrix.num_parts()
                || op.well.get() >= matrix.num_wells()
                || !matrix.needs(op.well, op.part)
            {
                return false;
            }
            let flat = op.well.get() * matrix.num_slots() + matrix.part_slot(op.part).get();
            if std::mem::replace(&mut seen[flat], true) {
                return false;
            }
        }
        true
    }

    /// Tip changes saved compared to a fresh tip for every delivery.
    pub fn tips_saved(&self) -> usize {
        self.len() - self.cost()
    }
}

impl FromIterator<Operation> for Sequence {
    fn from_iter<I: IntoIterator<Item = Operation>>(iter: I) -> Self {
        Self {
            operations: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<Operation>> for Sequence {
    fn from(operations: Vec<Operation>) -> Self {
        Self { operations }
    }
}

impl<'a> IntoIterator for &'a Sequence {
    type Item = &'a Operation;
    type IntoIter = std::slice::Iter<'a, Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.iter()
    }
}

impl std::fmt::Display for Sequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sequence(cost: {}, [", self.cost())?;
        for (i, op) in self.operations.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", op)?;
        }
        write!(f, "])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(part: usize, well: usize, changed: bool) -> Operation {
        Operation::new(PartId::new(part), WellIndex::new(well), changed)
    }

    #[test]
    fn test_route_cost_counts_changes() {
        let seq: Sequence = vec![op(0, 0, true), op(0, 1, false), op(1, 0, true)].into();
        assert_eq!(seq.cost(), 2);
        assert_eq!(seq.tips_saved(), 1);
        assert_eq!(route_cost(&[]), 0);
    }

    #[test]
    fn test_completeness_detects_missing_and_duplicate_pairs() {
        let m = WellMatrix::from_rows(&[["a", "b"], ["a", "c"]]).unwrap();
        // parts: a=0, b=1, c=2
        let full: Sequence = vec![
            op(0, 0, true),
            op(0, 1, false),
            op(1, 0, true),
            op(2, 1, true),
        ]
        .into();
        assert!(full.is_complete(&m));

        let dup: Sequence = vec![
            op(0, 0, true),
            op(0, 0, false),
            op(1, 0, true),
            op(2, 1, true),
        ]
        .into();
        assert!(!dup.is_complete(&m));

        let wrong_part: Sequence = vec![
            op(0, 0, true),
            op(0, 1, false),
            op(1, 0, true),
            op(1, 1, true),
        ]
        .into();
        assert!(!wrong_part.is_complete(&m));

        let short: Sequence = vec![op(0, 0, true)].into();
        assert!(!short.is_complete(&m));
    }

    #[test]
    fn test_set_changed_flags_overwrites() {
        let mut seq: Sequence = vec![op(0, 0, true), op(0, 1, true)].into();
        seq.set_changed_flags(&[true, false]);
        assert_eq!(seq.cost(), 1);
        assert!(!seq.operations()[1].changed);
    }

    #[test]
    fn test_display_marks_changes() {
        let seq: Sequence = vec![op(0, 0, true), op(0, 1, false)].into();
        assert_eq!(seq.to_string(), "Sequence(cost: 1, [*0->0 0->1])");
    }
}
