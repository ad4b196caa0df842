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

//! # Search State
//!
//! An immutable snapshot of a partial sequence. `with_delivery` returns the
//! successor state and leaves `self` untouched, so lookahead recursion can
//! branch freely without undo bookkeeping.
//!
//! Deliveries are identified by their position in the starting order the
//! search was built with.

use pipette_model::{
    index::PartId,
    mask::AddedMask,
    matrix::WellMatrix,
    oracle::CostOracle,
    sequence::{Delivery, Operation, Sequence},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchState {
    operations: Vec<Operation>,
    added: AddedMask,
    performed: Vec<bool>,
    remaining_per_part: Vec<usize>,
    cost: usize,
    run: usize,
}

impl SearchState {
    /// The empty state for `num_deliveries` deliveries of `matrix`.
    pub fn new(matrix: &WellMatrix, num_deliveries: usize) -> Self {
        Self {
            operations: Vec::with_capacity(num_deliveries),
            added: AddedMask::for_matrix(matrix),
            performed: vec![false; num_deliveries],
            remaining_per_part: matrix.part_counts(),
            cost: 0,
            run: 0,
        }
    }

    /// Tip changes so far.
    #[inline]
    pub fn cost(&self) -> usize {
        self.cost
    }

    /// Number of performed deliveries.
    #[inline]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Returns `true` once every delivery is performed.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.operations.len() == self.performed.len()
    }

    #[inline]
    pub fn last(&self) -> Option<&Operation> {
        self.operations.last()
    }

    #[inline]
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    #[inline]
    pub fn added(&self) -> &AddedMask {
        &self.added
    }

    #[inline]
    pub fn is_performed(&self, index: usize) -> bool {
        debug_assert!(
            index < self.performed.len(),
            "called `SearchState::is_performed` with index out of bounds: the len is {} but the index is {}",
            self.performed.len(),
            index
        );

        self.performed[index]
    }

    /// Deliveries of `part` not yet performed.
    #[inline]
    pub fn remaining_of(&self, part: PartId) -> usize {
        self.remaining_per_part[part.get()]
    }

    /// Iterates over `(part, remaining)` for every part with work left.
    pub fn remaining_parts(&self) -> impl Iterator<Item = (PartId, usize)> + '_ {
        self.remaining_per_part
            .iter()
            .enumerate()
            .filter(|&(_, &r)| r > 0)
            .map(|(p, &r)| (PartId::new(p), r))
    }

    /// Indices of the deliveries not yet performed, in starting order.
    pub fn pending(&self) -> impl Iterator<Item = usize> + '_ {
        self.performed
            .iter()
            .enumerate()
            .filter(|&(_, &done)| !done)
            .map(|(i, _)| i)
    }

    /// Cost of performing `candidate` next.
    #[inline]
    pub fn transition_cost(&self, oracle: &CostOracle<'_>, candidate: Delivery) -> usize {
        match self.operations.last() {
            None => 1,
            Some(last) => oracle.transition_cost(last.delivery(), candidate, &self.added, self.run),
        }
    }

    /// The state after performing delivery `index` (`candidate`).
    pub fn with_delivery(&self, oracle: &CostOracle<'_>, index: usize, candidate: Delivery) -> Self {
        debug_assert!(
            !self.is_performed(index),
            "called `SearchState::with_delivery` with delivery {} already performed",
            index
        );

        let t = self.transition_cost(oracle, candidate);
        let mut next = self.clone();
        next.operations.push(candidate.with_changed(t == 1));
        next.added.insert_delivery(oracle.matrix(), candidate);
        next.performed[index] = true;
        next.remaining_per_part[candidate.part.get()] -= 1;
        next.cost += t;
        next.run = if t == 1 { 1 } else { self.run + 1 };
        next
    }

    pub fn into_sequence(self) -> Sequence {
        Sequence::from(self.operations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipette_model::{
        capacity::{Capacity, CapacityMap},
        index::WellIndex,
    };

    #[test]
    fn test_with_delivery_leaves_parent_untouched() {
        let m = WellMatrix::from_rows(&[["a"], ["a"]]).unwrap();
        let caps = CapacityMap::unlimited(m.num_parts());
        let oracle = CostOracle::new(&m, &caps);
        let a = PartId::new(0);
        let root = SearchState::new(&m, 2);
        let first = root.with_delivery(&oracle, 1, Delivery::new(a, WellIndex::new(1)));

        assert!(root.is_empty());
        assert_eq!(root.remaining_of(a), 2);
        assert_eq!(first.cost(), 1);
        assert!(first.is_performed(1));
        assert!(!first.is_performed(0));
        assert_eq!(first.pending().collect::<Vec<_>>(), vec![0]);
        assert!(first.last().is_some_and(|op| op.changed));

        let second = first.with_delivery(&oracle, 0, Delivery::new(a, WellIndex::new(0)));
        assert_eq!(second.cost(), 1);
        assert!(second.is_complete());
        assert_eq!(second.remaining_parts().count(), 0);
    }

    #[test]
    fn test_run_resets_on_capacity() {
        let m = WellMatrix::from_rows(&[["a"], ["a"], ["a"]]).unwrap();
        let caps = CapacityMap::uniform(1, Capacity::Limited(2));
        let oracle = CostOracle::new(&m, &caps);
        let a = PartId::new(0);
        let mut state = SearchState::new(&m, 3);
        for i in 0..3 {
            state = state.with_delivery(&oracle, i, Delivery::new(a, WellIndex::new(i)));
        }
        let flags: Vec<bool> = state.operations().iter().map(|op| op.changed).collect();
        assert_eq!(flags, vec![true, false, true]);
        assert_eq!(state.into_sequence().cost(), 2);
    }
}
