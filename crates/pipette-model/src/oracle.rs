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

//! # Validity/Cost Oracle
//!
//! Decides whether the tip of the last operation may be reused for a candidate
//! delivery (cost 0) or must be replaced (cost 1). Every solver evaluates its
//! transitions through this oracle and every produced sequence is checked
//! against `independent_cost`, a from-scratch replay.
//!
//! ## Rule
//!
//! 1. Nothing performed yet: a fresh tip is needed.
//! 2. A different reagent: a fresh tip is needed (tips are single-reagent).
//! 3. Same reagent: the tip touched the last well. For every other slot of the
//!    last well whose reagent was already delivered there, the candidate well
//!    must hold the same reagent at that slot, delivered as well. Otherwise
//!    the tip could carry that reagent over and must be replaced.
//! 4. Capacity: a tip that already served `k` consecutive deliveries of a
//!    reagent limited to `k` must be replaced.

use crate::{
    capacity::{Capacity, CapacityMap},
    index::WellIndex,
    mask::AddedMask,
    matrix::WellMatrix,
    sequence::{Delivery, Operation, Sequence},
};

/// Transition cost evaluator bound to one instance.
#[derive(Debug, Clone, Copy)]
pub struct CostOracle<'a> {
    matrix: &'a WellMatrix,
    capacities: &'a CapacityMap,
}

impl<'a> CostOracle<'a> {
    #[inline]
    pub fn new(matrix: &'a WellMatrix, capacities: &'a CapacityMap) -> Self {
        Self { matrix, capacities }
    }

    #[inline]
    pub fn matrix(&self) -> &'a WellMatrix {
        self.matrix
    }

    #[inline]
    pub fn capacities(&self) -> &'a CapacityMap {
        self.capacities
    }

    /// Capacity of the reagent of `delivery`.
    #[inline]
    pub fn capacity_of(&self, delivery: Delivery) -> Capacity {
        self.capacities.get(delivery.part)
    }

    /// Cost of performing `candidate` after `prefix`, with `added` holding the
    /// pairs delivered by `prefix`.
    pub fn cost(&self, prefix: &[Operation], candidate: Delivery, added: &AddedMask) -> usize {
        match prefix.last() {
            None => 1,
            Some(last) => self.transition_cost(
                last.delivery(),
                candidate,
                added,
                Self::trailing_run(prefix),
            ),
        }
    }

    /// Cost of `candidate` directly after `last`, where the current tip has
    /// performed `run` consecutive deliveries (including `last`).
    #[inline]
    pub fn transition_cost(
        &self,
        last: Delivery,
        candidate: Delivery,
        added: &AddedMask,
        run: usize,
    ) -> usize {
        if last.part != candidate.part
            || !self.is_contamination_safe(last.well, candidate, added)
            || self.capacity_of(candidate).is_exhausted_by(run)
        {
            1
        } else {
            0
        }
    }

    /// Returns `true` if a tip that just served `last_well` may serve
    /// `candidate` without carrying a foreign reagent over.
    pub fn is_contamination_safe(
        &self,
        last_well: WellIndex,
        candidate: Delivery,
        added: &AddedMask,
    ) -> bool {
        let m = self.matrix;
        m.slots().all(|slot| {
            let occupant = m.part(last_well, slot);
            occupant == candidate.part
                || !added.contains(last_well, slot)
                || (m.part(candidate.well, slot) == occupant && added.contains(candidate.well, slot))
        })
    }

    /// Number of trailing operations served by the current tip: everything
    /// back to and including the latest operation with `changed` set.
    pub fn trailing_run(prefix: &[Operation]) -> usize {
        match prefix.iter().rposition(|op| op.changed) {
            Some(i) => prefix.len() - i,
            None => prefix.len(),
        }
    }
}

/// Outcome of replaying a sequence from scratch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replay {
    /// Recomputed number of tip changes.
    pub cost: usize,
    /// Recomputed `changed` flag for every position.
    pub changed: Vec<bool>,
    /// Positions whose recomputed flag differs from the replayed sequence.
    /// A non-empty list does not imply the replayed flags are invalid.
    pub mismatches: Vec<usize>,
}

impl Replay {
    /// Returns `true` if every recomputed flag matches the input.
    #[inline]
    pub fn is_consistent(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Replays `sequence` through the oracle, ignoring its `changed` flags.
///
/// The first operation always takes a fresh tip; every later operation is
/// charged against the re-flagged prefix. The recomputed flags are the
/// lazy policy: change only when the oracle forces it.
///
/// # Examples
///
/// ```rust
/// use pipette_model::capacity::CapacityMap;
/// use pipette_model::index::{PartId, WellIndex};
/// use pipette_model::matrix::WellMatrix;
/// use pipette_model::oracle::independent_cost;
/// use pipette_model::sequence::{Operation, Sequence};
///
/// let matrix = WellMatrix::from_rows(&[["a"], ["a"]]).unwrap();
/// let caps = CapacityMap::unlimited(matrix.num_parts());
/// let seq: Sequence = vec![
///     Operation::new(PartId::new(0), WellIndex::new(0), true),
///     Operation::new(PartId::new(0), WellIndex::new(1), true),
/// ]
/// .into();
/// let replay = independent_cost(&seq, &matrix, &caps);
/// assert_eq!(replay.cost, 1);
/// assert_eq!(replay.mismatches, vec![1]);
/// ```
pub fn independent_cost(sequence: &Sequence, matrix: &WellMatrix, capacities: &CapacityMap) -> Replay {
    let oracle = CostOracle::new(matrix, capacities);
    let mut added = AddedMask::for_matrix(matrix);
    let mut replayed: Vec<Operation> = Vec::with_capacity(sequence.len());
    let mut mismatches = Vec::new();
    let mut cost = 0;

    for (i, op) in sequence.iter().enumerate() {
        let delivery = op.delivery();
        let step = oracle.cost(&replayed, delivery, &added);
        cost += step;
        added.insert_delivery(matrix, delivery);
        replayed.push(delivery.with_changed(step == 1));
        if (step == 1) != op.changed {
            mismatches.push(i);
        }
    }

    Replay {
        cost,
        changed: replayed.into_iter().map(|op| op.changed).collect(),
        mismatches,
    }
}
