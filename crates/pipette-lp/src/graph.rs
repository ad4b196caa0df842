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

//! # Contamination Graphs
//!
//! The chain solver visits subsets one after another. Once a subset is fully
//! delivered, a tip leaving one of its wells may carry that reagent into any
//! well outside the subset. `ContaminationMatrix` accumulates these unsafe
//! well pairs; `SubsetGraph` extracts the part that matters for one subset.
//!
//! ## Layout
//!
//! - `SubsetGraph` node 0 is the depot, node `i > 0` is `wells[i - 1]`.
//! - Arcs touching the depot weigh 0; an arc between two wells weighs 1 iff
//!   the pair is marked unsafe.

use fixedbitset::FixedBitSet;
use pipette_model::{index::WellIndex, matrix::Subset};

/// Progressive `wells × wells` matrix of unsafe tip moves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContaminationMatrix {
    num_wells: usize,
    unsafe_moves: FixedBitSet,
}

impl ContaminationMatrix {
    /// A matrix with every move safe.
    pub fn new(num_wells: usize) -> Self {
        Self {
            num_wells,
            unsafe_moves: FixedBitSet::with_capacity(num_wells * num_wells),
        }
    }

    #[inline]
    pub fn num_wells(&self) -> usize {
        self.num_wells
    }

    #[inline(always)]
    fn flat(&self, from: WellIndex, to: WellIndex) -> usize {
        debug_assert!(
            from.get() < self.num_wells && to.get() < self.num_wells,
            "called `ContaminationMatrix::flat` with well out of bounds: the len is {} but the indices are {} and {}",
            self.num_wells,
            from.get(),
            to.get()
        );

        from.get() * self.num_wells + to.get()
    }

    /// Returns `true` if moving a tip from `from` to `to` may contaminate `to`.
    #[inline]
    pub fn is_unsafe(&self, from: WellIndex, to: WellIndex) -> bool {
        self.unsafe_moves.contains(self.flat(from, to))
    }

    /// Records that `subset` has been delivered: moves from its wells to any
    /// well outside it become unsafe.
    pub fn mark_delivered(&mut self, subset: &Subset) {
        let mut inside = FixedBitSet::with_capacity(self.num_wells);
        for well in subset.wells() {
            inside.insert(well.get());
        }
        for &from in subset.wells() {
            for to in 0..self.num_wells {
                if !inside.contains(to) {
                    let i = self.flat(from, WellIndex::new(to));
                    self.unsafe_moves.insert(i);
                }
            }
        }
    }

    /// Number of unsafe moves.
    #[inline]
    pub fn count_unsafe(&self) -> usize {
        self.unsafe_moves.count_ones(..)
    }
}

/// The depot-augmented, weighted graph of one subset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubsetGraph {
    wells: Vec<WellIndex>,
    weights: FixedBitSet,
}

impl SubsetGraph {
    /// Extracts the graph of `subset` under the current contamination state.
    pub fn new(subset: &Subset, contamination: &ContaminationMatrix) -> Self {
        let wells = subset.wells().to_vec();
        let n = wells.len() + 1;
        let mut weights = FixedBitSet::with_capacity(n * n);
        for (i, &from) in wells.iter().enumerate() {
            for (j, &to) in wells.iter().enumerate() {
                if i != j && contamination.is_unsafe(from, to) {
                    weights.insert((i + 1) * n + (j + 1));
                }
            }
        }
        Self { wells, weights }
    }

    /// Builds a graph directly from the weight-1 arcs between wells, given
    /// as 1-based node pairs.
    pub fn from_unsafe_arcs(wells: Vec<WellIndex>, arcs: &[(usize, usize)]) -> Self {
        let n = wells.len() + 1;
        let mut weights = FixedBitSet::with_capacity(n * n);
        for &(i, j) in arcs {
            debug_assert!(
                i > 0 && j > 0 && i < n && j < n,
                "called `SubsetGraph::from_unsafe_arcs` with arc out of bounds: the len is {} but the arc is ({}, {})",
                n,
                i,
                j
            );
            weights.insert(i * n + j);
        }
        Self { wells, weights }
    }

    /// Number of nodes including the depot.
    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.wells.len() + 1
    }

    /// Number of wells.
    #[inline]
    pub fn num_wells(&self) -> usize {
        self.wells.len()
    }

    /// The well behind node `node > 0`.
    #[inline]
    pub fn well(&self, node: usize) -> WellIndex {
        debug_assert!(
            node > 0 && node <= self.wells.len(),
            "called `SubsetGraph::well` with node out of bounds: the len is {} but the index is {}",
            self.wells.len(),
            node
        );

        self.wells[node - 1]
    }

    /// Weight of arc `from -> to` (0 or 1).
    #[inline]
    pub fn weight(&self, from: usize, to: usize) -> usize {
        if self.weights.contains(from * self.num_nodes() + to) {
            1
        } else {
            0
        }
    }

    /// Returns `true` if a tip may move along `from -> to` between two wells.
    #[inline]
    pub fn is_safe(&self, from: usize, to: usize) -> bool {
        from != to && self.weight(from, to) == 0
    }
}

impl std::fmt::Display for SubsetGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SubsetGraph({} wells)", self.num_wells())?;
        for i in 1..self.num_nodes() {
            write!(f, "  {:>4}:", self.well(i).get())?;
            for j in 1..self.num_nodes() {
                if i == j {
                    write!(f, " -")?;
                } else {
                    write!(f, " {}", self.weight(i, j))?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipette_model::matrix::WellMatrix;

    #[test]
    fn test_delivered_subsets_mark_outgoing_moves() {
        let m = WellMatrix::from_rows(&[["a", "x"], ["a", "y"], ["b", "y"]]).unwrap();
        let subsets = m.subsets();
        let mut contamination = ContaminationMatrix::new(3);
        // subset a = {0, 1}
        contamination.mark_delivered(&subsets[0]);
        assert!(contamination.is_unsafe(WellIndex::new(0), WellIndex::new(2)));
        assert!(contamination.is_unsafe(WellIndex::new(1), WellIndex::new(2)));
        assert!(!contamination.is_unsafe(WellIndex::new(0), WellIndex::new(1)));
        assert!(!contamination.is_unsafe(WellIndex::new(2), WellIndex::new(0)));
        assert_eq!(contamination.count_unsafe(), 2);
    }

    #[test]
    fn test_subset_graph_reads_pairwise_weights() {
        let m = WellMatrix::from_rows(&[["a", "x"], ["a", "y"], ["b", "y"]]).unwrap();
        let subsets = m.subsets();
        let mut contamination = ContaminationMatrix::new(3);
        // a = {0, 1}, then x = {0}
        contamination.mark_delivered(&subsets[0]);
        contamination.mark_delivered(&subsets[1]);
        let y = &subsets[2];
        assert_eq!(m.part_name(y.part()), "y");

        let graph = SubsetGraph::new(y, &contamination);
        assert_eq!(graph.num_nodes(), 3);
        assert_eq!(graph.well(1), WellIndex::new(1));
        // 1 -> 2: well 1 got a, well 2 did not.
        assert_eq!(graph.weight(1, 2), 1);
        // 2 -> 1: well 2 holds b, which is not delivered yet.
        assert_eq!(graph.weight(2, 1), 0);
        assert_eq!(graph.weight(0, 1), 0);
        assert!(graph.is_safe(2, 1));
        assert!(!graph.is_safe(1, 1));
    }

    #[test]
    fn test_from_unsafe_arcs() {
        let graph = SubsetGraph::from_unsafe_arcs(
            vec![WellIndex::new(4), WellIndex::new(7)],
            &[(2, 1)],
        );
        assert_eq!(graph.weight(2, 1), 1);
        assert_eq!(graph.weight(1, 2), 0);
        assert_eq!(graph.well(2), WellIndex::new(7));
    }
}
