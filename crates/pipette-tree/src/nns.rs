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

//! # Nearest Neighbour Search
//!
//! Appends, one at a time, the pending delivery with the lowest transition
//! cost. With `depth > 1` a candidate's cost also includes the cheapest
//! continuation of `depth - 1` further deliveries from the state it leads to.
//!
//! ## Notes
//!
//! - Lookahead branches on immutable `SearchState`s.
//! - Depth `d` costs O(N^d) oracle calls per step. Depth 1 is the classic
//!   nearest neighbour.

use crate::{
    search::{Score, incremental_search},
    state::SearchState,
};
use pipette_model::{
    capacity::CapacityMap,
    matrix::WellMatrix,
    oracle::CostOracle,
    sequence::Delivery,
};
use pipette_search::{
    error::SolveError, monitor::search_monitor::SearchMonitor, reorder::Reordering,
    result::SolverOutcome, stats::SolverStatistics,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NearestNeighbourSearch {
    depth: usize,
    reordering: Reordering,
}

impl Default for NearestNeighbourSearch {
    fn default() -> Self {
        Self::new(1)
    }
}

impl NearestNeighbourSearch {
    /// A search looking `depth` deliveries ahead. Depth 0 is treated as 1.
    #[inline]
    pub fn new(depth: usize) -> Self {
        Self {
            depth: depth.max(1),
            reordering: Reordering::Natural,
        }
    }

    #[inline]
    pub fn with_reordering(mut self, reordering: Reordering) -> Self {
        self.reordering = reordering;
        self
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    pub fn reordering(&self) -> Reordering {
        self.reordering
    }

    pub fn solve<M>(
        &mut self,
        matrix: &WellMatrix,
        capacities: &CapacityMap,
        monitor: &mut M,
    ) -> Result<SolverOutcome, SolveError>
    where
        M: SearchMonitor + ?Sized,
    {
        let depth = self.depth;
        incremental_search(
            matrix,
            capacities,
            self.reordering,
            monitor,
            |oracle, deliveries, state, index, stats| {
                let candidate = deliveries[index];
                let t = state.transition_cost(oracle, candidate);
                if depth > 1 {
                    let next = state.with_delivery(oracle, index, candidate);
                    Score::new(t + lookahead(oracle, deliveries, &next, depth - 1, stats), t)
                } else {
                    Score::new(t, t)
                }
            },
        )
    }
}

/// Cheapest cost of the next `depth` deliveries from `state`.
fn lookahead(
    oracle: &CostOracle<'_>,
    deliveries: &[Delivery],
    state: &SearchState,
    depth: usize,
    stats: &mut SolverStatistics,
) -> usize {
    let mut best: Option<usize> = None;
    for index in state.pending() {
        stats.on_lookahead_node();
        let candidate = deliveries[index];
        let mut cost = state.transition_cost(oracle, candidate);
        if depth > 1 {
            let next = state.with_delivery(oracle, index, candidate);
            cost += lookahead(oracle, deliveries, &next, depth - 1, stats);
        }
        if best.is_none_or(|b| cost < b) {
            best = Some(cost);
        }
    }
    best.unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipette_model::{
        capacity::Capacity,
        generator::{distinct_matrix, random_matrix, uniform_matrix},
        oracle::independent_cost,
    };
    use pipette_search::monitor::no_op::NoOpMonitor;
    use rand::{SeedableRng, rngs::StdRng};

    fn scenario() -> WellMatrix {
        WellMatrix::from_rows(&[
            ["p0", "r0", "c0", "t0"],
            ["p0", "r1", "c1", "t1"],
            ["p0", "r2", "c2", "t2"],
        ])
        .unwrap()
    }

    fn solve(search: NearestNeighbourSearch, matrix: &WellMatrix, caps: &CapacityMap) -> SolverOutcome {
        let mut search = search;
        search
            .solve(matrix, caps, &mut NoOpMonitor)
            .expect("search should solve")
    }

    #[test]
    fn test_scenario_costs_ten_at_every_depth() {
        let m = scenario();
        let caps = CapacityMap::unlimited(m.num_parts());
        for depth in 1..=3 {
            let outcome = solve(NearestNeighbourSearch::new(depth), &m, &caps);
            assert_eq!(outcome.cost(), 10, "depth {}", depth);
            assert!(outcome.sequence.is_complete(&m));
        }
    }

    #[test]
    fn test_first_delivery_opens_the_sequence() {
        let m = scenario();
        let caps = CapacityMap::unlimited(m.num_parts());
        let outcome = solve(NearestNeighbourSearch::new(1), &m, &caps);
        let first = outcome.sequence.operations()[0];
        assert!(first.changed);
        assert_eq!(m.part_name(first.part), "p0");
        assert_eq!(first.well.get(), 0);
    }

    #[test]
    fn test_degenerate_bounds() {
        let same = uniform_matrix(3, 2).unwrap();
        let caps = CapacityMap::unlimited(same.num_parts());
        assert_eq!(solve(NearestNeighbourSearch::new(1), &same, &caps).cost(), 2);

        let distinct = distinct_matrix(3, 2).unwrap();
        let caps = CapacityMap::unlimited(distinct.num_parts());
        assert_eq!(solve(NearestNeighbourSearch::new(2), &distinct, &caps).cost(), 6);
    }

    #[test]
    fn test_capacity_boundary_forces_one_extra_change() {
        let m = uniform_matrix(3, 1).unwrap();
        let caps = CapacityMap::uniform(1, Capacity::Limited(2));
        let outcome = solve(NearestNeighbourSearch::new(1), &m, &caps);
        let flags: Vec<bool> = outcome.sequence.iter().map(|op| op.changed).collect();
        assert_eq!(flags, vec![true, false, true]);
    }

    #[test]
    fn test_costs_agree_with_replay() {
        let mut rng = StdRng::seed_from_u64(21);
        for round in 0..10 {
            let m = random_matrix(&mut rng, 4, &[2, 3]).unwrap();
            let caps = if round % 2 == 0 {
                CapacityMap::unlimited(m.num_parts())
            } else {
                CapacityMap::uniform(m.num_parts(), Capacity::Limited(2))
            };
            for depth in [1, 2] {
                let outcome = solve(
                    NearestNeighbourSearch::new(depth).with_reordering(Reordering::LeastOut),
                    &m,
                    &caps,
                );
                let replay = independent_cost(&outcome.sequence, &m, &caps);
                assert!(outcome.sequence.is_complete(&m));
                assert_eq!(outcome.cost(), replay.cost, "round {}", round);
                assert!(replay.is_consistent());
            }
        }
    }

    #[test]
    fn test_is_deterministic_per_seed() {
        let mut rng = StdRng::seed_from_u64(8);
        let m = random_matrix(&mut rng, 4, &[3, 2]).unwrap();
        let caps = CapacityMap::unlimited(m.num_parts());
        let search = NearestNeighbourSearch::new(2).with_reordering(Reordering::Random { seed: Some(4) });
        assert_eq!(solve(search, &m, &caps).sequence, solve(search, &m, &caps).sequence);
    }

    #[test]
    fn test_lookahead_is_counted() {
        let m = uniform_matrix(2, 2).unwrap();
        let caps = CapacityMap::unlimited(m.num_parts());
        let shallow = solve(NearestNeighbourSearch::new(1), &m, &caps);
        assert_eq!(shallow.statistics.lookahead_nodes, 0);
        let deep = solve(NearestNeighbourSearch::new(2), &m, &caps);
        assert!(deep.statistics.lookahead_nodes > 0);
        assert_eq!(deep.statistics.steps, 4);
    }

    #[test]
    fn test_zero_depth_is_depth_one() {
        assert_eq!(NearestNeighbourSearch::new(0).depth(), 1);
    }
}
