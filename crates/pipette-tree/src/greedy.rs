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

//! # Greedy Best-First Search
//!
//! Scores every pending delivery with its transition cost plus a `Heuristic`
//! estimate of the tips still needed once it is performed, and appends the
//! lowest score. On equal scores a tip reuse beats a tip change.

use crate::{
    heuristic::Heuristic,
    search::{Score, incremental_search},
};
use pipette_model::{capacity::CapacityMap, matrix::WellMatrix};
use pipette_search::{
    error::SolveError, monitor::search_monitor::SearchMonitor, reorder::Reordering,
    result::SolverOutcome,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GreedySearch {
    heuristic: Heuristic,
    reordering: Reordering,
}

impl GreedySearch {
    #[inline]
    pub fn new(heuristic: Heuristic) -> Self {
        Self {
            heuristic,
            reordering: Reordering::Natural,
        }
    }

    #[inline]
    pub fn with_reordering(mut self, reordering: Reordering) -> Self {
        self.reordering = reordering;
        self
    }

    #[inline]
    pub fn heuristic(&self) -> Heuristic {
        self.heuristic
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
        let heuristic = self.heuristic;
        incremental_search(
            matrix,
            capacities,
            self.reordering,
            monitor,
            |oracle, deliveries, state, index, _| {
                let candidate = deliveries[index];
                let t = state.transition_cost(oracle, candidate);
                let next = state.with_delivery(oracle, index, candidate);
                Score::new(t + heuristic.estimate(&next, capacities), t)
            },
        )
    }
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

    const HEURISTICS: [Heuristic; 2] = [Heuristic::Optimistic, Heuristic::CapacityAware];

    fn scenario() -> WellMatrix {
        WellMatrix::from_rows(&[
            ["p0", "r0", "c0", "t0"],
            ["p0", "r1", "c1", "t1"],
            ["p0", "r2", "c2", "t2"],
        ])
        .unwrap()
    }

    fn solve(search: GreedySearch, matrix: &WellMatrix, caps: &CapacityMap) -> SolverOutcome {
        let mut search = search;
        search
            .solve(matrix, caps, &mut NoOpMonitor)
            .expect("search should solve")
    }

    #[test]
    fn test_scenario_costs_ten() {
        let m = scenario();
        let caps = CapacityMap::unlimited(m.num_parts());
        for heuristic in HEURISTICS {
            for reordering in [Reordering::Natural, Reordering::LeastOut] {
                let search = GreedySearch::new(heuristic).with_reordering(reordering);
                assert_eq!(solve(search, &m, &caps).cost(), 10, "{} {}", heuristic, reordering);
            }
        }
    }

    #[test]
    fn test_equal_scores_prefer_reusing_the_tip() {
        // After p0 at well 0, p0 at well 1 (reuse, ten parts left) and r0 at
        // well 0 (change, nine parts left) both score 10 under the optimistic
        // estimate. Taking the change first ends at 12.
        let m = scenario();
        let caps = CapacityMap::unlimited(m.num_parts());
        let outcome = solve(GreedySearch::new(Heuristic::Optimistic), &m, &caps);
        let second = outcome.sequence.operations()[1];
        assert_eq!(m.part_name(second.part), "p0");
        assert!(!second.changed);
        assert_eq!(outcome.cost(), 10);
    }

    #[test]
    fn test_degenerate_bounds() {
        let same = uniform_matrix(3, 2).unwrap();
        let caps = CapacityMap::unlimited(same.num_parts());
        let distinct = distinct_matrix(3, 2).unwrap();
        let distinct_caps = CapacityMap::unlimited(distinct.num_parts());
        for heuristic in HEURISTICS {
            assert_eq!(solve(GreedySearch::new(heuristic), &same, &caps).cost(), 2);
            assert_eq!(
                solve(GreedySearch::new(heuristic), &distinct, &distinct_caps).cost(),
                6
            );
        }
    }

    #[test]
    fn test_capacity_boundary_forces_one_extra_change() {
        let m = uniform_matrix(3, 1).unwrap();
        let caps = CapacityMap::uniform(1, Capacity::Limited(2));
        for heuristic in HEURISTICS {
            let outcome = solve(GreedySearch::new(heuristic), &m, &caps);
            let flags: Vec<bool> = outcome.sequence.iter().map(|op| op.changed).collect();
            assert_eq!(flags, vec![true, false, true]);
        }
    }

    #[test]
    fn test_costs_agree_with_replay() {
        let mut rng = StdRng::seed_from_u64(33);
        for round in 0..10 {
            let m = random_matrix(&mut rng, 4, &[2, 2, 3]).unwrap();
            let caps = if round % 2 == 0 {
                CapacityMap::unlimited(m.num_parts())
            } else {
                CapacityMap::uniform(m.num_parts(), Capacity::Limited(3))
            };
            for heuristic in HEURISTICS {
                let outcome = solve(GreedySearch::new(heuristic), &m, &caps);
                assert!(outcome.sequence.is_complete(&m));
                assert_eq!(
                    outcome.cost(),
                    independent_cost(&outcome.sequence, &m, &caps).cost,
                    "round {}",
                    round
                );
            }
        }
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        let m = uniform_matrix(2, 1).unwrap();
        let caps = CapacityMap::uniform(1, Capacity::Limited(0));
        let err = GreedySearch::new(Heuristic::Optimistic)
            .solve(&m, &caps, &mut NoOpMonitor)
            .unwrap_err();
        assert!(matches!(err, SolveError::InfeasibleCapacity(_)));
    }
}
