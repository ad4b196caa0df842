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

//! # Subset Orders for the Chain Solver
//!
//! The chain solver is order sensitive: a subset visited late sees more
//! unsafe arcs. Besides the static `Reordering`s, two orders are built on the
//! fly. Both keep the first subset in natural order first and score every
//! remaining candidate by the number of chains the solver's own backend needs
//! for it under the current contamination matrix.
//!
//! - `NearestNeighbour { depth }` adds the best continuation up to `depth`
//!   subsets ahead on a cloned matrix.
//! - `Greedy` adds the unsafe moves the candidate would leave behind, weighted
//!   by the number of subsets still to come after it.
//!
//! Candidates are scanned in natural order and ties go to the first.

use crate::{
    cover::ChainCoverBackend,
    graph::{ContaminationMatrix, SubsetGraph},
};
use pipette_model::{
    capacity::CapacityMap,
    matrix::{Subset, WellMatrix},
};
use pipette_search::{
    reorder::{Reordering, reorder_subsets},
    stats::SolverStatistics,
};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainReordering {
    Fixed(Reordering),
    NearestNeighbour { depth: usize },
    Greedy,
}

impl Default for ChainReordering {
    fn default() -> Self {
        ChainReordering::Fixed(Reordering::default())
    }
}

impl From<Reordering> for ChainReordering {
    fn from(reordering: Reordering) -> Self {
        ChainReordering::Fixed(reordering)
    }
}

impl std::fmt::Display for ChainReordering {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChainReordering::Fixed(reordering) => write!(f, "{}", reordering),
            ChainReordering::NearestNeighbour { depth } => {
                write!(f, "NearestNeighbour(depth: {})", depth)
            }
            ChainReordering::Greedy => write!(f, "Greedy"),
        }
    }
}

/// Orders the subsets of `matrix` for the chain solver.
///
/// The dynamic orders call `backend` once per scored candidate, each call
/// bounded by `time_limit`.
pub fn order_subsets<B>(
    matrix: &WellMatrix,
    capacities: &CapacityMap,
    order: ChainReordering,
    backend: &mut B,
    time_limit: Option<Duration>,
    statistics: &mut SolverStatistics,
) -> Vec<Subset>
where
    B: ChainCoverBackend + ?Sized,
{
    if let ChainReordering::Fixed(reordering) = order {
        return reorder_subsets(matrix.subsets(), matrix, reordering);
    }

    let mut scorer = Scorer {
        capacities,
        backend,
        time_limit,
        statistics,
    };
    let subsets = matrix.subsets();
    let mut remaining: Vec<usize> = (0..subsets.len()).collect();
    let mut contamination = ContaminationMatrix::new(matrix.num_wells());
    let mut ordered = Vec::with_capacity(subsets.len());

    let mut visit = |chosen: usize, contamination: &mut ContaminationMatrix| {
        contamination.mark_delivered(&subsets[chosen]);
        ordered.push(subsets[chosen].clone());
    };

    if !remaining.is_empty() {
        let first = remaining.remove(0);
        visit(first, &mut contamination);
    }
    while !remaining.is_empty() {
        let pos = match order {
            ChainReordering::NearestNeighbour { depth } => {
                scorer.best_lookahead(&subsets, &remaining, &contamination, depth.max(1))
            }
            _ => scorer.best_countall(&subsets, &remaining, &contamination),
        }
        .map_or(0, |(pos, _)| pos);
        let chosen = remaining.remove(pos);
        visit(chosen, &mut contamination);
    }
    ordered
}

struct Scorer<'a, B: ?Sized> {
    capacities: &'a CapacityMap,
    backend: &'a mut B,
    time_limit: Option<Duration>,
    statistics: &'a mut SolverStatistics,
}

impl<B> Scorer<'_, B>
where
    B: ChainCoverBackend + ?Sized,
{
    /// Chains needed for `subset` right now. Single wells skip the backend.
    fn chains(&mut self, subset: &Subset, contamination: &ContaminationMatrix) -> usize {
        self.statistics.on_lookahead_node();
        if subset.len() <= 1 {
            return 1;
        }
        let graph = SubsetGraph::new(subset, contamination);
        let deadline = self.time_limit.map(|limit| Instant::now() + limit);
        self.backend
            .solve_chain_cover(
                &graph,
                self.capacities.get(subset.part()),
                deadline,
                self.statistics,
            )
            .num_chains()
    }

    /// Position in `remaining` of the cheapest next subset and its lookahead cost.
    fn best_lookahead(
        &mut self,
        subsets: &[Subset],
        remaining: &[usize],
        contamination: &ContaminationMatrix,
        depth: usize,
    ) -> Option<(usize, usize)> {
        let mut best: Option<(usize, usize)> = None;
        for (pos, &index) in remaining.iter().enumerate() {
            let subset = &subsets[index];
            let mut cost = self.chains(subset, contamination);

            if depth > 1 && remaining.len() > 1 {
                let mut next = contamination.clone();
                next.mark_delivered(subset);
                let rest: Vec<usize> = remaining.iter().copied().filter(|&r| r != index).collect();
                if let Some((_, ahead)) = self.best_lookahead(subsets, &rest, &next, depth - 1) {
                    cost += ahead;
                }
            }

            if best.is_none_or(|(_, c)| cost < c) {
                best = Some((pos, cost));
            }
        }
        best
    }

    /// Position in `remaining` of the subset with the lowest chain count plus
    /// unsafe moves left behind times the subsets still to follow.
    fn best_countall(
        &mut self,
        subsets: &[Subset],
        remaining: &[usize],
        contamination: &ContaminationMatrix,
    ) -> Option<(usize, usize)> {
        let later = remaining.len().saturating_sub(1);
        let mut best: Option<(usize, usize)> = None;
        for (pos, &index) in remaining.iter().enumerate() {
            let subset = &subsets[index];
            let mut next = contamination.clone();
            next.mark_delivered(subset);
            let cost = self.chains(subset, contamination) + next.count_unsafe() * later;

            if best.is_none_or(|(_, c)| cost < c) {
                best = Some((pos, cost));
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::greedy::GreedyBackend;

    fn names(matrix: &WellMatrix, subsets: &[Subset]) -> Vec<String> {
        subsets
            .iter()
            .map(|s| matrix.part_name(s.part()).to_string())
            .collect()
    }

    /// Delivering `y` before `b` keeps the `y` wells chained.
    fn crossing() -> WellMatrix {
        WellMatrix::from_rows(&[["a", "x"], ["b", "y"], ["b", "y"], ["a", "y"]]).unwrap()
    }

    fn order(matrix: &WellMatrix, order: ChainReordering, stats: &mut SolverStatistics) -> Vec<Subset> {
        let caps = CapacityMap::unlimited(matrix.num_parts());
        order_subsets(matrix, &caps, order, &mut GreedyBackend::new(), None, stats)
    }

    #[test]
    fn test_fixed_order_delegates_to_reordering() {
        let m = WellMatrix::from_rows(&[["r0", "p"], ["r1", "p"]]).unwrap();
        let mut stats = SolverStatistics::default();
        let natural = order(&m, ChainReordering::default(), &mut stats);
        assert_eq!(natural, m.subsets());
        let least_out = order(&m, Reordering::LeastOut.into(), &mut stats);
        assert_eq!(m.part_name(least_out[0].part()), "p");
        assert_eq!(stats.lookahead_nodes, 0);
        assert_eq!(stats.backend_calls, 0);
    }

    #[test]
    fn test_dynamic_orders_keep_the_first_subset_first() {
        let m = WellMatrix::from_rows(&[["r0", "p"], ["r1", "p"], ["r2", "p"]]).unwrap();
        let mut stats = SolverStatistics::default();
        for o in [
            ChainReordering::NearestNeighbour { depth: 1 },
            ChainReordering::NearestNeighbour { depth: 4 },
            ChainReordering::Greedy,
        ] {
            assert_eq!(names(&m, &order(&m, o, &mut stats))[0], "r0", "{}", o);
        }
    }

    #[test]
    fn test_lookahead_defers_the_contaminating_subset() {
        let m = crossing();
        let mut stats = SolverStatistics::default();

        let myopic = order(&m, ChainReordering::NearestNeighbour { depth: 1 }, &mut stats);
        assert_eq!(names(&m, &myopic), vec!["a", "x", "b", "y"]);

        let ordered = order(&m, ChainReordering::NearestNeighbour { depth: 3 }, &mut stats);
        assert_eq!(names(&m, &ordered), vec!["a", "x", "y", "b"]);
        assert!(stats.lookahead_nodes > 0);
        assert!(stats.backend_calls > 0);
    }

    #[test]
    fn test_greedy_prefers_few_unsafe_moves() {
        // After `a`: `x` leaves 5 unsafe moves, `y` 7 and `b` 8.
        let m = crossing();
        let mut stats = SolverStatistics::default();
        let ordered = order(&m, ChainReordering::Greedy, &mut stats);
        assert_eq!(names(&m, &ordered), vec!["a", "x", "y", "b"]);
        assert_eq!(stats.lookahead_nodes, 3 + 2 + 1);
    }

    #[test]
    fn test_dynamic_orders_keep_every_subset() {
        let m = WellMatrix::from_rows(&[["a", "x", "u"], ["b", "x", "u"], ["a", "y", "v"]]).unwrap();
        let mut stats = SolverStatistics::default();
        let mut all = m.subsets();
        all.sort_by_key(|s| s.part());
        for o in [
            ChainReordering::NearestNeighbour { depth: 0 },
            ChainReordering::NearestNeighbour { depth: 1 },
            ChainReordering::NearestNeighbour { depth: 3 },
            ChainReordering::Greedy,
        ] {
            let mut ordered = order(&m, o, &mut stats);
            ordered.sort_by_key(|s| s.part());
            assert_eq!(ordered, all, "{}", o);
        }
    }
}
