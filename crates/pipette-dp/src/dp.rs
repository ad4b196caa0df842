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

//! # Exact Dynamic Program
//!
//! Builds the full lattice of `N = wells · slots` positions × `N` deliveries.
//!
//! ## Core flow
//!
//! - Position 0: every delivery starts a path with a fresh tip (cost 1).
//! - Position `p`: record `(p, o)` extends the record `(p - 1, o')` minimising
//!   `t(o', o) + cost(p - 1, o')` among those whose path does not contain `o`.
//!   `t` comes from the cost oracle, evaluated against the mask and the tip
//!   run carried by `(p - 1, o')`. Ties go to the first `o'`.
//! - The cheapest record at `N - 1` is unwound along its back links.
//!
//! ## Notes
//!
//! - O(N³ · slots) time and O(N²) memory for links plus two layers of masks.
//!   Callers keep instances at tens of deliveries.
//! - The delivery enumeration is well-major, so results are deterministic.

use crate::lattice::{Layer, Link, Record};
use pipette_model::{
    capacity::CapacityMap,
    mask::AddedMask,
    matrix::WellMatrix,
    oracle::CostOracle,
    sequence::{Delivery, Sequence},
};
use pipette_search::{
    error::SolveError,
    monitor::search_monitor::{SearchMonitor, SearchProgress},
    reorder::well_major_deliveries,
    result::SolverOutcome,
    stats::SolverStatistics,
};
use std::time::Instant;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DpSolver;

impl DpSolver {
    #[inline]
    pub fn new() -> Self {
        Self
    }

    /// Solves the instance to completion.
    pub fn solve<M>(
        &mut self,
        matrix: &WellMatrix,
        capacities: &CapacityMap,
        monitor: &mut M,
    ) -> Result<SolverOutcome, SolveError>
    where
        M: SearchMonitor + ?Sized,
    {
        capacities.ensure_deliverable()?;

        let start = Instant::now();
        let mut stats = SolverStatistics::default();
        monitor.on_enter_search(matrix);

        let deliveries = well_major_deliveries(matrix);
        let sequence = self.run(matrix, capacities, &deliveries, monitor, &mut stats);

        stats.set_total_time(start.elapsed());
        monitor.on_exit_search(&sequence, &stats);
        Ok(SolverOutcome::completed(sequence, stats))
    }

    fn run<M>(
        &self,
        matrix: &WellMatrix,
        capacities: &CapacityMap,
        deliveries: &[Delivery],
        monitor: &mut M,
        stats: &mut SolverStatistics,
    ) -> Sequence
    where
        M: SearchMonitor + ?Sized,
    {
        let n = deliveries.len();
        if n == 0 {
            return Sequence::new();
        }
        let oracle = CostOracle::new(matrix, capacities);

        let mut current = Layer::new(n);
        for (o, &delivery) in deliveries.iter().enumerate() {
            let mut mask = AddedMask::for_matrix(matrix);
            mask.insert_delivery(matrix, delivery);
            current.set(
                o,
                Record {
                    cost: 1,
                    mask,
                    run: 1,
                },
                Link {
                    prev: None,
                    changed: true,
                },
            );
        }
        stats.on_step();
        monitor.on_step(&SearchProgress::new(1, n, 1), stats);

        let mut links: Vec<Vec<Link>> = Vec::with_capacity(n);
        for p in 1..n {
            let next = Self::extend(&oracle, deliveries, &current, stats);
            let best_cost = next.best().map(|(_, r)| r.cost).unwrap_or(0);
            links.push(std::mem::replace(&mut current, next).into_links());

            stats.on_step();
            monitor.on_step(&SearchProgress::new(p + 1, n, best_cost), stats);
        }

        // Every path of length n is a permutation, so the last layer is never empty.
        let Some((mut o, _)) = current.best() else {
            return Sequence::new();
        };
        links.push(current.into_links());

        let mut reversed = Vec::with_capacity(n);
        for layer in links.iter().rev() {
            let link = layer[o];
            reversed.push(deliveries[o].with_changed(link.changed));
            match link.prev {
                Some(prev) => o = prev,
                None => break,
            }
        }
        reversed.into_iter().rev().collect()
    }

    fn extend(
        oracle: &CostOracle<'_>,
        deliveries: &[Delivery],
        previous: &Layer,
        stats: &mut SolverStatistics,
    ) -> Layer {
        let matrix = oracle.matrix();
        let mut next = Layer::new(deliveries.len());

        for (o, &candidate) in deliveries.iter().enumerate() {
            let mut best: Option<(usize, usize, usize)> = None;
            for (o1, record) in previous.reachable() {
                if record.mask.contains_delivery(matrix, candidate) {
                    continue;
                }
                stats.on_transition_evaluated();
                let t = oracle.transition_cost(deliveries[o1], candidate, &record.mask, record.run);
                let total = record.cost + t;
                if best.is_none_or(|(_, _, c)| total < c) {
                    best = Some((o1, t, total));
                }
            }

            if let Some((o1, t, total)) = best
                && let Some(from) = previous.record(o1)
            {
                let record = Record {
                    cost: total,
                    mask: from.mask.with(candidate.well, matrix.part_slot(candidate.part)),
                    run: if t == 0 { from.run + 1 } else { 1 },
                };
                let link = Link {
                    prev: Some(o1),
                    changed: t == 1,
                };
                next.set(o, record, link);
            }
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipette_model::{
        capacity::Capacity,
        generator::{distinct_matrix, random_matrix, uniform_matrix},
        oracle::independent_cost,
        sequence::Operation,
    };
    use pipette_search::monitor::no_op::NoOpMonitor;
    use rand::{SeedableRng, rngs::StdRng};

    fn solve(matrix: &WellMatrix, caps: &CapacityMap) -> Sequence {
        DpSolver::new()
            .solve(matrix, caps, &mut NoOpMonitor)
            .expect("dp should solve")
            .sequence
    }

    fn brute_force(matrix: &WellMatrix, caps: &CapacityMap) -> usize {
        fn permute(
            k: usize,
            items: &mut Vec<Delivery>,
            matrix: &WellMatrix,
            caps: &CapacityMap,
            best: &mut usize,
        ) {
            if k == items.len() {
                let seq: Sequence = items.iter().map(|d| d.with_changed(true)).collect();
                *best = (*best).min(independent_cost(&seq, matrix, caps).cost);
                return;
            }
            for i in k..items.len() {
                items.swap(k, i);
                permute(k + 1, items, matrix, caps, best);
                items.swap(k, i);
            }
        }
        let mut items = well_major_deliveries(matrix);
        let mut best = usize::MAX;
        permute(0, &mut items, matrix, caps, &mut best);
        best
    }

    fn scenario() -> WellMatrix {
        WellMatrix::from_rows(&[
            ["p0", "r0", "c0", "t0"],
            ["p0", "r1", "c1", "t1"],
            ["p0", "r2", "c2", "t2"],
        ])
        .unwrap()
    }

    #[test]
    fn test_scenario_costs_ten() {
        let m = scenario();
        let caps = CapacityMap::unlimited(m.num_parts());
        let seq = solve(&m, &caps);
        assert_eq!(seq.cost(), 10);
        assert!(seq.is_complete(&m));
        assert_eq!(independent_cost(&seq, &m, &caps).cost, 10);
    }

    #[test]
    fn test_degenerate_bounds() {
        let same = uniform_matrix(3, 2).unwrap();
        let caps = CapacityMap::unlimited(same.num_parts());
        assert_eq!(solve(&same, &caps).cost(), 2);

        let distinct = distinct_matrix(3, 2).unwrap();
        let caps = CapacityMap::unlimited(distinct.num_parts());
        assert_eq!(solve(&distinct, &caps).cost(), 6);
    }

    #[test]
    fn test_capacity_boundary_forces_one_extra_change() {
        let m = uniform_matrix(3, 1).unwrap();
        let caps = CapacityMap::uniform(1, Capacity::Limited(2));
        let seq = solve(&m, &caps);
        assert_eq!(seq.cost(), 2);
        let flags: Vec<bool> = seq.iter().map(|op| op.changed).collect();
        assert_eq!(flags, vec![true, false, true]);
    }

    #[test]
    fn test_first_operation_takes_a_tip() {
        let m = WellMatrix::from_rows(&[["a", "b"], ["a", "c"]]).unwrap();
        let caps = CapacityMap::unlimited(m.num_parts());
        let seq = solve(&m, &caps);
        let first: &Operation = &seq.operations()[0];
        assert!(first.changed);
    }

    #[test]
    fn test_matches_exhaustive_search_on_small_instances() {
        let mut rng = StdRng::seed_from_u64(42);
        for round in 0..25 {
            let m = random_matrix(&mut rng, 3, &[2, 2]).unwrap();
            let caps = if round % 2 == 0 {
                CapacityMap::unlimited(m.num_parts())
            } else {
                CapacityMap::uniform(m.num_parts(), Capacity::Limited(2))
            };
            let seq = solve(&m, &caps);
            assert!(seq.is_complete(&m));
            assert_eq!(seq.cost(), independent_cost(&seq, &m, &caps).cost);
            assert_eq!(seq.cost(), brute_force(&m, &caps), "round {}", round);
        }
    }

    #[test]
    fn test_is_deterministic() {
        let mut rng = StdRng::seed_from_u64(5);
        let m = random_matrix(&mut rng, 3, &[2, 3]).unwrap();
        let caps = CapacityMap::unlimited(m.num_parts());
        assert_eq!(solve(&m, &caps), solve(&m, &caps));
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        let m = uniform_matrix(2, 1).unwrap();
        let caps = CapacityMap::uniform(1, Capacity::Limited(0));
        let err = DpSolver::new()
            .solve(&m, &caps, &mut NoOpMonitor)
            .unwrap_err();
        assert!(matches!(err, SolveError::InfeasibleCapacity(_)));
    }

    #[test]
    fn test_statistics_count_positions() {
        let m = uniform_matrix(2, 2).unwrap();
        let caps = CapacityMap::unlimited(m.num_parts());
        let outcome = DpSolver::new().solve(&m, &caps, &mut NoOpMonitor).unwrap();
        assert_eq!(outcome.statistics.steps, 4);
        assert!(outcome.statistics.transitions_evaluated > 0);
        assert!(!outcome.is_time_limited());
    }
}
