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

//! # Chain Solver
//!
//! Solves the instance one subset at a time.
//!
//! ## Core flow
//!
//! - Subsets are ordered once (`ChainReordering`). The dynamic orders score
//!   candidates with the same backend.
//! - Each subset is turned into a `SubsetGraph` under the contamination matrix
//!   of the subsets visited before it and handed to the backend. Subsets of a
//!   single well skip the backend.
//! - Chains are appended in order; the first operation of every chain takes a
//!   fresh tip. Afterwards the subset is marked delivered.
//! - Redundancy fix: the finished sequence is replayed from scratch and the
//!   replayed flags are adopted when they need fewer tips.
//!
//! ## Notes
//!
//! - The time limit applies to every backend call separately.
//! - A backend that hits its deadline still returns a valid cover; the outcome
//!   is then flagged `TimeLimitReached`.

use crate::{
    cover::{ChainCover, ChainCoverBackend, CoverStatus},
    graph::{ContaminationMatrix, SubsetGraph},
    reorder::{ChainReordering, order_subsets},
};
use pipette_model::{
    capacity::CapacityMap,
    matrix::WellMatrix,
    oracle::independent_cost,
    sequence::{Operation, Sequence},
};
use pipette_search::{
    error::SolveError,
    monitor::search_monitor::{SearchMonitor, SearchProgress},
    result::SolverOutcome,
    stats::SolverStatistics,
};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct ChainSolver<B> {
    backend: B,
    time_limit: Option<Duration>,
    order: ChainReordering,
}

impl<B> ChainSolver<B>
where
    B: ChainCoverBackend,
{
    #[inline]
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            time_limit: None,
            order: ChainReordering::default(),
        }
    }

    /// Bounds every backend call by `time_limit`.
    #[inline]
    pub fn with_time_limit(mut self, time_limit: Duration) -> Self {
        self.time_limit = Some(time_limit);
        self
    }

    #[inline]
    pub fn with_order<O>(mut self, order: O) -> Self
    where
        O: Into<ChainReordering>,
    {
        self.order = order.into();
        self
    }

    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[inline]
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit
    }

    #[inline]
    pub fn order(&self) -> ChainReordering {
        self.order
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
        capacities.ensure_deliverable()?;

        let start = Instant::now();
        let mut stats = SolverStatistics::default();
        monitor.on_enter_search(matrix);

        let subsets = order_subsets(
            matrix,
            capacities,
            self.order,
            &mut self.backend,
            self.time_limit,
            &mut stats,
        );
        let total = matrix.num_operations();
        let mut contamination = ContaminationMatrix::new(matrix.num_wells());
        let mut sequence = Sequence::with_capacity(total);
        let mut cost = 0;
        let mut limited_subsets = 0usize;

        for subset in &subsets {
            let capacity = capacities.get(subset.part());
            let graph = SubsetGraph::new(subset, &contamination);
            let cover = if graph.num_wells() <= 1 {
                ChainCover::new(vec![vec![1]], CoverStatus::Optimal)
            } else {
                let deadline = self.time_limit.map(|limit| Instant::now() + limit);
                self.backend
                    .solve_chain_cover(&graph, capacity, deadline, &mut stats)
            };
            debug_assert!(
                cover.is_valid_for(&graph, capacity),
                "called `ChainSolver::solve` with backend {} returning an invalid cover for {}",
                self.backend.name(),
                subset
            );

            if cover.status == CoverStatus::TimeLimitReached {
                limited_subsets += 1;
            }
            for chain in &cover.chains {
                for (i, &node) in chain.iter().enumerate() {
                    sequence.push(Operation::new(subset.part(), graph.well(node), i == 0));
                }
            }
            cost += cover.num_chains();
            contamination.mark_delivered(subset);

            stats.on_step();
            monitor.on_step(&SearchProgress::new(sequence.len(), total, cost), &stats);
        }

        let replay = independent_cost(&sequence, matrix, capacities);
        if replay.cost < cost {
            stats.on_redundant_changes_removed((cost - replay.cost) as u64);
            sequence.set_changed_flags(&replay.changed);
        }

        stats.set_total_time(start.elapsed());
        monitor.on_exit_search(&sequence, &stats);

        if limited_subsets > 0 {
            let reason = format!(
                "{} of {} subset covers stopped at the time limit",
                limited_subsets,
                subsets.len()
            );
            return Ok(SolverOutcome::time_limited(sequence, reason, stats));
        }
        Ok(SolverOutcome::completed(sequence, stats))
    }
}
