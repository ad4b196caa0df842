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

//! The incremental driver shared by the tree searches.
//!
//! The first delivery of the starting order opens the sequence. Afterwards
//! every pending delivery is scored and the lowest score is appended. Equal
//! scores prefer the lower transition cost, then the first pending delivery in
//! starting order.

use crate::state::SearchState;
use pipette_model::{
    capacity::CapacityMap,
    matrix::WellMatrix,
    oracle::CostOracle,
    sequence::Delivery,
};
use pipette_search::{
    error::SolveError,
    monitor::search_monitor::{SearchMonitor, SearchProgress},
    reorder::{Reordering, delivery_order},
    result::SolverOutcome,
    stats::SolverStatistics,
};
use std::time::Instant;

/// Ranking of one pending delivery. Orders by `total`, then `transition`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct Score {
    pub total: usize,
    pub transition: usize,
}

impl Score {
    #[inline]
    pub(crate) fn new(total: usize, transition: usize) -> Self {
        Self { total, transition }
    }
}

pub(crate) fn incremental_search<M, F>(
    matrix: &WellMatrix,
    capacities: &CapacityMap,
    reordering: Reordering,
    monitor: &mut M,
    mut score: F,
) -> Result<SolverOutcome, SolveError>
where
    M: SearchMonitor + ?Sized,
    F: FnMut(&CostOracle<'_>, &[Delivery], &SearchState, usize, &mut SolverStatistics) -> Score,
{
    capacities.ensure_deliverable()?;

    let start = Instant::now();
    let mut stats = SolverStatistics::default();
    monitor.on_enter_search(matrix);

    let oracle = CostOracle::new(matrix, capacities);
    let deliveries = delivery_order(matrix, reordering);
    let total = deliveries.len();
    let mut state = SearchState::new(matrix, total);

    if let Some(&first) = deliveries.first() {
        state = state.with_delivery(&oracle, 0, first);
        stats.on_step();
        monitor.on_step(&SearchProgress::new(state.len(), total, state.cost()), &stats);
    }

    while !state.is_complete() {
        let mut best: Option<(usize, Score)> = None;
        for index in state.pending() {
            stats.on_transition_evaluated();
            let s = score(&oracle, &deliveries, &state, index, &mut stats);
            if best.is_none_or(|(_, b)| s < b) {
                best = Some((index, s));
            }
        }
        let Some((index, _)) = best else {
            break;
        };
        state = state.with_delivery(&oracle, index, deliveries[index]);

        stats.on_step();
        monitor.on_step(&SearchProgress::new(state.len(), total, state.cost()), &stats);
    }

    let sequence = state.into_sequence();
    stats.set_total_time(start.elapsed());
    monitor.on_exit_search(&sequence, &stats);
    Ok(SolverOutcome::completed(sequence, stats))
}
