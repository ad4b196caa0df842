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

//! First-fit chain cover.
//!
//! Opens a chain at the lowest unvisited node and extends it along the first
//! unvisited safe successor until the capacity is reached or no successor is
//! left. Always valid, rarely optimal. The MILP backend uses it as incumbent.

use crate::{
    cover::{ChainCover, ChainCoverBackend, CoverStatus},
    graph::SubsetGraph,
};
use pipette_model::capacity::Capacity;
use pipette_search::stats::SolverStatistics;
use std::time::Instant;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GreedyBackend;

impl GreedyBackend {
    #[inline]
    pub fn new() -> Self {
        Self
    }

    /// Computes the first-fit cover of `graph`.
    pub fn cover(graph: &SubsetGraph, capacity: Capacity) -> ChainCover {
        let n = graph.num_nodes();
        let mut visited = vec![false; n];
        let mut chains = Vec::new();

        for start in 1..n {
            if visited[start] {
                continue;
            }
            visited[start] = true;
            let mut chain = vec![start];
            let mut current = start;
            while !capacity.is_exhausted_by(chain.len()) {
                let Some(next) = (1..n).find(|&j| !visited[j] && graph.is_safe(current, j)) else {
                    break;
                };
                visited[next] = true;
                chain.push(next);
                current = next;
            }
            chains.push(chain);
        }

        ChainCover::new(chains, CoverStatus::Heuristic)
    }
}

impl ChainCoverBackend for GreedyBackend {
    fn name(&self) -> &str {
        "GreedyBackend"
    }

    fn solve_chain_cover(
        &mut self,
        graph: &SubsetGraph,
        capacity: Capacity,
        _deadline: Option<Instant>,
        statistics: &mut SolverStatistics,
    ) -> ChainCover {
        statistics.on_backend_call();
        Self::cover(graph, capacity)
    }
}
