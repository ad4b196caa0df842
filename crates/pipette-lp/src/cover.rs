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

//! # Chain Covers
//!
//! A chain cover splits the wells of one subset into ordered chains, each
//! served by a single tip. Inside a chain every move is contamination-safe and
//! a chain never exceeds the tip capacity. The number of chains is the number
//! of tips the subset needs.
//!
//! `ChainCoverBackend` is the pluggable capability behind the chain solver;
//! `MilpBackend` and `GreedyBackend` implement it.

use crate::graph::SubsetGraph;
use pipette_model::capacity::Capacity;
use pipette_search::stats::SolverStatistics;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoverStatus {
    /// The cover is optimal for the subset graph.
    Optimal,
    /// The cover is a heuristic one by construction.
    Heuristic,
    /// The deadline passed before optimality was proven; the cover is the
    /// best incumbent.
    TimeLimitReached,
    /// The engine failed; the cover is the heuristic incumbent.
    Fallback,
}

impl std::fmt::Display for CoverStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoverStatus::Optimal => write!(f, "Optimal"),
            CoverStatus::Heuristic => write!(f, "Heuristic"),
            CoverStatus::TimeLimitReached => write!(f, "Time Limit Reached"),
            CoverStatus::Fallback => write!(f, "Fallback"),
        }
    }
}

/// Chains of 1-based subset-graph nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainCover {
    pub chains: Vec<Vec<usize>>,
    pub status: CoverStatus,
}

impl ChainCover {
    #[inline]
    pub fn new(chains: Vec<Vec<usize>>, status: CoverStatus) -> Self {
        Self { chains, status }
    }

    /// Number of tips the cover uses.
    #[inline]
    pub fn num_chains(&self) -> usize {
        self.chains.len()
    }

    #[inline]
    pub fn with_status(mut self, status: CoverStatus) -> Self {
        self.status = status;
        self
    }

    /// Returns `true` if the chains visit every well node exactly once, only
    /// use safe moves and respect `capacity`.
    pub fn is_valid_for(&self, graph: &SubsetGraph, capacity: Capacity) -> bool {
        let mut seen = vec![false; graph.num_nodes()];
        for chain in &self.chains {
            if chain.is_empty() || capacity.is_exhausted_by(chain.len() - 1) {
                return false;
            }
            for &node in chain {
                if node == 0 || node >= graph.num_nodes() || std::mem::replace(&mut seen[node], true) {
                    return false;
                }
            }
            if chain.windows(2).any(|w| !graph.is_safe(w[0], w[1])) {
                return false;
            }
        }
        seen.iter().skip(1).all(|&s| s)
    }
}

/// Solves the chain cover of one subset graph.
pub trait ChainCoverBackend {
    fn name(&self) -> &str;

    /// Covers every well node of `graph` with as few chains as possible.
    /// Stops improving at `deadline` and returns its incumbent.
    fn solve_chain_cover(
        &mut self,
        graph: &SubsetGraph,
        capacity: Capacity,
        deadline: Option<Instant>,
        statistics: &mut SolverStatistics,
    ) -> ChainCover;
}

impl std::fmt::Debug for dyn ChainCoverBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ChainCoverBackend({})", self.name())
    }
}

impl<B> ChainCoverBackend for Box<B>
where
    B: ChainCoverBackend + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    fn solve_chain_cover(
        &mut self,
        graph: &SubsetGraph,
        capacity: Capacity,
        deadline: Option<Instant>,
        statistics: &mut SolverStatistics,
    ) -> ChainCover {
        (**self).solve_chain_cover(graph, capacity, deadline, statistics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipette_model::index::WellIndex;

    fn graph() -> SubsetGraph {
        let wells = (0..3).map(WellIndex::new).collect();
        SubsetGraph::from_unsafe_arcs(wells, &[(1, 2)])
    }

    #[test]
    fn test_validity_checks_cover_safety_and_capacity() {
        let g = graph();
        let ok = ChainCover::new(vec![vec![2, 1, 3]], CoverStatus::Optimal);
        assert!(ok.is_valid_for(&g, Capacity::Unlimited));
        assert!(!ok.is_valid_for(&g, Capacity::Limited(2)));

        let unsafe_move = ChainCover::new(vec![vec![1, 2], vec![3]], CoverStatus::Optimal);
        assert!(!unsafe_move.is_valid_for(&g, Capacity::Unlimited));

        let missing = ChainCover::new(vec![vec![2, 1]], CoverStatus::Optimal);
        assert!(!missing.is_valid_for(&g, Capacity::Unlimited));

        let twice = ChainCover::new(vec![vec![2, 1], vec![1, 3]], CoverStatus::Optimal);
        assert!(!twice.is_valid_for(&g, Capacity::Unlimited));
    }
}
